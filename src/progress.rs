//! Progress reporting for transfers.
//!
//! The transfer core never touches the terminal; it reports through the
//! `ProgressSink` observer so presentation stays out of the protocol path.

use colored::Colorize;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

/// Observer for push progress. All methods are observational; nothing the
/// sink does can affect the protocol.
pub trait ProgressSink: Send {
    /// Human-readable status line ("3 file(s) to be sent", ...).
    fn status(&mut self, _msg: &str) {}

    /// A file transfer is starting; `name` is the wire-relative path.
    fn file_started(&mut self, _name: &str, _size: u64) {}

    /// `sent` of `total` bytes of the current file are on the wire.
    fn chunk_sent(&mut self, _sent: u64, _total: u64) {}

    /// The current file finished.
    fn file_done(&mut self) {}
}

/// Silent sink for tests and `--quiet`.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {}

/// Terminal renderer: one progress bar per file, cleared when done.
#[derive(Default)]
pub struct TermProgress {
    bar: Option<ProgressBar>,
}

impl TermProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for TermProgress {
    fn status(&mut self, msg: &str) {
        println!("{}", msg.yellow());
    }

    fn file_started(&mut self, name: &str, size: u64) {
        println!("{} ({})", name, HumanBytes(size));
        let bar = ProgressBar::new(size);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {bytes}/{total_bytes}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.bar = Some(bar);
    }

    fn chunk_sent(&mut self, sent: u64, _total: u64) {
        if let Some(bar) = &self.bar {
            bar.set_position(sent);
        }
    }

    fn file_done(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
