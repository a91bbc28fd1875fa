//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

/// Push a branch-structured workspace to a remote server.
#[derive(Debug, Parser)]
#[command(name = "upsync", version, about)]
pub struct Cli {
    /// Workspace root to push.
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Remote to push to.
    #[arg(short, long, default_value = "origin")]
    pub remote: String,

    /// Restrict the push to a single branch.
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Branch filter with whitespace-only values treated as absent.
    pub fn branch_filter(&self) -> Option<String> {
        self.branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(String::from)
    }
}
