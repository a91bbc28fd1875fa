//! Push protocol for branch-structured workspaces.
//!
//! One client-driven, one-directional push over a single connection:
//!
//! ```text
//! +-----------+      +------------+      +-----------+
//! |  Pipeline | ---> | Negotiator | ---> | Sequencer | (per branch)
//! | (plan/run)|      | (header)   |      | (files +  |
//! +-----------+      +------------+      |  marker)  |
//!                                        +-----------+
//! ```
//!
//! # Wire format
//!
//! Line-oriented control plane plus a raw binary data plane, interleaved
//! on one connection (lines are UTF-8, `\n`-terminated):
//!
//! ```text
//! C -> R   credential line (transport layer, may be empty)
//! C -> R   {project}            or  {project}/{branch}
//! R -> C   status line          ("already-pushed..." stops the push)
//! C -> R   files_len            (decimal announcement count)
//! per branch, per file:
//!   C -> R   {project}/{relative-path}
//!   C -> R   {size}             (decimal; exactly this many raw bytes follow)
//!   C -> R   raw chunks         (<= 256 KiB each, final chunk short)
//! per branch:
//!   C -> R   {project}/{branch}/.flags + size line + one marker chunk
//! whole-project push only:
//!   C -> R   {project}/.flags   + size line + one marker chunk
//! ```
//!
//! The remote records a unit (branch or whole push) as complete only when
//! its `.flags` marker arrives, so an interrupted push is retransmitted
//! from scratch on the next attempt and a completed one answers the
//! header with `already-pushed`. Resume granularity is per branch and per
//! push, never per byte.
//!
//! Everything is sent strictly in order from a single task; the remote's
//! framing depends on that interleaving, so there is no pipelining and no
//! concurrent multiplexing.

pub mod negotiate;
pub mod pipeline;
pub mod sequencer;
pub mod unit;

pub use negotiate::{negotiate, Negotiation, ALREADY_PUSHED};
pub use pipeline::{files_len, BranchPlan, PushOutcome, PushPipeline, PushPlan};
pub use sequencer::{send_marker, wire_path, BranchSequencer, MARKER_NAME, MARKER_PAYLOAD};
pub use unit::{ChunkStream, TransferUnit, CHUNK_SIZE};
