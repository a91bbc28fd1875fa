//! Push pipeline.
//!
//! Top-level driver for one push attempt: enumerate branches and files,
//! compute the announcement count, resolve the remote and its credential,
//! open the connection, negotiate, transfer each branch in order, send the
//! overall completion marker, close. Strictly sequential: one connection,
//! no concurrent transfers, no retries. Re-running the command is the
//! retry mechanism; the marker protocol makes that idempotent.

use std::fs;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Profile;
use crate::progress::ProgressSink;
use crate::push::negotiate::{negotiate, Negotiation};
use crate::push::sequencer::{send_marker, BranchSequencer, MARKER_NAME};
use crate::push::unit::TransferUnit;
use crate::repo::{RemoteUrl, Repository};
use crate::transport::{TcpTransport, Transport};

/// Result of one push attempt. All three are successful terminations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// No branch had any file; nothing was sent, no connection was opened.
    NothingToSend,
    /// The remote already holds this push.
    AlreadyPushed,
    /// Full transfer finished, markers included.
    Completed { files: u64, bytes: u64 },
}

/// One branch's share of the plan.
#[derive(Debug, Clone)]
pub struct BranchPlan {
    pub name: String,
    pub files: Vec<TransferUnit>,
}

/// Everything enumerated up front, immutable for the push.
#[derive(Debug, Clone)]
pub struct PushPlan {
    /// Branches with at least one file, in enumeration order.
    pub branches: Vec<BranchPlan>,
    /// Announcement count committed to the remote: files, one marker per
    /// branch, plus the overall marker for whole-project pushes.
    pub files_len: u64,
    /// Total file bytes (markers excluded).
    pub total_bytes: u64,
    /// Whether a single-branch restriction is active.
    pub single_branch: bool,
}

/// Announcement count for the given per-branch file counts. Branches
/// without files contribute nothing and earn no marker; a plan with no
/// remaining branches has nothing to announce at all, overall marker
/// included.
pub fn files_len(branch_file_counts: &[u64], single_branch: bool) -> u64 {
    let files: u64 = branch_file_counts.iter().filter(|&&n| n > 0).sum();
    let branches = branch_file_counts.iter().filter(|&&n| n > 0).count() as u64;
    if branches == 0 {
        return 0;
    }
    files + branches + if single_branch { 0 } else { 1 }
}

/// One push attempt against one remote.
pub struct PushPipeline<'a, R: Repository> {
    repo: &'a R,
    profile: &'a Profile,
    remote: String,
    branch: Option<String>,
}

impl<'a, R: Repository> PushPipeline<'a, R> {
    pub fn new(
        repo: &'a R,
        profile: &'a Profile,
        remote: impl Into<String>,
        branch: Option<String>,
    ) -> Self {
        Self {
            repo,
            profile,
            remote: remote.into(),
            branch,
        }
    }

    /// Enumerate the branch set and capture file sizes. The branch set is
    /// the filter if one was given, otherwise every branch the repository
    /// reports; file order is preserved exactly as the repository returns
    /// it. Branches with no files are dropped from the plan.
    pub fn plan(&self) -> Result<PushPlan> {
        let names = match &self.branch {
            Some(branch) => vec![branch.clone()],
            None => self.repo.list_branches()?,
        };

        let mut branches = Vec::new();
        let mut counts = Vec::new();
        let mut total_bytes = 0u64;
        for name in names {
            let paths = self.repo.ls_branch_files(&name)?;
            counts.push(paths.len() as u64);
            if paths.is_empty() {
                continue;
            }
            let mut files = Vec::with_capacity(paths.len());
            for path in paths {
                let size = fs::metadata(&path)
                    .with_context(|| format!("failed to stat {}", path.display()))?
                    .len();
                total_bytes += size;
                files.push(TransferUnit::new(path, size));
            }
            branches.push(BranchPlan { name, files });
        }

        Ok(PushPlan {
            files_len: files_len(&counts, self.branch.is_some()),
            branches,
            total_bytes,
            single_branch: self.branch.is_some(),
        })
    }

    /// Run one push attempt end to end. Opens a TCP connection unless the
    /// plan is empty, and closes it on every exit path afterwards.
    pub async fn run(&self, progress: &mut dyn ProgressSink) -> Result<PushOutcome> {
        let plan = self.plan()?;
        if plan.files_len == 0 {
            return Ok(PushOutcome::NothingToSend);
        }
        progress.status(&format!("{} file(s) to be sent", plan.files_len));

        let url_raw = self.repo.remote_url(&self.remote)?;
        let url = RemoteUrl::parse(&url_raw)?;
        let key = self.profile.resolve_key(&url_raw).unwrap_or("");
        debug!(remote = %self.remote, url = %url_raw, "resolved remote");

        let mut transport = TcpTransport::connect(&url.host, url.port, key).await?;
        let result = self
            .run_on(&plan, &url.project, &mut transport, progress)
            .await;
        let closed = transport.close().await;

        let outcome = result?;
        closed?;
        Ok(outcome)
    }

    /// Drive the protocol over an already-open transport. Split out from
    /// [`run`] so the connection is closed in one place regardless of how
    /// the exchange ends.
    ///
    /// [`run`]: PushPipeline::run
    pub async fn run_on(
        &self,
        plan: &PushPlan,
        project: &str,
        transport: &mut dyn Transport,
        progress: &mut dyn ProgressSink,
    ) -> Result<PushOutcome> {
        if negotiate(transport, project, self.branch.as_deref()).await?
            == Negotiation::AlreadyPushed
        {
            return Ok(PushOutcome::AlreadyPushed);
        }

        // Commits us to exactly this many announcements.
        transport.send_line(&plan.files_len.to_string()).await?;

        let sequencer = BranchSequencer::new(self.repo.root(), project);
        let mut files = 0u64;
        let mut bytes = 0u64;
        for branch in &plan.branches {
            bytes += sequencer
                .transfer_branch(transport, &branch.name, &branch.files, progress)
                .await?;
            files += branch.files.len() as u64;
        }

        if !plan.single_branch {
            send_marker(transport, &format!("{}/{}", project, MARKER_NAME)).await?;
        }

        info!(files, bytes, "push complete");
        Ok(PushOutcome::Completed { files, bytes })
    }
}
