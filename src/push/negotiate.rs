//! Push negotiation.
//!
//! One header line up, one status line back. The only interpreted
//! response is the `already-pushed` prefix; anything else, including
//! responses this client has never heard of, means "proceed". That keeps
//! old clients working against newer remotes.

use anyhow::Result;
use tracing::debug;

use crate::transport::Transport;

/// Response prefix meaning the unit named by the header is already
/// complete on the remote.
pub const ALREADY_PUSHED: &str = "already-pushed";

/// Outcome of the header exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    /// The remote already holds this push; send nothing.
    AlreadyPushed,
    /// Transfer should go ahead.
    Proceed,
}

/// Negotiation header: `{project}` for a whole-project push,
/// `{project}/{branch}` when restricted to one branch.
pub fn header(project: &str, branch: Option<&str>) -> String {
    match branch {
        Some(branch) => format!("{}/{}", project, branch),
        None => project.to_string(),
    }
}

/// Send the header and interpret the response.
pub async fn negotiate(
    transport: &mut dyn Transport,
    project: &str,
    branch: Option<&str>,
) -> Result<Negotiation> {
    let header = header(project, branch);
    transport.send_line(&header).await?;
    let response = transport.recv_line().await?;
    debug!(%header, %response, "negotiated");

    if response.starts_with(ALREADY_PUSHED) {
        Ok(Negotiation::AlreadyPushed)
    } else {
        Ok(Negotiation::Proceed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn header_formats() {
        assert_eq!(header("proj", None), "proj");
        assert_eq!(header("proj", Some("main")), "proj/main");
    }

    #[tokio::test]
    async fn already_pushed_prefix_short_circuits() {
        let mut t = MockTransport::respond_with("already-pushed at 2026-08-01");
        let outcome = negotiate(&mut t, "proj", None).await.unwrap();
        assert_eq!(outcome, Negotiation::AlreadyPushed);
        assert_eq!(t.lines(), vec!["proj"]);
    }

    #[tokio::test]
    async fn any_other_response_proceeds() {
        for response in ["ok", "", "ready to receive", "already pushed"] {
            let mut t = MockTransport::respond_with(response);
            let outcome = negotiate(&mut t, "proj", Some("dev")).await.unwrap();
            assert_eq!(outcome, Negotiation::Proceed, "response {:?}", response);
            assert_eq!(t.lines(), vec!["proj/dev"]);
        }
    }
}
