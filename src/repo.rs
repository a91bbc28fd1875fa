//! Workspace repository access.
//!
//! A repository is a local workspace directory whose immediate
//! subdirectories are branches. Remotes are declared in
//! `<root>/.upsync/config.toml`:
//!
//! ```toml
//! [remotes]
//! origin = "upsync://push.example.com:8338/myproject"
//! ```
//!
//! The push pipeline only sees the `Repository` trait; `FsRepository` is
//! the filesystem-backed implementation. Everything here is read-only for
//! the duration of a push: branch and file lists are fetched once and the
//! pipeline assumes no concurrent local mutation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::Deserialize;

use crate::error::{Result, SyncError};

/// Directory holding repository metadata, never listed as a branch.
pub const META_DIR: &str = ".upsync";

/// Default remote port when the URL does not name one.
pub const DEFAULT_PORT: u16 = 8338;

/// Read-only view of a local workspace.
pub trait Repository {
    /// Workspace root; file paths returned by [`ls_branch_files`] are
    /// absolute paths under this root.
    ///
    /// [`ls_branch_files`]: Repository::ls_branch_files
    fn root(&self) -> &Path;

    /// Branch names, in the order pushes will process them.
    fn list_branches(&self) -> Result<Vec<String>>;

    /// Every file of one branch, absolute paths, in transfer order.
    fn ls_branch_files(&self, branch: &str) -> Result<Vec<PathBuf>>;

    /// URL of a named remote. Unknown names are a configuration error.
    fn remote_url(&self, name: &str) -> Result<String>;
}

#[derive(Debug, Default, Deserialize)]
struct RepoConfig {
    #[serde(default)]
    remotes: HashMap<String, String>,
}

/// Filesystem-backed repository.
#[derive(Debug)]
pub struct FsRepository {
    root: PathBuf,
    remotes: HashMap<String, String>,
}

impl FsRepository {
    /// Open a workspace rooted at `root`, loading its remote declarations.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(SyncError::Config(format!(
                "workspace {} does not exist",
                root.display()
            )));
        }
        let root = root.canonicalize()?;

        let config_path = root.join(META_DIR).join("config.toml");
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| {
                SyncError::Config(format!("invalid {}: {}", config_path.display(), e))
            })?
        } else {
            RepoConfig::default()
        };

        Ok(Self {
            root,
            remotes: config.remotes,
        })
    }
}

impl Repository for FsRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    /// Immediate subdirectories of the root, sorted by name. Hidden
    /// directories (including the metadata directory) are not branches.
    fn list_branches(&self) -> Result<Vec<String>> {
        let mut branches = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            branches.push(name);
        }
        branches.sort();
        Ok(branches)
    }

    /// Every regular file under the branch directory, sorted, hidden files
    /// included. A branch directory that does not exist has no files.
    fn ls_branch_files(&self, branch: &str) -> Result<Vec<PathBuf>> {
        let branch_dir = self.root.join(branch);
        if !branch_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkBuilder::new(&branch_dir)
            .standard_filters(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build()
        {
            let entry = entry.map_err(|e| SyncError::Io(std::io::Error::other(e)))?;
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn remote_url(&self, name: &str) -> Result<String> {
        self.remotes
            .get(name)
            .cloned()
            .ok_or_else(|| SyncError::Config(format!("unknown remote '{}'", name)))
    }
}

/// A parsed remote URL: `upsync://host[:port]/project` (scheme optional).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub host: String,
    pub port: u16,
    /// Remote project path, no leading or trailing separators.
    pub project: String,
}

impl RemoteUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let rest = match url.find("://") {
            Some(idx) => &url[idx + 3..],
            None => url,
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    SyncError::Config(format!("invalid port in remote URL '{}'", url))
                })?;
                (host, port)
            }
            None => (authority, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(SyncError::Config(format!(
                "remote URL '{}' has no host",
                url
            )));
        }

        let project = path.trim_matches('/');
        if project.is_empty() {
            return Err(SyncError::Config(format!(
                "remote URL '{}' has no project path",
                url
            )));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            project: project.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(remotes: &str) -> (TempDir, FsRepository) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(META_DIR)).unwrap();
        fs::write(
            tmp.path().join(META_DIR).join("config.toml"),
            format!("[remotes]\n{}", remotes),
        )
        .unwrap();
        let repo = FsRepository::open(tmp.path()).unwrap();
        (tmp, repo)
    }

    #[test]
    fn branches_are_sorted_visible_directories() {
        let (tmp, repo) = workspace("");
        fs::create_dir(tmp.path().join("main")).unwrap();
        fs::create_dir(tmp.path().join("dev")).unwrap();
        fs::write(tmp.path().join("stray.txt"), "not a branch").unwrap();

        assert_eq!(repo.list_branches().unwrap(), vec!["dev", "main"]);
    }

    #[test]
    fn branch_files_are_sorted_and_recursive() {
        let (tmp, repo) = workspace("");
        let branch = tmp.path().join("main");
        fs::create_dir_all(branch.join("sub")).unwrap();
        fs::write(branch.join("b.txt"), "b").unwrap();
        fs::write(branch.join("a.txt"), "a").unwrap();
        fs::write(branch.join("sub/c.txt"), "c").unwrap();

        let files = repo.ls_branch_files("main").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(repo.root()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("main/a.txt"),
                PathBuf::from("main/b.txt"),
                PathBuf::from("main/sub/c.txt"),
            ]
        );
    }

    #[test]
    fn missing_branch_has_no_files() {
        let (_tmp, repo) = workspace("");
        assert!(repo.ls_branch_files("ghost").unwrap().is_empty());
    }

    #[test]
    fn unknown_remote_is_config_error() {
        let (_tmp, repo) = workspace("origin = \"upsync://h:1/p\"\n");
        assert_eq!(repo.remote_url("origin").unwrap(), "upsync://h:1/p");
        assert!(matches!(
            repo.remote_url("backup"),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn parse_remote_url_variants() {
        let url = RemoteUrl::parse("upsync://push.example.com:9000/team/proj/").unwrap();
        assert_eq!(url.host, "push.example.com");
        assert_eq!(url.port, 9000);
        assert_eq!(url.project, "team/proj");

        let url = RemoteUrl::parse("push.example.com/proj").unwrap();
        assert_eq!(url.port, DEFAULT_PORT);
        assert_eq!(url.project, "proj");
    }

    #[test]
    fn parse_remote_url_errors() {
        assert!(RemoteUrl::parse("upsync://host:badport/proj").is_err());
        assert!(RemoteUrl::parse("upsync:///proj").is_err());
        assert!(RemoteUrl::parse("upsync://host:8338/").is_err());
    }
}
