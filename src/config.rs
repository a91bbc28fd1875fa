//! User profile configuration.
//!
//! Holds the credential store: an ordered list of host-pattern -> key
//! entries loaded from `~/.config/upsync/profile.toml`. The profile is
//! loaded once per invocation and passed into the push pipeline as a
//! plain value; nothing in this crate reads it from global state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// One credential entry: `key` applies to any remote URL containing `host`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEntry {
    pub host: String,
    pub key: String,
}

/// User-level profile.
///
/// ```toml
/// [[auth]]
/// host = "push.example.com"
/// key = "k-1234"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Credential entries, in file order. Order matters: the first entry
    /// whose `host` is a substring of the remote URL wins, even when a
    /// later entry matches more of the URL.
    #[serde(default)]
    pub auth: Vec<AuthEntry>,
}

impl Profile {
    /// Load the profile from its default location, or an empty profile if
    /// the file does not exist.
    pub fn load_default() -> Result<Self> {
        match default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load a profile from a TOML file. A missing file is an empty profile.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| SyncError::Config(format!("invalid profile {}: {}", path.display(), e)))
    }

    /// Resolve the key for a remote URL: first substring match in entry
    /// order, or `None` when no entry matches.
    pub fn resolve_key(&self, remote_url: &str) -> Option<&str> {
        self.auth
            .iter()
            .find(|entry| remote_url.contains(&entry.host))
            .map(|entry| entry.key.as_str())
    }
}

/// `~/.config/upsync/profile.toml`
fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("upsync").join("profile.toml"))
}
