//! User configuration for `hgg`, stored as TOML in the home directory.

use crate::{constants::HGG_CFG_FILE_NAME, errors::HgResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The user configuration for `hgg`.
///
/// Every key is optional in the file; missing keys fall back to [HggConfig::default].
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HggConfig {
    /// Name of the remote that hosts the pull requests.
    pub remote: String,
    /// Explicit master branch name. When unset, it is read from `refs/remotes/<remote>/HEAD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_branch: Option<String>,
    /// Commit message used by `amend -f`.
    pub amend_message: String,
    /// Message of restack merge commits. `{branch}` is replaced by the merged branch.
    pub merge_message: String,
    /// Whether `submit` creates draft pull requests by default.
    pub draft: bool,
}

impl Default for HggConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            master_branch: None,
            amend_message: "update".to_string(),
            merge_message: "Sync changes from upstream ({branch})".to_string(),
            draft: false,
        }
    }
}

impl HggConfig {
    /// Loads the configuration from `path`, or from `~/.hgg.toml` when no path is given.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> HgResult<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(default_cfg_path) else {
            return Ok(Self::default());
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        debug!(path = %path.display(), "Loading config");
        Self::from_toml(&std::fs::read_to_string(&path)?)
    }

    /// Parses a configuration from its TOML representation.
    pub fn from_toml(raw: &str) -> HgResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Renders the restack merge commit message for the merged `branch`.
    pub fn merge_message_for(&self, branch: &str) -> String {
        self.merge_message.replace("{branch}", branch)
    }
}

/// Returns the path of the user configuration file, if a home directory exists.
pub fn default_cfg_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HGG_CFG_FILE_NAME))
}

#[cfg(test)]
mod test {
    use super::HggConfig;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg = HggConfig::from_toml("remote = \"upstream\"\ndraft = true\n").unwrap();
        assert_eq!(cfg.remote, "upstream");
        assert!(cfg.draft);
        assert_eq!(cfg.amend_message, "update");
        assert_eq!(cfg.master_branch, None);
    }

    #[test]
    fn merge_message_template() {
        let cfg = HggConfig::from_toml("merge-message = \"merge {branch} in\"").unwrap();
        assert_eq!(cfg.merge_message_for("feature"), "merge feature in");
        assert_eq!(
            HggConfig::default().merge_message_for("main"),
            "Sync changes from upstream (main)"
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(HggConfig::from_toml("remote = [").is_err());
    }
}
