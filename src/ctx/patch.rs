//! Binary patches moved between commits through temporary files.

use super::HggContext;
use crate::{
    errors::HgResult,
    git::run::{git_streamed_checked, git_to_writer},
};
use tempfile::NamedTempFile;
use tracing::debug;

const PATCH_FILE_PREFIX: &str = "PATCH_FILE_";

/// Temp file prefix for a patch taken from `label`, which may be a branch name with slashes.
fn patch_file_prefix(label: &str) -> String {
    format!("{}{}_", PATCH_FILE_PREFIX, label.replace(std::path::MAIN_SEPARATOR, "-"))
}

impl HggContext<'_> {
    /// Runs the `git` diff command `diff_args` and stores its output in a temporary file,
    /// deleted when the returned handle is dropped.
    pub fn capture_patch(&self, label: &str, diff_args: &[&str]) -> HgResult<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix(&patch_file_prefix(label))
            .tempfile()?;
        git_to_writer(diff_args, file.as_file_mut())?;
        debug!(path = %file.path().display(), "Captured patch");
        Ok(file)
    }

    /// Applies `patch` to the working tree with `git apply`, adding `flags`.
    pub fn apply_patch(&self, patch: &NamedTempFile, flags: &[&str]) -> HgResult<()> {
        let path = patch.path().to_string_lossy();
        let mut args = vec!["apply", path.as_ref()];
        args.extend_from_slice(flags);
        git_streamed_checked(&args)
    }
}

#[cfg(test)]
mod test {
    use super::patch_file_prefix;

    #[test]
    fn prefix_flattens_branch_paths() {
        let prefix = patch_file_prefix(&format!("team{}feature", std::path::MAIN_SEPARATOR));
        assert_eq!(prefix, "PATCH_FILE_team-feature_");
        assert_eq!(patch_file_prefix("fix"), "PATCH_FILE_fix_");
    }

    #[test]
    fn captured_files_are_removed_on_drop() {
        let file = tempfile::Builder::new()
            .prefix(&patch_file_prefix("fix"))
            .tempfile()
            .unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("PATCH_FILE_fix_"));
        drop(file);
        assert!(!path.exists());
    }
}
