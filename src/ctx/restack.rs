//! Execution of restack plans: merges and rebases, with interactive conflict resolution.

use super::HggContext;
use crate::{
    errors::{HgError, HgResult},
    git::run::{command_line, git_lines, git_streamed, git_streamed_checked},
    tree::traversal::{MergeAction, RebaseAction},
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use nu_ansi_term::Color;
use tracing::{debug, warn};

/// How an interrupted merge or rebase is resumed once conflicts are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Merge,
    Rebase,
}

impl Resume {
    /// Resumes the operation. Returns the failing command line if it stopped again.
    fn run(self) -> HgResult<Option<String>> {
        let args: &[&str] = match self {
            Self::Merge => {
                git_streamed_checked(&["add", "--all"])?;
                &["commit", "--no-edit"]
            }
            Self::Rebase => &["rebase", "--continue"],
        };
        Ok((!git_streamed(args)?).then(|| command_line("git", args)))
    }
}

/// Keeps the terminal in raw mode while alive.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> HgResult<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "Failed to restore the terminal");
        }
    }
}

/// Blocks until a key is pressed. Ctrl+C aborts with [HgError::Interrupted].
fn wait_for_keypress() -> HgResult<()> {
    let _guard = RawModeGuard::enable()?;
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Err(HgError::Interrupted);
            }
            return Ok(());
        }
    }
}

fn unmerged_paths() -> HgResult<Vec<String>> {
    git_lines(&["diff", "--name-only", "--diff-filter=U"])
        .map(|lines| lines.into_iter().filter(|l| !l.is_empty()).collect())
}

/// What the conflict loop does after an attempt at the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConflictStep {
    /// The operation went through.
    Done,
    /// The operation stopped on these unmerged paths.
    Prompt(Vec<String>),
}

/// Decides the next step of the conflict loop from the unmerged `paths` left behind and the
/// command line of the last attempt, if it `failed`.
///
/// ## Returns
/// - `Ok(ConflictStep::Prompt)` - There are unmerged paths, whatever the last attempt did.
/// - `Ok(ConflictStep::Done)` - No unmerged path and the last attempt succeeded.
/// - `Err(HgError::CommandFailed)` - The last attempt failed without leaving any unmerged
///   path, so it failed for some other reason than conflicts.
fn next_step(paths: Vec<String>, failed: Option<String>) -> HgResult<ConflictStep> {
    match (paths.is_empty(), failed) {
        (false, _) => Ok(ConflictStep::Prompt(paths)),
        (true, None) => Ok(ConflictStep::Done),
        (true, Some(command)) => Err(HgError::CommandFailed {
            command,
            stderr: "no unmerged paths to resolve".to_string(),
        }),
    }
}

/// Walks the user through conflicts left by a failed merge or rebase, resuming it after each
/// round until no unmerged path is left.
fn resolve_conflicts(failed: String, resume: Resume) -> HgResult<()> {
    let mut failed = Some(failed);
    loop {
        let paths = match next_step(unmerged_paths()?, failed.take())? {
            ConflictStep::Done => return Ok(()),
            ConflictStep::Prompt(paths) => paths,
        };

        println!("{}", Color::Red.paint("Merge conflicts hit:"));
        for path in &paths {
            println!("{}", Color::Red.paint(format!("  {}", path)));
        }
        println!(
            "{}",
            Color::Red.paint("Resolve the merge conflicts and press any key to continue.")
        );
        println!(
            "{}",
            Color::Red.paint("You don't need to add files or continue the merge.")
        );
        wait_for_keypress()?;
        println!("{}", Color::Green.paint("Continuing"));
        failed = resume.run()?;
    }
}

impl HggContext<'_> {
    /// Runs `merges` in order: each switches to the receiving branch and merges its parent.
    pub fn execute_merges(&self, merges: &[MergeAction]) -> HgResult<()> {
        for merge in merges {
            debug!(from = %merge.branch_to_merge, into = %merge.branch_to_receive, "Merging");
            self.switch(&merge.branch_to_receive)?;

            let message = self.config.merge_message_for(&merge.branch_to_merge);
            let args = ["merge", merge.branch_to_merge.as_str(), "-m", message.as_str()];
            if !git_streamed(&args)? {
                resolve_conflicts(command_line("git", &args), Resume::Merge)?;
            }
        }
        Ok(())
    }

    /// Runs `rebases` in order, keeping the refs of intermediate branches up to date.
    pub fn execute_rebases(&self, rebases: &[RebaseAction]) -> HgResult<()> {
        for rebase in rebases {
            debug!(branch = %rebase.branch_to_rebase, onto = %rebase.onto, "Rebasing");
            git_streamed_checked(&["checkout", &rebase.branch_to_rebase])?;

            let args = [
                "rebase",
                "--onto",
                rebase.onto.as_str(),
                rebase.old_parent_hash.as_str(),
                rebase.branch_to_rebase.as_str(),
                "--update-refs",
                "-X",
                "theirs",
            ];
            if !git_streamed(&args)? {
                resolve_conflicts(command_line("git", &args), Resume::Rebase)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{next_step, ConflictStep};
    use crate::errors::HgError;

    fn paths(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn failure_without_unmerged_paths_is_an_error() {
        let err = next_step(Vec::new(), Some("git merge feature".into())).unwrap_err();
        assert!(matches!(
            err,
            HgError::CommandFailed { ref command, .. } if command == "git merge feature"
        ));
    }

    #[test]
    fn unmerged_paths_prompt() {
        assert_eq!(
            next_step(paths(&["src/lib.rs"]), Some("git merge feature".into())).unwrap(),
            ConflictStep::Prompt(paths(&["src/lib.rs"]))
        );
    }

    #[test]
    fn clean_resume_is_done() {
        assert_eq!(next_step(Vec::new(), None).unwrap(), ConflictStep::Done);
    }

    #[test]
    fn resumed_rebase_stopping_again() {
        // `rebase --continue` stopped on the next commit with new conflicts.
        assert_eq!(
            next_step(paths(&["a.rs", "b.rs"]), Some("git rebase --continue".into())).unwrap(),
            ConflictStep::Prompt(paths(&["a.rs", "b.rs"]))
        );
        // It stopped again, but not on conflicts.
        assert!(matches!(
            next_step(Vec::new(), Some("git rebase --continue".into())),
            Err(HgError::CommandFailed { .. })
        ));
        // Conflicts left behind after a successful step still need resolving.
        assert_eq!(
            next_step(paths(&["a.rs"]), None).unwrap(),
            ConflictStep::Prompt(paths(&["a.rs"]))
        );
    }
}
