//! Invocation of the `git` binary.
//!
//! `git2` has no equivalent for `show-branch`, porcelain merges or rebases with
//! `--update-refs`, so those go through the command line.

use crate::errors::{HgError, HgResult};
use itertools::Itertools;
use nu_ansi_term::Color;
use std::{
    io::Write,
    process::{Command, Output, Stdio},
};
use tracing::debug;

/// Formats a command line for logs and error messages.
pub(crate) fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program).chain(args.iter().copied()).join(" ")
}

/// Runs `git` with `args`, capturing its output.
///
/// Returns the raw [Output] regardless of the exit status.
pub fn git_output(args: &[&str]) -> HgResult<Output> {
    debug!(command = %command_line("git", args), "Running");
    Ok(Command::new("git")
        .args(args)
        .stdin(Stdio::null())
        .output()?)
}

/// Runs `git` with `args` and returns its stdout, failing on a non-zero exit.
pub fn git(args: &[&str]) -> HgResult<String> {
    let output = git_output(args)?;
    if !output.status.success() {
        return Err(HgError::CommandFailed {
            command: command_line("git", args),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Runs `git` with `args` and returns its stdout split into lines, without the trailing newline.
pub fn git_lines(args: &[&str]) -> HgResult<Vec<String>> {
    let out = git(args)?;
    Ok(out
        .trim_end_matches('\n')
        .lines()
        .map(ToOwned::to_owned)
        .collect())
}

/// Runs `git` with `args`, streaming its output to the terminal.
///
/// The command line is echoed first. Returns whether the command succeeded, so that
/// callers can tell a conflicted merge apart from success.
pub fn git_streamed(args: &[&str]) -> HgResult<bool> {
    let line = command_line("git", args);
    println!("{}", Color::DarkGray.paint(format!("+ {}", line)));
    debug!(command = %line, "Running (streamed)");
    let status = Command::new("git").args(args).status()?;
    Ok(status.success())
}

/// Runs `git` with `args` and writes its raw stdout to `out`, failing on a non-zero exit.
///
/// Used for binary patches, which must not go through a lossy UTF-8 conversion.
pub fn git_to_writer<W: Write>(args: &[&str], out: &mut W) -> HgResult<()> {
    let output = git_output(args)?;
    if !output.status.success() {
        return Err(HgError::CommandFailed {
            command: command_line("git", args),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    out.write_all(&output.stdout)?;
    out.flush()?;
    Ok(())
}

/// Runs `git` with `args`, echoing the command and its stdout while also returning the stdout.
pub fn git_tee(args: &[&str]) -> HgResult<String> {
    println!("{}", Color::DarkGray.paint(format!("+ {}", command_line("git", args))));
    let out = git(args)?;
    print!("{}", out);
    Ok(out)
}

/// Runs `git` with `args`, streaming its output, and fails on a non-zero exit.
pub fn git_streamed_checked(args: &[&str]) -> HgResult<()> {
    if git_streamed(args)? {
        Ok(())
    } else {
        Err(HgError::CommandFailed {
            command: command_line("git", args),
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::command_line;

    #[test]
    fn formats_command_line() {
        assert_eq!(
            command_line("git", &["switch", "feature"]),
            "git switch feature"
        );
        assert_eq!(command_line("gh", &[]), "gh");
    }
}
