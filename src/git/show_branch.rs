//! Parser for the column dump of `git show-branch`.
//!
//! With several branches the dump starts with a prelude, one line per branch column, then a
//! separator of dashes, then one row per commit:
//!
//! ```text
//! ! [feature-a] Add the widget
//!  * [main] Release 1.0
//! --
//! +  [feature-a] Add the widget
//! +* [main] Release 1.0
//! ```
//!
//! The first characters of a row are the column markers (one per branch). A blank marker
//! means the commit is not in that branch's history. A single branch is printed without
//! prelude or separator, as a lone `[main] Release 1.0` line.

use super::run::git;
use crate::{
    constants::MAX_SHOW_BRANCH_REFS,
    errors::{GraphError, HgResult, ParseError},
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static PRELUDE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[*!]\s*\[(?P<reference>[^\]]+)\]").unwrap());
static SEPARATOR_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-+$").unwrap());
static ROW_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[(?P<reference>[^\]]+)\]").unwrap());

/// A commit row of the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpRow {
    /// One entry per column: whether the commit is in that branch's history.
    pub markers: Vec<bool>,
    /// The symbolic name `git` gives the commit, such as `feature-a` or `main~2`.
    pub reference: String,
}

impl DumpRow {
    /// Whether the commit is in the history of the branch at `column`.
    pub fn is_marked(&self, column: usize) -> bool {
        self.markers.get(column).copied().unwrap_or(false)
    }
}

/// The parsed `git show-branch` dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchDump {
    /// The degenerate dump of a single branch.
    Single { reference: String },
    /// The multi-column dump.
    Columns {
        /// Branch names, in column order.
        columns: Vec<String>,
        /// Commit rows, newest first in topological order.
        rows: Vec<DumpRow>,
    },
}

impl BranchDump {
    /// Parses the raw output of `git show-branch`.
    pub fn parse(output: &str) -> Result<Self, ParseError> {
        let lines = output
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>();
        if lines.is_empty() {
            return Err(ParseError::EmptyShowBranch);
        }

        let Some(separator) = lines.iter().position(|l| SEPARATOR_LINE.is_match(l)) else {
            let reference = capture_reference(&ROW_REFERENCE, lines[0])?;
            return Ok(Self::Single { reference });
        };

        let columns = lines[..separator]
            .iter()
            .map(|line| capture_reference(&PRELUDE_LINE, line))
            .collect::<Result<Vec<_>, _>>()?;
        if lines[separator].len() != columns.len() {
            return Err(ParseError::ShowBranchLine(lines[separator].to_string()));
        }

        let rows = lines[separator + 1..]
            .iter()
            .map(|line| parse_row(line, columns.len()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::Columns { columns, rows })
    }

    /// Returns the column of `branch`, if it has one.
    pub fn column_of(&self, branch: &str) -> Option<usize> {
        match self {
            Self::Single { reference } => (reference == branch).then_some(0),
            Self::Columns { columns, .. } => columns.iter().position(|c| c == branch),
        }
    }
}

fn capture_reference(re: &Regex, line: &str) -> Result<String, ParseError> {
    re.captures(line)
        .and_then(|c| c.name("reference"))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ParseError::ShowBranchLine(line.to_string()))
}

fn parse_row(line: &str, width: usize) -> Result<DumpRow, ParseError> {
    let marker_end = line
        .char_indices()
        .nth(width)
        .map(|(i, _)| i)
        .ok_or_else(|| ParseError::ShowBranchLine(line.to_string()))?;
    let (markers, rest) = line.split_at(marker_end);

    let markers = markers
        .chars()
        .map(|c| match c {
            ' ' => Ok(false),
            '+' | '*' | '-' => Ok(true),
            _ => Err(ParseError::ShowBranchLine(line.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let reference = capture_reference(&ROW_REFERENCE, rest)?;

    Ok(DumpRow { markers, reference })
}

/// Runs `git show-branch` over `branches` and parses its dump.
///
/// ## Returns
/// - `Err(GraphError::TooManyBranches)` - More branches than the dump can lay out, checked
///   before `git` is called.
pub fn show_branches(branches: &[&str]) -> HgResult<BranchDump> {
    check_branch_limit(branches.len())?;

    let mut args = vec!["show-branch", "--topo-order", "--no-color"];
    args.extend_from_slice(branches);
    let dump = BranchDump::parse(&git(&args)?)?;
    if let BranchDump::Columns { rows, .. } = &dump {
        debug!(rows = rows.len(), "Parsed show-branch dump");
    }
    Ok(dump)
}

/// `git show-branch` refuses more than [MAX_SHOW_BRANCH_REFS] references.
fn check_branch_limit(count: usize) -> Result<(), GraphError> {
    if count > MAX_SHOW_BRANCH_REFS {
        return Err(GraphError::TooManyBranches {
            count,
            limit: MAX_SHOW_BRANCH_REFS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{check_branch_limit, show_branches, BranchDump, DumpRow};
    use crate::{
        constants::MAX_SHOW_BRANCH_REFS,
        errors::{GraphError, HgError, ParseError},
    };

    fn row(markers: &str, reference: &str) -> DumpRow {
        DumpRow {
            markers: markers.chars().map(|c| c != ' ').collect(),
            reference: reference.to_string(),
        }
    }

    #[test]
    fn parses_columns() {
        let dump = "\
! [feature-a] Add the widget
 ! [feature-b] Fix the gadget
  * [main] Release 1.0
---
+   [feature-a] Add the widget
 +  [feature-b] Fix the gadget
 +  [feature-b^] Prepare the gadget
+++ [main] Release 1.0
";
        let parsed = BranchDump::parse(dump).unwrap();
        assert_eq!(
            parsed,
            BranchDump::Columns {
                columns: vec!["feature-a".into(), "feature-b".into(), "main".into()],
                rows: vec![
                    row("+  ", "feature-a"),
                    row(" + ", "feature-b"),
                    row(" + ", "feature-b^"),
                    row("+++", "main"),
                ],
            }
        );
        assert_eq!(parsed.column_of("main"), Some(2));
        assert_eq!(parsed.column_of("nope"), None);
    }

    #[test]
    fn star_and_dash_markers_count() {
        let dump = "* [a] x\n ! [b] y\n--\n*  [a] x\n-- [b] merge\n";
        let BranchDump::Columns { rows, .. } = BranchDump::parse(dump).unwrap() else {
            panic!("expected columns");
        };
        assert!(rows[0].is_marked(0));
        assert!(!rows[0].is_marked(1));
        assert!(rows[1].is_marked(0) && rows[1].is_marked(1));
    }

    #[test]
    fn single_branch() {
        assert_eq!(
            BranchDump::parse("[main] Initial commit\n").unwrap(),
            BranchDump::Single {
                reference: "main".into()
            }
        );
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert_eq!(BranchDump::parse("\n"), Err(ParseError::EmptyShowBranch));
        assert_eq!(
            BranchDump::parse("garbage"),
            Err(ParseError::ShowBranchLine("garbage".into()))
        );
        assert_eq!(
            BranchDump::parse("! [a] x\n ! [b] y\n--\n+? [a] x\n"),
            Err(ParseError::ShowBranchLine("+? [a] x".into()))
        );
        assert_eq!(
            BranchDump::parse("! [a] x\n ! [b] y\n--\n+  no reference\n"),
            Err(ParseError::ShowBranchLine(" no reference".into()))
        );
    }

    #[test]
    fn too_many_branches_fail_before_running_git() {
        let names = (0..27).map(|i| format!("b{}", i)).collect::<Vec<_>>();
        let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
        assert!(matches!(
            show_branches(&refs),
            Err(HgError::Graph(GraphError::TooManyBranches {
                count: 27,
                limit: 26
            }))
        ));
    }

    #[test]
    fn branch_limit_is_inclusive() {
        assert_eq!(check_branch_limit(0), Ok(()));
        assert_eq!(check_branch_limit(MAX_SHOW_BRANCH_REFS), Ok(()));
        assert_eq!(
            check_branch_limit(MAX_SHOW_BRANCH_REFS + 1),
            Err(GraphError::TooManyBranches {
                count: MAX_SHOW_BRANCH_REFS + 1,
                limit: MAX_SHOW_BRANCH_REFS
            })
        );

        let names = (0..MAX_SHOW_BRANCH_REFS)
            .map(|i| format!("b{}", i))
            .collect::<Vec<_>>();
        let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
        assert!(!matches!(
            show_branches(&refs),
            Err(HgError::Graph(GraphError::TooManyBranches { .. }))
        ));
    }
}
