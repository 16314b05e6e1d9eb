//! Constants for the `hgg` application.

use nu_ansi_term::Color;

/// Name of the user configuration file, relative to the home directory.
pub(crate) const HGG_CFG_FILE_NAME: &str = ".hgg.toml";

/// Sentinel line terminating each record of the bulk commit metadata query.
pub(crate) const END_BODY_MARKER: &str = "__ENDBODY__";

/// `--pretty` format of the bulk commit metadata query. See [crate::git::commit].
pub(crate) const REV_LIST_FORMAT: &str = "%h%n%an%n%cr%n%ct%n%D%n%s%n%b%n__ENDBODY__";

/// Maximum number of refs `git show-branch` can lay out in columns.
pub(crate) const MAX_SHOW_BRANCH_REFS: usize = 26;

/// Prefix of the line carrying the pull request URL in a branch description.
pub(crate) const PR_URL_PREFIX: &str = "PR: ";

/// Revision shorthand for the parent branch of the current branch.
pub(crate) const PARENT_REV: &str = ".^";

/// Fields requested from `gh` for every pull request.
pub(crate) const PR_JSON_FIELDS: &str = "url,number,state,title,baseRefName,headRefName,body";

/// Prefix `git remote prune` prints in front of each pruned remote branch.
pub(crate) const PRUNED_LINE_PREFIX: &str = " * [pruned] ";

pub(crate) const HEAD_BULLET: char = '*';
pub(crate) const COMMIT_BULLET: char = 'o';
pub(crate) const ROOT_CONNECTOR: char = ':';
pub(crate) const BRANCH_CONNECTOR: char = '|';

pub(crate) const HASH_COLOR: Color = Color::Yellow;
pub(crate) const HEAD_HASH_COLOR: Color = Color::Magenta;
pub(crate) const BRANCH_COLOR: Color = Color::Green;
pub(crate) const TIME_COLOR: Color = Color::Blue;
