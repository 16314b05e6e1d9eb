//! `edit` subcommand.

use crate::{
    ctx::HggContext,
    git::{
        description::{get_description_or_fallback, set_description, BranchDescription},
        RepositoryExt,
    },
};
use anyhow::{bail, Context, Result};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `edit` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct EditCmd {
    /// Branch, or commit of a branch, whose description to edit. Defaults to the current branch.
    #[clap(index = 1)]
    rev: Option<String>,
}

impl EditCmd {
    /// Run the `edit` subcommand.
    ///
    /// The first line of the description is the PR title, the rest after a blank line is the
    /// PR body.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let branch = match self.rev {
            Some(rev) => ctx
                .require_branch_name(&rev)
                .with_context(|| format!("resolving `{}` to a branch", rev))?,
            None => ctx.current_branch()?,
        };

        let title = ctx.repository.branch_tip_title(&branch)?;
        let current = get_description_or_fallback(ctx.repository, &branch, &title)?;
        let comment_char = ctx.repository.comment_char()?;

        let edited = inquire::Editor::new(&format!(
            "Description of branch `{}`",
            Color::Blue.paint(&branch)
        ))
        .with_predefined_text(&description_template(
            &current.description().to_string(),
            &branch,
            comment_char,
        ))
        .with_file_extension(".txt")
        .prompt()?;

        let edited = strip_comments(&edited, comment_char);
        if edited.is_empty() {
            bail!("Description of branch `{}` left empty; nothing saved.", branch);
        }
        set_description(ctx.repository, &branch, &BranchDescription::parse(&edited))
            .with_context(|| format!("writing the description of branch `{}`", branch))?;
        Ok(())
    }
}

/// The text presented in the editor: the description, then instructions as comment lines.
fn description_template(description: &str, branch: &str, comment_char: char) -> String {
    format!(
        "{desc}\n{c} Please edit the description for the branch\n{c}   {branch}\n{c} Lines starting with '{c}' will be stripped.\n",
        desc = description.trim(),
        c = comment_char,
        branch = branch,
    )
}

/// Drops comment lines and surrounding blank lines.
fn strip_comments(text: &str, comment_char: char) -> String {
    text.lines()
        .filter(|line| !line.starts_with(comment_char))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod test {
    use super::{description_template, strip_comments};

    #[test]
    fn template_round_trips_through_comment_stripping() {
        let description = "Add widgets\n\nThe body.\n\nPR: https://github.com/acme/widgets/pull/3";
        let template = description_template(description, "widgets", '#');
        assert!(template.starts_with("Add widgets\n\nThe body."));
        assert!(template.contains("#   widgets\n"));
        assert_eq!(strip_comments(&template, '#'), description);
    }

    #[test]
    fn custom_comment_char() {
        let template = description_template("Title", "b", ';');
        assert!(template.contains("; Lines starting with ';' will be stripped."));
        assert_eq!(strip_comments(&template, ';'), "Title");
        assert_eq!(strip_comments("; only comments\n", ';'), "");
    }
}
