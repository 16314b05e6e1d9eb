//! Per-branch descriptions, stored under `branch.<name>.description` in the git config.

use super::RepositoryExt;
use crate::{constants::PR_URL_PREFIX, errors::HgResult};
use git2::Repository;
use std::{collections::HashMap, fmt};

/// User-authored metadata of a branch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BranchDescription {
    pub title: String,
    pub body: String,
    pub pr_url: Option<String>,
}

impl BranchDescription {
    /// Parses the stored text of a description.
    ///
    /// The first line is the title. A last line starting with `PR: ` becomes the PR URL, and
    /// the lines in between are the body. Surrounding whitespace is dropped.
    pub fn parse(raw: &str) -> Self {
        let mut lines = raw.trim().lines();
        let title = lines.next().unwrap_or_default().trim().to_string();
        let rest = lines.collect::<Vec<_>>().join("\n");
        let rest = rest.trim();

        let (body, pr_url) = match rest.rsplit_once('\n') {
            Some((body, last)) if last.starts_with(PR_URL_PREFIX) => {
                (body.trim(), Some(&last[PR_URL_PREFIX.len()..]))
            }
            None if rest.starts_with(PR_URL_PREFIX) => ("", Some(&rest[PR_URL_PREFIX.len()..])),
            _ => (rest, None),
        };

        Self {
            title,
            body: body.to_string(),
            pr_url: pr_url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        }
    }

    /// Builds the description a branch falls back to: its tip commit's title, alone.
    pub fn from_title(title: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            ..Default::default()
        }
    }
}

impl fmt::Display for BranchDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.title, self.body)?;
        if let Some(url) = &self.pr_url {
            write!(f, "\n\n{}{}\n\n", PR_URL_PREFIX, url)?;
        }
        Ok(())
    }
}

/// A description as seen by the editor: either stored, or synthesized from the tip commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionSource {
    Stored(BranchDescription),
    Fallback(BranchDescription),
}

impl DescriptionSource {
    pub fn description(&self) -> &BranchDescription {
        match self {
            Self::Stored(d) | Self::Fallback(d) => d,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

fn description_key(branch: &str) -> String {
    format!("branch.{}.description", branch)
}

/// Reads the stored description of `branch`.
///
/// ## Returns
/// - `Ok(Some(_))` - A description is stored.
/// - `Ok(None)` - No description is stored.
pub fn get_description(repo: &Repository, branch: &str) -> HgResult<Option<BranchDescription>> {
    Ok(repo
        .config_string(&description_key(branch))?
        .map(|raw| BranchDescription::parse(&raw)))
}

/// Stores `description` for `branch`.
pub fn set_description(
    repo: &Repository,
    branch: &str,
    description: &BranchDescription,
) -> HgResult<()> {
    repo.set_config_string(&description_key(branch), &description.to_string())
}

/// Reads the stored description of `branch`, falling back to `tip_title`.
pub fn get_description_or_fallback(
    repo: &Repository,
    branch: &str,
    tip_title: &str,
) -> HgResult<DescriptionSource> {
    Ok(match get_description(repo, branch)? {
        Some(description) => DescriptionSource::Stored(description),
        None => DescriptionSource::Fallback(BranchDescription::from_title(tip_title)),
    })
}

/// Reads every stored branch description, keyed by branch name.
pub fn all_descriptions(repo: &Repository) -> HgResult<HashMap<String, BranchDescription>> {
    let config = repo.config()?.snapshot()?;
    let mut descriptions = HashMap::new();
    let mut entries = config.entries(Some(r"branch\..*\.description"))?;
    while let Some(entry) = entries.next() {
        let entry = entry?;
        let (Some(name), Some(value)) = (entry.name(), entry.value()) else {
            continue;
        };
        let Some(branch) = name
            .strip_prefix("branch.")
            .and_then(|n| n.strip_suffix(".description"))
        else {
            continue;
        };
        descriptions.insert(branch.to_string(), BranchDescription::parse(value));
    }
    Ok(descriptions)
}

#[cfg(test)]
mod test {
    use super::{BranchDescription, DescriptionSource};

    fn round_trip(d: &BranchDescription) -> BranchDescription {
        BranchDescription::parse(&d.to_string())
    }

    #[test]
    fn round_trips() {
        let full = BranchDescription {
            title: "Add caching".into(),
            body: "Caches lookups.\n\nSecond paragraph.".into(),
            pr_url: Some("https://github.com/acme/widgets/pull/12".into()),
        };
        assert_eq!(round_trip(&full), full);

        let no_body = BranchDescription {
            title: "Only a title".into(),
            body: String::new(),
            pr_url: None,
        };
        assert_eq!(round_trip(&no_body), no_body);

        let url_no_body = BranchDescription {
            pr_url: Some("https://github.com/acme/widgets/pull/3".into()),
            ..no_body.clone()
        };
        assert_eq!(round_trip(&url_no_body), url_no_body);
    }

    #[test]
    fn serialization_layout() {
        let d = BranchDescription {
            title: "T".into(),
            body: "B".into(),
            pr_url: Some("u".into()),
        };
        assert_eq!(d.to_string(), "T\nB\n\nPR: u\n\n");
    }

    #[test]
    fn whitespace_is_normalized() {
        let parsed = BranchDescription::parse("\n  Title  \n\n  body line\n\n");
        assert_eq!(parsed.title, "Title");
        assert_eq!(parsed.body, "body line");
        assert_eq!(parsed.pr_url, None);
    }

    #[test]
    fn fallback_is_distinguishable() {
        let fallback = DescriptionSource::Fallback(BranchDescription::from_title(" Fix bug "));
        assert!(!fallback.is_stored());
        assert_eq!(fallback.description().title, "Fix bug");
        assert_eq!(fallback.description().body, "");

        let stored = DescriptionSource::Stored(BranchDescription::default());
        assert!(stored.is_stored());
    }
}
