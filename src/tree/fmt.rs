//! Smartlog rendering of the [RepoData] graph.

use super::{NodeId, RepoData};
use crate::{
    constants::{
        BRANCH_COLOR, BRANCH_CONNECTOR, COMMIT_BULLET, HASH_COLOR, HEAD_BULLET, HEAD_HASH_COLOR,
        ROOT_CONNECTOR, TIME_COLOR,
    },
    git::commit::CommitRecord,
};
use nu_ansi_term::Style;
use std::fmt::{Result, Write};

/// Inputs of the smartlog that do not come from the graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartlogOptions<'a> {
    /// The checked out branch, shown in bold.
    pub current_branch: Option<&'a str>,
    /// Current time in seconds since the epoch, for relative ages.
    pub now: i64,
    /// Normalized remote URL, for PR links derived from commit titles.
    pub remote_url: Option<&'a str>,
    /// Whether to emit ANSI colors and hyperlinks.
    pub color: bool,
}

impl SmartlogOptions<'_> {
    fn paint(&self, style: Style, text: &str) -> String {
        if self.color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Renders the age of a commit as `<n>s`, `<n>m`, `<n>h`, `<n>d` or `<n>y`.
pub fn render_relative_time(timestamp: i64, now: i64) -> String {
    let mut elapsed = (now - timestamp).max(0);
    if elapsed < 60 {
        return format!("{}s", elapsed);
    }
    elapsed /= 60;
    if elapsed < 60 {
        return format!("{}m", elapsed);
    }
    elapsed /= 60;
    if elapsed < 24 {
        return format!("{}h", elapsed);
    }
    elapsed /= 24;
    if elapsed < 365 {
        return format!("{}d", elapsed);
    }
    format!("{}y", elapsed / 365)
}

/// Wraps `text` in an OSC 8 terminal hyperlink to `url`.
pub fn hyperlink(text: &str, url: &str) -> String {
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
}

impl RepoData {
    /// Writes the smartlog of the whole graph to `w`.
    ///
    /// Each node is written after its subtree, so the newest branches come first and master
    /// sits at the bottom, just above the root connector.
    pub fn write_smartlog<W: Write>(&self, w: &mut W, opts: &SmartlogOptions<'_>) -> Result {
        self.write_children(w, opts, RepoData::ROOT, "")
    }

    /// Children of `node` in display order: master, then master's history, then oldest first.
    fn sorted_children(&self, node: NodeId) -> Vec<(NodeId, &CommitRecord)> {
        let mut children = self
            .children(node)
            .filter_map(|id| self.commit(id).map(|c| (id, c)))
            .collect::<Vec<_>>();
        children.sort_by_key(|(_, c)| {
            let rank = if c.is_master {
                0
            } else if c.is_ancestor_of_master() {
                1
            } else {
                2
            };
            (rank, c.timestamp, c.hash.clone())
        });
        children
    }

    fn write_children<W: Write>(
        &self,
        w: &mut W,
        opts: &SmartlogOptions<'_>,
        node: NodeId,
        prefix: &str,
    ) -> Result {
        let connector = if self.is_root(node) {
            ROOT_CONNECTOR
        } else {
            BRANCH_CONNECTOR
        };
        let mut main = String::new();

        for (i, (child, commit)) in self.sorted_children(node).into_iter().enumerate() {
            let child_prefix = if i > 0 {
                format!("{}{} ", prefix, main)
            } else {
                format!("{}{}", prefix, main)
            };
            self.write_children(w, opts, child, &child_prefix)?;

            let bullet = if commit.is_head {
                HEAD_BULLET
            } else {
                COMMIT_BULLET
            };
            let graph = if i == 0 {
                format!("{}{}", main, bullet)
            } else {
                format!("{} {}", main, bullet)
            };
            writeln!(w, "{}{} {}", prefix, graph, summary(commit, opts))?;

            main = connector.to_string();
            if i == 0 {
                writeln!(w, "{}{}", prefix, main)?;
            } else {
                writeln!(w, "{}{}/ ", prefix, main)?;
            }
        }
        Ok(())
    }
}

/// One smartlog line: hash, author, branches, PR link, age and title.
fn summary(commit: &CommitRecord, opts: &SmartlogOptions<'_>) -> String {
    let hash_color = if commit.is_head {
        HEAD_HASH_COLOR
    } else {
        HASH_COLOR
    };
    let mut line = format!(
        "{} {} ",
        opts.paint(Style::new().fg(hash_color), &commit.short_hash),
        commit.author
    );

    if !commit.branch_names.is_empty() {
        let plain = Style::new().fg(BRANCH_COLOR);
        line.push_str(&opts.paint(plain, "("));
        let last = commit.branch_names.len() - 1;
        for (i, name) in commit.branch_names.iter().enumerate() {
            let style = if opts.current_branch == Some(name.as_str()) {
                plain.bold()
            } else {
                plain
            };
            let comma = if i == last { "" } else { ", " };
            line.push_str(&opts.paint(style, &format!("{}{}", name, comma)));
        }
        line.push_str(&opts.paint(plain, ") "));
    }

    if let Some((url, text)) = commit.pr_link(opts.remote_url) {
        if opts.color {
            line.push_str(&opts.paint(Style::new().bold(), &format!("{} ", hyperlink(&text, &url))));
        } else {
            line.push_str(&format!("{} ", text));
        }
    }

    line.push_str(&opts.paint(
        Style::new().fg(TIME_COLOR),
        &render_relative_time(commit.timestamp, opts.now),
    ));
    line.push(' ');
    line.push_str(commit.display_title());
    line
}

#[cfg(test)]
mod test {
    use super::{hyperlink, render_relative_time, SmartlogOptions};
    use crate::tree::test_support::graph;

    fn render(repo: &crate::tree::RepoData, opts: &SmartlogOptions<'_>) -> String {
        let mut buf = String::new();
        repo.write_smartlog(&mut buf, opts).unwrap();
        buf
    }

    #[test]
    fn relative_time_units() {
        assert_eq!(render_relative_time(100, 159), "59s");
        assert_eq!(render_relative_time(0, 60), "1m");
        assert_eq!(render_relative_time(0, 3 * 3600), "3h");
        assert_eq!(render_relative_time(0, 2 * 86400), "2d");
        assert_eq!(render_relative_time(0, 800 * 86400), "2y");
        assert_eq!(render_relative_time(100, 50), "0s");
    }

    #[test]
    fn renders_forked_stack() {
        let mut repo = graph(&[
            ("m1", &["main"], 100, None),
            ("b1", &["b"], 300, Some("m1")),
            ("a1", &["a"], 200, Some("m1")),
            ("c1", &["c"], 400, Some("a1")),
        ]);
        let a = repo.require_branch("a").unwrap();
        repo.nodes[a.0].commit.as_mut().unwrap().is_head = true;

        let opts = SmartlogOptions {
            current_branch: Some("a"),
            now: 1000,
            remote_url: None,
            color: false,
        };
        let expected = concat!(
            "o c1 Ada (c) 10m commit c1\n",
            "|\n",
            "* a1 Ada (a) 13m commit a1\n",
            "|\n",
            "| o b1 Ada (b) 11m commit b1\n",
            "|/ \n",
            "o m1 Ada (main) 15m commit m1\n",
            ":\n",
        );
        assert_eq!(render(&repo, &opts), expected);
        // Identical trees render identically.
        assert_eq!(render(&repo, &opts), expected);
    }

    #[test]
    fn renders_several_roots() {
        let repo = graph(&[
            ("m1", &["main"], 100, None),
            ("l1", &["lonely"], 50, None),
        ]);
        let opts = SmartlogOptions {
            now: 100,
            ..Default::default()
        };
        let expected = concat!(
            "o m1 Ada (main) 0s commit m1\n",
            ":\n",
            ": o l1 Ada (lonely) 50s commit l1\n",
            ":/ \n",
        );
        assert_eq!(render(&repo, &opts), expected);
    }

    #[test]
    fn pr_links_are_hyperlinked_in_color() {
        let link = hyperlink("#7", "https://example.com/pull/7");
        assert_eq!(link, "\x1b]8;;https://example.com/pull/7\x1b\\#7\x1b]8;;\x1b\\");
    }
}
