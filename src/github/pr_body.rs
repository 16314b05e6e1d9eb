//! Stack links embedded in pull request bodies.
//!
//! `submit` writes a small table at the top of every PR body naming the previous and next
//! PRs of the stack. Older versions of the tool used other encodings, which are still read so
//! that existing PRs keep their links:
//!
//! 1. [PrBodyFormat::CommentMarkers]: `* **Previous:** #1<!-- previous -->` lines followed by
//!    an `<!-- end preamble -->` line.
//! 2. [PrBodyFormat::LegacyTable]: an HTML-padded table before `<!-- end preamble -->`.
//! 3. [PrBodyFormat::StackTable]: the quoted table written by [PrBody::to_markdown].

use super::{pr_number_from_ref, pr_ref};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_width::UnicodeWidthStr;

const PREVIOUS_COMMENT: &str = "<!-- previous -->";
const NEXT_COMMENT: &str = "<!-- next -->";
const END_PREAMBLE_COMMENT: &str = "<!-- end preamble -->";
const PREVIOUS_PREFIX: &str = "* **Previous:** ";
const NEXT_PREFIX: &str = "* **Next:** ";
const EMPTY_ANNOTATION: &str = "&nbsp;";
const NBSP: char = '\u{a0}';
const CURRENT_CELL: &str = "*This PR*";
const TABLE_HEADERS: [&str; 3] = ["← Previous", "⬤ Current", "→ Next"];
const TABLE_PREFIX: &str = "> ";

static LEGACY_TABLE: Lazy<Regex> = Lazy::new(|| {
    let nbsp = |n: usize| EMPTY_ANNOTATION.repeat(n);
    let pattern = format!(
        "(?s){}(?P<prev>.*){}(?:<br>)*{}(?P<next>.*){}",
        regex::escape(&format!("| ◀<br>{0}Previous{0}<br>", nbsp(6))),
        regex::escape(" | Current"),
        regex::escape(&format!(" | ▶<br>{0}Next{0}<br>", nbsp(10))),
        regex::escape(" |\n| ------------- | ------------- | ------------- |"),
    );
    Regex::new(&pattern).unwrap()
});

static STACK_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^> \|\s*(?P<prev>.*?)\s*\|\s*\*This PR\*\s*\|\s*(?P<next>.*?)\s*\|$").unwrap()
});

/// The encoding a PR body was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrBodyFormat {
    CommentMarkers,
    LegacyTable,
    StackTable,
    /// No stack links: the whole body is the description.
    Plain,
}

/// A pull request body split into stack links and the user's description.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrBody {
    pub previous_pr: Option<u64>,
    pub next_prs: Vec<u64>,
    pub description: String,
}

type FormatParser = fn(&str) -> Option<PrBody>;

/// Format attempts, in order. The first one recognizing the body wins.
const PARSERS: [(PrBodyFormat, FormatParser); 3] = [
    (PrBodyFormat::CommentMarkers, parse_comment_markers),
    (PrBodyFormat::LegacyTable, parse_legacy_table),
    (PrBodyFormat::StackTable, parse_stack_table),
];

impl PrBody {
    /// Parses a PR body written in any known format.
    pub fn parse(raw: &str) -> Self {
        Self::parse_with_format(raw).1
    }

    /// Parses a PR body, also returning the format it was recognized as.
    pub fn parse_with_format(raw: &str) -> (PrBodyFormat, Self) {
        PARSERS
            .iter()
            .find_map(|(format, parser)| parser(raw).map(|body| (*format, body)))
            .unwrap_or_else(|| {
                (
                    PrBodyFormat::Plain,
                    Self {
                        description: raw.to_string(),
                        ..Default::default()
                    },
                )
            })
    }

    pub fn has_links(&self) -> bool {
        self.previous_pr.is_some() || !self.next_prs.is_empty()
    }

    /// Adds `number` to the next PRs, unless it is already there.
    pub fn add_next(&mut self, number: u64) -> bool {
        if self.next_prs.contains(&number) {
            return false;
        }
        self.next_prs.push(number);
        true
    }

    /// Renders the body in the current format: the stack table, then the description.
    pub fn to_markdown(&self) -> String {
        if !self.has_links() {
            return self.description.clone();
        }

        let previous = self.previous_pr.map(pr_ref).unwrap_or_default();
        let next = self.next_prs.iter().sorted().map(|n| pr_ref(*n)).join(", ");
        let table = single_row_table(TABLE_HEADERS, [&previous, CURRENT_CELL, &next]);
        format!(
            "> [!NOTE]\n> This PR is part of a stack:\n{}\n\n{}",
            table, self.description
        )
    }
}

fn parse_comment_markers(raw: &str) -> Option<PrBody> {
    let lines = raw.split('\n').collect::<Vec<_>>();
    let mut body = PrBody::default();
    for (i, line) in lines.iter().enumerate() {
        if let Some(rest) = line.strip_suffix(PREVIOUS_COMMENT) {
            let reference = rest.strip_prefix(PREVIOUS_PREFIX).unwrap_or(rest);
            body.previous_pr = pr_number_from_ref(reference);
        } else if let Some(rest) = line.strip_suffix(NEXT_COMMENT) {
            let reference = rest.strip_prefix(NEXT_PREFIX).unwrap_or(rest);
            body.next_prs = pr_number_from_ref(reference).into_iter().collect();
        } else if *line == END_PREAMBLE_COMMENT {
            body.description = lines.get(i + 2..).unwrap_or_default().join("\n");
            break;
        }
    }
    body.has_links().then_some(body)
}

fn parse_legacy_table(raw: &str) -> Option<PrBody> {
    let lines = raw.split('\n').collect::<Vec<_>>();
    let end = lines.iter().position(|l| *l == END_PREAMBLE_COMMENT)?;

    let mut body = PrBody {
        description: lines.get(end + 2..).unwrap_or_default().join("\n"),
        ..Default::default()
    };

    let table = lines[..end].join("\n");
    let table = table.trim();
    if table.is_empty() {
        return Some(body);
    }

    let captures = LEGACY_TABLE.captures(table)?;
    let prev = captures.name("prev").map_or("", |m| m.as_str());
    let next = captures.name("next").map_or("", |m| m.as_str());

    let prev = prev.split("<br>").next().unwrap_or_default();
    if prev != EMPTY_ANNOTATION {
        body.previous_pr = pr_number_from_ref(prev);
    }
    if next != EMPTY_ANNOTATION {
        body.next_prs = next.split("<br>").filter_map(pr_number_from_ref).collect();
    }
    body.has_links().then_some(body)
}

fn parse_stack_table(raw: &str) -> Option<PrBody> {
    let lines = raw.split('\n').collect::<Vec<_>>();
    let (row, captures) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| STACK_ROW.captures(line.trim()).map(|c| (i, c)))?;

    let prev = captures.name("prev").map_or("", |m| m.as_str()).trim();
    let next = captures.name("next").map_or("", |m| m.as_str()).trim();
    let body = PrBody {
        previous_pr: pr_number_from_ref(prev),
        next_prs: if next.is_empty() {
            Vec::new()
        } else {
            next.split(", ").filter_map(pr_number_from_ref).collect()
        },
        description: lines[row + 1..].join("\n").trim().to_string(),
    };
    body.has_links().then_some(body)
}

/// Renders a three-column, single-row markdown table, each line prefixed with `> `.
///
/// The outer columns share one width. Non-empty outer cells of the data row are centered with
/// non-breaking spaces, scaled up for GitHub's proportional font.
fn single_row_table(headers: [&str; 3], row: [&str; 3]) -> String {
    let outer = [headers[0], row[0], headers[2], row[2]]
        .iter()
        .map(|c| c.width())
        .max()
        .unwrap_or_default();
    let middle = headers[1].width().max(row[1].width());

    let pad = |content: &str, width: usize| {
        let len = content.width();
        format!("{}{}", content, " ".repeat(width.saturating_sub(len)))
    };
    let center = |content: &str, width: usize| {
        let len = content.width();
        if len == 0 {
            return pad(content, width);
        }
        let padding = (width * 3 / 2).saturating_sub(len);
        let left = padding / 2;
        format!(
            "{}{}{}",
            NBSP.to_string().repeat(left),
            content,
            NBSP.to_string().repeat(padding - left)
        )
    };

    [
        [pad(headers[0], outer), pad(headers[1], middle), pad(headers[2], outer)],
        ["-".repeat(outer), "-".repeat(middle), "-".repeat(outer)],
        [center(row[0], outer), pad(row[1], middle), center(row[2], outer)],
    ]
    .iter()
    .map(|[a, b, c]| format!("{}| {} | {} | {} |", TABLE_PREFIX, a, b, c))
    .join("\n")
}

#[cfg(test)]
mod test {
    use super::{PrBody, PrBodyFormat};

    #[test]
    fn comment_marker_format() {
        let raw = "* **Previous:** #12<!-- previous -->\n* **Next:** https://github.com/acme/widgets/pull/14<!-- next -->\n<!-- end preamble -->\n\nFixes the widget.\nSecond line.";
        let (format, body) = PrBody::parse_with_format(raw);
        assert_eq!(format, PrBodyFormat::CommentMarkers);
        assert_eq!(
            body,
            PrBody {
                previous_pr: Some(12),
                next_prs: vec![14],
                description: "Fixes the widget.\nSecond line.".into(),
            }
        );
    }

    #[test]
    fn legacy_table_format() {
        let nbsp6 = "&nbsp;".repeat(6);
        let nbsp10 = "&nbsp;".repeat(10);
        let raw = format!(
            "| ◀<br>{nbsp6}Previous{nbsp6}<br>#12 | Current<br> | ▶<br>{nbsp10}Next{nbsp10}<br>#14<br>#15 |\n| ------------- | ------------- | ------------- |\n<!-- end preamble -->\n\nFixes the widget."
        );
        let (format, body) = PrBody::parse_with_format(&raw);
        assert_eq!(format, PrBodyFormat::LegacyTable);
        assert_eq!(
            body,
            PrBody {
                previous_pr: Some(12),
                next_prs: vec![14, 15],
                description: "Fixes the widget.".into(),
            }
        );

        let no_previous = raw.replace("<br>#12 |", "<br>&nbsp; |");
        let body = PrBody::parse(&no_previous);
        assert_eq!(body.previous_pr, None);
        assert_eq!(body.next_prs, vec![14, 15]);
    }

    #[test]
    fn legacy_empty_table_has_no_links() {
        let (format, body) = PrBody::parse_with_format("<!-- end preamble -->\n\nJust text.");
        assert_eq!(format, PrBodyFormat::LegacyTable);
        assert_eq!(body.description, "Just text.");
        assert!(!body.has_links());
    }

    #[test]
    fn stack_table_format() {
        let raw = "> [!NOTE]\n> This PR is part of a stack:\n> | ← Previous | ⬤ Current | → Next |\n> | --- | --- | --- |\n> |  #12  | *This PR* | #14, #15 |\n\nFixes the widget.\n";
        let (format, body) = PrBody::parse_with_format(raw);
        assert_eq!(format, PrBodyFormat::StackTable);
        assert_eq!(
            body,
            PrBody {
                previous_pr: Some(12),
                next_prs: vec![14, 15],
                description: "Fixes the widget.".into(),
            }
        );
    }

    #[test]
    fn formats_agree_on_equivalent_content() {
        let expected = PrBody {
            previous_pr: Some(3),
            next_prs: vec![],
            description: "Body.".into(),
        };
        let comment = PrBody::parse("* **Previous:** #3<!-- previous -->\n<!-- end preamble -->\n\nBody.");
        let table = PrBody::parse("> |  #3  | *This PR* |  |\n\nBody.");
        assert_eq!(comment, expected);
        assert_eq!(table, expected);
    }

    #[test]
    fn plain_body_is_all_description() {
        let (format, body) = PrBody::parse_with_format("Just a description.\n| not | a | stack |");
        assert_eq!(format, PrBodyFormat::Plain);
        assert_eq!(body.description, "Just a description.\n| not | a | stack |");
        assert!(!body.has_links());
    }

    #[test]
    fn markdown_round_trips() {
        let body = PrBody {
            previous_pr: Some(12),
            next_prs: vec![15, 14],
            description: "Fixes the widget.\n\nMore details.".into(),
        };
        let rendered = body.to_markdown();
        assert!(rendered.starts_with("> [!NOTE]\n> This PR is part of a stack:\n> | ← Previous |"));
        assert!(rendered.contains("#14, #15"));

        let parsed = PrBody::parse(&rendered);
        assert_eq!(parsed.previous_pr, Some(12));
        assert_eq!(parsed.next_prs, vec![14, 15]);
        assert_eq!(parsed.description, body.description);

        let only_next = PrBody {
            previous_pr: None,
            next_prs: vec![7],
            description: "D".into(),
        };
        assert_eq!(PrBody::parse(&only_next.to_markdown()), only_next);
    }

    #[test]
    fn table_layout() {
        let body = PrBody {
            previous_pr: Some(12),
            next_prs: vec![],
            description: String::new(),
        };
        let nbsp = '\u{a0}';
        let lines = body.to_markdown().lines().map(String::from).collect::<Vec<_>>();
        assert!(lines[2].starts_with("> | ← Previous | "));
        assert!(lines[2].ends_with(" | → Next     |"));
        assert!(lines[3].starts_with("> | ---------- | "));
        assert!(lines[3].ends_with(" | ---------- |"));
        let centered = format!("> | {0}#12{0} | *This PR*", nbsp.to_string().repeat(6));
        assert!(lines[4].starts_with(&centered));
        assert!(lines[4].ends_with(&format!(" | {} |", " ".repeat(10))));
    }

    #[test]
    fn links_without_stack_render_plain() {
        let body = PrBody {
            description: "Only text".into(),
            ..Default::default()
        };
        assert_eq!(body.to_markdown(), "Only text");
    }
}
