//! Spec excerpt selection.
//!
//! Short spec documents travel whole. Longer ones are cut down to the
//! sections a task points at with `SPEC.md#<anchor>` context entries.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Spec documents up to this many lines are included verbatim.
pub const FULL_SPEC_LINE_LIMIT: usize = 200;

static ANCHOR_PATTERN: OnceLock<Regex> = OnceLock::new();
static HEADING_PATTERN: OnceLock<Regex> = OnceLock::new();

fn anchor_pattern() -> &'static Regex {
    ANCHOR_PATTERN.get_or_init(|| Regex::new(r"SPEC\.md#(\S+)").expect("valid anchor pattern"))
}

fn heading_pattern() -> &'static Regex {
    HEADING_PATTERN.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("valid heading pattern"))
}

/// Why a delegation carries no spec excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcerptWarning {
    /// No spec document was found.
    SpecMissing,
    /// The spec is long and the task names no `SPEC.md#` anchors.
    NoSpecReferences,
    /// None of the task's anchors matched a heading.
    NoMatchingSections,
}

impl fmt::Display for ExcerptWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SpecMissing => "spec document missing; no excerpt included",
            Self::NoSpecReferences => "spec is long and the task has no SPEC.md references",
            Self::NoMatchingSections => "no spec sections match the task's SPEC.md references",
        })
    }
}

/// Lower-cases `text` and reduces it to hyphen-separated words.
///
/// Underscores count as hyphens; other punctuation is dropped.
#[must_use]
pub fn slugify(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' { '-' } else { c })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    cleaned
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalized anchors named by `SPEC.md#<anchor>` context entries.
#[must_use]
pub fn spec_anchors(context: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    context
        .iter()
        .flat_map(|entry| anchor_pattern().captures_iter(entry))
        .map(|caps| slugify(&caps[1]))
        .filter(|anchor| !anchor.is_empty() && seen.insert(anchor.clone()))
        .collect()
}

struct Heading {
    line: usize,
    level: usize,
    slug: String,
}

/// Markdown headings outside fenced code blocks.
fn headings(lines: &[&str]) -> Vec<Heading> {
    let mut in_fence = false;
    let mut found = Vec::new();
    for (line, text) in lines.iter().enumerate() {
        if text.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = heading_pattern().captures(text) {
            found.push(Heading { line, level: caps[1].len(), slug: slugify(&caps[2]) });
        }
    }
    found
}

/// Slugs of every heading in `spec`.
#[must_use]
pub fn heading_slugs(spec: &str) -> HashSet<String> {
    let lines: Vec<&str> = spec.lines().collect();
    headings(&lines).into_iter().map(|h| h.slug).collect()
}

/// Selects the part of `spec` a task with `context` should see.
///
/// # Errors
///
/// Returns the [`ExcerptWarning`] explaining why nothing was selected.
pub fn extract(spec: Option<&str>, context: &[String]) -> Result<String, ExcerptWarning> {
    let spec = spec.ok_or(ExcerptWarning::SpecMissing)?;
    let lines: Vec<&str> = spec.lines().collect();
    if lines.len() <= FULL_SPEC_LINE_LIMIT {
        return Ok(spec.to_string());
    }

    let anchors = spec_anchors(context);
    if anchors.is_empty() {
        return Err(ExcerptWarning::NoSpecReferences);
    }

    let headings = headings(&lines);
    let mut sections = Vec::new();
    let mut emitted = HashSet::new();
    for (i, heading) in headings.iter().enumerate() {
        // A nested heading with its own anchor starts a new section even when
        // an enclosing section already includes its lines.
        if !anchors.contains(&heading.slug) || !emitted.insert(heading.line) {
            continue;
        }
        let end = headings[i + 1..]
            .iter()
            .find(|next| next.level <= heading.level)
            .map_or(lines.len(), |next| next.line);
        let section = lines[heading.line..end].join("\n");
        let section = section.trim_end();
        if !section.is_empty() {
            sections.push(section.to_string());
        }
    }

    if sections.is_empty() {
        Err(ExcerptWarning::NoMatchingSections)
    } else {
        Ok(sections.join("\n\n"))
    }
}
