//! Line-based cleanup of converted markdown
//!
//! Post-processing streams over lines instead of running document-wide
//! regexes, so inline formatting such as `**bold**` is never mistaken for
//! block syntax. Code fence content passes through untouched.

use log::warn;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Bounded quantifiers prevent catastrophic backtracking
    Regex::new(r"\[([^\]]{0,500})\]\(([^\)\s]{1,2000})((?:\s+\x22[^\x22]*\x22)?)\)")
        .expect("LINK_RE: hardcoded regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineType {
    Blank,
    Heading,
    CodeFence,
    Other,
}

impl LineType {
    fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            return Self::CodeFence;
        }
        if trimmed.starts_with('#') {
            let hashes = trimmed.chars().take_while(|&c| c == '#').count();
            let rest = &trimmed[hashes..];
            if hashes <= 6 && (rest.is_empty() || rest.starts_with(' ')) {
                return Self::Heading;
            }
        }
        Self::Other
    }
}

/// Single-pass whitespace normalizer
struct Normalizer {
    output: Vec<String>,
    prev_type: LineType,
    /// Opening fence marker while inside a code block
    open_fence: Option<String>,
}

impl Normalizer {
    fn run(input: &str) -> String {
        let mut this = Self {
            output: Vec::new(),
            prev_type: LineType::Blank,
            open_fence: None,
        };
        for line in input.lines() {
            this.emit(line);
        }

        while this.output.last().is_some_and(|l| l.trim().is_empty()) {
            this.output.pop();
        }
        this.output.join("\n")
    }

    fn emit(&mut self, line: &str) {
        if let Some(fence) = &self.open_fence {
            if closes_fence(fence, line) {
                self.open_fence = None;
                self.output.push(line.trim_end().to_string());
                self.prev_type = LineType::CodeFence;
            } else {
                self.output.push(line.to_string());
            }
            return;
        }

        let line = line.trim_end();
        let line_type = LineType::classify(line);

        match line_type {
            LineType::Blank => {
                if !self.output.is_empty() && self.prev_type != LineType::Blank {
                    self.output.push(String::new());
                }
            }
            LineType::CodeFence => {
                self.open_fence = fence_marker(line).map(str::to_string);
                self.blank_before();
                self.output.push(line.to_string());
            }
            LineType::Heading => {
                self.blank_before();
                self.output.push(line.to_string());
            }
            LineType::Other => self.output.push(line.to_string()),
        }
        self.prev_type = line_type;
    }

    fn blank_before(&mut self) {
        if !self.output.is_empty() && self.prev_type != LineType::Blank {
            self.output.push(String::new());
        }
    }
}

/// The backtick or tilde run opening a fenced code block, if `line` is one
fn fence_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let fence_char = trimmed.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = trimmed.chars().take_while(|&c| c == fence_char).count();
    (len >= 3).then(|| &trimmed[..len])
}

/// A closing fence uses the opening character, is at least as long, and
/// carries no info string
fn closes_fence(open: &str, line: &str) -> bool {
    fence_marker(line).is_some_and(|marker| {
        marker.starts_with(open) && line.trim()[marker.len()..].trim().is_empty()
    })
}

/// Tidy whitespace in converted markdown
///
/// Strips trailing whitespace, collapses runs of blank lines to one, puts a
/// blank line before headings and code fences, and trims the document
/// edges. Lines inside fenced code blocks are kept verbatim.
#[must_use]
pub fn normalize_whitespace(markdown: &str) -> String {
    Normalizer::run(markdown)
}

/// Resolve relative link and image targets against `base`
///
/// Fragment-only links, absolute URLs, and special schemes (`mailto:`,
/// `tel:`, `javascript:`, `data:`) are kept as they are.
#[must_use]
pub fn resolve_relative_links(markdown: &str, base: &Url) -> String {
    let mut open_fence: Option<&str> = None;
    let mut lines = Vec::new();

    for line in markdown.lines() {
        match open_fence {
            Some(open) => {
                if closes_fence(open, line) {
                    open_fence = None;
                }
                lines.push(line.to_string());
                continue;
            }
            None => {
                if let Some(marker) = fence_marker(line) {
                    open_fence = Some(marker);
                    lines.push(line.to_string());
                    continue;
                }
            }
        }
        if !line.contains("](") {
            lines.push(line.to_string());
            continue;
        }

        let resolved = LINK_RE.replace_all(line, |caps: &Captures<'_>| {
            let text = &caps[1];
            let target = &caps[2];
            let title = &caps[3];
            format!("[{text}]({}{title})", resolve(base, target))
        });
        lines.push(resolved.into_owned());
    }

    let mut out = lines.join("\n");
    if markdown.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn resolve(base: &Url, target: &str) -> String {
    const KEEP_PREFIXES: [&str; 7] = ["#", "http://", "https://", "mailto:", "tel:", "javascript:", "data:"];
    if KEEP_PREFIXES.iter().any(|p| target.starts_with(p)) {
        return target.to_string();
    }

    match base.join(target) {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!("Failed to resolve URL '{target}' against base '{base}': {e}");
            target.to_string()
        }
    }
}
