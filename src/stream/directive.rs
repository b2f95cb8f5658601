//! Extraction of action directives from generated text.
//!
//! The agent embeds line-item instructions inside its free-text output:
//!
//! ```text
//! <action>+ description='Site Clearing', quantity=1, unit_price=1500, amount=1500</action>
//! ```
//!
//! Each fragment yields one `field=value` directive per comma-separated
//! segment. The text is natural-language model output, so the parser is
//! tolerant: fragments are matched non-greedily, segments without an `=` are
//! dropped, and quoting is honored but never required. The comma tokenizer is
//! a deliberate hand-written state machine rather than a regex because values
//! may contain arbitrary punctuation.

use once_cell::sync::Lazy;
use regex::Regex;

static ACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<action>([^<]+)</action>").expect("action fragment regex"));

/// One `field=value` instruction extracted from generated text.
///
/// The value is always text with surrounding quotes stripped; numeric
/// interpretation is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDirective {
    pub field: String,
    pub value: String,
}

/// Extract every directive from `text`, in fragment order then intra-fragment
/// order. Text outside `<action>...</action>` fragments is ignored; empty
/// input yields an empty sequence.
pub fn parse_action_items(text: &str) -> Vec<ActionDirective> {
    let mut items = Vec::new();
    for captures in ACTION_RE.captures_iter(text) {
        let content = strip_leading_plus(&captures[1]);
        for segment in split_segments(content) {
            if let Some(directive) = parse_segment(&segment) {
                items.push(directive);
            }
        }
    }
    items
}

/// Remove one optional leading `+` marker with surrounding whitespace.
fn strip_leading_plus(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix('+') {
        Some(rest) => rest.trim(),
        None => trimmed,
    }
}

/// Split on commas outside quotes. A quote character opens a quoted span that
/// only the same character closes; the other quote character inside it is
/// ordinary text. The final segment (no trailing comma) is included.
fn split_segments(content: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut open_quote: Option<char> = None;

    for ch in content.chars() {
        match open_quote {
            Some(quote) if ch == quote => {
                open_quote = None;
                current.push(ch);
            }
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => {
                open_quote = Some(ch);
                current.push(ch);
            }
            None if ch == ',' => {
                if !current.trim().is_empty() {
                    segments.push(current.trim().to_string());
                }
                current.clear();
            }
            None => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        segments.push(current.trim().to_string());
    }
    segments
}

/// Split one segment on its first `=`. Segments where no `=` is found past
/// the first character are dropped.
fn parse_segment(segment: &str) -> Option<ActionDirective> {
    let equal_index = segment.find('=')?;
    if equal_index == 0 {
        return None;
    }
    let field = segment[..equal_index].trim().to_string();
    let value = strip_quotes(segment[equal_index + 1..].trim()).to_string();
    Some(ActionDirective { field, value })
}

/// Strip one optional leading and one optional trailing quote character,
/// independently (they are not required to match each other).
fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix(['\'', '"']).unwrap_or(value);
    value.strip_suffix(['\'', '"']).unwrap_or(value)
}
