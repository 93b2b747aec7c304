//! Placeholder scanning for the two template syntaxes, `[key:arg]` and `{key:arg}`.
//!
//! A key never contains the syntax's own brackets or a colon. The argument may
//! contain colons (`{date:HH:mm:ss}`), so only the first colon divides key from
//! argument. Unterminated brackets never match and stay literal text.

use once_cell::sync::Lazy;
use regex::Regex;

static SQUARE_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^:\[\]]+):([^\[\]]*)\]").expect("valid square pattern"));
static CURLY_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^:{}]+):([^{}]*)\}").expect("valid curly pattern"));
static SQUARE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^:\[\]]+)(?::([^\[\]]*))?\]").expect("valid square token"));
static CURLY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^:{}]+)(?::([^{}]*))?\}").expect("valid curly token"));
static BARE_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^:{}]+)\}").expect("valid variable pattern"));
static SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]+\}|\[[^\[\]]+\]").expect("valid segment pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Square,
    Curly,
}

/// One placeholder found in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub full_match: String,
    pub key: String,
    /// `None` for the argument-less form (`{name}`, `[time]`)
    pub argument: Option<String>,
    /// Byte offset of `full_match` in the scanned text
    pub position: usize,
}

impl Occurrence {
    pub fn argument_or_empty(&self) -> &str {
        self.argument.as_deref().unwrap_or("")
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Option<Self> {
        let whole = caps.get(0)?;
        Some(Self {
            full_match: whole.as_str().to_string(),
            key: caps.get(1)?.as_str().to_string(),
            argument: caps.get(2).map(|m| m.as_str().to_string()),
            position: whole.start(),
        })
    }
}

/// A piece of a raw template: literal text or exactly one placeholder token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

fn scan(regex: &Regex, text: &str) -> Vec<Occurrence> {
    // captures_iter yields non-overlapping matches in position order
    regex
        .captures_iter(text)
        .filter_map(|caps| Occurrence::from_captures(&caps))
        .collect()
}

/// `key:arg` placeholders of one syntax, earliest first
pub fn parse_placeholders(text: &str, syntax: Syntax) -> Vec<Occurrence> {
    match syntax {
        Syntax::Square => scan(&SQUARE_COMMAND, text),
        Syntax::Curly => scan(&CURLY_COMMAND, text),
    }
}

/// Placeholders of one syntax whose argument is optional (`[time]` and `[date:YYYY]`)
pub fn parse_tokens(text: &str, syntax: Syntax) -> Vec<Occurrence> {
    match syntax {
        Syntax::Square => scan(&SQUARE_TOKEN, text),
        Syntax::Curly => scan(&CURLY_TOKEN, text),
    }
}

/// Bare `{name}` variable references
pub fn parse_variables(text: &str) -> Vec<Occurrence> {
    scan(&BARE_VARIABLE, text)
}

/// Whether `text` holds anything the given syntax would resolve
pub fn contains_tokens(text: &str, syntax: Syntax) -> bool {
    match syntax {
        Syntax::Square => SQUARE_TOKEN.is_match(text),
        Syntax::Curly => CURLY_COMMAND.is_match(text),
    }
}

/// The first placeholder in a single token, square syntax first
pub fn parse_command_token(token: &str) -> Option<Occurrence> {
    SQUARE_TOKEN
        .captures(token)
        .or_else(|| CURLY_TOKEN.captures(token))
        .and_then(|caps| Occurrence::from_captures(&caps))
}

/// The token of either syntax whose text contains `marker`, square first
pub fn enclosing_token(text: &str, marker: &str) -> Option<Occurrence> {
    parse_tokens(text, Syntax::Square)
        .into_iter()
        .chain(parse_tokens(text, Syntax::Curly))
        .find(|occurrence| occurrence.full_match.contains(marker))
}

/// Split a template into literal text and top-level placeholder tokens, in order
pub fn split_segments(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for token in SEGMENT.find_iter(template) {
        if token.start() > last {
            segments.push(Segment::Literal(template[last..token.start()].to_string()));
        }
        segments.push(Segment::Placeholder(token.as_str().to_string()));
        last = token.end();
    }

    if last < template.len() {
        segments.push(Segment::Literal(template[last..].to_string()));
    }

    segments
}

/// `{cursor}` or `[cursor]`: marks the caret position, produces no text
pub fn is_cursor_marker(token: &str) -> bool {
    token == "{cursor}" || token == "[cursor]"
}
