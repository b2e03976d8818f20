use once_cell::sync::Lazy;
use regex::Regex;
use sha1::{Digest, Sha1};
use std::cmp::Ordering;

// @module: Text normalisation, slugs and hashing shared by every stage

// @const: Runs of spaces and tabs
static SPACES_TABS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

// @const: Runs of spaces, tabs and non-breaking spaces
static SPACES_TABS_NBSP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());

static OPEN_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\({2,}").unwrap());
static CLOSE_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\){2,}").unwrap());

static WS_BEFORE_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\n").unwrap());
static WS_AFTER_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s+").unwrap());

static NON_TERM_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static NON_SECTION_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-.:/]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NBSP_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{00A0}\s]+").unwrap());
static UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// Convert CRLF and lone CR line endings to LF
pub fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Conservative cleanup used for anchored DOCX extraction.
///
/// Repeated parentheses left behind by earlier extraction passes are collapsed,
/// spaces are collapsed and every line is trimmed; intentional line breaks stay.
pub fn clean_text(s: &str) -> String {
    let s = normalize_newlines(s);
    let s = OPEN_PARENS.replace_all(&s, "(");
    let s = CLOSE_PARENS.replace_all(&s, ")");
    let s = SPACES_TABS.replace_all(&s, " ");
    let joined = s.split('\n').map(str::trim).collect::<Vec<_>>().join("\n");
    joined.trim().to_string()
}

/// Trim and collapse spaces/tabs while keeping manual line breaks
pub fn norm_ws(s: &str) -> String {
    let s = normalize_newlines(s);
    SPACES_TABS.replace_all(s.trim(), " ").into_owned()
}

/// Normalisation applied before hashing a source text.
///
/// Must stay stable: translated CSVs are matched back to documents through
/// the SHA-1 of this form.
pub fn normalize_for_hash(s: &str) -> String {
    let s = normalize_newlines(s);
    let s = SPACES_TABS_NBSP.replace_all(&s, " ");
    let is_pad = |c: char| c == ' ' || c == '\t' || c == '\u{00A0}';
    let mut lines: Vec<&str> = s.split('\n').map(|ln| ln.trim_matches(is_pad)).collect();
    while lines.first().is_some_and(|ln| ln.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|ln| ln.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Normalisation used for the linear section stream
pub fn norm_stream(s: &str) -> String {
    let s = s.replace('\u{00A0}', " ");
    let s = SPACES_TABS.replace_all(&s, " ");
    let s = WS_BEFORE_NEWLINE.replace_all(&s, "\n");
    let s = WS_AFTER_NEWLINE.replace_all(&s, "\n");
    s.trim().to_string()
}

/// Case-insensitive variant of [`norm_stream`]
pub fn norm_ci(s: &str) -> String {
    norm_stream(s).to_lowercase()
}

/// Join hard-wrapped prose lines; blank lines stay paragraph boundaries
pub fn join_hard_wrapped_lines(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut buf: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !buf.is_empty() {
                out.push(buf.join(" ").trim().to_string());
                buf.clear();
            }
            out.push(String::new());
            continue;
        }
        buf.push(line.trim());
    }
    if !buf.is_empty() {
        out.push(buf.join(" ").trim().to_string());
    }

    out.join("\n").trim().to_string()
}

/// Slug used for glossary keys: `Digital content` -> `digital_content`
pub fn slugify_term(term: &str) -> String {
    let s = term.trim().to_lowercase();
    let s = NON_TERM_CHARS.replace_all(&s, "");
    let s = WHITESPACE_RUN.replace_all(&s, "_");
    let s = UNDERSCORE_RUN.replace_all(&s, "_");
    s.trim_matches('_').to_string()
}

/// Slug used for heading-derived section ids; never empty
pub fn slugify_section(s: &str) -> String {
    let s = s.trim().to_lowercase();
    let s = NBSP_WHITESPACE_RUN.replace_all(&s, " ");
    let s = NON_SECTION_CHARS.replace_all(&s, "");
    let s = s.replace(' ', "_");
    let s = UNDERSCORE_RUN.replace_all(&s, "_");
    let s = s.trim_matches('_');
    if s.is_empty() {
        "section".to_string()
    } else {
        s.to_string()
    }
}

/// Lower-case hex SHA-1 of a UTF-8 string
pub fn sha1_hex(s: &str) -> String {
    format!("{:x}", Sha1::digest(s.as_bytes()))
}

/// First 12 hex characters of the SHA-1, as used in hashed locations
pub fn short_hash(s: &str) -> String {
    let mut hex = sha1_hex(s);
    hex.truncate(12);
    hex
}

/// True when the string is exactly 40 lower-case hex digits
pub fn is_sha1_hex(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Number of Unicode scalar values, the length unit used for chunk limits
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Ordering key for dotted identifiers such as `1`, `1.2`, `1.10`, `2.a`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalKey(Vec<KeyPart>);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Num(u64),
    Text(String),
}

impl NaturalKey {
    pub fn new(id: &str) -> Self {
        NaturalKey(
            id.split('.')
                .map(|part| match part.trim().parse::<u64>() {
                    Ok(n) => KeyPart::Num(n),
                    Err(_) => KeyPart::Text(part.to_string()),
                })
                .collect(),
        )
    }
}

impl PartialOrd for NaturalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NaturalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}
