use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::fetch::Anchor;

pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated...]";

static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());
static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    pub phones: Vec<String>,
    pub emails: Vec<String>,
}

/// Collapse blank-line and space runs, then bound the length.
pub fn normalize_text(raw: &str, max_chars: usize) -> String {
    let text = BLANK_LINES_RE.replace_all(raw, "\n\n");
    let text = SPACES_RE.replace_all(&text, " ");
    truncate_text(&text, max_chars)
}

/// Keep the first `max_chars` characters and append the truncation marker.
/// Applying it to its own output changes nothing.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
    }
}

/// Phone- and email-shaped substrings, each sorted and unique.
pub fn extract_contacts(text: &str) -> Contacts {
    let phones: BTreeSet<&str> = PHONE_RE.find_iter(text).map(|m| m.as_str()).collect();
    let emails: BTreeSet<&str> = EMAIL_RE.find_iter(text).map(|m| m.as_str()).collect();
    Contacts {
        phones: phones.into_iter().map(String::from).collect(),
        emails: emails.into_iter().map(String::from).collect(),
    }
}

/// Links that look like PDF documents, absolute, first-seen order, unique,
/// at most `cap`.
pub fn document_links(anchors: &[Anchor], cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    anchors
        .iter()
        .filter(|a| {
            let href = a.raw_href.to_lowercase();
            href.ends_with(".pdf") || href.contains("pdf") || a.text.to_lowercase().contains("pdf")
        })
        .filter(|a| seen.insert(a.href.clone()))
        .take(cap)
        .map(|a| a.href.clone())
        .collect()
}

pub fn slugify(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let slug = SLUG_RE.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug.to_string()
    }
}

/// First 10 hex chars of the URL's SHA-256.
pub fn page_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(digest)[..10].to_string()
}
