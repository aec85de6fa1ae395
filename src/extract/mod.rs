pub mod text;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::discovery::CandidateLink;
use crate::fetch::{Fetcher, Page};
use crate::settings::Settings;
use text::{document_links, extract_contacts, normalize_text, page_hash, slugify, Contacts};

/// Content of one candidate program page, as persisted under `raw/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPageRecord {
    pub county: String,
    pub page_url: String,
    #[serde(default)]
    pub link_text: String,
    #[serde(default)]
    pub program_name_guess: String,
    #[serde(default)]
    pub nav_path: String,
    pub scraped_at: DateTime<Utc>,
    pub text: String,
    #[serde(default)]
    pub contacts: Contacts,
    #[serde(default)]
    pub pdf_links: Vec<String>,
}

impl RawPageRecord {
    /// `<name-slug>-<url-hash>.json`; the same page always lands on the same
    /// file name.
    pub fn file_name(&self) -> String {
        let label = if !self.program_name_guess.trim().is_empty() {
            self.program_name_guess.as_str()
        } else if !self.link_text.trim().is_empty() {
            self.link_text.as_str()
        } else {
            "program"
        };
        format!("{}-{}.json", slugify(label), page_hash(&self.page_url))
    }
}

pub struct ContentExtractor<'a> {
    fetcher: &'a Fetcher,
    settings: &'a Settings,
}

impl<'a> ContentExtractor<'a> {
    pub fn new(fetcher: &'a Fetcher, settings: &'a Settings) -> Self {
        Self { fetcher, settings }
    }

    /// `None` when the link is empty or the page cannot be fetched.
    pub async fn extract(&self, county: &str, link: &CandidateLink) -> Option<RawPageRecord> {
        if link.url.trim().is_empty() {
            warn!(county, name = %link.name, "Candidate link has no URL");
            return None;
        }
        let page = self.fetcher.fetch(&link.url).await?;
        let record = build_record(county, link, &page, self.settings);
        debug!(
            county,
            url = %link.url,
            chars = record.text.chars().count(),
            phones = record.contacts.phones.len(),
            emails = record.contacts.emails.len(),
            docs = record.pdf_links.len(),
            "Extracted page"
        );
        Some(record)
    }
}

/// Turn a fetched page into its persisted record.
pub fn build_record(county: &str, link: &CandidateLink, page: &Page, settings: &Settings) -> RawPageRecord {
    let text = normalize_text(&page.text(), settings.max_text_chars);
    let contacts = extract_contacts(&text);
    let pdf_links = document_links(&page.anchors(), settings.max_doc_links);

    RawPageRecord {
        county: county.to_string(),
        page_url: link.url.clone(),
        link_text: link.link_text.clone(),
        program_name_guess: link.name.clone(),
        nav_path: link.nav_path.clone(),
        scraped_at: Utc::now(),
        text,
        contacts,
        pdf_links,
    }
}
