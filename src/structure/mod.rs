pub mod prompt;
pub mod schema;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StructuringError;
use crate::extract::RawPageRecord;
use crate::settings::Settings;
use schema::{parse_response, ExtractionResponse, StructuredProgram, NOT_FOUND};

/// Language model that turns a prompt into a (hopefully JSON) answer.
///
/// Any error means "no data" for that page.
#[async_trait]
pub trait LlmCollaborator: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

pub struct Structurer<'a> {
    collaborator: &'a dyn LlmCollaborator,
    settings: &'a Settings,
}

impl<'a> Structurer<'a> {
    pub fn new(collaborator: &'a dyn LlmCollaborator, settings: &'a Settings) -> Self {
        Self {
            collaborator,
            settings,
        }
    }

    pub async fn structure(
        &self,
        county: &str,
        county_url: &str,
        page: &RawPageRecord,
    ) -> Result<ExtractionResponse, StructuringError> {
        let prompt = prompt::build_prompt(county, county_url, page, self.settings);
        debug!(county, url = %page.page_url, prompt_chars = prompt.len(), "Calling collaborator");
        let raw = self
            .collaborator
            .complete(&prompt)
            .await
            .map_err(|e| StructuringError::Collaborator(format!("{:#}", e)))?;
        parse_response(&raw)
    }
}

/// Everything known about one county's health department and its programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyStructuredRecord {
    pub state: String,
    pub county_name: String,
    pub county_website_url: String,
    pub health_department_name: String,
    pub health_department_contact_email: String,
    pub health_department_contact_phone: String,
    pub programs: Vec<StructuredProgram>,
    pub notes: String,
}

/// Per-county accumulator. Programs and notes only ever grow; department
/// identity comes from the first successful page and is never replaced.
#[derive(Debug)]
pub struct CountyAggregator {
    state: String,
    counties: IndexMap<String, CountyStructuredRecord>,
}

impl CountyAggregator {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            counties: IndexMap::new(),
        }
    }

    /// Fold one page's answer in. Returns how many programs were appended.
    pub fn merge(&mut self, county: &str, county_url: &str, response: ExtractionResponse) -> usize {
        let state = &self.state;
        let record = self
            .counties
            .entry(county.to_string())
            .or_insert_with(|| CountyStructuredRecord {
                state: state.clone(),
                county_name: county.to_string(),
                county_website_url: county_url.to_string(),
                health_department_name: response.health_department_name.clone(),
                health_department_contact_email: response.health_department_contact_email.clone(),
                health_department_contact_phone: response.health_department_contact_phone.clone(),
                programs: Vec::new(),
                notes: String::new(),
            });

        let added = response.programs.len();
        record.programs.extend(response.programs);
        if let Some(notes) = response.notes {
            if record.notes.is_empty() {
                record.notes = notes;
            } else {
                record.notes.push(' ');
                record.notes.push_str(&notes);
            }
        }
        added
    }

    pub fn get(&self, county: &str) -> Option<&CountyStructuredRecord> {
        self.counties.get(county)
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }

    /// Records in first-seen order, followed by an empty "Not found" record
    /// for every `expected` county that never produced an answer.
    pub fn finish<'a>(mut self, expected: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<CountyStructuredRecord> {
        for (county, url) in expected {
            if self.counties.contains_key(county) {
                continue;
            }
            self.counties.insert(
                county.to_string(),
                CountyStructuredRecord {
                    state: self.state.clone(),
                    county_name: county.to_string(),
                    county_website_url: url.to_string(),
                    health_department_name: NOT_FOUND.to_string(),
                    health_department_contact_email: NOT_FOUND.to_string(),
                    health_department_contact_phone: NOT_FOUND.to_string(),
                    programs: Vec::new(),
                    notes: "No program pages could be structured.".to_string(),
                },
            );
        }
        self.counties.into_values().collect()
    }
}
