//! County homepage → health department → maternal/child section → program
//! links, by heuristic link scoring.

pub mod scoring;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::fetch::{Anchor, Fetcher};
use crate::settings::Settings;
use scoring::{choose_best_link, rank_program_links, NavLevel};

pub const PATH_WITH_SECTION: &str = "Main → Health Dept → Maternal/Child";
pub const PATH_DEPT_ONLY: &str = "Main → Health Dept";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLink {
    pub name: String,
    pub url: String,
    pub link_text: String,
    pub nav_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub county_name: String,
    pub county_url: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub health_dept_url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub maternal_section_url: Option<String>,
    #[serde(default)]
    pub programs: Vec<CandidateLink>,
}

impl DiscoveryRecord {
    fn empty(county_name: &str, county_url: &str) -> Self {
        Self {
            county_name: county_name.to_string(),
            county_url: county_url.to_string(),
            health_dept_url: None,
            maternal_section_url: None,
            programs: Vec::new(),
        }
    }
}

/// Contents of `discovery_results.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryFile {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<DiscoveryRecord>,
}

impl DiscoveryFile {
    pub fn new(results: Vec<DiscoveryRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            results,
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Walks one county site. Each hop degrades to the previous page when it
/// cannot find anything better.
pub struct Navigator<'a> {
    fetcher: &'a Fetcher,
    settings: &'a Settings,
}

impl<'a> Navigator<'a> {
    pub fn new(fetcher: &'a Fetcher, settings: &'a Settings) -> Self {
        Self { fetcher, settings }
    }

    pub async fn discover(&self, county: &str, root_url: &str) -> DiscoveryRecord {
        info!(county, url = root_url, "Discovery started");
        let mut record = DiscoveryRecord::empty(county, root_url);

        // Step 1: health department
        let dept = self.best_link(root_url, NavLevel::Department).await;
        let dept_url = match dept {
            Some(url) => {
                record.health_dept_url = Some(url.clone());
                url
            }
            None => {
                warn!(county, "Health department page not found; continuing from root");
                root_url.to_string()
            }
        };
        tokio::time::sleep(self.settings.step_delay()).await;

        // Step 2: maternal/child section
        let section_url = match self.best_link(&dept_url, NavLevel::Section).await {
            Some(url) => {
                record.maternal_section_url = Some(url.clone());
                url
            }
            None => {
                warn!(county, "Maternal section not found; using health department page");
                dept_url
            }
        };
        tokio::time::sleep(self.settings.step_delay()).await;

        // Step 3: candidate programs
        let nav_path = if record.maternal_section_url.is_some() {
            PATH_WITH_SECTION
        } else {
            PATH_DEPT_ONLY
        };
        record.programs = self
            .program_links(&section_url)
            .await
            .into_iter()
            .map(|a| CandidateLink {
                name: a.text.clone(),
                url: a.href,
                link_text: a.text,
                nav_path: nav_path.to_string(),
            })
            .collect();

        info!(county, programs = record.programs.len(), "Discovery finished");
        record
    }

    async fn best_link(&self, page_url: &str, level: NavLevel) -> Option<String> {
        let page = self.fetcher.fetch(page_url).await?;
        let base = page.url().to_string();
        let anchors = page.anchors();
        choose_best_link(&anchors, &base, level).map(|a| a.href.clone())
    }

    async fn program_links(&self, page_url: &str) -> Vec<Anchor> {
        let Some(page) = self.fetcher.fetch(page_url).await else {
            return Vec::new();
        };
        let anchors = page.anchors();
        rank_program_links(&anchors, self.settings.max_program_links)
            .into_iter()
            .map(|(_, a)| a.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(n: usize) -> CandidateLink {
        CandidateLink {
            name: format!("Program {n}"),
            url: format!("https://c.gov/p/{n}"),
            link_text: format!("Program {n}"),
            nav_path: PATH_DEPT_ONLY.to_string(),
        }
    }

    #[test]
    fn record_round_trip_keeps_link_order() {
        let record = DiscoveryRecord {
            county_name: "Kern".into(),
            county_url: "https://www.kerncounty.com/".into(),
            health_dept_url: Some("https://www.kerncounty.com/health".into()),
            maternal_section_url: None,
            programs: (0..7).rev().map(link).collect(),
        };
        let json = serde_json::to_string(&DiscoveryFile::new(vec![record.clone()])).unwrap();
        let back: DiscoveryFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.results, vec![record]);
    }

    #[test]
    fn empty_and_null_urls_read_as_absent() {
        let json = r#"{
            "county_name": "Fresno",
            "county_url": "https://www.co.fresno.ca.us/",
            "health_dept_url": "",
            "maternal_section_url": null,
            "programs": []
        }"#;
        let r: DiscoveryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.health_dept_url, None);
        assert_eq!(r.maternal_section_url, None);

        let minimal = r#"{"county_name": "Kern", "county_url": "https://k"}"#;
        let r: DiscoveryRecord = serde_json::from_str(minimal).unwrap();
        assert!(r.programs.is_empty());
    }

    #[test]
    fn absent_urls_are_omitted_when_written() {
        let r = DiscoveryRecord::empty("Yuba", "https://www.yuba.org/");
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("health_dept_url").is_none());
        assert_eq!(v["programs"], serde_json::json!([]));
    }
}
