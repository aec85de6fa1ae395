//! On-disk layout shared by the three phases. Every phase reads what the
//! previous one wrote here, so a run can stop and resume between phases.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::discovery::DiscoveryFile;
use crate::error::PipelineError;
use crate::extract::text::slugify;
use crate::extract::RawPageRecord;

const DISCOVERY_FILE: &str = "discovery_results.json";
const RAW_DIR: &str = "raw";
const STRUCTURED_DIR: &str = "structured";

#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn discovery_file(&self) -> PathBuf {
        self.root.join(DISCOVERY_FILE)
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(RAW_DIR)
    }

    pub fn raw_county_dir(&self, county: &str) -> PathBuf {
        self.raw_dir().join(slugify(county))
    }

    pub fn structured_dir(&self) -> PathBuf {
        self.root.join(STRUCTURED_DIR)
    }

    pub fn combined_csv(&self, state: &str) -> PathBuf {
        self.root.join(format!("{}_County_Healthcare_Data.csv", state.replace(' ', "_")))
    }

    pub fn county_csv(&self, state: &str, county: &str) -> PathBuf {
        self.structured_dir().join(format!(
            "{}_{}_Healthcare_Data.csv",
            state.replace(' ', "_"),
            county.replace(' ', "_")
        ))
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn save_discovery(paths: &DataPaths, file: &DiscoveryFile) -> Result<PathBuf> {
    let path = paths.discovery_file();
    write_json(&path, file)?;
    debug!(path = %path.display(), counties = file.results.len(), "Saved discovery results");
    Ok(path)
}

pub fn load_discovery(paths: &DataPaths) -> Result<DiscoveryFile, PipelineError> {
    let path = paths.discovery_file();
    let missing = |reason: String| PipelineError::MissingInput {
        path: path.clone(),
        phase: "discovery",
        reason,
    };
    let body = fs::read_to_string(&path).map_err(|e| missing(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| missing(e.to_string()))
}

/// Write one raw page; the same county and file name overwrite in place.
pub fn save_raw_page(paths: &DataPaths, record: &RawPageRecord) -> Result<PathBuf> {
    let path = paths.raw_county_dir(&record.county).join(record.file_name());
    write_json(&path, record)?;
    Ok(path)
}

/// Every `*.json` under `raw/<county>/`, counties and files in name order.
pub fn list_raw_pages(paths: &DataPaths) -> Result<Vec<PathBuf>, PipelineError> {
    let raw = paths.raw_dir();
    let missing = |reason: &str| PipelineError::MissingInput {
        path: raw.clone(),
        phase: "extraction",
        reason: reason.to_string(),
    };

    let mut county_dirs = sorted_entries(&raw).map_err(|e| missing(&e.to_string()))?;
    county_dirs.retain(|p| p.is_dir());

    let mut files = Vec::new();
    for dir in county_dirs {
        let entries = sorted_entries(&dir).with_context(|| format!("listing {}", dir.display()))?;
        files.extend(
            entries
                .into_iter()
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json")),
        );
    }

    if files.is_empty() {
        return Err(missing("no raw page files"));
    }
    Ok(files)
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

pub fn load_raw_page(path: &Path) -> Result<RawPageRecord> {
    let body = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let record = serde_json::from_str(&body).with_context(|| format!("parsing {}", path.display()))?;
    Ok(record)
}

/// Load every raw page, skipping (and logging) files that fail to parse.
pub fn load_raw_pages(paths: &DataPaths) -> Result<Vec<RawPageRecord>, PipelineError> {
    let files = list_raw_pages(paths)?;
    let mut pages = Vec::with_capacity(files.len());
    for path in files {
        match load_raw_page(&path) {
            Ok(page) => pages.push(page),
            Err(e) => warn!(path = %path.display(), error = %format!("{:#}", e), "Skipping unreadable raw page"),
        }
    }
    Ok(pages)
}
