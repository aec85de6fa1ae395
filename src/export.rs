use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::store::DataPaths;
use crate::structure::CountyStructuredRecord;

pub const CSV_COLUMNS: [&str; 18] = [
    "State",
    "County_Name",
    "County_Website_URL",
    "Health_Department_Name",
    "Health_Department_Contact_Email",
    "Health_Department_Contact_Phone",
    "Program_Name",
    "Program_Category",
    "Program_Description",
    "Target_Population",
    "Eligibility_Requirements",
    "Application_Process",
    "Required_Documentation",
    "Financial_Assistance_Available",
    "Program_Website_URL",
    "Last_Updated",
    "Data_Collector_Name",
    "Notes",
];

pub const NO_PROGRAMS: &str = "No programs found on main page";

/// One output line. Field order matches [`CSV_COLUMNS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CsvRow {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "County_Name")]
    pub county_name: String,
    #[serde(rename = "County_Website_URL")]
    pub county_website_url: String,
    #[serde(rename = "Health_Department_Name")]
    pub health_department_name: String,
    #[serde(rename = "Health_Department_Contact_Email")]
    pub health_department_contact_email: String,
    #[serde(rename = "Health_Department_Contact_Phone")]
    pub health_department_contact_phone: String,
    #[serde(rename = "Program_Name")]
    pub program_name: String,
    #[serde(rename = "Program_Category")]
    pub program_category: String,
    #[serde(rename = "Program_Description")]
    pub program_description: String,
    #[serde(rename = "Target_Population")]
    pub target_population: String,
    #[serde(rename = "Eligibility_Requirements")]
    pub eligibility_requirements: String,
    #[serde(rename = "Application_Process")]
    pub application_process: String,
    #[serde(rename = "Required_Documentation")]
    pub required_documentation: String,
    #[serde(rename = "Financial_Assistance_Available")]
    pub financial_assistance_available: String,
    #[serde(rename = "Program_Website_URL")]
    pub program_website_url: String,
    #[serde(rename = "Last_Updated")]
    pub last_updated: String,
    #[serde(rename = "Data_Collector_Name")]
    pub data_collector_name: String,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// Flatten county records: one row per program, or a single placeholder row
/// when a county has none.
pub fn rows(records: &[CountyStructuredRecord], collector: &str, date: &str) -> Vec<CsvRow> {
    let mut out = Vec::new();
    for record in records {
        let identity = CsvRow {
            state: record.state.clone(),
            county_name: record.county_name.clone(),
            county_website_url: record.county_website_url.clone(),
            health_department_name: record.health_department_name.clone(),
            health_department_contact_email: record.health_department_contact_email.clone(),
            health_department_contact_phone: record.health_department_contact_phone.clone(),
            last_updated: date.to_string(),
            data_collector_name: collector.to_string(),
            notes: record.notes.clone(),
            ..CsvRow::default()
        };

        if record.programs.is_empty() {
            out.push(CsvRow {
                program_name: NO_PROGRAMS.to_string(),
                ..identity
            });
            continue;
        }

        for p in &record.programs {
            out.push(CsvRow {
                program_name: p.program_name.clone(),
                program_category: p.program_category.to_string(),
                program_description: p.program_description.clone(),
                target_population: p.target_population.clone(),
                eligibility_requirements: p.eligibility_requirements.clone(),
                application_process: p.application_process.clone(),
                required_documentation: p.required_documentation.clone(),
                financial_assistance_available: p.financial_assistance_available.to_string(),
                program_website_url: p.program_website_url.clone(),
                ..identity.clone()
            });
        }
    }
    out
}

/// Header first, always, even with no rows.
pub fn write_csv(path: &Path, rows: &[CsvRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    writer.write_record(CSV_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Combined file for all counties plus one file per county under
/// `structured/`. Returns every path written, combined file first.
pub fn write_outputs(
    paths: &DataPaths,
    state: &str,
    records: &[CountyStructuredRecord],
    collector: &str,
    date: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(records.len() + 1);

    let all = rows(records, collector, date);
    let combined = paths.combined_csv(state);
    write_csv(&combined, &all)?;
    info!(path = %combined.display(), rows = all.len(), "Wrote combined CSV");
    written.push(combined);

    for record in records {
        let path = paths.county_csv(state, &record.county_name);
        write_csv(&path, &rows(std::slice::from_ref(record), collector, date))?;
        written.push(path);
    }
    Ok(written)
}
