//! Phase drivers. Each phase reads the previous phase's files from the data
//! directory, walks its items one at a time and writes its own output.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::counties::CountyDirectory;
use crate::discovery::{DiscoveryFile, Navigator};
use crate::error::PipelineError;
use crate::export;
use crate::extract::ContentExtractor;
use crate::fetch::Fetcher;
use crate::settings::Settings;
use crate::store::{self, DataPaths};
use crate::structure::{CountyAggregator, LlmCollaborator, Structurer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub counties: usize,
    pub unknown: usize,
    pub with_department: usize,
    pub with_section: usize,
    pub links: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub counties: usize,
    pub links: usize,
    pub saved: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuringStats {
    pub pages: usize,
    pub structured: usize,
    pub failed: usize,
    pub programs: usize,
    pub counties: usize,
    pub files: usize,
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Phase 1: walk each named county (every county in `directory` when `names`
/// is empty) and write `discovery_results.json`.
pub async fn run_discovery(
    settings: &Settings,
    directory: &CountyDirectory,
    names: &[&str],
) -> Result<DiscoveryStats, PipelineError> {
    let t0 = Instant::now();
    let (counties, unknown): (Vec<(&str, &str)>, Vec<String>) = if names.is_empty() {
        (directory.iter().collect(), Vec::new())
    } else {
        directory.select(names)
    };
    for name in &unknown {
        warn!(county = %name, "Unknown county; skipping");
    }

    let fetcher = Fetcher::new(settings.request_timeout())?;
    let navigator = Navigator::new(&fetcher, settings);
    let mut stats = DiscoveryStats {
        unknown: unknown.len(),
        ..DiscoveryStats::default()
    };
    let mut results = Vec::with_capacity(counties.len());

    let pb = progress_bar(counties.len());
    for (i, (county, url)) in counties.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(settings.county_delay()).await;
        }
        pb.set_message(county.to_string());
        let record = navigator.discover(county, url).await;

        stats.counties += 1;
        stats.with_department += usize::from(record.health_dept_url.is_some());
        stats.with_section += usize::from(record.maternal_section_url.is_some());
        stats.links += record.programs.len();
        results.push(record);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let paths = DataPaths::new(&settings.data_dir);
    let path = store::save_discovery(&paths, &DiscoveryFile::new(results))?;
    info!(
        counties = stats.counties,
        departments = stats.with_department,
        sections = stats.with_section,
        links = stats.links,
        path = %path.display(),
        elapsed = %format_duration(t0.elapsed()),
        "Discovery complete"
    );
    Ok(stats)
}

/// Phase 2: fetch every discovered candidate link and write one raw page file
/// per success.
pub async fn run_extraction(settings: &Settings) -> Result<ExtractionStats, PipelineError> {
    let t0 = Instant::now();
    let paths = DataPaths::new(&settings.data_dir);
    let discovery = store::load_discovery(&paths)?;

    let fetcher = Fetcher::new(settings.request_timeout())?;
    let extractor = ContentExtractor::new(&fetcher, settings);
    let mut stats = ExtractionStats::default();

    let total: usize = discovery.results.iter().map(|r| r.programs.len()).sum();
    let pb = progress_bar(total);
    for record in &discovery.results {
        stats.counties += 1;
        if record.programs.is_empty() {
            warn!(county = %record.county_name, "No candidate links to extract");
            continue;
        }
        for link in &record.programs {
            if stats.links > 0 {
                tokio::time::sleep(settings.page_delay()).await;
            }
            stats.links += 1;
            pb.set_message(record.county_name.clone());

            match extractor.extract(&record.county_name, link).await {
                Some(page) => match store::save_raw_page(&paths, &page) {
                    Ok(path) => {
                        stats.saved += 1;
                        info!(county = %record.county_name, url = %link.url, path = %path.display(), "Saved raw page");
                    }
                    Err(e) => {
                        stats.failed += 1;
                        warn!(county = %record.county_name, url = %link.url, error = %format!("{:#}", e), "Could not save raw page");
                    }
                },
                None => stats.failed += 1,
            }
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    info!(
        counties = stats.counties,
        links = stats.links,
        saved = stats.saved,
        failed = stats.failed,
        elapsed = %format_duration(t0.elapsed()),
        "Extraction complete"
    );
    Ok(stats)
}

/// Phase 3: structure every raw page through the collaborator, merge per
/// county and write the CSV files.
pub async fn run_structuring(
    settings: &Settings,
    collaborator: &dyn LlmCollaborator,
) -> Result<StructuringStats, PipelineError> {
    let t0 = Instant::now();
    let paths = DataPaths::new(&settings.data_dir);
    let pages = store::load_raw_pages(&paths)?;

    // Discovery output is optional here; it only supplies root URLs and the
    // list of counties that must appear in the CSV.
    let discovered: Vec<(String, String)> = match store::load_discovery(&paths) {
        Ok(file) => file
            .results
            .into_iter()
            .map(|r| (r.county_name, r.county_url))
            .collect(),
        Err(e) => {
            warn!(error = %e, "Discovery results unavailable; using the built-in county list for URLs");
            Vec::new()
        }
    };
    let fallback = CountyDirectory::california();
    let county_urls: HashMap<&str, &str> = fallback
        .iter()
        .chain(discovered.iter().map(|(n, u)| (n.as_str(), u.as_str())))
        .collect();

    let structurer = Structurer::new(collaborator, settings);
    let mut aggregator = CountyAggregator::new(settings.state_name.as_str());
    let mut stats = StructuringStats {
        pages: pages.len(),
        ..StructuringStats::default()
    };

    let pb = progress_bar(pages.len());
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(settings.llm_delay()).await;
        }
        pb.set_message(page.county.clone());
        let county_url = county_urls.get(page.county.as_str()).copied().unwrap_or_default();

        match structurer.structure(&page.county, county_url, page).await {
            Ok(response) => {
                let added = aggregator.merge(&page.county, county_url, response);
                stats.structured += 1;
                stats.programs += added;
                info!(county = %page.county, url = %page.page_url, programs = added, "Structured page");
            }
            Err(e) => {
                stats.failed += 1;
                warn!(county = %page.county, url = %page.page_url, error = %e, "Skipping page");
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let records = aggregator.finish(discovered.iter().map(|(n, u)| (n.as_str(), u.as_str())));
    stats.counties = records.len();

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let written = export::write_outputs(
        &paths,
        &settings.state_name,
        &records,
        &settings.data_collector_name,
        &date,
    )?;
    stats.files = written.len();

    info!(
        pages = stats.pages,
        structured = stats.structured,
        failed = stats.failed,
        programs = stats.programs,
        counties = stats.counties,
        files = stats.files,
        elapsed = %format_duration(t0.elapsed()),
        "Structuring complete"
    );
    Ok(stats)
}
