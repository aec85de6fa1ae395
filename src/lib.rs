//! Crawl California county websites for maternal and child health programs.
//!
//! Three phases, each persisting to the data directory:
//! discovery (`pipeline::run_discovery`), content extraction
//! (`pipeline::run_extraction`) and structuring into CSV
//! (`pipeline::run_structuring`).

pub mod counties;
pub mod discovery;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod settings;
pub mod store;
pub mod structure;

pub use error::{PipelineError, SettingsError, StructuringError};
pub use settings::Settings;
pub use structure::LlmCollaborator;
