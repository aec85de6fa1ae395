//! Run settings, read once from the environment and passed by reference into
//! every phase.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::SettingsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_provider: Provider,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub ollama_base_url: String,
    pub ollama_model: String,

    pub state_name: String,
    pub data_collector_name: String,
    pub data_dir: PathBuf,

    pub request_timeout_secs: u64,
    pub step_delay_ms: u64,
    pub county_delay_ms: u64,
    pub page_delay_ms: u64,
    pub llm_delay_ms: u64,

    pub max_program_links: usize,
    pub max_text_chars: usize,
    pub max_prompt_chars: usize,
    pub max_doc_links: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_provider: Provider::OpenAi,
            openai_api_key: None,
            anthropic_api_key: None,
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1:8b-instruct".to_string(),
            state_name: "California".to_string(),
            data_collector_name: "Your Name".to_string(),
            data_dir: PathBuf::from("data"),
            request_timeout_secs: 20,
            step_delay_ms: 1_000,
            county_delay_ms: 2_000,
            page_delay_ms: 2_000,
            llm_delay_ms: 500,
            max_program_links: 25,
            max_text_chars: 20_000,
            max_prompt_chars: 10_000,
            max_doc_links: 20,
        }
    }
}

impl Settings {
    /// Read settings from environment variables (`OPENAI_API_KEY`,
    /// `DATA_COLLECTOR_NAME`, `PAGE_DELAY_MS`, ...). Unset keys keep their
    /// defaults.
    pub fn load() -> Result<Self, SettingsError> {
        let cfg = Config::builder()
            .add_source(Environment::default())
            .build()?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: Config) -> Result<Self, SettingsError> {
        Ok(cfg.try_deserialize()?)
    }

    /// Fail early when the selected provider has no credential. Ollama runs
    /// locally and needs none.
    pub fn require_credentials(&self) -> Result<(), SettingsError> {
        let (key, var) = match self.api_provider {
            Provider::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
            Provider::Anthropic => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
            Provider::Ollama => return Ok(()),
        };
        match key.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() => Ok(()),
            _ => Err(SettingsError::MissingCredential(var)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn county_delay(&self) -> Duration {
        Duration::from_millis(self.county_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn llm_delay(&self) -> Duration {
        Duration::from_millis(self.llm_delay_ms)
    }

    /// Same settings with every courtesy delay removed.
    pub fn without_delays(mut self) -> Self {
        self.step_delay_ms = 0;
        self.county_delay_ms = 0;
        self.page_delay_ms = 0;
        self.llm_delay_ms = 0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(pairs: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let mut builder = Config::builder();
        for (k, v) in pairs {
            builder = builder.set_override(*k, *v).unwrap();
        }
        Settings::from_config(builder.build().unwrap())
    }

    #[test]
    fn empty_source_keeps_defaults() {
        let s = settings_with(&[]).unwrap();
        assert_eq!(s.api_provider, Provider::OpenAi);
        assert_eq!(s.state_name, "California");
        assert_eq!(s.max_program_links, 25);
        assert_eq!(s.request_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn overrides_are_parsed() {
        let s = settings_with(&[
            ("api_provider", "ollama"),
            ("data_collector_name", "Ada"),
            ("page_delay_ms", "250"),
        ])
        .unwrap();
        assert_eq!(s.api_provider, Provider::Ollama);
        assert_eq!(s.data_collector_name, "Ada");
        assert_eq!(s.page_delay(), Duration::from_millis(250));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(settings_with(&[("api_provider", "gemini")]).is_err());
    }

    #[test]
    fn credentials_checked_per_provider() {
        let s = Settings::default();
        assert!(matches!(
            s.require_credentials(),
            Err(SettingsError::MissingCredential("OPENAI_API_KEY"))
        ));

        let s = Settings {
            openai_api_key: Some("  ".into()),
            ..Settings::default()
        };
        assert!(s.require_credentials().is_err());

        let s = Settings {
            openai_api_key: Some("sk-test".into()),
            ..Settings::default()
        };
        assert!(s.require_credentials().is_ok());

        let s = Settings {
            api_provider: Provider::Ollama,
            ..Settings::default()
        };
        assert!(s.require_credentials().is_ok());
    }

    #[test]
    fn without_delays_zeroes_every_delay() {
        let s = Settings::default().without_delays();
        assert!(s.step_delay().is_zero());
        assert!(s.county_delay().is_zero());
        assert!(s.page_delay().is_zero());
        assert!(s.llm_delay().is_zero());
    }
}
