use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants;
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::indices::AnswerKey;

/// Default location of the configuration file
pub const CONFIG_FILE: &str = "survey.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Raw CSV export of the form responses
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Position of the consent column in the raw export
    pub consent_position: usize,
    pub files: OutputFiles,
    /// Objective-question answers that differ from the built-in key
    pub answer_key: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputFiles {
    pub cleaned: String,
    pub codebook: String,
    pub indexed: String,
    pub grouped: String,
    pub index_summary: String,
    pub group_summary: String,
    pub manifest: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from(constants::DEFAULT_INPUT),
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            consent_position: constants::DEFAULT_CONSENT_POSITION,
            files: OutputFiles::default(),
            answer_key: BTreeMap::new(),
        }
    }
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            cleaned: constants::CLEANED_FILE.to_string(),
            codebook: constants::CODEBOOK_FILE.to_string(),
            indexed: constants::INDEXED_FILE.to_string(),
            grouped: constants::GROUPED_FILE.to_string(),
            index_summary: constants::INDEX_SUMMARY_FILE.to_string(),
            group_summary: constants::GROUP_SUMMARY_FILE.to_string(),
            manifest: constants::MANIFEST_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `survey.toml` in the
    /// working directory is used when present, defaults otherwise.
    /// `SURVEY_INPUT` and `SURVEY_OUTPUT_DIR` override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => {
                debug!("No {} found, using defaults", CONFIG_FILE);
                Self::default()
            }
        };

        if let Ok(input) = std::env::var("SURVEY_INPUT") {
            config.input = PathBuf::from(input);
        }
        if let Ok(dir) = std::env::var("SURVEY_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Answer key with this configuration's overrides applied
    pub fn answer_key(&self) -> AnswerKey {
        AnswerKey::with_overrides(&self.answer_key)
    }

    fn validate(&self) -> Result<()> {
        let default_key = AnswerKey::default();
        let known: Vec<&str> = default_key
            .entries()
            .iter()
            .map(|(field, _)| field.as_str())
            .collect();
        if let Some(unknown) = self.answer_key.keys().find(|k| !known.contains(&k.as_str())) {
            return Err(PipelineError::Config(format!(
                "answer_key entry '{}' is not an objective question",
                unknown
            )));
        }
        Ok(())
    }
}
