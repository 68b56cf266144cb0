//! User configuration
//!
//! Read from `~/.logscope/config.toml`, or the file named by `LOGSCOPE_CONFIG`.
//! Every key is optional. Priority: command line > environment > file > defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

use logscope_compare::{CompareOptions, DEFAULT_SIMILARITY_THRESHOLD, SimilarityWeights};
use logscope_logs::ExportFormat;

const CONFIG_ENV: &str = "LOGSCOPE_CONFIG";
const THRESHOLD_ENV: &str = "LOGSCOPE_SIMILARITY_THRESHOLD";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub compare: CompareConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub similarity_threshold: f64,
    pub weights: WeightsConfig,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            weights: WeightsConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub word: f64,
    pub length: f64,
    pub edit: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        let weights = SimilarityWeights::default();
        Self {
            word: weights.word,
            length: weights.length,
            edit: weights.edit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    #[serde(deserialize_with = "deserialize_format")]
    pub format: ExportFormat,
}

fn deserialize_format<'de, D>(deserializer: D) -> Result<ExportFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    text.parse().map_err(serde::de::Error::custom)
}

impl AppConfig {
    /// Config file location, if a home directory can be found
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let home = dirs::home_dir()?;
        Some(home.join(".logscope").join("config.toml"))
    }

    /// Load configuration from the config file and environment
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };

        config.apply_threshold_override(std::env::var(THRESHOLD_ENV).ok().as_deref())?;
        config
            .compare_options()
            .validate()
            .context("Invalid comparison settings")?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn apply_threshold_override(&mut self, value: Option<&str>) -> Result<()> {
        if let Some(value) = value {
            self.compare.similarity_threshold = value
                .trim()
                .parse()
                .with_context(|| format!("{THRESHOLD_ENV} is not a number: {value}"))?;
        }
        Ok(())
    }

    pub fn compare_options(&self) -> CompareOptions {
        let weights = &self.compare.weights;
        CompareOptions {
            similarity_threshold: self.compare.similarity_threshold,
            weights: SimilarityWeights {
                word: weights.word,
                length: weights.length,
                edit: weights.edit,
            },
        }
    }
}
