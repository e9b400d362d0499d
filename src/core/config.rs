//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::Project;
use crate::entities::TinConversion;
use crate::import::DateFormat;

/// Cellar configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ounces in one standard tin
    pub oz_per_tin: Option<f64>,

    /// Grams in one standard tin
    pub grams_per_tin: Option<f64>,

    /// Default import date format
    pub date_format: Option<String>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/cellar/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.cellar/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        if let Some(v) = env_f64("CELLAR_OZ_PER_TIN") {
            config.oz_per_tin = Some(v);
        }
        if let Some(v) = env_f64("CELLAR_GRAMS_PER_TIN") {
            config.grams_per_tin = Some(v);
        }
        if let Ok(fmt) = std::env::var("CELLAR_DATE_FORMAT") {
            config.date_format = Some(fmt);
        }

        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring invalid config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cellar")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.oz_per_tin.is_some() {
            self.oz_per_tin = other.oz_per_tin;
        }
        if other.grams_per_tin.is_some() {
            self.grams_per_tin = other.grams_per_tin;
        }
        if other.date_format.is_some() {
            self.date_format = other.date_format;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Tin conversion rates, falling back to defaults for unset or non-positive values
    pub fn conversion(&self) -> TinConversion {
        let defaults = TinConversion::default();
        TinConversion {
            oz_per_tin: self
                .oz_per_tin
                .filter(|v| *v > 0.0)
                .unwrap_or(defaults.oz_per_tin),
            grams_per_tin: self
                .grams_per_tin
                .filter(|v| *v > 0.0)
                .unwrap_or(defaults.grams_per_tin),
        }
    }

    /// Configured default date format, if set and valid
    pub fn date_format(&self) -> Option<DateFormat> {
        let raw = self.date_format.as_deref()?;
        match raw.parse() {
            Ok(fmt) => Some(fmt),
            Err(e) => {
                log::warn!("ignoring configured date_format: {}", e);
                None
            }
        }
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
