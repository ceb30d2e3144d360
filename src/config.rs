use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

use crate::models::MatchParams;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MatchingSettings {
    /// Penalty for pairs whose year preferences are not met. Keep it small.
    #[validate(range(min = 0.0, max = 0.9))]
    #[serde(default = "default_penalty_multiplier")]
    pub penalty_multiplier: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub unmatched_penalty: f64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            penalty_multiplier: default_penalty_multiplier(),
            unmatched_penalty: 0.0,
        }
    }
}

impl MatchingSettings {
    pub fn params(&self) -> MatchParams {
        MatchParams {
            penalty_multiplier: self.penalty_multiplier,
            unmatched_penalty: self.unmatched_penalty,
        }
    }
}

fn default_penalty_multiplier() -> f64 { 0.1 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolverSettings {
    pub time_limit_secs: Option<u64>,
}

impl SolverSettings {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    #[serde(default = "default_participants_path")]
    pub participants_path: PathBuf,
    /// Only match the first N participants (useful for trial runs)
    pub limit: Option<usize>,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            participants_path: default_participants_path(),
            limit: None,
        }
    }
}

fn default_participants_path() -> PathBuf { PathBuf::from("data/participants.json") }

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_true")]
    pub write_lp: bool,
    #[serde(default = "default_true")]
    pub write_json: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            write_lp: true,
            write_json: true,
        }
    }
}

fn default_output_dir() -> PathBuf { PathBuf::from("data") }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MATCHMAKER_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MATCHMAKER__MATCHING__PENALTY_MULTIPLIER -> matching.penalty_multiplier
            .add_source(env_source())
            .build()?;

        Self::finish(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        Self::finish(settings)
    }

    /// Parse settings from TOML text, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Self::finish(settings)
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings
            .matching
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid matching settings: {}", e)))?;
        Ok(settings)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("MATCHMAKER")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.penalty_multiplier, 0.1);
        assert_eq!(matching.unmatched_penalty, 0.0);
        assert_eq!(matching.params(), MatchParams::default());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "pretty");
    }

    #[test]
    fn test_from_toml() {
        let settings = Settings::from_toml_str(
            r#"
            [matching]
            penalty_multiplier = 0.25

            [solver]
            time_limit_secs = 60

            [output]
            dir = "out"
            write_lp = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.matching.penalty_multiplier, 0.25);
        assert_eq!(settings.solver.time_limit(), Some(Duration::from_secs(60)));
        assert_eq!(settings.output.dir, PathBuf::from("out"));
        assert!(!settings.output.write_lp);
        assert!(settings.output.write_json);
        assert_eq!(settings.input.participants_path, PathBuf::from("data/participants.json"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.matching.penalty_multiplier, 0.1);
        assert_eq!(settings.solver.time_limit(), None);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_penalty_out_of_range_rejected() {
        let result = Settings::from_toml_str(
            r#"
            [matching]
            penalty_multiplier = 1.5
            "#,
        );
        assert!(result.is_err());
    }
}
