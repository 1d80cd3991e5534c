//! Configuration loading for the q-voter simulation.
//!
//! Model parameters and run settings are loaded from a TOML file and
//! validated before anything is handed to the stepping engine. The engine
//! itself trusts whatever it is given.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "qvoter.toml";

/// Largest number of neighbors any site can have on the 4-neighbor grid.
pub const MAX_NEIGHBORS: usize = 4;

/// Complete configuration: model parameters plus run settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Parameters of the stochastic process
    #[serde(default)]
    pub model: ModelConfig,
    /// How long to run and where to write
    #[serde(default)]
    pub run: RunConfig,
}

/// What happens on the nonconformity branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NonconformityMode {
    /// Flip with probability `f`, ignoring neighbors
    #[default]
    Independence,
    /// Move away from a unanimous influence group
    Anticonformity,
}

/// How the influence group is drawn from a site's neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// q independent draws; the same neighbor may be drawn repeatedly
    #[default]
    WithReplacement,
    /// q distinct neighbors; sites with fewer than q neighbors are skipped
    WithoutReplacement,
}

/// Parameters of the q-voter process.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Lattice side length N
    pub lattice_size: usize,
    /// Influence group size q
    pub influence_size: usize,
    /// Probability p of the nonconformity branch
    pub nonconformity_probability: f64,
    /// Probability f of flipping under independence
    pub flip_probability: f64,
    /// Fraction of sites initialised to +1
    pub initial_concentration: f64,
    pub mode: NonconformityMode,
    pub sampling: SamplingPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            lattice_size: 50,
            influence_size: 2,
            nonconformity_probability: 0.1,
            flip_probability: 0.5,
            initial_concentration: 0.5,
            mode: NonconformityMode::Independence,
            sampling: SamplingPolicy::WithReplacement,
        }
    }
}

impl ModelConfig {
    /// Number of sites, N².
    pub fn site_count(&self) -> usize {
        self.lattice_size * self.lattice_size
    }

    /// Check every numeric range the stepping engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lattice_size == 0 {
            return Err(ConfigError::invalid("lattice_size", "must be at least 1"));
        }
        if self.influence_size == 0 {
            return Err(ConfigError::invalid("influence_size", "must be at least 1"));
        }
        check_probability("nonconformity_probability", self.nonconformity_probability)?;
        check_probability("flip_probability", self.flip_probability)?;
        check_probability("initial_concentration", self.initial_concentration)?;

        if self.sampling == SamplingPolicy::WithoutReplacement
            && self.influence_size > MAX_NEIGHBORS
        {
            tracing::warn!(
                "influence_size {} exceeds {} neighbors; every neighbor-driven update will be skipped",
                self.influence_size,
                MAX_NEIGHBORS
            );
        }
        Ok(())
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid(
            field,
            format!("must be within [0, 1], got {}", value),
        ));
    }
    Ok(())
}

/// Run settings: duration, seeding and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of Monte Carlo steps to perform
    pub steps: u64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Attach a lattice snapshot to every n-th step record (0 disables)
    pub snapshot_interval: u64,
    /// Directory receiving `steps.jsonl` and `summary.json`
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 1000,
            seed: 42,
            snapshot_interval: 0,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl SimulationConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads `explicit` if given. Otherwise loads `fallback` when it exists,
    /// or uses defaults. Errors from a file that exists are returned.
    pub fn load_from(explicit: Option<&Path>, fallback: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if fallback.exists() => {
                tracing::info!("Loading configuration from {}", fallback.display());
                Self::from_file(fallback)
            }
            None => Ok(Self::default()),
        }
    }

    /// Like [`SimulationConfig::load_from`] with `DEFAULT_CONFIG_PATH` as fallback.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(explicit, Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Serializes this configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the model section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate()
    }
}

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Error writing TOML config
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value outside its documented range
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# q-voter simulation configuration

[model]
lattice_size = 50
influence_size = 2
nonconformity_probability = 0.1
flip_probability = 0.5
initial_concentration = 0.5
mode = "independence"        # or "anticonformity"
sampling = "with_replacement" # or "without_replacement"

[run]
steps = 1000
seed = 42
snapshot_interval = 0
output_dir = "output"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.site_count(), 2500);
    }

    #[test]
    fn test_default_toml_matches_default() {
        let parsed = SimulationConfig::from_str(&default_config_toml()).unwrap();
        let default = SimulationConfig::default();
        assert_eq!(parsed.model, default.model);
        assert_eq!(parsed.run, default.run);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SimulationConfig::from_str(
            r#"
            [model]
            lattice_size = 10
            mode = "anticonformity"
            sampling = "without_replacement"
            "#,
        )
        .unwrap();

        assert_eq!(config.model.lattice_size, 10);
        assert_eq!(config.model.mode, NonconformityMode::Anticonformity);
        assert_eq!(config.model.sampling, SamplingPolicy::WithoutReplacement);
        assert_eq!(config.model.influence_size, 2);
        assert_eq!(config.run.steps, 1000);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = SimulationConfig::default();
        config.model.influence_size = 3;
        config.model.mode = NonconformityMode::Anticonformity;
        config.run.seed = 7;

        let text = config.to_toml().unwrap();
        let parsed = SimulationConfig::from_str(&text).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.run, config.run);
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let err = SimulationConfig::from_str("[model]\nmode = \"contrarian\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut model = ModelConfig::default();
        model.lattice_size = 0;
        assert!(matches!(
            model.validate(),
            Err(ConfigError::Invalid { field: "lattice_size", .. })
        ));

        let mut model = ModelConfig::default();
        model.influence_size = 0;
        assert!(matches!(
            model.validate(),
            Err(ConfigError::Invalid { field: "influence_size", .. })
        ));

        let mut model = ModelConfig::default();
        model.nonconformity_probability = 1.5;
        assert!(matches!(
            model.validate(),
            Err(ConfigError::Invalid { field: "nonconformity_probability", .. })
        ));

        let mut model = ModelConfig::default();
        model.flip_probability = f64::NAN;
        assert!(matches!(
            model.validate(),
            Err(ConfigError::Invalid { field: "flip_probability", .. })
        ));

        let mut model = ModelConfig::default();
        model.initial_concentration = -0.01;
        assert!(matches!(
            model.validate(),
            Err(ConfigError::Invalid { field: "initial_concentration", .. })
        ));
    }

    #[test]
    fn test_validate_accepts_boundaries() {
        let mut model = ModelConfig::default();
        model.nonconformity_probability = 1.0;
        model.flip_probability = 0.0;
        model.initial_concentration = 1.0;
        model.lattice_size = 1;
        assert!(model.validate().is_ok());

        model.sampling = SamplingPolicy::WithoutReplacement;
        model.influence_size = 5;
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_load_from_falls_back_to_default_path() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join(DEFAULT_CONFIG_PATH);

        // No file anywhere: defaults
        let config = SimulationConfig::load_from(None, &fallback).unwrap();
        assert_eq!(config.model, ModelConfig::default());

        std::fs::write(&fallback, "[model]\nlattice_size = 12\n").unwrap();
        let config = SimulationConfig::load_from(None, &fallback).unwrap();
        assert_eq!(config.model.lattice_size, 12);

        // An explicit path wins over the fallback
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "[model]\nlattice_size = 7\n").unwrap();
        let config = SimulationConfig::load_from(Some(&explicit), &fallback).unwrap();
        assert_eq!(config.model.lattice_size, 7);
    }

    #[test]
    fn test_load_from_reports_broken_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join(DEFAULT_CONFIG_PATH);
        std::fs::write(&fallback, "[model\n").unwrap();
        assert!(matches!(
            SimulationConfig::load_from(None, &fallback),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimulationConfig::from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
