//! TOML configuration of an analysis run.
//!
//! ```toml
//! [profile]
//! indicator = "hypervolume"
//! number_of_targets = 51
//! target_strategy = "log"
//!
//! [[indicators]]
//! name = "spread"
//! larger_is_better = false
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, ErrorDetails};
use crate::indicator::{self, Indicator, IndicatorRegistry};
use crate::result::DEFAULT_FEVALS_COLUMN;
use crate::rtp::{DEFAULT_NUMBER_OF_TARGETS, RuntimeProfileOptions};
use crate::targets::TargetStrategy;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub profile: ProfileConfig,
    /// Indicators to register in addition to the built-in ones.
    #[serde(default)]
    pub indicators: Vec<IndicatorConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub indicator: String,
    #[serde(default = "default_number_of_targets")]
    pub number_of_targets: usize,
    #[serde(default)]
    pub target_strategy: TargetStrategy,
    /// Polarity assumed for `indicator` if it is not registered.
    #[serde(default = "default_maximize_indicator")]
    pub maximize_indicator: bool,
    #[serde(default = "default_fevals_column")]
    pub fevals_column: String,
}

fn default_number_of_targets() -> usize {
    DEFAULT_NUMBER_OF_TARGETS
}

fn default_maximize_indicator() -> bool {
    true
}

fn default_fevals_column() -> String {
    DEFAULT_FEVALS_COLUMN.to_string()
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndicatorConfig {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub larger_is_better: bool,
}

impl From<&IndicatorConfig> for Indicator {
    fn from(config: &IndicatorConfig) -> Self {
        let indicator = Indicator::new(config.name.clone(), config.larger_is_better);
        match &config.display_name {
            Some(display_name) => indicator.with_display_name(display_name.clone()),
            None => indicator,
        }
    }
}

fn config_error(message: String) -> Error {
    Error::new(ErrorDetails::Config { message })
}

impl AnalysisConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorDetails::FileRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a config.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| config_error(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.profile.indicator.is_empty() {
            return Err(config_error("`profile.indicator` must not be empty".to_string()));
        }
        if self.profile.number_of_targets == 0 {
            return Err(config_error(
                "`profile.number_of_targets` must be greater than 0".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for (i, indicator) in self.indicators.iter().enumerate() {
            if indicator.name.is_empty() {
                return Err(config_error(format!(
                    "`indicators[{i}].name` must not be empty"
                )));
            }
            if !seen.insert(indicator.name.as_str()) {
                return Err(config_error(format!(
                    "Indicator `{}` is configured more than once",
                    indicator.name
                )));
            }
        }
        Ok(())
    }

    /// Adds the configured indicators to `registry`.
    pub fn register_indicators(&self, registry: &mut IndicatorRegistry) {
        for indicator in &self.indicators {
            registry.register(indicator.into());
        }
    }

    /// Adds the configured indicators to the process-wide registry.
    pub fn register_global_indicators(&self) {
        for indicator in &self.indicators {
            indicator::register(indicator.into());
        }
    }

    pub fn runtime_profile_options(&self) -> RuntimeProfileOptions {
        RuntimeProfileOptions {
            maximize_indicator: self.profile.maximize_indicator,
            number_of_targets: self.profile.number_of_targets,
            targets: None,
            target_strategy: self.profile.target_strategy,
        }
    }
}
