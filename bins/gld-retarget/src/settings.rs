//! Layered configuration for the replay tool.
//!
//! Sources, lowest precedence first: built-in defaults, an optional config
//! file (TOML or JSON, by extension), `GLD_`-prefixed environment variables,
//! then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use gld_core::constants::NetworkType;
use gld_core::rules::{EpochRuleSet, RuleSetParams};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Network preset (`main`, `test`, `regtest`).
    #[serde(default = "default_network")]
    pub network: String,
    /// JSON rule file replacing the preset.
    #[serde(default)]
    pub rules_file: Option<PathBuf>,
    /// Inline rule set replacing the preset; `rules_file` wins if both are set.
    #[serde(default)]
    pub rules: Option<RuleSetParams>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_network() -> String {
    NetworkType::Mainnet.id().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Values given on the command line; `None` leaves lower layers in place.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub network: Option<String>,
    pub rules_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}

impl Settings {
    /// Merge every source into one settings value.
    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }
        let rules_file = overrides
            .rules_file
            .map(|p| p.to_string_lossy().into_owned());
        let config = builder
            .add_source(Environment::with_prefix("GLD").try_parsing(true))
            .set_override_option("network", overrides.network)?
            .set_override_option("rules_file", rules_file)?
            .set_override_option("log_level", overrides.log_level)?
            .set_override_option("log_format", overrides.log_format)?
            .build()
            .context("failed to read configuration")?;
        config
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn network(&self) -> Result<NetworkType> {
        Ok(self.network.parse()?)
    }

    /// The rule set to replay against.
    pub fn rule_set(&self) -> Result<EpochRuleSet> {
        if let Some(path) = &self.rules_file {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read rule file {}", path.display()))?;
            return EpochRuleSet::from_json(&json)
                .with_context(|| format!("invalid rule file {}", path.display()));
        }
        if let Some(params) = &self.rules {
            return EpochRuleSet::new(params.clone()).context("invalid inline rule set");
        }
        Ok(EpochRuleSet::for_network(self.network()?))
    }
}
