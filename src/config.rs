//! Configuration management with validation and defaults
//!
//! Configuration is loaded from an optional TOML file, then overridden by
//! `CASINO_*` environment variables, then validated.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::errors::{ConfigurationError, LedgerResult};
use crate::games::types::{Chips, SideBet, MAX_SIDE_BET_MULTIPLIER};

/// Complete ledger configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    pub side_bets: SideBetConfig,
    pub chart: ChartConfig,
    pub display: DisplayConfig,
}

/// Side-bet payout table
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SideBetConfig {
    /// Probability that a single side bet wins its trial
    pub win_probability: f64,
    pub perfect_pair: Chips,
    pub twenty_one_plus_three: Chips,
    pub dealer_bust: Chips,
}

impl Default for SideBetConfig {
    fn default() -> Self {
        Self {
            win_probability: 0.25,
            perfect_pair: 5,
            twenty_one_plus_three: 10,
            dealer_bust: 30,
        }
    }
}

impl SideBetConfig {
    pub fn multiplier(&self, bet: SideBet) -> Chips {
        match bet {
            SideBet::PerfectPair => self.perfect_pair,
            SideBet::TwentyOnePlusThree => self.twenty_one_plus_three,
            SideBet::DealerBust => self.dealer_bust,
        }
    }
}

/// Session chart settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 1400,
            height: 1000,
            title: "BlackJack Session".to_string(),
        }
    }
}

/// Text formatting settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency_symbol: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Configuration that never renders charts
    pub fn text_only() -> Self {
        Self {
            chart: ChartConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> LedgerResult<()> {
        let probability = self.side_bets.win_probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigurationError::InvalidValue {
                field: "side_bets.win_probability".to_string(),
                value: probability.to_string(),
                reason: "Probability must be between 0 and 1".to_string(),
            }
            .into());
        }

        for bet in SideBet::ALL {
            let multiplier = self.side_bets.multiplier(bet);
            if multiplier <= 0 || multiplier > MAX_SIDE_BET_MULTIPLIER {
                return Err(ConfigurationError::InvalidValue {
                    field: format!("side_bets.{}", bet.label()),
                    value: multiplier.to_string(),
                    reason: format!("Multiplier must be between 1 and {}", MAX_SIDE_BET_MULTIPLIER),
                }
                .into());
            }
        }

        if self.chart.enabled && (self.chart.width < 200 || self.chart.height < 200) {
            return Err(ConfigurationError::ValidationFailed(format!(
                "chart area {}x{} is below the 200x200 minimum",
                self.chart.width, self.chart.height
            ))
            .into());
        }

        if self.display.currency_symbol.is_empty() {
            return Err(ConfigurationError::InvalidValue {
                field: "display.currency_symbol".to_string(),
                value: String::new(),
                reason: "Currency symbol cannot be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> LedgerResult<LedgerConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => LedgerConfig::default(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    fn load_from_file(&self, path: &str) -> LedgerResult<LedgerConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into()
        })
    }

    /// Save configuration to file
    pub fn save(&self, config: &LedgerConfig, path: &str) -> LedgerResult<()> {
        let toml_string = toml::to_string_pretty(config).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, toml_string).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into()
        })
    }
}

/// Apply `CASINO_*` overrides from `lookup`
pub fn apply_overrides<F>(config: &mut LedgerConfig, lookup: F) -> LedgerResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("CASINO_SIDE_BET_WIN_PROBABILITY") {
        config.side_bets.win_probability =
            parse_override("CASINO_SIDE_BET_WIN_PROBABILITY", value, "Invalid probability")?;
    }
    if let Some(value) = lookup("CASINO_CHART_ENABLED") {
        config.chart.enabled = parse_override("CASINO_CHART_ENABLED", value, "Invalid boolean value")?;
    }
    if let Some(value) = lookup("CASINO_CHART_WIDTH") {
        config.chart.width = parse_override("CASINO_CHART_WIDTH", value, "Invalid width")?;
    }
    if let Some(value) = lookup("CASINO_CHART_HEIGHT") {
        config.chart.height = parse_override("CASINO_CHART_HEIGHT", value, "Invalid height")?;
    }
    if let Some(symbol) = lookup("CASINO_CURRENCY_SYMBOL") {
        config.display.currency_symbol = symbol;
    }

    Ok(())
}

fn parse_override<T: std::str::FromStr>(field: &str, value: String, reason: &str) -> LedgerResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigurationError::InvalidValue {
            field: field.to_string(),
            value,
            reason: reason.to_string(),
        }
        .into()
    })
}

/// Builder pattern for creating configurations
#[derive(Default)]
pub struct ConfigBuilder {
    config: LedgerConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: LedgerConfig::default(),
        }
    }

    pub fn side_bets(mut self, side_bets: SideBetConfig) -> Self {
        self.config.side_bets = side_bets;
        self
    }

    pub fn chart(mut self, chart: ChartConfig) -> Self {
        self.config.chart = chart;
        self
    }

    pub fn currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.config.display.currency_symbol = symbol.into();
        self
    }

    pub fn build(self) -> LedgerConfig {
        self.config
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str) -> LedgerResult<()> {
    ConfigLoader::new().save(&LedgerConfig::default(), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LedgerError;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.chart.enabled);
        assert_eq!(config.display.currency_symbol, "₹");
    }

    #[test]
    fn test_text_only_preset() {
        let config = LedgerConfig::text_only();
        assert!(!config.chart.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_probability() {
        let mut config = LedgerConfig::default();
        config.side_bets.win_probability = 1.5;
        assert!(matches!(config.validate(), Err(LedgerError::Configuration(_))));
    }

    #[test]
    fn test_invalid_multiplier() {
        let mut config = LedgerConfig::default();
        config.side_bets.dealer_bust = 0;
        assert!(config.validate().is_err());

        config.side_bets.dealer_bust = MAX_SIDE_BET_MULTIPLIER + 1;
        assert!(config.validate().is_err());

        config.side_bets.dealer_bust = MAX_SIDE_BET_MULTIPLIER;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tiny_chart_only_matters_when_enabled() {
        let mut config = LedgerConfig::default();
        config.chart.width = 10;
        assert!(config.validate().is_err());

        config.chart.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CASINO_SIDE_BET_WIN_PROBABILITY", "0.5"),
            ("CASINO_CHART_ENABLED", "false"),
            ("CASINO_CURRENCY_SYMBOL", "$"),
        ]);
        let mut config = LedgerConfig::default();

        apply_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.side_bets.win_probability, 0.5);
        assert!(!config.chart.enabled);
        assert_eq!(config.display.currency_symbol, "$");
    }

    #[test]
    fn test_bad_override() {
        let mut config = LedgerConfig::default();
        let result = apply_overrides(&mut config, |key| {
            (key == "CASINO_CHART_WIDTH").then(|| "wide".to_string())
        });

        match result {
            Err(LedgerError::Configuration(ConfigurationError::InvalidValue { field, .. })) => {
                assert_eq!(field, "CASINO_CHART_WIDTH")
            }
            other => panic!("Expected invalid value, got {:?}", other),
        }
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .side_bets(SideBetConfig {
                win_probability: 0.1,
                ..Default::default()
            })
            .currency_symbol("€")
            .build();

        assert_eq!(config.side_bets.win_probability, 0.1);
        assert_eq!(config.side_bets.perfect_pair, 5);
        assert_eq!(config.display.currency_symbol, "€");
    }

    #[test]
    fn test_save_and_load_config() -> LedgerResult<()> {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let original = ConfigBuilder::new().currency_symbol("$").build();
        let loader = ConfigLoader::new();
        loader.save(&original, path)?;

        let loaded = ConfigLoader::new().with_path(path).load_from_file(path)?;
        assert_eq!(loaded, original);

        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: LedgerConfig = toml::from_str("[chart]\nenabled = false\n").unwrap();
        assert!(!loaded.chart.enabled);
        assert_eq!(loaded.chart.width, 1400);
        assert_eq!(loaded.side_bets.dealer_bust, 30);
    }
}
