use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::economics::{Economics, FuelTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub economics: EconomicsConfig,
    #[serde(default)]
    pub fuels: FuelTable,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub measures: MeasureParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicsConfig {
    /// Minimum savings-to-investment ratio for a measure to enter the
    /// package on economics alone.
    #[serde(default = "default_min_sir")]
    pub min_sir: f64,
    #[serde(default = "default_discount_rate")]
    pub real_discount_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Attempt utility-bill calibration when history is present.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minimum matched monthly periods per end use for the regression.
    #[serde(default = "default_min_periods")]
    pub min_periods: usize,
}

/// Tuning knobs for individual measure evaluators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureParams {
    /// Infiltration reduction is never allowed to exceed this fraction of
    /// whole-house CFM50.
    #[serde(default = "default_infiltration_cap")]
    pub infiltration_cap_fraction: f64,
    /// Leakage floor below which air-sealing is not attempted.
    #[serde(default = "default_infiltration_floor")]
    pub infiltration_floor_cfm50: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub min_sir: Option<f64>,
    pub real_discount_rate: Option<f64>,
    pub disable_billing: bool,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/retrofit-advisor/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(min_sir) = overrides.min_sir {
            self.economics.min_sir = min_sir;
        }
        if let Some(rate) = overrides.real_discount_rate {
            self.economics.real_discount_rate = rate;
        }
        if overrides.disable_billing {
            self.billing.enabled = false;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    /// Economic view handed to the engine.
    pub fn economics(&self) -> Economics {
        Economics {
            real_discount_rate: self.economics.real_discount_rate,
            min_sir: self.economics.min_sir,
            fuels: self.fuels.clone(),
        }
    }

    pub fn default_template() -> String {
        let template = r#"[economics]
min_sir = 1.0
real_discount_rate = 0.03

[fuels.natural_gas]
price_per_mmbtu = 12.0
escalation = 0.012

[fuels.electricity]
price_per_mmbtu = 38.0
escalation = 0.008

[fuels.oil]
price_per_mmbtu = 22.0
escalation = 0.015

[fuels.propane]
price_per_mmbtu = 26.0
escalation = 0.013

[fuels.kerosene]
price_per_mmbtu = 24.0
escalation = 0.015

[fuels.wood]
price_per_mmbtu = 10.0
escalation = 0.005

[billing]
enabled = true
min_periods = 6

[measures]
infiltration_cap_fraction = 0.30
infiltration_floor_cfm50 = 1500.0
"#;
        template.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            economics: EconomicsConfig::default(),
            fuels: FuelTable::default(),
            billing: BillingConfig::default(),
            measures: MeasureParams::default(),
        }
    }
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            min_sir: default_min_sir(),
            real_discount_rate: default_discount_rate(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_periods: default_min_periods(),
        }
    }
}

impl Default for MeasureParams {
    fn default() -> Self {
        Self {
            infiltration_cap_fraction: default_infiltration_cap(),
            infiltration_floor_cfm50: default_infiltration_floor(),
        }
    }
}

fn default_min_sir() -> f64 {
    1.0
}

fn default_discount_rate() -> f64 {
    0.03
}

fn default_min_periods() -> usize {
    6
}

fn default_infiltration_cap() -> f64 {
    0.30
}

fn default_infiltration_floor() -> f64 {
    1500.0
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_round_trips_through_toml() {
        let parsed: Config = toml::from_str(&Config::default_template()).expect("template parses");
        assert!((parsed.economics.min_sir - 1.0).abs() < 1e-9);
        assert!(parsed.billing.enabled);
        assert_eq!(parsed.billing.min_periods, 6);
        assert!((parsed.fuels.electricity.price_per_mmbtu - 38.0).abs() < 1e-9);
    }

    #[test]
    fn overrides_take_effect() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            min_sir: Some(1.5),
            real_discount_rate: None,
            disable_billing: true,
        });
        assert!((config.economics.min_sir - 1.5).abs() < 1e-9);
        assert!(!config.billing.enabled);
    }
}
