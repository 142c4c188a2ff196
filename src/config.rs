//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::{LoadMode, LoadUnit};
use crate::profiles::{AdditionalCosts, HouseholdLoad, LoadProfile, SolarProfile};
use crate::rules::Builtin;

/// Accepted formats for `simulation.start`.
const START_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Upper bound of the feed-in tariff (EUR/kWh).
pub const MAX_FEED_IN_TARIFF: f64 = 0.5;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the `reference` preset. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::from_preset`] for a built-in scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Operating strategy: a built-in rule set or a JSON file.
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub pv: PvConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Optional CSV files replacing the generated input series.
    #[serde(default)]
    pub inputs: InputsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Timestamp of the first hour, `YYYY-MM-DD HH:MM:SS`.
    pub start: String,
    /// Master random seed for the generated series.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: "2015-01-01 00:00:00".to_string(),
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    pub builtin: Builtin,
    /// Rule set JSON file; takes precedence over `builtin`.
    pub file: Option<PathBuf>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            builtin: Builtin::Reference,
            file: None,
        }
    }
}

impl StrategyConfig {
    /// Label used in reports and export file names.
    pub fn label(&self) -> &'static str {
        if self.file.is_some() {
            "Custom"
        } else {
            self.builtin.label()
        }
    }
}

/// PV installation and generated capacity factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvConfig {
    /// Installed capacity (kW).
    pub capacity_kw: f64,
    pub sunrise_hour: usize,
    pub sunset_hour: usize,
    pub peak_cf: f64,
    pub min_clearness: f64,
    pub noise_std: f64,
}

impl Default for PvConfig {
    fn default() -> Self {
        let solar = SolarProfile::default();
        Self {
            capacity_kw: 6.0,
            sunrise_hour: solar.sunrise_hour,
            sunset_hour: solar.sunset_hour,
            peak_cf: solar.peak_cf,
            min_clearness: solar.min_clearness,
            noise_std: solar.noise_std,
        }
    }
}

impl PvConfig {
    pub fn solar_profile(&self, seed: u64) -> SolarProfile {
        SolarProfile {
            sunrise_hour: self.sunrise_hour,
            sunset_hour: self.sunset_hour,
            peak_cf: self.peak_cf,
            min_clearness: self.min_clearness,
            noise_std: self.noise_std,
            seed,
        }
    }
}

/// Household demand: a built-in profile, optionally replaced by or combined
/// with an uploaded one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    pub profile: LoadProfile,
    pub scale: f64,
    pub noise_std: f64,
    /// CSV with `date_time` and `profile_1` columns.
    pub upload: Option<PathBuf>,
    pub unit: LoadUnit,
    pub mode: LoadMode,
}

impl Default for LoadConfig {
    fn default() -> Self {
        let load = HouseholdLoad::default();
        Self {
            profile: load.profile,
            scale: load.scale,
            noise_std: load.noise_std,
            upload: None,
            unit: LoadUnit::default(),
            mode: LoadMode::default(),
        }
    }
}

impl LoadConfig {
    pub fn household(&self, seed: u64) -> HouseholdLoad {
        HouseholdLoad {
            profile: self.profile,
            scale: self.scale,
            noise_std: self.noise_std,
            seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable energy capacity (kWh).
    pub capacity_kwh: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self { capacity_kwh: 6.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Compensation per kWh fed into the grid (EUR/kWh).
    pub feed_in_eur_kwh: f64,
    pub additional_costs: AdditionalCosts,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            feed_in_eur_kwh: 0.08,
            additional_costs: AdditionalCosts::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputsConfig {
    /// Field delimiter of every input CSV.
    pub separator: char,
    pub pv_cf: Option<PathBuf>,
    /// Wholesale price (EUR/kWh); additional costs are applied on top.
    pub electricity_price: Option<PathBuf>,
    pub co2_emissions: Option<PathBuf>,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            separator: ',',
            pv_cf: None,
            electricity_price: None,
            co2_emissions: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_kwh"`).
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// 6 kW PV, 6 kWh battery, reference strategy.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Same installation run without touching the battery.
    pub fn no_battery() -> Self {
        Self {
            strategy: StrategyConfig {
                builtin: Builtin::NoBattery,
                file: None,
            },
            ..Self::default()
        }
    }

    pub fn small_battery() -> Self {
        Self {
            battery: BatteryConfig { capacity_kwh: 3.0 },
            ..Self::default()
        }
    }

    pub fn large_battery() -> Self {
        Self {
            battery: BatteryConfig { capacity_kwh: 9.0 },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["reference", "no_battery", "small_battery", "large_battery"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "reference" => Ok(Self::reference()),
            "no_battery" => Ok(Self::no_battery()),
            "small_battery" => Ok(Self::small_battery()),
            "large_battery" => Ok(Self::large_battery()),
            _ => Err(ConfigError::new(
                "preset",
                format!("unknown preset \"{name}\", available: {}", Self::PRESETS.join(", ")),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// Relative paths inside the file are resolved against its directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display())))?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let Some(dir) = path.parent() {
            cfg.resolve_paths(dir);
        }
        Ok(cfg)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    fn resolve_paths(&mut self, base: &Path) {
        let paths = [
            &mut self.strategy.file,
            &mut self.load.upload,
            &mut self.inputs.pv_cf,
            &mut self.inputs.electricity_price,
            &mut self.inputs.co2_emissions,
        ];
        for path in paths.into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Timestamp of the first simulated hour.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `simulation.start` is not a timestamp.
    pub fn start_time(&self) -> Result<NaiveDateTime, ConfigError> {
        let raw = self.simulation.start.trim();
        START_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| {
                ConfigError::new(
                    "simulation.start",
                    format!("expected \"YYYY-MM-DD HH:MM:SS\", got \"{raw}\""),
                )
            })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.start_time() {
            errors.push(e);
        }

        let pv = &self.pv;
        if !pv.capacity_kw.is_finite() || pv.capacity_kw < 0.0 {
            errors.push(ConfigError::new("pv.capacity_kw", "must be >= 0"));
        }
        if pv.sunrise_hour >= pv.sunset_hour {
            errors.push(ConfigError::new("pv.sunrise_hour", "must be < pv.sunset_hour"));
        }
        if pv.sunset_hour > 24 {
            errors.push(ConfigError::new("pv.sunset_hour", "must be <= 24"));
        }
        if !(0.0..=1.0).contains(&pv.peak_cf) {
            errors.push(ConfigError::new("pv.peak_cf", "must be in [0.0, 1.0]"));
        }
        if !(0.0..=1.0).contains(&pv.min_clearness) {
            errors.push(ConfigError::new("pv.min_clearness", "must be in [0.0, 1.0]"));
        }
        if pv.noise_std < 0.0 {
            errors.push(ConfigError::new("pv.noise_std", "must be >= 0"));
        }

        let load = &self.load;
        if !load.scale.is_finite() || load.scale < 0.0 {
            errors.push(ConfigError::new("load.scale", "must be >= 0"));
        }
        if load.noise_std < 0.0 {
            errors.push(ConfigError::new("load.noise_std", "must be >= 0"));
        }

        let bat = &self.battery;
        if !bat.capacity_kwh.is_finite() || bat.capacity_kwh <= 0.0 {
            errors.push(ConfigError::new("battery.capacity_kwh", "must be > 0"));
        }

        let tariff = &self.tariff;
        if !(0.0..=MAX_FEED_IN_TARIFF).contains(&tariff.feed_in_eur_kwh) {
            errors.push(ConfigError::new(
                "tariff.feed_in_eur_kwh",
                format!("must be in [0.0, {MAX_FEED_IN_TARIFF}]"),
            ));
        }
        let costs = &tariff.additional_costs;
        if costs.taxes_and_fees_ct_kwh < 0.0 {
            errors.push(ConfigError::new(
                "tariff.additional_costs.taxes_and_fees_ct_kwh",
                "must be >= 0",
            ));
        }
        if costs.grid_fees_ct_kwh < 0.0 {
            errors.push(ConfigError::new("tariff.additional_costs.grid_fees_ct_kwh", "must be >= 0"));
        }

        let sep = self.inputs.separator;
        if !sep.is_ascii() || sep.is_ascii_alphanumeric() || sep == '"' || sep == '\n' {
            errors.push(ConfigError::new(
                "inputs.separator",
                format!("must be a single ASCII punctuation or whitespace character, got {sep:?}"),
            ));
        }

        errors
    }
}
