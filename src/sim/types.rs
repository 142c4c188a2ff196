//! Core simulation types: input series, per-step result rows, run status.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

/// Number of hourly steps in one simulation run (one week).
pub const HORIZON: usize = 168;

/// Length of one step in hours.
pub const DT_HOURS: f64 = 1.0;

/// Problems with the series handed to the simulator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("`{name}` has {len} samples, expected {}", HORIZON)]
    Length { name: &'static str, len: usize },

    #[error("`{name}` contains a non-finite value at index {index}")]
    NonFinite { name: &'static str, index: usize },

    #[error("battery capacity must be greater than 0 kWh, got {0}")]
    Capacity(f64),

    #[error("feed-in tariff must be finite, got {0}")]
    FeedInTariff(f64),
}

/// Aligned hourly inputs for one run.
///
/// Built through [`SimInputs::new`], which enforces the length and value
/// invariants the engine relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct SimInputs {
    timestamps: Vec<NaiveDateTime>,
    pv_kw: Vec<f64>,
    load_kw: Vec<f64>,
    price_eur_kwh: Vec<f64>,
    co2_g_kwh: Vec<f64>,
    feed_in_tariff: f64,
    w_batt_max_kwh: f64,
}

impl SimInputs {
    /// Validates and bundles the input series.
    ///
    /// # Arguments
    ///
    /// * `timestamps` - Start of each hour
    /// * `pv_kw` - PV generation (kW)
    /// * `load_kw` - Household demand (kW)
    /// * `price_eur_kwh` - Customer electricity price (EUR/kWh)
    /// * `co2_g_kwh` - Specific CO2 emissions of grid electricity (g/kWh)
    /// * `feed_in_tariff` - PV feed-in tariff (EUR/kWh)
    /// * `w_batt_max_kwh` - Usable battery capacity (kWh, > 0)
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError`] found.
    pub fn new(
        timestamps: Vec<NaiveDateTime>,
        pv_kw: Vec<f64>,
        load_kw: Vec<f64>,
        price_eur_kwh: Vec<f64>,
        co2_g_kwh: Vec<f64>,
        feed_in_tariff: f64,
        w_batt_max_kwh: f64,
    ) -> Result<Self, InputError> {
        if timestamps.len() != HORIZON {
            return Err(InputError::Length {
                name: "date_time",
                len: timestamps.len(),
            });
        }
        for (name, series) in [
            ("P_pv", &pv_kw),
            ("P_load", &load_kw),
            ("electricity_price_customer", &price_eur_kwh),
            ("CO2_emissions", &co2_g_kwh),
        ] {
            if series.len() != HORIZON {
                return Err(InputError::Length {
                    name,
                    len: series.len(),
                });
            }
            if let Some(index) = series.iter().position(|v| !v.is_finite()) {
                return Err(InputError::NonFinite { name, index });
            }
        }
        if !(w_batt_max_kwh.is_finite() && w_batt_max_kwh > 0.0) {
            return Err(InputError::Capacity(w_batt_max_kwh));
        }
        if !feed_in_tariff.is_finite() {
            return Err(InputError::FeedInTariff(feed_in_tariff));
        }
        Ok(Self {
            timestamps,
            pv_kw,
            load_kw,
            price_eur_kwh,
            co2_g_kwh,
            feed_in_tariff,
            w_batt_max_kwh,
        })
    }

    /// Hourly timestamps starting at `start`.
    pub fn hourly_timestamps(start: NaiveDateTime) -> Vec<NaiveDateTime> {
        (0..HORIZON)
            .map(|h| start + Duration::hours(h as i64))
            .collect()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn pv_kw(&self) -> &[f64] {
        &self.pv_kw
    }

    pub fn load_kw(&self) -> &[f64] {
        &self.load_kw
    }

    pub fn price_eur_kwh(&self) -> &[f64] {
        &self.price_eur_kwh
    }

    pub fn co2_g_kwh(&self) -> &[f64] {
        &self.co2_g_kwh
    }

    pub fn feed_in_tariff(&self) -> f64 {
        self.feed_in_tariff
    }

    pub fn w_batt_max_kwh(&self) -> f64 {
        self.w_batt_max_kwh
    }
}

/// One row of the flattened results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub t: usize,
    pub date_time: NaiveDateTime,
    pub p_load_kw: f64,
    pub p_pv_kw: f64,
    pub price_eur_kwh: f64,
    pub co2_g_kwh: f64,
    pub p_charge_kw: f64,
    pub p_discharge_kw: f64,
    pub p_feed_in_kw: f64,
    pub p_purchase_kw: f64,
    pub w_batt_kwh: f64,
    /// State of charge as a fraction (0.0 to 1.0).
    pub soc: f64,
    pub e_purchase_kwh: f64,
    pub e_feed_in_kwh: f64,
    pub co2_generated_g: f64,
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} {} | pv={:>5.2} load={:>5.2} | charge={:>5.2} discharge={:>5.2} \
             feed_in={:>5.2} purchase={:>5.2} | W={:>5.2} kWh (SoC={:.1}%)",
            self.t,
            self.date_time.format("%a %H:%M"),
            self.p_pv_kw,
            self.p_load_kw,
            self.p_charge_kw,
            self.p_discharge_kw,
            self.p_feed_in_kw,
            self.p_purchase_kw,
            self.w_batt_kwh,
            self.soc * 100.0,
        )
    }
}

/// Overall verdict of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Valid,
    /// At least one physical invariant was violated.
    MayBeInvalid,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "valid",
            Self::MayBeInvalid => "results may be invalid",
        })
    }
}
