//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};

use pv_battery_sim::sim::{HORIZON, SimInputs};

/// Monday 2015-01-05 00:00, the first hour of every fixture week.
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 1, 5)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

/// Idealised PV day: 4 kW at noon, nothing at night.
pub fn sunny_pv_kw() -> Vec<f64> {
    (0..HORIZON)
        .map(|t| {
            let hour = (t % 24) as f64;
            if (7.0..19.0).contains(&hour) {
                4.0 * (std::f64::consts::PI * (hour - 7.0) / 12.0).sin()
            } else {
                0.0
            }
        })
        .collect()
}

/// Flat 0.6 kW base load with a 1.5 kW evening peak.
pub fn evening_peak_load_kw() -> Vec<f64> {
    (0..HORIZON)
        .map(|t| if (18..22).contains(&(t % 24)) { 2.1 } else { 0.6 })
        .collect()
}

/// Week of inputs with flat price (0.30 EUR/kWh), CO2 (400 g/kWh) and tariff 0.08.
pub fn inputs_with(pv_kw: Vec<f64>, load_kw: Vec<f64>, capacity_kwh: f64) -> SimInputs {
    SimInputs::new(
        SimInputs::hourly_timestamps(start()),
        pv_kw,
        load_kw,
        vec![0.30; HORIZON],
        vec![400.0; HORIZON],
        0.08,
        capacity_kwh,
    )
    .expect("fixture inputs are valid")
}

/// Sunny week with an evening peak and a 6 kWh battery.
pub fn default_inputs() -> SimInputs {
    inputs_with(sunny_pv_kw(), evening_peak_load_kw(), 6.0)
}
