//! API response and query types.
//!
//! Result field names follow the CSV export header.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::sim::ResultRow;

/// One hour of results using the export column names.
#[derive(Debug, Serialize)]
pub struct ResultRecord {
    pub t: usize,
    #[serde(with = "date_time_format")]
    pub date_time: NaiveDateTime,
    #[serde(rename = "P_load_kW")]
    pub p_load_kw: f64,
    #[serde(rename = "P_pv_kW")]
    pub p_pv_kw: f64,
    #[serde(rename = "electricity_price_customer_EUR_kWh")]
    pub price_eur_kwh: f64,
    #[serde(rename = "CO2_emissions_g_kWh")]
    pub co2_g_kwh: f64,
    #[serde(rename = "P_charge_kW")]
    pub p_charge_kw: f64,
    #[serde(rename = "P_discharge_kW")]
    pub p_discharge_kw: f64,
    #[serde(rename = "P_feed_in_kW")]
    pub p_feed_in_kw: f64,
    #[serde(rename = "P_purchase_kW")]
    pub p_purchase_kw: f64,
    #[serde(rename = "W_batt_kWh")]
    pub w_batt_kwh: f64,
    /// State of charge in percent.
    #[serde(rename = "SoC_%")]
    pub soc_pct: f64,
    #[serde(rename = "E_purchase_kWh")]
    pub e_purchase_kwh: f64,
    #[serde(rename = "E_feed_in_kWh")]
    pub e_feed_in_kwh: f64,
    #[serde(rename = "CO2_generated_g")]
    pub co2_generated_g: f64,
}

impl From<&ResultRow> for ResultRecord {
    fn from(r: &ResultRow) -> Self {
        Self {
            t: r.t,
            date_time: r.date_time,
            p_load_kw: r.p_load_kw,
            p_pv_kw: r.p_pv_kw,
            price_eur_kwh: r.price_eur_kwh,
            co2_g_kwh: r.co2_g_kwh,
            p_charge_kw: r.p_charge_kw,
            p_discharge_kw: r.p_discharge_kw,
            p_feed_in_kw: r.p_feed_in_kw,
            p_purchase_kw: r.p_purchase_kw,
            w_batt_kwh: r.w_batt_kwh,
            soc_pct: r.soc * 100.0,
            e_purchase_kwh: r.e_purchase_kwh,
            e_feed_in_kwh: r.e_feed_in_kwh,
            co2_generated_g: r.co2_generated_g,
        }
    }
}

mod date_time_format {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Optional range query parameters for the results endpoint.
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    /// First hour (inclusive).
    pub from: Option<usize>,
    /// Last hour (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
