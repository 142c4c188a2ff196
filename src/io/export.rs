//! CSV export of the results table and JSON export of strategies.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::io::import::LoadMode;
use crate::rules::RuleSet;
use crate::sim::ResultRow;

/// Column header of the results table.
const HEADER: &str = "date_time,P_load_kW,P_pv_kW,electricity_price_customer_EUR_kWh,\
                      CO2_emissions_g_kWh,P_charge_kW,P_discharge_kW,P_feed_in_kW,\
                      P_purchase_kW,W_batt_kWh,SoC_%,E_purchase_kWh,E_feed_in_kWh,\
                      CO2_generated_g";

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exports the results table to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(rows: &[ResultRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(rows, buf)
}

/// Writes the results table as CSV to any writer.
///
/// Numbers carry two decimals; SoC is written in percent.
///
/// # Arguments
///
/// * `rows` - One row per simulated hour
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(rows: &[ResultRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in rows {
        wtr.write_record(&[
            r.date_time.format(DATE_TIME_FORMAT).to_string(),
            format!("{:.2}", r.p_load_kw),
            format!("{:.2}", r.p_pv_kw),
            format!("{:.2}", r.price_eur_kwh),
            format!("{:.2}", r.co2_g_kwh),
            format!("{:.2}", r.p_charge_kw),
            format!("{:.2}", r.p_discharge_kw),
            format!("{:.2}", r.p_feed_in_kw),
            format!("{:.2}", r.p_purchase_kw),
            format!("{:.2}", r.w_batt_kwh),
            format!("{:.2}", r.soc * 100.0),
            format!("{:.2}", r.e_purchase_kwh),
            format!("{:.2}", r.e_feed_in_kwh),
            format!("{:.2}", r.co2_generated_g),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes a rule set as a 4-space indented JSON array.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_strategy_json(rules: &RuleSet, mut writer: impl Write) -> io::Result<()> {
    writer.write_all(rules.to_json_pretty().as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Saves a rule set to `path` so it can be loaded again later.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_strategy(rules: &RuleSet, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_strategy_json(rules, io::BufWriter::new(file))
}

/// Default file name for a strategy download.
pub const STRATEGY_FILE_NAME: &str = "applied_os.json";

/// Default file name for a results table.
///
/// `{strategy}_results_{pv}kW_{batt}kWh_{profile}.csv`, with an
/// `_OL_{S|C}` suffix when an uploaded load profile was used. Spaces in the
/// strategy label become underscores.
pub fn results_file_name(
    strategy_label: &str,
    pv_kw: f64,
    batt_kwh: f64,
    profile_tag: &str,
    own_load: Option<LoadMode>,
) -> String {
    let strategy = strategy_label.trim().replace(' ', "_");
    let suffix = own_load.map(|mode| format!("_OL_{}", mode.tag())).unwrap_or_default();
    format!("{strategy}_results_{pv_kw}kW_{batt_kwh}kWh_{profile_tag}{suffix}.csv")
}
