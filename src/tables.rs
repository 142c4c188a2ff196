//! Terminal tables for the CLI.

use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::config::ScenarioConfig;
use crate::rules::{Function, Kind, Variable};
use crate::sim::ResultRow;

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table
}

/// Names a rule may use, with kind, access, unit and meaning.
pub fn build_variables_table() -> Table {
    let mut table = new_table();
    table.set_header(vec!["Name", "Kind", "Access", "Unit", "Description"]);
    for var in Variable::ALL {
        let (kind, usage) = match var.kind() {
            Kind::Series => ("series", format!("{}[t]", var.name())),
            Kind::Scalar => ("scalar", var.name().to_string()),
        };
        let access = if var.is_writable() {
            Cell::new("read/write").fg(Color::Green)
        } else {
            Cell::new("read").add_attribute(Attribute::Dim)
        };
        table.add_row(vec![
            Cell::new(usage),
            Cell::new(kind),
            access,
            Cell::new(var.unit()),
            Cell::new(var.description()),
        ]);
    }
    for func in Function::ALL {
        table.add_row(vec![
            Cell::new(format!("{}(a, b)", func.name())),
            Cell::new("function"),
            Cell::new("call").add_attribute(Attribute::Dim),
            Cell::new("-"),
            Cell::new(match func {
                Function::Min => "Smaller of two numbers",
                Function::Max => "Larger of two numbers",
            }),
        ]);
    }
    table
}

/// Built-in scenario presets.
pub fn build_presets_table() -> Table {
    let mut table = new_table();
    table.set_header(vec!["Preset", "Strategy", "PV", "Battery", "Feed-in tariff"]);
    for name in ScenarioConfig::PRESETS {
        let Ok(cfg) = ScenarioConfig::from_preset(name) else {
            continue;
        };
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(cfg.strategy.label()),
            Cell::new(format!("{} kW", cfg.pv.capacity_kw)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} kWh", cfg.battery.capacity_kwh)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2} EUR/kWh", cfg.tariff.feed_in_eur_kwh)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Hour-by-hour results, one row per step.
pub fn build_steps_table(rows: &[ResultRow]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Time", "PV", "Load", "Charge", "Discharge", "Feed-in", "Purchase", "Battery", "SoC",
    ]);
    let kw = |v: f64| Cell::new(format!("{v:.2}")).set_alignment(CellAlignment::Right);
    let flow = |v: f64, color: Color| if v > 0.0 { kw(v).fg(color) } else { kw(v).add_attribute(Attribute::Dim) };
    for r in rows {
        table.add_row(vec![
            Cell::new(r.date_time.format("%a %H:%M")),
            kw(r.p_pv_kw),
            kw(r.p_load_kw),
            flow(r.p_charge_kw, Color::Green),
            flow(r.p_discharge_kw, Color::DarkYellow),
            flow(r.p_feed_in_kw, Color::Cyan),
            flow(r.p_purchase_kw, Color::Red),
            kw(r.w_batt_kwh),
            Cell::new(format!("{:.1}%", r.soc * 100.0)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
