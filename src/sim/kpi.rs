//! Post-hoc energy, cost and emission figures derived from a completed run.

use std::fmt;

use serde::Serialize;

use super::engine::SimRun;
use super::power_balance::{BalanceCheck, net_balance_kw};
use super::types::{DT_HOURS, ResultRow};

/// Per-step derived series. Pure function of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessed {
    pub net_energy_balance: Vec<f64>,
    pub e_purchase_kwh: Vec<f64>,
    pub e_feed_in_kwh: Vec<f64>,
    /// Cost of purchased energy (EUR, positive).
    pub c_purchase_eur: Vec<f64>,
    /// Compensation for fed-in energy (EUR, negative).
    pub c_feed_in_eur: Vec<f64>,
    pub co2_generated_g: Vec<f64>,
}

impl PostProcessed {
    pub fn from_run(run: &SimRun) -> Self {
        let ctx = run.context();
        let inputs = run.inputs();
        let tariff = inputs.feed_in_tariff();

        let net_energy_balance = (0..inputs.pv_kw().len())
            .map(|t| {
                net_balance_kw(
                    inputs.load_kw()[t],
                    inputs.pv_kw()[t],
                    ctx.p_charge()[t],
                    ctx.p_discharge()[t],
                    ctx.p_feed_in()[t],
                    ctx.p_purchase()[t],
                )
            })
            .collect();
        let e_purchase_kwh: Vec<f64> = ctx.p_purchase().iter().map(|p| p * DT_HOURS).collect();
        let e_feed_in_kwh: Vec<f64> = ctx.p_feed_in().iter().map(|p| p * DT_HOURS).collect();
        let c_purchase_eur = e_purchase_kwh
            .iter()
            .zip(inputs.price_eur_kwh())
            .map(|(e, price)| e * price)
            .collect();
        let c_feed_in_eur = e_feed_in_kwh.iter().map(|e| -e * tariff).collect();
        let co2_generated_g = e_purchase_kwh
            .iter()
            .zip(inputs.co2_g_kwh())
            .map(|(e, co2)| e * co2)
            .collect();

        Self {
            net_energy_balance,
            e_purchase_kwh,
            e_feed_in_kwh,
            c_purchase_eur,
            c_feed_in_eur,
            co2_generated_g,
        }
    }

    pub fn balance_check(&self) -> BalanceCheck {
        BalanceCheck::from_series(&self.net_energy_balance)
    }

    /// Flattens the run and the derived series into table rows.
    pub fn rows(&self, run: &SimRun) -> Vec<ResultRow> {
        let ctx = run.context();
        let inputs = run.inputs();
        inputs
            .timestamps()
            .iter()
            .enumerate()
            .map(|(t, &date_time)| ResultRow {
                t,
                date_time,
                p_load_kw: inputs.load_kw()[t],
                p_pv_kw: inputs.pv_kw()[t],
                price_eur_kwh: inputs.price_eur_kwh()[t],
                co2_g_kwh: inputs.co2_g_kwh()[t],
                p_charge_kw: ctx.p_charge()[t],
                p_discharge_kw: ctx.p_discharge()[t],
                p_feed_in_kw: ctx.p_feed_in()[t],
                p_purchase_kw: ctx.p_purchase()[t],
                w_batt_kwh: ctx.w_batt()[t],
                soc: ctx.soc()[t],
                e_purchase_kwh: self.e_purchase_kwh[t],
                e_feed_in_kwh: self.e_feed_in_kwh[t],
                co2_generated_g: self.co2_generated_g[t],
            })
            .collect()
    }
}

/// Aggregate figures over the whole horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    /// Total cost of purchased electricity (EUR).
    pub purchase_cost_eur: f64,
    /// Total feed-in compensation (EUR, positive).
    pub feed_in_revenue_eur: f64,
    /// Purchase cost minus feed-in compensation (EUR).
    pub total_cost_eur: f64,
    /// Total CO2 emitted by purchased electricity (g).
    pub co2_total_g: f64,
    pub e_purchase_kwh: f64,
    pub e_feed_in_kwh: f64,
    pub pv_energy_kwh: f64,
    pub load_energy_kwh: f64,
    /// Share of PV energy used on site (%). `None` without PV generation.
    pub self_consumption_pct: Option<f64>,
    /// Share of demand covered by PV (%). `None` without demand.
    pub self_sufficiency_pct: Option<f64>,
}

impl KpiReport {
    /// Computes all KPIs from a run and its derived series.
    ///
    /// # Arguments
    ///
    /// * `run` - Completed simulation run
    /// * `post` - Series derived from the same run
    pub fn from_run(run: &SimRun, post: &PostProcessed) -> Self {
        let inputs = run.inputs();
        let pv: f64 = inputs.pv_kw().iter().sum::<f64>() * DT_HOURS;
        let load: f64 = inputs.load_kw().iter().sum::<f64>() * DT_HOURS;
        let e_purchase: f64 = post.e_purchase_kwh.iter().sum();
        let e_feed_in: f64 = post.e_feed_in_kwh.iter().sum();
        let purchase_cost: f64 = post.c_purchase_eur.iter().sum();
        let feed_in_cost: f64 = post.c_feed_in_eur.iter().sum();

        let used_on_site = pv - e_feed_in;
        let pct = |denominator: f64| (denominator > 0.0).then(|| used_on_site / denominator * 100.0);

        Self {
            purchase_cost_eur: purchase_cost,
            feed_in_revenue_eur: -feed_in_cost,
            total_cost_eur: purchase_cost + feed_in_cost,
            co2_total_g: post.co2_generated_g.iter().sum(),
            e_purchase_kwh: e_purchase,
            e_feed_in_kwh: e_feed_in,
            pv_energy_kwh: pv,
            load_energy_kwh: load,
            self_consumption_pct: pct(pv),
            self_sufficiency_pct: pct(load),
        }
    }
}

fn pct_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}%"))
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Purchase cost:         {:.2} EUR", self.purchase_cost_eur)?;
        writeln!(f, "Feed-in revenue:       {:.2} EUR", self.feed_in_revenue_eur)?;
        writeln!(f, "Total cost:            {:.2} EUR", self.total_cost_eur)?;
        writeln!(f, "CO2 emissions:         {:.2} gCO2", self.co2_total_g)?;
        writeln!(
            f,
            "Grid energy:           {:.2} kWh purchased, {:.2} kWh fed in",
            self.e_purchase_kwh, self.e_feed_in_kwh
        )?;
        writeln!(
            f,
            "PV / load energy:      {:.2} kWh / {:.2} kWh",
            self.pv_energy_kwh, self.load_energy_kwh
        )?;
        writeln!(f, "Self-consumption:      {}", pct_or_na(self.self_consumption_pct))?;
        write!(f, "Self-sufficiency:      {}", pct_or_na(self.self_sufficiency_pct))
    }
}
