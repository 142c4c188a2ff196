//! Per-run variable environment shared by all rule evaluations.

use crate::rules::{Scope, ScopeMut, Variable};

use super::invariants::StepSnapshot;
use super::types::{HORIZON, SimInputs};

/// Owns every series of one simulation run.
///
/// Control series start at zero. Battery state at `t` keeps its zero
/// default until [`RunContext::update_battery`] runs for that step, so
/// rules reading `W_batt[t]` or `SoC[t]` see 0.
#[derive(Debug, Clone)]
pub struct RunContext {
    inputs: SimInputs,
    t: usize,
    p_charge: Vec<f64>,
    p_discharge: Vec<f64>,
    p_purchase: Vec<f64>,
    p_feed_in: Vec<f64>,
    w_batt: Vec<f64>,
    soc: Vec<f64>,
    active_rule: Option<usize>,
    writers: Writers,
}

/// Last rule that wrote each control series at the current step.
#[derive(Debug, Clone, Copy, Default)]
struct Writers {
    charge: Option<usize>,
    discharge: Option<usize>,
    purchase: Option<usize>,
    feed_in: Option<usize>,
}

impl RunContext {
    pub fn new(inputs: SimInputs) -> Self {
        Self {
            inputs,
            t: 0,
            p_charge: vec![0.0; HORIZON],
            p_discharge: vec![0.0; HORIZON],
            p_purchase: vec![0.0; HORIZON],
            p_feed_in: vec![0.0; HORIZON],
            w_batt: vec![0.0; HORIZON],
            soc: vec![0.0; HORIZON],
            active_rule: None,
            writers: Writers::default(),
        }
    }

    /// Moves the environment to step `t` and forgets the previous step's writers.
    pub fn begin_step(&mut self, t: usize) {
        self.t = t;
        self.active_rule = None;
        self.writers = Writers::default();
    }

    /// Attributes subsequent writes to `rule` (0-based).
    pub fn set_active_rule(&mut self, rule: Option<usize>) {
        self.active_rule = rule;
    }

    /// SoC the battery had when the current step started.
    pub fn soc_before(&self) -> f64 {
        match self.t {
            0 => 0.0,
            t => self.soc[t - 1],
        }
    }

    fn w_batt_before(&self) -> f64 {
        match self.t {
            0 => 0.0,
            t => self.w_batt[t - 1],
        }
    }

    /// Applies the step's charge and discharge to the battery, clamped to
    /// `[0, W_batt_max]`. Returns the new energy level and SoC.
    pub fn update_battery(&mut self) -> (f64, f64) {
        let t = self.t;
        let w_max = self.inputs.w_batt_max_kwh();
        let w = (self.w_batt_before() + self.p_charge[t] - self.p_discharge[t]).clamp(0.0, w_max);
        self.w_batt[t] = w;
        self.soc[t] = w / w_max;
        (w, self.soc[t])
    }

    /// Current step as seen by the invariant checker.
    pub fn snapshot(&self) -> StepSnapshot {
        let t = self.t;
        StepSnapshot {
            t,
            p_pv: self.inputs.pv_kw()[t],
            p_charge: self.p_charge[t],
            p_discharge: self.p_discharge[t],
            p_feed_in: self.p_feed_in[t],
            soc_before: self.soc_before(),
            charge_writer: self.writers.charge,
            discharge_writer: self.writers.discharge,
            feed_in_writer: self.writers.feed_in,
        }
    }

    /// Rule that last wrote `var` during the current step.
    pub fn writer(&self, var: Variable) -> Option<usize> {
        match var {
            Variable::Charge => self.writers.charge,
            Variable::Discharge => self.writers.discharge,
            Variable::Purchase => self.writers.purchase,
            Variable::FeedIn => self.writers.feed_in,
            _ => None,
        }
    }

    pub fn inputs(&self) -> &SimInputs {
        &self.inputs
    }

    pub fn p_charge(&self) -> &[f64] {
        &self.p_charge
    }

    pub fn p_discharge(&self) -> &[f64] {
        &self.p_discharge
    }

    pub fn p_purchase(&self) -> &[f64] {
        &self.p_purchase
    }

    pub fn p_feed_in(&self) -> &[f64] {
        &self.p_feed_in
    }

    pub fn w_batt(&self) -> &[f64] {
        &self.w_batt
    }

    pub fn soc(&self) -> &[f64] {
        &self.soc
    }
}

impl Scope for RunContext {
    fn step(&self) -> usize {
        self.t
    }

    fn scalar(&self, var: Variable) -> f64 {
        match var {
            Variable::WBattMax => self.inputs.w_batt_max_kwh(),
            Variable::FeedInTariff => self.inputs.feed_in_tariff(),
            Variable::Step => self.t as f64,
            _ => f64::NAN,
        }
    }

    fn series(&self, var: Variable) -> &[f64] {
        match var {
            Variable::Pv => self.inputs.pv_kw(),
            Variable::Load => self.inputs.load_kw(),
            Variable::ElectricityPrice => self.inputs.price_eur_kwh(),
            Variable::Co2Emissions => self.inputs.co2_g_kwh(),
            Variable::Charge => &self.p_charge,
            Variable::Discharge => &self.p_discharge,
            Variable::Purchase => &self.p_purchase,
            Variable::FeedIn => &self.p_feed_in,
            Variable::WBatt => &self.w_batt,
            Variable::Soc => &self.soc,
            Variable::WBattMax | Variable::FeedInTariff | Variable::Step => &[],
        }
    }
}

impl ScopeMut for RunContext {
    fn assign(&mut self, var: Variable, value: f64) {
        let t = self.t;
        let rule = self.active_rule;
        let (series, writer) = match var {
            Variable::Charge => (&mut self.p_charge, &mut self.writers.charge),
            Variable::Discharge => (&mut self.p_discharge, &mut self.writers.discharge),
            Variable::Purchase => (&mut self.p_purchase, &mut self.writers.purchase),
            Variable::FeedIn => (&mut self.p_feed_in, &mut self.writers.feed_in),
            _ => return,
        };
        series[t] = value;
        *writer = rule;
    }
}
