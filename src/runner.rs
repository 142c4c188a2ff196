//! Scenario execution: assemble inputs from a configuration, run the
//! strategy and post-process the result.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, ScenarioConfig};
use crate::io::{ImportError, SeriesKind, apply_uploaded_load, import_series, results_file_name};
use crate::profiles::{co2_intensity_g_kwh, customer_price, wholesale_price_eur_kwh};
use crate::rules::{RuleSet, RuleSetError};
use crate::sim::{
    BalanceCheck, InputError, KpiReport, PostProcessed, ResultRow, RunStatus, SimError, SimInputs, SimRun, simulate,
};

/// Seed offsets keep the generated series uncorrelated.
const LOAD_SEED_OFFSET: u64 = 1;
const PRICE_SEED_OFFSET: u64 = 2;
const CO2_SEED_OFFSET: u64 = 3;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid scenario: {}", join_errors(.0))]
    Config(Vec<ConfigError>),

    #[error("cannot read strategy \"{}\": {source}", .path.display())]
    StrategyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid strategy \"{}\": {source}", .path.display())]
    Strategy { path: PathBuf, source: RuleSetError },

    #[error("built-in strategy is broken: {0}")]
    Builtin(RuleSetError),

    #[error("cannot import \"{}\": {source}", .path.display())]
    Import { path: PathBuf, source: ImportError },

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Sim(#[from] SimError),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Everything a completed scenario produces.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Strategy label, e.g. `Reference` or `Custom`.
    pub label: String,
    pub run: SimRun,
    pub post: PostProcessed,
    pub kpi: KpiReport,
    pub balance: BalanceCheck,
    pub rows: Vec<ResultRow>,
    /// Suggested name for the exported results table.
    pub file_name: String,
}

/// Headline figures of a run, as printed by the CLI and served by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub strategy: String,
    pub status: RunStatus,
    pub balance: BalanceCheck,
    pub balance_message: String,
    pub kpi: KpiReport,
    /// One line per violated invariant class.
    pub warnings: Vec<String>,
}

impl Outcome {
    pub fn summary(&self) -> Summary {
        Summary {
            strategy: self.label.clone(),
            status: self.run.status(),
            balance: self.balance,
            balance_message: self.balance.to_string(),
            kpi: self.kpi.clone(),
            warnings: self.run.invariants().warnings(),
        }
    }
}

/// Loads the scenario's rule set from its file or the built-in strategy.
///
/// # Errors
///
/// Returns a `RunError` if the file cannot be read or is not a valid rule set.
pub fn load_rules(config: &ScenarioConfig) -> Result<RuleSet, RunError> {
    match &config.strategy.file {
        Some(path) => read_rule_file(path),
        None => config.strategy.builtin.rule_set().map_err(RunError::Builtin),
    }
}

/// Reads and validates a rule set JSON file.
///
/// # Errors
///
/// Returns a `RunError` if the file cannot be read or fails validation.
pub fn read_rule_file(path: &Path) -> Result<RuleSet, RunError> {
    let text = fs::read_to_string(path).map_err(|source| RunError::StrategyFile {
        path: path.to_path_buf(),
        source,
    })?;
    let rules = RuleSet::from_json(&text).and_then(|rules| rules.validate().map(|()| rules));
    rules.map_err(|source| RunError::Strategy {
        path: path.to_path_buf(),
        source,
    })
}

fn import(path: &Path, kind: SeriesKind, separator: char) -> Result<crate::io::ImportedSeries, RunError> {
    debug!(path = %path.display(), column = kind.column(), "importing series");
    import_series(path, kind, separator).map_err(|source| RunError::Import {
        path: path.to_path_buf(),
        source,
    })
}

/// Assembles the hourly input series: uploaded where configured, generated
/// otherwise.
///
/// # Errors
///
/// Returns a `RunError` if the configuration is invalid or an upload fails
/// validation.
pub fn build_inputs(config: &ScenarioConfig) -> Result<SimInputs, RunError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(RunError::Config(errors));
    }
    let start = config.start_time().map_err(|e| RunError::Config(vec![e]))?;
    let seed = config.simulation.seed;
    let sep = config.inputs.separator;

    let (timestamps, pv_kw) = match &config.inputs.pv_cf {
        Some(path) => {
            let series = import(path, SeriesKind::PvCapacityFactor, sep)?;
            let pv_kw = series.values.iter().map(|cf| cf * config.pv.capacity_kw).collect();
            (series.timestamps, pv_kw)
        }
        None => (
            SimInputs::hourly_timestamps(start),
            config.pv.solar_profile(seed).generation_kw(config.pv.capacity_kw),
        ),
    };

    let default_load = config.load.household(seed.wrapping_add(LOAD_SEED_OFFSET)).demand_kw();
    let load_kw = match &config.load.upload {
        Some(path) => {
            let uploaded = import(path, SeriesKind::Load, sep)?;
            apply_uploaded_load(&default_load, &uploaded.values, config.load.unit, config.load.mode)
        }
        None => default_load,
    };

    let wholesale = match &config.inputs.electricity_price {
        Some(path) => import(path, SeriesKind::ElectricityPrice, sep)?.values,
        None => wholesale_price_eur_kwh(seed.wrapping_add(PRICE_SEED_OFFSET)),
    };
    let price = customer_price(&wholesale, &config.tariff.additional_costs);

    let co2 = match &config.inputs.co2_emissions {
        Some(path) => import(path, SeriesKind::Co2Emissions, sep)?.values,
        None => co2_intensity_g_kwh(seed.wrapping_add(CO2_SEED_OFFSET)),
    };

    Ok(SimInputs::new(
        timestamps,
        pv_kw,
        load_kw,
        price,
        co2,
        config.tariff.feed_in_eur_kwh,
        config.battery.capacity_kwh,
    )?)
}

/// Runs `rules` against the scenario's inputs and post-processes the result.
///
/// # Errors
///
/// Returns a `RunError` if the inputs cannot be assembled or a rule fails.
pub fn run_with_rules(config: &ScenarioConfig, rules: &RuleSet, label: &str) -> Result<Outcome, RunError> {
    let inputs = build_inputs(config)?;
    info!(
        strategy = label,
        rules = rules.len(),
        pv_kw = config.pv.capacity_kw,
        battery_kwh = config.battery.capacity_kwh,
        "running scenario"
    );
    let run = simulate(inputs, rules)?;
    let post = PostProcessed::from_run(&run);
    let kpi = KpiReport::from_run(&run, &post);
    let balance = post.balance_check();
    let rows = post.rows(&run);
    let own_load = config.load.upload.as_ref().map(|_| config.load.mode);
    let file_name = results_file_name(
        label,
        config.pv.capacity_kw,
        config.battery.capacity_kwh,
        config.load.profile.tag(),
        own_load,
    );

    Ok(Outcome {
        label: label.to_string(),
        run,
        post,
        kpi,
        balance,
        rows,
        file_name,
    })
}

/// Runs the scenario with its configured strategy.
///
/// # Errors
///
/// See [`load_rules`] and [`run_with_rules`].
pub fn run_scenario(config: &ScenarioConfig) -> Result<Outcome, RunError> {
    let rules = load_rules(config)?;
    run_with_rules(config, &rules, config.strategy.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::write_csv;
    use crate::rules::Rule;

    #[test]
    fn same_scenario_and_seed_is_deterministic() {
        let cfg = ScenarioConfig::reference();
        let run_a = run_scenario(&cfg).expect("first run");
        let run_b = run_scenario(&cfg).expect("second run");

        let mut out_a = Vec::new();
        write_csv(&run_a.rows, &mut out_a).expect("first export should succeed");
        let mut out_b = Vec::new();
        write_csv(&run_b.rows, &mut out_b).expect("second export should succeed");

        assert_eq!(out_a, out_b);
    }

    #[test]
    fn reference_scenario_balances_and_stays_valid() {
        let outcome = run_scenario(&ScenarioConfig::reference()).expect("reference run");
        assert!(outcome.balance.is_balanced(), "{}", outcome.balance);
        assert_eq!(outcome.run.status(), RunStatus::Valid);
        assert_eq!(outcome.rows.len(), 168);
        assert_eq!(outcome.file_name, "Reference_results_6kW_6kWh_P1.csv");

        let summary = outcome.summary();
        assert_eq!(summary.strategy, "Reference");
        assert!(summary.warnings.is_empty());
        assert_eq!(summary.balance_message, "Energy balance check passed: All values are 0");
    }

    #[test]
    fn generated_pv_follows_solar_profile_and_capacity() {
        let mut cfg = ScenarioConfig::reference();
        cfg.pv.capacity_kw = 7.5;
        let inputs = build_inputs(&cfg).expect("reference inputs");
        let expected = cfg.pv.solar_profile(cfg.simulation.seed).generation_kw(7.5);
        assert_eq!(inputs.pv_kw(), expected.as_slice());
        assert!(inputs.pv_kw().iter().any(|&kw| kw > 0.0));
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let mut cfg = ScenarioConfig::reference();
        cfg.battery.capacity_kwh = -1.0;
        let err = run_scenario(&cfg).expect_err("negative capacity");
        assert!(matches!(err, RunError::Config(ref e) if e[0].field == "battery.capacity_kwh"));
    }

    #[test]
    fn failing_rule_surfaces_as_sim_error() {
        let rules = RuleSet::new(vec![Rule::new("P_pv[t - 1] > 0", "P_feed_in[t] = P_pv[t]")]);
        let err = run_with_rules(&ScenarioConfig::reference(), &rules, "Custom").expect_err("t-1 at t=0");
        assert!(matches!(err, RunError::Sim(SimError::Rule { t: 0, .. })));
    }

    #[test]
    fn missing_strategy_file_is_reported() {
        let err = read_rule_file(Path::new("/nonexistent/strategy.json")).expect_err("missing file");
        assert!(err.to_string().starts_with("cannot read strategy"));
    }
}
