//! Command-line entry point.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;

use pv_battery_sim::cli::{Cli, Command, RunArgs, output_path};
use pv_battery_sim::io::{STRATEGY_FILE_NAME, export_csv, export_strategy};
use pv_battery_sim::rules::{RuleSet, RuleSetError};
use pv_battery_sim::runner::{Outcome, RunError, load_rules, run_with_rules};
use pv_battery_sim::tables::{build_presets_table, build_steps_table, build_variables_table};
use pv_battery_sim::telemetry::init_tracing;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => run(&args),
        Command::Check { path } => check(&path),
        Command::Variables => {
            println!("{}", build_variables_table());
            Ok(())
        }
        Command::Presets => {
            println!("{}", build_presets_table());
            Ok(())
        }
    }
}

/// Prints a rule set error with a caret under the offending position.
fn report_rule_error(path: &Path, text: &str, err: &RuleSetError) {
    eprintln!("{}: {err}", path.display());
    if let Some(snippet) = err.snippet(text) {
        eprintln!("{snippet}");
    }
}

fn check(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read \"{}\"", path.display()))?;
    match RuleSet::from_json(&text).and_then(|rules| rules.validate().map(|()| rules)) {
        Ok(rules) => {
            println!("{}: {} rules OK", path.display(), rules.len());
            Ok(())
        }
        Err(err) => {
            report_rule_error(path, &text, &err);
            bail!("\"{}\" is not a valid strategy", path.display())
        }
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let config = args.load_config()?;
    let rules = match load_rules(&config) {
        Ok(rules) => rules,
        Err(RunError::Strategy { path, source }) => {
            report_rule_error(&path, &fs::read_to_string(&path).unwrap_or_default(), &source);
            bail!("\"{}\" is not a valid strategy", path.display())
        }
        Err(err) => return Err(err.into()),
    };
    let outcome = run_with_rules(&config, &rules, config.strategy.label())?;

    if args.print_steps {
        println!("{}", build_steps_table(&outcome.rows));
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary())?);
    } else {
        print_summary(&outcome);
    }

    if let Some(path) = &args.results_out {
        let path = output_path(path, &outcome.file_name);
        export_csv(&outcome.rows, &path).with_context(|| format!("failed to write \"{}\"", path.display()))?;
        eprintln!("Results written to {}", path.display());
    }
    if let Some(path) = &args.strategy_out {
        let path = output_path(path, STRATEGY_FILE_NAME);
        export_strategy(&rules, &path).with_context(|| format!("failed to write \"{}\"", path.display()))?;
        eprintln!("Strategy written to {}", path.display());
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(pv_battery_sim::api::AppState::from_outcome(&outcome));
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
        rt.block_on(pv_battery_sim::api::serve(state, addr))
            .with_context(|| format!("API server on {addr} failed"))?;
    }

    Ok(())
}

fn print_summary(outcome: &Outcome) {
    let summary = outcome.summary();
    println!("Strategy: {}", summary.strategy);
    println!("{}", summary.balance_message);
    println!("\n{}", summary.kpi);
    if !summary.warnings.is_empty() {
        println!();
        for warning in &summary.warnings {
            println!("Warning: {warning}");
        }
    }
    println!("\nStatus: {}", summary.status);
}
