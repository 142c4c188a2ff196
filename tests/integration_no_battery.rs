//! The no-battery strategy leaves the battery untouched.

mod common;

use approx::assert_relative_eq;

use pv_battery_sim::rules::RuleSet;
use pv_battery_sim::sim::{BalanceCheck, KpiReport, PostProcessed, simulate};

#[test]
fn battery_series_stay_zero() {
    let run = simulate(common::default_inputs(), &RuleSet::no_battery().expect("built-in"))
        .expect("run completes");
    let ctx = run.context();

    assert!(ctx.p_charge().iter().all(|&p| p == 0.0));
    assert!(ctx.p_discharge().iter().all(|&p| p == 0.0));
    assert!(ctx.w_batt().iter().all(|&w| w == 0.0));
    assert!(ctx.soc().iter().all(|&s| s == 0.0));
    assert!(run.invariants().is_clean());
}

#[test]
fn grid_covers_every_deficit_and_takes_every_surplus() {
    let pv = common::sunny_pv_kw();
    let load = common::evening_peak_load_kw();
    let run = simulate(
        common::inputs_with(pv.clone(), load.clone(), 6.0),
        &RuleSet::no_battery().expect("built-in"),
    )
    .expect("run completes");
    let post = PostProcessed::from_run(&run);
    let kpi = KpiReport::from_run(&run, &post);

    assert_eq!(post.balance_check(), BalanceCheck::Balanced);
    let bought: f64 = pv.iter().zip(&load).map(|(p, l)| (l - p).max(0.0)).sum();
    let sold: f64 = pv.iter().zip(&load).map(|(p, l)| (p - l).max(0.0)).sum();
    assert_relative_eq!(kpi.e_purchase_kwh, bought, epsilon = 1e-9);
    assert_relative_eq!(kpi.e_feed_in_kwh, sold, epsilon = 1e-9);
    assert_relative_eq!(kpi.purchase_cost_eur, bought * 0.30, epsilon = 1e-9);
    assert_relative_eq!(kpi.feed_in_revenue_eur, sold * 0.08, epsilon = 1e-9);
    assert_relative_eq!(kpi.co2_total_g, bought * 400.0, epsilon = 1e-6);
}

#[test]
fn dark_week_has_no_self_consumption_figure() {
    let run = simulate(
        common::inputs_with(vec![0.0; 168], common::evening_peak_load_kw(), 6.0),
        &RuleSet::no_battery().expect("built-in"),
    )
    .expect("run completes");
    let post = PostProcessed::from_run(&run);
    let kpi = KpiReport::from_run(&run, &post);

    assert_eq!(kpi.self_consumption_pct, None);
    assert_eq!(kpi.self_sufficiency_pct, Some(0.0));
    assert!(kpi.to_string().contains("Self-consumption:      n/a"));
}
