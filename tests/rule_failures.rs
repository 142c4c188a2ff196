//! Rule sets that must be rejected or abort the run.

mod common;

use pv_battery_sim::rules::{Rule, RuleError, RulePart, RuleSet, RuleSetError};
use pv_battery_sim::sim::{Engine, SimError, simulate};

fn single(condition: &str, action: &str) -> RuleSet {
    RuleSet::new(vec![Rule::new(condition, action)])
}

#[test]
fn previous_hour_at_first_step_is_an_index_error() {
    let rules = single("True", "P_charge[t] = P_pv[t - 1]");
    let err = simulate(common::default_inputs(), &rules).expect_err("t-1 at t=0");
    assert_eq!(
        err,
        SimError::Rule {
            rule: 0,
            part: RulePart::Action,
            t: 0,
            source: RuleError::Index {
                name: "P_pv".into(),
                index: -1,
                max: 167,
            },
        }
    );
    assert_eq!(
        err.to_string(),
        "rule 1 action failed at t=0: index error: index -1 is out of range for `P_pv` (valid indices are 0..=167)"
    );
}

#[test]
fn next_hour_at_last_step_is_an_index_error() {
    let rules = single("P_pv[t + 1] >= 0", "P_purchase[t] = P_load[t]");
    let err = simulate(common::default_inputs(), &rules).expect_err("t+1 at t=167");
    assert!(matches!(
        err,
        SimError::Rule {
            part: RulePart::Condition,
            t: 167,
            source: RuleError::Index { index: 168, .. },
            ..
        }
    ));
}

#[test]
fn disallowed_names_reject_the_whole_rule_set() {
    let rules = RuleSet::new(vec![
        Rule::new("True", "P_purchase[t] = P_load[t]"),
        Rule::new("__import__(os) > 0", "P_feed_in[t] = 0"),
    ]);
    let err = Engine::new(common::default_inputs(), &rules).err().expect("rejected at compile time");
    let SimError::Rules(RuleSetError::Invalid { rule, part, source, .. }) = err else {
        panic!("expected an invalid rule set");
    };
    assert_eq!((rule, part), (1, RulePart::Condition));
    assert!(matches!(source, RuleError::Syntax { .. } | RuleError::DisallowedIdentifier { .. }));
}

#[test]
fn unknown_variable_is_disallowed() {
    let err = single("P_grid[t] > 0", "P_purchase[t] = 1").validate().expect_err("unknown name");
    assert!(matches!(
        err,
        RuleSetError::Invalid {
            source: RuleError::DisallowedIdentifier { ref names },
            ..
        } if names == &["P_grid".to_string()]
    ));
}

#[test]
fn writing_inputs_is_rejected() {
    let err = single("True", "P_pv[t] = 0").validate().expect_err("read-only target");
    assert!(matches!(
        err,
        RuleSetError::Invalid {
            part: RulePart::Action,
            source: RuleError::ReadOnlyTarget(_),
            ..
        }
    ));
}

#[test]
fn writing_another_hour_aborts_the_run() {
    let rules = single("t > 0", "P_purchase[t - 1] = 1");
    let err = simulate(common::default_inputs(), &rules).expect_err("write outside the step");
    assert!(matches!(
        err,
        SimError::Rule {
            t: 1,
            source: RuleError::WriteOutsideStep { index: 0, t: 1, .. },
            ..
        }
    ));
}

#[test]
fn division_by_zero_aborts_the_run() {
    let rules = single("True", "P_purchase[t] = P_load[t] / P_pv[t]");
    let err = simulate(common::default_inputs(), &rules).expect_err("pv is 0 at midnight");
    assert!(matches!(
        err,
        SimError::Rule {
            t: 0,
            source: RuleError::DivisionByZero,
            ..
        }
    ));
}

#[test]
fn invariant_violations_do_not_abort() {
    // feeds in twice the PV output and charges a full battery
    let rules = RuleSet::new(vec![
        Rule::new("True", "P_feed_in[t] = 2 * P_pv[t]"),
        Rule::new("P_pv[t] > 0", "P_charge[t] = W_batt_max"),
    ]);
    let run = simulate(common::default_inputs(), &rules).expect("violations are warnings");
    assert!(!run.invariants().is_clean());
    let warnings = run.invariants().warnings();
    assert!(warnings.iter().any(|w| w.contains("Offending rule(s): 1")));
    assert_eq!(run.status().to_string(), "results may be invalid");
}
