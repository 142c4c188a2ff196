//! Property tests over arbitrary weeks and arbitrary identifiers.

mod common;

use proptest::collection::vec;
use proptest::prelude::*;

use pv_battery_sim::rules::{RuleError, RuleSet, Sandbox, Whitelist};
use pv_battery_sim::sim::{BalanceCheck, HORIZON, PostProcessed, RunContext, simulate};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reference_strategy_respects_battery_bounds(
        pv in vec(0.0f64..8.0, HORIZON),
        load in vec(0.0f64..4.0, HORIZON),
        capacity in 0.5f64..15.0,
    ) {
        let rules = RuleSet::reference().expect("built-in strategy");
        let run = simulate(common::inputs_with(pv, load, capacity), &rules).expect("run completes");
        let ctx = run.context();

        for t in 0..HORIZON {
            prop_assert!((0.0..=1.0).contains(&ctx.soc()[t]));
            prop_assert!((0.0..=capacity).contains(&ctx.w_batt()[t]));
        }
        prop_assert_eq!(PostProcessed::from_run(&run).balance_check(), BalanceCheck::Balanced);
    }

    #[test]
    fn names_outside_the_whitelist_never_execute(
        name in "[a-zA-Z_][a-zA-Z0-9_]{0,12}",
    ) {
        let whitelist = Whitelist::standard();
        prop_assume!(!whitelist.contains(&name));
        prop_assume!(!["and", "or", "not", "True", "False"].contains(&name.as_str()));

        let sandbox = Sandbox::new(whitelist);
        let mut ctx = RunContext::new(common::default_inputs());
        ctx.begin_step(12);
        let before = ctx.clone();

        let err = sandbox
            .exec_action(&format!("P_charge[t] = {name}"), &mut ctx)
            .expect_err("unknown name must be rejected");
        prop_assert!(
            matches!(err, RuleError::DisallowedIdentifier { ref names } if names == &[name.clone()]),
            "unexpected error: {}", err
        );
        prop_assert_eq!(ctx.p_charge(), before.p_charge());

        let err = sandbox
            .eval_condition(&format!("{name}[t] > 0"), &ctx)
            .expect_err("unknown series must be rejected");
        let is_disallowed = matches!(err, RuleError::DisallowedIdentifier { .. });
        prop_assert!(is_disallowed);
    }
}
