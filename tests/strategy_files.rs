//! Strategy files: load, save, reload.

use std::fs;
use std::path::PathBuf;

use pv_battery_sim::io::{STRATEGY_FILE_NAME, export_strategy};
use pv_battery_sim::rules::{Builtin, Rule, RuleSet, RuleSetError};
use pv_battery_sim::runner::{RunError, read_rule_file};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pv-battery-sim-{}-{name}", std::process::id()))
}

#[test]
fn shipped_strategy_files_match_builtins() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("strategies");
    for builtin in Builtin::ALL {
        let from_file = read_rule_file(&dir.join(format!("{}.json", builtin.name()))).expect("shipped file is valid");
        assert_eq!(Ok(from_file), builtin.rule_set());
    }
}

#[test]
fn saved_strategy_reloads_unchanged() {
    let mut rules = RuleSet::reference().expect("built-in");
    rules.push(Rule::new("t >= 160 and SoC[t - 1] > 0.5", "P_discharge[t] = 0.5; P_feed_in[t] = P_pv[t]"));

    let path = temp_path(STRATEGY_FILE_NAME);
    export_strategy(&rules, &path).expect("export");
    let text = fs::read_to_string(&path).expect("read back");
    let reloaded = read_rule_file(&path).expect("reload");
    fs::remove_file(&path).ok();

    assert_eq!(reloaded, rules);
    assert!(text.contains("\n        \"condition\": \"t >= 160 and SoC[t - 1] > 0.5\""));
}

#[test]
fn broken_json_points_at_the_error() {
    let path = temp_path("broken.json");
    let text = "[\n    {\"condition\": \"True\", \"action\": \"P_purchase[t] = 1\",}\n]\n";
    fs::write(&path, text).expect("write");
    let err = read_rule_file(&path).expect_err("trailing comma");
    fs::remove_file(&path).ok();

    let RunError::Strategy { source, .. } = err else {
        panic!("expected a strategy error");
    };
    assert!(matches!(source, RuleSetError::Json { line: 2, .. }));
    let snippet = source.snippet(text).expect("position inside the text");
    assert!(snippet.starts_with("    {\"condition\""));
    assert!(snippet.ends_with('^'));
}

#[test]
fn unknown_rule_keys_are_rejected() {
    let err = RuleSet::from_json(r#"[{"condition": "True", "action": "P_purchase[t] = 1", "note": "x"}]"#)
        .expect_err("unknown key");
    assert!(matches!(err, RuleSetError::Json { .. }));
}

#[test]
fn invalid_fragment_reports_rule_and_caret() {
    let json = r#"[{"condition": "True", "action": "P_purchase[t] = 1"}, {"condition": "P_pv[t] >> 1", "action": "P_feed_in[t] = 1"}]"#;
    let err = RuleSet::from_json(json).and_then(|r| r.validate()).expect_err("bad operator");
    assert!(err.to_string().starts_with("rule 2 condition: syntax error at line 1, column"));
    let snippet = err.snippet(json).expect("fragment snippet");
    assert!(snippet.starts_with("P_pv[t] >> 1\n"));
}
