//! Rule sets: the JSON wire format, validation and the built-in strategies.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::{RuleError, caret_snippet};
use super::sandbox::{Action, Condition};

const REFERENCE_JSON: &str = include_str!("../../strategies/reference.json");
const NO_BATTERY_JSON: &str = include_str!("../../strategies/no_battery.json");

/// One `{condition, action}` pair as written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub condition: String,
    pub action: String,
}

impl Rule {
    pub fn new(condition: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            action: action.into(),
        }
    }

    pub fn part(&self, part: RulePart) -> &str {
        match part {
            RulePart::Condition => &self.condition,
            RulePart::Action => &self.action,
        }
    }
}

/// Which half of a rule an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePart {
    Condition,
    Action,
}

impl fmt::Display for RulePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Condition => "condition",
            Self::Action => "action",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleSetError {
    #[error("invalid rule set JSON at line {line}, column {column}: {message}")]
    Json {
        line: usize,
        column: usize,
        message: String,
    },

    /// `rule` is the 0-based position in the set; messages count from 1.
    #[error("rule {} {part}: {source}", .rule + 1)]
    Invalid {
        rule: usize,
        part: RulePart,
        fragment: String,
        source: RuleError,
    },
}

impl RuleSetError {
    /// Line and column of the error inside the JSON text or the fragment.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            Self::Json { line, column, .. } => Some((*line, *column)),
            Self::Invalid { source, .. } => source.location(),
        }
    }

    /// Renders the offending line with a caret under the error position.
    ///
    /// `json` is the text passed to [`RuleSet::from_json`]; it is only
    /// consulted for JSON errors; fragment errors point into the fragment.
    pub fn snippet(&self, json: &str) -> Option<String> {
        let (line, column) = self.location()?;
        match self {
            Self::Json { .. } => caret_snippet(json, line, column),
            Self::Invalid { fragment, .. } => caret_snippet(fragment, line, column),
        }
    }
}

impl From<serde_json::Error> for RuleSetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// Ordered list of rules. Order matters: every rule whose condition holds
/// fires, first to last, within one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parses the JSON wire format: an array of `{"condition", "action"}` objects.
    ///
    /// # Errors
    ///
    /// [`RuleSetError::Json`] with the line and column of the first error.
    /// Fragments are not checked; see [`RuleSet::validate`].
    pub fn from_json(text: &str) -> Result<Self, RuleSetError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes with a 4-space indent.
    pub fn to_json_pretty(&self) -> String {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        // A list of string pairs always serializes.
        if self.serialize(&mut ser).is_err() {
            return String::from("[]");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Checks every fragment without keeping the compiled form.
    ///
    /// # Errors
    ///
    /// The first failing fragment, conditions before actions within a rule.
    pub fn validate(&self) -> Result<(), RuleSetError> {
        self.compile().map(|_| ())
    }

    /// Compiles every rule in order.
    ///
    /// # Errors
    ///
    /// [`RuleSetError::Invalid`] for the first fragment that fails.
    pub fn compile(&self) -> Result<CompiledRuleSet, RuleSetError> {
        let rules = self
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let invalid = |part: RulePart| {
                    move |source: RuleError| RuleSetError::Invalid {
                        rule: i,
                        part,
                        fragment: rule.part(part).to_owned(),
                        source,
                    }
                };
                Ok::<_, RuleSetError>(CompiledRule {
                    condition: Condition::compile(&rule.condition)
                        .map_err(invalid(RulePart::Condition))?,
                    action: Action::compile(&rule.action).map_err(invalid(RulePart::Action))?,
                })
            })
            .collect::<Result<Vec<_>, RuleSetError>>()?;
        Ok(CompiledRuleSet { rules })
    }

    /// The six-branch decision table over PV surplus and battery state.
    pub fn reference() -> Result<Self, RuleSetError> {
        Self::from_json(REFERENCE_JSON)
    }

    /// Feed in any surplus, buy any deficit, never touch the battery.
    pub fn no_battery() -> Result<Self, RuleSetError> {
        Self::from_json(NO_BATTERY_JSON)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub condition: Condition,
    pub action: Action,
}

/// A rule set whose fragments have all been compiled.
#[derive(Debug, Clone)]
pub struct CompiledRuleSet {
    rules: Vec<CompiledRule>,
}

impl CompiledRuleSet {
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Strategies shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    Reference,
    NoBattery,
}

impl Builtin {
    pub const ALL: [Self; 2] = [Self::Reference, Self::NoBattery];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::NoBattery => "no_battery",
        }
    }

    /// Human-readable label, also used in export file names.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reference => "Reference",
            Self::NoBattery => "No battery",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn rule_set(self) -> Result<RuleSet, RuleSetError> {
        match self {
            Self::Reference => RuleSet::reference(),
            Self::NoBattery => RuleSet::no_battery(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_parse_and_compile() {
        for builtin in Builtin::ALL {
            let rules = builtin.rule_set().expect("embedded JSON should parse");
            assert!(!rules.is_empty());
            rules.validate().expect("built-in strategy should compile");
        }
        assert_eq!(RuleSet::reference().map(|r| r.len()), Ok(6));
        assert_eq!(RuleSet::no_battery().map(|r| r.len()), Ok(2));
    }

    #[test]
    fn pretty_json_round_trips_with_four_space_indent() {
        let rules = RuleSet::reference().expect("should parse");
        let text = rules.to_json_pretty();
        assert!(text.starts_with("[\n    {\n        \"condition\""));
        assert_eq!(RuleSet::from_json(&text), Ok(rules));
    }

    #[test]
    fn malformed_json_reports_position() {
        let text = "[\n  {\"condition\": \"True\", \"action\": \"P_charge[t] = 1\",}\n]";
        let err = RuleSet::from_json(text).expect_err("trailing comma should fail");
        let (line, _) = err.location().expect("json errors carry a location");
        assert_eq!(line, 2);
        assert!(err.snippet(text).is_some_and(|s| s.contains('^')));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = r#"[{"condition": "True", "action": "P_charge[t] = 1", "priority": 1}]"#;
        assert!(matches!(RuleSet::from_json(text), Err(RuleSetError::Json { .. })));
    }

    #[test]
    fn first_invalid_fragment_is_reported_with_snippet() {
        let rules: RuleSet = [
            Rule::new("P_pv[t] > 0", "P_feed_in[t] = P_pv[t]"),
            Rule::new("True", "P_charge[t] = \n  P_pv[t] +* 1"),
            Rule::new("bogus[t]", "P_charge[t] = 1"),
        ]
        .into_iter()
        .collect();
        let err = rules.validate().expect_err("second rule is invalid");
        let RuleSetError::Invalid { rule, part, .. } = &err else {
            panic!("expected an invalid-fragment error, got {err:?}");
        };
        assert_eq!((*rule, *part), (1, RulePart::Action));
        assert_eq!(err.location(), Some((2, 12)));
        assert_eq!(err.snippet("").as_deref(), Some("  P_pv[t] +* 1\n           ^"));
        assert!(err.to_string().starts_with("rule 2 action: syntax error"));
    }

    #[test]
    fn builtin_names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("greedy"), None);
    }
}
