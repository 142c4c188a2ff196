//! Physical plausibility checks applied after every step.
//!
//! Violations never stop a run. They are collected into an
//! [`InvariantReport`] and downgrade the run to [`RunStatus::MayBeInvalid`].

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::types::RunStatus;

/// The four classes of physically impossible operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    ChargeWhenFull,
    DischargeWhenEmpty,
    FeedInExceedsPv,
    ChargeExceedsPv,
}

impl ViolationKind {
    pub const ALL: [Self; 4] = [
        Self::ChargeWhenFull,
        Self::DischargeWhenEmpty,
        Self::FeedInExceedsPv,
        Self::ChargeExceedsPv,
    ];

    /// Name of the check that detects this class.
    pub const fn check_name(self) -> &'static str {
        match self {
            Self::ChargeWhenFull => "batteryChargeCheck",
            Self::DischargeWhenEmpty => "batteryDischargeCheck",
            Self::FeedInExceedsPv | Self::ChargeExceedsPv => "noArbitrageCheck",
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::ChargeWhenFull => {
                "batteryChargeCheck Error: Charging of full battery is not possible, results are invalid!"
            }
            Self::DischargeWhenEmpty => {
                "batteryDischargeCheck Error: Discharging of empty battery is not possible, results are invalid!"
            }
            Self::FeedInExceedsPv => {
                "noArbitrageCheck Error: Discharging the battery to sell to the grid is not allowed."
            }
            Self::ChargeExceedsPv => {
                "noArbitrageCheck Error: Charging the battery from the grid is not allowed."
            }
        }
    }
}

/// Final values of one step as seen by the checker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSnapshot {
    pub t: usize,
    pub p_pv: f64,
    pub p_charge: f64,
    pub p_discharge: f64,
    pub p_feed_in: f64,
    /// SoC the rules saw: `SoC[t-1]`, or the initial 0 at `t = 0`.
    pub soc_before: f64,
    /// 0-based index of the rule that last wrote `P_charge[t]`.
    pub charge_writer: Option<usize>,
    pub discharge_writer: Option<usize>,
    pub feed_in_writer: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Violation {
    pub t: usize,
    pub kind: ViolationKind,
    /// 0-based index of the rule that wrote the offending value, if any.
    pub rule: Option<usize>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}: {}", self.t, self.kind.message())?;
        if let Some(rule) = self.rule {
            write!(f, " (set by rule {})", rule + 1)?;
        }
        Ok(())
    }
}

/// Runs all four checks against one step. Checks are independent; a step
/// can trip several at once.
pub fn check_step(step: &StepSnapshot) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut flag = |kind, rule| out.push(Violation { t: step.t, kind, rule });

    if step.p_charge > 0.0 && step.soc_before == 1.0 {
        flag(ViolationKind::ChargeWhenFull, step.charge_writer);
    }
    if step.p_discharge > 0.0 && step.soc_before == 0.0 {
        flag(ViolationKind::DischargeWhenEmpty, step.discharge_writer);
    }
    if step.p_feed_in > step.p_pv {
        flag(ViolationKind::FeedInExceedsPv, step.feed_in_writer);
    }
    if step.p_charge > step.p_pv {
        flag(ViolationKind::ChargeExceedsPv, step.charge_writer);
    }
    out
}

/// All violations of a run, in step order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvariantReport {
    violations: Vec<Violation>,
}

impl InvariantReport {
    pub fn record(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.violations.extend(violations);
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Steps at which `kind` tripped, ascending.
    pub fn steps(&self, kind: ViolationKind) -> Vec<usize> {
        self.of_kind(kind).map(|v| v.t).collect()
    }

    pub fn status(&self) -> RunStatus {
        if self.is_clean() {
            RunStatus::Valid
        } else {
            RunStatus::MayBeInvalid
        }
    }

    /// One warning line per violated class, naming the rules and steps involved.
    pub fn warnings(&self) -> Vec<String> {
        ViolationKind::ALL
            .into_iter()
            .filter(|&kind| self.count(kind) > 0)
            .map(|kind| {
                let steps = self.steps(kind);
                let rules: BTreeSet<usize> = self.of_kind(kind).filter_map(|v| v.rule).collect();
                let mut line = format!(
                    "{} Affected steps ({}): {}.",
                    kind.message(),
                    steps.len(),
                    join(steps.iter())
                );
                if !rules.is_empty() {
                    line.push_str(&format!(
                        " Offending rule(s): {}.",
                        join(rules.iter().map(|r| r + 1))
                    ));
                }
                line
            })
            .collect()
    }

    fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}

fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(t: usize) -> StepSnapshot {
        StepSnapshot {
            t,
            p_pv: 2.0,
            p_charge: 0.0,
            p_discharge: 0.0,
            p_feed_in: 0.0,
            soc_before: 0.5,
            charge_writer: None,
            discharge_writer: None,
            feed_in_writer: None,
        }
    }

    #[test]
    fn plausible_step_is_clean() {
        let mut s = snapshot(4);
        s.p_charge = 1.0;
        s.p_feed_in = 1.0;
        assert!(check_step(&s).is_empty());
    }

    #[test]
    fn charging_a_full_battery_is_flagged_with_its_rule() {
        let mut s = snapshot(7);
        s.soc_before = 1.0;
        s.p_charge = 0.5;
        s.charge_writer = Some(2);
        assert_eq!(
            check_step(&s),
            vec![Violation {
                t: 7,
                kind: ViolationKind::ChargeWhenFull,
                rule: Some(2)
            }]
        );
    }

    #[test]
    fn discharging_an_empty_battery_is_flagged() {
        let mut s = snapshot(0);
        s.soc_before = 0.0;
        s.p_discharge = 1.0;
        let kinds: Vec<_> = check_step(&s).into_iter().map(|v| v.kind).collect();
        assert_eq!(kinds, vec![ViolationKind::DischargeWhenEmpty]);
    }

    #[test]
    fn checks_are_not_exclusive() {
        let mut s = snapshot(1);
        s.soc_before = 1.0;
        s.p_charge = 3.0;
        s.p_feed_in = 2.5;
        let kinds: Vec<_> = check_step(&s).into_iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::ChargeWhenFull,
                ViolationKind::FeedInExceedsPv,
                ViolationKind::ChargeExceedsPv
            ]
        );
    }

    #[test]
    fn report_groups_warnings_per_class() {
        let mut report = InvariantReport::default();
        assert_eq!(report.status(), RunStatus::Valid);
        for t in [3, 5] {
            report.record([Violation {
                t,
                kind: ViolationKind::ChargeExceedsPv,
                rule: Some(0),
            }]);
        }
        assert_eq!(report.status(), RunStatus::MayBeInvalid);
        assert_eq!(report.count(ViolationKind::ChargeExceedsPv), 2);
        assert_eq!(report.steps(ViolationKind::ChargeExceedsPv), vec![3, 5]);

        let warnings = report.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0],
            "noArbitrageCheck Error: Charging the battery from the grid is not allowed. \
             Affected steps (2): 3, 5. Offending rule(s): 1."
        );
    }
}
