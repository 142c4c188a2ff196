//! Simulation engine that applies a rule set hour by hour.

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::rules::{CompiledRuleSet, RuleError, RulePart, RuleSet, RuleSetError};

use super::context::RunContext;
use super::invariants::{InvariantReport, Violation, check_step};
use super::types::{HORIZON, RunStatus, SimInputs};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// The rule set failed validation and was never simulated.
    #[error(transparent)]
    Rules(#[from] RuleSetError),

    /// A rule failed while being evaluated. The run is aborted.
    #[error("rule {} {part} failed at t={t}: {source}", .rule + 1)]
    Rule {
        rule: usize,
        part: RulePart,
        t: usize,
        source: RuleError,
    },

    #[error("step {t} requested, but the next step is {expected}")]
    OutOfOrder { t: usize, expected: usize },
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub t: usize,
    /// 0-based indices of the rules whose condition held.
    pub fired: Vec<usize>,
    pub w_batt_kwh: f64,
    pub soc: f64,
    pub violations: Vec<Violation>,
}

/// A completed run: every series plus the invariant findings.
#[derive(Debug, Clone)]
pub struct SimRun {
    context: RunContext,
    rules: RuleSet,
    invariants: InvariantReport,
}

impl SimRun {
    /// Series and inputs of the run.
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn inputs(&self) -> &SimInputs {
        self.context.inputs()
    }

    /// The rule set the run was produced with.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn invariants(&self) -> &InvariantReport {
        &self.invariants
    }

    pub fn status(&self) -> RunStatus {
        self.invariants.status()
    }
}

/// Drives a [`RunContext`] through the horizon with a compiled rule set.
///
/// Steps must be taken in order, `0` through `167`. Every rule whose
/// condition holds fires in rule order, and later rules see the writes of
/// earlier ones within the same step.
#[derive(Debug)]
pub struct Engine {
    rules: RuleSet,
    compiled: CompiledRuleSet,
    context: RunContext,
    invariants: InvariantReport,
    next_t: usize,
}

impl Engine {
    /// Compiles `rules` and prepares a fresh run over `inputs`.
    ///
    /// # Errors
    ///
    /// [`SimError::Rules`] if any fragment fails to compile; nothing is
    /// simulated in that case.
    pub fn new(inputs: SimInputs, rules: &RuleSet) -> Result<Self, SimError> {
        let compiled = rules.compile().inspect_err(|err| {
            error!(error = %err, "rule set rejected");
        })?;
        Ok(Self {
            rules: rules.clone(),
            compiled,
            context: RunContext::new(inputs),
            invariants: InvariantReport::default(),
            next_t: 0,
        })
    }

    /// Executes one timestep.
    ///
    /// # Arguments
    ///
    /// * `t` - Timestep index, which must equal the number of steps taken so far
    ///
    /// # Errors
    ///
    /// [`SimError::Rule`] when a condition or action fails to evaluate, and
    /// [`SimError::OutOfOrder`] when `t` skips or repeats a step.
    pub fn step(&mut self, t: usize) -> Result<StepOutcome, SimError> {
        if t != self.next_t || t >= HORIZON {
            return Err(SimError::OutOfOrder {
                t,
                expected: self.next_t,
            });
        }
        self.context.begin_step(t);

        let mut fired = Vec::new();
        for (i, rule) in self.compiled.rules().iter().enumerate() {
            let holds = rule
                .condition
                .evaluate(&self.context)
                .map_err(|source| rule_failure(i, RulePart::Condition, t, source))?;
            if !holds {
                continue;
            }
            debug!(t, rule = i + 1, action = rule.action.text(), "rule fired");
            self.context.set_active_rule(Some(i));
            rule.action
                .execute(&mut self.context)
                .map_err(|source| rule_failure(i, RulePart::Action, t, source))?;
            fired.push(i);
        }
        self.context.set_active_rule(None);

        let (w_batt_kwh, soc) = self.context.update_battery();
        let violations = check_step(&self.context.snapshot());
        for v in &violations {
            warn!(t, check = v.kind.check_name(), rule = v.rule.map(|r| r + 1), "{}", v.kind.message());
        }
        self.invariants.record(violations.iter().copied());
        self.next_t += 1;

        Ok(StepOutcome {
            t,
            fired,
            w_batt_kwh,
            soc,
            violations,
        })
    }

    /// Executes all remaining timesteps and returns the completed run.
    ///
    /// # Errors
    ///
    /// The first [`SimError`] raised by [`Engine::step`]; no partial results
    /// are returned.
    pub fn run(mut self) -> Result<SimRun, SimError> {
        info!(rules = self.compiled.len(), start = self.next_t, "simulation started");
        for t in self.next_t..HORIZON {
            self.step(t).inspect_err(|err| {
                error!(error = %err, "simulation aborted");
            })?;
        }
        let status = self.invariants.status();
        info!(
            %status,
            violations = self.invariants.violations().len(),
            "simulation finished"
        );
        Ok(SimRun {
            context: self.context,
            rules: self.rules,
            invariants: self.invariants,
        })
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }
}

fn rule_failure(rule: usize, part: RulePart, t: usize, source: RuleError) -> SimError {
    SimError::Rule {
        rule,
        part,
        t,
        source,
    }
}

/// Compiles `rules` and runs the full horizon over `inputs`.
///
/// # Errors
///
/// See [`Engine::new`] and [`Engine::run`].
pub fn simulate(inputs: SimInputs, rules: &RuleSet) -> Result<SimRun, SimError> {
    Engine::new(inputs, rules)?.run()
}
