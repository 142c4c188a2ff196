//! Compiled rule fragments and the sandbox that runs them.
//!
//! Compilation is parse, then whitelist check, then static type check. A
//! fragment that compiles can only fail at evaluation time on a bad index,
//! a write outside the current step, or a division by zero.

use super::ast::{Assignment, Expr};
use super::error::RuleError;
use super::eval::{self, Scope, ScopeMut, Ty};
use super::parser::{parse_action, parse_condition};
use super::variables::{Variable, Whitelist};

/// A validated boolean expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    text: String,
    expr: Expr,
}

impl Condition {
    /// Compiles `text` against the standard whitelist.
    ///
    /// # Errors
    ///
    /// [`RuleError::Syntax`], [`RuleError::DisallowedIdentifier`] or
    /// [`RuleError::Type`], in that order of precedence.
    pub fn compile(text: &str) -> Result<Self, RuleError> {
        Self::compile_with(text, &Whitelist::standard())
    }

    pub fn compile_with(text: &str, whitelist: &Whitelist) -> Result<Self, RuleError> {
        let expr = parse_condition(text)?;
        let names = whitelist.disallowed(expr.names());
        if !names.is_empty() {
            return Err(RuleError::DisallowedIdentifier { names });
        }
        if eval::infer(&expr)? != Ty::Bool {
            return Err(RuleError::Type(
                "a condition must evaluate to True or False".into(),
            ));
        }
        Ok(Self {
            text: text.to_owned(),
            expr,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn evaluate<S: Scope + ?Sized>(&self, scope: &S) -> Result<bool, RuleError> {
        eval::evaluate_bool(&self.expr, scope)
    }
}

/// A validated sequence of assignments to control series.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    text: String,
    assignments: Vec<Assignment>,
}

impl Action {
    /// Compiles `text` against the standard whitelist.
    ///
    /// # Errors
    ///
    /// Same as [`Condition::compile`], plus [`RuleError::ReadOnlyTarget`].
    pub fn compile(text: &str) -> Result<Self, RuleError> {
        Self::compile_with(text, &Whitelist::standard())
    }

    pub fn compile_with(text: &str, whitelist: &Whitelist) -> Result<Self, RuleError> {
        let assignments = parse_action(text)?;
        let names = whitelist.disallowed(assignments.iter().flat_map(Assignment::names));
        if !names.is_empty() {
            return Err(RuleError::DisallowedIdentifier { names });
        }
        for assignment in &assignments {
            eval::check_assignment(assignment)?;
        }
        Ok(Self {
            text: text.to_owned(),
            assignments,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Control series written by this action, in statement order.
    pub fn targets(&self) -> impl Iterator<Item = Variable> + '_ {
        self.assignments
            .iter()
            .filter_map(|a| Variable::from_name(&a.target))
    }

    /// Runs every assignment in order; each sees the writes of the previous one.
    pub fn execute<S: ScopeMut + ?Sized>(&self, scope: &mut S) -> Result<(), RuleError> {
        self.assignments
            .iter()
            .try_for_each(|assignment| eval::execute(assignment, scope))
    }
}

/// Evaluator bound to a whitelist.
///
/// Holds no state between calls; every call compiles the fragment afresh.
/// The simulator compiles each rule once through [`Condition`] and
/// [`Action`] instead.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    whitelist: Whitelist,
}

impl Sandbox {
    pub fn new(whitelist: Whitelist) -> Self {
        Self { whitelist }
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    pub fn compile_condition(&self, text: &str) -> Result<Condition, RuleError> {
        Condition::compile_with(text, &self.whitelist)
    }

    pub fn compile_action(&self, text: &str) -> Result<Action, RuleError> {
        Action::compile_with(text, &self.whitelist)
    }

    /// Parses, checks and evaluates a condition in one call.
    pub fn eval_condition<S: Scope + ?Sized>(&self, text: &str, scope: &S) -> Result<bool, RuleError> {
        self.compile_condition(text)?.evaluate(scope)
    }

    /// Parses, checks and executes an action in one call.
    pub fn exec_action<S: ScopeMut + ?Sized>(&self, text: &str, scope: &mut S) -> Result<(), RuleError> {
        self.compile_action(text)?.execute(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::eval::tests::TestScope;

    #[test]
    fn disallowed_identifiers_abort_before_mutation() {
        let sandbox = Sandbox::default();
        let mut scope = TestScope::new(0);
        let err = sandbox
            .exec_action("P_charge[t] = open(P_pv[t]) + eval(1)", &mut scope)
            .expect_err("should be rejected");
        assert_eq!(
            err,
            RuleError::DisallowedIdentifier {
                names: vec!["eval".into(), "open".into()]
            }
        );
        assert_eq!(scope.charge, vec![0.0; 3]);
    }

    #[test]
    fn syntax_errors_take_precedence() {
        let err = Condition::compile("import os").expect_err("should fail");
        assert!(matches!(err, RuleError::Syntax { .. }));
    }

    #[test]
    fn numeric_condition_fails_to_compile() {
        assert!(matches!(
            Condition::compile("P_pv[t] - P_load[t]"),
            Err(RuleError::Type(_))
        ));
    }

    #[test]
    fn evaluates_and_executes() {
        let sandbox = Sandbox::default();
        let mut scope = TestScope::new(2);
        assert_eq!(sandbox.eval_condition("P_pv[t] > P_pv[t-1]", &scope), Ok(true));
        sandbox
            .exec_action("P_charge[t] = min(P_pv[t], W_batt_max)", &mut scope)
            .expect("should execute");
        assert_eq!(scope.charge[2], 3.0);
    }

    #[test]
    fn narrower_whitelist_rejects_standard_names() {
        let sandbox = Sandbox::new(["P_pv", "t"].into_iter().collect());
        assert_eq!(
            sandbox.compile_condition("P_pv[t] > W_batt_max"),
            Err(RuleError::DisallowedIdentifier {
                names: vec!["W_batt_max".into()]
            })
        );
    }

    #[test]
    fn action_reports_targets_in_order() {
        let action = Action::compile("P_feed_in[t] = 1; P_charge[t] = 0").expect("should compile");
        let targets: Vec<_> = action.targets().collect();
        assert_eq!(targets, vec![Variable::FeedIn, Variable::Charge]);
    }
}
