//! Type checking and evaluation of parsed fragments against a variable scope.

use std::fmt;

use super::ast::{AssignOp, Assignment, BinaryOp, CompareOp, Expr, UnaryOp};
use super::error::RuleError;
use super::variables::{Function, Kind, Variable};

/// Read-only view of a simulation's variables at one time step.
pub trait Scope {
    /// Index of the step being simulated.
    fn step(&self) -> usize;

    /// Value of a [`Kind::Scalar`] variable.
    fn scalar(&self, var: Variable) -> f64;

    /// Samples of a [`Kind::Series`] variable.
    fn series(&self, var: Variable) -> &[f64];
}

/// Mutable view used by actions. Writes always target [`Scope::step`].
pub trait ScopeMut: Scope {
    fn assign(&mut self, var: Variable, value: f64);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    fn number(self, what: &str) -> Result<f64, RuleError> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Bool(b) => Err(RuleError::Type(format!(
                "{what} expects a number, got boolean {}",
                bool_literal(b)
            ))),
        }
    }

    fn boolean(self, what: &str) -> Result<bool, RuleError> {
        match self {
            Self::Bool(b) => Ok(b),
            Self::Number(n) => Err(RuleError::Type(format!(
                "{what} expects a boolean, got number {n}"
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => f.write_str(bool_literal(*b)),
        }
    }
}

fn bool_literal(b: bool) -> &'static str {
    if b { "True" } else { "False" }
}

/// Static type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ty {
    Number,
    Bool,
}

impl Ty {
    fn describe(self) -> &'static str {
        match self {
            Self::Number => "a number",
            Self::Bool => "a boolean",
        }
    }
}

fn expect_ty(expr: &Expr, want: Ty, what: &str) -> Result<(), RuleError> {
    let got = infer(expr)?;
    if got == want {
        Ok(())
    } else {
        Err(RuleError::Type(format!(
            "{what} expects {}, got {}",
            want.describe(),
            got.describe()
        )))
    }
}

fn series_var(name: &str) -> Result<Variable, RuleError> {
    match Variable::from_name(name) {
        Some(var) if var.kind() == Kind::Series => Ok(var),
        Some(_) => Err(RuleError::Type(format!(
            "`{name}` is a scalar and cannot be indexed"
        ))),
        None if Function::from_name(name).is_some() => Err(RuleError::Type(format!(
            "`{name}` is a function and cannot be indexed"
        ))),
        None => Err(RuleError::Type(format!("`{name}` is not bound to a value"))),
    }
}

fn scalar_var(name: &str) -> Result<Variable, RuleError> {
    match Variable::from_name(name) {
        Some(var) if var.kind() == Kind::Scalar => Ok(var),
        Some(_) => Err(RuleError::Type(format!(
            "`{name}` is a time series and must be indexed, e.g. `{name}[t]`"
        ))),
        None if Function::from_name(name).is_some() => Err(RuleError::Type(format!(
            "`{name}` is a function and must be called"
        ))),
        None => Err(RuleError::Type(format!("`{name}` is not bound to a value"))),
    }
}

fn function(name: &str) -> Result<Function, RuleError> {
    Function::from_name(name)
        .ok_or_else(|| RuleError::Type(format!("`{name}` is not callable")))
}

/// Infers the type of `expr`, rejecting every ill-typed construct.
pub(crate) fn infer(expr: &Expr) -> Result<Ty, RuleError> {
    match expr {
        Expr::Number(_) => Ok(Ty::Number),
        Expr::Bool(_) => Ok(Ty::Bool),
        Expr::Name(name) => scalar_var(name).map(|_| Ty::Number),
        Expr::Index { name, index } => {
            series_var(name)?;
            expect_ty(index, Ty::Number, "an index")?;
            Ok(Ty::Number)
        }
        Expr::Call { name, args } => {
            let func = function(name)?;
            for arg in args {
                expect_ty(arg, Ty::Number, func.name())?;
            }
            Ok(Ty::Number)
        }
        Expr::Unary(_, inner) => {
            expect_ty(inner, Ty::Number, "unary `-`/`+`")?;
            Ok(Ty::Number)
        }
        Expr::Binary(op, lhs, rhs) => {
            let what = binary_symbol(*op);
            expect_ty(lhs, Ty::Number, what)?;
            expect_ty(rhs, Ty::Number, what)?;
            Ok(Ty::Number)
        }
        Expr::Compare(op, lhs, rhs) => {
            let (l, r) = (infer(lhs)?, infer(rhs)?);
            let equality = matches!(op, CompareOp::Eq | CompareOp::Ne);
            if l != r || (!equality && l == Ty::Bool) {
                return Err(RuleError::Type(format!(
                    "cannot compare {} with {}",
                    l.describe(),
                    r.describe()
                )));
            }
            Ok(Ty::Bool)
        }
        Expr::Not(inner) => {
            expect_ty(inner, Ty::Bool, "`not`")?;
            Ok(Ty::Bool)
        }
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
            let what = if matches!(expr, Expr::And(..)) { "`and`" } else { "`or`" };
            expect_ty(lhs, Ty::Bool, what)?;
            expect_ty(rhs, Ty::Bool, what)?;
            Ok(Ty::Bool)
        }
    }
}

/// Checks an assignment without evaluating it.
pub(crate) fn check_assignment(assignment: &Assignment) -> Result<(), RuleError> {
    let target = series_var(&assignment.target).map_err(|err| match Variable::from_name(&assignment.target) {
        Some(_) => RuleError::ReadOnlyTarget(assignment.target.clone()),
        None => err,
    })?;
    if !target.is_writable() {
        return Err(RuleError::ReadOnlyTarget(assignment.target.clone()));
    }
    expect_ty(&assignment.index, Ty::Number, "an index")?;
    expect_ty(&assignment.value, Ty::Number, "an assignment")
}

fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "`+`",
        BinaryOp::Sub => "`-`",
        BinaryOp::Mul => "`*`",
        BinaryOp::Div => "`/`",
    }
}

fn resolve_index<S: Scope + ?Sized>(
    name: &str,
    len: usize,
    index: &Expr,
    scope: &S,
) -> Result<usize, RuleError> {
    let raw = evaluate(index, scope)?.number("an index")?;
    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(RuleError::Type(format!(
            "index of `{name}` must be an integer, got {raw}"
        )));
    }
    let index = raw as i64;
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| RuleError::Index {
            name: name.to_owned(),
            index,
            max: len.saturating_sub(1),
        })
}

/// Evaluates `expr` against `scope`.
///
/// `and`/`or` short-circuit, so the right operand is only evaluated (and
/// only able to fail) when it decides the result.
pub fn evaluate<S: Scope + ?Sized>(expr: &Expr, scope: &S) -> Result<Value, RuleError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Name(name) => {
            let var = scalar_var(name)?;
            Ok(Value::Number(match var {
                Variable::Step => scope.step() as f64,
                other => scope.scalar(other),
            }))
        }
        Expr::Index { name, index } => {
            let series = scope.series(series_var(name)?);
            let i = resolve_index(name, series.len(), index, scope)?;
            Ok(Value::Number(series[i]))
        }
        Expr::Call { name, args } => {
            let func = function(name)?;
            let values = args
                .iter()
                .map(|arg| evaluate(arg, scope)?.number(func.name()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Number(func.apply(&values)))
        }
        Expr::Unary(op, inner) => {
            let n = evaluate(inner, scope)?.number("unary `-`/`+`")?;
            Ok(Value::Number(match op {
                UnaryOp::Neg => -n,
                UnaryOp::Plus => n,
            }))
        }
        Expr::Binary(op, lhs, rhs) => {
            let what = binary_symbol(*op);
            let l = evaluate(lhs, scope)?.number(what)?;
            let r = evaluate(rhs, scope)?.number(what)?;
            Ok(Value::Number(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div if r == 0.0 => return Err(RuleError::DivisionByZero),
                BinaryOp::Div => l / r,
            }))
        }
        Expr::Compare(op, lhs, rhs) => {
            let l = evaluate(lhs, scope)?;
            let r = evaluate(rhs, scope)?;
            let holds = match (l, r) {
                (Value::Number(a), Value::Number(b)) => op.holds(a, b),
                (Value::Bool(a), Value::Bool(b)) => match op {
                    CompareOp::Eq => a == b,
                    CompareOp::Ne => a != b,
                    _ => {
                        return Err(RuleError::Type(
                            "booleans can only be compared with `==` or `!=`".into(),
                        ));
                    }
                },
                _ => {
                    return Err(RuleError::Type(format!("cannot compare {l} with {r}")));
                }
            };
            Ok(Value::Bool(holds))
        }
        Expr::Not(inner) => Ok(Value::Bool(!evaluate(inner, scope)?.boolean("`not`")?)),
        Expr::And(lhs, rhs) => {
            if !evaluate(lhs, scope)?.boolean("`and`")? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(evaluate(rhs, scope)?.boolean("`and`")?))
        }
        Expr::Or(lhs, rhs) => {
            if evaluate(lhs, scope)?.boolean("`or`")? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(evaluate(rhs, scope)?.boolean("`or`")?))
        }
    }
}

/// Evaluates `expr` and requires a boolean result.
pub fn evaluate_bool<S: Scope + ?Sized>(expr: &Expr, scope: &S) -> Result<bool, RuleError> {
    evaluate(expr, scope)?.boolean("a condition")
}

/// Applies one assignment to `scope` at the current step.
pub fn execute<S: ScopeMut + ?Sized>(assignment: &Assignment, scope: &mut S) -> Result<(), RuleError> {
    let target = series_var(&assignment.target)?;
    if !target.is_writable() {
        return Err(RuleError::ReadOnlyTarget(assignment.target.clone()));
    }
    let t = scope.step();
    let current = {
        let series = scope.series(target);
        let index = resolve_index(&assignment.target, series.len(), &assignment.index, &*scope)?;
        if index != t {
            return Err(RuleError::WriteOutsideStep {
                name: assignment.target.clone(),
                index: index as i64,
                t,
            });
        }
        series[index]
    };
    let value = evaluate(&assignment.value, &*scope)?.number("an assignment")?;
    let next = match assignment.op {
        AssignOp::Set => value,
        AssignOp::Add => current + value,
        AssignOp::Sub => current - value,
    };
    if !next.is_finite() {
        return Err(RuleError::NonFinite(assignment.target.clone()));
    }
    scope.assign(target, next);
    Ok(())
}
