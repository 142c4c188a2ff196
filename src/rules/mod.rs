//! The rule language: a closed expression grammar evaluated against a
//! whitelisted set of simulation variables.
//!
//! A rule is a `condition` (boolean expression) and an `action` (one or more
//! assignments to the control series at the current step). Nothing outside
//! the grammar in [`parser`] can be expressed, so attribute access, imports
//! and the like are syntax errors rather than filtered names.

pub mod ast;
pub mod error;
pub mod eval;
mod lexer;
pub mod parser;
pub mod sandbox;
pub mod strategy;
pub mod variables;

pub use error::{RuleError, caret_snippet};
pub use eval::{Scope, ScopeMut, Value};
pub use sandbox::{Action, Condition, Sandbox};
pub use strategy::{Builtin, CompiledRule, CompiledRuleSet, Rule, RulePart, RuleSet, RuleSetError};
pub use variables::{Function, Kind, Variable, Whitelist};
