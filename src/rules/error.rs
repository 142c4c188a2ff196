use thiserror::Error;

/// Failure while compiling or evaluating a single rule fragment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    /// The fragment does not match the rule grammar. Positions are 1-based.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("disallowed identifiers: {}", .names.join(", "))]
    DisallowedIdentifier { names: Vec<String> },

    /// `t-1` at `t=0` ends up here; indices never wrap around.
    #[error("index error: index {index} is out of range for `{name}` (valid indices are 0..={max})")]
    Index { name: String, index: i64, max: usize },

    #[error("type error: {0}")]
    Type(String),

    #[error("`{0}` is read-only; actions may only assign P_charge, P_discharge, P_purchase or P_feed_in")]
    ReadOnlyTarget(String),

    #[error("cannot assign `{name}[{index}]` while simulating t={t}; only index t may be written")]
    WriteOutsideStep { name: String, index: i64, t: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("assignment would store a non-finite value in `{0}`")]
    NonFinite(String),
}

impl RuleError {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Line and column of a syntax error, if this is one.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            Self::Syntax { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}

/// Renders `line` of `text` followed by a caret under `column`.
///
/// Returns `None` when the position lies outside the text.
pub fn caret_snippet(text: &str, line: usize, column: usize) -> Option<String> {
    let source_line = text.lines().nth(line.checked_sub(1)?)?;
    let pad = " ".repeat(column.saturating_sub(1));
    Some(format!("{source_line}\n{pad}^"))
}
