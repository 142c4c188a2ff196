//! Tagged syntax tree for rule fragments.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub(crate) fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    /// Bare identifier, only valid for scalar variables.
    Name(String),
    Index {
        name: String,
        index: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Every identifier referenced in the expression, including function names.
    pub fn names(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Self::Number(_) | Self::Bool(_) => {}
            Self::Name(name) => {
                out.insert(name);
            }
            Self::Index { name, index } => {
                out.insert(name);
                index.collect_names(out);
            }
            Self::Call { name, args } => {
                out.insert(name);
                for arg in args {
                    arg.collect_names(out);
                }
            }
            Self::Unary(_, inner) | Self::Not(inner) => inner.collect_names(out),
            Self::Binary(_, lhs, rhs)
            | Self::Compare(_, lhs, rhs)
            | Self::And(lhs, rhs)
            | Self::Or(lhs, rhs) => {
                lhs.collect_names(out);
                rhs.collect_names(out);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

/// `target[index] op value`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: String,
    pub index: Expr,
    pub op: AssignOp,
    pub value: Expr,
}

impl Assignment {
    pub fn names(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::from([self.target.as_str()]);
        self.index.collect_names(&mut out);
        self.value.collect_names(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_names_through_nesting() {
        let expr = Expr::And(
            Box::new(Expr::Compare(
                CompareOp::Gt,
                Box::new(Expr::Index {
                    name: "P_pv".into(),
                    index: Box::new(Expr::Name("t".into())),
                }),
                Box::new(Expr::Number(0.0)),
            )),
            Box::new(Expr::Not(Box::new(Expr::Call {
                name: "max".into(),
                args: vec![Expr::Name("W_batt_max".into())],
            }))),
        );
        let names: Vec<_> = expr.names().into_iter().collect();
        assert_eq!(names, vec!["P_pv", "W_batt_max", "max", "t"]);
    }

    #[test]
    fn assignment_names_include_target() {
        let assignment = Assignment {
            target: "P_charge".into(),
            index: Expr::Name("t".into()),
            op: AssignOp::Set,
            value: Expr::Number(1.0),
        };
        assert!(assignment.names().contains("P_charge"));
    }
}
