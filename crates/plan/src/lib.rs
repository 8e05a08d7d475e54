//! The Logical Plan: the passive data structure carried from parser to
//! validator to executor.

use std::collections::HashMap;
use types::Value;

/// Comparison operator accepted by the query grammar's `predicate` rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Self::Eq),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// The operator read when its operands are swapped, e.g. `age > 25` is
    /// the flipped form of `25 < age`.
    pub fn flipped(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Lt => Self::Gt,
            Self::Gt => Self::Lt,
            Self::Le => Self::Ge,
            Self::Ge => Self::Le,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

/// A single-table predicate: `column OP literal`.
#[derive(Clone, Debug)]
pub struct SingleFilter {
    pub column: String,
    pub op: CompareOp,
    pub literal: Value,
}

/// A predicate equating a column of one source table to a column of another.
#[derive(Clone, Debug)]
pub struct JoinFilter {
    pub left_table: String,
    pub left_col: String,
    pub op: CompareOp,
    pub right_table: String,
    pub right_col: String,
}

/// An ORDER BY column spec: `table.col` (`table = Some(..)`) or bare `col`.
#[derive(Clone, Debug)]
pub struct OrderByColumn {
    pub table: Option<String>,
    pub column: String,
}

/// The passive plan mutated in place by the validator and read by the
/// executor. Field names and shapes mirror §3 of the specification exactly.
#[derive(Clone, Debug, Default)]
pub struct LogicalPlan {
    /// Per-table projection lists; `None` is the "unresolved" bucket the
    /// parser could not attribute to a table.
    pub projections: HashMap<Option<String>, Vec<String>>,
    pub select_all: bool,
    pub source_tables: Vec<String>,
    /// Cleared by the validator once `single_filters`/`join_filters` are
    /// populated.
    pub raw_filter: Option<String>,
    pub single_filters: HashMap<String, Vec<SingleFilter>>,
    pub join_filters: Vec<JoinFilter>,
    pub order_by: Vec<OrderByColumn>,
    pub order_dir: Option<OrderDir>,
}

impl LogicalPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column to the unresolved bucket's projection list.
    pub fn push_unresolved(&mut self, column: String) {
        self.projections.entry(None).or_default().push(column);
    }

    /// Append a column to a known table's projection list.
    pub fn push_projection(&mut self, table: String, column: String) {
        self.projections.entry(Some(table)).or_default().push(column);
    }

    pub fn has_unresolved(&self) -> bool {
        self.projections.get(&None).is_some_and(|cols| !cols.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_unresolved_then_resolve() {
        let mut plan = LogicalPlan::new();
        plan.push_unresolved("name".into());
        assert!(plan.has_unresolved());

        let cols = plan.projections.remove(&None).unwrap();
        for col in cols {
            plan.push_projection("emp".into(), col);
        }
        assert!(!plan.has_unresolved());
        assert_eq!(plan.projections[&Some("emp".to_string())], vec!["name"]);
    }

    #[test]
    fn flipped_operator_mirrors_comparison() {
        assert_eq!(CompareOp::Lt.flipped(), CompareOp::Gt);
        assert_eq!(CompareOp::Ge.flipped(), CompareOp::Le);
        assert_eq!(CompareOp::Eq.flipped(), CompareOp::Eq);
    }

    #[test]
    fn from_token_rejects_unknown_operators() {
        assert_eq!(CompareOp::from_token("!="), None);
        assert_eq!(CompareOp::from_token("="), Some(CompareOp::Eq));
    }
}
