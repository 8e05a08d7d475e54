//! Filter operator: applies single-table WHERE predicates (§4.3.2).
//!
//! Predicates on the same table combine conjunctively, in listed order.

use common::{DbError, DbResult, Row, Table};
use plan::{CompareOp, SingleFilter};
use types::Value;

/// Apply `filters` to `table`, keeping rows that satisfy every predicate.
pub fn apply(table: &Table, filters: &[SingleFilter]) -> DbResult<Table> {
    if filters.is_empty() {
        return Ok(table.clone());
    }

    let idxs: Vec<usize> = filters
        .iter()
        .map(|f| {
            table
                .column_index(&f.column)
                .ok_or_else(|| DbError::UnknownColumn(f.column.clone()))
        })
        .collect::<DbResult<_>>()?;

    let mut rows = Vec::new();
    'rows: for row in &table.rows {
        for (filter, &idx) in filters.iter().zip(&idxs) {
            if !eval(filter.op, &row.0[idx], &filter.literal)? {
                continue 'rows;
            }
        }
        rows.push(row.clone());
    }

    Ok(Table::new(table.columns.clone(), rows))
}

fn eval(op: CompareOp, cell: &Value, literal: &Value) -> DbResult<bool> {
    match op {
        CompareOp::Eq => Ok(values_eq(cell, literal)),
        CompareOp::Lt | CompareOp::Gt | CompareOp::Le | CompareOp::Ge => {
            if matches!(literal, Value::Str(_)) {
                return Err(DbError::TypeError(format!(
                    "operator {op:?} not supported with a string literal"
                )));
            }
            let (Some(a), Some(b)) = (as_f64(cell), as_f64(literal)) else {
                return Err(DbError::TypeError(format!(
                    "operator {op:?} requires a numeric column"
                )));
            };
            Ok(match op {
                CompareOp::Lt => a < b,
                CompareOp::Gt => a > b,
                CompareOp::Le => a <= b,
                CompareOp::Ge => a >= b,
                CompareOp::Eq => unreachable!(),
            })
        }
    }
}

/// `=` uses case-insensitive comparison on string columns, exact numeric
/// comparison on numeric columns; values of incompatible type never match.
fn values_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.eq_ignore_ascii_case(y),
        _ => matches!((as_f64(a), as_f64(b)), (Some(x), Some(y)) if x == y),
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Str(_) => None,
    }
}
