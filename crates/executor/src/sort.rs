//! Sort operator: orders rows by a shared direction over listed columns
//! (§4.3.5). Direction applies to every key uniformly; ties fall through to
//! the next key, then to the pre-sort row order (stable).

use std::cmp::Ordering;

use common::{DbError, DbResult, Table};
use plan::OrderDir;

pub fn apply(table: Table, columns: &[String], dir: Option<OrderDir>) -> DbResult<Table> {
    if columns.is_empty() {
        return Ok(table);
    }

    let idxs: Vec<usize> = columns
        .iter()
        .map(|c| table.column_index(c).ok_or_else(|| DbError::UnknownColumn(c.clone())))
        .collect::<DbResult<_>>()?;

    let descending = matches!(dir, Some(OrderDir::Desc));
    let Table { columns: table_columns, mut rows } = table;

    rows.sort_by(|a, b| {
        for &idx in &idxs {
            if let Some(ord) = a.0[idx].cmp_same_type(&b.0[idx]) {
                if ord != Ordering::Equal {
                    return if descending { ord.reverse() } else { ord };
                }
            }
        }
        Ordering::Equal
    });

    Ok(Table::new(table_columns, rows))
}
