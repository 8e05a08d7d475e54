//! Project operator: selects columns in planned order (§4.3.1, §4.3.4).
//!
//! Columns not present on the table are dropped silently rather than
//! erroring — the multi-table path relies on this to project each source's
//! own slice of a cross-table projection list.

use common::{DbResult, Row, Table};

pub fn select(table: &Table, columns: &[String]) -> DbResult<Table> {
    let mut idxs = Vec::with_capacity(columns.len());
    let mut out_columns = Vec::with_capacity(columns.len());
    for name in columns {
        if let Some(idx) = table.column_index(name) {
            idxs.push(idx);
            out_columns.push(table.columns[idx].clone());
        }
    }

    let rows = table
        .rows
        .iter()
        .map(|row| Row::new(idxs.iter().map(|&i| row.0[i].clone()).collect()))
        .collect();

    Ok(Table::new(out_columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::Value;

    fn table() -> Table {
        Table::new(
            vec!["id".into(), "name".into(), "age".into()],
            vec![Row::new(vec![
                Value::Int(1),
                Value::Str("Alice".into()),
                Value::Int(25),
            ])],
        )
    }

    #[test]
    fn keeps_only_listed_columns_in_order() {
        let result = select(&table(), &["age".to_string(), "name".to_string()]).unwrap();
        assert_eq!(result.columns, vec!["age", "name"]);
        assert_eq!(result.rows[0].0, vec![Value::Int(25), Value::Str("Alice".into())]);
    }

    #[test]
    fn missing_columns_are_dropped_not_errored() {
        let result = select(&table(), &["age".to_string(), "salary".to_string()]).unwrap();
        assert_eq!(result.columns, vec!["age"]);
    }
}
