//! Multi-table path (§4.3.4): per-table filter and projection, then either
//! a chain of equi-joins (when the WHERE clause supplied `join_filters`) or
//! a left-to-right cross join over `source_tables`, followed by ORDER BY.
//!
//! Join suffix scheme (§9 "Join suffix scheme"): an equi-join disambiguates
//! a column name shared by both sides by appending `_<left_table>` /
//! `_<right_table>`; a cross join instead pre-renames every column to
//! `<table>.<column>` before the cartesian product. The two conventions are
//! asymmetric but are the observable contract.

use std::collections::{HashMap, HashSet};

use common::{DbError, DbResult, Row, Table};
use plan::{CompareOp, LogicalPlan, OrderByColumn};

use crate::{filter, project, sort};

pub fn multi_table(plan: &LogicalPlan, mut tables: HashMap<String, Table>) -> DbResult<Table> {
    for name in &plan.source_tables {
        let Some(table) = tables.get(name) else {
            continue;
        };
        let filters = plan.single_filters.get(name).map(|v| v.as_slice()).unwrap_or(&[]);
        let filtered = filter::apply(table, filters)?;
        tables.insert(name.clone(), filtered);
    }

    for name in &plan.source_tables {
        let Some(table) = tables.get(name) else {
            continue;
        };
        let cols = plan.projections.get(&Some(name.clone())).cloned().unwrap_or_default();
        let projected = project::select(table, &cols)?;
        tables.insert(name.clone(), projected);
    }

    let joined = if !plan.join_filters.is_empty() {
        equi_join_chain(plan, tables)?
    } else {
        cross_join_chain(&plan.source_tables, tables)?
    };

    let order_cols = resolve_order_columns(&joined, &plan.order_by)?;
    sort::apply(joined, &order_cols, plan.order_dir)
}

fn equi_join_chain(plan: &LogicalPlan, mut tables: HashMap<String, Table>) -> DbResult<Table> {
    let first = plan
        .source_tables
        .first()
        .ok_or_else(|| DbError::NotSupported("no source tables to join".into()))?;
    let mut running = tables
        .remove(first)
        .ok_or_else(|| DbError::UnknownTable(first.clone()))?;

    for jf in &plan.join_filters {
        if jf.op != CompareOp::Eq {
            return Err(DbError::NotSupported(format!(
                "join operator {:?} is not an equi-join",
                jf.op
            )));
        }
        let right = tables
            .get(&jf.right_table)
            .ok_or_else(|| DbError::UnknownTable(jf.right_table.clone()))?;
        running = equi_join(&running, &jf.left_table, &jf.left_col, right, &jf.right_table, &jf.right_col)?;
    }

    Ok(running)
}

fn equi_join(
    left: &Table,
    left_name: &str,
    left_col: &str,
    right: &Table,
    right_name: &str,
    right_col: &str,
) -> DbResult<Table> {
    let li = left
        .column_index(left_col)
        .ok_or_else(|| DbError::UnknownColumn(format!("{left_name}.{left_col}")))?;
    let ri = right
        .column_index(right_col)
        .ok_or_else(|| DbError::UnknownColumn(format!("{right_name}.{right_col}")))?;

    let collisions: HashSet<&String> = left
        .columns
        .iter()
        .filter(|c| right.columns.contains(c))
        .collect();

    let out_left: Vec<String> = left
        .columns
        .iter()
        .map(|c| {
            if collisions.contains(c) {
                format!("{c}_{left_name}")
            } else {
                c.clone()
            }
        })
        .collect();
    let out_right: Vec<String> = right
        .columns
        .iter()
        .map(|c| {
            if collisions.contains(c) {
                format!("{c}_{right_name}")
            } else {
                c.clone()
            }
        })
        .collect();

    let mut columns = out_left;
    columns.extend(out_right);

    let mut rows = Vec::new();
    for lrow in &left.rows {
        let lval = &lrow.0[li];
        for rrow in &right.rows {
            let rval = &rrow.0[ri];
            if lval.eq_same_type(rval).unwrap_or(false) {
                let mut values = lrow.0.clone();
                values.extend(rrow.0.clone());
                rows.push(Row::new(values));
            }
        }
    }

    Ok(Table::new(columns, rows))
}

fn cross_join_chain(order: &[String], mut tables: HashMap<String, Table>) -> DbResult<Table> {
    let mut names = order.iter();
    let first_name = names
        .next()
        .ok_or_else(|| DbError::NotSupported("no source tables to join".into()))?;
    let mut running = rename_qualified(
        tables
            .remove(first_name)
            .ok_or_else(|| DbError::UnknownTable(first_name.clone()))?,
        first_name,
    );

    for name in names {
        let next = rename_qualified(
            tables.remove(name).ok_or_else(|| DbError::UnknownTable(name.clone()))?,
            name,
        );
        running = cross_join_two(running, next);
    }

    Ok(running)
}

fn rename_qualified(table: Table, name: &str) -> Table {
    let columns = table.columns.iter().map(|c| format!("{name}.{c}")).collect();
    Table::new(columns, table.rows)
}

fn cross_join_two(left: Table, right: Table) -> Table {
    let mut columns = left.columns.clone();
    columns.extend(right.columns.clone());

    let mut rows = Vec::with_capacity(left.rows.len() * right.rows.len());
    for lrow in &left.rows {
        for rrow in &right.rows {
            let mut values = lrow.0.clone();
            values.extend(rrow.0.clone());
            rows.push(Row::new(values));
        }
    }

    Table::new(columns, rows)
}

/// Resolves an ORDER BY spec against the joined table's actual column
/// names, which may have been suffixed (equi-join) or qualified
/// (cross-join) during the join step.
fn resolve_order_columns(table: &Table, order_by: &[OrderByColumn]) -> DbResult<Vec<String>> {
    let mut out = Vec::with_capacity(order_by.len());
    for spec in order_by {
        let resolved = match &spec.table {
            Some(t) => [
                format!("{t}.{}", spec.column),
                format!("{}_{t}", spec.column),
                spec.column.clone(),
            ]
            .into_iter()
            .find(|c| table.has_column(c)),
            None => Some(spec.column.clone()).filter(|c| table.has_column(c)),
        };
        out.push(resolved.ok_or_else(|| DbError::UnknownColumn(spec.column.clone()))?);
    }
    Ok(out)
}
