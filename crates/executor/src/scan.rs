//! Single-table scan paths: serial (§4.3.1) and parallel chunked (§4.3.3).
//!
//! Both paths filter, then project, then sort — the standardized order from
//! §9 "Filter-before-projection vs projection-before-filter" — and both
//! return the *projected* column set even when every row is eliminated,
//! fixing the serial/parallel divergence §9 "Parallel empty result" flags.

use std::sync::Arc;

use common::{Config, DbError, DbResult, Table};
use plan::{LogicalPlan, SingleFilter};
use tokio::sync::Semaphore;

use crate::{filter, project, sort};

fn plan_filters(plan: &LogicalPlan, table_name: &str) -> Vec<SingleFilter> {
    plan.single_filters.get(table_name).cloned().unwrap_or_default()
}

fn plan_projection(plan: &LogicalPlan, table_name: &str) -> Vec<String> {
    plan.projections
        .get(&Some(table_name.to_string()))
        .cloned()
        .unwrap_or_default()
}

fn plan_order_columns(plan: &LogicalPlan) -> Vec<String> {
    plan.order_by.iter().map(|c| c.column.clone()).collect()
}

/// Serial single-table path: filter, project, sort.
pub fn serial_single_table(plan: &LogicalPlan, table_name: &str, table: Table) -> DbResult<Table> {
    let filters = plan_filters(plan, table_name);
    let cols = plan_projection(plan, table_name);

    let filtered = filter::apply(&table, &filters)?;
    let projected = project::select(&filtered, &cols)?;
    sort::apply(projected, &plan_order_columns(plan), plan.order_dir)
}

/// Parallel single-table path: partition into chunks, run filter+project on
/// a bounded worker pool, reassemble in submission order, then sort.
pub fn parallel_single_table(
    plan: &LogicalPlan,
    table_name: &str,
    table: Table,
    config: &Config,
) -> DbResult<Table> {
    let filters = plan_filters(plan, table_name);
    let cols = plan_projection(plan, table_name);

    let chunk_size = chunk_size(table.rows.len(), config);
    let chunks: Vec<Table> = table
        .rows
        .chunks(chunk_size.max(1))
        .map(|rows| Table::new(table.columns.clone(), rows.to_vec()))
        .collect();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.parallel_level.max(1))
        .enable_all()
        .build()
        .map_err(DbError::Io)?;

    let results = runtime.block_on(run_chunks(chunks, filters, cols.clone(), config.parallel_level.max(1)))?;

    let mut rows = Vec::new();
    for chunk_result in results {
        rows.extend(chunk_result.rows);
    }

    // Header matches the projected column set regardless of row count, per
    // the fixed empty-result behavior above.
    let out_columns: Vec<String> = cols.iter().filter(|c| table.has_column(c)).cloned().collect();
    let assembled = Table::new(out_columns, rows);

    sort::apply(assembled, &plan_order_columns(plan), plan.order_dir)
}

/// Target chunk count is `W*K`; raw chunk size is `ceil(n / (W*K))`, floored
/// to 1 and capped at `max_chunk_size`.
fn chunk_size(row_count: usize, config: &Config) -> usize {
    let target_chunks = config.parallel_level.max(1).saturating_mul(config.num_chunks_per_worker.max(1)).max(1);
    let raw = row_count.div_ceil(target_chunks).max(1);
    raw.min(config.max_chunk_size.max(1))
}

async fn run_chunks(
    chunks: Vec<Table>,
    filters: Vec<SingleFilter>,
    cols: Vec<String>,
    workers: usize,
) -> DbResult<Vec<Table>> {
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut handles = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let semaphore = semaphore.clone();
        let filters = filters.clone();
        let cols = cols.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("executor semaphore is never closed");
            tokio::task::spawn_blocking(move || process_chunk(chunk, &filters, &cols))
                .await
                .expect("chunk worker task panicked")
        }));
    }

    // Awaited in submission order: the ordering guarantee (§5) falls out of
    // this loop rather than needing an explicit completion-order merge.
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("chunk task panicked")?);
    }
    Ok(results)
}

fn process_chunk(chunk: Table, filters: &[SingleFilter], cols: &[String]) -> DbResult<Table> {
    let filtered = filter::apply(&chunk, filters)?;
    project::select(&filtered, cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Row;
    use plan::{CompareOp, OrderByColumn, OrderDir};
    use types::Value;

    fn emp() -> Table {
        Table::new(
            vec!["id".into(), "name".into(), "age".into()],
            vec![
                Row::new(vec![Value::Int(1), Value::Str("Alice".into()), Value::Int(25)]),
                Row::new(vec![Value::Int(2), Value::Str("Bob".into()), Value::Int(30)]),
                Row::new(vec![Value::Int(3), Value::Str("Charlie".into()), Value::Int(35)]),
            ],
        )
    }

    fn plan_with(filters: Vec<SingleFilter>, cols: Vec<&str>) -> LogicalPlan {
        let mut plan = LogicalPlan::new();
        plan.source_tables = vec!["emp".to_string()];
        if !filters.is_empty() {
            plan.single_filters.insert("emp".to_string(), filters);
        }
        plan.projections.insert(
            Some("emp".to_string()),
            cols.into_iter().map(str::to_string).collect(),
        );
        plan
    }

    #[test]
    fn serial_matches_s1_scenario() {
        let plan = plan_with(
            vec![SingleFilter {
                column: "age".into(),
                op: CompareOp::Gt,
                literal: Value::Int(28),
            }],
            vec!["name"],
        );
        let result = serial_single_table(&plan, "emp", emp()).unwrap();
        assert_eq!(result.columns, vec!["name"]);
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn parallel_equals_serial_without_order_by() {
        let plan = plan_with(
            vec![SingleFilter {
                column: "age".into(),
                op: CompareOp::Ge,
                literal: Value::Int(30),
            }],
            vec!["name", "age"],
        );
        let serial = serial_single_table(&plan, "emp", emp()).unwrap();

        let config = Config::builder().parallel_level(4).num_chunks_per_worker(2).build();
        let parallel = parallel_single_table(&plan, "emp", emp(), &config).unwrap();

        let mut serial_rows = serial.rows.clone();
        let mut parallel_rows = parallel.rows.clone();
        serial_rows.sort_by_key(|r| format!("{:?}", r.0));
        parallel_rows.sort_by_key(|r| format!("{:?}", r.0));
        assert_eq!(serial.columns, parallel.columns);
        assert_eq!(serial_rows, parallel_rows);
    }

    #[test]
    fn parallel_empty_result_keeps_projected_columns() {
        let mut plan = plan_with(
            vec![SingleFilter {
                column: "age".into(),
                op: CompareOp::Gt,
                literal: Value::Int(1000),
            }],
            vec!["name"],
        );
        plan.order_by.push(OrderByColumn {
            table: None,
            column: "name".into(),
        });
        plan.order_dir = Some(OrderDir::Asc);

        let config = Config::builder().parallel_level(2).build();
        let result = parallel_single_table(&plan, "emp", emp(), &config).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.columns, vec!["name"]);
    }

    #[test]
    fn chunk_size_respects_target_count_and_cap() {
        let config = Config::builder()
            .parallel_level(2)
            .num_chunks_per_worker(5)
            .max_chunk_size(3)
            .build();
        // target_chunks = 10, n = 100 -> raw = ceil(100/10) = 10, capped at 3.
        assert_eq!(chunk_size(100, &config), 3);
    }
}
