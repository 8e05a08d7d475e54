//! Query executor: drives a validated `LogicalPlan` over tables fully
//! materialized from the catalog (§4.3).
//!
//! Dispatch is on `(|source_tables|, parallel_level)`:
//!
//! - 1 table, `parallel_level == 1` → serial single-table scan.
//! - 1 table, `parallel_level > 1` → parallel chunked single-table scan.
//! - ≥2 tables, `parallel_level == 1` → multi-table join.
//! - ≥2 tables, `parallel_level > 1` → `NotSupported`.

pub mod filter;
pub mod join;
pub mod project;
pub mod scan;
pub mod sort;

use std::collections::HashMap;

use catalog::Catalog;
use common::{Config, DbError, DbResult, Table};
use plan::LogicalPlan;

/// Execute a validated plan against `catalog`, using `config` to pick the
/// scan strategy and size the parallel path.
pub fn execute(plan: &LogicalPlan, catalog: &Catalog, config: &Config) -> DbResult<Table> {
    let mut tables: HashMap<String, Table> = HashMap::with_capacity(plan.source_tables.len());
    for name in &plan.source_tables {
        tables.insert(name.clone(), catalog.load_table(name)?);
    }

    match (plan.source_tables.len(), config.parallel_level) {
        (0, _) => Err(DbError::NotSupported("no source tables to execute".into())),
        (1, level) if level <= 1 => {
            let name = &plan.source_tables[0];
            let table = tables.remove(name).expect("just loaded");
            scan::serial_single_table(plan, name, table)
        }
        (1, _) => {
            let name = &plan.source_tables[0];
            let table = tables.remove(name).expect("just loaded");
            scan::parallel_single_table(plan, name, table, config)
        }
        (_, level) if level <= 1 => join::multi_table(plan, tables),
        _ => Err(DbError::NotSupported(
            "parallel execution is not supported for multi-table queries".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Row;
    use parquet::data_type::{ByteArray, Int64Type};
    use parquet::file::properties::WriterProperties;
    use parquet::file::writer::SerializedFileWriter;
    use parquet::schema::parser::parse_message_type;
    use std::fs::File;
    use std::sync::Arc;
    use tempfile::tempdir;
    use types::Value;

    /// Writes `(id: INT64, name: BYTE_ARRAY, age: INT64)` rows as a parquet
    /// fixture, matching the `emp` seed table from §8.
    fn write_emp_fixture(path: &std::path::Path) {
        let message_type = "
            message schema {
                REQUIRED INT64 id;
                REQUIRED BYTE_ARRAY name (UTF8);
                REQUIRED INT64 age;
            }
        ";
        let schema = Arc::new(parse_message_type(message_type).unwrap());
        let props = Arc::new(WriterProperties::builder().build());
        let file = File::create(path).unwrap();
        let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();
        let mut row_group = writer.next_row_group().unwrap();

        let mut col = row_group.next_column().unwrap().unwrap();
        col.typed::<Int64Type>().write_batch(&[1, 2, 3], None, None).unwrap();
        col.close().unwrap();

        let mut col = row_group.next_column().unwrap().unwrap();
        let names: Vec<ByteArray> = ["Alice", "Bob", "Charlie"].iter().map(|s| ByteArray::from(*s)).collect();
        col.typed::<parquet::data_type::ByteArrayType>()
            .write_batch(&names, None, None)
            .unwrap();
        col.close().unwrap();

        let mut col = row_group.next_column().unwrap().unwrap();
        col.typed::<Int64Type>().write_batch(&[25, 30, 35], None, None).unwrap();
        col.close().unwrap();

        row_group.close().unwrap();
        writer.close().unwrap();
    }

    fn parse_and_validate(sql: &str, catalog: &Catalog) -> LogicalPlan {
        let mut plan = parser::parse(sql).unwrap();
        validator::validate(&mut plan, catalog).unwrap();
        plan
    }

    #[test]
    fn s1_age_filter_returns_matching_names() {
        let dir = tempdir().unwrap();
        write_emp_fixture(&dir.path().join("emp.parquet"));
        let catalog = Catalog::new(dir.path());
        let config = Config::default();

        let plan = parse_and_validate("SELECT name FROM emp WHERE age > 28", &catalog);
        let result = execute(&plan, &catalog, &config).unwrap();

        assert_eq!(result.columns, vec!["name"]);
        let names: Vec<&str> = result
            .rows
            .iter()
            .map(|r| match &r.0[0] {
                Value::Str(s) => s.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Bob"));
        assert!(names.contains(&"Charlie"));
    }

    #[test]
    fn s3_order_by_age_desc() {
        let dir = tempdir().unwrap();
        write_emp_fixture(&dir.path().join("emp.parquet"));
        let catalog = Catalog::new(dir.path());
        let config = Config::default();

        let plan = parse_and_validate("SELECT name, age FROM emp ORDER BY age DESC", &catalog);
        let result = execute(&plan, &catalog, &config).unwrap();

        let ages: Vec<i64> = result
            .rows
            .iter()
            .map(|r| match &r.0[1] {
                Value::Int(i) => *i,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ages, vec![35, 30, 25]);
    }

    #[test]
    fn s6_ordered_compare_against_string_literal_is_type_error() {
        let dir = tempdir().unwrap();
        write_emp_fixture(&dir.path().join("emp.parquet"));
        let catalog = Catalog::new(dir.path());
        let config = Config::default();

        let plan = parse_and_validate("SELECT name FROM emp WHERE age > '30'", &catalog);
        let err = execute(&plan, &catalog, &config).unwrap_err();
        assert!(matches!(err, DbError::TypeError(_)));
    }

    #[test]
    fn empty_filter_result_is_empty_table_not_an_error() {
        let dir = tempdir().unwrap();
        write_emp_fixture(&dir.path().join("emp.parquet"));
        let catalog = Catalog::new(dir.path());
        let config = Config::default();

        let plan = parse_and_validate("SELECT name FROM emp WHERE age > 1000", &catalog);
        let result = execute(&plan, &catalog, &config).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.columns, vec!["name"]);
    }

    #[test]
    fn multi_table_parallel_is_not_supported() {
        let dir = tempdir().unwrap();
        write_emp_fixture(&dir.path().join("emp.parquet"));
        write_emp_fixture(&dir.path().join("dept.parquet"));
        let catalog = Catalog::new(dir.path());
        let config = Config::builder().parallel_level(2).build();

        let plan = parse_and_validate("SELECT emp.name FROM emp, dept", &catalog);
        let err = execute(&plan, &catalog, &config).unwrap_err();
        assert!(matches!(err, DbError::NotSupported(_)));
    }

    #[test]
    fn row_builds_from_vec() {
        let row: Row = vec![Value::Int(1)].into();
        assert_eq!(row.get(0), Some(&Value::Int(1)));
    }
}
