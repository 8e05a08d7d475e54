//! Sample-data generator: writes `<table>.parquet` files the engine reads.
//!
//! Two modes, grounded in `original_source/data_loader.py` (the `seed`
//! command, a fixed three-row `emp`/`dept` pair) and
//! `original_source/tests/setup_test_data.py` (the `bulk` command, a
//! configurable random row count for load/parallelism testing).

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parquet::data_type::{ByteArray, ByteArrayType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Parser, Debug)]
#[command(name = "gendata", about = "Generate sample .parquet table data")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory to write `<table>.parquet` files into
    #[arg(long, default_value = DEFAULT_DATA_DIR, global = true)]
    data_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the fixed three-row `emp`/`dept` seed tables used by §8's
    /// worked scenarios.
    Seed,
    /// Write randomly generated `emp`/`dept` tables of the requested size.
    Bulk {
        #[arg(long, default_value_t = 10_000)]
        n_emp: usize,
        #[arg(long, default_value_t = 10_000)]
        n_dept: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("failed to create data directory {}", args.data_dir.display()))?;

    match args.command {
        Command::Seed => write_seed(&args.data_dir),
        Command::Bulk { n_emp, n_dept } => write_bulk(&args.data_dir, n_emp, n_dept),
    }
}

fn write_seed(data_dir: &Path) -> Result<()> {
    write_three_column_table(
        &data_dir.join("emp.parquet"),
        "name",
        "age",
        &[(1, "Alice", 25), (2, "Bob", 30), (3, "Charlie", 35)],
    )?;
    println!("wrote {}", data_dir.join("emp.parquet").display());

    write_three_column_table(
        &data_dir.join("dept.parquet"),
        "mgr",
        "sal",
        &[(4, "Delta", 100), (5, "Earl", 200), (6, "Fiona", 300)],
    )?;
    println!("wrote {}", data_dir.join("dept.parquet").display());

    Ok(())
}

fn write_bulk(data_dir: &Path, n_emp: usize, n_dept: usize) -> Result<()> {
    let mut rng = thread_rng();

    let emp_rows: Vec<(i64, String, i64)> = (1..=n_emp as i64)
        .map(|id| (id, random_name(&mut rng), rng.gen_range(20..=60)))
        .collect();
    let emp_path = data_dir.join("emp.parquet");
    write_three_column_table(&emp_path, "name", "age", &owned_refs(&emp_rows))?;
    println!("wrote {} ({n_emp} rows)", emp_path.display());

    let dept_rows: Vec<(i64, String, i64)> = (1..=n_dept as i64)
        .map(|id| (id, random_name(&mut rng), rng.gen_range(50_000..=200_000)))
        .collect();
    let dept_path = data_dir.join("dept.parquet");
    write_three_column_table(&dept_path, "mgr", "sal", &owned_refs(&dept_rows))?;
    println!("wrote {} ({n_dept} rows)", dept_path.display());

    Ok(())
}

fn owned_refs(rows: &[(i64, String, i64)]) -> Vec<(i64, &str, i64)> {
    rows.iter().map(|(id, name, n)| (*id, name.as_str(), *n)).collect()
}

fn random_name(rng: &mut impl Rng) -> String {
    let mut name: String = rng.sample_iter(&Alphanumeric).take(6).map(char::from).collect();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    name
}

/// Writes `(id: INT64, <str_col>: BYTE_ARRAY UTF8, <num_col>: INT64)` rows
/// as a single-row-group parquet file.
fn write_three_column_table(
    path: &Path,
    str_col: &str,
    num_col: &str,
    rows: &[(i64, &str, i64)],
) -> Result<()> {
    let message_type = format!(
        "message schema {{ REQUIRED INT64 id; REQUIRED BYTE_ARRAY {str_col} (UTF8); REQUIRED INT64 {num_col}; }}"
    );
    let schema = Arc::new(parse_message_type(&message_type)?);
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = SerializedFileWriter::new(file, schema, props)?;
    let mut row_group = writer.next_row_group()?;

    let ids: Vec<i64> = rows.iter().map(|(id, _, _)| *id).collect();
    let mut col = row_group.next_column()?.expect("id column");
    col.typed::<Int64Type>().write_batch(&ids, None, None)?;
    col.close()?;

    let names: Vec<ByteArray> = rows.iter().map(|(_, name, _)| ByteArray::from(*name)).collect();
    let mut col = row_group.next_column()?.expect("str column");
    col.typed::<ByteArrayType>().write_batch(&names, None, None)?;
    col.close()?;

    let nums: Vec<i64> = rows.iter().map(|(_, _, n)| *n).collect();
    let mut col = row_group.next_column()?.expect("num column");
    col.typed::<Int64Type>().write_batch(&nums, None, None)?;
    col.close()?;

    row_group.close()?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_seed_produces_readable_catalog_entries() {
        let dir = tempdir().unwrap();
        write_seed(dir.path()).unwrap();

        let catalog = catalog_for_test(dir.path());
        let emp = catalog.load_table("emp").unwrap();
        assert_eq!(emp.rows.len(), 3);
        assert_eq!(emp.columns, vec!["id", "name", "age"]);
    }

    #[test]
    fn write_bulk_respects_requested_row_counts() {
        let dir = tempdir().unwrap();
        write_bulk(dir.path(), 25, 10).unwrap();

        let catalog = catalog_for_test(dir.path());
        assert_eq!(catalog.load_table("emp").unwrap().rows.len(), 25);
        assert_eq!(catalog.load_table("dept").unwrap().rows.len(), 10);
    }

    fn catalog_for_test(dir: &Path) -> catalog::Catalog {
        catalog::Catalog::new(dir)
    }
}
