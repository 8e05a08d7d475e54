//! Table Catalog: reads a table's schema and body from
//! `<data_dir>/<table>.parquet`. Read-only; the generator utility is the
//! only writer of these files.

use std::{collections::HashSet, fs::File, path::PathBuf};

use common::{DbError, DbResult, Row, Table};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use types::{SqlType, Value};

/// Read-only view over a data directory of `.parquet` tables.
#[derive(Clone, Debug)]
pub struct Catalog {
    data_dir: PathBuf,
}

impl Catalog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.parquet", table.to_lowercase()))
    }

    /// Whether `<data_dir>/<table>.parquet` exists.
    pub fn exists(&self, table: &str) -> bool {
        self.table_path(table).is_file()
    }

    /// `(lowercased_name_set, full_schema)` for a table, per §4.4.
    pub fn schema(&self, table: &str) -> DbResult<(HashSet<String>, Vec<(String, SqlType)>)> {
        let reader = self.open(table)?;
        let schema_descr = reader.metadata().file_metadata().schema_descr();

        let mut columns = Vec::with_capacity(schema_descr.num_columns());
        for i in 0..schema_descr.num_columns() {
            let col = schema_descr.column(i);
            let name = col.name().to_lowercase();
            let ty = map_physical_type(col.physical_type()).ok_or_else(|| {
                DbError::SchemaReadError(
                    table.to_string(),
                    format!("unsupported physical type for column '{name}'"),
                )
            })?;
            columns.push((name, ty));
        }

        if columns.is_empty() {
            return Err(DbError::SchemaReadError(
                table.to_string(),
                "schema has no columns".into(),
            ));
        }

        let names = columns.iter().map(|(n, _)| n.clone()).collect();
        Ok((names, columns))
    }

    /// Read a table fully into memory: the "read table into an in-memory
    /// table" primitive the executor builds on.
    pub fn load_table(&self, table: &str) -> DbResult<Table> {
        let (_, schema) = self.schema(table)?;
        let columns: Vec<String> = schema.iter().map(|(n, _)| n.clone()).collect();

        let reader = self.open(table)?;
        let row_iter = reader
            .get_row_iter(None)
            .map_err(|e| DbError::SchemaReadError(table.to_string(), e.to_string()))?;

        let mut rows = Vec::new();
        for row in row_iter {
            let row = row.map_err(|e| DbError::SchemaReadError(table.to_string(), e.to_string()))?;
            let mut values = Vec::with_capacity(columns.len());
            for (_, field) in row.get_column_iter() {
                values.push(field_to_value(table, field)?);
            }
            rows.push(Row::new(values));
        }

        Ok(Table::new(columns, rows))
    }

    fn open(&self, table: &str) -> DbResult<SerializedFileReader<File>> {
        let path = self.table_path(table);
        let file = File::open(&path).map_err(|_| DbError::TableNotFound(table.to_string()))?;
        SerializedFileReader::new(file)
            .map_err(|e| DbError::SchemaReadError(table.to_string(), e.to_string()))
    }
}

fn map_physical_type(ty: parquet::basic::Type) -> Option<SqlType> {
    use parquet::basic::Type::*;
    match ty {
        INT32 | INT64 => Some(SqlType::Int),
        FLOAT | DOUBLE => Some(SqlType::Float),
        BYTE_ARRAY | FIXED_LEN_BYTE_ARRAY => Some(SqlType::Str),
        BOOLEAN | INT96 => None,
    }
}

fn field_to_value(table: &str, field: &Field) -> DbResult<Value> {
    match field {
        Field::Byte(v) => Ok(Value::Int(*v as i64)),
        Field::Short(v) => Ok(Value::Int(*v as i64)),
        Field::Int(v) => Ok(Value::Int(*v as i64)),
        Field::Long(v) => Ok(Value::Int(*v)),
        Field::UByte(v) => Ok(Value::Int(*v as i64)),
        Field::UShort(v) => Ok(Value::Int(*v as i64)),
        Field::UInt(v) => Ok(Value::Int(*v as i64)),
        Field::ULong(v) => Ok(Value::Int(*v as i64)),
        Field::Float(v) => Ok(Value::Float(*v as f64)),
        Field::Double(v) => Ok(Value::Float(*v)),
        Field::Str(s) => Ok(Value::Str(s.clone())),
        other => Err(DbError::SchemaReadError(
            table.to_string(),
            format!("unsupported field value: {other:?}"),
        )),
    }
}
