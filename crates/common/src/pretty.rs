use crate::Table;
use tabled::{builder::Builder, settings, Table as TabledTable};
use types::Value;

/// Predefined output styles that map to `tabled` styles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableStyleKind {
    #[default]
    Modern,
    Ascii,
    Plain,
}

impl TableStyleKind {
    fn apply(self, table: &mut TabledTable) {
        match self {
            Self::Modern => table.with(settings::Style::modern()),
            Self::Ascii => table.with(settings::Style::ascii()),
            Self::Plain => table.with(settings::Style::empty()),
        };
    }
}

/// Render a query result table into a human-friendly string.
pub fn render_table(table: &Table, style: TableStyleKind) -> String {
    if table.columns.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();
    builder.push_record(table.columns.iter().cloned());

    for row in &table.rows {
        builder.push_record(row.0.iter().map(format_value));
    }

    let mut rendered = builder.build();
    style.apply(&mut rendered);
    rendered.to_string()
}

/// Render arbitrary string rows with the provided style, used by `DESC`.
pub fn render_string_table(
    headers: &[&str],
    rows: Vec<Vec<String>>,
    style: TableStyleKind,
) -> String {
    if headers.is_empty() && rows.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();

    if !headers.is_empty() {
        builder.push_record(headers.iter().copied());
    }

    for row in rows {
        builder.push_record(row);
    }

    let mut rendered = builder.build();
    style.apply(&mut rendered);
    rendered.to_string()
}

/// Format a full row into a comma-separated string.
pub fn format_row(values: &[Value]) -> String {
    values.iter().map(format_value).collect::<Vec<_>>().join(", ")
}

/// Format a single value for display.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => format!("'{}'", s),
    }
}
