use std::cmp::Ordering;

/// The declared type of a schema column, as read from a table's catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SqlType {
    Int,
    Float,
    Str,
}

/// A dynamically typed cell value: the result of reading a row, or of
/// coercing a literal token from a WHERE clause.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Coerce a raw literal token (as it appears in a predicate) to a `Value`.
    ///
    /// Surrounding `'`/`"` are stripped first. A token containing `.` that
    /// parses as `f64` becomes `Float`; else a token parsing as `i64` becomes
    /// `Int`; otherwise it is kept as `Str`.
    pub fn coerce_literal(token: &str) -> Value {
        let stripped = strip_quotes(token);

        if stripped.contains('.') {
            if let Ok(f) = stripped.parse::<f64>() {
                return Value::Float(f);
            }
        }

        if let Ok(i) = stripped.parse::<i64>() {
            return Value::Int(i);
        }

        Value::Str(stripped.to_string())
    }

    pub fn sql_type(&self) -> SqlType {
        match self {
            Value::Int(_) => SqlType::Int,
            Value::Float(_) => SqlType::Float,
            Value::Str(_) => SqlType::Str,
        }
    }

    /// Comparison between two values of the same dynamic type. `None` if the
    /// types differ — callers decide whether that is a `TypeError` or simply
    /// unordered.
    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Case-insensitive equality for strings, exact equality otherwise.
    pub fn eq_same_type(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a == b),
            (Value::Float(a), Value::Float(b)) => Some(a == b),
            (Value::Str(a), Value::Str(b)) => Some(a.eq_ignore_ascii_case(b)),
            _ => None,
        }
    }
}

fn strip_quotes(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            return &token[1..token.len() - 1];
        }
    }
    token
}
