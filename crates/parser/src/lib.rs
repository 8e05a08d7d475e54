//! Lexes and pattern-matches the accepted query skeleton
//! `SELECT … FROM … [WHERE …] [ORDER BY … [ASC|DESC]]`, emitting an
//! unvalidated `plan::LogicalPlan`. No grammar library is used: the accepted
//! grammar is a narrow, position-based subset (raw-text WHERE deferred to
//! the validator, comma lists built by joining whitespace-split tokens) that
//! a general-purpose SQL parser would not reproduce.


use common::{DbError, DbResult};
use plan::{LogicalPlan, OrderByColumn, OrderDir};

/// Parse a single SQL statement into an unvalidated logical plan.
pub fn parse(sql: &str) -> DbResult<LogicalPlan> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(DbError::ParseError("empty query".into()));
    }

    let mut text = trimmed.to_string();
    if text.ends_with(';') {
        text.pop();
    }

    let upper = text.to_uppercase();
    let tokens: Vec<&str> = upper.split_whitespace().collect();

    if tokens.is_empty() || tokens[0] != "SELECT" {
        return Err(DbError::ParseError("statement must start with SELECT".into()));
    }

    let from_idx = tokens
        .iter()
        .position(|&t| t == "FROM")
        .ok_or_else(|| DbError::ParseError("missing FROM clause".into()))?;

    let where_idx = tokens.iter().position(|&t| t == "WHERE");
    let order_idx = tokens.iter().position(|&t| t == "ORDER");

    if let Some(oi) = order_idx {
        if tokens.get(oi + 1) != Some(&"BY") {
            return Err(DbError::ParseError("ORDER not followed by BY".into()));
        }
    }

    let mut plan = LogicalPlan::new();

    parse_projections(&tokens[1..from_idx], &mut plan)?;

    let from_end = where_idx.or(order_idx).unwrap_or(tokens.len());
    plan.source_tables = parse_source_tables(&tokens[from_idx + 1..from_end])?;

    if let Some(wi) = where_idx {
        let where_end = order_idx.unwrap_or(tokens.len());
        if wi + 1 < where_end {
            plan.raw_filter = Some(tokens[wi + 1..where_end].join(" ").to_lowercase());
        }
    }

    if let Some(oi) = order_idx {
        parse_order_by(&tokens, oi, &mut plan);
    }

    Ok(plan)
}

/// `SELECT` list: tokens joined without spaces, then split on `,`. `T.C`
/// attributes `C` to table `T`; a bare `C` (including `*`) lands in the
/// unresolved bucket.
fn parse_projections(tokens: &[&str], plan: &mut LogicalPlan) -> DbResult<()> {
    let items = join_and_split(tokens);
    if items.is_empty() {
        return Err(DbError::ParseError("empty projection list".into()));
    }

    for item in items {
        let lowered = item.to_lowercase();
        if lowered == "*" {
            plan.select_all = true;
            plan.push_unresolved(lowered);
            continue;
        }
        match lowered.split_once('.') {
            Some((table, column)) => plan.push_projection(table.to_string(), column.to_string()),
            None => plan.push_unresolved(lowered),
        }
    }

    Ok(())
}

/// `FROM` list: tokens joined without spaces, then split on `,`, lowercased.
fn parse_source_tables(tokens: &[&str]) -> DbResult<Vec<String>> {
    let items = join_and_split(tokens);
    if items.is_empty() {
        return Err(DbError::ParseError("empty source table list".into()));
    }
    Ok(items.into_iter().map(|t| t.to_lowercase()).collect())
}

/// `ORDER BY` column list and optional direction. The direction token is
/// looked up only in the region after the column list — restricting the
/// search to that region (rather than the whole statement) avoids
/// mismatching a same-named token elsewhere in the query.
fn parse_order_by(tokens: &[&str], order_idx: usize, plan: &mut LogicalPlan) {
    let col_start = order_idx + 2;
    let dir_idx = tokens[col_start..]
        .iter()
        .position(|&t| t == "ASC" || t == "DESC")
        .map(|p| p + col_start);
    let col_end = dir_idx.unwrap_or(tokens.len());

    let order_str = tokens[col_start..col_end].join(" ").to_lowercase();
    for col in order_str.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        match col.split_once('.') {
            Some((table, column)) => plan.order_by.push(OrderByColumn {
                table: Some(table.to_string()),
                column: column.to_string(),
            }),
            None => plan.order_by.push(OrderByColumn {
                table: None,
                column: col.to_string(),
            }),
        }
    }

    plan.order_dir = Some(match dir_idx {
        Some(idx) if tokens[idx] == "DESC" => OrderDir::Desc,
        _ => OrderDir::Asc,
    });
}

/// Join tokens with no separator, then split the result on `,`, trimming
/// and dropping empty items.
fn join_and_split(tokens: &[&str]) -> Vec<String> {
    tokens
        .concat()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
