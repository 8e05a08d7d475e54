//! Interactive prompt driver (§6 "Interactive surface"): reads query lines,
//! dispatches session commands ahead of SQL, and runs everything else
//! through parse → validate → cache lookup → execute → cache write.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use bincode::config;
use cache::{ResultCache, cache_key};
use catalog::Catalog;
use clap::Parser;
use common::pretty::{self, TableStyleKind};
use common::{Config, DbError, Table};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

#[derive(Parser, Debug)]
#[command(name = "sqlrepl", about = "Interactive SQL prompt over parquet tables")]
struct Args {
    /// Directory containing `<table>.parquet` files
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Worker count for the parallel single-table scan
    #[arg(long, default_value_t = 1)]
    parallel_level: usize,

    /// Upper bound on a single chunk's row count in the parallel scan
    #[arg(long, default_value_t = 50_000)]
    max_chunk_size: usize,

    /// Target chunks per worker when sizing the parallel scan
    #[arg(long, default_value_t = 10)]
    num_chunks_per_worker: usize,

    /// Result cache entry time-to-live, in seconds
    #[arg(long, default_value_t = 3600)]
    cache_expiry_secs: u64,
}

/// Session-level knobs a user can flip from the prompt; independent of the
/// immutable process `Config`.
struct Session {
    catalog: Catalog,
    config: Config,
    cache: ResultCache,
    trace_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = Config::builder()
        .data_dir(args.data_dir)
        .parallel_level(args.parallel_level)
        .max_chunk_size(args.max_chunk_size)
        .num_chunks_per_worker(args.num_chunks_per_worker)
        .cache_expiry_secs(args.cache_expiry_secs)
        .build();

    if !config.data_dir.is_dir() {
        eprintln!(
            "fatal: data directory {} does not exist",
            config.data_dir.display()
        );
        return ExitCode::FAILURE;
    }

    let mut session = Session {
        catalog: Catalog::new(config.data_dir.clone()),
        cache: ResultCache::new(config.cache_expiry_secs),
        config,
        trace_level: None,
    };

    match interactive_loop(&mut session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fatal: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Run the read-eval-print loop until `exit`/`quit`, ^C, or ^D.
fn interactive_loop(session: &mut Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!();
    println!("Type SQL statements, 'exit'/'quit' to leave, or a session command:");
    println!("  SET TRACE LEVEL {{DEBUG|INFO|WARN|WARNING|ERROR}} | SET TRACE OFF | SET CACHE CLEAR | DESC <table>");
    println!();

    loop {
        let readline = rl.readline("sql> ");

        let should_continue = match readline {
            Ok(line) => {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                process_line(session, &line)
            }
            Err(e) => handle_readline_error(e),
        };

        if !should_continue {
            break;
        }
    }

    Ok(())
}

fn handle_readline_error(error: ReadlineError) -> bool {
    match error {
        ReadlineError::Interrupted => {
            println!("^C");
            false
        }
        ReadlineError::Eof => {
            println!("^D");
            false
        }
        err => {
            eprintln!("error: {err:?}");
            false
        }
    }
}

/// Returns `true` to keep looping, `false` to end the session.
fn process_line(session: &mut Session, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }

    let lower = line.to_lowercase();
    if lower == "exit" || lower == "quit" {
        return false;
    }

    if let Some(rest) = strip_keyword(&lower, "desc") {
        handle_desc(session, rest.trim());
        return true;
    }

    if let Some(command) = parse_session_command(&lower) {
        apply_session_command(session, command);
        return true;
    }

    run_query(session, line);
    true
}

fn strip_keyword<'a>(lower: &'a str, keyword: &str) -> Option<&'a str> {
    lower.strip_prefix(keyword)
}

enum SessionCommand {
    TraceLevel(String),
    TraceOff,
    CacheClear,
}

/// Recognizes `SET TRACE LEVEL <level>`, `SET TRACE OFF`, `SET CACHE CLEAR`
/// against the already-lowercased line. Anything else is not a session
/// command and falls through to SQL dispatch.
fn parse_session_command(lower: &str) -> Option<SessionCommand> {
    let rest = lower.strip_prefix("set")?.trim_start();

    if let Some(rest) = rest.strip_prefix("trace") {
        let rest = rest.trim();
        if rest == "off" {
            return Some(SessionCommand::TraceOff);
        }
        let level = rest.strip_prefix("level")?.trim();
        let level = level.to_uppercase();
        if matches!(level.as_str(), "DEBUG" | "INFO" | "WARN" | "WARNING" | "ERROR") {
            return Some(SessionCommand::TraceLevel(level));
        }
        return None;
    }

    if let Some(rest) = rest.strip_prefix("cache") {
        if rest.trim() == "clear" {
            return Some(SessionCommand::CacheClear);
        }
    }

    None
}

fn apply_session_command(session: &mut Session, command: SessionCommand) {
    match command {
        SessionCommand::TraceLevel(level) => {
            println!("trace level set to {level}");
            session.trace_level = Some(level);
        }
        SessionCommand::TraceOff => {
            println!("trace off");
            session.trace_level = None;
        }
        SessionCommand::CacheClear => {
            session.cache.flush_all();
            println!("cache cleared");
        }
    }
}

fn handle_desc(session: &Session, table: &str) {
    if table.is_empty() {
        eprintln!("error: DESC requires a table name");
        return;
    }

    match session.catalog.schema(table) {
        Ok((_, columns)) => {
            let rows: Vec<Vec<String>> = columns
                .into_iter()
                .map(|(name, ty)| vec![name, format!("{ty:?}")])
                .collect();
            let rendered = pretty::render_string_table(&["column", "type"], rows, TableStyleKind::Modern);
            println!("{rendered}");
        }
        Err(err) => eprintln!("error: {err}"),
    }
}

fn run_query(session: &Session, sql: &str) {
    let key = cache_key(sql);

    if let Some(bytes) = session.cache.get(&key) {
        match bincode::serde::decode_from_slice::<Table, _>(&bytes, config::standard()) {
            Ok((table, _)) => {
                print_table(&table);
                return;
            }
            // A corrupt or stale cache payload falls through to execution
            // rather than surfacing to the user; the cache is advisory.
            Err(_) => session.cache.delete(&key),
        }
    }

    match execute_fresh(session, sql) {
        Ok(table) => {
            if let Ok(bytes) = bincode::serde::encode_to_vec(&table, config::standard()) {
                session.cache.put(key, bytes, session.config.cache_expiry_secs);
            }
            print_table(&table);
        }
        Err(err) => eprintln!("error: {err}"),
    }
}

fn execute_fresh(session: &Session, sql: &str) -> Result<Table, DbError> {
    let mut plan = parser::parse(sql)?;
    validator::validate(&mut plan, &session.catalog)?;
    executor::execute(&plan, &session.catalog, &session.config)
}

fn print_table(table: &Table) {
    println!("{}", pretty::render_table(table, TableStyleKind::Modern));
    println!("({} row(s))", table.rows.len());
}
