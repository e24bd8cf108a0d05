use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::time::Instant;
use tracing::{info, warn};

use crate::grouping::group_by_domain;
use crate::query;
use crate::session::{SearchResponse, SearchSession};
use crate::sqlite::{self, DeleteSummary};
use crate::stats::{ResultStats, SearchOutcome};
use crate::{patterns, Args};

/// Run one complete search: snapshot the history database, fetch matching
/// records through a session ticket, group them by domain, and collect
/// result statistics.
pub fn search_browser_history(args: &Args) -> Result<SearchOutcome> {
    let total_start = Instant::now();
    info!(action = "start", component = "search", browser = %args.browser, "Starting history search");

    configure_worker_pool(args.workers);

    let today = chrono::Local::now().date_naive();
    let (history_query, row_date) = query::build_query(args, today)?;

    let history_path = sqlite::history_db_path(&args.browser)?;
    let temp_history_path = sqlite::copy_history_database(&history_path, args.temp_path.as_deref())?;

    let domain_patterns = if args.no_patterns {
        Vec::new()
    } else {
        patterns::load_domain_patterns(args.patterns.as_deref())?
    };

    let conn = Connection::open(&temp_history_path)
        .with_context(|| format!("Failed to open history copy at {:?}", temp_history_path))?;
    info!(action = "connect", component = "search", "Connected to database");

    let mut session = SearchSession::new();
    let ticket = session.begin();
    let response = SearchResponse::new(ticket, sqlite::search_history(&conn, &history_query)?);

    drop(conn);
    if let Err(e) = fs::remove_file(&temp_history_path) {
        warn!(action = "cleanup", component = "search", error = %e, "Failed to remove temporary file");
    }

    let records = session
        .accept(response)
        .context("Search superseded by a newer query")?;

    let total_results = records.len();
    let stats = ResultStats::collect(&records, &domain_patterns);
    let groups = group_by_domain(records, history_query.end_time);

    info!(
        action = "complete",
        component = "search",
        result_count = total_results,
        group_count = groups.len(),
        duration_ms = total_start.elapsed().as_millis(),
        "History search completed"
    );

    Ok(SearchOutcome {
        query: history_query,
        groups,
        stats,
        total_results,
        row_date,
    })
}

/// Delete history from the live database. No snapshot here: the whole point
/// is to mutate the real file, so the browser must be closed.
pub fn delete_browser_history(args: &Args) -> Result<DeleteSummary> {
    let history_path = sqlite::history_db_path(&args.browser)?;
    let conn = Connection::open(&history_path).with_context(|| {
        format!(
            "Failed to open history database at {:?} (is the browser closed?)",
            history_path
        )
    })?;

    let summary = if args.delete_all {
        sqlite::delete_all(&conn)?
    } else {
        let today = chrono::Local::now().date_naive();
        let (history_query, _) = query::build_query(args, today)?;
        let start = history_query
            .start_time
            .context("--delete-range requires a bounded range")?;
        let end = history_query
            .end_time
            .context("--delete-range requires a bounded range")?;
        sqlite::delete_range(&conn, start, end)?
    };

    Ok(summary)
}

fn configure_worker_pool(workers: Option<usize>) {
    let threads = workers.unwrap_or_else(|| std::cmp::min(num_cpus::get(), 8));
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!(action = "configure", component = "worker_pool", error = %e, "Worker pool already initialized");
    } else {
        info!(
            action = "configure",
            component = "worker_pool",
            worker_count = threads,
            "Using worker threads"
        );
    }
}
