use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::query::HistoryQuery;
use crate::record::VisitRecord;

// Chromium stores timestamps as microseconds since 1601-01-01 (the WebKit
// epoch); everything above this layer works in Unix epoch milliseconds.
const WEBKIT_EPOCH_OFFSET_US: i64 = 11_644_473_600_000_000;

pub fn webkit_to_epoch_ms(webkit_us: i64) -> i64 {
    (webkit_us - WEBKIT_EPOCH_OFFSET_US) / 1_000
}

pub fn epoch_ms_to_webkit(epoch_ms: i64) -> i64 {
    epoch_ms * 1_000 + WEBKIT_EPOCH_OFFSET_US
}

pub fn history_db_path(browser: &str) -> Result<PathBuf> {
    let system = env::consts::OS;
    let home = env::var("HOME").or_else(|_| env::var("USERPROFILE"))?;
    let home = PathBuf::from(home);

    // Chromium-family profile layouts. The macOS and Linux trees hang off
    // the home directory; Windows keeps them under LOCALAPPDATA.
    let path = match (browser.to_lowercase().as_str(), system) {
        ("chrome", "windows") => local_app_data()?.join("Google/Chrome/User Data/Default/History"),
        ("chrome", "macos") => home.join("Library/Application Support/Google/Chrome/Default/History"),
        ("chrome", "linux") => home.join(".config/google-chrome/Default/History"),
        ("chromium", "windows") => local_app_data()?.join("Chromium/User Data/Default/History"),
        ("chromium", "macos") => home.join("Library/Application Support/Chromium/Default/History"),
        ("chromium", "linux") => home.join(".config/chromium/Default/History"),
        ("brave", "windows") => {
            local_app_data()?.join("BraveSoftware/Brave-Browser/User Data/Default/History")
        }
        ("brave", "macos") => {
            home.join("Library/Application Support/BraveSoftware/Brave-Browser/Default/History")
        }
        ("brave", "linux") => home.join(".config/BraveSoftware/Brave-Browser/Default/History"),
        ("edge", "windows") => local_app_data()?.join("Microsoft/Edge/User Data/Default/History"),
        ("edge", "macos") => home.join("Library/Application Support/Microsoft Edge/Default/History"),
        ("edge", "linux") => home.join(".config/microsoft-edge/Default/History"),
        ("vivaldi", "windows") => local_app_data()?.join("Vivaldi/User Data/Default/History"),
        ("vivaldi", "macos") => home.join("Library/Application Support/Vivaldi/Default/History"),
        ("vivaldi", "linux") => home.join(".config/vivaldi/default/History"),
        _ => anyhow::bail!(
            "Unsupported browser '{}' or operating system '{}'",
            browser,
            system
        ),
    };

    info!(action = "resolve", component = "history_path", browser = browser, path = ?path, "History database path resolved");
    Ok(path)
}

fn local_app_data() -> Result<PathBuf> {
    Ok(PathBuf::from(env::var("LOCALAPPDATA")?))
}

/// Snapshot the live database; the browser holds a lock on the original
/// while it is running.
pub fn copy_history_database(history_path: &Path, temp_path: Option<&Path>) -> Result<PathBuf> {
    let start_time = Instant::now();

    let temp_path = temp_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| env::temp_dir().join("historyplus_history_copy.db"));

    info!(action = "copy", component = "database_copy", source = ?history_path, destination = ?temp_path, "Copying history database");

    if !history_path.exists() {
        anyhow::bail!("History file not found at {:?}", history_path);
    }

    fs::copy(history_path, &temp_path)
        .with_context(|| format!("Failed to copy history database to {:?}", temp_path))?;

    info!(
        action = "complete",
        component = "database_copy",
        duration_ms = start_time.elapsed().as_millis(),
        "Database copy completed"
    );
    Ok(temp_path)
}

/// Run one search against the `urls` table: optional keyword match on title
/// and URL, optional time bounds, newest first, capped at `max_results`.
pub fn search_history(conn: &Connection, query: &HistoryQuery) -> Result<Vec<VisitRecord>> {
    let start_time = Instant::now();

    let mut sql = String::from(
        "SELECT id, url, title, last_visit_time, visit_count FROM urls WHERE hidden = 0",
    );
    let mut bindings: Vec<Value> = Vec::new();

    if !query.text.is_empty() {
        sql.push_str(" AND (url LIKE '%' || ? || '%' OR title LIKE '%' || ? || '%')");
        bindings.push(Value::Text(query.text.clone()));
        bindings.push(Value::Text(query.text.clone()));
    }
    if let Some(start_ms) = query.start_time {
        sql.push_str(" AND last_visit_time >= ?");
        bindings.push(Value::Integer(epoch_ms_to_webkit(start_ms)));
    }
    if let Some(end_ms) = query.end_time {
        sql.push_str(" AND last_visit_time < ?");
        bindings.push(Value::Integer(epoch_ms_to_webkit(end_ms)));
    }
    sql.push_str(" ORDER BY last_visit_time DESC LIMIT ?");
    bindings.push(Value::Integer(query.max_results as i64));

    let mut stmt = conn.prepare(&sql).context("Failed to prepare history query")?;
    let records = stmt
        .query_map(rusqlite::params_from_iter(bindings), |row| {
            Ok(VisitRecord::new(
                row.get::<_, i64>(0)?.to_string(),
                row.get(1)?,
                row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                webkit_to_epoch_ms(row.get(3)?),
                row.get::<_, i64>(4)?.max(1) as u32,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read history rows")?;

    info!(
        action = "complete",
        component = "history_search",
        result_count = records.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "History query completed"
    );
    Ok(records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSummary {
    pub visits_deleted: usize,
    pub urls_deleted: usize,
}

pub fn delete_all(conn: &Connection) -> Result<DeleteSummary> {
    let visits_deleted = conn
        .execute("DELETE FROM visits", [])
        .context("Failed to delete visits")?;
    let urls_deleted = conn
        .execute("DELETE FROM urls", [])
        .context("Failed to delete urls")?;

    info!(
        action = "complete",
        component = "history_delete",
        visits_deleted,
        urls_deleted,
        "Deleted all history"
    );
    Ok(DeleteSummary {
        visits_deleted,
        urls_deleted,
    })
}

/// Delete visits inside `[start_ms, end_ms)`, then drop URL rows left with
/// no visits at all.
pub fn delete_range(conn: &Connection, start_ms: i64, end_ms: i64) -> Result<DeleteSummary> {
    let visits_deleted = conn
        .execute(
            "DELETE FROM visits WHERE visit_time >= ?1 AND visit_time < ?2",
            params![epoch_ms_to_webkit(start_ms), epoch_ms_to_webkit(end_ms)],
        )
        .context("Failed to delete visits in range")?;
    let urls_deleted = conn
        .execute(
            "DELETE FROM urls WHERE id NOT IN (SELECT url FROM visits)",
            [],
        )
        .context("Failed to delete orphaned urls")?;

    info!(
        action = "complete",
        component = "history_delete",
        start_ms,
        end_ms,
        visits_deleted,
        urls_deleted,
        "Deleted history range"
    );
    if visits_deleted == 0 {
        warn!(
            action = "complete",
            component = "history_delete",
            "No visits matched the requested range"
        );
    }
    Ok(DeleteSummary {
        visits_deleted,
        urls_deleted,
    })
}
