use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

use crate::query::RangeChoice;

#[derive(Parser, Debug)]
#[command(
    name = "historyplus",
    about = "Search browser history and group visits by domain",
    version,
    long_about = None
)]
pub struct Args {
    /// Keyword filter matched against page titles and URLs
    pub text: Option<String>,

    /// Browser whose history database to read
    #[arg(short, long, default_value = "Chrome")]
    pub browser: String,

    /// Date range to search
    #[arg(short, long, value_enum, default_value_t = RangeChoice::All)]
    pub range: RangeChoice,

    /// Custom range start day (YYYY-MM-DD); defaults to --to
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Custom range end day (YYYY-MM-DD); defaults to today
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Maximum number of history entries to fetch
    #[arg(short = 'n', long, default_value_t = 100)]
    pub max_results: usize,

    /// List the individual visits inside multi-page groups
    #[arg(short, long)]
    pub expand: bool,

    /// Emit the grouped results as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of top domains to list after the results
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Redact domain names for privacy
    #[arg(long)]
    pub redact: bool,

    /// Path to custom domain pattern file
    #[arg(short, long)]
    pub patterns: Option<PathBuf>,

    /// Disable pattern-based domain normalization
    #[arg(long)]
    pub no_patterns: bool,

    /// Custom temporary file path for the database copy
    #[arg(long)]
    pub temp_path: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Delete the browser's entire history (the browser must be closed)
    #[arg(long)]
    pub delete_all: bool,

    /// Delete history inside the selected date range (the browser must be closed)
    #[arg(long)]
    pub delete_range: bool,

    /// Skip the confirmation prompt for deletions
    #[arg(short, long)]
    pub yes: bool,

    /// Initialize domain_patterns.txt with default patterns
    #[arg(long)]
    pub init: bool,
}
