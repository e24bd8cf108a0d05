use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use tracing::error;

use historyplus::render::{self, RenderOptions};
use historyplus::{browser, patterns, utils, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);
    utils::validate_args(&args)?;

    if args.init {
        return patterns::init_default_patterns();
    }

    if args.delete_all || args.delete_range {
        return run_delete(&args);
    }

    match browser::search_browser_history(&args) {
        Ok(outcome) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&render::outcome_json(&outcome))?);
            } else {
                let opts = RenderOptions {
                    browser: args.browser.clone(),
                    expand: args.expand,
                    redact: args.redact,
                    top: args.top,
                };
                let mut output = String::new();
                render::render_results(&mut output, &outcome, &opts)?;
                print!("{}", output);
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "History search failed");
            std::process::exit(1);
        }
    }
}

fn run_delete(args: &Args) -> Result<()> {
    if !args.yes {
        let scope = if args.delete_all {
            "ALL history".to_string()
        } else {
            "history in the selected range".to_string()
        };
        print!("Delete {} for {}? [y/N] ", scope, args.browser);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let summary = browser::delete_browser_history(args)?;
    println!(
        "Deleted {} visits and {} pages.",
        utils::format_number(summary.visits_deleted as u32),
        utils::format_number(summary.urls_deleted as u32)
    );
    Ok(())
}
