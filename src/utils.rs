use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::query::RangeChoice;

pub fn setup_logging(verbose: bool) {
    let default_directive = if verbose { "info" } else { "error" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let timer = tracing_subscriber::fmt::time::LocalTime::new(time::macros::format_description!(
        "[hour]:[minute]:[second]"
    ));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(false)
        .init();
}

pub fn format_number(num: u32) -> String {
    num.to_string()
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn redact_domain(domain: &str) -> String {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() <= 1 {
        return domain.to_string();
    }

    if parts.len() >= 2 && parts[parts.len() - 2].len() <= 3 {
        return format!("???.{}", parts[parts.len() - 1]);
    }

    let redacted_parts: Vec<String> = parts[..parts.len() - 1]
        .iter()
        .map(|part| "*".repeat(part.len()))
        .collect();

    let mut result = redacted_parts.join(".");
    result.push('.');
    result.push_str(parts[parts.len() - 1]);
    result
}

pub fn validate_args(args: &crate::args::Args) -> Result<()> {
    if args.max_results == 0 {
        anyhow::bail!("--max-results must be greater than 0");
    }

    if let Some(top) = args.top {
        if top == 0 {
            anyhow::bail!("--top must be greater than 0");
        }
    }

    if let Some(workers) = args.workers {
        if workers == 0 {
            anyhow::bail!("--workers must be greater than 0");
        }
    }

    if let (Some(from), Some(to)) = (args.from, args.to) {
        if from > to {
            anyhow::bail!("--from must not be later than --to");
        }
    }

    if args.delete_all && args.delete_range {
        anyhow::bail!("--delete-all and --delete-range are mutually exclusive");
    }

    if args.delete_range
        && args.range == RangeChoice::All
        && args.from.is_none()
        && args.to.is_none()
    {
        anyhow::bail!("--delete-range requires a bounded range (--range or --from/--to)");
    }

    Ok(())
}
