use anyhow::{bail, Context, Result};
use chrono::{Datelike, Days, Local, NaiveDate};
use clap::ValueEnum;
use serde::Serialize;

use crate::args::Args;

/// Date-range presets offered by the search toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangeChoice {
    Today,
    Yesterday,
    /// The previous Monday-through-Sunday week.
    LastWeek,
    /// The previous calendar month.
    LastMonth,
    All,
}

/// The descriptor handed to the history fetch: epoch-millisecond bounds,
/// keyword text, and a result cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub text: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub max_results: usize,
}

impl RangeChoice {
    /// Inclusive first/last calendar day of the range, or None for unbounded.
    pub fn bounds(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            RangeChoice::Today => Some((today, today)),
            RangeChoice::Yesterday => {
                let day = today - Days::new(1);
                Some((day, day))
            }
            RangeChoice::LastWeek => {
                let weekday = u64::from(today.weekday().num_days_from_monday());
                let this_monday = today - Days::new(weekday);
                Some((this_monday - Days::new(7), this_monday - Days::new(1)))
            }
            RangeChoice::LastMonth => {
                let first_of_month = today.with_day(1)?;
                let last_of_previous = first_of_month - Days::new(1);
                Some((last_of_previous.with_day(1)?, last_of_previous))
            }
            RangeChoice::All => None,
        }
    }
}

/// Build the fetch descriptor from the CLI selection. Returns the query and
/// the initial row date the renderer starts its date headers from (the
/// range's last day, clamped to today).
pub fn build_query(args: &Args, today: NaiveDate) -> Result<(HistoryQuery, Option<NaiveDate>)> {
    let bounds = if args.from.is_some() || args.to.is_some() {
        let end = args.to.unwrap_or(today);
        let start = args.from.unwrap_or(end);
        if start > end {
            bail!("--from must not be later than --to");
        }
        Some((start, end))
    } else {
        args.range.bounds(today)
    };

    let (start_time, end_time, row_date) = match bounds {
        Some((start, end)) => {
            // The upper bound is midnight of the day after the range's last
            // day, so the final calendar day is included.
            let after_end = end
                .checked_add_days(Days::new(1))
                .context("date range end out of range")?;
            (
                Some(local_midnight_ms(start)?),
                Some(local_midnight_ms(after_end)?),
                Some(end.min(today)),
            )
        }
        None => (None, None, None),
    };

    let query = HistoryQuery {
        text: args.text.clone().unwrap_or_default(),
        start_time,
        end_time,
        max_results: args.max_results,
    };
    Ok((query, row_date))
}

fn local_midnight_ms(date: NaiveDate) -> Result<i64> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("invalid midnight for {date}"))?;
    let local = midnight
        .and_local_timezone(Local)
        .earliest()
        .with_context(|| format!("no local midnight on {date}"))?;
    Ok(local.timestamp_millis())
}
