use std::fmt::{self, Write};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde_json::json;

use crate::record::{DomainGroup, VisitRecord};
use crate::stats::SearchOutcome;
use crate::utils;

pub struct RenderOptions {
    pub browser: String,
    pub expand: bool,
    pub redact: bool,
    pub top: Option<usize>,
}

/// Favicon lookup URI for a page. Parentheses are escaped because the URI
/// ends up inside a generated `url(...)` style value where they are
/// syntactically significant.
pub fn favicon_uri(url: &str) -> String {
    format!(
        "chrome://favicon/{}",
        url.replace('(', "\\(").replace(')', "\\)")
    )
}

fn local_time(epoch_ms: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .with_timezone(&Local)
}

fn local_day(epoch_ms: i64) -> NaiveDate {
    local_time(epoch_ms).date_naive()
}

fn clock(epoch_ms: i64) -> String {
    local_time(epoch_ms).format("%-H:%M").to_string()
}

fn date_heading(day: NaiveDate) -> String {
    day.format("%Y/%m/%d (%a)").to_string()
}

/// Time label for a group row: the newest reliable time, a
/// `oldest - newest` range when they differ, or `-` when no member has a
/// trustworthy timestamp.
fn time_label(group: &DomainGroup) -> String {
    match (group.start_time(), group.end_time()) {
        (Some(start), Some(end)) if start != end => {
            format!("{} - {}", clock(start), clock(end))
        }
        (_, Some(end)) => clock(end),
        _ => "-".to_string(),
    }
}

fn elapsed_label(member: &VisitRecord) -> Option<String> {
    member.elapsed_hours.map(|hours| {
        if hours >= 6 {
            "+6h+".to_string()
        } else {
            format!("+{}h", hours)
        }
    })
}

/// Draws the grouped list: a date heading whenever the day changes, one row
/// per group, and (expanded) the individual visits underneath.
struct ListRenderer<'a> {
    opts: &'a RenderOptions,
    row_date: Option<NaiveDate>,
}

impl<'a> ListRenderer<'a> {
    fn new(opts: &'a RenderOptions, initial_row_date: Option<NaiveDate>) -> Self {
        ListRenderer {
            opts,
            row_date: initial_row_date,
        }
    }

    fn render(&mut self, out: &mut impl Write, groups: &[DomainGroup]) -> fmt::Result {
        for (index, group) in groups.iter().enumerate() {
            self.render_group(out, group, index == 0)?;
        }
        Ok(())
    }

    fn render_group(&mut self, out: &mut impl Write, group: &DomainGroup, first: bool) -> fmt::Result {
        if let Some(end) = group.end_time() {
            let day = local_day(end);
            if first || self.row_date != Some(day) {
                writeln!(out, "{}", date_heading(day))?;
            }
            self.row_date = Some(day);
        }

        let mut suffix = String::new();
        if group.members.len() == 1 {
            let only = &group.members[0];
            if only.visit_count > 1 {
                suffix = format!(" ( {} times )", only.visit_count);
            }
        } else {
            suffix = format!(" ( {} pages )", group.members.len());
        }

        writeln!(
            out,
            "  {:>13}  {} [{}]{}",
            time_label(group),
            group.display_title(),
            self.domain_label(group),
            suffix
        )?;

        if self.opts.expand && group.members.len() > 1 {
            for member in &group.members {
                self.render_member(out, member)?;
            }
        }
        Ok(())
    }

    fn render_member(&self, out: &mut impl Write, member: &VisitRecord) -> fmt::Result {
        let time = if member.time_unreliable {
            "-".to_string()
        } else {
            clock(member.last_visit_time)
        };
        let title = if member.title.is_empty() {
            member.url.as_str()
        } else {
            member.title.as_str()
        };
        write!(out, "      {:>7}  {} ( {} times )", time, title, member.visit_count)?;
        if let Some(elapsed) = elapsed_label(member) {
            write!(out, " {}", elapsed)?;
        }
        writeln!(out)
    }

    fn domain_label(&self, group: &DomainGroup) -> String {
        let domain = group.display_domain();
        if self.opts.redact {
            utils::redact_domain(&domain)
        } else {
            domain
        }
    }
}

pub fn render_results(
    out: &mut impl Write,
    outcome: &SearchOutcome,
    opts: &RenderOptions,
) -> fmt::Result {
    writeln!(out, "--- {} History ---", opts.browser)?;

    if outcome.groups.is_empty() {
        writeln!(out, "No search results.")?;
        return Ok(());
    }

    let mut renderer = ListRenderer::new(opts, outcome.row_date);
    renderer.render(out, &outcome.groups)?;

    writeln!(out)?;
    writeln!(
        out,
        "{} results in {} groups across {} domains",
        utils::format_number(outcome.total_results as u32),
        utils::format_number(outcome.groups.len() as u32),
        utils::format_number(outcome.stats.unique_domains() as u32)
    )?;

    if let Some(top_count) = opts.top {
        writeln!(
            out,
            "\nTop {} most visited domains:",
            std::cmp::min(top_count, outcome.stats.unique_domains())
        )?;
        for (name, visits) in outcome.stats.top(top_count) {
            let display_name = if opts.redact {
                utils::redact_domain(name)
            } else {
                name.to_string()
            };
            writeln!(out, "- {}: {} visits", display_name, utils::format_number(visits))?;
        }
    }
    Ok(())
}

/// JSON form of a whole search outcome, for piping into other tools.
pub fn outcome_json(outcome: &SearchOutcome) -> serde_json::Value {
    json!({
        "query": outcome.query,
        "totalResults": outcome.total_results,
        "rowDate": outcome.row_date,
        "groups": outcome.groups.iter().map(group_json).collect::<Vec<_>>(),
        "stats": {
            "uniqueDomains": outcome.stats.unique_domains(),
            "domainsRemoved": outcome.stats.domains_removed,
            "domainVisits": outcome.stats.domain_counts,
        },
    })
}

fn group_json(group: &DomainGroup) -> serde_json::Value {
    json!({
        "title": group.display_title(),
        "url": group.url,
        "domain": group.display_domain(),
        "faviconUri": favicon_uri(&group.url),
        "startTime": group.start_time(),
        "endTime": group.end_time(),
        "members": group.members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_by_domain;
    use crate::query::HistoryQuery;
    use crate::stats::ResultStats;
    use chrono::TimeZone;

    fn record(url: &str, title: &str, time: i64) -> VisitRecord {
        VisitRecord::new(url.to_string(), url.to_string(), title.to_string(), time, 1)
    }

    fn local_ms(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Local
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap()
            .timestamp_millis()
    }

    fn outcome(groups: Vec<DomainGroup>, row_date: Option<NaiveDate>) -> SearchOutcome {
        let total_results = groups.iter().map(|g| g.members.len()).sum();
        SearchOutcome {
            query: HistoryQuery {
                text: String::new(),
                start_time: None,
                end_time: None,
                max_results: 100,
            },
            groups,
            stats: ResultStats::default(),
            total_results,
            row_date,
        }
    }

    fn opts() -> RenderOptions {
        RenderOptions {
            browser: "Chrome".to_string(),
            expand: false,
            redact: false,
            top: None,
        }
    }

    fn render_to_string(outcome: &SearchOutcome, opts: &RenderOptions) -> String {
        let mut output = String::new();
        render_results(&mut output, outcome, opts).unwrap();
        output
    }

    #[test]
    fn favicon_uri_escapes_parentheses() {
        assert_eq!(
            favicon_uri("http://a.com/page(1)"),
            "chrome://favicon/http://a.com/page\\(1\\)"
        );
        assert_eq!(favicon_uri("http://a.com/"), "chrome://favicon/http://a.com/");
    }

    #[test]
    fn empty_outcome_prints_no_results_message() {
        let text = render_to_string(&outcome(Vec::new(), None), &opts());
        assert!(text.contains("No search results."));
    }

    #[test]
    fn date_heading_appears_once_per_day() {
        let groups = group_by_domain(
            vec![
                record("http://a.com/", "A", local_ms(2026, 8, 6, 14, 30)),
                record("http://b.com/", "B", local_ms(2026, 8, 6, 10, 0)),
                record("http://c.com/", "C", local_ms(2026, 8, 5, 9, 0)),
            ],
            None,
        );
        let text = render_to_string(&outcome(groups, None), &opts());
        assert_eq!(text.matches("2026/08/06").count(), 1);
        assert_eq!(text.matches("2026/08/05").count(), 1);
    }

    #[test]
    fn group_row_shows_time_range_and_page_count() {
        let groups = group_by_domain(
            vec![
                record("http://a.com/", "A Home", local_ms(2026, 8, 6, 14, 30)),
                record("http://a.com/x", "X", local_ms(2026, 8, 6, 14, 2)),
            ],
            None,
        );
        let text = render_to_string(&outcome(groups, None), &opts());
        assert!(text.contains("14:02 - 14:30"));
        assert!(text.contains("A Home [a.com] ( 2 pages )"));
    }

    #[test]
    fn single_member_group_shows_times_only_when_revisited() {
        let mut visited_once = record("http://a.com/", "A", local_ms(2026, 8, 6, 9, 0));
        visited_once.visit_count = 1;
        let mut revisited = record("http://b.com/", "B", local_ms(2026, 8, 6, 8, 0));
        revisited.visit_count = 4;

        let groups = group_by_domain(vec![visited_once, revisited], None);
        let text = render_to_string(&outcome(groups, None), &opts());
        assert!(!text.contains("A [a.com] ("));
        assert!(text.contains("B [b.com] ( 4 times )"));
    }

    #[test]
    fn expand_lists_members_with_unreliable_dash() {
        let later = local_ms(2026, 8, 6, 23, 0);
        let groups = group_by_domain(
            vec![
                record("http://a.com/", "A", local_ms(2026, 8, 6, 10, 0)),
                record("http://a.com/x", "X", later),
                record("http://a.com/y", "Y", local_ms(2026, 8, 6, 9, 0)),
            ],
            None,
        );
        let expanded = RenderOptions {
            expand: true,
            ..opts()
        };
        let text = render_to_string(&outcome(groups, None), &expanded);
        // The out-of-order member renders a dash instead of a bogus time.
        assert!(text.contains("-  X ( 1 times )"));
        assert!(text.contains("Y ( 1 times ) +1h"));
    }

    #[test]
    fn fully_unreliable_group_renders_dash_label_and_no_heading() {
        let groups = group_by_domain(
            vec![record("http://a.com/", "A", local_ms(2026, 8, 6, 10, 0))],
            Some(local_ms(2026, 8, 1, 0, 0)),
        );
        let text = render_to_string(&outcome(groups, None), &opts());
        assert!(!text.contains("2026/08/06"));
        assert!(text.contains("-  A [a.com]"));
    }

    #[test]
    fn redact_masks_domains() {
        let groups = group_by_domain(
            vec![record("http://example.com/", "E", local_ms(2026, 8, 6, 10, 0))],
            None,
        );
        let redacted = RenderOptions {
            redact: true,
            ..opts()
        };
        let text = render_to_string(&outcome(groups, None), &redacted);
        assert!(text.contains("[*******.com]"));
        assert!(!text.contains("[example.com]"));
    }

    #[test]
    fn footer_counts_and_top_list() {
        let records = vec![
            record("http://a.com/", "A", local_ms(2026, 8, 6, 10, 0)),
            record("http://b.com/", "B", local_ms(2026, 8, 6, 9, 0)),
        ];
        let stats = ResultStats::collect(&records, &[]);
        let groups = group_by_domain(records, None);
        let mut full = outcome(groups, None);
        full.stats = stats;

        let with_top = RenderOptions {
            top: Some(5),
            ..opts()
        };
        let text = render_to_string(&full, &with_top);
        assert!(text.contains("2 results in 2 groups across 2 domains"));
        assert!(text.contains("Top 2 most visited domains:"));
        assert!(text.contains("- a.com: 1 visits"));
    }

    #[test]
    fn json_outcome_carries_derived_fields() {
        let groups = group_by_domain(
            vec![
                record("http://a.com/", "A Home", local_ms(2026, 8, 6, 14, 30)),
                record("http://a.com/x", "X", local_ms(2026, 8, 6, 14, 2)),
            ],
            None,
        );
        let value = outcome_json(&outcome(groups, None));
        let group = &value["groups"][0];
        assert_eq!(group["title"], "A Home");
        assert_eq!(group["domain"], "a.com");
        assert_eq!(group["faviconUri"], "chrome://favicon/http://a.com/");
        assert_eq!(group["members"].as_array().unwrap().len(), 2);
        assert!(group["startTime"].as_i64().unwrap() < group["endTime"].as_i64().unwrap());
        assert_eq!(value["totalResults"], 2);
    }
}
