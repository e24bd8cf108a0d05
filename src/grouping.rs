use rayon::prelude::*;

use crate::domain::{self, UrlParts};
use crate::record::{DomainGroup, VisitRecord};

/// "6 or more hours" display bucket.
const ELAPSED_BUCKET_CAP: u8 = 6;

/// Partition `records` (newest first) into runs of consecutive same-domain
/// visits, picking a representative title/URL per run and flagging entries
/// whose timestamp contradicts the list order.
///
/// `query_end_time` seeds the reliability reference so the very first record
/// can be checked against the query's upper bound; without it the first
/// record is always trusted. Pure and reentrant: same input, same output.
pub fn group_by_domain(
    records: Vec<VisitRecord>,
    query_end_time: Option<i64>,
) -> Vec<DomainGroup> {
    if records.is_empty() {
        return Vec::new();
    }

    // Parse every URL up front; collect keeps input order.
    let parts: Vec<UrlParts> = records
        .par_iter()
        .map(|record| domain::split_url(&record.url))
        .collect();

    let mut groups = Vec::new();
    let mut current = DomainGroup::default();
    let mut reference_time = query_end_time;

    for (index, mut record) in records.into_iter().enumerate() {
        let part = &parts[index];

        // The host may rewrite a recently visited entry's timestamp after
        // the query ran, which shows up here as a time later than one
        // already seen. Such entries stay in the group but are kept out of
        // every date/time derivation.
        let reliable = reference_time.map_or(true, |t| record.last_visit_time <= t);
        if reliable {
            if index > 0 {
                if let Some(previous) = reference_time {
                    record.elapsed_hours = Some(elapsed_bucket(previous - record.last_visit_time));
                }
            }
            reference_time = Some(record.last_visit_time);
        } else {
            record.time_unreliable = true;
        }

        if part.path == "/" {
            // A site-root member always labels the group; the last one wins.
            current.title = record.title.clone();
            current.domain = Some(part.domain.clone());
            current.url = record.url.clone();
        } else if current.title.is_empty()
            || (current.path.len() > part.path.len() && !record.title.is_empty())
        {
            current.title = record.title.clone();
            current.url = record.url.clone();
            current.path = part.path.clone();
        }

        current.members.push(record);

        let run_ends = match parts.get(index + 1) {
            Some(next) => !domain::same_registrable_domain(&part.domain, &next.domain),
            None => true,
        };
        if run_ends {
            groups.push(std::mem::take(&mut current));
        }
    }

    groups
}

fn elapsed_bucket(elapsed_ms: i64) -> u8 {
    let hours = elapsed_ms / 3_600_000;
    if hours >= i64::from(ELAPSED_BUCKET_CAP) {
        ELAPSED_BUCKET_CAP
    } else {
        hours.max(0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, title: &str, time: i64) -> VisitRecord {
        VisitRecord::new(url.to_string(), url.to_string(), title.to_string(), time, 1)
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(group_by_domain(Vec::new(), None).is_empty());
        assert!(group_by_domain(Vec::new(), Some(1_000)).is_empty());
    }

    #[test]
    fn root_path_record_becomes_representative() {
        let groups = group_by_domain(
            vec![
                record("http://a.com/", "A Home", 300),
                record("http://a.com/x", "X", 290),
            ],
            None,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title, "A Home");
        assert_eq!(groups[0].url, "http://a.com/");
        assert_eq!(groups[0].domain.as_deref(), Some("a.com"));
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn different_domains_split_groups() {
        let groups = group_by_domain(
            vec![
                record("http://a.com/x", "", 300),
                record("http://b.com/", "B", 200),
            ],
            None,
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].display_domain(), "a.com");
        assert_eq!(groups[1].domain.as_deref(), Some("b.com"));
    }

    #[test]
    fn members_preserve_input_order_across_groups() {
        let input = vec![
            record("http://a.com/1", "1", 500),
            record("http://a.com/2", "2", 400),
            record("http://b.com/3", "3", 300),
            record("http://a.com/4", "4", 200),
        ];
        let urls: Vec<String> = input.iter().map(|r| r.url.clone()).collect();

        let groups = group_by_domain(input, None);
        assert_eq!(groups.len(), 3);

        let flattened: Vec<String> = groups
            .iter()
            .flat_map(|g| g.members.iter().map(|m| m.url.clone()))
            .collect();
        assert_eq!(flattened, urls);
    }

    #[test]
    fn grouping_is_idempotent() {
        let input = vec![
            record("http://a.com/", "A", 300),
            record("http://a.com/x", "X", 290),
            record("http://b.com/y", "Y", 100),
        ];
        let first = group_by_domain(input.clone(), Some(400));
        let second = group_by_domain(input, Some(400));
        assert_eq!(first, second);
    }

    #[test]
    fn later_timestamp_is_flagged_unreliable() {
        let groups = group_by_domain(
            vec![
                record("http://a.com/x", "X", 300),
                record("http://a.com/y", "Y", 900),
                record("http://a.com/z", "Z", 250),
            ],
            None,
        );
        assert_eq!(groups.len(), 1);
        let members = &groups[0].members;
        assert!(!members[0].time_unreliable);
        assert!(members[1].time_unreliable);
        assert!(!members[2].time_unreliable);
        // Flagged member stays in the group but not in the derived times.
        assert_eq!(groups[0].end_time(), Some(300));
        assert_eq!(groups[0].start_time(), Some(250));
    }

    #[test]
    fn query_end_time_seeds_the_reliability_check() {
        let groups = group_by_domain(vec![record("http://a.com/x", "X", 900)], Some(300));
        assert!(groups[0].members[0].time_unreliable);
        assert_eq!(groups[0].end_time(), None);
    }

    #[test]
    fn shorter_path_with_title_wins_representative() {
        let groups = group_by_domain(
            vec![
                record("http://a.com/deep/nested/page", "Deep", 300),
                record("http://a.com/top", "Top", 290),
            ],
            None,
        );
        assert_eq!(groups[0].title, "Top");
        assert_eq!(groups[0].url, "http://a.com/top");
    }

    #[test]
    fn shorter_path_with_empty_title_does_not_win() {
        let groups = group_by_domain(
            vec![
                record("http://a.com/deep/nested/page", "Deep", 300),
                record("http://a.com/top", "", 290),
            ],
            None,
        );
        assert_eq!(groups[0].title, "Deep");
    }

    #[test]
    fn last_root_path_record_wins() {
        let groups = group_by_domain(
            vec![
                record("http://a.com/", "First Root", 300),
                record("http://a.com/x", "X", 290),
                record("http://a.com/", "Second Root", 280),
            ],
            None,
        );
        assert_eq!(groups[0].title, "Second Root");
    }

    #[test]
    fn untitled_root_can_be_replaced_by_titled_member() {
        // A site-root member with an empty title installs that empty title;
        // the next titled member then takes over through the no-title branch.
        let groups = group_by_domain(
            vec![
                record("http://a.com/", "", 300),
                record("http://a.com/x", "X", 290),
            ],
            None,
        );
        assert_eq!(groups[0].title, "X");
        assert_eq!(groups[0].url, "http://a.com/x");
        // The root rule's domain assignment survives the replacement.
        assert_eq!(groups[0].domain.as_deref(), Some("a.com"));
    }

    #[test]
    fn deep_subdomain_siblings_group_together() {
        let groups = group_by_domain(
            vec![
                record("http://a.cdn.example.com/x", "X", 300),
                record("http://b.cdn.example.com/y", "Y", 290),
            ],
            None,
        );
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn unparseable_urls_group_by_opaque_fallback() {
        let groups = group_by_domain(
            vec![
                record("definitely not a url", "Odd", 300),
                record("definitely not a url", "Odd again", 290),
                record("http://a.com/x", "X", 280),
            ],
            None,
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn elapsed_hours_bucket_from_previous_visit() {
        let hour = 3_600_000;
        let groups = group_by_domain(
            vec![
                record("http://a.com/x", "X", 10 * hour),
                record("http://a.com/y", "Y", 8 * hour),
                record("http://b.com/z", "Z", hour),
            ],
            None,
        );
        // First record has no previous visit to measure against.
        assert_eq!(groups[0].members[0].elapsed_hours, None);
        assert_eq!(groups[0].members[1].elapsed_hours, Some(2));
        // Seven hours earlier collapses into the 6+ bucket.
        assert_eq!(groups[1].members[0].elapsed_hours, Some(6));
    }

    #[test]
    fn first_record_gets_no_bucket_even_with_end_time() {
        let hour = 3_600_000;
        let groups = group_by_domain(
            vec![record("http://a.com/x", "X", 2 * hour)],
            Some(5 * hour),
        );
        assert_eq!(groups[0].members[0].elapsed_hours, None);
        assert!(!groups[0].members[0].time_unreliable);
    }
}
