use serde::Serialize;

use crate::domain;

/// One history entry, the shape `chrome.history.search` hands back:
/// timestamps are epoch milliseconds, `title` may be empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub last_visit_time: i64,
    pub visit_count: u32,
    /// Set by the grouper when the host reported a timestamp newer than one
    /// already seen in the same result set.
    pub time_unreliable: bool,
    /// Hours since the previous reliable visit, capped at 6 (= "6 or more").
    pub elapsed_hours: Option<u8>,
}

impl VisitRecord {
    pub fn new(
        id: String,
        url: String,
        title: String,
        last_visit_time: i64,
        visit_count: u32,
    ) -> Self {
        VisitRecord {
            id,
            url,
            title,
            last_visit_time,
            visit_count,
            time_unreliable: false,
            elapsed_hours: None,
        }
    }
}

/// A run of consecutive same-domain records, labeled by a representative
/// title and URL. `path` is the representative's path, kept for the
/// shorter-path tie-break; `domain` is only set by a site-root member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainGroup {
    pub title: String,
    pub url: String,
    pub path: String,
    pub domain: Option<String>,
    pub members: Vec<VisitRecord>,
}

impl DomainGroup {
    /// Newest trustworthy timestamp in the group, if any member has one.
    pub fn end_time(&self) -> Option<i64> {
        self.members
            .iter()
            .find(|m| !m.time_unreliable)
            .map(|m| m.last_visit_time)
    }

    /// Oldest trustworthy timestamp in the group.
    pub fn start_time(&self) -> Option<i64> {
        self.members
            .iter()
            .rev()
            .find(|m| !m.time_unreliable)
            .map(|m| m.last_visit_time)
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    pub fn display_domain(&self) -> String {
        match &self.domain {
            Some(domain) => domain.clone(),
            None => domain::split_url(&self.url).domain,
        }
    }
}
