use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use regex::Regex;

use crate::domain;
use crate::query::HistoryQuery;
use crate::record::{DomainGroup, VisitRecord};

/// Per-domain visit totals over one search's results, keyed by the
/// pattern-normalized registrable domain.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultStats {
    pub domain_counts: HashMap<String, u32>,
    pub domains_removed: u32,
}

impl ResultStats {
    pub fn collect(records: &[VisitRecord], patterns: &[Regex]) -> Self {
        records
            .par_iter()
            .fold(Self::default, |mut acc, record| {
                let host = domain::split_url(&record.url).domain;
                if !domain::has_valid_tld(&host) {
                    acc.domains_removed += 1;
                    return acc;
                }
                let normalized = domain::normalize_domain(&host, patterns);
                if !domain::has_valid_tld(&normalized) {
                    acc.domains_removed += 1;
                } else {
                    *acc.domain_counts.entry(normalized).or_insert(0) += record.visit_count;
                }
                acc
            })
            .reduce(Self::default, |mut merged, part| {
                for (name, count) in part.domain_counts {
                    *merged.domain_counts.entry(name).or_insert(0) += count;
                }
                merged.domains_removed += part.domains_removed;
                merged
            })
    }

    pub fn unique_domains(&self) -> usize {
        self.domain_counts.len()
    }

    /// Most-visited domains, ties broken alphabetically for stable output.
    pub fn top(&self, count: usize) -> Vec<(&str, u32)> {
        let mut sorted: Vec<(&str, u32)> = self
            .domain_counts
            .iter()
            .map(|(name, visits)| (name.as_str(), *visits))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        sorted.truncate(count);
        sorted
    }
}

/// Everything one search produced: the query echo, grouped rows, domain
/// statistics, and the date the renderer starts its headers from.
#[derive(Debug)]
pub struct SearchOutcome {
    pub query: HistoryQuery,
    pub groups: Vec<DomainGroup>,
    pub stats: ResultStats,
    pub total_results: usize,
    pub row_date: Option<NaiveDate>,
}
