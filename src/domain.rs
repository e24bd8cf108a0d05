use regex::Regex;
use url::Url;

/// Host and path of a visit URL. Unparseable input degrades to an opaque
/// domain (the raw string) with an empty path instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub domain: String,
    pub path: String,
}

pub fn split_url(raw: &str) -> UrlParts {
    match Url::parse(raw) {
        Ok(url) => match url.host_str() {
            Some(host) => UrlParts {
                domain: host.to_ascii_lowercase(),
                path: url.path().to_string(),
            },
            None => UrlParts {
                domain: raw.to_string(),
                path: String::new(),
            },
        },
        Err(_) => UrlParts {
            domain: raw.to_string(),
            path: String::new(),
        },
    }
}

/// Collapse deep subdomains to the last three labels, e.g.
/// `a.b.example.com` -> `b.example.com`. Hosts with up to three labels are
/// kept whole.
pub fn registrable_domain(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    if host.matches('.').count() <= 2 {
        return host;
    }
    let parts: Vec<&str> = host.split('.').collect();
    parts[parts.len() - 3..].join(".")
}

pub fn same_registrable_domain(a: &str, b: &str) -> bool {
    registrable_domain(a) == registrable_domain(b)
}

pub fn has_valid_tld(domain: &str) -> bool {
    if domain.is_empty() || domain.len() < 3 || !domain.contains('.') {
        return false;
    }

    match domain.rfind('.') {
        Some(last_dot) if last_dot < domain.len() - 1 => {
            let tld = &domain[last_dot + 1..];
            tld.len() >= 2
                && tld
                    .chars()
                    .all(|c| c.is_ascii_lowercase() && c.is_ascii_alphabetic())
        }
        _ => false,
    }
}

/// Registrable collapse plus pattern normalization: the first pattern whose
/// capture group matches wins, so hosting-provider subdomains fold into one
/// name. Used by statistics only, never by grouping equality.
pub fn normalize_domain(domain: &str, patterns: &[Regex]) -> String {
    if domain.is_empty() {
        return domain.to_string();
    }

    let normalized = registrable_domain(domain);

    for pattern in patterns {
        if let Some(captures) = pattern.captures(&normalized) {
            if let Some(matched) = captures.get(1) {
                return matched.as_str().to_string();
            }
        }
    }

    normalized
}
