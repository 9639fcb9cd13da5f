//! Model input features.

use std::net::Ipv4Addr;

use serde::Serialize;

use crate::domain::extract_parts;

/// Words that commonly appear in credential-phishing URLs.
pub const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "login", "secure", "account", "update", "verify", "banking", "password", "signin", "confirm",
    "security", "ebay", "paypal", "webscr", "amazon", "appleid", "support", "billing", "submit",
    "alert", "authentication", "recovery", "admin", "service", "webmail", "dropbox", "office365",
    "verifyaccount", "transaction", "credentials", "connect", "verifyidentity", "restricted",
    "warning", "risk", "malware", "suspend", "unlock", "recover", "violation", "win", "gift",
    "claim", "updateinfo", "urgent", "unusual", "important",
];

const LONG_PATH: usize = 40;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; 14] = [
    "url_length",
    "has_ip",
    "num_dots",
    "has_at_symbol",
    "has_hyphen",
    "is_https",
    "num_subdomains",
    "has_suspicious_keyword",
    "num_query_params",
    "path_length",
    "count_https",
    "count_www",
    "has_long_path",
    "dns_resolves",
];

/// Inputs to the phishing model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFeatures {
    /// Characters in the URL
    pub url_length: usize,
    /// Host is an IPv4 literal
    pub has_ip: bool,
    /// Dots anywhere in the URL
    pub num_dots: usize,
    /// URL contains `@`
    pub has_at_symbol: bool,
    /// Hyphen in the registrable label (not the subdomain)
    pub has_hyphen: bool,
    /// Scheme is https
    pub is_https: bool,
    /// Labels left of the registrable domain
    pub num_subdomains: usize,
    /// Any of `SUSPICIOUS_KEYWORDS` appears
    pub has_suspicious_keyword: bool,
    /// `&`-separated query parameters
    pub num_query_params: usize,
    /// Length of the path component
    pub path_length: usize,
    /// Occurrences of "https"
    pub count_https: usize,
    /// Occurrences of "www"
    pub count_www: usize,
    /// Path longer than 40 characters
    pub has_long_path: bool,
    /// 1 resolved, 0 did not, -1 not attempted
    pub dns_resolves: i8,
}

impl ModelFeatures {
    /// Extracts features from a URL. `dns_resolves` is `None` when resolution
    /// was not attempted.
    pub fn extract(url: &str, dns_resolves: Option<bool>) -> Self {
        let lower = url.to_lowercase();
        let parsed = url::Url::parse(url).ok();

        let host = parsed
            .as_ref()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        let path_length = parsed.as_ref().map(|u| u.path().len()).unwrap_or(0);
        let num_query_params = parsed
            .as_ref()
            .and_then(|u| u.query())
            .filter(|q| !q.is_empty())
            .map(|q| q.split('&').count())
            .unwrap_or(0);
        let is_https = parsed.as_ref().is_some_and(|u| u.scheme() == "https");

        let parts = extract_parts(url);
        let num_subdomains = if parts.subdomain.is_empty() {
            0
        } else {
            parts.subdomain.matches('.').count() + 1
        };

        Self {
            url_length: url.chars().count(),
            has_ip: host.parse::<Ipv4Addr>().is_ok(),
            num_dots: url.matches('.').count(),
            has_at_symbol: url.contains('@'),
            has_hyphen: parts.domain.contains('-'),
            is_https,
            num_subdomains,
            has_suspicious_keyword: SUSPICIOUS_KEYWORDS.iter().any(|k| lower.contains(k)),
            num_query_params,
            path_length,
            count_https: lower.matches("https").count(),
            count_www: lower.matches("www").count(),
            has_long_path: path_length > LONG_PATH,
            dns_resolves: match dns_resolves {
                Some(true) => 1,
                Some(false) => 0,
                None => -1,
            },
        }
    }

    /// Numeric values in `FEATURE_NAMES` order.
    pub fn values(&self) -> [f64; 14] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            self.url_length as f64,
            flag(self.has_ip),
            self.num_dots as f64,
            flag(self.has_at_symbol),
            flag(self.has_hyphen),
            flag(self.is_https),
            self.num_subdomains as f64,
            flag(self.has_suspicious_keyword),
            self.num_query_params as f64,
            self.path_length as f64,
            self.count_https as f64,
            self.count_www as f64,
            flag(self.has_long_path),
            f64::from(self.dns_resolves),
        ]
    }
}
