//! URL string features and registration-age features.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::whois::RegistrationRecord;

/// Top-level domains frequently abused for throwaway registrations.
pub const SUSPICIOUS_TLDS: &[&str] = &["tk", "ml", "ga", "cf", "gq", "cn", "biz"];

/// Sentinel for unknown day counts.
pub const UNKNOWN_DAYS: i64 = -1;

/// Sentinel for unknown registration strings.
pub const UNAVAILABLE: &str = "Unavailable";

static IPV4_HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+\.\d+$").unwrap_or_else(|e| {
        panic!("Failed to compile IPV4_HOST_RE: {e}. This is a programming error.")
    })
});

/// Complete feature set for one URL.
///
/// Unknown registration data uses `-1` and `"Unavailable"`, never null, so
/// scoring is total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Characters in the full URL
    pub url_length: usize,
    /// Characters in the host
    pub hostname_length: usize,
    /// Characters in the path
    pub path_length: usize,
    /// Count of `.`
    pub count_dots: usize,
    /// Count of `-`
    pub count_hyphens: usize,
    /// Count of `@`
    pub count_at: usize,
    /// Count of `?`
    pub count_question_marks: usize,
    /// Count of `=`
    pub count_equals: usize,
    /// Count of `_`
    pub count_underscores: usize,
    /// Count of `&`
    pub count_ampersands: usize,
    /// Count of `!`
    pub count_exclamations: usize,
    /// Count of spaces
    pub count_spaces: usize,
    /// Count of numeric characters
    pub count_digits: usize,
    /// Count of alphabetic characters
    pub count_letters: usize,
    /// Shannon entropy of the full URL, two decimals
    pub entropy: f64,
    /// Host is a dotted-quad literal
    pub has_ip: bool,
    /// Scheme is https
    pub is_https: bool,
    /// Authority carries an explicit port
    pub has_port_in_url: bool,
    /// URL contains `%`
    pub is_encoded: bool,
    /// TLD is in [`SUSPICIOUS_TLDS`]
    pub suspicious_tld: bool,
    /// First resolved address, if any
    pub resolved_ip: Option<String>,
    /// Days since creation, or -1
    pub domain_age_days: i64,
    /// Creation date as `YYYY-MM-DD`, or "Unavailable"
    pub domain_creation_date: String,
    /// Days until expiry, or -1
    pub domain_expiration_days: i64,
    /// Days since last update, or -1
    pub domain_last_updated_days: i64,
    /// Registrar, or "Unavailable"
    pub registrar: String,
    /// Registrant country, or "Unavailable"
    pub country: String,
    /// Whether the registration lookup succeeded
    pub whois_success: bool,
}

/// String-only features of a URL.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalFeatures {
    pub(crate) url_length: usize,
    pub(crate) hostname_length: usize,
    pub(crate) path_length: usize,
    pub(crate) counts: CharCounts,
    pub(crate) entropy: f64,
    pub(crate) has_ip: bool,
    pub(crate) is_https: bool,
    pub(crate) has_port_in_url: bool,
    pub(crate) is_encoded: bool,
    pub(crate) suspicious_tld: bool,
    /// Lowercased host as written (no punycode conversion)
    pub host: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CharCounts {
    dots: usize,
    hyphens: usize,
    at: usize,
    question_marks: usize,
    equals: usize,
    underscores: usize,
    ampersands: usize,
    exclamations: usize,
    spaces: usize,
    digits: usize,
    letters: usize,
}

impl CharCounts {
    fn of(text: &str) -> Self {
        let mut counts = CharCounts::default();
        for c in text.chars() {
            match c {
                '.' => counts.dots += 1,
                '-' => counts.hyphens += 1,
                '@' => counts.at += 1,
                '?' => counts.question_marks += 1,
                '=' => counts.equals += 1,
                '_' => counts.underscores += 1,
                '&' => counts.ampersands += 1,
                '!' => counts.exclamations += 1,
                ' ' => counts.spaces += 1,
                _ => {}
            }
            if c.is_numeric() {
                counts.digits += 1;
            } else if c.is_alphabetic() {
                counts.letters += 1;
            }
        }
        counts
    }
}

/// Registration-derived features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFeatures {
    pub(crate) domain_age_days: i64,
    pub(crate) domain_creation_date: String,
    pub(crate) domain_expiration_days: i64,
    pub(crate) domain_last_updated_days: i64,
    pub(crate) registrar: String,
    pub(crate) country: String,
    pub(crate) whois_success: bool,
}

impl RegistrationFeatures {
    /// The full sentinel set used when a lookup fails.
    pub fn unavailable() -> Self {
        Self {
            domain_age_days: UNKNOWN_DAYS,
            domain_creation_date: UNAVAILABLE.to_string(),
            domain_expiration_days: UNKNOWN_DAYS,
            domain_last_updated_days: UNKNOWN_DAYS,
            registrar: UNAVAILABLE.to_string(),
            country: UNAVAILABLE.to_string(),
            whois_success: false,
        }
    }

    /// Derives day counts relative to `now`. Missing fields become sentinels.
    pub fn from_record(record: &RegistrationRecord, now: DateTime<Utc>) -> Self {
        let days_between = |from: DateTime<Utc>, to: DateTime<Utc>| {
            (to - from).num_seconds().div_euclid(86_400)
        };
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| UNAVAILABLE.to_string())
        };

        Self {
            domain_age_days: record
                .creation_date
                .map_or(UNKNOWN_DAYS, |created| days_between(created, now)),
            domain_creation_date: record
                .creation_date
                .map_or_else(|| UNAVAILABLE.to_string(), |d| d.format("%Y-%m-%d").to_string()),
            domain_expiration_days: record
                .expiration_date
                .map_or(UNKNOWN_DAYS, |expires| days_between(now, expires)),
            domain_last_updated_days: record
                .updated_date
                .map_or(UNKNOWN_DAYS, |updated| days_between(updated, now)),
            registrar: non_empty(&record.registrar),
            country: non_empty(&record.country),
            whois_success: true,
        }
    }
}

/// Shannon entropy (base 2) over the distinct characters of `text`.
pub fn shannon_entropy(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in text.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }
    freq.values()
        .map(|&n| {
            let p = n as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Raw URL parts as written: scheme, authority, path.
fn split_raw(url: &str) -> (&str, &str, &str) {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
    (scheme, authority, &tail[..path_end])
}

/// Splits an authority into host and "has explicit port".
fn host_and_port(authority: &str) -> (String, bool) {
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    if let Some(stripped) = host_port.strip_prefix('[') {
        // IPv6 literal: [::1]:8080
        let (host, after) = stripped.split_once(']').unwrap_or((stripped, ""));
        return (host.to_lowercase(), after.starts_with(':'));
    }
    match host_port.split_once(':') {
        Some((host, _)) => (host.to_lowercase(), true),
        None => (host_port.to_lowercase(), false),
    }
}

/// Computes string-structure features of a URL.
pub fn extract_lexical(url: &str) -> LexicalFeatures {
    let (scheme, authority, path) = split_raw(url);
    let (host, has_port_in_url) = host_and_port(authority);

    let tld = if host.contains('.') {
        host.rsplit('.').next().unwrap_or_default()
    } else {
        ""
    };

    LexicalFeatures {
        url_length: url.chars().count(),
        hostname_length: host.chars().count(),
        path_length: path.chars().count(),
        counts: CharCounts::of(url),
        entropy: round2(shannon_entropy(url)),
        has_ip: IPV4_HOST_RE.is_match(&host),
        is_https: scheme.eq_ignore_ascii_case("https"),
        has_port_in_url,
        is_encoded: url.contains('%'),
        suspicious_tld: SUSPICIOUS_TLDS.contains(&tld),
        host,
    }
}

impl FeatureVector {
    /// Combines lexical, DNS, and registration features.
    pub fn assemble(
        lexical: &LexicalFeatures,
        resolved_ip: Option<String>,
        registration: RegistrationFeatures,
    ) -> Self {
        let c = &lexical.counts;
        Self {
            url_length: lexical.url_length,
            hostname_length: lexical.hostname_length,
            path_length: lexical.path_length,
            count_dots: c.dots,
            count_hyphens: c.hyphens,
            count_at: c.at,
            count_question_marks: c.question_marks,
            count_equals: c.equals,
            count_underscores: c.underscores,
            count_ampersands: c.ampersands,
            count_exclamations: c.exclamations,
            count_spaces: c.spaces,
            count_digits: c.digits,
            count_letters: c.letters,
            entropy: lexical.entropy,
            has_ip: lexical.has_ip,
            is_https: lexical.is_https,
            has_port_in_url: lexical.has_port_in_url,
            is_encoded: lexical.is_encoded,
            suspicious_tld: lexical.suspicious_tld,
            resolved_ip,
            domain_age_days: registration.domain_age_days,
            domain_creation_date: registration.domain_creation_date,
            domain_expiration_days: registration.domain_expiration_days,
            domain_last_updated_days: registration.domain_last_updated_days,
            registrar: registration.registrar,
            country: registration.country,
            whois_success: registration.whois_success,
        }
    }
}
