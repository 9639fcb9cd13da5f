//! Redirect chain heuristics.
//!
//! Each check is independent and appends human-readable issues to one list.
//! A trusted final destination overrides every issue except a known cloaker.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::domain::extract_parts;

/// Link shorteners and ad-gated redirectors that mask the real destination.
pub const KNOWN_CLOAKERS: &[&str] = &[
    "adf.ly", "bit.do", "linkbucks.com", "sh.st", "shortest.st", "ouo.io", "bc.vc", "adfoc.us",
    "lnk.co", "ity.im", "soo.gd", "clk.im", "urlcash.net", "zpag.es", "cur.lv", "linkshrink.net",
    "moourl.com", "yourls.org", "robo.to", "v.gd", "q.gs", "1shortlink.com", "short.am",
    "linkzip.net", "gestyy.com", "clk.sh", "megaurl.in", "linksly.co", "shrinkearn.com",
    "cpmlink.net", "tmearn.com", "shortzon.com", "shrinke.me", "boost.ink", "link-target.net",
    "srt.am", "tny.im", "viralurl.com", "tny.cz", "budurl.com", "tinyurl.com", "cutt.ly", "is.gd",
    "bit.ly", "t.co", "rb.gy", "rebrand.ly", "x.co", "cli.gs", "ouo.press", "adfly.link",
    "linktr.ee", "bio.link", "bio.site",
];

/// Registrable domains trusted as a final destination.
pub const TRUSTED_FINAL_DOMAINS: &[&str] = &[
    // Tech
    "google.com", "youtube.com", "gmail.com", "microsoft.com", "outlook.com", "apple.com",
    "icloud.com", "facebook.com", "instagram.com", "whatsapp.com", "amazon.com", "alibaba.com",
    "baidu.com", "yahoo.com", "bing.com",
    // Code hosting
    "github.com", "gitlab.com", "bitbucket.org", "npmjs.com", "pypi.org", "sourceforge.net",
    "stackblitz.com", "codesandbox.io",
    // Cloud
    "cloudflare.com", "vercel.com", "netlify.app", "digitalocean.com", "heroku.com",
    "render.com", "railway.app",
    // Collaboration
    "dropbox.com", "box.com", "notion.so", "slack.com", "asana.com", "trello.com", "monday.com",
    "figma.com", "miro.com", "zoom.us", "skype.com",
    // Finance
    "paypal.com", "stripe.com", "visa.com", "mastercard.com", "squareup.com", "chase.com",
    "bankofamerica.com", "wellsfargo.com", "intuit.com", "mint.com",
    // Education
    "edx.org", "coursera.org", "udemy.com", "khanacademy.org", "pluralsight.com", "harvard.edu",
    "mit.edu", "stanford.edu", "cam.ac.uk", "ox.ac.uk",
    // Social
    "twitter.com", "x.com", "linkedin.com", "discord.com", "reddit.com", "snapchat.com",
    "tiktok.com", "pinterest.com", "tumblr.com", "medium.com",
    // Shopping
    "shopify.com", "etsy.com", "ebay.com", "walmart.com", "target.com", "bestbuy.com",
    "costco.com", "ubereats.com", "doordash.com", "grubhub.com",
    // Crypto
    "coinbase.com", "binance.com", "opensea.io", "etherscan.io", "metamask.io",
    // Government
    "cdc.gov", "nih.gov", "whitehouse.gov", "usa.gov", "irs.gov", "healthcare.gov", "nasa.gov",
    "fda.gov",
];

const PROXY_MARKERS: &[&str] = &["proxy.html", "proxy.php"];
const CAPTCHA_MARKERS: &[&str] = &["recaptcha/api2", "captcha"];
const OBFUSCATION_MARKERS: &[&str] = &["base64", "%3d", "%2f"];
const INTERNAL_PROTOCOLS: &[&str] = &["about:", "data:"];
const STATIC_SUFFIXES: &[&str] = &[
    ".gif", ".jpg", ".jpeg", ".png", ".svg", ".webp", ".js", "/gtag/js", "analytics.js",
];

/// Reason attached when the trust override applies.
pub const TRUSTED_DESTINATION_REASON: &str = "Final destination is a trusted domain";

/// Issue text emitted for a repeated URL.
pub const LOOP_ISSUE: &str = "Redirect loop detected (repeating URLs)";

/// Overall status of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainStatus {
    /// No issues, or trusted final destination.
    Safe,
    /// At least one issue.
    Suspicious,
    /// The chain was empty.
    Error,
}

/// Verdict over one resolved chain. Computed once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainVerdict {
    /// Overall status
    pub status: ChainStatus,
    /// Issues in the order they were found
    pub issues: Vec<String>,
}

impl ChainVerdict {
    /// Whether the chain was judged suspicious.
    pub fn is_suspicious(&self) -> bool {
        self.status == ChainStatus::Suspicious
    }
}

/// Fraction of ASCII vowels is below 0.2 on a label of eight or more chars.
fn is_low_entropy_label(label: &str) -> bool {
    let len = label.chars().count();
    if len < 8 {
        return false;
    }
    let vowels = label.chars().filter(|c| "aeiou".contains(*c)).count();
    (vowels as f64) / (len as f64) < 0.2
}

/// More than six `/`-separated segments before the query, or any segment over
/// thirty characters. The scheme's `//` counts as segments.
fn is_suspicious_path(url: &str) -> bool {
    let before_query = url.split('?').next().unwrap_or(url);
    let segments: Vec<&str> = before_query.split('/').collect();
    segments.len() > 6 || segments.iter().any(|s| s.chars().count() > 30)
}

/// Shortener URL with a path after the domain.
fn has_deep_path_after(url: &str, domain: &str) -> bool {
    url.to_lowercase()
        .split_once(domain)
        .is_some_and(|(_, rest)| rest.contains('/'))
}

/// Evaluates a redirect chain for cloaking and structural anomalies.
///
/// `chain` may contain a repeated URL (a revisit appended by the caller) so
/// loops are visible here.
pub fn evaluate_chain(chain: &[String]) -> ChainVerdict {
    if chain.is_empty() {
        return ChainVerdict {
            status: ChainStatus::Error,
            issues: vec!["Empty redirection chain".to_string()],
        };
    }

    let mut issues: Vec<String> = Vec::new();
    let mut seen_urls: HashSet<&str> = HashSet::new();
    let mut suffixes: BTreeSet<String> = BTreeSet::new();
    let mut proxy_detected = false;
    let mut captcha_detected = false;
    let mut intermediate_blank = false;
    let mut low_entropy_domains: Vec<String> = Vec::new();
    let mut suspicious_paths = false;
    let mut shortener_deep_link = false;

    let last_index = chain.len() - 1;
    for (i, url) in chain.iter().enumerate() {
        let lower = url.to_lowercase();

        if !seen_urls.insert(url.as_str()) {
            issues.push(LOOP_ISSUE.to_string());
        }

        if OBFUSCATION_MARKERS.iter().any(|m| lower.contains(m)) {
            issues.push("Obfuscated URL parameters detected".to_string());
        }
        if PROXY_MARKERS.iter().any(|m| lower.contains(m)) {
            proxy_detected = true;
        }
        if CAPTCHA_MARKERS.iter().any(|m| lower.contains(m)) {
            captcha_detected = true;
        }
        if lower.starts_with("about:") && i != last_index {
            intermediate_blank = true;
        }

        if INTERNAL_PROTOCOLS.iter().any(|p| lower.starts_with(p)) {
            continue;
        }

        let parts = extract_parts(url);
        if !parts.suffix.is_empty() {
            suffixes.insert(parts.suffix.clone());
        }
        let registered = parts.registered_domain();

        let is_cloaker = KNOWN_CLOAKERS.contains(&registered.as_str());
        if is_cloaker {
            issues.push(format!("Known cloaking service detected: {registered}"));
        }
        if is_low_entropy_label(&parts.domain) {
            low_entropy_domains.push(registered.clone());
        }
        if is_suspicious_path(url) {
            suspicious_paths = true;
        }
        if is_cloaker && has_deep_path_after(url, &registered) {
            shortener_deep_link = true;
        }
        if STATIC_SUFFIXES.iter().any(|ext| lower.ends_with(ext)) {
            issues.push(format!("Static content endpoint in chain: {url}"));
        }
    }

    for pair in chain.windows(2) {
        let (from, to) = (pair[0].to_lowercase(), pair[1].to_lowercase());
        if from.starts_with("http://") && to.starts_with("https://") {
            issues.push("Mixed protocols (HTTP -> HTTPS)".to_string());
        } else if from.starts_with("https://") && to.starts_with("http://") {
            issues.push("Mixed protocols (HTTPS -> HTTP)".to_string());
        }
    }

    if suffixes.len() > 1 {
        let names: Vec<&str> = suffixes.iter().map(String::as_str).collect();
        issues.push(format!("Cross-TLD redirection: {}", names.join(", ")));
    }
    if proxy_detected {
        issues.push("Proxy-based redirection detected".to_string());
    }
    if captcha_detected {
        issues.push("CAPTCHA barrier detected mid-redirection".to_string());
    }
    if intermediate_blank {
        issues.push("Unexpected about:blank mid-chain".to_string());
    }
    if !low_entropy_domains.is_empty() {
        issues.push(format!(
            "Low-entropy/random-looking domains: {}",
            low_entropy_domains.join(", ")
        ));
    }
    if suspicious_paths {
        issues.push("Suspiciously long or deep paths in chain".to_string());
    }
    if shortener_deep_link {
        issues.push("Shortlink with deep tracking paths".to_string());
    }
    if chain.len() > 6 {
        issues.push("Unusually long redirect chain (>6 hops)".to_string());
    }

    let final_domain = extract_parts(&chain[last_index]).registered_domain();
    let cloaker_flagged = issues.iter().any(|i| i.to_lowercase().contains("cloaking"));
    if TRUSTED_FINAL_DOMAINS.contains(&final_domain.as_str()) && !cloaker_flagged {
        return ChainVerdict {
            status: ChainStatus::Safe,
            issues: vec![TRUSTED_DESTINATION_REASON.to_string()],
        };
    }

    let status = if issues.is_empty() {
        ChainStatus::Safe
    } else {
        ChainStatus::Suspicious
    };
    ChainVerdict { status, issues }
}
