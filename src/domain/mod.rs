//! Domain extraction utilities.
//!
//! This module splits hosts into subdomain, registrable domain, and public
//! suffix using the Public Suffix List. A bundled list snapshot is parsed on
//! first use; a complete list can be installed once at startup with
//! [`install_suffix_list`].
//!
//! Only ICANN suffixes are considered, so hosting platforms such as
//! `netlify.app` count as registrable domains themselves.

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use publicsuffix::{IcannList, List, Psl};

const BUNDLED_SUFFIX_LIST: &str = include_str!("../../data/public_suffix_list.dat");

static SUFFIX_LIST: OnceCell<IcannList> = OnceCell::new();

/// Host split into its Public Suffix List parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainParts {
    /// Labels left of the registrable domain (e.g. "www.mail")
    pub subdomain: String,
    /// The registrable label without suffix (e.g. "example")
    pub domain: String,
    /// The public suffix (e.g. "co.uk")
    pub suffix: String,
}

impl DomainParts {
    /// Registrable domain (`domain.suffix`), empty when either part is missing.
    pub fn registered_domain(&self) -> String {
        if self.domain.is_empty() || self.suffix.is_empty() {
            String::new()
        } else {
            format!("{}.{}", self.domain, self.suffix)
        }
    }
}

fn parse_icann(text: &str) -> Result<IcannList> {
    text.parse::<IcannList>()
        .map_err(|e| anyhow::anyhow!("Failed to parse public suffix list: {e:?}"))
}

fn suffix_list() -> &'static IcannList {
    SUFFIX_LIST.get_or_init(|| match parse_icann(BUNDLED_SUFFIX_LIST) {
        Ok(list) => list,
        Err(e) => {
            log::error!("Bundled public suffix list is invalid: {e}");
            IcannList::from(List::new())
        }
    })
}

/// Loads a complete Public Suffix List file and installs it process-wide.
///
/// Must be called before the first domain lookup; later calls are ignored with
/// a warning since the list is immutable once in use.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn install_suffix_list(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read suffix list {}", path.display()))?;
    let list = parse_icann(&text)?;
    if SUFFIX_LIST.set(list).is_err() {
        log::warn!(
            "Public suffix list already in use; ignoring {}",
            path.display()
        );
    }
    Ok(())
}

/// Returns the host component of a URL, lowercased.
///
/// Falls back to a manual split when `url::Url` rejects the input so that
/// heuristics still see something for malformed hops.
pub fn host_of(url: &str) -> Option<String> {
    if let Ok(parsed) = url::Url::parse(url) {
        return parsed.host_str().map(|h| {
            h.trim_start_matches('[')
                .trim_end_matches(']')
                .to_ascii_lowercase()
        });
    }

    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// Splits a host into subdomain, registrable label, and public suffix.
///
/// IP literals and single-label hosts yield an empty `domain`/`suffix` pair
/// where the list has no answer.
pub fn split_host(host: &str) -> DomainParts {
    let host = host.trim_end_matches('.').to_lowercase();
    if host.parse::<std::net::IpAddr>().is_ok() {
        return DomainParts {
            domain: host,
            ..Default::default()
        };
    }

    let list = suffix_list();
    let suffix = match list.suffix(host.as_bytes()) {
        Some(s) => String::from_utf8_lossy(s.as_bytes()).to_string(),
        None => return DomainParts::default(),
    };

    match list.domain(host.as_bytes()) {
        Some(d) => {
            let registrable = String::from_utf8_lossy(d.as_bytes()).to_string();
            let domain = registrable
                .strip_suffix(&format!(".{suffix}"))
                .unwrap_or(&registrable)
                .to_string();
            let subdomain = host
                .strip_suffix(&registrable)
                .map(|s| s.trim_end_matches('.').to_string())
                .unwrap_or_default();
            DomainParts {
                subdomain,
                domain,
                suffix,
            }
        }
        // The host is itself a public suffix (e.g. "co.uk")
        None => DomainParts {
            suffix,
            ..Default::default()
        },
    }
}

/// Splits the host of a URL into its Public Suffix List parts.
pub fn extract_parts(url: &str) -> DomainParts {
    host_of(url).map(|h| split_host(&h)).unwrap_or_default()
}

/// Extracts the registrable domain from a URL (e.g. "example.co.uk" from
/// "https://www.example.co.uk/path").
///
/// # Errors
///
/// Returns an error when the URL has no host or the host has no registrable
/// domain (IP literals, bare suffixes).
pub fn extract_domain(url: &str) -> Result<String> {
    let host = host_of(url).ok_or_else(|| anyhow::anyhow!("URL '{url}' has no host component"))?;
    if host.parse::<std::net::IpAddr>().is_ok() {
        return Err(anyhow::anyhow!(
            "IP addresses do not have registrable domains: {host}"
        ));
    }
    let registered = split_host(&host).registered_domain();
    if registered.is_empty() {
        return Err(anyhow::anyhow!("No registrable domain found in URL: {url}"));
    }
    Ok(registered)
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
