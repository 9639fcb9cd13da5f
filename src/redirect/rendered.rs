//! Client-side redirect tracing.
//!
//! Extends HTTP tracing by inspecting landed HTML pages for redirects a browser
//! would perform: `<meta http-equiv="refresh">` tags and inline scripts that
//! assign `location`. Each client-side hop is recorded in the chain just like a
//! 3xx hop, so chain heuristics see the full path.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};

use super::chain::{PushOutcome, RedirectChain};
use super::http::{fetch_hop, resolve_location, HopOutcome};
use super::{RedirectTracer, Trace};
use crate::config::{MAX_REDIRECT_HOPS, MAX_RENDERED_BODY_SIZE, REDIRECT_TIMEOUT};
use crate::error_handling::TraceError;

fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile regex pattern '{}' in {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}

fn parse_selector_unsafe(selector_str: &str, context: &str) -> Selector {
    Selector::parse(selector_str).unwrap_or_else(|e| {
        panic!(
            "Failed to parse CSS selector '{}' in {}: {}. This is a programming error.",
            selector_str, context, e
        )
    })
}

static META_REFRESH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("meta[http-equiv]", "META_REFRESH_SELECTOR"));

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("script", "SCRIPT_SELECTOR"));

// location = "..." / location.href = "..." with optional window/document/top/self prefix
static LOCATION_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#"(?:\b(?:window|document|top|self)\.)?\blocation(?:\.href)?\s*=\s*['"]([^'"]+)['"]"#,
        "LOCATION_ASSIGN_RE",
    )
});

// location.replace("...") / location.assign("...")
static LOCATION_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#"\blocation\.(?:replace|assign)\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        "LOCATION_CALL_RE",
    )
});

/// Extracts the target of a meta refresh `content` attribute
/// (e.g. `0; url=https://example.com/`).
fn parse_refresh_content(content: &str) -> Option<String> {
    // Only the first ';' separates the delay; the URL may contain more.
    let (_, rest) = content.split_once(';')?;
    let (key, value) = rest.trim().split_once('=')?;
    if !key.trim().eq_ignore_ascii_case("url") {
        return None;
    }
    let value = value.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Finds the first client-side redirect target in an HTML document.
///
/// Meta refresh takes precedence over script redirects. The returned target
/// is as written in the page and may be relative.
pub fn find_client_redirect(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for element in document.select(&META_REFRESH_SELECTOR) {
        let is_refresh = element
            .value()
            .attr("http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("refresh"));
        if !is_refresh {
            continue;
        }
        if let Some(target) = element.value().attr("content").and_then(parse_refresh_content) {
            return Some(target);
        }
    }

    for script in document.select(&SCRIPT_SELECTOR) {
        let body: String = script.text().collect();
        let found = LOCATION_CALL_RE
            .captures(&body)
            .or_else(|| LOCATION_ASSIGN_RE.captures(&body))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        if found.is_some() {
            return found;
        }
    }

    None
}

fn is_html(resp: &reqwest::Response) -> bool {
    resp.headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|ct| ct.to_ascii_lowercase().contains("text/html"))
}

/// Reads at most `max_size` bytes of the body. Larger bodies are truncated.
async fn read_body_limited(mut resp: reqwest::Response, max_size: usize) -> String {
    let mut buf: Vec<u8> = Vec::with_capacity(max_size.min(16 * 1024));
    loop {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let remaining = max_size.saturating_sub(buf.len());
                if chunk.len() >= remaining {
                    buf.extend_from_slice(&chunk[..remaining]);
                    break;
                }
                buf.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => {
                log::debug!("Body read error during client-side trace: {}", e);
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Traces server-side and client-side (meta refresh / script) redirects.
#[derive(Debug, Clone)]
pub struct RenderedRedirectTracer {
    client: reqwest::Client,
    max_hops: usize,
    timeout: Duration,
    max_body_size: usize,
}

impl RenderedRedirectTracer {
    /// Creates a tracer with the default hop limit, timeout, and body cap.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            max_hops: MAX_REDIRECT_HOPS,
            timeout: REDIRECT_TIMEOUT,
            max_body_size: MAX_RENDERED_BODY_SIZE,
        }
    }

    /// Overrides the maximum number of redirects followed.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Overrides the overall deadline for one trace.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn follow(&self, start_url: &str) -> Result<Trace, TraceError> {
        let mut chain = RedirectChain::new(start_url);
        let mut current = start_url.to_string();
        let mut redirects = 0usize;

        loop {
            let next = match fetch_hop(&self.client, &current).await? {
                HopOutcome::Redirect(next) => next,
                HopOutcome::Landed(resp) => {
                    if !resp.status().is_success() || !is_html(&resp) {
                        break;
                    }
                    let body = read_body_limited(resp, self.max_body_size).await;
                    match find_client_redirect(&body) {
                        Some(target) => {
                            let next = resolve_location(&current, &target)?;
                            log::debug!("Client-side redirect {} -> {}", current, next);
                            next
                        }
                        None => break,
                    }
                }
            };

            redirects += 1;
            if redirects > self.max_hops {
                return Err(TraceError::TooManyRedirects(self.max_hops));
            }
            if chain.push(next.clone()) == PushOutcome::Revisit {
                log::debug!("Redirect loop at {} while tracing {}", next, start_url);
                return Ok(Trace {
                    chain,
                    revisit: Some(next),
                });
            }
            current = next;
        }

        Ok(Trace {
            chain,
            revisit: None,
        })
    }
}

#[async_trait]
impl RedirectTracer for RenderedRedirectTracer {
    async fn trace(&self, url: &str) -> Result<Trace, TraceError> {
        tokio::time::timeout(self.timeout, self.follow(url))
            .await
            .map_err(|_| TraceError::Timeout)?
    }
}
