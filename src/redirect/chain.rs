//! Ordered redirect chain with revisit detection.

use serde::Serialize;

/// Result of appending a hop to a [`RedirectChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The URL was new and has been appended.
    Appended,
    /// The URL was already in the chain; nothing was appended.
    Revisit,
}

/// Ordered sequence of visited URLs.
///
/// Never empty and never holds the same URL twice: pushing a URL that was
/// already visited reports [`PushOutcome::Revisit`] instead of re-adding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RedirectChain {
    hops: Vec<String>,
}

impl RedirectChain {
    /// A chain of one: the starting URL.
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            hops: vec![start.into()],
        }
    }

    /// Appends a hop unless it was already visited.
    pub fn push(&mut self, url: impl Into<String>) -> PushOutcome {
        let url = url.into();
        if self.contains(&url) {
            return PushOutcome::Revisit;
        }
        self.hops.push(url);
        PushOutcome::Appended
    }

    /// Whether the URL has already been visited.
    pub fn contains(&self, url: &str) -> bool {
        self.hops.iter().any(|h| h == url)
    }

    /// The first URL.
    pub fn start(&self) -> &str {
        &self.hops[0]
    }

    /// The most recently visited URL.
    pub fn last(&self) -> &str {
        self.hops.last().map(String::as_str).unwrap_or_else(|| self.start())
    }

    /// Number of hops, counting the start URL.
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// The hops as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.hops
    }
}
