//! On-disk registration cache.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::types::{RegistrationCacheEntry, RegistrationRecord};

/// Cache TTL: 7 days (registration data changes infrequently)
pub(crate) const CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

fn cache_file(cache_path: &Path, domain: &str) -> PathBuf {
    cache_path.join(format!("{}.json", domain.replace('.', "_")))
}

/// Loads a cached record, discarding it when older than the TTL.
pub(crate) fn load_from_cache(cache_path: &Path, domain: &str) -> Result<Option<RegistrationRecord>> {
    let file = cache_file(cache_path, domain);
    if !file.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&file).context("Failed to read cache file")?;
    let entry: RegistrationCacheEntry =
        serde_json::from_str(&content).context("Failed to parse cache file")?;

    let age = entry.cached_at.elapsed().unwrap_or_default();
    if age.as_secs() > CACHE_TTL_SECS || entry.domain != domain {
        let _ = std::fs::remove_file(&file);
        return Ok(None);
    }

    Ok(Some(entry.record))
}

/// Writes a record to the cache directory, creating it if needed.
pub(crate) fn save_to_cache(cache_path: &Path, domain: &str, record: &RegistrationRecord) -> Result<()> {
    std::fs::create_dir_all(cache_path).context("Failed to create cache directory")?;

    let entry = RegistrationCacheEntry {
        record: record.clone(),
        cached_at: SystemTime::now(),
        domain: domain.to_string(),
    };
    let content =
        serde_json::to_string_pretty(&entry).context("Failed to serialize cache entry")?;
    std::fs::write(cache_file(cache_path, domain), content).context("Failed to write cache file")?;

    Ok(())
}
