//! Registration data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Registration metadata for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Domain creation date
    pub creation_date: Option<DateTime<Utc>>,
    /// Domain expiration date
    pub expiration_date: Option<DateTime<Utc>>,
    /// Last change to the registration
    pub updated_date: Option<DateTime<Utc>>,
    /// Registrar name
    pub registrar: Option<String>,
    /// Registrant country (ISO 3166-1 alpha-2 where available)
    pub country: Option<String>,
}

/// A cached lookup on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegistrationCacheEntry {
    pub(crate) record: RegistrationRecord,
    pub(crate) cached_at: SystemTime,
    pub(crate) domain: String,
}

/// Subset of an RDAP domain response that we read.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RdapDomain {
    #[serde(default)]
    pub(crate) events: Vec<RdapEvent>,
    #[serde(default)]
    pub(crate) entities: Vec<RdapEntity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RdapEvent {
    pub(crate) event_action: String,
    pub(crate) event_date: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RdapEntity {
    #[serde(default)]
    pub(crate) roles: Vec<String>,
    #[serde(default)]
    pub(crate) vcard_array: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) entities: Vec<RdapEntity>,
}
