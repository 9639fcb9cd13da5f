//! RDAP response parsing.

use chrono::{DateTime, Utc};

use super::types::{RdapDomain, RdapEntity, RegistrationRecord};

/// Converts an RDAP domain object into a registration record.
pub(crate) fn convert_rdap(domain: &RdapDomain) -> RegistrationRecord {
    let event_date = |action: &str| {
        domain
            .events
            .iter()
            .find(|e| e.event_action.eq_ignore_ascii_case(action))
            .and_then(|e| parse_date_string(&e.event_date))
    };

    RegistrationRecord {
        creation_date: event_date("registration"),
        expiration_date: event_date("expiration"),
        updated_date: event_date("last changed"),
        registrar: find_entity(&domain.entities, "registrar").and_then(vcard_name),
        country: find_entity(&domain.entities, "registrant").and_then(vcard_country),
    }
}

/// Depth-first search for the first entity carrying a role.
fn find_entity<'a>(entities: &'a [RdapEntity], role: &str) -> Option<&'a RdapEntity> {
    for entity in entities {
        if entity.roles.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            return Some(entity);
        }
        if let Some(found) = find_entity(&entity.entities, role) {
            return Some(found);
        }
    }
    None
}

/// jCard properties: `["vcard", [[name, params, type, value], ...]]`.
fn vcard_properties(entity: &RdapEntity) -> Vec<&serde_json::Value> {
    entity
        .vcard_array
        .as_ref()
        .and_then(|v| v.get(1))
        .and_then(|v| v.as_array())
        .map(|props| props.iter().collect())
        .unwrap_or_default()
}

fn vcard_name(entity: &RdapEntity) -> Option<String> {
    vcard_properties(entity).into_iter().find_map(|prop| {
        if prop.get(0)?.as_str()? != "fn" {
            return None;
        }
        let name = prop.get(3)?.as_str()?.trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

fn vcard_country(entity: &RdapEntity) -> Option<String> {
    vcard_properties(entity).into_iter().find_map(|prop| {
        if prop.get(0)?.as_str()? != "adr" {
            return None;
        }
        if let Some(cc) = prop.get(1).and_then(|p| p.get("cc")).and_then(|c| c.as_str()) {
            return Some(cc.to_uppercase());
        }
        // Structured address: the last component is the country name
        let country = prop.get(3)?.as_array()?.last()?.as_str()?.trim();
        (!country.is_empty()).then(|| country.to_string())
    })
}

/// Attempts to parse a date string in various formats
pub(crate) fn parse_date_string(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    // Common WHOIS date formats
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d",
        "%d-%b-%Y",
        "%d/%m/%Y",
    ];

    for format in &formats {
        if let Ok(naive_dt) = chrono::NaiveDateTime::parse_from_str(date_str, format) {
            return Some(naive_dt.and_utc());
        }
        if let Ok(naive_date) = chrono::NaiveDate::parse_from_str(date_str, format) {
            return Some(naive_date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}
