//! Localized identifiers
//!
//! Resources are addressed by an opaque string that embeds the locality they
//! live in:
//!
//! ```text
//! regional  = region "/" uuid
//! composite = region "/" uuid "/" name
//! triple    = region "/" uuid "/" name "/" name
//! ```
//!
//! The backend accepts bare ids but users may paste either form, so every
//! user-supplied id goes through [`expand_id`] before it is sent, and every
//! server id is prefixed with [`new_regional_string`] before it is stored.

use crate::config::ProviderConfig;
use crate::error::{CloudError, Result};
use crate::resource_data::ResourceDiff;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static REGION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}-[a-z]{3}$").expect("valid region regex"));
static ZONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}-[a-z]{3}-[0-9]+$").expect("valid zone regex"));

pub fn is_region(s: &str) -> bool {
    REGION_RE.is_match(s)
}

pub fn is_zone(s: &str) -> bool {
    ZONE_RE.is_match(s)
}

pub fn is_locality(s: &str) -> bool {
    is_region(s) || is_zone(s)
}

/// Region a locality belongs to (`fr-par-1` → `fr-par`)
pub fn region_of(locality: &str) -> &str {
    if is_zone(locality) {
        match locality.rfind('-') {
            Some(idx) => &locality[..idx],
            None => locality,
        }
    } else {
        locality
    }
}

/// An id of the form `region/uuid`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionalId {
    pub region: String,
    pub id: String,
}

impl fmt::Display for RegionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.id)
    }
}

impl FromStr for RegionalId {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        parse_regional(s)
    }
}

pub fn new_regional(region: impl Into<String>, id: impl Into<String>) -> RegionalId {
    RegionalId {
        region: region.into(),
        id: id.into(),
    }
}

pub fn new_regional_string(region: &str, id: &str) -> String {
    new_regional(region, id).to_string()
}

/// Splits `region/uuid`; any other segment count is a `MalformedId`
pub fn parse_regional(s: &str) -> Result<RegionalId> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 2 {
        return Err(CloudError::malformed_id(
            s,
            format!("expected 2 segments (region/id), got {}", parts.len()),
        ));
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(CloudError::malformed_id(s, "empty segment"));
    }
    Ok(new_regional(parts[0], parts[1]))
}

/// Splits off the leading locality; the tail may itself contain `/`
pub fn parse_localized(s: &str) -> Result<(String, String)> {
    let (locality, tail) = s
        .split_once('/')
        .ok_or_else(|| CloudError::malformed_id(s, "missing locality prefix"))?;
    if locality.is_empty() || tail.is_empty() {
        return Err(CloudError::malformed_id(s, "empty segment"));
    }
    Ok((locality.to_string(), tail.to_string()))
}

/// Strips a leading `region/` (or `zone/`) prefix, if any
pub fn expand_id(s: &str) -> String {
    match parse_localized(s) {
        Ok((locality, tail)) if is_locality(&locality) => tail,
        _ => s.to_string(),
    }
}

/// True when both localities are in the same region
pub fn compare_localities(a: &str, b: &str) -> bool {
    a == b || region_of(a) == region_of(b)
}

/// Locality of the resource under plan: its `region` attribute, else the
/// provider default
pub fn get_locality(diff: &ResourceDiff, meta: &ProviderConfig) -> String {
    diff.get_str("region")
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| meta.region.clone())
}
