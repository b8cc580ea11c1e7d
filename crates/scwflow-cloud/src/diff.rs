//! Diff suppressors
//!
//! Consulted by the host while computing a plan: when one of these returns
//! `true` for `(old, new)` the attribute is treated as unchanged.

use crate::duration::parse_duration;
use crate::locality::{compare_localities, expand_id, is_locality, parse_localized};

/// Signature shared by all suppressors
pub type DiffSuppressFn = fn(old: &str, new: &str) -> bool;

pub fn ignore_case(old: &str, new: &str) -> bool {
    old.to_lowercase() == new.to_lowercase()
}

pub fn ignore_case_and_hyphen(old: &str, new: &str) -> bool {
    let normalize = |s: &str| s.to_lowercase().replace('-', "_");
    normalize(old) == normalize(new)
}

fn prefix(s: &str) -> Option<String> {
    parse_localized(s)
        .ok()
        .map(|(locality, _)| locality)
        .filter(|l| is_locality(l))
}

/// `fr-par/<uuid>` and `<uuid>` are the same id. When both sides carry a
/// prefix the localities must agree as well.
pub fn locality(old: &str, new: &str) -> bool {
    if old == new {
        return true;
    }
    if let (Some(a), Some(b)) = (prefix(old), prefix(new)) {
        if !compare_localities(&a, &b) {
            return false;
        }
    }
    expand_id(old) == expand_id(new)
}

/// `60s` and `1m` are the same duration
pub fn duration(old: &str, new: &str) -> bool {
    if old == new {
        return true;
    }
    match (parse_duration(old), parse_duration(new)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
