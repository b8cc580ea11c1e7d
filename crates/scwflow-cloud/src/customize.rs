//! Plan-time locality check
//!
//! Catches configurations such as a privilege in `fr-par` pointing at an
//! instance in `nl-ams` before any request is made.

use crate::config::ProviderConfig;
use crate::error::{CloudError, Result};
use crate::locality::{compare_localities, get_locality, parse_localized};
use crate::resource_data::ResourceDiff;

/// Checks that the listed sibling-id attributes live in the resource's locality.
///
/// Paths may contain `#` to visit every element of a list, e.g.
/// `private_network.#.private_network_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalityCheck {
    paths: Vec<String>,
}

impl LocalityCheck {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn check(&self, diff: &ResourceDiff, meta: &ProviderConfig) -> Result<()> {
        let expected = get_locality(diff, meta);

        for path in &self.paths {
            for (concrete, value) in diff.for_each_list_element(path) {
                let Some(value) = value.as_str() else {
                    continue;
                };
                // Bare ids carry no locality, nothing to compare.
                let Ok((locality, _)) = parse_localized(value) else {
                    continue;
                };
                if !compare_localities(&locality, &expected) {
                    tracing::debug!(
                        "Locality mismatch on {}: {} is not in {}",
                        concrete,
                        value,
                        expected
                    );
                    return Err(CloudError::LocalityMismatch {
                        attribute: concrete,
                        value: value.to_string(),
                        expected,
                    });
                }
            }
        }
        Ok(())
    }
}
