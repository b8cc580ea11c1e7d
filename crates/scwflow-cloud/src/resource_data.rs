//! Attribute bags exchanged with the host
//!
//! [`ResourceData`] is what a controller operation reads its desired
//! attributes from and writes observed state into. [`ResourceDiff`] is the
//! read-only plan-time view handed to customizers.
//!
//! Attribute names are strings only here, at the host boundary. Controllers
//! decode the whole bag into their own typed structs with
//! [`ResourceData::decode`].

use crate::error::{CloudError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Host operation being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Per-operation timeouts declared by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Option<Duration>,
    pub read: Option<Duration>,
    pub update: Option<Duration>,
    pub delete: Option<Duration>,
    pub default: Option<Duration>,
}

impl Timeouts {
    pub fn get(&self, op: Operation) -> Duration {
        let specific = match op {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        };
        specific.or(self.default).unwrap_or(DEFAULT_TIMEOUT)
    }
}

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Drops null entries so `#[serde(default)]` applies to unset attributes
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

fn is_unset(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Attributes of one resource instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,

    /// Attributes as last persisted by the host
    prior: Map<String, Value>,

    /// Desired attributes, overwritten by `set` as state is observed
    attributes: Map<String, Value>,

    timeouts: Timeouts,
}

impl ResourceData {
    /// Data for a resource about to be created
    pub fn new(planned: Value) -> Self {
        Self {
            id: None,
            prior: Map::new(),
            attributes: as_object(planned),
            timeouts: Timeouts::default(),
        }
    }

    /// Data for an existing resource (read, delete, import)
    pub fn from_state(id: impl Into<String>, state: Value) -> Self {
        let state = as_object(state);
        Self {
            id: Some(id.into()),
            prior: state.clone(),
            attributes: state,
            timeouts: Timeouts::default(),
        }
    }

    /// Data for an update from `prior` to `planned`
    pub fn for_update(id: impl Into<String>, prior: Value, planned: Value) -> Self {
        Self {
            id: Some(id.into()),
            prior: as_object(prior),
            attributes: as_object(planned),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Id of an existing resource; a missing id is a malformed-id error
    pub fn require_id(&self) -> Result<&str> {
        self.id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CloudError::malformed_id("", "resource has no identifier"))
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Marks the resource as gone; the host drops it from state
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn timeout(&self, op: Operation) -> Duration {
        self.timeouts.get(op)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_raw(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get::<String>(key)
    }

    /// Decodes the desired attributes into a typed struct
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(strip_nulls(Value::Object(
            self.attributes.clone(),
        )))?)
    }

    /// Decodes the previously persisted attributes into a typed struct
    pub fn decode_prior<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(strip_nulls(Value::Object(
            self.prior.clone(),
        )))?)
    }

    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<()> {
        self.attributes.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn has_change(&self, key: &str) -> bool {
        let old = self.prior.get(key);
        let new = self.attributes.get(key);
        if is_unset(old) && is_unset(new) {
            return false;
        }
        old != new
    }

    pub fn has_changes(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.has_change(k))
    }

    pub fn get_change(&self, key: &str) -> (Option<Value>, Option<Value>) {
        (
            self.prior.get(key).filter(|v| !v.is_null()).cloned(),
            self.attributes.get(key).filter(|v| !v.is_null()).cloned(),
        )
    }
}

/// Plan-time view of a resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDiff {
    id: Option<String>,
    config: Value,
}

impl ResourceDiff {
    pub fn new(config: Value) -> Self {
        Self { id: None, config }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Value at a dotted path such as `private_network.0.private_network_id`
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        if current.is_null() { None } else { Some(current) }
    }

    pub fn get_str(&self, path: &str) -> Option<String> {
        self.get(path).and_then(|v| v.as_str()).map(str::to_string)
    }

    /// Expands every `#` in `path` over the matching list and returns each
    /// concrete path with its value. Missing or null values are skipped.
    pub fn for_each_list_element(&self, path: &str) -> Vec<(String, Value)> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut out = Vec::new();
        collect(&self.config, &segments, Vec::new(), &mut out);
        out
    }
}

fn collect(value: &Value, segments: &[&str], prefix: Vec<String>, out: &mut Vec<(String, Value)>) {
    let Some((head, rest)) = segments.split_first() else {
        if !value.is_null() {
            out.push((prefix.join("."), value.clone()));
        }
        return;
    };

    match (value, *head) {
        (Value::Array(items), "#") => {
            for (i, item) in items.iter().enumerate() {
                let mut next = prefix.clone();
                next.push(i.to_string());
                collect(item, rest, next, out);
            }
        }
        (Value::Array(items), index) => {
            if let Some(item) = index.parse::<usize>().ok().and_then(|i| items.get(i)) {
                let mut next = prefix;
                next.push(index.to_string());
                collect(item, rest, next, out);
            }
        }
        (Value::Object(map), key) => {
            if let Some(item) = map.get(key) {
                let mut next = prefix;
                next.push(key.to_string());
                collect(item, rest, next, out);
            }
        }
        _ => {}
    }
}
