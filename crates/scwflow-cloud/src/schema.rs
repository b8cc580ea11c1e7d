//! Resource schema description handed to the host

use crate::diff::DiffSuppressFn;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute value type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Int,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    /// Nested block, at most `max_items` elements
    Block {
        attributes: BTreeMap<String, Attribute>,
        max_items: Option<usize>,
    },
}

/// Validation hook run by the host on the configured value
pub type ValidateFn = fn(&Value) -> Result<(), String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Optional, filled in by the provider when absent
    OptionalComputed,
    Computed,
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub kind: AttributeType,
    pub presence: Presence,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: String,
    pub validate: Option<ValidateFn>,
    pub diff_suppress: Option<DiffSuppressFn>,
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.presence == other.presence
            && self.force_new == other.force_new
            && self.sensitive == other.sensitive
            && self.default == other.default
            && self.description == other.description
    }
}

impl Eq for Attribute {}

impl Attribute {
    pub fn new(kind: AttributeType, presence: Presence) -> Self {
        Self {
            kind,
            presence,
            force_new: false,
            sensitive: false,
            default: None,
            description: String::new(),
            validate: None,
            diff_suppress: None,
        }
    }

    pub fn required_string() -> Self {
        Self::new(AttributeType::String, Presence::Required)
    }

    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, Presence::Optional)
    }

    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, Presence::Computed)
    }

    pub fn required_int() -> Self {
        Self::new(AttributeType::Int, Presence::Required)
    }

    pub fn optional_int() -> Self {
        Self::new(AttributeType::Int, Presence::Optional)
    }

    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool, Presence::Optional)
    }

    /// `region` attribute shared by every regional resource
    pub fn region() -> Self {
        Self::optional_string()
            .computed()
            .force_new()
            .describe("The region you want to attach the resource to")
    }

    /// `project_id` attribute shared by every project-scoped resource
    pub fn project_id() -> Self {
        Self::optional_string()
            .computed()
            .force_new()
            .describe("The project ID the resource is associated to")
    }

    pub fn block(attributes: BTreeMap<String, Attribute>, max_items: Option<usize>) -> Self {
        Self::new(
            AttributeType::Block {
                attributes,
                max_items,
            },
            Presence::Optional,
        )
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn computed(mut self) -> Self {
        self.presence = match self.presence {
            Presence::Required | Presence::Computed => Presence::Computed,
            Presence::Optional | Presence::OptionalComputed => Presence::OptionalComputed,
        };
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate_with(mut self, validate: ValidateFn) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn suppress_diff(mut self, suppress: DiffSuppressFn) -> Self {
        self.diff_suppress = Some(suppress);
        self
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.presence, Presence::Computed | Presence::OptionalComputed)
    }
}

/// Schema of one resource or data source kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Runs every attribute validator against a configuration object
    pub fn validate(&self, config: &Value) -> crate::Result<()> {
        for (name, attribute) in &self.attributes {
            let value = config.get(name).filter(|v| !v.is_null());
            match value {
                None if attribute.is_required() => {
                    return Err(crate::CloudError::invalid_attribute(
                        name.as_str(),
                        format!("the argument {:?} is required", name),
                    ));
                }
                Some(v) => {
                    if let Some(validate) = attribute.validate {
                        validate(v)
                            .map_err(|msg| crate::CloudError::invalid_attribute(name.as_str(), msg))?;
                    }
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Whether `old` and `new` of `name` should be treated as equal
    pub fn suppresses(&self, name: &str, old: &str, new: &str) -> bool {
        self.get(name)
            .and_then(|a| a.diff_suppress)
            .map(|suppress| suppress(old, new))
            .unwrap_or(false)
    }
}

/// Validator helpers
pub mod validators {
    use serde_json::Value;

    pub fn non_empty_string(value: &Value) -> Result<(), String> {
        match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(()),
            _ => Err("expected a non-empty string".to_string()),
        }
    }

    pub fn positive_int(value: &Value) -> Result<(), String> {
        match value.as_i64() {
            Some(n) if n > 0 => Ok(()),
            _ => Err(format!("expected a positive integer, got {}", value)),
        }
    }

    pub fn region(value: &Value) -> Result<(), String> {
        match value.as_str() {
            Some(s) if crate::locality::is_region(s) => Ok(()),
            _ => Err(format!("{} is not a valid region", value)),
        }
    }

    pub fn duration(value: &Value) -> Result<(), String> {
        let s = value.as_str().ok_or_else(|| "expected a duration string".to_string())?;
        crate::duration::parse_duration(s)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Schema {
        Schema::new()
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "engine",
                Attribute::required_string()
                    .force_new()
                    .suppress_diff(crate::diff::ignore_case),
            )
            .with_attribute(
                "size",
                Attribute::optional_int().validate_with(validators::positive_int),
            )
            .with_attribute("region", Attribute::region())
    }

    #[test]
    fn test_builder_flags() {
        let schema = sample();
        assert!(schema.get("engine").unwrap().force_new);
        assert!(schema.get("region").unwrap().is_computed());
        assert!(!schema.get("region").unwrap().is_required());
    }

    #[test]
    fn test_validate() {
        let schema = sample();
        assert!(schema.validate(&json!({ "name": "a", "engine": "x" })).is_ok());

        let err = schema.validate(&json!({ "engine": "x" })).unwrap_err();
        assert_eq!(err.attribute(), Some("name"));

        let err = schema
            .validate(&json!({ "name": "a", "engine": "x", "size": 0 }))
            .unwrap_err();
        assert_eq!(err.attribute(), Some("size"));
    }

    #[test]
    fn test_suppresses() {
        let schema = sample();
        assert!(schema.suppresses("engine", "FerretDB-1", "ferretdb-1"));
        assert!(!schema.suppresses("name", "a", "A"));
    }
}
