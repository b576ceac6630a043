//! Declared resource record and its accessor contract
//!
//! The host owns the record; the engine only reads and writes it through
//! [`ConfigStore`]. Every accessor reports presence explicitly, so an operator
//! asking for `false`, `0` or `""` is distinguishable from an omitted field.

use crate::kind::ResourceKind;
use crate::schema::Access;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Rejected field assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Value of one field before and after the pending change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChange {
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl FieldChange {
    pub fn has_changed(&self) -> bool {
        self.before != self.after
    }

    /// Both sides as non-empty strings
    pub fn as_strings(&self) -> (Option<String>, Option<String>) {
        (non_empty_str(self.before.as_ref()), non_empty_str(self.after.as_ref()))
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accessors the engine needs from the host's record
pub trait ConfigStore: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: Option<String>);

    /// Current value; `None` when the field is not present
    fn get(&self, field: &str) -> Option<&Value>;

    /// Assign a value. `Value::Null` removes the field.
    fn set(&mut self, field: &str, value: Value) -> Result<(), FieldError>;

    /// Last-known value versus the value being applied
    fn get_change(&self, field: &str) -> FieldChange;

    fn get_str(&self, field: &str) -> Option<String> {
        self.get(field).and_then(Value::as_str).map(str::to_string)
    }

    fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    fn get_int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    fn get_block(&self, field: &str) -> Option<Map<String, Value>> {
        self.get(field).and_then(Value::as_object).cloned()
    }

    fn has_change(&self, field: &str) -> bool {
        self.get_change(field).has_changed()
    }
}

/// Record for one declared resource instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    prior: Map<String, Value>,
}

impl ResourceData {
    /// Empty record with no remote counterpart
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            id: None,
            attributes: Map::new(),
            prior: Map::new(),
        }
    }

    /// Record for a resource about to be created from operator input.
    /// Defaults are applied and computed or unknown keys rejected.
    pub fn from_config(kind: ResourceKind, declared: Map<String, Value>) -> Result<Self, FieldError> {
        let attributes = kind
            .schema()
            .normalize_declared(declared)
            .map_err(|e| FieldError::new(kind.type_name(), e))?;
        Ok(Self {
            kind,
            id: None,
            attributes,
            prior: Map::new(),
        })
    }

    /// Record of a tracked resource with no pending change
    pub fn from_state(kind: ResourceKind, id: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
            prior: attributes.clone(),
            attributes,
        }
    }

    /// Record of a tracked resource with a pending change to `declared`.
    ///
    /// Operator-owned fields take their declared value (or become absent);
    /// optional+computed fields keep the last-known value unless declared;
    /// computed fields always keep the last-known value.
    pub fn planned(
        kind: ResourceKind,
        id: impl Into<String>,
        prior: Map<String, Value>,
        declared: Map<String, Value>,
    ) -> Result<Self, FieldError> {
        let schema = kind.schema();
        let declared = schema
            .normalize_declared(declared)
            .map_err(|e| FieldError::new(kind.type_name(), e))?;

        let mut attributes = Map::new();
        for spec in schema.fields.iter() {
            let value = match spec.access {
                Access::Required | Access::Optional => declared.get(spec.name),
                Access::OptionalComputed => {
                    declared.get(spec.name).or_else(|| prior.get(spec.name))
                }
                Access::Computed => prior.get(spec.name),
            };
            if let Some(value) = value {
                attributes.insert(spec.name.to_string(), value.clone());
            }
        }

        Ok(Self {
            kind,
            id: Some(id.into()),
            attributes,
            prior,
        })
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Accept the current attributes as the last-known state
    pub fn commit(&mut self) {
        self.prior = self.attributes.clone();
    }
}

impl ConfigStore for ResourceData {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id.filter(|id| !id.is_empty());
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field).filter(|v| !v.is_null())
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        let spec = self
            .kind
            .schema()
            .field(field)
            .ok_or_else(|| FieldError::new(field, "not part of the schema"))?;
        spec.check_type(&value)
            .map_err(|message| FieldError::new(field, message))?;

        if value.is_null() {
            self.attributes.remove(field);
        } else {
            self.attributes.insert(field.to_string(), value);
        }
        Ok(())
    }

    fn get_change(&self, field: &str) -> FieldChange {
        FieldChange {
            before: self.prior.get(field).filter(|v| !v.is_null()).cloned(),
            after: self.get(field).cloned(),
        }
    }
}
