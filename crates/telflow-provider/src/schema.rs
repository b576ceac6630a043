//! Attribute schemas for each resource kind
//!
//! A schema names every field a declared record may carry, its value type,
//! and whether the operator or the remote system owns it. The record store
//! type-checks assignments against it and the controller validates declared
//! input with it before any remote call is made.

use serde_json::{Map, Value};

pub const HTTP_METHODS: &[&str] = &["GET", "POST"];
pub const EMERGENCY_STATUSES: &[&str] = &["Active", "Inactive"];
pub const RECEIVE_MODES: &[&str] = &["voice", "fax"];
pub const SUBACCOUNT_STATUSES: &[&str] = &["active", "suspended", "closed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bool,
    Int,
    /// Zero-or-one nested record.
    Block(&'static [FieldSpec]),
}

impl FieldType {
    fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Block(_) => "block",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Required,
    Optional,
    /// Only ever written from remote responses.
    Computed,
    /// Declared by the operator, refreshed from the remote on read.
    OptionalComputed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Str(&'static str),
    Bool(bool),
    Int(i64),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Str(s) => Value::String(s.to_string()),
            DefaultValue::Bool(b) => Value::Bool(b),
            DefaultValue::Int(i) => Value::from(i),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub access: Access,
    pub default: Option<DefaultValue>,
    pub one_of: &'static [&'static str],
    pub ignore_case: bool,
    pub range: Option<(i64, i64)>,
    pub sensitive: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            access: Access::Optional,
            default: None,
            one_of: &[],
            ignore_case: false,
            range: None,
            sensitive: false,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub const fn int(name: &'static str) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub const fn block(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self::new(name, FieldType::Block(fields))
    }

    pub const fn required(mut self) -> Self {
        self.access = Access::Required;
        self
    }

    pub const fn computed(mut self) -> Self {
        self.access = Access::Computed;
        self
    }

    pub const fn optional_computed(mut self) -> Self {
        self.access = Access::OptionalComputed;
        self
    }

    pub const fn default_str(mut self, value: &'static str) -> Self {
        self.default = Some(DefaultValue::Str(value));
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.one_of = values;
        self
    }

    pub const fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn is_declarable(&self) -> bool {
        !matches!(self.access, Access::Computed)
    }

    pub fn sub_field(&self, name: &str) -> Option<&'static FieldSpec> {
        match self.ty {
            FieldType::Block(fields) => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    /// Type check only. Null is accepted and means "absent".
    pub fn check_type(&self, value: &Value) -> Result<(), String> {
        let ok = match (&self.ty, value) {
            (_, Value::Null) => true,
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Bool, Value::Bool(_)) => true,
            (FieldType::Int, Value::Number(n)) => n.is_i64(),
            (FieldType::Block(fields), Value::Object(map)) => {
                for (key, sub_value) in map {
                    let spec = fields
                        .iter()
                        .find(|f| f.name == key.as_str())
                        .ok_or_else(|| format!("unknown attribute '{}.{}'", self.name, key))?;
                    spec.check_type(sub_value)
                        .map_err(|e| format!("{} (in '{}')", e, self.name))?;
                }
                true
            }
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            Err(format!(
                "expected {} for '{}', got {}",
                self.ty.name(),
                self.name,
                value_type_name(value)
            ))
        }
    }

    /// Value constraints (allowed values, integer ranges) on declared input.
    pub fn check_constraints(&self, value: &Value) -> Result<(), String> {
        if let (FieldType::Block(fields), Value::Object(map)) = (&self.ty, value) {
            for spec in fields.iter() {
                if let Some(sub_value) = map.get(spec.name) {
                    spec.check_constraints(sub_value)
                        .map_err(|e| format!("{} (in '{}')", e, self.name))?;
                }
            }
            return Ok(());
        }

        if !self.one_of.is_empty() {
            if let Value::String(s) = value {
                let allowed = self.one_of.iter().any(|candidate| {
                    if self.ignore_case {
                        candidate.eq_ignore_ascii_case(s)
                    } else {
                        *candidate == s.as_str()
                    }
                });
                if !allowed {
                    return Err(format!(
                        "'{}' must be one of [{}], got '{}'",
                        self.name,
                        self.one_of.join(", "),
                        s
                    ));
                }
            }
        }

        if let (Some((min, max)), Some(n)) = (self.range, value.as_i64()) {
            if n < min || n > max {
                return Err(format!(
                    "'{}' must be between {} and {}, got {}",
                    self.name, min, max, n
                ));
            }
        }

        Ok(())
    }

    /// Fill sub-field defaults of a declared block.
    pub fn with_block_defaults(&self, value: Value) -> Value {
        match (&self.ty, value) {
            (FieldType::Block(fields), Value::Object(mut map)) => {
                for spec in fields.iter() {
                    if let Some(default) = spec.default {
                        map.entry(spec.name.to_string())
                            .or_insert_with(|| default.to_value());
                    }
                }
                Value::Object(map)
            }
            (_, other) => other,
        }
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug)]
pub struct Schema {
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Apply declared defaults and reject computed or unknown keys.
    pub fn normalize_declared(&self, declared: Map<String, Value>) -> Result<Map<String, Value>, String> {
        let mut out = Map::new();
        for (key, value) in declared {
            let spec = self
                .field(&key)
                .ok_or_else(|| format!("unknown attribute '{}'", key))?;
            if !spec.is_declarable() {
                return Err(format!("'{}' is computed and cannot be declared", key));
            }
            spec.check_type(&value)?;
            if value.is_null() {
                continue;
            }
            out.insert(key, spec.with_block_defaults(value));
        }
        for spec in self.fields.iter() {
            if let Some(default) = spec.default {
                out.entry(spec.name.to_string())
                    .or_insert_with(|| default.to_value());
            }
        }
        Ok(out)
    }

    /// Required fields present and every present value within constraints.
    pub fn validate(&self, attributes: &Map<String, Value>) -> Result<(), String> {
        for spec in self.fields.iter() {
            match attributes.get(spec.name) {
                None | Some(Value::Null) if spec.access == Access::Required => {
                    return Err(format!("'{}' is required", spec.name));
                }
                Some(value) if spec.is_declarable() => spec.check_constraints(value)?,
                _ => {}
            }
        }
        Ok(())
    }
}

// ============ Phone number ============

const SMS_FIELDS: &[FieldSpec] = &[
    FieldSpec::string("application_sid").optional_computed(),
    FieldSpec::string("primary_http_method")
        .optional_computed()
        .default_str("POST")
        .one_of(HTTP_METHODS),
    FieldSpec::string("primary_url").optional_computed(),
    FieldSpec::string("fallback_http_method")
        .optional_computed()
        .default_str("POST")
        .one_of(HTTP_METHODS),
    FieldSpec::string("fallback_url").optional_computed(),
];

const VOICE_FIELDS: &[FieldSpec] = &[
    FieldSpec::string("application_sid").optional_computed(),
    FieldSpec::string("primary_http_method")
        .optional_computed()
        .default_str("POST")
        .one_of(HTTP_METHODS),
    FieldSpec::string("primary_url").optional_computed(),
    FieldSpec::string("fallback_http_method")
        .optional_computed()
        .default_str("POST")
        .one_of(HTTP_METHODS),
    FieldSpec::string("fallback_url").optional_computed(),
    FieldSpec::boolean("caller_id_enabled").optional_computed(),
    FieldSpec::string("receive_mode")
        .optional_computed()
        .one_of(RECEIVE_MODES),
];

const STATUS_CALLBACK_FIELDS: &[FieldSpec] = &[
    FieldSpec::string("url").optional_computed(),
    FieldSpec::string("http_method")
        .optional_computed()
        .default_str("POST")
        .one_of(HTTP_METHODS),
];

const EMERGENCY_FIELDS: &[FieldSpec] = &[
    FieldSpec::string("status")
        .optional_computed()
        .default_str("Active")
        .one_of(EMERGENCY_STATUSES)
        .ignore_case(),
    FieldSpec::string("address_sid").optional_computed(),
];

pub static PHONE_NUMBER: Schema = Schema {
    fields: &[
        FieldSpec::string("sid").computed(),
        FieldSpec::string("search"),
        FieldSpec::string("area_code"),
        FieldSpec::string("country_code").required(),
        FieldSpec::string("number").computed(),
        FieldSpec::string("friendly_name").optional_computed(),
        FieldSpec::string("service_sid"),
        FieldSpec::string("address_sid").optional_computed(),
        FieldSpec::string("trunk_sid").optional_computed(),
        FieldSpec::string("identity_sid").optional_computed(),
        FieldSpec::string("date_created").computed(),
        FieldSpec::string("date_updated").computed(),
        FieldSpec::string("address_requirements").computed(),
        FieldSpec::boolean("is_beta").computed(),
        FieldSpec::boolean("is_mms_capable").computed(),
        FieldSpec::boolean("is_sms_capable").computed(),
        FieldSpec::boolean("is_voice_capable").computed(),
        FieldSpec::block("sms", SMS_FIELDS).optional_computed(),
        FieldSpec::block("voice", VOICE_FIELDS).optional_computed(),
        FieldSpec::block("status_callback", STATUS_CALLBACK_FIELDS).optional_computed(),
        FieldSpec::block("emergency", EMERGENCY_FIELDS).optional_computed(),
    ],
};

// ============ Messaging service ============

pub static MESSAGING_SERVICE: Schema = Schema {
    fields: &[
        FieldSpec::string("sid").computed(),
        FieldSpec::string("account_sid").computed(),
        FieldSpec::string("friendly_name").optional_computed(),
        FieldSpec::string("date_created").computed(),
        FieldSpec::string("date_updated").computed(),
        FieldSpec::string("inbound_request_url").optional_computed(),
        FieldSpec::string("inbound_method")
            .optional_computed()
            .default_str("POST")
            .one_of(HTTP_METHODS),
        FieldSpec::string("fallback_url").optional_computed(),
        FieldSpec::string("fallback_method")
            .optional_computed()
            .default_str("POST")
            .one_of(HTTP_METHODS),
        FieldSpec::string("status_callback").optional_computed(),
        FieldSpec::boolean("sticky_sender").optional_computed(),
        FieldSpec::boolean("mms_converter").optional_computed(),
        FieldSpec::boolean("smart_encoding").optional_computed(),
        FieldSpec::boolean("fallback_to_long_code").optional_computed(),
        FieldSpec::boolean("area_code_geomatch").optional_computed(),
        FieldSpec::boolean("synchronous_validation").optional_computed(),
        FieldSpec::int("validity_period")
            .optional_computed()
            .range(1, 14_400),
    ],
};

// ============ Subaccount ============

pub static SUBACCOUNT: Schema = Schema {
    fields: &[
        FieldSpec::string("parent_account_sid").computed(),
        FieldSpec::string("friendly_name").optional_computed(),
        FieldSpec::string("status")
            .optional_computed()
            .default_str("active")
            .one_of(SUBACCOUNT_STATUSES),
        FieldSpec::string("auth_token").computed().sensitive(),
        FieldSpec::string("date_created").computed(),
        FieldSpec::string("date_updated").computed(),
    ],
};

// ============ API key ============

pub static API_KEY: Schema = Schema {
    fields: &[
        FieldSpec::string("sid").computed(),
        FieldSpec::string("friendly_name").optional_computed(),
        FieldSpec::string("secret").computed().sensitive(),
        FieldSpec::string("date_created").computed(),
        FieldSpec::string("date_updated").computed(),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_normalize_applies_defaults() {
        let declared = as_map(json!({
            "country_code": "US",
            "sms": { "primary_url": "https://example.com/sms" }
        }));
        let normalized = PHONE_NUMBER.normalize_declared(declared).unwrap();

        let sms = normalized["sms"].as_object().unwrap();
        assert_eq!(sms["primary_http_method"], "POST");
        assert_eq!(sms["fallback_http_method"], "POST");
        assert_eq!(sms["primary_url"], "https://example.com/sms");
        // Absent blocks stay absent
        assert!(!normalized.contains_key("voice"));
    }

    #[test]
    fn test_normalize_rejects_computed() {
        let declared = as_map(json!({ "country_code": "US", "number": "+15005550006" }));
        let err = PHONE_NUMBER.normalize_declared(declared).unwrap_err();
        assert!(err.contains("computed"));
    }

    #[test]
    fn test_type_mismatch_in_block() {
        let spec = PHONE_NUMBER.field("voice").unwrap();
        let err = spec
            .check_type(&json!({ "caller_id_enabled": "yes" }))
            .unwrap_err();
        assert!(err.contains("caller_id_enabled"));
    }

    #[test]
    fn test_validate_required_and_constraints() {
        assert!(PHONE_NUMBER.validate(&Map::new()).unwrap_err().contains("country_code"));

        let bad_method = as_map(json!({
            "country_code": "US",
            "voice": { "primary_http_method": "PUT" }
        }));
        assert!(PHONE_NUMBER.validate(&bad_method).is_err());

        let lowercase_status = as_map(json!({
            "country_code": "US",
            "emergency": { "status": "inactive" }
        }));
        assert!(PHONE_NUMBER.validate(&lowercase_status).is_ok());

        let out_of_range = as_map(json!({ "validity_period": 0 }));
        assert!(MESSAGING_SERVICE.validate(&out_of_range).is_err());
    }
}
