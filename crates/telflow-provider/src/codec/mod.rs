//! Attribute codec
//!
//! Maps declared records to remote request parameters (`encode`) and remote
//! objects back onto records (`decode`).
//!
//! - `encode` is sparse: only fields present on the record are sent.
//!   Sending `""` is how an operator clears a remote value.
//! - `decode` is total and always writes every composite block, filled
//!   with remote values or their defaults. It stops at the first rejected
//!   assignment; after a decode error the record must not be trusted.

mod api_key;
mod messaging_service;
mod phone_number;
mod subaccount;
mod timestamp;

pub use api_key::ApiKeyCodec;
pub use messaging_service::MessagingServiceCodec;
pub use phone_number::PhoneNumberCodec;
pub use subaccount::SubaccountCodec;
pub use timestamp::{TIMESTAMP_FORMAT, normalize_timestamp};

use crate::client::Params;
use crate::error::{ProviderError, Result};
use crate::store::ConfigStore;
use serde_json::{Map, Value};

pub trait AttributeCodec {
    type Remote;

    fn encode(store: &dyn ConfigStore) -> Params;

    fn decode(remote: &Self::Remote, store: &mut dyn ConfigStore) -> Result<()>;
}

/// Record field → request parameter
pub(crate) type FieldParams = &'static [(&'static str, &'static str)];

fn scalar_to_param(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn encode_fields(store: &dyn ConfigStore, params: &mut Params, fields: FieldParams) {
    for (field, param) in fields {
        if let Some(value) = store.get(field).and_then(scalar_to_param) {
            params.add(*param, value);
        }
    }
}

pub(crate) fn encode_block(
    store: &dyn ConfigStore,
    params: &mut Params,
    block: &str,
    fields: FieldParams,
) {
    let Some(map) = store.get_block(block) else {
        return;
    };
    for (field, param) in fields {
        if let Some(value) = map.get(*field).and_then(scalar_to_param) {
            params.add(*param, value);
        }
    }
}

/// Writes decoded values, converting the first rejected assignment into a
/// mapping error.
pub(crate) struct Decoder<'a> {
    store: &'a mut dyn ConfigStore,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(store: &'a mut dyn ConfigStore) -> Self {
        Self { store }
    }

    pub(crate) fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.store.set(field, value).map_err(|err| {
            ProviderError::mapping(self.store.kind(), self.store.id(), err)
        })
    }

    /// Nullable remote string; absent becomes `""`
    pub(crate) fn set_text(&mut self, field: &str, value: Option<&String>) -> Result<()> {
        self.set(field, value.cloned().unwrap_or_default())
    }

    /// Leaves the field untouched when the remote value is absent or unparsable
    pub(crate) fn set_timestamp(&mut self, field: &str, raw: Option<&String>) -> Result<()> {
        match raw.and_then(|raw| normalize_timestamp(raw)) {
            Some(formatted) => self.set(field, formatted),
            None => {
                if let Some(raw) = raw {
                    tracing::debug!(field, raw = raw.as_str(), "Ignoring unparsable timestamp");
                }
                Ok(())
            }
        }
    }

    pub(crate) fn set_block(&mut self, field: &str, block: Block) -> Result<()> {
        self.set(field, Value::Object(block.0))
    }
}

/// Composite value under construction
#[derive(Debug, Default)]
pub(crate) struct Block(Map<String, Value>);

impl Block {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn text(mut self, key: &str, value: Option<&String>) -> Self {
        self.0.insert(
            key.to_string(),
            Value::String(value.cloned().unwrap_or_default()),
        );
        self
    }

    /// Nullable remote string with a remote-side default
    pub(crate) fn text_or(mut self, key: &str, value: Option<&String>, default: &str) -> Self {
        let value = value
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_string());
        self.0.insert(key.to_string(), Value::String(value));
        self
    }

    pub(crate) fn flag(mut self, key: &str, value: Option<bool>) -> Self {
        self.0.insert(key.to_string(), Value::Bool(value.unwrap_or(false)));
        self
    }
}
