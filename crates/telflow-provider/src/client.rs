//! Provider API client boundary
//!
//! The reconciliation engine never talks HTTP itself. It consumes the
//! remote API through [`ProviderClient`], whose errors carry a structured
//! [`ApiErrorKind`] so idempotency decisions never depend on message wording.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a remote failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// The addressed object does not exist
    NotFound,
    /// The child is already attached to the parent aggregate
    AlreadyAssociated,
    /// The child is not attached to the parent aggregate
    NotAssociated,
    /// Credentials rejected
    Unauthorized,
    /// Rate limiting, 5xx, connection failures
    Transient,
    Other,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::NotFound => write!(f, "not found"),
            ApiErrorKind::AlreadyAssociated => write!(f, "already associated"),
            ApiErrorKind::NotAssociated => write!(f, "not associated"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Transient => write!(f, "transient"),
            ApiErrorKind::Other => write!(f, "error"),
        }
    }
}

/// Remote call failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// Remote error code, when the API supplied one
    pub code: Option<i64>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Other, message)
    }

    pub fn is(&self, kind: ApiErrorKind) -> bool {
        self.kind == kind
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Ordered form/query parameters for a remote request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Replace every existing value of `key`
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.0.retain(|(k, _)| *k != key);
        self.0.push((key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One page of a listing endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_uri: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_uri: None,
        }
    }
}

// ============ Remote representations ============

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    #[serde(alias = "Voice")]
    pub voice: bool,
    #[serde(alias = "SMS")]
    pub sms: bool,
    #[serde(alias = "MMS")]
    pub mms: bool,
    #[serde(alias = "Fax")]
    pub fax: bool,
}

/// Number offered by the availability search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailableNumber {
    pub phone_number: String,
    pub friendly_name: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub iso_country: Option<String>,
    pub capabilities: Capabilities,
}

/// Purchased (incoming) phone number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomingPhoneNumber {
    pub sid: String,
    pub account_sid: String,
    pub phone_number: String,
    pub friendly_name: String,
    pub address_sid: Option<String>,
    pub identity_sid: Option<String>,
    pub trunk_sid: Option<String>,
    pub date_created: Option<String>,
    pub date_updated: Option<String>,
    pub address_requirements: Option<String>,
    pub beta: Option<bool>,
    pub capabilities: Capabilities,
    pub voice_application_sid: Option<String>,
    pub voice_url: Option<String>,
    pub voice_method: Option<String>,
    pub voice_fallback_url: Option<String>,
    pub voice_fallback_method: Option<String>,
    pub voice_caller_id_lookup: Option<bool>,
    pub voice_receive_mode: Option<String>,
    pub sms_application_sid: Option<String>,
    pub sms_url: Option<String>,
    pub sms_method: Option<String>,
    pub sms_fallback_url: Option<String>,
    pub sms_fallback_method: Option<String>,
    pub status_callback: Option<String>,
    pub status_callback_method: Option<String>,
    pub emergency_status: Option<String>,
    pub emergency_address_sid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingService {
    pub sid: String,
    pub account_sid: String,
    pub friendly_name: String,
    pub date_created: Option<String>,
    pub date_updated: Option<String>,
    pub inbound_request_url: Option<String>,
    pub inbound_method: Option<String>,
    pub fallback_url: Option<String>,
    pub fallback_method: Option<String>,
    pub status_callback: Option<String>,
    pub sticky_sender: Option<bool>,
    pub mms_converter: Option<bool>,
    pub smart_encoding: Option<bool>,
    pub fallback_to_long_code: Option<bool>,
    pub area_code_geomatch: Option<bool>,
    pub synchronous_validation: Option<bool>,
    pub validity_period: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub sid: String,
    pub owner_account_sid: String,
    pub friendly_name: String,
    pub status: String,
    pub auth_token: Option<String>,
    pub date_created: Option<String>,
    pub date_updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKey {
    pub sid: String,
    pub friendly_name: String,
    /// Only returned by the create call
    pub secret: Option<String>,
    pub date_created: Option<String>,
    pub date_updated: Option<String>,
}

/// Typed operations of the remote communications API.
///
/// Every method is a single remote request. Implementations must not retry;
/// errors are reported to the caller as-is.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    // Phone numbers
    async fn search_local_numbers(
        &self,
        country_code: &str,
        filter: &Params,
    ) -> ApiResult<Vec<AvailableNumber>>;
    async fn create_phone_number(&self, params: &Params) -> ApiResult<IncomingPhoneNumber>;
    async fn get_phone_number(&self, sid: &str) -> ApiResult<IncomingPhoneNumber>;
    async fn update_phone_number(
        &self,
        sid: &str,
        params: &Params,
    ) -> ApiResult<IncomingPhoneNumber>;
    async fn release_phone_number(&self, sid: &str) -> ApiResult<()>;
    async fn list_phone_numbers(&self, filter: &Params) -> ApiResult<Page<IncomingPhoneNumber>>;

    // Messaging services
    async fn create_messaging_service(&self, params: &Params) -> ApiResult<MessagingService>;
    async fn get_messaging_service(&self, sid: &str) -> ApiResult<MessagingService>;
    async fn update_messaging_service(
        &self,
        sid: &str,
        params: &Params,
    ) -> ApiResult<MessagingService>;
    async fn delete_messaging_service(&self, sid: &str) -> ApiResult<()>;
    async fn list_messaging_services(&self, filter: &Params) -> ApiResult<Page<MessagingService>>;
    async fn add_service_phone_number(
        &self,
        service_sid: &str,
        phone_number_sid: &str,
    ) -> ApiResult<()>;
    async fn remove_service_phone_number(
        &self,
        service_sid: &str,
        phone_number_sid: &str,
    ) -> ApiResult<()>;

    // Accounts
    async fn create_account(&self, params: &Params) -> ApiResult<Account>;
    async fn get_account(&self, sid: &str) -> ApiResult<Account>;
    async fn update_account(&self, sid: &str, params: &Params) -> ApiResult<Account>;
    async fn list_accounts(&self, filter: &Params) -> ApiResult<Page<Account>>;

    // API keys
    async fn create_key(&self, params: &Params) -> ApiResult<ApiKey>;
    async fn get_key(&self, sid: &str) -> ApiResult<ApiKey>;
    async fn delete_key(&self, sid: &str) -> ApiResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_set_replaces() {
        let mut params: Params = [("FriendlyName", "a"), ("SmsUrl", "x")].into_iter().collect();
        params.set("FriendlyName", "b");

        assert_eq!(params.get("FriendlyName"), Some("b"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_capabilities_accept_uppercase_keys() {
        let caps: Capabilities =
            serde_json::from_str(r#"{"voice": true, "SMS": true, "MMS": false}"#).unwrap();
        assert!(caps.voice && caps.sms && !caps.mms && !caps.fax);
    }

    #[test]
    fn test_incoming_number_tolerates_nulls() {
        let number: IncomingPhoneNumber = serde_json::from_str(
            r#"{"sid": "PN1", "phone_number": "+15005550006", "voice_url": null, "beta": null}"#,
        )
        .unwrap();
        assert_eq!(number.sid, "PN1");
        assert!(number.voice_url.is_none());
        assert!(number.beta.is_none());
    }
}
