//! Resource kinds managed by the provider

use crate::schema::{self, Schema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    PhoneNumber,
    MessagingService,
    Subaccount,
    ApiKey,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::PhoneNumber,
        ResourceKind::MessagingService,
        ResourceKind::Subaccount,
        ResourceKind::ApiKey,
    ];

    /// Resource type name as declared by operators (e.g. `twilio_phone_number`)
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::PhoneNumber => "twilio_phone_number",
            ResourceKind::MessagingService => "twilio_messaging_service",
            ResourceKind::Subaccount => "twilio_subaccount",
            ResourceKind::ApiKey => "twilio_api_key",
        }
    }

    /// Human-readable label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::PhoneNumber => "phone number",
            ResourceKind::MessagingService => "messaging service",
            ResourceKind::Subaccount => "subaccount",
            ResourceKind::ApiKey => "API key",
        }
    }

    pub fn schema(&self) -> &'static Schema {
        match self {
            ResourceKind::PhoneNumber => &schema::PHONE_NUMBER,
            ResourceKind::MessagingService => &schema::MESSAGING_SERVICE,
            ResourceKind::Subaccount => &schema::SUBACCOUNT,
            ResourceKind::ApiKey => &schema::API_KEY,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let normalized = normalized.strip_prefix("twilio_").unwrap_or(&normalized);
        match normalized {
            "phone_number" => Ok(ResourceKind::PhoneNumber),
            "messaging_service" => Ok(ResourceKind::MessagingService),
            "subaccount" => Ok(ResourceKind::Subaccount),
            "api_key" => Ok(ResourceKind::ApiKey),
            other => Err(format!("Unknown resource kind: {}", other)),
        }
    }
}
