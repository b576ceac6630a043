use super::{AttributeCodec, Block, Decoder, FieldParams, encode_block, encode_fields};
use crate::client::{IncomingPhoneNumber, Params};
use crate::error::Result;
use crate::store::ConfigStore;

const TOP_LEVEL: FieldParams = &[
    ("friendly_name", "FriendlyName"),
    ("address_sid", "AddressSid"),
    ("trunk_sid", "TrunkSid"),
    ("identity_sid", "IdentitySid"),
];

const SMS: FieldParams = &[
    ("application_sid", "SmsApplicationSid"),
    ("fallback_url", "SmsFallbackUrl"),
    ("fallback_http_method", "SmsFallbackMethod"),
    ("primary_http_method", "SmsMethod"),
    ("primary_url", "SmsUrl"),
];

const VOICE: FieldParams = &[
    ("application_sid", "VoiceApplicationSid"),
    ("fallback_url", "VoiceFallbackUrl"),
    ("fallback_http_method", "VoiceFallbackMethod"),
    ("primary_http_method", "VoiceMethod"),
    ("primary_url", "VoiceUrl"),
    ("caller_id_enabled", "VoiceCallerIdLookup"),
    ("receive_mode", "VoiceReceiveMode"),
];

const STATUS_CALLBACK: FieldParams = &[
    ("http_method", "StatusCallbackMethod"),
    ("url", "StatusCallback"),
];

const EMERGENCY: FieldParams = &[
    ("status", "EmergencyStatus"),
    ("address_sid", "EmergencyAddressSid"),
];

pub struct PhoneNumberCodec;

impl PhoneNumberCodec {
    /// Filter for the availability search preceding a purchase
    pub fn search_params(store: &dyn ConfigStore) -> Params {
        let mut params = Params::new();
        encode_fields(
            store,
            &mut params,
            &[("area_code", "AreaCode"), ("search", "Contains")],
        );
        params
    }

    /// Purchase request for `phone_number`
    pub fn purchase_params(store: &dyn ConfigStore, phone_number: &str) -> Params {
        let mut params = Self::encode(store);
        params.set("PhoneNumber", phone_number);
        params
    }
}

/// The API spells emergency statuses `Active`/`Inactive`
fn remote_emergency_status(status: &str) -> String {
    let lower = status.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

impl AttributeCodec for PhoneNumberCodec {
    type Remote = IncomingPhoneNumber;

    fn encode(store: &dyn ConfigStore) -> Params {
        let mut params = Params::new();
        encode_fields(store, &mut params, TOP_LEVEL);
        encode_block(store, &mut params, "sms", SMS);
        encode_block(store, &mut params, "voice", VOICE);
        encode_block(store, &mut params, "status_callback", STATUS_CALLBACK);
        encode_block(store, &mut params, "emergency", EMERGENCY);

        if let Some(status) = params.get("EmergencyStatus").map(remote_emergency_status) {
            params.set("EmergencyStatus", status);
        }
        params
    }

    fn decode(ph: &IncomingPhoneNumber, store: &mut dyn ConfigStore) -> Result<()> {
        let mut d = Decoder::new(store);

        d.set("sid", ph.sid.as_str())?;
        d.set("number", ph.phone_number.as_str())?;
        d.set("friendly_name", ph.friendly_name.as_str())?;
        d.set_text("trunk_sid", ph.trunk_sid.as_ref())?;
        d.set_text("address_sid", ph.address_sid.as_ref())?;
        d.set_text("identity_sid", ph.identity_sid.as_ref())?;
        d.set_timestamp("date_created", ph.date_created.as_ref())?;
        d.set_timestamp("date_updated", ph.date_updated.as_ref())?;
        d.set_text("address_requirements", ph.address_requirements.as_ref())?;
        d.set("is_beta", ph.beta.unwrap_or(false))?;
        d.set("is_mms_capable", ph.capabilities.mms)?;
        d.set("is_sms_capable", ph.capabilities.sms)?;
        d.set("is_voice_capable", ph.capabilities.voice)?;

        d.set_block(
            "voice",
            Block::new()
                .text("application_sid", ph.voice_application_sid.as_ref())
                .text("fallback_url", ph.voice_fallback_url.as_ref())
                .text_or("fallback_http_method", ph.voice_fallback_method.as_ref(), "POST")
                .text("primary_url", ph.voice_url.as_ref())
                .text_or("primary_http_method", ph.voice_method.as_ref(), "POST")
                .flag("caller_id_enabled", ph.voice_caller_id_lookup)
                .text_or("receive_mode", ph.voice_receive_mode.as_ref(), "voice"),
        )?;

        d.set_block(
            "sms",
            Block::new()
                .text("application_sid", ph.sms_application_sid.as_ref())
                .text("fallback_url", ph.sms_fallback_url.as_ref())
                .text_or("fallback_http_method", ph.sms_fallback_method.as_ref(), "POST")
                .text("primary_url", ph.sms_url.as_ref())
                .text_or("primary_http_method", ph.sms_method.as_ref(), "POST"),
        )?;

        d.set_block(
            "status_callback",
            Block::new()
                .text("url", ph.status_callback.as_ref())
                .text_or("http_method", ph.status_callback_method.as_ref(), "POST"),
        )?;

        d.set_block(
            "emergency",
            Block::new()
                .text("address_sid", ph.emergency_address_sid.as_ref())
                .text_or("status", ph.emergency_status.as_ref(), "Active"),
        )?;

        Ok(())
    }
}
