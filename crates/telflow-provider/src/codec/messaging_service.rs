use super::{AttributeCodec, Decoder, FieldParams, encode_fields};
use crate::client::{MessagingService, Params};
use crate::error::Result;
use crate::store::ConfigStore;

const FIELDS: FieldParams = &[
    ("friendly_name", "FriendlyName"),
    ("inbound_request_url", "InboundRequestUrl"),
    ("inbound_method", "InboundMethod"),
    ("fallback_url", "FallbackUrl"),
    ("fallback_method", "FallbackMethod"),
    ("status_callback", "StatusCallback"),
    ("sticky_sender", "StickySender"),
    ("mms_converter", "MmsConverter"),
    ("smart_encoding", "SmartEncoding"),
    ("fallback_to_long_code", "FallbackToLongCode"),
    ("area_code_geomatch", "AreaCodeGeomatch"),
    ("synchronous_validation", "SynchronousValidation"),
    ("validity_period", "ValidityPeriod"),
];

pub struct MessagingServiceCodec;

fn method_or_post(method: Option<&String>) -> String {
    method
        .filter(|m| !m.is_empty())
        .cloned()
        .unwrap_or_else(|| "POST".to_string())
}

impl AttributeCodec for MessagingServiceCodec {
    type Remote = MessagingService;

    fn encode(store: &dyn ConfigStore) -> Params {
        let mut params = Params::new();
        encode_fields(store, &mut params, FIELDS);
        params
    }

    fn decode(svc: &MessagingService, store: &mut dyn ConfigStore) -> Result<()> {
        let mut d = Decoder::new(store);

        d.set("sid", svc.sid.as_str())?;
        d.set("account_sid", svc.account_sid.as_str())?;
        d.set("friendly_name", svc.friendly_name.as_str())?;
        d.set_timestamp("date_created", svc.date_created.as_ref())?;
        d.set_timestamp("date_updated", svc.date_updated.as_ref())?;
        d.set_text("inbound_request_url", svc.inbound_request_url.as_ref())?;
        d.set("inbound_method", method_or_post(svc.inbound_method.as_ref()))?;
        d.set_text("fallback_url", svc.fallback_url.as_ref())?;
        d.set("fallback_method", method_or_post(svc.fallback_method.as_ref()))?;
        d.set_text("status_callback", svc.status_callback.as_ref())?;
        d.set("sticky_sender", svc.sticky_sender.unwrap_or(false))?;
        d.set("mms_converter", svc.mms_converter.unwrap_or(false))?;
        d.set("smart_encoding", svc.smart_encoding.unwrap_or(false))?;
        d.set("fallback_to_long_code", svc.fallback_to_long_code.unwrap_or(false))?;
        d.set("area_code_geomatch", svc.area_code_geomatch.unwrap_or(false))?;
        d.set("synchronous_validation", svc.synchronous_validation.unwrap_or(false))?;
        if let Some(period) = svc.validity_period {
            d.set("validity_period", period)?;
        }

        Ok(())
    }
}
