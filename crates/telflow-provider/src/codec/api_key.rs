use super::{AttributeCodec, Decoder};
use crate::client::{ApiKey, Params};
use crate::error::Result;
use crate::store::ConfigStore;

pub struct ApiKeyCodec;

impl AttributeCodec for ApiKeyCodec {
    type Remote = ApiKey;

    fn encode(store: &dyn ConfigStore) -> Params {
        let mut params = Params::new();
        if let Some(name) = store.get_str("friendly_name") {
            params.add("FriendlyName", name);
        }
        params
    }

    /// The secret is written only when the response carries it, which is
    /// the create response alone.
    fn decode(key: &ApiKey, store: &mut dyn ConfigStore) -> Result<()> {
        let mut d = Decoder::new(store);

        d.set("sid", key.sid.as_str())?;
        d.set("friendly_name", key.friendly_name.as_str())?;
        if let Some(secret) = key.secret.as_ref().filter(|s| !s.is_empty()) {
            d.set("secret", secret.as_str())?;
        }
        d.set_timestamp("date_created", key.date_created.as_ref())?;
        d.set_timestamp("date_updated", key.date_updated.as_ref())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ResourceKind;
    use crate::store::ResourceData;

    #[test]
    fn test_read_never_clears_secret() {
        let created = ApiKey {
            sid: "SK1".to_string(),
            friendly_name: "deploy".to_string(),
            secret: Some("s3cr3t".to_string()),
            ..Default::default()
        };
        let fetched = ApiKey {
            secret: None,
            ..created.clone()
        };

        let mut data = ResourceData::new(ResourceKind::ApiKey);
        ApiKeyCodec::decode(&created, &mut data).unwrap();
        ApiKeyCodec::decode(&fetched, &mut data).unwrap();

        assert_eq!(data.get_str("secret").as_deref(), Some("s3cr3t"));
        assert_eq!(data.get_str("sid").as_deref(), Some("SK1"));
    }
}
