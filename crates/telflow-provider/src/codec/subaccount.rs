use super::{AttributeCodec, Decoder};
use crate::client::{Account, Params};
use crate::error::Result;
use crate::store::ConfigStore;

/// Subaccounts only accept a name on create; everything else is remote-owned
/// apart from the status transition.
pub struct SubaccountCodec;

impl SubaccountCodec {
    /// Status transition request (`active`, `suspended` or `closed`)
    pub fn status_params(status: &str) -> Params {
        let mut params = Params::new();
        params.add("Status", status);
        params
    }
}

impl AttributeCodec for SubaccountCodec {
    type Remote = Account;

    fn encode(store: &dyn ConfigStore) -> Params {
        let mut params = Params::new();
        if let Some(name) = store.get_str("friendly_name") {
            params.add("FriendlyName", name);
        }
        params
    }

    fn decode(account: &Account, store: &mut dyn ConfigStore) -> Result<()> {
        let mut d = Decoder::new(store);

        d.set("parent_account_sid", account.owner_account_sid.as_str())?;
        d.set("friendly_name", account.friendly_name.as_str())?;
        d.set("status", account.status.as_str())?;
        // the token is only echoed on some responses
        if let Some(token) = account.auth_token.as_ref().filter(|t| !t.is_empty()) {
            d.set("auth_token", token.as_str())?;
        }
        d.set_timestamp("date_created", account.date_created.as_ref())?;
        d.set_timestamp("date_updated", account.date_updated.as_ref())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ResourceKind;
    use crate::store::ResourceData;
    use serde_json::json;

    #[test]
    fn test_encode_ignores_status() {
        let mut data = ResourceData::new(ResourceKind::Subaccount);
        data.set("friendly_name", json!("team-a")).unwrap();
        data.set("status", json!("suspended")).unwrap();

        let params = SubaccountCodec::encode(&data);
        assert_eq!(params.get("FriendlyName"), Some("team-a"));
        assert_eq!(params.len(), 1);

        assert_eq!(SubaccountCodec::status_params("closed").get("Status"), Some("closed"));
    }

    #[test]
    fn test_decode_keeps_token_when_not_echoed() {
        let mut data = ResourceData::new(ResourceKind::Subaccount);
        data.set("auth_token", json!("secret-token")).unwrap();

        let remote = Account {
            sid: "AC2".to_string(),
            owner_account_sid: "AC1".to_string(),
            friendly_name: "team-a".to_string(),
            status: "active".to_string(),
            ..Default::default()
        };
        SubaccountCodec::decode(&remote, &mut data).unwrap();

        assert_eq!(data.get_str("parent_account_sid").as_deref(), Some("AC1"));
        assert_eq!(data.get_str("auth_token").as_deref(), Some("secret-token"));
    }
}
