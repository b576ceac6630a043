use super::{DeleteOutcome, ResourceLifecycle, read_error};
use crate::association::AssociationManager;
use crate::codec::{AttributeCodec, PhoneNumberCodec};
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use crate::kind::ResourceKind;
use crate::store::ConfigStore;
use async_trait::async_trait;
use serde_json::Value;
use telflow_config::SelectionPolicy;
use tracing::{debug, warn};

const KIND: ResourceKind = ResourceKind::PhoneNumber;

/// Purchased phone numbers, optionally pooled into a messaging service
pub struct PhoneNumberLifecycle;

impl PhoneNumberLifecycle {
    /// Pick a number from the availability search
    async fn acquire(&self, ctx: &ProviderContext, data: &dyn ConfigStore) -> Result<String> {
        let country_code = data
            .get_str("country_code")
            .ok_or_else(|| ProviderError::validation(KIND, "'country_code' is required"))?;
        let filter = PhoneNumberCodec::search_params(data);

        debug!(account_sid = ctx.account_sid(), country_code = %country_code, "Searching available numbers");
        let available = ctx
            .client()
            .search_local_numbers(&country_code, &filter)
            .await
            .map_err(|e| ProviderError::remote(KIND, None, "search available", e))?;

        let criteria = filter
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");

        match available.as_slice() {
            [] => Err(ProviderError::NotFound {
                kind: KIND,
                message: format!(
                    "no available phone numbers in {} match [{}]",
                    country_code, criteria
                ),
            }),
            [_, _, ..] if ctx.selection_policy() == SelectionPolicy::FailOnMultiple => {
                Err(ProviderError::Ambiguous {
                    kind: KIND,
                    message: format!(
                        "{} available phone numbers in {} match [{}]",
                        available.len(),
                        country_code,
                        criteria
                    ),
                })
            }
            [first, ..] => Ok(first.phone_number.clone()),
        }
    }
}

#[async_trait]
impl ResourceLifecycle for PhoneNumberLifecycle {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create(&self, ctx: &ProviderContext, data: &mut dyn ConfigStore) -> Result<()> {
        let phone_number = self.acquire(ctx, data).await?;
        let params = PhoneNumberCodec::purchase_params(data, &phone_number);

        let purchased = ctx
            .client()
            .create_phone_number(&params)
            .await
            .map_err(|e| ProviderError::remote(KIND, None, "create", e))?;

        data.set_id(Some(purchased.sid.clone()));
        PhoneNumberCodec::decode(&purchased, data)?;

        if let Some(service_sid) = data.get_str("service_sid").filter(|s| !s.is_empty()) {
            let attached = AssociationManager::new(ctx)
                .attach(&service_sid, &purchased.sid)
                .await;
            if let Err(err) = attached {
                // Record the number as unpooled so the next update attaches it
                warn!(sid = %purchased.sid, service_sid = %service_sid, "Purchased number left outside its messaging service");
                data.set("service_sid", Value::Null)
                    .map_err(|e| ProviderError::mapping(KIND, Some(purchased.sid.as_str()), e))?;
                return Err(err);
            }
        }

        Ok(())
    }

    async fn read(&self, ctx: &ProviderContext, id: &str, data: &mut dyn ConfigStore) -> Result<()> {
        let number = ctx
            .client()
            .get_phone_number(id)
            .await
            .map_err(|e| read_error(KIND, id, e))?;
        PhoneNumberCodec::decode(&number, data)
    }

    async fn update(&self, ctx: &ProviderContext, id: &str, data: &mut dyn ConfigStore) -> Result<()> {
        let params = PhoneNumberCodec::encode(data);
        let updated = ctx
            .client()
            .update_phone_number(id, &params)
            .await
            .map_err(|e| ProviderError::remote(KIND, Some(id), "update", e))?;
        PhoneNumberCodec::decode(&updated, data)?;

        let (before, after) = data.get_change("service_sid").as_strings();
        if before != after {
            let associations = AssociationManager::new(ctx);
            if let Some(old) = before {
                associations.detach(&old, id).await?;
            }
            if let Some(new) = after {
                associations.attach(&new, id).await?;
            }
        }

        Ok(())
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        id: &str,
        data: &mut dyn ConfigStore,
    ) -> Result<DeleteOutcome> {
        if let Some(service_sid) = data.get_str("service_sid").filter(|s| !s.is_empty()) {
            AssociationManager::new(ctx).detach(&service_sid, id).await?;
        }

        ctx.client()
            .release_phone_number(id)
            .await
            .map_err(|e| ProviderError::remote(KIND, Some(id), "release", e))?;

        Ok(DeleteOutcome::Removed)
    }
}
