use super::{DeleteOutcome, ResourceLifecycle, read_error};
use crate::codec::{AttributeCodec, SubaccountCodec};
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use crate::kind::ResourceKind;
use crate::store::ConfigStore;
use async_trait::async_trait;
use tracing::info;

const KIND: ResourceKind = ResourceKind::Subaccount;

/// Subaccounts are never removed. Deleting one closes it, which the remote
/// API treats as irreversible; the closed account stays readable.
pub struct SubaccountLifecycle;

impl SubaccountLifecycle {
    async fn set_status(
        &self,
        ctx: &ProviderContext,
        id: &str,
        status: &str,
        data: &mut dyn ConfigStore,
    ) -> Result<()> {
        info!(sid = id, status, "Changing subaccount status");
        let account = ctx
            .client()
            .update_account(id, &SubaccountCodec::status_params(status))
            .await
            .map_err(|e| ProviderError::remote(KIND, Some(id), "update status of", e))?;
        SubaccountCodec::decode(&account, data)
    }
}

#[async_trait]
impl ResourceLifecycle for SubaccountLifecycle {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create(&self, ctx: &ProviderContext, data: &mut dyn ConfigStore) -> Result<()> {
        let declared_status = data.get_str("status");
        let params = SubaccountCodec::encode(data);
        let account = ctx
            .client()
            .create_account(&params)
            .await
            .map_err(|e| ProviderError::remote(KIND, None, "create", e))?;

        data.set_id(Some(account.sid.clone()));
        SubaccountCodec::decode(&account, data)?;

        // New accounts start active; any other declared status is a follow-up transition
        match declared_status {
            Some(status) if !status.is_empty() && status != account.status => {
                self.set_status(ctx, &account.sid, &status, data).await
            }
            _ => Ok(()),
        }
    }

    async fn read(&self, ctx: &ProviderContext, id: &str, data: &mut dyn ConfigStore) -> Result<()> {
        let account = ctx
            .client()
            .get_account(id)
            .await
            .map_err(|e| read_error(KIND, id, e))?;
        SubaccountCodec::decode(&account, data)
    }

    async fn update(&self, ctx: &ProviderContext, id: &str, data: &mut dyn ConfigStore) -> Result<()> {
        if data.has_change("friendly_name") {
            return Err(ProviderError::unsupported(KIND, "friendly_name update"));
        }

        match data.get_change("status").as_strings() {
            (before, Some(after)) if before.as_deref() != Some(after.as_str()) => {
                self.set_status(ctx, id, &after, data).await
            }
            _ => Ok(()),
        }
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        id: &str,
        data: &mut dyn ConfigStore,
    ) -> Result<DeleteOutcome> {
        self.set_status(ctx, id, "closed", data).await?;
        Ok(DeleteOutcome::Closed)
    }
}
