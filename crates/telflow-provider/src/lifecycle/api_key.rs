use super::{DeleteOutcome, ResourceLifecycle, read_error};
use crate::codec::{ApiKeyCodec, AttributeCodec};
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use crate::kind::ResourceKind;
use crate::store::ConfigStore;
use async_trait::async_trait;

const KIND: ResourceKind = ResourceKind::ApiKey;

/// API keys are immutable once issued; update falls back to the trait's
/// unsupported default.
pub struct ApiKeyLifecycle;

#[async_trait]
impl ResourceLifecycle for ApiKeyLifecycle {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create(&self, ctx: &ProviderContext, data: &mut dyn ConfigStore) -> Result<()> {
        let params = ApiKeyCodec::encode(data);
        let key = ctx
            .client()
            .create_key(&params)
            .await
            .map_err(|e| ProviderError::remote(KIND, None, "create", e))?;

        data.set_id(Some(key.sid.clone()));
        ApiKeyCodec::decode(&key, data)
    }

    async fn read(&self, ctx: &ProviderContext, id: &str, data: &mut dyn ConfigStore) -> Result<()> {
        let key = ctx
            .client()
            .get_key(id)
            .await
            .map_err(|e| read_error(KIND, id, e))?;
        ApiKeyCodec::decode(&key, data)
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        id: &str,
        _data: &mut dyn ConfigStore,
    ) -> Result<DeleteOutcome> {
        ctx.client()
            .delete_key(id)
            .await
            .map_err(|e| ProviderError::remote(KIND, Some(id), "delete", e))?;
        Ok(DeleteOutcome::Removed)
    }
}
