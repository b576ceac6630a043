use super::{DeleteOutcome, ResourceLifecycle, read_error};
use crate::codec::{AttributeCodec, MessagingServiceCodec};
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use crate::kind::ResourceKind;
use crate::store::ConfigStore;
use async_trait::async_trait;

const KIND: ResourceKind = ResourceKind::MessagingService;

pub struct MessagingServiceLifecycle;

#[async_trait]
impl ResourceLifecycle for MessagingServiceLifecycle {
    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create(&self, ctx: &ProviderContext, data: &mut dyn ConfigStore) -> Result<()> {
        let params = MessagingServiceCodec::encode(data);
        let service = ctx
            .client()
            .create_messaging_service(&params)
            .await
            .map_err(|e| ProviderError::remote(KIND, None, "create", e))?;

        data.set_id(Some(service.sid.clone()));
        MessagingServiceCodec::decode(&service, data)
    }

    async fn read(&self, ctx: &ProviderContext, id: &str, data: &mut dyn ConfigStore) -> Result<()> {
        let service = ctx
            .client()
            .get_messaging_service(id)
            .await
            .map_err(|e| read_error(KIND, id, e))?;
        MessagingServiceCodec::decode(&service, data)
    }

    async fn update(&self, ctx: &ProviderContext, id: &str, data: &mut dyn ConfigStore) -> Result<()> {
        let params = MessagingServiceCodec::encode(data);
        let service = ctx
            .client()
            .update_messaging_service(id, &params)
            .await
            .map_err(|e| ProviderError::remote(KIND, Some(id), "update", e))?;
        MessagingServiceCodec::decode(&service, data)
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        id: &str,
        _data: &mut dyn ConfigStore,
    ) -> Result<DeleteOutcome> {
        ctx.client()
            .delete_messaging_service(id)
            .await
            .map_err(|e| ProviderError::remote(KIND, Some(id), "delete", e))?;
        Ok(DeleteOutcome::Removed)
    }
}
