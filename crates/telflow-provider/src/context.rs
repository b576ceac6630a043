//! Collaborators shared by every lifecycle verb

use crate::client::ProviderClient;
use std::sync::Arc;
use telflow_config::{ProviderConfig, SelectionPolicy};

/// Provider API client plus account configuration, both read-only for the
/// lifetime of the process.
#[derive(Clone)]
pub struct ProviderContext {
    client: Arc<dyn ProviderClient>,
    config: Arc<ProviderConfig>,
}

impl ProviderContext {
    pub fn new(client: Arc<dyn ProviderClient>, config: ProviderConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn client(&self) -> &dyn ProviderClient {
        self.client.as_ref()
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn account_sid(&self) -> &str {
        &self.config.account_sid
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        self.config.selection_policy
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
