//! Resource lifecycle controller
//!
//! Drives Create, Read, Update, Delete and Import for every resource kind.
//! The controller owns the id invariants and input validation; the per-kind
//! handlers own the remote call sequence.

mod api_key;
mod messaging_service;
mod phone_number;
mod subaccount;

pub use api_key::ApiKeyLifecycle;
pub use messaging_service::MessagingServiceLifecycle;
pub use phone_number::PhoneNumberLifecycle;
pub use subaccount::SubaccountLifecycle;

use crate::client::{ApiError, ApiErrorKind};
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use crate::kind::ResourceKind;
use crate::lookup::{LookupQuery, LookupResolver};
use crate::store::{ConfigStore, ResourceData};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info};

/// Where a resource stands in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Absent,
    Creating,
    Present,
    Updating,
    Deleting,
    /// Subaccounts are closed rather than removed
    Closed,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Absent | LifecycleState::Present | LifecycleState::Closed
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Absent => write!(f, "absent"),
            LifecycleState::Creating => write!(f, "creating"),
            LifecycleState::Present => write!(f, "present"),
            LifecycleState::Updating => write!(f, "updating"),
            LifecycleState::Deleting => write!(f, "deleting"),
            LifecycleState::Closed => write!(f, "closed"),
        }
    }
}

/// How a confirmed delete ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The remote object is gone
    Removed,
    /// The remote object stays readable in a closed state
    Closed,
}

impl From<DeleteOutcome> for LifecycleState {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Removed => LifecycleState::Absent,
            DeleteOutcome::Closed => LifecycleState::Closed,
        }
    }
}

/// Remote call sequence of one resource kind.
///
/// The controller has already checked the id: `create` runs on a record
/// without one and the other verbs receive it explicitly.
#[async_trait]
pub trait ResourceLifecycle: Send + Sync {
    fn kind(&self) -> ResourceKind;

    async fn create(&self, ctx: &ProviderContext, data: &mut dyn ConfigStore) -> Result<()>;

    async fn read(&self, ctx: &ProviderContext, id: &str, data: &mut dyn ConfigStore) -> Result<()>;

    async fn update(
        &self,
        _ctx: &ProviderContext,
        _id: &str,
        _data: &mut dyn ConfigStore,
    ) -> Result<()> {
        Err(ProviderError::unsupported(self.kind(), "update"))
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        id: &str,
        data: &mut dyn ConfigStore,
    ) -> Result<DeleteOutcome>;
}

/// Remote failure while fetching a known object. Not-found means the
/// object vanished behind our back, which is never repaired silently.
pub(crate) fn read_error(kind: ResourceKind, id: &str, err: ApiError) -> ProviderError {
    if err.is(ApiErrorKind::NotFound) {
        ProviderError::RemoteObjectMissing {
            kind,
            id: id.to_string(),
            source: err,
        }
    } else {
        ProviderError::remote(kind, Some(id), "read", err)
    }
}

fn handler(kind: ResourceKind) -> &'static dyn ResourceLifecycle {
    match kind {
        ResourceKind::PhoneNumber => &PhoneNumberLifecycle,
        ResourceKind::MessagingService => &MessagingServiceLifecycle,
        ResourceKind::Subaccount => &SubaccountLifecycle,
        ResourceKind::ApiKey => &ApiKeyLifecycle,
    }
}

/// Schema validation of the record's current attributes
fn validate(data: &dyn ConfigStore) -> Result<()> {
    let kind = data.kind();
    let schema = kind.schema();
    let attributes: Map<String, Value> = schema
        .fields
        .iter()
        .filter_map(|spec| data.get(spec.name).map(|v| (spec.name.to_string(), v.clone())))
        .collect();
    schema
        .validate(&attributes)
        .map_err(|message| ProviderError::validation(kind, message))
}

fn require_id(data: &dyn ConfigStore, verb: &str) -> Result<String> {
    data.id().map(str::to_string).ok_or_else(|| {
        ProviderError::validation(data.kind(), format!("cannot {} a resource without an id", verb))
    })
}

fn transition(kind: ResourceKind, id: Option<&str>, from: LifecycleState, to: LifecycleState) {
    info!(
        kind = %kind,
        sid = id.unwrap_or_default(),
        "{} -> {}",
        from,
        to
    );
}

pub struct LifecycleController {
    ctx: ProviderContext,
}

impl LifecycleController {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    /// Create the remote object and record its id.
    ///
    /// On a failure after the object was created the id stays set, so the
    /// record keeps tracking the remote object.
    pub async fn create(&self, data: &mut dyn ConfigStore) -> Result<LifecycleState> {
        let kind = data.kind();
        if let Some(id) = data.id() {
            return Err(ProviderError::validation(
                kind,
                format!("already tracks {}; update or import it instead", id),
            ));
        }
        validate(data)?;

        transition(kind, None, LifecycleState::Absent, LifecycleState::Creating);
        debug!(account_sid = self.ctx.account_sid(), kind = %kind, "START create");
        handler(kind).create(&self.ctx, data).await?;
        debug!(account_sid = self.ctx.account_sid(), sid = data.id().unwrap_or_default(), "END create");
        transition(kind, data.id(), LifecycleState::Creating, LifecycleState::Present);

        Ok(LifecycleState::Present)
    }

    /// Refresh the record from the remote object
    pub async fn read(&self, data: &mut dyn ConfigStore) -> Result<LifecycleState> {
        let id = require_id(data, "read")?;
        debug!(account_sid = self.ctx.account_sid(), sid = %id, "START read");
        handler(data.kind()).read(&self.ctx, &id, data).await?;
        debug!(account_sid = self.ctx.account_sid(), sid = %id, "END read");
        Ok(LifecycleState::Present)
    }

    /// Push the record's declared values to the remote object
    pub async fn update(&self, data: &mut dyn ConfigStore) -> Result<LifecycleState> {
        let kind = data.kind();
        let id = require_id(data, "update")?;
        validate(data)?;

        transition(kind, Some(&id), LifecycleState::Present, LifecycleState::Updating);
        debug!(account_sid = self.ctx.account_sid(), sid = %id, "START update");
        handler(kind).update(&self.ctx, &id, data).await?;
        debug!(account_sid = self.ctx.account_sid(), sid = %id, "END update");
        transition(kind, Some(&id), LifecycleState::Updating, LifecycleState::Present);

        Ok(LifecycleState::Present)
    }

    /// Remove (or close) the remote object and clear the record's id
    pub async fn delete(&self, data: &mut dyn ConfigStore) -> Result<LifecycleState> {
        let kind = data.kind();
        let id = require_id(data, "delete")?;

        transition(kind, Some(&id), LifecycleState::Present, LifecycleState::Deleting);
        debug!(account_sid = self.ctx.account_sid(), sid = %id, "START delete");
        let outcome = handler(kind).delete(&self.ctx, &id, data).await?;
        debug!(account_sid = self.ctx.account_sid(), sid = %id, ?outcome, "END delete");

        data.set_id(None);
        let state = LifecycleState::from(outcome);
        transition(kind, Some(&id), LifecycleState::Deleting, state);
        Ok(state)
    }

    /// Start tracking an existing remote object by id
    pub async fn import(&self, data: &mut dyn ConfigStore, id: &str) -> Result<LifecycleState> {
        let kind = data.kind();
        if id.trim().is_empty() {
            return Err(ProviderError::validation(kind, "import requires a non-empty id"));
        }
        if let Some(existing) = data.id() {
            return Err(ProviderError::validation(
                kind,
                format!("already tracks {}", existing),
            ));
        }

        data.set_id(Some(id.to_string()));
        if let Err(err) = handler(kind).read(&self.ctx, id, data).await {
            data.set_id(None);
            return Err(err);
        }
        transition(kind, Some(id), LifecycleState::Absent, LifecycleState::Present);
        Ok(LifecycleState::Present)
    }

    /// Resolve an existing remote object from filter criteria
    pub async fn lookup(&self, kind: ResourceKind, query: &LookupQuery) -> Result<ResourceData> {
        LookupResolver::new(&self.ctx).resolve(kind, query).await
    }
}
