//! telflow-provider
//!
//! Reconciliation engine for Twilio-style communications resources: phone
//! numbers, messaging services, subaccounts and API keys.
//!
//! The host owns the declared records and the desired/actual diff. This
//! crate turns one verb on one record into remote API calls:
//!
//! - [`codec`] maps records to request parameters and responses back
//! - [`lookup`] resolves existing remote objects from filter criteria
//! - [`lifecycle`] drives Create/Read/Update/Delete/Import per kind
//! - [`association`] keeps phone numbers in their messaging service
//!
//! Remote access goes through the [`ProviderClient`] trait, so the engine
//! runs against any transport (or a fake in tests).

pub mod association;
pub mod client;
pub mod codec;
pub mod context;
pub mod error;
pub mod kind;
pub mod lifecycle;
pub mod lookup;
pub mod schema;
pub mod store;

pub use association::{AssociationManager, AssociationOutcome};
pub use client::{ApiError, ApiErrorKind, ApiResult, Page, Params, ProviderClient};
pub use context::ProviderContext;
pub use error::{ProviderError, Result};
pub use kind::ResourceKind;
pub use lifecycle::{DeleteOutcome, LifecycleController, LifecycleState, ResourceLifecycle};
pub use lookup::{Criterion, LookupQuery, LookupResolver, LookupSurface};
pub use store::{ConfigStore, FieldChange, FieldError, ResourceData};
pub use telflow_config::{ProviderConfig, SelectionPolicy};
