//! Phone number ↔ messaging service membership
//!
//! Both directions are idempotent: the remote error kinds that mean "already
//! in the requested state" are downgraded to [`AssociationOutcome::AlreadyInPlace`].
//! Nothing is cached locally; every call goes to the remote API.

use crate::client::ApiErrorKind;
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationOutcome {
    /// The remote membership was changed
    Changed,
    /// The membership was already in the requested state
    AlreadyInPlace,
}

pub struct AssociationManager<'a> {
    ctx: &'a ProviderContext,
}

impl<'a> AssociationManager<'a> {
    pub fn new(ctx: &'a ProviderContext) -> Self {
        Self { ctx }
    }

    /// Add `phone_number_sid` to the sender pool of `service_sid`
    pub async fn attach(&self, service_sid: &str, phone_number_sid: &str) -> Result<AssociationOutcome> {
        debug!(
            account_sid = self.ctx.account_sid(),
            service_sid,
            sid = phone_number_sid,
            "START attach phone number"
        );

        let result = self
            .ctx
            .client()
            .add_service_phone_number(service_sid, phone_number_sid)
            .await;

        let outcome = match result {
            Ok(()) => AssociationOutcome::Changed,
            Err(err) if err.is(ApiErrorKind::AlreadyAssociated) => {
                warn!(
                    service_sid,
                    sid = phone_number_sid,
                    "Phone number already in messaging service: {}",
                    err
                );
                AssociationOutcome::AlreadyInPlace
            }
            Err(source) => {
                return Err(ProviderError::Association {
                    action: "attach",
                    service_sid: service_sid.to_string(),
                    phone_number_sid: phone_number_sid.to_string(),
                    source,
                });
            }
        };

        debug!(service_sid, sid = phone_number_sid, ?outcome, "END attach phone number");
        Ok(outcome)
    }

    /// Remove `phone_number_sid` from the sender pool of `service_sid`
    pub async fn detach(&self, service_sid: &str, phone_number_sid: &str) -> Result<AssociationOutcome> {
        debug!(
            account_sid = self.ctx.account_sid(),
            service_sid,
            sid = phone_number_sid,
            "START detach phone number"
        );

        let result = self
            .ctx
            .client()
            .remove_service_phone_number(service_sid, phone_number_sid)
            .await;

        let outcome = match result {
            Ok(()) => AssociationOutcome::Changed,
            Err(err) if err.is(ApiErrorKind::NotAssociated) || err.is(ApiErrorKind::NotFound) => {
                warn!(
                    service_sid,
                    sid = phone_number_sid,
                    "Phone number not in messaging service: {}",
                    err
                );
                AssociationOutcome::AlreadyInPlace
            }
            Err(source) => {
                return Err(ProviderError::Association {
                    action: "detach",
                    service_sid: service_sid.to_string(),
                    phone_number_sid: phone_number_sid.to_string(),
                    source,
                });
            }
        };

        debug!(service_sid, sid = phone_number_sid, ?outcome, "END detach phone number");
        Ok(outcome)
    }
}
