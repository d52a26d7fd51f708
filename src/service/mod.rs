pub mod admin_service;
pub mod application_service;
pub mod contract_service;
pub mod dispute_service;
pub mod error;
pub mod job_service;
pub mod notification_service;
pub mod payment_service;
pub mod rating;
pub mod review_service;
pub mod skill_service;
pub mod user_service;
pub mod verification_service;
pub mod worker_profile_service;

#[cfg(test)]
pub(crate) mod test_support;

use uuid::Uuid;

use crate::models::lifecycle::{Lifecycle, Status};
use error::ServiceError;

/// Rejects `from -> to` unless the lifecycle table allows it.
pub(crate) fn ensure_transition<S: Status>(
    lifecycle: &Lifecycle<S>,
    id: Uuid,
    from: S,
    to: S,
) -> Result<(), ServiceError> {
    if lifecycle.permits(from, to) {
        Ok(())
    } else {
        Err(ServiceError::InvalidTransition {
            entity: lifecycle.entity,
            id,
            from: from.label(),
            to: to.label(),
        })
    }
}

pub(crate) fn found<T>(value: Option<T>, entity: &'static str, id: Uuid) -> Result<T, ServiceError> {
    value.ok_or(ServiceError::NotFound { entity, id })
}
