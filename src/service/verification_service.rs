// service/verification_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        lifecycle::DOCUMENT_VERIFICATION,
        notificationmodels::NotificationType,
        verificationmodels::{DocumentType, Verification, VerificationStatus},
    },
    service::{ensure_transition, error::ServiceError, found, notification_service::NotificationService},
    utils::validation,
};

#[derive(Debug, Clone)]
pub struct VerificationService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
}

impl VerificationService {
    pub fn new(db_client: Arc<dyn MarketStore>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn submit_verification(
        &self,
        user_id: Uuid,
        document_type: DocumentType,
        document_url: &str,
        verification_code: Option<&str>,
    ) -> Result<Verification, ServiceError> {
        if validation::is_blank(document_url) {
            return Err(ServiceError::validation("Document URL is required"));
        }
        found(self.db_client.get_user(user_id).await?, "user", user_id)?;

        let verification = Verification::new(user_id, document_type, document_url, verification_code);
        let verification = self.db_client.insert_verification(&verification).await?;
        tracing::info!(
            "User {} submitted {} document {}",
            user_id,
            document_type.to_str(),
            verification.id
        );
        Ok(verification)
    }

    pub async fn approve_verification(&self, verification_id: Uuid) -> Result<Verification, ServiceError> {
        let verification = self.decide(verification_id, VerificationStatus::Verified).await?;
        self.notification_service
            .dispatch(
                verification.user_id,
                &format!("Your {} document has been verified", verification.document_type.to_str()),
                NotificationType::System,
            )
            .await;
        Ok(verification)
    }

    pub async fn reject_verification(&self, verification_id: Uuid) -> Result<Verification, ServiceError> {
        let verification = self.decide(verification_id, VerificationStatus::Rejected).await?;
        self.notification_service
            .dispatch(
                verification.user_id,
                &format!("Your {} document was rejected", verification.document_type.to_str()),
                NotificationType::System,
            )
            .await;
        Ok(verification)
    }

    /// A user counts as verified once an identity document is approved.
    pub async fn is_user_verified(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        let verifications = self.db_client.verifications_for_user(user_id).await?;
        Ok(verifications
            .iter()
            .any(|v| v.document_type == DocumentType::Id && v.status == VerificationStatus::Verified))
    }

    pub async fn get_verification(&self, verification_id: Uuid) -> Result<Verification, ServiceError> {
        found(
            self.db_client.get_verification(verification_id).await?,
            "verification",
            verification_id,
        )
    }

    pub async fn verifications_for_user(&self, user_id: Uuid) -> Result<Vec<Verification>, ServiceError> {
        Ok(self.db_client.verifications_for_user(user_id).await?)
    }

    async fn decide(&self, verification_id: Uuid, next: VerificationStatus) -> Result<Verification, ServiceError> {
        let verification = self.get_verification(verification_id).await?;
        ensure_transition(&DOCUMENT_VERIFICATION, verification_id, verification.status, next)?;

        let verification = self
            .db_client
            .transition_verification(verification_id, verification.status, next, Utc::now())
            .await?;
        tracing::info!("Verification {} is now {}", verification_id, next.to_str());
        Ok(verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{app, worker};

    #[tokio::test]
    async fn approved_id_verifies_user() {
        let (_, state) = app();
        let worker = worker(&state).await;

        let certificate = state
            .verification_service
            .submit_verification(worker.id, DocumentType::Certificate, "https://files.example.com/cert.pdf", None)
            .await
            .unwrap();
        state
            .verification_service
            .approve_verification(certificate.id)
            .await
            .unwrap();
        assert!(!state.verification_service.is_user_verified(worker.id).await.unwrap());

        let id_doc = state
            .verification_service
            .submit_verification(worker.id, DocumentType::Id, "https://files.example.com/id.png", Some("ID-77"))
            .await
            .unwrap();
        assert_eq!(id_doc.status, VerificationStatus::Pending);
        assert!(id_doc.date_verified.is_none());

        let approved = state.verification_service.approve_verification(id_doc.id).await.unwrap();
        assert!(approved.date_verified.is_some());
        assert!(state.verification_service.is_user_verified(worker.id).await.unwrap());
    }

    #[tokio::test]
    async fn decisions_are_final() {
        let (_, state) = app();
        let worker = worker(&state).await;
        let doc = state
            .verification_service
            .submit_verification(worker.id, DocumentType::License, "https://files.example.com/lic.pdf", None)
            .await
            .unwrap();
        state.verification_service.reject_verification(doc.id).await.unwrap();

        let err = state
            .verification_service
            .approve_verification(doc.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { entity: "verification", .. }));

        let err = state
            .verification_service
            .submit_verification(worker.id, DocumentType::Id, "  ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
