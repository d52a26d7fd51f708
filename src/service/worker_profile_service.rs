// service/worker_profile_service.rs
use std::sync::Arc;

use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    config::PlatformLimits,
    db::MarketStore,
    models::{
        labourmodel::{AvailabilityStatus, WorkerProfile},
        lifecycle::PROFILE_VERIFICATION,
        notificationmodels::NotificationType,
        verificationmodels::VerificationStatus,
    },
    service::{ensure_transition, error::ServiceError, found, notification_service::NotificationService},
    utils::validation,
};

#[derive(Debug, Clone)]
pub struct WorkerProfileService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    limits: PlatformLimits,
}

impl WorkerProfileService {
    pub fn new(
        db_client: Arc<dyn MarketStore>,
        notification_service: Arc<NotificationService>,
        limits: PlatformLimits,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            limits,
        }
    }

    pub async fn create_profile(
        &self,
        user_id: Uuid,
        bio: Option<&str>,
        skill_ids: Vec<Uuid>,
        experience: Option<&str>,
        hourly_rate: BigDecimal,
        location: &str,
    ) -> Result<WorkerProfile, ServiceError> {
        validation::validate_worker_profile(bio, &skill_ids, &hourly_rate, location, &self.limits)
            .into_result()
            .map_err(ServiceError::Validation)?;

        let user = found(self.db_client.get_user(user_id).await?, "user", user_id)?;
        if !user.is_worker() {
            return Err(ServiceError::validation("User must hold a worker role"));
        }
        if self.db_client.get_worker_profile_by_user(user_id).await?.is_some() {
            return Err(ServiceError::Conflict("User already has a worker profile".to_string()));
        }
        for skill_id in &skill_ids {
            found(self.db_client.get_skill(*skill_id).await?, "skill", *skill_id)?;
        }

        let mut unique = Vec::with_capacity(skill_ids.len());
        for skill_id in skill_ids {
            if !unique.contains(&skill_id) {
                unique.push(skill_id);
            }
        }

        let profile = WorkerProfile::new(user_id, bio, unique, experience, hourly_rate, location);
        let profile = self.db_client.insert_worker_profile(&profile).await?;
        tracing::info!("Worker profile {} created for user {}", profile.id, user_id);
        Ok(profile)
    }

    pub async fn verify_profile(&self, profile_id: Uuid, verification_code: &str) -> Result<WorkerProfile, ServiceError> {
        if validation::is_blank(verification_code) {
            return Err(ServiceError::validation("Verification code is required"));
        }
        let profile = self
            .move_verification(
                profile_id,
                VerificationStatus::Verified,
                Some(verification_code.trim().to_string()),
            )
            .await?;

        self.notification_service
            .dispatch(
                profile.user_id,
                "Your worker profile has been verified",
                NotificationType::System,
            )
            .await;
        Ok(profile)
    }

    pub async fn reject_profile(&self, profile_id: Uuid, reason: &str) -> Result<WorkerProfile, ServiceError> {
        let profile = self
            .move_verification(profile_id, VerificationStatus::Rejected, None)
            .await?;

        self.notification_service
            .dispatch(
                profile.user_id,
                &format!("Your worker profile was not verified. Reason: {}", reason.trim()),
                NotificationType::System,
            )
            .await;
        Ok(profile)
    }

    pub async fn set_availability(
        &self,
        profile_id: Uuid,
        availability: AvailabilityStatus,
    ) -> Result<WorkerProfile, ServiceError> {
        self.get_profile(profile_id).await?;
        let profile = self
            .db_client
            .update_worker_availability(profile_id, availability)
            .await?;
        tracing::info!("Worker profile {} is now {}", profile_id, availability.to_str());
        Ok(profile)
    }

    pub async fn add_skill(&self, profile_id: Uuid, skill_id: Uuid) -> Result<WorkerProfile, ServiceError> {
        let profile = self.get_profile(profile_id).await?;
        found(self.db_client.get_skill(skill_id).await?, "skill", skill_id)?;
        if profile.skill_ids.contains(&skill_id) {
            return Ok(profile);
        }

        let mut skill_ids = profile.skill_ids;
        skill_ids.push(skill_id);
        Ok(self.db_client.update_worker_skills(profile_id, &skill_ids).await?)
    }

    pub async fn remove_skill(&self, profile_id: Uuid, skill_id: Uuid) -> Result<WorkerProfile, ServiceError> {
        let profile = self.get_profile(profile_id).await?;
        if !profile.skill_ids.contains(&skill_id) {
            return Ok(profile);
        }

        let skill_ids: Vec<Uuid> = profile
            .skill_ids
            .into_iter()
            .filter(|id| *id != skill_id)
            .collect();
        if skill_ids.is_empty() {
            return Err(ServiceError::validation("Worker must have at least one skill"));
        }
        Ok(self.db_client.update_worker_skills(profile_id, &skill_ids).await?)
    }

    pub async fn get_profile(&self, profile_id: Uuid) -> Result<WorkerProfile, ServiceError> {
        found(
            self.db_client.get_worker_profile(profile_id).await?,
            "worker_profile",
            profile_id,
        )
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<WorkerProfile>, ServiceError> {
        Ok(self.db_client.get_worker_profile_by_user(user_id).await?)
    }

    pub async fn can_receive_jobs(&self, profile_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.get_profile(profile_id).await?.can_receive_jobs())
    }

    pub async fn available_profiles(&self) -> Result<Vec<WorkerProfile>, ServiceError> {
        Ok(self.db_client.available_profiles().await?)
    }

    pub async fn profiles_by_skill(&self, skill_id: Uuid) -> Result<Vec<WorkerProfile>, ServiceError> {
        Ok(self.db_client.profiles_by_skill(skill_id).await?)
    }

    pub async fn profiles_by_location(&self, location: &str) -> Result<Vec<WorkerProfile>, ServiceError> {
        Ok(self.db_client.profiles_by_location(location.trim()).await?)
    }

    pub async fn profiles_by_min_rating(&self, min: f64) -> Result<Vec<WorkerProfile>, ServiceError> {
        if !(0.0..=5.0).contains(&min) {
            return Err(ServiceError::validation("Minimum rating must be between 0 and 5"));
        }
        Ok(self.db_client.profiles_by_min_rating(min).await?)
    }

    async fn move_verification(
        &self,
        profile_id: Uuid,
        next: VerificationStatus,
        verification_code: Option<String>,
    ) -> Result<WorkerProfile, ServiceError> {
        let profile = self.get_profile(profile_id).await?;
        ensure_transition(&PROFILE_VERIFICATION, profile_id, profile.verification_status, next)?;

        let profile = self
            .db_client
            .transition_profile_verification(profile_id, profile.verification_status, next, verification_code)
            .await?;
        tracing::info!("Worker profile {} verification is {}", profile_id, next.to_str());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        service::test_support::{app, client, completed_contract, worker},
        AppState,
    };

    async fn skill(state: &AppState, name: &str) -> Uuid {
        state.skill_service.create_skill(name, "trades", None).await.unwrap().id
    }

    #[tokio::test]
    async fn profile_rules() {
        let (_, state) = app();
        let worker = worker(&state).await;
        let painting = skill(&state, "Painting").await;

        let err = state
            .worker_profile_service
            .create_profile(worker.id, None, vec![], None, BigDecimal::from(20), " ")
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(message) => {
                assert!(message.contains("at least one skill"));
                assert!(message.contains("Hourly rate"));
                assert!(message.contains("location"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let err = state
            .worker_profile_service
            .create_profile(worker.id, None, vec![Uuid::new_v4()], None, BigDecimal::from(200), "Soweto")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "skill", .. }));

        let client = client(&state).await;
        let err = state
            .worker_profile_service
            .create_profile(client.id, None, vec![painting], None, BigDecimal::from(200), "Soweto")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        state
            .worker_profile_service
            .create_profile(worker.id, None, vec![painting], None, BigDecimal::from(200), "Soweto")
            .await
            .unwrap();
        let err = state
            .worker_profile_service
            .create_profile(worker.id, None, vec![painting], None, BigDecimal::from(200), "Soweto")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn only_verified_available_workers_receive_jobs() {
        let (_, state) = app();
        let worker = worker(&state).await;
        let painting = skill(&state, "Painting").await;
        let profile = state
            .worker_profile_service
            .create_profile(
                worker.id,
                Some("Ten years painting houses"),
                vec![painting],
                None,
                BigDecimal::from(180),
                "Soweto",
            )
            .await
            .unwrap();
        assert!(!state.worker_profile_service.can_receive_jobs(profile.id).await.unwrap());

        let verified = state
            .worker_profile_service
            .verify_profile(profile.id, "WL-4411")
            .await
            .unwrap();
        assert_eq!(verified.verification_code.as_deref(), Some("WL-4411"));
        assert!(state.worker_profile_service.can_receive_jobs(profile.id).await.unwrap());

        state
            .worker_profile_service
            .set_availability(profile.id, AvailabilityStatus::Busy)
            .await
            .unwrap();
        assert!(!state.worker_profile_service.can_receive_jobs(profile.id).await.unwrap());

        let rejected = state
            .worker_profile_service
            .reject_profile(profile.id, "document expired")
            .await
            .unwrap();
        assert_eq!(rejected.verification_status, VerificationStatus::Rejected);
    }

    #[tokio::test]
    async fn last_skill_cannot_be_removed() {
        let (_, state) = app();
        let worker = worker(&state).await;
        let painting = skill(&state, "Painting").await;
        let tiling = skill(&state, "Tiling").await;
        let profile = state
            .worker_profile_service
            .create_profile(worker.id, None, vec![painting], None, BigDecimal::from(180), "Soweto")
            .await
            .unwrap();

        let profile = state.worker_profile_service.add_skill(profile.id, tiling).await.unwrap();
        assert_eq!(profile.skill_ids, vec![painting, tiling]);

        let profile = state.worker_profile_service.remove_skill(profile.id, painting).await.unwrap();
        assert_eq!(profile.skill_ids, vec![tiling]);

        let err = state
            .worker_profile_service
            .remove_skill(profile.id, tiling)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn discovery_filters() {
        let (_, state) = app();
        let (client, rated, _, contract) = completed_contract(&state).await;
        let idle = worker(&state).await;
        let painting = skill(&state, "Painting").await;
        let tiling = skill(&state, "Tiling").await;
        let profiles = &state.worker_profile_service;

        let first = profiles
            .create_profile(rated.id, None, vec![painting], None, BigDecimal::from(180), "Soweto")
            .await
            .unwrap();
        let second = profiles
            .create_profile(idle.id, None, vec![tiling], None, BigDecimal::from(220), "Durban")
            .await
            .unwrap();
        profiles.set_availability(second.id, AvailabilityStatus::Busy).await.unwrap();
        state
            .review_service
            .create_review(contract.id, client.id, rated.id, 4, None)
            .await
            .unwrap();

        let ids = |found: Vec<WorkerProfile>| found.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(profiles.available_profiles().await.unwrap()), vec![first.id]);
        assert_eq!(ids(profiles.profiles_by_skill(tiling).await.unwrap()), vec![second.id]);
        assert_eq!(ids(profiles.profiles_by_location("SOWETO").await.unwrap()), vec![first.id]);

        let top = profiles.profiles_by_min_rating(4.0).await.unwrap();
        assert_eq!(ids(top.clone()), vec![first.id]);
        assert_eq!(top[0].rating, Some(4.0));
        assert!(profiles.profiles_by_min_rating(4.5).await.unwrap().is_empty());

        let err = profiles.profiles_by_min_rating(6.0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
