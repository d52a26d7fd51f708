// service/skill_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{labourmodel::Skill, lifecycle::SKILL_REVIEW, verificationmodels::VerificationStatus},
    service::{ensure_transition, error::ServiceError, found},
    utils::validation,
};

#[derive(Debug, Clone)]
pub struct SkillService {
    db_client: Arc<dyn MarketStore>,
}

impl SkillService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    pub async fn create_skill(
        &self,
        name: &str,
        category: &str,
        description: Option<&str>,
    ) -> Result<Skill, ServiceError> {
        validation::validate_skill(name, category, description)
            .into_result()
            .map_err(ServiceError::Validation)?;

        if self.db_client.get_skill_by_name(name).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Skill '{}' already exists",
                name.trim()
            )));
        }

        let skill = self
            .db_client
            .insert_skill(&Skill::new(name, category, description))
            .await?;
        tracing::info!("Skill {} ({}) created", skill.name, skill.id);
        Ok(skill)
    }

    /// Creates a skill that skips review, for platform-curated catalogues.
    pub async fn create_verified_skill(
        &self,
        name: &str,
        category: &str,
        description: Option<&str>,
    ) -> Result<Skill, ServiceError> {
        let skill = self.create_skill(name, category, description).await?;
        self.review(skill.id, VerificationStatus::Verified).await
    }

    pub async fn verify_skill(&self, skill_id: Uuid) -> Result<Skill, ServiceError> {
        self.review(skill_id, VerificationStatus::Verified).await
    }

    pub async fn reject_skill(&self, skill_id: Uuid) -> Result<Skill, ServiceError> {
        self.review(skill_id, VerificationStatus::Rejected).await
    }

    pub async fn reset_skill_verification(&self, skill_id: Uuid) -> Result<Skill, ServiceError> {
        self.review(skill_id, VerificationStatus::Pending).await
    }

    pub async fn get_skill(&self, skill_id: Uuid) -> Result<Skill, ServiceError> {
        found(self.db_client.get_skill(skill_id).await?, "skill", skill_id)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Skill>, ServiceError> {
        Ok(self.db_client.get_skill_by_name(name).await?)
    }

    pub async fn skills_by_status(&self, status: VerificationStatus) -> Result<Vec<Skill>, ServiceError> {
        Ok(self.db_client.skills_by_status(status).await?)
    }

    async fn review(&self, skill_id: Uuid, next: VerificationStatus) -> Result<Skill, ServiceError> {
        let skill = self.get_skill(skill_id).await?;
        ensure_transition(&SKILL_REVIEW, skill_id, skill.verification_status, next)?;

        let skill = self
            .db_client
            .transition_skill(skill_id, skill.verification_status, next)
            .await?;
        tracing::info!("Skill {} is now {}", skill.name, next.to_str());
        Ok(skill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::app;

    #[tokio::test]
    async fn names_are_unique_ignoring_case() {
        let (_, state) = app();
        state
            .skill_service
            .create_skill("Plumbing", "trades", Some("Pipes, taps and geysers"))
            .await
            .unwrap();
        let err = state
            .skill_service
            .create_skill("plumbing", "trades", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(state.skill_service.find_by_name("PLUMBING").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn invalid_skill_is_rejected() {
        let (_, state) = app();
        let err = state
            .skill_service
            .create_skill("X", " ", Some("short"))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(message) => {
                assert!(message.contains("Skill name"));
                assert!(message.contains("category"));
                assert!(message.contains("description"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn review_cycle() {
        let (_, state) = app();
        let skill = state.skill_service.create_skill("Tiling", "trades", None).await.unwrap();
        assert_eq!(skill.verification_status, VerificationStatus::Pending);

        let err = state.skill_service.reset_skill_verification(skill.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { entity: "skill", .. }));

        state.skill_service.reject_skill(skill.id).await.unwrap();
        state.skill_service.verify_skill(skill.id).await.unwrap();
        let reset = state.skill_service.reset_skill_verification(skill.id).await.unwrap();
        assert_eq!(reset.verification_status, VerificationStatus::Pending);

        let curated = state
            .skill_service
            .create_verified_skill("Electrical", "trades", None)
            .await
            .unwrap();
        assert_eq!(curated.verification_status, VerificationStatus::Verified);
        assert_eq!(
            state.skill_service.skills_by_status(VerificationStatus::Verified).await.unwrap(),
            vec![curated]
        );
    }
}
