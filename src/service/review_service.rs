// service/review_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        labourmodel::{ContractStatus, Review, WorkerProfile},
        notificationmodels::NotificationType,
    },
    service::{error::ServiceError, found, notification_service::NotificationService, rating},
    utils::validation,
};

#[derive(Debug, Clone)]
pub struct ReviewService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
}

impl ReviewService {
    pub fn new(db_client: Arc<dyn MarketStore>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn create_review(
        &self,
        contract_id: Uuid,
        reviewer_id: Uuid,
        reviewed_id: Uuid,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, ServiceError> {
        let contract = found(self.db_client.get_contract(contract_id).await?, "contract", contract_id)?;
        if contract.status != ContractStatus::Completed {
            return Err(ServiceError::invalid_state(format!(
                "Reviews are only allowed on completed contracts; contract {} is {}",
                contract_id,
                contract.status.to_str()
            )));
        }

        let mut report = validation::validate_review(reviewer_id, reviewed_id, rating, comment);
        report
            .check(contract.is_party(reviewer_id), "Reviewer must be a party to the contract")
            .check(
                !contract.is_party(reviewer_id) || contract.counterparty(reviewer_id) == Some(reviewed_id),
                "Reviewed user must be the other party to the contract",
            );
        report.into_result().map_err(ServiceError::Validation)?;

        if self.has_reviewed(contract_id, reviewer_id).await? {
            return Err(ServiceError::Conflict(
                "User has already reviewed this contract".to_string(),
            ));
        }

        let review = Review::new(contract_id, reviewer_id, reviewed_id, rating, comment);
        let (review, profile) = self.db_client.insert_review(&review).await?;
        tracing::info!(
            "Review {} ({} stars) posted on contract {}",
            review.id,
            review.rating,
            contract_id
        );
        log_rating(reviewed_id, profile.as_ref());

        self.notification_service
            .dispatch(
                reviewed_id,
                &format!("You received a {}-star review", review.rating),
                NotificationType::System,
            )
            .await;

        Ok(review)
    }

    pub async fn has_reviewed(&self, contract_id: Uuid, reviewer_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.db_client.review_exists(contract_id, reviewer_id).await?)
    }

    /// True when the contract is completed, `user_id` is a party and has not
    /// reviewed it yet.
    pub async fn can_review(&self, contract_id: Uuid, user_id: Uuid) -> Result<bool, ServiceError> {
        let contract = found(self.db_client.get_contract(contract_id).await?, "contract", contract_id)?;
        if contract.status != ContractStatus::Completed || !contract.is_party(user_id) {
            return Ok(false);
        }
        Ok(!self.has_reviewed(contract_id, user_id).await?)
    }

    pub async fn delete_review(&self, review_id: Uuid) -> Result<Review, ServiceError> {
        let (review, profile) = self.db_client.delete_review(review_id).await?;
        tracing::info!("Review {} deleted", review_id);
        log_rating(review.reviewed_id, profile.as_ref());
        Ok(review)
    }

    pub async fn get_review(&self, review_id: Uuid) -> Result<Review, ServiceError> {
        found(self.db_client.get_review(review_id).await?, "review", review_id)
    }

    pub async fn reviews_for_user(&self, user_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        Ok(self.db_client.reviews_for_user(user_id).await?)
    }

    pub async fn reviews_for_contract(&self, contract_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        Ok(self.db_client.reviews_for_contract(contract_id).await?)
    }

    pub async fn average_rating_for_user(&self, user_id: Uuid) -> Result<Option<f64>, ServiceError> {
        rating::average_rating_for_user(self.db_client.as_ref(), user_id).await
    }
}

fn log_rating(user_id: Uuid, profile: Option<&WorkerProfile>) {
    match profile {
        Some(p) => tracing::info!("Worker profile {} rating is now {:?}", p.id, p.rating),
        None => tracing::debug!("User {} has no worker profile to rate", user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::BigDecimal;

    use crate::{
        db::{LaborExt, MemoryStore},
        service::test_support::{active_contract, app, client, completed_contract, date, open_job},
        AppState,
    };

    async fn completed_for(state: &AppState, worker_id: Uuid) -> (Uuid, Uuid) {
        let client = client(state).await;
        let job = open_job(state, &client).await;
        let contract = state
            .contract_service
            .create_contract(
                job.id,
                client.id,
                worker_id,
                date(2026, 6, 1),
                None,
                BigDecimal::from(3000),
                None,
            )
            .await
            .unwrap();
        state.contract_service.complete_contract(contract.id).await.unwrap();
        (contract.id, client.id)
    }

    async fn profile_for(store: &MemoryStore, user_id: Uuid) -> WorkerProfile {
        let profile = WorkerProfile::new(
            user_id,
            None,
            vec![Uuid::new_v4()],
            None,
            BigDecimal::from(250),
            "Johannesburg",
        );
        store.insert_worker_profile(&profile).await.unwrap()
    }

    #[tokio::test]
    async fn review_requires_completed_contract() {
        let (_, state) = app();
        let (client, worker, _, contract) = active_contract(&state).await;
        let err = state
            .review_service
            .create_review(contract.id, client.id, worker.id, 5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert!(!state.review_service.can_review(contract.id, client.id).await.unwrap());
    }

    #[tokio::test]
    async fn worker_rating_is_the_rounded_mean() {
        let (store, state) = app();
        let (_, worker, _, first) = completed_contract(&state).await;
        let profile = profile_for(&store, worker.id).await;
        assert_eq!(profile.rating, None);

        let (second, second_client) = completed_for(&state, worker.id).await;
        let (third, third_client) = completed_for(&state, worker.id).await;

        state
            .review_service
            .create_review(first.id, first.client_id, worker.id, 5, Some("Excellent, tidy work"))
            .await
            .unwrap();
        state
            .review_service
            .create_review(second, second_client, worker.id, 4, None)
            .await
            .unwrap();
        let last = state
            .review_service
            .create_review(third, third_client, worker.id, 3, None)
            .await
            .unwrap();

        let profile = store.get_worker_profile_by_user(worker.id).await.unwrap().unwrap();
        assert_eq!(profile.rating, Some(4.0));
        assert_eq!(state.review_service.average_rating_for_user(worker.id).await.unwrap(), Some(4.0));

        state.review_service.delete_review(last.id).await.unwrap();
        let profile = store.get_worker_profile_by_user(worker.id).await.unwrap().unwrap();
        assert_eq!(profile.rating, Some(4.5));
    }

    #[tokio::test]
    async fn concurrent_reviews_leave_the_full_average() {
        let (store, state) = app();
        let worker = crate::service::test_support::worker(&state).await;
        profile_for(&store, worker.id).await;

        let mut contracts = Vec::new();
        for _ in 0..6 {
            contracts.push(completed_for(&state, worker.id).await);
        }

        let ratings = [5, 4, 3, 5, 2, 4];
        let service = &state.review_service;
        let results = futures::future::join_all(
            contracts
                .iter()
                .zip(ratings)
                .map(|((contract_id, client_id), rating)| {
                    service.create_review(*contract_id, *client_id, worker.id, rating, None)
                }),
        )
        .await;
        assert!(results.iter().all(|r| r.is_ok()));

        let profile = store.get_worker_profile_by_user(worker.id).await.unwrap().unwrap();
        assert_eq!(profile.rating, Some(3.8));
    }

    #[tokio::test]
    async fn second_review_by_same_reviewer_conflicts() {
        let (_, state) = app();
        let (client, worker, _, contract) = completed_contract(&state).await;
        assert!(state.review_service.can_review(contract.id, client.id).await.unwrap());

        state
            .review_service
            .create_review(contract.id, client.id, worker.id, 4, None)
            .await
            .unwrap();
        let err = state
            .review_service
            .create_review(contract.id, client.id, worker.id, 2, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(!state.review_service.can_review(contract.id, client.id).await.unwrap());

        // the worker still has their own review to give
        state
            .review_service
            .create_review(contract.id, worker.id, client.id, 5, None)
            .await
            .unwrap();
        assert_eq!(state.review_service.reviews_for_contract(contract.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reviewer_and_target_must_be_the_two_parties() {
        let (_, state) = app();
        let (client, worker, _, contract) = completed_contract(&state).await;
        let outsider = crate::service::test_support::worker(&state).await;

        for (reviewer, reviewed, rating) in [
            (outsider.id, worker.id, 4),
            (client.id, outsider.id, 4),
            (client.id, client.id, 4),
            (client.id, worker.id, 6),
        ] {
            let err = state
                .review_service
                .create_review(contract.id, reviewer, reviewed, rating, None)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
    }
}
