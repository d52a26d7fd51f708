// service/contract_service.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    config::PlatformLimits,
    db::MarketStore,
    models::{
        labourmodel::{Contract, ContractStatus, JobStatus},
        lifecycle::CONTRACT_LIFECYCLE,
        notificationmodels::NotificationType,
    },
    service::{ensure_transition, error::ServiceError, found, notification_service::NotificationService},
    utils::validation,
};

/// How an admin closes out a disputed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    Complete,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct ContractService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    limits: PlatformLimits,
}

impl ContractService {
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

    #[allow(clippy::too_many_arguments)]
    pub async fn create_contract(
        &self,
        job_id: Uuid,
        client_id: Uuid,
        worker_id: Uuid,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        agreed_pay: BigDecimal,
        terms: Option<&str>,
    ) -> Result<Contract, ServiceError> {
        let mut report = validation::validate_contract(start_date, end_date, &agreed_pay, &self.limits);
        report.check(client_id != worker_id, "Client and worker must be different users");
        report.into_result().map_err(ServiceError::Validation)?;

        let job = found(self.db_client.get_job(job_id).await?, "job", job_id)?;
        if job.client_id != client_id {
            return Err(ServiceError::validation("Only the job's client can create its contract"));
        }
        found(self.db_client.get_user(worker_id).await?, "user", worker_id)?;
        if job.status != JobStatus::Open {
            return Err(ServiceError::invalid_state(format!(
                "Job {} is {}; contracts can only be created for open jobs",
                job_id,
                job.status.to_str()
            )));
        }

        let contract = Contract::new(job_id, client_id, worker_id, start_date, end_date, agreed_pay, terms);
        let contract = self.db_client.insert_contract_assigning_job(&contract).await?;
        tracing::info!("Contract {} created for job {}", contract.id, job_id);

        self.notify_parties(
            &contract,
            &format!("A contract for '{}' has been created", job.title),
        )
        .await;

        Ok(contract)
    }

    /// Completes an active contract together with its job.
    pub async fn complete_contract(&self, contract_id: Uuid) -> Result<Contract, ServiceError> {
        let contract = self.get_contract(contract_id).await?;
        if contract.status != ContractStatus::Active {
            return Err(ServiceError::invalid_state(format!(
                "Only active contracts can be completed; contract {} is {}",
                contract_id,
                contract.status.to_str()
            )));
        }

        let (contract, job) = self
            .db_client
            .complete_contract(contract_id, ContractStatus::Active)
            .await?;
        tracing::info!("Contract {} completed, job {} completed", contract_id, job.id);

        self.notify_parties(&contract, &format!("The contract for '{}' is complete", job.title))
            .await;
        Ok(contract)
    }

    pub async fn cancel_contract(&self, contract_id: Uuid, reason: &str) -> Result<Contract, ServiceError> {
        let contract = self.get_contract(contract_id).await?;
        match contract.status {
            ContractStatus::Cancelled => return Ok(contract),
            ContractStatus::Completed => {
                return Err(ServiceError::invalid_state(format!(
                    "Contract {} is completed and cannot be cancelled",
                    contract_id
                )))
            }
            _ => {}
        }
        ensure_transition(&CONTRACT_LIFECYCLE, contract_id, contract.status, ContractStatus::Cancelled)?;

        let contract = self
            .db_client
            .transition_contract(contract_id, contract.status, ContractStatus::Cancelled)
            .await?;
        tracing::info!("Contract {} cancelled", contract_id);

        let message = if reason.trim().is_empty() {
            "Your contract has been cancelled".to_string()
        } else {
            format!("Your contract has been cancelled. Reason: {}", reason.trim())
        };
        self.notify_parties(&contract, &message).await;
        Ok(contract)
    }

    /// Loads the contract and fails if a dispute can no longer be raised on it.
    pub async fn ensure_disputable(&self, contract_id: Uuid) -> Result<Contract, ServiceError> {
        let contract = self.get_contract(contract_id).await?;
        if contract.status == ContractStatus::Completed {
            return Err(ServiceError::invalid_state(format!(
                "Cannot open a dispute on completed contract {}",
                contract_id
            )));
        }
        Ok(contract)
    }

    pub async fn mark_as_disputed(&self, contract_id: Uuid) -> Result<Contract, ServiceError> {
        let contract = self.ensure_disputable(contract_id).await?;
        ensure_transition(&CONTRACT_LIFECYCLE, contract_id, contract.status, ContractStatus::Disputed)?;

        let contract = self
            .db_client
            .transition_contract(contract_id, contract.status, ContractStatus::Disputed)
            .await?;
        tracing::info!("Contract {} marked as disputed", contract_id);
        Ok(contract)
    }

    /// Closes out a disputed contract. Completion cascades to the job the
    /// same way `complete_contract` does.
    pub async fn settle_disputed_contract(
        &self,
        contract_id: Uuid,
        outcome: SettlementOutcome,
    ) -> Result<Contract, ServiceError> {
        let contract = self.get_contract(contract_id).await?;
        if contract.status != ContractStatus::Disputed {
            return Err(ServiceError::invalid_state(format!(
                "Only disputed contracts can be settled; contract {} is {}",
                contract_id,
                contract.status.to_str()
            )));
        }

        let contract = match outcome {
            SettlementOutcome::Complete => {
                let (contract, _) = self
                    .db_client
                    .complete_contract(contract_id, ContractStatus::Disputed)
                    .await?;
                contract
            }
            SettlementOutcome::Cancel => {
                self.db_client
                    .transition_contract(contract_id, ContractStatus::Disputed, ContractStatus::Cancelled)
                    .await?
            }
        };
        tracing::info!("Disputed contract {} settled as {}", contract_id, contract.status.to_str());

        self.notify_parties(
            &contract,
            &format!("Your disputed contract has been settled as {}", contract.status.to_str()),
        )
        .await;
        Ok(contract)
    }

    pub async fn get_contract(&self, contract_id: Uuid) -> Result<Contract, ServiceError> {
        found(self.db_client.get_contract(contract_id).await?, "contract", contract_id)
    }

    pub async fn contracts_for_user(&self, user_id: Uuid) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.db_client.contracts_for_user(user_id).await?)
    }

    pub async fn contracts_by_status(&self, status: ContractStatus) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.db_client.contracts_by_status(status).await?)
    }

    pub async fn overdue_contracts(&self) -> Result<Vec<Contract>, ServiceError> {
        self.overdue_as_of(Utc::now().date_naive()).await
    }

    pub async fn overdue_as_of(&self, today: NaiveDate) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.db_client.overdue_contracts(today).await?)
    }

    async fn notify_parties(&self, contract: &Contract, message: &str) {
        for party in contract.parties() {
            self.notification_service
                .dispatch(party, message, NotificationType::System)
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::service::test_support::{active_contract, app, app_on, client, date, open_job, worker};

    #[tokio::test]
    async fn negative_pay_is_rejected_and_job_stays_open() {
        let (_, state) = app();
        let client = client(&state).await;
        let worker = worker(&state).await;
        let job = open_job(&state, &client).await;

        let err = state
            .contract_service
            .create_contract(
                job.id,
                client.id,
                worker.id,
                date(2026, 6, 1),
                None,
                BigDecimal::from(-100),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(state.job_service.get_job(job.id).await.unwrap().status, JobStatus::Open);
    }

    #[tokio::test]
    async fn end_before_start_and_foreign_client_are_rejected() {
        let (_, state) = app();
        let client = client(&state).await;
        let stranger = crate::service::test_support::client(&state).await;
        let worker = worker(&state).await;
        let job = open_job(&state, &client).await;

        let err = state
            .contract_service
            .create_contract(
                job.id,
                client.id,
                worker.id,
                date(2026, 6, 10),
                Some(date(2026, 6, 1)),
                BigDecimal::from(4500),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = state
            .contract_service
            .create_contract(
                job.id,
                stranger.id,
                worker.id,
                date(2026, 6, 1),
                None,
                BigDecimal::from(4500),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn creating_assigns_and_completing_completes_the_job() {
        let (_, state) = app();
        let (client, worker, job, contract) = active_contract(&state).await;
        assert_eq!(contract.status, ContractStatus::Active);
        assert_eq!(state.job_service.get_job(job.id).await.unwrap().status, JobStatus::Assigned);

        let err = state
            .contract_service
            .create_contract(
                job.id,
                client.id,
                worker.id,
                date(2026, 7, 1),
                None,
                BigDecimal::from(4500),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let completed = state.contract_service.complete_contract(contract.id).await.unwrap();
        assert_eq!(completed.status, ContractStatus::Completed);
        assert_eq!(state.job_service.get_job(job.id).await.unwrap().status, JobStatus::Completed);

        let err = state.contract_service.complete_contract(contract.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let err = state
            .contract_service
            .cancel_contract(contract.id, "changed my mind")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn complete_fails_cleanly_when_job_was_cancelled() {
        let (_, state) = app();
        let (_, _, job, contract) = active_contract(&state).await;
        state.job_service.cancel_job(job.id).await.unwrap();

        let err = state.contract_service.complete_contract(contract.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let contract = state.contract_service.get_contract(contract.id).await.unwrap();
        assert_eq!(contract.status, ContractStatus::Active);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let (_, state) = app();
        let (_, worker, _, contract) = active_contract(&state).await;
        let cancelled = state
            .contract_service
            .cancel_contract(contract.id, "client moved away")
            .await
            .unwrap();
        assert_eq!(cancelled.status, ContractStatus::Cancelled);

        let before = state.notification_service.unread_count(worker.id).await.unwrap();
        let again = state.contract_service.cancel_contract(contract.id, "again").await.unwrap();
        assert_eq!(again, cancelled);
        assert_eq!(state.notification_service.unread_count(worker.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn disputed_contract_can_be_settled() {
        let (_, state) = app();
        let (_, _, job, contract) = active_contract(&state).await;

        let err = state
            .contract_service
            .settle_disputed_contract(contract.id, SettlementOutcome::Complete)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let disputed = state.contract_service.mark_as_disputed(contract.id).await.unwrap();
        assert_eq!(disputed.status, ContractStatus::Disputed);
        // a second dispute keeps it disputed
        state.contract_service.mark_as_disputed(contract.id).await.unwrap();

        let settled = state
            .contract_service
            .settle_disputed_contract(contract.id, SettlementOutcome::Complete)
            .await
            .unwrap();
        assert_eq!(settled.status, ContractStatus::Completed);
        assert_eq!(state.job_service.get_job(job.id).await.unwrap().status, JobStatus::Completed);

        let err = state.contract_service.mark_as_disputed(contract.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn overdue_lists_only_active_contracts_past_their_end() {
        let (_, state) = app();
        let (_, _, _, late) = active_contract(&state).await;
        let (_, _, _, finished) = active_contract(&state).await;
        state.contract_service.complete_contract(finished.id).await.unwrap();

        let client = client(&state).await;
        let worker = worker(&state).await;
        let job = open_job(&state, &client).await;
        let open_ended = state
            .contract_service
            .create_contract(job.id, client.id, worker.id, date(2026, 6, 1), None, BigDecimal::from(900), None)
            .await
            .unwrap();

        let contracts = &state.contract_service;
        assert!(contracts.overdue_as_of(date(2026, 6, 30)).await.unwrap().is_empty());

        let overdue = contracts.overdue_as_of(date(2026, 7, 1)).await.unwrap();
        assert_eq!(overdue.iter().map(|c| c.id).collect::<Vec<_>>(), vec![late.id]);
        assert!(!overdue.iter().any(|c| c.id == open_ended.id));
    }

    #[tokio::test]
    async fn completion_survives_a_failing_notification_store() {
        let (_, state) = app_on(MemoryStore::with_notifications_down());
        let (client, _, job, contract) = active_contract(&state).await;

        let completed = state.contract_service.complete_contract(contract.id).await.unwrap();
        assert_eq!(completed.status, ContractStatus::Completed);

        let stored = state.contract_service.get_contract(contract.id).await.unwrap();
        assert_eq!(stored.status, ContractStatus::Completed);
        assert_eq!(state.job_service.get_job(job.id).await.unwrap().status, JobStatus::Completed);
        assert!(state
            .notification_service
            .notifications_for_user(client.id, false)
            .await
            .unwrap()
            .is_empty());
    }
}
