// service/application_service.rs
use std::sync::Arc;

use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    config::PlatformLimits,
    db::MarketStore,
    models::{
        labourmodel::{Application, ApplicationStatus, JobStatus},
        lifecycle::APPLICATION_LIFECYCLE,
        notificationmodels::NotificationType,
    },
    service::{ensure_transition, error::ServiceError, found, notification_service::NotificationService},
    utils::validation,
};

#[derive(Debug, Clone)]
pub struct ApplicationService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    limits: PlatformLimits,
}

impl ApplicationService {
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

    pub async fn apply_for_job(
        &self,
        job_id: Uuid,
        worker_id: Uuid,
        cover_letter: Option<&str>,
        expected_pay: Option<BigDecimal>,
    ) -> Result<Application, ServiceError> {
        validation::validate_application(cover_letter, expected_pay.as_ref(), &self.limits)
            .into_result()
            .map_err(ServiceError::Validation)?;

        let job = found(self.db_client.get_job(job_id).await?, "job", job_id)?;
        let worker = found(self.db_client.get_user(worker_id).await?, "user", worker_id)?;

        if job.client_id == worker_id {
            return Err(ServiceError::validation("Clients cannot apply to their own jobs"));
        }
        if !worker.is_worker() {
            return Err(ServiceError::validation("Only workers can apply for jobs"));
        }
        if job.status != JobStatus::Open {
            return Err(ServiceError::invalid_state(format!(
                "Job {} is {} and no longer accepts applications",
                job_id,
                job.status.to_str()
            )));
        }
        if self.db_client.application_exists(job_id, worker_id).await? {
            return Err(ServiceError::Conflict(
                "Worker has already applied for this job".to_string(),
            ));
        }

        let application = Application::new(job_id, worker_id, cover_letter, expected_pay);
        let application = self.db_client.insert_application(&application).await?;
        tracing::info!("Worker {} applied for job {}", worker_id, job_id);

        self.notification_service
            .dispatch(
                job.client_id,
                &format!("{} applied for your job '{}'", worker.full_name(), job.title),
                NotificationType::ApplicationUpdate,
            )
            .await;

        Ok(application)
    }

    /// Accepts the application and rejects the job's other pending
    /// applications in the same write. The job must still be open, and it
    /// stays open until a contract is created.
    pub async fn accept_application(&self, application_id: Uuid) -> Result<Application, ServiceError> {
        let application = self.get_application(application_id).await?;
        ensure_transition(
            &APPLICATION_LIFECYCLE,
            application_id,
            application.status,
            ApplicationStatus::Accepted,
        )?;

        let job = found(self.db_client.get_job(application.job_id).await?, "job", application.job_id)?;
        if job.status != JobStatus::Open {
            return Err(ServiceError::invalid_state(format!(
                "Job {} is {} and no longer accepts applications",
                job.id,
                job.status.to_str()
            )));
        }

        let (accepted, rejected) = self.db_client.accept_application(application_id).await?;
        tracing::info!(
            "Application {} accepted, {} competing applications rejected",
            application_id,
            rejected.len()
        );

        let title = job.title;

        self.notification_service
            .dispatch(
                accepted.worker_id,
                &format!("Your application for '{}' has been accepted", title),
                NotificationType::ApplicationUpdate,
            )
            .await;
        for other in &rejected {
            self.notification_service
                .dispatch(
                    other.worker_id,
                    &format!("Another applicant was chosen for '{}'", title),
                    NotificationType::ApplicationUpdate,
                )
                .await;
        }

        Ok(accepted)
    }

    pub async fn reject_application(
        &self,
        application_id: Uuid,
        reason: &str,
    ) -> Result<Application, ServiceError> {
        let application = self
            .move_application(application_id, ApplicationStatus::Rejected)
            .await?;

        let message = if reason.trim().is_empty() {
            "Your application has been rejected".to_string()
        } else {
            format!("Your application has been rejected. Reason: {}", reason.trim())
        };
        self.notification_service
            .dispatch(application.worker_id, &message, NotificationType::ApplicationUpdate)
            .await;

        Ok(application)
    }

    pub async fn withdraw_application(&self, application_id: Uuid) -> Result<Application, ServiceError> {
        let application = self.get_application(application_id).await?;
        if application.status != ApplicationStatus::Pending {
            return Err(ServiceError::invalid_state(format!(
                "Only pending applications can be withdrawn; application {} is {}",
                application_id,
                application.status.to_str()
            )));
        }
        self.move_application(application_id, ApplicationStatus::Withdrawn).await
    }

    pub async fn get_application(&self, application_id: Uuid) -> Result<Application, ServiceError> {
        found(
            self.db_client.get_application(application_id).await?,
            "application",
            application_id,
        )
    }

    pub async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>, ServiceError> {
        Ok(self.db_client.applications_for_job(job_id).await?)
    }

    pub async fn applications_for_worker(&self, worker_id: Uuid) -> Result<Vec<Application>, ServiceError> {
        Ok(self.db_client.applications_for_worker(worker_id).await?)
    }

    async fn move_application(
        &self,
        application_id: Uuid,
        next: ApplicationStatus,
    ) -> Result<Application, ServiceError> {
        let application = self.get_application(application_id).await?;
        ensure_transition(&APPLICATION_LIFECYCLE, application_id, application.status, next)?;

        let application = self
            .db_client
            .transition_application(application_id, application.status, next)
            .await?;
        tracing::info!("Application {} is now {}", application_id, next.to_str());
        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::usermodel::{Mode, Role},
        service::{
            error::ErrorKind,
            test_support::{app, app_on, client, date, open_job, register, worker, COVER_LETTER},
        },
    };

    #[tokio::test]
    async fn accepting_rejects_siblings_and_leaves_job_open() {
        let (_, state) = app();
        let client = client(&state).await;
        let job = open_job(&state, &client).await;
        let first = worker(&state).await;
        let second = worker(&state).await;

        let chosen = state
            .application_service
            .apply_for_job(job.id, first.id, Some(COVER_LETTER), Some(BigDecimal::from(4800)))
            .await
            .unwrap();
        let other = state
            .application_service
            .apply_for_job(job.id, second.id, None, None)
            .await
            .unwrap();

        let accepted = state.application_service.accept_application(chosen.id).await.unwrap();
        assert_eq!(accepted.status, ApplicationStatus::Accepted);

        let other = state.application_service.get_application(other.id).await.unwrap();
        assert_eq!(other.status, ApplicationStatus::Rejected);

        let job = state.job_service.get_job(job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Open);

        let unread = state.notification_service.unread_count(second.id).await.unwrap();
        // welcome + rejection
        assert_eq!(unread, 2);
    }

    #[tokio::test]
    async fn accept_needs_an_open_job() {
        let (_, state) = app();
        let client = client(&state).await;
        let job = open_job(&state, &client).await;
        let hired = worker(&state).await;
        let late = worker(&state).await;

        let hired_application = state
            .application_service
            .apply_for_job(job.id, hired.id, Some(COVER_LETTER), None)
            .await
            .unwrap();
        let late_application = state
            .application_service
            .apply_for_job(job.id, late.id, None, None)
            .await
            .unwrap();

        state
            .contract_service
            .create_contract(
                job.id,
                client.id,
                hired.id,
                date(2026, 6, 1),
                None,
                BigDecimal::from(4500),
                None,
            )
            .await
            .unwrap();

        let err = state
            .application_service
            .accept_application(late_application.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let late_application = state
            .application_service
            .get_application(late_application.id)
            .await
            .unwrap();
        assert_eq!(late_application.status, ApplicationStatus::Pending);
        let hired_application = state
            .application_service
            .get_application(hired_application.id)
            .await
            .unwrap();
        assert_eq!(hired_application.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn second_application_is_a_conflict() {
        let (_, state) = app();
        let client = client(&state).await;
        let job = open_job(&state, &client).await;
        let worker = worker(&state).await;

        state
            .application_service
            .apply_for_job(job.id, worker.id, None, None)
            .await
            .unwrap();
        let err = state
            .application_service
            .apply_for_job(job.id, worker.id, Some(COVER_LETTER), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn apply_checks_job_and_applicant() {
        let (_, state) = app();
        let client = client(&state).await;
        let job = open_job(&state, &client).await;

        let err = state
            .application_service
            .apply_for_job(job.id, client.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let other_client = register(&state, "Other", vec![Role::Client], Mode::Client).await;
        let err = state
            .application_service
            .apply_for_job(job.id, other_client.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = state
            .application_service
            .apply_for_job(job.id, other_client.id, Some("too short"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        state.job_service.cancel_job(job.id).await.unwrap();
        let worker = worker(&state).await;
        let err = state
            .application_service
            .apply_for_job(job.id, worker.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = state
            .application_service
            .apply_for_job(Uuid::new_v4(), worker.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "job", .. }));
    }

    #[tokio::test]
    async fn concurrent_accepts_have_one_winner() {
        let (_, state) = app();
        let client = client(&state).await;
        let job = open_job(&state, &client).await;
        let worker = worker(&state).await;
        let application = state
            .application_service
            .apply_for_job(job.id, worker.id, None, None)
            .await
            .unwrap();

        let service = &state.application_service;
        let (left, right) = tokio::join!(
            service.accept_application(application.id),
            service.accept_application(application.id)
        );

        let outcomes = [left, right];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = outcomes.into_iter().find_map(|r| r.err()).unwrap();
        assert_eq!(loser.kind(), ErrorKind::State);
    }

    #[tokio::test]
    async fn withdraw_and_reject_need_pending() {
        let (_, state) = app();
        let client = client(&state).await;
        let job = open_job(&state, &client).await;
        let worker = worker(&state).await;
        let application = state
            .application_service
            .apply_for_job(job.id, worker.id, None, None)
            .await
            .unwrap();

        let withdrawn = state
            .application_service
            .withdraw_application(application.id)
            .await
            .unwrap();
        assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);

        let err = state
            .application_service
            .withdraw_application(application.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = state
            .application_service
            .reject_application(application.id, "position filled")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
        assert_eq!(
            state.application_service.applications_for_worker(worker.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn accept_survives_a_failing_notification_store() {
        let (_, state) = app_on(MemoryStore::with_notifications_down());
        let client = client(&state).await;
        let job = open_job(&state, &client).await;
        let chosen = worker(&state).await;
        let passed_over = worker(&state).await;

        let application = state
            .application_service
            .apply_for_job(job.id, chosen.id, Some(COVER_LETTER), None)
            .await
            .unwrap();
        let other = state
            .application_service
            .apply_for_job(job.id, passed_over.id, None, None)
            .await
            .unwrap();

        let accepted = state
            .application_service
            .accept_application(application.id)
            .await
            .unwrap();
        assert_eq!(accepted.status, ApplicationStatus::Accepted);

        let stored = state.application_service.get_application(application.id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Accepted);
        let other = state.application_service.get_application(other.id).await.unwrap();
        assert_eq!(other.status, ApplicationStatus::Rejected);
        assert_eq!(state.notification_service.unread_count(chosen.id).await.unwrap(), 0);
    }
}
