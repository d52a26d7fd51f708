// service/job_service.rs
use std::sync::Arc;

use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    config::PlatformLimits,
    db::MarketStore,
    models::{
        labourmodel::{Job, JobStatus},
        lifecycle::JOB_LIFECYCLE,
        notificationmodels::NotificationType,
        usermodel::Mode,
    },
    service::{ensure_transition, error::ServiceError, found, notification_service::NotificationService},
    utils::validation,
};

#[derive(Debug, Clone)]
pub struct JobService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    limits: PlatformLimits,
}

impl JobService {
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

    pub async fn post_job(
        &self,
        client_id: Uuid,
        title: &str,
        description: &str,
        category: &str,
        budget: BigDecimal,
        location: &str,
    ) -> Result<Job, ServiceError> {
        validation::validate_job(title, description, category, &budget, location, &self.limits)
            .into_result()
            .map_err(ServiceError::Validation)?;

        let client = found(self.db_client.get_user(client_id).await?, "user", client_id)?;
        if !client.can_use_mode(Mode::Client) {
            return Err(ServiceError::validation("Only clients can post jobs"));
        }

        let job = Job::new(client_id, title, description, category, budget, location);
        let job = self.db_client.insert_job(&job).await?;
        tracing::info!("Job {} posted by client {}", job.id, client_id);

        self.notification_service
            .dispatch(
                client_id,
                &format!("Your job '{}' is now open for applications", job.title),
                NotificationType::JobAlert,
            )
            .await;

        Ok(job)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        found(self.db_client.get_job(job_id).await?, "job", job_id)
    }

    pub async fn open_jobs(&self) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.jobs_by_status(JobStatus::Open).await?)
    }

    pub async fn jobs_for_client(&self, client_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.jobs_for_client(client_id).await?)
    }

    pub async fn jobs_by_category(&self, category: &str) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.jobs_by_category(category.trim()).await?)
    }

    pub async fn jobs_by_location(&self, location: &str) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.jobs_by_location(location.trim()).await?)
    }

    /// Blank keywords match nothing rather than every job.
    pub async fn search_jobs(&self, keyword: &str) -> Result<Vec<Job>, ServiceError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.db_client.search_jobs(keyword).await?)
    }

    pub async fn jobs_by_budget_range(
        &self,
        min: &BigDecimal,
        max: &BigDecimal,
    ) -> Result<Vec<Job>, ServiceError> {
        if min < &BigDecimal::from(0) || min > max {
            return Err(ServiceError::validation(format!(
                "Budget range {}..{} is invalid",
                min, max
            )));
        }
        Ok(self.db_client.jobs_by_budget_range(min, max).await?)
    }

    pub async fn cancel_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.get_job(job_id).await?;
        ensure_transition(&JOB_LIFECYCLE, job_id, job.status, JobStatus::Cancelled)?;

        let job = self
            .db_client
            .transition_job(job_id, job.status, JobStatus::Cancelled)
            .await?;
        tracing::info!("Job {} cancelled", job_id);

        self.notification_service
            .dispatch(
                job.client_id,
                &format!("Your job '{}' has been cancelled", job.title),
                NotificationType::JobAlert,
            )
            .await;

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{app, client, open_job, worker};

    #[tokio::test]
    async fn posted_job_starts_open() {
        let (_, state) = app();
        let client = client(&state).await;
        let job = open_job(&state, &client).await;
        assert_eq!(job.status, JobStatus::Open);
        assert_eq!(state.job_service.open_jobs().await.unwrap(), vec![job.clone()]);
        assert_eq!(state.job_service.jobs_for_client(client.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn budget_over_cap_is_rejected() {
        let (_, state) = app();
        let client = client(&state).await;
        let err = state
            .job_service
            .post_job(
                client.id,
                "Build a boundary wall",
                "Brick wall around the whole property, 1.8m high.",
                "building",
                BigDecimal::from(2_000_000),
                "Durban",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn workers_cannot_post() {
        let (_, state) = app();
        let worker = worker(&state).await;
        let err = state
            .job_service
            .post_job(
                worker.id,
                "Fix a leaking tap",
                "Kitchen tap drips constantly, needs a new washer.",
                "plumbing",
                BigDecimal::from(300),
                "Pretoria",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn cancelled_job_is_terminal() {
        let (_, state) = app();
        let client = client(&state).await;
        let job = open_job(&state, &client).await;
        let cancelled = state.job_service.cancel_job(job.id).await.unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);

        let err = state.job_service.cancel_job(job.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { entity: "job", .. }));
    }

    #[tokio::test]
    async fn discovery_filters() {
        let (_, state) = app();
        let client = client(&state).await;
        let painting = open_job(&state, &client).await;
        let plumbing = state
            .job_service
            .post_job(
                client.id,
                "Fix a leaking geyser",
                "The geyser in the roof leaks into the ceiling below.",
                "plumbing",
                BigDecimal::from(1200),
                "Durban",
            )
            .await
            .unwrap();
        let jobs = &state.job_service;

        assert_eq!(jobs.jobs_by_category("PAINTING").await.unwrap(), vec![painting.clone()]);
        assert_eq!(jobs.jobs_by_location(" durban ").await.unwrap(), vec![plumbing.clone()]);
        assert_eq!(jobs.search_jobs("CEILING").await.unwrap(), vec![plumbing.clone()]);
        assert_eq!(jobs.search_jobs("bedroom").await.unwrap(), vec![painting.clone()]);
        assert!(jobs.search_jobs("  ").await.unwrap().is_empty());

        let both = jobs
            .jobs_by_budget_range(&BigDecimal::from(1000), &BigDecimal::from(5000))
            .await
            .unwrap();
        assert_eq!(both, vec![plumbing.clone(), painting]);
        let exact = jobs
            .jobs_by_budget_range(&BigDecimal::from(1200), &BigDecimal::from(1200))
            .await
            .unwrap();
        assert_eq!(exact, vec![plumbing]);

        let err = jobs
            .jobs_by_budget_range(&BigDecimal::from(5000), &BigDecimal::from(1000))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
