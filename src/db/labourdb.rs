// db/labourdb.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{types::BigDecimal, Postgres, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use super::error::DbError;
use crate::models::labourmodel::*;
use crate::models::verificationmodels::VerificationStatus;

#[async_trait]
pub trait LaborExt: Send + Sync {
    // Jobs
    async fn insert_job(&self, job: &Job) -> Result<Job, DbError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, DbError>;

    async fn jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, DbError>;

    async fn jobs_for_client(&self, client_id: Uuid) -> Result<Vec<Job>, DbError>;

    async fn jobs_by_category(&self, category: &str) -> Result<Vec<Job>, DbError>;

    async fn jobs_by_location(&self, location: &str) -> Result<Vec<Job>, DbError>;

    /// Case-insensitive substring match on title or description.
    async fn search_jobs(&self, keyword: &str) -> Result<Vec<Job>, DbError>;

    async fn jobs_by_budget_range(
        &self,
        min: &BigDecimal,
        max: &BigDecimal,
    ) -> Result<Vec<Job>, DbError>;

    async fn transition_job(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Job, DbError>;

    // Applications
    async fn insert_application(&self, application: &Application) -> Result<Application, DbError>;

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, DbError>;

    async fn application_exists(&self, job_id: Uuid, worker_id: Uuid) -> Result<bool, DbError>;

    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>, DbError>;

    async fn applications_for_worker(&self, worker_id: Uuid) -> Result<Vec<Application>, DbError>;

    async fn transition_application(
        &self,
        application_id: Uuid,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Application, DbError>;

    /// Accepts a pending application and rejects every other pending
    /// application for the same job in one transaction. Returns the accepted
    /// application and the rejected siblings.
    async fn accept_application(
        &self,
        application_id: Uuid,
    ) -> Result<(Application, Vec<Application>), DbError>;

    // Contracts
    /// Inserts the contract and moves its job from open to assigned atomically.
    async fn insert_contract_assigning_job(&self, contract: &Contract) -> Result<Contract, DbError>;

    async fn get_contract(&self, contract_id: Uuid) -> Result<Option<Contract>, DbError>;

    async fn contracts_for_user(&self, user_id: Uuid) -> Result<Vec<Contract>, DbError>;

    async fn contracts_by_status(&self, status: ContractStatus) -> Result<Vec<Contract>, DbError>;

    /// Active contracts whose end date falls before `today`.
    async fn overdue_contracts(&self, today: NaiveDate) -> Result<Vec<Contract>, DbError>;

    async fn transition_contract(
        &self,
        contract_id: Uuid,
        expected: ContractStatus,
        next: ContractStatus,
    ) -> Result<Contract, DbError>;

    /// Completes the contract and its assigned job atomically.
    async fn complete_contract(
        &self,
        contract_id: Uuid,
        expected: ContractStatus,
    ) -> Result<(Contract, Job), DbError>;

    // Reviews
    /// Inserts the review and refreshes the reviewed user's worker rating in
    /// the same write. The profile is `None` when the user has none.
    async fn insert_review(&self, review: &Review) -> Result<(Review, Option<WorkerProfile>), DbError>;

    async fn get_review(&self, review_id: Uuid) -> Result<Option<Review>, DbError>;

    async fn reviews_for_contract(&self, contract_id: Uuid) -> Result<Vec<Review>, DbError>;

    async fn reviews_for_user(&self, reviewed_id: Uuid) -> Result<Vec<Review>, DbError>;

    async fn review_exists(&self, contract_id: Uuid, reviewer_id: Uuid) -> Result<bool, DbError>;

    async fn delete_review(&self, review_id: Uuid) -> Result<(Review, Option<WorkerProfile>), DbError>;

    // Disputes
    /// Inserts the dispute and forces the contract to disputed atomically.
    async fn open_dispute(
        &self,
        dispute: &Dispute,
        expected_contract: ContractStatus,
    ) -> Result<(Dispute, Contract), DbError>;

    async fn get_dispute(&self, dispute_id: Uuid) -> Result<Option<Dispute>, DbError>;

    async fn disputes_for_contract(&self, contract_id: Uuid) -> Result<Vec<Dispute>, DbError>;

    async fn disputes_by_status(&self, status: DisputeStatus) -> Result<Vec<Dispute>, DbError>;

    /// Writes the closing fields of a dispute that is still open.
    async fn close_dispute(&self, closed: &Dispute) -> Result<Dispute, DbError>;

    // Skills
    async fn insert_skill(&self, skill: &Skill) -> Result<Skill, DbError>;

    async fn get_skill(&self, skill_id: Uuid) -> Result<Option<Skill>, DbError>;

    async fn get_skill_by_name(&self, name: &str) -> Result<Option<Skill>, DbError>;

    async fn skills_by_status(&self, status: VerificationStatus) -> Result<Vec<Skill>, DbError>;

    async fn transition_skill(
        &self,
        skill_id: Uuid,
        expected: VerificationStatus,
        next: VerificationStatus,
    ) -> Result<Skill, DbError>;

    // Worker profiles
    async fn insert_worker_profile(&self, profile: &WorkerProfile) -> Result<WorkerProfile, DbError>;

    async fn get_worker_profile(&self, profile_id: Uuid) -> Result<Option<WorkerProfile>, DbError>;

    async fn get_worker_profile_by_user(&self, user_id: Uuid) -> Result<Option<WorkerProfile>, DbError>;

    async fn transition_profile_verification(
        &self,
        profile_id: Uuid,
        expected: VerificationStatus,
        next: VerificationStatus,
        verification_code: Option<String>,
    ) -> Result<WorkerProfile, DbError>;

    async fn update_worker_availability(
        &self,
        profile_id: Uuid,
        availability: AvailabilityStatus,
    ) -> Result<WorkerProfile, DbError>;

    async fn update_worker_skills(
        &self,
        profile_id: Uuid,
        skill_ids: &[Uuid],
    ) -> Result<WorkerProfile, DbError>;

    async fn available_profiles(&self) -> Result<Vec<WorkerProfile>, DbError>;

    async fn profiles_by_skill(&self, skill_id: Uuid) -> Result<Vec<WorkerProfile>, DbError>;

    async fn profiles_by_location(&self, location: &str) -> Result<Vec<WorkerProfile>, DbError>;

    /// Rated profiles at or above `min`, best first.
    async fn profiles_by_min_rating(&self, min: f64) -> Result<Vec<WorkerProfile>, DbError>;
}

#[async_trait]
impl LaborExt for DBClient {
    async fn insert_job(&self, job: &Job) -> Result<Job, DbError> {
        let saved = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (id, client_id, title, description, category, budget, location, status, date_posted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(job.client_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.category)
        .bind(&job.budget)
        .bind(&job.location)
        .bind(job.status)
        .bind(job.date_posted)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, DbError> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, DbError> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status = $1 ORDER BY date_posted DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn jobs_for_client(&self, client_id: Uuid) -> Result<Vec<Job>, DbError> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE client_id = $1 ORDER BY date_posted DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn jobs_by_category(&self, category: &str) -> Result<Vec<Job>, DbError> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE LOWER(category) = LOWER($1) ORDER BY date_posted DESC",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn jobs_by_location(&self, location: &str) -> Result<Vec<Job>, DbError> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE LOWER(location) = LOWER($1) ORDER BY date_posted DESC",
        )
        .bind(location)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn search_jobs(&self, keyword: &str) -> Result<Vec<Job>, DbError> {
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobs
            WHERE STRPOS(LOWER(title), LOWER($1)) > 0
               OR STRPOS(LOWER(description), LOWER($1)) > 0
            ORDER BY date_posted DESC
            "#,
        )
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn jobs_by_budget_range(
        &self,
        min: &BigDecimal,
        max: &BigDecimal,
    ) -> Result<Vec<Job>, DbError> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE budget BETWEEN $1 AND $2 ORDER BY budget ASC",
        )
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn transition_job(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Job, DbError> {
        let updated = sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = $3 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(job_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(job) => Ok(job),
            None => Err(DBClient::missing_or_stale(&self.pool, "jobs", "job", job_id, expected.to_str()).await),
        }
    }

    async fn insert_application(&self, application: &Application) -> Result<Application, DbError> {
        sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (id, job_id, worker_id, cover_letter, expected_pay, status, date_applied)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.job_id)
        .bind(application.worker_id)
        .bind(&application.cover_letter)
        .bind(&application.expected_pay)
        .bind(application.status)
        .bind(application.date_applied)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "application for job and worker"))
    }

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, DbError> {
        let application = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(application)
    }

    async fn application_exists(&self, job_id: Uuid, worker_id: Uuid) -> Result<bool, DbError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM applications WHERE job_id = $1 AND worker_id = $2)",
        )
        .bind(job_id)
        .bind(worker_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>, DbError> {
        let applications = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE job_id = $1 ORDER BY date_applied",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn applications_for_worker(&self, worker_id: Uuid) -> Result<Vec<Application>, DbError> {
        let applications = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE worker_id = $1 ORDER BY date_applied DESC",
        )
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn transition_application(
        &self,
        application_id: Uuid,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Application, DbError> {
        let updated = sqlx::query_as::<_, Application>(
            "UPDATE applications SET status = $3 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(application_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(application) => Ok(application),
            None => Err(DBClient::missing_or_stale(
                &self.pool,
                "applications",
                "application",
                application_id,
                expected.to_str(),
            )
            .await),
        }
    }

    async fn accept_application(
        &self,
        application_id: Uuid,
    ) -> Result<(Application, Vec<Application>), DbError> {
        let mut tx = self.pool.begin().await?;

        let accepted = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications SET status = 'accepted'::application_status
            WHERE id = $1 AND status = 'pending'::application_status
              AND EXISTS (
                  SELECT 1 FROM jobs
                  WHERE jobs.id = applications.job_id AND jobs.status = 'open'::job_status
              )
            RETURNING *
            "#,
        )
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?;

        let accepted = match accepted {
            Some(application) => application,
            None => {
                let closed_job = sqlx::query_scalar::<_, Uuid>(
                    r#"
                    SELECT j.id FROM applications a JOIN jobs j ON j.id = a.job_id
                    WHERE a.id = $1 AND j.status <> 'open'::job_status
                    "#,
                )
                .bind(application_id)
                .fetch_optional(&mut *tx)
                .await?;
                if let Some(job_id) = closed_job {
                    return Err(DbError::StaleStatus {
                        entity: "job",
                        id: job_id,
                        expected: JobStatus::Open.to_str(),
                    });
                }
                return Err(DBClient::missing_or_stale(
                    &mut *tx,
                    "applications",
                    "application",
                    application_id,
                    ApplicationStatus::Pending.to_str(),
                )
                .await)
            }
        };

        let rejected = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications SET status = 'rejected'::application_status
            WHERE job_id = $1 AND id <> $2 AND status = 'pending'::application_status
            RETURNING *
            "#,
        )
        .bind(accepted.job_id)
        .bind(accepted.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((accepted, rejected))
    }

    async fn insert_contract_assigning_job(&self, contract: &Contract) -> Result<Contract, DbError> {
        let mut tx = self.pool.begin().await?;

        let assigned = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE jobs SET status = 'assigned'::job_status
            WHERE id = $1 AND status = 'open'::job_status
            RETURNING id
            "#,
        )
        .bind(contract.job_id)
        .fetch_optional(&mut *tx)
        .await?;

        if assigned.is_none() {
            return Err(DBClient::missing_or_stale(
                &mut *tx,
                "jobs",
                "job",
                contract.job_id,
                JobStatus::Open.to_str(),
            )
            .await);
        }

        let saved = sqlx::query_as::<_, Contract>(
            r#"
            INSERT INTO contracts (id, job_id, client_id, worker_id, start_date, end_date, agreed_pay, terms, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(contract.id)
        .bind(contract.job_id)
        .bind(contract.client_id)
        .bind(contract.worker_id)
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(&contract.agreed_pay)
        .bind(&contract.terms)
        .bind(contract.status)
        .bind(contract.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn get_contract(&self, contract_id: Uuid) -> Result<Option<Contract>, DbError> {
        let contract = sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE id = $1")
            .bind(contract_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contract)
    }

    async fn contracts_for_user(&self, user_id: Uuid) -> Result<Vec<Contract>, DbError> {
        let contracts = sqlx::query_as::<_, Contract>(
            r#"
            SELECT * FROM contracts
            WHERE client_id = $1 OR worker_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(contracts)
    }

    async fn contracts_by_status(&self, status: ContractStatus) -> Result<Vec<Contract>, DbError> {
        let contracts = sqlx::query_as::<_, Contract>(
            "SELECT * FROM contracts WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(contracts)
    }

    async fn overdue_contracts(&self, today: NaiveDate) -> Result<Vec<Contract>, DbError> {
        let contracts = sqlx::query_as::<_, Contract>(
            r#"
            SELECT * FROM contracts
            WHERE status = 'active'::contract_status AND end_date < $1
            ORDER BY end_date ASC
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(contracts)
    }

    async fn transition_contract(
        &self,
        contract_id: Uuid,
        expected: ContractStatus,
        next: ContractStatus,
    ) -> Result<Contract, DbError> {
        let updated = sqlx::query_as::<_, Contract>(
            "UPDATE contracts SET status = $3 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(contract_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(contract) => Ok(contract),
            None => Err(DBClient::missing_or_stale(
                &self.pool,
                "contracts",
                "contract",
                contract_id,
                expected.to_str(),
            )
            .await),
        }
    }

    async fn complete_contract(
        &self,
        contract_id: Uuid,
        expected: ContractStatus,
    ) -> Result<(Contract, Job), DbError> {
        let mut tx = self.pool.begin().await?;

        let contract = sqlx::query_as::<_, Contract>(
            r#"
            UPDATE contracts SET status = 'completed'::contract_status
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(contract_id)
        .bind(expected)
        .fetch_optional(&mut *tx)
        .await?;

        let contract = match contract {
            Some(contract) => contract,
            None => {
                return Err(DBClient::missing_or_stale(
                    &mut *tx,
                    "contracts",
                    "contract",
                    contract_id,
                    expected.to_str(),
                )
                .await)
            }
        };

        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET status = 'completed'::job_status
            WHERE id = $1 AND status = 'assigned'::job_status
            RETURNING *
            "#,
        )
        .bind(contract.job_id)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction here rolls back the contract update.
        let job = match job {
            Some(job) => job,
            None => {
                return Err(DBClient::missing_or_stale(
                    &mut *tx,
                    "jobs",
                    "job",
                    contract.job_id,
                    JobStatus::Assigned.to_str(),
                )
                .await)
            }
        };

        tx.commit().await?;
        Ok((contract, job))
    }

    async fn insert_review(&self, review: &Review) -> Result<(Review, Option<WorkerProfile>), DbError> {
        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, contract_id, reviewer_id, reviewed_id, rating, comment, date_posted)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(review.id)
        .bind(review.contract_id)
        .bind(review.reviewer_id)
        .bind(review.reviewed_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.date_posted)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from_insert(e, "review for contract and reviewer"))?;

        let profile = refresh_worker_rating(&mut tx, saved.reviewed_id).await?;
        tx.commit().await?;
        Ok((saved, profile))
    }

    async fn get_review(&self, review_id: Uuid) -> Result<Option<Review>, DbError> {
        let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn reviews_for_contract(&self, contract_id: Uuid) -> Result<Vec<Review>, DbError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE contract_id = $1 ORDER BY date_posted DESC",
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn reviews_for_user(&self, reviewed_id: Uuid) -> Result<Vec<Review>, DbError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE reviewed_id = $1 ORDER BY date_posted DESC",
        )
        .bind(reviewed_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn review_exists(&self, contract_id: Uuid, reviewer_id: Uuid) -> Result<bool, DbError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE contract_id = $1 AND reviewer_id = $2)",
        )
        .bind(contract_id)
        .bind(reviewer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn delete_review(&self, review_id: Uuid) -> Result<(Review, Option<WorkerProfile>), DbError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, Review>("DELETE FROM reviews WHERE id = $1 RETURNING *")
            .bind(review_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound { entity: "review", id: review_id })?;

        let profile = refresh_worker_rating(&mut tx, deleted.reviewed_id).await?;
        tx.commit().await?;
        Ok((deleted, profile))
    }

    async fn open_dispute(
        &self,
        dispute: &Dispute,
        expected_contract: ContractStatus,
    ) -> Result<(Dispute, Contract), DbError> {
        let mut tx = self.pool.begin().await?;

        let contract = sqlx::query_as::<_, Contract>(
            r#"
            UPDATE contracts SET status = 'disputed'::contract_status
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(dispute.contract_id)
        .bind(expected_contract)
        .fetch_optional(&mut *tx)
        .await?;

        let contract = match contract {
            Some(contract) => contract,
            None => {
                return Err(DBClient::missing_or_stale(
                    &mut *tx,
                    "contracts",
                    "contract",
                    dispute.contract_id,
                    expected_contract.to_str(),
                )
                .await)
            }
        };

        let saved = sqlx::query_as::<_, Dispute>(
            r#"
            INSERT INTO disputes (id, contract_id, opened_by, reason, status, resolution_details, closed_by, date_opened, date_closed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(dispute.id)
        .bind(dispute.contract_id)
        .bind(dispute.opened_by)
        .bind(&dispute.reason)
        .bind(dispute.status)
        .bind(&dispute.resolution_details)
        .bind(dispute.closed_by)
        .bind(dispute.date_opened)
        .bind(dispute.date_closed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((saved, contract))
    }

    async fn get_dispute(&self, dispute_id: Uuid) -> Result<Option<Dispute>, DbError> {
        let dispute = sqlx::query_as::<_, Dispute>("SELECT * FROM disputes WHERE id = $1")
            .bind(dispute_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(dispute)
    }

    async fn disputes_for_contract(&self, contract_id: Uuid) -> Result<Vec<Dispute>, DbError> {
        let disputes = sqlx::query_as::<_, Dispute>(
            "SELECT * FROM disputes WHERE contract_id = $1 ORDER BY date_opened DESC",
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(disputes)
    }

    async fn disputes_by_status(&self, status: DisputeStatus) -> Result<Vec<Dispute>, DbError> {
        let disputes = sqlx::query_as::<_, Dispute>(
            "SELECT * FROM disputes WHERE status = $1 ORDER BY date_opened",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(disputes)
    }

    async fn close_dispute(&self, closed: &Dispute) -> Result<Dispute, DbError> {
        let updated = sqlx::query_as::<_, Dispute>(
            r#"
            UPDATE disputes
            SET status = $2, resolution_details = $3, closed_by = $4, date_closed = $5
            WHERE id = $1 AND status = 'open'::dispute_status
            RETURNING *
            "#,
        )
        .bind(closed.id)
        .bind(closed.status)
        .bind(&closed.resolution_details)
        .bind(closed.closed_by)
        .bind(closed.date_closed)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(dispute) => Ok(dispute),
            None => Err(DBClient::missing_or_stale(
                &self.pool,
                "disputes",
                "dispute",
                closed.id,
                DisputeStatus::Open.to_str(),
            )
            .await),
        }
    }

    async fn insert_skill(&self, skill: &Skill) -> Result<Skill, DbError> {
        sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (id, name, category, description, verification_status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(skill.id)
        .bind(&skill.name)
        .bind(&skill.category)
        .bind(&skill.description)
        .bind(skill.verification_status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "skill name"))
    }

    async fn get_skill(&self, skill_id: Uuid) -> Result<Option<Skill>, DbError> {
        let skill = sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE id = $1")
            .bind(skill_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(skill)
    }

    async fn get_skill_by_name(&self, name: &str) -> Result<Option<Skill>, DbError> {
        let skill = sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE LOWER(name) = LOWER($1)")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(skill)
    }

    async fn skills_by_status(&self, status: VerificationStatus) -> Result<Vec<Skill>, DbError> {
        let skills = sqlx::query_as::<_, Skill>(
            "SELECT * FROM skills WHERE verification_status = $1 ORDER BY name",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    async fn transition_skill(
        &self,
        skill_id: Uuid,
        expected: VerificationStatus,
        next: VerificationStatus,
    ) -> Result<Skill, DbError> {
        let updated = sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills SET verification_status = $3
            WHERE id = $1 AND verification_status = $2
            RETURNING *
            "#,
        )
        .bind(skill_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(skill) => Ok(skill),
            None => Err(DBClient::missing_or_stale(&self.pool, "skills", "skill", skill_id, expected.to_str()).await),
        }
    }

    async fn insert_worker_profile(&self, profile: &WorkerProfile) -> Result<WorkerProfile, DbError> {
        sqlx::query_as::<_, WorkerProfile>(
            r#"
            INSERT INTO worker_profiles (
                id, user_id, bio, skill_ids, experience, hourly_rate, location,
                availability, rating, verification_status, verification_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(profile.user_id)
        .bind(&profile.bio)
        .bind(&profile.skill_ids)
        .bind(&profile.experience)
        .bind(&profile.hourly_rate)
        .bind(&profile.location)
        .bind(profile.availability)
        .bind(profile.rating)
        .bind(profile.verification_status)
        .bind(&profile.verification_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "worker profile for user"))
    }

    async fn get_worker_profile(&self, profile_id: Uuid) -> Result<Option<WorkerProfile>, DbError> {
        let profile = sqlx::query_as::<_, WorkerProfile>("SELECT * FROM worker_profiles WHERE id = $1")
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn get_worker_profile_by_user(&self, user_id: Uuid) -> Result<Option<WorkerProfile>, DbError> {
        let profile = sqlx::query_as::<_, WorkerProfile>("SELECT * FROM worker_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn transition_profile_verification(
        &self,
        profile_id: Uuid,
        expected: VerificationStatus,
        next: VerificationStatus,
        verification_code: Option<String>,
    ) -> Result<WorkerProfile, DbError> {
        let updated = sqlx::query_as::<_, WorkerProfile>(
            r#"
            UPDATE worker_profiles
            SET verification_status = $3, verification_code = COALESCE($4, verification_code)
            WHERE id = $1 AND verification_status = $2
            RETURNING *
            "#,
        )
        .bind(profile_id)
        .bind(expected)
        .bind(next)
        .bind(verification_code)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(profile) => Ok(profile),
            None => Err(DBClient::missing_or_stale(
                &self.pool,
                "worker_profiles",
                "worker_profile",
                profile_id,
                expected.to_str(),
            )
            .await),
        }
    }

    async fn update_worker_availability(
        &self,
        profile_id: Uuid,
        availability: AvailabilityStatus,
    ) -> Result<WorkerProfile, DbError> {
        sqlx::query_as::<_, WorkerProfile>(
            "UPDATE worker_profiles SET availability = $2 WHERE id = $1 RETURNING *",
        )
        .bind(profile_id)
        .bind(availability)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound { entity: "worker_profile", id: profile_id })
    }

    async fn update_worker_skills(
        &self,
        profile_id: Uuid,
        skill_ids: &[Uuid],
    ) -> Result<WorkerProfile, DbError> {
        sqlx::query_as::<_, WorkerProfile>(
            "UPDATE worker_profiles SET skill_ids = $2 WHERE id = $1 RETURNING *",
        )
        .bind(profile_id)
        .bind(skill_ids)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound { entity: "worker_profile", id: profile_id })
    }

    async fn available_profiles(&self) -> Result<Vec<WorkerProfile>, DbError> {
        let profiles = sqlx::query_as::<_, WorkerProfile>(
            "SELECT * FROM worker_profiles WHERE availability = 'available'::availability_status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    async fn profiles_by_skill(&self, skill_id: Uuid) -> Result<Vec<WorkerProfile>, DbError> {
        let profiles = sqlx::query_as::<_, WorkerProfile>(
            "SELECT * FROM worker_profiles WHERE $1 = ANY(skill_ids)",
        )
        .bind(skill_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    async fn profiles_by_location(&self, location: &str) -> Result<Vec<WorkerProfile>, DbError> {
        let profiles = sqlx::query_as::<_, WorkerProfile>(
            "SELECT * FROM worker_profiles WHERE LOWER(location) = LOWER($1)",
        )
        .bind(location)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    async fn profiles_by_min_rating(&self, min: f64) -> Result<Vec<WorkerProfile>, DbError> {
        let profiles = sqlx::query_as::<_, WorkerProfile>(
            "SELECT * FROM worker_profiles WHERE rating >= $1 ORDER BY rating DESC",
        )
        .bind(min)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }
}

/// Recomputes the worker's rating from the reviews visible to `tx`.
async fn refresh_worker_rating(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<Option<WorkerProfile>, DbError> {
    // Lock first: the UPDATE below then runs on a snapshot that includes
    // every review committed by a writer that held the lock before us.
    let locked = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM worker_profiles WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;
    if locked.is_none() {
        return Ok(None);
    }

    let profile = sqlx::query_as::<_, WorkerProfile>(
        r#"
        UPDATE worker_profiles
        SET rating = (
            SELECT ROUND(AVG(rating)::numeric, 1)::float8 FROM reviews WHERE reviewed_id = $1
        )
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(profile)
}
