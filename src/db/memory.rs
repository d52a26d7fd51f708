// db/memory.rs
//
// In-process store used by the tests and by the server when no database is
// configured. One write guard covers each compound operation, so cascades are
// as atomic here as they are inside a Postgres transaction.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::BigDecimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::DbError;
use super::labourdb::LaborExt;
use super::notificationdb::NotificationExt;
use super::paymentdb::PaymentExt;
use super::userdb::UserExt;
use super::verificationdb::VerificationExt;
use crate::models::labourmodel::*;
use crate::models::notificationmodels::{Notification, NotificationStatus};
use crate::models::paymentmodels::{Payment, PaymentStatus};
use crate::models::usermodel::{Admin, Mode, Permission, User, UserStatus};
use crate::models::verificationmodels::{Verification, VerificationStatus};
use crate::service::rating::average_rating;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    admins: HashMap<Uuid, Admin>,
    verifications: HashMap<Uuid, Verification>,
    jobs: HashMap<Uuid, Job>,
    applications: HashMap<Uuid, Application>,
    contracts: HashMap<Uuid, Contract>,
    reviews: HashMap<Uuid, Review>,
    disputes: HashMap<Uuid, Dispute>,
    skills: HashMap<Uuid, Skill>,
    worker_profiles: HashMap<Uuid, WorkerProfile>,
    payments: HashMap<Uuid, Payment>,
    notifications: HashMap<Uuid, Notification>,
}

impl Tables {
    fn refresh_worker_rating(&mut self, user_id: Uuid) -> Option<WorkerProfile> {
        let ratings: Vec<i32> = self
            .reviews
            .values()
            .filter(|r| r.reviewed_id == user_id)
            .map(|r| r.rating)
            .collect();
        let rating = average_rating(&ratings);
        let profile = self.worker_profiles.values_mut().find(|p| p.user_id == user_id)?;
        *profile = profile.with_rating(rating);
        Some(profile.clone())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    notifications_down: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose notification inserts fail as if the pool had closed.
    #[cfg(test)]
    pub fn with_notifications_down() -> Self {
        Self {
            notifications_down: true,
            ..Self::default()
        }
    }
}

fn select<T: Clone>(
    rows: &HashMap<Uuid, T>,
    keep: impl Fn(&T) -> bool,
    order_by: impl Fn(&T) -> DateTime<Utc>,
    newest_first: bool,
) -> Vec<T> {
    let mut found: Vec<T> = rows.values().filter(|row| keep(row)).cloned().collect();
    found.sort_by_key(|row| order_by(row));
    if newest_first {
        found.reverse();
    }
    found
}

/// Compare-and-swap on a status field. `status_of` reads the current status
/// and `apply` derives the updated row.
fn swap_status<T: Clone, S: PartialEq + Copy>(
    rows: &mut HashMap<Uuid, T>,
    entity: &'static str,
    id: Uuid,
    expected: S,
    expected_label: &'static str,
    status_of: impl Fn(&T) -> S,
    apply: impl FnOnce(&T) -> T,
) -> Result<T, DbError> {
    let row = rows.get_mut(&id).ok_or(DbError::NotFound { entity, id })?;
    if status_of(&*row) != expected {
        return Err(DbError::StaleStatus {
            entity,
            id,
            expected: expected_label,
        });
    }
    *row = apply(&*row);
    Ok(row.clone())
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<User, DbError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DbError::Duplicate("email".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, DbError> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let email = email.trim().to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn users_by_status(&self, status: UserStatus) -> Result<Vec<User>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.users, |u| u.status == status, |u| u.date_joined, true))
    }

    async fn transition_user_status(
        &self,
        user_id: Uuid,
        expected: UserStatus,
        next: UserStatus,
    ) -> Result<User, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.users,
            "user",
            user_id,
            expected,
            expected.to_str(),
            |u| u.status,
            |u| u.with_status(next),
        )
    }

    async fn update_user_mode(&self, user_id: Uuid, mode: Mode) -> Result<User, DbError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(DbError::NotFound { entity: "user", id: user_id })?;
        *user = user.with_mode(mode);
        Ok(user.clone())
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<Admin, DbError> {
        let mut tables = self.tables.write().await;
        if tables.admins.values().any(|a| a.user_id == admin.user_id) {
            return Err(DbError::Duplicate("admin for user".to_string()));
        }
        tables.admins.insert(admin.id, admin.clone());
        Ok(admin.clone())
    }

    async fn get_admin(&self, admin_id: Uuid) -> Result<Option<Admin>, DbError> {
        Ok(self.tables.read().await.admins.get(&admin_id).cloned())
    }

    async fn get_admin_by_user(&self, user_id: Uuid) -> Result<Option<Admin>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.admins.values().find(|a| a.user_id == user_id).cloned())
    }

    async fn admins_with_permission(&self, permission: Permission) -> Result<Vec<Admin>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(
            &tables.admins,
            |a| a.has_permission(permission),
            |a| a.date_created,
            false,
        ))
    }

    async fn add_admin_permission(
        &self,
        admin_id: Uuid,
        permission: Permission,
    ) -> Result<Admin, DbError> {
        let mut tables = self.tables.write().await;
        let admin = tables
            .admins
            .get_mut(&admin_id)
            .ok_or(DbError::NotFound { entity: "admin", id: admin_id })?;
        if !admin.permissions.contains(&permission) {
            admin.permissions.push(permission);
        }
        Ok(admin.clone())
    }

    async fn remove_admin_permission(
        &self,
        admin_id: Uuid,
        permission: Permission,
    ) -> Result<Admin, DbError> {
        let mut tables = self.tables.write().await;
        let admin = tables
            .admins
            .get_mut(&admin_id)
            .ok_or(DbError::NotFound { entity: "admin", id: admin_id })?;
        admin.permissions.retain(|p| *p != permission);
        Ok(admin.clone())
    }

    async fn append_admin_log(&self, admin_id: Uuid, entry: &str) -> Result<Admin, DbError> {
        let mut tables = self.tables.write().await;
        let admin = tables
            .admins
            .get_mut(&admin_id)
            .ok_or(DbError::NotFound { entity: "admin", id: admin_id })?;
        if !admin.actions_log.is_empty() {
            admin.actions_log.push('\n');
        }
        admin.actions_log.push_str(entry);
        Ok(admin.clone())
    }
}

#[async_trait]
impl VerificationExt for MemoryStore {
    async fn insert_verification(&self, verification: &Verification) -> Result<Verification, DbError> {
        let mut tables = self.tables.write().await;
        tables.verifications.insert(verification.id, verification.clone());
        Ok(verification.clone())
    }

    async fn get_verification(&self, verification_id: Uuid) -> Result<Option<Verification>, DbError> {
        Ok(self.tables.read().await.verifications.get(&verification_id).cloned())
    }

    async fn verifications_for_user(&self, user_id: Uuid) -> Result<Vec<Verification>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(
            &tables.verifications,
            |v| v.user_id == user_id,
            |v| v.date_submitted,
            true,
        ))
    }

    async fn transition_verification(
        &self,
        verification_id: Uuid,
        expected: VerificationStatus,
        next: VerificationStatus,
        date_verified: DateTime<Utc>,
    ) -> Result<Verification, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.verifications,
            "verification",
            verification_id,
            expected,
            expected.to_str(),
            |v| v.status,
            |v| v.with_status(next, date_verified),
        )
    }
}

#[async_trait]
impl LaborExt for MemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<Job, DbError> {
        let mut tables = self.tables.write().await;
        tables.jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, DbError> {
        Ok(self.tables.read().await.jobs.get(&job_id).cloned())
    }

    async fn jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.jobs, |j| j.status == status, |j| j.date_posted, true))
    }

    async fn jobs_for_client(&self, client_id: Uuid) -> Result<Vec<Job>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.jobs, |j| j.client_id == client_id, |j| j.date_posted, true))
    }

    async fn jobs_by_category(&self, category: &str) -> Result<Vec<Job>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(
            &tables.jobs,
            |j| j.category.to_lowercase() == category.to_lowercase(),
            |j| j.date_posted,
            true,
        ))
    }

    async fn jobs_by_location(&self, location: &str) -> Result<Vec<Job>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(
            &tables.jobs,
            |j| j.location.to_lowercase() == location.to_lowercase(),
            |j| j.date_posted,
            true,
        ))
    }

    async fn search_jobs(&self, keyword: &str) -> Result<Vec<Job>, DbError> {
        let keyword = keyword.to_lowercase();
        let tables = self.tables.read().await;
        Ok(select(
            &tables.jobs,
            |j| {
                j.title.to_lowercase().contains(&keyword)
                    || j.description.to_lowercase().contains(&keyword)
            },
            |j| j.date_posted,
            true,
        ))
    }

    async fn jobs_by_budget_range(
        &self,
        min: &BigDecimal,
        max: &BigDecimal,
    ) -> Result<Vec<Job>, DbError> {
        let tables = self.tables.read().await;
        let mut jobs: Vec<Job> = tables
            .jobs
            .values()
            .filter(|j| &j.budget >= min && &j.budget <= max)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.budget.cmp(&b.budget));
        Ok(jobs)
    }

    async fn transition_job(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Job, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.jobs,
            "job",
            job_id,
            expected,
            expected.to_str(),
            |j| j.status,
            |j| j.with_status(next),
        )
    }

    async fn insert_application(&self, application: &Application) -> Result<Application, DbError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .applications
            .values()
            .any(|a| a.job_id == application.job_id && a.worker_id == application.worker_id);
        if duplicate {
            return Err(DbError::Duplicate("application for job and worker".to_string()));
        }
        tables.applications.insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, DbError> {
        Ok(self.tables.read().await.applications.get(&application_id).cloned())
    }

    async fn application_exists(&self, job_id: Uuid, worker_id: Uuid) -> Result<bool, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .values()
            .any(|a| a.job_id == job_id && a.worker_id == worker_id))
    }

    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.applications, |a| a.job_id == job_id, |a| a.date_applied, false))
    }

    async fn applications_for_worker(&self, worker_id: Uuid) -> Result<Vec<Application>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(
            &tables.applications,
            |a| a.worker_id == worker_id,
            |a| a.date_applied,
            true,
        ))
    }

    async fn transition_application(
        &self,
        application_id: Uuid,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Application, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.applications,
            "application",
            application_id,
            expected,
            expected.to_str(),
            |a| a.status,
            |a| a.with_status(next),
        )
    }

    async fn accept_application(
        &self,
        application_id: Uuid,
    ) -> Result<(Application, Vec<Application>), DbError> {
        let mut tables = self.tables.write().await;
        let job_id = tables
            .applications
            .get(&application_id)
            .ok_or(DbError::NotFound { entity: "application", id: application_id })?
            .job_id;
        if tables.jobs.get(&job_id).map(|j| j.status) != Some(JobStatus::Open) {
            return Err(DbError::StaleStatus {
                entity: "job",
                id: job_id,
                expected: JobStatus::Open.to_str(),
            });
        }

        let accepted = swap_status(
            &mut tables.applications,
            "application",
            application_id,
            ApplicationStatus::Pending,
            ApplicationStatus::Pending.to_str(),
            |a| a.status,
            |a| a.with_status(ApplicationStatus::Accepted),
        )?;

        let mut rejected = Vec::new();
        for application in tables.applications.values_mut() {
            if application.job_id == accepted.job_id
                && application.id != accepted.id
                && application.status == ApplicationStatus::Pending
            {
                *application = application.with_status(ApplicationStatus::Rejected);
                rejected.push(application.clone());
            }
        }
        rejected.sort_by_key(|a| a.date_applied);
        Ok((accepted, rejected))
    }

    async fn insert_contract_assigning_job(&self, contract: &Contract) -> Result<Contract, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.jobs,
            "job",
            contract.job_id,
            JobStatus::Open,
            JobStatus::Open.to_str(),
            |j| j.status,
            |j| j.with_status(JobStatus::Assigned),
        )?;
        tables.contracts.insert(contract.id, contract.clone());
        Ok(contract.clone())
    }

    async fn get_contract(&self, contract_id: Uuid) -> Result<Option<Contract>, DbError> {
        Ok(self.tables.read().await.contracts.get(&contract_id).cloned())
    }

    async fn contracts_for_user(&self, user_id: Uuid) -> Result<Vec<Contract>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.contracts, |c| c.is_party(user_id), |c| c.created_at, true))
    }

    async fn contracts_by_status(&self, status: ContractStatus) -> Result<Vec<Contract>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.contracts, |c| c.status == status, |c| c.created_at, true))
    }

    async fn overdue_contracts(&self, today: NaiveDate) -> Result<Vec<Contract>, DbError> {
        let tables = self.tables.read().await;
        let mut overdue: Vec<Contract> = tables
            .contracts
            .values()
            .filter(|c| c.status == ContractStatus::Active && c.end_date.is_some_and(|end| end < today))
            .cloned()
            .collect();
        overdue.sort_by_key(|c| c.end_date);
        Ok(overdue)
    }

    async fn transition_contract(
        &self,
        contract_id: Uuid,
        expected: ContractStatus,
        next: ContractStatus,
    ) -> Result<Contract, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.contracts,
            "contract",
            contract_id,
            expected,
            expected.to_str(),
            |c| c.status,
            |c| c.with_status(next),
        )
    }

    async fn complete_contract(
        &self,
        contract_id: Uuid,
        expected: ContractStatus,
    ) -> Result<(Contract, Job), DbError> {
        let mut tables = self.tables.write().await;

        // Check both preconditions before writing either row.
        let contract = tables
            .contracts
            .get(&contract_id)
            .ok_or(DbError::NotFound { entity: "contract", id: contract_id })?;
        if contract.status != expected {
            return Err(DbError::StaleStatus {
                entity: "contract",
                id: contract_id,
                expected: expected.to_str(),
            });
        }
        let job_id = contract.job_id;
        let job = tables
            .jobs
            .get(&job_id)
            .ok_or(DbError::NotFound { entity: "job", id: job_id })?;
        if job.status != JobStatus::Assigned {
            return Err(DbError::StaleStatus {
                entity: "job",
                id: job_id,
                expected: JobStatus::Assigned.to_str(),
            });
        }

        let completed_job = job.with_status(JobStatus::Completed);
        let completed = contract.with_status(ContractStatus::Completed);
        tables.jobs.insert(job_id, completed_job.clone());
        tables.contracts.insert(contract_id, completed.clone());
        Ok((completed, completed_job))
    }

    async fn insert_review(&self, review: &Review) -> Result<(Review, Option<WorkerProfile>), DbError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .reviews
            .values()
            .any(|r| r.contract_id == review.contract_id && r.reviewer_id == review.reviewer_id);
        if duplicate {
            return Err(DbError::Duplicate("review for contract and reviewer".to_string()));
        }
        tables.reviews.insert(review.id, review.clone());
        let profile = tables.refresh_worker_rating(review.reviewed_id);
        Ok((review.clone(), profile))
    }

    async fn get_review(&self, review_id: Uuid) -> Result<Option<Review>, DbError> {
        Ok(self.tables.read().await.reviews.get(&review_id).cloned())
    }

    async fn reviews_for_contract(&self, contract_id: Uuid) -> Result<Vec<Review>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.reviews, |r| r.contract_id == contract_id, |r| r.date_posted, true))
    }

    async fn reviews_for_user(&self, reviewed_id: Uuid) -> Result<Vec<Review>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.reviews, |r| r.reviewed_id == reviewed_id, |r| r.date_posted, true))
    }

    async fn review_exists(&self, contract_id: Uuid, reviewer_id: Uuid) -> Result<bool, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .any(|r| r.contract_id == contract_id && r.reviewer_id == reviewer_id))
    }

    async fn delete_review(&self, review_id: Uuid) -> Result<(Review, Option<WorkerProfile>), DbError> {
        let mut tables = self.tables.write().await;
        let review = tables
            .reviews
            .remove(&review_id)
            .ok_or(DbError::NotFound { entity: "review", id: review_id })?;
        let profile = tables.refresh_worker_rating(review.reviewed_id);
        Ok((review, profile))
    }

    async fn open_dispute(
        &self,
        dispute: &Dispute,
        expected_contract: ContractStatus,
    ) -> Result<(Dispute, Contract), DbError> {
        let mut tables = self.tables.write().await;
        let contract = swap_status(
            &mut tables.contracts,
            "contract",
            dispute.contract_id,
            expected_contract,
            expected_contract.to_str(),
            |c| c.status,
            |c| c.with_status(ContractStatus::Disputed),
        )?;
        tables.disputes.insert(dispute.id, dispute.clone());
        Ok((dispute.clone(), contract))
    }

    async fn get_dispute(&self, dispute_id: Uuid) -> Result<Option<Dispute>, DbError> {
        Ok(self.tables.read().await.disputes.get(&dispute_id).cloned())
    }

    async fn disputes_for_contract(&self, contract_id: Uuid) -> Result<Vec<Dispute>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.disputes, |d| d.contract_id == contract_id, |d| d.date_opened, true))
    }

    async fn disputes_by_status(&self, status: DisputeStatus) -> Result<Vec<Dispute>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.disputes, |d| d.status == status, |d| d.date_opened, false))
    }

    async fn close_dispute(&self, closed: &Dispute) -> Result<Dispute, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.disputes,
            "dispute",
            closed.id,
            DisputeStatus::Open,
            DisputeStatus::Open.to_str(),
            |d| d.status,
            |d| Dispute {
                status: closed.status,
                resolution_details: closed.resolution_details.clone(),
                closed_by: closed.closed_by,
                date_closed: closed.date_closed,
                ..d.clone()
            },
        )
    }

    async fn insert_skill(&self, skill: &Skill) -> Result<Skill, DbError> {
        let mut tables = self.tables.write().await;
        if tables.skills.values().any(|s| s.name.eq_ignore_ascii_case(&skill.name)) {
            return Err(DbError::Duplicate("skill name".to_string()));
        }
        tables.skills.insert(skill.id, skill.clone());
        Ok(skill.clone())
    }

    async fn get_skill(&self, skill_id: Uuid) -> Result<Option<Skill>, DbError> {
        Ok(self.tables.read().await.skills.get(&skill_id).cloned())
    }

    async fn get_skill_by_name(&self, name: &str) -> Result<Option<Skill>, DbError> {
        let name = name.trim();
        let tables = self.tables.read().await;
        Ok(tables.skills.values().find(|s| s.name.eq_ignore_ascii_case(name)).cloned())
    }

    async fn skills_by_status(&self, status: VerificationStatus) -> Result<Vec<Skill>, DbError> {
        let tables = self.tables.read().await;
        let mut skills: Vec<Skill> = tables
            .skills
            .values()
            .filter(|s| s.verification_status == status)
            .cloned()
            .collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }

    async fn transition_skill(
        &self,
        skill_id: Uuid,
        expected: VerificationStatus,
        next: VerificationStatus,
    ) -> Result<Skill, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.skills,
            "skill",
            skill_id,
            expected,
            expected.to_str(),
            |s| s.verification_status,
            |s| s.with_status(next),
        )
    }

    async fn insert_worker_profile(&self, profile: &WorkerProfile) -> Result<WorkerProfile, DbError> {
        let mut tables = self.tables.write().await;
        if tables.worker_profiles.values().any(|p| p.user_id == profile.user_id) {
            return Err(DbError::Duplicate("worker profile for user".to_string()));
        }
        tables.worker_profiles.insert(profile.id, profile.clone());
        Ok(profile.clone())
    }

    async fn get_worker_profile(&self, profile_id: Uuid) -> Result<Option<WorkerProfile>, DbError> {
        Ok(self.tables.read().await.worker_profiles.get(&profile_id).cloned())
    }

    async fn get_worker_profile_by_user(&self, user_id: Uuid) -> Result<Option<WorkerProfile>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.worker_profiles.values().find(|p| p.user_id == user_id).cloned())
    }

    async fn transition_profile_verification(
        &self,
        profile_id: Uuid,
        expected: VerificationStatus,
        next: VerificationStatus,
        verification_code: Option<String>,
    ) -> Result<WorkerProfile, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.worker_profiles,
            "worker_profile",
            profile_id,
            expected,
            expected.to_str(),
            |p| p.verification_status,
            |p| p.with_verification(next, verification_code.as_deref()),
        )
    }

    async fn update_worker_availability(
        &self,
        profile_id: Uuid,
        availability: AvailabilityStatus,
    ) -> Result<WorkerProfile, DbError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .worker_profiles
            .get_mut(&profile_id)
            .ok_or(DbError::NotFound { entity: "worker_profile", id: profile_id })?;
        *profile = profile.with_availability(availability);
        Ok(profile.clone())
    }

    async fn update_worker_skills(
        &self,
        profile_id: Uuid,
        skill_ids: &[Uuid],
    ) -> Result<WorkerProfile, DbError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .worker_profiles
            .get_mut(&profile_id)
            .ok_or(DbError::NotFound { entity: "worker_profile", id: profile_id })?;
        *profile = profile.with_skills(skill_ids.to_vec());
        Ok(profile.clone())
    }

    async fn available_profiles(&self) -> Result<Vec<WorkerProfile>, DbError> {
        let tables = self.tables.read().await;
        Ok(profiles_where(&tables, |p| p.availability == AvailabilityStatus::Available))
    }

    async fn profiles_by_skill(&self, skill_id: Uuid) -> Result<Vec<WorkerProfile>, DbError> {
        let tables = self.tables.read().await;
        Ok(profiles_where(&tables, |p| p.skill_ids.contains(&skill_id)))
    }

    async fn profiles_by_location(&self, location: &str) -> Result<Vec<WorkerProfile>, DbError> {
        let tables = self.tables.read().await;
        Ok(profiles_where(&tables, |p| p.location.to_lowercase() == location.to_lowercase()))
    }

    async fn profiles_by_min_rating(&self, min: f64) -> Result<Vec<WorkerProfile>, DbError> {
        let tables = self.tables.read().await;
        let mut rated = profiles_where(&tables, |p| p.rating.is_some_and(|r| r >= min));
        rated.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
        Ok(rated)
    }
}

fn profiles_where(tables: &Tables, keep: impl Fn(&WorkerProfile) -> bool) -> Vec<WorkerProfile> {
    tables.worker_profiles.values().filter(|p| keep(p)).cloned().collect()
}

#[async_trait]
impl PaymentExt for MemoryStore {
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, DbError> {
        let mut tables = self.tables.write().await;
        tables.payments.insert(payment.id, payment.clone());
        Ok(payment.clone())
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, DbError> {
        Ok(self.tables.read().await.payments.get(&payment_id).cloned())
    }

    async fn payments_for_contract(&self, contract_id: Uuid) -> Result<Vec<Payment>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(
            &tables.payments,
            |p| p.contract_id == contract_id,
            |p| p.date_processed,
            true,
        ))
    }

    async fn payments_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(&tables.payments, |p| p.status == status, |p| p.date_processed, true))
    }

    async fn payments_for_client(&self, client_id: Uuid) -> Result<Vec<Payment>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(
            &tables.payments,
            |p| tables.contracts.get(&p.contract_id).is_some_and(|c| c.client_id == client_id),
            |p| p.date_processed,
            true,
        ))
    }

    async fn payments_for_worker(&self, worker_id: Uuid) -> Result<Vec<Payment>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(
            &tables.payments,
            |p| tables.contracts.get(&p.contract_id).is_some_and(|c| c.worker_id == worker_id),
            |p| p.date_processed,
            true,
        ))
    }

    async fn total_amount_by_status(&self, status: PaymentStatus) -> Result<BigDecimal, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.status == status)
            .fold(BigDecimal::from(0), |total, p| total + &p.amount))
    }

    async fn transition_payment(
        &self,
        payment_id: Uuid,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<Payment, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.payments,
            "payment",
            payment_id,
            expected,
            expected.to_str(),
            |p| p.status,
            |p| p.with_status(next),
        )
    }

    async fn delete_payment(&self, payment_id: Uuid) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        let payment = tables
            .payments
            .get(&payment_id)
            .ok_or(DbError::NotFound { entity: "payment", id: payment_id })?;
        if payment.status == PaymentStatus::Released {
            return Err(DbError::StaleStatus {
                entity: "payment",
                id: payment_id,
                expected: "not released",
            });
        }
        tables.payments.remove(&payment_id);
        Ok(())
    }
}

#[async_trait]
impl NotificationExt for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<Notification, DbError> {
        #[cfg(test)]
        if self.notifications_down {
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        let mut tables = self.tables.write().await;
        tables.notifications.insert(notification.id, notification.clone());
        Ok(notification.clone())
    }

    async fn get_notification(&self, notification_id: Uuid) -> Result<Option<Notification>, DbError> {
        Ok(self.tables.read().await.notifications.get(&notification_id).cloned())
    }

    async fn notifications_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, DbError> {
        let tables = self.tables.read().await;
        Ok(select(
            &tables.notifications,
            |n| n.user_id == user_id && (!unread_only || n.status == NotificationStatus::Unread),
            |n| n.date_sent,
            true,
        ))
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, DbError> {
        let tables = self.tables.read().await;
        let count = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && n.status == NotificationStatus::Unread)
            .count();
        Ok(count as i64)
    }

    async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification, DbError> {
        let mut tables = self.tables.write().await;
        swap_status(
            &mut tables.notifications,
            "notification",
            notification_id,
            NotificationStatus::Unread,
            NotificationStatus::Unread.to_str(),
            |n| n.status,
            |n| n.with_status(NotificationStatus::Read),
        )
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, DbError> {
        let mut tables = self.tables.write().await;
        let mut updated = 0;
        for notification in tables.notifications.values_mut() {
            if notification.user_id == user_id && notification.status == NotificationStatus::Unread {
                *notification = notification.with_status(NotificationStatus::Read);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn job() -> Job {
        Job::new(
            Uuid::new_v4(),
            "Paint a two bedroom flat",
            "Interior walls, two coats, paint supplied by the client",
            "painting",
            BigDecimal::from(5000),
            "Cape Town",
        )
    }

    #[tokio::test]
    async fn stale_status_is_reported_without_writing() {
        let store = MemoryStore::new();
        let job = store.insert_job(&job()).await.unwrap();

        let err = store
            .transition_job(job.id, JobStatus::Assigned, JobStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StaleStatus { entity: "job", .. }));
        assert_eq!(store.get_job(job.id).await.unwrap().unwrap().status, JobStatus::Open);
    }

    #[tokio::test]
    async fn complete_contract_leaves_rows_untouched_when_job_not_assigned() {
        let store = MemoryStore::new();
        let job = store.insert_job(&job()).await.unwrap();
        let contract = Contract::new(
            job.id,
            job.client_id,
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            None,
            BigDecimal::from(5000),
            None,
        );
        store.insert_contract_assigning_job(&contract).await.unwrap();
        store
            .transition_job(job.id, JobStatus::Assigned, JobStatus::Cancelled)
            .await
            .unwrap();

        let err = store
            .complete_contract(contract.id, ContractStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StaleStatus { entity: "job", .. }));
        let stored = store.get_contract(contract.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::Active);
    }

    #[tokio::test]
    async fn accept_is_refused_once_the_job_is_assigned() {
        let store = MemoryStore::new();
        let job = store.insert_job(&job()).await.unwrap();
        let application = Application::new(job.id, Uuid::new_v4(), None, None);
        store.insert_application(&application).await.unwrap();
        store
            .transition_job(job.id, JobStatus::Open, JobStatus::Assigned)
            .await
            .unwrap();

        let err = store.accept_application(application.id).await.unwrap_err();
        assert!(matches!(err, DbError::StaleStatus { entity: "job", .. }));
        let stored = store.get_application(application.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn admin_log_only_grows() {
        let store = MemoryStore::new();
        let admin = Admin::new(Uuid::new_v4(), vec![Permission::ViewReports], "created");
        store.insert_admin(&admin).await.unwrap();
        store.append_admin_log(admin.id, "first").await.unwrap();
        let updated = store.append_admin_log(admin.id, "second").await.unwrap();
        let lines: Vec<&str> = updated.log_entries().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("created"));
        assert_eq!(lines[2], "second");
    }
}
