use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::types::BigDecimal;

use super::verificationmodels::VerificationStatus;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Assigned,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Open,
        JobStatus::Assigned,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Assigned => "assigned",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "contract_status", rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Completed,
    Cancelled,
    Disputed,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 4] = [
        ContractStatus::Active,
        ContractStatus::Completed,
        ContractStatus::Cancelled,
        ContractStatus::Disputed,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Completed => "completed",
            ContractStatus::Cancelled => "cancelled",
            ContractStatus::Disputed => "disputed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "dispute_status", rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    Resolved,
    Dismissed,
}

impl DisputeStatus {
    pub const ALL: [DisputeStatus; 3] = [
        DisputeStatus::Open,
        DisputeStatus::Resolved,
        DisputeStatus::Dismissed,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "open",
            DisputeStatus::Resolved => "resolved",
            DisputeStatus::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "availability_status", rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Busy,
    Offline,
}

impl AvailabilityStatus {
    pub fn to_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Busy => "busy",
            AvailabilityStatus::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget: BigDecimal,
    pub location: String,
    pub status: JobStatus,
    pub date_posted: DateTime<Utc>,
}

impl Job {
    pub fn new(
        client_id: Uuid,
        title: &str,
        description: &str,
        category: &str,
        budget: BigDecimal,
        location: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            category: category.trim().to_string(),
            budget,
            location: location.trim().to_string(),
            status: JobStatus::Open,
            date_posted: Utc::now(),
        }
    }

    pub fn with_status(&self, status: JobStatus) -> Self {
        Self { status, ..self.clone() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub worker_id: Uuid,
    pub cover_letter: Option<String>,
    pub expected_pay: Option<BigDecimal>,
    pub status: ApplicationStatus,
    pub date_applied: DateTime<Utc>,
}

impl Application {
    pub fn new(
        job_id: Uuid,
        worker_id: Uuid,
        cover_letter: Option<&str>,
        expected_pay: Option<BigDecimal>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            worker_id,
            cover_letter: cover_letter.map(|c| c.trim().to_string()),
            expected_pay,
            status: ApplicationStatus::Pending,
            date_applied: Utc::now(),
        }
    }

    pub fn with_status(&self, status: ApplicationStatus) -> Self {
        Self { status, ..self.clone() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Contract {
    pub id: Uuid,
    pub job_id: Uuid,
    pub client_id: Uuid,
    pub worker_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub agreed_pay: BigDecimal,
    pub terms: Option<String>,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(
        job_id: Uuid,
        client_id: Uuid,
        worker_id: Uuid,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        agreed_pay: BigDecimal,
        terms: Option<&str>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            client_id,
            worker_id,
            start_date,
            end_date,
            agreed_pay,
            terms: terms.map(|t| t.trim().to_string()),
            status: ContractStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn with_status(&self, status: ContractStatus) -> Self {
        Self { status, ..self.clone() }
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.client_id == user_id || self.worker_id == user_id
    }

    /// The party on the other side of `user_id`, if `user_id` is a party at all.
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.client_id {
            Some(self.worker_id)
        } else if user_id == self.worker_id {
            Some(self.client_id)
        } else {
            None
        }
    }

    pub fn parties(&self) -> [Uuid; 2] {
        [self.client_id, self.worker_id]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub date_posted: DateTime<Utc>,
}

impl Review {
    pub fn new(
        contract_id: Uuid,
        reviewer_id: Uuid,
        reviewed_id: Uuid,
        rating: i32,
        comment: Option<&str>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            reviewer_id,
            reviewed_id,
            rating,
            comment: comment.map(|c| c.trim().to_string()),
            date_posted: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Dispute {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub opened_by: Uuid,
    pub reason: String,
    pub status: DisputeStatus,
    pub resolution_details: Option<String>,
    pub closed_by: Option<Uuid>,
    pub date_opened: DateTime<Utc>,
    pub date_closed: Option<DateTime<Utc>>,
}

impl Dispute {
    pub fn new(contract_id: Uuid, opened_by: Uuid, reason: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            opened_by,
            reason: reason.trim().to_string(),
            status: DisputeStatus::Open,
            resolution_details: None,
            closed_by: None,
            date_opened: Utc::now(),
            date_closed: None,
        }
    }

    pub fn closed(
        &self,
        status: DisputeStatus,
        closed_by: Uuid,
        resolution_details: Option<&str>,
    ) -> Self {
        Self {
            status,
            closed_by: Some(closed_by),
            resolution_details: resolution_details
                .map(|d| d.trim().to_string())
                .or_else(|| self.resolution_details.clone()),
            date_closed: Some(Utc::now()),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub verification_status: VerificationStatus,
}

impl Skill {
    pub fn new(name: &str, category: &str, description: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            description: description.map(|d| d.trim().to_string()),
            verification_status: VerificationStatus::Pending,
        }
    }

    pub fn with_status(&self, verification_status: VerificationStatus) -> Self {
        Self { verification_status, ..self.clone() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct WorkerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub skill_ids: Vec<Uuid>,
    pub experience: Option<String>,
    pub hourly_rate: BigDecimal,
    pub location: String,
    pub availability: AvailabilityStatus,
    pub rating: Option<f64>,
    pub verification_status: VerificationStatus,
    pub verification_code: Option<String>,
}

impl WorkerProfile {
    pub fn new(
        user_id: Uuid,
        bio: Option<&str>,
        skill_ids: Vec<Uuid>,
        experience: Option<&str>,
        hourly_rate: BigDecimal,
        location: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            bio: bio.map(|b| b.trim().to_string()),
            skill_ids,
            experience: experience.map(|e| e.trim().to_string()),
            hourly_rate,
            location: location.trim().to_string(),
            availability: AvailabilityStatus::Available,
            rating: None,
            verification_status: VerificationStatus::Pending,
            verification_code: None,
        }
    }

    pub fn with_verification(
        &self,
        verification_status: VerificationStatus,
        verification_code: Option<&str>,
    ) -> Self {
        Self {
            verification_status,
            verification_code: verification_code
                .map(|c| c.to_string())
                .or_else(|| self.verification_code.clone()),
            ..self.clone()
        }
    }

    pub fn with_availability(&self, availability: AvailabilityStatus) -> Self {
        Self { availability, ..self.clone() }
    }

    pub fn with_skills(&self, skill_ids: Vec<Uuid>) -> Self {
        Self { skill_ids, ..self.clone() }
    }

    pub fn with_rating(&self, rating: Option<f64>) -> Self {
        Self { rating, ..self.clone() }
    }

    pub fn can_receive_jobs(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
            && self.availability == AvailabilityStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> Contract {
        Contract::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            None,
            BigDecimal::from(4500),
            None,
        )
    }

    #[test]
    fn counterparty_is_the_other_side() {
        let c = contract();
        assert_eq!(c.counterparty(c.client_id), Some(c.worker_id));
        assert_eq!(c.counterparty(c.worker_id), Some(c.client_id));
        assert_eq!(c.counterparty(Uuid::new_v4()), None);
    }

    #[test]
    fn closing_a_dispute_keeps_existing_details() {
        let d = Dispute::new(Uuid::new_v4(), Uuid::new_v4(), "Work was never delivered on time");
        let closer = Uuid::new_v4();
        let dismissed = d.closed(DisputeStatus::Dismissed, closer, None);
        assert_eq!(dismissed.closed_by, Some(closer));
        assert!(dismissed.date_closed.is_some());
        assert_eq!(dismissed.resolution_details, None);
        assert_eq!(d.status, DisputeStatus::Open);
    }
}
