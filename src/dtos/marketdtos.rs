// dtos/marketdtos.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::HttpError,
    models::{
        labourmodel::{AvailabilityStatus, ContractStatus},
        paymentmodels::{PaymentMethod, PaymentStatus},
        usermodel::{Mode, Permission, Role, UserStatus},
        verificationmodels::{DocumentType, VerificationStatus},
    },
    service::contract_service::SettlementOutcome,
    utils::decimal::to_money,
};

// Users
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 50, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    pub phone_number: Option<String>,

    #[validate(length(min = 1, message = "At least one role is required"))]
    pub roles: Vec<Role>,

    pub current_mode: Mode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwitchModeDto {
    pub mode: Mode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserStatusQuery {
    pub status: Option<UserStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReasonDto {
    #[serde(default)]
    pub reason: String,
}

// Jobs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PostJobDto {
    pub client_id: Uuid,

    #[validate(length(min = 5, max = 100, message = "Job title must be 5-100 characters long"))]
    pub title: String,

    #[validate(length(min = 20, max = 2000, message = "Job description must be 20-2000 characters long"))]
    pub description: String,

    #[validate(length(min = 1, message = "Job category is required"))]
    pub category: String,

    #[validate(range(min = 0.01, message = "Budget must be positive"))]
    pub budget: f64,

    #[validate(length(min = 1, message = "Job location is required"))]
    pub location: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ApplyForJobDto {
    pub worker_id: Uuid,

    #[validate(length(min = 20, max = 1000, message = "Cover letter must be 20-1000 characters long"))]
    pub cover_letter: Option<String>,

    #[validate(range(min = 0.01, message = "Expected pay must be positive"))]
    pub expected_pay: Option<f64>,
}

// Contracts
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateContractDto {
    pub job_id: Uuid,
    pub client_id: Uuid,
    pub worker_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 0.01, message = "Agreed pay must be positive"))]
    pub agreed_pay: f64,

    #[validate(length(max = 5000))]
    pub terms: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettleContractDto {
    pub outcome: SettlementOutcome,
}

/// Job discovery filters. The first one present wins, in field order; both
/// budget bounds are required for a range search.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobSearchQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContractFilterQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<ContractStatus>,
}

// Payments
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePaymentDto {
    pub contract_id: Uuid,

    #[validate(range(min = 0.01, message = "Payment amount must be positive"))]
    pub amount: f64,

    /// Ignored for escrow payments, which are always card payments.
    pub method: Option<PaymentMethod>,

    #[serde(default)]
    pub escrow: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentStatusQuery {
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentTotalDto {
    pub status: PaymentStatus,
    pub total: f64,
}

// Reviews
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateReviewDto {
    pub contract_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_id: Uuid,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(min = 10, max = 500, message = "Review comment must be 10-500 characters long"))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingDto {
    pub user_id: Uuid,
    pub average_rating: Option<f64>,
    pub review_count: usize,
}

// Disputes
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OpenDisputeDto {
    pub contract_id: Uuid,
    pub opened_by: Uuid,

    #[validate(length(min = 20, max = 1000, message = "Dispute reason must be 20-1000 characters long"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResolveDisputeDto {
    #[validate(length(min = 1, message = "Resolution details are required"))]
    pub resolution_details: String,
    pub resolved_by: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DismissDisputeDto {
    pub dismissed_by: Uuid,
}

// Admins
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdminKind {
    Super,
    SkillVerifier,
    Custom,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAdminDto {
    pub user_id: Uuid,
    pub kind: AdminKind,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionDto {
    pub permission: Permission,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LogActionDto {
    #[validate(length(min = 1, max = 500, message = "Action description is required"))]
    pub action: String,
}

// Skills and worker profiles
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateSkillDto {
    #[validate(length(min = 2, max = 50, message = "Skill name must be 2-50 characters long"))]
    pub name: String,

    #[validate(length(min = 1, message = "Skill category is required"))]
    pub category: String,

    pub description: Option<String>,

    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerProfileQuery {
    pub skill_id: Option<Uuid>,
    pub location: Option<String>,
    pub min_rating: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkillQuery {
    pub name: Option<String>,
    pub status: Option<VerificationStatus>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateWorkerProfileDto {
    pub user_id: Uuid,

    #[validate(length(min = 10, max = 1000, message = "Bio must be 10-1000 characters long"))]
    pub bio: Option<String>,

    #[validate(length(min = 1, message = "Worker must have at least one skill"))]
    pub skill_ids: Vec<Uuid>,

    pub experience: Option<String>,

    pub hourly_rate: f64,

    #[validate(length(min = 1, message = "Worker location is required"))]
    pub location: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VerifyProfileDto {
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub verification_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityDto {
    pub availability: AvailabilityStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkillRefDto {
    pub skill_id: Uuid,
}

// Verification documents
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitVerificationDto {
    pub user_id: Uuid,
    pub document_type: DocumentType,

    #[validate(url(message = "Document URL is invalid"))]
    pub document_url: String,

    pub verification_code: Option<String>,
}

// Notifications
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountDto {
    pub user_id: Uuid,
    pub unread: i64,
}

//Response wrappers
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

/// Converts a request amount to money, rejecting values that cannot be represented.
pub fn money(field: &str, amount: f64) -> Result<BigDecimal, HttpError> {
    to_money(amount).ok_or_else(|| HttpError::bad_request(format!("{} is not a valid amount", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_dto_bounds() {
        let dto = CreateReviewDto {
            contract_id: Uuid::new_v4(),
            reviewer_id: Uuid::new_v4(),
            reviewed_id: Uuid::new_v4(),
            rating: 6,
            comment: Some("ok".to_string()),
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("rating"));
        assert!(fields.contains_key("comment"));
    }

    #[test]
    fn money_rejects_nan() {
        assert!(money("amount", f64::NAN).is_err());
        assert_eq!(money("amount", 12.5).unwrap(), BigDecimal::try_from(12.5).unwrap());
    }
}
