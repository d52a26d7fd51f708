// utils/validation.rs
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::config::PlatformLimits;
use crate::models::usermodel::{Mode, Role};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

static PHONE_PATTERN: OnceLock<Regex> = OnceLock::new();
static NAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn phone_pattern() -> &'static Regex {
    // South African mobile and landline numbers
    PHONE_PATTERN.get_or_init(|| Regex::new(r"^(\+27|0)[6-8][0-9]{8}$").expect("valid phone regex"))
}

fn name_pattern() -> &'static Regex {
    NAME_PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z\s]{2,50}$").expect("valid name regex"))
}

/// Outcome of a validation pass. Every failed rule contributes one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    errors: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn check(&mut self, ok: bool, error: &str) -> &mut Self {
        if !ok {
            self.add_error(error);
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.error_message())
        }
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_valid_length(value: &str, min: usize, max: usize) -> bool {
    if is_blank(value) {
        return false;
    }
    let length = value.trim().chars().count();
    length >= min && length <= max
}

/// Absent optional text is valid; present text must fit the bounds.
pub fn is_valid_optional_length(value: Option<&str>, min: usize, max: usize) -> bool {
    value.map_or(true, |v| is_valid_length(v, min, max))
}

pub fn is_valid_email(email: &str) -> bool {
    !is_blank(email) && validator::validate_email(email.trim())
}

pub fn is_valid_name(name: &str) -> bool {
    !is_blank(name) && name_pattern().is_match(name.trim())
}

pub fn is_valid_phone_number(phone: &str) -> bool {
    !is_blank(phone) && phone_pattern().is_match(phone.trim())
}

pub fn is_valid_amount(amount: &BigDecimal, limits: &PlatformLimits) -> bool {
    *amount > BigDecimal::from(0) && *amount <= limits.max_transaction_amount
}

pub fn is_valid_hourly_rate(rate: &BigDecimal, limits: &PlatformLimits) -> bool {
    *rate >= limits.min_hourly_rate && *rate <= limits.max_hourly_rate
}

pub fn is_valid_rating(rating: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

pub fn validate_user(
    first_name: &str,
    last_name: &str,
    email: &str,
    phone_number: Option<&str>,
    roles: &[Role],
    current_mode: Mode,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    report
        .check(
            is_valid_name(first_name),
            "First name must be 2-50 characters and contain only letters and spaces",
        )
        .check(
            is_valid_name(last_name),
            "Last name must be 2-50 characters and contain only letters and spaces",
        )
        .check(is_valid_email(email), "Invalid email format")
        .check(
            phone_number.map_or(true, is_valid_phone_number),
            "Invalid South African phone number format",
        )
        .check(!roles.is_empty(), "User must have at least one role");

    let mode_allowed = roles.iter().any(|role| {
        matches!(
            (role, current_mode),
            (Role::Both, _) | (Role::Client, Mode::Client) | (Role::Worker, Mode::Worker)
        )
    });
    if !roles.is_empty() {
        report.check(mode_allowed, "Current mode is not permitted by the user's roles");
    }
    report
}

pub fn validate_job(
    title: &str,
    description: &str,
    category: &str,
    budget: &BigDecimal,
    location: &str,
    limits: &PlatformLimits,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    report
        .check(is_valid_length(title, 5, 100), "Job title must be 5-100 characters long")
        .check(
            is_valid_length(description, 20, 2000),
            "Job description must be 20-2000 characters long",
        )
        .check(!is_blank(category), "Job category is required")
        .check(
            is_valid_amount(budget, limits),
            &format!(
                "Budget must be positive and not exceed {}",
                limits.max_transaction_amount
            ),
        )
        .check(!is_blank(location), "Job location is required");
    report
}

pub fn validate_application(
    cover_letter: Option<&str>,
    expected_pay: Option<&BigDecimal>,
    limits: &PlatformLimits,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    report
        .check(
            is_valid_optional_length(cover_letter, 20, 1000),
            "Cover letter must be 20-1000 characters long",
        )
        .check(
            expected_pay.map_or(true, |pay| is_valid_amount(pay, limits)),
            "Expected pay must be positive and reasonable",
        );
    report
}

pub fn validate_contract(
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    agreed_pay: &BigDecimal,
    limits: &PlatformLimits,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    report
        .check(
            end_date.map_or(true, |end| end >= start_date),
            "End date cannot be before start date",
        )
        .check(
            is_valid_amount(agreed_pay, limits),
            "Agreed pay must be positive and reasonable",
        );
    report
}

pub fn validate_review(
    reviewer_id: Uuid,
    reviewed_id: Uuid,
    rating: i32,
    comment: Option<&str>,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    report
        .check(reviewer_id != reviewed_id, "User cannot review themselves")
        .check(
            is_valid_rating(rating),
            &format!("Rating must be between {} and {}", MIN_RATING, MAX_RATING),
        )
        .check(
            is_valid_optional_length(comment, 10, 500),
            "Review comment must be 10-500 characters long",
        );
    report
}

pub fn validate_dispute_reason(reason: &str) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.check(
        is_valid_length(reason, 20, 1000),
        "Dispute reason must be 20-1000 characters long",
    );
    report
}

pub fn validate_skill(name: &str, category: &str, description: Option<&str>) -> ValidationReport {
    let mut report = ValidationReport::new();
    report
        .check(is_valid_length(name, 2, 50), "Skill name must be 2-50 characters long")
        .check(!is_blank(category), "Skill category is required")
        .check(
            is_valid_optional_length(description, 10, 500),
            "Skill description must be 10-500 characters long",
        );
    report
}

pub fn validate_worker_profile(
    bio: Option<&str>,
    skill_ids: &[Uuid],
    hourly_rate: &BigDecimal,
    location: &str,
    limits: &PlatformLimits,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    report
        .check(
            is_valid_optional_length(bio, 10, 1000),
            "Bio must be 10-1000 characters long",
        )
        .check(!skill_ids.is_empty(), "Worker must have at least one skill")
        .check(
            is_valid_hourly_rate(hourly_rate, limits),
            &format!(
                "Hourly rate must be between R{} and R{}",
                limits.min_hourly_rate, limits.max_hourly_rate
            ),
        )
        .check(!is_blank(location), "Worker location is required");
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> PlatformLimits {
        PlatformLimits::default()
    }

    #[test]
    fn length_is_measured_on_trimmed_text() {
        assert!(is_valid_length("   abcde   ", 5, 10));
        assert!(!is_valid_length("   abcd   ", 5, 10));
        assert!(!is_valid_length("      ", 0, 10));
        assert!(is_valid_optional_length(None, 20, 1000));
    }

    #[test]
    fn south_african_phone_numbers() {
        assert!(is_valid_phone_number("0821234567"));
        assert!(is_valid_phone_number("+27721234567"));
        assert!(!is_valid_phone_number("0521234567"));
        assert!(!is_valid_phone_number("082123456"));
    }

    #[test]
    fn amounts_must_be_positive_and_capped() {
        let limits = limits();
        assert!(is_valid_amount(&BigDecimal::from(5000), &limits));
        assert!(is_valid_amount(&BigDecimal::from(1_000_000), &limits));
        assert!(!is_valid_amount(&BigDecimal::from(0), &limits));
        assert!(!is_valid_amount(&BigDecimal::from(-100), &limits));
        assert!(!is_valid_amount(&BigDecimal::from(1_000_001), &limits));
    }

    #[test]
    fn contract_end_before_start_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let report = validate_contract(start, Some(end), &BigDecimal::from(100), &limits());
        assert_eq!(report.errors(), ["End date cannot be before start date"]);
    }

    #[test]
    fn review_collects_every_failure() {
        let same = Uuid::new_v4();
        let report = validate_review(same, same, 6, Some("short"));
        assert_eq!(report.errors().len(), 3);
        assert!(report.into_result().is_err());
    }

    #[test]
    fn user_mode_must_match_roles() {
        let report = validate_user(
            "Lerato",
            "Nkosi",
            "lerato@example.com",
            Some("0831234567"),
            &[Role::Client],
            Mode::Worker,
        );
        assert_eq!(report.errors(), ["Current mode is not permitted by the user's roles"]);
    }

    #[test]
    fn worker_profile_rate_bounds() {
        let skills = [Uuid::new_v4()];
        let ok = validate_worker_profile(None, &skills, &BigDecimal::from(50), "Cape Town", &limits());
        assert!(ok.is_valid());
        let low = validate_worker_profile(None, &skills, &BigDecimal::from(49), "Cape Town", &limits());
        assert!(!low.is_valid());
        let empty = validate_worker_profile(None, &[], &BigDecimal::from(200), "Cape Town", &limits());
        assert_eq!(empty.errors(), ["Worker must have at least one skill"]);
    }
}
