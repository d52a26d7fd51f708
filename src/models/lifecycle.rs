// models/lifecycle.rs
//
// Transition tables for every status-bearing entity. Services consult the
// matching table before issuing a conditional status write.
use super::labourmodel::{ApplicationStatus, ContractStatus, DisputeStatus, JobStatus};
use super::paymentmodels::PaymentStatus;
use super::usermodel::UserStatus;
use super::verificationmodels::VerificationStatus;

pub trait Status: Copy + PartialEq + 'static {
    fn label(&self) -> &'static str;
}

macro_rules! impl_status {
    ($($ty:ty),* $(,)?) => {
        $(impl Status for $ty {
            fn label(&self) -> &'static str {
                self.to_str()
            }
        })*
    };
}

impl_status!(
    JobStatus,
    ApplicationStatus,
    ContractStatus,
    DisputeStatus,
    PaymentStatus,
    VerificationStatus,
    UserStatus,
);

#[derive(Debug, Clone, Copy)]
pub struct Lifecycle<S: 'static> {
    pub entity: &'static str,
    edges: &'static [(S, &'static [S])],
}

impl<S: Status> Lifecycle<S> {
    pub const fn new(entity: &'static str, edges: &'static [(S, &'static [S])]) -> Self {
        Self { entity, edges }
    }

    pub fn next_statuses(&self, from: S) -> &'static [S] {
        self.edges
            .iter()
            .find(|(state, _)| *state == from)
            .map(|(_, next)| *next)
            .unwrap_or(&[])
    }

    pub fn permits(&self, from: S, to: S) -> bool {
        self.next_statuses(from).contains(&to)
    }

    pub fn is_terminal(&self, status: S) -> bool {
        self.next_statuses(status).is_empty()
    }
}

pub const JOB_LIFECYCLE: Lifecycle<JobStatus> = Lifecycle::new(
    "job",
    &[
        (JobStatus::Open, &[JobStatus::Assigned, JobStatus::Cancelled]),
        (JobStatus::Assigned, &[JobStatus::Completed, JobStatus::Cancelled]),
    ],
);

pub const APPLICATION_LIFECYCLE: Lifecycle<ApplicationStatus> = Lifecycle::new(
    "application",
    &[(
        ApplicationStatus::Pending,
        &[
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ],
    )],
);

// Disputed -> Disputed lets a second dispute be opened on an already disputed contract.
pub const CONTRACT_LIFECYCLE: Lifecycle<ContractStatus> = Lifecycle::new(
    "contract",
    &[
        (
            ContractStatus::Active,
            &[
                ContractStatus::Completed,
                ContractStatus::Cancelled,
                ContractStatus::Disputed,
            ],
        ),
        (
            ContractStatus::Disputed,
            &[
                ContractStatus::Disputed,
                ContractStatus::Completed,
                ContractStatus::Cancelled,
            ],
        ),
        (ContractStatus::Cancelled, &[ContractStatus::Disputed]),
    ],
);

pub const PAYMENT_LIFECYCLE: Lifecycle<PaymentStatus> = Lifecycle::new(
    "payment",
    &[
        (PaymentStatus::Pending, &[PaymentStatus::Escrow, PaymentStatus::Refunded]),
        (PaymentStatus::Escrow, &[PaymentStatus::Released, PaymentStatus::Refunded]),
    ],
);

pub const DISPUTE_LIFECYCLE: Lifecycle<DisputeStatus> = Lifecycle::new(
    "dispute",
    &[(DisputeStatus::Open, &[DisputeStatus::Resolved, DisputeStatus::Dismissed])],
);

pub const DOCUMENT_VERIFICATION: Lifecycle<VerificationStatus> = Lifecycle::new(
    "verification",
    &[(
        VerificationStatus::Pending,
        &[VerificationStatus::Verified, VerificationStatus::Rejected],
    )],
);

pub const SKILL_REVIEW: Lifecycle<VerificationStatus> = Lifecycle::new(
    "skill",
    &[
        (
            VerificationStatus::Pending,
            &[VerificationStatus::Verified, VerificationStatus::Rejected],
        ),
        (
            VerificationStatus::Verified,
            &[VerificationStatus::Rejected, VerificationStatus::Pending],
        ),
        (
            VerificationStatus::Rejected,
            &[VerificationStatus::Verified, VerificationStatus::Pending],
        ),
    ],
);

pub const PROFILE_VERIFICATION: Lifecycle<VerificationStatus> = Lifecycle::new(
    "worker_profile",
    &[
        (
            VerificationStatus::Pending,
            &[VerificationStatus::Verified, VerificationStatus::Rejected],
        ),
        (
            VerificationStatus::Rejected,
            &[VerificationStatus::Verified, VerificationStatus::Pending],
        ),
        (VerificationStatus::Verified, &[VerificationStatus::Rejected]),
    ],
);

pub const USER_STATUS: Lifecycle<UserStatus> = Lifecycle::new(
    "user",
    &[
        (UserStatus::Active, &[UserStatus::Suspended, UserStatus::Deactivated]),
        (UserStatus::Suspended, &[UserStatus::Active, UserStatus::Deactivated]),
        (UserStatus::Deactivated, &[UserStatus::Active]),
    ],
);
