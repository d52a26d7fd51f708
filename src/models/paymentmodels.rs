// models/paymentmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    MobileMoney,
    Eft,
    Cash,
}

impl PaymentMethod {
    pub fn to_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::Eft => "eft",
            PaymentMethod::Cash => "cash",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Escrow,
    Released,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Escrow,
        PaymentStatus::Released,
        PaymentStatus::Refunded,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Escrow => "escrow",
            PaymentStatus::Released => "released",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub date_processed: DateTime<Utc>,
}

impl Payment {
    pub fn new(contract_id: Uuid, amount: BigDecimal, method: PaymentMethod, status: PaymentStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            amount,
            method,
            status,
            date_processed: Utc::now(),
        }
    }

    pub fn with_status(&self, status: PaymentStatus) -> Self {
        Self {
            status,
            date_processed: Utc::now(),
            ..self.clone()
        }
    }
}
