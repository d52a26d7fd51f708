// service/payment_service.rs
use std::sync::Arc;

use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    config::PlatformLimits,
    db::MarketStore,
    models::{
        labourmodel::Contract,
        lifecycle::PAYMENT_LIFECYCLE,
        notificationmodels::NotificationType,
        paymentmodels::{Payment, PaymentMethod, PaymentStatus},
    },
    service::{ensure_transition, error::ServiceError, found, notification_service::NotificationService},
    utils::validation,
};

#[derive(Debug, Clone)]
pub struct PaymentService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    limits: PlatformLimits,
}

impl PaymentService {
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

    pub async fn create_payment(
        &self,
        contract_id: Uuid,
        amount: BigDecimal,
        method: PaymentMethod,
    ) -> Result<Payment, ServiceError> {
        let contract = self.payable_contract(contract_id, &amount).await?;

        let payment = Payment::new(contract_id, amount, method, PaymentStatus::Pending);
        let payment = self.db_client.insert_payment(&payment).await?;
        tracing::info!(
            "Payment {} of {} created for contract {} via {}",
            payment.id,
            payment.amount,
            contract_id,
            method.to_str()
        );

        self.notification_service
            .dispatch(
                contract.client_id,
                &format!("Payment of R{} is pending", payment.amount),
                NotificationType::Payment,
            )
            .await;
        Ok(payment)
    }

    /// Card payment that goes straight into escrow.
    pub async fn create_escrow_payment(
        &self,
        contract_id: Uuid,
        amount: BigDecimal,
    ) -> Result<Payment, ServiceError> {
        let contract = self.payable_contract(contract_id, &amount).await?;

        let payment = Payment::new(contract_id, amount, PaymentMethod::Card, PaymentStatus::Escrow);
        let payment = self.db_client.insert_payment(&payment).await?;
        tracing::info!("Escrow payment {} created for contract {}", payment.id, contract_id);

        self.notification_service
            .dispatch(
                contract.client_id,
                &format!("R{} is now held in escrow", payment.amount),
                NotificationType::Payment,
            )
            .await;
        self.notification_service
            .dispatch(
                contract.worker_id,
                &format!("R{} for your contract is secured in escrow", payment.amount),
                NotificationType::Payment,
            )
            .await;
        Ok(payment)
    }

    pub async fn process_payment(&self, payment_id: Uuid) -> Result<Payment, ServiceError> {
        let payment = self.move_payment(payment_id, PaymentStatus::Escrow).await?;
        if let Some(contract) = self.contract_of(&payment).await {
            self.notification_service
                .dispatch(
                    contract.client_id,
                    &format!("Payment of R{} moved to escrow", payment.amount),
                    NotificationType::Payment,
                )
                .await;
        }
        Ok(payment)
    }

    pub async fn release_payment(&self, payment_id: Uuid) -> Result<Payment, ServiceError> {
        let payment = self.move_payment(payment_id, PaymentStatus::Released).await?;
        if let Some(contract) = self.contract_of(&payment).await {
            self.notification_service
                .dispatch(
                    contract.client_id,
                    &format!("Payment of R{} has been released to the worker", payment.amount),
                    NotificationType::Payment,
                )
                .await;
            self.notification_service
                .dispatch(
                    contract.worker_id,
                    &format!("R{} has been released to you", payment.amount),
                    NotificationType::Payment,
                )
                .await;
        }
        Ok(payment)
    }

    pub async fn refund_payment(&self, payment_id: Uuid, reason: &str) -> Result<Payment, ServiceError> {
        let payment = self.get_payment(payment_id).await?;
        match payment.status {
            PaymentStatus::Refunded => return Ok(payment),
            PaymentStatus::Released => {
                return Err(ServiceError::invalid_state(format!(
                    "Payment {} has been released and cannot be refunded",
                    payment_id
                )))
            }
            _ => {}
        }

        let payment = self.move_payment(payment_id, PaymentStatus::Refunded).await?;
        if let Some(contract) = self.contract_of(&payment).await {
            let mut message = format!("Payment of R{} has been refunded", payment.amount);
            if !reason.trim().is_empty() {
                message.push_str(&format!(". Reason: {}", reason.trim()));
            }
            self.notification_service
                .dispatch(contract.client_id, &message, NotificationType::Payment)
                .await;
        }
        Ok(payment)
    }

    pub async fn delete_payment(&self, payment_id: Uuid) -> Result<(), ServiceError> {
        let payment = self.get_payment(payment_id).await?;
        if payment.status == PaymentStatus::Released {
            return Err(ServiceError::invalid_state(format!(
                "Payment {} has been released and cannot be deleted",
                payment_id
            )));
        }
        self.db_client.delete_payment(payment_id).await?;
        tracing::info!("Payment {} deleted", payment_id);
        Ok(())
    }

    pub async fn get_payment(&self, payment_id: Uuid) -> Result<Payment, ServiceError> {
        found(self.db_client.get_payment(payment_id).await?, "payment", payment_id)
    }

    pub async fn payments_for_contract(&self, contract_id: Uuid) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.db_client.payments_for_contract(contract_id).await?)
    }

    pub async fn payments_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.db_client.payments_by_status(status).await?)
    }

    pub async fn payments_for_client(&self, client_id: Uuid) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.db_client.payments_for_client(client_id).await?)
    }

    pub async fn payments_for_worker(&self, worker_id: Uuid) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.db_client.payments_for_worker(worker_id).await?)
    }

    pub async fn total_amount_by_status(&self, status: PaymentStatus) -> Result<BigDecimal, ServiceError> {
        Ok(self.db_client.total_amount_by_status(status).await?)
    }

    async fn payable_contract(&self, contract_id: Uuid, amount: &BigDecimal) -> Result<Contract, ServiceError> {
        if !validation::is_valid_amount(amount, &self.limits) {
            return Err(ServiceError::validation(format!(
                "Payment amount must be positive and not exceed {}",
                self.limits.max_transaction_amount
            )));
        }
        found(self.db_client.get_contract(contract_id).await?, "contract", contract_id)
    }

    async fn move_payment(&self, payment_id: Uuid, next: PaymentStatus) -> Result<Payment, ServiceError> {
        let payment = self.get_payment(payment_id).await?;
        ensure_transition(&PAYMENT_LIFECYCLE, payment_id, payment.status, next)?;

        let payment = self
            .db_client
            .transition_payment(payment_id, payment.status, next)
            .await?;
        tracing::info!("Payment {} is now {}", payment_id, next.to_str());
        Ok(payment)
    }

    async fn contract_of(&self, payment: &Payment) -> Option<Contract> {
        match self.db_client.get_contract(payment.contract_id).await {
            Ok(contract) => contract,
            Err(e) => {
                tracing::warn!("Could not load contract for payment {}: {}", payment.id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{active_contract, app};

    #[tokio::test]
    async fn released_payment_cannot_be_refunded_or_deleted() {
        let (_, state) = app();
        let (_, _, _, contract) = active_contract(&state).await;
        let payment = state
            .payment_service
            .create_escrow_payment(contract.id, BigDecimal::from(4500))
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Escrow);

        let released = state.payment_service.release_payment(payment.id).await.unwrap();
        assert_eq!(released.status, PaymentStatus::Released);

        let err = state
            .payment_service
            .refund_payment(payment.id, "client unhappy")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = state.payment_service.delete_payment(payment.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(
            state.payment_service.get_payment(payment.id).await.unwrap().status,
            PaymentStatus::Released
        );
    }

    #[tokio::test]
    async fn pending_flows_through_escrow() {
        let (_, state) = app();
        let (client, _, _, contract) = active_contract(&state).await;
        let payment = state
            .payment_service
            .create_payment(contract.id, BigDecimal::from(1500), PaymentMethod::Eft)
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);

        let err = state.payment_service.release_payment(payment.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { entity: "payment", .. }));

        state.payment_service.process_payment(payment.id).await.unwrap();
        state.payment_service.release_payment(payment.id).await.unwrap();
        assert_eq!(
            state.payment_service.total_amount_by_status(PaymentStatus::Released).await.unwrap(),
            BigDecimal::from(1500)
        );
        // welcome, contract created, pending, escrow, released
        assert_eq!(state.notification_service.unread_count(client.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn refund_is_idempotent_and_delete_works_before_release() {
        let (_, state) = app();
        let (_, _, _, contract) = active_contract(&state).await;
        let payment = state
            .payment_service
            .create_payment(contract.id, BigDecimal::from(800), PaymentMethod::Cash)
            .await
            .unwrap();

        let refunded = state.payment_service.refund_payment(payment.id, "").await.unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);
        let again = state.payment_service.refund_payment(payment.id, "").await.unwrap();
        assert_eq!(again, refunded);

        state.payment_service.delete_payment(payment.id).await.unwrap();
        assert!(state.payment_service.payments_for_contract(contract.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn amount_must_be_within_cap() {
        let (_, state) = app();
        let (_, _, _, contract) = active_contract(&state).await;
        for amount in [BigDecimal::from(0), BigDecimal::from(1_000_001)] {
            let err = state
                .payment_service
                .create_payment(contract.id, amount, PaymentMethod::Card)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn payments_are_listed_per_party() {
        let (_, state) = app();
        let (client, worker, _, contract) = active_contract(&state).await;
        let (other_client, _, _, other) = active_contract(&state).await;
        let payments = &state.payment_service;

        let ours = payments
            .create_payment(contract.id, BigDecimal::from(1500), PaymentMethod::Eft)
            .await
            .unwrap();
        let theirs = payments.create_escrow_payment(other.id, BigDecimal::from(800)).await.unwrap();

        let ids = |found: Vec<Payment>| found.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(payments.payments_for_client(client.id).await.unwrap()), vec![ours.id]);
        assert_eq!(ids(payments.payments_for_worker(worker.id).await.unwrap()), vec![ours.id]);
        assert_eq!(ids(payments.payments_for_client(other_client.id).await.unwrap()), vec![theirs.id]);
        assert!(payments.payments_for_client(worker.id).await.unwrap().is_empty());
    }
}
