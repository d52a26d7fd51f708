// service/dispute_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        labourmodel::{ContractStatus, Dispute, DisputeStatus},
        lifecycle::{CONTRACT_LIFECYCLE, DISPUTE_LIFECYCLE},
        notificationmodels::NotificationType,
        usermodel::Permission,
    },
    service::{
        contract_service::ContractService, ensure_transition, error::ServiceError, found,
        notification_service::NotificationService,
    },
    utils::validation,
};

#[derive(Debug, Clone)]
pub struct DisputeService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    contract_service: Arc<ContractService>,
}

impl DisputeService {
    pub fn new(
        db_client: Arc<dyn MarketStore>,
        notification_service: Arc<NotificationService>,
        contract_service: Arc<ContractService>,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            contract_service,
        }
    }

    /// Opens a dispute and moves the contract to disputed in one write, then
    /// tells the other party and every admin who resolves disputes.
    pub async fn open_dispute(
        &self,
        contract_id: Uuid,
        opened_by: Uuid,
        reason: &str,
    ) -> Result<Dispute, ServiceError> {
        let contract = self.contract_service.ensure_disputable(contract_id).await?;

        let mut report = validation::validate_dispute_reason(reason);
        report.check(
            contract.is_party(opened_by),
            "Only the contract's client or worker can open a dispute",
        );
        report.into_result().map_err(ServiceError::Validation)?;

        ensure_transition(&CONTRACT_LIFECYCLE, contract_id, contract.status, ContractStatus::Disputed)?;

        let dispute = Dispute::new(contract_id, opened_by, reason);
        let (dispute, contract) = self.db_client.open_dispute(&dispute, contract.status).await?;
        tracing::info!(
            "Dispute {} opened on contract {} by {}",
            dispute.id,
            contract_id,
            opened_by
        );

        if let Some(other) = contract.counterparty(opened_by) {
            self.notification_service
                .dispatch(
                    other,
                    &format!("A dispute has been opened on your contract: {}", dispute.reason),
                    NotificationType::System,
                )
                .await;
        }
        let admins = self
            .notification_service
            .notify_admins(
                Permission::ResolveDisputes,
                &format!("Dispute {} opened on contract {} needs review", dispute.id, contract_id),
            )
            .await;
        tracing::debug!("Dispute {} announced to {} admins", dispute.id, admins);

        Ok(dispute)
    }

    /// Closes the dispute as resolved. The contract keeps its disputed status
    /// until it is settled separately.
    pub async fn resolve_dispute(
        &self,
        dispute_id: Uuid,
        resolution_details: &str,
        resolved_by: Uuid,
    ) -> Result<Dispute, ServiceError> {
        if validation::is_blank(resolution_details) {
            return Err(ServiceError::validation("Resolution details are required"));
        }

        let dispute = self
            .close(dispute_id, DisputeStatus::Resolved, resolved_by, Some(resolution_details))
            .await?;

        if let Some(contract) = self.db_client.get_contract(dispute.contract_id).await? {
            for party in contract.parties() {
                self.notification_service
                    .dispatch(
                        party,
                        &format!("Your dispute has been resolved: {}", resolution_details.trim()),
                        NotificationType::System,
                    )
                    .await;
            }
        }
        Ok(dispute)
    }

    pub async fn dismiss_dispute(&self, dispute_id: Uuid, dismissed_by: Uuid) -> Result<Dispute, ServiceError> {
        let dispute = self
            .close(dispute_id, DisputeStatus::Dismissed, dismissed_by, None)
            .await?;

        self.notification_service
            .dispatch(
                dispute.opened_by,
                "Your dispute has been dismissed",
                NotificationType::System,
            )
            .await;
        Ok(dispute)
    }

    pub async fn get_dispute(&self, dispute_id: Uuid) -> Result<Dispute, ServiceError> {
        found(self.db_client.get_dispute(dispute_id).await?, "dispute", dispute_id)
    }

    pub async fn disputes_for_contract(&self, contract_id: Uuid) -> Result<Vec<Dispute>, ServiceError> {
        Ok(self.db_client.disputes_for_contract(contract_id).await?)
    }

    pub async fn open_disputes(&self) -> Result<Vec<Dispute>, ServiceError> {
        Ok(self.db_client.disputes_by_status(DisputeStatus::Open).await?)
    }

    pub async fn has_open_disputes(&self, contract_id: Uuid) -> Result<bool, ServiceError> {
        let disputes = self.disputes_for_contract(contract_id).await?;
        Ok(disputes.iter().any(|d| d.status == DisputeStatus::Open))
    }

    async fn close(
        &self,
        dispute_id: Uuid,
        next: DisputeStatus,
        closed_by: Uuid,
        resolution_details: Option<&str>,
    ) -> Result<Dispute, ServiceError> {
        let dispute = self.get_dispute(dispute_id).await?;
        ensure_transition(&DISPUTE_LIFECYCLE, dispute_id, dispute.status, next)?;

        let closed = dispute.closed(next, closed_by, resolution_details);
        let dispute = self.db_client.close_dispute(&closed).await?;
        tracing::info!("Dispute {} {} by {}", dispute_id, next.to_str(), closed_by);
        Ok(dispute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::UserExt,
        models::usermodel::Admin,
        service::test_support::{active_contract, app, completed_contract, worker, DISPUTE_REASON},
    };

    #[tokio::test]
    async fn outsiders_cannot_open_disputes() {
        let (_, state) = app();
        let (_, _, _, contract) = active_contract(&state).await;
        let outsider = worker(&state).await;

        let err = state
            .dispute_service
            .open_dispute(contract.id, outsider.id, DISPUTE_REASON)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(!state.dispute_service.has_open_disputes(contract.id).await.unwrap());
    }

    #[tokio::test]
    async fn completed_contracts_cannot_be_disputed() {
        let (_, state) = app();
        let (client, _, _, contract) = completed_contract(&state).await;
        let err = state
            .dispute_service
            .open_dispute(contract.id, client.id, DISPUTE_REASON)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn short_reason_is_rejected() {
        let (_, state) = app();
        let (client, _, _, contract) = active_contract(&state).await;
        let err = state
            .dispute_service
            .open_dispute(contract.id, client.id, "late")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn opening_disputes_the_contract_and_alerts_resolvers() {
        let (store, state) = app();
        let (client, worker, _, contract) = active_contract(&state).await;
        let resolver = Admin::new(Uuid::new_v4(), vec![Permission::ResolveDisputes], "created");
        store.insert_admin(&resolver).await.unwrap();

        let worker_unread = state.notification_service.unread_count(worker.id).await.unwrap();
        let dispute = state
            .dispute_service
            .open_dispute(contract.id, client.id, DISPUTE_REASON)
            .await
            .unwrap();
        assert_eq!(dispute.status, DisputeStatus::Open);
        assert_eq!(
            state.contract_service.get_contract(contract.id).await.unwrap().status,
            ContractStatus::Disputed
        );
        assert_eq!(
            state.notification_service.unread_count(worker.id).await.unwrap(),
            worker_unread + 1
        );
        assert_eq!(state.notification_service.unread_count(resolver.user_id).await.unwrap(), 1);

        // a disputed contract can take another dispute
        state
            .dispute_service
            .open_dispute(contract.id, worker.id, DISPUTE_REASON)
            .await
            .unwrap();
        assert_eq!(state.dispute_service.open_disputes().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn resolve_records_closer_and_leaves_contract_disputed() {
        let (_, state) = app();
        let (client, _, _, contract) = active_contract(&state).await;
        let dispute = state
            .dispute_service
            .open_dispute(contract.id, client.id, DISPUTE_REASON)
            .await
            .unwrap();
        let admin_id = Uuid::new_v4();

        let resolved = state
            .dispute_service
            .resolve_dispute(dispute.id, "Worker will finish by Friday", admin_id)
            .await
            .unwrap();
        assert_eq!(resolved.status, DisputeStatus::Resolved);
        assert_eq!(resolved.closed_by, Some(admin_id));
        assert!(resolved.date_closed.is_some());
        assert_eq!(resolved.resolution_details.as_deref(), Some("Worker will finish by Friday"));
        assert_eq!(
            state.contract_service.get_contract(contract.id).await.unwrap().status,
            ContractStatus::Disputed
        );

        let err = state
            .dispute_service
            .dismiss_dispute(dispute.id, admin_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { entity: "dispute", .. }));
        assert!(!state.dispute_service.has_open_disputes(contract.id).await.unwrap());
    }
}
