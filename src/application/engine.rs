use crate::domain::campaign::{Campaign, RewardTier};
use crate::domain::money::Amount;
use crate::domain::pledge::Pledge;
use crate::domain::ports::{
    PaymentGateway, PaymentOutcome, SharedGateway, SharedStore, Store, StoreTransaction,
};
use crate::error::{PledgeError, StoreError};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Commit attempts before the engine gives up on a contended campaign.
/// Every conflict implies another writer committed, so a writer can only
/// lose as many races as it has live competitors.
const COMMIT_ATTEMPTS: u32 = 16;

const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// One pledge attempt, as handed over by the inbound boundary. The caller
/// identity is resolved there; the engine only sees an explicit `user_id`.
#[derive(Debug, Clone)]
pub struct PledgeRequest {
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub amount: Amount,
    pub reward_tier_id: Option<Uuid>,
    pub method: String,
}

/// A completed pledge call: the recorded pledge plus a status line for the
/// caller. A `Failed` pledge is still a *successful* call — the system did
/// its bookkeeping; the payment was declined.
#[derive(Debug, Clone)]
pub struct PledgeReceipt {
    pub pledge: Pledge,
    pub message: String,
}

/// The pledge transaction orchestrator.
///
/// Validates preconditions, drives the single payment call, and applies the
/// funding-state transition atomically through the store. Campaign and
/// reward-tier state is reloaded fresh for every attempt; nothing is cached
/// across requests.
pub struct PledgeEngine {
    store: SharedStore,
    gateway: SharedGateway,
    payment_timeout: Duration,
}

impl PledgeEngine {
    pub fn new(store: SharedStore, gateway: SharedGateway) -> Self {
        Self {
            store,
            gateway,
            payment_timeout: DEFAULT_PAYMENT_TIMEOUT,
        }
    }

    /// Caps how long the gateway may hold a charge before it is treated as
    /// declined.
    pub fn with_payment_timeout(mut self, timeout: Duration) -> Self {
        self.payment_timeout = timeout;
        self
    }

    /// Accepts a pledge against a campaign.
    ///
    /// Precondition failures return the matching [`PledgeError`] without
    /// opening a transaction. A declined charge is recorded and returned as
    /// a receipt. [`PledgeError::TransactionFailed`] means the bookkeeping
    /// itself failed and was rolled back; any captured charge is refunded.
    pub async fn create_pledge(&self, request: PledgeRequest) -> Result<PledgeReceipt, PledgeError> {
        let campaign = self
            .store
            .get_campaign(request.campaign_id)
            .await
            .map_err(storage_fault)?
            .ok_or(PledgeError::CampaignNotFound)?;
        if !campaign.is_active(Utc::now()) {
            return Err(PledgeError::CampaignNotActive);
        }

        match self
            .store
            .get_user(request.user_id)
            .await
            .map_err(storage_fault)?
        {
            Some(user) if !user.is_banned => {}
            _ => return Err(PledgeError::UserNotFound),
        }

        if let Some(tier_id) = request.reward_tier_id {
            let tier = self
                .store
                .get_reward_tier(tier_id)
                .await
                .map_err(storage_fault)?
                .filter(|tier| tier.campaign_id == request.campaign_id)
                .ok_or(PledgeError::InvalidRewardTier)?;
            if !tier.is_available() {
                return Err(PledgeError::RewardTierUnavailable);
            }
            if request.amount.value() < tier.minimum_amount {
                return Err(PledgeError::BelowMinimumPledge {
                    minimum: tier.minimum_amount,
                });
            }
        }

        // The one high-latency suspension point. No transaction is open and
        // no lock is held while the charge is in flight.
        let outcome = self.charge(&request).await;

        match self.apply(&request, &outcome).await {
            Ok(receipt) => Ok(receipt),
            Err(fault) => {
                tracing::error!(
                    campaign = %request.campaign_id,
                    error = %fault,
                    "pledge transaction rolled back"
                );
                self.refund_captured(&outcome).await;
                Err(PledgeError::TransactionFailed)
            }
        }
    }

    async fn charge(&self, request: &PledgeRequest) -> PaymentOutcome {
        let charge = self
            .gateway
            .charge(request.amount.value(), &request.method);
        match tokio::time::timeout(self.payment_timeout, charge).await {
            Ok(outcome) => {
                if !outcome.success {
                    tracing::warn!(
                        campaign = %request.campaign_id,
                        reason = %outcome.message,
                        "payment declined"
                    );
                }
                outcome
            }
            Err(_) => {
                tracing::warn!(
                    campaign = %request.campaign_id,
                    timeout = ?self.payment_timeout,
                    "payment gateway timed out"
                );
                PaymentOutcome::declined("Payment timed out")
            }
        }
    }

    /// Persists the pledge and, for a captured charge, the aggregate
    /// updates, retrying on version conflicts with freshly loaded state.
    async fn apply(
        &self,
        request: &PledgeRequest,
        outcome: &PaymentOutcome,
    ) -> Result<PledgeReceipt, StoreError> {
        for attempt in 0..COMMIT_ATTEMPTS {
            if attempt > 0 {
                tracing::warn!(
                    campaign = %request.campaign_id,
                    attempt,
                    "retrying pledge commit after version conflict"
                );
            }
            let now = Utc::now();

            let campaign = self
                .store
                .get_campaign(request.campaign_id)
                .await?
                .ok_or_else(|| StoreError::NotFound(request.campaign_id.to_string()))?;
            let tier = match request.reward_tier_id {
                Some(tier_id) => Some(
                    self.store
                        .get_reward_tier(tier_id)
                        .await?
                        .ok_or_else(|| StoreError::NotFound(tier_id.to_string()))?,
                ),
                None => None,
            };

            if outcome.success {
                // The aggregates may have moved while the charge was in
                // flight: the tier can fill up, the campaign can close.
                let tier_gone = tier.as_ref().is_some_and(|tier| !tier.is_available());
                if tier_gone || !campaign.is_active(now) {
                    return self.record_forfeited(request, outcome, now).await;
                }
            }

            let pledge = Pledge::resolved(
                request.user_id,
                request.campaign_id,
                request.reward_tier_id,
                request.amount.value(),
                outcome.transaction_id.clone(),
                outcome.success,
                now,
            );

            let mut tx = self.store.begin().await?;
            if let Err(fault) = stage(&mut tx, &pledge, campaign, tier, outcome, now).await {
                let _ = tx.rollback().await;
                return Err(fault);
            }
            match tx.commit().await {
                Ok(()) => {
                    if outcome.success {
                        tracing::info!(
                            campaign = %request.campaign_id,
                            pledge = %pledge.id,
                            amount = %pledge.amount,
                            "pledge confirmed"
                        );
                    }
                    let message = if outcome.success {
                        "Pledge created successfully".to_string()
                    } else {
                        format!("Pledge failed: {}", outcome.message)
                    };
                    return Ok(PledgeReceipt { pledge, message });
                }
                Err(StoreError::Conflict) => continue,
                Err(fault) => return Err(fault),
            }
        }
        Err(StoreError::Conflict)
    }

    /// A charge went through but the fresh state no longer admits it. The
    /// charge is returned and only the audit row is kept; aggregates stay
    /// untouched, so a backer cap holds even under concurrent confirmation.
    async fn record_forfeited(
        &self,
        request: &PledgeRequest,
        outcome: &PaymentOutcome,
        now: DateTime<Utc>,
    ) -> Result<PledgeReceipt, StoreError> {
        let pledge = Pledge::resolved(
            request.user_id,
            request.campaign_id,
            request.reward_tier_id,
            request.amount.value(),
            outcome.transaction_id.clone(),
            false,
            now,
        );

        let mut tx = self.store.begin().await?;
        if let Err(fault) = tx.add_pledge(pledge.clone()).await {
            let _ = tx.rollback().await;
            return Err(fault);
        }
        tx.commit().await?;

        self.refund_captured(outcome).await;
        tracing::warn!(
            campaign = %request.campaign_id,
            pledge = %pledge.id,
            "charge refunded, pledge no longer admissible"
        );
        Ok(PledgeReceipt {
            pledge,
            message: "Pledge failed: payment refunded, the selected reward is no longer available"
                .to_string(),
        })
    }

    async fn refund_captured(&self, outcome: &PaymentOutcome) {
        if !outcome.success {
            return;
        }
        if !self.gateway.refund(&outcome.transaction_id).await {
            tracing::error!(
                reference = %outcome.transaction_id,
                "refund failed, manual reconciliation required"
            );
        }
    }
}

/// Stages the pledge row plus, for a captured charge, the campaign and
/// reward-tier updates onto one transaction.
async fn stage(
    tx: &mut Box<dyn StoreTransaction>,
    pledge: &Pledge,
    mut campaign: Campaign,
    tier: Option<RewardTier>,
    outcome: &PaymentOutcome,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    tx.add_pledge(pledge.clone()).await?;
    if outcome.success {
        campaign.apply_confirmed_pledge(pledge.amount, now);
        tx.update_campaign(campaign).await?;
        if let Some(mut tier) = tier {
            tier.current_backers += 1;
            tx.update_reward_tier(tier).await?;
        }
    }
    Ok(())
}

fn storage_fault(fault: StoreError) -> PledgeError {
    tracing::error!(error = %fault, "storage fault before pledge transaction");
    PledgeError::TransactionFailed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::campaign::{CampaignStatus, RewardTier};
    use crate::domain::pledge::PledgeStatus;
    use crate::domain::user::User;
    use crate::infrastructure::gateway::StaticGateway;
    use crate::infrastructure::in_memory::InMemoryStore;
    use chrono::Duration as ChronoDuration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn campaign(goal: Decimal) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            title: "Solar Lamp".to_string(),
            description: String::new(),
            goal_amount: goal,
            current_amount: dec!(0),
            status: CampaignStatus::Active,
            start_date: now - ChronoDuration::days(1),
            end_date: now + ChronoDuration::days(30),
            owner_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    async fn seed(store: &InMemoryStore, campaign: &Campaign, user: &User) {
        let mut tx = store.begin().await.unwrap();
        tx.insert_campaign(campaign.clone()).await.unwrap();
        tx.insert_user(user.clone()).await.unwrap();
        tx.commit().await.unwrap();
    }

    fn request(campaign: &Campaign, user: &User, amount: Decimal) -> PledgeRequest {
        PledgeRequest {
            campaign_id: campaign.id,
            user_id: user.id,
            amount: Amount::new(amount).unwrap(),
            reward_tier_id: None,
            method: "credit_card".to_string(),
        }
    }

    #[tokio::test]
    async fn test_confirmed_pledge_updates_campaign() {
        let store = InMemoryStore::new();
        let c = campaign(dec!(1000));
        let user = User::new("Alice", "alice@example.com");
        seed(&store, &c, &user).await;

        let engine = PledgeEngine::new(Arc::new(store.clone()), Arc::new(StaticGateway::approving()));
        let receipt = engine
            .create_pledge(request(&c, &user, dec!(500)))
            .await
            .unwrap();

        assert_eq!(receipt.pledge.status, PledgeStatus::Confirmed);
        let stored = store.get_campaign(c.id).await.unwrap().unwrap();
        assert_eq!(stored.current_amount, dec!(500));
        assert_eq!(stored.status, CampaignStatus::Active);
    }

    #[tokio::test]
    async fn test_declined_payment_leaves_campaign_untouched() {
        let store = InMemoryStore::new();
        let c = campaign(dec!(1000));
        let user = User::new("Alice", "alice@example.com");
        seed(&store, &c, &user).await;

        let engine = PledgeEngine::new(Arc::new(store.clone()), Arc::new(StaticGateway::declining()));
        let receipt = engine
            .create_pledge(request(&c, &user, dec!(500)))
            .await
            .unwrap();

        assert_eq!(receipt.pledge.status, PledgeStatus::Failed);
        assert!(receipt.message.starts_with("Pledge failed:"));
        let stored = store.get_campaign(c.id).await.unwrap().unwrap();
        assert_eq!(stored.current_amount, dec!(0));
    }

    #[tokio::test]
    async fn test_tier_minimum_enforced_before_any_charge() {
        let store = InMemoryStore::new();
        let c = campaign(dec!(1000));
        let user = User::new("Alice", "alice@example.com");
        let tier = RewardTier {
            id: Uuid::new_v4(),
            campaign_id: c.id,
            title: "Early Bird".to_string(),
            minimum_amount: dec!(50),
            max_backers: None,
            current_backers: 0,
            is_active: true,
            version: 0,
        };
        seed(&store, &c, &user).await;
        let mut tx = store.begin().await.unwrap();
        tx.insert_reward_tier(tier.clone()).await.unwrap();
        tx.commit().await.unwrap();

        let gateway = Arc::new(StaticGateway::approving());
        let engine = PledgeEngine::new(Arc::new(store), Arc::clone(&gateway) as SharedGateway);

        let mut req = request(&c, &user, dec!(20));
        req.reward_tier_id = Some(tier.id);
        let err = engine.create_pledge(req).await.unwrap_err();

        assert_eq!(err, PledgeError::BelowMinimumPledge { minimum: dec!(50) });
        assert_eq!(gateway.charges(), 0);
    }
}
