use super::campaign::{Campaign, RewardTier};
use super::pledge::Pledge;
use super::user::User;
use crate::error::StoreError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

pub type SharedStore = Arc<dyn Store>;
pub type SharedGateway = Arc<dyn PaymentGateway>;

/// Read side of the persistence boundary.
///
/// Reads return the latest committed snapshot. The orchestrator reloads
/// aggregates at the start of every transaction instead of caching them
/// across requests.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_campaign(&self, id: Uuid) -> StoreResult<Option<Campaign>>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn get_reward_tier(&self, id: Uuid) -> StoreResult<Option<RewardTier>>;
    async fn list_campaigns(&self) -> StoreResult<Vec<Campaign>>;
    async fn list_pledges(&self, campaign_id: Uuid) -> StoreResult<Vec<Pledge>>;

    /// Opens a unit of work. Writes are staged on the returned transaction
    /// and become visible only after a successful commit.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// A staged unit of work against the store.
///
/// Updates carry the `version` the caller loaded; commit rejects the whole
/// batch with [`StoreError::Conflict`] when any updated entity changed
/// underneath it, applying nothing.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn add_pledge(&mut self, pledge: Pledge) -> StoreResult<()>;
    async fn insert_campaign(&mut self, campaign: Campaign) -> StoreResult<()>;
    async fn insert_reward_tier(&mut self, tier: RewardTier) -> StoreResult<()>;
    async fn insert_user(&mut self, user: User) -> StoreResult<()>;
    async fn update_campaign(&mut self, campaign: Campaign) -> StoreResult<()>;
    async fn update_reward_tier(&mut self, tier: RewardTier) -> StoreResult<()>;
    async fn update_user(&mut self, user: User) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Outcome of a charge attempt.
///
/// A decline is a normal outcome carried in `success`/`message`, not an
/// error; the port has no failure mode of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub success: bool,
    /// Processor reference for the charge; empty when nothing was captured.
    pub transaction_id: String,
    pub message: String,
}

impl PaymentOutcome {
    pub fn approved(transaction_id: String, message: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_id,
            message: message.into(),
        }
    }

    pub fn declined(message: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: String::new(),
            message: message.into(),
        }
    }
}

/// The payment processor seam. Swappable so a real acquirer, the shipped
/// simulator or a deterministic test fake all look the same to the engine.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submits one charge. The engine calls this exactly once per pledge
    /// attempt; retries are a caller or processor concern.
    async fn charge(&self, amount: Decimal, method: &str) -> PaymentOutcome;

    /// Returns a previously captured charge. Best effort; the caller logs
    /// a `false` result for reconciliation.
    async fn refund(&self, transaction_id: &str) -> bool;
}
