use crate::domain::campaign::CampaignStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the persistence port.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A staged update lost the optimistic-concurrency race; nothing from
    /// the batch was applied.
    #[error("version conflict on commit")]
    Conflict,
    #[error("entity not found: {0}")]
    NotFound(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Outcome of a rejected or failed pledge call.
///
/// The validation variants carry the message the caller sees verbatim.
/// `TransactionFailed` is deliberately opaque: the underlying cause is
/// logged, not exposed.
#[derive(Error, Debug, PartialEq)]
pub enum PledgeError {
    #[error("Campaign not found")]
    CampaignNotFound,
    #[error("Campaign is not active")]
    CampaignNotActive,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid reward tier")]
    InvalidRewardTier,
    #[error("Reward tier is not available")]
    RewardTierUnavailable,
    #[error("Minimum pledge amount for this reward tier is {minimum}")]
    BelowMinimumPledge { minimum: Decimal },
    #[error("Pledge amount must be positive")]
    InvalidAmount,
    #[error("An error occurred while processing the pledge")]
    TransactionFailed,
}

/// Errors from the campaign lifecycle operations.
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Campaign not found")]
    NotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("campaign is {actual:?}, expected {expected:?}")]
    InvalidStatus {
        expected: CampaignStatus,
        actual: CampaignStatus,
    },
    #[error("Campaign has not ended yet")]
    NotExpired,
    #[error("invalid campaign draft: {0}")]
    InvalidDraft(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
