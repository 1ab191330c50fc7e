//! Campaign lifecycle: creation, moderation and end-of-campaign settlement.
//!
//! Every status change is a guarded transition; an edge the state machine
//! does not have yields [`CampaignError::InvalidStatus`]. The funding
//! transition Active -> Funded is owned by the pledge engine, not here.

use crate::domain::campaign::{Campaign, CampaignStatus, RewardTier};
use crate::domain::money::Amount;
use crate::domain::ports::{Store, StoreTransaction};
use crate::domain::user::{User, UserRole};
use crate::error::CampaignError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CampaignDraft {
    pub title: String,
    pub description: String,
    pub goal_amount: Amount,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reward_tiers: Vec<TierDraft>,
}

#[derive(Debug, Clone)]
pub struct TierDraft {
    pub title: String,
    pub minimum_amount: Amount,
    pub max_backers: Option<u32>,
}

/// Upgrades a plain user to campaign owner. Returns whether the role
/// changed so callers persist the user only on change; admins and existing
/// owners are left alone.
pub fn promote_to_owner(user: &mut User) -> bool {
    if user.role == UserRole::User {
        user.role = UserRole::CampaignOwner;
        return true;
    }
    false
}

/// Creates a campaign in `Draft` with its reward tiers, promoting the
/// owner's role when needed. The campaign starts with nothing raised.
pub async fn create_campaign(
    store: &dyn Store,
    owner_id: Uuid,
    draft: CampaignDraft,
) -> Result<Campaign, CampaignError> {
    if draft.title.trim().is_empty() {
        return Err(CampaignError::InvalidDraft("title must not be empty".into()));
    }
    if draft.end_date <= draft.start_date {
        return Err(CampaignError::InvalidDraft(
            "end date must be after start date".into(),
        ));
    }

    let mut owner = store
        .get_user(owner_id)
        .await?
        .ok_or(CampaignError::UserNotFound)?;

    let now = Utc::now();
    let campaign = Campaign {
        id: Uuid::new_v4(),
        title: draft.title,
        description: draft.description,
        goal_amount: draft.goal_amount.value(),
        current_amount: Decimal::ZERO,
        status: CampaignStatus::Draft,
        start_date: draft.start_date,
        end_date: draft.end_date,
        owner_id,
        created_at: now,
        updated_at: now,
        version: 0,
    };

    let mut tx = store.begin().await?;
    if promote_to_owner(&mut owner) {
        tx.update_user(owner).await?;
    }
    tx.insert_campaign(campaign.clone()).await?;
    for tier in draft.reward_tiers {
        tx.insert_reward_tier(RewardTier {
            id: Uuid::new_v4(),
            campaign_id: campaign.id,
            title: tier.title,
            minimum_amount: tier.minimum_amount.value(),
            max_backers: tier.max_backers,
            current_backers: 0,
            is_active: true,
            version: 0,
        })
        .await?;
    }
    tx.commit().await?;

    tracing::info!(campaign = %campaign.id, owner = %owner_id, "campaign created");
    Ok(campaign)
}

/// Draft -> UnderReview, queueing the campaign for moderation.
pub async fn submit_for_review(store: &dyn Store, id: Uuid) -> Result<Campaign, CampaignError> {
    transition(store, id, CampaignStatus::Draft, CampaignStatus::UnderReview).await
}

/// UnderReview -> Active; the campaign starts accepting pledges.
pub async fn approve_campaign(store: &dyn Store, id: Uuid) -> Result<Campaign, CampaignError> {
    transition(store, id, CampaignStatus::UnderReview, CampaignStatus::Active).await
}

/// UnderReview -> Cancelled with a moderation reason.
pub async fn reject_campaign(
    store: &dyn Store,
    id: Uuid,
    reason: &str,
) -> Result<Campaign, CampaignError> {
    let campaign = transition(
        store,
        id,
        CampaignStatus::UnderReview,
        CampaignStatus::Cancelled,
    )
    .await?;
    tracing::info!(campaign = %id, reason, "campaign rejected");
    Ok(campaign)
}

/// Settles an Active campaign whose end date has passed: Funded when the
/// goal was reached, Failed otherwise.
pub async fn finalize_expired(
    store: &dyn Store,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<Campaign, CampaignError> {
    let mut campaign = store
        .get_campaign(id)
        .await?
        .ok_or(CampaignError::NotFound)?;
    if campaign.status != CampaignStatus::Active {
        return Err(CampaignError::InvalidStatus {
            expected: CampaignStatus::Active,
            actual: campaign.status,
        });
    }
    if now <= campaign.end_date {
        return Err(CampaignError::NotExpired);
    }

    campaign.status = if campaign.is_funded() {
        CampaignStatus::Funded
    } else {
        CampaignStatus::Failed
    };
    campaign.updated_at = now;
    persist(store, &campaign).await?;

    tracing::info!(campaign = %id, status = %campaign.status, "campaign settled");
    Ok(campaign)
}

async fn transition(
    store: &dyn Store,
    id: Uuid,
    expected: CampaignStatus,
    next: CampaignStatus,
) -> Result<Campaign, CampaignError> {
    let mut campaign = store
        .get_campaign(id)
        .await?
        .ok_or(CampaignError::NotFound)?;
    if campaign.status != expected {
        return Err(CampaignError::InvalidStatus {
            expected,
            actual: campaign.status,
        });
    }

    campaign.status = next;
    campaign.updated_at = Utc::now();
    persist(store, &campaign).await?;

    tracing::info!(campaign = %id, status = %campaign.status, "campaign transitioned");
    Ok(campaign)
}

async fn persist(store: &dyn Store, campaign: &Campaign) -> Result<(), CampaignError> {
    let mut tx = store.begin().await?;
    tx.update_campaign(campaign.clone()).await?;
    tx.commit().await?;
    Ok(())
}
