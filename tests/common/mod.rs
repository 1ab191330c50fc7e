#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fundflow::domain::campaign::{Campaign, CampaignStatus, RewardTier};
use fundflow::domain::money::Amount;
use fundflow::domain::pledge::Pledge;
use fundflow::domain::ports::{Store, StoreResult, StoreTransaction};
use fundflow::domain::user::User;
use fundflow::application::engine::PledgeRequest;
use fundflow::error::StoreError;
use fundflow::infrastructure::in_memory::InMemoryStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

pub fn campaign_with_status(goal: Decimal, status: CampaignStatus) -> Campaign {
    let now = Utc::now();
    Campaign {
        id: Uuid::new_v4(),
        title: "Solar Lamp".to_string(),
        description: "Off-grid lighting".to_string(),
        goal_amount: goal,
        current_amount: Decimal::ZERO,
        status,
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(30),
        owner_id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        version: 0,
    }
}

pub fn active_campaign(goal: Decimal) -> Campaign {
    campaign_with_status(goal, CampaignStatus::Active)
}

pub fn backer() -> User {
    User::new("Alice", "alice@example.com")
}

pub fn tier(campaign_id: Uuid, minimum: Decimal, max_backers: Option<u32>) -> RewardTier {
    RewardTier {
        id: Uuid::new_v4(),
        campaign_id,
        title: "Early Bird".to_string(),
        minimum_amount: minimum,
        max_backers,
        current_backers: 0,
        is_active: true,
        version: 0,
    }
}

pub fn request(campaign_id: Uuid, user_id: Uuid, amount: Decimal) -> PledgeRequest {
    PledgeRequest {
        campaign_id,
        user_id,
        amount: Amount::new(amount).unwrap(),
        reward_tier_id: None,
        method: "credit_card".to_string(),
    }
}

pub async fn seed(
    store: &dyn Store,
    campaigns: &[Campaign],
    users: &[User],
    tiers: &[RewardTier],
) {
    let mut tx = store.begin().await.unwrap();
    for campaign in campaigns {
        tx.insert_campaign(campaign.clone()).await.unwrap();
    }
    for user in users {
        tx.insert_user(user.clone()).await.unwrap();
    }
    for tier in tiers {
        tx.insert_reward_tier(tier.clone()).await.unwrap();
    }
    tx.commit().await.unwrap();
}

/// Store wrapper that injects faults into the transactional write path,
/// for exercising the rollback behavior of the engine.
#[derive(Clone)]
pub struct FaultyStore {
    pub inner: InMemoryStore,
    pub fail_on_commit: Arc<AtomicBool>,
    pub fail_on_campaign_update: Arc<AtomicBool>,
}

impl FaultyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            fail_on_commit: Arc::new(AtomicBool::new(false)),
            fail_on_campaign_update: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn get_campaign(&self, id: Uuid) -> StoreResult<Option<Campaign>> {
        self.inner.get_campaign(id).await
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn get_reward_tier(&self, id: Uuid) -> StoreResult<Option<RewardTier>> {
        self.inner.get_reward_tier(id).await
    }

    async fn list_campaigns(&self) -> StoreResult<Vec<Campaign>> {
        self.inner.list_campaigns().await
    }

    async fn list_pledges(&self, campaign_id: Uuid) -> StoreResult<Vec<Pledge>> {
        self.inner.list_pledges(campaign_id).await
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(FaultyTransaction {
            inner: self.inner.begin().await?,
            fail_on_commit: Arc::clone(&self.fail_on_commit),
            fail_on_campaign_update: Arc::clone(&self.fail_on_campaign_update),
        }))
    }
}

pub struct FaultyTransaction {
    inner: Box<dyn StoreTransaction>,
    fail_on_commit: Arc<AtomicBool>,
    fail_on_campaign_update: Arc<AtomicBool>,
}

#[async_trait]
impl StoreTransaction for FaultyTransaction {
    async fn add_pledge(&mut self, pledge: Pledge) -> StoreResult<()> {
        self.inner.add_pledge(pledge).await
    }

    async fn insert_campaign(&mut self, campaign: Campaign) -> StoreResult<()> {
        self.inner.insert_campaign(campaign).await
    }

    async fn insert_reward_tier(&mut self, tier: RewardTier) -> StoreResult<()> {
        self.inner.insert_reward_tier(tier).await
    }

    async fn insert_user(&mut self, user: User) -> StoreResult<()> {
        self.inner.insert_user(user).await
    }

    async fn update_campaign(&mut self, campaign: Campaign) -> StoreResult<()> {
        if self.fail_on_campaign_update.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected storage fault".to_string()));
        }
        self.inner.update_campaign(campaign).await
    }

    async fn update_reward_tier(&mut self, tier: RewardTier) -> StoreResult<()> {
        self.inner.update_reward_tier(tier).await
    }

    async fn update_user(&mut self, user: User) -> StoreResult<()> {
        self.inner.update_user(user).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        if self.fail_on_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit fault".to_string()));
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.inner.rollback().await
    }
}
