use crate::domain::campaign::{Campaign, RewardTier};
use crate::domain::pledge::Pledge;
use crate::domain::ports::{Store, StoreResult, StoreTransaction};
use crate::domain::user::User;
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    campaigns: HashMap<Uuid, Campaign>,
    users: HashMap<Uuid, User>,
    reward_tiers: HashMap<Uuid, RewardTier>,
    pledges: HashMap<Uuid, Pledge>,
}

/// A thread-safe in-memory store.
///
/// Transactions stage their writes and apply the whole batch under a single
/// write lock at commit, after validating the version of every staged
/// update. A conflicting batch is rejected wholesale; readers only ever see
/// committed state. The authoritative fake for tests and the default
/// backend of the demo binary.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_campaign(&self, id: Uuid) -> StoreResult<Option<Campaign>> {
        Ok(self.tables.read().await.campaigns.get(&id).cloned())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_reward_tier(&self, id: Uuid) -> StoreResult<Option<RewardTier>> {
        Ok(self.tables.read().await.reward_tiers.get(&id).cloned())
    }

    async fn list_campaigns(&self) -> StoreResult<Vec<Campaign>> {
        let tables = self.tables.read().await;
        let mut campaigns: Vec<Campaign> = tables.campaigns.values().cloned().collect();
        campaigns.sort_by_key(|campaign| campaign.created_at);
        Ok(campaigns)
    }

    async fn list_pledges(&self, campaign_id: Uuid) -> StoreResult<Vec<Pledge>> {
        let tables = self.tables.read().await;
        let mut pledges: Vec<Pledge> = tables
            .pledges
            .values()
            .filter(|pledge| pledge.campaign_id == campaign_id)
            .cloned()
            .collect();
        pledges.sort_by_key(|pledge| pledge.created_at);
        Ok(pledges)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            tables: Arc::clone(&self.tables),
            writes: Vec::new(),
        }))
    }
}

enum Write {
    AddPledge(Pledge),
    InsertCampaign(Campaign),
    InsertRewardTier(RewardTier),
    InsertUser(User),
    UpdateCampaign(Campaign),
    UpdateRewardTier(RewardTier),
    UpdateUser(User),
}

pub struct InMemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    writes: Vec<Write>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn add_pledge(&mut self, pledge: Pledge) -> StoreResult<()> {
        self.writes.push(Write::AddPledge(pledge));
        Ok(())
    }

    async fn insert_campaign(&mut self, campaign: Campaign) -> StoreResult<()> {
        self.writes.push(Write::InsertCampaign(campaign));
        Ok(())
    }

    async fn insert_reward_tier(&mut self, tier: RewardTier) -> StoreResult<()> {
        self.writes.push(Write::InsertRewardTier(tier));
        Ok(())
    }

    async fn insert_user(&mut self, user: User) -> StoreResult<()> {
        self.writes.push(Write::InsertUser(user));
        Ok(())
    }

    async fn update_campaign(&mut self, campaign: Campaign) -> StoreResult<()> {
        self.writes.push(Write::UpdateCampaign(campaign));
        Ok(())
    }

    async fn update_reward_tier(&mut self, tier: RewardTier) -> StoreResult<()> {
        self.writes.push(Write::UpdateRewardTier(tier));
        Ok(())
    }

    async fn update_user(&mut self, user: User) -> StoreResult<()> {
        self.writes.push(Write::UpdateUser(user));
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        let writes = std::mem::take(&mut self.writes);
        let mut tables = self.tables.write().await;

        // Validate the whole batch before touching anything.
        for write in &writes {
            match write {
                Write::UpdateCampaign(campaign) => {
                    let current = tables
                        .campaigns
                        .get(&campaign.id)
                        .ok_or_else(|| StoreError::NotFound(campaign.id.to_string()))?;
                    if current.version != campaign.version {
                        return Err(StoreError::Conflict);
                    }
                }
                Write::UpdateRewardTier(tier) => {
                    let current = tables
                        .reward_tiers
                        .get(&tier.id)
                        .ok_or_else(|| StoreError::NotFound(tier.id.to_string()))?;
                    if current.version != tier.version {
                        return Err(StoreError::Conflict);
                    }
                }
                _ => {}
            }
        }

        for write in writes {
            match write {
                Write::AddPledge(pledge) => {
                    tables.pledges.insert(pledge.id, pledge);
                }
                Write::InsertCampaign(campaign) => {
                    tables.campaigns.insert(campaign.id, campaign);
                }
                Write::InsertRewardTier(tier) => {
                    tables.reward_tiers.insert(tier.id, tier);
                }
                Write::InsertUser(user) => {
                    tables.users.insert(user.id, user);
                }
                Write::UpdateCampaign(mut campaign) => {
                    campaign.version += 1;
                    tables.campaigns.insert(campaign.id, campaign);
                }
                Write::UpdateRewardTier(mut tier) => {
                    tier.version += 1;
                    tables.reward_tiers.insert(tier.id, tier);
                }
                Write::UpdateUser(user) => {
                    tables.users.insert(user.id, user);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        // Staged writes are simply dropped.
        Ok(())
    }
}
