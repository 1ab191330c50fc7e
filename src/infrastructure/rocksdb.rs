use crate::domain::campaign::{Campaign, RewardTier};
use crate::domain::pledge::Pledge;
use crate::domain::ports::{Store, StoreResult, StoreTransaction};
use crate::domain::user::User;
use crate::error::StoreError;
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const CF_CAMPAIGNS: &str = "campaigns";
pub const CF_USERS: &str = "users";
pub const CF_REWARD_TIERS: &str = "reward_tiers";
pub const CF_PLEDGES: &str = "pledges";

/// A persistent store on RocksDB, one column family per entity with
/// JSON-encoded values.
///
/// RocksDB gives batch atomicity but no interactive transactions, so the
/// version checks run under `commit_lock` and the batch is written while
/// it is still held. `Clone` shares the underlying handle.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a database at `path`, ensuring all column families
    /// exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs: Vec<ColumnFamilyDescriptor> = [CF_CAMPAIGNS, CF_USERS, CF_REWARD_TIERS, CF_PLEDGES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, cfs).map_err(backend)?;
        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("column family {name} not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, id: Uuid) -> Result<Option<T>, StoreError> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, id.as_bytes()).map_err(backend)? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(serialization)?,
            )),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>, StoreError> {
        let cf = self.cf(cf_name)?;
        let mut entities = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(backend)?;
            entities.push(serde_json::from_slice(&value).map_err(serialization)?);
        }
        Ok(entities)
    }
}

#[async_trait]
impl Store for RocksDbStore {
    async fn get_campaign(&self, id: Uuid) -> StoreResult<Option<Campaign>> {
        self.read(CF_CAMPAIGNS, id)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.read(CF_USERS, id)
    }

    async fn get_reward_tier(&self, id: Uuid) -> StoreResult<Option<RewardTier>> {
        self.read(CF_REWARD_TIERS, id)
    }

    async fn list_campaigns(&self) -> StoreResult<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self.scan(CF_CAMPAIGNS)?;
        campaigns.sort_by_key(|campaign| campaign.created_at);
        Ok(campaigns)
    }

    async fn list_pledges(&self, campaign_id: Uuid) -> StoreResult<Vec<Pledge>> {
        let mut pledges: Vec<Pledge> = self.scan(CF_PLEDGES)?;
        pledges.retain(|pledge| pledge.campaign_id == campaign_id);
        pledges.sort_by_key(|pledge| pledge.created_at);
        Ok(pledges)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(RocksDbTransaction {
            store: self.clone(),
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

pub struct RocksDbTransaction {
    store: RocksDbStore,
    writes: Vec<Write>,
}

fn put<T: Serialize>(
    batch: &mut WriteBatch,
    cf: &ColumnFamily,
    id: Uuid,
    entity: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_vec(entity).map_err(serialization)?;
    batch.put_cf(cf, id.as_bytes(), value);
    Ok(())
}

#[async_trait]
impl StoreTransaction for RocksDbTransaction {
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
        let _guard = self.store.commit_lock.lock().await;

        for write in &writes {
            match write {
                Write::UpdateCampaign(campaign) => {
                    let current: Campaign = self
                        .store
                        .read(CF_CAMPAIGNS, campaign.id)?
                        .ok_or_else(|| StoreError::NotFound(campaign.id.to_string()))?;
                    if current.version != campaign.version {
                        return Err(StoreError::Conflict);
                    }
                }
                Write::UpdateRewardTier(tier) => {
                    let current: RewardTier = self
                        .store
                        .read(CF_REWARD_TIERS, tier.id)?
                        .ok_or_else(|| StoreError::NotFound(tier.id.to_string()))?;
                    if current.version != tier.version {
                        return Err(StoreError::Conflict);
                    }
                }
                _ => {}
            }
        }

        let mut batch = WriteBatch::default();
        for write in writes {
            match write {
                Write::AddPledge(pledge) => {
                    put(&mut batch, self.store.cf(CF_PLEDGES)?, pledge.id, &pledge)?;
                }
                Write::InsertCampaign(campaign) => {
                    put(
                        &mut batch,
                        self.store.cf(CF_CAMPAIGNS)?,
                        campaign.id,
                        &campaign,
                    )?;
                }
                Write::InsertRewardTier(tier) => {
                    put(&mut batch, self.store.cf(CF_REWARD_TIERS)?, tier.id, &tier)?;
                }
                Write::InsertUser(user) => {
                    put(&mut batch, self.store.cf(CF_USERS)?, user.id, &user)?;
                }
                Write::UpdateCampaign(mut campaign) => {
                    campaign.version += 1;
                    put(
                        &mut batch,
                        self.store.cf(CF_CAMPAIGNS)?,
                        campaign.id,
                        &campaign,
                    )?;
                }
                Write::UpdateRewardTier(mut tier) => {
                    tier.version += 1;
                    put(&mut batch, self.store.cf(CF_REWARD_TIERS)?, tier.id, &tier)?;
                }
                Write::UpdateUser(user) => {
                    put(&mut batch, self.store.cf(CF_USERS)?, user.id, &user)?;
                }
            }
        }

        self.store.db.write(batch).map_err(backend)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

fn backend(error: rocksdb::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn serialization(error: serde_json::Error) -> StoreError {
    StoreError::Serialization(error.to_string())
}
