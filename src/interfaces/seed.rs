//! JSON seed files for the demo binary: users, campaigns and reward tiers
//! referenced by short handles, so pledge CSV rows stay readable.

use super::csv::pledge_reader::PledgeRow;
use crate::application::engine::PledgeRequest;
use crate::domain::campaign::{Campaign, CampaignStatus, RewardTier};
use crate::domain::money::Amount;
use crate::domain::ports::{Store, StoreTransaction};
use crate::domain::user::User;
use crate::error::StoreError;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("malformed seed file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown {kind} handle: {handle}")]
    UnknownHandle { kind: &'static str, handle: String },
    #[error("invalid {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub campaigns: Vec<SeedCampaign>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub handle: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedCampaign {
    pub handle: String,
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub goal: Decimal,
    /// Days until the campaign closes; campaigns are seeded Active.
    #[serde(default = "default_days_remaining")]
    pub days_remaining: i64,
    #[serde(default)]
    pub tiers: Vec<SeedTier>,
}

#[derive(Debug, Deserialize)]
pub struct SeedTier {
    /// Handle must be unique across the whole seed file.
    pub handle: String,
    #[serde(default)]
    pub title: Option<String>,
    pub minimum: Decimal,
    #[serde(default)]
    pub max_backers: Option<u32>,
}

fn default_days_remaining() -> i64 {
    30
}

/// Maps the seed handles onto the generated ids, for resolving pledge rows.
pub struct SeedIndex {
    users: HashMap<String, Uuid>,
    campaigns: HashMap<String, Uuid>,
    tiers: HashMap<String, Uuid>,
}

impl SeedIndex {
    pub fn campaign(&self, handle: &str) -> Option<Uuid> {
        self.campaigns.get(handle).copied()
    }

    /// Turns a CSV pledge row into an engine request.
    pub fn resolve(&self, row: &PledgeRow) -> Result<PledgeRequest, SeedError> {
        let campaign_id = self.lookup(&self.campaigns, "campaign", &row.campaign)?;
        let user_id = self.lookup(&self.users, "user", &row.user)?;
        let reward_tier_id = match &row.tier {
            Some(handle) => Some(self.lookup(&self.tiers, "tier", handle)?),
            None => None,
        };
        let amount = Amount::new(row.amount)
            .map_err(|_| SeedError::Invalid(format!("pledge amount {}", row.amount)))?;
        Ok(PledgeRequest {
            campaign_id,
            user_id,
            amount,
            reward_tier_id,
            method: "credit_card".to_string(),
        })
    }

    fn lookup(
        &self,
        table: &HashMap<String, Uuid>,
        kind: &'static str,
        handle: &str,
    ) -> Result<Uuid, SeedError> {
        table.get(handle).copied().ok_or_else(|| SeedError::UnknownHandle {
            kind,
            handle: handle.to_string(),
        })
    }
}

/// Parses a seed file and persists its entities in one transaction.
pub async fn load_seed(store: &dyn Store, source: impl Read) -> Result<SeedIndex, SeedError> {
    let seed: SeedFile = serde_json::from_reader(source)?;

    let mut index = SeedIndex {
        users: HashMap::new(),
        campaigns: HashMap::new(),
        tiers: HashMap::new(),
    };
    let mut tx = store.begin().await?;
    let now = Utc::now();

    for seed_user in seed.users {
        let user = User::new(seed_user.name, seed_user.email);
        index.users.insert(seed_user.handle, user.id);
        tx.insert_user(user).await?;
    }

    for seed_campaign in seed.campaigns {
        if seed_campaign.goal <= Decimal::ZERO {
            return Err(SeedError::Invalid(format!(
                "goal for campaign {}",
                seed_campaign.handle
            )));
        }
        let owner_id = *index
            .users
            .get(&seed_campaign.owner)
            .ok_or_else(|| SeedError::UnknownHandle {
                kind: "user",
                handle: seed_campaign.owner.clone(),
            })?;

        let campaign = Campaign {
            id: Uuid::new_v4(),
            title: seed_campaign.title,
            description: seed_campaign.description,
            goal_amount: seed_campaign.goal,
            current_amount: Decimal::ZERO,
            status: CampaignStatus::Active,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(seed_campaign.days_remaining),
            owner_id,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        for seed_tier in seed_campaign.tiers {
            if seed_tier.minimum <= Decimal::ZERO {
                return Err(SeedError::Invalid(format!("minimum for tier {}", seed_tier.handle)));
            }
            let tier = RewardTier {
                id: Uuid::new_v4(),
                campaign_id: campaign.id,
                title: seed_tier.title.unwrap_or_else(|| seed_tier.handle.clone()),
                minimum_amount: seed_tier.minimum,
                max_backers: seed_tier.max_backers,
                current_backers: 0,
                is_active: true,
                version: 0,
            };
            index.tiers.insert(seed_tier.handle, tier.id);
            tx.insert_reward_tier(tier).await?;
        }

        index.campaigns.insert(seed_campaign.handle, campaign.id);
        tx.insert_campaign(campaign).await?;
    }

    tx.commit().await?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;

    const SEED: &str = r#"{
        "users": [{"handle": "alice", "name": "Alice", "email": "alice@example.com"}],
        "campaigns": [{
            "handle": "lamp",
            "owner": "alice",
            "title": "Solar Lamp",
            "goal": "1000",
            "tiers": [{"handle": "early", "minimum": "50", "max_backers": 3}]
        }]
    }"#;

    #[tokio::test]
    async fn test_load_seed_persists_entities() {
        let store = InMemoryStore::new();
        let index = load_seed(&store, SEED.as_bytes()).await.unwrap();

        let campaign_id = index.campaign("lamp").unwrap();
        let campaign = store.get_campaign(campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.title, "Solar Lamp");
        assert_eq!(campaign.goal_amount, dec!(1000));
        assert!(campaign.is_active(Utc::now()));
    }

    #[tokio::test]
    async fn test_resolve_row_against_index() {
        let store = InMemoryStore::new();
        let index = load_seed(&store, SEED.as_bytes()).await.unwrap();

        let row = PledgeRow {
            campaign: "lamp".to_string(),
            user: "alice".to_string(),
            amount: dec!(75),
            tier: Some("early".to_string()),
        };
        let request = index.resolve(&row).unwrap();
        assert_eq!(request.campaign_id, index.campaign("lamp").unwrap());
        assert!(request.reward_tier_id.is_some());

        let unknown = PledgeRow {
            campaign: "boat".to_string(),
            user: "alice".to_string(),
            amount: dec!(75),
            tier: None,
        };
        assert!(matches!(
            index.resolve(&unknown),
            Err(SeedError::UnknownHandle { kind: "campaign", .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_owner_rejected() {
        let store = InMemoryStore::new();
        let seed = r#"{"campaigns": [{"handle": "x", "owner": "ghost", "title": "X", "goal": "10"}]}"#;
        assert!(matches!(
            load_seed(&store, seed.as_bytes()).await,
            Err(SeedError::UnknownHandle { kind: "user", .. })
        ));
    }
}
