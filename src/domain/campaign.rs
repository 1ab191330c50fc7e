use super::money::funding_percentage;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum CampaignStatus {
    Draft,
    UnderReview,
    Active,
    Funded,
    Failed,
    Cancelled,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::UnderReview => "under_review",
            CampaignStatus::Active => "active",
            CampaignStatus::Funded => "funded",
            CampaignStatus::Failed => "failed",
            CampaignStatus::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// A fundraising campaign aggregate.
///
/// `current_amount` only grows, and only through confirmed pledges.
/// `version` is bumped by the store on every committed update and drives
/// optimistic concurrency control; callers never set it themselves.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Campaign {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub goal_amount: Decimal,
    pub current_amount: Decimal,
    pub status: CampaignStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Campaign {
    /// Raised amount as a percentage of the goal; zero for a zero goal.
    pub fn funding_percentage(&self) -> Decimal {
        funding_percentage(self.goal_amount, self.current_amount)
    }

    /// True while the campaign accepts pledges. The end date itself is
    /// still inside the window.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active && now <= self.end_date
    }

    pub fn is_funded(&self) -> bool {
        self.current_amount >= self.goal_amount
    }

    /// Applies a confirmed pledge amount, including the Active -> Funded
    /// transition once the goal is reached.
    pub fn apply_confirmed_pledge(&mut self, amount: Decimal, now: DateTime<Utc>) {
        self.current_amount += amount;
        self.updated_at = now;
        if self.is_funded() && self.status == CampaignStatus::Active {
            self.status = CampaignStatus::Funded;
        }
    }
}

/// A campaign-defined perk with a minimum pledge amount and an optional
/// backer cap.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct RewardTier {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub title: String,
    pub minimum_amount: Decimal,
    pub max_backers: Option<u32>,
    pub current_backers: u32,
    pub is_active: bool,
    pub version: u64,
}

impl RewardTier {
    pub fn is_available(&self) -> bool {
        self.is_active && self.max_backers.is_none_or(|cap| self.current_backers < cap)
    }
}
