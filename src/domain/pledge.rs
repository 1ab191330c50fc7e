use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum PledgeStatus {
    Pending,
    Confirmed,
    Failed,
    Cancelled,
}

/// A user's monetary commitment toward a campaign.
///
/// Created and resolved within a single transaction: `Confirmed` when the
/// charge went through, `Failed` otherwise. Failed pledges are kept as an
/// audit trail; they never touch campaign aggregates.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Pledge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub reward_tier_id: Option<Uuid>,
    pub amount: Decimal,
    pub status: PledgeStatus,
    /// Opaque reference handed back by the payment gateway; empty when the
    /// charge was declined before an id was issued.
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Pledge {
    /// Builds the record for a resolved payment attempt. `processed_at` is
    /// only set for confirmed pledges.
    pub fn resolved(
        user_id: Uuid,
        campaign_id: Uuid,
        reward_tier_id: Option<Uuid>,
        amount: Decimal,
        payment_reference: String,
        confirmed: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            campaign_id,
            reward_tier_id,
            amount,
            status: if confirmed {
                PledgeStatus::Confirmed
            } else {
                PledgeStatus::Failed
            },
            payment_reference,
            created_at: now,
            processed_at: confirmed.then_some(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_resolved_confirmed_sets_processed_at() {
        let now = Utc::now();
        let pledge = Pledge::resolved(
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            dec!(25),
            "txn-1".to_string(),
            true,
            now,
        );
        assert_eq!(pledge.status, PledgeStatus::Confirmed);
        assert_eq!(pledge.processed_at, Some(now));
    }

    #[test]
    fn test_resolved_failed_has_no_processed_at() {
        let pledge = Pledge::resolved(
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            dec!(25),
            String::new(),
            false,
            Utc::now(),
        );
        assert_eq!(pledge.status, PledgeStatus::Failed);
        assert_eq!(pledge.processed_at, None);
    }
}
