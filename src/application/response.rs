//! Logical result envelope for the (excluded) HTTP layer: the controller
//! maps verbs and status codes onto this shape, never onto raw errors.

use super::engine::PledgeReceipt;
use crate::domain::pledge::{Pledge, PledgeStatus};
use crate::error::PledgeError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub errors: Vec<String>,
}

impl<T> ApiResponse<T> {
    pub fn success_result(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn error_result(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn error_result_with(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            errors,
        }
    }
}

/// Serializable view of a pledge.
#[derive(Debug, Serialize)]
pub struct PledgeView {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub reward_tier_id: Option<Uuid>,
    pub amount: Decimal,
    pub status: PledgeStatus,
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<Pledge> for PledgeView {
    fn from(pledge: Pledge) -> Self {
        Self {
            id: pledge.id,
            campaign_id: pledge.campaign_id,
            user_id: pledge.user_id,
            reward_tier_id: pledge.reward_tier_id,
            amount: pledge.amount,
            status: pledge.status,
            payment_reference: pledge.payment_reference,
            created_at: pledge.created_at,
            processed_at: pledge.processed_at,
        }
    }
}

/// Maps the engine result onto the envelope. Validation errors and the
/// generic transaction failure both land in `success = false`; a declined
/// payment stays a successful call carrying its failure message.
pub fn to_pledge_response(
    result: Result<PledgeReceipt, PledgeError>,
) -> ApiResponse<PledgeView> {
    match result {
        Ok(receipt) => ApiResponse::success_result(receipt.pledge.into(), receipt.message),
        Err(error) => ApiResponse::error_result(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validation_error_maps_to_failed_response() {
        let response = to_pledge_response(Err(PledgeError::CampaignNotFound));
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message, "Campaign not found");
    }

    #[test]
    fn test_below_minimum_message_names_the_minimum() {
        let response = to_pledge_response(Err(PledgeError::BelowMinimumPledge {
            minimum: dec!(50),
        }));
        assert!(response.message.contains("50"));
    }

    #[test]
    fn test_receipt_maps_to_success() {
        let pledge = Pledge::resolved(
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            dec!(25),
            "txn-9".to_string(),
            true,
            Utc::now(),
        );
        let response = to_pledge_response(Ok(PledgeReceipt {
            pledge,
            message: "Pledge created successfully".to_string(),
        }));
        assert!(response.success);
        assert_eq!(response.data.unwrap().status, PledgeStatus::Confirmed);
    }
}
