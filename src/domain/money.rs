use crate::error::PledgeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A positive monetary amount.
///
/// Wrapper around `rust_decimal::Decimal` so pledge and goal amounts are
/// validated once at the boundary instead of at every use site.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PledgeError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PledgeError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PledgeError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Funding progress as a percentage of the goal.
///
/// Returns zero for a non-positive goal instead of dividing by it.
pub fn funding_percentage(goal: Decimal, current: Decimal) -> Decimal {
    if goal > Decimal::ZERO {
        current / goal * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}
