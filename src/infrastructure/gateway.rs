use crate::domain::ports::{PaymentGateway, PaymentOutcome};
use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

const DECLINE_MESSAGE: &str = "Payment failed - insufficient funds";
const APPROVE_MESSAGE: &str = "Payment processed successfully";

/// Stand-in payment processor with a configurable approval rate and
/// optional simulated latency. Refunds always succeed.
pub struct SimulatedGateway {
    success_rate: f64,
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, _amount: Decimal, _method: &str) -> PaymentOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let approved = rand::thread_rng().gen_bool(self.success_rate);
        if approved {
            PaymentOutcome::approved(Uuid::new_v4().to_string(), APPROVE_MESSAGE)
        } else {
            PaymentOutcome::declined(DECLINE_MESSAGE)
        }
    }

    async fn refund(&self, _transaction_id: &str) -> bool {
        true
    }
}

/// Deterministic gateway: approves or declines everything and counts the
/// calls it sees. The substitute fake for tests and scripted runs.
#[derive(Default)]
pub struct StaticGateway {
    decline: bool,
    charges: AtomicUsize,
    refunds: AtomicUsize,
}

impl StaticGateway {
    pub fn approving() -> Self {
        Self::default()
    }

    pub fn declining() -> Self {
        Self {
            decline: true,
            ..Self::default()
        }
    }

    pub fn charges(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }

    pub fn refunds(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for StaticGateway {
    async fn charge(&self, _amount: Decimal, _method: &str) -> PaymentOutcome {
        self.charges.fetch_add(1, Ordering::SeqCst);
        if self.decline {
            PaymentOutcome::declined(DECLINE_MESSAGE)
        } else {
            PaymentOutcome::approved(Uuid::new_v4().to_string(), APPROVE_MESSAGE)
        }
    }

    async fn refund(&self, _transaction_id: &str) -> bool {
        self.refunds.fetch_add(1, Ordering::SeqCst);
        true
    }
}
