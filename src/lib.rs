//! Funding core of a crowdfunding platform: the pledge transaction
//! orchestrator, the campaign funding-state machine, and the persistence
//! and payment ports they drive. The HTTP/auth surface lives elsewhere and
//! calls in through [`application::engine::PledgeEngine`].

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
