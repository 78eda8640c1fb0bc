//! Strategy engine — trend derivation, rule evaluation, and risk gating.

pub mod risk;
pub mod rules;
pub mod trend;

pub use risk::{Decision, Gatekeeper, VetoReason};
pub use rules::evaluate;
pub use trend::{compute_trend, TrendMap};
