//! Site integrations.
//!
//! Defines the `Observer` and `Executor` traits the engine consumes.
//! The concrete page-navigation technology behind a real bookmaker
//! session is an implementation detail of these collaborators; the
//! in-tree implementation is the deterministic paper site used for
//! dry-run operation and tests.

pub mod paper;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use crate::types::{BetOutcome, MatchObservation, Selection};

/// Hard upper bound for any single collaborator call. An unresponsive
/// remote endpoint must never stall future ticks.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("missing credentials")]
    MissingCredentials,
    #[error("login rejected: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("page structure not understood: {0}")]
    Parse(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("placement rejected: {0}")]
    Rejected(String),
    #[error("insufficient balance ({balance} for stake {stake})")]
    InsufficientBalance { balance: Decimal, stake: Decimal },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Result of a placement attempt.
///
/// `outcome` is the settled result when the site can report one at
/// placement time (virtual rounds resolve within minutes); `None`
/// leaves the bet pending for later settlement.
#[derive(Debug, Clone)]
pub struct ExecReport {
    pub confirmed: bool,
    pub message: String,
    pub outcome: Option<BetOutcome>,
}

/// Read side of the site: session, fixture list, live balance.
///
/// Implementations must bound every call to [`CALL_TIMEOUT`] and return
/// a typed failure rather than hanging.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn login(&self) -> Result<(), LoginError>;
    async fn list_matches(&self) -> Result<Vec<MatchObservation>, ObserveError>;
    async fn current_balance(&self) -> Result<Decimal, ObserveError>;
}

/// Write side of the site.
///
/// Must re-validate balance before committing and is called at most
/// once per orchestrator decision — never retried within a cycle.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn place_bet(
        &self,
        match_id: &str,
        selection: Selection,
        stake: Decimal,
    ) -> Result<ExecReport, ExecError>;
}
