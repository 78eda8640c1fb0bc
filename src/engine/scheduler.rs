//! Fixed-interval scheduler.
//!
//! Drives the orchestrator on a steady cadence: one tick at startup,
//! then one every `interval`. Ticks are fire-and-forget — a tick that
//! lands while a cycle is still running is dropped by the orchestrator
//! (`CycleOutcome::Busy`), never queued, so slow site calls can not
//! build a backlog of stacked cycles.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::engine::cycle::{CycleOutcome, Orchestrator};

pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run until `shutdown` resolves. The first cycle starts
    /// immediately; subsequent ticks fire every `interval`.
    pub async fn run(&self, orchestrator: Arc<Orchestrator>, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval = ?self.interval, "Scheduler running");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = orchestrator.run_cycle().await;
                    log_outcome(&outcome, orchestrator.cycles_run());
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received — scheduler stopping");
                    break;
                }
            }
        }
    }
}

fn log_outcome(outcome: &CycleOutcome, cycle: u64) {
    match outcome {
        CycleOutcome::Placed { .. } => info!(cycle, outcome = %outcome, "Cycle complete"),
        _ => info!(cycle, outcome = %outcome, "Cycle complete (no placement)"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
