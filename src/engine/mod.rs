//! Engine — the per-tick cycle orchestrator and the scheduler that
//! drives it.

pub mod cycle;
pub mod scheduler;

pub use cycle::{CycleOutcome, Orchestrator};
pub use scheduler::Scheduler;
