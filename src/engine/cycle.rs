//! Cycle orchestrator.
//!
//! One call to [`Orchestrator::run_cycle`] is one pass of the
//! scan → evaluate → act state machine:
//!
//! reset daily → limit check → login → scrape → record history →
//! evaluate → select first → authorize → execute → update state →
//! notify.
//!
//! Every collaborator failure is caught here and converted into a
//! [`CycleOutcome`]; nothing escapes to terminate the scheduler. State
//! is persisted immediately after each committing step (daily reset,
//! history update, successful placement) so the process can die between
//! cycles without leaving partial bet state.

use chrono::Utc;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::notify::{send_swallowing, Notifier};
use crate::site::{Executor, Observer};
use crate::storage::StateStore;
use crate::strategy::{evaluate, Decision, Gatekeeper};
use crate::types::{BetOutcome, BetRecord, BotState, Candidate};

/// Shared view of the persisted state, read by the HTTP server.
pub type SharedState = Arc<RwLock<BotState>>;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Terminal state of one cycle. All of these are normal, logged
/// results — only `Placed` mutates the bet ledger.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// A previous cycle is still in flight; this tick was dropped.
    Busy,
    /// Daily bet cap already reached — no collaborator contact at all.
    LimitExceeded,
    LoginFailed(String),
    ScrapeFailed(String),
    /// Balance read (or similar observation) failed mid-cycle.
    ObserveFailed(String),
    /// No rule produced a candidate.
    Idle,
    /// The gatekeeper refused the first candidate.
    Vetoed(String),
    ExecFailed(String),
    Placed {
        candidate: Candidate,
        stake: Decimal,
        outcome: Option<BetOutcome>,
        message: String,
    },
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Busy => write!(f, "busy (tick dropped)"),
            CycleOutcome::LimitExceeded => write!(f, "daily limit reached"),
            CycleOutcome::LoginFailed(e) => write!(f, "login failed: {e}"),
            CycleOutcome::ScrapeFailed(e) => write!(f, "scrape failed: {e}"),
            CycleOutcome::ObserveFailed(e) => write!(f, "observation failed: {e}"),
            CycleOutcome::Idle => write!(f, "no candidates"),
            CycleOutcome::Vetoed(reason) => write!(f, "vetoed: {reason}"),
            CycleOutcome::ExecFailed(e) => write!(f, "execution failed: {e}"),
            CycleOutcome::Placed { candidate, stake, outcome, .. } => write!(
                f,
                "placed {} stake {} ({})",
                candidate,
                stake,
                outcome.map(|o| o.to_string()).unwrap_or_else(|| "pending".into()),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    observer: Box<dyn Observer>,
    executor: Box<dyn Executor>,
    notifier: Box<dyn Notifier>,
    gatekeeper: Gatekeeper,
    store: StateStore,
    state: SharedState,
    /// Single-slot in-flight guard: a tick that arrives while a cycle
    /// holds this lock is dropped, not queued.
    in_flight: Mutex<()>,
    cycles_run: AtomicU64,
}

impl Orchestrator {
    pub fn new(
        observer: Box<dyn Observer>,
        executor: Box<dyn Executor>,
        notifier: Box<dyn Notifier>,
        gatekeeper: Gatekeeper,
        store: StateStore,
    ) -> Self {
        let state = Arc::new(RwLock::new(store.load()));
        Self {
            observer,
            executor,
            notifier,
            gatekeeper,
            store,
            state,
            in_flight: Mutex::new(()),
            cycles_run: AtomicU64::new(0),
        }
    }

    /// Handle for the HTTP server's read endpoint.
    pub fn shared_state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run.load(Ordering::Relaxed)
    }

    /// Run one full cycle. Never panics, never returns an error — every
    /// failure mode is a [`CycleOutcome`].
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Cycle still in flight — dropping this tick");
            return CycleOutcome::Busy;
        };
        let cycle = self.cycles_run.fetch_add(1, Ordering::Relaxed) + 1;
        info!(cycle, "Starting cycle");

        // -- RESET_DAILY ---------------------------------------------------
        let today = Utc::now().date_naive();
        {
            let mut state = self.state.write().await;
            if state.reset_daily_if_stale(today) {
                info!(date = %today, "Daily counters reset");
                self.store.save(&state);
            }
        }

        // -- LIMIT_CHECK (cost-saving short-circuit, no site contact) ------
        {
            let state = self.state.read().await;
            if state.daily.bets_placed >= self.gatekeeper.limits().max_bets_per_day {
                info!(placed = state.daily.bets_placed, "Daily bet limit reached");
                return CycleOutcome::LimitExceeded;
            }
        }

        // -- LOGIN_IF_NEEDED ----------------------------------------------
        if let Err(e) = self.observer.login().await {
            warn!(error = %e, "Login failed");
            return CycleOutcome::LoginFailed(e.to_string());
        }

        // -- OBSERVE / SCRAPE ----------------------------------------------
        let matches = match self.observer.list_matches().await {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "Scrape failed");
                return CycleOutcome::ScrapeFailed(e.to_string());
            }
        };
        debug!(count = matches.len(), "Matches observed");

        // -- RECORD_HISTORY ------------------------------------------------
        {
            let mut state = self.state.write().await;
            state.record_history(&matches);
            self.store.save(&state);
        }

        // -- EVALUATE / SELECT_FIRST ---------------------------------------
        let candidates = {
            let state = self.state.read().await;
            evaluate(&state, &matches)
        };
        info!(candidates = candidates.len(), "Evaluation complete");

        // Only the first candidate is acted on: at most one wager per
        // tick, however many rules fired.
        let Some(candidate) = candidates.into_iter().next() else {
            return CycleOutcome::Idle;
        };
        info!(candidate = %candidate, "Candidate selected");
        send_swallowing(
            self.notifier.as_ref(),
            &format!(
                "🎯 Candidate: {} vs {} ({}) — {}",
                candidate.observation.home,
                candidate.observation.away,
                candidate.selection,
                candidate.reason,
            ),
        )
        .await;

        // -- AUTHORIZE -----------------------------------------------------
        let balance = match self.observer.current_balance().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Balance read failed");
                return CycleOutcome::ObserveFailed(e.to_string());
            }
        };

        let stake = {
            let state = self.state.read().await;
            match self.gatekeeper.authorize(&state.daily, &candidate, balance) {
                Decision::Allow { stake } => stake,
                Decision::Deny(reason) => {
                    info!(reason = %reason, "Candidate vetoed");
                    send_swallowing(self.notifier.as_ref(), &format!("⛔ Vetoed: {reason}")).await;
                    return CycleOutcome::Vetoed(reason.to_string());
                }
            }
        };

        // -- EXECUTE (at most once per decision, never retried) ------------
        let match_id = candidate.observation.match_id();
        let report = match self
            .executor
            .place_bet(&match_id, candidate.selection, stake)
            .await
        {
            Ok(report) if report.confirmed => report,
            Ok(report) => {
                warn!(message = %report.message, "Placement not confirmed");
                send_swallowing(self.notifier.as_ref(), &format!("❌ Failed: {}", report.message))
                    .await;
                return CycleOutcome::ExecFailed(report.message);
            }
            Err(e) => {
                warn!(error = %e, "Placement failed");
                send_swallowing(self.notifier.as_ref(), &format!("❌ Failed: {e}")).await;
                return CycleOutcome::ExecFailed(e.to_string());
            }
        };

        // -- UPDATE_STATE (persist before notifying) -----------------------
        {
            let mut state = self.state.write().await;
            let record = BetRecord::placed(&match_id, candidate.selection, candidate.odds, stake);
            let bet_id = record.id;
            state.record_placement(record);
            if let Some(outcome) = report.outcome {
                state.settle(bet_id, outcome, &report.message);
            }
            self.store.save(&state);
        }

        // -- NOTIFY --------------------------------------------------------
        send_swallowing(self.notifier.as_ref(), &format!("✅ Result: {}", report.message)).await;

        CycleOutcome::Placed {
            candidate,
            stake,
            outcome: report.outcome,
            message: report.message,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
