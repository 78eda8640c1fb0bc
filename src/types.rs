//! Shared types for the TIPSTER agent.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that site, strategy, and engine
//! modules can depend on them without circular references.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of match observations retained for trend analysis.
pub const HISTORY_CAP: usize = 300;

/// Maximum number of bet records retained in the store.
pub const BET_RETENTION: usize = 300;

// ---------------------------------------------------------------------------
// Selection & outcome
// ---------------------------------------------------------------------------

/// The side of a 1X2 market a wager is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    Home,
    Draw,
    Away,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Home => write!(f, "home"),
            Selection::Draw => write!(f, "draw"),
            Selection::Away => write!(f, "away"),
        }
    }
}

/// Lifecycle of a placed bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetOutcome {
    Pending,
    Won,
    Lost,
    Void,
}

impl fmt::Display for BetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetOutcome::Pending => write!(f, "pending"),
            BetOutcome::Won => write!(f, "won"),
            BetOutcome::Lost => write!(f, "lost"),
            BetOutcome::Void => write!(f, "void"),
        }
    }
}

// ---------------------------------------------------------------------------
// Match observation
// ---------------------------------------------------------------------------

/// Raw odds text as displayed by the site. Any field may be missing —
/// in-play markets frequently suspend one or more prices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchOdds {
    pub home: Option<String>,
    pub draw: Option<String>,
    pub away: Option<String>,
}

/// One fixture as seen by the observer during a scan.
///
/// `score` is the display text ("2-1", "1:0", …) and is `None` for
/// fixtures that have not kicked off. Both score and odds are kept
/// verbatim; parsing happens in the strategy layer where malformed
/// values are expected and skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchObservation {
    pub home: String,
    pub away: String,
    pub score: Option<String>,
    pub odds: MatchOdds,
}

impl MatchObservation {
    /// Stable identifier for the fixture within a round.
    pub fn match_id(&self) -> String {
        format!("{} v {}", self.home, self.away)
    }
}

impl fmt::Display for MatchObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v {} [{}] (1: {} | X: {} | 2: {})",
            self.home,
            self.away,
            self.score.as_deref().unwrap_or("-"),
            self.odds.home.as_deref().unwrap_or("-"),
            self.odds.draw.as_deref().unwrap_or("-"),
            self.odds.away.as_deref().unwrap_or("-"),
        )
    }
}

// ---------------------------------------------------------------------------
// Bet record
// ---------------------------------------------------------------------------

/// Durable record of a wager. Appended on placement; only `outcome` and
/// `result_message` change afterwards, once, at settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRecord {
    pub id: uuid::Uuid,
    pub timestamp: DateTime<Utc>,
    pub match_id: String,
    pub selection: Selection,
    pub odds: f64,
    pub stake: Decimal,
    pub outcome: BetOutcome,
    pub result_message: String,
}

impl BetRecord {
    /// Build a pending record for a freshly placed wager.
    pub fn placed(match_id: &str, selection: Selection, odds: f64, stake: Decimal) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: Utc::now(),
            match_id: match_id.to_string(),
            selection,
            odds,
            stake,
            outcome: BetOutcome::Pending,
            result_message: String::new(),
        }
    }
}

impl fmt::Display for BetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {:.2} stake {} [{}]",
            self.match_id, self.selection, self.odds, self.stake, self.outcome,
        )
    }
}

// ---------------------------------------------------------------------------
// Daily counters
// ---------------------------------------------------------------------------

/// Per-day risk counters. Reset whenever the stored date differs from
/// the current day; mutated only by the orchestrator once an outcome
/// is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCounters {
    pub date: NaiveDate,
    pub cumulative_loss: Decimal,
    pub bets_placed: u32,
    pub consecutive_losses: u32,
}

impl DailyCounters {
    /// Zero-valued counters for the given day.
    pub fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            cumulative_loss: Decimal::ZERO,
            bets_placed: 0,
            consecutive_losses: 0,
        }
    }

    /// Whether these counters belong to an earlier day.
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.date != today
    }
}

impl fmt::Display for DailyCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: bets={} loss={} streak={}",
            self.date, self.bets_placed, self.cumulative_loss, self.consecutive_losses,
        )
    }
}

// ---------------------------------------------------------------------------
// Persistent state
// ---------------------------------------------------------------------------

/// The whole persisted state: bet ledger, daily counters, and the
/// rolling match history that feeds the trend analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotState {
    pub bets: Vec<BetRecord>,
    pub daily: DailyCounters,
    #[serde(rename = "historyMatches")]
    pub history_matches: Vec<MatchObservation>,
}

impl BotState {
    /// Zero-valued state dated today.
    pub fn fresh() -> Self {
        Self {
            bets: Vec::new(),
            daily: DailyCounters::fresh(Utc::now().date_naive()),
            history_matches: Vec::new(),
        }
    }

    /// Reset the daily counters if they belong to an earlier day.
    /// Returns true when a reset happened (caller persists immediately).
    pub fn reset_daily_if_stale(&mut self, today: NaiveDate) -> bool {
        if self.daily.is_stale(today) {
            self.daily = DailyCounters::fresh(today);
            true
        } else {
            false
        }
    }

    /// Append freshly observed fixtures, truncating to the most recent
    /// `HISTORY_CAP` entries. Arrival order is preserved; duplicate
    /// (home, away) pairs are allowed.
    pub fn record_history(&mut self, observed: &[MatchObservation]) {
        self.history_matches.extend_from_slice(observed);
        if self.history_matches.len() > HISTORY_CAP {
            let excess = self.history_matches.len() - HISTORY_CAP;
            self.history_matches.drain(..excess);
        }
    }

    /// Record a confirmed placement: bump the daily counter and append
    /// the bet record, keeping at most `BET_RETENTION` records.
    pub fn record_placement(&mut self, record: BetRecord) {
        self.daily.bets_placed += 1;
        self.bets.push(record);
        if self.bets.len() > BET_RETENTION {
            let excess = self.bets.len() - BET_RETENTION;
            self.bets.drain(..excess);
        }
    }

    /// Apply a settled outcome to a pending bet. Cumulative loss only
    /// ever grows here; it shrinks only via the daily reset.
    pub fn settle(&mut self, bet_id: uuid::Uuid, outcome: BetOutcome, message: &str) {
        let Some(bet) = self
            .bets
            .iter_mut()
            .find(|b| b.id == bet_id && b.outcome == BetOutcome::Pending)
        else {
            return;
        };
        bet.outcome = outcome;
        bet.result_message = message.to_string();

        match outcome {
            BetOutcome::Lost => {
                self.daily.cumulative_loss += bet.stake;
                self.daily.consecutive_losses += 1;
            }
            BetOutcome::Won => {
                self.daily.consecutive_losses = 0;
            }
            BetOutcome::Pending | BetOutcome::Void => {}
        }
    }
}

impl Default for BotState {
    fn default() -> Self {
        Self::fresh()
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Which strategy rule proposed a candidate. Rendered to the free text
/// carried in notifications; the structured form keeps the rule
/// parameters available for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalReason {
    ValueOdds { odds: f64, threshold: f64 },
    Trend { team: String, wins: u32 },
}

impl fmt::Display for SignalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalReason::ValueOdds { odds, threshold } => {
                write!(f, "Value odds ({odds:.2} >= {threshold:.1})")
            }
            SignalReason::Trend { team, wins } => {
                write!(f, "Trend: {team} won last {wins}")
            }
        }
    }
}

/// A proposed wager on one side of one match. Transient — produced and
/// consumed within a single cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub observation: MatchObservation,
    pub selection: Selection,
    pub odds: f64,
    pub reason: SignalReason,
    pub suggested_stake: Decimal,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {} → {} @ {:.2} ({}) stake {}",
            self.observation.home,
            self.observation.away,
            self.selection,
            self.odds,
            self.reason,
            self.suggested_stake,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
