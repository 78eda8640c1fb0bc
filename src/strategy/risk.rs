//! Risk gatekeeper.
//!
//! Validates a candidate and the day's counters against the configured
//! limits before anything reaches the executor. Every check must pass;
//! a single veto ends the cycle's action phase — the orchestrator never
//! falls through to the next candidate.
//!
//! The one soft check is the stake cap: a stake above `max_stake` is
//! clamped down rather than refused.

use rust_decimal::Decimal;
use std::fmt;

use crate::config::RiskConfig;
use crate::types::{Candidate, DailyCounters};

/// Why the gatekeeper refused to authorize a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum VetoReason {
    DailyBetLimit { placed: u32, max: u32 },
    DailyLossLimit { loss: Decimal, max: Decimal },
    BelowMinBalance { balance: Decimal, min: Decimal },
    InsufficientBalance { balance: Decimal, stake: Decimal },
}

impl fmt::Display for VetoReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VetoReason::DailyBetLimit { placed, max } => {
                write!(f, "daily bet limit reached ({placed}/{max})")
            }
            VetoReason::DailyLossLimit { loss, max } => {
                write!(f, "daily loss limit reached ({loss} of {max})")
            }
            VetoReason::BelowMinBalance { balance, min } => {
                write!(f, "insufficient balance ({balance} below minimum {min})")
            }
            VetoReason::InsufficientBalance { balance, stake } => {
                write!(f, "insufficient balance ({balance} for stake {stake})")
            }
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Cleared to execute with this (possibly clamped) stake.
    Allow { stake: Decimal },
    Deny(VetoReason),
}

/// Stateless limit checker; all inputs come in per call.
pub struct Gatekeeper {
    limits: RiskConfig,
}

impl Gatekeeper {
    pub fn new(limits: RiskConfig) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RiskConfig {
        &self.limits
    }

    /// Run every limit check against today's counters, the candidate,
    /// and the live balance reported by the site.
    pub fn authorize(
        &self,
        daily: &DailyCounters,
        candidate: &Candidate,
        balance: Decimal,
    ) -> Decision {
        if daily.bets_placed >= self.limits.max_bets_per_day {
            return Decision::Deny(VetoReason::DailyBetLimit {
                placed: daily.bets_placed,
                max: self.limits.max_bets_per_day,
            });
        }

        if daily.cumulative_loss >= self.limits.max_daily_loss {
            return Decision::Deny(VetoReason::DailyLossLimit {
                loss: daily.cumulative_loss,
                max: self.limits.max_daily_loss,
            });
        }

        // Clamp, not reject: an oversized suggestion shrinks to the cap.
        let stake = candidate.suggested_stake.min(self.limits.max_stake);

        if balance < self.limits.min_balance {
            return Decision::Deny(VetoReason::BelowMinBalance {
                balance,
                min: self.limits.min_balance,
            });
        }

        if balance < stake {
            return Decision::Deny(VetoReason::InsufficientBalance { balance, stake });
        }

        Decision::Allow { stake }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchObservation, MatchOdds, Selection, SignalReason};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn candidate(stake: Decimal) -> Candidate {
        Candidate {
            observation: MatchObservation {
                home: "A".into(),
                away: "B".into(),
                score: None,
                odds: MatchOdds::default(),
            },
            selection: Selection::Home,
            odds: 3.5,
            reason: SignalReason::ValueOdds { odds: 3.5, threshold: 3.0 },
            suggested_stake: stake,
        }
    }

    fn gatekeeper() -> Gatekeeper {
        Gatekeeper::new(RiskConfig::default())
    }

    fn daily() -> DailyCounters {
        DailyCounters::fresh(Utc::now().date_naive())
    }

    #[test]
    fn test_clean_state_allows() {
        let decision = gatekeeper().authorize(&daily(), &candidate(dec!(1)), dec!(100));
        assert_eq!(decision, Decision::Allow { stake: dec!(1) });
    }

    #[test]
    fn test_bet_limit_denies() {
        let mut d = daily();
        d.bets_placed = 30;
        let decision = gatekeeper().authorize(&d, &candidate(dec!(1)), dec!(100));
        assert!(matches!(
            decision,
            Decision::Deny(VetoReason::DailyBetLimit { placed: 30, max: 30 })
        ));
    }

    #[test]
    fn test_loss_limit_denies() {
        let mut d = daily();
        d.cumulative_loss = dec!(50);
        let decision = gatekeeper().authorize(&d, &candidate(dec!(1)), dec!(100));
        assert!(matches!(
            decision,
            Decision::Deny(VetoReason::DailyLossLimit { .. })
        ));
    }

    #[test]
    fn test_oversized_stake_is_clamped_not_denied() {
        // max_stake defaults to 5
        let decision = gatekeeper().authorize(&daily(), &candidate(dec!(12)), dec!(100));
        assert_eq!(decision, Decision::Allow { stake: dec!(5) });
    }

    #[test]
    fn test_balance_below_minimum_denies() {
        // balance 1.0 < min_balance 2.0 even though it covers the stake
        let decision = gatekeeper().authorize(&daily(), &candidate(dec!(1)), dec!(1));
        let Decision::Deny(reason) = decision else {
            panic!("expected deny");
        };
        assert!(matches!(reason, VetoReason::BelowMinBalance { .. }));
        assert!(format!("{reason}").contains("insufficient balance"));
    }

    #[test]
    fn test_balance_below_clamped_stake_denies() {
        let mut limits = RiskConfig::default();
        limits.min_balance = dec!(1);
        let gk = Gatekeeper::new(limits);
        let decision = gk.authorize(&daily(), &candidate(dec!(3)), dec!(2));
        assert!(matches!(
            decision,
            Decision::Deny(VetoReason::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_veto_reason_display() {
        let r = VetoReason::DailyBetLimit { placed: 30, max: 30 };
        assert_eq!(format!("{r}"), "daily bet limit reached (30/30)");
        let r = VetoReason::InsufficientBalance { balance: dec!(1), stake: dec!(2) };
        assert_eq!(format!("{r}"), "insufficient balance (1 for stake 2)");
    }
}
