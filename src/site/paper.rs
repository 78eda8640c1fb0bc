//! Paper site — a deterministic simulated virtual-football bookmaker.
//!
//! Stands in behind the `Observer`/`Executor` traits for dry-run
//! operation and tests. Rounds, scores, and odds are derived from a
//! seed so that every run of the same seed sees the same league; no
//! network, no browser, all state in-memory.

use async_trait::async_trait;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::site::{ExecError, ExecReport, Executor, LoginError, ObserveError, Observer};
use crate::types::{BetOutcome, MatchObservation, MatchOdds, Selection};

/// League roster. Fixture pairings rotate through these each round.
const TEAMS: [&str; 16] = [
    "Red United", "Blue Rovers", "Green Athletic", "White City",
    "Black Wanderers", "Gold Town", "Silver Albion", "Crimson FC",
    "Azure County", "Amber Rangers", "Violet Villa", "Teal Thistle",
    "Coral Celtic", "Indigo Inter", "Olive Orient", "Maroon Moor",
];

/// Matches per simulated round.
const FIXTURES_PER_ROUND: usize = TEAMS.len() / 2;

/// splitmix64 — enough randomness for a toy league, fully reproducible.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// One generated fixture plus its (possibly not yet displayed) result.
#[derive(Debug, Clone)]
struct Fixture {
    observation: MatchObservation,
    home_goals: u32,
    away_goals: u32,
}

impl Fixture {
    fn winner(&self) -> Selection {
        if self.home_goals > self.away_goals {
            Selection::Home
        } else if self.away_goals > self.home_goals {
            Selection::Away
        } else {
            Selection::Draw
        }
    }
}

/// Shared in-memory book: session flag, balance, and the round most
/// recently shown to the observer (bets settle against it).
struct PaperBook {
    seed: u64,
    round: u64,
    balance: Decimal,
    logged_in: bool,
    current: Vec<Fixture>,
}

impl PaperBook {
    fn generate_round(&mut self) {
        self.round += 1;
        self.current = (0..FIXTURES_PER_ROUND)
            .map(|i| generate_fixture(self.seed, self.round, i))
            .collect();
    }
}

/// Deterministic fixture generation via the circle rotation method.
fn generate_fixture(seed: u64, round: u64, index: usize) -> Fixture {
    let n = TEAMS.len();
    // Rotate every team except the first around the circle.
    let slot = |k: usize| -> usize {
        if k == 0 {
            0
        } else {
            (k - 1 + round as usize) % (n - 1) + 1
        }
    };
    let home = TEAMS[slot(index)];
    let away = TEAMS[slot(n - 1 - index)];

    let h = mix(seed ^ (round << 8) ^ index as u64);
    let home_goals = (h % 5) as u32;
    let away_goals = ((h >> 8) % 5) as u32;

    let price = |shift: u64, base: f64| -> Option<String> {
        // Roughly one price in ten is suspended, as on the live page.
        if (h >> shift) % 10 == 0 {
            return None;
        }
        let v = base + ((h >> shift) % 280) as f64 / 100.0;
        Some(format!("{v:.2}"))
    };

    // First half of the round has kicked off and shows a score.
    let in_play = index < FIXTURES_PER_ROUND / 2;

    Fixture {
        observation: MatchObservation {
            home: home.to_string(),
            away: away.to_string(),
            score: in_play.then(|| format!("{home_goals}-{away_goals}")),
            odds: MatchOdds {
                home: price(16, 1.20),
                draw: price(24, 2.60),
                away: price(32, 1.20),
            },
        },
        home_goals,
        away_goals,
    }
}

// ---------------------------------------------------------------------------
// Observer / Executor halves
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PaperObserver {
    book: Arc<Mutex<PaperBook>>,
    credentials: Option<Credentials>,
}

#[derive(Clone)]
pub struct PaperExecutor {
    book: Arc<Mutex<PaperBook>>,
    dry_run: bool,
}

/// Build both halves of the paper site over one shared book.
pub fn paper_site(
    seed: u64,
    opening_balance: Decimal,
    credentials: Option<Credentials>,
    dry_run: bool,
) -> (PaperObserver, PaperExecutor) {
    let book = Arc::new(Mutex::new(PaperBook {
        seed,
        round: 0,
        balance: opening_balance,
        logged_in: false,
        current: Vec::new(),
    }));
    (
        PaperObserver {
            book: Arc::clone(&book),
            credentials,
        },
        PaperExecutor { book, dry_run },
    )
}

#[async_trait]
impl Observer for PaperObserver {
    async fn login(&self) -> Result<(), LoginError> {
        if self.credentials.is_none() {
            return Err(LoginError::MissingCredentials);
        }
        let mut book = self.book.lock().await;
        if !book.logged_in {
            book.logged_in = true;
            info!("Paper site session opened");
        }
        Ok(())
    }

    async fn list_matches(&self) -> Result<Vec<MatchObservation>, ObserveError> {
        let mut book = self.book.lock().await;
        if !book.logged_in {
            return Err(ObserveError::Transport("no active session".to_string()));
        }
        book.generate_round();
        debug!(round = book.round, fixtures = book.current.len(), "Generated round");
        Ok(book.current.iter().map(|f| f.observation.clone()).collect())
    }

    async fn current_balance(&self) -> Result<Decimal, ObserveError> {
        Ok(self.book.lock().await.balance)
    }
}

#[async_trait]
impl Executor for PaperExecutor {
    async fn place_bet(
        &self,
        match_id: &str,
        selection: Selection,
        stake: Decimal,
    ) -> Result<ExecReport, ExecError> {
        let mut book = self.book.lock().await;

        let Some(fixture) = book
            .current
            .iter()
            .find(|f| f.observation.match_id() == match_id)
            .cloned()
        else {
            return Err(ExecError::Rejected(format!(
                "fixture no longer on the board: {match_id}"
            )));
        };

        let odds_text = match selection {
            Selection::Home => fixture.observation.odds.home.as_deref(),
            Selection::Draw => fixture.observation.odds.draw.as_deref(),
            Selection::Away => fixture.observation.odds.away.as_deref(),
        };
        let odds = odds_text
            .and_then(crate::strategy::rules::parse_odds)
            .ok_or_else(|| ExecError::Rejected("price suspended".to_string()))?;

        if self.dry_run {
            return Ok(ExecReport {
                confirmed: true,
                message: format!("DRY RUN: simulated bet on {selection} @ {odds:.2}"),
                outcome: Some(settle(&fixture, selection)),
            });
        }

        // Site-side balance re-validation before committing.
        if book.balance < stake {
            return Err(ExecError::InsufficientBalance {
                balance: book.balance,
                stake,
            });
        }

        book.balance -= stake;
        let outcome = settle(&fixture, selection);
        if outcome == BetOutcome::Won {
            let payout = stake * Decimal::from_f64(odds).unwrap_or(Decimal::ONE);
            book.balance += payout;
        }

        Ok(ExecReport {
            confirmed: true,
            message: format!(
                "settled {} {}-{}",
                outcome, fixture.home_goals, fixture.away_goals
            ),
            outcome: Some(outcome),
        })
    }
}

fn settle(fixture: &Fixture, selection: Selection) -> BetOutcome {
    if fixture.winner() == selection {
        BetOutcome::Won
    } else {
        BetOutcome::Lost
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use secrecy::SecretString;

    fn creds() -> Option<Credentials> {
        Some(Credentials {
            phone: SecretString::new("0100000000".to_string()),
            password: SecretString::new("hunter2".to_string()),
        })
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let (observer, _) = paper_site(7, dec!(100), None, false);
        assert!(matches!(
            observer.login().await,
            Err(LoginError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_list_matches_requires_session() {
        let (observer, _) = paper_site(7, dec!(100), creds(), false);
        assert!(observer.list_matches().await.is_err());
        observer.login().await.unwrap();
        let matches = observer.list_matches().await.unwrap();
        assert_eq!(matches.len(), FIXTURES_PER_ROUND);
    }

    #[tokio::test]
    async fn test_rounds_are_deterministic_per_seed() {
        let (a, _) = paper_site(42, dec!(100), creds(), false);
        let (b, _) = paper_site(42, dec!(100), creds(), false);
        a.login().await.unwrap();
        b.login().await.unwrap();
        let ra = a.list_matches().await.unwrap();
        let rb = b.list_matches().await.unwrap();
        let ids_a: Vec<_> = ra.iter().map(|m| m.match_id()).collect();
        let ids_b: Vec<_> = rb.iter().map(|m| m.match_id()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[tokio::test]
    async fn test_in_play_fixtures_show_scores() {
        let (observer, _) = paper_site(3, dec!(100), creds(), false);
        observer.login().await.unwrap();
        let matches = observer.list_matches().await.unwrap();
        let with_score = matches.iter().filter(|m| m.score.is_some()).count();
        assert_eq!(with_score, FIXTURES_PER_ROUND / 2);
    }

    #[tokio::test]
    async fn test_place_bet_unknown_fixture_rejected() {
        let (observer, executor) = paper_site(3, dec!(100), creds(), false);
        observer.login().await.unwrap();
        observer.list_matches().await.unwrap();
        let result = executor
            .place_bet("Nobody v Nothing", Selection::Home, dec!(1))
            .await;
        assert!(matches!(result, Err(ExecError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_place_bet_moves_balance() {
        let (observer, executor) = paper_site(3, dec!(100), creds(), false);
        observer.login().await.unwrap();
        let matches = observer.list_matches().await.unwrap();
        // Pick a fixture with a live home price
        let m = matches.iter().find(|m| m.odds.home.is_some()).unwrap();

        let report = executor
            .place_bet(&m.match_id(), Selection::Home, dec!(5))
            .await
            .unwrap();
        assert!(report.confirmed);
        assert!(report.outcome.is_some());

        let balance = observer.current_balance().await.unwrap();
        match report.outcome.unwrap() {
            BetOutcome::Won => assert!(balance > dec!(95)),
            _ => assert_eq!(balance, dec!(95)),
        }
    }

    #[tokio::test]
    async fn test_executor_revalidates_balance() {
        let (observer, executor) = paper_site(3, dec!(2), creds(), false);
        observer.login().await.unwrap();
        let matches = observer.list_matches().await.unwrap();
        let m = matches.iter().find(|m| m.odds.home.is_some()).unwrap();
        let result = executor
            .place_bet(&m.match_id(), Selection::Home, dec!(5))
            .await;
        assert!(matches!(result, Err(ExecError::InsufficientBalance { .. })));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_balance_untouched() {
        let (observer, executor) = paper_site(3, dec!(100), creds(), true);
        observer.login().await.unwrap();
        let matches = observer.list_matches().await.unwrap();
        let m = matches.iter().find(|m| m.odds.home.is_some()).unwrap();

        let report = executor
            .place_bet(&m.match_id(), Selection::Home, dec!(5))
            .await
            .unwrap();
        assert!(report.confirmed);
        assert!(report.message.contains("DRY RUN"));
        assert_eq!(observer.current_balance().await.unwrap(), dec!(100));
    }
}
