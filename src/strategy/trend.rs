//! Trend analyzer.
//!
//! Derives per-team win counts from the stored match history. Scores
//! come through as display text and are frequently missing or half
//! rendered for in-progress fixtures, so anything unparsable is
//! skipped rather than treated as an error.

use std::collections::HashMap;

use crate::types::MatchObservation;

/// Team name → wins observed in the history window.
pub type TrendMap = HashMap<String, u32>;

/// Parse a score display string ("2-1" or "2:1") into goal counts.
pub fn parse_score(raw: &str) -> Option<(u32, u32)> {
    let normalised = raw.replace(':', "-");
    let mut parts = normalised.splitn(2, '-');
    let home = parts.next()?.trim().parse().ok()?;
    let away = parts.next()?.trim().parse().ok()?;
    Some((home, away))
}

/// Rebuild the trend map from scratch for one history window.
///
/// Pure function: for every observation with a parsable score, the
/// winning team's counter is incremented; draws and malformed scores
/// contribute nothing. The result is an unordered mapping.
pub fn compute_trend(history: &[MatchObservation]) -> TrendMap {
    let mut trend = TrendMap::new();
    for observation in history {
        let Some((home_goals, away_goals)) =
            observation.score.as_deref().and_then(parse_score)
        else {
            continue;
        };
        if home_goals > away_goals {
            *trend.entry(observation.home.clone()).or_insert(0) += 1;
        } else if away_goals > home_goals {
            *trend.entry(observation.away.clone()).or_insert(0) += 1;
        }
    }
    trend
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
