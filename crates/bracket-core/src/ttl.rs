//! Dynamic TTL policy (C6, spec §4.4).
//!
//! Inspects only `events[*].current_matches[*]`. If a future
//! contributor wants freshness to depend on matches outside that set,
//! that's a contract change, not an implementation tweak.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::{MatchCounts, MatchStatus, Tournament};

const RECENT_WINDOW_SECS: i64 = 300;

const TTL_IN_PROGRESS: i64 = 15;
const TTL_RECENTLY_COMPLETED: i64 = 120;
const TTL_PENDING: i64 = 600;
const TTL_IDLE: i64 = 1800;

/// The outcome of evaluating the TTL policy table against a tournament.
#[derive(Debug, Clone, Copy)]
pub struct TtlDecision {
    /// Seconds a freshly cached value should live for.
    pub ttl_seconds: i64,
    /// Counts feeding the decision, reported back to clients.
    pub counts: MatchCounts,
    /// Whether any match is `in_progress`.
    pub has_ongoing_matches: bool,
    /// Whether any match completed within the recent window.
    pub has_recent_matches: bool,
}

/// Compute the TTL bucket for `tournament` as of `now` (spec §4.4's
/// table, evaluated top to bottom, first match wins).
#[must_use]
pub fn calculate_ttl(tournament: &Tournament) -> TtlDecision {
    calculate_ttl_at(tournament, SystemTime::now())
}

/// As [`calculate_ttl`], but with an explicit "now" for deterministic
/// testing.
#[must_use]
pub fn calculate_ttl_at(tournament: &Tournament, now: SystemTime) -> TtlDecision {
    let now_epoch = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let mut counts = MatchCounts::default();
    let mut has_ongoing = false;
    let mut has_recent = false;

    for event in &tournament.events {
        for m in &event.current_matches {
            match m.status {
                MatchStatus::InProgress => {
                    counts.ongoing += 1;
                    has_ongoing = true;
                }
                MatchStatus::Completed => {
                    let recently = m
                        .completed_at
                        .is_some_and(|t| now_epoch - t < RECENT_WINDOW_SECS);
                    if recently {
                        counts.recently_completed += 1;
                        has_recent = true;
                    } else {
                        counts.old_completed += 1;
                    }
                }
                MatchStatus::Pending => {
                    counts.pending += 1;
                }
            }
        }
    }

    let ttl_seconds = if has_ongoing {
        TTL_IN_PROGRESS
    } else if has_recent {
        TTL_RECENTLY_COMPLETED
    } else if counts.pending > 0 {
        TTL_PENDING
    } else {
        TTL_IDLE
    };

    TtlDecision {
        ttl_seconds,
        counts,
        has_ongoing_matches: has_ongoing,
        has_recent_matches: has_recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Event, Match, Tournament};

    fn tournament_with(matches: Vec<Match>) -> Tournament {
        Tournament {
            id: "t1".into(),
            name: "Demo".into(),
            slug: "demo".into(),
            url: None,
            events: vec![Event {
                id: "e1".into(),
                name: "Singles".into(),
                slug: "singles".into(),
                brackets: vec![],
                participants: vec![],
                current_matches: matches,
            }],
        }
    }

    fn base_match(status: MatchStatus) -> Match {
        Match {
            id: "m1".into(),
            round: "Round 1".into(),
            player1: None,
            player2: None,
            winner: None,
            status,
            bracket_name: "A1".into(),
            score: None,
            started_at: None,
            completed_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn ttl_policy_table_matches_spec_exactly() {
        let now = SystemTime::now();
        let now_epoch = now.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;

        let in_progress = tournament_with(vec![base_match(MatchStatus::InProgress)]);
        assert_eq!(calculate_ttl_at(&in_progress, now).ttl_seconds, 15);

        let mut recent = base_match(MatchStatus::Completed);
        recent.completed_at = Some(now_epoch - 10);
        let recently_completed = tournament_with(vec![recent]);
        assert_eq!(calculate_ttl_at(&recently_completed, now).ttl_seconds, 120);

        let pending = tournament_with(vec![base_match(MatchStatus::Pending)]);
        assert_eq!(calculate_ttl_at(&pending, now).ttl_seconds, 600);

        let idle = tournament_with(vec![]);
        assert_eq!(calculate_ttl_at(&idle, now).ttl_seconds, 1800);
    }

    #[test]
    fn old_completed_matches_fall_through_to_idle() {
        let now = SystemTime::now();
        let now_epoch = now.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        let mut old = base_match(MatchStatus::Completed);
        old.completed_at = Some(now_epoch - 3600);
        let tournament = tournament_with(vec![old]);
        let decision = calculate_ttl_at(&tournament, now);
        assert_eq!(decision.ttl_seconds, 1800);
        assert_eq!(decision.counts.old_completed, 1);
        assert!(!decision.has_recent_matches);
    }

    #[test]
    fn in_progress_wins_over_everything_else() {
        let now = SystemTime::now();
        let tournament = tournament_with(vec![
            base_match(MatchStatus::Pending),
            base_match(MatchStatus::InProgress),
        ]);
        assert_eq!(calculate_ttl_at(&tournament, now).ttl_seconds, 15);
    }
}
