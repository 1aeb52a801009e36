//! Tournament/event/bracket/match domain model (spec §3).
//!
//! These are plain value types: the BFF never mutates a `Tournament`
//! in place once it has been handed to the cache. A refresh produces a
//! brand-new `Tournament` that replaces the old cache entry wholesale.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The root aggregate returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    /// Upstream identifier, opaque to the BFF.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL-safe slug; also the cache key component.
    pub slug: String,
    /// Upstream URL for the tournament's own page.
    pub url: Option<String>,
    /// Competitions within this tournament.
    pub events: Vec<Event>,
}

/// One competition within a tournament.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Upstream identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL-safe slug.
    pub slug: String,
    /// Phase groups within this event.
    pub brackets: Vec<Bracket>,
    /// Known participants, deduplicated by id. Never contains a
    /// synthesized "Unknown Player" placeholder.
    pub participants: Vec<Player>,
    /// Matches that are pending or in progress, deduplicated by id.
    pub current_matches: Vec<Match>,
}

/// A phase group (pool) within an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    /// Upstream identifier.
    pub id: String,
    /// `"{phase_name} - {identifier}"` when upstream supplies a phase
    /// name, else just `identifier`.
    pub name: String,
    /// Sets within this phase group.
    pub matches: Vec<Match>,
}

impl Bracket {
    /// Build the bracket's display name per spec §3's naming invariant.
    #[must_use]
    pub fn build_name(phase_name: Option<&str>, identifier: &str) -> String {
        match phase_name {
            Some(phase) if !phase.is_empty() => format!("{phase} - {identifier}"),
            _ => identifier.to_string(),
        }
    }
}

/// A single match ("set") between two entrants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Upstream identifier.
    pub id: String,
    /// Round label, e.g. `"Winners Round 3"` or `"Round 3"`.
    pub round: String,
    /// First entrant, if known.
    pub player1: Option<Player>,
    /// Second entrant, if known.
    pub player2: Option<Player>,
    /// The winner, if decided. When present it equals `player1` or
    /// `player2`.
    pub winner: Option<Player>,
    /// Lifecycle state.
    pub status: MatchStatus,
    /// Name of the bracket this match belongs to, carried for display
    /// convenience on the flattened `current_matches` list.
    pub bracket_name: String,
    /// Game score, when known or synthesizable.
    pub score: Option<Score>,
    /// Epoch seconds.
    pub started_at: Option<i64>,
    /// Epoch seconds.
    pub completed_at: Option<i64>,
    /// Epoch seconds.
    pub updated_at: Option<i64>,
}

/// Match lifecycle state (spec §4.3 field normalization).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Not yet started.
    Pending,
    /// Underway.
    InProgress,
    /// Finished.
    Completed,
}

impl MatchStatus {
    /// Map an upstream status code per spec §4.3: `1 → pending`,
    /// `2 → in_progress`, `3 → completed`; any other code → pending.
    #[must_use]
    pub const fn from_upstream_code(code: i64) -> Self {
        match code {
            2 => Self::InProgress,
            3 => Self::Completed,
            _ => Self::Pending,
        }
    }
}

/// A game score between two entrants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    /// Games won by `player1`.
    pub p1: u32,
    /// Games won by `player2`.
    pub p2: u32,
}

/// A tag-first player identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Identifier: upstream-supplied, or synthesized for unknown
    /// entrants (see [`Player::unknown`]).
    pub id: String,
    /// Player tag (handle).
    pub tag: String,
    /// Full name, when upstream supplies one.
    pub name: Option<String>,
    /// Upstream participant id, when distinct from `id`.
    pub participant_id: Option<String>,
}

impl Player {
    /// The placeholder synthesized when upstream input is missing an
    /// identity. Callers building a participants set must filter these
    /// out (spec §3, §4.3): they must never pollute `participants`.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            id: format!("unknown-{}", Uuid::new_v4()),
            tag: "Unknown Player".to_string(),
            name: None,
            participant_id: None,
        }
    }

    /// Whether this is a synthesized unknown-player placeholder.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.tag == "Unknown Player"
    }
}

/// Counts feeding the TTL decision and client display (spec §3, §4.4).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchCounts {
    /// Matches currently `in_progress`.
    pub ongoing: u32,
    /// Matches `completed` within the last 300s.
    pub recently_completed: u32,
    /// Matches still `pending`.
    pub pending: u32,
    /// Matches `completed` more than 300s ago.
    pub old_completed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_name_prefers_phase_name() {
        assert_eq!(Bracket::build_name(Some("Winners"), "A1"), "Winners - A1");
        assert_eq!(Bracket::build_name(None, "A1"), "A1");
        assert_eq!(Bracket::build_name(Some(""), "A1"), "A1");
    }

    #[test]
    fn status_code_mapping() {
        assert_eq!(MatchStatus::from_upstream_code(1), MatchStatus::Pending);
        assert_eq!(MatchStatus::from_upstream_code(2), MatchStatus::InProgress);
        assert_eq!(MatchStatus::from_upstream_code(3), MatchStatus::Completed);
        assert_eq!(MatchStatus::from_upstream_code(99), MatchStatus::Pending);
    }

    #[test]
    fn unknown_player_is_flagged_and_unique() {
        let a = Player::unknown();
        let b = Player::unknown();
        assert!(a.is_unknown());
        assert_ne!(a.id, b.id);
    }
}
