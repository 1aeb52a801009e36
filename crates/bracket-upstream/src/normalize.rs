//! Field normalization (spec §4.3): status codes, score precedence,
//! round labels, and player/participant identity.

use bracket_core::domain::{MatchStatus, Player, Score};

use crate::dto::{RawEntrant, RawParticipant, RawSet, RawSlot, RawStanding};

/// Build a [`Player`] from an entrant's first participant, falling
/// back to the entrant's own name, and finally to a synthesized
/// "Unknown Player" placeholder (spec §3, §4.3).
///
/// Unknown placeholders must never enter a participants set — callers
/// filter with [`Player::is_unknown`].
#[must_use]
pub fn player_from_entrant(entrant: Option<&RawEntrant>) -> Player {
    let Some(entrant) = entrant else {
        return Player::unknown();
    };

    if let Some(participant) = entrant.participants.first() {
        let tag = participant
            .gamer_tag
            .clone()
            .or_else(|| entrant.name.clone());
        if let (Some(id), Some(tag)) = (participant.id.clone(), tag) {
            return Player {
                id,
                tag,
                name: entrant.name.clone(),
                participant_id: participant.id.clone(),
            };
        }
    }

    match (&entrant.id, &entrant.name) {
        (Some(id), Some(name)) => Player {
            id: id.clone(),
            tag: name.clone(),
            name: Some(name.clone()),
            participant_id: None,
        },
        _ => Player::unknown(),
    }
}

/// Build a [`Player`] from a tier-1 participant sample node (spec
/// §4.3's capped `participants` list), falling back to a synthesized
/// "Unknown Player" when neither the node nor its player carry a tag.
#[must_use]
pub fn player_from_participant(participant: &RawParticipant) -> Player {
    let tag = participant.player.as_ref().and_then(|p| p.gamer_tag.clone());
    let player_id = participant.player.as_ref().and_then(|p| p.id.clone());

    match (participant.id.clone().or(player_id), tag) {
        (Some(id), Some(tag)) => Player {
            id,
            tag,
            name: None,
            participant_id: participant.id.clone(),
        },
        _ => Player::unknown(),
    }
}

/// Round label: upstream's full text when present, else `"Round
/// <n>"` (spec §4.3).
#[must_use]
pub fn round_label(full_round_text: Option<&str>, round: Option<i64>) -> String {
    match full_round_text {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("Round {}", round.unwrap_or(0)),
    }
}

/// Score extraction precedence (spec §4.3):
/// 1. explicit slot score values,
/// 2. per-game winner tallies (not modeled upstream as a separate
///    field here, folded into (1) since the upstream API surfaces a
///    single numeric `standing.stats.score.value` per slot),
/// 3. for a completed match with a known winner and no score,
///    synthesize `1-0` in favor of the winner,
/// 4. otherwise leave unset.
///
/// The synthesized fallback in (3) can mislead a best-of-many UI that
/// renders it as a literal game tally (flagged in spec §9 for the
/// product owner; preserved here as specified).
#[must_use]
pub fn extract_score(
    slots: &[RawSlot],
    status: MatchStatus,
    player1: Option<&Player>,
    player2: Option<&Player>,
    winner: Option<&Player>,
) -> Option<Score> {
    if slots.len() == 2 {
        let p1 = slots[0]
            .standing
            .as_ref()
            .and_then(|s| s.stats.as_ref())
            .and_then(|s| s.score.as_ref())
            .and_then(|s| s.value);
        let p2 = slots[1]
            .standing
            .as_ref()
            .and_then(|s| s.stats.as_ref())
            .and_then(|s| s.score.as_ref())
            .and_then(|s| s.value);
        if let (Some(p1), Some(p2)) = (p1, p2) {
            if p1 >= 0.0 && p2 >= 0.0 {
                return Some(Score {
                    p1: p1 as u32,
                    p2: p2 as u32,
                });
            }
        }
    }

    if status == MatchStatus::Completed {
        if let Some(winner) = winner {
            if let (Some(p1), Some(p2)) = (player1, player2) {
                return if winner.id == p1.id {
                    Some(Score { p1: 1, p2: 0 })
                } else if winner.id == p2.id {
                    Some(Score { p1: 0, p2: 1 })
                } else {
                    None
                };
            }
        }
    }

    None
}

/// Resolve the winner from a raw set's `winnerId` and the two
/// players already parsed from its slots. Invariant (spec §3): if a
/// winner is present it equals `player1` or `player2`.
#[must_use]
pub fn resolve_winner(
    winner_id: Option<&str>,
    player1: &Player,
    player2: &Player,
) -> Option<Player> {
    let winner_id = winner_id?;
    if player1.participant_id.as_deref() == Some(winner_id) || player1.id == winner_id {
        Some(player1.clone())
    } else if player2.participant_id.as_deref() == Some(winner_id) || player2.id == winner_id {
        Some(player2.clone())
    } else {
        None
    }
}

/// Build the bracket display name from a phase's name (if present)
/// and the phase group's display identifier (spec §3).
#[must_use]
pub fn bracket_name(phase_name: Option<&str>, display_identifier: &str) -> String {
    bracket_core::domain::Bracket::build_name(phase_name, display_identifier)
}

/// Convert a single raw set into a domain `Match`, given the owning
/// bracket's display name.
#[must_use]
pub fn match_from_raw_set(raw: &RawSet, bracket_name: &str) -> bracket_core::domain::Match {
    let status = MatchStatus::from_upstream_code(raw.state.unwrap_or(1));

    let player1 = raw.slots.first().map(|s| player_from_entrant(s.entrant.as_ref()));
    let player2 = raw.slots.get(1).map(|s| player_from_entrant(s.entrant.as_ref()));

    let winner = match (&player1, &player2) {
        (Some(p1), Some(p2)) => resolve_winner(raw.winner_id.as_deref(), p1, p2),
        _ => None,
    };

    let score = extract_score(&raw.slots, status, player1.as_ref(), player2.as_ref(), winner.as_ref());

    bracket_core::domain::Match {
        id: raw.id.clone(),
        round: round_label(raw.full_round_text.as_deref(), raw.round),
        player1,
        player2,
        winner,
        status,
        bracket_name: bracket_name.to_string(),
        score,
        started_at: raw.started_at,
        completed_at: raw.completed_at,
        updated_at: raw.updated_at,
    }
}

/// Union `incoming` players into `existing`, deduplicated by id, and
/// dropping synthesized "Unknown" placeholders (spec §4.3c).
pub fn union_participants(existing: &mut Vec<Player>, incoming: impl IntoIterator<Item = Player>) {
    for player in incoming {
        if player.is_unknown() {
            continue;
        }
        if !existing.iter().any(|p| p.id == player.id) {
            existing.push(player);
        }
    }
}

/// Append newly pending/in-progress matches into `current_matches`,
/// deduplicated by match id (spec §4.3c). Matches already present are
/// replaced with the fresher copy so status transitions are visible.
pub fn upsert_current_matches(
    current_matches: &mut Vec<bracket_core::domain::Match>,
    incoming: impl IntoIterator<Item = bracket_core::domain::Match>,
) {
    for m in incoming {
        if matches!(m.status, bracket_core::domain::MatchStatus::Completed) {
            current_matches.retain(|existing| existing.id != m.id);
            continue;
        }
        if let Some(slot) = current_matches.iter_mut().find(|existing| existing.id == m.id) {
            *slot = m;
        } else {
            current_matches.push(m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_label_prefers_upstream_text() {
        assert_eq!(round_label(Some("Winners Round 3"), Some(3)), "Winners Round 3");
        assert_eq!(round_label(None, Some(3)), "Round 3");
        assert_eq!(round_label(Some(""), Some(2)), "Round 2");
    }

    #[test]
    fn missing_entrant_synthesizes_unknown_player() {
        let p = player_from_entrant(None);
        assert!(p.is_unknown());
    }

    #[test]
    fn explicit_slot_scores_take_precedence() {
        let slots = vec![
            RawSlot {
                entrant: None,
                standing: Some(RawStanding {
                    stats: Some(crate::dto::RawStats {
                        score: Some(crate::dto::RawScoreValue { value: Some(2.0) }),
                    }),
                }),
            },
            RawSlot {
                entrant: None,
                standing: Some(RawStanding {
                    stats: Some(crate::dto::RawStats {
                        score: Some(crate::dto::RawScoreValue { value: Some(1.0) }),
                    }),
                }),
            },
        ];
        let score = extract_score(&slots, MatchStatus::Completed, None, None, None).unwrap();
        assert_eq!(score.p1, 2);
        assert_eq!(score.p2, 1);
    }

    #[test]
    fn completed_without_score_synthesizes_one_nil() {
        let p1 = Player {
            id: "p1".into(),
            tag: "A".into(),
            name: None,
            participant_id: None,
        };
        let p2 = Player {
            id: "p2".into(),
            tag: "B".into(),
            name: None,
            participant_id: None,
        };
        let score = extract_score(&[], MatchStatus::Completed, Some(&p1), Some(&p2), Some(&p1)).unwrap();
        assert_eq!(score.p1, 1);
        assert_eq!(score.p2, 0);
    }

    #[test]
    fn pending_without_score_stays_unset() {
        let score = extract_score(&[], MatchStatus::Pending, None, None, None);
        assert!(score.is_none());
    }

    #[test]
    fn union_participants_dedupes_by_id_and_drops_unknowns() {
        let mut existing = vec![Player {
            id: "1".into(),
            tag: "A".into(),
            name: None,
            participant_id: None,
        }];
        union_participants(
            &mut existing,
            vec![
                Player {
                    id: "1".into(),
                    tag: "A-dup".into(),
                    name: None,
                    participant_id: None,
                },
                Player {
                    id: "2".into(),
                    tag: "B".into(),
                    name: None,
                    participant_id: None,
                },
                Player::unknown(),
            ],
        );
        assert_eq!(existing.len(), 2);
        assert!(existing.iter().all(|p| !p.is_unknown()));
    }

    #[test]
    fn resolve_winner_matches_by_participant_or_entrant_id() {
        let p1 = Player {
            id: "1".into(),
            tag: "A".into(),
            name: None,
            participant_id: Some("pa".into()),
        };
        let p2 = Player {
            id: "2".into(),
            tag: "B".into(),
            name: None,
            participant_id: Some("pb".into()),
        };
        assert_eq!(resolve_winner(Some("pa"), &p1, &p2).unwrap().id, "1");
        assert_eq!(resolve_winner(Some("2"), &p1, &p2).unwrap().id, "2");
        assert!(resolve_winner(Some("unrelated"), &p1, &p2).is_none());
        assert!(resolve_winner(None, &p1, &p2).is_none());
    }
}
