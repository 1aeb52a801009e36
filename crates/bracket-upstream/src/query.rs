//! GraphQL query construction (spec §4.3's two-tier query shape).
//!
//! The client never constructs raw upstream IDs — these query
//! builders only ever thread values it already received from a prior
//! response back into the next request's variables.

use serde_json::{json, Value};

/// Page size for a phase group's set pagination (spec §6
/// `PAGE_SIZE`, default 30).
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Maximum number of pages fetched per phase group before pagination
/// is treated as complete (spec §6 `PAGE_LIMIT`, default 10).
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Capped number of participants sampled per event in the first-tier
/// query, keeping the estimated response object count well under the
/// per-response ceiling named in spec §4.3.
pub const EVENT_PARTICIPANT_SAMPLE: u32 = 64;

/// Tier 1: tournament identity plus a bounded list of events, each
/// with a capped participant sample.
#[must_use]
pub fn tournament_query(slug: &str) -> (String, Value) {
    let query = r#"
        query TournamentQuery($slug: String!, $participantsPerPage: Int!) {
          tournament(slug: $slug) {
            id
            name
            slug
            url
            events {
              id
              name
              slug
              participants(query: { perPage: $participantsPerPage }) {
                nodes {
                  id
                  player {
                    id
                    gamerTag
                  }
                }
              }
            }
          }
        }
    "#
    .to_string();

    let variables = json!({
        "slug": slug,
        "participantsPerPage": EVENT_PARTICIPANT_SAMPLE,
    });

    (query, variables)
}

/// Tier 2a: the phase groups (brackets) belonging to an event.
#[must_use]
pub fn phase_groups_query(event_id: &str) -> (String, Value) {
    let query = r#"
        query PhaseGroupsQuery($eventId: ID!) {
          event(id: $eventId) {
            id
            phaseGroups: phaseGroups {
              id
              displayIdentifier
              phase {
                name
              }
            }
          }
        }
    "#
    .to_string();

    let variables = json!({ "eventId": event_id });
    (query, variables)
}

/// Tier 2b: one page of sets within a phase group.
#[must_use]
pub fn sets_page_query(phase_group_id: &str, page: u32, page_size: u32) -> (String, Value) {
    let query = r#"
        query SetsPageQuery($phaseGroupId: ID!, $page: Int!, $perPage: Int!) {
          phaseGroup(id: $phaseGroupId) {
            id
            sets(page: $page, perPage: $perPage) {
              nodes {
                id
                round
                fullRoundText
                displayScore
                state
                startedAt
                completedAt
                updatedAt
                winnerId
                slots {
                  entrant {
                    id
                    name
                    participants {
                      id
                      gamerTag
                    }
                  }
                  standing {
                    stats {
                      score {
                        value
                      }
                    }
                  }
                }
              }
            }
          }
        }
    "#
    .to_string();

    let variables = json!({
        "phaseGroupId": phase_group_id,
        "page": page,
        "perPage": page_size,
    });

    (query, variables)
}
