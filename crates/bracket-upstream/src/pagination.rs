//! Progressive assembly (spec §4.3): the paginated set loop for a
//! single phase group, and the install/union/append staging that
//! folds a completed phase group's results back into the tournament
//! under construction.

use std::future::Future;

use bracket_core::domain::{Event, Match, MatchStatus, Player};
use tracing::warn;

use crate::dto::RawSet;
use crate::error::UpstreamError;
use crate::normalize::{match_from_raw_set, player_from_entrant, union_participants, upsert_current_matches};

/// Fetch every page of sets for one phase group.
///
/// Pagination stops when a page returns fewer items than `page_size`,
/// or when `page_limit` pages have been fetched. A failure loading a
/// page halts the phase group — treated as end-of-pages — and
/// returns whatever was collected so far rather than propagating the
/// error to the caller, so one bad page never aborts the owning
/// event (spec §4.3's failure semantics).
pub async fn paginate_sets<F, Fut>(
    phase_group_id: &str,
    page_size: u32,
    page_limit: u32,
    mut fetch_page: F,
) -> Vec<RawSet>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<RawSet>, UpstreamError>>,
{
    let mut collected = Vec::new();
    for page in 1..=page_limit.max(1) {
        match fetch_page(page).await {
            Ok(sets) => {
                let len = sets.len() as u32;
                collected.extend(sets);
                if len < page_size {
                    break;
                }
            }
            Err(e) => {
                warn!(
                    phase_group_id,
                    page, error = %e,
                    "page fetch failed, treating phase group as exhausted"
                );
                break;
            }
        }
    }
    collected
}

/// Install a phase group's fully paginated sets onto the matching
/// bracket within `event`, then union newly discovered players into
/// the event's participants and append newly pending/in-progress
/// matches into `current_matches` (spec §4.3's "install / union /
/// append" staged assembly).
pub fn apply_phase_group_sets(event: &mut Event, bracket_id: &str, raw_sets: &[RawSet]) {
    let Some(bracket) = event.brackets.iter_mut().find(|b| b.id == bracket_id) else {
        warn!(bracket_id, "phase group completed for an unknown bracket, dropping its sets");
        return;
    };

    let matches: Vec<Match> = raw_sets
        .iter()
        .map(|raw| match_from_raw_set(raw, &bracket.name))
        .collect();
    bracket.matches = matches.clone();

    let discovered_players: Vec<Player> = raw_sets
        .iter()
        .flat_map(|raw| raw.slots.iter())
        .map(|slot| player_from_entrant(slot.entrant.as_ref()))
        .collect();
    union_participants(&mut event.participants, discovered_players);

    let live_matches = matches
        .into_iter()
        .filter(|m| !matches!(m.status, MatchStatus::Completed));
    upsert_current_matches(&mut event.current_matches, live_matches);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn raw_set(id: &str) -> RawSet {
        RawSet {
            id: id.to_string(),
            round: Some(1),
            full_round_text: None,
            state: Some(3),
            started_at: None,
            completed_at: None,
            updated_at: None,
            winner_id: None,
            slots: vec![],
        }
    }

    #[tokio::test]
    async fn stops_when_a_page_is_short() {
        let calls = AtomicU32::new(0);
        let sets = paginate_sets("pg", 30, 10, |page| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if page == 1 {
                    Ok((0..30).map(|i| raw_set(&format!("s{i}"))).collect())
                } else {
                    Ok((0..5).map(|i| raw_set(&format!("s{page}-{i}"))).collect())
                }
            }
        })
        .await;
        assert_eq!(sets.len(), 35);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_at_page_limit_even_if_pages_stay_full() {
        let sets = paginate_sets("pg", 10, 3, |page| async move {
            Ok((0..10).map(|i| raw_set(&format!("s{page}-{i}"))).collect())
        })
        .await;
        assert_eq!(sets.len(), 30);
    }

    #[tokio::test]
    async fn a_page_fetch_failure_halts_but_keeps_prior_pages() {
        let sets = paginate_sets("pg", 10, 10, |page| async move {
            if page == 1 {
                Ok((0..10).map(|i| raw_set(&format!("s{i}"))).collect())
            } else {
                Err(UpstreamError::UpstreamUnavailable("boom".into()))
            }
        })
        .await;
        assert_eq!(sets.len(), 10);
    }

    #[tokio::test]
    async fn exact_multiple_of_page_size_still_fetches_one_more_short_page() {
        let calls = AtomicU32::new(0);
        let sets = paginate_sets("pg", 5, 10, |page| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if page <= 2 {
                    Ok((0..5).map(|i| raw_set(&format!("s{page}-{i}"))).collect())
                } else {
                    Ok(vec![])
                }
            }
        })
        .await;
        assert_eq!(sets.len(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
