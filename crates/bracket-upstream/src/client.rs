//! Rate-limited upstream GraphQL client (C5, spec §4.3).
//!
//! Re-architected per spec §9's note: a worker task owns the single
//! outbound queue and the last-dispatch timestamp by construction,
//! replacing the source's mutable-queue-plus-resolvers shape with a
//! bounded channel plus a reply channel per request.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bracket_core::domain::{Bracket, Event, Player, Tournament};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::dto::{
    GraphQlEnvelope, PhaseGroupsQueryData, SetsPageQueryData, TournamentQueryData,
};
use crate::error::UpstreamError;
use crate::normalize::{bracket_name, player_from_participant, union_participants};
use crate::pagination::{apply_phase_group_sets, paginate_sets};
use crate::query::{phase_groups_query, sets_page_query, tournament_query, DEFAULT_PAGE_LIMIT, DEFAULT_PAGE_SIZE};
use bracket_resilience::{RetryConfig, RetryPolicy};

/// Configuration for the upstream client (spec §6).
#[derive(Clone)]
pub struct UpstreamConfig {
    /// Base URL of the upstream GraphQL endpoint.
    pub base_url: String,
    /// Bearer credential. Never logged or echoed into error messages.
    pub token: SecretString,
    /// Minimum time between outbound dispatches (default 800ms).
    pub min_interval: Duration,
    /// Maximum retries for a rate-limited request (default 3).
    pub max_retries: u32,
    /// Base delay for the retry backoff (default 2000ms).
    pub retry_base_delay: Duration,
    /// Sets fetched per page within a phase group (default 30).
    pub page_size: u32,
    /// Maximum pages fetched per phase group (default 10).
    pub page_limit: u32,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl UpstreamConfig {
    /// Build a config from just the required fields, using spec §6's
    /// defaults for everything else.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: SecretString::new(token.into()),
            min_interval: Duration::from_millis(800),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(2000),
            page_size: DEFAULT_PAGE_SIZE,
            page_limit: DEFAULT_PAGE_LIMIT,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Progress notifications emitted while a tournament is being
/// assembled. Callbacks receiving these must never panic into the
/// client and must never block (spec §4.3's progressive-assembly
/// callbacks) — they are invoked from the orchestrating call, never
/// from the single-dispatch worker, so a slow callback cannot stall
/// the shared upstream queue.
#[derive(Debug, Clone)]
pub enum FetchProgress {
    /// An event's phase groups have started loading.
    EventStarted { event_id: String },
    /// A phase group finished loading (successfully or not).
    BracketComplete { event_id: String, bracket_id: String },
    /// An entire event failed to load; its siblings continue.
    EventFailed { event_id: String, message: String },
}

/// Optional progress callback, invoked synchronously but guarded
/// against panics so a misbehaving callback can never crash a fetch.
pub type ProgressCallback = Arc<dyn Fn(FetchProgress) + Send + Sync>;

struct QueuedRequest {
    query: String,
    variables: Value,
    /// Wall-clock point past which this request is no longer worth
    /// dispatching (spec §5's per-request deadline).
    deadline: Instant,
    reply: oneshot::Sender<Result<Value, UpstreamError>>,
}

/// The rate-limited upstream GraphQL client.
#[derive(Clone)]
pub struct UpstreamClient {
    sender: mpsc::Sender<QueuedRequest>,
    config: UpstreamConfig,
}

impl UpstreamClient {
    /// Build a client and spawn its single-dispatch worker task.
    ///
    /// # Errors
    /// Returns [`UpstreamError::Network`] if the underlying HTTP
    /// client cannot be constructed.
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| UpstreamError::Network(format!("failed to build http client: {e}")))?;

        let (sender, receiver) = mpsc::channel(256);
        let worker_config = config.clone();
        tokio::spawn(Self::run_worker(receiver, http, worker_config));

        Ok(Self { sender, config })
    }

    async fn run_worker(
        mut receiver: mpsc::Receiver<QueuedRequest>,
        http: Client,
        config: UpstreamConfig,
    ) {
        let retry_policy = RetryPolicy::new(RetryConfig {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay,
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.0,
        });
        let mut last_dispatch: Option<Instant> = None;

        while let Some(request) = receiver.recv().await {
            if Instant::now() >= request.deadline {
                let _ = request.reply.send(Err(UpstreamError::DeadlineExceeded));
                continue;
            }

            if let Some(last) = last_dispatch {
                let elapsed = last.elapsed();
                if elapsed < config.min_interval {
                    let wait = config.min_interval - elapsed;
                    let remaining = request.deadline.saturating_duration_since(Instant::now());
                    if wait >= remaining {
                        let _ = request.reply.send(Err(UpstreamError::DeadlineExceeded));
                        continue;
                    }
                    tokio::time::sleep(wait).await;
                }
            }

            let remaining = request.deadline.saturating_duration_since(Instant::now());
            let result = match tokio::time::timeout(
                remaining,
                retry_policy.execute(|| {
                    Self::execute_once(&http, &config, &request.query, &request.variables)
                }),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(UpstreamError::DeadlineExceeded),
            };
            last_dispatch = Some(Instant::now());

            let _ = request.reply.send(result);
        }
    }

    async fn execute_once(
        http: &Client,
        config: &UpstreamConfig,
        query: &str,
        variables: &Value,
    ) -> Result<Value, UpstreamError> {
        let body = serde_json::json!({ "query": query, "variables": variables });

        let response = http
            .post(&config.base_url)
            .bearer_auth(config.token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(UpstreamError::AuthenticationFailed);
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(UpstreamError::RateLimited);
            }
            status if status.is_server_error() => {
                return Err(UpstreamError::UpstreamUnavailable(format!(
                    "upstream returned {status}"
                )));
            }
            status => {
                return Err(UpstreamError::UpstreamUnavailable(format!(
                    "unexpected upstream status {status}"
                )));
            }
        }

        let envelope: GraphQlEnvelope<Value> = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        if let Some(data) = envelope.data {
            Ok(data)
        } else if let Some(first) = envelope.errors.first() {
            Err(UpstreamError::UpstreamUnavailable(first.message.clone()))
        } else {
            Err(UpstreamError::Decode("empty graphql response".to_string()))
        }
    }

    /// Enqueue a single GraphQL request and await its reply.
    ///
    /// The request carries a deadline (spec §5) of `request_timeout`
    /// from now; a queue wait or retry sleep that would cross it causes
    /// the worker to discard the request without spending further rate
    /// budget on it.
    async fn dispatch(&self, query: String, variables: Value) -> Result<Value, UpstreamError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(QueuedRequest {
                query,
                variables,
                deadline: Instant::now() + self.config.request_timeout,
                reply: tx,
            })
            .await
            .map_err(|_| UpstreamError::Network("upstream worker is gone".to_string()))?;
        rx.await
            .map_err(|_| UpstreamError::Network("upstream worker dropped the reply".to_string()))?
    }

    /// Fetch a fully materialized tournament (spec §4.3's two-tier
    /// query shape plus progressive per-phase-group assembly).
    ///
    /// A failure loading one event is logged and does not abort
    /// loading of sibling events; the returned tournament stays
    /// internally consistent even after a partial failure.
    pub async fn fetch_tournament(
        &self,
        slug: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<Tournament, UpstreamError> {
        let (query, variables) = tournament_query(slug);
        let data = self.dispatch(query, variables).await?;
        let parsed: TournamentQueryData = serde_json::from_value(data)
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        let raw_tournament = parsed
            .tournament
            .ok_or_else(|| UpstreamError::NotFound(slug.to_string()))?;

        let mut tournament = Tournament {
            id: raw_tournament.id,
            name: raw_tournament.name,
            slug: raw_tournament.slug,
            url: raw_tournament.url,
            events: Vec::new(),
        };

        for raw_event in raw_tournament.events {
            let event_id = raw_event.id.clone();
            Self::notify(&progress, FetchProgress::EventStarted { event_id: event_id.clone() });

            let mut event = Event {
                id: raw_event.id.clone(),
                name: raw_event.name,
                slug: raw_event.slug,
                brackets: Vec::new(),
                participants: Vec::new(),
                current_matches: Vec::new(),
            };

            let sampled_participants: Vec<Player> = raw_event
                .participants
                .map(|c| c.nodes)
                .unwrap_or_default()
                .iter()
                .map(player_from_participant)
                .collect();
            union_participants(&mut event.participants, sampled_participants);

            if let Err(e) = self.load_event_brackets(&mut event, &progress).await {
                warn!(event_id = %event_id, error = %e, "event failed to load, skipping (siblings unaffected)");
                Self::notify(
                    &progress,
                    FetchProgress::EventFailed {
                        event_id: event_id.clone(),
                        message: e.to_string(),
                    },
                );
            }

            tournament.events.push(event);
        }

        Ok(tournament)
    }

    async fn load_event_brackets(
        &self,
        event: &mut Event,
        progress: &Option<ProgressCallback>,
    ) -> Result<(), UpstreamError> {
        let (query, variables) = phase_groups_query(&event.id);
        let data = self.dispatch(query, variables).await?;
        let parsed: PhaseGroupsQueryData =
            serde_json::from_value(data).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        let raw_event = parsed
            .event
            .ok_or_else(|| UpstreamError::NotFound(event.id.clone()))?;

        for phase_group in raw_event.phase_groups {
            let name = bracket_name(
                phase_group.phase.as_ref().and_then(|p| p.name.as_deref()),
                &phase_group.display_identifier,
            );
            event.brackets.push(Bracket {
                id: phase_group.id.clone(),
                name,
                matches: Vec::new(),
            });

            let page_size = self.config.page_size;
            let page_limit = self.config.page_limit;
            let phase_group_id = phase_group.id.clone();

            let raw_sets = paginate_sets(&phase_group_id, page_size, page_limit, |page| {
                let phase_group_id = phase_group_id.clone();
                async move {
                    let (query, variables) = sets_page_query(&phase_group_id, page, page_size);
                    let data = self.dispatch(query, variables).await?;
                    let parsed: SetsPageQueryData = serde_json::from_value(data)
                        .map_err(|e| UpstreamError::Decode(e.to_string()))?;
                    Ok(parsed
                        .phase_group
                        .and_then(|pg| pg.sets)
                        .map(|c| c.nodes)
                        .unwrap_or_default())
                }
            })
            .await;

            apply_phase_group_sets(event, &phase_group.id, &raw_sets);

            Self::notify(
                progress,
                FetchProgress::BracketComplete {
                    event_id: event.id.clone(),
                    bracket_id: phase_group.id.clone(),
                },
            );
        }

        Ok(())
    }

    /// Invoke a progress callback, catching any panic so a
    /// misbehaving callback never propagates into the client.
    fn notify(progress: &Option<ProgressCallback>, event: FetchProgress) {
        let Some(callback) = progress else { return };
        let callback = Arc::clone(callback);
        if std::panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
            debug!("progress callback panicked, ignoring");
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// A request queued behind the rate-limit wait is discarded once
    /// the wait would outlast its own deadline (spec §5), instead of
    /// being dispatched late.
    #[tokio::test(flavor = "multi_thread")]
    async fn a_queue_wait_that_would_outlast_the_deadline_is_discarded() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {"tournament": null}})))
            .mount(&mock)
            .await;

        let config = UpstreamConfig {
            min_interval: Duration::from_millis(300),
            request_timeout: Duration::from_millis(50),
            ..UpstreamConfig::new(mock.uri(), "token")
        };
        let client = UpstreamClient::new(config).unwrap();

        let first = client.fetch_tournament("evo", None).await;
        assert!(matches!(first, Err(UpstreamError::NotFound(_))));

        let second = client.fetch_tournament("evo", None).await;
        assert!(matches!(second, Err(UpstreamError::DeadlineExceeded)));
    }
}
