//! # Bracket Core
//!
//! Foundational types shared across the tournament BFF:
//! - the tournament/event/bracket/match domain model
//! - the cache backend contract and cache-facing value types
//! - the dynamic TTL policy
//! - the cache key scheme
//! - the error taxonomy

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod domain;
pub mod error;
pub mod key;
pub mod ttl;

pub use cache::{CacheBackend, CacheEntry, CacheMetadata, CachedValue, ResponseMetadata, TournamentResponse};
pub use domain::{Bracket, Event, Match, MatchCounts, MatchStatus, Player, Score, Tournament};
pub use error::{BffError, BffResult};
pub use key::tournament_key;
pub use ttl::{calculate_ttl, TtlDecision};
