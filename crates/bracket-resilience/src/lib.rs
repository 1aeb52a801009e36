//! # Bracket Resilience
//!
//! Retry policy and the cache backend stack (C1 in-memory, C2 remote,
//! C3 composite, C4 factory) for the tournament BFF.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod retry;

pub use cache::{build_cache, CacheFactoryConfig, CompositeCache, MemoryCacheBackend, RedisCacheBackend};
pub use retry::{RetryConfig, RetryPolicy, Retryable};

