//! Cache backend implementations: in-memory (C1), remote (C2),
//! composite (C3), and the factory that chooses between them (C4).

mod composite;
mod factory;
mod memory;
mod redis;

pub use composite::CompositeCache;
pub use factory::{build_cache, CacheFactoryConfig};
pub use memory::MemoryCacheBackend;
pub use redis::RedisCacheBackend;
