//! Counter store tiers, one module per variant.

pub mod database;
pub mod memory;
pub mod redis;

pub use database::DatabaseKeywordStore;
pub use memory::{MemoryKeywordStore, VolatileSnapshot};
pub use redis::RedisKeywordStore;
