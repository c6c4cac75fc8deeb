pub mod cache;

mod macros;

pub use cache::create_redis_client;
pub use cache::Cache;
pub use cache::CacheEntry;
pub use cache::CacheKey;
pub use cache::CacheWriterHandle;
