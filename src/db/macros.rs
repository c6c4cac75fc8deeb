/// A macro to simplify read-through caching.
///
/// Returns the cached value when an entry exists and is younger than `$ttl`.
/// Otherwise executes the provided block to compute the value, stores it in
/// the cache, and returns it. A failed cache read is logged and treated as a miss.
///
/// # Arguments
/// * `$cache`: The cache instance. Must have `get_from_cache` and `set_in_background`.
/// * `$key`: The key to use for caching the value.
/// * `$ttl`: Freshness window in seconds.
/// * `$block`: Future producing `AppResult<T>`, awaited only on a miss.
///
/// # Example
/// ```rust,ignore
/// let value = cached!(cache, cache_key, 3600, async move {
///     compute_expensive_value().await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(entry)) if entry.is_fresh($ttl, ::chrono::Utc::now()) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(entry.value)
            }
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
