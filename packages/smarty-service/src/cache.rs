//! Time-bounded, single-flight cache for small read-mostly lists.

use std::{future::Future, time::Duration};

use tokio::{sync::Mutex, time::Instant};

struct Entry<T> {
	value: T,
	fetched_at: Instant,
}

/// Holds one value for at most `ttl`.
///
/// The slot lock is held across a refresh, so concurrent callers that find the value stale wait
/// for the in-flight fetch and then observe its result instead of issuing their own.
pub struct TtlCache<T> {
	ttl: Duration,
	slot: Mutex<Option<Entry<T>>>,
}
impl<T> TtlCache<T>
where
	T: Clone,
{
	pub fn new(ttl: Duration) -> Self {
		Self { ttl, slot: Mutex::new(None) }
	}

	/// Returns the cached value while it is fresh, otherwise runs `fetch` and stores the result.
	/// A failed fetch leaves the previous entry untouched.
	pub async fn get_or_refresh<F, Fut, E>(&self, fetch: F) -> Result<T, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>>,
	{
		let mut slot = self.slot.lock().await;

		if let Some(entry) = slot.as_ref()
			&& entry.fetched_at.elapsed() < self.ttl
		{
			return Ok(entry.value.clone());
		}

		let value = fetch().await?;

		*slot = Some(Entry { value: value.clone(), fetched_at: Instant::now() });

		Ok(value)
	}

	pub async fn invalidate(&self) {
		*self.slot.lock().await = None;
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[tokio::test(start_paused = true)]
	async fn serves_cached_value_until_ttl_expires() {
		let cache = TtlCache::new(Duration::from_secs(300));
		let calls = &AtomicUsize::new(0);
		let fetch = move || async move {
			let n = calls.fetch_add(1, Ordering::SeqCst) + 1;

			Ok::<_, ()>(n)
		};

		assert_eq!(cache.get_or_refresh(fetch).await, Ok(1));
		assert_eq!(cache.get_or_refresh(fetch).await, Ok(1));

		tokio::time::advance(Duration::from_secs(299)).await;

		assert_eq!(cache.get_or_refresh(fetch).await, Ok(1));

		tokio::time::advance(Duration::from_secs(2)).await;

		assert_eq!(cache.get_or_refresh(fetch).await, Ok(2));
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn concurrent_callers_share_one_fetch() {
		let cache = TtlCache::new(Duration::from_secs(300));
		let calls = &AtomicUsize::new(0);
		let fetch = move || async move {
			calls.fetch_add(1, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(50)).await;

			Ok::<_, ()>(vec!["Work".to_string()])
		};
		let (first, second) =
			tokio::join!(cache.get_or_refresh(fetch), cache.get_or_refresh(fetch));

		assert_eq!(first, second);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn invalidate_forces_refetch() {
		let cache = TtlCache::new(Duration::from_secs(300));
		let calls = &AtomicUsize::new(0);
		let fetch = move || async move { Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst)) };

		assert_eq!(cache.get_or_refresh(fetch).await, Ok(0));

		cache.invalidate().await;

		assert_eq!(cache.get_or_refresh(fetch).await, Ok(1));
	}

	#[tokio::test(start_paused = true)]
	async fn failed_refresh_keeps_previous_value() {
		let cache = TtlCache::new(Duration::from_secs(10));

		assert_eq!(cache.get_or_refresh(|| async { Ok::<_, &str>(7) }).await, Ok(7));

		tokio::time::advance(Duration::from_secs(11)).await;

		assert_eq!(cache.get_or_refresh(|| async { Err::<u32, _>("down") }).await, Err("down"));

		// The stale entry is still there, so a later success replaces it normally.
		assert_eq!(cache.get_or_refresh(|| async { Ok::<_, &str>(8) }).await, Ok(8));
	}
}
