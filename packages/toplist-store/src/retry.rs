use std::{future::Future, time::Duration};

use crate::Result;

const MAX_ATTEMPTS: u32 = 5;
const BASE_BACKOFF_MS: u64 = 200;
const MAX_BACKOFF_MS: u64 = 5_000;

pub fn backoff_for_attempt(attempt: u32) -> Duration {
	let exp = attempt.max(1).saturating_sub(1).min(6);
	let capped = BASE_BACKOFF_MS.saturating_mul(1 << exp).min(MAX_BACKOFF_MS);

	Duration::from_millis(capped)
}

/// Runs `op` up to five times, backing off exponentially between attempts.
/// Only transient store errors (rate limit, unavailable) are retried;
/// everything else propagates on the first occurrence.
pub async fn with_backoff<T, F, Fut>(mut op: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let mut attempt = 0;

	loop {
		attempt += 1;

		match op().await {
			Ok(value) => return Ok(value),
			Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
				tracing::warn!(error = %err, attempt, "Transient store error. Retrying.");
				tokio::time::sleep(backoff_for_attempt(attempt)).await;
			},
			Err(err) => return Err(err),
		}
	}
}
