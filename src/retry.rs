// ABOUTME: Bounded-attempt retry with exponential backoff and jitter
// ABOUTME: Sleep is injected so tests capture delays instead of waiting

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Backoff {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Backoff {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Policy for the refresh-token exchange.
    pub fn token_exchange() -> Self {
        Backoff::new(4, Duration::from_secs(1), Duration::from_secs(30))
    }

    /// Policy for webhook delivery.
    pub fn webhook() -> Self {
        Backoff::new(4, Duration::from_secs(2), Duration::from_secs(30))
    }

    /// Delay before retrying after the given zero-based failed attempt:
    /// base doubled per attempt, capped, with up to 50% uniform jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        use rand::Rng;

        let exp = self
            .base_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
            .min(self.max_delay);
        let jitter_ms = rand::thread_rng().gen_range(0..=exp.as_millis() as u64 / 2);
        exp + Duration::from_millis(jitter_ms)
    }
}

/// Run `op` up to `policy.max_attempts` times. Errors the classifier marks
/// non-retryable surface immediately; otherwise the last error is returned
/// after exhaustion. `sleep` is called between attempts.
pub fn retry<T, E, Op, Retryable, Sleep>(
    policy: &Backoff,
    mut op: Op,
    is_retryable: Retryable,
    mut sleep: Sleep,
) -> Result<T, E>
where
    Op: FnMut(u32) -> Result<T, E>,
    Retryable: Fn(&E) -> bool,
    Sleep: FnMut(Duration),
{
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= policy.max_attempts || !is_retryable(&e) {
                    return Err(e);
                }
                sleep(policy.delay_for(attempt - 1));
            }
        }
    }
}

/// Sleep on the current thread; the production sleep for `retry`.
pub fn thread_sleep(d: Duration) {
    std::thread::sleep(d);
}
