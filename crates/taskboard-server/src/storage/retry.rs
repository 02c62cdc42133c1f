//! Fixed-interval retry for establishing the store connection

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Startup connect policy: a bounded number of attempts with a fixed pause
/// between failures.
#[derive(Debug, Clone, Copy)]
pub struct ConnectRetry {
    attempts: u32,
    interval: Duration,
}

impl ConnectRetry {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            interval,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run `connect` until it succeeds or the budget is spent.
    ///
    /// `connect` receives the 1-based attempt number. On exhaustion the
    /// error of the last attempt is returned; there is no sleep after it.
    pub async fn run<F, Fut, T, E>(&self, what: &str, mut connect: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match connect(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts => {
                    warn!(
                        "Failed to connect to {} (attempt {}/{}), retrying in {:?}: {}",
                        what, attempt, self.attempts, self.interval, e
                    );
                    tokio::time::sleep(self.interval).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Failed to connect to {} (attempt {}/{}), giving up: {}",
                        what, attempt, self.attempts, e
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let retry = ConnectRetry::new(10, Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let counter = calls.clone();
        let result: Result<&str, String> = retry
            .run("test store", move |attempt| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(format!("refused on attempt {}", attempt))
                    } else {
                        Ok("connected")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // two failed attempts, two pauses
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let retry = ConnectRetry::new(10, Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let counter = calls.clone();
        let result: Result<(), String> = retry
            .run("test store", move |attempt| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("refused on attempt {}", attempt)) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "refused on attempt 10");
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(18) && elapsed < Duration::from_secs(19));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        assert_eq!(ConnectRetry::new(0, Duration::ZERO).attempts(), 1);
    }
}
