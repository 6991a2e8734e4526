//! Request rate limiter using a sliding one-minute window

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window limiter on requests per minute.
///
/// A limit of zero disables limiting.
pub struct RateLimiter {
    requests_per_minute: u32,
    last_requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            last_requests: Mutex::new(VecDeque::new()),
        }
    }

    /// A limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Wait until a request may be sent, then record it
    pub async fn acquire(&self) {
        if self.requests_per_minute == 0 {
            return;
        }

        loop {
            let wait = {
                let mut last = self.last_requests.lock().await;
                let now = Instant::now();
                Self::evict_expired(&mut last, now);

                if last.len() < self.requests_per_minute as usize {
                    last.push_back(now);
                    return;
                }

                match last.front() {
                    Some(&oldest) => WINDOW.saturating_sub(now.duration_since(oldest)) + Duration::from_millis(10),
                    None => Duration::ZERO,
                }
            };

            tracing::debug!("Rate limit reached, waiting {}ms", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of requests recorded in the current window
    pub async fn requests_in_window(&self) -> usize {
        let mut last = self.last_requests.lock().await;
        Self::evict_expired(&mut last, Instant::now());
        last.len()
    }

    fn evict_expired(last: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&front) = last.front() {
            if now.duration_since(front) > WINDOW {
                last.pop_front();
            } else {
                break;
            }
        }
    }
}
