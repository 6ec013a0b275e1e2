//! Sliding-window rate limiting for requests and tokens

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

/// Per-minute request and token budget for one endpoint
pub struct RateLimiter {
    requests_per_minute: u32,
    tokens_per_minute: u32,
    requests: Mutex<VecDeque<Instant>>,
    tokens: Mutex<VecDeque<(Instant, u32)>>,
}

/// Drop entries that left the window
fn prune<T>(queue: &mut VecDeque<T>, now: Instant, at: impl Fn(&T) -> Instant) {
    while let Some(front) = queue.front() {
        if now.duration_since(at(front)) > WINDOW {
            queue.pop_front();
        } else {
            break;
        }
    }
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32, tokens_per_minute: u32) -> Self {
        Self {
            requests_per_minute: requests_per_minute.max(1),
            tokens_per_minute,
            requests: Mutex::new(VecDeque::new()),
            tokens: Mutex::new(VecDeque::new()),
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Wait until a request slot is free, then claim it
    pub async fn acquire(&self) -> RateLimitGuard {
        loop {
            let wait = {
                let mut requests = self.requests.lock().await;
                let now = Instant::now();
                prune(&mut requests, now, |t| *t);

                if requests.len() < self.requests_per_minute as usize {
                    requests.push_back(now);
                    None
                } else {
                    requests
                        .front()
                        .map(|oldest| WINDOW.saturating_sub(now.duration_since(*oldest)))
                }
            };

            match wait {
                None => return RateLimitGuard { _private: () },
                Some(wait) => {
                    tracing::debug!("Request budget exhausted, waiting {:?}", wait);
                    tokio::time::sleep(wait + Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Record token usage for the current window
    pub async fn record_tokens(&self, tokens: u32) {
        let mut usage = self.tokens.lock().await;
        let now = Instant::now();
        prune(&mut usage, now, |(t, _)| *t);
        usage.push_back((now, tokens));
    }

    /// Tokens used in the last minute
    pub async fn current_token_usage(&self) -> u32 {
        let mut usage = self.tokens.lock().await;
        prune(&mut usage, Instant::now(), |(t, _)| *t);
        usage.iter().map(|(_, t)| t).sum()
    }

    pub async fn has_token_capacity(&self, needed: u32) -> bool {
        self.current_token_usage().await + needed <= self.tokens_per_minute
    }

    /// Poll until `needed` tokens fit in the window. Requests larger than the
    /// whole budget wait for an empty window instead of forever.
    pub async fn wait_for_token_capacity(&self, needed: u32) {
        let needed = needed.min(self.tokens_per_minute);
        while !self.has_token_capacity(needed).await {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

/// Proof that a request slot was claimed
pub struct RateLimitGuard {
    _private: (),
}
