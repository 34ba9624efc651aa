use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Global token bucket shared by every client.
///
/// Recognition is CPU-bound, so one bucket for the whole process is enough
/// to keep the engine from being flooded.
#[derive(Debug)]
pub struct SimpleRateLimiter {
    // (last_update, tokens)
    state: Mutex<(Instant, f32)>,
    rate_per_sec: f32,
    burst_size: f32,
}

impl SimpleRateLimiter {
    pub fn new(rate_per_sec: f32, burst_size: f32) -> Self {
        Self {
            state: Mutex::new((Instant::now(), burst_size)),
            rate_per_sec,
            burst_size,
        }
    }

    /// Take one token if available.
    pub fn check(&self) -> bool {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (last_update, tokens) = *guard;
        let now = Instant::now();
        let elapsed = now.duration_since(last_update).as_secs_f32();

        let available = (tokens + elapsed * self.rate_per_sec).min(self.burst_size);
        if available >= 1.0 {
            *guard = (now, available - 1.0);
            true
        } else {
            *guard = (now, available);
            false
        }
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.resilience.rate_limit_enabled && !state.rate_limiter.check() {
        tracing::warn!(uri = %req.uri(), "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_simple_rate_limiter() {
        let limiter = SimpleRateLimiter::new(2.0, 3.0);

        assert!(limiter.check());
        assert!(limiter.check());
        assert!(limiter.check());

        // Bucket drained
        assert!(!limiter.check());

        // 0.6s at 2/s refills 1.2 tokens
        std::thread::sleep(Duration::from_millis(600));
        assert!(limiter.check());
        assert!(!limiter.check());
    }

    #[test]
    fn test_burst_caps_refill() {
        let limiter = SimpleRateLimiter::new(1000.0, 2.0);
        std::thread::sleep(Duration::from_millis(50));

        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());
    }
}
