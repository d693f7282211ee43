use crate::modules::handlers::ApiError;
use axum::{
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use std::{
    collections::{HashMap, VecDeque},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

// Above this many tracked addresses, idle ones are dropped on the next check.
const PRUNE_THRESHOLD: usize = 10_000;

pub async fn access_log<B>(request: Request<B>, next: Next<B>) -> Response {
    let start_process = tokio::time::Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let response = next.run(request).await;

    let elapsed_time = start_process.elapsed().as_millis();
    tracing::info!(
        target: "accesslog",
        "endpoint={} {} status={} elapsed_time={} timestamp={}",
        method, path, response.status().as_u16(), elapsed_time, timestamp
    );

    response
}

/// Sliding window request counter keyed by remote address.
#[derive(Debug)]
pub struct RateLimiter {
    max: usize,
    window: Duration,
    hits: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request from `ip` at `now` and tells whether it is within the limit.
    /// Refused requests are not recorded.
    pub fn check(&self, ip: IpAddr, now: Instant) -> bool {
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);

        if hits.len() > PRUNE_THRESHOLD {
            let window = self.window;
            hits.retain(|_, times| {
                times
                    .back()
                    .map_or(false, |last| now.duration_since(*last) < window)
            });
        }

        let times = hits.entry(ip).or_default();
        while let Some(first) = times.front() {
            if now.duration_since(*first) >= self.window {
                times.pop_front();
            } else {
                break;
            }
        }

        if times.len() >= self.max {
            false
        } else {
            times.push_back(now);
            true
        }
    }
}

pub async fn rate_limit<B>(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check(ip, Instant::now()) {
        next.run(request).await
    } else {
        tracing::warn!("rate limit exceeded for {}", ip);
        ApiError::TooManyRequests.into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
    const OTHER: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2));

    #[test]
    fn refuses_after_max_within_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check(CLIENT, start));
        assert!(limiter.check(CLIENT, start + Duration::from_secs(1)));
        assert!(limiter.check(CLIENT, start + Duration::from_secs(2)));
        assert!(!limiter.check(CLIENT, start + Duration::from_secs(3)));
        assert!(limiter.check(OTHER, start + Duration::from_secs(3)));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check(CLIENT, start));
        assert!(limiter.check(CLIENT, start + Duration::from_secs(5)));
        assert!(!limiter.check(CLIENT, start + Duration::from_secs(9)));
        // the first hit has left the window, the second has not
        assert!(limiter.check(CLIENT, start + Duration::from_secs(10)));
        assert!(!limiter.check(CLIENT, start + Duration::from_secs(11)));
        assert!(limiter.check(CLIENT, start + Duration::from_secs(15)));
    }
}
