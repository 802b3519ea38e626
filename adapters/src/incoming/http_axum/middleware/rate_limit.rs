use axum::{
    extract::{ConnectInfo, Request},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_TYPE, RETRY_AFTER},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use tokio::time::{MissedTickBehavior, interval};

use resume_builder_application::infrastructure_config::RateLimitConfig;

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub requests: u32,
    pub window_start: Instant,
}

#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_time: Instant,
    pub retry_after_seconds: Option<u64>,
}

fn numeric_header<T: ToString>(value: T) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

impl RateLimitInfo {
    pub fn to_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("RateLimit-Limit", numeric_header(self.limit));
        headers.insert("RateLimit-Remaining", numeric_header(self.remaining));

        let until_reset = self.reset_time.saturating_duration_since(Instant::now());
        let reset_timestamp = (SystemTime::now() + until_reset)
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        headers.insert("RateLimit-Reset", numeric_header(reset_timestamp));

        if let Some(retry_after) = self.retry_after_seconds {
            headers.insert(RETRY_AFTER, numeric_header(retry_after));
        }

        headers
    }
}

#[derive(Debug)]
pub enum RateLimitResult {
    Allowed(RateLimitInfo),
    Denied(RateLimitInfo),
}

/// Fixed one-minute window counter. The effective ceiling is
/// `requests_per_minute * burst_size_multiplier`.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    pub store: Arc<DashMap<IpAddr, RateLimitEntry>>,
    pub requests_per_minute: u32,
    pub burst_size: u32,
}

impl RateLimiter {
    /// Must be called inside a tokio runtime; a background task evicts
    /// expired windows once a minute.
    pub fn new(requests_per_minute: u32, burst_size_multiplier: u32) -> Self {
        let limiter = Self {
            store: Arc::new(DashMap::new()),
            requests_per_minute,
            burst_size: requests_per_minute.saturating_mul(burst_size_multiplier),
        };

        let store = Arc::clone(&limiter.store);
        tokio::spawn(async move {
            let mut cleanup_interval = interval(WINDOW);
            cleanup_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                cleanup_interval.tick().await;
                evict_expired(&store, Instant::now());
            }
        });

        limiter
    }

    pub fn check_rate_limit(&self, ip: IpAddr) -> RateLimitResult {
        let now = Instant::now();

        let mut entry = self.store.entry(ip).or_insert_with(|| RateLimitEntry {
            requests: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= WINDOW {
            entry.window_start = now;
            entry.requests = 0;
        }

        let reset_time = entry.window_start + WINDOW;

        if entry.requests < self.burst_size {
            entry.requests += 1;

            RateLimitResult::Allowed(RateLimitInfo {
                limit: self.burst_size,
                remaining: self.burst_size - entry.requests,
                reset_time,
                retry_after_seconds: None,
            })
        } else {
            RateLimitResult::Denied(RateLimitInfo {
                limit: self.burst_size,
                remaining: 0,
                reset_time,
                retry_after_seconds: Some(reset_time.saturating_duration_since(now).as_secs()),
            })
        }
    }
}

fn evict_expired(store: &DashMap<IpAddr, RateLimitEntry>, now: Instant) {
    store.retain(|_, entry| now.duration_since(entry.window_start) < WINDOW);
}

fn merge_headers_safe(target: &mut HeaderMap, source: &HeaderMap) {
    for (key, value) in source {
        if !target.contains_key(key) {
            target.insert(key, value.clone());
        }
    }
}

pub async fn rate_limit_middleware(
    rate_limiter: Arc<RateLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = addr.ip();

    match rate_limiter.check_rate_limit(client_ip) {
        RateLimitResult::Allowed(rate_info) => {
            let mut response = next.run(request).await;
            merge_headers_safe(response.headers_mut(), &rate_info.to_headers());
            response
        }
        RateLimitResult::Denied(rate_info) => {
            tracing::warn!(
                ip = %client_ip,
                "Rate limit exceeded on {} {}",
                request.method(),
                request.uri()
            );

            let mut headers = rate_info.to_headers();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

            (
                StatusCode::TOO_MANY_REQUESTS,
                headers,
                "Rate limit exceeded",
            )
                .into_response()
        }
    }
}

pub fn create_download_rate_limiter(config: &RateLimitConfig) -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new(
        config.download_requests_per_minute,
        config.burst_size_multiplier,
    ))
}

pub fn create_purchase_rate_limiter(config: &RateLimitConfig) -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new(
        config.purchase_requests_per_minute,
        config.burst_size_multiplier,
    ))
}

pub fn create_general_rate_limiter(config: &RateLimitConfig) -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new(
        config.global_requests_per_minute,
        config.burst_size_multiplier,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[tokio::test]
    async fn denies_after_burst_is_spent() {
        let limiter = RateLimiter::new(2, 1);

        assert!(matches!(
            limiter.check_rate_limit(LOCALHOST),
            RateLimitResult::Allowed(RateLimitInfo { remaining: 1, .. })
        ));
        assert!(matches!(
            limiter.check_rate_limit(LOCALHOST),
            RateLimitResult::Allowed(RateLimitInfo { remaining: 0, .. })
        ));

        let RateLimitResult::Denied(info) = limiter.check_rate_limit(LOCALHOST) else {
            panic!("third request should be denied");
        };
        assert_eq!(info.remaining, 0);
        assert!(info.retry_after_seconds.is_some());
        assert!(info.to_headers().contains_key(RETRY_AFTER));
    }

    #[tokio::test]
    async fn repeated_requests_share_one_window() {
        let limiter = RateLimiter::new(1, 1);

        let allowed = (0..100)
            .filter(|_| {
                matches!(
                    limiter.check_rate_limit(LOCALHOST),
                    RateLimitResult::Allowed(_)
                )
            })
            .count();

        assert_eq!(allowed, 1);
        assert_eq!(limiter.store.len(), 1);
    }

    #[tokio::test]
    async fn addresses_have_separate_windows() {
        let limiter = RateLimiter::new(1, 1);
        let other = IpAddr::V6(Ipv6Addr::LOCALHOST);

        assert!(matches!(
            limiter.check_rate_limit(LOCALHOST),
            RateLimitResult::Allowed(_)
        ));
        assert!(matches!(
            limiter.check_rate_limit(other),
            RateLimitResult::Allowed(_)
        ));
        assert!(matches!(
            limiter.check_rate_limit(LOCALHOST),
            RateLimitResult::Denied(_)
        ));
    }

    #[tokio::test]
    async fn expired_windows_are_evicted() {
        let limiter = RateLimiter::new(5, 1);
        limiter.check_rate_limit(LOCALHOST);

        evict_expired(&limiter.store, Instant::now() + WINDOW);

        assert!(limiter.store.is_empty());
    }
}
