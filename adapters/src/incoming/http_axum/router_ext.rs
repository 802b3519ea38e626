use axum::{Router, middleware};
use std::sync::Arc;

use crate::incoming::http_axum::middleware::{
    rate_limit::{RateLimiter, rate_limit_middleware},
    request_id::request_id_middleware,
};

pub trait RouterExt<State> {
    fn with_request_id(self) -> Self;
    fn with_rate_limit(self, limiter: Arc<RateLimiter>) -> Self;
    fn with_optional_rate_limit(self, limiter: Option<Arc<RateLimiter>>) -> Self;
}

impl<State> RouterExt<State> for Router<State>
where
    State: Clone + Send + Sync + 'static,
{
    fn with_request_id(self) -> Self {
        self.layer(middleware::from_fn(request_id_middleware))
    }

    fn with_rate_limit(self, limiter: Arc<RateLimiter>) -> Self {
        self.layer(middleware::from_fn(move |conn_info, req, next| {
            let limiter_clone = Arc::clone(&limiter);
            rate_limit_middleware(limiter_clone, conn_info, req, next)
        }))
    }

    fn with_optional_rate_limit(self, limiter: Option<Arc<RateLimiter>>) -> Self {
        match limiter {
            Some(limiter) => self.with_rate_limit(limiter),
            None => self,
        }
    }
}
