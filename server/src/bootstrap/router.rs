use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method},
    middleware,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::bootstrap::state::AppState;
use resume_builder_adapters::incoming::http_axum::{
    middleware::rate_limit::{create_general_rate_limiter, rate_limit_middleware},
    routes::build_application_router,
};
use resume_builder_adapters::shared::app_state::AppState as AdaptersAppState;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const REQUEST_ID_HEADER_LOWER: &str = "x-request-id";

pub fn create_router(state: &AppState) -> Router {
    let adapters_state = state.to_adapters_state();
    let cors_layer = create_cors_layer(&adapters_state);

    let application_router = build_application_router(&adapters_state);

    let router_with_rate_limiting = if adapters_state.config.rate_limit.enabled {
        let global_rate_limiter = create_general_rate_limiter(&adapters_state.config.rate_limit);
        application_router.layer(middleware::from_fn(move |conn_info, req, next| {
            let limiter = Arc::clone(&global_rate_limiter);
            rate_limit_middleware(limiter, conn_info, req, next)
        }))
    } else {
        application_router
    };

    router_with_rate_limiting
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(adapters_state)
}

fn create_cors_layer(state: &AdaptersAppState) -> CorsLayer {
    let base_cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static(REQUEST_ID_HEADER_LOWER),
        ])
        .expose_headers([
            HeaderName::from_static(REQUEST_ID_HEADER_LOWER),
            HeaderName::from_static("ratelimit-limit"),
            HeaderName::from_static("ratelimit-remaining"),
            HeaderName::from_static("ratelimit-reset"),
            HeaderName::from_static("retry-after"),
        ]);

    let origin = state
        .config
        .server
        .cors_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CORS_ORIGIN));

    base_cors.allow_origin(origin)
}
