use axum::{
    Router,
    routing::{get, post},
};
#[cfg(feature = "docs")]
use utoipa::OpenApi;
#[cfg(feature = "docs")]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(feature = "docs")]
use crate::incoming::http_axum::docs::ApiDoc;
use crate::incoming::http_axum::{
    handlers::{
        accounts::provision_account,
        downloads::{consume_download, get_download_status},
        health::health_check,
        purchases::{list_purchases, record_purchase},
    },
    middleware::rate_limit::{create_download_rate_limiter, create_purchase_rate_limiter},
    router_ext::RouterExt,
};
use crate::shared::app_state::AppState;

/// Routes of the download ledger. The global limiter, tracing and CORS
/// layers are added by the server around this router.
pub fn build_application_router(state: &AppState) -> Router<AppState> {
    build_core_routes()
        .merge(build_download_routes(state))
        .merge(build_purchase_routes(state))
        .with_request_id()
}

fn build_core_routes() -> Router<AppState> {
    let router = Router::new().route("/health", get(health_check));

    #[cfg(feature = "docs")]
    {
        router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
    }

    #[cfg(not(feature = "docs"))]
    {
        router
    }
}

fn build_download_routes(state: &AppState) -> Router<AppState> {
    let consume_routes =
        Router::new().route("/users/{user_id}/downloads", post(consume_download));
    let read_routes = Router::new().route("/users/{user_id}/downloads", get(get_download_status));

    let limiter = state
        .config
        .rate_limit
        .enabled
        .then(|| create_download_rate_limiter(&state.config.rate_limit));

    consume_routes
        .with_optional_rate_limit(limiter)
        .merge(read_routes)
}

fn build_purchase_routes(state: &AppState) -> Router<AppState> {
    let write_routes = Router::new()
        .route("/users/{user_id}/account", post(provision_account))
        .route("/users/{user_id}/purchases", post(record_purchase));
    let read_routes = Router::new().route("/users/{user_id}/purchases", get(list_purchases));

    let limiter = state
        .config
        .rate_limit
        .enabled
        .then(|| create_purchase_rate_limiter(&state.config.rate_limit));

    write_routes
        .with_optional_rate_limit(limiter)
        .merge(read_routes)
}
