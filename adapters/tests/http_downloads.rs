use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::connect_info::MockConnectInfo,
    http::{Method, Request, StatusCode},
    response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use resume_builder_adapters::{
    incoming::http_axum::{
        middleware::request_id::REQUEST_ID_HEADER, routes::build_application_router,
    },
    outgoing::in_memory::ledger_store_memory::InMemoryLedgerStoreAdapter,
    shared::app_state::AppState,
};
use resume_builder_application::{
    entitlement::service::EntitlementService,
    infrastructure_config::{Config, LedgerBackend},
};

fn memory_config(signup_free_downloads: i32) -> Config {
    let mut config = Config::default();
    config.ledger.backend = LedgerBackend::Memory;
    config.ledger.signup_free_downloads = signup_free_downloads;
    config.ledger.max_batch_quantity = 50;
    config.rate_limit.enabled = false;
    config
}

fn app_with_config(config: Config) -> Router {
    let policy = config.entitlement_policy().unwrap();
    let service = EntitlementService::new(Arc::new(InMemoryLedgerStoreAdapter::new()), policy);
    let state = AppState::new(Arc::new(config), Arc::new(service));

    build_application_router(&state).with_state(state)
}

fn app_with_bonus(signup_free_downloads: i32) -> Router {
    app_with_config(memory_config(signup_free_downloads))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn consume(app: &Router, user: Uuid) -> Value {
    let response = send(app, Method::POST, &format!("/users/{user}/downloads"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["data"].clone()
}

#[tokio::test]
async fn free_then_purchased_then_denied() {
    let app = app_with_bonus(1);
    let user = Uuid::new_v4();

    let provisioned = send(&app, Method::POST, &format!("/users/{user}/account"), None).await;
    assert_eq!(provisioned.status(), StatusCode::OK);

    let purchase = send(
        &app,
        Method::POST,
        &format!("/users/{user}/purchases"),
        Some(json!({ "quantity": 1 })),
    )
    .await;
    assert_eq!(purchase.status(), StatusCode::CREATED);
    let batch_id = json_body(purchase).await["data"]["id"].clone();

    let first = consume(&app, user).await;
    assert_eq!(first["allowed"], true);
    assert_eq!(first["source"], "free");

    let second = consume(&app, user).await;
    assert_eq!(second["allowed"], true);
    assert_eq!(second["source"], "purchased");
    assert_eq!(second["batchId"], batch_id);

    let third = consume(&app, user).await;
    assert_eq!(third["allowed"], false);
    assert_eq!(third["reason"], "no_downloads_remaining");
    assert!(
        third["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("No downloads remaining"))
    );
}

#[tokio::test]
async fn status_reports_camel_case_balance() {
    let app = app_with_bonus(0);
    let user = Uuid::new_v4();
    send(&app, Method::POST, &format!("/users/{user}/account"), None).await;
    send(
        &app,
        Method::POST,
        &format!("/users/{user}/purchases"),
        Some(json!({ "quantity": 3 })),
    )
    .await;
    consume(&app, user).await;

    let response = send(&app, Method::GET, &format!("/users/{user}/downloads"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let status = json_body(response).await["data"].clone();

    assert_eq!(status["freeDownloadsRemaining"], 0);
    assert_eq!(status["purchasedTotal"], 3);
    assert_eq!(status["purchasedUsed"], 1);
    assert_eq!(status["purchasedRemaining"], 2);
    assert_eq!(status["downloadCount"], 1);
    assert_eq!(status["downloadsRemaining"], 2);
    assert_eq!(status["hasDownloads"], true);
    assert_eq!(status["isFree"], false);
}

#[tokio::test]
async fn unknown_account_is_denied_and_reports_zeroes() {
    let app = app_with_bonus(1);
    let user = Uuid::new_v4();

    let denied = consume(&app, user).await;
    assert_eq!(denied["allowed"], false);
    assert_eq!(denied["reason"], "account_not_found");

    let response = send(&app, Method::GET, &format!("/users/{user}/downloads"), None).await;
    let status = json_body(response).await["data"].clone();
    assert_eq!(status["downloadsRemaining"], 0);
    assert_eq!(status["hasDownloads"], false);
}

#[tokio::test]
async fn purchase_validation_and_missing_account() {
    let app = app_with_bonus(1);
    let user = Uuid::new_v4();

    let missing = send(
        &app,
        Method::POST,
        &format!("/users/{user}/purchases"),
        Some(json!({ "quantity": 2 })),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = json_body(missing).await;
    assert_eq!(body["ok"], false);

    send(&app, Method::POST, &format!("/users/{user}/account"), None).await;

    let zero = send(
        &app,
        Method::POST,
        &format!("/users/{user}/purchases"),
        Some(json!({ "quantity": 0 })),
    )
    .await;
    assert_eq!(zero.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let too_many = send(
        &app,
        Method::POST,
        &format!("/users/{user}/purchases"),
        Some(json!({ "quantity": 51 })),
    )
    .await;
    assert_eq!(too_many.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn purchase_history_lists_batches_in_order() {
    let app = app_with_bonus(0);
    let user = Uuid::new_v4();
    send(&app, Method::POST, &format!("/users/{user}/account"), None).await;
    for quantity in [2, 5] {
        send(
            &app,
            Method::POST,
            &format!("/users/{user}/purchases"),
            Some(json!({ "quantity": quantity })),
        )
        .await;
    }
    consume(&app, user).await;

    let response = send(&app, Method::GET, &format!("/users/{user}/purchases"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let batches = json_body(response).await["data"].clone();

    let batches = batches.as_array().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0]["quantity"], 2);
    assert_eq!(batches[0]["usedQuantity"], 1);
    assert_eq!(batches[1]["quantity"], 5);
    assert_eq!(batches[1]["usedQuantity"], 0);
}

#[tokio::test]
async fn provisioning_twice_keeps_balance() {
    let app = app_with_bonus(2);
    let user = Uuid::new_v4();

    send(&app, Method::POST, &format!("/users/{user}/account"), None).await;
    consume(&app, user).await;
    let again = send(&app, Method::POST, &format!("/users/{user}/account"), None).await;

    let account = json_body(again).await["data"].clone();
    assert_eq!(account["freeDownloadsRemaining"], 1);
    assert_eq!(account["downloadCount"], 1);
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let app = app_with_bonus(1);

    let echoed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(REQUEST_ID_HEADER, "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(echoed.headers()[REQUEST_ID_HEADER], "req-42");

    let generated = send(&app, Method::GET, "/health", None).await;
    let id = generated.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert!(Uuid::parse_str(id).is_ok());

    let health = json_body(generated).await;
    assert_eq!(health["data"]["status"], "ok");
    assert_eq!(health["data"]["ledger"]["backend"], "memory");
    assert_eq!(health["data"]["environment"], "development");
}

#[tokio::test]
async fn malformed_user_id_is_rejected() {
    let app = app_with_bonus(1);

    let response = send(&app, Method::POST, "/users/not-a-uuid/downloads", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_purchase_body_gets_error_envelope() {
    let app = app_with_bonus(1);
    let user = Uuid::new_v4();
    send(&app, Method::POST, &format!("/users/{user}/account"), None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/users/{user}/purchases"))
                .header("content-type", "application/json")
                .body(Body::from("{\"quantity\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn consume_limit_is_shared_across_account_paths() {
    let mut config = memory_config(1);
    config.rate_limit.enabled = true;
    config.rate_limit.download_requests_per_minute = 2;
    config.rate_limit.burst_size_multiplier = 1;

    let app = app_with_config(config).layer(MockConnectInfo(SocketAddr::from((
        [127, 0, 0, 1],
        4000,
    ))));

    let mut statuses = Vec::new();
    for _ in 0..5 {
        let uri = format!("/users/{}/downloads", Uuid::new_v4());
        statuses.push(send(&app, Method::POST, &uri, None).await.status());
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
}
