use axum::http::{HeaderValue, Method};
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

fn is_ledger_endpoint(path: &str) -> bool {
    path.starts_with("/users/") && (path.ends_with("/downloads") || path.ends_with("/purchases"))
}

/// Echoes the caller's request id, or mints one, on every response.
/// Ledger mutations are additionally logged with the id attached.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|header| header.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

    let request_path = request.uri().path().to_string();
    let request_method = request.method().to_string();
    let is_ledger_write =
        request.method() == Method::POST && is_ledger_endpoint(&request_path);

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    if is_ledger_write {
        tracing::info!(
            request_id = %request_id,
            method = %request_method,
            path = %request_path,
            "Processing ledger request"
        );
    }

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    if is_ledger_write {
        tracing::info!(
            request_id = %request_id,
            status = %response.status(),
            method = %request_method,
            path = %request_path,
            "Ledger request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::is_ledger_endpoint;

    #[test]
    fn recognises_ledger_paths() {
        assert!(is_ledger_endpoint(
            "/users/7c9e6679-7425-40de-944b-e07fc1f90ae7/downloads"
        ));
        assert!(is_ledger_endpoint(
            "/users/7c9e6679-7425-40de-944b-e07fc1f90ae7/purchases"
        ));
        assert!(!is_ledger_endpoint("/health"));
        assert!(!is_ledger_endpoint(
            "/users/7c9e6679-7425-40de-944b-e07fc1f90ae7/account"
        ));
    }
}
