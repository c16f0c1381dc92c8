use crate::app::ErrorResponse;
use crate::app::subscriptions::store_rejection;
use crate::push as push_service;
use crate::push::{NotifyError, UserDispatch};
use crate::state;
use crate::types::{DeliveryReport, DeliveryResult};

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;

pub(crate) const API_KEY_HEADER: &str = "x-api-key";

/// Shared-secret gate for the notify endpoints. Only active when the
/// server was started with an API key; the subscribe side stays open.
pub(crate) async fn require_api_key(
    State(state): State<state::AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected = match &state.config.api_key {
        Some(expected) => expected,
        None => return next.run(req).await,
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided == Some(expected.as_str()) {
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("invalid or missing X-API-KEY header")),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotifyUserRequest {
    #[serde(rename = "userId")]
    pub(crate) user_id: String,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) data: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotifyAllRequest {
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) data: Option<JsonValue>,
}

#[derive(Serialize)]
pub(crate) struct DeviceCounts {
    pub(crate) sent: usize,
    pub(crate) failed: usize,
    pub(crate) total: usize,
}

#[derive(Serialize)]
pub(crate) struct NotifyResponse {
    pub(crate) success: bool,
    pub(crate) message: String,
    pub(crate) devices: DeviceCounts,
    pub(crate) results: Vec<DeliveryResult>,
}

impl NotifyResponse {
    fn from_report(success: bool, message: String, report: DeliveryReport) -> Self {
        Self {
            success,
            message,
            devices: DeviceCounts {
                sent: report.sent,
                failed: report.failed,
                total: report.total,
            },
            results: report.results,
        }
    }
}

type Rejection = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> Rejection {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

fn notify_rejection(err: NotifyError) -> Rejection {
    eprintln!("notification dispatch error: {err}");
    match err {
        NotifyError::Sender(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("failed to initialize push sender")),
        ),
        NotifyError::Store(store_err) => store_rejection(store_err),
    }
}

pub(crate) async fn notify_user(
    State(state): State<state::AppState>,
    Json(request): Json<NotifyUserRequest>,
) -> Result<Json<NotifyResponse>, Rejection> {
    if request.user_id.trim().is_empty() {
        return Err(bad_request("userId is required."));
    }
    if request.title.trim().is_empty() || request.body.trim().is_empty() {
        return Err(bad_request("title and body are required."));
    }

    let dispatch = push_service::notify_user(
        &state,
        &request.user_id,
        &request.title,
        &request.body,
        request.data,
    )
    .await
    .map_err(notify_rejection)?;

    match dispatch {
        UserDispatch::NoSubscriptions => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::with_suggestion(
                format!("No subscriptions found for user '{}'.", request.user_id),
                "The user must enable notifications in their profile.",
            )),
        )),
        UserDispatch::Delivered(report) => {
            let message = format!(
                "Delivered to {} of {} devices of user '{}'.",
                report.sent, report.total, request.user_id
            );
            Ok(Json(NotifyResponse::from_report(
                report.success(),
                message,
                report,
            )))
        }
    }
}

pub(crate) async fn notify_all(
    State(state): State<state::AppState>,
    Json(request): Json<NotifyAllRequest>,
) -> Result<Json<NotifyResponse>, Rejection> {
    if request.title.trim().is_empty() || request.body.trim().is_empty() {
        return Err(bad_request("title and body are required."));
    }

    let report = push_service::notify_all(&state, &request.title, &request.body, request.data)
        .await
        .map_err(notify_rejection)?;

    // An empty broadcast is a no-op, not a failure.
    let success = report.total == 0 || report.success();
    let message = format!(
        "Broadcast delivered to {} of {} devices.",
        report.sent, report.total
    );
    Ok(Json(NotifyResponse::from_report(success, message, report)))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::app::app;
    use crate::app::tests::{json_request, response_json, test_app};
    use crate::config::AppConfig;
    use crate::store::Store;

    use axum::body::Body;
    use serde_json::json;
    use tower::ServiceExt;

    fn gated_app() -> axum::Router {
        let mut config = AppConfig::default();
        config.api_key = Some("secret-key".to_string());
        app(config, Store::memory())
    }

    #[tokio::test]
    async fn notify_user__should_return_not_found_with_suggestion_for_unknown_user() {
        // Given
        let app = test_app();
        let body = json!({ "userId": "ghost", "title": "T", "body": "B" });

        // When
        let response = app
            .oneshot(json_request("/notify-user", &body))
            .await
            .expect("notify request");

        // Then
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response_json(response).await;
        assert!(body["error"].as_str().expect("error").contains("ghost"));
        assert!(body["suggestion"].as_str().expect("suggestion").len() > 0);
    }

    #[tokio::test]
    async fn notify_user__should_reject_blank_title() {
        // Given
        let app = test_app();
        let body = json!({ "userId": "alice", "title": " ", "body": "B" });

        // When
        let response = app
            .oneshot(json_request("/notify-user", &body))
            .await
            .expect("notify request");

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn notify_all__should_succeed_with_zero_devices() {
        // Given
        let app = test_app();
        let body = json!({ "title": "Hi", "body": "World" });

        // When
        let response = app
            .oneshot(json_request("/notify-all", &body))
            .await
            .expect("broadcast request");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["devices"]["sent"], 0);
        assert_eq!(body["devices"]["failed"], 0);
        assert_eq!(body["devices"]["total"], 0);
    }

    #[tokio::test]
    async fn require_api_key__should_gate_notify_endpoints_only() {
        // Given
        let app = gated_app();
        let body = json!({ "title": "Hi", "body": "World" });

        // When: no header.
        let response = app
            .clone()
            .oneshot(json_request("/notify-all", &body))
            .await
            .expect("request");

        // Then
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // When: wrong key.
        let mut request = json_request("/notify-all", &body);
        request
            .headers_mut()
            .insert(API_KEY_HEADER, "wrong".parse().expect("header"));
        let response = app.clone().oneshot(request).await.expect("request");

        // Then
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // When: right key on an empty store.
        let mut request = json_request("/notify-all", &body);
        request
            .headers_mut()
            .insert(API_KEY_HEADER, "secret-key".parse().expect("header"));
        let response = app.clone().oneshot(request).await.expect("request");

        // Then
        assert_eq!(response.status(), StatusCode::OK);

        // And: health stays open.
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("health request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn require_api_key__should_be_inactive_when_not_configured() {
        // Given
        let app = test_app();
        let body = json!({ "title": "Hi", "body": "World" });

        // When
        let response = app
            .oneshot(json_request("/notify-all", &body))
            .await
            .expect("request");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
    }
}
