use crate::app::ErrorResponse;
use crate::ports::SubscriptionStore;
use crate::ports::store::StoreError;
use crate::state;
use crate::types::Subscription;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

/// Body shape matches what `PushSubscription.toJSON()` produces in the
/// browser, wrapped with the owning user id.
#[derive(Debug, Deserialize)]
pub(crate) struct SubscribeRequest {
    #[serde(rename = "userId")]
    pub(crate) user_id: String,
    pub(crate) subscription: SubscriptionBody,
    #[serde(rename = "deviceInfo")]
    pub(crate) device_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionBody {
    pub(crate) endpoint: String,
    pub(crate) keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionKeys {
    pub(crate) p256dh: String,
    pub(crate) auth: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscribeResponse {
    pub(crate) success: bool,
    pub(crate) message: String,
    pub(crate) total_devices: usize,
    pub(crate) total_users: usize,
}

type Rejection = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> Rejection {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

pub(crate) fn store_rejection(err: StoreError) -> Rejection {
    match err {
        StoreError::Invalid(reason) => bad_request(reason),
        StoreError::Backend(reason) => {
            eprintln!("subscription store error: {reason}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("subscription store unavailable")),
            )
        }
    }
}

pub(crate) async fn subscribe(
    State(state): State<state::AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, Rejection> {
    if request.user_id.trim().is_empty() {
        return Err(bad_request("userId is required."));
    }
    if request.subscription.endpoint.trim().is_empty() {
        return Err(bad_request("subscription endpoint is required."));
    }
    if request.subscription.keys.p256dh.trim().is_empty()
        || request.subscription.keys.auth.trim().is_empty()
    {
        return Err(bad_request("subscription keys p256dh and auth are required."));
    }

    let subscription = Subscription {
        endpoint: request.subscription.endpoint,
        p256dh: request.subscription.keys.p256dh,
        auth: request.subscription.keys.auth,
    };
    let outcome = state
        .store
        .register(&request.user_id, subscription, request.device_info)
        .await
        .map_err(store_rejection)?;

    let message = if outcome.replaced {
        format!("Subscription updated for user '{}'.", request.user_id)
    } else {
        format!("Device registered for user '{}'.", request.user_id)
    };
    Ok(Json(SubscribeResponse {
        success: true,
        message,
        total_devices: outcome.total_devices,
        total_users: outcome.total_users,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActiveUsersResponse {
    pub(crate) users: Vec<String>,
    pub(crate) count: usize,
    pub(crate) total_devices: usize,
    pub(crate) device_details: Vec<DeviceDetail>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceDetail {
    pub(crate) user: String,
    pub(crate) device: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

pub(crate) async fn active_users(
    State(state): State<state::AppState>,
) -> Result<Json<ActiveUsersResponse>, Rejection> {
    let all = state.store.list_all().await.map_err(store_rejection)?;

    let mut users: Vec<String> = Vec::new();
    let mut device_details = Vec::with_capacity(all.len());
    for (user, stored) in &all {
        if !users.contains(user) {
            users.push(user.clone());
        }
        device_details.push(DeviceDetail {
            user: user.clone(),
            device: stored.device_label(),
            updated_at: stored.updated_at,
        });
    }

    Ok(Json(ActiveUsersResponse {
        count: users.len(),
        total_devices: all.len(),
        users,
        device_details,
    }))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use crate::app::tests::{json_request, response_json, subscribe_body, test_app};

    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn subscribe__should_register_and_report_totals() {
        // Given
        let app = test_app();

        // When
        let response = app
            .oneshot(json_request(
                "/subscribe",
                &subscribe_body("alice", "https://push.example/e1"),
            ))
            .await
            .expect("subscribe request");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["totalDevices"], 1);
        assert_eq!(body["totalUsers"], 1);
    }

    #[tokio::test]
    async fn subscribe__should_replace_same_endpoint_not_duplicate() {
        // Given
        let app = test_app();
        let first = json!({
            "userId": "alice",
            "subscription": {
                "endpoint": "https://push.example/e1",
                "keys": { "p256dh": "p256", "auth": "auth" }
            },
            "deviceInfo": "Chrome"
        });
        let mut second = first.clone();
        second["deviceInfo"] = json!("Firefox");

        // When
        app.clone()
            .oneshot(json_request("/subscribe", &first))
            .await
            .expect("first subscribe");
        let response = app
            .clone()
            .oneshot(json_request("/subscribe", &second))
            .await
            .expect("second subscribe");

        // Then
        let body = response_json(response).await;
        assert_eq!(body["totalDevices"], 1);

        let active = app
            .oneshot(
                Request::builder()
                    .uri("/active-users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("active users");
        let body = response_json(active).await;
        assert_eq!(body["totalDevices"], 1);
        assert_eq!(body["deviceDetails"][0]["device"], "Firefox");
    }

    #[tokio::test]
    async fn subscribe__should_reject_missing_fields() {
        // Given
        let app = test_app();
        let missing_user = subscribe_body("  ", "https://push.example/e1");
        let missing_endpoint = subscribe_body("alice", "");

        // Then
        let response = app
            .clone()
            .oneshot(json_request("/subscribe", &missing_user))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert_eq!(body["error"], "userId is required.");

        let response = app
            .oneshot(json_request("/subscribe", &missing_endpoint))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn active_users__should_list_each_user_once() {
        // Given
        let app = test_app();
        for (user, endpoint) in [
            ("alice", "https://push.example/a1"),
            ("alice", "https://push.example/a2"),
            ("bob", "https://push.example/b1"),
        ] {
            app.clone()
                .oneshot(json_request("/subscribe", &subscribe_body(user, endpoint)))
                .await
                .expect("subscribe");
        }

        // When
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/active-users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("active users");

        // Then
        let body = response_json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["totalDevices"], 3);
        assert_eq!(body["users"], json!(["alice", "bob"]));
    }
}
