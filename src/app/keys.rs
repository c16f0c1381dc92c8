use crate::state;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) timestamp: OffsetDateTime,
}

/// The VAPID public key is intentionally public: the browser needs it to
/// create a subscription addressed to this server.
pub(crate) async fn vapid_public_key(
    State(state): State<state::AppState>,
) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        public_key: state.vapid.public_key.clone(),
        timestamp: OffsetDateTime::now_utc(),
    })
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use crate::app::tests::{response_json, test_app};
    use crate::config::AppConfig;

    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn vapid_public_key__should_return_configured_key_unmodified() {
        // Given
        let expected = AppConfig::default().vapid_public_key.expect("fixture key");
        let app = test_app();

        // When
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/vapid-public-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["publicKey"], expected.as_str());
        assert!(body["timestamp"].as_str().expect("timestamp").len() > 0);
    }
}
