use crate::assets;
use crate::config;
use crate::push::VapidKeys;
use crate::state;
use crate::store::Store;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use serde::Serialize;
use tower_http::cors::CorsLayer;

mod keys;
mod notify;
mod subscriptions;

/// JSON error body shared by every endpoint. The optional suggestion tells
/// the calling UI what the user can do about it.
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) suggestion: Option<String>,
}

impl ErrorResponse {
    pub(crate) fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
        }
    }

    pub(crate) fn with_suggestion(error: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestion: Some(suggestion.into()),
        }
    }
}

pub fn app(config: config::AppConfig, store: Store) -> Router {
    let vapid = VapidKeys::from_config(&config)
        .unwrap_or_else(|err| panic!("invalid VAPID configuration: {err}"));
    let state = state::AppState {
        config,
        vapid,
        store,
        started_at: std::time::Instant::now(),
    };
    // The web client and this API are served from different origins, so
    // the CORS policy is wide open on purpose.
    Router::new()
        .route(
            "/subscribe",
            get(assets::subscribe_page).post(subscriptions::subscribe),
        )
        .route("/active-users", get(subscriptions::active_users))
        .route("/vapid-public-key", get(keys::vapid_public_key))
        .route("/health", get(health))
        .route("/sw.js", get(assets::service_worker))
        .route("/static/push-client.js", get(assets::push_client_script))
        .merge(
            Router::new()
                .route("/notify-user", post(notify::notify_user))
                .route("/notify-all", post(notify::notify_all))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    notify::require_api_key,
                )),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) message: &'static str,
    pub(crate) active_users: usize,
    pub(crate) uptime: u64,
}

pub(crate) async fn health(
    State(state): State<state::AppState>,
) -> Result<Json<HealthResponse>, (axum::http::StatusCode, Json<ErrorResponse>)> {
    use crate::ports::SubscriptionStore;

    let active_users = state.store.count_users().await.map_err(|err| {
        eprintln!("health check store error: {err}");
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("subscription store unavailable")),
        )
    })?;
    Ok(Json(HealthResponse {
        status: "OK",
        message: "Fluxo push notification service",
        active_users,
        uptime: state.started_at.elapsed().as_secs(),
    }))
}
