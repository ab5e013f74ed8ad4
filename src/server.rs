use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Build the HTTP application around an already-wired state.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health).fallback(dispatch))
        // Everything else goes through the route table
        .fallback(dispatch)
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

async fn dispatch(State(state): State<AppState>, method: Method, uri: Uri, body: Body) -> Response {
    let routes = state.routes.clone();
    match routes.dispatch(&state, method, uri.path(), body).await {
        Ok(response) => response.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    match state.lifecycle.health_check().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "store": "ok",
        }))),
        Err(e) => {
            warn!("Health check failed: {}", e);
            Err(ApiError::service_unavailable(e.to_string()))
        }
    }
}
