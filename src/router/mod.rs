//! Method + path dispatch onto the resource controllers.
//!
//! axum hands every request that is not `/health` to [`RouteTable::dispatch`].
//! Rules are tried in table order and the first one whose method and path both
//! match wins.

pub mod routes;

use axum::body::{Body, Bytes};
use axum::http::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::handlers::{employee, project};
use crate::middleware::ApiResponse;
use crate::state::{AppState, BodyLimits};

pub type HandlerResult = Result<ApiResponse<Value>, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches the path exactly.
    Exact(&'static str),
    /// Matches `prefix` followed by exactly one non-empty segment, which is
    /// captured. `prefix` carries its trailing slash.
    Param { prefix: &'static str },
}

impl PathPattern {
    /// `None` when the path does not match; otherwise the captured segment,
    /// if the pattern captures one.
    pub fn capture<'a>(&self, path: &'a str) -> Option<Option<&'a str>> {
        match self {
            PathPattern::Exact(exact) => (path == *exact).then_some(None),
            PathPattern::Param { prefix } => {
                let segment = path.strip_prefix(prefix)?;
                if segment.is_empty() || segment.contains('/') {
                    return None;
                }
                Some(Some(segment))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EmployeeIndex,
    EmployeeShow,
    EmployeeCreate,
    EmployeeUpdate,
    EmployeeDelete,
    ProjectIndex,
    ProjectShow,
    ProjectCreate,
    ProjectUpdate,
    ProjectDelete,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    pub action: Action,
}

impl Route {
    pub fn new(method: Method, pattern: PathPattern, action: Action) -> Self {
        Self {
            method,
            pattern,
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub action: Action,
    pub param: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            if route.method != *method {
                return None;
            }
            let param = route.pattern.capture(path)?;
            Some(RouteMatch {
                action: route.action,
                param: param.map(str::to_string),
            })
        })
    }

    pub async fn dispatch(
        &self,
        state: &AppState,
        method: Method,
        path: &str,
        body: Body,
    ) -> HandlerResult {
        let Some(matched) = self.resolve(&method, path) else {
            debug!("No route for {} {}", method, path);
            return Err(ApiError::not_found("Endpoint not found"));
        };

        let raw = if method == Method::POST || method == Method::PUT {
            read_body(body, &state.limits).await?
        } else {
            Bytes::new()
        };

        invoke(state, matched, &raw).await
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        routes::table()
    }
}

/// Buffer the whole body. Nothing downstream runs on a partial read.
async fn read_body(body: Body, limits: &BodyLimits) -> Result<Bytes, ApiError> {
    match tokio::time::timeout(limits.read_timeout, axum::body::to_bytes(body, limits.max_bytes))
        .await
    {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => {
            warn!("Request body read failed: {}", e);
            Err(ApiError::validation("Unable to read request body"))
        }
        Err(_) => {
            warn!("Request body read timed out after {:?}", limits.read_timeout);
            Err(ApiError::validation("Unable to read request body"))
        }
    }
}

async fn invoke(state: &AppState, matched: RouteMatch, body: &[u8]) -> HandlerResult {
    let id = matched.param.as_deref().unwrap_or_default();

    match matched.action {
        Action::EmployeeIndex => employee::index(state).await.and_then(ApiResponse::into_value),
        Action::EmployeeShow => employee::show(state, id).await.and_then(ApiResponse::into_value),
        Action::EmployeeCreate => employee::create(state, body)
            .await
            .and_then(ApiResponse::into_value),
        Action::EmployeeUpdate => employee::update(state, id, body)
            .await
            .and_then(ApiResponse::into_value),
        Action::EmployeeDelete => employee::delete(state, id)
            .await
            .and_then(ApiResponse::into_value),
        Action::ProjectIndex => project::index(state).await.and_then(ApiResponse::into_value),
        Action::ProjectShow => project::show(state, id).await.and_then(ApiResponse::into_value),
        Action::ProjectCreate => project::create(state, body)
            .await
            .and_then(ApiResponse::into_value),
        Action::ProjectUpdate => project::update(state, id, body)
            .await
            .and_then(ApiResponse::into_value),
        Action::ProjectDelete => project::delete(state, id)
            .await
            .and_then(ApiResponse::into_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn captures_single_segment() {
        let pattern = PathPattern::Param {
            prefix: "/employee/",
        };
        assert_eq!(pattern.capture("/employee/abc123"), Some(Some("abc123")));
        assert_eq!(pattern.capture("/employee/"), None);
        assert_eq!(pattern.capture("/employee/a/b"), None);
        assert_eq!(pattern.capture("/project/abc"), None);
    }

    #[test]
    fn exact_pattern_captures_nothing() {
        let pattern = PathPattern::Exact("/employee");
        assert_eq!(pattern.capture("/employee"), Some(None));
        assert_eq!(pattern.capture("/employees"), None);
    }

    #[test]
    fn show_route_gets_raw_param() {
        let table = RouteTable::default();
        let matched = table.resolve(&Method::GET, "/employee/abc123").unwrap();
        assert_eq!(matched.action, Action::EmployeeShow);
        assert_eq!(matched.param.as_deref(), Some("abc123"));
    }

    #[test]
    fn method_must_match() {
        let table = RouteTable::default();
        assert!(table.resolve(&Method::PATCH, "/employee/abc123").is_none());
        assert!(table.resolve(&Method::DELETE, "/employee").is_none());
        assert_eq!(
            table.resolve(&Method::POST, "/project").map(|m| m.action),
            Some(Action::ProjectCreate)
        );
    }

    #[test]
    fn first_rule_wins() {
        let table = RouteTable::new(vec![
            Route::new(
                Method::GET,
                PathPattern::Param { prefix: "/employee/" },
                Action::EmployeeShow,
            ),
            Route::new(
                Method::GET,
                PathPattern::Param { prefix: "/employee/" },
                Action::ProjectShow,
            ),
        ]);
        let matched = table.resolve(&Method::GET, "/employee/x").unwrap();
        assert_eq!(matched.action, Action::EmployeeShow);
    }

    #[tokio::test]
    async fn unmatched_request_is_not_found() {
        let state = AppState::memory();
        let err = state
            .routes
            .dispatch(&state, Method::GET, "/nowhere", Body::empty())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::not_found("Endpoint not found"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_reaches_handler_as_validation_error() {
        let state = AppState::memory();
        let err = state
            .routes
            .dispatch(&state, Method::GET, "/employee/abc123", Body::empty())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::validation("Invalid id"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_handler() {
        let state = AppState::memory().with_limits(BodyLimits {
            max_bytes: 8,
            ..BodyLimits::default()
        });
        let body = Body::from(r#"{"name":"Ann","email":"ann@x.com"}"#);
        let err = state
            .routes
            .dispatch(&state, Method::POST, "/employee", body)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::validation("Unable to read request body"));
    }
}
