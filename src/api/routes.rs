//! Application route configuration.

use axum::{extract::State, http::StatusCode, middleware, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{auth_routes, user_routes};
use super::middleware::{auth_middleware, rate_limit_auth_middleware, rate_limit_middleware};
use super::openapi::ApiDoc;
use super::AppState;

/// Assemble the full router: public credential endpoints, the protected
/// user surface, health, and API docs.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Credential endpoints are the brute-force target: stricter tier
        .nest(
            "/auth",
            auth_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_auth_middleware,
            )),
        )
        // Everything under /users requires an authenticated session
        .nest(
            "/users",
            user_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                ))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    rate_limit_middleware,
                )),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "readstack account service"
}

/// Health report across the service's two infrastructure collaborators:
/// Postgres (user store and notification queue) and Redis (rate limits,
/// one-time codes).
#[derive(Serialize)]
struct HealthReport {
    status: &'static str,
    postgres: DependencyStatus,
    redis: DependencyStatus,
}

#[derive(Serialize)]
struct DependencyStatus {
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DependencyStatus {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                healthy: true,
                error: None,
            },
            Err(e) => Self {
                healthy: false,
                error: Some(e.to_string()),
            },
        }
    }
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let postgres = DependencyStatus::from_result(state.database.ping().await);
    let redis = DependencyStatus::from_result(state.cache.exists("health:ping").await.map(|_| ()));

    let all_healthy = postgres.healthy && redis.healthy;
    let report = HealthReport {
        status: if all_healthy { "healthy" } else { "degraded" },
        postgres,
        redis,
    };

    let code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_report_shape() {
        let report = HealthReport {
            status: "degraded",
            postgres: DependencyStatus::from_result(Ok::<(), String>(())),
            redis: DependencyStatus::from_result(Err::<(), _>("connection refused".to_string())),
        };
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["status"], "degraded");
        assert_eq!(value["postgres"]["healthy"], true);
        assert!(value["postgres"].get("error").is_none());
        assert_eq!(value["redis"]["healthy"], false);
        assert_eq!(value["redis"]["error"], "connection refused");
    }
}
