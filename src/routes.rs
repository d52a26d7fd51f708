// routes.rs
use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler,
        labour::labour_handler,
        notification_handler::notification_handler,
        payment::payment_handler,
        users::users_handler,
        verification::verification_handler,
        workers::{skills_handler, worker_profiles_handler},
    },
    AppState,
};

// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/users", users_handler())
        .nest("/admins", admin_handler())
        .nest("/labour", labour_handler())
        .nest("/payments", payment_handler())
        .nest("/skills", skills_handler())
        .nest("/worker-profiles", worker_profiles_handler())
        .nest("/verifications", verification_handler())
        .nest("/notifications", notification_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::service::test_support::app;

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (_, state) = app();
        let response = create_router(Arc::new(state))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn service_errors_map_to_status_codes() {
        let (_, state) = app();
        let router = create_router(Arc::new(state));
        let body = json!({
            "first_name": "Lerato",
            "last_name": "Dlamini",
            "email": "lerato@example.com",
            "roles": ["Client"],
            "current_mode": "Client"
        });

        let created = router
            .clone()
            .oneshot(json_request("POST", "/api/users", body.clone()))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let duplicate = router
            .clone()
            .oneshot(json_request("POST", "/api/users", body))
            .await
            .unwrap();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let missing = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/labour/jobs/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn discovery_routes_are_not_shadowed_by_id_routes() {
        let (_, state) = app();
        let router = create_router(Arc::new(state));
        let get = |uri: String| Request::builder().uri(uri).body(Body::empty()).unwrap();

        let cases = [
            ("/api/labour/jobs/search".to_string(), StatusCode::BAD_REQUEST),
            ("/api/labour/jobs/search?keyword=paint".to_string(), StatusCode::OK),
            ("/api/labour/jobs/search?min_budget=100&max_budget=50".to_string(), StatusCode::BAD_REQUEST),
            ("/api/labour/contracts/overdue".to_string(), StatusCode::OK),
            (format!("/api/payments/clients/{}", uuid::Uuid::new_v4()), StatusCode::OK),
            (format!("/api/payments/workers/{}", uuid::Uuid::new_v4()), StatusCode::OK),
            ("/api/worker-profiles?min_rating=9".to_string(), StatusCode::BAD_REQUEST),
            ("/api/worker-profiles".to_string(), StatusCode::OK),
        ];
        for (uri, expected) in cases {
            let response = router.clone().oneshot(get(uri.clone())).await.unwrap();
            assert_eq!(response.status(), expected, "{}", uri);
        }
    }
}
