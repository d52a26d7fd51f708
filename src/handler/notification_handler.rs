// handler/notification_handler.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::marketdtos::{ApiResponse, NotificationQuery, UnreadCountDto},
    error::HttpError,
    AppState,
};

pub fn notification_handler() -> Router {
    Router::new()
        .route("/users/:user_id", get(notifications_for_user))
        .route("/users/:user_id/unread-count", get(unread_count))
        .route("/users/:user_id/read-all", put(mark_all_as_read))
        .route("/:notification_id/read", put(mark_as_read))
}

pub async fn notifications_for_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<NotificationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let notifications = app_state
        .notification_service
        .notifications_for_user(user_id, params.unread_only)
        .await?;
    Ok(Json(ApiResponse::success("Notifications retrieved successfully", notifications)))
}

pub async fn unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let unread = app_state.notification_service.unread_count(user_id).await?;
    Ok(Json(ApiResponse::success(
        "Unread count retrieved successfully",
        UnreadCountDto { user_id, unread },
    )))
}

pub async fn mark_as_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state.notification_service.mark_as_read(notification_id).await?;
    Ok(Json(ApiResponse::success("Notification marked as read", notification)))
}

pub async fn mark_all_as_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let updated = app_state.notification_service.mark_all_as_read(user_id).await?;
    Ok(Json(ApiResponse::success("Notifications marked as read", updated)))
}
