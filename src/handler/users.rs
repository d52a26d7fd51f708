// handler/users.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::marketdtos::{ApiResponse, ReasonDto, RegisterUserDto, SwitchModeDto, UserStatusQuery},
    error::HttpError,
    models::usermodel::UserStatus,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/", post(register_user).get(list_users))
        .route("/:user_id", get(get_user))
        .route("/:user_id/mode", put(switch_mode))
        .route("/:user_id/suspend", put(suspend_user))
        .route("/:user_id/activate", put(activate_user))
        .route("/:user_id/deactivate", put(deactivate_user))
}

pub async fn register_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let user = app_state
        .user_service
        .register_user(
            &body.first_name,
            &body.last_name,
            &body.email,
            body.phone_number.as_deref(),
            body.roles,
            body.current_mode,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User registered successfully", user)),
    ))
}

pub async fn list_users(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<UserStatusQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let status = params.status.unwrap_or(UserStatus::Active);
    let users = app_state.user_service.users_by_status(status).await?;
    Ok(Json(ApiResponse::success("Users retrieved successfully", users)))
}

pub async fn get_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.user_service.get_user(user_id).await?;
    Ok(Json(ApiResponse::success("User retrieved successfully", user)))
}

pub async fn switch_mode(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SwitchModeDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.user_service.switch_mode(user_id, body.mode).await?;
    Ok(Json(ApiResponse::success("Mode switched successfully", user)))
}

pub async fn suspend_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<ReasonDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.user_service.suspend_user(user_id, &body.reason).await?;
    Ok(Json(ApiResponse::success("User suspended", user)))
}

pub async fn activate_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.user_service.activate_user(user_id).await?;
    Ok(Json(ApiResponse::success("User activated", user)))
}

pub async fn deactivate_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.user_service.deactivate_user(user_id).await?;
    Ok(Json(ApiResponse::success("User deactivated", user)))
}
