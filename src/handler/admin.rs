// handler/admin.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::marketdtos::{AdminKind, ApiResponse, CreateAdminDto, LogActionDto, PermissionDto},
    error::HttpError,
    models::usermodel::Permission,
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/", post(create_admin))
        .route("/:admin_id", get(get_admin))
        .route("/users/:user_id", get(admin_for_user))
        .route("/:admin_id/permissions", post(add_permission))
        .route("/:admin_id/permissions/:permission", delete(remove_permission))
        .route("/:admin_id/actions", post(log_action))
        .route("/permissions/:permission", get(admins_with_permission))
}

pub async fn create_admin(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateAdminDto>,
) -> Result<impl IntoResponse, HttpError> {
    let admin = match body.kind {
        AdminKind::Super => app_state.admin_service.create_super_admin(body.user_id).await?,
        AdminKind::SkillVerifier => app_state.admin_service.create_skill_verifier(body.user_id).await?,
        AdminKind::Custom => {
            app_state
                .admin_service
                .create_custom_admin(body.user_id, body.permissions)
                .await?
        }
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Admin created", admin))))
}

pub async fn get_admin(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(admin_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let admin = app_state.admin_service.get_admin(admin_id).await?;
    Ok(Json(ApiResponse::success("Admin retrieved successfully", admin)))
}

pub async fn admin_for_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let admin = app_state
        .admin_service
        .find_by_user(user_id)
        .await?
        .ok_or_else(|| HttpError::not_found("User is not an admin"))?;
    Ok(Json(ApiResponse::success("Admin retrieved successfully", admin)))
}

pub async fn add_permission(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(admin_id): Path<Uuid>,
    Json(body): Json<PermissionDto>,
) -> Result<impl IntoResponse, HttpError> {
    let admin = app_state
        .admin_service
        .add_permission(admin_id, body.permission)
        .await?;
    Ok(Json(ApiResponse::success("Permission granted", admin)))
}

pub async fn remove_permission(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((admin_id, permission)): Path<(Uuid, Permission)>,
) -> Result<impl IntoResponse, HttpError> {
    let admin = app_state
        .admin_service
        .remove_permission(admin_id, permission)
        .await?;
    Ok(Json(ApiResponse::success("Permission revoked", admin)))
}

pub async fn log_action(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(admin_id): Path<Uuid>,
    Json(body): Json<LogActionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let admin = app_state.admin_service.log_action(admin_id, &body.action).await?;
    Ok(Json(ApiResponse::success("Action logged", admin)))
}

pub async fn admins_with_permission(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(permission): Path<Permission>,
) -> Result<impl IntoResponse, HttpError> {
    let admins = app_state.admin_service.admins_with_permission(permission).await?;
    Ok(Json(ApiResponse::success("Admins retrieved successfully", admins)))
}
