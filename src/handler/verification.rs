// handler/verification.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::marketdtos::{ApiResponse, SubmitVerificationDto},
    error::HttpError,
    AppState,
};

pub fn verification_handler() -> Router {
    Router::new()
        .route("/", post(submit_verification))
        .route("/:verification_id", get(get_verification))
        .route("/:verification_id/approve", put(approve_verification))
        .route("/:verification_id/reject", put(reject_verification))
        .route("/users/:user_id", get(verifications_for_user))
        .route("/users/:user_id/status", get(user_verification_status))
}

pub async fn submit_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SubmitVerificationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let verification = app_state
        .verification_service
        .submit_verification(
            body.user_id,
            body.document_type,
            &body.document_url,
            body.verification_code.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Document submitted for verification", verification)),
    ))
}

pub async fn get_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(verification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let verification = app_state
        .verification_service
        .get_verification(verification_id)
        .await?;
    Ok(Json(ApiResponse::success("Verification retrieved successfully", verification)))
}

pub async fn approve_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(verification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let verification = app_state
        .verification_service
        .approve_verification(verification_id)
        .await?;
    Ok(Json(ApiResponse::success("Document verified", verification)))
}

pub async fn reject_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(verification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let verification = app_state
        .verification_service
        .reject_verification(verification_id)
        .await?;
    Ok(Json(ApiResponse::success("Document rejected", verification)))
}

pub async fn verifications_for_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let verifications = app_state
        .verification_service
        .verifications_for_user(user_id)
        .await?;
    Ok(Json(ApiResponse::success("Verifications retrieved successfully", verifications)))
}

pub async fn user_verification_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let verified = app_state.verification_service.is_user_verified(user_id).await?;
    Ok(Json(ApiResponse::success(
        "Verification status retrieved successfully",
        json!({ "user_id": user_id, "verified": verified }),
    )))
}
