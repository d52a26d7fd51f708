// handler/workers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::marketdtos::{
        money, ApiResponse, AvailabilityDto, CreateSkillDto, CreateWorkerProfileDto, ReasonDto,
        SkillQuery, SkillRefDto, VerifyProfileDto, WorkerProfileQuery,
    },
    error::HttpError,
    models::verificationmodels::VerificationStatus,
    AppState,
};

pub fn skills_handler() -> Router {
    Router::new()
        .route("/", post(create_skill).get(list_skills))
        .route("/:skill_id", get(get_skill))
        .route("/:skill_id/verify", put(verify_skill))
        .route("/:skill_id/reject", put(reject_skill))
        .route("/:skill_id/reset", put(reset_skill))
}

pub fn worker_profiles_handler() -> Router {
    Router::new()
        .route("/", post(create_profile).get(search_profiles))
        .route("/:profile_id", get(get_profile))
        .route("/users/:user_id", get(profile_for_user))
        .route("/:profile_id/verify", put(verify_profile))
        .route("/:profile_id/reject", put(reject_profile))
        .route("/:profile_id/availability", put(set_availability))
        .route("/:profile_id/skills", post(add_skill))
        .route("/:profile_id/skills/:skill_id", delete(remove_skill))
        .route("/:profile_id/eligibility", get(can_receive_jobs))
}

// Skill Handlers
pub async fn create_skill(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateSkillDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let skill = if body.verified {
        app_state
            .skill_service
            .create_verified_skill(&body.name, &body.category, body.description.as_deref())
            .await?
    } else {
        app_state
            .skill_service
            .create_skill(&body.name, &body.category, body.description.as_deref())
            .await?
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Skill created", skill))))
}

pub async fn list_skills(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<SkillQuery>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(name) = params.name {
        let skill = app_state
            .skill_service
            .find_by_name(&name)
            .await?
            .ok_or_else(|| HttpError::not_found(format!("Skill '{}' not found", name)))?;
        return Ok(Json(ApiResponse::success("Skill retrieved successfully", vec![skill])));
    }

    let status = params.status.unwrap_or(VerificationStatus::Verified);
    let skills = app_state.skill_service.skills_by_status(status).await?;
    Ok(Json(ApiResponse::success("Skills retrieved successfully", skills)))
}

pub async fn get_skill(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(skill_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let skill = app_state.skill_service.get_skill(skill_id).await?;
    Ok(Json(ApiResponse::success("Skill retrieved successfully", skill)))
}

pub async fn verify_skill(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(skill_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let skill = app_state.skill_service.verify_skill(skill_id).await?;
    Ok(Json(ApiResponse::success("Skill verified", skill)))
}

pub async fn reject_skill(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(skill_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let skill = app_state.skill_service.reject_skill(skill_id).await?;
    Ok(Json(ApiResponse::success("Skill rejected", skill)))
}

pub async fn reset_skill(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(skill_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let skill = app_state.skill_service.reset_skill_verification(skill_id).await?;
    Ok(Json(ApiResponse::success("Skill verification reset", skill)))
}

// Worker Profile Handlers
/// Lists available profiles unless a skill, location or minimum rating is given.
pub async fn search_profiles(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<WorkerProfileQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let profiles = &app_state.worker_profile_service;
    let found = match params {
        WorkerProfileQuery { skill_id: Some(skill_id), .. } => profiles.profiles_by_skill(skill_id).await?,
        WorkerProfileQuery { location: Some(location), .. } => profiles.profiles_by_location(&location).await?,
        WorkerProfileQuery { min_rating: Some(min), .. } => profiles.profiles_by_min_rating(min).await?,
        _ => profiles.available_profiles().await?,
    };
    Ok(Json(ApiResponse::success("Worker profiles retrieved successfully", found)))
}

pub async fn create_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateWorkerProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let hourly_rate = money("Hourly rate", body.hourly_rate)?;

    let profile = app_state
        .worker_profile_service
        .create_profile(
            body.user_id,
            body.bio.as_deref(),
            body.skill_ids,
            body.experience.as_deref(),
            hourly_rate,
            &body.location,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Worker profile created successfully", profile)),
    ))
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state.worker_profile_service.get_profile(profile_id).await?;
    Ok(Json(ApiResponse::success("Worker profile retrieved successfully", profile)))
}

pub async fn profile_for_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .worker_profile_service
        .find_by_user(user_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Worker profile not found"))?;
    Ok(Json(ApiResponse::success("Worker profile retrieved successfully", profile)))
}

pub async fn verify_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
    Json(body): Json<VerifyProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let profile = app_state
        .worker_profile_service
        .verify_profile(profile_id, &body.verification_code)
        .await?;
    Ok(Json(ApiResponse::success("Worker profile verified", profile)))
}

pub async fn reject_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
    Json(body): Json<ReasonDto>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .worker_profile_service
        .reject_profile(profile_id, &body.reason)
        .await?;
    Ok(Json(ApiResponse::success("Worker profile rejected", profile)))
}

pub async fn set_availability(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
    Json(body): Json<AvailabilityDto>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .worker_profile_service
        .set_availability(profile_id, body.availability)
        .await?;
    Ok(Json(ApiResponse::success("Worker availability updated successfully", profile)))
}

pub async fn add_skill(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
    Json(body): Json<SkillRefDto>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .worker_profile_service
        .add_skill(profile_id, body.skill_id)
        .await?;
    Ok(Json(ApiResponse::success("Skill added", profile)))
}

pub async fn remove_skill(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((profile_id, skill_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .worker_profile_service
        .remove_skill(profile_id, skill_id)
        .await?;
    Ok(Json(ApiResponse::success("Skill removed", profile)))
}

pub async fn can_receive_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let eligible = app_state.worker_profile_service.can_receive_jobs(profile_id).await?;
    Ok(Json(ApiResponse::success("Eligibility checked", eligible)))
}
