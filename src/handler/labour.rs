// handler/labour.rs
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
        money, ApiResponse, ApplyForJobDto, ContractFilterQuery, CreateContractDto, CreateReviewDto,
        DismissDisputeDto, JobSearchQuery, OpenDisputeDto, PostJobDto, RatingDto, ReasonDto,
        ResolveDisputeDto, SettleContractDto,
    },
    error::HttpError,
    models::labourmodel::ContractStatus,
    AppState,
};

pub fn labour_handler() -> Router {
    Router::new()
        // Jobs
        .route("/jobs", post(post_job).get(open_jobs))
        .route("/jobs/search", get(search_jobs))
        .route("/jobs/:job_id", get(get_job))
        .route("/jobs/:job_id/cancel", put(cancel_job))
        .route("/clients/:client_id/jobs", get(jobs_for_client))
        // Applications
        .route(
            "/jobs/:job_id/applications",
            post(apply_for_job).get(applications_for_job),
        )
        .route("/applications/:application_id", get(get_application))
        .route("/applications/:application_id/accept", put(accept_application))
        .route("/applications/:application_id/reject", put(reject_application))
        .route("/applications/:application_id/withdraw", put(withdraw_application))
        .route("/workers/:worker_id/applications", get(applications_for_worker))
        // Contracts
        .route("/contracts", post(create_contract).get(list_contracts))
        .route("/contracts/overdue", get(overdue_contracts))
        .route("/contracts/:contract_id", get(get_contract))
        .route("/contracts/:contract_id/complete", put(complete_contract))
        .route("/contracts/:contract_id/cancel", put(cancel_contract))
        .route("/contracts/:contract_id/settle", put(settle_contract))
        .route("/contracts/:contract_id/reviews", get(reviews_for_contract))
        .route("/contracts/:contract_id/disputes", get(disputes_for_contract))
        // Reviews
        .route("/reviews", post(create_review))
        .route("/reviews/:review_id", delete(delete_review))
        .route("/users/:user_id/reviews", get(reviews_for_user))
        .route("/users/:user_id/rating", get(rating_for_user))
        // Disputes
        .route("/disputes", post(open_dispute).get(open_disputes))
        .route("/disputes/:dispute_id", get(get_dispute))
        .route("/disputes/:dispute_id/resolve", put(resolve_dispute))
        .route("/disputes/:dispute_id/dismiss", put(dismiss_dispute))
}

// Job Handlers
pub async fn post_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<PostJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let budget = money("Budget", body.budget)?;

    let job = app_state
        .job_service
        .post_job(
            body.client_id,
            &body.title,
            &body.description,
            &body.category,
            budget,
            &body.location,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Job posted successfully", job))))
}

pub async fn open_jobs(Extension(app_state): Extension<Arc<AppState>>) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.open_jobs().await?;
    Ok(Json(ApiResponse::success("Open jobs retrieved successfully", jobs)))
}

pub async fn search_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<JobSearchQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = &app_state.job_service;
    let found = match params {
        JobSearchQuery { keyword: Some(keyword), .. } => jobs.search_jobs(&keyword).await?,
        JobSearchQuery { category: Some(category), .. } => jobs.jobs_by_category(&category).await?,
        JobSearchQuery { location: Some(location), .. } => jobs.jobs_by_location(&location).await?,
        JobSearchQuery {
            min_budget: Some(min),
            max_budget: Some(max),
            ..
        } => {
            let min = money("Minimum budget", min)?;
            let max = money("Maximum budget", max)?;
            jobs.jobs_by_budget_range(&min, &max).await?
        }
        _ => {
            return Err(HttpError::bad_request(
                "Provide a keyword, category, location or both budget bounds",
            ))
        }
    };
    Ok(Json(ApiResponse::success("Jobs retrieved successfully", found)))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.get_job(job_id).await?;
    Ok(Json(ApiResponse::success("Job retrieved successfully", job)))
}

pub async fn cancel_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.cancel_job(job_id).await?;
    Ok(Json(ApiResponse::success("Job cancelled", job)))
}

pub async fn jobs_for_client(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.jobs_for_client(client_id).await?;
    Ok(Json(ApiResponse::success("Client jobs retrieved successfully", jobs)))
}

// Application Handlers
pub async fn apply_for_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<ApplyForJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let expected_pay = body
        .expected_pay
        .map(|pay| money("Expected pay", pay))
        .transpose()?;

    let application = app_state
        .application_service
        .apply_for_job(job_id, body.worker_id, body.cover_letter.as_deref(), expected_pay)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Application submitted successfully", application)),
    ))
}

pub async fn applications_for_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state.application_service.applications_for_job(job_id).await?;
    Ok(Json(ApiResponse::success("Applications retrieved successfully", applications)))
}

pub async fn applications_for_worker(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(worker_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state
        .application_service
        .applications_for_worker(worker_id)
        .await?;
    Ok(Json(ApiResponse::success("Applications retrieved successfully", applications)))
}

pub async fn get_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state.application_service.get_application(application_id).await?;
    Ok(Json(ApiResponse::success("Application retrieved successfully", application)))
}

pub async fn accept_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .application_service
        .accept_application(application_id)
        .await?;
    Ok(Json(ApiResponse::success("Application accepted", application)))
}

pub async fn reject_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
    Json(body): Json<ReasonDto>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .application_service
        .reject_application(application_id, &body.reason)
        .await?;
    Ok(Json(ApiResponse::success("Application rejected", application)))
}

pub async fn withdraw_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .application_service
        .withdraw_application(application_id)
        .await?;
    Ok(Json(ApiResponse::success("Application withdrawn", application)))
}

// Contract Handlers
pub async fn create_contract(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateContractDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let agreed_pay = money("Agreed pay", body.agreed_pay)?;

    let contract = app_state
        .contract_service
        .create_contract(
            body.job_id,
            body.client_id,
            body.worker_id,
            body.start_date,
            body.end_date,
            agreed_pay,
            body.terms.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Contract created successfully", contract)),
    ))
}

pub async fn list_contracts(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<ContractFilterQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let contracts = match (params.user_id, params.status) {
        (Some(user_id), status) => {
            let contracts = app_state.contract_service.contracts_for_user(user_id).await?;
            match status {
                Some(status) => contracts.into_iter().filter(|c| c.status == status).collect(),
                None => contracts,
            }
        }
        (None, status) => {
            app_state
                .contract_service
                .contracts_by_status(status.unwrap_or(ContractStatus::Active))
                .await?
        }
    };
    Ok(Json(ApiResponse::success("Contracts retrieved successfully", contracts)))
}

pub async fn overdue_contracts(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let contracts = app_state.contract_service.overdue_contracts().await?;
    Ok(Json(ApiResponse::success("Overdue contracts retrieved successfully", contracts)))
}

pub async fn get_contract(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let contract = app_state.contract_service.get_contract(contract_id).await?;
    Ok(Json(ApiResponse::success("Contract retrieved successfully", contract)))
}

pub async fn complete_contract(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let contract = app_state.contract_service.complete_contract(contract_id).await?;
    Ok(Json(ApiResponse::success("Contract completed", contract)))
}

pub async fn cancel_contract(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
    Json(body): Json<ReasonDto>,
) -> Result<impl IntoResponse, HttpError> {
    let contract = app_state
        .contract_service
        .cancel_contract(contract_id, &body.reason)
        .await?;
    Ok(Json(ApiResponse::success("Contract cancelled", contract)))
}

pub async fn settle_contract(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
    Json(body): Json<SettleContractDto>,
) -> Result<impl IntoResponse, HttpError> {
    let contract = app_state
        .contract_service
        .settle_disputed_contract(contract_id, body.outcome)
        .await?;
    Ok(Json(ApiResponse::success("Disputed contract settled", contract)))
}

// Review Handlers
pub async fn create_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let review = app_state
        .review_service
        .create_review(
            body.contract_id,
            body.reviewer_id,
            body.reviewed_id,
            body.rating,
            body.comment.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Review posted successfully", review))))
}

pub async fn delete_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(review_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let review = app_state.review_service.delete_review(review_id).await?;
    Ok(Json(ApiResponse::success("Review deleted", review)))
}

pub async fn reviews_for_contract(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state.review_service.reviews_for_contract(contract_id).await?;
    Ok(Json(ApiResponse::success("Reviews retrieved successfully", reviews)))
}

pub async fn reviews_for_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state.review_service.reviews_for_user(user_id).await?;
    Ok(Json(ApiResponse::success("Reviews retrieved successfully", reviews)))
}

pub async fn rating_for_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let review_count = app_state.review_service.reviews_for_user(user_id).await?.len();
    let average_rating = app_state.review_service.average_rating_for_user(user_id).await?;

    Ok(Json(ApiResponse::success(
        "Rating retrieved successfully",
        RatingDto {
            user_id,
            average_rating,
            review_count,
        },
    )))
}

// Dispute Handlers
pub async fn open_dispute(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<OpenDisputeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let dispute = app_state
        .dispute_service
        .open_dispute(body.contract_id, body.opened_by, &body.reason)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Dispute opened", dispute))))
}

pub async fn open_disputes(Extension(app_state): Extension<Arc<AppState>>) -> Result<impl IntoResponse, HttpError> {
    let disputes = app_state.dispute_service.open_disputes().await?;
    Ok(Json(ApiResponse::success("Open disputes retrieved successfully", disputes)))
}

pub async fn get_dispute(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(dispute_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let dispute = app_state.dispute_service.get_dispute(dispute_id).await?;
    Ok(Json(ApiResponse::success("Dispute retrieved successfully", dispute)))
}

pub async fn disputes_for_contract(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let disputes = app_state.dispute_service.disputes_for_contract(contract_id).await?;
    Ok(Json(ApiResponse::success("Disputes retrieved successfully", disputes)))
}

pub async fn resolve_dispute(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(dispute_id): Path<Uuid>,
    Json(body): Json<ResolveDisputeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let dispute = app_state
        .dispute_service
        .resolve_dispute(dispute_id, &body.resolution_details, body.resolved_by)
        .await?;
    Ok(Json(ApiResponse::success("Dispute resolved", dispute)))
}

pub async fn dismiss_dispute(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(dispute_id): Path<Uuid>,
    Json(body): Json<DismissDisputeDto>,
) -> Result<impl IntoResponse, HttpError> {
    let dispute = app_state
        .dispute_service
        .dismiss_dispute(dispute_id, body.dismissed_by)
        .await?;
    Ok(Json(ApiResponse::success("Dispute dismissed", dispute)))
}
