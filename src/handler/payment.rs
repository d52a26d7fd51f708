// handler/payment.rs
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
    dtos::marketdtos::{money, ApiResponse, CreatePaymentDto, PaymentStatusQuery, PaymentTotalDto, ReasonDto},
    error::HttpError,
    models::paymentmodels::PaymentMethod,
    utils::decimal::BigDecimalHelpers,
    AppState,
};

pub fn payment_handler() -> Router {
    Router::new()
        .route("/", post(create_payment).get(payments_by_status))
        .route("/totals", get(total_by_status))
        .route("/contracts/:contract_id", get(payments_for_contract))
        .route("/clients/:client_id", get(payments_for_client))
        .route("/workers/:worker_id", get(payments_for_worker))
        .route("/:payment_id", get(get_payment).delete(delete_payment))
        .route("/:payment_id/process", put(process_payment))
        .route("/:payment_id/release", put(release_payment))
        .route("/:payment_id/refund", put(refund_payment))
}

pub async fn create_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreatePaymentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let amount = money("Payment amount", body.amount)?;

    let payment = if body.escrow {
        app_state
            .payment_service
            .create_escrow_payment(body.contract_id, amount)
            .await?
    } else {
        let method = body.method.unwrap_or(PaymentMethod::Card);
        app_state
            .payment_service
            .create_payment(body.contract_id, amount, method)
            .await?
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Payment created", payment))))
}

pub async fn get_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state.payment_service.get_payment(payment_id).await?;
    Ok(Json(ApiResponse::success("Payment retrieved successfully", payment)))
}

pub async fn payments_for_contract(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state.payment_service.payments_for_contract(contract_id).await?;
    Ok(Json(ApiResponse::success("Payments retrieved successfully", payments)))
}

pub async fn payments_for_client(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state.payment_service.payments_for_client(client_id).await?;
    Ok(Json(ApiResponse::success("Client payments retrieved successfully", payments)))
}

pub async fn payments_for_worker(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(worker_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state.payment_service.payments_for_worker(worker_id).await?;
    Ok(Json(ApiResponse::success("Worker payments retrieved successfully", payments)))
}

pub async fn payments_by_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<PaymentStatusQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state.payment_service.payments_by_status(params.status).await?;
    Ok(Json(ApiResponse::success("Payments retrieved successfully", payments)))
}

pub async fn total_by_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<PaymentStatusQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let total = app_state
        .payment_service
        .total_amount_by_status(params.status)
        .await?;
    Ok(Json(ApiResponse::success(
        "Payment total retrieved successfully",
        PaymentTotalDto {
            status: params.status,
            total: total.to_f64_or_zero(),
        },
    )))
}

pub async fn process_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state.payment_service.process_payment(payment_id).await?;
    Ok(Json(ApiResponse::success("Payment moved to escrow", payment)))
}

pub async fn release_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state.payment_service.release_payment(payment_id).await?;
    Ok(Json(ApiResponse::success("Payment released", payment)))
}

pub async fn refund_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
    Json(body): Json<ReasonDto>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state
        .payment_service
        .refund_payment(payment_id, &body.reason)
        .await?;
    Ok(Json(ApiResponse::success("Payment refunded", payment)))
}

pub async fn delete_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.payment_service.delete_payment(payment_id).await?;
    Ok(Json(ApiResponse::success("Payment deleted", payment_id)))
}
