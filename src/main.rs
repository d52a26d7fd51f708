mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use db::{DBClient, MarketStore, MemoryStore};
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};

use service::{
    admin_service::AdminService,
    application_service::ApplicationService,
    contract_service::ContractService,
    dispute_service::DisputeService,
    job_service::JobService,
    notification_service::NotificationService,
    payment_service::PaymentService,
    review_service::ReviewService,
    skill_service::SkillService,
    user_service::UserService,
    verification_service::VerificationService,
    worker_profile_service::WorkerProfileService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn MarketStore>,
    // Services
    pub notification_service: Arc<NotificationService>,
    pub user_service: Arc<UserService>,
    pub job_service: Arc<JobService>,
    pub application_service: Arc<ApplicationService>,
    pub contract_service: Arc<ContractService>,
    pub payment_service: Arc<PaymentService>,
    pub review_service: Arc<ReviewService>,
    pub dispute_service: Arc<DisputeService>,
    pub admin_service: Arc<AdminService>,
    pub skill_service: Arc<SkillService>,
    pub worker_profile_service: Arc<WorkerProfileService>,
    pub verification_service: Arc<VerificationService>,
}

impl AppState {
    pub fn new(db_client: Arc<dyn MarketStore>, config: Config) -> Self {
        let limits = config.limits.clone();

        let notification_service = Arc::new(NotificationService::new(db_client.clone()));
        let user_service = Arc::new(UserService::new(db_client.clone(), notification_service.clone()));
        let job_service = Arc::new(JobService::new(
            db_client.clone(),
            notification_service.clone(),
            limits.clone(),
        ));
        let application_service = Arc::new(ApplicationService::new(
            db_client.clone(),
            notification_service.clone(),
            limits.clone(),
        ));
        let contract_service = Arc::new(ContractService::new(
            db_client.clone(),
            notification_service.clone(),
            limits.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            db_client.clone(),
            notification_service.clone(),
            limits.clone(),
        ));
        let review_service = Arc::new(ReviewService::new(db_client.clone(), notification_service.clone()));
        let dispute_service = Arc::new(DisputeService::new(
            db_client.clone(),
            notification_service.clone(),
            contract_service.clone(),
        ));
        let admin_service = Arc::new(AdminService::new(db_client.clone()));
        let skill_service = Arc::new(SkillService::new(db_client.clone()));
        let worker_profile_service = Arc::new(WorkerProfileService::new(
            db_client.clone(),
            notification_service.clone(),
            limits,
        ));
        let verification_service = Arc::new(VerificationService::new(
            db_client.clone(),
            notification_service.clone(),
        ));

        Self {
            env: config,
            db_client,
            notification_service,
            user_service,
            job_service,
            application_service,
            contract_service,
            payment_service,
            review_service,
            dispute_service,
            admin_service,
            skill_service,
            worker_profile_service,
            verification_service,
        }
    }
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn MarketStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL is not set; using the in-memory store, data will not persist");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to the database")?;
    tracing::info!(
        "Connected to the database (max connections: {})",
        config.db_max_connections
    );

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(Arc::new(DBClient::new(pool)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let db_client = connect_store(&config).await?;

    let allowed_origins = vec![
        HeaderValue::from_static("http://localhost:5173"),
        HeaderValue::from_static("http://localhost:8000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    let app = create_router(app_state).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    tracing::info!("Server is running on http://localhost:{}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}
