// Shared fixtures for service tests.
use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::types::BigDecimal;
use tracing_subscriber::filter::LevelFilter;
use uuid::Uuid;

use crate::{
    config::{Config, PlatformLimits},
    db::MemoryStore,
    models::{
        labourmodel::{Contract, Job},
        usermodel::{Mode, Role, User},
    },
    AppState,
};

pub const COVER_LETTER: &str = "I have painted over forty homes in the area.";
pub const DISPUTE_REASON: &str = "The work stopped halfway and nobody answers calls.";

pub fn app() -> (Arc<MemoryStore>, AppState) {
    app_on(MemoryStore::new())
}

pub fn app_on(store: MemoryStore) -> (Arc<MemoryStore>, AppState) {
    let store = Arc::new(store);
    let config = Config {
        database_url: None,
        port: 0,
        db_max_connections: 1,
        log_level: LevelFilter::OFF,
        limits: PlatformLimits::default(),
    };
    let state = AppState::new(store.clone(), config);
    (store, state)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub async fn register(state: &AppState, first_name: &str, roles: Vec<Role>, mode: Mode) -> User {
    let email = format!("{}.{}@example.com", first_name.to_lowercase(), Uuid::new_v4().simple());
    state
        .user_service
        .register_user(first_name, "Tester", &email, None, roles, mode)
        .await
        .unwrap()
}

pub async fn client(state: &AppState) -> User {
    register(state, "Client", vec![Role::Client], Mode::Client).await
}

pub async fn worker(state: &AppState) -> User {
    register(state, "Worker", vec![Role::Worker], Mode::Worker).await
}

pub async fn open_job(state: &AppState, client: &User) -> Job {
    state
        .job_service
        .post_job(
            client.id,
            "Paint a two bedroom flat",
            "Interior walls, two coats, paint supplied by the client.",
            "painting",
            BigDecimal::from(5000),
            "Cape Town",
        )
        .await
        .unwrap()
}

/// Client, worker, the job (now assigned) and an active contract between them.
pub async fn active_contract(state: &AppState) -> (User, User, Job, Contract) {
    let client = client(state).await;
    let worker = worker(state).await;
    let job = open_job(state, &client).await;
    let contract = state
        .contract_service
        .create_contract(
            job.id,
            client.id,
            worker.id,
            date(2026, 6, 1),
            Some(date(2026, 6, 30)),
            BigDecimal::from(4500),
            Some("Two coats, client supplies paint"),
        )
        .await
        .unwrap();
    (client, worker, job, contract)
}

pub async fn completed_contract(state: &AppState) -> (User, User, Job, Contract) {
    let (client, worker, job, contract) = active_contract(state).await;
    let contract = state.contract_service.complete_contract(contract.id).await.unwrap();
    (client, worker, job, contract)
}
