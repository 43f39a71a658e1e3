use crate::error::Result;
use crate::realtime::MembersHandle;
use crate::tracking::TrackingHandle;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub tracking: TrackingHandle,
    pub members: Option<MembersHandle>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tracking", get(get_tracking))
        .route("/members", get(get_members))
        .route("/alarm/dismiss", post(dismiss_alarm))
        .route("/route/advance", post(advance_route))
        .route("/health", get(health_check))
        .with_state(state)
}

pub async fn run_server(state: AppState, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!(%addr, "starting status server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn get_tracking(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.tracking.snapshot().await)
}

async fn get_members(State(state): State<AppState>) -> impl IntoResponse {
    match &state.members {
        Some(members) => Json(members.snapshot().await).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Member polling disabled").into_response(),
    }
}

async fn dismiss_alarm(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.tracking.dismiss_alarm().await)
}

async fn advance_route(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.tracking.advance_route().await)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
