// handler/rewards.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::rewarddtos::*,
    error::HttpError,
    service::error::{ErrorKind, ServiceError},
    AppState,
};

pub fn rewards_handler() -> Router {
    Router::new()
        .route("/users", post(register_user))
        .route("/referral/use", post(use_referral))
        .route("/referral/:user_id", get(get_referrer_summary))
        .route("/whitelist", post(whitelist_user))
        .route("/quests", get(get_active_quests))
        .route("/quests/:user_id", get(get_user_quests))
        .route("/quest/complete", post(complete_quest))
        .route("/quest-invite/complete", post(complete_invite_quest))
}

/// Logs at a level matching the failure and converts to the response error.
fn service_error(operation: &str, error: ServiceError) -> HttpError {
    match error.kind() {
        ErrorKind::UpstreamUnavailable => tracing::error!("{} failed: {}", operation, error),
        ErrorKind::NotCompleted => tracing::debug!("{}: {}", operation, error),
        _ => tracing::warn!("{} rejected: {}", operation, error),
    }
    error.into()
}

pub async fn register_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let registration = app_state
        .engine
        .register_user(
            &body.external_id,
            body.email,
            body.username,
            body.referral_code.as_deref(),
        )
        .await
        .map_err(|e| service_error("register_user", e))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": registration
    })))
}

pub async fn use_referral(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<UseReferralDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = app_state
        .engine
        .redeem_referral(&body.user_external_id, &body.referral_code)
        .await
        .map_err(|e| service_error("redeem_referral", e))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": outcome
    })))
}

pub async fn get_referrer_summary(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let summary = app_state
        .engine
        .get_referrer_summary(&user_id)
        .await
        .map_err(|e| service_error("get_referrer_summary", e))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": summary
    })))
}

pub async fn whitelist_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<WhitelistDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = app_state
        .engine
        .whitelist(&body.external_id, &body.email)
        .await
        .map_err(|e| service_error("whitelist", e))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": outcome
    })))
}

pub async fn get_active_quests(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let quests = app_state
        .engine
        .list_active_quests()
        .await
        .map_err(|e| service_error("list_active_quests", e))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": quests
    })))
}

pub async fn get_user_quests(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let quests = app_state
        .engine
        .list_active_quests_for_user(&user_id)
        .await
        .map_err(|e| service_error("list_active_quests_for_user", e))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": quests
    })))
}

pub async fn complete_quest(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CompleteQuestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let completion = app_state
        .engine
        .complete_quest(&body.external_id, body.quest_id)
        .await
        .map_err(|e| service_error("complete_quest", e))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": completion
    })))
}

pub async fn complete_invite_quest(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<InviteQuestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = app_state
        .engine
        .advance_invite_tier(&body.external_id)
        .await
        .map_err(|e| service_error("advance_invite_tier", e))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": outcome
    })))
}
