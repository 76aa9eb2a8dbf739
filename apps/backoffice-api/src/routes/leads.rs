//! Sales pipeline leads and their conversion into customers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tripdesk_core::{Lead, LeadFilter, LeadStatus, LeadUpdate, NewLead};
use tripdesk_db::LeadConversion;

use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads).post(create_lead))
        .route("/leads/{id}", get(get_lead).patch(update_lead).delete(delete_lead))
        .route("/leads/{id}/status", put(set_lead_status))
        .route("/leads/{id}/convert", post(convert_lead))
}

#[derive(Debug, Deserialize)]
struct LeadStatusChange {
    status: LeadStatus,
}

async fn list_leads(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<LeadFilter>,
) -> ApiResult<Json<Vec<Lead>>> {
    Ok(Json(state.db.leads().list(&filter).await?))
}

async fn create_lead(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewLead>,
) -> ApiResult<(StatusCode, Json<Lead>)> {
    let lead = state.db.leads().insert(&new).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

async fn get_lead(State(state): State<AppState>, AppPath(id): AppPath<String>) -> ApiResult<Json<Lead>> {
    state
        .db
        .leads()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Lead", &id))
}

async fn update_lead(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(update): AppJson<LeadUpdate>,
) -> ApiResult<Json<Lead>> {
    Ok(Json(state.db.leads().update(&id, update).await?))
}

async fn delete_lead(State(state): State<AppState>, AppPath(id): AppPath<String>) -> ApiResult<StatusCode> {
    state.db.leads().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_lead_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(change): AppJson<LeadStatusChange>,
) -> ApiResult<Json<Lead>> {
    Ok(Json(state.db.leads().update_status(&id, change.status).await?))
}

async fn convert_lead(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> ApiResult<(StatusCode, Json<LeadConversion>)> {
    let conversion = state.db.leads().convert_to_customer(&id).await?;
    Ok((StatusCode::CREATED, Json(conversion)))
}
