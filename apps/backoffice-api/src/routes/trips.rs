//! Trip catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tripdesk_core::{NewTrip, Trip, TripFilter, TripUpdate};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route("/trips/{id}", get(get_trip).patch(update_trip).delete(delete_trip))
}

async fn list_trips(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<TripFilter>,
) -> ApiResult<Json<Vec<Trip>>> {
    Ok(Json(state.db.trips().list(&filter).await?))
}

async fn create_trip(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewTrip>,
) -> ApiResult<(StatusCode, Json<Trip>)> {
    let trip = state.db.trips().insert(&new).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(State(state): State<AppState>, AppPath(id): AppPath<String>) -> ApiResult<Json<Trip>> {
    state
        .db
        .trips()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Trip", &id))
}

async fn update_trip(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(update): AppJson<TripUpdate>,
) -> ApiResult<Json<Trip>> {
    Ok(Json(state.db.trips().update(&id, update).await?))
}

async fn delete_trip(State(state): State<AppState>, AppPath(id): AppPath<String>) -> ApiResult<StatusCode> {
    state.db.trips().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
