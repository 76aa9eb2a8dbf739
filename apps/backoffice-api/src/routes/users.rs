//! Staff accounts. Deleting a user deactivates it so its bookings and
//! commissions keep their owner.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tripdesk_core::{ListParams, NewUser, User, UserUpdate};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(deactivate_user),
        )
}

async fn list_users(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().list(&params).await?))
}

async fn create_user(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.db.users().insert(&new).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(State(state): State<AppState>, AppPath(id): AppPath<String>) -> ApiResult<Json<User>> {
    state
        .db
        .users()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User", &id))
}

async fn update_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(update): AppJson<UserUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.db.users().update(&id, update).await?))
}

async fn deactivate_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> ApiResult<StatusCode> {
    state.db.users().deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
