//! Sales commissions: listing, per-user totals and payout.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tripdesk_core::{Commission, CommissionFilter, CommissionSummary};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AppPath, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/commissions", get(list_commissions))
        .route("/commissions/summary", get(commission_summary))
        .route("/commissions/{id}", get(get_commission))
        .route("/commissions/{id}/pay", post(pay_commission))
}

#[derive(Debug, Default, Deserialize)]
struct SummaryQuery {
    #[serde(default)]
    user_id: Option<String>,
}

async fn list_commissions(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<CommissionFilter>,
) -> ApiResult<Json<Vec<Commission>>> {
    Ok(Json(state.db.commissions().list(&filter).await?))
}

async fn commission_summary(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SummaryQuery>,
) -> ApiResult<Json<Vec<CommissionSummary>>> {
    let user_id = query.user_id.as_deref().filter(|id| !id.trim().is_empty());
    Ok(Json(state.db.commissions().summary(user_id).await?))
}

async fn get_commission(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> ApiResult<Json<Commission>> {
    state
        .db
        .commissions()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Commission", &id))
}

async fn pay_commission(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> ApiResult<Json<Commission>> {
    Ok(Json(state.db.commissions().mark_paid(&id).await?))
}
