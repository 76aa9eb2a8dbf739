//! Customer records.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tripdesk_core::{Customer, CustomerUpdate, ListParams, NewCustomer};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
}

async fn list_customers(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list(&params).await?))
}

async fn create_customer(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().insert(&new).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> ApiResult<Json<Customer>> {
    state
        .db
        .customers()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Customer", &id))
}

async fn update_customer(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(update): AppJson<CustomerUpdate>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().update(&id, update).await?))
}

async fn delete_customer(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> ApiResult<StatusCode> {
    state.db.customers().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
