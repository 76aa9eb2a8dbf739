//! # Booking Routes
//!
//! ## Booking Form Flow
//! ```text
//! Agent fills form ──► POST /bookings/quote ──► total + expected first payment
//!        │
//!        ▼
//! Agent submits ─────► POST /bookings ────────► 201 BookingDetail
//!        │                                      (or 400 on ratio mismatch)
//!        ▼
//! Later installments ► POST /bookings/{id}/payments
//!        │
//!        ▼
//! Fully paid ────────► commission appears on GET /bookings/{id}
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tripdesk_core::pricing::{PriceBreakdown, PriceInputs};
use tripdesk_core::{
    Booking, BookingDetail, BookingExtras, BookingFilter, BookingPayment, BookingUpdate, CoreError,
    Money, NewBooking, NewPayment, PaymentRatio, PaymentStatus,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/quote", post(quote_booking))
        .route(
            "/bookings/{id}",
            get(get_booking).patch(update_booking).delete(delete_booking),
        )
        .route("/bookings/{id}/payments", get(list_payments).post(record_payment))
        .route("/bookings/{id}/status", put(set_payment_status))
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub trip_id: String,
    #[serde(default)]
    pub extras: BookingExtras,
    #[serde(default)]
    pub discount_cents: i64,
    pub payment_ratio: PaymentRatio,
}

/// Price preview for the booking form.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub price: PriceBreakdown,
    pub payment_ratio: PaymentRatio,
    pub first_payment: Money,
}

#[derive(Debug, Deserialize)]
struct PaymentStatusChange {
    status: PaymentStatus,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_bookings(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<BookingFilter>,
) -> ApiResult<Json<Vec<Booking>>> {
    Ok(Json(state.db.bookings().list_bookings(&filter).await?))
}

/// Prices a booking without saving it. Uses the same rules as creation.
async fn quote_booking(
    State(state): State<AppState>,
    AppJson(request): AppJson<QuoteRequest>,
) -> ApiResult<Json<QuoteResponse>> {
    let trip = state
        .db
        .trips()
        .get_by_id(&request.trip_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Trip", &request.trip_id))?;
    if !trip.is_active {
        return Err(CoreError::TripInactive(trip.id).into());
    }

    let price = PriceInputs::new(
        trip.base_price(),
        request.extras,
        Money::from_cents(request.discount_cents),
    )
    .calculate()?;

    Ok(Json(QuoteResponse {
        first_payment: request.payment_ratio.first_payment(price.total),
        payment_ratio: request.payment_ratio,
        price,
    }))
}

async fn create_booking(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewBooking>,
) -> ApiResult<(StatusCode, Json<BookingDetail>)> {
    let detail = state.db.bookings().create_booking(new).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> ApiResult<Json<BookingDetail>> {
    state
        .db
        .bookings()
        .get_booking_detail(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Booking", &id))
}

async fn update_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(update): AppJson<BookingUpdate>,
) -> ApiResult<Json<BookingDetail>> {
    Ok(Json(state.db.bookings().update_booking(&id, update).await?))
}

async fn delete_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> ApiResult<StatusCode> {
    state.db.bookings().delete_booking(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_payments(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> ApiResult<Json<Vec<BookingPayment>>> {
    let bookings = state.db.bookings();
    if bookings.get_by_id(&id).await?.is_none() {
        return Err(ApiError::not_found("Booking", &id));
    }
    Ok(Json(bookings.payments(&id).await?))
}

async fn record_payment(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(payment): AppJson<NewPayment>,
) -> ApiResult<(StatusCode, Json<BookingDetail>)> {
    let detail = state.db.bookings().record_payment(&id, payment).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn set_payment_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(change): AppJson<PaymentStatusChange>,
) -> ApiResult<Json<BookingDetail>> {
    Ok(Json(
        state
            .db
            .bookings()
            .set_payment_status(&id, change.status)
            .await?,
    ))
}
