//! # HTTP Routes
//!
//! One module per resource. Every handler is a thin adapter: extract the
//! request, call one repository method, return JSON.
//!
//! ## Route Map
//! ```text
//! /health                                   GET     liveness + database ping
//! /api/v1/customers                         GET     POST
//! /api/v1/customers/{id}                    GET     PATCH   DELETE
//! /api/v1/trips                             GET     POST
//! /api/v1/trips/{id}                        GET     PATCH   DELETE
//! /api/v1/users                             GET     POST
//! /api/v1/users/{id}                        GET     PATCH   DELETE (deactivate)
//! /api/v1/leads                             GET     POST
//! /api/v1/leads/{id}                        GET     PATCH   DELETE
//! /api/v1/leads/{id}/status                 PUT
//! /api/v1/leads/{id}/convert                POST
//! /api/v1/bookings                          GET     POST
//! /api/v1/bookings/quote                    POST
//! /api/v1/bookings/{id}                     GET     PATCH   DELETE
//! /api/v1/bookings/{id}/payments            GET     POST
//! /api/v1/bookings/{id}/status              PUT
//! /api/v1/commissions                       GET
//! /api/v1/commissions/summary               GET
//! /api/v1/commissions/{id}                  GET
//! /api/v1/commissions/{id}/pay              POST
//! ```

use axum::Router;

use crate::state::AppState;

pub mod bookings;
pub mod commissions;
pub mod customers;
pub mod health;
pub mod leads;
pub mod trips;
pub mod users;

/// Resource routes mounted under `/api/v1`.
pub fn api_v1() -> Router<AppState> {
    Router::new()
        .merge(customers::router())
        .merge(trips::router())
        .merge(users::router())
        .merge(leads::router())
        .merge(bookings::router())
        .merge(commissions::router())
}
