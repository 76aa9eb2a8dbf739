//! Request extractors that fail with [`ApiError`].
//!
//! axum's own `Json`, `Query` and `Path` reject with a plain-text body. These
//! wrappers run the same extraction and turn the rejection into the usual
//! `{ "code": "VALIDATION_ERROR", "message": ... }` response.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);
