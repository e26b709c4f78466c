//! Request extractors that answer with [`ApiError`] bodies

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body
///
/// Same as `axum::Json`, except a missing field, a type mismatch or
/// unparseable JSON is a 400 with an `{"error"}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters, rejected the same way as [`JsonBody`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);
