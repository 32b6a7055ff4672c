//! # HTTP Mapping
//!
//! Converts endpoint outcomes into axum responses. A [`StructuredError`] is
//! sent with its own status and its serialized record as the JSON body; a
//! fatal [`SchemaError`] is logged and reported as a `500`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fastep_core::{Outcome, StructuredError};
use fastep_schema::SchemaError;
use tracing::error;

/// A [`StructuredError`] on its way to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse(pub StructuredError);

impl From<StructuredError> for ErrorResponse {
    fn from(error: StructuredError) -> Self {
        Self(error)
    }
}

impl From<SchemaError> for ErrorResponse {
    fn from(err: SchemaError) -> Self {
        error!(error = %err, "schema configuration error");
        Self(StructuredError::internal(err.to_string()))
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

/// Map the result of [`Endpoint::call`](crate::Endpoint::call) to a
/// response: `200` with the data, or the error's status and record.
pub fn into_response(result: Result<Outcome, SchemaError>) -> Response {
    match result {
        Ok(Ok(data)) => (StatusCode::OK, Json(data)).into_response(),
        Ok(Err(rejected)) => ErrorResponse(rejected).into_response(),
        Err(fatal) => ErrorResponse::from(fatal).into_response(),
    }
}
