use crate::error::ShiftError;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Handler error: a domain failure, or a blocking task that never returned.
#[derive(Debug)]
pub enum ApiError {
    Shift(ShiftError),
    Internal(String),
}

impl From<ShiftError> for ApiError {
    fn from(err: ShiftError) -> Self {
        ApiError::Shift(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Shift(ShiftError::Schema(err))
    }
}

#[must_use]
pub fn error_status(err: &ShiftError) -> StatusCode {
    match err {
        ShiftError::NotFound { .. } => StatusCode::NOT_FOUND,
        ShiftError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ShiftError::Busy | ShiftError::NotStaged(_) => StatusCode::CONFLICT,
        ShiftError::EngineFailed { .. } | ShiftError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ShiftError::DuplicateKey { .. }
        | ShiftError::UnknownKey { .. }
        | ShiftError::DuplicateEntry { .. }
        | ShiftError::InvalidPermutation { .. }
        | ShiftError::InvalidYear(_)
        | ShiftError::InvalidMonth(_)
        | ShiftError::InvalidBand { .. }
        | ShiftError::InvalidConstraint { .. }
        | ShiftError::InvalidName { .. }
        | ShiftError::Schema(_) => StatusCode::BAD_REQUEST,
    }
}

fn error_details(err: &ShiftError) -> Value {
    match err {
        ShiftError::ValidationFailed(violations) => json!({ "violations": violations }),
        ShiftError::EngineFailed {
            step,
            exit_code,
            stderr,
            stdout,
        } => json!({
            "step": step,
            "exitCode": exit_code,
            "stderr": stderr,
            "stdout": stdout,
        }),
        ShiftError::NotFound { what, name } => json!({ "what": what, "name": name }),
        ShiftError::InvalidName { name, reason } => json!({ "name": name, "reason": reason }),
        ShiftError::Schema(err) => json!({ "line": err.line(), "column": err.column() }),
        _ => json!({}),
    }
}

/// `{"error": {"kind", "message", "details"}}`
#[must_use]
pub fn error_body(err: &ShiftError) -> Value {
    json!({
        "error": {
            "kind": err.kind(),
            "message": err.to_string(),
            "details": error_details(err),
        }
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Shift(err) => {
                let status = error_status(&err);
                if status.is_server_error() {
                    tracing::warn!(kind = err.kind(), error = %err, "request failed");
                } else {
                    tracing::debug!(kind = err.kind(), error = %err, "request rejected");
                }
                let mut resp = (status, Json(error_body(&err))).into_response();
                if matches!(err, ShiftError::Busy) {
                    resp.headers_mut()
                        .insert("retry-after", HeaderValue::from_static("5"));
                }
                resp
            }
            ApiError::Internal(message) => {
                tracing::warn!(error = %message, "internal error");
                let body = json!({
                    "error": { "kind": "Internal", "message": message, "details": {} }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
