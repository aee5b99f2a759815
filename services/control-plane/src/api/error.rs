//! HTTP error mapping.
//!
//! Failures are encoded as a status code plus a JSON body
//! `{"detail": "..."}`. Validation, scheduling, and worker-reported errors
//! keep their message intact; transport-level faults surface as a generic
//! gateway failure so broker internals never leak to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::bridge::BridgeError;
use crate::orchestrator::Error;
use crate::store::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, detail)
    }

    pub fn gateway_timeout(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Validation(detail) => ApiError::bad_request(detail),
            Error::NotFound => ApiError::not_found("container not found"),
            Error::Scheduling(e) => ApiError::conflict(e.to_string()),
            Error::Operation { message, .. } => {
                let detail = if message.is_empty() {
                    "operation rejected by worker".to_string()
                } else {
                    message
                };
                ApiError::bad_request(detail)
            }
            Error::Bridge(BridgeError::Timeout(_)) => {
                ApiError::gateway_timeout("worker did not reply in time")
            }
            Error::Bridge(e) => ApiError::bad_gateway(e.to_string()),
            Error::Storage(_) => ApiError::internal("storage failure"),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::not_found("not found"),
            StoreError::Backend(_) => ApiError::internal("storage failure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ScheduleError;
    use pylon_wire::TransportError;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case::validation(
        Error::Validation("field 'command' must not be empty".into()),
        StatusCode::BAD_REQUEST
    )]
    #[case::not_found(Error::NotFound, StatusCode::NOT_FOUND)]
    #[case::scheduling(
        Error::Scheduling(ScheduleError::NoEligibleHost),
        StatusCode::CONFLICT
    )]
    #[case::operation(
        Error::Operation { status: 1, message: "no space".into() },
        StatusCode::BAD_REQUEST
    )]
    #[case::timeout(
        Error::Bridge(BridgeError::Timeout(Duration::from_secs(2))),
        StatusCode::GATEWAY_TIMEOUT
    )]
    #[case::transport(
        Error::Bridge(BridgeError::Transport(TransportError::Closed)),
        StatusCode::BAD_GATEWAY
    )]
    #[case::storage(Error::Storage("disk on fire".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_mapping(#[case] error: Error, #[case] expected: StatusCode) {
        let api: ApiError = error.into();
        assert_eq!(api.status, expected);
    }

    #[test]
    fn test_operation_failure_keeps_worker_message() {
        let api: ApiError = Error::Operation {
            status: 1,
            message: "no space".into(),
        }
        .into();
        assert_eq!(api.detail, "no space");
    }

    #[test]
    fn test_storage_detail_is_generic() {
        let api: ApiError = Error::Storage("disk on fire".into()).into();
        assert_eq!(api.detail, "storage failure");
    }
}
