use crate::config::ValidationError;
use docstore::StoreError;
use http::StatusCode;
use hyper::Response;
use serde::Serialize;
use shared::http::{ResponseBody, json_response};

/// Errors that stop the tracker from starting or serving.
#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid API key header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("global API key variable {0} is unset or empty")]
    MissingApiKey(String),
}

/// Request-level failures. Each one becomes a JSON `{"error": ...}` response.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Unauthorized: invalid institution credentials")]
    InstitutionUnauthorized,

    #[error("Request body is required")]
    MissingBody,

    #[error("Request body must be a JSON object")]
    MalformedBody,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for field: {0}")]
    InvalidField(&'static str),

    #[error("Invalid timestamp for field {field}: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Invalid RFID tag")]
    UnknownTag,

    #[error("Invalid reader MAC address")]
    UnknownReader,

    // Every lookup passed but the write touched nothing
    #[error("Unexpected error occured")]
    UpdateNotApplied,

    #[error("Internal server error")]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InstitutionUnauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MissingBody
            | ApiError::MalformedBody
            | ApiError::MissingField(_)
            | ApiError::InvalidField(_)
            | ApiError::InvalidTimestamp { .. }
            | ApiError::UnknownTag
            | ApiError::UnknownReader => StatusCode::BAD_REQUEST,
            ApiError::UpdateNotApplied | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<ResponseBody> {
        json_response(
            self.status(),
            &ErrorBody {
                error: self.to_string(),
            },
        )
    }
}
