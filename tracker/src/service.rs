use crate::errors::ApiError;
use crate::metrics_defs::{
    HEARTBEAT_APPLIED, HEARTBEAT_REJECTED, LOCATION_UPDATE_APPLIED, LOCATION_UPDATE_REJECTED,
    REQUEST_DURATION,
};
use crate::state::AppState;
use crate::{heartbeat, location};
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::service::Service;
use hyper::{Request, Response};
use serde::Serialize;
use serde_json::json;
use shared::http::{ResponseBody, empty_response, json_response};
use shared::metrics_defs::MetricDef;
use shared::{counter, histogram};
use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

pub const LOCATION_PATH: &str = "/update_user_location_secure";
pub const HEARTBEAT_PATH: &str = "/last_online";

#[derive(Serialize)]
struct Success {
    success: &'static str,
}

/// Routes requests on the main listener to the tracking handlers.
#[derive(Clone)]
pub struct TrackerService {
    state: Arc<AppState>,
}

impl TrackerService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl<B> Service<Request<B>> for TrackerService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display,
{
    type Response = Response<ResponseBody>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let state = self.state.clone();
        Box::pin(async move {
            let start = Instant::now();
            let response = route(&state, req).await;
            histogram!(REQUEST_DURATION).record(start.elapsed().as_secs_f64());
            Ok(response)
        })
    }
}

async fn route<B>(state: &AppState, req: Request<B>) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Display,
{
    let (parts, body) = req.into_parts();

    match (&parts.method, parts.uri.path()) {
        (&Method::GET, "/") => json_response(
            StatusCode::OK,
            &json!({ "message": "Welcome to the API!" }),
        ),
        (&Method::GET, "/favicon.ico") => empty_response(StatusCode::NO_CONTENT),
        (&Method::POST, LOCATION_PATH) => {
            let result = match read_body(body).await {
                Ok(bytes) => location::update_user_location(state, &parts.headers, &bytes).await,
                Err(e) => Err(e),
            };
            respond(result, LOCATION_UPDATE_APPLIED, LOCATION_UPDATE_REJECTED)
        }
        (&Method::POST, HEARTBEAT_PATH) => {
            let result = match read_body(body).await {
                Ok(bytes) => heartbeat::update_last_online(state, &parts.headers, &bytes).await,
                Err(e) => Err(e),
            };
            respond(result, HEARTBEAT_APPLIED, HEARTBEAT_REJECTED)
        }
        (_, "/" | "/favicon.ico" | LOCATION_PATH | HEARTBEAT_PATH) => {
            error_response(StatusCode::METHOD_NOT_ALLOWED)
        }
        (method, path) => {
            tracing::debug!(%method, path, "No route matched");
            error_response(StatusCode::NOT_FOUND)
        }
    }
}

async fn read_body<B>(body: B) -> Result<Bytes, ApiError>
where
    B: Body,
    B::Error: Display,
{
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| {
            tracing::debug!(error = %e, "Failed to read request body");
            ApiError::MissingBody
        })
}

fn respond(
    result: Result<&'static str, ApiError>,
    applied: MetricDef,
    rejected: MetricDef,
) -> Response<ResponseBody> {
    match result {
        Ok(message) => {
            counter!(applied).increment(1);
            json_response(StatusCode::OK, &Success { success: message })
        }
        Err(err) => {
            counter!(rejected).increment(1);
            match &err {
                ApiError::Store(e) => tracing::error!(error = %e, "Document store request failed"),
                other => tracing::debug!(error = %other, "Rejected request"),
            }
            err.into_response()
        }
    }
}

fn error_response(status_code: StatusCode) -> Response<ResponseBody> {
    let message = status_code.canonical_reason().unwrap_or("an error occurred");
    json_response(status_code, &json!({ "error": message }))
}
