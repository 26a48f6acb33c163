//! HTTP surface of the service.
//!
//! Routes:
//! - `GET /health`
//! - `GET /convert?from=&to=&amount=`
//! - `POST /currency`
//! - `PUT /currency/{code}`
//! - `DELETE /currency/{code}`

use axum::Json;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use axum::routing::{get, post, put};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::admin::CurrencyAdmin;
use crate::convert::Converter;
use crate::core::context::CallContext;

mod convert;
mod currency;
pub mod response;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
    pub admin: Arc<CurrencyAdmin>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Fresh per-request context bounded by the configured timeout.
    fn call_context(&self) -> CallContext {
        CallContext::new().with_timeout(self.request_timeout)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any);
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::debug_span!("http-request", method = %request.method(), path = %request.uri().path())
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::debug!("started {} {}", request.method(), request.uri().path())
        })
        .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
            tracing::debug!(status = %response.status(), "response generated in {:?}", latency)
        })
        .on_body_chunk(|chunk: &Bytes, _latency: Duration, _span: &Span| {
            tracing::trace!("sending {} bytes", chunk.len())
        })
        .on_failure(|error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
            tracing::error!("request failed: {error:?} latency: {latency:?}")
        });

    Router::new()
        .route("/health", get(health_check))
        .route("/convert", get(convert::convert))
        .route("/currency", post(currency::add_currency))
        .route(
            "/currency/{code}",
            put(currency::update_currency).delete(currency::remove_currency),
        )
        .with_state(state)
        .layer(trace)
        .layer(cors)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
