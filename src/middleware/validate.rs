use axum::{
    body::{to_bytes, Body},
    extract::{Query, RawPathParams, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    RequestPartsExt,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ApiError;
use crate::validation::{RequestData, RequestSchema, Section};

/// Middleware state: the endpoint's schema plus the body buffering limit.
#[derive(Clone)]
pub struct ValidationGate {
    schema: Arc<RequestSchema>,
    body_limit: usize,
}

impl ValidationGate {
    pub fn new(schema: RequestSchema, body_limit: usize) -> Self {
        Self {
            schema: Arc::new(schema),
            body_limit,
        }
    }
}

/// Checks the declared request sections against the endpoint schema.
///
/// On any violation responds 400 with the full ordered violation list and the
/// handler never runs. Otherwise forwards the request untouched.
pub async fn validation_gate(State(gate): State<ValidationGate>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let mut data = RequestData::default();

    if gate.schema.declares(Section::Params) {
        data.params = match parts.extract::<RawPathParams>().await {
            Ok(params) => {
                let map: Map<String, Value> = params
                    .iter()
                    .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                    .collect();
                Value::Object(map)
            }
            Err(rejection) => {
                tracing::debug!("Rejected path parameters: {}", rejection.body_text());
                return ApiError::bad_request(rejection.body_text()).into_response();
            }
        };
    }

    if gate.schema.declares(Section::Query) {
        data.query = match Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
            Ok(Query(query)) => Value::Object(query.into_iter().map(|(k, v)| (k, Value::String(v))).collect()),
            Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
        };
    }

    let body = if gate.schema.declares(Section::Body) {
        let bytes = match to_bytes(body, gate.body_limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Failed to buffer request body: {}", e);
                return ApiError::payload_too_large(format!("Request body exceeds {} bytes", gate.body_limit))
                    .into_response();
            }
        };

        data.body = if bytes.iter().all(u8::is_ascii_whitespace) {
            json!({})
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => return ApiError::invalid_json(format!("Malformed JSON body: {}", e)).into_response(),
            }
        };

        Body::from(bytes)
    } else {
        body
    };

    let report = gate.schema.validate(&data);
    if !report.is_empty() {
        tracing::debug!("Rejected {} {}: {} violation(s)", parts.method, parts.uri.path(), report.len());
        return (StatusCode::BAD_REQUEST, Json(report)).into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}
