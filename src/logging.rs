//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Bodies longer than this many bytes are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "token"];

const REDACTED_VALUE: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level. Passwords and tokens in
/// JSON bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_text = match read_body_text(body).await {
        Ok(body_text) => body_text,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    log_request(&parts, &redact_json(&body_text));

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_text = match read_body_text(body).await {
        Ok(body_text) => body_text,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &redact_json(&body_text));

    Response::from_parts(parts, body_text.into())
}

async fn read_body_text(body: Body) -> Result<String, axum::Error> {
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok(String::from_utf8_lossy(&body_bytes).to_string())
}

/// Replace the values of sensitive fields if `body_text` is JSON.
///
/// Text that is not JSON is returned as is.
fn redact_json(body_text: &str) -> String {
    match serde_json::from_str::<Value>(body_text) {
        Ok(mut json) => {
            redact_value(&mut json);
            json.to_string()
        }
        Err(_) => body_text.to_owned(),
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String(REDACTED_VALUE.to_owned());
                } else {
                    redact_value(field);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_value),
        _ => {}
    }
}

fn truncate(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT;

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

/// The headers whose values never appear in the logs.
const REDACTED_HEADERS: [HeaderName; 3] =
    [header::AUTHORIZATION, header::COOKIE, header::SET_COOKIE];

/// A copy of `headers` with credentials replaced by [REDACTED_VALUE].
fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut redacted = headers.clone();

    for name in REDACTED_HEADERS {
        let count = redacted.get_all(&name).iter().count();

        if count > 0 {
            redacted.insert(name.clone(), HeaderValue::from_static(REDACTED_VALUE));
            for _ in 1..count {
                redacted.append(name.clone(), HeaderValue::from_static(REDACTED_VALUE));
            }
        }
    }

    redacted
}

fn describe_request(parts: &request::Parts) -> String {
    format!(
        "{} {} {:?}\nheaders: {:#?}",
        parts.method,
        parts.uri,
        parts.version,
        redact_headers(&parts.headers)
    )
}

fn describe_response(parts: &response::Parts) -> String {
    format!(
        "{} {:?}\nheaders: {:#?}",
        parts.status,
        parts.version,
        redact_headers(&parts.headers)
    )
}

fn log_request(parts: &request::Parts, body: &str) {
    let request = describe_request(parts);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("Received request: {request}\nbody: {:}...", truncate(body));
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {request}\nbody: {body:?}");
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    let response = describe_response(parts);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("Sending response: {response}\nbody: {:}...", truncate(body));
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {response}\nbody: {body:?}");
    }
}
