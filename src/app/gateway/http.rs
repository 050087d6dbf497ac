// src/app/gateway/http.rs
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use super::GatewayError;

/// One shared client per gateway; the timeout bounds every call made through it.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .user_agent(concat!("reeltalk/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_max_idle_per_host(8)
        .default_headers({
            use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
            let mut h = HeaderMap::new();
            h.insert(ACCEPT, HeaderValue::from_static("application/json"));
            h
        })
        .build()
        .map_err(|e| GatewayError::NetworkUnreachable(format!("http client build failed: {e}")))
}

pub(crate) fn network_error(context: &str, err: &reqwest::Error) -> GatewayError {
    let what = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    warn!("{context}: {what}: {err}");
    GatewayError::NetworkUnreachable(format!("{context}: {what}"))
}

/// Drain a response and hand it to [`classify`].
pub(crate) async fn read_json(resp: reqwest::Response, context: &str) -> Result<Value, GatewayError> {
    let status = resp.status().as_u16();
    let body = resp.text().await.map_err(|e| network_error(context, &e))?;
    classify(status, &body, context)
}

/// Turn a status plus raw body into JSON or a typed error.
///
/// Failure statuses become `RemoteRejected`, carrying the backend's `{"error": ..}`
/// message when there is one. A success status whose body is just `{"error": ..}`
/// is also a rejection; the backend answers some misses that way.
pub(crate) fn classify(status: u16, body: &str, context: &str) -> Result<Value, GatewayError> {
    let parsed = serde_json::from_str::<Value>(body);

    if !(200..300).contains(&status) {
        let message = parsed.ok().as_ref().and_then(error_message);
        warn!("{context}: rejected with status {status}");
        return Err(GatewayError::RemoteRejected { status, message });
    }

    let value = parsed.map_err(|e| {
        warn!("{context}: body is not JSON: {e}");
        GatewayError::InvalidResponseShape {
            context: context.to_string(),
            missing: "json body".to_string(),
        }
    })?;

    if let Some(obj) = value.as_object() {
        if obj.len() == 1 {
            if let Some(message) = error_message(&value) {
                warn!("{context}: error body with status {status}");
                return Err(GatewayError::RemoteRejected {
                    status,
                    message: Some(message),
                });
            }
        }
    }
    Ok(value)
}

fn error_message(value: &Value) -> Option<String> {
    value
        .get("error")
        .or_else(|| value.get("status_message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Look up a required field, reporting it as a shape error when absent or null.
pub(crate) fn require<'a>(
    value: &'a Value,
    field: &str,
    context: &str,
) -> Result<&'a Value, GatewayError> {
    match value.get(field) {
        Some(v) if !v.is_null() => Ok(v),
        _ => {
            warn!("{context}: response is missing `{field}`");
            Err(GatewayError::InvalidResponseShape {
                context: context.to_string(),
                missing: field.to_string(),
            })
        }
    }
}

pub(crate) fn require_array<'a>(
    value: &'a Value,
    field: &str,
    context: &str,
) -> Result<&'a Vec<Value>, GatewayError> {
    require(value, field, context)?.as_array().ok_or_else(|| {
        warn!("{context}: `{field}` is not a list");
        GatewayError::InvalidResponseShape {
            context: context.to_string(),
            missing: field.to_string(),
        }
    })
}

pub(crate) fn optional_str(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
