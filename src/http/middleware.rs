//! Request logging middleware for axum.
//!
//! Emits one record per completed request with the method, path, status,
//! latency, client address, user agent, query, request id and any
//! [`LogFields`] attached along the way.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::Router;
use futures::stream::{self, StreamExt};

use crate::config::{
    HttpLogConfig, DEFAULT_MAX_BODY_BYTES, HTTP_REQUEST_MESSAGE, REQUEST_ID_HEADERS,
};
use crate::logger::Logger;
use crate::record::{Level, LogRecord, Value};

use super::LogFields;

/// State of the logging middleware.
#[derive(Clone)]
pub struct HttpLogging {
    logger: Logger,
    config: Arc<HttpLogConfig>,
}

impl HttpLogging {
    pub fn new(logger: Logger, config: HttpLogConfig) -> Self {
        Self {
            logger,
            config: Arc::new(config),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

/// Wraps every route of `router` with [`log_requests`].
pub fn instrument<S>(router: Router<S>, logging: HttpLogging) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(logging, log_requests))
}

/// Severity of a request record, from its status code.
pub fn level_for_status(status: u16) -> Level {
    if status >= 500 {
        Level::Error
    } else if status >= 400 {
        Level::Warn
    } else {
        Level::Info
    }
}

/// Logs the request after the inner service responded.
pub async fn log_requests(
    State(logging): State<HttpLogging>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let config = &logging.config;

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let user_agent = header_str(request.headers(), USER_AGENT.as_str()).unwrap_or_default();
    let remote_ip = remote_ip(&request, config.remote_ip_header.as_deref());
    let request_id = find_request_id(request.headers());
    let upstream = request.extensions().get::<LogFields>().cloned();

    let (request, body) = if config.log_request_body {
        capture_body(request, config.max_body_bytes).await
    } else {
        (request, None)
    };

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut record = LogRecord::new(level_for_status(status), HTTP_REQUEST_MESSAGE)
        .with_field("method", method)
        .with_field("path", path)
        .with_field("status", status)
        .with_field("latency_ms", latency_ms)
        .with_field("remote_ip", remote_ip)
        .with_field("user_agent", user_agent);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        record = record.with_field("query", query);
    }
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        record = record.with_field("body", body);
    }

    let mut context = upstream.unwrap_or_default();
    if let Some(from_handler) = response.extensions().get::<LogFields>() {
        context.merge(from_handler.clone());
    }
    for (key, value) in context.freeze() {
        record.fields.entry(key).or_insert(value);
    }
    if let Some(id) = request_id {
        record = record.with_field("request_id", Value::String(id));
    }

    if let Err(e) = logging.logger.log(record) {
        log::warn!("Failed to write request log record: {e}");
    }

    response
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// First non-empty value among the known request id headers.
fn find_request_id(headers: &HeaderMap) -> Option<String> {
    REQUEST_ID_HEADERS.iter().find_map(|name| {
        header_str(headers, name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Client address from the trusted header when configured and present,
/// otherwise the peer address. Only the first entry of a list is used.
fn remote_ip(request: &Request, trusted_header: Option<&str>) -> String {
    if let Some(name) = trusted_header {
        if let Some(value) = header_str(request.headers(), name) {
            let first = value.split(',').next().unwrap_or_default().trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

/// Reads the request body until `max_bytes` are buffered and returns that
/// prefix as text.
///
/// The handler gets the buffered chunks followed by the unread remainder of
/// the original stream, so a large or slow body is never held in memory. A
/// read error is logged, nothing is captured, and the error is handed on to
/// the handler after the chunks already read.
async fn capture_body(request: Request, max_bytes: usize) -> (Request, Option<String>) {
    let max_bytes = if max_bytes == 0 {
        DEFAULT_MAX_BODY_BYTES
    } else {
        max_bytes
    };
    let (parts, body) = request.into_parts();
    let mut rest = body.into_data_stream();

    let mut head: Vec<Bytes> = Vec::new();
    let mut buffered = 0;
    let mut failure = None;
    while buffered < max_bytes {
        match rest.next().await {
            Some(Ok(chunk)) => {
                buffered += chunk.len();
                head.push(chunk);
            }
            Some(Err(e)) => {
                failure = Some(e);
                break;
            }
            None => break,
        }
    }

    let captured = match &failure {
        Some(e) => {
            log::warn!("Failed to read request body for logging: {e}");
            None
        }
        None => {
            let mut prefix = Vec::with_capacity(buffered.min(max_bytes));
            for chunk in &head {
                let room = max_bytes - prefix.len();
                prefix.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
            Some(String::from_utf8_lossy(&prefix).into_owned())
        }
    };

    let replayed = stream::iter(head.into_iter().map(Ok));
    let body = match failure {
        Some(e) => Body::from_stream(replayed.chain(stream::iter([Err(e)]))),
        None => Body::from_stream(replayed.chain(rest)),
    };
    (Request::from_parts(parts, body), captured)
}
