//! Request resolver: the handler behind the HTTP and HTTPS listeners.
//!
//! # Responsibilities
//! - Map (scheme, host, path) to a resource through the registry
//! - Negotiate the gzip variant
//! - Answer conditional requests with 304
//! - Stream disk-backed resources
//! - Record one access record per request

use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, HeaderMap, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::content::path::decode;
use crate::content::{Payload, Resource, Scheme};
use crate::http::access::{AccessLog, AccessRecord};
use crate::http::body::stream_file;
use crate::observability::metrics;
use crate::registry::{Fetched, SiteRegistry};

/// State shared by every request on one listener.
#[derive(Debug, Clone)]
pub struct ServeState {
    pub registry: Arc<SiteRegistry>,
    pub scheme: Scheme,
    pub access_log: Arc<dyn AccessLog>,
}

/// Serve static content.
pub async fn serve(State(state): State<ServeState>, request: Request<Body>) -> Response {
    let (parts, _body) = request.into_parts();

    let response = respond(&state, &parts).await;

    let status = response.status();
    state.access_log.record(&AccessRecord::new(&parts, status));
    metrics::record_request(status.as_u16());
    response
}

async fn respond(state: &ServeState, parts: &Parts) -> Response {
    let head = match parts.method {
        Method::GET => false,
        Method::HEAD => true,
        _ => {
            tracing::debug!(method = %parts.method, uri = %parts.uri, "Method not allowed");
            return method_not_allowed();
        }
    };

    let host = request_host(parts).to_string();
    let path = decode(parts.uri.path());

    let Fetched { resource, status } = if state.registry.development_mode() {
        let registry = state.registry.clone();
        let scheme = state.scheme;
        match tokio::task::spawn_blocking(move || registry.fetch(scheme, &host, &path)).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::error!(error = %e, "Fetch task failed");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    } else {
        state.registry.fetch(state.scheme, &host, &path)
    };

    build_response(&resource, status, &parts.headers, head, SystemTime::now())
}

/// The host a request is addressed to, or "" when it names none.
fn request_host(parts: &Parts) -> &str {
    parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|host| !host.is_empty())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or("")
}

fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [
            (header::CONTENT_TYPE, "text/plain"),
            (header::ALLOW, "GET, HEAD"),
        ],
        "method not allowed",
    )
        .into_response()
}

fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("gzip"))
}

/// Whether the client's cached copy is still current.
///
/// If-None-Match takes precedence: when present, If-Modified-Since is not
/// consulted.
fn is_not_modified(headers: &HeaderMap, etag: &str, last_modified: SystemTime) -> bool {
    if let Some(value) = headers.get(header::IF_NONE_MATCH) {
        let value = value.to_str().unwrap_or("").trim();
        return value == etag || value == "*";
    }

    headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
        .is_some_and(|since| last_modified <= since)
}

fn insert(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, value = %value, "Dropping invalid header value"),
    }
}

/// Build the response for a resolved resource.
pub fn build_response(
    resource: &Resource,
    status: StatusCode,
    request_headers: &HeaderMap,
    head: bool,
    now: SystemTime,
) -> Response {
    let gzip = resource.gzip_permitted() && accepts_gzip(request_headers);
    let etag = if gzip {
        resource.gzip_etag()
    } else {
        resource.etag()
    };

    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;

    let headers = response.headers_mut();
    if !resource.content_type().is_empty() {
        insert(headers, header::CONTENT_TYPE, resource.content_type());
    }
    insert(headers, header::DATE, &httpdate::fmt_http_date(now));
    insert(
        headers,
        header::LAST_MODIFIED,
        &httpdate::fmt_http_date(resource.last_modified()),
    );
    insert(headers, header::CACHE_CONTROL, resource.cache_control());
    headers.insert(header::VARY, HeaderValue::from_static("accept-encoding"));
    insert(headers, header::ETAG, etag);

    if status == StatusCode::OK
        && is_not_modified(request_headers, etag, resource.last_modified())
    {
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        return response;
    }

    match resource.payload() {
        Payload::Memory { plain, gzip: packed } => {
            let bytes = match (gzip, packed) {
                (true, Some(packed)) => {
                    response
                        .headers_mut()
                        .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
                    packed.clone()
                }
                _ => plain.clone(),
            };
            response
                .headers_mut()
                .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            if !head {
                *response.body_mut() = Body::from(bytes);
            }
        }
        Payload::Disk(file) => {
            if gzip {
                response
                    .headers_mut()
                    .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            }
            if !head {
                match file.try_clone() {
                    Ok(file) => {
                        *response.body_mut() = stream_file(file, gzip, resource.path().to_string());
                    }
                    Err(e) => {
                        tracing::error!(path = %resource.path(), error = %e, "Cannot reopen file for streaming");
                        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                    }
                }
            }
        }
    }

    response
}
