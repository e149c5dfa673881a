//! Pass-through to the node's REST interface.
//!
//! The request path and query are forwarded unchanged and appended to the
//! upstream base URL. The node's status, headers and body are returned as-is.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{OriginalUri, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use vitgen_core::error::VitgenError;

use crate::api::GatewayState;
use crate::error::ApiError;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// The node REST base URL plus the client used to reach it.
#[derive(Clone, Debug)]
pub struct Upstream {
    base: String,
    client: reqwest::Client,
}

impl Upstream {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, VitgenError> {
        let base = base.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(VitgenError::Config(format!(
                "upstream [{base}] must be an http(s) URL"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VitgenError::Config(format!("upstream client: {e}")))?;
        Ok(Self {
            base: base.to_string(),
            client,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base, path_and_query)
    }
}

pub(crate) async fn forward(
    State(state): State<GatewayState>,
    OriginalUri(uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let url = state.upstream.url_for(path);

    let mut out = headers.clone();
    strip_hop_by_hop(&mut out);
    out.remove(header::HOST);
    out.remove(header::CONTENT_LENGTH);
    if let Some(host) = headers.get(header::HOST) {
        out.insert(HeaderName::from_static("x-forwarded-host"), host.clone());
    }

    debug!(%method, %url, "forwarding to node");
    let sent = state
        .upstream
        .client
        .request(method.clone(), &url)
        .headers(out)
        .body(body)
        .send()
        .await;

    let upstream = match sent {
        Ok(r) => r,
        Err(e) => {
            warn!(%method, %url, error = %e, "node unreachable");
            return ApiError::bad_gateway(format!("node unreachable: {e}")).into_response();
        }
    };

    let status = upstream.status();
    let mut reply_headers = upstream.headers().clone();
    let bytes = match upstream.bytes().await {
        Ok(b) => b,
        Err(e) => {
            warn!(%method, %url, error = %e, "node reply truncated");
            return ApiError::bad_gateway(format!("node reply: {e}")).into_response();
        }
    };

    strip_hop_by_hop(&mut reply_headers);
    reply_headers.remove(header::CONTENT_LENGTH);
    // The CORS layer owns these.
    reply_headers.remove(header::ACCESS_CONTROL_ALLOW_ORIGIN);

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = reply_headers;
    response
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Also drop anything the Connection header lists.
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v: &HeaderValue| v.to_str().ok())
        .flat_map(|v| v.split(',').map(|s| s.trim().to_ascii_lowercase()))
        .collect();
    for name in HOP_BY_HOP.iter().copied().chain(listed.iter().map(String::as_str)) {
        headers.remove(name);
    }
}
