//! Client-side request compression.
//!
//! A client that wants to send a compressed request pre-declares it by
//! setting `Content-Encoding: gzip` on the request it is building; this
//! layer then supplies the matching transform on the way out. It never sets
//! the header itself and leaves the header map otherwise untouched.

use axum::body::Body;
use axum::http::Request;
use http::header::CONTENT_ENCODING;
use http_body_util::BodyExt;
use payload_gate_core::{Codec, GZIP, GateError, GzipCodec};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{BoxError, Layer, Service, ServiceExt};

use crate::GzipTransformed;

/// Layer that gzip-compresses outgoing request bodies that pre-declare
/// `Content-Encoding: gzip`.
///
/// Intended for client-side Tower stacks; the response type of the inner
/// transport is passed through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestCompressionLayer {
    codec: GzipCodec,
}

impl RequestCompressionLayer {
    /// Create a new layer with the default compression level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer with a specific compression level (0-9).
    pub fn with_level(level: u32) -> Self {
        Self {
            codec: GzipCodec::with_level(level),
        }
    }
}

impl<S> Layer<S> for RequestCompressionLayer {
    type Service = RequestCompressionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestCompressionService {
            inner,
            codec: self.codec,
        }
    }
}

/// Service that gzip-compresses pre-declared outgoing request bodies.
#[derive(Debug, Clone)]
pub struct RequestCompressionService<S> {
    inner: S,
    codec: GzipCodec,
}

impl<S> Service<Request<Body>> for RequestCompressionService<S>
where
    S: Service<Request<Body>> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let codec = self.codec;

        // The caller pre-declared intent by putting the header on the
        // request itself; the comparison is against the single first value,
        // case-insensitively.
        let declared = req
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(GZIP));

        // Clone inner service for the async block
        let inner = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move {
            let req = if declared {
                compress_request(req, &codec).await?
            } else {
                req
            };
            inner.oneshot(req).await.map_err(Into::into)
        })
    }
}

/// Substitute the request body with its gzip form. No header is written:
/// the declaration is already present.
async fn compress_request(
    req: Request<Body>,
    codec: &GzipCodec,
) -> Result<Request<Body>, GateError> {
    if req.extensions().get::<GzipTransformed>().is_some() {
        return Ok(req);
    }

    let (mut parts, body) = req.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(|e| GateError::BodyCollect(e.to_string()))?
        .to_bytes();
    let compressed = codec
        .compress(&bytes)
        .map_err(|e| GateError::Compress(e.to_string()))?;

    tracing::debug!(
        from = bytes.len(),
        to = compressed.len(),
        "compressing outgoing request body"
    );

    parts.extensions.insert(GzipTransformed);
    Ok(Request::from_parts(parts, Body::from(compressed)))
}
