//! `Accept-Encoding` driven response compression.

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::response::Response;
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH};
use http_body_util::BodyExt;
use payload_gate_core::{Codec, GateError, GzipCodec, accepts_gzip};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{BoxError, Layer, Service, ServiceExt};

/// Layer that gzip-compresses response bodies when the caller asked for it.
///
/// The decision reads the *request's* `Accept-Encoding`: compression is
/// driven by what the caller can decode, not by anything already on the
/// response being built. When it applies, the body is substituted and the
/// response gains `Content-Encoding: gzip`; a response that already
/// carries a `Content-Encoding` is never wrapped a second time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseCompressionLayer {
    codec: GzipCodec,
}

impl ResponseCompressionLayer {
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

impl<S> Layer<S> for ResponseCompressionLayer {
    type Service = ResponseCompressionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResponseCompressionService {
            inner,
            codec: self.codec,
        }
    }
}

/// Service that gzip-compresses response bodies.
#[derive(Debug, Clone)]
pub struct ResponseCompressionService<S> {
    inner: S,
    codec: GzipCodec,
}

impl<S> Service<Request<Body>> for ResponseCompressionService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let codec = self.codec;
        let accepts = accepts_gzip(
            req.headers()
                .get(ACCEPT_ENCODING)
                .and_then(|v| v.to_str().ok()),
        );

        // Clone inner service for the async block
        let inner = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move {
            let res = inner.oneshot(req).await.map_err(Into::into)?;
            if !accepts {
                tracing::debug!("caller does not accept gzip, response left uncompressed");
                return Ok(res);
            }
            compress_response(res, &codec).await.map_err(Into::into)
        })
    }
}

/// Substitute the response body with its gzip form and set
/// `Content-Encoding: gzip`. The header map is otherwise untouched, except
/// that a stale `Content-Length` from the handler is dropped because the
/// substituted body has a different length.
async fn compress_response(res: Response, codec: &GzipCodec) -> Result<Response, GateError> {
    // Already encoded (by a handler or an earlier pass): never double-wrap.
    if res.headers().contains_key(CONTENT_ENCODING) {
        return Ok(res);
    }

    let (mut parts, body) = res.into_parts();
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
        "compressing response body"
    );

    parts
        .headers
        .insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    parts.headers.remove(CONTENT_LENGTH);

    Ok(Response::from_parts(parts, Body::from(compressed)))
}
