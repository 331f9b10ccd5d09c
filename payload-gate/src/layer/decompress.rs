//! Inbound gzip decompression.

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http::header::CONTENT_ENCODING;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use payload_gate_core::{Codec, GateError, GzipCodec, claims_gzip, is_gzip};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{BoxError, Layer, Service, ServiceExt};

use crate::GzipTransformed;

/// Layer that decompresses gzip request bodies.
///
/// The `Content-Encoding` claim is confirmed by sniffing the first two body
/// bytes before a decoder is applied: an upstream caller may set the header
/// without actually sending gzip bytes, and attempting to decompress those
/// would fail the whole exchange. On a mismatch the stage logs a warning
/// and the body passes through unchanged — this is deliberate leniency, not
/// an error.
///
/// Requests without a gzip claim are forwarded untouched; no sniffing
/// happens at all in that case.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestDecompressionLayer {
    codec: GzipCodec,
    receive_max_bytes: Option<usize>,
}

impl RequestDecompressionLayer {
    /// Create a new layer with the default codec and no size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new layer with the specified receive size limit.
    ///
    /// This bounds the compressed body size the stage will buffer for a
    /// claimed-gzip request; a larger body fails the exchange with
    /// [`GateError::OverLimit`] before a decoder is applied.
    ///
    /// Use `None` for unlimited (not recommended for production).
    pub fn with_receive_limit(receive_max_bytes: Option<usize>) -> Self {
        Self {
            codec: GzipCodec::default(),
            receive_max_bytes,
        }
    }
}

impl<S> Layer<S> for RequestDecompressionLayer {
    type Service = RequestDecompressionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestDecompressionService {
            inner,
            codec: self.codec,
            receive_max_bytes: self.receive_max_bytes,
        }
    }
}

/// Service that decompresses gzip request bodies.
#[derive(Debug, Clone)]
pub struct RequestDecompressionService<S> {
    inner: S,
    codec: GzipCodec,
    receive_max_bytes: Option<usize>,
}

impl<S> Service<Request<Body>> for RequestDecompressionService<S>
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
        let limit = self.receive_max_bytes;
        let claimed = claims_gzip(
            req.headers()
                .get_all(CONTENT_ENCODING)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        // Clone inner service for the async block
        let inner = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move {
            let req = if claimed {
                decompress_request(req, &codec, limit).await?
            } else {
                // No gzip claim: no sniffing, bytes pass through untouched.
                req
            };
            inner.oneshot(req).await.map_err(Into::into)
        })
    }
}

/// Buffer the claimed-gzip body, sniff it, and substitute the decompressed
/// bytes when the claim holds.
///
/// Headers are never modified; the only side effect is body substitution.
async fn decompress_request(
    req: Request<Body>,
    codec: &GzipCodec,
    limit: Option<usize>,
) -> Result<Request<Body>, GateError> {
    if req.extensions().get::<GzipTransformed>().is_some() {
        return Ok(req);
    }

    let (mut parts, body) = req.into_parts();
    let bytes = collect_limited(body, limit).await?;

    let body = if is_gzip(&bytes) {
        tracing::debug!(len = bytes.len(), "decompressing request body");
        let decompressed = codec
            .decompress(&bytes)
            .map_err(|e| GateError::Decompress(e.to_string()))?;
        parts.extensions.insert(GzipTransformed);
        Body::from(decompressed)
    } else {
        // The header claimed gzip but the bytes disagree. The sniffed bytes
        // were only inspected, so the handler sees the body as sent.
        tracing::warn!(
            len = bytes.len(),
            "content not actually gzipped, passing body through unchanged"
        );
        Body::from(bytes)
    };

    Ok(Request::from_parts(parts, body))
}

/// Buffer the body, enforcing the receive limit when one is configured.
async fn collect_limited(body: Body, limit: Option<usize>) -> Result<bytes::Bytes, GateError> {
    let Some(limit) = limit else {
        return Ok(body
            .collect()
            .await
            .map_err(|e| GateError::BodyCollect(e.to_string()))?
            .to_bytes());
    };

    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(GateError::OverLimit { limit })
        }
        Err(e) => Err(GateError::BodyCollect(e.to_string())),
    }
}
