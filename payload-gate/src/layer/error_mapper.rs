//! Terminal failure-to-response translation.

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http::{HeaderValue, StatusCode, header};
use payload_gate_core::{ErrorEnvelope, Failure};
use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{BoxError, Layer, Service, ServiceExt};

/// Layer that converts any failure surfacing from the stack below it into a
/// structured JSON error response.
///
/// This is the single place where failures become responses. A
/// [`ClientError`](payload_gate_core::ClientError) keeps its attached
/// status and is not logged at error severity (it is an expected,
/// client-caused condition); anything else is logged with its full source
/// chain and mapped to 500.
///
/// Diagnostic detail (the `stackTrace` field) is only sent to callers when
/// enabled via [`with_diagnostics`](ErrorMapperLayer::with_diagnostics);
/// the flag has no effect on server-side logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMapperLayer {
    diagnostics: bool,
}

impl ErrorMapperLayer {
    /// Create a new layer with diagnostics disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer that includes the diagnostic trace in error
    /// responses when `diagnostics` is true.
    pub fn with_diagnostics(diagnostics: bool) -> Self {
        Self { diagnostics }
    }
}

impl<S> Layer<S> for ErrorMapperLayer {
    type Service = ErrorMapperService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorMapperService {
            inner,
            diagnostics: self.diagnostics,
        }
    }
}

/// Service that converts inner failures into JSON error responses.
#[derive(Debug, Clone)]
pub struct ErrorMapperService<S> {
    inner: S,
    diagnostics: bool,
}

impl<S> Service<Request<Body>> for ErrorMapperService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness is driven through oneshot in call; the mapper itself
        // never fails.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let diagnostics = self.diagnostics;

        // Clone inner service for the async block
        let inner = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move {
            match inner.oneshot(req).await {
                Ok(res) => Ok(res),
                Err(err) => Ok(map_failure(err.into(), diagnostics)),
            }
        })
    }
}

/// Turn a failure into the final error response.
fn map_failure(error: BoxError, diagnostics: bool) -> Response {
    let failure = Failure::classify(error);

    match &failure {
        Failure::Client { status, message } => {
            tracing::debug!(status = %status, message = %message, "client error mapped to response");
        }
        Failure::Server { error } => {
            // Always logged server-side in full; the diagnostics flag only
            // controls what the caller gets to see.
            tracing::error!(
                error = %error,
                trace = %failure.render_trace(),
                "unexpected failure reached the error mapper"
            );
        }
    }

    let envelope = ErrorEnvelope::from_failure(&failure, diagnostics);
    let status =
        StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    match serde_json::to_vec(&envelope) {
        Ok(body) => Response::builder()
            .status(status)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .body(Body::from(body))
            .unwrap_or_else(|_| internal_error_response()),
        Err(_) => internal_error_response(),
    }
}

/// Safe fallback when the envelope itself cannot be produced.
///
/// The body is a hardcoded JSON string that cannot fail to serialize; there
/// is no further fallback layer beyond this.
fn internal_error_response() -> Response {
    const ERROR_BODY: &[u8] = br#"{"status":500,"message":"Internal Server Error"}"#;

    let mut response = Response::new(Body::from(ERROR_BODY.to_vec()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use payload_gate_core::ClientError;
    use tower::{ServiceBuilder, ServiceExt};

    async fn not_found_service(_req: Request<Body>) -> Result<Response, BoxError> {
        Err(Box::new(ClientError::not_found("user 42 does not exist")))
    }

    async fn faulty_service(_req: Request<Body>) -> Result<Response, BoxError> {
        Err(Box::new(std::io::Error::other("database connection reset")))
    }

    async fn healthy_service(_req: Request<Body>) -> Result<Response, BoxError> {
        Ok(Response::new(Body::from("ok")))
    }

    async fn json_body(res: Response) -> serde_json::Value {
        let bytes = res
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("error body is JSON")
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let svc = ServiceBuilder::new()
            .layer(ErrorMapperLayer::new())
            .service_fn(healthy_service);

        let res = svc
            .oneshot(Request::new(Body::empty()))
            .await
            .expect("mapper is infallible");
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_client_error_keeps_status() {
        let svc = ServiceBuilder::new()
            .layer(ErrorMapperLayer::new())
            .service_fn(not_found_service);

        let res = svc.oneshot(Request::new(Body::empty())).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = json_body(res).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], "user 42 does not exist");
        assert!(body.get("stackTrace").is_none());
    }

    #[tokio::test]
    async fn test_unclassified_failure_maps_to_500() {
        let svc = ServiceBuilder::new()
            .layer(ErrorMapperLayer::new())
            .service_fn(faulty_service);

        let res = svc.oneshot(Request::new(Body::empty())).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(res).await;
        assert_eq!(body["status"], 500);
        assert_eq!(body["message"], "database connection reset");
        // Diagnostics disabled: no trace leaves the server.
        assert!(body.get("stackTrace").is_none());
    }

    #[tokio::test]
    async fn test_diagnostics_flag_exposes_trace() {
        let svc = ServiceBuilder::new()
            .layer(ErrorMapperLayer::with_diagnostics(true))
            .service_fn(faulty_service);

        let res = svc.oneshot(Request::new(Body::empty())).await.unwrap();
        let body = json_body(res).await;
        assert_eq!(body["status"], 500);
        assert!(body["stackTrace"].is_string());
        assert!(
            body["stackTrace"]
                .as_str()
                .unwrap()
                .contains("database connection reset")
        );
    }

    #[test]
    fn test_internal_error_response() {
        let res = internal_error_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
