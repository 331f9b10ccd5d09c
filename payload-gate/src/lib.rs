//! # payload-gate
//!
//! Transparent gzip negotiation and uniform error responses for Tower/axum
//! pipelines.
//!
//! The crate sits between a network listener and application handlers:
//!
//! - [`RequestDecompressionLayer`] detects gzip-encoded request bodies
//!   (header claim confirmed by magic-number sniffing) and decompresses
//!   them before the handler runs.
//! - [`ResponseCompressionLayer`] compresses response bodies and sets
//!   `Content-Encoding: gzip` when the caller's `Accept-Encoding`
//!   advertises gzip support.
//! - [`RequestCompressionLayer`] is the client-side counterpart: it
//!   supplies the gzip transform for outgoing requests that pre-declare
//!   `Content-Encoding: gzip`.
//! - [`ErrorMapperLayer`] is the terminal translator that turns any
//!   failure surfacing from the stack below it into a structured JSON
//!   error response.
//!
//! See the [`layer`] module docs for the recommended stack order.

pub mod client;
pub mod layer;

pub use client::{RequestCompressionLayer, RequestCompressionService};
pub use layer::{
    ErrorMapperLayer, ErrorMapperService, RequestDecompressionLayer, RequestDecompressionService,
    ResponseCompressionLayer, ResponseCompressionService,
};
pub use payload_gate_core::{
    BoxError, ClientError, Codec, ErrorEnvelope, Failure, GZIP_MAGIC, GateError, GzipCodec,
    accepts_gzip, claims_gzip, is_gzip,
};

/// Marker extension recording that a body already went through a gzip
/// transform in its direction. At most one transform is applied per
/// direction per exchange.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GzipTransformed;
