//! Middleware layers for the server-side pipeline.
//!
//! This module provides the three Tower layers that make up the gate:
//!
//! - [`RequestDecompressionLayer`]: inbound gzip detection and decompression.
//! - [`ResponseCompressionLayer`]: `Accept-Encoding` driven response compression.
//! - [`ErrorMapperLayer`]: terminal failure-to-response translation.
//!
//! ## Layer Stack Order
//!
//! The error mapper nests inside the compression stage: a gzip-accepting
//! caller gets its error envelopes compressed like any other response.
//! The mapper is infallible, and `Infallible: Into<BoxError>` lets it sit
//! under the compressor directly. A router that demands an infallible
//! service gets one more mapper at the very outside; it only fires if the
//! compression stage itself fails:
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//! use payload_gate::{ErrorMapperLayer, RequestDecompressionLayer, ResponseCompressionLayer};
//!
//! let app = Router::new()
//!     .route("/resource", post(handler))
//!     .layer(
//!         ServiceBuilder::new()
//!             .layer(ErrorMapperLayer::new())           // Outermost: compression-stage failures
//!             .layer(ResponseCompressionLayer::new())   // Response bodies, error envelopes included
//!             .layer(ErrorMapperLayer::new())           // Failure translation
//!             .layer(RequestDecompressionLayer::new()), // Request bodies
//!     );
//! ```
//!
//! Each stage hands control to the service below it exactly once, after any
//! body substitution and never after.

mod compress;
mod decompress;
mod error_mapper;

pub use compress::{ResponseCompressionLayer, ResponseCompressionService};
pub use decompress::{RequestDecompressionLayer, RequestDecompressionService};
pub use error_mapper::{ErrorMapperLayer, ErrorMapperService};
