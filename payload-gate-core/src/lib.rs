//! Core building blocks for payload-gate.
//!
//! This crate provides the types shared by the server and client stages:
//!
//! - gzip magic-number detection ([`is_gzip`])
//! - `Content-Encoding` / `Accept-Encoding` negotiation ([`claims_gzip`],
//!   [`accepts_gzip`])
//! - the compression codec trait and gzip implementation ([`Codec`],
//!   [`GzipCodec`])
//! - failure classification and the JSON error envelope ([`Failure`],
//!   [`ErrorEnvelope`])

mod codec;
mod encoding;
mod error;
mod sniff;

pub use codec::*;
pub use encoding::*;
pub use error::*;
pub use sniff::*;
