//! The `inspector` module consults an external decision service for every
//! publish.
//!
//! - `codec`: schema-driven protobuf-compatible encoder and decoder.
//! - `message`: the request/response records and their schemas.
//! - `client`: one TCP exchange per inspection, bounded by a timeout.
//! - `orchestrator`: builds requests, calls the service, applies the
//!   failure policy.
//! - `decision`: the resulting `Decision` and how it changes the publish.

pub mod client;
pub mod codec;
pub mod decision;
pub mod message;
pub mod orchestrator;

pub use client::InspectorClient;
pub use decision::{Decision, apply};
pub use message::{InspectionRequest, InspectionResponse};
pub use orchestrator::Inspector;
