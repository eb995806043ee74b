//! # PopSub Inspector
//!
//! `popsub-inspector` is a minimalist, in-memory publish/subscribe server whose
//! publishes are screened by an external inspector service before delivery.
//! Every publish is described to the inspector over TCP in a compact
//! protobuf-compatible record; the answer allows it, blocks it or replaces
//! its payload.
//!
//! ## Core Modules
//!
//! - `broker`: topics, subscribers, message routing and the message hook contract.
//! - `client`: a connected WebSocket client and its identity.
//! - `config`: loading server, inspector and logging configuration.
//! - `inspector`: wire codec, transport client, orchestration and decisions.
//! - `plugin`: registers the inspector as a broker message hook.
//! - `transport`: the WebSocket server.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod inspector;
pub mod plugin;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod testing;
