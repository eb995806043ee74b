//! The `broker` module holds the in-memory pub/sub state and the message
//! hook contract plugins use to intercept publishes.

pub mod engine;
pub mod hooks;
pub mod message;
pub mod topic;

pub use engine::Broker;
pub use hooks::{ClientInfo, HookStatus, MessageEvent, MessageHook, run_message_hooks};

#[cfg(test)]
mod tests;
