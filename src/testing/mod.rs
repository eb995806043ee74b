//! Test doubles shared by the unit tests.

pub mod mock_inspector;

pub use mock_inspector::{MockInspector, Reply, Seen, closed_port};
