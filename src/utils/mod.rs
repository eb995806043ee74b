//! The `utils` module collects definitions shared across the crate:
//! the error taxonomy and logging initialisation.

pub mod error;
pub mod logging;
