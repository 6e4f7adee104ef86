//! Error types and result aliases for tessera.
//!
//! Translation failures are fatal and raised before any step is scheduled;
//! execution failures surface later through the scheduler.

mod error;

pub use error::{TesseraError, TesseraResult};
