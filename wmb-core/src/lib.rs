//! Core types for water body tracer mass balances: daily observation
//! records and their CSV loader, tracer models and the tracer registry.

pub mod date_range;
pub mod error;
pub mod observation;
pub mod registry;
pub mod tracer;

pub use error::{BalanceError, Result};
