//! Mass balance engine for tracers in a water body.
//!
//! This crate turns daily observations into water fluxes ([`fluxes`]),
//! propagates a tracer through them ([`mass_balance`]) and collects the
//! results into an output table ([`report`]).

pub mod fluxes;
pub mod mass_balance;
pub mod metrics;
pub mod report;

pub use fluxes::{load, DailySeries, ValidationMode};
pub use mass_balance::{run, ConcentrationSeries, DEFAULT_PAN_FACTOR};
pub use report::BalanceTable;
