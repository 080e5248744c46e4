//! navport: portfolio time-series engine.
//!
//! Turns price histories and sparse weight allocations into a consistent
//! portfolio model with nav, drawdown, risk and turnover analytics.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
