//! Core domain types and logic.

pub mod error;
pub mod series;
pub mod frame;
pub mod merge;
pub mod drawdown;
pub mod var;
pub mod periods;
pub mod monthly;
pub mod nav;
pub mod summary;
pub mod portfolio;
pub mod engine_config;
pub mod config_validation;
