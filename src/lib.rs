//! Penguin species prediction service.
//!
//! - [`api`]: the HTTP surface, `POST /predict` plus health and model info
//! - [`ml`]: the pre-trained classifier and the inference engine
//! - [`loadgen`]: a traffic generator that drives `/predict` with simulated users

pub mod api;
pub mod config;
pub mod domain;
pub mod loadgen;
pub mod ml;
pub mod state;
pub mod telemetry;
