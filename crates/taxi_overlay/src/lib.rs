//! Host-facing runtime for the taxi overlay.
//!
//! This crate owns the IO side: the host channel (HTTP requests and the push
//! inbox), the controller task that drives `taxi_core` state, the shell
//! boundary and process setup (settings, logging). Selection rules and wire
//! shapes live in `taxi_core`.

pub mod adapters;
pub mod controller;
pub mod logging;
pub mod settings;
pub mod shell;
