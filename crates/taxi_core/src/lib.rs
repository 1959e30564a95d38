//! Ride-selection domain for the taxi overlay.
//!
//! This crate owns the wire contract with the host process, the selection state
//! machine, the HUD presenter and display formatting. It performs no IO; the
//! `taxi_overlay` crate drives it against a real host channel.

pub mod contract;
pub mod destinations;
pub mod format;
pub mod hud;
pub mod selection;
pub mod view;
