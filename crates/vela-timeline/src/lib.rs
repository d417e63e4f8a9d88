//! VELA Timeline - Schedules for passive renderer hosts
//!
//! A renderer host cannot run continuously. On each refresh it asks for a
//! bounded schedule covering the next horizon, and for the time to ask again.
//! This crate computes that schedule as a pure function of the configuration,
//! the persisted rotation index and `now`.

pub mod config;
pub mod projector;

pub use config::*;
pub use projector::*;
