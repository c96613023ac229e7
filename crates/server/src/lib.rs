//! Screw classification HTTP service
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! drive the same router.

pub mod api;
pub mod config;
