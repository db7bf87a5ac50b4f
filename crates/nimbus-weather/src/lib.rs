//! Weather domain types for Nimbus
//!
//! The snapshot consumed by the on-device feels-like model, WMO condition
//! mapping and the report handed to the display layer.

pub mod types;

pub use types::*;
