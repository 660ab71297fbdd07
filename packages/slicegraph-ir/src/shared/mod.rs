//! Shared module - types common to all features
//!
//! Holds the IR interface boundary the analyses consume. It has no
//! dependency on any feature module.

pub mod models;

pub use models::*;
