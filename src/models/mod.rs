//! Data Models
//!
//! Configuration structures used throughout the library.

pub mod settings;

pub use settings::*;
