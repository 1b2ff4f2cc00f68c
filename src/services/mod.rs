//! Services
//!
//! The streaming-response interpretation layer:
//! - `extraction` - parsers over a growing text buffer
//! - `streaming` - provider adapters, sessions and the stream driver

pub mod extraction;
pub mod streaming;

pub use streaming::{AdapterFactory, UnifiedStreamingService};
