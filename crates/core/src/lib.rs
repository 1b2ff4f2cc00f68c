//! Assistant Stream Core
//!
//! Foundational event types, the adapter trait and the error taxonomy for the
//! assistant streaming layer. This crate has no dependency on transports,
//! extraction logic or any application-level code.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`) and the session
//!   termination taxonomy (`StreamError`, `ErrorKind`)
//! - `streaming` - Normalized provider events and adapter trait
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/thiserror** - keeps build times minimal
//! 2. **Trait-based abstractions** - adapters are swappable and testable in isolation
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult, ErrorKind, StreamError};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{sse_payload, AdapterError, ProviderEvent, StreamAdapter};
