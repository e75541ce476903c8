//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via the tracing crate; the only operator surface
//! - Severity mapping from the four-level sink: debug → DEBUG,
//!   notice → INFO, error → ERROR, emergency → ERROR with `emergency = true`
//! - File output under a configured log directory, stdout otherwise

pub mod logging;
