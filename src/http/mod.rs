//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware.rs (drain check, request ID)
//!     → application routes
//!     → response (compressed, request ID propagated,
//!        Connection: close while draining)
//! ```

pub mod middleware;
pub mod server;

pub use server::AppServer;
