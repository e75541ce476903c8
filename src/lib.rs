//! Supervised HTTP application server.
//!
//! A thin wrapper that stands up an HTTP listener with standard middleware
//! (request IDs, trace logging, compression, body limits, error pages) and
//! coordinates its shutdown with an orchestrating parent process.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                  APP SERVER                   │
//!                        │                                               │
//!   Client Request       │  ┌──────────┐       ┌─────────────────────┐  │
//!   ─────────────────────┼─▶│   http   │──────▶│ application routes  │  │
//!                        │  │ listener │       └─────────────────────┘  │
//!                        │  └──────────┘                                │
//!                        │       ▲                                      │
//!                        │       │ bind / drain / close                 │
//!   Supervisor message   │  ┌────┴──────────────────────────────────┐   │
//!   SIGTERM / SIGINT ────┼─▶│        lifecycle coordinator          │   │
//!                        │  │ Idle → Running → Exiting → Terminated │   │
//!                        │  └────┬──────────────────────┬───────────┘   │
//!                        │       │ online / offline     │ events        │
//!                        │       ▼                      ▼               │
//!                        │  supervisor channel      observers           │
//!                        └───────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod lifecycle;

// Cross-cutting concerns
pub mod observability;

pub use config::ServerConfig;
pub use http::AppServer;
pub use lifecycle::{Coordinator, DrainFlag, EventBus, LifecycleEvent, ServerState};
