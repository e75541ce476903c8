//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     Bind listener → register signal intake → report online → serve
//!
//! Shutdown (coordinator.rs):
//!     Trigger received → set drain flag → stop accepting → drain → exit 0
//!                                      ↘ escalation deadline → exit 1
//!
//! Intake (signals.rs):
//!     SIGTERM / SIGINT → stop()  (reports offline first)
//!     supervisor "shutdown" message → exit()
//!     any trigger while already exiting → force_exit()
//! ```
//!
//! # Design Decisions
//! - One exit sequence per process: the guard is an atomic test-and-set
//! - Shutdown has a deadline: forced exit bounds drain latency
//! - Observers are notified through an owned event bus, not inheritance
//! - Process termination is a seam so the terminal state is testable

pub mod coordinator;
pub mod events;
pub mod process;
pub mod signals;
pub mod supervisor;

pub use coordinator::{Coordinator, DrainFlag, ServerState};
pub use events::{EventBus, LifecycleEvent};
pub use process::{ProcessControl, RealProcess};
pub use supervisor::{Liveness, SupervisorChannel};
