//! Process termination seam.
//!
//! The coordinator's terminal transitions end the process, which would make
//! them unobservable in tests. Termination goes through this trait so tests
//! can substitute a recorder and assert on exit codes.

/// Capability to terminate the current process.
pub trait ProcessControl: Send + Sync {
    /// Terminate with the given exit code.
    ///
    /// The production implementation does not return. Test doubles record the
    /// code and return, leaving the coordinator in its terminal state.
    fn exit(&self, code: i32);
}

/// Production implementation backed by [`std::process::exit`].
#[derive(Debug, Default)]
pub struct RealProcess;

impl ProcessControl for RealProcess {
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}
