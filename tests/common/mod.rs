//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use app_server::lifecycle::ProcessControl;

/// Process-control double that records exit codes instead of terminating.
#[derive(Debug, Default)]
pub struct RecordingProcess {
    codes: Mutex<Vec<i32>>,
}

impl RecordingProcess {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All exit codes recorded so far, in order.
    pub fn codes(&self) -> Vec<i32> {
        self.codes.lock().unwrap().clone()
    }

    /// Wait until the first exit is recorded, or give up after `timeout`.
    pub async fn wait_for_exit(&self, timeout: Duration) -> Option<i32> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(code) = self.codes().first().copied() {
                return Some(code);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl ProcessControl for RecordingProcess {
    fn exit(&self, code: i32) {
        self.codes.lock().unwrap().push(code);
    }
}

/// Unique Unix socket path for a supervisor double.
pub fn socket_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("app-server-test-{}-{}.sock", name, std::process::id()))
}
