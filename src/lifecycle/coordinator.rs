//! Lifecycle coordination for the server.
//!
//! # Responsibilities
//! - Bind the listener exactly once and register shutdown triggers
//! - Report liveness (`online` / `offline`) to a supervising process
//! - Drain in-flight connections on shutdown without accepting new work
//! - Guarantee forward progress: forced termination after a deadline
//!
//! # Design Decisions
//! - All triggers funnel into one `exit()` path; behavior is identical
//!   regardless of source
//! - A second trigger while exiting means the graceful path is stuck or
//!   insufficient; it escalates immediately instead of queueing
//! - The escalation timer is never cancelled on the clean path; process exit
//!   makes it moot

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::http::AppServer;
use crate::lifecycle::events::{EventBus, LifecycleEvent};
use crate::lifecycle::process::ProcessControl;
use crate::lifecycle::signals;
use crate::lifecycle::supervisor::{Liveness, SupervisorChannel};

/// Lifecycle state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    /// Constructed, listener not bound.
    Idle = 0,
    /// Listener bound, accepting traffic.
    Running = 1,
    /// Shutdown begun, draining connections.
    Exiting = 2,
    /// Exit invoked. In production the process is gone; observable in tests
    /// through the process-control seam.
    Terminated = 3,
}

/// Lock-free cell for [`ServerState`].
#[derive(Debug)]
struct AtomicState(AtomicU8);

impl AtomicState {
    fn new(state: ServerState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn load(&self) -> ServerState {
        match self.0.load(Ordering::SeqCst) {
            0 => ServerState::Idle,
            1 => ServerState::Running,
            2 => ServerState::Exiting,
            _ => ServerState::Terminated,
        }
    }

    fn store(&self, state: ServerState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

/// Shared flag that tells request middleware to truncate keep-alive
/// connections. Written only by the coordinator, read on every request.
#[derive(Debug, Clone, Default)]
pub struct DrainFlag(Arc<AtomicBool>);

impl DrainFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a drain has begun.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Coordinates startup, liveness reporting, graceful drain, and escalation.
///
/// Created once per process and bound to one listener; never reused after
/// reaching [`ServerState::Terminated`]. Cloning yields another handle to the
/// same coordinator.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    hostname: String,
    port: u16,
    graceful_exit_timeout: Duration,
    state: AtomicState,
    /// Listener-bound guard: `start()` is a no-op once set.
    started: AtomicBool,
    /// At most one exit sequence; set with an atomic test-and-set.
    exit_guard: AtomicBool,
    drain: DrainFlag,
    events: EventBus,
    supervisor: Option<SupervisorChannel>,
    /// Signals the serve loop to stop accepting and drain.
    close_tx: watch::Sender<bool>,
    local_addr: OnceLock<SocketAddr>,
    process: Arc<dyn ProcessControl>,
}

impl Coordinator {
    /// Create a coordinator for the given configuration.
    pub fn new(
        config: &ServerConfig,
        drain: DrainFlag,
        events: EventBus,
        supervisor: Option<SupervisorChannel>,
        process: Arc<dyn ProcessControl>,
    ) -> Self {
        let (close_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                hostname: config.hostname.clone(),
                port: config.port,
                graceful_exit_timeout: config.graceful_exit_timeout(),
                state: AtomicState::new(ServerState::Idle),
                started: AtomicBool::new(false),
                exit_guard: AtomicBool::new(false),
                drain,
                events,
                supervisor,
                close_tx,
                local_addr: OnceLock::new(),
                process,
            }),
        }
    }

    /// Bind the listener and begin serving.
    ///
    /// Idempotent: a second call returns immediately without binding another
    /// listener or re-registering signal handlers. Fire-and-forget; a bind
    /// failure is logged at emergency severity and terminates the process
    /// with failure status.
    pub async fn start(&self, server: AppServer) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("start called twice; listener already bound");
            return;
        }

        let bind_address = format!("{}:{}", self.inner.hostname, self.inner.port);
        let listener = match TcpListener::bind(&bind_address).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(
                    emergency = true,
                    address = %bind_address,
                    error = %e,
                    "failed to bind listener"
                );
                self.inner.process.exit(1);
                return;
            }
        };

        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                tracing::error!(emergency = true, error = %e, "failed to read bound address");
                self.inner.process.exit(1);
                return;
            }
        };
        let _ = self.inner.local_addr.set(local_addr);
        self.inner.state.store(ServerState::Running);

        // Shutdown triggers: supervisor message, SIGTERM, SIGINT.
        let shutdown_messages = self
            .inner
            .supervisor
            .as_ref()
            .and_then(|s| s.take_shutdown_messages());
        tokio::spawn(signals::run(self.clone(), shutdown_messages));

        if let Some(supervisor) = &self.inner.supervisor {
            tracing::debug!("sending online");
            supervisor.send(Liveness::Online);
        }
        self.inner.events.notify(LifecycleEvent::Online);
        tracing::info!(address = %local_addr, "listening");

        let coordinator = self.clone();
        let mut close_rx = self.inner.close_tx.subscribe();
        tokio::spawn(async move {
            let result = axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    let _ = close_rx.changed().await;
                })
                .await;
            match result {
                Ok(()) => {
                    tracing::info!("server closed");
                    coordinator.inner.state.store(ServerState::Terminated);
                    coordinator.inner.process.exit(0);
                }
                Err(e) => {
                    // Transport errors are forwarded, never fatal to the
                    // lifecycle state.
                    tracing::error!(error = %e, "server error");
                    coordinator
                        .inner
                        .events
                        .notify(LifecycleEvent::Error(e.to_string()));
                }
            }
        });
    }

    /// Externally-triggered graceful stop.
    ///
    /// Reports `offline` upstream before the drain begins so the supervisor
    /// can reroute traffic while connections finish, then funnels into
    /// [`exit()`](Self::exit).
    pub fn stop(&self) {
        self.inner.events.notify(LifecycleEvent::Stopping);
        if let Some(supervisor) = &self.inner.supervisor {
            tracing::debug!("sending offline");
            supervisor.send(Liveness::Offline);
        }
        self.exit();
    }

    /// Begin the guarded drain, or escalate if one is already underway.
    pub fn exit(&self) {
        if self.inner.exit_guard.swap(true, Ordering::SeqCst) {
            self.force_exit();
            return;
        }

        self.inner.state.store(ServerState::Exiting);
        // Every request handled from here on truncates its connection's
        // keep-alive after the current response.
        self.inner.drain.set();
        tracing::debug!("exiting");
        self.inner.events.notify(LifecycleEvent::Exiting);

        // Close on the next scheduling opportunity so the triggering stack
        // (e.g. the signal intake) unwinds before teardown begins.
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.inner.close_tx.send_replace(true);
        });

        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(coordinator.inner.graceful_exit_timeout).await;
            coordinator.force_exit();
        });
    }

    /// Terminate immediately with failure status, bypassing any drain.
    pub fn force_exit(&self) {
        tracing::error!("forced exit");
        self.inner.state.store(ServerState::Terminated);
        self.inner.process.exit(1);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        self.inner.state.load()
    }

    /// Observer registry for lifecycle events.
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Address the listener is bound to, once running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.local_addr.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records exit codes instead of terminating.
    #[derive(Debug, Default)]
    struct RecordingProcess {
        codes: Mutex<Vec<i32>>,
    }

    impl RecordingProcess {
        fn codes(&self) -> Vec<i32> {
            self.codes.lock().unwrap().clone()
        }
    }

    impl ProcessControl for RecordingProcess {
        fn exit(&self, code: i32) {
            self.codes.lock().unwrap().push(code);
        }
    }

    fn test_config(timeout_ms: u64) -> ServerConfig {
        ServerConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            graceful_exit_timeout_ms: timeout_ms,
            ..ServerConfig::default()
        }
    }

    fn coordinator_under_test(
        timeout_ms: u64,
    ) -> (Coordinator, DrainFlag, Arc<RecordingProcess>) {
        let config = test_config(timeout_ms);
        let drain = DrainFlag::new();
        let process = Arc::new(RecordingProcess::default());
        let coordinator = Coordinator::new(
            &config,
            drain.clone(),
            EventBus::new(),
            None,
            process.clone(),
        );
        (coordinator, drain, process)
    }

    fn app(config: &ServerConfig, drain: &DrainFlag) -> AppServer {
        AppServer::new(config, axum::Router::new(), drain.clone())
    }

    async fn wait_for_codes(process: &RecordingProcess) -> Vec<i32> {
        for _ in 0..50 {
            let codes = process.codes();
            if !codes.is_empty() {
                return codes;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        process.codes()
    }

    #[tokio::test]
    async fn start_binds_and_reports_online() {
        let (coordinator, drain, _process) = coordinator_under_test(1000);
        let mut events = coordinator.events().subscribe();

        coordinator.start(app(&test_config(1000), &drain)).await;

        assert_eq!(coordinator.state(), ServerState::Running);
        assert!(coordinator.local_addr().is_some());
        assert_eq!(events.try_recv().unwrap(), LifecycleEvent::Online);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let (coordinator, drain, _process) = coordinator_under_test(1000);
        let mut events = coordinator.events().subscribe();

        coordinator.start(app(&test_config(1000), &drain)).await;
        let first_addr = coordinator.local_addr();
        coordinator.start(app(&test_config(1000), &drain)).await;

        assert_eq!(coordinator.local_addr(), first_addr);
        assert_eq!(events.try_recv().unwrap(), LifecycleEvent::Online);
        // no second online notification
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn bind_failure_exits_with_failure_status() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = ServerConfig {
            port,
            ..test_config(1000)
        };
        let drain = DrainFlag::new();
        let process = Arc::new(RecordingProcess::default());
        let coordinator = Coordinator::new(
            &config,
            drain.clone(),
            EventBus::new(),
            None,
            process.clone(),
        );

        coordinator.start(app(&config, &drain)).await;

        assert_eq!(process.codes(), vec![1]);
        assert_eq!(coordinator.state(), ServerState::Idle);
    }

    #[tokio::test]
    async fn stop_orders_events_and_sets_drain_flag() {
        let (coordinator, drain, _process) = coordinator_under_test(60_000);
        let mut events = coordinator.events().subscribe();

        coordinator.stop();

        assert_eq!(events.try_recv().unwrap(), LifecycleEvent::Stopping);
        assert_eq!(events.try_recv().unwrap(), LifecycleEvent::Exiting);
        assert_eq!(coordinator.state(), ServerState::Exiting);
        assert!(drain.is_set());
    }

    #[tokio::test]
    async fn second_trigger_forces_exit() {
        let (coordinator, _drain, process) = coordinator_under_test(60_000);
        let mut events = coordinator.events().subscribe();

        coordinator.stop();
        assert!(process.codes().is_empty());

        // any further trigger while exiting escalates, never a second drain
        coordinator.exit();
        assert_eq!(process.codes(), vec![1]);
        assert_eq!(coordinator.state(), ServerState::Terminated);

        let mut exiting_count = 0;
        while let Ok(event) = events.try_recv() {
            if event == LifecycleEvent::Exiting {
                exiting_count += 1;
            }
        }
        assert_eq!(exiting_count, 1);
    }

    #[tokio::test]
    async fn every_extra_trigger_escalates() {
        let (coordinator, _drain, process) = coordinator_under_test(60_000);

        coordinator.stop();
        coordinator.exit();
        coordinator.stop();
        coordinator.exit();

        assert_eq!(process.codes(), vec![1, 1, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn escalation_deadline_bounds_shutdown_latency() {
        let (coordinator, _drain, process) = coordinator_under_test(100);

        // no serve loop is running, so the drain can never complete
        coordinator.exit();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(process.codes(), vec![1]);
        assert_eq!(coordinator.state(), ServerState::Terminated);
    }

    #[tokio::test]
    async fn clean_drain_exits_with_success_status() {
        let (coordinator, drain, process) = coordinator_under_test(60_000);

        coordinator.start(app(&test_config(60_000), &drain)).await;
        assert_eq!(coordinator.state(), ServerState::Running);

        coordinator.exit();

        assert_eq!(wait_for_codes(&process).await, vec![0]);
        assert_eq!(coordinator.state(), ServerState::Terminated);
    }
}
