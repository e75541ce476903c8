//! Shutdown trigger intake.
//!
//! # Responsibilities
//! - Register OS signal handlers (SIGTERM, SIGINT)
//! - Watch the supervisor channel for `shutdown` requests
//! - Route triggers into the coordinator
//!
//! # Design Decisions
//! - OS signals go through `stop()` so the offline report precedes the drain;
//!   the supervisor's own `shutdown` message goes straight to `exit()`
//! - The intake loops forever: repeated triggers reach the coordinator's
//!   re-entrancy guard and escalate there

use tokio::sync::mpsc;

use crate::lifecycle::coordinator::Coordinator;

/// Run the intake loop. Spawned once by the coordinator after a successful
/// bind; lives until process exit.
pub(crate) async fn run(
    coordinator: Coordinator,
    mut shutdown_messages: Option<mpsc::UnboundedReceiver<()>>,
) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM handler");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGINT handler");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM");
                    coordinator.stop();
                }
                _ = sigint.recv() => {
                    tracing::info!("received SIGINT");
                    coordinator.stop();
                }
                _ = shutdown_message(&mut shutdown_messages) => {
                    tracing::info!("received shutdown request from supervisor");
                    coordinator.exit();
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "failed to listen for Ctrl+C");
                        return;
                    }
                    tracing::info!("received Ctrl+C");
                    coordinator.stop();
                }
                _ = shutdown_message(&mut shutdown_messages) => {
                    tracing::info!("received shutdown request from supervisor");
                    coordinator.exit();
                }
            }
        }
    }
}

/// Resolve when the supervisor requests shutdown; pend forever once the
/// channel is absent or closed so the select loop cannot spin.
async fn shutdown_message(rx: &mut Option<mpsc::UnboundedReceiver<()>>) {
    match rx {
        Some(receiver) => {
            if receiver.recv().await.is_none() {
                *rx = None;
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}
