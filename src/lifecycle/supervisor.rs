//! Liveness channel to a supervising parent process.
//!
//! # Responsibilities
//! - Send `online` / `offline` status lines upstream
//! - Surface inbound `shutdown` requests to the signal intake
//! - Never block the coordinator (sends go through an unbounded queue)
//!
//! # Wire format
//! Newline-delimited text over a Unix domain socket whose path arrives in the
//! `SUPERVISOR_SOCKET` environment variable. Absence of the variable means
//! the process is unsupervised and liveness reporting is skipped. Inbound,
//! only the literal line `shutdown` is recognized; everything else is ignored.

use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;

/// Environment variable naming the supervisor socket path.
pub const SUPERVISOR_SOCKET_ENV: &str = "SUPERVISOR_SOCKET";

/// Status token sent to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Ready to receive traffic.
    Online,
    /// New work should no longer be routed here.
    Offline,
}

impl Liveness {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Liveness::Online => "online",
            Liveness::Offline => "offline",
        }
    }
}

impl std::fmt::Display for Liveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection to the supervising process.
///
/// Outbound sends are fire-and-forget: they enqueue onto an unbounded channel
/// drained by a writer task, so the coordinator never waits on the socket.
#[derive(Debug)]
pub struct SupervisorChannel {
    outbound: mpsc::UnboundedSender<Liveness>,
    inbound: std::sync::Mutex<Option<mpsc::UnboundedReceiver<()>>>,
}

impl SupervisorChannel {
    /// Connect to the supervisor socket named by `SUPERVISOR_SOCKET`.
    ///
    /// Returns `None` when the variable is unset (unsupervised) or the
    /// connection fails; a supervisor that handed us a bad socket gets the
    /// same treatment as no supervisor at all, with a log line.
    pub async fn from_env() -> Option<Self> {
        let path = std::env::var(SUPERVISOR_SOCKET_ENV).ok()?;
        match Self::connect(Path::new(&path)).await {
            Ok(channel) => Some(channel),
            Err(e) => {
                tracing::error!(socket = %path, error = %e, "failed to connect to supervisor socket");
                None
            }
        }
    }

    /// Connect to a supervisor socket at an explicit path.
    pub async fn connect(path: &Path) -> std::io::Result<Self> {
        let stream = UnixStream::connect(path).await?;
        let (read_half, mut write_half) = stream.into_split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Liveness>();
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let line = format!("{}\n", msg.as_str());
                if let Err(e) = write_half.write_all(line.as_bytes()).await {
                    tracing::error!(error = %e, "supervisor channel write failed");
                    break;
                }
            }
        });

        let (in_tx, in_rx) = mpsc::unbounded_channel::<()>();
        tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim() == "shutdown" {
                    if in_tx.send(()).is_err() {
                        break;
                    }
                } else {
                    tracing::debug!(payload = %line, "ignoring unrecognized supervisor message");
                }
            }
        });

        Ok(Self {
            outbound: out_tx,
            inbound: std::sync::Mutex::new(Some(in_rx)),
        })
    }

    /// Send a liveness token upstream. Never blocks.
    pub fn send(&self, msg: Liveness) {
        if self.outbound.send(msg).is_err() {
            tracing::debug!(liveness = %msg, "supervisor channel closed; liveness message dropped");
        }
    }

    /// Take the stream of inbound shutdown requests.
    ///
    /// Consumed once by the signal intake; subsequent calls return `None`.
    pub(crate) fn take_shutdown_messages(&self) -> Option<mpsc::UnboundedReceiver<()>> {
        self.inbound
            .lock()
            .expect("supervisor inbound lock poisoned")
            .take()
    }
}
