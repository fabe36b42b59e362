//! TCP listener owning the single producer connection.
//!
//! The external recognizer dials a fixed local port and streams records over
//! one persistent connection. Exactly one connection is authoritative at a
//! time: a new inbound connection supersedes and closes the previous one.
//! The listener never reconnects on its own; the producer is expected to
//! redial after a disconnect.

pub mod ingest;

use crate::command::dispatch::{CommandEvent, CommandHandler, CommandRouter};
use crate::command::interpreter::CommandKind;
use crate::config::Config;
use crate::error::{Result, VoxpickError};
use crate::gate::mute::MuteCoordinator;
use crate::instance::InstanceGuard;
use crate::listener::ingest::IngestState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// State held only while the listener is started.
struct Running {
    shutdown: Arc<AtomicBool>,
    accept_task: JoinHandle<()>,
    dispatcher_task: JoinHandle<()>,
    local_addr: SocketAddr,
    // Held for the pid-file claim; released on drop
    _guard: InstanceGuard,
}

/// Voice-command listener: accepts the producer connection, runs the ingest
/// pipeline, and routes accepted commands to handlers and subscribers.
pub struct VoiceListener {
    config: Config,
    pid_path: PathBuf,
    router: Arc<CommandRouter>,
    mute: MuteCoordinator,
    running: Mutex<Option<Running>>,
    /// Generation id of the active connection; 0 when none
    active_conn: Arc<AtomicU64>,
}

impl VoiceListener {
    pub fn new(config: Config) -> Self {
        Self::with_pid_path(config, InstanceGuard::default_path())
    }

    /// Like [`new`](Self::new) with an explicit pid-file path (tests).
    pub fn with_pid_path(config: Config, pid_path: PathBuf) -> Self {
        Self {
            config,
            pid_path,
            router: Arc::new(CommandRouter::new()),
            mute: MuteCoordinator::new(),
            running: Mutex::new(None),
            active_conn: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Starts the listener. Idempotent: a second call while running is a
    /// no-op.
    ///
    /// Claims the single-instance guard first (terminating a live stale
    /// instance), then binds the configured port. A bind failure after
    /// cleanup surfaces as [`VoxpickError::Bind`]; the host application can
    /// continue without voice control.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Ok(());
        }

        let guard = InstanceGuard::acquire(self.pid_path.clone()).await?;

        let port = self.config.listener.port;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| VoxpickError::Bind {
                port,
                message: e.to_string(),
            })?;
        let local_addr = listener.local_addr().map_err(|e| VoxpickError::Bind {
            port,
            message: e.to_string(),
        })?;
        info!(%local_addr, "listening for transcription producer");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let dispatcher_task = Arc::clone(&self.router).spawn_dispatcher(events_rx);

        let ingest = Arc::new(std::sync::Mutex::new(IngestState::new(
            &self.config,
            self.mute.clone(),
            events_tx,
        )));

        let shutdown = Arc::new(AtomicBool::new(false));
        let accept_task = tokio::spawn(accept_loop(
            listener,
            ingest,
            Arc::clone(&shutdown),
            Arc::clone(&self.active_conn),
        ));

        *running = Some(Running {
            shutdown,
            accept_task,
            dispatcher_task,
            local_addr,
            _guard: guard,
        });
        Ok(())
    }

    /// Stops the listener. Idempotent and safe to call when not started.
    ///
    /// Closes the active connection, stops accepting, cancels any pending
    /// unmute timer, and releases the pid file. No partial state survives
    /// into the next start.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };

        running.shutdown.store(true, Ordering::SeqCst);
        if running.accept_task.await.is_err() {
            warn!("accept loop ended abnormally");
        }
        // Ingest state dropped with the accept loop closes the event channel
        if running.dispatcher_task.await.is_err() {
            warn!("dispatcher ended abnormally");
        }

        self.mute.reset();
        self.active_conn.store(0, Ordering::SeqCst);
        info!("listener stopped");
    }

    /// Address actually bound, if started. With a configured port of 0 this
    /// is the ephemeral port the OS picked.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    /// True while a producer connection is live.
    pub fn is_producer_connected(&self) -> bool {
        self.active_conn.load(Ordering::SeqCst) != 0
    }

    /// Associates an async handler with a command kind.
    pub fn register_handler(&self, kind: CommandKind, handler: Arc<dyn CommandHandler>) {
        self.router.register(kind, handler);
    }

    /// Subscribes to every accepted command.
    pub fn subscribe(&self) -> broadcast::Receiver<CommandEvent> {
        self.router.subscribe()
    }

    /// Announcer hook: suspend ingestion before the TTS speaks.
    pub fn mute_for_announcement(&self) {
        self.mute.mute_for_announcement();
    }

    /// Announcer hook: resume ingestion `delay` after the TTS finished.
    pub fn unmute_after_announcement(&self, delay: Duration) {
        let _timer = self.mute.unmute_after_announcement(delay);
    }
}

/// Accept loop: newest connection wins, shutdown polled on a short timeout.
async fn accept_loop(
    listener: TcpListener,
    ingest: Arc<std::sync::Mutex<IngestState>>,
    shutdown: Arc<AtomicBool>,
    active_conn: Arc<AtomicU64>,
) {
    let mut current: Option<(u64, JoinHandle<()>)> = None;
    let mut next_id: u64 = 1;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let accept_result =
            tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, addr))) => {
                if let Some((prev_id, prev_task)) = current.take() {
                    info!(%addr, "new producer supersedes previous connection");
                    prev_task.abort();
                    let _ = active_conn.compare_exchange(
                        prev_id,
                        0,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    );
                } else {
                    info!(%addr, "producer connected");
                }

                let id = next_id;
                next_id += 1;
                active_conn.store(id, Ordering::SeqCst);

                let ingest = Arc::clone(&ingest);
                let active = Arc::clone(&active_conn);
                let task = tokio::spawn(async move {
                    ingest::run_connection(stream, ingest).await;
                    // Clear only our own generation; a successor may already
                    // have replaced it
                    let _ = active.compare_exchange(id, 0, Ordering::SeqCst, Ordering::SeqCst);
                });
                current = Some((id, task));
            }
            Ok(Err(e)) => {
                // Transient accept failures must not take down the listener
                warn!("accept failed: {}", e);
            }
            Err(_) => {
                // Timeout - check shutdown flag again
                continue;
            }
        }
    }

    if let Some((id, task)) = current.take() {
        task.abort();
        let _ = active_conn.compare_exchange(id, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}
