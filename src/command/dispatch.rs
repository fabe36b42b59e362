//! Command event dispatch, decoupled from the ingest path.
//!
//! The ingest loop hands accepted commands to a dispatcher task over an
//! unbounded channel and immediately returns to decoding, so a slow consumer
//! can never block the parser or cause backpressure that drops bytes. Each
//! per-kind handler runs in its own task; a failing (or panicking) handler is
//! logged and never aborts ingest or affects other handlers.

use crate::command::interpreter::CommandKind;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// An accepted voice command.
///
/// `text` and `timestamp` carry the originating transcription for logging
/// and debugging only; consumers should act on `kind`.
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub kind: CommandKind,
    /// The transcription text that matched
    pub text: String,
    /// Producer timestamp of the matching transcription, in seconds
    pub timestamp: f64,
    /// When the gate accepted the command
    pub accepted_at: Instant,
}

/// Handler invoked when a specific command kind is accepted.
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, event: CommandEvent) -> anyhow::Result<()>;
}

/// Routes accepted commands to per-kind handlers and generic subscribers.
pub struct CommandRouter {
    handlers: RwLock<HashMap<CommandKind, Arc<dyn CommandHandler>>>,
    events_tx: broadcast::Sender<CommandEvent>,
}

impl CommandRouter {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(64);
        Self {
            handlers: RwLock::new(HashMap::new()),
            events_tx,
        }
    }

    /// Associates a handler with a command kind, replacing any previous one.
    pub fn register(&self, kind: CommandKind, handler: Arc<dyn CommandHandler>) {
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.insert(kind, handler);
        }
    }

    /// Subscribes to every accepted command, independent of per-kind
    /// handlers. Subscribers that fall behind miss events rather than
    /// applying backpressure.
    pub fn subscribe(&self) -> broadcast::Receiver<CommandEvent> {
        self.events_tx.subscribe()
    }

    /// Delivers one event: broadcast first, then the per-kind handler in its
    /// own task.
    pub fn deliver(&self, event: CommandEvent) {
        debug!(kind = %event.kind, text = %event.text, "command accepted");

        // send() only fails with no live subscribers, which is fine
        let _ = self.events_tx.send(event.clone());

        let handler = self
            .handlers
            .read()
            .ok()
            .and_then(|handlers| handlers.get(&event.kind).cloned());

        if let Some(handler) = handler {
            tokio::spawn(async move {
                let kind = event.kind;
                if let Err(e) = handler.handle(event).await {
                    warn!(kind = %kind, "command handler failed: {:#}", e);
                }
            });
        }
    }

    /// Spawns the dispatcher task draining `rx` until the ingest side closes
    /// the channel.
    pub fn spawn_dispatcher(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<CommandEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                self.deliver(event);
            }
        })
    }
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{Duration, sleep};

    fn event(kind: CommandKind) -> CommandEvent {
        CommandEvent {
            kind,
            text: kind.as_str().to_string(),
            timestamp: 1.0,
            accepted_at: Instant::now(),
        }
    }

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl CommandHandler for CountingHandler {
        async fn handle(&self, _event: CommandEvent) -> anyhow::Result<()> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait::async_trait]
    impl CommandHandler for FailingHandler {
        async fn handle(&self, _event: CommandEvent) -> anyhow::Result<()> {
            anyhow::bail!("downstream actor exploded")
        }
    }

    #[tokio::test]
    async fn test_registered_handler_receives_matching_kind() {
        let router = CommandRouter::new();
        let count = Arc::new(AtomicUsize::new(0));
        router.register(
            CommandKind::Top,
            Arc::new(CountingHandler {
                count: Arc::clone(&count),
            }),
        );

        router.deliver(event(CommandKind::Top));
        router.deliver(event(CommandKind::Play)); // no handler registered

        sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_error_does_not_affect_other_handlers() {
        let router = CommandRouter::new();
        let count = Arc::new(AtomicUsize::new(0));
        router.register(CommandKind::Pause, Arc::new(FailingHandler));
        router.register(
            CommandKind::Play,
            Arc::new(CountingHandler {
                count: Arc::clone(&count),
            }),
        );

        router.deliver(event(CommandKind::Pause));
        router.deliver(event(CommandKind::Play));

        sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscriber_sees_all_kinds() {
        let router = CommandRouter::new();
        let mut rx = router.subscribe();

        router.deliver(event(CommandKind::Top));
        router.deliver(event(CommandKind::Pause));

        assert_eq!(rx.recv().await.unwrap().kind, CommandKind::Top);
        assert_eq!(rx.recv().await.unwrap().kind, CommandKind::Pause);
    }

    #[tokio::test]
    async fn test_deliver_without_subscribers_is_fine() {
        let router = CommandRouter::new();
        router.deliver(event(CommandKind::Bottom));
    }

    #[tokio::test]
    async fn test_register_replaces_previous_handler() {
        let router = CommandRouter::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        router.register(
            CommandKind::Top,
            Arc::new(CountingHandler {
                count: Arc::clone(&first),
            }),
        );
        router.register(
            CommandKind::Top,
            Arc::new(CountingHandler {
                count: Arc::clone(&second),
            }),
        );

        router.deliver(event(CommandKind::Top));
        sleep(Duration::from_millis(50)).await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatcher_drains_channel() {
        let router = Arc::new(CommandRouter::new());
        let count = Arc::new(AtomicUsize::new(0));
        router.register(
            CommandKind::Top,
            Arc::new(CountingHandler {
                count: Arc::clone(&count),
            }),
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Arc::clone(&router).spawn_dispatcher(rx);

        tx.send(event(CommandKind::Top)).unwrap();
        tx.send(event(CommandKind::Top)).unwrap();
        drop(tx);

        dispatcher.await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
