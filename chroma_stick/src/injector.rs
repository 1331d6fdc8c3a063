// THEORY:
// The OS keyboard is a stateful, slow and occasionally failing service. The
// `KeyInjector` keeps it away from the frame loop by giving it an actor of its
// own: a dedicated blocking task that owns the `KeyBackend` and drains an
// unbounded FIFO channel of `InjectorMessage`s.
//
// Key architectural principles:
// 1.  **Order**: one channel and one consumer, so commands reach the backend in
//     exactly the order the pipeline emitted them.
// 2.  **Ownership**: the backend is built inside the actor's thread and never
//     leaves it. Backends that are not `Send` (most OS input handles) work.
// 3.  **No stuck keys**: the actor remembers what it pressed and releases it when
//     told to shut down or when every sender is gone, whatever killed the loop.
// 4.  **Failures stay local**: a failed press or release is logged and counted.
//     The loop never waits for, or hears about, delivery.

use crate::config::KeyBindings;
use crate::control_loop::KeySink;
use crate::core_modules::keys::{KeyCommand, KeySet, KeySymbol};
use crate::error::StickError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Something that can hold keys down on the host.
pub trait KeyBackend {
    fn press(&mut self, symbol: KeySymbol) -> Result<(), StickError>;
    fn release(&mut self, symbol: KeySymbol) -> Result<(), StickError>;
}

/// Message type for the injector actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectorMessage {
    Key(KeyCommand),
    Shutdown,
}

/// What the actor did over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InjectorStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Owner of the injector actor.
pub struct KeyInjector {
    sender: mpsc::UnboundedSender<InjectorMessage>,
    task: JoinHandle<InjectorStats>,
}

impl KeyInjector {
    /// Starts the actor and waits until its backend is built.
    ///
    /// Must be called from inside a tokio runtime.
    pub async fn spawn<B, F>(make_backend: F) -> Result<Self, StickError>
    where
        B: KeyBackend + 'static,
        F: FnOnce() -> Result<B, StickError> + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<InjectorMessage>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), StickError>>();

        let task = tokio::task::spawn_blocking(move || {
            let backend = match make_backend() {
                Ok(backend) => {
                    let _ = ready_tx.send(Ok(()));
                    backend
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return InjectorStats::default();
                }
            };
            run_actor(backend, &mut receiver)
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                info!("key injector started");
                Ok(Self { sender, task })
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(StickError::Injection(
                "injector stopped before its backend was ready".to_string(),
            )),
        }
    }

    /// A cheap sender the control loop can use as its key sink.
    pub fn handle(&self) -> InjectorHandle {
        InjectorHandle {
            sender: self.sender.clone(),
            reported_closed: false,
        }
    }

    /// Releases held keys, stops the actor and returns its counters.
    pub async fn shutdown(self) -> Result<InjectorStats, StickError> {
        let _ = self.sender.send(InjectorMessage::Shutdown);
        let stats = self
            .task
            .await
            .map_err(|err| StickError::Injection(format!("injector task failed: {err}")))?;
        info!(delivered = stats.delivered, failed = stats.failed, "key injector stopped");
        Ok(stats)
    }
}

fn run_actor<B: KeyBackend>(
    mut backend: B,
    receiver: &mut mpsc::UnboundedReceiver<InjectorMessage>,
) -> InjectorStats {
    let mut stats = InjectorStats::default();
    let mut held = KeySet::EMPTY;

    while let Some(message) = receiver.blocking_recv() {
        match message {
            InjectorMessage::Key(command) => deliver(&mut backend, command, &mut held, &mut stats),
            InjectorMessage::Shutdown => break,
        }
    }

    if !held.is_empty() {
        debug!(?held, "releasing keys still held at shutdown");
    }
    for symbol in held.iter() {
        deliver(&mut backend, KeyCommand::Up(symbol), &mut held, &mut stats);
    }
    stats
}

fn deliver<B: KeyBackend>(
    backend: &mut B,
    command: KeyCommand,
    held: &mut KeySet,
    stats: &mut InjectorStats,
) {
    let result = match command {
        KeyCommand::Down(symbol) => backend.press(symbol).map(|()| held.insert(symbol)),
        KeyCommand::Up(symbol) => {
            // Forget the key either way; retrying a broken release would repeat forever.
            held.remove(symbol);
            backend.release(symbol)
        }
    };
    match result {
        Ok(()) => stats.delivered += 1,
        Err(err) => {
            stats.failed += 1;
            warn!(?command, %err, "key injection failed");
        }
    }
}

/// Sending half of the injector, used as the loop's `KeySink`.
#[derive(Debug, Clone)]
pub struct InjectorHandle {
    sender: mpsc::UnboundedSender<InjectorMessage>,
    reported_closed: bool,
}

impl InjectorHandle {
    fn send(&mut self, command: KeyCommand) {
        if self.sender.send(InjectorMessage::Key(command)).is_err() && !self.reported_closed {
            warn!("key injector is gone, dropping key commands");
            self.reported_closed = true;
        }
    }
}

impl KeySink for InjectorHandle {
    fn key_down(&mut self, symbol: KeySymbol) {
        self.send(KeyCommand::Down(symbol));
    }

    fn key_up(&mut self, symbol: KeySymbol) {
        self.send(KeyCommand::Up(symbol));
    }
}

/// Logs every command instead of touching the keyboard. Used for dry runs.
#[derive(Debug, Clone, Default)]
pub struct TracingBackend {
    bindings: KeyBindings,
}

impl TracingBackend {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }
}

impl KeyBackend for TracingBackend {
    fn press(&mut self, symbol: KeySymbol) -> Result<(), StickError> {
        info!(%symbol, key = self.bindings.binding(symbol), "key down");
        Ok(())
    }

    fn release(&mut self, symbol: KeySymbol) -> Result<(), StickError> {
        info!(%symbol, key = self.bindings.binding(symbol), "key up");
        Ok(())
    }
}
