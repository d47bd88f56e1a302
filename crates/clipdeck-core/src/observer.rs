//! Player State Machine - engine observation and state publication
//!
//! Engine callbacks never touch the published state themselves. Each one
//! wraps its signal in an [`Envelope`] tagged with the generation of the
//! session that installed it and pushes it into one unbounded channel. A
//! single task drains the channel in arrival order, drops envelopes from
//! superseded generations, runs the reducer and publishes the result on a
//! `watch` channel.

use crate::{
    engine::{extract_error, ItemId, MediaEngine, PlayerStatus, Subscription},
    reducer::{reduce, PlayerEvent, Transition},
    Error, PlaybackState, PlayerConfig, Result,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// Engine signal tagged with the session generation that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub generation: u64,
    pub event: PlayerEvent,
}

impl Envelope {
    pub fn new(generation: u64, event: PlayerEvent) -> Self {
        Self { generation, event }
    }
}

enum Message {
    Event(Envelope),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Synchronous heart of the state machine.
///
/// Owned by the consumer task; public so the folding rules can be driven
/// step by step without a runtime.
pub struct StateCore {
    generation: u64,
    state: PlaybackState,
    publisher: Arc<watch::Sender<PlaybackState>>,
    log_state_changes: bool,
}

impl StateCore {
    pub fn new(publisher: Arc<watch::Sender<PlaybackState>>, log_state_changes: bool) -> Self {
        let state = publisher.borrow().clone();
        Self {
            generation: 0,
            state,
            publisher,
            log_state_changes,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Apply one envelope. Returns the published state, if any.
    pub fn handle(&mut self, envelope: Envelope) -> Option<&PlaybackState> {
        let Envelope { generation, event } = envelope;

        match event {
            PlayerEvent::Reset if generation > self.generation => {
                self.generation = generation;
            }
            _ if generation != self.generation => {
                debug!(
                    generation,
                    current = self.generation,
                    event = ?event,
                    "Dropping event from superseded session"
                );
                return None;
            }
            _ => {}
        }

        match reduce(&self.state, &event) {
            Transition::Publish(next) => {
                if self.log_state_changes {
                    info!(from = %self.state, to = %next, generation, "Playback state");
                } else {
                    debug!(from = %self.state, to = %next, generation, "Playback state");
                }
                self.state = next;
                self.publisher.send_replace(self.state.clone());
                Some(&self.state)
            }
            Transition::Ignore(reason) => {
                if matches!(event, PlayerEvent::Failed(None)) {
                    warn!(generation, "Player failed without any error detail; state unchanged");
                } else {
                    debug!(state = %self.state, event = ?event, reason, "Event ignored");
                }
                None
            }
        }
    }
}

/// Pushes adapter callbacks into the state machine channel
#[derive(Clone)]
struct EventSink {
    tx: mpsc::UnboundedSender<Message>,
    generation: u64,
    active: Arc<AtomicBool>,
}

impl EventSink {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn push(&self, event: PlayerEvent) {
        if !self.is_active() {
            debug!(generation = self.generation, event = ?event, "Callback after unsubscribe");
            return;
        }
        // A closed channel means the state machine is gone; nothing to notify.
        let _ = self.tx.send(Message::Event(Envelope::new(self.generation, event)));
    }
}

struct Inner {
    tx: mpsc::UnboundedSender<Message>,
    publisher: Arc<watch::Sender<PlaybackState>>,
    generation: AtomicU64,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let _ = self.tx.send(Message::Shutdown);
    }
}

/// Handle to the running state machine
#[derive(Clone)]
pub struct PlayerStateMachine {
    inner: Arc<Inner>,
}

impl PlayerStateMachine {
    /// Start the consumer task on the current tokio runtime.
    ///
    /// Panics when called outside a runtime, like `tokio::spawn`.
    pub fn spawn(config: &PlayerConfig) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::Idle);
        let publisher = Arc::new(state_tx);
        let (tx, rx) = mpsc::unbounded_channel();

        let core = StateCore::new(publisher.clone(), config.log_state_changes);
        tokio::spawn(run(core, rx));

        Self {
            inner: Arc::new(Inner {
                tx,
                publisher,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Current published state
    pub fn state(&self) -> PlaybackState {
        self.inner.publisher.borrow().clone()
    }

    /// Subscribe to published states
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.inner.publisher.subscribe()
    }

    /// Generation of the most recent attach
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Start a new session on `item`.
    ///
    /// The caller must have cancelled the previous subscription. Queues a
    /// reset to `Idle` for the new generation, then installs the time
    /// control, status and end-of-item observers.
    pub fn attach(&self, engine: Arc<dyn MediaEngine>, item: ItemId) -> Result<Subscription> {
        let generation = self.reset()?;

        let mut subscription = Subscription::new(engine.clone());
        let sink = EventSink {
            tx: self.inner.tx.clone(),
            generation,
            active: subscription.active_flag(),
        };

        let s = sink.clone();
        subscription.push(engine.observe_time_control(Box::new(move |status| {
            s.push(PlayerEvent::TimeControl(status));
        }))?);

        let s = sink.clone();
        let weak = Arc::downgrade(&engine);
        subscription.push(engine.observe_status(Box::new(move |status| {
            if status == PlayerStatus::Failed && s.is_active() {
                s.push(PlayerEvent::Failed(failure_detail(&weak)));
            }
        }))?);

        let s = sink;
        subscription.push(engine.observe_item_end(
            item,
            Box::new(move || s.push(PlayerEvent::ReachedEnd)),
        )?);

        debug!(generation, item = %item, "Observers attached");
        Ok(subscription)
    }

    /// Open a new generation and queue its reset to `Idle`.
    ///
    /// Events tagged with any earlier generation are dropped from here on.
    pub fn reset(&self) -> Result<u64> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(Message::Event(Envelope::new(generation, PlayerEvent::Reset)))?;
        Ok(generation)
    }

    /// Publish a failure for the current session
    pub fn report_failure(&self, message: impl Into<String>) -> Result<()> {
        let generation = self.generation();
        self.send(Message::Event(Envelope::new(
            generation,
            PlayerEvent::Failed(Some(message.into())),
        )))
    }

    /// Resolves once every message queued before this call was processed
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Message::Flush(done_tx))?;
        done_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Stop the consumer task
    pub fn shutdown(&self) {
        let _ = self.inner.tx.send(Message::Shutdown);
    }

    fn send(&self, message: Message) -> Result<()> {
        self.inner.tx.send(message).map_err(|_| Error::ChannelClosed)
    }
}

/// Read the error sources when a failure fires; faults become the message.
fn failure_detail(engine: &Weak<dyn MediaEngine>) -> Option<String> {
    let engine = engine.upgrade()?;
    match catch_unwind(AssertUnwindSafe(|| extract_error(engine.as_ref()))) {
        Ok(Ok(detail)) => detail,
        Ok(Err(err)) => {
            warn!(error = %err, "Failed to read engine error sources");
            Some(err.state_message())
        }
        Err(_) => {
            warn!("Engine error accessor panicked");
            Some(Error::engine("error extraction panicked").state_message())
        }
    }
}

async fn run(mut core: StateCore, mut rx: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = rx.recv().await {
        match message {
            Message::Event(envelope) => {
                core.handle(envelope);
            }
            Message::Flush(done) => {
                let _ = done.send(());
            }
            Message::Shutdown => break,
        }
    }
    debug!(generation = core.generation(), "State machine stopped");
}
