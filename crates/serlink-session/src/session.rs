use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use serlink_frame::{encode_frame, FrameCodec, FrameError, DEFAULT_MAX_FRAME, DELIMITER};
use serlink_transport::{Connector, LinkStream};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SessionError};
use crate::event::{EventSink, SessionEvent};

const READ_CHUNK_SIZE: usize = 1024;

const STATE_IDLE: u8 = 0;
const STATE_CONNECTING: u8 = 1;
const STATE_CONNECTED: u8 = 2;
const STATE_TERMINATED: u8 = 3;

/// Session behavior knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sleep applied when a loop pass moved no data in either direction.
    /// Bounds cancellation latency.
    pub idle_delay: Duration,
    /// Maximum bytes buffered while waiting for a frame delimiter. An
    /// inbound frame exceeding this terminates the session.
    pub max_frame_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_millis(5),
            max_frame_size: DEFAULT_MAX_FRAME,
        }
    }
}

/// Session run state.
///
/// Moves strictly forward: Idle → Connecting → Connected → Terminated
/// (Connecting jumps straight to Terminated when the connect attempt
/// fails). Terminated is absorbing; a session cannot be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Terminated,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            STATE_IDLE => SessionState::Idle,
            STATE_CONNECTING => SessionState::Connecting,
            STATE_CONNECTED => SessionState::Connected,
            _ => SessionState::Terminated,
        }
    }
}

struct Shared {
    state: AtomicU8,
    cancel: AtomicBool,
}

struct WorkerParts<C: Connector> {
    connector: C,
    outbound_rx: Receiver<Bytes>,
    sink: Box<dyn EventSink>,
}

/// One logical connection attempt plus its I/O loop.
///
/// The caller's threads issue `start`/`send`/`cancel` and consume events;
/// a single dedicated worker owns the link, the receive buffer, and the
/// outbound drain for the session's whole lifetime. All failures inside
/// the worker surface through the event stream, never through these calls.
pub struct Session<C: Connector> {
    address: String,
    config: SessionConfig,
    shared: Arc<Shared>,
    outbound_tx: Sender<Bytes>,
    worker_parts: Option<WorkerParts<C>>,
    worker: Option<JoinHandle<()>>,
}

impl<C: Connector + 'static> Session<C> {
    /// Create a session targeting `address`, delivering events to `sink`.
    ///
    /// The address is opaque to the session; the connector interprets it.
    /// Nothing happens until [`start`](Self::start) is called.
    pub fn new(address: impl Into<String>, connector: C, sink: impl EventSink) -> Self {
        Self::with_config(address, connector, sink, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(
        address: impl Into<String>,
        connector: C,
        sink: impl EventSink,
        config: SessionConfig,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel();
        Self {
            address: address.into(),
            config,
            shared: Arc::new(Shared {
                state: AtomicU8::new(STATE_IDLE),
                cancel: AtomicBool::new(false),
            }),
            outbound_tx,
            worker_parts: Some(WorkerParts {
                connector,
                outbound_rx,
                sink: Box::new(sink),
            }),
            worker: None,
        }
    }

    /// The remote endpoint this session targets.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current run state.
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Spawn the worker and begin connecting.
    ///
    /// Valid exactly once per session; any further call is a no-op that
    /// returns [`SessionError::AlreadyStarted`] without spawning a second
    /// worker or re-emitting `Connected`.
    pub fn start(&mut self) -> Result<()> {
        if self
            .shared
            .state
            .compare_exchange(
                STATE_IDLE,
                STATE_CONNECTING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(SessionError::AlreadyStarted);
        }

        let Some(parts) = self.worker_parts.take() else {
            return Err(SessionError::AlreadyStarted);
        };

        let address = self.address.clone();
        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);

        self.worker = Some(thread::spawn(move || {
            run_loop(
                &address,
                parts.connector,
                parts.outbound_rx,
                parts.sink,
                &shared,
                &config,
            );
        }));

        Ok(())
    }

    /// Enqueue a payload for the worker to frame and write.
    ///
    /// Non-blocking and callable from any thread. Accepted only while
    /// Connected; otherwise fails fast with
    /// [`SessionError::NotConnected`] — payloads are never queued across
    /// connect or held past termination. Enqueue order is write order.
    pub fn send(&self, payload: impl Into<Bytes>) -> Result<()> {
        let payload = payload.into();

        if let Some(at) = payload.iter().position(|&b| b == DELIMITER) {
            return Err(FrameError::DelimiterInPayload { at }.into());
        }
        if payload.len() > self.config.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: payload.len(),
                max: self.config.max_frame_size,
            }
            .into());
        }

        if self.state() != SessionState::Connected {
            return Err(SessionError::NotConnected);
        }

        self.outbound_tx
            .send(payload)
            .map_err(|_| SessionError::NotConnected)
    }

    /// Request the worker stop at its next checkpoint.
    ///
    /// Idempotent and non-blocking; the caller observes the terminal
    /// `Disconnected` event (and, if needed, [`join`](Self::join)) for
    /// completion.
    pub fn cancel(&self) {
        self.shared.cancel.store(true, Ordering::Release);
    }

    /// Block until the worker has exited. No-op if never started.
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl<C: Connector> Drop for Session<C> {
    // Request cancellation so an abandoned session's worker winds down;
    // does not block on it.
    fn drop(&mut self) {
        self.shared.cancel.store(true, Ordering::Release);
    }
}

/// The worker: connect, then alternate inbound polls and outbound drains
/// until canceled or the link dies, then tear down and report.
fn run_loop<C: Connector>(
    address: &str,
    connector: C,
    outbound: Receiver<Bytes>,
    mut sink: Box<dyn EventSink>,
    shared: &Shared,
    config: &SessionConfig,
) {
    info!(%address, "connecting");

    let mut stream = match connector.connect(address) {
        Ok(stream) => stream,
        Err(err) => {
            error!(%address, %err, "connect failed");
            shared.state.store(STATE_TERMINATED, Ordering::Release);
            sink.emit(SessionEvent::ConnectionFailed(err));
            return;
        }
    };

    info!(%address, "connected");
    shared.state.store(STATE_CONNECTED, Ordering::Release);
    sink.emit(SessionEvent::Connected);

    let mut codec = FrameCodec::with_max_frame(config.max_frame_size);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut scratch = BytesMut::with_capacity(READ_CHUNK_SIZE);

    'session: while !shared.cancel.load(Ordering::Acquire) {
        if !stream.is_open() {
            warn!(%address, "link lost");
            break;
        }

        let mut moved = false;

        // Inbound: whatever the link has pending right now.
        match stream.poll_read(&mut chunk) {
            Ok(0) => {}
            Ok(read) => {
                moved = true;
                for frame in codec.feed(&chunk[..read]) {
                    match frame {
                        Ok(frame) => {
                            debug!(
                                %address,
                                payload = %String::from_utf8_lossy(&frame.payload),
                                "frame received"
                            );
                            sink.emit(SessionEvent::MessageReceived(frame));
                        }
                        Err(err) => {
                            error!(%address, %err, "inbound framing failed");
                            break 'session;
                        }
                    }
                }
            }
            // A failed poll counts as an empty one; persistent loss
            // surfaces through is_open().
            Err(err) => warn!(%address, %err, "read failed"),
        }

        // Outbound: drain everything queued so far, in enqueue order.
        loop {
            match outbound.try_recv() {
                Ok(payload) => {
                    moved = true;
                    scratch.clear();
                    match encode_frame(&payload, &mut scratch) {
                        Ok(()) => match stream.write_all(&scratch) {
                            Ok(()) => debug!(
                                %address,
                                payload = %String::from_utf8_lossy(&payload),
                                "frame sent"
                            ),
                            // Dropped, not retried or requeued.
                            Err(err) => warn!(%address, %err, "write failed, frame dropped"),
                        },
                        Err(err) => warn!(%address, %err, "unframeable payload dropped"),
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        if !moved {
            thread::sleep(config.idle_delay);
        }
    }

    stream.close();
    shared.state.store(STATE_TERMINATED, Ordering::Release);
    info!(%address, "session terminated");
    sink.emit(SessionEvent::Disconnected);
}
