use serlink_frame::Frame;
use serlink_transport::ConnectError;

/// Session notifications, in the order the worker produced them.
///
/// Lifecycle and data share one stream: `Connected` always comes first,
/// `MessageReceived` frames arrive in wire order, and exactly one terminal
/// event (`Disconnected` or `ConnectionFailed`) closes the stream.
#[derive(Debug)]
pub enum SessionEvent {
    /// The link is up; the session is now Connected.
    Connected,

    /// One complete inbound frame.
    MessageReceived(Frame),

    /// Terminal: the session ended after a successful connect, whether by
    /// `cancel()` or because the link was lost mid-stream.
    Disconnected,

    /// Terminal: the connect attempt itself failed. Emitted instead of
    /// `Disconnected`, never alongside it.
    ConnectionFailed(ConnectError),
}

/// Consumes session events.
///
/// Invoked on the session worker thread, not the caller's. Implementations
/// that touch caller-owned state must hand the event back to their own
/// thread first; the [`std::sync::mpsc::Sender`] impl below does exactly
/// that.
pub trait EventSink: Send + 'static {
    fn emit(&mut self, event: SessionEvent);
}

impl<F> EventSink for F
where
    F: FnMut(SessionEvent) + Send + 'static,
{
    fn emit(&mut self, event: SessionEvent) {
        self(event);
    }
}

impl EventSink for std::sync::mpsc::Sender<SessionEvent> {
    fn emit(&mut self, event: SessionEvent) {
        // A dropped receiver means nobody is listening anymore.
        let _ = self.send(event);
    }
}
