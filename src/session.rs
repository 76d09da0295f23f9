//! Session: one websocket connection from dial to teardown.
//!
//! DESIGN
//! ======
//! Two tasks share the connection without locks. A spawned reader owns the
//! read half: it decodes every inbound frame and hands the event to the
//! sink, then reports how it stopped over a oneshot channel. The foreground
//! task owns the write half and waits in one `select!` on the heartbeat
//! timer, the cancellation token, and the reader's report.
//!
//! LIFECYCLE
//! =========
//! `Idle → Connecting → Open → Closing → Closed`
//!
//! - Reader stops (remote close, read error, fatal decode) → Closing → Closed.
//!   No close frame is sent; the peer is already gone or untrusted.
//! - Heartbeat write fails → Closing → Closed with a write error.
//! - Cancelled → send a normal-closure frame, wait up to the grace period
//!   for the reader to finish, then abort it.
//!
//! Nothing is retried. A caller that wants to reconnect builds a new Session.

use std::time::Duration;

use events::Ping;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DialError, Error, SessionError};
use crate::resolver::{Endpoint, EndpointResolver};
use crate::sink::EventSink;

const MIN_HEARTBEAT: Duration = Duration::from_millis(1);

// =============================================================================
// CONFIG
// =============================================================================

/// What the reader does with a frame whose type is known but whose fields
/// do not fit the record shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VariantErrorPolicy {
    /// Log the frame and keep reading.
    #[default]
    Skip,
    /// End the session with a decode error.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub heartbeat_interval: Duration,
    pub close_grace: Duration,
    pub variant_errors: VariantErrorPolicy,
    pub ping: Ping,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            close_grace: Duration::from_secs(1),
            variant_errors: VariantErrorPolicy::Skip,
            ping: Ping::default(),
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

/// How a session ended when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Local cancellation; the close handshake was attempted.
    Cancelled,
    /// The peer closed the connection or the stream ended.
    RemoteClosed,
}

/// Requests graceful shutdown of a session. Cloneable and idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// How the reader task stopped.
#[derive(Debug)]
enum ReadOutcome {
    RemoteClosed,
    Failed(SessionError),
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    config: SessionConfig,
    cancel: CancellationToken,
    state: watch::Sender<SessionState>,
}

impl Session {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            config,
            cancel: CancellationToken::new(),
            state,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Handle that stays valid after the session is consumed by
    /// [`Session::connect`], [`Session::start`] or [`Session::run`].
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Observe state changes, including after the session is consumed.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolve an endpoint for `credential`, then [`Session::start`].
    ///
    /// # Errors
    ///
    /// [`Error::Resolve`] if the exchange fails (the connection is never
    /// opened), otherwise anything [`Session::start`] returns. Cancellation
    /// during the exchange ends as [`Shutdown::Cancelled`].
    pub async fn connect<R, K>(self, resolver: &R, credential: &str, sink: K) -> Result<Shutdown, Error>
    where
        R: EndpointResolver + ?Sized,
        K: EventSink,
    {
        let resolved = tokio::select! {
            result = resolver.resolve(credential) => result,
            () = self.cancel.cancelled() => {
                info!("session: cancelled while resolving");
                self.transition(SessionState::Closed);
                return Ok(Shutdown::Cancelled);
            }
        };

        let endpoint = match resolved {
            Ok(endpoint) => endpoint,
            Err(e) => {
                self.transition(SessionState::Closed);
                return Err(e.into());
            }
        };
        self.start(&endpoint, sink).await
    }

    /// Open the connection to `endpoint` and run it until it ends.
    ///
    /// # Errors
    ///
    /// [`Error::Dial`] if the websocket handshake fails, or
    /// [`Error::Session`] for a failure while open.
    pub async fn start<K: EventSink>(self, endpoint: &Endpoint, sink: K) -> Result<Shutdown, Error> {
        self.transition(SessionState::Connecting);
        info!(host = endpoint.url().host_str().unwrap_or("-"), "session: connecting");

        let dialed = tokio::select! {
            result = tokio_tungstenite::connect_async(endpoint.as_str()) => result,
            () = self.cancel.cancelled() => {
                info!("session: cancelled while connecting");
                self.transition(SessionState::Closed);
                return Ok(Shutdown::Cancelled);
            }
        };

        let stream = match dialed {
            Ok((stream, _response)) => stream,
            Err(e) => {
                warn!(error = %e, "session: dial failed");
                self.transition(SessionState::Closed);
                return Err(DialError(Box::new(e)).into());
            }
        };

        Ok(self.run(stream, sink).await?)
    }

    /// Drive an already-open websocket until it ends.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionError`] that ended the session. A cancellation
    /// or a remote close is `Ok`.
    pub async fn run<S, K>(self, stream: WebSocketStream<S>, sink: K) -> Result<Shutdown, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        K: EventSink,
    {
        let (mut writer, reader) = stream.split();
        let (done_tx, mut done_rx) = oneshot::channel();
        let reader_task = tokio::spawn(read_loop(reader, sink, self.config.variant_errors, done_tx));
        self.transition(SessionState::Open);

        let period = self.config.heartbeat_interval.max(MIN_HEARTBEAT);
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let ping = events::encode_ping(&self.config.ping);

        let result = loop {
            tokio::select! {
                outcome = &mut done_rx => {
                    self.transition(SessionState::Closing);
                    break match outcome {
                        Ok(ReadOutcome::RemoteClosed) => Ok(Shutdown::RemoteClosed),
                        Ok(ReadOutcome::Failed(e)) => Err(e),
                        Err(_) => Err(SessionError::ReaderStopped),
                    };
                }
                _ = heartbeat.tick() => {
                    if let Err(e) = writer.send(Message::text(ping.clone())).await {
                        warn!(error = %e, "session: ping write failed");
                        self.transition(SessionState::Closing);
                        break Err(SessionError::Write { frame: "ping", source: Box::new(e) });
                    }
                    debug!(payload = %ping, "session: ping sent");
                }
                () = self.cancel.cancelled() => {
                    self.transition(SessionState::Closing);
                    break self.close(&mut writer, &mut done_rx).await;
                }
            }
        };

        reader_task.abort();
        self.transition(SessionState::Closed);
        match &result {
            Ok(shutdown) => info!(?shutdown, "session: ended"),
            Err(e) => warn!(error = %e, "session: ended with error"),
        }
        result
    }

    /// Send a normal-closure frame and give the reader one grace period to
    /// see the peer's close.
    async fn close<S>(
        &self,
        writer: &mut SplitSink<WebSocketStream<S>, Message>,
        done: &mut oneshot::Receiver<ReadOutcome>,
    ) -> Result<Shutdown, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        info!("session: cancellation requested, closing");
        let deadline = Instant::now() + self.config.close_grace;
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: String::new().into(),
        };

        match tokio::time::timeout_at(deadline, writer.send(Message::Close(Some(frame)))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "session: close write failed");
                return Err(SessionError::Write { frame: "close", source: Box::new(e) });
            }
            Err(_) => {
                warn!("session: close write did not finish within grace period");
                return Ok(Shutdown::Cancelled);
            }
        }

        if tokio::time::timeout_at(deadline, done).await.is_ok() {
            debug!("session: reader finished within grace period");
        } else {
            warn!(
                grace_ms = u64::try_from(self.config.close_grace.as_millis()).unwrap_or(u64::MAX),
                "session: grace period elapsed, forcing teardown"
            );
        }
        Ok(Shutdown::Cancelled)
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = ?previous, to = ?next, "session: state");
        }
    }
}

// =============================================================================
// READER
// =============================================================================

async fn read_loop<St, K>(
    mut reader: St,
    mut sink: K,
    policy: VariantErrorPolicy,
    done: oneshot::Sender<ReadOutcome>,
) where
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    K: EventSink,
{
    let outcome = pump(&mut reader, &mut sink, policy).await;
    // The foreground may already have stopped listening.
    let _ = done.send(outcome);
}

/// Decode frames into `sink` until the stream stops or a frame is fatal.
async fn pump<St, K>(reader: &mut St, sink: &mut K, policy: VariantErrorPolicy) -> ReadOutcome
where
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    K: EventSink,
{
    while let Some(message) = reader.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "session: read failed");
                return ReadOutcome::Failed(SessionError::Read(Box::new(e)));
            }
        };

        let payload: &[u8] = match &message {
            Message::Text(text) => text.as_bytes(),
            Message::Binary(bytes) => &bytes[..],
            Message::Close(frame) => {
                info!(?frame, "session: remote closed");
                return ReadOutcome::RemoteClosed;
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        };
        debug!(frame = %String::from_utf8_lossy(payload), "session: recv");

        match events::decode_event(payload) {
            Ok(event) => sink.deliver(event),
            Err(e) if e.is_fatal() || policy == VariantErrorPolicy::Fatal => {
                warn!(error = %e, "session: undecodable frame");
                return ReadOutcome::Failed(e.into());
            }
            Err(e) => warn!(error = %e, "session: skipping malformed frame"),
        }
    }

    info!("session: stream ended");
    ReadOutcome::RemoteClosed
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
