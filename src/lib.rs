//! Real-time messaging client.
//!
//! Resolves a websocket endpoint from a bearer token, holds the connection
//! open with a periodic ping, and decodes every pushed frame into an
//! [`events::Event`] for an [`EventSink`]. Decoding lives in the `events`
//! crate; this crate owns the connection.

pub mod config;
pub mod error;
pub mod resolver;
pub mod session;
pub mod sink;

pub use config::ClientConfig;
pub use error::{ConfigError, DialError, Error, ResolveError, SessionError};
pub use events::{DecodeError, Event, EventKind};
pub use resolver::{Account, Endpoint, EndpointResolver, RtmConnectResolver};
pub use session::{CancelHandle, Session, SessionConfig, SessionState, Shutdown, VariantErrorPolicy};
pub use sink::{EventSink, LogSink};
