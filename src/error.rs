//! Error taxonomy. Every fatal condition names the phase it came from.

use tokio_tungstenite::tungstenite;

/// Configuration could not be read from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Parse { var: &'static str, message: String },
}

/// The credential could not be exchanged for a connection endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("missing credential; pass --token or set SLACK_TOKEN")]
    MissingCredential,
    #[error("http client build failed: {0}")]
    HttpClientBuild(#[source] reqwest::Error),
    #[error("http request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("connect rejected: {error}")]
    Rejected { error: String },
    #[error("response did not include a url")]
    MissingUrl,
    #[error("invalid endpoint url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// The websocket connection could not be opened.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DialError(#[source] pub Box<tungstenite::Error>);

/// A running session ended abnormally.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("read: {0}")]
    Read(#[source] Box<tungstenite::Error>),
    #[error("read: reader task stopped before reporting")]
    ReaderStopped,
    #[error("decode: {0}")]
    Decode(#[from] events::DecodeError),
    #[error("write {frame}: {source}")]
    Write {
        frame: &'static str,
        #[source]
        source: Box<tungstenite::Error>,
    },
}

/// Top-level error for a whole client run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("resolve: {0}")]
    Resolve(#[from] ResolveError),
    #[error("dial: {0}")]
    Dial(#[from] DialError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
