//! Shared error types for the msghub relay.

use thiserror::Error;

/// Errors surfaced by the transport collaborator.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The peer closed the connection.
    #[error("Connection closed")]
    Closed,

    /// A read or write did not finish within its deadline.
    #[error("Deadline expired after {0:?}")]
    Timeout(std::time::Duration),

    /// An underlying I/O or protocol error.
    #[error("Transport error: {0}")]
    Io(String),
}

/// Top-level error type for hub and client operations.
#[derive(Error, Debug)]
pub enum HubError {
    /// The executor has stopped and no longer accepts commands.
    #[error("Hub executor stopped")]
    HubStopped,

    /// The id generator kept returning identifiers of live agents.
    #[error("No unused agent id after {0} attempts")]
    DuplicateId(usize),

    /// The client could not establish a connection.
    #[error("Connect to {url} failed: {reason}")]
    Connect {
        /// Target URL.
        url: String,
        /// Why it failed.
        reason: String,
    },

    /// A transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Listener bind or accept failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Alias for hub results.
pub type HubResult<T> = Result<T, HubError>;
