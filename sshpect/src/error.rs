//! Error types for sshpect.

use std::io;
use thiserror::Error;

/// Main error type for sshpect operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session driver errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

/// Transport layer errors (SSH connection, authentication, host keys).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: russh::Error,
    },

    /// SSH protocol error on an established connection
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key does not match the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host key is not present in known_hosts and strict checking is on
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts file could not be read or updated
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Channel layer errors (pattern compilation, shell I/O).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A pattern list compiled to nothing, so no match is possible
    #[error("No valid patterns to wait for")]
    NoValidPatterns,

    /// I/O error on the shell stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Driver layer errors (session lifecycle, command execution).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Session not connected
    #[error("Session not connected - call open() first")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// Initial shell prompt never arrived
    #[error("Prompt not found within {timeout:?}")]
    PromptNotFound { timeout: std::time::Duration },

    /// Connection was lost and could not be re-established
    #[error("Connection lost")]
    LostConnection,

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Result type alias using sshpect's Error.
pub type Result<T> = std::result::Result<T, Error>;
