//! Error types for svcdial

use thiserror::Error;

use crate::common::Selector;
use crate::transport::StreamType;

/// Main error type for svcdial
///
/// Discovery and tunnel variants carry the service/namespace/backend/port
/// they were working on, so a failed dial can be diagnosed from the error alone.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid address {addr:?}: {reason}")]
    Address { addr: String, reason: String },

    #[error("failed to look up service {namespace}/{service}: {source}")]
    ServiceLookup {
        service: String,
        namespace: String,
        #[source]
        source: DirectoryError,
    },

    #[error("service {namespace}/{service} has no selector")]
    NoSelector { service: String, namespace: String },

    #[error("service {namespace}/{service} has no backends matching {selector}")]
    NoBackends {
        service: String,
        namespace: String,
        selector: Selector,
    },

    #[error("upgrade to backend {namespace}/{backend} port {port} failed: {source}")]
    Upgrade {
        namespace: String,
        backend: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("creating {stream_type} stream to backend {namespace}/{backend} port {port} failed: {source}")]
    Stream {
        stream_type: StreamType,
        namespace: String,
        backend: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("discovery for {0} cancelled")]
    Cancelled(String),

    #[error("discovery for {0} timed out")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat classification of [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Address,
    ServiceLookup,
    NoSelector,
    NoBackends,
    Upgrade,
    Stream,
    Cancelled,
    Timeout,
    Config,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Address { .. } => ErrorKind::Address,
            Error::ServiceLookup { .. } => ErrorKind::ServiceLookup,
            Error::NoSelector { .. } => ErrorKind::NoSelector,
            Error::NoBackends { .. } => ErrorKind::NoBackends,
            Error::Upgrade { .. } => ErrorKind::Upgrade,
            Error::Stream { .. } => ErrorKind::Stream,
            Error::Cancelled(_) => ErrorKind::Cancelled,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn address(addr: &str, reason: impl Into<String>) -> Self {
        Error::Address {
            addr: addr.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure reported by a [`Directory`](crate::directory::Directory) backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("{kind} {name:?} not found")]
    NotFound { kind: String, name: String },

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for svcdial
pub type Result<T> = std::result::Result<T, Error>;
