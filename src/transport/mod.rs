//! Transports carrying bound calls to the appliance
//!
//! The dispatch layer depends only on [`Transport`]: send a method name and
//! an ordered argument vector, get back a value or a [`TransportError`].

use crate::fault::Fault;
use crate::value::Value;
use thiserror::Error;

#[cfg(feature = "tokio-runtime")]
pub mod http;
pub mod xmlrpc;

#[cfg(feature = "tokio-runtime")]
pub use http::HttpTransport;

/// Failure reported by a transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The remote procedure itself reported a fault
    #[error("{0}")]
    Fault(Fault),

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP status {status}: {reason}")]
    Http { status: u16, reason: String },

    /// Malformed request or response document
    #[error("Codec error: {0}")]
    Codec(String),
}

impl From<Fault> for TransportError {
    fn from(fault: Fault) -> Self {
        TransportError::Fault(fault)
    }
}

/// Sends one remote procedure call and waits for its outcome
pub trait Transport {
    fn send(&self, method: &str, args: &[Value]) -> Result<Value, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, method: &str, args: &[Value]) -> Result<Value, TransportError> {
        (**self).send(method, args)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, method: &str, args: &[Value]) -> Result<Value, TransportError> {
        (**self).send(method, args)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, method: &str, args: &[Value]) -> Result<Value, TransportError> {
        (**self).send(method, args)
    }
}
