//! RPC Client - dispatch facade over a transport
//!
//! This module provides the main [`RpcClient`] struct: look a method up in the
//! catalog, bind and validate the caller's arguments, send the bound call and
//! classify any application-level fault the appliance returns.

use crate::binder::{self, Args, BoundCall};
use crate::catalog::MethodCatalog;
use crate::error::Result;
use crate::fault;
use crate::transport::{Transport, TransportError};
use crate::value::Value;
use std::sync::Arc;

#[cfg(feature = "tokio-runtime")]
use crate::config::ClientConfig;
#[cfg(feature = "tokio-runtime")]
use crate::transport::HttpTransport;

/// Validated method dispatch against the appliance
///
/// The catalog is shared read-only; any number of clients may hold the same
/// `Arc<MethodCatalog>`. Each call is a single blocking request with no
/// retry, and produces exactly one outcome.
#[derive(Debug)]
pub struct RpcClient<T: Transport> {
    catalog: Arc<MethodCatalog>,
    transport: T,
}

impl<T: Transport> RpcClient<T> {
    /// Create a client from an already-loaded catalog and a transport
    pub fn new(catalog: Arc<MethodCatalog>, transport: T) -> Self {
        Self { catalog, transport }
    }

    /// Invoke a remote method by name
    ///
    /// # Errors
    /// Binding errors are returned before anything is sent. Faults reported
    /// by the appliance are translated into their typed kinds; other
    /// transport failures are returned unchanged as [`RpcError::Transport`].
    ///
    /// [`RpcError::Transport`]: crate::error::RpcError::Transport
    pub fn call(&self, method: &str, args: Args) -> Result<Value> {
        let call = self.bind(method, &args)?;
        self.dispatch(&call)
    }

    /// Look up and bind without sending
    pub fn bind(&self, method: &str, args: &Args) -> Result<BoundCall> {
        let contract = self.catalog.lookup(method)?;
        let call = binder::bind(contract, args)?;
        log::debug!("{}({})", call.method(), call.redacted(contract));
        Ok(call)
    }

    fn dispatch(&self, call: &BoundCall) -> Result<Value> {
        match self.transport.send(call.method(), call.args()) {
            Ok(value) => Ok(value),
            Err(TransportError::Fault(remote)) => {
                log::debug!("{} returned {remote}", call.method());
                Err(fault::translate(remote))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Whether the catalog knows a method
    pub fn supports(&self, method: &str) -> bool {
        self.catalog.contains(method)
    }

    /// Names of all catalogued methods, sorted
    pub fn methods(&self) -> Vec<&str> {
        self.catalog.names()
    }

    pub fn catalog(&self) -> &Arc<MethodCatalog> {
        &self.catalog
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(feature = "tokio-runtime")]
impl RpcClient<HttpTransport> {
    /// Build an HTTPS client from configuration
    ///
    /// Loads the catalog named in the configuration, or the builtin one.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let catalog = match &config.catalog.path {
            Some(path) => MethodCatalog::from_file(path)?,
            None => MethodCatalog::builtin()?,
        };
        let transport = HttpTransport::new(config)?;
        log::info!(
            "Connected client for {} with {} methods",
            transport.endpoint(),
            catalog.len()
        );
        Ok(Self::new(Arc::new(catalog), transport))
    }
}
