//! VPNAS RPC - Validated XML-RPC dispatch for VPN appliance management
//!
//! The appliance exposes its management API (users, groups, profiles,
//! certificates, VPN status) as untyped XML-RPC procedures. This crate puts a
//! type-checked calling convention in front of that API.
//!
//! ## What This Library Provides
//! - A method catalog mapping procedure names to parameter contracts
//! - Argument validation against type, nullability and emptiness rules
//! - Binding of positional and named arguments with default synthesis
//! - Translation of remote faults into typed errors
//! - An HTTPS transport with basic authentication
//! - TOML and environment based configuration
//!
//! ## Example
//! ```no_run
//! use vpnas_rpc::{Args, ClientConfig, RpcClient};
//!
//! let config = ClientConfig::from_file("client.toml")?;
//! let client = RpcClient::connect(&config)?;
//! let profiles = client.call(
//!     "UserPropProfileMultiGet",
//!     Args::new().named("pfilt", vec!["alice"]),
//! )?;
//! println!("{profiles}");
//! # Ok::<(), vpnas_rpc::RpcError>(())
//! ```

pub mod binder;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod fault;
pub mod transport;
pub mod validate;
pub mod value;

// Re-export core types
pub use binder::{Args, BoundCall};
pub use catalog::{MethodCatalog, MethodContract, ParamType, ParameterContract};
pub use client::RpcClient;
pub use config::ClientConfig;
pub use error::{Result, RpcError, TypeMismatch};
pub use fault::Fault;
pub use transport::{Transport, TransportError};
pub use value::Value;

#[cfg(feature = "tokio-runtime")]
pub use transport::HttpTransport;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
