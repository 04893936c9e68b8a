//! Fault translation
//!
//! Classifies application-level faults returned by the appliance into the
//! typed errors callers handle. Translation is a pure decision list; the
//! first matching row wins.

use crate::error::RpcError;
use thiserror::Error;

/// Wrong number of parameters for the remote method
pub const PARAMETER_COUNT_CODE: i32 = 8002;
/// Bad credentials or insufficient permissions
pub const AUTHORIZATION_CODE: i32 = 9007;
/// Generic relay failure; refined by message
pub const RELAY_CODE: i32 = 9000;

pub const VALUE_ERROR_PREFIX: &str = "XMLRPCRelay: exceptions.ValueError: ";
pub const INTERNAL_ERROR: &str = "XMLRPC: internal error";
pub const FUNCTION_NOT_FOUND: &str = "XMLRPCRelay: XMLRPC: function not found";
pub const USERNAME_NOT_FOUND_PREFIX: &str = "XMLRPCRelay: AUTHRPC_EXCEPT: CertDB: Username";
pub const USERNAME_NOT_FOUND_SUFFIX: &str = "not found";

/// Application-level fault reported by the remote procedure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("XML-RPC fault {code}: {message}")]
pub struct Fault {
    pub code: i32,
    pub message: String,
}

impl Fault {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Classify a fault into the typed error taxonomy
pub fn translate(fault: Fault) -> RpcError {
    let relay = fault.code == RELAY_CODE;
    let message = fault.message.as_str();

    if fault.code == PARAMETER_COUNT_CODE {
        RpcError::ParameterCount { source: fault }
    } else if fault.code == AUTHORIZATION_CODE {
        RpcError::Authorization { source: fault }
    } else if let Some(detail) = message.strip_prefix(VALUE_ERROR_PREFIX).filter(|_| relay) {
        RpcError::RemoteValue {
            message: detail.to_string(),
            source: fault.clone(),
        }
    } else if relay && message == INTERNAL_ERROR {
        RpcError::InternalServer { source: fault }
    } else if relay && message == FUNCTION_NOT_FOUND {
        RpcError::UnsupportedRemoteFunction { source: fault }
    } else if relay
        && message.starts_with(USERNAME_NOT_FOUND_PREFIX)
        && message.ends_with(USERNAME_NOT_FOUND_SUFFIX)
    {
        RpcError::UsernameNotFound { source: fault }
    } else {
        RpcError::Unexpected { source: fault }
    }
}
