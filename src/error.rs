//! Error types and handling for VPN appliance RPC calls
//!
//! Errors come in two layers. Binding errors are raised locally before any
//! request leaves the process; remote faults are raised only after the
//! appliance answers a call with an application-level fault.

use crate::fault::Fault;
use crate::transport::TransportError;
use thiserror::Error;

/// Main error type for RPC operations
#[derive(Error, Debug)]
pub enum RpcError {
    /// Method name is not present in the catalog
    #[error("'RpcClient' object has no attribute '{0}'")]
    MethodNotSupported(String),

    /// More arguments were supplied than the method has parameters
    #[error("{method} expected at most {max} arguments, got {got}")]
    Arity {
        method: String,
        max: usize,
        got: usize,
    },

    /// A parameter received a value twice
    #[error("{method}() got multiple values for argument '{name}'")]
    DuplicateArgument { method: String, name: String },

    /// A named argument does not match any remaining parameter
    #[error("{method}() got an unexpected keyword argument '{name}'")]
    UnknownArgument { method: String, name: String },

    /// An argument failed validation against its parameter contract
    #[error("{0}")]
    TypeMismatch(#[from] TypeMismatch),

    /// A parameter that cannot be synthesized was omitted
    #[error("{method} missing argument '{name}'")]
    MissingRequiredArgument { method: String, name: String },

    /// Fault code 8002
    #[error("Number of parameters is incorrect")]
    ParameterCount { source: Fault },

    /// Fault code 9007
    #[error(
        "Either your credentials are wrong or your permissions are not correct to run the given method."
    )]
    Authorization { source: Fault },

    /// Fault code 9000 relaying a server-side ValueError
    #[error("ValueError from server: {message}")]
    RemoteValue {
        message: String,
        #[source]
        source: Fault,
    },

    /// Fault code 9000 with the internal error sentinel
    #[error("Something unknown went wrong with that call that the server did not like")]
    InternalServer { source: Fault },

    /// Fault code 9000 with the function-not-found sentinel
    #[error("Function not found on given server")]
    UnsupportedRemoteFunction { source: Fault },

    /// Fault code 9000 reporting an unknown username
    #[error("Username could not be found on the server")]
    UsernameNotFound { source: Fault },

    /// Any fault the translator does not recognise
    #[error("Something happened that we were not expecting.\nFault Code: {}\nFault String: \"{}\"", .source.code, .source.message)]
    Unexpected { source: Fault },

    /// Transport failures that are not application-level faults
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Diagnostic for an argument that does not satisfy its parameter contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeMismatch {
    /// The value itself has the wrong type
    #[error("Expected {expected} for arg {param}, got {actual}")]
    WrongType {
        param: String,
        expected: String,
        actual: String,
    },

    /// The container is right but one of its items is not
    #[error("Expected {expected} for arg {param}, got wrong item type")]
    WrongItemType { param: String, expected: String },

    /// Non-nullable string or container parameter received an empty value
    #[error("Expected non-empty {kind} for arg {param}, got empty {kind}")]
    Empty { param: String, kind: String },
}

impl TypeMismatch {
    /// Display name of the parameter that was rejected
    pub fn param(&self) -> &str {
        match self {
            TypeMismatch::WrongType { param, .. }
            | TypeMismatch::WrongItemType { param, .. }
            | TypeMismatch::Empty { param, .. } => param,
        }
    }
}

impl RpcError {
    /// True for errors raised locally while binding arguments
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            RpcError::MethodNotSupported(_)
                | RpcError::Arity { .. }
                | RpcError::DuplicateArgument { .. }
                | RpcError::UnknownArgument { .. }
                | RpcError::TypeMismatch(_)
                | RpcError::MissingRequiredArgument { .. }
        )
    }

    /// True for errors classified from an application-level fault
    pub fn is_remote_fault(&self) -> bool {
        self.fault().is_some()
    }

    /// The original fault behind a remote error
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            RpcError::ParameterCount { source }
            | RpcError::Authorization { source }
            | RpcError::RemoteValue { source, .. }
            | RpcError::InternalServer { source }
            | RpcError::UnsupportedRemoteFunction { source }
            | RpcError::UsernameNotFound { source }
            | RpcError::Unexpected { source } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for RPC operations
pub type Result<T> = std::result::Result<T, RpcError>;

impl From<toml::de::Error> for RpcError {
    fn from(err: toml::de::Error) -> Self {
        RpcError::Config(format!("TOML parsing error: {err}"))
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::Config(format!("JSON parsing error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RpcError::Config("test config error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test config error");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let rpc_err: RpcError = io_err.into();
        assert!(matches!(rpc_err, RpcError::Io(_)));
    }

    #[test]
    fn test_binding_messages() {
        let err = RpcError::Arity {
            method: "TestMethod".to_string(),
            max: 6,
            got: 7,
        };
        assert_eq!(err.to_string(), "TestMethod expected at most 6 arguments, got 7");

        let err = RpcError::DuplicateArgument {
            method: "TestMethod".to_string(),
            name: "required".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "TestMethod() got multiple values for argument 'required'"
        );
        assert!(err.is_binding_error());
        assert!(!err.is_remote_fault());
    }

    #[test]
    fn test_type_mismatch_messages() {
        let err = TypeMismatch::Empty {
            param: "list[str]".to_string(),
            kind: "list".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Expected non-empty list for arg list[str], got empty list"
        );
        assert_eq!(err.param(), "list[str]");
    }

    #[test]
    fn test_unexpected_keeps_fault() {
        let err = RpcError::Unexpected {
            source: Fault::new(1234, "odd"),
        };
        assert!(err.is_remote_fault());
        assert!(!err.is_binding_error());
        assert_eq!(err.fault().map(|f| f.code), Some(1234));
        assert!(err.to_string().contains("Fault Code: 1234"));
        assert!(err.to_string().contains("Fault String: \"odd\""));
    }
}
