//! HTTPS transport for the appliance XML-RPC endpoint
//!
//! Each call is a single POST carrying a `<methodCall>` document with HTTP
//! basic authentication. There is no retry; a failed call is reported once.

use super::{xmlrpc, Transport, TransportError};
use crate::config::ClientConfig;
use crate::error::{Result, RpcError};
use crate::value::Value;
use base64::{engine::general_purpose, Engine};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use url::Url;

/// XML-RPC over HTTPS
pub struct HttpTransport {
    endpoint: Url,
    http_client: Client,
    authorization: String,
    runtime: tokio::runtime::Runtime,
}

impl HttpTransport {
    /// Create a transport from a validated configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.validate()?;

        let mut client_builder = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.server.timeout)))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

        // Configure TLS verification
        if config.server.allow_untrusted {
            log::warn!("Accepting untrusted certificates from {endpoint}");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| RpcError::Config(format!("Failed to create HTTP client: {e}")))?;

        let credentials = general_purpose::STANDARD.encode(format!(
            "{}:{}",
            config.auth.username, config.auth.password
        ));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RpcError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(HttpTransport {
            endpoint,
            http_client,
            authorization: format!("Basic {credentials}"),
            runtime,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one call and decode its response
    pub async fn send_async(&self, method: &str, args: &[Value]) -> std::result::Result<Value, TransportError> {
        let body = xmlrpc::encode_call(method, args)?;
        log::trace!("POST {} ({} bytes)", self.endpoint, body.len());

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, &self.authorization)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(format!("Failed to reach {}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("Failed to read response: {e}")))?;

        xmlrpc::decode_response(&text)
    }
}

impl Transport for HttpTransport {
    /// Blocks the calling thread; must not be used from inside an async runtime
    fn send(&self, method: &str, args: &[Value]) -> std::result::Result<Value, TransportError> {
        self.runtime.block_on(self.send_async(method, args))
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_rejects_invalid_config() {
        let config = ClientConfig::new("http://vpn.example.com/RPC2/", "admin", "secret");
        assert!(matches!(HttpTransport::new(&config), Err(RpcError::Config(_))));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let config = ClientConfig::new("https://vpn.example.com/RPC2/", "admin", "secret");
        let transport = HttpTransport::new(&config).unwrap();
        let rendered = format!("{transport:?}");
        assert!(rendered.contains("vpn.example.com"));
        assert!(!rendered.contains("Basic"));
    }

    #[test]
    fn test_connection_failure_is_network_error() {
        // Bind then drop to find a port with nothing listening
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = ClientConfig::new(format!("https://127.0.0.1:{port}/RPC2/"), "admin", "secret");
        let transport = HttpTransport::new(&config).unwrap();

        let err = transport.send("GetVPNSummary", &[]).unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
