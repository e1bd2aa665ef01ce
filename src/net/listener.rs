//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured address and port
//! - Bind, reporting address-in-use and permission failures as structured errors

use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The configured bind address is not an IP address.
    InvalidAddress(String),
    /// Failed to bind to address.
    Bind(SocketAddr, std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::InvalidAddress(addr) => write!(f, "Invalid bind address: {}", addr),
            ListenerError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::InvalidAddress(_) => None,
            ListenerError::Bind(_, e) => Some(e),
        }
    }
}

/// The socket address a listener config asks for.
pub fn socket_addr(config: &ListenerConfig) -> Result<SocketAddr, ListenerError> {
    let ip: IpAddr = config
        .bind_address
        .parse()
        .map_err(|_| ListenerError::InvalidAddress(config.bind_address.clone()))?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let addr = socket_addr(config)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ListenerError::Bind(addr, e))?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(addr),
        "Listener bound"
    );
    Ok(listener)
}
