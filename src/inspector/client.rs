use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, lookup_host};
use tracing::{debug, trace};

use super::codec::MAX_MESSAGE_SIZE;
use crate::utils::error::TransportError;

/// TCP client for the inspector service.
///
/// Every [`call`](InspectorClient::call) opens its own connection, writes one
/// request, reads one response and drops the socket. Nothing is pooled or
/// shared between calls.
#[derive(Debug, Clone)]
pub struct InspectorClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl InspectorClient {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Sends `request` and returns the raw response bytes.
    ///
    /// Resolution, connect, write and read together are bounded by the
    /// client's timeout.
    pub async fn call(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut stream = self.connect().await?;

        stream
            .write_all(request)
            .await
            .map_err(TransportError::Write)?;
        trace!(bytes = request.len(), "request written");

        let mut buf = vec![0u8; MAX_MESSAGE_SIZE];
        let n = stream.read(&mut buf).await.map_err(TransportError::Read)?;
        if n == 0 {
            return Err(TransportError::ConnectionClosed);
        }
        buf.truncate(n);
        trace!(bytes = n, "response read");
        Ok(buf)
    }

    async fn connect(&self) -> Result<TcpStream, TransportError> {
        let candidates = self.resolve().await?;

        let mut last_err = None;
        for addr in candidates {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    debug!(%addr, "connected to inspector");
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(%addr, error = %e, "inspector candidate refused");
                    last_err = Some(TransportError::Connect {
                        addr: addr.to_string(),
                        source: e,
                    });
                }
            }
        }

        Err(last_err.unwrap_or_else(|| TransportError::Resolve {
            host: self.host.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
        }))
    }

    async fn resolve(&self) -> Result<Vec<SocketAddr>, TransportError> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, self.port)]);
        }

        let addrs: Vec<SocketAddr> = lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| TransportError::Resolve {
                host: self.host.clone(),
                source: e,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(TransportError::Resolve {
                host: self.host.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
            });
        }
        Ok(addrs)
    }
}
