//! Transport abstraction and the WebSocket implementation
//!
//! The connection driver only sees the [`Transport`] and [`Connector`]
//! traits, so tests can substitute a scripted transport for the real
//! WebSocket.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::TransportError;

/// A live bidirectional connection carrying text frames
#[async_trait]
pub trait Transport: Send {
    /// Send one outbound frame
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Receive the next inbound frame. `None` means the peer closed the
    /// connection.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the connection gracefully
    async fn close(&mut self);
}

/// Creates a fresh transport for each connection attempt
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError>;
}

/// WebSocket transport over TCP
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(frame))
            .await
            .map_err(TransportError::from)
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                // Pings/pongs are handled by tungstenite; binary frames are
                // not part of this protocol
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Connects to the orchestration server's WebSocket endpoint
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        let (stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        tracing::debug!(url = %self.url, "websocket established");
        Ok(Box::new(WsTransport { stream }))
    }
}
