//! WebSocket transport and per-connection event loop.
//!
//! Each [`Transport::open`] spawns a tokio task that:
//!
//! - Connects to the server with `tokio-tungstenite`
//! - Forwards incoming text frames as [`TransportEvent::Message`]
//! - Writes frames queued on the connection's [`Link`]
//! - Reports the close code when the stream ends

// ============================================================================
// Imports
// ============================================================================

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};
use url::Url;

use crate::identifiers::ConnectionId;

use super::{CloseCode, OutboundFrame, Transport, TransportEvent, TransportHandle};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type WsWrite = SplitSink<WsStream, Message>;

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Transport over a WebSocket client connection.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Creates a WebSocket transport.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    fn open(&self, address: &Url) -> TransportHandle {
        let (handle, events_tx, frames_rx) = TransportHandle::channel();

        tokio::spawn(run_connection(
            handle.id(),
            address.clone(),
            events_tx,
            frames_rx,
        ));

        handle
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Drives one connection from connect to close.
async fn run_connection(
    id: ConnectionId,
    address: Url,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut frames: mpsc::UnboundedReceiver<OutboundFrame>,
) {
    let ws_stream = tokio::select! {
        result = tokio_tungstenite::connect_async(address.as_str()) => match result {
            Ok((ws_stream, _response)) => ws_stream,
            Err(e) => {
                debug!(connection = %id, error = %e, "WebSocket connect failed");
                let _ = events.send(TransportEvent::Errored(e.to_string()));
                let _ = events.send(TransportEvent::Closed(CloseCode::ABNORMAL));
                return;
            }
        },

        // Handle dropped while connecting
        _ = events.closed() => {
            trace!(connection = %id, "Connect abandoned");
            return;
        }
    };

    if events.send(TransportEvent::Opened).is_err() {
        let mut ws_stream = ws_stream;
        let _ = ws_stream.close(None).await;
        return;
    }

    let (mut ws_write, mut ws_read) = ws_stream.split();

    let code = loop {
        tokio::select! {
            // Incoming frames from server
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(TransportEvent::Message(text.as_str().to_owned())).is_err() {
                            let _ = ws_write.close().await;
                            break CloseCode::NORMAL;
                        }
                    }

                    Some(Ok(Message::Close(frame))) => {
                        let code = frame
                            .map(|f| CloseCode(u16::from(f.code)))
                            .unwrap_or(CloseCode::NO_STATUS);
                        debug!(connection = %id, %code, "WebSocket closed by remote");
                        break code;
                    }

                    Some(Err(e)) => {
                        warn!(connection = %id, error = %e, "WebSocket error");
                        let _ = events.send(TransportEvent::Errored(e.to_string()));
                        break CloseCode::ABNORMAL;
                    }

                    None => {
                        debug!(connection = %id, "WebSocket stream ended");
                        break CloseCode::ABNORMAL;
                    }

                    // Ignore Binary, Ping, Pong, raw Frame
                    _ => {}
                }
            }

            // Frames queued on the link
            frame = frames.recv() => {
                match frame {
                    Some(OutboundFrame::Close) | None => {
                        debug!(connection = %id, "Closing WebSocket");
                        let _ = ws_write.close().await;
                        break CloseCode::NORMAL;
                    }

                    Some(frame) => {
                        if let Err(e) = write_frame(&mut ws_write, frame).await {
                            warn!(connection = %id, error = %e, "Failed to write frame");
                        }
                    }
                }
            }
        }
    };

    let _ = events.send(TransportEvent::Closed(code));
    trace!(connection = %id, "Connection task terminated");
}

/// Writes one text or ping frame.
async fn write_frame(
    ws_write: &mut WsWrite,
    frame: OutboundFrame,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    match frame {
        OutboundFrame::Text(text) => ws_write.send(Message::Text(text.into())).await,
        OutboundFrame::Ping => ws_write.send(Message::Ping(Default::default())).await,
        OutboundFrame::Close => ws_write.close().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
