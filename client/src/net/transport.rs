//! Websocket transport to the relay.
//!
//! DESIGN
//! ======
//! `connect` spawns one actor task that owns the socket. Callers queue
//! encoded frames through a bounded channel and receive decoded
//! [`ServerFrame`]s on the channel returned from `connect`. Sends never
//! block: a full queue is reported as [`TransportError::Full`] and the
//! frame is dropped, which suits cursor traffic and is surfaced to callers
//! for everything else.
//!
//! The actor never waits on the consumer. When the inbound channel is full,
//! cursor frames are shed and all other frames wait in an actor-side backlog
//! that drains as the consumer catches up, so a slow reader neither loses
//! document frames nor stalls outbound traffic.
//!
//! LIFECYCLE
//! =========
//! 1. `connect` performs the handshake and spawns the actor
//! 2. Actor forwards outbound text and decodes inbound text frames
//! 3. Socket close/error or `disconnect` ends the actor; `is_connected`
//!    turns false and the inbound channel closes. `disconnect` aborts the
//!    actor if it has not finished within [`DISCONNECT_TIMEOUT`]
//!
//! Undecodable inbound frames are logged and skipped.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use frames::{ClientFrame, CodecError, ServerFrame};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

/// Outbound queue depth before sends start failing with `Full`.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;
/// Inbound buffer between the socket reader and the consumer.
pub const DEFAULT_INBOUND_CAPACITY: usize = 256;
/// How long `disconnect` waits for queued frames to flush before aborting.
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The websocket connection or handshake failed.
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    /// The connection is closed; nothing can be sent.
    #[error("websocket closed")]
    Closed,
    /// The outbound queue is full; the frame was dropped.
    #[error("outbound queue full")]
    Full,
    /// A session may hold only one live connection.
    #[error("already connected")]
    AlreadyConnected,
    /// The frame could not be encoded.
    #[error("frame encode failed: {0}")]
    Codec(#[from] CodecError),
}

/// Handle to a live relay connection.
pub struct Transport {
    outbound: mpsc::Sender<String>,
    connected: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Transport {
    /// Connect to `url` and start the socket actor.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the handshake fails.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<ServerFrame>), TransportError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(Box::new(e)))?;
        info!(url, "transport: connected");

        let (out_tx, out_rx) = mpsc::channel(DEFAULT_OUTBOUND_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel(DEFAULT_INBOUND_CAPACITY);
        let connected = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(run_socket(stream, out_rx, in_tx, connected.clone()));
        Ok((Self { outbound: out_tx, connected, task }, in_rx))
    }

    /// Whether the socket is still open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Queue one frame for sending without waiting.
    ///
    /// # Errors
    ///
    /// Returns `Closed` when the socket is gone, `Full` when the queue is
    /// saturated, and `Codec` if the frame cannot be encoded.
    pub fn send(&self, frame: &ClientFrame) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Closed);
        }
        let text = frames::encode_frame(frame)?;
        self.outbound.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    /// Close the socket after flushing queued frames, and wait for the actor
    /// to exit. The actor is aborted after [`DISCONNECT_TIMEOUT`].
    pub async fn disconnect(self) {
        let Self { outbound, connected, mut task } = self;
        drop(outbound);
        match tokio::time::timeout(DISCONNECT_TIMEOUT, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "transport: socket task failed"),
            Err(_) => {
                warn!("transport: socket task did not finish; aborting");
                task.abort();
            }
        }
        connected.store(false, Ordering::Release);
    }
}

// =============================================================================
// SOCKET ACTOR
// =============================================================================

async fn run_socket(
    stream: WsStream,
    mut outbound: mpsc::Receiver<String>,
    inbound: mpsc::Sender<ServerFrame>,
    connected: Arc<AtomicBool>,
) {
    let (mut sink, mut source) = stream.split();
    let mut backlog: VecDeque<ServerFrame> = VecDeque::new();

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                let Some(text) = queued else {
                    // Handle dropped: close politely.
                    if let Err(e) = sink.send(Message::Close(None)).await {
                        debug!(error = %e, "transport: close send failed");
                    }
                    break;
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    warn!(error = %e, "transport: send failed");
                    break;
                }
            }
            permit = inbound.reserve(), if !backlog.is_empty() => {
                let Ok(permit) = permit else { break };
                if let Some(frame) = backlog.pop_front() {
                    permit.send(frame);
                }
            }
            msg = source.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Some(frame) = decode_inbound(text.as_str()) else {
                            continue;
                        };
                        if !forward_inbound(&inbound, &mut backlog, frame) {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "transport: receive failed");
                        break;
                    }
                }
            }
        }
    }

    connected.store(false, Ordering::Release);
    info!("transport: disconnected");
}

fn decode_inbound(text: &str) -> Option<ServerFrame> {
    match frames::decode_frame::<ServerFrame>(text) {
        Ok(frame) => {
            if !frame.is_cursor() {
                debug!(event = frame.event(), "transport: recv frame");
            }
            Some(frame)
        }
        Err(e) => {
            warn!(error = %e, "transport: invalid inbound frame");
            None
        }
    }
}

/// Hand one frame to the consumer without waiting. Cursor frames are shed
/// when the channel is full; everything else goes to the backlog, behind any
/// frames already there. Returns `false` once nobody is listening.
fn forward_inbound(
    inbound: &mpsc::Sender<ServerFrame>,
    backlog: &mut VecDeque<ServerFrame>,
    frame: ServerFrame,
) -> bool {
    if !backlog.is_empty() {
        if frame.is_cursor() {
            debug!("transport: cursor frame shed");
        } else {
            backlog.push_back(frame);
        }
        return !inbound.is_closed();
    }
    match inbound.try_send(frame) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(frame)) => {
            if frame.is_cursor() {
                debug!("transport: cursor frame shed");
            } else {
                backlog.push_back(frame);
            }
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}
