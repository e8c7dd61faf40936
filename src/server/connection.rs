//! Per-connection handling
//!
//! Each accepted socket gets one `Connection`: a read loop framing
//! newline-delimited JSON into inbound events, and a writer task draining the
//! connection's notification channel back onto the socket. The connection's
//! [`ClientHandle`] is handed to the dispatcher so any component can push
//! notifications to this party.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::notify::{ClientHandle, HandleId};
use crate::protocol::event::{InboundEvent, OutboundEvent};
use crate::server::config::ServerConfig;

/// One connected party
pub struct Connection {
    handle: ClientHandle,
    rx: mpsc::UnboundedReceiver<OutboundEvent>,
    socket: TcpStream,
    peer_addr: SocketAddr,
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Connection {
    /// Wrap an accepted socket
    pub fn new(
        handle_id: HandleId,
        socket: TcpStream,
        peer_addr: SocketAddr,
        config: ServerConfig,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let (handle, rx) = ClientHandle::channel(handle_id);

        Self {
            handle,
            rx,
            socket,
            peer_addr,
            config,
            dispatcher,
        }
    }

    /// Drive the connection until the peer goes away
    ///
    /// Whatever ends the connection (EOF, I/O error, oversized frame), the
    /// dispatcher is told exactly once so registry and session cleanup run.
    pub async fn run(self) -> Result<()> {
        let Connection {
            handle,
            mut rx,
            socket,
            peer_addr,
            config,
            dispatcher,
        } = self;

        let handle_id = handle.id();
        dispatcher.connect(handle.clone()).await;

        let (mut reader, writer) = socket.into_split();
        let writer_task = tokio::spawn(async move {
            write_loop(writer, &mut rx).await;
        });

        let mut buf = BytesMut::with_capacity(config.read_buffer_size);
        let result = loop {
            match reader.read_buf(&mut buf).await {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            }

            while let Some(frame) = split_frame(&mut buf) {
                process_frame(&dispatcher, &handle, &frame).await;
            }

            if buf.len() > config.max_frame_size {
                tracing::warn!(
                    handle_id = %handle_id,
                    peer = %peer_addr,
                    buffered = buf.len(),
                    "Frame exceeds size limit, closing connection"
                );
                break Ok(());
            }
        };

        dispatcher.disconnect(handle_id).await;
        writer_task.abort();

        result
    }
}

/// Drain outbound notifications onto the socket
async fn write_loop(mut writer: OwnedWriteHalf, rx: &mut mpsc::UnboundedReceiver<OutboundEvent>) {
    while let Some(event) = rx.recv().await {
        let mut frame = match serde_json::to_vec(&event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode outbound event");
                continue;
            }
        };
        frame.push(b'\n');

        if writer.write_all(&frame).await.is_err() {
            // Socket gone; the read loop will notice and clean up
            break;
        }
    }
}

/// Take one newline-terminated frame out of the buffer, if present
fn split_frame(buf: &mut BytesMut) -> Option<BytesMut> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    let mut frame = buf.split_to(pos + 1);
    frame.truncate(pos);
    Some(frame)
}

/// Decode and dispatch one inbound frame
async fn process_frame(dispatcher: &Dispatcher, handle: &ClientHandle, frame: &[u8]) {
    let trimmed = trim_frame(frame);
    if trimmed.is_empty() {
        return;
    }

    match serde_json::from_slice::<InboundEvent>(trimmed) {
        Ok(event) => {
            tracing::trace!(handle_id = %handle.id(), event = event.name(), "Event received");
            dispatcher.handle_event(handle, event).await;
        }
        Err(e) => {
            tracing::warn!(handle_id = %handle.id(), error = %e, "Dropping malformed frame");
        }
    }
}

fn trim_frame(frame: &[u8]) -> &[u8] {
    let start = frame
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(frame.len());
    let end = frame
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|p| p + 1)
        .unwrap_or(start);
    &frame[start..end]
}
