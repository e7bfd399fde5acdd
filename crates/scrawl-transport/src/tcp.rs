//! TCP transport with newline framing.
//!
//! Each connection owns a growable receive buffer. Socket reads append
//! to it; `recv` slices complete `\n`-terminated frames off the front
//! and leaves partial frames buffered for the next read.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Upper bound on a single frame. A peer that sends this many bytes
/// without a `\n` loses its connection; nobody else is affected.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

const READ_CHUNK: usize = 4096;

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds the listen socket.
    ///
    /// # Errors
    /// [`TransportError::BindFailed`] — fatal; callers surface this to
    /// the operator before starting any accept loop.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // Low latency matters more than throughput for stroke relays.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%addr, error = %e, "set_nodelay failed");
        }

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted TCP connection");

        let (read_half, write_half) = stream.into_split();
        Ok(TcpConnection {
            id,
            peer: addr,
            reader: Arc::new(Mutex::new(FrameReader {
                half: read_half,
                buf: Vec::new(),
            })),
            writer: Arc::new(Mutex::new(write_half)),
        })
    }
}

/// Receive half plus its framing buffer. The buffer belongs exclusively
/// to this connection's reader — sessions never touch each other's.
struct FrameReader {
    half: OwnedReadHalf,
    buf: Vec<u8>,
}

/// A single framed TCP connection.
///
/// Cheap to clone; the read and write halves are shared, so a clone can
/// live in a writer task while the original drives the read loop.
#[derive(Clone)]
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Arc<Mutex<FrameReader>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpConnection {
    /// Returns the peer's socket address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(frame)
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        loop {
            // Drain buffered frames first; skip empty lines from stray
            // separators so they never reach the codec.
            while let Some(frame) = take_frame(&mut reader.buf) {
                if !frame.is_empty() {
                    return Ok(Some(frame));
                }
            }

            if reader.buf.len() >= MAX_FRAME_LEN {
                return Err(TransportError::FrameTooLong(MAX_FRAME_LEN));
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = reader
                .half
                .read(&mut chunk)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if n == 0 {
                // Orderly shutdown. Any trailing partial frame is dropped,
                // matching the wire contract: a frame isn't a frame until
                // its newline arrives.
                return Ok(None);
            }
            reader.buf.extend_from_slice(&chunk[..n]);
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Slices the next complete frame off the front of `buf`, removing the
/// frame and its `\n` separator. Returns `None` when no separator is
/// buffered yet. A trailing `\r` is stripped so CRLF peers work too.
fn take_frame(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buf.iter().position(|b| *b == b'\n')?;
    let mut frame: Vec<u8> = buf.drain(..=pos).collect();
    frame.pop(); // the \n
    if frame.last() == Some(&b'\r') {
        frame.pop();
    }
    Some(frame)
}
