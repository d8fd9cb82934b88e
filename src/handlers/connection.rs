/// Connection handler: owns one accepted connection's read/parse/dispatch/
/// write loop. Frames are newline-delimited JSON with a hard size limit.
/// Protocol-level errors (Malformed, Oversized) keep the connection open;
/// only I/O failures and peer close tear it down.
use std::io;
use std::net::SocketAddr;

use bytes::{Buf, BufMut, BytesMut};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Decoder, Encoder, Framed};

use crate::dispatch::dispatch;
use crate::error::RelayError;
use crate::protocol::{Request, ServerMessage, MAX_FRAME_BYTES};
use crate::registry::{ConnectionHandle, Registries};

/// One decoded wire frame. An oversized frame is reported as its own item
/// rather than a stream error, so the read loop survives it.
#[derive(Debug, PartialEq)]
pub enum Frame {
    Request(String),
    Oversized,
}

/// Newline-delimited framing with a maximum frame length. When a frame runs
/// over the limit the codec discards up to the next newline and resumes.
#[derive(Debug, Default)]
pub struct FrameCodec {
    discarding: bool,
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        if self.discarding {
            match buf.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    buf.advance(pos + 1);
                    self.discarding = false;
                }
                None => {
                    buf.clear();
                    return Ok(None);
                }
            }
        }

        match buf.iter().position(|b| *b == b'\n') {
            Some(pos) if pos > MAX_FRAME_BYTES => {
                // Complete frame over the limit: drop it whole.
                buf.advance(pos + 1);
                Ok(Some(Frame::Oversized))
            }
            Some(pos) => {
                let line = buf.split_to(pos + 1);
                let mut line = &line[..line.len() - 1];
                if line.last() == Some(&b'\r') {
                    line = &line[..line.len() - 1];
                }
                Ok(Some(Frame::Request(
                    String::from_utf8_lossy(line).into_owned(),
                )))
            }
            None if buf.len() > MAX_FRAME_BYTES => {
                // The frame outgrew the limit before its newline arrived:
                // report once, then discard until the newline shows up.
                buf.clear();
                self.discarding = true;
                Ok(Some(Frame::Oversized))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<String> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: String, buf: &mut BytesMut) -> Result<(), io::Error> {
        buf.reserve(item.len() + 1);
        buf.extend_from_slice(item.as_bytes());
        buf.put_u8(b'\n');
        Ok(())
    }
}

/// Run one connection until the peer closes or an I/O error occurs.
///
/// All outbound traffic (responses and relayed forwards from other
/// connections) is queued on an mpsc channel and drained by a single writer
/// task, so registry locks are never held across a socket write.
pub async fn handle_connection(stream: TcpStream, addr: SocketAddr, registries: Registries) {
    let framed = Framed::new(stream, FrameCodec::default());
    let (mut sink, mut frames) = framed.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if sink.send(line).await.is_err() {
                break;
            }
        }
    });

    let conn = ConnectionHandle::new(tx);
    debug!("Connection {} handling {}", conn.conn_id(), addr);

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Frame::Request(line)) => {
                let response = match serde_json::from_str::<Request>(&line) {
                    Ok(request) => dispatch(request, &registries, &conn).await,
                    Err(e) => {
                        warn!("Malformed frame from {}: {}", addr, e);
                        ServerMessage::error(&RelayError::Malformed(e.to_string()))
                    }
                };
                if !conn.send(&response) {
                    break;
                }
            }
            Ok(Frame::Oversized) => {
                warn!("Discarded oversized frame from {}", addr);
                if !conn.send(&ServerMessage::error(&RelayError::Oversized)) {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", addr, e);
                break;
            }
        }
    }

    registries.connections.unbind_on_close(conn.conn_id()).await;
    info!("Client disconnected: {}", addr);

    // Dropping the handle releases the last sender; the writer task drains
    // whatever is still queued and exits.
    drop(conn);
    let _ = writer.await;
}
