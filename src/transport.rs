//! Byte sink/source seams and a UDP adapter.
//!
//! The codec only exchanges finished byte buffers with these traits. Retries and
//! reconnection belong to callers; nothing here retries.

use crate::config::{Config, ConfigError};
use std::io;
use std::net::UdpSocket;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO: {0}")]
    Io(#[from] io::Error),
    #[error("Config: {0}")]
    Config(#[from] ConfigError),
    #[error("Receive timed out")]
    Timeout,
    #[error("Short send: {sent} of {len} bytes")]
    ShortSend { sent: usize, len: usize },
}

pub trait ByteSink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

pub trait ByteSource {
    /// Receive one message of at most `max_len` bytes.
    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError>;
}

/// Connected UDP socket: bound to `local`, sending to and receiving from `remote`.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    buffer_size: usize,
}

impl UdpTransport {
    pub fn connect(local: &Config, remote: &Config) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(local.socket_addr()?)?;
        socket.connect(remote.socket_addr()?)?;
        socket.set_read_timeout(local.timeout())?;
        log::info!(
            "udp: bound {} -> {} (buffer {} bytes)",
            socket.local_addr()?,
            remote.socket_addr()?,
            local.buffer_size
        );
        Ok(UdpTransport { socket, buffer_size: local.buffer_size })
    }

    /// Receive using the configured buffer size.
    pub fn receive_default(&mut self) -> Result<Vec<u8>, TransportError> {
        self.receive(self.buffer_size)
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }
}

impl ByteSink for UdpTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let sent = self.socket.send(bytes)?;
        if sent != bytes.len() {
            return Err(TransportError::ShortSend { sent, len: bytes.len() });
        }
        log::trace!("udp: sent {} bytes", sent);
        Ok(())
    }
}

impl ByteSource for UdpTransport {
    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; max_len];
        let n = match self.socket.recv(&mut buf) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Err(TransportError::Timeout)
            }
            Err(e) => return Err(e.into()),
        };
        buf.truncate(n);
        log::trace!("udp: received {} bytes", n);
        Ok(buf)
    }
}

/// In-memory sink/source pair, for tests and loopback use.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    queue: std::collections::VecDeque<Vec<u8>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl ByteSink for MemoryChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.queue.push_back(bytes.to_vec());
        Ok(())
    }
}

impl ByteSource for MemoryChannel {
    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let mut msg = self.queue.pop_front().ok_or(TransportError::Timeout)?;
        msg.truncate(max_len);
        Ok(msg)
    }
}
