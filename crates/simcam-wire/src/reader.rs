use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::error::{Result, WireError};
use crate::packet::{decode_packet, Packet, PacketConfig};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Device packets of one answer, closed by the end-of-step marker.
#[derive(Debug, Clone, PartialEq)]
pub struct StepAnswer {
    pub packets: Vec<Packet>,
    pub duration_ms: u32,
}

/// Reads complete packets from any `Read` stream.
///
/// Partial reads are buffered internally; callers always get whole packets.
pub struct PacketReader<T> {
    inner: T,
    buf: BytesMut,
    config: PacketConfig,
}

impl<T: Read> PacketReader<T> {
    /// Create a new packet reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, PacketConfig::default())
    }

    /// Create a new packet reader with explicit configuration.
    pub fn with_config(inner: T, config: PacketConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete packet (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` when EOF is reached.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = decode_packet(&mut self.buf, self.config.max_payload_size)? {
                tracing::trace!(
                    device = packet.device,
                    size = packet.payload.len(),
                    "packet received"
                );
                return Ok(packet);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                return Err(WireError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read device packets up to and including the end-of-step marker.
    pub fn read_step(&mut self) -> Result<StepAnswer> {
        let mut packets = Vec::new();
        loop {
            let packet = self.read_packet()?;
            if packet.is_step_end() {
                let duration_ms = packet.step_duration().ok_or(WireError::Truncated {
                    field: "step duration",
                    needed: 4,
                    remaining: packet.payload.len(),
                })?;
                return Ok(StepAnswer {
                    packets,
                    duration_ms,
                });
            }
            packets.push(packet);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current packet reader configuration.
    pub fn config(&self) -> &PacketConfig {
        &self.config
    }
}

#[cfg(unix)]
impl PacketReader<std::os::unix::net::UnixStream> {
    /// Create a packet reader for a Unix stream and apply the read timeout.
    pub fn with_config_unix(
        inner: std::os::unix::net::UnixStream,
        config: PacketConfig,
    ) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
