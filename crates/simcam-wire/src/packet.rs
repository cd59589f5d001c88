use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::tag::STEP_END;

/// Packet header: magic (2) + length (4) + device (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "SC" (0x53 0x43).
pub const MAGIC: [u8; 2] = [0x53, 0x43];

/// Default maximum payload size: 64 MiB, room for a 4K BGRA frame.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// One device's block of records, or the end-of-step marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Device tag the records belong to.
    pub device: u16,
    /// Concatenated records.
    pub payload: Bytes,
}

impl Packet {
    /// Create a new device packet.
    pub fn new(device: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            device,
            payload: payload.into(),
        }
    }

    /// End-of-step marker carrying the step duration in milliseconds.
    pub fn step_end(duration_ms: u32) -> Self {
        Self {
            device: STEP_END,
            payload: Bytes::copy_from_slice(&duration_ms.to_le_bytes()),
        }
    }

    /// Whether this packet closes a request or an answer.
    pub fn is_step_end(&self) -> bool {
        self.device == STEP_END
    }

    /// Step duration carried by an end-of-step marker.
    pub fn step_duration(&self) -> Option<u32> {
        if !self.is_step_end() || self.payload.len() != 4 {
            return None;
        }
        let mut raw = self.payload.clone();
        Some(raw.get_u32_le())
    }

    /// The total wire size of this packet (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a packet into the wire format.
///
/// ```text
/// ┌──────────────┬───────────┬──────────┬──────────────────┐
/// │ Magic (2B)   │ Length    │ Device   │ Records          │
/// │ 0x53 0x43    │ (4B LE)   │ (2B LE)  │ (Length bytes)   │
/// │ "SC"         │           │          │                  │
/// └──────────────┴───────────┴──────────┴──────────────────┘
/// ```
pub fn encode_packet(device: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(WireError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_u16_le(device);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a packet from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes the packet bytes from the buffer.
pub fn decode_packet(src: &mut BytesMut, max_payload: usize) -> Result<Option<Packet>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(WireError::InvalidMagic);
    }

    let mut header = &src[2..HEADER_SIZE];
    let payload_len = header.get_u32_le() as usize;
    let device = header.get_u16_le();

    if payload_len > max_payload {
        return Err(WireError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Packet { device, payload }))
}

/// Configuration for packet readers and writers.
#[derive(Debug, Clone)]
pub struct PacketConfig {
    /// Maximum payload size in bytes. Default: 64 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
