//! Binary step protocol between a camera controller and a simulation host.
//!
//! Records are tagged, fixed-layout and little-endian. Each step the
//! controller sends one packet per device with pending records, followed by
//! an end-of-step marker; the host answers the same way. Every packet is
//! framed with:
//! - A 2-byte magic number ("SC") for stream synchronization
//! - A 4-byte little-endian payload length
//! - A 2-byte little-endian device tag

pub mod buf;
pub mod codec;
pub mod error;
pub mod packet;
pub mod reader;
pub mod record;
pub mod tag;
pub mod writer;

pub use buf::FieldReader;
pub use codec::{
    decode_answer, decode_answers, decode_command, decode_commands, encode_answer, encode_command,
};
pub use error::{Result, WireError};
pub use packet::{decode_packet, encode_packet, Packet, PacketConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use reader::{PacketReader, StepAnswer};
pub use record::{
    Answer, CameraDescriptor, CameraParameters, Command, ImageFrame, RecognizedObject,
};
pub use tag::{tag_name, STEP_END};
pub use writer::PacketWriter;
