use std::fs::File;
use std::io::{BufReader, Read};

use simcam_wire::{decode_answers, PacketReader, WireError};

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, wire_error, CliResult, SUCCESS};
use crate::output::{print_records, OutputFormat, RecordOutput};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.file).map_err(|err| io_error("open failed", err))?;
    let mut records = decode_stream(BufReader::new(file))?;
    if let Some(device) = args.device {
        records.retain(|record| record.device == device);
    }
    print_records(&records, format);
    Ok(SUCCESS)
}

/// Decode every answer record in a stream, numbering steps by their
/// end-of-step markers.
pub fn decode_stream(input: impl Read) -> CliResult<Vec<RecordOutput>> {
    let mut reader = PacketReader::new(input);
    let mut step = 0u64;
    let mut records = Vec::new();

    loop {
        let packet = match reader.read_packet() {
            Ok(packet) => packet,
            Err(WireError::ConnectionClosed) => break,
            Err(err) => return Err(wire_error("read failed", err)),
        };
        if packet.is_step_end() {
            tracing::debug!(step, duration_ms = ?packet.step_duration(), "end of step");
            step += 1;
            continue;
        }

        let device = packet.device;
        let answers = decode_answers(packet.payload)
            .map_err(|err| wire_error(&format!("step {step}, device {device}"), err))?;
        records.extend(
            answers
                .iter()
                .map(|answer| RecordOutput::new(step, device, answer)),
        );
    }

    tracing::debug!(steps = step, records = records.len(), "stream decoded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use simcam_wire::{encode_answer, Answer, CameraParameters, Packet, PacketWriter};

    use super::*;
    use crate::exit::DATA_INVALID;

    fn params() -> CameraParameters {
        CameraParameters {
            fov: 0.8,
            near: 0.01,
            spherical: false,
            min_fov: 0.8,
            max_fov: 0.8,
            has_recognition: false,
            focal_length: 0.0,
            focal_distance: 0.0,
            min_focal_distance: 0.0,
            max_focal_distance: 0.0,
        }
    }

    #[test]
    fn steps_are_numbered_by_markers() {
        let mut payload = BytesMut::new();
        encode_answer(&Answer::Reconfigure(params()), &mut payload).expect("encodes");
        let payload = payload.freeze();

        let mut writer = PacketWriter::new(Cursor::new(Vec::new()));
        writer
            .write_step(&[Packet::new(4, payload.clone())], 32)
            .expect("first step");
        writer.write_step(&[], 32).expect("empty step");
        writer
            .write_step(&[Packet::new(5, payload)], 32)
            .expect("third step");

        let bytes = writer.into_inner().into_inner();
        let records = decode_stream(Cursor::new(bytes)).expect("stream decodes");
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].step, records[0].device), (0, 4));
        assert_eq!((records[1].step, records[1].device), (2, 5));
        assert_eq!(records[1].record, "CAMERA_RECONFIGURE");
    }

    #[test]
    fn unknown_record_is_data_invalid() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::new()));
        writer
            .write_step(&[Packet::new(1, &b"\x7f"[..])], 0)
            .expect("step written");
        let err = decode_stream(Cursor::new(writer.into_inner().into_inner()))
            .expect_err("unknown tag should fail");
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("device 1"));
    }
}
