use std::fs::File;
use std::io::BufWriter;

use bytes::BytesMut;
use simcam_wire::{encode_answer, Answer, Packet, PacketWriter, RecognizedObject};

use crate::cmd::EncodeObjectsArgs;
use crate::exit::{io_error, json_error, wire_error, CliResult, SUCCESS};

pub fn run(args: EncodeObjectsArgs) -> CliResult<i32> {
    let text = std::fs::read_to_string(&args.json).map_err(|err| io_error("read failed", err))?;
    let objects: Vec<RecognizedObject> =
        serde_json::from_str(&text).map_err(|err| json_error("invalid object list", err))?;
    let count = objects.len();

    let mut payload = BytesMut::new();
    encode_answer(&Answer::Objects(objects), &mut payload)
        .map_err(|err| wire_error("encode failed", err))?;

    let file = File::create(&args.output).map_err(|err| io_error("create failed", err))?;
    let mut writer = PacketWriter::new(BufWriter::new(file));
    writer
        .write_step(&[Packet::new(args.device, payload.freeze())], args.duration)
        .map_err(|err| wire_error("write failed", err))?;

    tracing::info!(
        objects = count,
        device = args.device,
        path = %args.output.display(),
        "objects step written"
    );
    Ok(SUCCESS)
}
