use simcam_wire::{packet, tag};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

const RECORD_TAGS: [u8; 9] = [
    tag::C_CONFIGURE,
    tag::C_SET_SAMPLING_PERIOD,
    tag::C_CAMERA_GET_IMAGE,
    tag::C_CAMERA_IMAGE,
    tag::C_CAMERA_RECONFIGURE,
    tag::C_CAMERA_OBJECTS,
    tag::C_CAMERA_SET_FOV,
    tag::C_CAMERA_SET_FOCAL,
    tag::C_CAMERA_SET_RECOGNITION_PERIOD,
];

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("simcam {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "build target: {}",
        option_env!("SIMCAM_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "packet header: {} bytes, magic {:?}, end-of-step device {:#06x}",
        packet::HEADER_SIZE,
        String::from_utf8_lossy(&packet::MAGIC),
        tag::STEP_END
    );
    println!("max payload: {} bytes", packet::DEFAULT_MAX_PAYLOAD);
    println!(
        "default step: {} ms",
        simcam_device::DEFAULT_STEP_DURATION_MS
    );
    println!("record tags:");
    for record in RECORD_TAGS {
        println!("  {record:#04x} {}", tag::tag_name(record));
    }

    Ok(SUCCESS)
}
