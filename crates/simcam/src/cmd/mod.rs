use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode_objects;
pub mod inspect;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a captured host answer stream.
    Decode(DecodeArgs),
    /// Write an OBJECTS answer stream from a JSON object list.
    EncodeObjects(EncodeObjectsArgs),
    /// Connect to a host, run a few steps and list its cameras.
    Inspect(InspectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::EncodeObjects(args) => encode_objects::run(args),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Captured stream of answer packets.
    pub file: PathBuf,
    /// Only show records for this device tag.
    #[arg(long)]
    pub device: Option<u16>,
}

#[derive(Args, Debug)]
pub struct EncodeObjectsArgs {
    /// JSON array of recognized objects.
    pub json: PathBuf,
    /// Device tag the records are addressed to.
    #[arg(long, short = 'd')]
    pub device: u16,
    /// Output file.
    #[arg(long, short = 'o')]
    pub output: PathBuf,
    /// Step duration written in the end-of-step marker, in milliseconds.
    #[arg(long, default_value = "32")]
    pub duration: u32,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Host socket path.
    pub path: PathBuf,
    /// Number of steps to run before listing cameras.
    #[arg(long, default_value = "1")]
    pub steps: u32,
    /// Step duration in milliseconds.
    #[arg(long, default_value = "32")]
    pub duration: u32,
    /// Read/write timeout in milliseconds.
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
