use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{json, Value};
use simcam_wire::{tag_name, Answer};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One decoded answer record.
#[derive(Debug, Serialize)]
pub struct RecordOutput {
    pub step: u64,
    pub device: u16,
    pub record: &'static str,
    pub summary: String,
    pub detail: Value,
}

impl RecordOutput {
    pub fn new(step: u64, device: u16, answer: &Answer) -> Self {
        Self {
            step,
            device,
            record: tag_name(answer.tag()),
            summary: summarize(answer),
            detail: detail(answer),
        }
    }
}

/// One configured camera, as listed by `inspect`.
#[derive(Debug, Serialize)]
pub struct DeviceOutput {
    pub tag: u16,
    pub width: u16,
    pub height: u16,
    pub fov: f64,
    pub spherical: bool,
    pub recognition: bool,
}

fn summarize(answer: &Answer) -> String {
    match answer {
        Answer::Configure(desc) => format!(
            "id={} {}x{} fov={:.3} recognition={}",
            desc.id, desc.width, desc.height, desc.params.fov, desc.params.has_recognition
        ),
        Answer::Reconfigure(params) => format!(
            "fov={:.3} range=[{:.3}, {:.3}] focal={:.3}",
            params.fov, params.min_fov, params.max_fov, params.focal_distance
        ),
        Answer::Objects(objects) => {
            let models: Vec<&str> = objects.iter().map(|o| o.model.as_str()).collect();
            format!("{} objects [{}]", objects.len(), models.join(", "))
        }
        Answer::Image(frame) => format!(
            "{}x{} ({} bytes)",
            frame.width,
            frame.height,
            frame.data.len()
        ),
    }
}

fn detail(answer: &Answer) -> Value {
    let value = match answer {
        Answer::Configure(desc) => serde_json::to_value(desc),
        Answer::Reconfigure(params) => serde_json::to_value(params),
        Answer::Objects(objects) => serde_json::to_value(objects),
        Answer::Image(frame) => Ok(json!({
            "width": frame.width,
            "height": frame.height,
            "bytes": frame.data.len(),
        })),
    };
    value.unwrap_or(Value::Null)
}

pub fn print_records(records: &[RecordOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for record in records {
                println!(
                    "{}",
                    serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["STEP", "DEVICE", "RECORD", "SUMMARY"]);
            for record in records {
                table.add_row(vec![
                    record.step.to_string(),
                    record.device.to_string(),
                    record.record.to_string(),
                    record.summary.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                println!(
                    "step={} device={} {} {}",
                    record.step, record.device, record.record, record.summary
                );
            }
        }
    }
}

pub fn print_devices(devices: &[DeviceOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for device in devices {
                println!(
                    "{}",
                    serde_json::to_string(device).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TAG", "SIZE", "FOV", "PROJECTION", "RECOGNITION"]);
            for device in devices {
                table.add_row(vec![
                    device.tag.to_string(),
                    format!("{}x{}", device.width, device.height),
                    format!("{:.3}", device.fov),
                    projection(device.spherical).to_string(),
                    device.recognition.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for device in devices {
                println!(
                    "tag={} size={}x{} fov={:.3} projection={} recognition={}",
                    device.tag,
                    device.width,
                    device.height,
                    device.fov,
                    projection(device.spherical),
                    device.recognition
                );
            }
        }
    }
}

fn projection(spherical: bool) -> &'static str {
    if spherical {
        "spherical"
    } else {
        "planar"
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use simcam_wire::{ImageFrame, RecognizedObject};

    use super::*;

    #[test]
    fn image_detail_omits_pixels() {
        let record = RecordOutput::new(
            3,
            1,
            &Answer::Image(ImageFrame {
                width: 2,
                height: 1,
                data: Bytes::from_static(&[0; 8]),
            }),
        );
        assert_eq!(record.record, "CAMERA_IMAGE");
        assert_eq!(record.summary, "2x1 (8 bytes)");
        assert_eq!(record.detail["bytes"], 8);
    }

    #[test]
    fn objects_summary_lists_models() {
        let object = RecognizedObject {
            id: 4,
            position: [0.0; 3],
            orientation: [0.0; 4],
            size: [0.0; 2],
            position_on_image: [0; 2],
            size_on_image: [0; 2],
            colors: vec![[1.0, 0.0, 0.0]],
            model: "can".to_string(),
        };
        let record = RecordOutput::new(0, 2, &Answer::Objects(vec![object]));
        assert_eq!(record.summary, "1 objects [can]");
        assert_eq!(record.detail[0]["model"], "can");
        assert_eq!(record.detail[0]["colors"][0][0], 1.0);
    }
}
