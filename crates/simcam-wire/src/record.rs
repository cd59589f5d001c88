//! Typed records exchanged with the simulation host.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::tag;

/// Camera parameters shared by CONFIGURE and RECONFIGURE.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParameters {
    pub fov: f64,
    pub near: f64,
    pub spherical: bool,
    pub min_fov: f64,
    pub max_fov: f64,
    pub has_recognition: bool,
    pub focal_length: f64,
    pub focal_distance: f64,
    pub min_focal_distance: f64,
    pub max_focal_distance: f64,
}

/// Full descriptor sent when the host announces a camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraDescriptor {
    pub id: u32,
    pub width: u16,
    pub height: u16,
    pub params: CameraParameters,
}

/// One object reported by the recognition node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedObject {
    pub id: i32,
    /// Position relative to the camera.
    pub position: [f64; 3],
    /// Orientation relative to the camera, four components as sent by the host.
    pub orientation: [f64; 4],
    /// Physical size (width, height).
    pub size: [f64; 2],
    pub position_on_image: [i32; 2],
    pub size_on_image: [i32; 2],
    /// RGB triples, possibly empty.
    #[serde(default)]
    pub colors: Vec<[f64; 3]>,
    pub model: String,
}

/// Raw camera frame, four bytes per pixel in BGRA order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    pub width: u16,
    pub height: u16,
    pub data: Bytes,
}

impl ImageFrame {
    /// Expected payload length for the given dimensions.
    pub fn expected_len(width: u16, height: u16) -> usize {
        usize::from(width) * usize::from(height) * 4
    }
}

/// Records the controller sends to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetSamplingPeriod(u16),
    GetImage,
    SetFov(f64),
    SetFocalDistance(f64),
    SetRecognitionPeriod(u16),
}

impl Command {
    pub fn tag(&self) -> u8 {
        match self {
            Command::SetSamplingPeriod(_) => tag::C_SET_SAMPLING_PERIOD,
            Command::GetImage => tag::C_CAMERA_GET_IMAGE,
            Command::SetFov(_) => tag::C_CAMERA_SET_FOV,
            Command::SetFocalDistance(_) => tag::C_CAMERA_SET_FOCAL,
            Command::SetRecognitionPeriod(_) => tag::C_CAMERA_SET_RECOGNITION_PERIOD,
        }
    }
}

/// Records the host sends back.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Configure(CameraDescriptor),
    Reconfigure(CameraParameters),
    Objects(Vec<RecognizedObject>),
    Image(ImageFrame),
}

impl Answer {
    pub fn tag(&self) -> u8 {
        match self {
            Answer::Configure(_) => tag::C_CONFIGURE,
            Answer::Reconfigure(_) => tag::C_CAMERA_RECONFIGURE,
            Answer::Objects(_) => tag::C_CAMERA_OBJECTS,
            Answer::Image(_) => tag::C_CAMERA_IMAGE,
        }
    }
}
