use simcam_wire::WireError;

use crate::handle::DeviceHandle;

/// Errors returned by camera operations and the step exchange.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// No camera is registered under the handle.
    #[error("invalid device tag {0}")]
    InvalidHandle(DeviceHandle),

    /// A sampling period below zero.
    #[error("negative sampling period {0}")]
    NegativePeriod(i32),

    /// A parameter outside its accepted range.
    #[error("{what} {value} outside of [{min}, {max}]")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Focal distance changes on a spherical projection.
    #[error("focal distance cannot be set on spherical camera {0}")]
    SphericalFocus(DeviceHandle),

    /// Recognition operation on a camera without a recognition node.
    #[error("camera {0} has no recognition node")]
    NoRecognition(DeviceHandle),

    /// Recognition read while the recognition sampling period is zero.
    #[error("recognition is disabled on camera {0}")]
    RecognitionDisabled(DeviceHandle),

    /// Recognized object index past the end of the current list.
    #[error("recognized object index {index} out of range ({len} objects)")]
    ObjectIndex { index: usize, len: usize },

    /// Image access while the camera sampling period is zero.
    #[error("camera {0} is disabled")]
    Disabled(DeviceHandle),

    /// The host has not delivered a frame yet.
    #[error("no image available for camera {0}")]
    NoImage(DeviceHandle),

    /// A pushed frame does not match the camera resolution.
    #[error("image buffer is {actual} bytes, expected {expected}")]
    ImageSize { expected: usize, actual: usize },

    /// Save requested with an empty path.
    #[error("empty image filename")]
    EmptyFilename,

    /// Save requested with an extension other than PNG or JPEG.
    #[error("unsupported image format (should be PNG or JPEG): {0}")]
    UnsupportedFormat(String),

    /// JPEG quality outside 1-100.
    #[error("invalid JPEG quality {0} (expected 1-100)")]
    InvalidQuality(i32),

    /// Operation only valid in the other backend mode.
    #[error("operation requires {0} mode")]
    WrongMode(&'static str),

    /// Networked operation without a host connection.
    #[error("no connection to the simulation host")]
    NotConnected,

    /// The host sent records for a device it never configured.
    #[error("answer for unconfigured device {0}")]
    UnknownDevice(DeviceHandle),

    /// The answer stream could not be decoded; the link is unusable.
    #[error("protocol desynchronized: {0}")]
    Desynchronized(String),

    /// Wire-level error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Image encoding error.
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

impl DeviceError {
    /// Whether the error means the answer stream can no longer be trusted.
    pub fn is_desync(&self) -> bool {
        match self {
            DeviceError::Wire(err) => err.is_desync(),
            DeviceError::UnknownDevice(_) | DeviceError::Desynchronized(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
