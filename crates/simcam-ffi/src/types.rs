use std::ffi::c_void;
use std::os::raw::{c_char, c_int};

use simcam_device::Controller;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimcamResult {
    Ok = 0,
    InvalidArgument = 1,
    InvalidHandle = 2,
    OutOfRange = 3,
    Unsupported = 4,
    Disabled = 5,
    NoImage = 6,
    NotConnected = 7,
    TransportError = 8,
    Desynchronized = 9,
    ImageError = 10,
    Internal = 99,
}

#[allow(dead_code)]
pub const SIMCAM_OK: SimcamResult = SimcamResult::Ok;
#[allow(dead_code)]
pub const SIMCAM_ERR_INVALID_ARGUMENT: SimcamResult = SimcamResult::InvalidArgument;
#[allow(dead_code)]
pub const SIMCAM_ERR_INVALID_HANDLE: SimcamResult = SimcamResult::InvalidHandle;
#[allow(dead_code)]
pub const SIMCAM_ERR_OUT_OF_RANGE: SimcamResult = SimcamResult::OutOfRange;
#[allow(dead_code)]
pub const SIMCAM_ERR_UNSUPPORTED: SimcamResult = SimcamResult::Unsupported;
#[allow(dead_code)]
pub const SIMCAM_ERR_DISABLED: SimcamResult = SimcamResult::Disabled;
#[allow(dead_code)]
pub const SIMCAM_ERR_NO_IMAGE: SimcamResult = SimcamResult::NoImage;
#[allow(dead_code)]
pub const SIMCAM_ERR_NOT_CONNECTED: SimcamResult = SimcamResult::NotConnected;
#[allow(dead_code)]
pub const SIMCAM_ERR_TRANSPORT: SimcamResult = SimcamResult::TransportError;
#[allow(dead_code)]
pub const SIMCAM_ERR_DESYNCHRONIZED: SimcamResult = SimcamResult::Desynchronized;
#[allow(dead_code)]
pub const SIMCAM_ERR_IMAGE: SimcamResult = SimcamResult::ImageError;
#[allow(dead_code)]
pub const SIMCAM_ERR_INTERNAL: SimcamResult = SimcamResult::Internal;

/// Copy of one recognized object.
///
/// Filled by `simcam_camera_recognition_get_object`; release `colors` and
/// `model` with `simcam_recognition_object_free`. When passed to
/// `simcam_camera_recognition_set_objects`, the pointers are owned by the
/// caller and only read.
#[repr(C)]
#[derive(Debug)]
pub struct SimcamRecognitionObject {
    pub id: c_int,
    pub position: [f64; 3],
    pub orientation: [f64; 4],
    pub size: [f64; 2],
    pub position_on_image: [c_int; 2],
    pub size_on_image: [c_int; 2],
    pub number_of_colors: c_int,
    /// `3 * number_of_colors` RGB components.
    pub colors: *mut f64,
    /// NUL-terminated UTF-8 model name.
    pub model: *mut c_char,
}

impl Default for SimcamRecognitionObject {
    fn default() -> Self {
        Self {
            id: 0,
            position: [0.0; 3],
            orientation: [0.0; 4],
            size: [0.0; 2],
            position_on_image: [0; 2],
            size_on_image: [0; 2],
            number_of_colors: 0,
            colors: std::ptr::null_mut(),
            model: std::ptr::null_mut(),
        }
    }
}

/// Copy of one BGRA frame. Release `data` with `simcam_image_free`.
#[repr(C)]
#[derive(Debug)]
pub struct SimcamImage {
    pub width: u16,
    pub height: u16,
    pub data: *mut u8,
    pub len: usize,
}

impl Default for SimcamImage {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            data: std::ptr::null_mut(),
            len: 0,
        }
    }
}

/// Provider callbacks for remote-control mode. Null entries are skipped.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SimcamRemoteProviders {
    pub set_sampling_period: Option<extern "C" fn(tag: u16, period: c_int)>,
    pub set_fov: Option<extern "C" fn(tag: u16, fov: f64)>,
    pub set_focal_distance: Option<extern "C" fn(tag: u16, distance: f64)>,
    pub set_recognition_period: Option<extern "C" fn(tag: u16, period: c_int)>,
}

pub type SimcamControllerHandle = *mut c_void;

pub(crate) struct ControllerHandle {
    pub(crate) controller: Controller,
}
