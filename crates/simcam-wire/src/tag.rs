//! Record tags and reserved device tags.
//!
//! Every record starts with a one-byte tag. Tags below 0x10 belong to the
//! generic sensor base, tags from 0x10 are camera specific.

/// Full device descriptor (answer).
pub const C_CONFIGURE: u8 = 0x01;

/// Sensor sampling period update (request).
pub const C_SET_SAMPLING_PERIOD: u8 = 0x02;

/// Ask the host for a fresh camera frame (request).
pub const C_CAMERA_GET_IMAGE: u8 = 0x10;

/// Camera frame in BGRA order (answer).
pub const C_CAMERA_IMAGE: u8 = 0x11;

/// Camera parameter overwrite (answer).
pub const C_CAMERA_RECONFIGURE: u8 = 0x12;

/// Recognized object list (answer).
pub const C_CAMERA_OBJECTS: u8 = 0x13;

/// Field-of-view change (request).
pub const C_CAMERA_SET_FOV: u8 = 0x14;

/// Focal distance change (request).
pub const C_CAMERA_SET_FOCAL: u8 = 0x15;

/// Recognition sampling period change (request).
pub const C_CAMERA_SET_RECOGNITION_PERIOD: u8 = 0x16;

/// Device tag carrying the end-of-step marker.
pub const STEP_END: u16 = 0xFFFF;

/// Returns a human-readable name for a record tag.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        C_CONFIGURE => "CONFIGURE",
        C_SET_SAMPLING_PERIOD => "SET_SAMPLING_PERIOD",
        C_CAMERA_GET_IMAGE => "CAMERA_GET_IMAGE",
        C_CAMERA_IMAGE => "CAMERA_IMAGE",
        C_CAMERA_RECONFIGURE => "CAMERA_RECONFIGURE",
        C_CAMERA_OBJECTS => "CAMERA_OBJECTS",
        C_CAMERA_SET_FOV => "CAMERA_SET_FOV",
        C_CAMERA_SET_FOCAL => "CAMERA_SET_FOCAL",
        C_CAMERA_SET_RECOGNITION_PERIOD => "CAMERA_SET_RECOGNITION_PERIOD",
        _ => "UNKNOWN",
    }
}

/// Returns true if the device tag is reserved for protocol use.
pub fn is_reserved_device(device: u16) -> bool {
    device == STEP_END
}
