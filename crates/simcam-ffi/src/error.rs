use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use simcam_device::DeviceError;

use crate::types::SimcamResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> SimcamResult {
    set_error_message(message);
    SimcamResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_device_error(err: &DeviceError) -> SimcamResult {
    set_error_message(err.to_string());
    match err {
        DeviceError::InvalidHandle(_) => SimcamResult::InvalidHandle,
        DeviceError::NegativePeriod(_)
        | DeviceError::OutOfRange { .. }
        | DeviceError::ObjectIndex { .. }
        | DeviceError::ImageSize { .. } => SimcamResult::OutOfRange,
        DeviceError::SphericalFocus(_)
        | DeviceError::NoRecognition(_)
        | DeviceError::WrongMode(_) => SimcamResult::Unsupported,
        DeviceError::RecognitionDisabled(_) | DeviceError::Disabled(_) => SimcamResult::Disabled,
        DeviceError::NoImage(_) => SimcamResult::NoImage,
        DeviceError::EmptyFilename
        | DeviceError::UnsupportedFormat(_)
        | DeviceError::InvalidQuality(_) => SimcamResult::InvalidArgument,
        DeviceError::NotConnected => SimcamResult::NotConnected,
        DeviceError::UnknownDevice(_) | DeviceError::Desynchronized(_) => {
            SimcamResult::Desynchronized
        }
        DeviceError::Wire(err) if err.is_desync() => SimcamResult::Desynchronized,
        DeviceError::Wire(_) => SimcamResult::TransportError,
        DeviceError::Image(_) => SimcamResult::ImageError,
    }
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}

#[cfg(test)]
pub(crate) fn last_error_string() -> String {
    LAST_ERROR.with(|state| state.borrow().to_string_lossy().into_owned())
}
