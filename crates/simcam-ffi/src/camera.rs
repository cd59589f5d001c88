//! Camera getters and setters.
//!
//! Getters return a sentinel on failure (0 for integers, NaN for reals,
//! false for booleans) and leave the reason in `simcam_last_error`. Setters
//! return a [`SimcamResult`].
//!
//! Every function here requires `controller` to be null or a valid
//! controller handle.

use std::os::raw::c_int;

use simcam_device::{Controller, DeviceHandle};

use crate::controller::{result_code, with_controller};
use crate::error;
use crate::types::{SimcamControllerHandle, SimcamResult};

pub(crate) fn camera_value<T: Copy>(
    controller: SimcamControllerHandle,
    on_error: T,
    f: impl FnOnce(&Controller) -> simcam_device::Result<T>,
) -> T {
    crate::ffi_boundary(on_error, || {
        error::clear_error_state();
        with_controller(controller, on_error, |c| match f(c) {
            Ok(value) => value,
            Err(err) => {
                let _ = error::map_device_error(&err);
                on_error
            }
        })
    })
}

pub(crate) fn camera_call(
    controller: SimcamControllerHandle,
    f: impl FnOnce(&Controller) -> simcam_device::Result<()>,
) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        with_controller(controller, SimcamResult::InvalidArgument, |c| {
            result_code(f(c))
        })
    })
}

fn tag(tag: u16) -> DeviceHandle {
    DeviceHandle::new(tag)
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_enable(
    controller: SimcamControllerHandle,
    camera: u16,
    sampling_period: c_int,
) -> SimcamResult {
    camera_call(controller, |c| c.enable(tag(camera), sampling_period))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_disable(
    controller: SimcamControllerHandle,
    camera: u16,
) -> SimcamResult {
    camera_call(controller, |c| c.disable(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_sampling_period(
    controller: SimcamControllerHandle,
    camera: u16,
) -> c_int {
    camera_value(controller, 0, |c| {
        c.sampling_period(tag(camera)).map(c_int::from)
    })
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_width(
    controller: SimcamControllerHandle,
    camera: u16,
) -> c_int {
    camera_value(controller, 0, |c| c.width(tag(camera)).map(c_int::from))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_height(
    controller: SimcamControllerHandle,
    camera: u16,
) -> c_int {
    camera_value(controller, 0, |c| c.height(tag(camera)).map(c_int::from))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_fov(
    controller: SimcamControllerHandle,
    camera: u16,
) -> f64 {
    camera_value(controller, f64::NAN, |c| c.fov(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_min_fov(
    controller: SimcamControllerHandle,
    camera: u16,
) -> f64 {
    camera_value(controller, f64::NAN, |c| c.min_fov(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_max_fov(
    controller: SimcamControllerHandle,
    camera: u16,
) -> f64 {
    camera_value(controller, f64::NAN, |c| c.max_fov(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_set_fov(
    controller: SimcamControllerHandle,
    camera: u16,
    fov: f64,
) -> SimcamResult {
    camera_call(controller, |c| c.set_fov(tag(camera), fov))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_near(
    controller: SimcamControllerHandle,
    camera: u16,
) -> f64 {
    camera_value(controller, f64::NAN, |c| c.near(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_is_spherical(
    controller: SimcamControllerHandle,
    camera: u16,
) -> bool {
    camera_value(controller, false, |c| c.is_spherical(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_focal_length(
    controller: SimcamControllerHandle,
    camera: u16,
) -> f64 {
    camera_value(controller, f64::NAN, |c| c.focal_length(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_focal_distance(
    controller: SimcamControllerHandle,
    camera: u16,
) -> f64 {
    camera_value(controller, f64::NAN, |c| c.focal_distance(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_min_focal_distance(
    controller: SimcamControllerHandle,
    camera: u16,
) -> f64 {
    camera_value(controller, f64::NAN, |c| c.min_focal_distance(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_max_focal_distance(
    controller: SimcamControllerHandle,
    camera: u16,
) -> f64 {
    camera_value(controller, f64::NAN, |c| c.max_focal_distance(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_set_focal_distance(
    controller: SimcamControllerHandle,
    camera: u16,
    focal_distance: f64,
) -> SimcamResult {
    camera_call(controller, |c| {
        c.set_focal_distance(tag(camera), focal_distance)
    })
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_has_recognition(
    controller: SimcamControllerHandle,
    camera: u16,
) -> bool {
    camera_value(controller, false, |c| c.has_recognition(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_recognition_enable(
    controller: SimcamControllerHandle,
    camera: u16,
    sampling_period: c_int,
) -> SimcamResult {
    camera_call(controller, |c| {
        c.recognition_enable(tag(camera), sampling_period)
    })
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_recognition_disable(
    controller: SimcamControllerHandle,
    camera: u16,
) -> SimcamResult {
    camera_call(controller, |c| c.recognition_disable(tag(camera)))
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_recognition_get_sampling_period(
    controller: SimcamControllerHandle,
    camera: u16,
) -> c_int {
    camera_value(controller, 0, |c| {
        c.recognition_sampling_period(tag(camera))
            .map(c_int::from)
    })
}

/// # Safety
/// `controller` must be null or a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_recognition_get_number_of_objects(
    controller: SimcamControllerHandle,
    camera: u16,
) -> c_int {
    camera_value(controller, 0, |c| {
        c.recognition_number_of_objects(tag(camera))
            .map(|n| c_int::try_from(n).unwrap_or(c_int::MAX))
    })
}
