//! simcam-ffi: C-ABI exports for the simcam camera controller.
//!
//! Functions mirror the camera API of the original C controller library:
//! getters return sentinel values on failure and the reason is available
//! from `simcam_last_error` on the calling thread.

mod args;
mod camera;
mod controller;
mod error;
mod image;
mod recognition;
#[cfg(test)]
mod test_support;
mod types;

use std::panic::AssertUnwindSafe;

pub use camera::{
    simcam_camera_disable, simcam_camera_enable, simcam_camera_get_focal_distance,
    simcam_camera_get_focal_length, simcam_camera_get_fov, simcam_camera_get_height,
    simcam_camera_get_max_focal_distance, simcam_camera_get_max_fov,
    simcam_camera_get_min_focal_distance, simcam_camera_get_min_fov, simcam_camera_get_near,
    simcam_camera_get_sampling_period, simcam_camera_get_width, simcam_camera_has_recognition,
    simcam_camera_is_spherical, simcam_camera_recognition_disable,
    simcam_camera_recognition_enable, simcam_camera_recognition_get_number_of_objects,
    simcam_camera_recognition_get_sampling_period, simcam_camera_set_focal_distance,
    simcam_camera_set_fov,
};
pub use controller::{
    simcam_connect, simcam_controller_device_count, simcam_controller_enter_remote,
    simcam_controller_flush, simcam_controller_free, simcam_controller_has_device,
    simcam_controller_leave_remote, simcam_controller_step, simcam_remote_new,
};
pub use image::{
    simcam_camera_get_image, simcam_camera_save_image, simcam_camera_set_image, simcam_image_free,
};
pub use recognition::{
    simcam_camera_recognition_get_object, simcam_camera_recognition_get_objects,
    simcam_camera_recognition_set_objects, simcam_recognition_object_free,
    simcam_recognition_objects_free,
};
pub use types::{
    SimcamControllerHandle, SimcamImage, SimcamRecognitionObject, SimcamRemoteProviders,
    SimcamResult, SIMCAM_ERR_DESYNCHRONIZED, SIMCAM_ERR_DISABLED, SIMCAM_ERR_IMAGE,
    SIMCAM_ERR_INTERNAL, SIMCAM_ERR_INVALID_ARGUMENT, SIMCAM_ERR_INVALID_HANDLE,
    SIMCAM_ERR_NOT_CONNECTED, SIMCAM_ERR_NO_IMAGE, SIMCAM_ERR_OUT_OF_RANGE,
    SIMCAM_ERR_TRANSPORT, SIMCAM_ERR_UNSUPPORTED, SIMCAM_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[no_mangle]
pub extern "C" fn simcam_cleanup() {
    ffi_boundary((), error::clear_error_state);
}

#[no_mangle]
pub extern "C" fn simcam_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicI32, Ordering};

    use super::*;

    #[test]
    fn last_error_starts_empty() {
        simcam_cleanup();
        let ptr = simcam_last_error();
        assert!(!ptr.is_null());

        // SAFETY: simcam_last_error returns a pointer to a thread-local CString.
        let text = unsafe { CStr::from_ptr(ptr).to_str().unwrap() };
        assert!(text.is_empty());
    }

    #[test]
    fn panics_do_not_cross_the_boundary() {
        let result = ffi_boundary(SimcamResult::Internal, || panic!("boom"));
        assert_eq!(result, SimcamResult::Internal);
        assert_eq!(error::last_error_string(), "panic across FFI boundary");
    }

    #[test]
    fn null_handles_are_rejected() {
        unsafe {
            assert_eq!(
                simcam_controller_step(std::ptr::null_mut(), 32),
                SimcamResult::InvalidArgument
            );
            assert_eq!(simcam_controller_device_count(std::ptr::null_mut()), 0);
            assert!(simcam_connect(std::ptr::null()).is_null());
            simcam_controller_free(std::ptr::null_mut());
        }
    }

    static LAST_PERIOD: AtomicI32 = AtomicI32::new(-1);

    extern "C" fn record_period(_tag: u16, period: std::os::raw::c_int) {
        LAST_PERIOD.store(period, Ordering::SeqCst);
    }

    #[test]
    fn remote_providers_receive_staged_changes() {
        let handle = test_support::remote_handle();
        let providers = SimcamRemoteProviders {
            set_sampling_period: Some(record_period),
            ..SimcamRemoteProviders::default()
        };
        unsafe {
            assert_eq!(
                simcam_controller_enter_remote(handle, &providers),
                SimcamResult::Ok
            );
            assert_eq!(simcam_camera_enable(handle, 1, 48), SimcamResult::Ok);
            assert_eq!(simcam_controller_step(handle, 32), SimcamResult::Ok);
            assert_eq!(LAST_PERIOD.load(Ordering::SeqCst), 48);
            assert_eq!(simcam_controller_device_count(handle), 1);
            assert!(simcam_controller_has_device(handle, 1));

            assert_eq!(simcam_controller_leave_remote(handle), SimcamResult::Ok);
            assert_eq!(
                simcam_controller_step(handle, 32),
                SimcamResult::NotConnected
            );
            simcam_controller_free(handle);
        }
    }
}
