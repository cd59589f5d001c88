use std::os::raw::{c_char, c_int};
use std::ptr;

use simcam_device::DeviceHandle;

use crate::args;
use crate::camera::camera_call;
use crate::controller::with_controller;
use crate::error;
use crate::types::{SimcamControllerHandle, SimcamImage, SimcamResult};

fn release(image: &mut SimcamImage) {
    if !image.data.is_null() {
        let slice_ptr = ptr::slice_from_raw_parts_mut(image.data, image.len);
        // SAFETY: `data` was allocated as a `Box<[u8]>` by `simcam_camera_get_image`.
        unsafe {
            drop(Box::from_raw(slice_ptr));
        }
    }
    *image = SimcamImage::default();
}

/// Copy the current BGRA frame of an enabled camera into `out`.
///
/// In networked mode a stale frame is refreshed first. Allocations already
/// held by `out` are released, so it must be zero-initialized or previously
/// filled by this function.
///
/// # Safety
/// `controller` must be null or a valid controller handle; `out` must be
/// null or a valid, writable pointer.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_get_image(
    controller: SimcamControllerHandle,
    camera: u16,
    out: *mut SimcamImage,
) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        if out.is_null() {
            return error::set_invalid_argument("out cannot be null");
        }
        let frame = with_controller(controller, Err(SimcamResult::InvalidArgument), |c| {
            c.image(DeviceHandle::new(camera))
                .map_err(|err| error::map_device_error(&err))
        });
        let frame = match frame {
            Ok(frame) => frame,
            Err(code) => return code,
        };

        let out = {
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { &mut *out }
        };
        release(out);

        let data: Box<[u8]> = frame.data.to_vec().into_boxed_slice();
        out.width = frame.width;
        out.height = frame.height;
        out.len = data.len();
        out.data = if data.is_empty() {
            ptr::null_mut()
        } else {
            Box::into_raw(data) as *mut u8
        };
        SimcamResult::Ok
    })
}

/// Release pixel memory held by a [`SimcamImage`].
///
/// # Safety
/// `image` must be null or point to an image filled by this library.
#[no_mangle]
pub unsafe extern "C" fn simcam_image_free(image: *mut SimcamImage) {
    crate::ffi_boundary((), || {
        if image.is_null() {
            return;
        }
        // SAFETY: Pointer validity is guaranteed by the caller.
        release(unsafe { &mut *image });
    });
}

/// Save the current frame as PNG or JPEG. Returns 0 on success, -1 on error.
///
/// # Safety
/// `controller` must be null or a valid controller handle; `filename` must be
/// null or a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_save_image(
    controller: SimcamControllerHandle,
    camera: u16,
    filename: *const c_char,
    quality: c_int,
) -> c_int {
    crate::ffi_boundary(-1, || {
        error::clear_error_state();
        let filename = {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { args::required_str_arg(filename, "filename") } {
                Some(v) => v,
                None => return -1,
            }
        };
        with_controller(controller, -1, |c| {
            match c.save_image(DeviceHandle::new(camera), filename, quality) {
                Ok(()) => 0,
                Err(err) => {
                    let _ = error::map_device_error(&err);
                    -1
                }
            }
        })
    })
}

/// Push a BGRA frame of `len` bytes (remote-control mode).
///
/// # Safety
/// `controller` must be null or a valid controller handle. If `len > 0`,
/// `data` must be readable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_set_image(
    controller: SimcamControllerHandle,
    camera: u16,
    data: *const u8,
    len: usize,
) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        // SAFETY: We validate pointer/length pairing in helper.
        let Some(data) = (unsafe { args::slice_arg(data, len, "data") }) else {
            return SimcamResult::InvalidArgument;
        };
        camera_call(controller, |c| c.set_image(DeviceHandle::new(camera), data))
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::CString;

    use super::*;
    use crate::camera::simcam_camera_enable;
    use crate::controller::simcam_controller_free;
    use crate::error::last_error_string;
    use crate::test_support::remote_handle;

    const PIXELS: [u8; 8] = [10, 20, 30, 255, 40, 50, 60, 255];

    #[test]
    fn pushed_frame_is_copied_out() {
        let handle = remote_handle();
        let mut out = SimcamImage::default();
        unsafe {
            assert_eq!(
                simcam_camera_get_image(handle, 1, &mut out),
                SimcamResult::Disabled
            );
            assert_eq!(simcam_camera_enable(handle, 1, 32), SimcamResult::Ok);
            assert_eq!(
                simcam_camera_set_image(handle, 1, PIXELS.as_ptr(), 3),
                SimcamResult::OutOfRange
            );
            assert_eq!(
                simcam_camera_set_image(handle, 1, PIXELS.as_ptr(), PIXELS.len()),
                SimcamResult::Ok
            );
            assert_eq!(
                simcam_camera_get_image(handle, 1, &mut out),
                SimcamResult::Ok
            );
            assert_eq!((out.width, out.height, out.len), (2, 1, 8));
            assert_eq!(std::slice::from_raw_parts(out.data, out.len), &PIXELS);
            simcam_image_free(&mut out);
            assert!(out.data.is_null());
            simcam_controller_free(handle);
        }
    }

    #[test]
    fn save_image_returns_minus_one_on_bad_request() {
        let handle = remote_handle();
        let bad = CString::new("frame.bmp").expect("literal is valid");
        unsafe {
            assert_eq!(simcam_camera_enable(handle, 1, 32), SimcamResult::Ok);
            assert_eq!(simcam_camera_save_image(handle, 1, bad.as_ptr(), 80), -1);
            assert!(last_error_string().contains("unsupported image format"));
            assert_eq!(
                simcam_camera_save_image(handle, 1, std::ptr::null(), 80),
                -1
            );

            let path = std::env::temp_dir().join(format!("simcam-ffi-{}.jpg", std::process::id()));
            let good = CString::new(path.to_str().expect("utf-8 temp path")).expect("no NUL");
            assert_eq!(
                simcam_camera_set_image(handle, 1, PIXELS.as_ptr(), PIXELS.len()),
                SimcamResult::Ok
            );
            assert_eq!(simcam_camera_save_image(handle, 1, good.as_ptr(), 75), 0);
            assert!(path.exists());
            let _ = std::fs::remove_file(&path);
            simcam_controller_free(handle);
        }
    }
}
