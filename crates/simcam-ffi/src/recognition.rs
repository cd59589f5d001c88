use std::ffi::{CStr, CString};
use std::os::raw::c_int;
use std::ptr;

use simcam_device::DeviceHandle;
use simcam_wire::RecognizedObject;

use crate::args;
use crate::camera::camera_call;
use crate::error;
use crate::types::{SimcamControllerHandle, SimcamRecognitionObject, SimcamResult};

fn release(object: &mut SimcamRecognitionObject) {
    if !object.colors.is_null() {
        let len = usize::try_from(object.number_of_colors).unwrap_or(0) * 3;
        let slice_ptr = ptr::slice_from_raw_parts_mut(object.colors, len);
        // SAFETY: `colors` was allocated as a `Box<[f64]>` of this length by `write_object_out`.
        unsafe {
            drop(Box::from_raw(slice_ptr));
        }
    }
    if !object.model.is_null() {
        // SAFETY: `model` was allocated by `CString::into_raw` in `write_object_out`.
        unsafe {
            drop(CString::from_raw(object.model));
        }
    }
    *object = SimcamRecognitionObject::default();
}

fn write_object_out(object: &RecognizedObject, out: &mut SimcamRecognitionObject) -> SimcamResult {
    let Ok(number_of_colors) = c_int::try_from(object.colors.len()) else {
        return error::set_invalid_argument("too many colors for the C layout");
    };
    let Ok(model) = CString::new(object.model.as_str()) else {
        return error::set_invalid_argument("model contains a NUL byte");
    };
    release(out);

    let colors: Box<[f64]> = object.colors.iter().flatten().copied().collect();

    out.id = object.id;
    out.position = object.position;
    out.orientation = object.orientation;
    out.size = object.size;
    out.position_on_image = object.position_on_image;
    out.size_on_image = object.size_on_image;
    out.number_of_colors = number_of_colors;
    out.colors = if colors.is_empty() {
        ptr::null_mut()
    } else {
        Box::into_raw(colors) as *mut f64
    };
    out.model = model.into_raw();
    SimcamResult::Ok
}

/// # Safety
/// `object.colors` must be null or readable for `3 * number_of_colors`
/// values; `object.model` must be null or a valid NUL-terminated string.
unsafe fn read_object(object: &SimcamRecognitionObject) -> Option<RecognizedObject> {
    let count = args::count_arg(object.number_of_colors, "number_of_colors")?;
    let Some(len) = count.checked_mul(3) else {
        let _ = error::set_invalid_argument("number_of_colors is too large");
        return None;
    };
    // SAFETY: Forwarded caller guarantee.
    let components = unsafe { args::slice_arg(object.colors as *const f64, len, "colors") }?;
    let model = if object.model.is_null() {
        String::new()
    } else {
        // SAFETY: Forwarded caller guarantee.
        unsafe { CStr::from_ptr(object.model) }
            .to_string_lossy()
            .into_owned()
    };

    Some(RecognizedObject {
        id: object.id,
        position: object.position,
        orientation: object.orientation,
        size: object.size,
        position_on_image: object.position_on_image,
        size_on_image: object.size_on_image,
        colors: components
            .chunks_exact(3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
            .collect(),
        model,
    })
}

/// Copy recognized object `index` into `out`.
///
/// Allocations already held by `out` are released first, so `out` must be
/// zero-initialized or previously filled by this function.
///
/// # Safety
/// `controller` must be null or a valid controller handle; `out` must be
/// null or a valid, writable pointer.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_recognition_get_object(
    controller: SimcamControllerHandle,
    camera: u16,
    index: c_int,
    out: *mut SimcamRecognitionObject,
) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        if out.is_null() {
            return error::set_invalid_argument("out cannot be null");
        }
        let Some(index) = args::count_arg(index, "index") else {
            return SimcamResult::OutOfRange;
        };
        let object = crate::controller::with_controller(controller, None, |c| {
            match c.recognition_object(DeviceHandle::new(camera), index) {
                Ok(object) => Some(Ok(object)),
                Err(err) => Some(Err(error::map_device_error(&err))),
            }
        });
        match object {
            Some(Ok(object)) => {
                // SAFETY: Pointer validity is guaranteed by the caller.
                write_object_out(&object, unsafe { &mut *out })
            }
            Some(Err(code)) => code,
            None => SimcamResult::InvalidArgument,
        }
    })
}

/// Copy the whole recognition list of a camera.
///
/// On success `*out` points to `*count` objects owned by the caller, to be
/// released with `simcam_recognition_objects_free`. An empty list yields a
/// null pointer and a count of 0.
///
/// # Safety
/// `controller` must be null or a valid controller handle; `out` and `count`
/// must be null or valid, writable pointers.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_recognition_get_objects(
    controller: SimcamControllerHandle,
    camera: u16,
    out: *mut *mut SimcamRecognitionObject,
    count: *mut c_int,
) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        if out.is_null() || count.is_null() {
            return error::set_invalid_argument("out and count cannot be null");
        }
        let snapshot = crate::controller::with_controller(controller, None, |c| {
            Some(
                c.recognition_objects(DeviceHandle::new(camera))
                    .map_err(|err| error::map_device_error(&err)),
            )
        });
        let snapshot = match snapshot {
            Some(Ok(snapshot)) => snapshot,
            Some(Err(code)) => return code,
            None => return SimcamResult::InvalidArgument,
        };
        let Ok(len) = c_int::try_from(snapshot.len()) else {
            return error::set_invalid_argument("too many objects for the C layout");
        };

        let mut objects = Vec::with_capacity(snapshot.len());
        for object in snapshot.iter() {
            let mut raw = SimcamRecognitionObject::default();
            let code = write_object_out(object, &mut raw);
            if code != SimcamResult::Ok {
                objects.iter_mut().for_each(release);
                return code;
            }
            objects.push(raw);
        }

        let objects = objects.into_boxed_slice();
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe {
            *count = len;
            *out = if objects.is_empty() {
                ptr::null_mut()
            } else {
                Box::into_raw(objects) as *mut SimcamRecognitionObject
            };
        }
        SimcamResult::Ok
    })
}

/// Release a list returned by `simcam_camera_recognition_get_objects`.
///
/// # Safety
/// `objects` must be null or the pointer returned together with `count`.
#[no_mangle]
pub unsafe extern "C" fn simcam_recognition_objects_free(
    objects: *mut SimcamRecognitionObject,
    count: c_int,
) {
    crate::ffi_boundary((), || {
        if objects.is_null() {
            return;
        }
        let len = usize::try_from(count).unwrap_or(0);
        let slice_ptr = ptr::slice_from_raw_parts_mut(objects, len);
        // SAFETY: `objects` was allocated as a `Box<[SimcamRecognitionObject]>`
        // of this length by `simcam_camera_recognition_get_objects`.
        let mut list = unsafe { Box::from_raw(slice_ptr) };
        list.iter_mut().for_each(release);
    });
}

/// Release the allocations held by an object filled by
/// `simcam_camera_recognition_get_object`.
///
/// # Safety
/// `object` must be null or point to an object filled by this library.
#[no_mangle]
pub unsafe extern "C" fn simcam_recognition_object_free(object: *mut SimcamRecognitionObject) {
    crate::ffi_boundary((), || {
        if object.is_null() {
            return;
        }
        // SAFETY: Pointer validity is guaranteed by the caller.
        release(unsafe { &mut *object });
    });
}

/// Replace the recognition list of a camera (remote-control mode).
///
/// Every object is copied, including all colors and the full model name;
/// the caller keeps ownership of `objects`.
///
/// # Safety
/// `controller` must be null or a valid controller handle. If `count > 0`,
/// `objects` must point to `count` valid objects whose `colors` and `model`
/// pointers satisfy the layout documented on `SimcamRecognitionObject`.
#[no_mangle]
pub unsafe extern "C" fn simcam_camera_recognition_set_objects(
    controller: SimcamControllerHandle,
    camera: u16,
    objects: *const SimcamRecognitionObject,
    count: c_int,
) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        let Some(count) = args::count_arg(count, "count") else {
            return SimcamResult::InvalidArgument;
        };
        // SAFETY: Forwarded caller guarantee.
        let Some(raw) = (unsafe { args::slice_arg(objects, count, "objects") }) else {
            return SimcamResult::InvalidArgument;
        };
        let mut list = Vec::with_capacity(raw.len());
        for object in raw {
            // SAFETY: Forwarded caller guarantee.
            match unsafe { read_object(object) } {
                Some(object) => list.push(object),
                None => return SimcamResult::InvalidArgument,
            }
        }
        camera_call(controller, |c| {
            c.recognition_set_objects(DeviceHandle::new(camera), &list)
        })
    })
}
