use std::os::raw::c_int;

use simcam_device::{Controller, ControllerConfig, DeviceHandle, RemoteProviders};

use crate::error;
use crate::types::{ControllerHandle, SimcamControllerHandle, SimcamRemoteProviders, SimcamResult};

pub(crate) fn with_controller<T>(
    handle: SimcamControllerHandle,
    on_error: T,
    f: impl FnOnce(&Controller) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("controller handle cannot be null");
        return on_error;
    }

    let controller_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &*(handle as *const ControllerHandle) }
    };

    f(&controller_handle.controller)
}

pub(crate) fn into_handle(controller: Controller) -> SimcamControllerHandle {
    Box::into_raw(Box::new(ControllerHandle { controller })) as SimcamControllerHandle
}

pub(crate) fn result_code(result: simcam_device::Result<()>) -> SimcamResult {
    match result {
        Ok(()) => SimcamResult::Ok,
        Err(err) => error::map_device_error(&err),
    }
}

fn remote_providers(callbacks: &SimcamRemoteProviders) -> RemoteProviders {
    let mut providers = RemoteProviders::new();
    if let Some(f) = callbacks.set_sampling_period {
        providers = providers.with_set_sampling_period(move |h, p| f(h.tag(), c_int::from(p)));
    }
    if let Some(f) = callbacks.set_fov {
        providers = providers.with_set_fov(move |h, v| f(h.tag(), v));
    }
    if let Some(f) = callbacks.set_focal_distance {
        providers = providers.with_set_focal_distance(move |h, v| f(h.tag(), v));
    }
    if let Some(f) = callbacks.set_recognition_period {
        providers = providers.with_set_recognition_period(move |h, p| f(h.tag(), c_int::from(p)));
    }
    providers
}

/// # Safety
/// `providers` must be null or point to a valid `SimcamRemoteProviders`.
unsafe fn providers_arg(providers: *const SimcamRemoteProviders) -> RemoteProviders {
    if providers.is_null() {
        return RemoteProviders::new();
    }
    // SAFETY: Non-null pointer validity is guaranteed by the caller.
    remote_providers(unsafe { &*providers })
}

/// Connect to a simulation host listening on a Unix domain socket.
///
/// # Safety
/// `path` must be a non-null pointer to a valid UTF-8, NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn simcam_connect(
    path: *const std::os::raw::c_char,
) -> SimcamControllerHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        let path = {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { crate::args::required_str_arg(path, "path") } {
                Some(v) => v,
                None => return std::ptr::null_mut(),
            }
        };

        #[cfg(not(unix))]
        {
            let _ = error::set_invalid_argument(format!(
                "{path}: Unix domain sockets are not available on this platform"
            ));
            return std::ptr::null_mut();
        }

        #[cfg(unix)]
        {
            match Controller::connect_unix(path, ControllerConfig::default()) {
                Ok(controller) => into_handle(controller),
                Err(err) => {
                    let _ = error::map_device_error(&err);
                    std::ptr::null_mut()
                }
            }
        }
    })
}

/// Create a controller in remote-control mode.
///
/// # Safety
/// `providers` must be null or point to a valid `SimcamRemoteProviders`.
#[no_mangle]
pub unsafe extern "C" fn simcam_remote_new(
    providers: *const SimcamRemoteProviders,
) -> SimcamControllerHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        // SAFETY: Forwarded caller guarantee.
        let providers = unsafe { providers_arg(providers) };
        into_handle(Controller::remote(providers, ControllerConfig::default()))
    })
}

/// Free a controller handle.
///
/// # Safety
/// `controller` must be null or a handle returned by `simcam_connect` or
/// `simcam_remote_new`, not used afterwards.
#[no_mangle]
pub unsafe extern "C" fn simcam_controller_free(controller: SimcamControllerHandle) {
    crate::ffi_boundary((), || {
        if controller.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by this library.
        unsafe {
            drop(Box::from_raw(controller as *mut ControllerHandle));
        }
    });
}

/// Run one step of `duration_ms` milliseconds.
///
/// # Safety
/// `controller` must be a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_controller_step(
    controller: SimcamControllerHandle,
    duration_ms: u32,
) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        with_controller(controller, SimcamResult::InvalidArgument, |c| {
            result_code(c.step_with(duration_ms))
        })
    })
}

/// Send staged changes without advancing simulated time.
///
/// # Safety
/// `controller` must be a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_controller_flush(controller: SimcamControllerHandle) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        with_controller(controller, SimcamResult::InvalidArgument, |c| {
            result_code(c.flush())
        })
    })
}

/// Switch to remote-control mode with the given providers.
///
/// # Safety
/// `controller` must be a valid controller handle. `providers` must be null
/// or point to a valid `SimcamRemoteProviders`.
#[no_mangle]
pub unsafe extern "C" fn simcam_controller_enter_remote(
    controller: SimcamControllerHandle,
    providers: *const SimcamRemoteProviders,
) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        // SAFETY: Forwarded caller guarantee.
        let providers = unsafe { providers_arg(providers) };
        with_controller(controller, SimcamResult::InvalidArgument, |c| {
            c.enter_remote(providers);
            SimcamResult::Ok
        })
    })
}

/// Return to the networked exchange.
///
/// # Safety
/// `controller` must be a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_controller_leave_remote(
    controller: SimcamControllerHandle,
) -> SimcamResult {
    crate::ffi_boundary(SimcamResult::Internal, || {
        error::clear_error_state();
        with_controller(controller, SimcamResult::InvalidArgument, |c| {
            let _ = c.leave_remote();
            SimcamResult::Ok
        })
    })
}

/// Number of configured cameras, 0 on error.
///
/// # Safety
/// `controller` must be a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_controller_device_count(controller: SimcamControllerHandle) -> usize {
    crate::ffi_boundary(0, || {
        error::clear_error_state();
        with_controller(controller, 0, |c| c.devices().len())
    })
}

/// Whether a camera is configured under `tag`.
///
/// # Safety
/// `controller` must be a valid controller handle.
#[no_mangle]
pub unsafe extern "C" fn simcam_controller_has_device(
    controller: SimcamControllerHandle,
    tag: u16,
) -> bool {
    crate::ffi_boundary(false, || {
        error::clear_error_state();
        with_controller(controller, false, |c| c.contains(DeviceHandle::new(tag)))
    })
}
