use simcam_device::{Controller, ControllerConfig, DeviceHandle, RemoteProviders};
use simcam_wire::{Answer, CameraDescriptor, CameraParameters};

use crate::controller::into_handle;
use crate::types::SimcamControllerHandle;

/// Remote-mode controller with one recognition-capable 2x1 camera on tag 1.
pub(crate) fn remote_handle() -> SimcamControllerHandle {
    let controller = Controller::remote(RemoteProviders::new(), ControllerConfig::default());
    controller
        .apply(
            DeviceHandle::new(1),
            Answer::Configure(CameraDescriptor {
                id: 3,
                width: 2,
                height: 1,
                params: CameraParameters {
                    fov: 0.5,
                    near: 0.01,
                    spherical: false,
                    min_fov: 0.2,
                    max_fov: 1.0,
                    has_recognition: true,
                    focal_length: 0.02,
                    focal_distance: 1.0,
                    min_focal_distance: 0.5,
                    max_focal_distance: 3.0,
                },
            }),
        )
        .expect("configure should apply");
    into_handle(controller)
}
