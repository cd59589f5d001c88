//! Remote-control backend.
//!
//! Without a networked host, frames are pushed by the application and
//! configuration changes go to provider callbacks registered up front.

use std::fmt;

use crate::camera::CameraDevice;
use crate::handle::DeviceHandle;
use crate::pending::PendingWrite;

type PeriodProvider = Box<dyn Fn(DeviceHandle, u16) + Send + Sync>;
type ValueProvider = Box<dyn Fn(DeviceHandle, f64) + Send + Sync>;

/// Provider callbacks of a remote-control backend.
#[derive(Default)]
pub struct RemoteProviders {
    set_sampling_period: Option<PeriodProvider>,
    set_fov: Option<ValueProvider>,
    set_focal_distance: Option<ValueProvider>,
    set_recognition_period: Option<PeriodProvider>,
}

/// Which optional providers are registered, read once per mode transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteCapabilities {
    pub set_fov: bool,
    pub set_focal_distance: bool,
}

impl RemoteProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set_sampling_period(
        mut self,
        f: impl Fn(DeviceHandle, u16) + Send + Sync + 'static,
    ) -> Self {
        self.set_sampling_period = Some(Box::new(f));
        self
    }

    pub fn with_set_fov(mut self, f: impl Fn(DeviceHandle, f64) + Send + Sync + 'static) -> Self {
        self.set_fov = Some(Box::new(f));
        self
    }

    pub fn with_set_focal_distance(
        mut self,
        f: impl Fn(DeviceHandle, f64) + Send + Sync + 'static,
    ) -> Self {
        self.set_focal_distance = Some(Box::new(f));
        self
    }

    pub fn with_set_recognition_period(
        mut self,
        f: impl Fn(DeviceHandle, u16) + Send + Sync + 'static,
    ) -> Self {
        self.set_recognition_period = Some(Box::new(f));
        self
    }

    pub fn capabilities(&self) -> RemoteCapabilities {
        RemoteCapabilities {
            set_fov: self.set_fov.is_some(),
            set_focal_distance: self.set_focal_distance.is_some(),
        }
    }

    /// Hand one change to its provider. Returns false when no provider is
    /// registered for it.
    pub fn dispatch(&self, handle: DeviceHandle, update: RemoteUpdate) -> bool {
        let delivered = match update {
            RemoteUpdate::SamplingPeriod(period) => self
                .set_sampling_period
                .as_ref()
                .map(|f| f(handle, period)),
            RemoteUpdate::Fov(fov) => self.set_fov.as_ref().map(|f| f(handle, fov)),
            RemoteUpdate::FocalDistance(distance) => self
                .set_focal_distance
                .as_ref()
                .map(|f| f(handle, distance)),
            RemoteUpdate::RecognitionPeriod(period) => self
                .set_recognition_period
                .as_ref()
                .map(|f| f(handle, period)),
        };
        if delivered.is_none() {
            tracing::debug!(camera = %handle, ?update, "no remote provider, change dropped");
        }
        delivered.is_some()
    }
}

/// A staged change read out for the provider callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteUpdate {
    SamplingPeriod(u16),
    Fov(f64),
    FocalDistance(f64),
    RecognitionPeriod(u16),
}

/// Drain the staged changes of `camera` with their current values.
///
/// Image requests are dropped: frames are pushed by the application.
pub fn take_updates(camera: &mut CameraDevice) -> Vec<RemoteUpdate> {
    camera
        .drain_pending()
        .into_iter()
        .filter_map(|kind| match kind {
            PendingWrite::SamplingPeriod => {
                Some(RemoteUpdate::SamplingPeriod(camera.sampling_period()))
            }
            PendingWrite::Fov => Some(RemoteUpdate::Fov(camera.fov())),
            PendingWrite::FocalDistance => {
                Some(RemoteUpdate::FocalDistance(camera.focal_distance()))
            }
            PendingWrite::RecognitionPeriod => {
                Some(RemoteUpdate::RecognitionPeriod(camera.recognition_period()))
            }
            PendingWrite::ImageRequest => None,
        })
        .collect()
}

impl fmt::Debug for RemoteProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProviders")
            .field("set_sampling_period", &self.set_sampling_period.is_some())
            .field("set_fov", &self.set_fov.is_some())
            .field("set_focal_distance", &self.set_focal_distance.is_some())
            .field(
                "set_recognition_period",
                &self.set_recognition_period.is_some(),
            )
            .finish()
    }
}

/// Re-stage a camera's configuration for the provider set on entering
/// remote-control mode.
pub fn enter_remote(camera: &mut CameraDevice, caps: RemoteCapabilities) {
    if camera.sampling_period() != 0 {
        camera.stage(PendingWrite::SamplingPeriod);
        camera.stage(PendingWrite::ImageRequest);
        if caps.set_fov {
            camera.stage(PendingWrite::Fov);
        }
        if caps.set_focal_distance {
            camera.stage(PendingWrite::FocalDistance);
        }
    }
    if camera.recognition_period() != 0 {
        camera.stage(PendingWrite::RecognitionPeriod);
    }
}
