//! Client-side camera devices for the simcam step protocol.
//!
//! A [`Controller`] owns every camera the host has configured. Setters stage
//! changes that go out at the next step boundary; getters read the cached
//! state. The controller can also run without a host, in remote-control
//! mode, where the application pushes frames and recognition lists itself.

pub mod camera;
pub mod config;
pub mod controller;
pub mod error;
pub mod guard;
pub mod handle;
pub mod image_io;
pub mod pending;
pub mod recognition;
pub mod registry;
pub mod remote;

pub use camera::CameraDevice;
pub use config::{ControllerConfig, DEFAULT_STEP_DURATION_MS};
pub use controller::{Controller, HostLink};
pub use error::{DeviceError, Result};
pub use guard::{StepGuard, StepLock};
pub use handle::DeviceHandle;
pub use image_io::{save_format, save_frame, to_rgba, SaveFormat};
pub use pending::{PendingWrite, PendingWrites};
pub use recognition::{RecognitionList, RecognitionSnapshot};
pub use registry::Registry;
pub use remote::{RemoteCapabilities, RemoteProviders, RemoteUpdate};
