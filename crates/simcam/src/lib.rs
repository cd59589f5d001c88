//! Client side of a simulated camera.
//!
//! simcam keeps the state of remote camera sensors (parameters, frames,
//! recognized objects) and synchronizes it with a simulation host once per
//! step over a tagged binary protocol.
//!
//! # Crate Structure
//!
//! - [`wire`] — Record layouts, codec and step packet framing
//! - [`device`] — Camera state, controller, remote control and image saving

/// Re-export wire protocol types.
pub mod wire {
    pub use simcam_wire::*;
}

/// Re-export device types.
pub mod device {
    pub use simcam_device::*;
}

pub use simcam_device::{Controller, ControllerConfig, DeviceError, DeviceHandle};
