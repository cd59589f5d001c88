use std::fmt;

/// Opaque identifier a caller uses to refer to one camera.
///
/// The value is the device tag the host uses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(u16);

impl DeviceHandle {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    /// Device tag carried in packet headers.
    pub const fn tag(self) -> u16 {
        self.0
    }
}

impl From<u16> for DeviceHandle {
    fn from(tag: u16) -> Self {
        Self(tag)
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
