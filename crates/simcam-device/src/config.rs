use simcam_wire::PacketConfig;

/// Default simulated time per step, in milliseconds.
pub const DEFAULT_STEP_DURATION_MS: u32 = 32;

/// Configuration for a [`Controller`](crate::Controller).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Framing limits and socket timeouts for the host link.
    pub packet: PacketConfig,
    /// Duration announced by [`Controller::step`](crate::Controller::step).
    pub step_duration_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            packet: PacketConfig::default(),
            step_duration_ms: DEFAULT_STEP_DURATION_MS,
        }
    }
}
