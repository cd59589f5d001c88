use std::collections::{BTreeMap, BTreeSet};

use bytes::BytesMut;
use simcam_wire::{encode_command, Answer, Packet};

use crate::camera::CameraDevice;
use crate::error::{DeviceError, Result};
use crate::handle::DeviceHandle;

/// Handle-keyed set of cameras announced by the host.
#[derive(Debug, Default)]
pub struct Registry {
    cameras: BTreeMap<DeviceHandle, CameraDevice>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: DeviceHandle) -> Option<&CameraDevice> {
        self.cameras.get(&handle)
    }

    pub fn get_mut(&mut self, handle: DeviceHandle) -> Option<&mut CameraDevice> {
        self.cameras.get_mut(&handle)
    }

    pub fn contains(&self, handle: DeviceHandle) -> bool {
        self.cameras.contains_key(&handle)
    }

    /// Registered handles in ascending order.
    pub fn handles(&self) -> Vec<DeviceHandle> {
        self.cameras.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CameraDevice> {
        self.cameras.values_mut()
    }

    /// Tear a camera down. Its recognition list goes with it.
    pub fn remove(&mut self, handle: DeviceHandle) -> Option<CameraDevice> {
        let removed = self.cameras.remove(&handle);
        if removed.is_some() {
            tracing::debug!(camera = %handle, "camera removed");
        }
        removed
    }

    /// Apply one answer record.
    ///
    /// CONFIGURE creates the camera or replaces it entirely; every other
    /// record requires a configured camera.
    pub fn apply(&mut self, handle: DeviceHandle, answer: Answer, step: u64) -> Result<()> {
        if let Answer::Configure(desc) = &answer {
            match self.cameras.get_mut(&handle) {
                Some(camera) => camera.configure(desc),
                None => {
                    tracing::debug!(
                        camera = %handle,
                        id = desc.id,
                        width = desc.width,
                        height = desc.height,
                        "camera configured"
                    );
                    self.cameras
                        .insert(handle, CameraDevice::from_descriptor(handle, desc));
                }
            }
            return Ok(());
        }

        let camera = self
            .cameras
            .get_mut(&handle)
            .ok_or(DeviceError::UnknownDevice(handle))?;
        camera.apply(answer, step);
        Ok(())
    }

    /// Apply a whole step answer, or nothing of it.
    ///
    /// Every record must address a camera that is configured, or configured
    /// earlier in the same answer.
    pub fn apply_all(&mut self, answers: Vec<(DeviceHandle, Vec<Answer>)>, step: u64) -> Result<()> {
        let mut configured: BTreeSet<DeviceHandle> = self.cameras.keys().copied().collect();
        for (handle, records) in &answers {
            for record in records {
                if matches!(record, Answer::Configure(_)) {
                    configured.insert(*handle);
                } else if !configured.contains(handle) {
                    return Err(DeviceError::UnknownDevice(*handle));
                }
            }
        }
        for (handle, records) in answers {
            for record in records {
                self.apply(handle, record, step)?;
            }
        }
        Ok(())
    }

    /// Drain every camera's staged changes into one packet per camera.
    pub fn drain_requests(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();
        for camera in self.cameras.values_mut() {
            let commands = camera.drain_commands();
            if commands.is_empty() {
                continue;
            }
            let mut payload = BytesMut::new();
            for command in &commands {
                encode_command(command, &mut payload);
            }
            tracing::trace!(
                camera = %camera.handle(),
                records = commands.len(),
                "camera records queued"
            );
            packets.push(Packet::new(camera.handle().tag(), payload.freeze()));
        }
        packets
    }
}
