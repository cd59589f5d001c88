//! Client-side state of one camera.

use std::f64::consts::PI;

use simcam_wire::{
    Answer, CameraDescriptor, CameraParameters, Command, ImageFrame, RecognizedObject,
};

use crate::error::{DeviceError, Result};
use crate::handle::DeviceHandle;
use crate::pending::{PendingWrite, PendingWrites};
use crate::recognition::{RecognitionList, RecognitionSnapshot};

/// Camera parameters, sampling state, last frame and recognition list.
///
/// Setters validate their input and stage a [`PendingWrite`]; nothing is
/// sent until the controller drains the queue at the next step boundary.
/// Records from the host overwrite the parameters without validation.
#[derive(Debug, Clone)]
pub struct CameraDevice {
    handle: DeviceHandle,
    id: u32,
    width: u16,
    height: u16,
    params: CameraParameters,
    sampling_period: u16,
    recognition_period: u16,
    image: Option<ImageFrame>,
    image_step: Option<u64>,
    pending: PendingWrites,
    recognition: RecognitionList,
}

impl CameraDevice {
    /// Build a camera from the host's CONFIGURE descriptor.
    pub fn from_descriptor(handle: DeviceHandle, desc: &CameraDescriptor) -> Self {
        Self {
            handle,
            id: desc.id,
            width: desc.width,
            height: desc.height,
            params: desc.params,
            sampling_period: 0,
            recognition_period: 0,
            image: None,
            image_step: None,
            pending: PendingWrites::new(),
            recognition: RecognitionList::new(),
        }
    }

    /// Replace the whole camera with a fresh descriptor.
    pub fn configure(&mut self, desc: &CameraDescriptor) {
        *self = Self::from_descriptor(self.handle, desc);
    }

    /// Overwrite the parameter subset carried by RECONFIGURE.
    pub fn reconfigure(&mut self, params: &CameraParameters) {
        self.params = *params;
    }

    /// Apply one decoded answer record received during `step`.
    pub fn apply(&mut self, answer: Answer, step: u64) {
        match answer {
            Answer::Configure(desc) => self.configure(&desc),
            Answer::Reconfigure(params) => self.reconfigure(&params),
            Answer::Objects(objects) => self.recognition.replace(objects),
            Answer::Image(frame) => {
                if frame.width != self.width || frame.height != self.height {
                    tracing::debug!(
                        camera = %self.handle,
                        width = frame.width,
                        height = frame.height,
                        "frame resolution differs from configured resolution"
                    );
                    self.width = frame.width;
                    self.height = frame.height;
                }
                self.image = Some(frame);
                self.image_step = Some(step);
            }
        }
    }

    /// Turn staged changes into outbound records, clearing the queue.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        self.pending
            .drain()
            .into_iter()
            .map(|kind| self.command_for(kind))
            .collect()
    }

    /// Staged changes in wire order, clearing the queue.
    pub fn drain_pending(&mut self) -> Vec<PendingWrite> {
        self.pending.drain()
    }

    pub fn command_for(&self, kind: PendingWrite) -> Command {
        match kind {
            PendingWrite::SamplingPeriod => Command::SetSamplingPeriod(self.sampling_period),
            PendingWrite::ImageRequest => Command::GetImage,
            PendingWrite::Fov => Command::SetFov(self.params.fov),
            PendingWrite::FocalDistance => Command::SetFocalDistance(self.params.focal_distance),
            PendingWrite::RecognitionPeriod => {
                Command::SetRecognitionPeriod(self.recognition_period)
            }
        }
    }

    pub fn is_pending(&self, kind: PendingWrite) -> bool {
        self.pending.is_pending(kind)
    }

    pub(crate) fn stage(&mut self, kind: PendingWrite) {
        self.pending.stage(kind);
    }

    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    /// Node id assigned by the host.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn enable(&mut self, period: i32) -> Result<()> {
        let period = validate_period(period, "enable")?;
        self.sampling_period = period;
        self.pending.stage(PendingWrite::SamplingPeriod);
        Ok(())
    }

    pub fn disable(&mut self) -> Result<()> {
        self.enable(0)
    }

    pub fn sampling_period(&self) -> u16 {
        self.sampling_period
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn fov(&self) -> f64 {
        self.params.fov
    }

    pub fn min_fov(&self) -> f64 {
        self.params.min_fov
    }

    pub fn max_fov(&self) -> f64 {
        self.params.max_fov
    }

    pub fn near(&self) -> f64 {
        self.params.near
    }

    pub fn is_spherical(&self) -> bool {
        self.params.spherical
    }

    pub fn focal_length(&self) -> f64 {
        self.params.focal_length
    }

    pub fn focal_distance(&self) -> f64 {
        self.params.focal_distance
    }

    pub fn min_focal_distance(&self) -> f64 {
        self.params.min_focal_distance
    }

    pub fn max_focal_distance(&self) -> f64 {
        self.params.max_focal_distance
    }

    pub fn has_recognition(&self) -> bool {
        self.params.has_recognition
    }

    pub fn parameters(&self) -> &CameraParameters {
        &self.params
    }

    /// Change the field of view.
    ///
    /// The value must lie in `(0, π]` for a planar projection, `(0, 2π]` for
    /// a spherical one, and within the zoom range.
    pub fn set_fov(&mut self, fov: f64) -> Result<()> {
        let limit = if self.params.spherical { 2.0 * PI } else { PI };
        if !(fov > 0.0 && fov <= limit) {
            tracing::warn!(
                camera = %self.handle,
                fov,
                limit,
                "set_fov called with 'fov' argument outside of the projection range"
            );
            return Err(DeviceError::OutOfRange {
                what: "fov",
                value: fov,
                min: 0.0,
                max: limit,
            });
        }
        if fov < self.params.min_fov || fov > self.params.max_fov {
            tracing::warn!(
                camera = %self.handle,
                fov,
                min = self.params.min_fov,
                max = self.params.max_fov,
                "set_fov out of zoom range"
            );
            return Err(DeviceError::OutOfRange {
                what: "fov",
                value: fov,
                min: self.params.min_fov,
                max: self.params.max_fov,
            });
        }
        self.params.fov = fov;
        self.pending.stage(PendingWrite::Fov);
        Ok(())
    }

    pub fn set_focal_distance(&mut self, distance: f64) -> Result<()> {
        if self.params.spherical {
            tracing::warn!(
                camera = %self.handle,
                "set_focal_distance can't be called on a spherical camera"
            );
            return Err(DeviceError::SphericalFocus(self.handle));
        }
        let (min, max) = (
            self.params.min_focal_distance,
            self.params.max_focal_distance,
        );
        if !(min..=max).contains(&distance) {
            tracing::warn!(
                camera = %self.handle,
                distance,
                min,
                max,
                "set_focal_distance out of focus range"
            );
            return Err(DeviceError::OutOfRange {
                what: "focal distance",
                value: distance,
                min,
                max,
            });
        }
        self.params.focal_distance = distance;
        self.pending.stage(PendingWrite::FocalDistance);
        Ok(())
    }

    pub fn recognition_enable(&mut self, period: i32) -> Result<()> {
        let period = validate_period(period, "recognition_enable")?;
        self.require_recognition("recognition_enable")?;
        self.recognition_period = period;
        self.pending.stage(PendingWrite::RecognitionPeriod);
        Ok(())
    }

    pub fn recognition_disable(&mut self) -> Result<()> {
        self.recognition_enable(0)
    }

    pub fn recognition_sampling_period(&self) -> Result<u16> {
        self.require_recognition("recognition_get_sampling_period")?;
        Ok(self.recognition_period)
    }

    pub fn recognition_number_of_objects(&self) -> Result<usize> {
        self.require_recognition_enabled("recognition_get_number_of_objects")?;
        Ok(self.recognition.len())
    }

    pub fn recognition_objects(&self) -> Result<RecognitionSnapshot> {
        self.require_recognition_enabled("recognition_get_objects")?;
        Ok(self.recognition.snapshot())
    }

    pub fn recognition_object(&self, index: usize) -> Result<RecognizedObject> {
        self.require_recognition_enabled("recognition_get_object")?;
        self.recognition
            .get(index)
            .cloned()
            .ok_or(DeviceError::ObjectIndex {
                index,
                len: self.recognition.len(),
            })
    }

    /// Install a locally produced recognition list.
    ///
    /// Each entry is deep-copied, including every color and the full model
    /// name.
    pub fn inject_objects(&mut self, objects: &[RecognizedObject]) {
        self.recognition.replace(objects.to_vec());
    }

    pub fn recognition(&self) -> &RecognitionList {
        &self.recognition
    }

    /// Last frame received or pushed, if any.
    pub fn image(&self) -> Option<&ImageFrame> {
        self.image.as_ref()
    }

    /// Step number of the last frame.
    pub fn image_step(&self) -> Option<u64> {
        self.image_step
    }

    /// Store a frame pushed in remote-control mode.
    pub fn push_image(&mut self, data: &[u8], step: u64) -> Result<()> {
        let expected = ImageFrame::expected_len(self.width, self.height);
        if data.len() != expected {
            tracing::warn!(
                camera = %self.handle,
                expected,
                actual = data.len(),
                "set_image called with a buffer of the wrong size"
            );
            return Err(DeviceError::ImageSize {
                expected,
                actual: data.len(),
            });
        }
        self.image = Some(ImageFrame {
            width: self.width,
            height: self.height,
            data: bytes::Bytes::copy_from_slice(data),
        });
        self.image_step = Some(step);
        Ok(())
    }

    fn require_recognition(&self, op: &'static str) -> Result<()> {
        if !self.params.has_recognition {
            tracing::warn!(camera = %self.handle, op, "called on a Camera without Recognition node");
            return Err(DeviceError::NoRecognition(self.handle));
        }
        Ok(())
    }

    fn require_recognition_enabled(&self, op: &'static str) -> Result<()> {
        self.require_recognition(op)?;
        if self.recognition_period == 0 {
            tracing::warn!(
                camera = %self.handle,
                op,
                "called for a disabled device, use recognition_enable()"
            );
            return Err(DeviceError::RecognitionDisabled(self.handle));
        }
        Ok(())
    }

    pub(crate) fn recognition_period(&self) -> u16 {
        self.recognition_period
    }
}

fn validate_period(period: i32, op: &'static str) -> Result<u16> {
    if period < 0 {
        tracing::warn!(op, period, "called with negative sampling period");
        return Err(DeviceError::NegativePeriod(period));
    }
    u16::try_from(period).map_err(|_| {
        tracing::warn!(op, period, "sampling period does not fit the wire format");
        DeviceError::OutOfRange {
            what: "sampling period",
            value: f64::from(period),
            min: 0.0,
            max: f64::from(u16::MAX),
        }
    })
}
