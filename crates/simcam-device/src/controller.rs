//! Camera controller: device registry, step exchange and backend modes.
//!
//! All state sits behind one [`StepGuard`]. Every public accessor takes the
//! lock for its whole critical section; the step path takes the same lock
//! while encoding, exchanging and dispatching.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use simcam_wire::{
    decode_answers, Answer, ImageFrame, Packet, PacketReader, PacketWriter, RecognizedObject,
    StepAnswer,
};

use crate::camera::CameraDevice;
use crate::config::ControllerConfig;
use crate::error::{DeviceError, Result};
use crate::guard::StepGuard;
use crate::handle::DeviceHandle;
use crate::image_io::{save_format, save_frame};
use crate::pending::PendingWrite;
use crate::recognition::RecognitionSnapshot;
use crate::registry::Registry;
use crate::remote::{self, RemoteProviders, RemoteUpdate};

/// One request/answer exchange with the simulation host.
pub trait HostLink: Send {
    /// Send the request packets and an end-of-step marker, then read the
    /// host's answer up to its marker.
    fn exchange(
        &mut self,
        requests: &[Packet],
        duration_ms: u32,
    ) -> simcam_wire::Result<StepAnswer>;
}

struct StreamLink<R, W> {
    reader: PacketReader<R>,
    writer: PacketWriter<W>,
}

impl<R: Read + Send, W: Write + Send> HostLink for StreamLink<R, W> {
    fn exchange(
        &mut self,
        requests: &[Packet],
        duration_ms: u32,
    ) -> simcam_wire::Result<StepAnswer> {
        self.writer.write_step(requests, duration_ms)?;
        self.reader.read_step()
    }
}

enum Mode {
    Networked,
    Remote(Arc<RemoteProviders>),
}

/// Changes read out during a remote step, delivered once the state is
/// released.
type Delivery = (Arc<RemoteProviders>, Vec<(DeviceHandle, RemoteUpdate)>);

struct ControllerState {
    registry: Registry,
    link: Option<Box<dyn HostLink>>,
    mode: Mode,
    step: u64,
    /// Step at which each camera last requested a frame.
    image_requests: BTreeMap<DeviceHandle, u64>,
    desynchronized: Option<String>,
}

impl ControllerState {
    fn camera(&self, handle: DeviceHandle, op: &'static str) -> Result<&CameraDevice> {
        self.registry
            .get(handle)
            .ok_or_else(|| invalid_handle(handle, op))
    }

    fn camera_mut(&mut self, handle: DeviceHandle, op: &'static str) -> Result<&mut CameraDevice> {
        self.registry
            .get_mut(handle)
            .ok_or_else(|| invalid_handle(handle, op))
    }

    fn require_remote(&self, op: &'static str) -> Result<()> {
        if matches!(self.mode, Mode::Remote(_)) {
            return Ok(());
        }
        tracing::warn!(op, "only available in remote-control mode");
        Err(DeviceError::WrongMode("remote-control"))
    }

    /// Run the networked exchange, or collect the staged changes for the
    /// remote providers.
    fn exchange(&mut self, duration_ms: u32) -> Result<Option<Delivery>> {
        if matches!(self.mode, Mode::Networked) {
            self.round_trip(duration_ms)?;
            return Ok(None);
        }
        let Mode::Remote(providers) = &self.mode else {
            return Ok(None);
        };
        let providers = Arc::clone(providers);
        let mut updates = Vec::new();
        for camera in self.registry.iter_mut() {
            let handle = camera.handle();
            updates.extend(
                remote::take_updates(camera)
                    .into_iter()
                    .map(|update| (handle, update)),
            );
        }
        Ok(Some((providers, updates)))
    }

    fn round_trip(&mut self, duration_ms: u32) -> Result<()> {
        if let Some(reason) = &self.desynchronized {
            return Err(DeviceError::Desynchronized(reason.clone()));
        }
        let link = self.link.as_mut().ok_or(DeviceError::NotConnected)?;
        let requests = self.registry.drain_requests();
        tracing::debug!(
            step = self.step,
            requests = requests.len(),
            duration_ms,
            "step exchange"
        );

        let answer = match link.exchange(&requests, duration_ms) {
            Ok(answer) => answer,
            Err(err) => return Err(self.latch(err.into())),
        };

        // Nothing is applied unless the whole answer decodes.
        let mut decoded = Vec::with_capacity(answer.packets.len());
        for packet in answer.packets {
            match decode_answers(packet.payload) {
                Ok(records) => decoded.push((DeviceHandle::new(packet.device), records)),
                Err(err) => return Err(self.latch(err.into())),
            }
        }
        if let Err(err) = self.registry.apply_all(decoded, self.step) {
            return Err(self.latch(err));
        }
        Ok(())
    }

    /// Disable the link if `err` means the answer stream is out of sync.
    fn latch(&mut self, err: DeviceError) -> DeviceError {
        if !err.is_desync() {
            return err;
        }
        let reason = err.to_string();
        tracing::error!(step = self.step, %reason, "answer stream desynchronized");
        self.desynchronized = Some(reason.clone());
        DeviceError::Desynchronized(reason)
    }

    fn image(&mut self, handle: DeviceHandle) -> Result<ImageFrame> {
        let step = self.step;
        let camera = self.camera(handle, "get_image")?;
        if camera.sampling_period() == 0 {
            tracing::warn!(camera = %handle, "get_image called for a disabled device, use enable()");
            return Err(DeviceError::Disabled(handle));
        }
        let stale = camera.image_step() != Some(step);

        if stale
            && matches!(self.mode, Mode::Networked)
            && self.image_requests.get(&handle) != Some(&step)
        {
            self.image_requests.insert(handle, step);
            self.camera_mut(handle, "get_image")?
                .stage(PendingWrite::ImageRequest);
            self.round_trip(0)?;
        }

        self.camera(handle, "get_image")?
            .image()
            .cloned()
            .ok_or(DeviceError::NoImage(handle))
    }
}

fn invalid_handle(handle: DeviceHandle, op: &'static str) -> DeviceError {
    tracing::warn!(camera = %handle, op, "called with invalid device tag");
    DeviceError::InvalidHandle(handle)
}

/// Client side of the camera protocol.
///
/// Cameras appear when the host configures them during a step. In
/// remote-control mode no host is contacted: frames are pushed with
/// [`set_image`](Self::set_image) and staged changes go to the registered
/// [`RemoteProviders`].
pub struct Controller {
    state: StepGuard<ControllerState>,
    config: ControllerConfig,
}

impl Controller {
    /// Create a networked controller over a reader/writer pair.
    pub fn new<R, W>(reader: R, writer: W, config: ControllerConfig) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let link = StreamLink {
            reader: PacketReader::with_config(reader, config.packet.clone()),
            writer: PacketWriter::with_config(writer, config.packet.clone()),
        };
        Self::with_link(Box::new(link), config)
    }

    /// Create a networked controller over a custom host link.
    pub fn with_link(link: Box<dyn HostLink>, config: ControllerConfig) -> Self {
        Self::build(Some(link), Mode::Networked, config)
    }

    /// Connect to a host listening on a Unix domain socket.
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<Path>, config: ControllerConfig) -> Result<Self> {
        use std::os::unix::net::UnixStream;

        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(simcam_wire::WireError::Io)?;
        let reader_stream = stream.try_clone().map_err(simcam_wire::WireError::Io)?;
        let link = StreamLink {
            reader: PacketReader::with_config_unix(reader_stream, config.packet.clone())?,
            writer: PacketWriter::with_config_unix(stream, config.packet.clone())?,
        };
        tracing::info!(path = %path.display(), "connected to simulation host");
        Ok(Self::with_link(Box::new(link), config))
    }

    /// Create a controller driven entirely by the application.
    pub fn remote(providers: RemoteProviders, config: ControllerConfig) -> Self {
        Self::build(None, Mode::Remote(Arc::new(providers)), config)
    }

    fn build(link: Option<Box<dyn HostLink>>, mode: Mode, config: ControllerConfig) -> Self {
        Self {
            state: StepGuard::new(ControllerState {
                registry: Registry::new(),
                link,
                mode,
                step: 0,
                image_requests: BTreeMap::new(),
                desynchronized: None,
            }),
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Advance one step of the configured duration.
    pub fn step(&self) -> Result<()> {
        self.step_with(self.config.step_duration_ms)
    }

    /// Advance one step, sending every staged change and applying the
    /// host's answer.
    pub fn step_with(&self, duration_ms: u32) -> Result<()> {
        let _step = self.state.lock();
        self.state.write(|s| s.step += 1);
        self.exchange(duration_ms)
    }

    /// Exchange staged changes without advancing simulated time.
    pub fn flush(&self) -> Result<()> {
        let _step = self.state.lock();
        self.exchange(0)
    }

    /// Providers run with the step lock held but the state released, so
    /// they may call back into the controller.
    fn exchange(&self, duration_ms: u32) -> Result<()> {
        if let Some((providers, updates)) = self.state.write(|s| s.exchange(duration_ms))? {
            for (handle, update) in updates {
                providers.dispatch(handle, update);
            }
        }
        Ok(())
    }

    /// Number of steps taken so far.
    pub fn current_step(&self) -> u64 {
        self.state.read(|s| s.step)
    }

    /// Whether a malformed answer has disabled the host link.
    pub fn is_desynchronized(&self) -> bool {
        self.state.read(|s| s.desynchronized.is_some())
    }

    pub fn is_remote(&self) -> bool {
        self.state.read(|s| matches!(s.mode, Mode::Remote(_)))
    }

    /// Switch to remote control, re-staging each camera's configuration for
    /// the providers.
    pub fn enter_remote(&self, providers: RemoteProviders) {
        self.state.write(|s| {
            let caps = providers.capabilities();
            for camera in s.registry.iter_mut() {
                remote::enter_remote(camera, caps);
            }
            s.mode = Mode::Remote(Arc::new(providers));
            tracing::info!(cameras = s.registry.len(), ?caps, "remote control started");
        })
    }

    /// Return to the networked exchange. Returns the providers that were
    /// installed, if any.
    pub fn leave_remote(&self) -> Option<Arc<RemoteProviders>> {
        self.state
            .write(|s| match std::mem::replace(&mut s.mode, Mode::Networked) {
                Mode::Remote(providers) => {
                    tracing::info!("remote control stopped");
                    Some(providers)
                }
                Mode::Networked => None,
            })
    }

    /// Handles of every configured camera.
    pub fn devices(&self) -> Vec<DeviceHandle> {
        self.state.read(|s| s.registry.handles())
    }

    pub fn contains(&self, handle: DeviceHandle) -> bool {
        self.state.read(|s| s.registry.contains(handle))
    }

    /// Tear down a camera and its recognition list.
    pub fn remove_device(&self, handle: DeviceHandle) -> bool {
        self.state.write(|s| {
            s.image_requests.remove(&handle);
            s.registry.remove(handle).is_some()
        })
    }

    /// Apply a host record locally, as if it had arrived in the current
    /// step.
    pub fn apply(&self, handle: DeviceHandle, answer: Answer) -> Result<()> {
        self.state.write(|s| {
            let step = s.step;
            s.registry.apply(handle, answer, step)
        })
    }

    fn read_camera<R>(
        &self,
        handle: DeviceHandle,
        op: &'static str,
        f: impl FnOnce(&CameraDevice) -> R,
    ) -> Result<R> {
        self.state.read(|s| s.camera(handle, op).map(f))
    }

    fn write_camera<R>(
        &self,
        handle: DeviceHandle,
        op: &'static str,
        f: impl FnOnce(&mut CameraDevice) -> Result<R>,
    ) -> Result<R> {
        self.state.write(|s| f(s.camera_mut(handle, op)?))
    }

    pub fn enable(&self, handle: DeviceHandle, period: i32) -> Result<()> {
        self.write_camera(handle, "enable", |c| c.enable(period))
    }

    pub fn disable(&self, handle: DeviceHandle) -> Result<()> {
        self.write_camera(handle, "disable", CameraDevice::disable)
    }

    pub fn sampling_period(&self, handle: DeviceHandle) -> Result<u16> {
        self.read_camera(handle, "get_sampling_period", CameraDevice::sampling_period)
    }

    pub fn width(&self, handle: DeviceHandle) -> Result<u16> {
        self.read_camera(handle, "get_width", CameraDevice::width)
    }

    pub fn height(&self, handle: DeviceHandle) -> Result<u16> {
        self.read_camera(handle, "get_height", CameraDevice::height)
    }

    pub fn fov(&self, handle: DeviceHandle) -> Result<f64> {
        self.read_camera(handle, "get_fov", CameraDevice::fov)
    }

    pub fn min_fov(&self, handle: DeviceHandle) -> Result<f64> {
        self.read_camera(handle, "get_min_fov", CameraDevice::min_fov)
    }

    pub fn max_fov(&self, handle: DeviceHandle) -> Result<f64> {
        self.read_camera(handle, "get_max_fov", CameraDevice::max_fov)
    }

    pub fn near(&self, handle: DeviceHandle) -> Result<f64> {
        self.read_camera(handle, "get_near", CameraDevice::near)
    }

    pub fn is_spherical(&self, handle: DeviceHandle) -> Result<bool> {
        self.read_camera(handle, "get_projection", CameraDevice::is_spherical)
    }

    pub fn focal_length(&self, handle: DeviceHandle) -> Result<f64> {
        self.read_camera(handle, "get_focal_length", CameraDevice::focal_length)
    }

    pub fn focal_distance(&self, handle: DeviceHandle) -> Result<f64> {
        self.read_camera(handle, "get_focal_distance", CameraDevice::focal_distance)
    }

    pub fn min_focal_distance(&self, handle: DeviceHandle) -> Result<f64> {
        self.read_camera(
            handle,
            "get_min_focal_distance",
            CameraDevice::min_focal_distance,
        )
    }

    pub fn max_focal_distance(&self, handle: DeviceHandle) -> Result<f64> {
        self.read_camera(
            handle,
            "get_max_focal_distance",
            CameraDevice::max_focal_distance,
        )
    }

    pub fn has_recognition(&self, handle: DeviceHandle) -> Result<bool> {
        self.read_camera(handle, "has_recognition", CameraDevice::has_recognition)
    }

    pub fn set_fov(&self, handle: DeviceHandle, fov: f64) -> Result<()> {
        self.write_camera(handle, "set_fov", |c| c.set_fov(fov))
    }

    pub fn set_focal_distance(&self, handle: DeviceHandle, distance: f64) -> Result<()> {
        self.write_camera(handle, "set_focal_distance", |c| {
            c.set_focal_distance(distance)
        })
    }

    pub fn recognition_enable(&self, handle: DeviceHandle, period: i32) -> Result<()> {
        self.write_camera(handle, "recognition_enable", |c| {
            c.recognition_enable(period)
        })
    }

    pub fn recognition_disable(&self, handle: DeviceHandle) -> Result<()> {
        self.write_camera(
            handle,
            "recognition_disable",
            CameraDevice::recognition_disable,
        )
    }

    pub fn recognition_sampling_period(&self, handle: DeviceHandle) -> Result<u16> {
        self.state.read(|s| {
            s.camera(handle, "recognition_get_sampling_period")?
                .recognition_sampling_period()
        })
    }

    pub fn recognition_number_of_objects(&self, handle: DeviceHandle) -> Result<usize> {
        self.state.read(|s| {
            s.camera(handle, "recognition_get_number_of_objects")?
                .recognition_number_of_objects()
        })
    }

    /// Snapshot of the current recognition list. It stays valid after the
    /// next list arrives.
    pub fn recognition_objects(&self, handle: DeviceHandle) -> Result<RecognitionSnapshot> {
        self.state.read(|s| {
            s.camera(handle, "recognition_get_objects")?
                .recognition_objects()
        })
    }

    pub fn recognition_object(
        &self,
        handle: DeviceHandle,
        index: usize,
    ) -> Result<RecognizedObject> {
        self.state.read(|s| {
            s.camera(handle, "recognition_get_object")?
                .recognition_object(index)
        })
    }

    /// Current frame of an enabled camera.
    ///
    /// In networked mode a frame older than the current step is refreshed
    /// with one flush exchange, at most once per step. In remote-control
    /// mode the last pushed frame is returned.
    pub fn image(&self, handle: DeviceHandle) -> Result<ImageFrame> {
        self.state.write(|s| s.image(handle))
    }

    /// Refresh the frame and write it as PNG or JPEG.
    ///
    /// The path and quality are checked before any exchange or file I/O.
    pub fn save_image(
        &self,
        handle: DeviceHandle,
        path: impl AsRef<Path>,
        quality: i32,
    ) -> Result<()> {
        let path = path.as_ref();
        let format = save_format(path, quality)?;
        // Refresh and encode form one critical section.
        let _step = self.state.lock();
        let frame = self.image(handle)?;
        save_frame(&frame, path, format)
    }

    /// Push a BGRA frame (remote-control mode).
    pub fn set_image(&self, handle: DeviceHandle, data: &[u8]) -> Result<()> {
        self.state.write(|s| {
            s.require_remote("set_image")?;
            let step = s.step;
            s.camera_mut(handle, "set_image")?.push_image(data, step)
        })
    }

    /// Raw bytes of the last frame received or pushed, without refreshing
    /// it. Works in both modes.
    pub fn image_buffer(&self, handle: DeviceHandle) -> Result<Bytes> {
        self.state.read(|s| {
            s.camera(handle, "image_buffer")?
                .image()
                .map(|frame| frame.data.clone())
                .ok_or(DeviceError::NoImage(handle))
        })
    }

    /// Install a recognition list produced by the application
    /// (remote-control mode).
    pub fn recognition_set_objects(
        &self,
        handle: DeviceHandle,
        objects: &[RecognizedObject],
    ) -> Result<()> {
        self.state.write(|s| {
            s.require_remote("recognition_set_objects")?;
            s.camera_mut(handle, "recognition_set_objects")?
                .inject_objects(objects);
            Ok(())
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::net::UnixStream;
    use std::sync::{Arc, Mutex};
    use std::thread;

    use bytes::BytesMut;
    use simcam_wire::{
        decode_commands, encode_answer, CameraDescriptor, CameraParameters, Command,
    };

    use super::*;

    const CAM: DeviceHandle = DeviceHandle::new(1);

    fn descriptor() -> CameraDescriptor {
        CameraDescriptor {
            id: 7,
            width: 2,
            height: 1,
            params: CameraParameters {
                fov: 0.5,
                near: 0.01,
                spherical: false,
                min_fov: 0.2,
                max_fov: 1.0,
                has_recognition: true,
                focal_length: 0.0,
                focal_distance: 1.0,
                min_focal_distance: 0.5,
                max_focal_distance: 4.0,
            },
        }
    }

    fn frame() -> ImageFrame {
        ImageFrame {
            width: 2,
            height: 1,
            data: Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7, 8]),
        }
    }

    fn answer_packet(device: u16, answers: &[Answer]) -> Packet {
        let mut payload = BytesMut::new();
        for answer in answers {
            encode_answer(answer, &mut payload).expect("answer should encode");
        }
        Packet::new(device, payload.freeze())
    }

    fn connected() -> (Controller, UnixStream) {
        let (client, host) = UnixStream::pair().expect("socket pair should open");
        let writer = client.try_clone().expect("socket should clone");
        (
            Controller::new(client, writer, ControllerConfig::default()),
            host,
        )
    }

    /// Answer one scripted packet list per exchange and return the requests.
    fn serve(host: UnixStream, script: Vec<Vec<Packet>>) -> thread::JoinHandle<Vec<StepAnswer>> {
        thread::spawn(move || {
            let mut reader = PacketReader::new(host.try_clone().expect("socket should clone"));
            let mut writer = PacketWriter::new(host);
            let mut requests = Vec::new();
            for packets in script {
                requests.push(reader.read_step().expect("request should arrive"));
                writer
                    .write_step(&packets, 32)
                    .expect("answer should be written");
            }
            requests
        })
    }

    fn remote_camera(providers: RemoteProviders) -> Controller {
        let ctrl = Controller::remote(providers, ControllerConfig::default());
        ctrl.apply(CAM, Answer::Configure(descriptor()))
            .expect("configure should apply");
        ctrl
    }

    #[test]
    fn staged_changes_go_out_on_next_step() {
        let (ctrl, host) = connected();
        let server = serve(
            host,
            vec![
                vec![answer_packet(1, &[Answer::Configure(descriptor())])],
                vec![],
            ],
        );

        ctrl.step().expect("first step should succeed");
        assert_eq!(ctrl.devices(), vec![CAM]);

        ctrl.enable(CAM, 64).expect("enable should succeed");
        ctrl.set_fov(CAM, 0.6).expect("fov in range");
        assert!(ctrl.set_fov(CAM, 1.5).is_err());
        ctrl.step().expect("second step should succeed");

        let requests = server.join().expect("host should finish");
        assert!(requests[0].packets.is_empty());
        assert_eq!(requests[0].duration_ms, 32);
        assert_eq!(requests[1].packets.len(), 1);
        assert_eq!(requests[1].packets[0].device, 1);
        assert_eq!(
            decode_commands(requests[1].packets[0].payload.clone()).expect("commands decode"),
            vec![Command::SetSamplingPeriod(64), Command::SetFov(0.6)]
        );
        assert_eq!(ctrl.current_step(), 2);
    }

    #[test]
    fn stale_image_is_refreshed_once() {
        let (ctrl, host) = connected();
        let server = serve(
            host,
            vec![
                vec![answer_packet(1, &[Answer::Configure(descriptor())])],
                vec![answer_packet(1, &[Answer::Image(frame())])],
            ],
        );
        ctrl.step().expect("step should succeed");
        ctrl.enable(CAM, 32).expect("enable should succeed");

        assert_eq!(ctrl.image(CAM).expect("image should arrive"), frame());
        let requests = server.join().expect("host should finish");
        assert_eq!(requests[1].duration_ms, 0);
        assert_eq!(
            decode_commands(requests[1].packets[0].payload.clone()).expect("commands decode"),
            vec![Command::SetSamplingPeriod(32), Command::GetImage]
        );

        // Same step: served from cache, the host is gone.
        assert_eq!(
            ctrl.image_buffer(CAM).expect("frame cached"),
            frame().data
        );
        assert_eq!(ctrl.image(CAM).expect("frame cached"), frame());
    }

    #[test]
    fn missing_image_is_requested_at_most_once_per_step() {
        let (ctrl, host) = connected();
        let server = serve(
            host,
            vec![
                vec![answer_packet(1, &[Answer::Configure(descriptor())])],
                vec![],
            ],
        );
        ctrl.step().expect("step should succeed");
        ctrl.enable(CAM, 32).expect("enable should succeed");

        assert!(matches!(ctrl.image(CAM), Err(DeviceError::NoImage(_))));
        server.join().expect("host should finish");
        assert!(matches!(ctrl.image(CAM), Err(DeviceError::NoImage(_))));
    }

    #[test]
    fn disabled_camera_has_no_image() {
        let ctrl = remote_camera(RemoteProviders::new());
        assert!(matches!(ctrl.image(CAM), Err(DeviceError::Disabled(_))));
    }

    #[test]
    fn unknown_tag_latches_desync() {
        let (ctrl, host) = connected();
        let server = serve(host, vec![vec![Packet::new(1, &b"\x7f"[..])]]);

        let err = ctrl.step().expect_err("unknown tag should fail");
        assert!(matches!(err, DeviceError::Desynchronized(_)));
        assert!(ctrl.is_desynchronized());
        server.join().expect("host should finish");

        assert!(matches!(
            ctrl.step(),
            Err(DeviceError::Desynchronized(_))
        ));
    }

    #[test]
    fn failed_answer_is_not_partly_applied() {
        let (ctrl, host) = connected();
        let server = serve(
            host,
            vec![vec![
                answer_packet(1, &[Answer::Configure(descriptor())]),
                Packet::new(2, &b"\x7f"[..]),
            ]],
        );

        assert!(matches!(
            ctrl.step(),
            Err(DeviceError::Desynchronized(_))
        ));
        server.join().expect("host should finish");
        assert!(ctrl.devices().is_empty());
        assert!(matches!(ctrl.fov(CAM), Err(DeviceError::InvalidHandle(_))));
    }

    #[test]
    fn records_for_unconfigured_device_desync() {
        let (ctrl, host) = connected();
        let server = serve(host, vec![vec![answer_packet(5, &[Answer::Objects(vec![])])]]);
        assert!(matches!(
            ctrl.step(),
            Err(DeviceError::Desynchronized(_))
        ));
        server.join().expect("host should finish");
    }

    #[test]
    fn closed_host_is_not_desync() {
        let (ctrl, host) = connected();
        drop(host);
        let err = ctrl.step().expect_err("closed host should fail");
        assert!(!err.is_desync());
        assert!(!ctrl.is_desynchronized());
    }

    #[test]
    fn invalid_handle_is_reported() {
        let ctrl = remote_camera(RemoteProviders::new());
        let missing = DeviceHandle::new(42);
        assert!(matches!(
            ctrl.fov(missing),
            Err(DeviceError::InvalidHandle(h)) if h == missing
        ));
        assert!(matches!(
            ctrl.enable(missing, 32),
            Err(DeviceError::InvalidHandle(_))
        ));
        assert_eq!(ctrl.fov(CAM).expect("camera exists"), 0.5);
    }

    #[test]
    fn remote_step_delivers_to_providers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let periods = Arc::clone(&seen);
        let fovs = Arc::clone(&seen);
        let providers = RemoteProviders::new()
            .with_set_sampling_period(move |h, p| {
                periods.lock().expect("lock").push(format!("{h}:period={p}"))
            })
            .with_set_fov(move |h, v| fovs.lock().expect("lock").push(format!("{h}:fov={v}")));

        let ctrl = remote_camera(RemoteProviders::new());
        ctrl.enable(CAM, 16).expect("enable should succeed");
        ctrl.step().expect("remote step");
        assert!(seen.lock().expect("lock").is_empty());

        ctrl.enter_remote(providers);
        ctrl.step().expect("remote step");
        assert_eq!(
            *seen.lock().expect("lock"),
            vec!["1:period=16".to_string(), "1:fov=0.5".to_string()]
        );
    }

    #[test]
    fn providers_may_call_back_into_the_controller() {
        let ctrl = Arc::new(remote_camera(RemoteProviders::new()));
        ctrl.enable(CAM, 32).expect("enable should succeed");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let weak = Arc::downgrade(&ctrl);
        ctrl.enter_remote(RemoteProviders::new().with_set_fov(move |h, fov| {
            let ctrl = weak.upgrade().expect("controller should be alive");
            let max = ctrl.max_fov(h).expect("getter inside provider");
            ctrl.set_fov(h, max).expect("setter inside provider");
            record.lock().expect("lock").push((fov, max));
        }));
        ctrl.set_fov(CAM, 0.6).expect("fov in range");

        ctrl.step().expect("remote step");
        assert_eq!(*seen.lock().expect("lock"), vec![(0.6, 1.0)]);
        assert_eq!(ctrl.fov(CAM).expect("camera exists"), 1.0);

        // The provider's own change goes out on the next step.
        ctrl.step().expect("remote step");
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![(0.6, 1.0), (1.0, 1.0)]
        );
    }

    #[test]
    fn image_buffer_returns_pushed_frame_without_refresh() {
        let ctrl = remote_camera(RemoteProviders::new());
        ctrl.enable(CAM, 32).expect("enable should succeed");
        assert!(matches!(
            ctrl.image_buffer(CAM),
            Err(DeviceError::NoImage(_))
        ));
        ctrl.set_image(CAM, &frame().data).expect("frame should be accepted");
        assert_eq!(ctrl.image_buffer(CAM).expect("pushed frame"), frame().data);
    }

    #[test]
    fn pushed_frames_and_mode_checks() {
        let ctrl = remote_camera(RemoteProviders::new());
        ctrl.enable(CAM, 32).expect("enable should succeed");

        assert!(matches!(
            ctrl.set_image(CAM, &[0; 3]),
            Err(DeviceError::ImageSize { expected: 8, actual: 3 })
        ));
        ctrl.set_image(CAM, &frame().data).expect("frame should be accepted");
        assert_eq!(ctrl.image(CAM).expect("pushed frame"), frame());

        assert!(ctrl.leave_remote().is_some());
        assert!(!ctrl.is_remote());
        assert!(matches!(
            ctrl.set_image(CAM, &frame().data),
            Err(DeviceError::WrongMode(_))
        ));
    }

    #[test]
    fn injected_objects_are_readable() {
        let ctrl = remote_camera(RemoteProviders::new());
        ctrl.recognition_enable(CAM, 32).expect("recognition enable");
        let objects = vec![
            RecognizedObject {
                id: 1,
                position: [1.0, 2.0, 3.0],
                orientation: [0.0, 0.0, 1.0, 0.0],
                size: [0.5, 0.5],
                position_on_image: [1, 0],
                size_on_image: [1, 1],
                colors: vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                model: "apple".to_string(),
            },
            RecognizedObject {
                id: 2,
                position: [0.0; 3],
                orientation: [0.0; 4],
                size: [0.0; 2],
                position_on_image: [0; 2],
                size_on_image: [0; 2],
                colors: Vec::new(),
                model: "box".to_string(),
            },
        ];
        ctrl.recognition_set_objects(CAM, &objects)
            .expect("objects should be injected");

        assert_eq!(ctrl.recognition_number_of_objects(CAM).expect("count"), 2);
        let second = ctrl.recognition_object(CAM, 1).expect("second object");
        assert!(second.colors.is_empty());
        assert_eq!(second.model, "box");
        assert_eq!(
            ctrl.recognition_objects(CAM).expect("snapshot")[0].colors.len(),
            3
        );
        assert!(matches!(
            ctrl.recognition_object(CAM, 2),
            Err(DeviceError::ObjectIndex { index: 2, len: 2 })
        ));
    }

    #[test]
    fn save_image_checks_request_before_refresh() {
        let ctrl = remote_camera(RemoteProviders::new());
        ctrl.enable(CAM, 32).expect("enable should succeed");
        assert!(matches!(
            ctrl.save_image(CAM, "frame.gif", 50),
            Err(DeviceError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ctrl.save_image(CAM, "frame.jpeg", 0),
            Err(DeviceError::InvalidQuality(0))
        ));

        ctrl.set_image(CAM, &frame().data).expect("frame should be accepted");
        let dir = std::env::temp_dir().join(format!("simcam-save-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        let path = dir.join("frame.png");
        ctrl.save_image(CAM, &path, 100).expect("png should save");
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn remove_device_tears_down() {
        let ctrl = remote_camera(RemoteProviders::new());
        assert!(ctrl.remove_device(CAM));
        assert!(!ctrl.contains(CAM));
        assert!(!ctrl.remove_device(CAM));
    }
}
