use crate::cmd::InspectArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

#[cfg(unix)]
pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    use std::time::Duration;

    use simcam_device::{Controller, ControllerConfig};
    use simcam_wire::PacketConfig;

    use crate::exit::{device_error, SUCCESS};
    use crate::output::print_devices;

    let timeout = Some(Duration::from_millis(args.timeout_ms));
    let config = ControllerConfig {
        packet: PacketConfig {
            read_timeout: timeout,
            write_timeout: timeout,
            ..PacketConfig::default()
        },
        step_duration_ms: args.duration,
    };

    let controller = Controller::connect_unix(&args.path, config)
        .map_err(|err| device_error("connect failed", err))?;
    for step in 0..args.steps {
        controller
            .step()
            .map_err(|err| device_error(&format!("step {step} failed"), err))?;
    }

    let devices = controller
        .devices()
        .into_iter()
        .map(|handle| describe(&controller, handle))
        .collect::<simcam_device::Result<Vec<_>>>()
        .map_err(|err| device_error("query failed", err))?;
    tracing::debug!(
        steps = controller.current_step(),
        devices = devices.len(),
        "inspect finished"
    );

    print_devices(&devices, format);
    Ok(SUCCESS)
}

#[cfg(not(unix))]
pub fn run(_args: InspectArgs, _format: OutputFormat) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::FAILURE,
        "inspect requires Unix domain sockets",
    ))
}

#[cfg(unix)]
fn describe(
    controller: &simcam_device::Controller,
    handle: simcam_device::DeviceHandle,
) -> simcam_device::Result<crate::output::DeviceOutput> {
    Ok(crate::output::DeviceOutput {
        tag: handle.tag(),
        width: controller.width(handle)?,
        height: controller.height(handle)?,
        fov: controller.fov(handle)?,
        spherical: controller.is_spherical(handle)?,
        recognition: controller.has_recognition(handle)?,
    })
}
