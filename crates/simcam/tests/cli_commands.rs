#![cfg(all(unix, feature = "cli"))]

use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::process::Command;
use std::thread;

use bytes::BytesMut;
use simcam_wire::{
    encode_answer, Answer, CameraDescriptor, CameraParameters, Packet, PacketReader, PacketWriter,
};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/simcamcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn simcam() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_simcam"));
    command.arg("--log-level").arg("error");
    command
}

#[test]
fn encoded_objects_decode_back() {
    let dir = unique_temp_dir("objects");
    let json_path = dir.join("objects.json");
    let bin_path = dir.join("objects.bin");
    std::fs::write(
        &json_path,
        r#"[{
            "id": 42,
            "position": [0.5, 0.0, -2.0],
            "orientation": [0.0, 1.0, 0.0, 0.0],
            "size": [0.3, 0.4],
            "position_on_image": [10, 20],
            "size_on_image": [5, 6],
            "colors": [[1.0, 0.0, 0.0]],
            "model": "can"
        }]"#,
    )
    .expect("json fixture should be writable");

    let status = simcam()
        .arg("encode-objects")
        .arg(&json_path)
        .arg("--device")
        .arg("3")
        .arg("-o")
        .arg(&bin_path)
        .status()
        .expect("encode-objects should run");
    assert!(status.success());

    let output = simcam()
        .arg("--format")
        .arg("json")
        .arg("decode")
        .arg(&bin_path)
        .output()
        .expect("decode should run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    let line = stdout.lines().next().expect("one record line");
    let value: serde_json::Value = serde_json::from_str(line).expect("record should be json");
    assert_eq!(value["step"], 0);
    assert_eq!(value["device"], 3);
    assert_eq!(value["record"], "CAMERA_OBJECTS");
    assert_eq!(value["detail"][0]["id"], 42);
    assert_eq!(value["detail"][0]["model"], "can");
    assert_eq!(value["detail"][0]["colors"][0][0], 1.0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_missing_file_exits_not_found() {
    let dir = unique_temp_dir("missing");
    let output = simcam()
        .arg("decode")
        .arg(dir.join("absent.bin"))
        .output()
        .expect("decode should run");
    assert_eq!(output.status.code(), Some(51));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encode_rejects_malformed_json() {
    let dir = unique_temp_dir("badjson");
    let json_path = dir.join("objects.json");
    std::fs::write(&json_path, "[{\"id\": 1}]").expect("fixture should be writable");

    let output = simcam()
        .arg("encode-objects")
        .arg(&json_path)
        .arg("--device")
        .arg("1")
        .arg("-o")
        .arg(dir.join("out.bin"))
        .output()
        .expect("encode-objects should run");
    assert_eq!(output.status.code(), Some(60));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn inspect_lists_configured_cameras() {
    let dir = unique_temp_dir("inspect");
    let sock_path = dir.join("host.sock");
    let listener = UnixListener::bind(&sock_path).expect("host socket should bind");

    let host = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("controller should connect");
        let mut reader = PacketReader::new(stream.try_clone().expect("stream clones"));
        let mut writer = PacketWriter::new(stream);

        let request = reader.read_step().expect("controller sends a step");
        assert!(request.packets.is_empty());

        let descriptor = CameraDescriptor {
            id: 9,
            width: 4,
            height: 3,
            params: CameraParameters {
                fov: 0.785,
                near: 0.05,
                spherical: false,
                min_fov: 0.5,
                max_fov: 1.0,
                has_recognition: true,
                focal_length: 0.0,
                focal_distance: 0.0,
                min_focal_distance: 0.0,
                max_focal_distance: 0.0,
            },
        };
        let mut payload = BytesMut::new();
        encode_answer(&Answer::Configure(descriptor), &mut payload).expect("descriptor encodes");
        writer
            .write_step(&[Packet::new(7, payload.freeze())], 32)
            .expect("host answers");
    });

    let output = simcam()
        .arg("--format")
        .arg("json")
        .arg("inspect")
        .arg(&sock_path)
        .output()
        .expect("inspect should run");
    host.join().expect("host thread should finish");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    let value: serde_json::Value =
        serde_json::from_str(stdout.lines().next().expect("one device line"))
            .expect("device should be json");
    assert_eq!(value["tag"], 7);
    assert_eq!(value["width"], 4);
    assert_eq!(value["height"], 3);
    assert_eq!(value["recognition"], true);

    let _ = std::fs::remove_dir_all(&dir);
}
