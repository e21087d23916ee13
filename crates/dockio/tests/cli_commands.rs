#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use dockio::frame::{FrameWriter, StreamType};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/dockio-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn write_capture(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("capture should be writable");
    path
}

fn multiplexed(frames: &[(StreamType, &str)]) -> Vec<u8> {
    let mut writer = FrameWriter::new(Vec::new());
    for (stream, payload) in frames {
        writer
            .send(*stream, payload.as_bytes())
            .expect("frame should encode");
    }
    writer.into_inner()
}

fn dockio(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dockio"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("dockio should run")
}

#[test]
fn demux_merges_stdout_and_stderr() {
    let dir = unique_temp_dir("demux-merge");
    let body = multiplexed(&[
        (StreamType::Stdout, "out\n"),
        (StreamType::Stderr, "err\n"),
        (StreamType::Stdout, "more\n"),
    ]);
    let capture = write_capture(&dir, "attach.bin", &body);

    let output = dockio(&["demux", capture.to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "out\nerr\nmore\n");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn demux_split_routes_stderr() {
    let dir = unique_temp_dir("demux-split");
    let body = multiplexed(&[(StreamType::Stdout, "out"), (StreamType::Stderr, "err")]);
    let capture = write_capture(&dir, "exec.bin", &body);

    let output = dockio(&["demux", "--split", capture.to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "out");
    assert_eq!(String::from_utf8_lossy(&output.stderr), "err");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn demux_reads_stdin() {
    let body = multiplexed(&[(StreamType::Stdout, "piped")]);
    let mut child = Command::new(env!("CARGO_BIN_EXE_dockio"))
        .arg("demux")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("demux should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&body)
        .expect("stdin should accept body");

    let output = child.wait_with_output().expect("demux should finish");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "piped");
}

#[test]
fn demux_truncated_body_is_invalid_data() {
    let dir = unique_temp_dir("demux-truncated");
    let mut body = multiplexed(&[(StreamType::Stdout, "complete")]);
    body.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 9, b'x']);
    let capture = write_capture(&dir, "logs.bin", &body);

    let output = dockio(&["demux", capture.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(60));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "complete");
    assert!(String::from_utf8_lossy(&output.stderr).contains("incomplete multiplexed chunk"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn json_streams_one_value_per_line() {
    let dir = unique_temp_dir("json-stream");
    let capture = write_capture(
        &dir,
        "events.json",
        b"{\"status\":\"start\",\"id\":\"abc\"}\n{\"status\":\"die\",\"id\":\"abc\"}\n",
    );

    let output = dockio(&["--format", "json", "json", capture.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let values: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    assert_eq!(values.len(), 2);
    assert_eq!(values[1]["status"], "die");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn json_collect_progress() {
    let dir = unique_temp_dir("json-collect");
    let capture = write_capture(
        &dir,
        "pull.json",
        b"{\"status\":\"Pulling fs layer\"}{\"status\":\"Download complete\"}",
    );

    let output = dockio(&[
        "--format",
        "json",
        "json",
        "--collect",
        "--event",
        "progress",
        capture.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let values: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("collect should emit one json array");
    assert_eq!(
        values,
        serde_json::json!([
            {"status": "Pulling fs layer"},
            {"status": "Download complete"}
        ])
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn json_remote_error_exits_70() {
    let dir = unique_temp_dir("json-remote");
    let capture = write_capture(
        &dir,
        "pull.json",
        b"{\"status\":\"Pulling\"}\n{\"error\":\"pull access denied\"}\n{\"status\":\"never\"}\n",
    );

    let output = dockio(&["--format", "json", "json", capture.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(70));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pulling"));
    assert!(!stdout.contains("never"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("pull access denied"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn json_incomplete_value_is_invalid_data() {
    let dir = unique_temp_dir("json-truncated");
    let capture = write_capture(&dir, "stats.json", b"[1,2");

    let output = dockio(&["json", "--collect", capture.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(60));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn frames_lists_offsets_and_streams() {
    let dir = unique_temp_dir("frames");
    let body = multiplexed(&[(StreamType::Stdout, "hello"), (StreamType::Stderr, "oops")]);
    let capture = write_capture(&dir, "logs.bin", &body);

    let output = dockio(&["--format", "json", "frames", capture.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let frames: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["stream"], "stdout");
    assert_eq!(frames[1]["stream"], "stderr");
    assert_eq!(frames[1]["offset"], 13);
    assert_eq!(frames[1]["payload"], "oops");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn mux_emits_one_frame() {
    let output = dockio(&["mux", "--stream", "stderr", "--data", "err"]);

    assert!(output.status.success());
    assert_eq!(output.stdout, b"\x02\x00\x00\x00\x00\x00\x00\x03err");
}

#[test]
fn missing_input_is_usage_error() {
    let output = dockio(&["frames", "/tmp/dockio-cli-does-not-exist.bin"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_package_version() {
    let output = dockio(&["version"]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("dockio {}", env!("CARGO_PKG_VERSION"))
    );
}
