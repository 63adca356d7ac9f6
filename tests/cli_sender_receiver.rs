use std::fs;
use std::net::UdpSocket;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

fn free_port() -> u16 {
    UdpSocket::bind("127.0.0.1:0")
        .and_then(|s| s.local_addr())
        .expect("bind ephemeral port")
        .port()
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("scorelink-{}-{name}", std::process::id()));
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn sender_lists_buildable_profiles() {
    let output = Command::new(env!("CARGO_BIN_EXE_sender"))
        .args(["--list-profiles", "--quiet"])
        .output()
        .expect("run sender");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout.lines().collect();
    assert_eq!(names, vec!["test_sender", "test_sender_excel"]);
}

#[test]
fn template_profile_is_rejected() {
    let output = Command::new(env!("CARGO_BIN_EXE_receiver"))
        .args(["--profile", "receiver_base", "--quiet"])
        .output()
        .expect("run receiver");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("receiver_base"), "stderr: {stderr}");
}

#[test]
fn receiver_sink_override_is_checked_by_clap() {
    let output = Command::new(env!("CARGO_BIN_EXE_receiver"))
        .args(["--sink", "bogus", "--quiet"])
        .output()
        .expect("run receiver");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid value 'bogus'"), "stderr: {stderr}");
    assert!(stderr.contains("printer") && stderr.contains("segments"), "stderr: {stderr}");

    let output = Command::new(env!("CARGO_BIN_EXE_receiver"))
        .args(["--bind", "127.0.0.1:0", "--sink", "segments", "--receive-timeout-ms", "20", "--run-ms", "100", "--quiet"])
        .output()
        .expect("run receiver");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("bound_addr=none"), "stdout: {stdout}");
}

#[test]
fn receiver_loads_profiles_file() {
    let profiles = temp_file(
        "profiles.json",
        r#"{ "receivers": { "bench": { "based_on": "test_receiver", "bind_addr": "127.0.0.1:0", "receive_timeout_ms": 20 } } }"#,
    );
    let output = Command::new(env!("CARGO_BIN_EXE_receiver"))
        .args(["--profiles", profiles.to_str().unwrap(), "--profile", "bench", "--run-ms", "100", "--quiet"])
        .output()
        .expect("run receiver");
    let _ = fs::remove_file(&profiles);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("bound_addr=none"), "stdout: {stdout}");
    assert!(stdout.contains("score 00 00 00 00 00 00 00 00 00"), "stdout: {stdout}");
}

#[test]
fn sender_delivers_score_to_receiver_over_udp() {
    let port = free_port();
    let receiver_addr = format!("127.0.0.1:{port}");

    let receiver = Command::new(env!("CARGO_BIN_EXE_receiver"))
        .args([
            "--bind",
            &receiver_addr,
            "--receive-timeout-ms",
            "20",
            "--run-ms",
            "3000",
            "--seed",
            "1",
            "--quiet",
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn receiver");
    thread::sleep(Duration::from_millis(300));

    let sender = Command::new(env!("CARGO_BIN_EXE_sender"))
        .args([
            "--receiver",
            &receiver_addr,
            "--bind",
            "127.0.0.1:0",
            "--score",
            "01 02 03 04 05 06 07 08 09",
            "--tick-ms",
            "50",
            "--run-ms",
            "1500",
            "--seed",
            "2",
            "--quiet",
        ])
        .output()
        .expect("run sender");
    let receiver = receiver.wait_with_output().expect("wait receiver");

    assert!(sender.status.success());
    assert!(receiver.status.success());
    let sender_out = String::from_utf8_lossy(&sender.stdout);
    let receiver_out = String::from_utf8_lossy(&receiver.stdout);
    assert!(sender_out.contains("connected=true"), "sender stdout: {sender_out}");
    assert!(sender_out.contains("handshakes=1"), "sender stdout: {sender_out}");
    assert!(
        receiver_out.contains("score 01 02 03 04 05 06 07 08 09"),
        "receiver stdout: {receiver_out}"
    );
    assert!(receiver_out.contains("board 123|4|56|789"), "receiver stdout: {receiver_out}");
}
