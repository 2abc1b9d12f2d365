#![cfg(feature = "cli")]

use std::net::{SocketAddr, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("ephemeral port should bind")
        .local_addr()
        .expect("bound listener should have an address")
        .port()
}

fn spawn_serve(port: u16, extra: &[&str]) -> Child {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rpcprims"));
    command
        .arg("--log-level")
        .arg("error")
        .arg("serve")
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    for arg in extra {
        command.arg(arg);
    }
    command.spawn().expect("serve command should start")
}

fn wait_for_server(port: u16, timeout: Duration) {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let start = Instant::now();
    loop {
        if TcpStream::connect_timeout(&addr, Duration::from_millis(250)).is_ok() {
            return;
        }
        if start.elapsed() >= timeout {
            panic!("server did not start listening in time");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn call_emits_result_envelope_as_json() {
    let port = free_port();
    let mut child = spawn_serve(port, &[]);
    wait_for_server(port, Duration::from_secs(3));

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("call")
        .arg("echo")
        .arg("Marco")
        .arg("--port")
        .arg(port.to_string())
        .output()
        .expect("call should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("call-result.schema.json"));
    let payload: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("call should emit json");
    assert_eq!(
        payload.get("command").and_then(|v| v.as_str()),
        Some("echo")
    );
    assert_eq!(
        payload.get("result").and_then(|v| v.as_str()),
        Some("I received: Marco")
    );

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn call_kwargs_reach_the_operation() {
    let port = free_port();
    let mut child = spawn_serve(port, &[]);
    wait_for_server(port, Duration::from_secs(3));

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("raw")
        .arg("call")
        .arg("story")
        .arg("--port")
        .arg(port.to_string())
        .arg("-k")
        .arg("food=cake")
        .arg("-k")
        .arg("effect=delicious")
        .output()
        .expect("call should run");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "The cake is delicious\n"
    );

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn ops_lists_the_catalog_as_json() {
    let port = free_port();
    let mut child = spawn_serve(port, &[]);
    wait_for_server(port, Duration::from_secs(3));

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("ops")
        .arg("--port")
        .arg(port.to_string())
        .output()
        .expect("ops should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("operation-catalog.schema.json"));
    let payload: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("ops should emit json");
    assert_eq!(payload.get("count").and_then(|v| v.as_u64()), Some(4));
    let operations = payload
        .get("operations")
        .and_then(|v| v.as_array())
        .expect("catalog should list operations");
    let echo = operations
        .iter()
        .find(|op| op.get("name").and_then(|v| v.as_str()) == Some("echo"))
        .expect("echo should be listed");
    assert_eq!(
        echo.get("doc").and_then(|v| v.as_str()),
        Some("Responds back to the caller.")
    );

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn unknown_operation_exits_with_remote_error_code() {
    let port = free_port();
    let mut child = spawn_serve(port, &[]);
    wait_for_server(port, Duration::from_secs(3));

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("call")
        .arg("parrot")
        .arg("--port")
        .arg(port.to_string())
        .output()
        .expect("call should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no such operation: parrot"));

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn protocol_mismatch_fails_cleanly() {
    let port = free_port();
    let mut child = spawn_serve(port, &[]);
    wait_for_server(port, Duration::from_secs(3));

    // The server speaks JSON; a msgpack discovery is dropped unanswered.
    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("call")
        .arg("ping")
        .arg("--port")
        .arg(port.to_string())
        .arg("--protocol")
        .arg("2")
        .output()
        .expect("call should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect failed"));

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn connect_refused_exits_with_failure() {
    let port = free_port();

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("call")
        .arg("ping")
        .arg("--port")
        .arg(port.to_string())
        .arg("--connect-timeout")
        .arg("1s")
        .output()
        .expect("call should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect failed"));
}

#[test]
fn usage_errors_exit_with_sysexits_code() {
    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("call")
        .arg("ping")
        .arg("--protocol")
        .arg("9")
        .output()
        .expect("call should run");
    assert_eq!(output.status.code(), Some(64));

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("call")
        .arg("ping")
        .arg("-k")
        .arg("no-equals")
        .output()
        .expect("call should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn serve_timeout_exits_on_its_own() {
    let port = free_port();
    let mut child = spawn_serve(port, &["--timeout", "1s"]);
    wait_for_server(port, Duration::from_secs(3));

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().expect("child status should poll") {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            panic!("serve --timeout should exit on its own");
        }
        thread::sleep(Duration::from_millis(50));
    };

    assert!(status.success());
}

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("rpcprims {}", env!("CARGO_PKG_VERSION"))
    );

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: rpcprims"));
    assert!(stdout.contains("features: server=true, client=true, cli=true"));
}
