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

fn spawn_serve(port: u16) -> Child {
    Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("serve")
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("serve command should start")
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
fn call_round_trips_the_demo_operations() {
    let port = free_port();
    let mut child = spawn_serve(port);
    wait_for_server(port, Duration::from_secs(3));

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("raw")
        .arg("call")
        .arg("echo")
        .arg("Marco")
        .arg("--port")
        .arg(port.to_string())
        .output()
        .expect("call should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "I received: Marco\n");

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("raw")
        .arg("call")
        .arg("name")
        .arg("--port")
        .arg(port.to_string())
        .output()
        .expect("call should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "foo\n");

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn remote_error_exits_nonzero_and_session_continues() {
    let port = free_port();
    let mut child = spawn_serve(port);
    wait_for_server(port, Duration::from_secs(3));

    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("call")
        .arg("raise_exception")
        .arg("--port")
        .arg(port.to_string())
        .output()
        .expect("call should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not_implemented"));
    assert!(stderr.contains("Foo!"));

    // The failure answered one request; the server keeps serving.
    let output = Command::new(env!("CARGO_BIN_EXE_rpcprims"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("raw")
        .arg("call")
        .arg("ping")
        .arg("--port")
        .arg(port.to_string())
        .output()
        .expect("call should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "PONG\n");

    let _ = child.kill();
    let _ = child.wait();
}
