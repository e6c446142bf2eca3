//! Process-level tests for the shellmate binary
//!
//! These spawn the built binary with stdin held open, the way an idle
//! interactive session looks, and check how the process ends.

#![cfg(unix)]

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::timeout;

/// Start the binary with an unreachable model endpoint and no trace export
fn spawn_session() -> Child {
    Command::new(env!("CARGO_BIN_EXE_shellmate"))
        .env("OLLAMA_BASE_URL", "http://127.0.0.1:1")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("failed to spawn shellmate binary")
}

/// Read stdout until `needle` shows up, returning everything read so far
async fn read_until(stdout: &mut ChildStdout, needle: &str) -> String {
    let mut seen = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stdout.read(&mut chunk).await.unwrap();
        assert!(n > 0, "stdout closed before {:?} appeared", needle);
        seen.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&seen).to_string();
        if text.contains(needle) {
            return text;
        }
    }
}

fn send_sigint(child: &Child) {
    let pid = child.id().expect("child already exited");
    let status = std::process::Command::new("kill")
        .args(["-INT", &pid.to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

/// Ctrl-C at the request prompt ends the process with status 130 even though
/// stdin is still open
#[tokio::test]
async fn test_interrupt_at_prompt_exits_130() {
    let mut child = spawn_session();
    let _stdin = child.stdin.take().unwrap();
    let mut stdout = child.stdout.take().unwrap();

    timeout(Duration::from_secs(10), read_until(&mut stdout, "You:"))
        .await
        .expect("prompt never appeared");

    send_sigint(&child);

    let status = timeout(Duration::from_secs(5), child.wait())
        .await
        .expect("process still running after SIGINT")
        .unwrap();
    assert_eq!(status.code(), Some(130));

    let mut rest = String::new();
    stdout.read_to_string(&mut rest).await.unwrap();
    assert!(rest.contains("Interrupted. Goodbye!"));
}

/// Closing stdin at the prompt is a normal goodbye with status 0
#[tokio::test]
async fn test_end_of_input_exits_cleanly() {
    let mut child = spawn_session();
    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = child.stdout.take().unwrap();

    timeout(Duration::from_secs(10), read_until(&mut stdout, "You:"))
        .await
        .expect("prompt never appeared");
    stdin.shutdown().await.unwrap();
    drop(stdin);

    let status = timeout(Duration::from_secs(5), child.wait())
        .await
        .expect("process still running after EOF")
        .unwrap();
    assert!(status.success());
}

/// The exit token ends the session without contacting the model
#[tokio::test]
async fn test_exit_token_exits_cleanly() {
    let mut child = spawn_session();
    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = child.stdout.take().unwrap();

    timeout(Duration::from_secs(10), read_until(&mut stdout, "You:"))
        .await
        .expect("prompt never appeared");
    stdin.write_all(b"QUIT\n").await.unwrap();
    stdin.flush().await.unwrap();

    let status = timeout(Duration::from_secs(5), child.wait())
        .await
        .expect("process still running after exit token")
        .unwrap();
    assert!(status.success());

    let mut rest = String::new();
    stdout.read_to_string(&mut rest).await.unwrap();
    assert!(rest.contains("Goodbye!"));
}
