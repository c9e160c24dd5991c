use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("in")).expect("mkdir in");
        Self { dir }
    }

    fn input(&self, name: &str) -> PathBuf {
        self.dir.path().join("in").join(name)
    }

    fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join("out").join(name)
    }

    /// A command with every path pointed into the workspace and no
    /// credentials inherited from the caller.
    fn command(&self) -> Command {
        self.command_with_env_file(&self.dir.path().join("no-such-env"))
    }

    fn command_with_env_file(&self, env_file: &Path) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_codeloop"));
        cmd.env_remove("PREM_API_KEY")
            .env_remove("PREM_PROJECT_ID")
            .env_remove("PREM_BASE_URL")
            .env_remove("PREM_MODEL")
            .env_remove("RUST_LOG")
            .arg("--env-file")
            .arg(env_file)
            .arg("--spec")
            .arg(self.input("spec"))
            .arg("--prior-source")
            .arg(self.input("__main__.py"))
            .arg("--prior-explanation")
            .arg(self.input("explanation"))
            .arg("--log")
            .arg(self.input("log"))
            .arg("--fix")
            .arg(self.input("fix"))
            .arg("--source-out")
            .arg(self.output("__main__.py"));
        cmd
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("file should exist")
}

#[test]
fn missing_credentials_exit_with_configuration_status() {
    let ws = Workspace::new();
    std::fs::write(ws.input("spec"), "A flask app").expect("write spec");

    let output = ws.command().output().expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("PREM_API_KEY"));
    assert!(!ws.output("__main__.py").exists());
}

#[test]
fn credentials_load_from_env_file() {
    let ws = Workspace::new();
    let env_file = ws.dir.path().join(".ayup-env");
    std::fs::write(&env_file, "PREM_API_KEY=from-file\n").expect("write env file");

    let output = ws
        .command_with_env_file(&env_file)
        .output()
        .expect("binary should run");

    // The key came from the file, so the project id is what is missing now
    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains("PREM_PROJECT_ID"));
    assert!(!err.contains("PREM_API_KEY is not set"));
}

#[test]
fn missing_inputs_exit_with_input_status() {
    let ws = Workspace::new();

    let output = ws
        .command()
        .env("PREM_API_KEY", "k")
        .env("PREM_PROJECT_ID", "1")
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains(&ws.input("spec").display().to_string()));
    assert!(!ws.output("__main__.py").exists());
}

#[test]
fn non_numeric_project_id_is_rejected() {
    let ws = Workspace::new();
    std::fs::write(ws.input("spec"), "A flask app").expect("write spec");

    let output = ws
        .command()
        .env("PREM_API_KEY", "k")
        .env("PREM_PROJECT_ID", "my-project")
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("PREM_PROJECT_ID"));
}

#[test]
fn scaffold_writes_app_and_marker_without_credentials() {
    let ws = Workspace::new();

    let output = ws
        .command()
        .arg("scaffold")
        .arg("--next-out")
        .arg(ws.output("next"))
        .output()
        .expect("binary should run");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(read(&ws.output("__main__.py")).contains("Hello, World!"));
    assert_eq!(read(&ws.output("next")), "builtin:python");
}

#[test]
fn invalid_next_assistant_is_a_usage_error() {
    let ws = Workspace::new();

    let output = ws
        .command()
        .arg("scaffold")
        .arg("--next-assistant")
        .arg("python")
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("No ':' in assistant name"));
    assert!(!ws.output("__main__.py").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn generate_round_against_mock_api() {
    let answer = "Done.\n\n```python\nprint('hello')\n```\n";
    let (url, shutdown_tx, server_task) = spawn_test_server(
        StatusCode::OK,
        json!({"choices": [{"message": {"role": "assistant", "content": answer}}]}),
    )
    .await;

    let ws = Workspace::new();
    std::fs::write(ws.input("spec"), "Print hello").expect("write spec");
    let mut cmd = ws.command();
    cmd.env("PREM_API_KEY", "k")
        .env("PREM_PROJECT_ID", "7")
        .arg("--base-url")
        .arg(&url)
        .arg("--explanation-out")
        .arg(ws.output("explanation"));

    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .expect("blocking task should join")
        .expect("binary should run");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(read(&ws.output("__main__.py")), "print('hello')\n");
    assert_eq!(read(&ws.output("explanation")), answer);
    assert!(!ws.output("next").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_response_exits_with_upstream_status() {
    let (url, shutdown_tx, server_task) =
        spawn_test_server(StatusCode::OK, json!({"status": "queued"})).await;

    let ws = Workspace::new();
    std::fs::write(ws.input("spec"), "Print hello").expect("write spec");
    let mut cmd = ws.command();
    cmd.env("PREM_API_KEY", "k")
        .env("PREM_PROJECT_ID", "7")
        .arg("--base-url")
        .arg(&url);

    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .expect("blocking task should join")
        .expect("binary should run");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert_eq!(output.status.code(), Some(1));
    assert!(!ws.output("__main__.py").exists());
}

async fn spawn_test_server(
    status: StatusCode,
    body: Value,
) -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(_payload): Json<Value>| {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let local_addr = listener
        .local_addr()
        .expect("listener address should resolve");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });

        server.await.expect("test server should run");
    });

    (format!("http://{local_addr}"), shutdown_tx, server_task)
}
