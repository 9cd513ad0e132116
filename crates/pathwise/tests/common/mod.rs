//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Environment variables that would let a test reach real services.
const SCRUBBED_ENV: [&str; 4] = [
    "GROQ_API_KEY",
    "GEMINI_API_KEY",
    "NODE_API_URL",
    "RISK_ALERT_THRESHOLD",
];

/// Three-task chain T1 <- T2 <- T3; T1 is done.
pub const CHAIN_SNAPSHOT: &str = r#"{
    "project": {
        "id": "proj-1",
        "name": "Apollo",
        "tasks": [
            {"id": "T1", "title": "Design", "status": "DONE", "priority": "HIGH",
             "assigneeId": "u1", "assigneeName": "Ada",
             "dueDate": "2024-01-05T00:00:00Z", "createdAt": "2024-01-01T00:00:00Z"},
            {"id": "T2", "title": "Build", "status": "IN_PROGRESS", "priority": "HIGH",
             "assigneeId": "u1", "assigneeName": "Ada",
             "dueDate": "2024-01-10T00:00:00Z", "createdAt": "2024-01-02T00:00:00Z"},
            {"id": "T3", "title": "Ship", "status": "TODO", "priority": "MEDIUM",
             "assigneeId": "u2",
             "dueDate": "2024-01-15T00:00:00Z", "createdAt": "2024-01-02T00:00:00Z"}
        ],
        "existingDependencies": [
            {"id": "d1", "taskId": "T2", "dependsOnTaskId": "T1", "type": "FINISH_TO_START"},
            {"id": "d2", "taskId": "T3", "dependsOnTaskId": "T2", "type": "FINISH_TO_START"}
        ]
    }
}"#;

/// A project with a single task.
pub const SINGLE_TASK_SNAPSHOT: &str = r#"{
    "id": "proj-2",
    "name": "Solo",
    "tasks": [
        {"id": "only", "title": "Everything", "status": "TODO", "priority": "LOW",
         "assigneeId": "u1", "dueDate": "2024-01-20", "createdAt": "2024-01-01"}
    ]
}"#;

/// Path of the pathwise binary built for this test run.
pub fn pathwise_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pathwise"))
}

fn pathwise_command(dir: &Path, args: &[&str]) -> Command {
    let mut command = Command::new(pathwise_binary());
    command
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off");
    for key in SCRUBBED_ENV {
        command.env_remove(key);
    }
    command
}

/// Run the pathwise binary in the specified directory
pub fn run_pathwise_in_dir(dir: &Path, args: &[&str]) -> Output {
    pathwise_command(dir, args)
        .output()
        .expect("Failed to execute pathwise binary")
}

/// Run the pathwise binary with `input` on stdin
pub fn run_pathwise_with_stdin(dir: &Path, args: &[&str], input: &str) -> Output {
    let mut child = pathwise_command(dir, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn pathwise binary");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for pathwise")
}

/// Write a snapshot file into `dir` and return its path
pub fn write_snapshot(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write snapshot");
    path
}

/// Parse stdout as JSON
pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}
