#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run the binary with `args`, feeding `stdin` and running in `cwd`.
/// Returns `(exit_code, stdout, stderr)`.
pub fn run_cli(args: &[&str], stdin: &str, cwd: &Path) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_autocommitter"))
        .args(args)
        .current_dir(cwd)
        .env_remove("CLAUDE_CONFIG_PATH")
        .env_remove("AUTOCOMMITTER_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn binary");

    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();

    let output = child.wait_with_output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

/// Create a temp dir containing a git repo with an initial commit and return it.
/// The `TempDir` must be kept alive for the duration of the test.
pub fn temp_git_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();

    // Configure user identity for commits.
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test").unwrap();
    config.set_str("user.email", "test@test.com").unwrap();

    // Create an initial commit so HEAD exists.
    let sig = repo.signature().unwrap();
    let tree_oid = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();

    dir
}

/// A Claude config dir whose preferences turn notifications off, so hook
/// runs in tests never shell out to a desktop notifier.
pub fn temp_claude_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let hooks = dir.path().join("hooks");
    fs::create_dir_all(&hooks).unwrap();
    fs::write(hooks.join("autocommitter.toml"), "notifications = false\n").unwrap();
    dir
}

/// Write a transcript whose assistant messages are `texts`, interleaved
/// with user records and a malformed line.
pub fn write_transcript(path: &Path, texts: &[&str]) {
    let mut lines = Vec::new();
    for text in texts {
        lines.push(
            serde_json::json!({
                "type": "user",
                "message": { "role": "user", "content": "next" }
            })
            .to_string(),
        );
        lines.push(
            serde_json::json!({
                "type": "assistant",
                "message": {
                    "role": "assistant",
                    "type": "message",
                    "content": [{ "type": "text", "text": text }]
                }
            })
            .to_string(),
        );
        lines.push("{ not json".to_string());
    }
    fs::write(path, lines.join("\n")).unwrap();
}

pub fn stop_payload(transcript_path: &Path, stop_hook_active: Option<bool>) -> String {
    let mut payload = serde_json::json!({
        "session_id": "test-session",
        "transcript_path": transcript_path,
        "cwd": "/tmp",
        "permission_mode": "default",
        "hook_event_name": "Stop"
    });
    if let Some(active) = stop_hook_active {
        payload["stop_hook_active"] = serde_json::json!(active);
    }
    payload.to_string()
}

pub fn head_message(repo_path: &Path) -> String {
    let repo = git2::Repository::open(repo_path).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    commit.message().unwrap().to_string()
}

pub fn commit_count(repo_path: &Path) -> usize {
    let repo = git2::Repository::open(repo_path).unwrap();
    let mut walk = repo.revwalk().unwrap();
    walk.push_head().unwrap();
    walk.count()
}
