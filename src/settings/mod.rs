//! Reading, merging, writing and validating `settings.json`.
//!
//! The merge itself is a pure function over [`serde_json::Value`]; loading
//! and writing are kept separate so the merge can be tested without a
//! filesystem. Writes go through a temp file and a rename, so a failed
//! install never leaves a half-written settings file behind.

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

use crate::install::{self, HOOK_SCRIPTS};
use crate::types::{HookCommand, StopHookEntry};

pub const FILENAME: &str = "settings.json";

/// Flat `section.key = value` assignments layered onto every merged document.
fn recommended_defaults() -> Vec<(&'static str, &'static str, Value)> {
    vec![
        ("editor", "auto_save", json!(true)),
        ("editor", "format_on_save", json!(true)),
        ("git", "auto_commit", json!(true)),
        ("git", "commit_on_stop", json!(true)),
        ("ui", "show_token_count", json!(true)),
        ("ui", "confirm_before_exit", json!(false)),
        ("logging", "level", json!("info")),
        ("logging", "enable_hooks_logging", json!(true)),
    ]
}

// ===================================================================
// Merge
// ===================================================================

/// Result of [`merge`]: the complete new document plus the commands that
/// were not present before.
#[derive(Debug)]
pub struct Merged {
    pub document: Value,
    pub added: Vec<String>,
}

/// Take `map[key]` out as an object, leaving `null` in its slot so the key
/// keeps its position when written back. Non-objects become an empty map.
fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.get_mut(key).map(Value::take) {
        Some(Value::Object(obj)) => obj,
        Some(_) => {
            warn!(key, "replacing non-object settings section");
            Map::new()
        }
        None => Map::new(),
    }
}

/// Merge the known Stop-hook commands and the recommended defaults into
/// `existing` (or an empty document).
///
/// Each known command gets its own `hooks.Stop` entry unless some entry
/// already contains it. Unrelated entries and keys are left alone.
pub fn merge(existing: Option<Value>, known_commands: &[String]) -> Merged {
    let mut root = match existing {
        Some(Value::Object(map)) => map,
        Some(_) => {
            warn!("existing settings are not a JSON object, starting fresh");
            Map::new()
        }
        None => Map::new(),
    };

    let mut hooks = take_object(&mut root, "hooks");
    let mut entries = match hooks.get_mut("Stop").map(Value::take) {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            warn!("replacing non-array hooks.Stop");
            Vec::new()
        }
        None => Vec::new(),
    };
    let mut added = Vec::new();
    for command in known_commands {
        let hook = HookCommand::command(command);
        if entries.iter().any(|e| StopHookEntry::contains(e, &hook)) {
            debug!(command = %command, "stop hook already configured");
            continue;
        }
        entries.push(json!(StopHookEntry::single(hook)));
        added.push(command.clone());
    }
    hooks.insert("Stop".to_string(), Value::Array(entries));
    root.insert("hooks".to_string(), Value::Object(hooks));

    for (section, key, value) in recommended_defaults() {
        let mut obj = take_object(&mut root, section);
        obj.insert(key.to_string(), value);
        root.insert(section.to_string(), Value::Object(obj));
    }

    Merged {
        document: Value::Object(root),
        added,
    }
}

// ===================================================================
// Load / write / backup
// ===================================================================

/// Read the settings document at `path`.
///
/// Returns `None` if the file is absent or does not parse; unparseable
/// content is logged and will be replaced by the next write.
pub fn load(path: &Path) -> Result<Option<Value>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "existing settings are invalid, creating new ones");
            Ok(None)
        }
    }
}

/// Write `document` to `path` as pretty JSON, atomically.
pub fn write(path: &Path, document: &Value) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let json = serde_json::to_string_pretty(document).context("serializing settings")?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())
        .context("writing temp settings file")?;
    match fs::metadata(path) {
        Ok(meta) => tmp
            .as_file()
            .set_permissions(meta.permissions())
            .context("copying settings file permissions")?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => set_new_file_mode(tmp.as_file())?,
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    }
    tmp.as_file().sync_all().context("syncing temp settings file")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Temp files are created 0600; a fresh settings file gets the usual 0644.
#[cfg(unix)]
fn set_new_file_mode(file: &fs::File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
        .context("setting settings file permissions")
}

#[cfg(not(unix))]
fn set_new_file_mode(_file: &fs::File) -> Result<()> {
    Ok(())
}

/// Copy an existing settings file to `<path>.backup.<unix-millis>`.
/// Returns the backup path, or `None` if there was nothing to back up.
pub fn backup(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".backup.{millis}"));
    let backup_path = PathBuf::from(name);
    fs::copy(path, &backup_path)
        .with_context(|| format!("backing up {} to {}", path.display(), backup_path.display()))?;
    Ok(Some(backup_path))
}

// ===================================================================
// Validation
// ===================================================================

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("settings file does not exist: {0}")]
    MissingSettings(PathBuf),
    #[error("cannot read {path}: {source}")]
    Unreadable { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Stop hooks not configured properly")]
    StopHooksMissing,
    #[error("hook command not found in Stop hooks: {0}")]
    CommandMissing(String),
    #[error("hook script file not found: {0}")]
    ScriptMissing(PathBuf),
}

/// Outcome of [`validate`]: pass/fail plus a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub passed: bool,
    pub message: String,
}

/// Check that the install under `claude_dir` is complete: the settings file
/// parses, `hooks.Stop` is an array containing every known hook command, and
/// every hook script exists.
pub fn validate(claude_dir: &Path) -> ValidationReport {
    match check(claude_dir) {
        Ok(()) => ValidationReport {
            passed: true,
            message: "settings validation passed".into(),
        },
        Err(e) => ValidationReport {
            passed: false,
            message: e.to_string(),
        },
    }
}

fn check(claude_dir: &Path) -> Result<(), ValidationError> {
    let path = claude_dir.join(FILENAME);
    let contents = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ValidationError::MissingSettings(path));
        }
        Err(source) => return Err(ValidationError::Unreadable { path, source }),
    };
    let settings: Value = serde_json::from_str(&contents)
        .map_err(|source| ValidationError::InvalidJson { path, source })?;

    let entries = settings
        .get("hooks")
        .and_then(|h| h.get("Stop"))
        .and_then(Value::as_array)
        .ok_or(ValidationError::StopHooksMissing)?;

    let hooks_dir = install::hooks_dir(claude_dir);
    for script in HOOK_SCRIPTS {
        let hook = HookCommand::command(&script.command(&hooks_dir));
        if !entries.iter().any(|e| StopHookEntry::contains(e, &hook)) {
            return Err(ValidationError::CommandMissing(hook.command));
        }
    }
    for script in HOOK_SCRIPTS {
        let script_path = script.path(&hooks_dir);
        if !script_path.is_file() {
            return Err(ValidationError::ScriptMissing(script_path));
        }
    }
    Ok(())
}
