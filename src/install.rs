//! Hook installation: writes the hook scripts into `<claude_dir>/hooks/`,
//! registers them under `hooks.Stop` in `settings.json`, and validates the
//! result.

use anyhow::{Context, Result, bail};
use minijinja::{Environment, context};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::preferences::Preferences;
use crate::settings;

// ---------------------------------------------------------------------------
// Hook scripts
// ---------------------------------------------------------------------------

/// Metadata for a single hook script.
pub struct HookScript {
    pub filename: &'static str,
    /// `autocommitter hook <subcommand>` run by the script.
    pub subcommand: &'static str,
    comment: &'static str,
}

/// All hook scripts, in the order their commands are registered.
pub const HOOK_SCRIPTS: &[HookScript] = &[
    HookScript {
        filename: "auto-commit-hook.sh",
        subcommand: "commit",
        comment: "Commit pending changes when a Claude session stops",
    },
    HookScript {
        filename: "notification-hook.sh",
        subcommand: "notify",
        comment: "Show a desktop notification when a Claude session stops",
    },
];

const SCRIPT_TEMPLATE: &str = r#"#!/usr/bin/env bash
# {{ comment }}
# Generated by autocommitter; re-run `autocommitter install` to regenerate.
exec {{ binary }} hook {{ subcommand }} --claude-dir {{ claude_dir }}
"#;

impl HookScript {
    pub fn path(&self, hooks_dir: &Path) -> PathBuf {
        hooks_dir.join(self.filename)
    }

    /// The command string registered in `settings.json` for this script.
    pub fn command(&self, hooks_dir: &Path) -> String {
        format!("bash {}", shell_quote(&self.path(hooks_dir).to_string_lossy()))
    }

    fn render(&self, binary: &str, claude_dir: &Path) -> Result<String> {
        let env = Environment::new();
        let tmpl = env
            .template_from_str(SCRIPT_TEMPLATE)
            .context("parsing hook script template")?;
        tmpl.render(context! {
            comment => self.comment,
            binary => shell_quote(binary),
            subcommand => self.subcommand,
            claude_dir => shell_quote(&claude_dir.to_string_lossy()),
        })
        .with_context(|| format!("rendering {}", self.filename))
    }
}

/// Quote `s` as a single bash word.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

pub fn hooks_dir(claude_dir: &Path) -> PathBuf {
    claude_dir.join("hooks")
}

/// The Stop-hook commands the installer guarantees are registered.
pub fn known_commands(hooks_dir: &Path) -> Vec<String> {
    HOOK_SCRIPTS.iter().map(|s| s.command(hooks_dir)).collect()
}

/// Path of the running binary, baked into the hook scripts.
fn binary_path() -> String {
    std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("chmod {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Write every hook script into `hooks_dir`, overwriting existing ones.
fn write_scripts(hooks_dir: &Path, claude_dir: &Path, binary: &str) -> Result<()> {
    for script in HOOK_SCRIPTS {
        let path = script.path(hooks_dir);
        let body = script.render(binary, claude_dir)?;
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        make_executable(&path)?;
        info!(path = %path.display(), "wrote hook script");
        println!("Created hook script: {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub struct InstallOptions {
    /// Copy an existing `settings.json` aside before rewriting it.
    pub backup: bool,
}

/// Install the hooks under `claude_dir`. Idempotent: running it twice
/// leaves a single registration per hook command.
pub fn install(claude_dir: &Path, options: &InstallOptions) -> Result<()> {
    // Hooks run from the project directory, so every baked-in path must be
    // absolute.
    let claude_dir = &std::path::absolute(claude_dir)
        .with_context(|| format!("resolving {}", claude_dir.display()))?;
    let hooks_dir = hooks_dir(claude_dir);
    fs::create_dir_all(&hooks_dir)
        .with_context(|| format!("creating {}", hooks_dir.display()))?;

    write_scripts(&hooks_dir, claude_dir, &binary_path())?;
    Preferences::load(&hooks_dir)?;

    let settings_path = claude_dir.join(settings::FILENAME);
    if options.backup {
        if let Some(backup) = settings::backup(&settings_path)? {
            println!("Backed up existing settings to: {}", backup.display());
        }
    }

    let existing = settings::load(&settings_path)?;
    let merged = settings::merge(existing, &known_commands(&hooks_dir));
    for command in &merged.added {
        info!(command = %command, "added stop hook");
        println!("Added Stop hook: {command}");
    }
    if merged.added.is_empty() {
        println!("Stop hooks already configured");
    }
    settings::write(&settings_path, &merged.document)?;
    println!("Settings updated: {}", settings_path.display());

    let report = settings::validate(claude_dir);
    if !report.passed {
        bail!("settings validation failed: {}", report.message);
    }
    Ok(())
}
