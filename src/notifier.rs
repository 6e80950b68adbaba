//! Desktop notifications.
//!
//! Each platform gets its own [`Notifier`] implementation that shells out to
//! the native tool. [`for_platform`] picks one once at startup; callers only
//! ever see the trait. Delivery is best-effort: [`dispatch`] is the single
//! place where failures are logged and dropped.

use anyhow::{Context, Result, bail};
use std::process::Command;
use tracing::{debug, warn};

/// Extra presentation hints for a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOptions {
    pub subtitle: Option<String>,
    /// Sound name, e.g. `"default"`. `None` for silence.
    pub sound: Option<String>,
    pub timeout_ms: u64,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            subtitle: None,
            sound: Some("default".into()),
            timeout_ms: 5000,
        }
    }
}

pub trait Notifier {
    fn notify(&self, title: &str, message: &str, options: &NotifyOptions) -> Result<()>;
}

/// Send a notification, logging and discarding any failure.
pub fn dispatch(notifier: &dyn Notifier, title: &str, message: &str, options: &NotifyOptions) {
    match notifier.notify(title, message, options) {
        Ok(()) => debug!(title, "notification sent"),
        Err(e) => warn!(error = %format!("{e:#}"), "notification failed"),
    }
}

// ===================================================================
// Platform selection
// ===================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an `std::env::consts::OS` value; anything unknown is treated as
    /// a freedesktop system.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Linux,
        }
    }
}

pub fn for_platform(platform: Platform) -> Box<dyn Notifier> {
    match platform {
        Platform::MacOs => Box::new(AppleScript),
        Platform::Windows => Box::new(PowerShell),
        Platform::Linux => Box::new(NotifySend),
    }
}

/// Run `cmd` to completion. The wait keeps the hook process alive until the
/// notification has been handed off.
fn run(mut cmd: Command) -> Result<()> {
    let program = cmd.get_program().to_string_lossy().to_string();
    let output = cmd
        .output()
        .with_context(|| format!("spawning {program}"))?;
    if !output.status.success() {
        bail!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

// ===================================================================
// macOS
// ===================================================================

pub struct AppleScript;

fn applescript_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl AppleScript {
    fn command(title: &str, message: &str, options: &NotifyOptions) -> Command {
        let mut script = format!(
            "display notification {} with title {}",
            applescript_quote(message),
            applescript_quote(title)
        );
        if let Some(subtitle) = &options.subtitle {
            script.push_str(&format!(" subtitle {}", applescript_quote(subtitle)));
        }
        if let Some(sound) = &options.sound {
            script.push_str(&format!(" sound name {}", applescript_quote(sound)));
        }
        let mut cmd = Command::new("osascript");
        cmd.arg("-e").arg(script);
        cmd
    }
}

impl Notifier for AppleScript {
    fn notify(&self, title: &str, message: &str, options: &NotifyOptions) -> Result<()> {
        run(Self::command(title, message, options))
    }
}

// ===================================================================
// Windows
// ===================================================================

pub struct PowerShell;

fn powershell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl PowerShell {
    fn command(title: &str, message: &str, options: &NotifyOptions) -> Command {
        let text = match &options.subtitle {
            Some(subtitle) => format!("{subtitle}\n{message}"),
            None => message.to_string(),
        };
        let script = [
            "Add-Type -AssemblyName System.Windows.Forms".to_string(),
            "$n = New-Object System.Windows.Forms.NotifyIcon".to_string(),
            "$n.Icon = [System.Drawing.SystemIcons]::Information".to_string(),
            format!("$n.BalloonTipTitle = {}", powershell_quote(title)),
            format!("$n.BalloonTipText = {}", powershell_quote(&text)),
            "$n.Visible = $true".to_string(),
            format!("$n.ShowBalloonTip({})", options.timeout_ms),
            format!("Start-Sleep -Milliseconds {}", options.timeout_ms),
            "$n.Dispose()".to_string(),
        ]
        .join("; ");
        let mut cmd = Command::new("powershell");
        cmd.args(["-NoProfile", "-NonInteractive", "-Command"]).arg(script);
        cmd
    }
}

impl Notifier for PowerShell {
    fn notify(&self, title: &str, message: &str, options: &NotifyOptions) -> Result<()> {
        run(Self::command(title, message, options))
    }
}

// ===================================================================
// Linux / freedesktop
// ===================================================================

pub struct NotifySend;

impl NotifySend {
    fn command(title: &str, message: &str, options: &NotifyOptions) -> Command {
        let body = match &options.subtitle {
            Some(subtitle) => format!("{subtitle}\n{message}"),
            None => message.to_string(),
        };
        let mut cmd = Command::new("notify-send");
        cmd.arg(format!("--expire-time={}", options.timeout_ms))
            .arg("--")
            .arg(title)
            .arg(body);
        cmd
    }
}

impl Notifier for NotifySend {
    fn notify(&self, title: &str, message: &str, options: &NotifyOptions) -> Result<()> {
        run(Self::command(title, message, options))
    }
}

// ===================================================================
// Disabled
// ===================================================================

/// Used when notifications are turned off in preferences.
pub struct Disabled;

impl Notifier for Disabled {
    fn notify(&self, title: &str, _message: &str, _options: &NotifyOptions) -> Result<()> {
        debug!(title, "notifications disabled, skipping");
        Ok(())
    }
}
