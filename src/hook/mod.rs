//! Stop-event hooks: decide from the stdin payload, then act.
//!
//! Both hooks are fail-silent. Every path ends in an [`Outcome`] that is
//! only logged; nothing here returns an error to the host session.

use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::decision::{StopDecision, decide_stop};
use crate::git::VersionControl;
use crate::notifier::{self, Notifier, NotifyOptions};
use crate::preferences::Preferences;
use crate::transcript::{self, Sanitizer, truncate_for_display};

const COMMIT_TITLE: &str = "🎉 Claude auto-commit";
const ERROR_TITLE: &str = "❌ Claude hook error";
const SESSION_TITLE: &str = "🤖 Claude session complete";
const COMMIT_NOTIFICATION_MAX_CHARS: usize = 50;

/// Everything a hook needs besides its payload and the working tree.
pub struct HookContext<'a> {
    pub prefs: &'a Preferences,
    /// Directory holding the preferences file and any template files.
    pub hooks_dir: &'a Path,
    pub sanitizer: &'a Sanitizer,
    pub notifier: &'a dyn Notifier,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Malformed,
    Suppressed,
    NotARepository,
    NoChanges,
    Committed { message: String, id: String },
    Notified { message: String },
    Failed(String),
}

impl HookContext<'_> {
    /// Resolve the payload to a transcript message, or the outcome to stop
    /// with. The inner `Option` is `None` when nothing usable was extracted.
    fn message_for(&self, input: &str) -> Result<Option<String>, Outcome> {
        match decide_stop(input) {
            StopDecision::Malformed(err) => {
                debug!(error = %err, "ignoring malformed hook payload");
                Err(Outcome::Malformed)
            }
            StopDecision::Suppressed => {
                debug!("stop hook already active, nothing to do");
                Err(Outcome::Suppressed)
            }
            StopDecision::Act { transcript_path } => Ok(transcript_path
                .as_deref()
                .and_then(|p| transcript::extract(p, self.sanitizer))),
        }
    }

    fn notify(&self, title: &str, message: &str, options: NotifyOptions) {
        notifier::dispatch(self.notifier, title, message, &options);
    }
}

// ===================================================================
// Auto-commit hook
// ===================================================================

/// Commit pending changes with the session's last assistant message.
pub fn run_commit(input: &str, ctx: &HookContext, vcs: &dyn VersionControl) -> Outcome {
    let extracted = match ctx.message_for(input) {
        Ok(m) => m,
        Err(outcome) => return outcome,
    };
    if !vcs.is_inside_repo() {
        debug!("not inside a git working tree, skipping commit");
        return Outcome::NotARepository;
    }

    match commit_pending(ctx, vcs, extracted.as_deref()) {
        Ok(None) => {
            debug!("no pending changes, skipping commit");
            Outcome::NoChanges
        }
        Ok(Some((message, id))) => {
            info!(commit = %id, message = %message, "committed pending changes");
            let short = truncate_for_display(&message, COMMIT_NOTIFICATION_MAX_CHARS);
            let body = match vcs.name() {
                Some(repo) => format!("[{repo}] {short}"),
                None => short,
            };
            ctx.notify(
                COMMIT_TITLE,
                &body,
                NotifyOptions {
                    subtitle: Some("Git commit completed".into()),
                    timeout_ms: 4000,
                    ..Default::default()
                },
            );
            Outcome::Committed { message, id }
        }
        Err(e) => {
            let err = format!("{e:#}");
            warn!(error = %err, "auto-commit failed");
            ctx.notify(
                ERROR_TITLE,
                &format!("auto-commit: {err}"),
                NotifyOptions {
                    subtitle: Some("Hook execution failed".into()),
                    timeout_ms: 6000,
                    ..Default::default()
                },
            );
            Outcome::Failed(err)
        }
    }
}

/// Stage and commit everything. Returns `None` when the tree is clean.
fn commit_pending(
    ctx: &HookContext,
    vcs: &dyn VersionControl,
    extracted: Option<&str>,
) -> Result<Option<(String, String)>> {
    if !vcs.has_pending_changes()? {
        return Ok(None);
    }
    let message = ctx.prefs.commit_message(ctx.hooks_dir, extracted)?;
    vcs.stage_all()?;
    let id = vcs.commit(&message)?;
    Ok(Some((message, id)))
}

// ===================================================================
// Notification hook
// ===================================================================

/// Show a notification with the session's last assistant message.
pub fn run_notify(input: &str, ctx: &HookContext) -> Outcome {
    let extracted = match ctx.message_for(input) {
        Ok(m) => m,
        Err(outcome) => return outcome,
    };
    let message = match extracted {
        Some(m) => truncate_for_display(&m, ctx.prefs.notification_max_chars),
        None => ctx.prefs.default_notification.clone(),
    };
    ctx.notify(
        SESSION_TITLE,
        &message,
        NotifyOptions {
            timeout_ms: 3000,
            ..Default::default()
        },
    );
    Outcome::Notified { message }
}
