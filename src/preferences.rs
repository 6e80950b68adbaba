use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

pub const FILENAME: &str = "autocommitter.toml";

const DEFAULT_NOISE_PATTERNS: &[&str] = &["优化完成。?", r"Optimized\."];

/// Commit message template: either an inline Jinja2 string or a path to a
/// template file (relative to the hooks directory).
///
/// In TOML this looks like one of:
///
/// ```toml
/// [commit_template]
/// inline = "feat: {{ message }}"
///
/// # or
///
/// [commit_template]
/// file = "commit.tmpl"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CommitTemplate {
    /// An inline Jinja2 template string.
    Inline(String),
    /// Path to a template file (relative to the hooks directory).
    File(String),
}

impl Default for CommitTemplate {
    fn default() -> Self {
        CommitTemplate::Inline("feat: {{ message }}".into())
    }
}

/// How raw assistant text is cleaned into a one-line message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SanitizePolicy {
    /// Regexes removed from the text (first match only) before anything else.
    #[serde(default = "default_noise_patterns")]
    pub noise_patterns: Vec<String>,

    /// Characters whose runs are collapsed into a single space.
    #[serde(default = "default_delimiters")]
    pub delimiters: String,
}

fn default_noise_patterns() -> Vec<String> {
    DEFAULT_NOISE_PATTERNS.iter().map(|s| s.to_string()).collect()
}

fn default_delimiters() -> String {
    ",*".into()
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            noise_patterns: default_noise_patterns(),
            delimiters: default_delimiters(),
        }
    }
}

/// User-facing preferences stored in `<claude_dir>/hooks/autocommitter.toml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Preferences {
    /// Commit message used when the transcript yields nothing usable.
    #[serde(default = "default_commit_message")]
    pub default_commit_message: String,

    /// Notification body used when the transcript yields nothing usable.
    #[serde(default = "default_notification")]
    pub default_notification: String,

    /// Set to `false` to suppress all desktop notifications.
    #[serde(default = "default_true")]
    pub notifications: bool,

    #[serde(default = "default_notification_max_chars")]
    pub notification_max_chars: usize,

    /// Commit message template (inline or file reference).
    #[serde(default)]
    pub commit_template: CommitTemplate,

    #[serde(default)]
    pub sanitize: SanitizePolicy,
}

fn default_commit_message() -> String {
    "chore: auto-commit after Claude session".into()
}

fn default_notification() -> String {
    "Claude session ended".into()
}

fn default_true() -> bool {
    true
}

fn default_notification_max_chars() -> usize {
    100
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_commit_message: default_commit_message(),
            default_notification: default_notification(),
            notifications: default_true(),
            notification_max_chars: default_notification_max_chars(),
            commit_template: CommitTemplate::default(),
            sanitize: SanitizePolicy::default(),
        }
    }
}

impl Preferences {
    /// Load preferences from `<dir>/autocommitter.toml`.
    ///
    /// If the file doesn't exist it is created with defaults. Missing keys
    /// in an existing file are filled in with defaults via serde.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(FILENAME);
        match Self::read(dir)? {
            Some(prefs) => Ok(prefs),
            None => {
                let prefs = Preferences::default();
                let toml_str = toml::to_string_pretty(&prefs)
                    .context("serializing default preferences")?;
                fs::write(&path, &toml_str)
                    .with_context(|| format!("writing default {}", path.display()))?;
                Ok(prefs)
            }
        }
    }

    /// Read preferences without creating the file. Returns `None` if absent.
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(FILENAME);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let prefs: Preferences = toml::from_str(&contents)
                    .with_context(|| format!("parsing {}", path.display()))?;
                Ok(Some(prefs))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Resolve the commit message template to a string.
    fn load_commit_template(&self, dir: &Path) -> Result<String> {
        match &self.commit_template {
            CommitTemplate::Inline(s) => Ok(s.clone()),
            CommitTemplate::File(filename) => {
                let path = dir.join(filename);
                fs::read_to_string(&path)
                    .with_context(|| format!("reading template {}", path.display()))
            }
        }
    }

    /// Build the commit message for an extracted transcript message, or the
    /// default commit message when there is none.
    pub fn commit_message(&self, dir: &Path, extracted: Option<&str>) -> Result<String> {
        let Some(message) = extracted else {
            return Ok(self.default_commit_message.clone());
        };
        let template = self.load_commit_template(dir)?;
        let env = Environment::new();
        let tmpl = env
            .template_from_str(&template)
            .context("parsing commit message template")?;
        let rendered = tmpl
            .render(context! { message })
            .context("rendering commit message template")?;
        Ok(rendered.trim().to_string())
    }
}
