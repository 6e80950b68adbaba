use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::preferences::SanitizePolicy;

// ===================================================================
// Transcript records, one per JSONL line
// ===================================================================

/// The subset of a transcript line that message extraction looks at.
///
/// Every field is optional so that any JSON object decodes; whether the
/// record actually contributes is decided by [`Record::assistant_text`].
#[derive(Debug, Deserialize)]
pub struct Record {
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    #[serde(default)]
    pub message: Option<RecordMessage>,
}

#[derive(Debug, Deserialize)]
pub struct RecordMessage {
    #[serde(default, rename = "type")]
    pub message_type: Option<String>,
    /// Left untyped: user messages carry a plain string here, assistant
    /// messages an array of content blocks.
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

impl Record {
    /// Text of the first content block, if this is an assistant message
    /// record that has one.
    pub fn assistant_text(&self) -> Option<&str> {
        if self.record_type.as_deref() != Some("assistant") {
            return None;
        }
        let message = self.message.as_ref()?;
        if message.message_type.as_deref() != Some("message") {
            return None;
        }
        message
            .content
            .as_ref()?
            .as_array()?
            .first()?
            .get("text")?
            .as_str()
            .filter(|t| !t.is_empty())
    }
}

// ===================================================================
// Transcript
// ===================================================================

/// The assistant-authored texts of a transcript, in file order.
#[derive(Debug, Default)]
pub struct Transcript {
    assistant_texts: Vec<String>,
}

impl Transcript {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse JSONL contents. Lines that fail to decode are skipped and
    /// returned alongside as `(line_number, error)` pairs.
    pub fn parse(contents: &str) -> (Self, Vec<(usize, String)>) {
        let mut assistant_texts = Vec::new();
        let mut errors = Vec::new();

        for (i, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(line) {
                Ok(record) => {
                    if let Some(text) = record.assistant_text() {
                        assistant_texts.push(text.to_string());
                    }
                }
                Err(e) => errors.push((i + 1, format!("{e}"))),
            }
        }

        (Self { assistant_texts }, errors)
    }

    /// Read and parse a transcript file. An unreadable file yields an empty
    /// transcript; parse errors are logged and skipped.
    pub fn read(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read transcript");
                return Self::empty();
            }
        };
        let (transcript, errors) = Self::parse(&contents);
        for (line, err) in &errors {
            debug!(line, error = %err, "skipping malformed transcript line");
        }
        transcript
    }

    /// The most recent assistant text.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.assistant_texts.last().map(String::as_str)
    }
}

// ===================================================================
// Sanitizer
// ===================================================================

/// Turns raw assistant text into a one-line message.
///
/// Steps run in a fixed order: strip noise phrases, trim, collapse
/// delimiter runs to a space, collapse whitespace, trim.
#[derive(Debug)]
pub struct Sanitizer {
    noise: Vec<Regex>,
    delimiters: Option<Regex>,
    whitespace: Regex,
}

impl Sanitizer {
    pub fn new(policy: &SanitizePolicy) -> Result<Self> {
        let noise = policy
            .noise_patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("compiling noise pattern {p:?}")))
            .collect::<Result<Vec<_>>>()?;
        let delimiters = if policy.delimiters.is_empty() {
            None
        } else {
            let class: String = policy
                .delimiters
                .chars()
                .map(|c| regex::escape(&c.to_string()))
                .collect();
            Some(
                Regex::new(&format!("[{class}]+"))
                    .with_context(|| format!("compiling delimiters {:?}", policy.delimiters))?,
            )
        };
        let whitespace = Regex::new(r"\s+").context("compiling whitespace pattern")?;
        Ok(Self {
            noise,
            delimiters,
            whitespace,
        })
    }

    /// Sanitize `text`. Returns `None` when nothing usable is left.
    pub fn sanitize(&self, text: &str) -> Option<String> {
        let mut out = text.to_string();
        for pattern in &self.noise {
            out = pattern.replacen(&out, 1, "").into_owned();
        }
        let mut out = out.trim().to_string();
        if let Some(delimiters) = &self.delimiters {
            out = delimiters.replace_all(&out, " ").into_owned();
        }
        let out = self.whitespace.replace_all(&out, " ");
        let out = out.trim();
        if out.is_empty() {
            None
        } else {
            Some(out.to_string())
        }
    }
}

// ===================================================================
// Extraction
// ===================================================================

/// Extract the sanitized last assistant message from the transcript at
/// `path`. Never fails: an unreadable file, a transcript without assistant
/// messages, or a message that sanitizes to nothing all yield `None`.
pub fn extract(path: &Path, sanitizer: &Sanitizer) -> Option<String> {
    let transcript = Transcript::read(path);
    transcript
        .last_assistant_text()
        .and_then(|text| sanitizer.sanitize(text))
}

/// Cap `text` at `max` characters for display, marking the cut with `...`.
pub fn truncate_for_display(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests;
