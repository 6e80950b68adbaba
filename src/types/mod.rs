use serde::{Deserialize, Serialize};

// ===================================================================
// Hook input (received via stdin, snake_case JSON)
// ===================================================================

/// The Stop event payload. Only the fields the hooks act on are modeled;
/// everything else the host sends is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookEventPayload {
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub stop_hook_active: Option<bool>,
}

impl HookEventPayload {
    /// Whether the hook may act. Only an explicit `false` allows it: a
    /// missing flag or `true` means the stop was caused by a hook already.
    pub fn may_act(&self) -> bool {
        self.stop_hook_active == Some(false)
    }
}

// ===================================================================
// settings.json hook declarations
// ===================================================================

/// One `{type, command}` pair inside a Stop-hook entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCommand {
    #[serde(rename = "type")]
    pub command_type: String,
    pub command: String,
}

impl HookCommand {
    pub fn command(command: &str) -> Self {
        Self {
            command_type: "command".into(),
            command: command.into(),
        }
    }

    /// Whether the raw JSON `value` is exactly this hook command.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        value.get("type").and_then(serde_json::Value::as_str) == Some(self.command_type.as_str())
            && value.get("command").and_then(serde_json::Value::as_str)
                == Some(self.command.as_str())
    }
}

/// An element of `hooks.Stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopHookEntry {
    pub hooks: Vec<HookCommand>,
}

impl StopHookEntry {
    pub fn single(command: HookCommand) -> Self {
        Self {
            hooks: vec![command],
        }
    }

    /// Whether the raw JSON `entry` contains `command` in its `hooks` array.
    pub fn contains(entry: &serde_json::Value, command: &HookCommand) -> bool {
        entry
            .get("hooks")
            .and_then(serde_json::Value::as_array)
            .is_some_and(|hooks| hooks.iter().any(|h| command.matches(h)))
    }
}
