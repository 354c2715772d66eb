//! Serializable command result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of one remote command.
///
/// Field names follow the platform's output context: `Output` holds standard
/// output and `ErrorOutput` standard error, both verbatim. The exit status is
/// deliberately absent; callers judge success from the streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommandResult {
    /// The command exactly as submitted
    pub command: String,
    /// Captured standard output
    #[serde(rename = "Output")]
    pub output: String,
    /// Captured standard error
    #[serde(rename = "ErrorOutput")]
    pub error_output: String,
}

impl CommandResult {
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        error_output: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            error_output: error_output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_field_names() {
        let result = CommandResult::new("echo hello", "hello\n", "");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["command"], "echo hello");
        assert_eq!(json["Output"], "hello\n");
        assert_eq!(json["ErrorOutput"], "");
        assert!(json.get("exit_code").is_none());
    }

    #[test]
    fn test_deserialize_platform_shape() {
        let json = r#"{"command":"false","Output":"","ErrorOutput":""}"#;
        let result: CommandResult = serde_json::from_str(json).unwrap();
        assert_eq!(result, CommandResult::new("false", "", ""));
    }

    #[test]
    fn test_unicode_content() {
        let result = CommandResult::new("cat greeting", "Hello, \u{4e16}\u{754c}!", "");
        let json = serde_json::to_string(&result).unwrap();
        let back: CommandResult = serde_json::from_str(&json).unwrap();
        assert!(back.output.contains('\u{4e16}'));
    }
}
