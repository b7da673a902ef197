use serde::{Deserialize, Serialize};

/// Chat mode selector exposed to clients; each mode maps to one
/// underlying provider model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatMode {
    Gpt41,
    Gpt41Mini,
    Gpt4oMini,
    O4Mini,
}

impl ChatMode {
    /// Provider model identifier for this mode.
    pub fn model_id(&self) -> &'static str {
        match self {
            ChatMode::Gpt41 => "gpt-4.1",
            ChatMode::Gpt41Mini => "gpt-4.1-mini",
            ChatMode::Gpt4oMini => "gpt-4o-mini",
            ChatMode::O4Mini => "o4-mini",
        }
    }

    /// Whether the selected model emits reasoning tokens.
    pub fn is_reasoning(&self) -> bool {
        matches!(self, ChatMode::O4Mini)
    }
}

impl Default for ChatMode {
    fn default() -> Self {
        ChatMode::Gpt41
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&ChatMode::Gpt41).unwrap(), "\"gpt41\"");
        assert_eq!(
            serde_json::to_string(&ChatMode::Gpt41Mini).unwrap(),
            "\"gpt41-mini\""
        );
    }

    #[test]
    fn only_o4_is_reasoning() {
        assert!(ChatMode::O4Mini.is_reasoning());
        assert!(!ChatMode::Gpt41.is_reasoning());
    }
}
