//! Shared deterministic types for the walkthrough core.
//!
//! These types define the contract between the controller and the generative
//! service backend. They carry no I/O and serialize to the JSON request format
//! used by command backends.

use serde::{Deserialize, Serialize};

/// Minimum reasoning budget accepted by services with extended thinking.
pub const MIN_THINKING_BUDGET: u32 = 1024;

/// Speaker of a single conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Extended-reasoning controls attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkingControls {
    pub budget_tokens: u32,
}

impl ThinkingControls {
    /// Resolve a reasoning budget against the request's `max_tokens`.
    ///
    /// Without an explicit budget the default is `max_tokens - 1000`. The result
    /// is clamped to at least [`MIN_THINKING_BUDGET`] and at most
    /// `max_tokens - 100`, with the floor taking precedence.
    pub fn resolve(requested: Option<u32>, max_tokens: u32) -> Self {
        let budget = requested
            .unwrap_or_else(|| max_tokens.saturating_sub(1000).max(MIN_THINKING_BUDGET));
        let ceiling = max_tokens.saturating_sub(100);
        Self {
            budget_tokens: budget.min(ceiling).max(MIN_THINKING_BUDGET),
        }
    }
}

/// One blocking call to the generative service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingControls>,
}

impl GenerationRequest {
    /// System instruction followed by a single user prompt.
    pub fn for_stage(system: &str, prompt: &str, settings: &CallSettings) -> Self {
        Self::from_messages(
            vec![Message::system(system), Message::user(prompt)],
            settings.max_tokens,
            settings,
        )
    }

    pub fn from_messages(messages: Vec<Message>, max_tokens: u32, settings: &CallSettings) -> Self {
        Self {
            messages,
            max_tokens,
            temperature: settings.temperature,
            thinking: settings
                .thinking_budget
                .map(|requested| ThinkingControls::resolve(requested, max_tokens)),
        }
    }
}

/// Per-run generation settings resolved from config and the selected model.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSettings {
    pub max_tokens: u32,
    pub clarify_max_tokens: u32,
    pub temperature: f32,
    /// `None` disables thinking; `Some(None)` enables it with the default budget.
    pub thinking_budget: Option<Option<u32>>,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            clarify_max_tokens: 1024,
            temperature: 0.0,
            thinking_budget: None,
        }
    }
}
