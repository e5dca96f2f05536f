use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::FlowValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }
}

/// Identifier the host assigns to a delivered message.
pub type MessageId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sender {
    Bot,
    User,
    System,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bot => "bot",
            Self::User => "user",
            Self::System => "system",
        };
        f.write_str(label)
    }
}

/// Interactive single-choice prompt surfaced by the options processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsPrompt {
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_output: Option<bool>,
    pub reusable: bool,
}

/// Multi-select prompt. `min <= max` always holds once built by the checkboxes processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckboxesPrompt {
    pub items: Vec<String>,
    pub min: usize,
    pub max: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_output: Option<bool>,
    pub reusable: bool,
}

/// Opaque renderable handed to the host verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub kind: String,
    #[serde(default)]
    pub props: FlowValue,
}

impl Component {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: FlowValue::Null,
        }
    }

    pub fn with_props(mut self, props: FlowValue) -> Self {
        self.props = props;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text { text: String },
    Options(OptionsPrompt),
    Checkboxes(CheckboxesPrompt),
    Component(Component),
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text { text }
    }
}

/// Normalized transition after defaults have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDetails {
    pub duration_ms: u64,
    pub interruptable: bool,
}
