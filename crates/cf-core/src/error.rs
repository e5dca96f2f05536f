use crate::types::SourceSpan;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct FlowError {
    pub code: String,
    pub message: String,
    pub span: Option<SourceSpan>,
}

pub type FlowResult<T> = Result<T, FlowError>;

impl FlowError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(
        code: impl Into<String>,
        message: impl Into<String>,
        span: SourceSpan,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: Some(span),
        }
    }

    /// The error raised by both orchestrator entry points for unknown or empty blocks.
    pub fn invalid_block() -> Self {
        Self::new("ENGINE_BLOCK_INVALID", "Block is not valid.")
    }
}
