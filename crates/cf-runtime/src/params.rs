use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use cf_core::{BotDelivery, FlowResult, MessageContent, MessageId, Sender};

use crate::timer::TimerHandle;

/// Capabilities the embedding shell provides to the engine.
///
/// The message and toast methods are reachable from user functions through [`Params`].
/// The three setters at the bottom are only called by the pre-processing phase.
#[async_trait]
pub trait ChatHost: Send + Sync {
    async fn inject_message(
        &self,
        content: MessageContent,
        sender: Sender,
    ) -> FlowResult<Option<MessageId>>;
    async fn stream_message(
        &self,
        content: MessageContent,
        sender: Sender,
    ) -> FlowResult<Option<MessageId>>;
    async fn end_stream_message(&self, sender: Sender) -> FlowResult<bool>;
    async fn remove_message(&self, id: &str) -> FlowResult<Option<MessageId>>;
    async fn set_text_area_value(&self, value: &str) -> FlowResult<()>;
    async fn show_toast(&self, content: &str, timeout_ms: Option<u64>)
        -> FlowResult<Option<String>>;
    async fn dismiss_toast(&self, id: &str) -> FlowResult<Option<String>>;
    async fn open_chat(&self, is_open: bool) -> FlowResult<()>;

    async fn set_text_area_disabled(&self, disabled: bool) -> FlowResult<()>;
    async fn set_sensitive_input(&self, sensitive: bool) -> FlowResult<()>;
    async fn set_timeout_handle(&self, handle: TimerHandle) -> FlowResult<()>;
}

/// Requests a move to another block. Returns whether the request was accepted.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn go_to_path(&self, path: &str) -> FlowResult<bool>;
}

/// Per-pass context handed to every attribute function.
#[derive(Clone)]
pub struct Params {
    pub curr_path: Option<String>,
    pub prev_path: Option<String>,
    pub user_input: Option<String>,
    host: Arc<dyn ChatHost>,
    navigator: Arc<dyn Navigator>,
    delivery: BotDelivery,
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params")
            .field("curr_path", &self.curr_path)
            .field("prev_path", &self.prev_path)
            .field("user_input", &self.user_input)
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

impl Params {
    pub fn new(host: Arc<dyn ChatHost>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            curr_path: None,
            prev_path: None,
            user_input: None,
            host,
            navigator,
            delivery: BotDelivery::Inject,
        }
    }

    pub fn with_paths(mut self, curr_path: Option<String>, prev_path: Option<String>) -> Self {
        self.curr_path = curr_path;
        self.prev_path = prev_path;
        self
    }

    pub fn with_user_input(mut self, user_input: Option<String>) -> Self {
        self.user_input = user_input;
        self
    }

    pub fn with_delivery(mut self, delivery: BotDelivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn delivery(&self) -> BotDelivery {
        self.delivery
    }

    pub fn user_input(&self) -> &str {
        self.user_input.as_deref().unwrap_or_default()
    }

    pub async fn inject_message(
        &self,
        content: MessageContent,
        sender: Sender,
    ) -> FlowResult<Option<MessageId>> {
        self.host.inject_message(content, sender).await
    }

    pub async fn stream_message(
        &self,
        content: MessageContent,
        sender: Sender,
    ) -> FlowResult<Option<MessageId>> {
        self.host.stream_message(content, sender).await
    }

    pub async fn end_stream_message(&self, sender: Sender) -> FlowResult<bool> {
        self.host.end_stream_message(sender).await
    }

    pub async fn remove_message(&self, id: &str) -> FlowResult<Option<MessageId>> {
        self.host.remove_message(id).await
    }

    pub async fn go_to_path(&self, path: &str) -> FlowResult<bool> {
        self.navigator.go_to_path(path).await
    }

    pub async fn set_text_area_value(&self, value: &str) -> FlowResult<()> {
        self.host.set_text_area_value(value).await
    }

    pub async fn show_toast(
        &self,
        content: &str,
        timeout_ms: Option<u64>,
    ) -> FlowResult<Option<String>> {
        self.host.show_toast(content, timeout_ms).await
    }

    pub async fn dismiss_toast(&self, id: &str) -> FlowResult<Option<String>> {
        self.host.dismiss_toast(id).await
    }

    pub async fn open_chat(&self, is_open: bool) -> FlowResult<()> {
        self.host.open_chat(is_open).await
    }

    /// Sends bot text through whichever single delivery capability is configured.
    pub(crate) async fn deliver_message(&self, text: String) -> FlowResult<()> {
        match self.delivery {
            BotDelivery::Inject => {
                self.host
                    .inject_message(MessageContent::Text { text }, Sender::Bot)
                    .await?;
            }
            BotDelivery::Stream => {
                self.host
                    .stream_message(MessageContent::Text { text }, Sender::Bot)
                    .await?;
                self.host.end_stream_message(Sender::Bot).await?;
            }
        }
        Ok(())
    }

    pub(crate) fn host(&self) -> &dyn ChatHost {
        self.host.as_ref()
    }
}
