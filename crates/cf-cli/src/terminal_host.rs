use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cf_core::{FlowResult, MessageContent, MessageId, Sender, Settings};
use cf_runtime::{ChatHost, TimerHandle};
use parking_lot::Mutex;
use tracing::debug;

use crate::map_host_io;
use crate::shell_state::{PromptKind, SharedShell};

/// Line-oriented output shared by the host and the input loop.
#[derive(Clone)]
pub(crate) struct Transcript {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Transcript {
    pub(crate) fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub(crate) fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
        }
    }

    pub(crate) fn write(&self, text: &str) -> FlowResult<()> {
        let mut out = self.out.lock();
        out.write_all(text.as_bytes()).map_err(map_host_io)?;
        out.flush().map_err(map_host_io)
    }

    pub(crate) fn line(&self, text: &str) -> FlowResult<()> {
        self.write(&format!("{}\n", text))
    }
}

fn label(sender: Sender) -> &'static str {
    match sender {
        Sender::Bot => "bot",
        Sender::User => "you",
        Sender::System => "system",
    }
}

pub(crate) fn render_content(content: &MessageContent, sender: Sender) -> Vec<String> {
    let label = label(sender);
    match content {
        MessageContent::Text { text } => vec![format!("{}> {}", label, text)],
        MessageContent::Options(prompt) => {
            let mut lines = vec![format!("{}> choose one:", label)];
            lines.extend(numbered(&prompt.items));
            lines
        }
        MessageContent::Checkboxes(prompt) => {
            let range = if prompt.min == prompt.max {
                prompt.min.to_string()
            } else {
                format!("{}-{}", prompt.min, prompt.max)
            };
            let mut lines = vec![format!("{}> choose {} (comma separated):", label, range)];
            lines.extend(numbered(&prompt.items));
            lines
        }
        MessageContent::Component(component) => {
            let props = if component.props.is_null() {
                String::new()
            } else {
                format!(" {}", component.props.to_json())
            };
            vec![format!("{}> [{}]{}", label, component.kind, props)]
        }
    }
}

fn numbered(items: &[String]) -> impl Iterator<Item = String> + '_ {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| format!("  [{}] {}", index + 1, item))
}

/// Splits text into word chunks that keep their trailing whitespace.
pub(crate) fn stream_chunks(text: &str) -> Vec<&str> {
    text.split_inclusive(char::is_whitespace).collect()
}

pub(crate) struct TerminalHost {
    transcript: Transcript,
    shell: SharedShell,
    chunk_delay: Duration,
    next_message: AtomicU64,
    next_toast: AtomicU64,
}

impl TerminalHost {
    pub(crate) fn new(transcript: Transcript, shell: SharedShell, settings: &Settings) -> Self {
        Self {
            transcript,
            shell,
            chunk_delay: Duration::from_millis(settings.stream_chunk_delay_ms),
            next_message: AtomicU64::new(1),
            next_toast: AtomicU64::new(1),
        }
    }

    fn message_id(&self) -> MessageId {
        format!("m{}", self.next_message.fetch_add(1, Ordering::Relaxed))
    }

    fn surface(&self, content: &MessageContent) {
        let kind = match content {
            MessageContent::Options(prompt) => PromptKind::Options(prompt.clone()),
            MessageContent::Checkboxes(prompt) => PromptKind::Checkboxes(prompt.clone()),
            _ => return,
        };
        self.shell.lock().surface_prompt(kind);
    }
}

#[async_trait]
impl ChatHost for TerminalHost {
    async fn inject_message(
        &self,
        content: MessageContent,
        sender: Sender,
    ) -> FlowResult<Option<MessageId>> {
        for line in render_content(&content, sender) {
            self.transcript.line(&line)?;
        }
        self.surface(&content);
        Ok(Some(self.message_id()))
    }

    async fn stream_message(
        &self,
        content: MessageContent,
        sender: Sender,
    ) -> FlowResult<Option<MessageId>> {
        let Some(text) = content.as_text() else {
            return self.inject_message(content, sender).await;
        };
        self.transcript.write(&format!("{}> ", label(sender)))?;
        for (index, chunk) in stream_chunks(text).into_iter().enumerate() {
            if index > 0 && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
            self.transcript.write(chunk)?;
        }
        Ok(Some(self.message_id()))
    }

    async fn end_stream_message(&self, _sender: Sender) -> FlowResult<bool> {
        self.transcript.write("\n")?;
        Ok(true)
    }

    async fn remove_message(&self, id: &str) -> FlowResult<Option<MessageId>> {
        self.transcript.line(&format!("(message {} removed)", id))?;
        Ok(Some(id.to_string()))
    }

    async fn set_text_area_value(&self, value: &str) -> FlowResult<()> {
        self.shell.lock().draft = Some(value.to_string());
        self.transcript
            .line(&format!("(input prefilled, press enter to send: {})", value))
    }

    async fn show_toast(
        &self,
        content: &str,
        timeout_ms: Option<u64>,
    ) -> FlowResult<Option<String>> {
        debug!(?timeout_ms, "toast shown");
        self.transcript.line(&format!("toast> {}", content))?;
        Ok(Some(format!(
            "t{}",
            self.next_toast.fetch_add(1, Ordering::Relaxed)
        )))
    }

    async fn dismiss_toast(&self, id: &str) -> FlowResult<Option<String>> {
        Ok(Some(id.to_string()))
    }

    async fn open_chat(&self, is_open: bool) -> FlowResult<()> {
        let state = if is_open { "opened" } else { "closed" };
        self.transcript.line(&format!("(chat {})", state))
    }

    async fn set_text_area_disabled(&self, disabled: bool) -> FlowResult<()> {
        let changed = {
            let mut shell = self.shell.lock();
            let changed = shell.disabled != disabled;
            shell.disabled = disabled;
            changed
        };
        if changed {
            let state = if disabled { "disabled" } else { "enabled" };
            self.transcript.line(&format!("(chat input {})", state))?;
        }
        Ok(())
    }

    async fn set_sensitive_input(&self, sensitive: bool) -> FlowResult<()> {
        self.shell.lock().sensitive = sensitive;
        Ok(())
    }

    async fn set_timeout_handle(&self, handle: TimerHandle) -> FlowResult<()> {
        debug!(timer_id = handle.id(), "interruptable transition surfaced");
        self.shell.lock().arm_timer(handle);
        Ok(())
    }
}
