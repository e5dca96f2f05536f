use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cf_core::{FlowResult, MessageContent, MessageId, Sender};
use cf_runtime::{ChatHost, FlowEvent, TimerHandle};
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use crate::ExpectedEvent;

/// Host that turns capability calls and path changes into one ordered event list.
#[derive(Debug, Default)]
pub(crate) struct CaseHost {
    bus: Mutex<Option<broadcast::Receiver<FlowEvent>>>,
    observed: Mutex<Vec<ExpectedEvent>>,
    sensitive: AtomicBool,
    next_id: AtomicU64,
}

impl CaseHost {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Must be called before the session starts so the entry into `start` is seen.
    pub(crate) fn attach(&self, events: broadcast::Receiver<FlowEvent>) {
        *self.bus.lock() = Some(events);
    }

    pub(crate) fn take_observed(&self) -> Vec<ExpectedEvent> {
        self.drain_bus();
        std::mem::take(&mut *self.observed.lock())
    }

    fn drain_bus(&self) {
        let mut bus = self.bus.lock();
        let Some(events) = bus.as_mut() else {
            return;
        };
        let mut observed = self.observed.lock();
        loop {
            match events.try_recv() {
                Ok(FlowEvent::PathChanged { curr, .. }) => {
                    observed.push(ExpectedEvent::Path { path: curr })
                }
                Ok(FlowEvent::PassFailed { code, .. }) => {
                    observed.push(ExpectedEvent::Failed { code })
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "case observer lagged behind the event bus")
                }
                Err(_) => break,
            }
        }
    }

    fn observe(&self, event: ExpectedEvent) {
        self.drain_bus();
        self.observed.lock().push(event);
    }

    fn observe_content(&self, content: &MessageContent) -> Option<MessageId> {
        let event = match content {
            MessageContent::Text { text } => ExpectedEvent::Message { text: text.clone() },
            MessageContent::Options(prompt) => ExpectedEvent::Options {
                items: prompt.items.clone(),
            },
            MessageContent::Checkboxes(prompt) => ExpectedEvent::Checkboxes {
                items: prompt.items.clone(),
                min: prompt.min,
                max: prompt.max,
            },
            MessageContent::Component(component) => ExpectedEvent::Component {
                name: component.kind.clone(),
                props: component.props.to_json(),
            },
        };
        self.observe(event);
        Some(format!("m{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1))
    }
}

#[async_trait]
impl ChatHost for CaseHost {
    async fn inject_message(
        &self,
        content: MessageContent,
        _sender: Sender,
    ) -> FlowResult<Option<MessageId>> {
        Ok(self.observe_content(&content))
    }

    async fn stream_message(
        &self,
        content: MessageContent,
        _sender: Sender,
    ) -> FlowResult<Option<MessageId>> {
        Ok(self.observe_content(&content))
    }

    async fn end_stream_message(&self, _sender: Sender) -> FlowResult<bool> {
        Ok(true)
    }

    async fn remove_message(&self, id: &str) -> FlowResult<Option<MessageId>> {
        Ok(Some(id.to_string()))
    }

    async fn set_text_area_value(&self, _value: &str) -> FlowResult<()> {
        Ok(())
    }

    async fn show_toast(
        &self,
        content: &str,
        _timeout_ms: Option<u64>,
    ) -> FlowResult<Option<String>> {
        self.observe(ExpectedEvent::Toast {
            text: content.to_string(),
        });
        Ok(None)
    }

    async fn dismiss_toast(&self, _id: &str) -> FlowResult<Option<String>> {
        Ok(None)
    }

    async fn open_chat(&self, _is_open: bool) -> FlowResult<()> {
        Ok(())
    }

    async fn set_text_area_disabled(&self, disabled: bool) -> FlowResult<()> {
        self.observe(ExpectedEvent::ChatDisabled { disabled });
        Ok(())
    }

    async fn set_sensitive_input(&self, sensitive: bool) -> FlowResult<()> {
        if self.sensitive.swap(sensitive, Ordering::Relaxed) != sensitive {
            self.observe(ExpectedEvent::Sensitive { sensitive });
        }
        Ok(())
    }

    async fn set_timeout_handle(&self, _handle: TimerHandle) -> FlowResult<()> {
        Ok(())
    }
}
