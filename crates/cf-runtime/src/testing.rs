//! In-memory hosts for exercising flows without a UI.

use std::sync::Arc;

use async_trait::async_trait;
use cf_core::{FlowResult, MessageContent, MessageId, Sender};
use parking_lot::Mutex;

use crate::params::{ChatHost, Navigator, Params};
use crate::timer::TimerHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Inject { content: MessageContent, sender: Sender },
    Stream { content: MessageContent, sender: Sender },
    EndStream { sender: Sender },
    Remove { id: String },
    SetTextAreaValue { value: String },
    ShowToast { content: String, timeout_ms: Option<u64> },
    DismissToast { id: String },
    OpenChat { is_open: bool },
    SetDisabled { disabled: bool },
    SetSensitive { sensitive: bool },
    SetTimeoutHandle { timer_id: u64 },
}

/// Records every capability call in order. Message ids are `m1`, `m2`, ...
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    handles: Mutex<Vec<TimerHandle>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<HostCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    /// Bot text delivered by inject or stream, in order.
    pub fn bot_texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                HostCall::Inject { content, sender: Sender::Bot }
                | HostCall::Stream { content, sender: Sender::Bot } => {
                    content.as_text().map(str::to_string)
                }
                _ => None,
            })
            .collect()
    }

    pub fn last_handle(&self) -> Option<TimerHandle> {
        self.handles.lock().last().cloned()
    }

    fn record(&self, call: HostCall) -> usize {
        let mut calls = self.calls.lock();
        calls.push(call);
        calls.len()
    }
}

#[async_trait]
impl ChatHost for RecordingHost {
    async fn inject_message(
        &self,
        content: MessageContent,
        sender: Sender,
    ) -> FlowResult<Option<MessageId>> {
        let index = self.record(HostCall::Inject { content, sender });
        Ok(Some(format!("m{}", index)))
    }

    async fn stream_message(
        &self,
        content: MessageContent,
        sender: Sender,
    ) -> FlowResult<Option<MessageId>> {
        let index = self.record(HostCall::Stream { content, sender });
        Ok(Some(format!("m{}", index)))
    }

    async fn end_stream_message(&self, sender: Sender) -> FlowResult<bool> {
        self.record(HostCall::EndStream { sender });
        Ok(true)
    }

    async fn remove_message(&self, id: &str) -> FlowResult<Option<MessageId>> {
        self.record(HostCall::Remove { id: id.to_string() });
        Ok(Some(id.to_string()))
    }

    async fn set_text_area_value(&self, value: &str) -> FlowResult<()> {
        self.record(HostCall::SetTextAreaValue {
            value: value.to_string(),
        });
        Ok(())
    }

    async fn show_toast(
        &self,
        content: &str,
        timeout_ms: Option<u64>,
    ) -> FlowResult<Option<String>> {
        let index = self.record(HostCall::ShowToast {
            content: content.to_string(),
            timeout_ms,
        });
        Ok(Some(format!("t{}", index)))
    }

    async fn dismiss_toast(&self, id: &str) -> FlowResult<Option<String>> {
        self.record(HostCall::DismissToast { id: id.to_string() });
        Ok(Some(id.to_string()))
    }

    async fn open_chat(&self, is_open: bool) -> FlowResult<()> {
        self.record(HostCall::OpenChat { is_open });
        Ok(())
    }

    async fn set_text_area_disabled(&self, disabled: bool) -> FlowResult<()> {
        self.record(HostCall::SetDisabled { disabled });
        Ok(())
    }

    async fn set_sensitive_input(&self, sensitive: bool) -> FlowResult<()> {
        self.record(HostCall::SetSensitive { sensitive });
        Ok(())
    }

    async fn set_timeout_handle(&self, handle: TimerHandle) -> FlowResult<()> {
        self.record(HostCall::SetTimeoutHandle {
            timer_id: handle.id(),
        });
        self.handles.lock().push(handle);
        Ok(())
    }
}

/// Accepts every navigation and remembers the requested paths.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    requested: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn go_to_path(&self, path: &str) -> FlowResult<bool> {
        self.requested.lock().push(path.to_string());
        Ok(true)
    }
}

/// Context wired to recording doubles, positioned at `curr_path`.
pub fn recording_params(
    host: &Arc<RecordingHost>,
    navigator: &Arc<RecordingNavigator>,
    curr_path: &str,
) -> Params {
    Params::new(host.clone(), navigator.clone()).with_paths(Some(curr_path.to_string()), None)
}
