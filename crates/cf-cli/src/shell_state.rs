use std::sync::Arc;

use cf_core::{CheckboxesPrompt, OptionsPrompt};
use cf_runtime::TimerHandle;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PromptKind {
    Options(OptionsPrompt),
    Checkboxes(CheckboxesPrompt),
}

impl PromptKind {
    pub(crate) fn items(&self) -> &[String] {
        match self {
            Self::Options(prompt) => &prompt.items,
            Self::Checkboxes(prompt) => &prompt.items,
        }
    }

    pub(crate) fn reusable(&self) -> bool {
        match self {
            Self::Options(prompt) => prompt.reusable,
            Self::Checkboxes(prompt) => prompt.reusable,
        }
    }
}

/// The most recently surfaced prompt and the path it was surfaced on.
#[derive(Debug, Clone)]
pub(crate) struct ActivePrompt {
    pub(crate) kind: PromptKind,
    pub(crate) origin_path: Option<String>,
    pub(crate) used: bool,
}

impl ActivePrompt {
    /// A used non-reusable prompt stays selectable only while the path has not advanced.
    pub(crate) fn is_live(&self, current_path: Option<&str>) -> bool {
        if self.kind.reusable() || !self.used {
            return true;
        }
        self.origin_path.is_some() && self.origin_path.as_deref() == current_path
    }
}

#[derive(Debug, Default)]
pub(crate) struct ShellState {
    pub(crate) prompt: Option<ActivePrompt>,
    pub(crate) disabled: bool,
    pub(crate) sensitive: bool,
    pub(crate) draft: Option<String>,
    pub(crate) timer: Option<TimerHandle>,
}

pub(crate) type SharedShell = Arc<Mutex<ShellState>>;

impl ShellState {
    pub(crate) fn surface_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some(ActivePrompt {
            kind,
            origin_path: None,
            used: false,
        });
    }

    pub(crate) fn stamp_prompt(&mut self, current_path: Option<&str>) {
        if let Some(prompt) = self.prompt.as_mut() {
            if prompt.origin_path.is_none() {
                prompt.origin_path = current_path.map(str::to_string);
            }
        }
    }

    pub(crate) fn live_prompt(&mut self, current_path: Option<&str>) -> Option<&mut ActivePrompt> {
        self.prompt
            .as_mut()
            .filter(|prompt| prompt.is_live(current_path))
    }

    pub(crate) fn arm_timer(&mut self, handle: TimerHandle) {
        self.timer = Some(handle);
    }

    /// Cancels the surfaced timer, if any. Returns whether a live timer was cancelled.
    pub(crate) fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(handle) if !handle.is_cancelled() => {
                handle.cancel();
                true
            }
            _ => false,
        }
    }
}
