use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use cf_core::{FlowError, FlowResult};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::block::Flow;
use crate::events::{FlowEvent, FlowEventBus};
use crate::params::Navigator;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathState {
    pub curr: Option<String>,
    pub prev: Option<String>,
    pub history: Vec<String>,
}

/// Owns the current/previous path and the navigations requested during a pass.
#[derive(Debug)]
pub struct PathController {
    flow: Arc<Flow>,
    state: Mutex<PathState>,
    pending: Mutex<VecDeque<String>>,
    events: FlowEventBus,
}

impl PathController {
    pub fn new(flow: Arc<Flow>, events: FlowEventBus) -> Self {
        Self {
            flow,
            state: Mutex::new(PathState::default()),
            pending: Mutex::new(VecDeque::new()),
            events,
        }
    }

    /// Makes `path` current and publishes [`FlowEvent::PathChanged`].
    pub fn commit(&self, path: &str) -> FlowResult<()> {
        if !self.flow.contains(path) {
            return Err(FlowError::invalid_block());
        }
        let (prev, curr) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.prev = state.curr.replace(path.to_string());
            state.history.push(path.to_string());
            (state.prev.clone(), path.to_string())
        };
        info!(prev = ?prev, curr = %curr, "path changed");
        self.events.publish(FlowEvent::PathChanged { prev, curr });
        Ok(())
    }

    pub fn take_pending(&self) -> Option<String> {
        self.pending.lock().pop_front()
    }

    pub fn curr_path(&self) -> Option<String> {
        self.state.lock().curr.clone()
    }

    pub fn prev_path(&self) -> Option<String> {
        self.state.lock().prev.clone()
    }

    pub fn snapshot(&self) -> PathState {
        self.state.lock().clone()
    }
}

#[async_trait]
impl Navigator for PathController {
    /// Queues a navigation to be committed after the current pass.
    async fn go_to_path(&self, path: &str) -> FlowResult<bool> {
        if !self.flow.contains(path) {
            warn!(target_path = path, "navigation to unknown block ignored");
            return Ok(false);
        }
        self.pending.lock().push_back(path.to_string());
        Ok(true)
    }
}
