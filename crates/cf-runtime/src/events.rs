use tokio::sync::broadcast;

/// Notifications about path and timer lifecycle, published to any number of observers.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    PathChanged {
        prev: Option<String>,
        curr: String,
    },
    BlockPreProcessed {
        path: String,
    },
    BlockPostProcessed {
        path: String,
        navigated: bool,
    },
    PassFailed {
        path: String,
        code: String,
        message: String,
    },
    TransitionScheduled {
        path: String,
        duration_ms: u64,
        interruptable: bool,
    },
    TransitionCancelled {
        path: String,
    },
    TransitionFired {
        path: String,
    },
}

#[derive(Debug, Clone)]
pub struct FlowEventBus {
    sender: broadcast::Sender<FlowEvent>,
}

impl FlowEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: FlowEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
