use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cf_core::TransitionDetails;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::{FlowEvent, FlowEventBus};

/// Opaque cancel handle for an interruptable transition.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    token: CancellationToken,
}

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!(timer_id = self.id, "transition cancelled by handle");
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Sent when a scheduled timer elapses; the receiver decides whether it still counts.
///
/// `path` and `prev_path` describe the block that scheduled the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired {
    pub timer_id: u64,
    pub path: String,
    pub prev_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Scheduled,
    Firing,
}

#[derive(Debug)]
enum TimerState {
    Idle,
    Scheduled {
        id: u64,
        path: String,
        token: CancellationToken,
    },
    Firing {
        id: u64,
    },
}

/// The single auto-advance timer of a session.
#[derive(Debug)]
pub struct TransitionTimer {
    state: Mutex<TimerState>,
    next_id: AtomicU64,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
    events: FlowEventBus,
}

impl TransitionTimer {
    pub fn new(fired_tx: mpsc::UnboundedSender<TimerFired>, events: FlowEventBus) -> Self {
        Self {
            state: Mutex::new(TimerState::Idle),
            next_id: AtomicU64::new(0),
            fired_tx,
            events,
        }
    }

    /// Schedules a timer for `path`, cancelling any pending one first.
    ///
    /// The handle is only returned for interruptable transitions. Must be called from
    /// within a Tokio runtime.
    pub fn schedule(
        &self,
        path: &str,
        prev_path: Option<&str>,
        details: TransitionDetails,
    ) -> Option<TimerHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        self.cancel_pending();
        *self.state.lock() = TimerState::Scheduled {
            id,
            path: path.to_string(),
            token: token.clone(),
        };

        let fired_tx = self.fired_tx.clone();
        let task_token = token.clone();
        let fired = TimerFired {
            timer_id: id,
            path: path.to_string(),
            prev_path: prev_path.map(str::to_string),
        };
        let delay = Duration::from_millis(details.duration_ms);
        tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // A closed receiver means the session is gone.
                    let _ = fired_tx.send(fired);
                }
            }
        });

        info!(
            path,
            timer_id = id,
            duration_ms = details.duration_ms,
            interruptable = details.interruptable,
            "transition scheduled"
        );
        self.events.publish(FlowEvent::TransitionScheduled {
            path: path.to_string(),
            duration_ms: details.duration_ms,
            interruptable: details.interruptable,
        });

        details.interruptable.then_some(TimerHandle { id, token })
    }

    /// Claims a fired timer for post-processing. Stale or cancelled firings are rejected.
    pub fn begin_firing(&self, fired: &TimerFired) -> bool {
        let mut state = self.state.lock();
        let claimable = match &*state {
            TimerState::Scheduled { id, token, .. } => {
                *id == fired.timer_id && !token.is_cancelled()
            }
            _ => false,
        };
        if claimable {
            *state = TimerState::Firing {
                id: fired.timer_id,
            };
        } else {
            debug!(timer_id = fired.timer_id, path = %fired.path, "dropping stale timer firing");
        }
        claimable
    }

    pub fn finish_firing(&self, timer_id: u64) {
        let mut state = self.state.lock();
        if matches!(&*state, TimerState::Firing { id } if *id == timer_id) {
            *state = TimerState::Idle;
        }
    }

    /// Cancels a pending timer, if any. Returns whether one was cancelled.
    pub fn cancel_pending(&self) -> bool {
        let mut state = self.state.lock();
        let TimerState::Scheduled { path, token, .. } = &*state else {
            return false;
        };
        let was_live = !token.is_cancelled();
        token.cancel();
        if was_live {
            self.events.publish(FlowEvent::TransitionCancelled { path: path.clone() });
        }
        *state = TimerState::Idle;
        was_live
    }

    pub fn phase(&self) -> TimerPhase {
        match &*self.state.lock() {
            TimerState::Idle => TimerPhase::Idle,
            TimerState::Scheduled { token, .. } if token.is_cancelled() => TimerPhase::Idle,
            TimerState::Scheduled { .. } => TimerPhase::Scheduled,
            TimerState::Firing { .. } => TimerPhase::Firing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> (TransitionTimer, mpsc::UnboundedReceiver<TimerFired>, FlowEventBus) {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = FlowEventBus::new(16);
        (TransitionTimer::new(tx, events.clone()), rx, events)
    }

    fn details(duration_ms: u64, interruptable: bool) -> TransitionDetails {
        TransitionDetails {
            duration_ms,
            interruptable,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_timer_fires_for_its_path() {
        let (timer, mut rx, _events) = timer();
        let handle = timer.schedule("start", Some("intro"), details(500, false));
        assert!(handle.is_none());
        assert_eq!(timer.phase(), TimerPhase::Scheduled);

        let fired = rx.recv().await.expect("timer should fire");
        assert_eq!(fired.path, "start");
        assert_eq!(fired.prev_path.as_deref(), Some("intro"));
        assert!(timer.begin_firing(&fired));
        assert_eq!(timer.phase(), TimerPhase::Firing);
        timer.finish_firing(fired.timer_id);
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_handle_stops_the_timer() {
        let (timer, mut rx, _events) = timer();
        let handle = timer
            .schedule("start", None, details(1_000, true))
            .expect("interruptable timer should surface a handle");
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(timer.phase(), TimerPhase::Idle);

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_supersedes_the_pending_timer() {
        let (timer, mut rx, events) = timer();
        let mut observed = events.subscribe();
        timer.schedule("first", None, details(1_000, false));
        timer.schedule("second", None, details(10, false));

        let fired = rx.recv().await.expect("second timer should fire");
        assert_eq!(fired.path, "second");
        assert!(timer.begin_firing(&fired));

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(rx.try_recv().is_err());

        let mut cancelled = Vec::new();
        while let Ok(event) = observed.try_recv() {
            if let FlowEvent::TransitionCancelled { path } = event {
                cancelled.push(path);
            }
        }
        assert_eq!(cancelled, vec!["first".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_firing_is_rejected() {
        let (timer, _rx, _events) = timer();
        timer.schedule("start", None, details(10, false));
        let stale = TimerFired {
            timer_id: 99,
            path: "start".to_string(),
            prev_path: None,
        };
        assert!(!timer.begin_firing(&stale));
        assert_eq!(timer.phase(), TimerPhase::Scheduled);
    }
}
