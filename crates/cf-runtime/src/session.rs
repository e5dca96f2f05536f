use std::sync::Arc;

use cf_core::{FlowError, FlowResult, Settings};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{error, info};

use crate::block::{Flow, START_PATH};
use crate::controller::{PathController, PathState};
use crate::events::{FlowEvent, FlowEventBus};
use crate::orchestrator::{post_process_block, pre_process_block};
use crate::params::{ChatHost, Params};
use crate::timer::{TimerFired, TimerPhase, TransitionTimer};

#[derive(Debug)]
enum SessionCommand {
    UserInput(String),
    GoToPath(String),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Cloneable front door to a running [`ChatSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    events: FlowEventBus,
    controller: Arc<PathController>,
    timer: Arc<TransitionTimer>,
}

impl SessionHandle {
    /// Submits user input; the block that is current when it is handled gets post-processed.
    pub fn send_input(&self, text: impl Into<String>) -> FlowResult<()> {
        self.send(SessionCommand::UserInput(text.into()))
    }

    pub fn go_to_path(&self, path: impl Into<String>) -> FlowResult<()> {
        self.send(SessionCommand::GoToPath(path.into()))
    }

    /// Resolves once every command sent before it has been handled.
    pub async fn flush(&self) -> FlowResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Flush(tx))?;
        rx.await.map_err(|_| session_closed())
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
    }

    pub fn events(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    pub fn current_path(&self) -> Option<String> {
        self.controller.curr_path()
    }

    pub fn prev_path(&self) -> Option<String> {
        self.controller.prev_path()
    }

    pub fn path_state(&self) -> PathState {
        self.controller.snapshot()
    }

    pub fn timer_phase(&self) -> TimerPhase {
        self.timer.phase()
    }

    fn send(&self, command: SessionCommand) -> FlowResult<()> {
        self.commands.send(command).map_err(|_| session_closed())
    }
}

fn session_closed() -> FlowError {
    FlowError::new("ENGINE_SESSION_CLOSED", "Chat session is no longer running.")
}

/// Drives one conversation. Every pass runs on the task that awaits [`ChatSession::run`],
/// so passes never overlap.
pub struct ChatSession {
    flow: Arc<Flow>,
    host: Arc<dyn ChatHost>,
    settings: Settings,
    controller: Arc<PathController>,
    timer: Arc<TransitionTimer>,
    events: FlowEventBus,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    fired: mpsc::UnboundedReceiver<TimerFired>,
    user_input: Option<String>,
}

impl ChatSession {
    pub fn new(
        flow: Flow,
        host: Arc<dyn ChatHost>,
        settings: Settings,
    ) -> FlowResult<(Self, SessionHandle)> {
        flow.validate()?;
        settings.validate()?;

        let flow = Arc::new(flow);
        let events = FlowEventBus::new(settings.event_capacity);
        let controller = Arc::new(PathController::new(Arc::clone(&flow), events.clone()));
        let (fired_tx, fired) = mpsc::unbounded_channel();
        let timer = Arc::new(TransitionTimer::new(fired_tx, events.clone()));
        let (commands_tx, commands) = mpsc::unbounded_channel();

        let handle = SessionHandle {
            commands: commands_tx,
            events: events.clone(),
            controller: Arc::clone(&controller),
            timer: Arc::clone(&timer),
        };
        let session = Self {
            flow,
            host,
            settings,
            controller,
            timer,
            events,
            commands,
            fired,
            user_input: None,
        };
        Ok((session, handle))
    }

    /// Enters `start`, then handles commands until shutdown or until every handle is dropped.
    pub async fn run(mut self) -> FlowResult<()> {
        if self.settings.chat_disabled_default {
            self.host.set_text_area_disabled(true).await?;
        }
        self.navigate(START_PATH).await;
        self.drain_navigation().await;

        loop {
            tokio::select! {
                biased;
                Some(fired) = self.fired.recv() => self.fire(fired).await,
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    match command {
                        SessionCommand::UserInput(text) => self.handle_input(text).await,
                        SessionCommand::GoToPath(path) => self.navigate(&path).await,
                        SessionCommand::Flush(done) => {
                            let _ = done.send(());
                        }
                        SessionCommand::Shutdown => break,
                    }
                }
            }
            self.drain_navigation().await;
        }

        self.timer.cancel_pending();
        info!("chat session stopped");
        Ok(())
    }

    async fn handle_input(&mut self, text: String) {
        self.user_input = Some(text);
        let Some(path) = self.controller.curr_path() else {
            return;
        };
        self.post_process(&path).await;
    }

    /// Post-processes the block that scheduled the timer, with that block's paths.
    async fn fire(&mut self, fired: TimerFired) {
        if !self.timer.begin_firing(&fired) {
            return;
        }
        info!(path = %fired.path, timer_id = fired.timer_id, "transition fired");
        self.events.publish(FlowEvent::TransitionFired {
            path: fired.path.clone(),
        });
        let params = self
            .params()
            .with_paths(Some(fired.path.clone()), fired.prev_path.clone());
        self.post_process_with(&fired.path, &params).await;
        self.timer.finish_firing(fired.timer_id);
    }

    async fn navigate(&mut self, path: &str) {
        if let Err(error) = self.controller.commit(path) {
            self.report(path, error);
            return;
        }
        let params = self.params();
        match pre_process_block(&self.flow, path, &params, &self.timer).await {
            Ok(()) => self.events.publish(FlowEvent::BlockPreProcessed {
                path: path.to_string(),
            }),
            Err(error) => self.report(path, error),
        }
    }

    async fn post_process(&mut self, path: &str) {
        let params = self.params();
        self.post_process_with(path, &params).await;
    }

    async fn post_process_with(&mut self, path: &str, params: &Params) {
        match post_process_block(&self.flow, path, params).await {
            Ok(navigated) => self.events.publish(FlowEvent::BlockPostProcessed {
                path: path.to_string(),
                navigated,
            }),
            Err(error) => self.report(path, error),
        }
    }

    /// Commits navigations requested during the last pass, in request order.
    async fn drain_navigation(&mut self) {
        while let Some(path) = self.controller.take_pending() {
            self.navigate(&path).await;
        }
    }

    fn params(&self) -> Params {
        Params::new(Arc::clone(&self.host), self.controller.clone())
            .with_paths(self.controller.curr_path(), self.controller.prev_path())
            .with_user_input(self.user_input.clone())
            .with_delivery(self.settings.bot_delivery)
    }

    fn report(&self, path: &str, error: FlowError) {
        error!(path, code = %error.code, message = %error.message, "pass failed");
        self.events.publish(FlowEvent::PassFailed {
            path: path.to_string(),
            code: error.code,
            message: error.message,
        });
    }
}
