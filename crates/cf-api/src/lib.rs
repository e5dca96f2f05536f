use std::collections::BTreeMap;
use std::sync::Arc;

use cf_core::{FlowError, FlowResult, Settings};
use cf_runtime::{ChatHost, ChatSession, Flow, SessionHandle};
use tokio::task::JoinHandle;
use tracing::info;

pub use cf_script::compile_flow_from_xml_map;

#[derive(Clone)]
pub struct CreateSessionFromXmlOptions {
    pub flows_xml: BTreeMap<String, String>,
    pub host: Arc<dyn ChatHost>,
    pub settings: Option<Settings>,
}

/// A session whose run loop has been spawned onto the current runtime.
#[derive(Debug)]
pub struct RunningSession {
    pub handle: SessionHandle,
    task: JoinHandle<FlowResult<()>>,
}

impl RunningSession {
    /// Asks the session to stop after already-queued commands and waits for it.
    pub async fn stop(self) -> FlowResult<()> {
        self.handle.shutdown();
        self.join().await
    }

    /// Waits for the run loop to end on its own.
    pub async fn join(self) -> FlowResult<()> {
        self.task.await.map_err(|error| {
            FlowError::new(
                "API_SESSION_JOIN",
                format!("Session task did not finish cleanly: {}", error),
            )
        })?
    }
}

pub fn create_session(
    flow: Flow,
    host: Arc<dyn ChatHost>,
    settings: Option<Settings>,
) -> FlowResult<(ChatSession, SessionHandle)> {
    ChatSession::new(flow, host, settings.unwrap_or_default())
}

pub fn create_session_from_xml(
    options: CreateSessionFromXmlOptions,
) -> FlowResult<(ChatSession, SessionHandle)> {
    if options.flows_xml.is_empty() {
        return Err(FlowError::new(
            "API_FLOWS_EMPTY",
            "At least one flow document is required.",
        ));
    }
    let flow = compile_flow_from_xml_map(&options.flows_xml)?;
    info!(blocks = flow.len(), "flow compiled");
    create_session(flow, options.host, options.settings)
}

/// Compiles, builds and spawns a session. Must be called from within a Tokio runtime.
pub fn spawn_session_from_xml(options: CreateSessionFromXmlOptions) -> FlowResult<RunningSession> {
    let (session, handle) = create_session_from_xml(options)?;
    let task = tokio::spawn(session.run());
    Ok(RunningSession { handle, task })
}
