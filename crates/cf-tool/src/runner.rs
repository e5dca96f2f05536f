use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use cf_api::{create_session_from_xml, CreateSessionFromXmlOptions};
use cf_core::FlowError;

use crate::host::CaseHost;
use crate::source::{read_flows_xml_from_dir, read_test_case};
use crate::{CfToolError, ExpectedEvent, TestAction, TestCase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
}

/// Runs a case on a paused clock, so waits complete instantly and deterministically.
pub fn run_case(flow_dir: &Path, case: &TestCase) -> Result<RunReport, CfToolError> {
    let flows_xml = read_flows_xml_from_dir(flow_dir)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .map_err(CfToolError::Runtime)?;
    runtime.block_on(drive(flows_xml, case))
}

async fn drive(
    flows_xml: BTreeMap<String, String>,
    case: &TestCase,
) -> Result<RunReport, CfToolError> {
    let host = CaseHost::new();
    let (session, handle) = create_session_from_xml(CreateSessionFromXmlOptions {
        flows_xml,
        host: host.clone(),
        settings: case.settings.clone(),
    })?;
    host.attach(handle.events());
    let task = tokio::spawn(session.run());

    handle.flush().await?;
    for action in &case.actions {
        match action {
            TestAction::Input { text } => handle.send_input(text.clone())?,
            // One extra millisecond lets a timer due exactly at `ms` fire first.
            TestAction::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms + 1)).await,
        }
        handle.flush().await?;
    }

    handle.shutdown();
    task.await.map_err(|error| {
        FlowError::new(
            "TOOL_SESSION_JOIN",
            format!("Session task did not finish cleanly: {}", error),
        )
    })??;

    Ok(RunReport {
        observed_events: host.take_observed(),
    })
}

pub fn assert_case(flow_dir: &Path, case_path: &Path) -> Result<(), CfToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(flow_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(CfToolError::EventSerialize)?;
        return Err(CfToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(CfToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(CfToolError::EventSerialize)?;
            return Err(CfToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}
