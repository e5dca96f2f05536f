use cf_core::{FlowResult, TransitionDetails};
use tracing::{debug, warn};

use crate::attribute::resolve_attribute;
use crate::block::{Block, TransitionSpec};
use crate::params::Params;
use crate::timer::TransitionTimer;

/// Normalizes an authored transition. A missing or NaN duration yields `None`;
/// negative durations fire immediately.
pub fn transition_details(spec: TransitionSpec) -> Option<TransitionDetails> {
    let duration = spec.duration.filter(|duration| !duration.is_nan())?;
    Some(TransitionDetails {
        duration_ms: duration.max(0.0) as u64,
        interruptable: spec.interruptable.unwrap_or(false),
    })
}

/// Schedules the block's timer. Only interruptable timers reach the shell.
pub(crate) async fn process_transition(
    block: &Block,
    path: &str,
    params: &Params,
    timer: &TransitionTimer,
) -> FlowResult<()> {
    let Some(spec) = resolve_attribute(block.transition.as_ref(), params).await? else {
        debug!("transition resolved to nothing");
        return Ok(());
    };
    let Some(details) = transition_details(spec) else {
        warn!(path, "transition has no numeric duration, skipping");
        return Ok(());
    };
    if let Some(handle) = timer.schedule(path, params.prev_path.as_deref(), details) {
        params.host().set_timeout_handle(handle).await?;
    }
    Ok(())
}
