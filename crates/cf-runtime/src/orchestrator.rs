use cf_core::FlowResult;
use tracing::debug;

use crate::block::{BlockAttribute, Flow, Phase};
use crate::params::Params;
use crate::process::{
    process_chat_disabled, process_checkboxes, process_component, process_function,
    process_is_sensitive, process_message, process_options, process_path, process_transition,
};
use crate::timer::TransitionTimer;

/// Runs the entry effects of the block at `path`, one attribute after another in the
/// fixed pre-phase order.
///
/// `isSensitive` runs for every block so that leaving a sensitive block resets the flag.
/// Fails with `ENGINE_BLOCK_INVALID` for unknown or empty blocks.
pub async fn pre_process_block(
    flow: &Flow,
    path: &str,
    params: &Params,
    timer: &TransitionTimer,
) -> FlowResult<()> {
    let block = flow.processable_block(path)?;
    debug!(path, "pre-processing block");

    for attribute in BlockAttribute::ALL {
        if attribute.phase() != Phase::Pre {
            continue;
        }
        if !block.declares(attribute) && attribute != BlockAttribute::IsSensitive {
            continue;
        }
        match attribute {
            BlockAttribute::Message => process_message(block, params).await?,
            BlockAttribute::Options => process_options(block, params).await?,
            BlockAttribute::Checkboxes => process_checkboxes(block, params).await?,
            BlockAttribute::Component => process_component(block, params).await?,
            BlockAttribute::ChatDisabled => process_chat_disabled(block, params).await?,
            BlockAttribute::IsSensitive => process_is_sensitive(block, params).await?,
            BlockAttribute::Transition => process_transition(block, path, params, timer).await?,
            BlockAttribute::Function | BlockAttribute::Path => {}
        }
    }
    Ok(())
}

/// Runs `function` then `path` for the block at `path`.
///
/// Returns whether navigation was requested. Blocks without `path` return `false`.
pub async fn post_process_block(flow: &Flow, path: &str, params: &Params) -> FlowResult<bool> {
    let block = flow.processable_block(path)?;
    debug!(path, "post-processing block");

    if block.declares(BlockAttribute::Function) {
        process_function(block, params).await?;
    }
    if !block.declares(BlockAttribute::Path) {
        return Ok(false);
    }
    process_path(block, params).await
}
