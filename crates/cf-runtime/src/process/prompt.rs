use cf_core::{CheckboxesPrompt, FlowResult, MessageContent, OptionsPrompt, Sender};
use tracing::{debug, warn};

use crate::attribute::resolve_attribute;
use crate::block::{Block, CheckboxesSpec, OptionsSpec};
use crate::params::Params;

/// Applies option defaults. Returns `None` when there is nothing to show.
pub fn options_prompt(spec: OptionsSpec) -> Option<OptionsPrompt> {
    if spec.items.is_empty() {
        return None;
    }
    Some(OptionsPrompt {
        items: spec.items,
        send_output: spec.send_output,
        reusable: spec.reusable.unwrap_or(false),
    })
}

/// Applies checkbox defaults, then clamps `min` down to `max`.
pub fn checkboxes_prompt(spec: CheckboxesSpec) -> Option<CheckboxesPrompt> {
    if spec.items.is_empty() {
        return None;
    }
    let max = spec.max.unwrap_or(spec.items.len());
    let mut min = spec.min.unwrap_or(1);
    if min > max {
        min = max;
    }
    Some(CheckboxesPrompt {
        items: spec.items,
        min,
        max,
        send_output: spec.send_output,
        reusable: spec.reusable.unwrap_or(false),
    })
}

pub(crate) async fn process_options(block: &Block, params: &Params) -> FlowResult<()> {
    let Some(spec) = resolve_attribute(block.options.as_ref(), params).await? else {
        debug!("options resolved to nothing");
        return Ok(());
    };
    let Some(prompt) = options_prompt(spec) else {
        warn!(path = ?params.curr_path, "options have no items, skipping");
        return Ok(());
    };
    debug!(items = prompt.items.len(), reusable = prompt.reusable, "injecting options");
    params
        .inject_message(MessageContent::Options(prompt), Sender::Bot)
        .await?;
    Ok(())
}

pub(crate) async fn process_checkboxes(block: &Block, params: &Params) -> FlowResult<()> {
    let Some(spec) = resolve_attribute(block.checkboxes.as_ref(), params).await? else {
        debug!("checkboxes resolved to nothing");
        return Ok(());
    };
    let Some(prompt) = checkboxes_prompt(spec) else {
        warn!(path = ?params.curr_path, "checkboxes have no items, skipping");
        return Ok(());
    };
    debug!(
        items = prompt.items.len(),
        min = prompt.min,
        max = prompt.max,
        "injecting checkboxes"
    );
    params
        .inject_message(MessageContent::Checkboxes(prompt), Sender::Bot)
        .await?;
    Ok(())
}
