use cf_core::FlowResult;
use tracing::debug;

use crate::attribute::resolve_attribute;
use crate::block::Block;
use crate::params::Params;

/// Leaves the input state alone when the block does not declare `chatDisabled`.
/// A function resolving to nothing re-enables the input.
pub(crate) async fn process_chat_disabled(block: &Block, params: &Params) -> FlowResult<()> {
    let Some(attribute) = block.chat_disabled.as_ref() else {
        return Ok(());
    };
    let disabled = resolve_attribute(Some(attribute), params)
        .await?
        .unwrap_or(false);
    debug!(disabled, "setting text area disabled");
    params.host().set_text_area_disabled(disabled).await
}

/// Unlike `chatDisabled`, absence means `false`.
pub(crate) async fn process_is_sensitive(block: &Block, params: &Params) -> FlowResult<()> {
    let sensitive = resolve_attribute(block.is_sensitive.as_ref(), params)
        .await?
        .unwrap_or(false);
    debug!(sensitive, "setting sensitive input");
    params.host().set_sensitive_input(sensitive).await
}
