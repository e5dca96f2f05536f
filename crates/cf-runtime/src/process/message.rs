use cf_core::FlowResult;
use tracing::debug;

use crate::attribute::resolve_attribute;
use crate::block::Block;
use crate::params::Params;

/// Delivers the message once when it has visible content. The untrimmed text is sent.
pub(crate) async fn process_message(block: &Block, params: &Params) -> FlowResult<()> {
    let Some(message) = resolve_attribute(block.message.as_ref(), params).await? else {
        debug!("message resolved to nothing");
        return Ok(());
    };
    if message.trim().is_empty() {
        debug!("message is blank, skipping delivery");
        return Ok(());
    }
    debug!(delivery = ?params.delivery(), "delivering message");
    params.deliver_message(message).await
}
