use cf_core::{FlowResult, MessageContent, Sender};
use tracing::debug;

use crate::attribute::resolve_attribute;
use crate::block::Block;
use crate::params::Params;

pub(crate) async fn process_component(block: &Block, params: &Params) -> FlowResult<()> {
    let Some(component) = resolve_attribute(block.component.as_ref(), params).await? else {
        debug!("component resolved to nothing");
        return Ok(());
    };
    debug!(kind = %component.kind, "injecting component");
    params
        .inject_message(MessageContent::Component(component), Sender::Bot)
        .await?;
    Ok(())
}
