use cf_core::FlowResult;
use tracing::debug;

use crate::block::Block;
use crate::params::Params;

/// Runs the side-effect function. Its return value is discarded.
pub(crate) async fn process_function(block: &Block, params: &Params) -> FlowResult<()> {
    let Some(function) = block.function.as_ref() else {
        return Ok(());
    };
    let returned = function.call(params).await?;
    debug!(returned = ?returned.as_ref().map(|value| value.type_name()), "function ran");
    Ok(())
}
