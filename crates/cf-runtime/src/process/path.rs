use cf_core::FlowResult;
use tracing::{debug, warn};

use crate::attribute::resolve_attribute;
use crate::block::Block;
use crate::params::Params;

/// Requests navigation to the resolved path. Reports `true` whenever one was requested.
pub(crate) async fn process_path(block: &Block, params: &Params) -> FlowResult<bool> {
    let Some(path) = resolve_attribute(block.path.as_ref(), params).await? else {
        debug!("path resolved to nothing");
        return Ok(false);
    };
    if path.is_empty() {
        debug!("path is empty");
        return Ok(false);
    }
    debug!(target_path = %path, "navigating");
    if !params.go_to_path(&path).await? {
        warn!(target_path = %path, "navigation was not accepted");
    }
    Ok(true)
}
