use crate::config::LayoutConfig;
use crate::parser::PayloadError;

use super::{ErrorLayout, Layout, LayoutData};

/// Placeholder shown instead of the chart when the payload cannot be laid out.
pub fn compute_error_layout(err: &PayloadError, config: &LayoutConfig) -> Layout {
    tracing::warn!(error = %err, "rendering error placeholder");
    Layout {
        width: config.error.width.max(1.0),
        height: config.error.height.max(1.0),
        diagram: LayoutData::Error(ErrorLayout {
            message: err.to_string(),
            text_size: config.error.text_size.max(1.0),
        }),
    }
}
