use std::collections::BTreeMap;

use serde_json::json;

use crate::error::ReportError;
use crate::model::{LabelStats, OverallStats, TestMetadata};

/// Render the JSON report document.
///
/// Mirrors the stats field names one-to-one; the label map is a `BTreeMap`
/// so key order is stable across runs. The numeric fields survive a parse
/// back into [`OverallStats`]/[`LabelStats`] unchanged.
pub fn render_json(
    overall: &OverallStats,
    labels: &BTreeMap<String, LabelStats>,
    metadata: &TestMetadata,
) -> Result<serde_json::Value, ReportError> {
    let overall_value = serde_json::to_value(overall)
        .map_err(|e| ReportError::Render(format!("overall stats did not serialize: {e}")))?;
    let labels_value = serde_json::to_value(labels)
        .map_err(|e| ReportError::Render(format!("label stats did not serialize: {e}")))?;

    Ok(json!({
        "test_name": metadata.test_name,
        "environment": metadata.environment,
        "generated_at": metadata.generated_at.to_rfc3339(),
        "overall": overall_value,
        "labels": labels_value,
    }))
}
