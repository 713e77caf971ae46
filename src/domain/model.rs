use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One flattened region row: field name -> text value (or null for empty tags).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

/// One page of the paginated listing response.
#[derive(Debug, Clone)]
pub struct RegionPage {
    pub records: Vec<Record>,
    /// Server-reported total across all pages; `None` when the envelope omits it.
    pub total_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub records: Vec<Record>,
    pub json_output: String,
}
