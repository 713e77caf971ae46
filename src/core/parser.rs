use crate::domain::model::{Record, RegionPage};
use crate::utils::error::{FetchError, Result};
use std::collections::HashMap;

/// Parses one page of the StanReginCd XML envelope.
///
/// `row` elements are collected from anywhere in the document, in document
/// order. `totalCount` is the first element of that name anywhere in the tree;
/// pages without one report `None` and the caller treats the page as final.
pub fn parse_region_page(xml: &str) -> Result<RegionPage> {
    let doc = roxmltree::Document::parse(xml)?;

    let records = doc
        .descendants()
        .filter(|node| node.has_tag_name("row"))
        .map(row_to_record)
        .collect();

    let total_count = doc
        .descendants()
        .find(|node| node.has_tag_name("totalCount"))
        .map(|node| parse_total_count(node.text().unwrap_or_default()))
        .transpose()?;

    Ok(RegionPage {
        records,
        total_count,
    })
}

/// Flattens the direct element children of a `row` into field/value pairs.
/// Tags without text become JSON null; a repeated tag keeps the last value.
fn row_to_record(row: roxmltree::Node<'_, '_>) -> Record {
    let mut data = HashMap::new();

    for child in row.children().filter(|c| c.is_element()) {
        let value = match child.text() {
            Some(text) => serde_json::Value::String(text.to_string()),
            None => serde_json::Value::Null,
        };
        data.insert(child.tag_name().name().to_string(), value);
    }

    Record { data }
}

/// Parses a signed total; negative values clamp to zero, making the current
/// page the last one.
fn parse_total_count(raw: &str) -> Result<usize> {
    let total: i64 = raw.trim().parse().map_err(|_| FetchError::ProcessingError {
        message: format!("totalCount is not a valid integer: '{}'", raw),
    })?;
    Ok(total.max(0) as usize)
}
