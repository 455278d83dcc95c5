use regex_lite::Regex;
use std::collections::{BTreeMap, BTreeSet};

use super::{reports_no_instances, split_records};
use crate::config::Timings;
use crate::models::cell;
use crate::models::{product_number, HardwareInventory, SortedCells};
use crate::services::{query_with_retry, QueryService};
use crate::utils::chunks;

/// Nodes per scoped cmedit query
pub const CHUNK_SIZE: usize = 300;
/// productData fragments kept per node
pub const MAX_PRODUCT_FRAGMENTS: usize = 120;
/// SectorEquipmentFunction fragments inspected per node
pub const MAX_RF_FRAGMENTS: usize = 6;

pub fn product_data_query(nodes: &[String]) -> String {
    format!(
        "cmedit get {} FieldReplaceableUnit.(positionCoordinates,productData) -ne=RadioNode",
        nodes.join(";")
    )
}

pub fn rf_branch_query(nodes: &[String]) -> String {
    format!("cmedit get {} SectorEquipmentFunction.rfBranchRef", nodes.join(";"))
}

/// Gather FRU product data and RF branch counts for every node with supported cells.
///
/// Each batch of nodes gets one product data query and one RF branch query. A failed
/// batch only loses the evidence of its own nodes.
pub async fn collect(
    query: &dyn QueryService,
    cells: &SortedCells,
    timings: &Timings,
) -> HardwareInventory {
    let node_ids: Vec<String> = cells.keys().cloned().collect();
    let mut inventory = HardwareInventory::default();

    for (batch_no, batch) in chunks(&node_ids, CHUNK_SIZE).enumerate() {
        tracing::info!(
            "Fetching hardware data for batch {} ({} nodes)",
            batch_no + 1,
            batch.len()
        );

        let records = fetch_records(query, &product_data_query(batch), timings).await;
        index_product_data(&mut inventory, batch, &records);

        let records = fetch_records(query, &rf_branch_query(batch), timings).await;
        index_rf_branches(&mut inventory, batch, &records);
    }

    tracing::info!(
        "Hardware data gathered: {} nodes with product data, {} with RF branch counts",
        inventory.product_data.values().filter(|f| !f.is_empty()).count(),
        inventory.rf_branch_count.len()
    );
    inventory
}

async fn fetch_records(query: &dyn QueryService, command: &str, timings: &Timings) -> Vec<String> {
    match query_with_retry(query, command, timings).await {
        Ok(lines) if reports_no_instances(&lines) => {
            tracing::debug!("No data returned for: {}", command);
            Vec::new()
        }
        Ok(lines) => split_records(&lines),
        Err(e) => {
            tracing::warn!("Could not use nodes, error encountered: {}", e);
            Vec::new()
        }
    }
}

/// Bucket records by the node they belong to, ignoring nodes outside the batch
fn by_node<'a>(batch: &[String], records: &'a [String]) -> BTreeMap<String, Vec<&'a str>> {
    let wanted: BTreeSet<&str> = batch.iter().map(String::as_str).collect();
    let mut grouped: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
    for record in records {
        if let Some(node) = cell::node_id(record) {
            if wanted.contains(node) {
                grouped.entry(node.to_string()).or_default().push(record);
            }
        }
    }
    grouped
}

pub fn index_product_data(
    inventory: &mut HardwareInventory,
    batch: &[String],
    records: &[String],
) {
    let mut grouped = by_node(batch, records);
    for node in batch {
        let node_records = grouped.remove(node).unwrap_or_default();
        let fragments: Vec<String> = node_records
            .iter()
            .filter(|r| product_number::is_known(r))
            .take(MAX_PRODUCT_FRAGMENTS)
            .map(|r| r.to_string())
            .collect();
        if fragments.is_empty() {
            tracing::debug!("{}: no known radio product data", node);
        }
        inventory.fru_count.insert(node.clone(), node_records.len());
        inventory.product_data.insert(node.clone(), fragments);
    }
}

pub fn index_rf_branches(
    inventory: &mut HardwareInventory,
    batch: &[String],
    records: &[String],
) {
    let Ok(re) = Regex::new(r"(?s)rfBranchRef(.*?)\]") else {
        return;
    };
    for (node, node_records) in by_node(batch, records) {
        for record in node_records.into_iter().take(MAX_RF_FRAGMENTS) {
            let count: usize = re
                .captures_iter(record)
                .filter_map(|c| c.get(1))
                .map(|span| span.as_str().matches(node.as_str()).count())
                .sum();
            if count == 2 || count == 4 {
                inventory.rf_branch_count.entry(node.clone()).or_insert(count as u32);
            }
        }
    }
}
