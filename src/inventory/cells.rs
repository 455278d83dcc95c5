use std::collections::BTreeMap;

use super::reports_no_instances;
use crate::config::Timings;
use crate::error::CbrsError;
use crate::models::cell::{self, NodeCells, RadioFamily, SortedCells, SUPPORTED_CELL_COUNTS};
use crate::services::{query_with_retry, QueryService};

pub const LTE_CELLS_QUERY: &str = "cmedit get * EUtranCellTDD.cbrscell==true";
pub const NR_CELLS_QUERY: &str = "cmedit get * NRSectorCarrier.cbrsEnabled==true";

/// Fetch every CBRS enabled cell and sort them per node.
///
/// The LTE query is mandatory: an error/zero-instance response, or one without any FDN,
/// aborts with `InventoryUnavailable`. The NR query only runs when NR devices are wanted,
/// and an empty NR inventory is not an error.
pub async fn collect(
    query: &dyn QueryService,
    nr_required: bool,
    timings: &Timings,
) -> Result<SortedCells, CbrsError> {
    tracing::info!("Querying deployment for CBRS enabled cells");
    let output = query_with_retry(query, LTE_CELLS_QUERY, timings).await?;
    if reports_no_instances(&output) {
        return Err(CbrsError::InventoryUnavailable(
            "Could not find any cbrs enabled cells on deployment".to_string(),
        ));
    }
    let mut fdns = parse_fdn_lines(&output);
    if fdns.is_empty() {
        return Err(CbrsError::InventoryUnavailable(
            "cbrs cell query returned no FDNs".to_string(),
        ));
    }

    if nr_required {
        tracing::info!("Querying deployment for NR CBRS enabled cells");
        let nr_output = query_with_retry(query, NR_CELLS_QUERY, timings).await?;
        if reports_no_instances(&nr_output) {
            tracing::debug!("No NR cells available on deployment");
        } else {
            fdns.extend(parse_fdn_lines(&nr_output));
        }
    } else {
        tracing::debug!("Number of NR_4408 devices required is 0, NR cells will not be requested");
    }

    let sorted = sort_by_node(fdns);
    tracing::info!("Found {} nodes with a supported CBRS cell count", sorted.len());
    Ok(sorted)
}

/// Keep the FDN of every line carrying an FDN marker
pub fn parse_fdn_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| line.split_once("FDN"))
        .map(|(_, rest)| rest.trim_start_matches([' ', ':']).trim().to_string())
        .filter(|fdn| !fdn.is_empty())
        .collect()
}

/// Group cells by node, order them numerically and drop unsupported cell counts
pub fn sort_by_node(fdns: Vec<String>) -> SortedCells {
    let mut by_node: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for fdn in fdns {
        match cell::node_id(&fdn) {
            Some(node) => by_node.entry(node.to_string()).or_default().push(fdn),
            None => tracing::debug!("Ignoring cell without ManagedElement: {}", fdn),
        }
    }

    let mut sorted = SortedCells::new();
    for (node_id, fdns) in by_node {
        let family = RadioFamily::of_node(&node_id);
        let cells = order_cells(&node_id, fdns, family);
        if !SUPPORTED_CELL_COUNTS.contains(&cells.len()) {
            tracing::debug!(
                "{} has {} Cells which is not currently supported",
                node_id,
                cells.len()
            );
            continue;
        }
        sorted.insert(
            node_id.clone(),
            NodeCells {
                node_id,
                family,
                cells,
            },
        );
    }
    sorted
}

fn order_cells(node_id: &str, fdns: Vec<String>, family: RadioFamily) -> Vec<String> {
    let mut indexed: Vec<(u32, String)> = Vec::with_capacity(fdns.len());
    for fdn in fdns {
        match cell::cell_index(&fdn, family) {
            Some(index) => indexed.push((index, fdn)),
            None => tracing::debug!("{}: cell without numeric index dropped: {}", node_id, fdn),
        }
    }
    indexed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    indexed.dedup_by(|a, b| a.1 == b.1);
    indexed.into_iter().map(|(_, fdn)| fdn).collect()
}
