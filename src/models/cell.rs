use serde::Serialize;
use std::collections::BTreeMap;

/// Node ids of NR radio nodes carry this marker
pub const NR_NODE_MARKER: &str = "gNodeBRadio";

const MANAGED_ELEMENT: &str = "ManagedElement=";
const SUBNETWORK: &str = "SubNetwork=";
const NR_SECTOR_CARRIER: &str = "NRSectorCarrier=";

/// Cell counts a node may have to take part in group planning
pub const SUPPORTED_CELL_COUNTS: [usize; 4] = [2, 3, 6, 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RadioFamily {
    Lte,
    Nr,
}

impl RadioFamily {
    pub fn of_node(node_id: &str) -> Self {
        if node_id.contains(NR_NODE_MARKER) {
            RadioFamily::Nr
        } else {
            RadioFamily::Lte
        }
    }
}

/// Extract the node id (ManagedElement value) from an FDN
pub fn node_id(fdn: &str) -> Option<&str> {
    let start = fdn.find(MANAGED_ELEMENT)? + MANAGED_ELEMENT.len();
    let rest = &fdn[start..];
    let id = rest.split(',').next().unwrap_or(rest).trim();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Numeric sector/carrier index used to order a node's cells.
/// NR cells are indexed by NRSectorCarrier, LTE cells by the suffix after the last '-'.
pub fn cell_index(fdn: &str, family: RadioFamily) -> Option<u32> {
    let raw = match family {
        RadioFamily::Nr => fdn.split(NR_SECTOR_CARRIER).nth(1)?,
        RadioFamily::Lte => fdn.rsplit_once('-')?.1,
    };
    raw.trim().parse().ok()
}

/// Cell name as used in cbrs commands: the value of the last RDN
pub fn cell_name(fdn: &str) -> &str {
    fdn.rsplit_once('=').map(|(_, name)| name.trim()).unwrap_or(fdn)
}

/// SubNetwork values joined with '|', e.g. "Europe|Ireland|NETSimW|"
pub fn subnetwork_path(fdn: &str) -> String {
    let parts: Vec<&str> = fdn
        .split(',')
        .filter_map(|rdn| rdn.trim().strip_prefix(SUBNETWORK))
        .collect();
    format!("{}|", parts.join("|"))
}

/// FDN prefix up to and including the ManagedElement RDN
pub fn managed_element_path(fdn: &str) -> Option<&str> {
    let start = fdn.find(MANAGED_ELEMENT)?;
    let end = fdn[start..]
        .find(',')
        .map(|offset| start + offset)
        .unwrap_or(fdn.len());
    Some(fdn[..end].trim())
}

/// Ordered CBRS cells of one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCells {
    pub node_id: String,
    pub family: RadioFamily,
    pub cells: Vec<String>,
}

impl NodeCells {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn subnetwork_path(&self) -> String {
        self.cells
            .first()
            .map(|fdn| subnetwork_path(fdn))
            .unwrap_or_else(|| "|".to_string())
    }

    pub fn managed_element_path(&self) -> Option<&str> {
        self.cells.first().and_then(|fdn| managed_element_path(fdn))
    }
}

/// Node id -> ordered cells, restricted to supported cell counts
pub type SortedCells = BTreeMap<String, NodeCells>;

#[cfg(test)]
mod tests {
    use super::*;

    const LTE_FDN: &str = "SubNetwork=Europe,SubNetwork=Ireland,SubNetwork=NETSimW,ManagedElement=LTE32dg2ERBS00020,ENodeBFunction=1,EUtranCellTDD=LTE32dg2ERBS00020-5";
    const NR_FDN: &str = "SubNetwork=Europe,SubNetwork=Ireland,MeContext=NR20gNodeBRadio00027,ManagedElement=NR20gNodeBRadio00027,GNBDUFunction=1,NRSectorCarrier=11";

    #[test]
    fn test_node_id() {
        assert_eq!(node_id(LTE_FDN), Some("LTE32dg2ERBS00020"));
        assert_eq!(node_id(NR_FDN), Some("NR20gNodeBRadio00027"));
        assert_eq!(node_id("SubNetwork=Europe,MeContext=X"), None);
    }

    #[test]
    fn test_cell_index() {
        assert_eq!(cell_index(LTE_FDN, RadioFamily::Lte), Some(5));
        assert_eq!(cell_index(NR_FDN, RadioFamily::Nr), Some(11));
        assert_eq!(cell_index("ManagedElement=A,EUtranCellTDD=A", RadioFamily::Lte), None);
    }

    #[test]
    fn test_family_and_names() {
        assert_eq!(RadioFamily::of_node("NR20gNodeBRadio00027"), RadioFamily::Nr);
        assert_eq!(RadioFamily::of_node("LTE32dg2ERBS00020"), RadioFamily::Lte);
        assert_eq!(cell_name(LTE_FDN), "LTE32dg2ERBS00020-5");
        assert_eq!(cell_name(NR_FDN), "11");
    }

    #[test]
    fn test_paths() {
        assert_eq!(subnetwork_path(LTE_FDN), "Europe|Ireland|NETSimW|");
        assert_eq!(subnetwork_path(NR_FDN), "Europe|Ireland|");
        assert_eq!(
            managed_element_path(LTE_FDN),
            Some("SubNetwork=Europe,SubNetwork=Ireland,SubNetwork=NETSimW,ManagedElement=LTE32dg2ERBS00020")
        );
        assert_eq!(
            managed_element_path(NR_FDN),
            Some("SubNetwork=Europe,SubNetwork=Ireland,MeContext=NR20gNodeBRadio00027,ManagedElement=NR20gNodeBRadio00027")
        );
    }
}
