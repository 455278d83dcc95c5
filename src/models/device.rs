use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Radio equipment types a CBRS node can be classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "2208")]
    Radio2208,
    #[serde(rename = "4408")]
    Radio4408,
    #[serde(rename = "6488")]
    Radio6488,
    #[serde(rename = "RadioDot")]
    RadioDot,
    #[serde(rename = "NR_4408")]
    Nr4408,
    #[serde(rename = "PassiveDas_4408")]
    PassiveDas4408,
}

/// Catalog product numbers found in FieldReplaceableUnit productData
pub mod product_number {
    pub const RADIO_6488: &str = "KRD 901 160/11";
    pub const RADIO_4408: &str = "KRC 161 746/1";
    pub const RADIO_2208: &str = "KRC 161 711/1";
    pub const RADIO_DOT: &str = "KRY 901 385/1";

    pub const ALL: &[&str] = &[RADIO_6488, RADIO_2208, RADIO_4408, RADIO_DOT];

    /// True when the fragment mentions any known radio product
    pub fn is_known(fragment: &str) -> bool {
        ALL.iter().any(|number| fragment.contains(number))
    }
}

impl DeviceType {
    pub const ALL: [DeviceType; 6] = [
        DeviceType::Radio2208,
        DeviceType::Radio4408,
        DeviceType::Radio6488,
        DeviceType::RadioDot,
        DeviceType::Nr4408,
        DeviceType::PassiveDas4408,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Radio2208 => "2208",
            DeviceType::Radio4408 => "4408",
            DeviceType::Radio6488 => "6488",
            DeviceType::RadioDot => "RadioDot",
            DeviceType::Nr4408 => "NR_4408",
            DeviceType::PassiveDas4408 => "PassiveDas_4408",
        }
    }

    /// Catalog number matched against hardware text. NR_4408 and PassiveDas_4408
    /// are derived types and never catalog-matched.
    pub fn catalog_number(&self) -> Option<&'static str> {
        match self {
            DeviceType::Radio2208 => Some(product_number::RADIO_2208),
            DeviceType::Radio4408 => Some(product_number::RADIO_4408),
            DeviceType::Radio6488 => Some(product_number::RADIO_6488),
            DeviceType::RadioDot => Some(product_number::RADIO_DOT),
            DeviceType::Nr4408 | DeviceType::PassiveDas4408 => None,
        }
    }

    /// Type whose candidate pool and group rules a selection draws from.
    /// PassiveDas_4408 nodes are ordinary 4408 nodes counted differently.
    pub fn pool_type(&self) -> DeviceType {
        match self {
            DeviceType::PassiveDas4408 => DeviceType::Radio4408,
            other => *other,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DeviceType::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| format!("Unknown device type: {}", trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_type() {
        assert_eq!("2208".parse::<DeviceType>(), Ok(DeviceType::Radio2208));
        assert_eq!("radiodot".parse::<DeviceType>(), Ok(DeviceType::RadioDot));
        assert_eq!(" NR_4408 ".parse::<DeviceType>(), Ok(DeviceType::Nr4408));
        assert_eq!(
            "PassiveDas_4408".parse::<DeviceType>(),
            Ok(DeviceType::PassiveDas4408)
        );
        assert!("4409".parse::<DeviceType>().is_err());
    }

    #[test]
    fn test_catalog_numbers() {
        assert_eq!(DeviceType::Radio4408.catalog_number(), Some("KRC 161 746/1"));
        assert_eq!(DeviceType::Nr4408.catalog_number(), None);
        assert_eq!(DeviceType::PassiveDas4408.catalog_number(), None);
        assert!(product_number::is_known("productNumber=KRY 901 385/1, productName=Dot"));
        assert!(!product_number::is_known("productNumber=KDU 137 925/31"));
    }

    #[test]
    fn test_pool_type() {
        assert_eq!(DeviceType::PassiveDas4408.pool_type(), DeviceType::Radio4408);
        assert_eq!(DeviceType::Radio6488.pool_type(), DeviceType::Radio6488);
    }
}
