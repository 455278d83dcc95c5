//! Cell and hardware inventory collection from cmedit query output.

pub mod cells;
pub mod hardware;

use regex_lite::Regex;

/// True when any line reports an error or zero instances
pub(crate) fn reports_no_instances(lines: &[String]) -> bool {
    match Regex::new(r"(?i)(error|^0\sinstance)") {
        Ok(re) => lines.iter().any(|line| re.is_match(line.trim())),
        Err(_) => false,
    }
}

/// Join the output, drop ':' and split it into per-FDN records.
/// Text before the first FDN marker is discarded.
pub(crate) fn split_records(lines: &[String]) -> Vec<String> {
    let joined = lines.join("\n").replace(':', "");
    joined
        .split("FDN")
        .skip(1)
        .map(|record| record.to_string())
        .collect()
}
