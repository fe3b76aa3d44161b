//! Analysis-type table: names accepted by `wireshark_analyze` mapped to the
//! `tshark -z` statistics selectors they run.

/// Built-in analysis types, in the order they are listed to callers.
const STANDARD_TYPES: &[(&str, &str)] = &[
    ("conversations", "conv,ip"),
    ("endpoints", "endpoints,ip"),
    ("protocols", "io,phs"),
    ("http", "http,tree"),
    ("dns", "dns,tree"),
];

/// Closed, immutable mapping from analysis-type name to report selector.
///
/// Built once at startup and shared behind an `Arc`; there is no way to
/// mutate it after construction.
#[derive(Debug, Clone)]
pub struct AnalysisTable {
    entries: Vec<(String, String)>,
}

impl AnalysisTable {
    /// The standard table used by the server.
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_TYPES
                .iter()
                .map(|(name, selector)| (name.to_string(), selector.to_string()))
                .collect(),
        }
    }

    /// Look up the report selector for `name`.
    pub fn selector(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, selector)| selector.as_str())
    }

    /// All accepted names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AnalysisTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
