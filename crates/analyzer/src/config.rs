//! Resource-budget knobs (§3.1, §5, §7 `ResourceBudget`). Overridable from
//! the CLI's `clap` flags or a `contract-abstract.toml` file, read with
//! `serde`/`toml` the same shape-first way the rest of this workspace reads
//! its on-disk configuration.

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub max_paths_per_function: usize,
    pub max_inline_depth: usize,
    pub max_bitvector_term_nodes: usize,
    pub resident_set_warn_bytes: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_paths_per_function: 256,
            max_inline_depth: 16,
            max_bitvector_term_nodes: 8192,
            resident_set_warn_bytes: 100 * 1024 * 1024,
        }
    }
}

impl AnalyzerConfig {
    /// Parses a `contract-abstract.toml` document; keys left unset fall back
    /// to `Default::default()`.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub(crate) fn walker_limits(&self) -> contract_abstract_walker::WalkerLimits {
        contract_abstract_walker::WalkerLimits {
            max_paths_per_function: self.max_paths_per_function,
            max_inline_depth: self.max_inline_depth,
            resident_set_warn_bytes: self.resident_set_warn_bytes,
            max_bitvector_term_nodes: self.max_bitvector_term_nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg = AnalyzerConfig::from_toml_str("max_paths_per_function = 10").unwrap();
        assert_eq!(cfg.max_paths_per_function, 10);
        assert_eq!(cfg.max_inline_depth, AnalyzerConfig::default().max_inline_depth);
    }
}
