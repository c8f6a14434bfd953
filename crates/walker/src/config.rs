//! Resource bounds the walker enforces while enumerating paths and inlining
//! calls (§7 `ResourceBudget`). `contract-abstract-analyzer` owns the
//! user-facing config; this is the slice of it the walker itself needs.

#[derive(Clone, Copy, Debug)]
pub struct WalkerLimits {
    pub max_paths_per_function: usize,
    pub max_inline_depth: usize,
    /// Heuristic for catching exponential term explosion in the bitvector
    /// engine (§5): warn once a path's annotation store would outgrow this
    /// many bytes, estimated from entry count rather than sampled RSS.
    pub resident_set_warn_bytes: usize,
    /// Upper bound on a simplified bitmap term's node count, enforced by the
    /// `BitPatternEngine` this walker owns (§7 `ResourceBudget`).
    pub max_bitvector_term_nodes: usize,
}

impl Default for WalkerLimits {
    fn default() -> Self {
        Self { max_paths_per_function: 256, max_inline_depth: 16, resident_set_warn_bytes: 100 * 1024 * 1024, max_bitvector_term_nodes: 8192 }
    }
}
