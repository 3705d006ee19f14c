//! Configuration types for the clone-detection core.
//!
//! [`DetectionConfig`] is the single value object collaborators construct and
//! pass into [`crate::pipeline::detect_clones`]. It owns every threshold and
//! performance knob named in the specification; nothing here reads a file or
//! an environment variable — that is a host-application concern.

pub mod validation;

use serde::{Deserialize, Serialize};

use crate::error::{DupligraphError, Result};
use validation::{validate_positive_f64, validate_positive_usize, validate_unit_range};

/// Which cost model a [`crate::apted`] computation should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostModelKind {
    /// Unit cost; rename is 0 iff labels are equal, 1 otherwise.
    Default,
    /// Rename/delete/insert costs depend on label category and node importance.
    LanguageAware,
    /// Wraps another model and scales delete/insert/rename costs.
    Weighted,
}

impl Default for CostModelKind {
    fn default() -> Self {
        Self::Default
    }
}

/// Which grouping strategy the aggregator should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupingMode {
    /// Union-find connected components over the similarity-threshold graph.
    ConnectedComponents,
    /// Connected components of the k-core residual subgraph.
    KCore,
    /// Agglomerative complete linkage.
    CompleteLinkage,
    /// Star/medoid iterative reassignment.
    StarMedoid,
    /// Centroid admission by per-type threshold.
    Centroid,
}

impl Default for GroupingMode {
    /// Connected components is the committed default (see SPEC_FULL.md §B.5):
    /// highest recall matches a first-run "show me everything" expectation.
    fn default() -> Self {
        Self::ConnectedComponents
    }
}

/// The four clone-type similarity thresholds, `τ1 > τ2 > τ3 > τ4`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeThresholds {
    /// Type-1 (identical) floor.
    pub tau1: f64,
    /// Type-2 (renamed) floor.
    pub tau2: f64,
    /// Type-3 (near-miss) floor.
    pub tau3: f64,
    /// Type-4 (semantic) floor.
    pub tau4: f64,
}

impl Default for TypeThresholds {
    fn default() -> Self {
        Self {
            tau1: 0.95,
            tau2: 0.85,
            tau3: 0.80,
            tau4: 0.75,
        }
    }
}

impl TypeThresholds {
    fn validate(&self) -> Result<()> {
        for (value, field) in [
            (self.tau1, "tau1"),
            (self.tau2, "tau2"),
            (self.tau3, "tau3"),
            (self.tau4, "tau4"),
        ] {
            validate_unit_range(value, field)?;
        }
        if !(self.tau1 > self.tau2 && self.tau2 > self.tau3 && self.tau3 > self.tau4) {
            return Err(DupligraphError::config_field(
                "clone-type thresholds must satisfy tau1 > tau2 > tau3 > tau4",
                "tau1..tau4",
            ));
        }
        Ok(())
    }
}

/// LSH parameters (spec §4.4, §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LshSettings {
    /// Number of bands `B`.
    pub bands: usize,
    /// Rows per band `r`.
    pub rows: usize,
    /// Total MinHash signature length `H` (defaults to `bands * rows`).
    pub min_hash_count: usize,
    /// Similarity pre-filter threshold; explicit value wins over auto-derivation
    /// (SPEC_FULL.md §B.4).
    pub similarity_threshold: f64,
    /// When true and `similarity_threshold` was left at its default, derive
    /// the threshold as `(1/B)^(1/r)` instead.
    pub auto_threshold: bool,
}

impl Default for LshSettings {
    fn default() -> Self {
        Self {
            bands: 32,
            rows: 4,
            min_hash_count: 128,
            similarity_threshold: 0.78,
            auto_threshold: false,
        }
    }
}

impl LshSettings {
    fn validate(&self) -> Result<()> {
        validate_positive_usize(self.bands, "lsh.bands")?;
        validate_positive_usize(self.rows, "lsh.rows")?;
        validate_positive_usize(self.min_hash_count, "lsh.min_hash_count")?;
        if self.bands * self.rows > self.min_hash_count {
            return Err(DupligraphError::config_field(
                "lsh.bands * lsh.rows must not exceed lsh.min_hash_count",
                "lsh.bands",
            ));
        }
        validate_unit_range(self.similarity_threshold, "lsh.similarity_threshold")?;
        Ok(())
    }

    /// Resolve the effective candidate pre-filter threshold (SPEC_FULL.md §B.4).
    pub fn effective_threshold(&self) -> f64 {
        if self.auto_threshold {
            (1.0 / self.bands as f64).powf(1.0 / self.rows as f64)
        } else {
            self.similarity_threshold
        }
    }
}

/// Batching knobs that bound peak memory during exhaustive candidate enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatchingSettings {
    /// Below this fragment count, process all pairs in a single pass.
    pub batch_size_threshold: usize,
    /// Batch size used for large projects.
    pub batch_size_large: usize,
    /// Batch size used for very large projects (`n > large_project_size`).
    pub batch_size_small: usize,
    /// Fragment-count threshold separating "large" from "very large" projects.
    pub large_project_size: usize,
}

impl Default for BatchingSettings {
    fn default() -> Self {
        Self {
            batch_size_threshold: 500,
            batch_size_large: 2_000,
            batch_size_small: 500,
            large_project_size: 5_000,
        }
    }
}

impl BatchingSettings {
    fn validate(&self) -> Result<()> {
        validate_positive_usize(self.batch_size_threshold, "batching.batch_size_threshold")?;
        validate_positive_usize(self.batch_size_large, "batching.batch_size_large")?;
        validate_positive_usize(self.batch_size_small, "batching.batch_size_small")?;
        validate_positive_usize(self.large_project_size, "batching.large_project_size")?;
        Ok(())
    }
}

/// The single configuration value object for a detection run (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum source line span for a fragment to be extracted.
    pub min_lines: usize,
    /// Minimum AST node count for a fragment to be extracted.
    pub min_nodes: usize,
    /// Clone-type similarity thresholds.
    pub thresholds: TypeThresholds,
    /// Reject pairs whose APTED distance exceeds this.
    pub max_edit_distance: f64,
    /// Which cost model APTED should use.
    pub cost_model: CostModelKind,
    /// Ignore identifier-only differences (language-aware cost model only).
    pub ignore_identifiers: bool,
    /// Ignore literal-only differences (language-aware cost model only).
    pub ignore_literals: bool,
    /// Rename-cost scale factor, `CostModelKind::Weighted` only.
    pub weighted_rename_factor: f64,
    /// Delete-cost scale factor, `CostModelKind::Weighted` only.
    pub weighted_delete_factor: f64,
    /// Insert-cost scale factor, `CostModelKind::Weighted` only.
    pub weighted_insert_factor: f64,
    /// Cap on retained clone pairs.
    pub max_clone_pairs: usize,
    /// Batching knobs.
    pub batching: BatchingSettings,
    /// Whether to route candidate generation through the LSH path.
    pub use_lsh: bool,
    /// LSH parameters.
    pub lsh: LshSettings,
    /// Which grouping strategy to run.
    pub grouping_mode: GroupingMode,
    /// Grouping similarity threshold `θ` (independent of the type thresholds).
    pub grouping_threshold: f64,
    /// `k` for the k-core grouping strategy.
    pub k_core_k: usize,
    /// Use the weighted-MinHash variant (SPEC_FULL.md §B.3) instead of the
    /// unweighted boolean feature-set MinHash.
    pub use_weighted_minhash: bool,
    /// MinHash hash-family seed (reproducibility, spec §9).
    pub minhash_seed: u64,
    /// Maximum subtree height for k-subtree features (spec §4.3).
    pub max_subtree_height: usize,
    /// k-gram length for pre-order label k-grams (spec §4.3).
    pub kgram_length: usize,
    /// Include literal values and structural tokens as features.
    pub include_literal_features: bool,
    /// Recursion-depth guard (spec §4.1 edge cases).
    pub max_recursion_depth: usize,
    /// Cancellation poll granularity: every k pair comparisons (exhaustive scan).
    pub cancellation_poll_pairs: usize,
    /// Cancellation poll granularity: every k fragments (LSH candidate iteration).
    pub cancellation_poll_fragments: usize,
    /// Drop the first body statement of a function/class/module when it is a
    /// single string-constant expression (spec §4.2).
    pub skip_docstrings: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_lines: 5,
            min_nodes: 10,
            thresholds: TypeThresholds::default(),
            max_edit_distance: 50.0,
            cost_model: CostModelKind::default(),
            ignore_identifiers: false,
            ignore_literals: false,
            weighted_rename_factor: 1.0,
            weighted_delete_factor: 1.0,
            weighted_insert_factor: 1.5,
            max_clone_pairs: 10_000,
            batching: BatchingSettings::default(),
            use_lsh: false,
            lsh: LshSettings::default(),
            grouping_mode: GroupingMode::default(),
            grouping_threshold: 0.80,
            k_core_k: 2,
            use_weighted_minhash: false,
            minhash_seed: 0x5EED_CAFE_D00D_1234,
            max_subtree_height: 3,
            kgram_length: 4,
            include_literal_features: true,
            max_recursion_depth: 1_000,
            cancellation_poll_pairs: 10,
            cancellation_poll_fragments: 5,
            skip_docstrings: true,
        }
    }
}

impl DetectionConfig {
    /// Validate the configuration, returning a descriptive [`DupligraphError`]
    /// on the first violation (spec §7, "invalid configuration").
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.min_lines, "min_lines")?;
        validate_positive_usize(self.min_nodes, "min_nodes")?;
        self.thresholds.validate()?;
        validate_positive_f64(self.max_edit_distance, "max_edit_distance")?;
        if self.cost_model == CostModelKind::Weighted {
            validate_positive_f64(self.weighted_rename_factor, "weighted_rename_factor")?;
            validate_positive_f64(self.weighted_delete_factor, "weighted_delete_factor")?;
            validate_positive_f64(self.weighted_insert_factor, "weighted_insert_factor")?;
        }
        validate_positive_usize(self.max_clone_pairs, "max_clone_pairs")?;
        self.batching.validate()?;
        if self.use_lsh {
            self.lsh.validate()?;
        }
        validate_unit_range(self.grouping_threshold, "grouping_threshold")?;
        validate_positive_usize(self.k_core_k, "k_core_k")?;
        validate_positive_usize(self.max_subtree_height, "max_subtree_height")?;
        validate_positive_usize(self.kgram_length, "kgram_length")?;
        validate_positive_usize(self.max_recursion_depth, "max_recursion_depth")?;
        validate_positive_usize(self.cancellation_poll_pairs, "cancellation_poll_pairs")?;
        validate_positive_usize(
            self.cancellation_poll_fragments,
            "cancellation_poll_fragments",
        )?;
        Ok(())
    }
}
