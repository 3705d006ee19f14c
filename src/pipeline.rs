//! Clone detection orchestrator (spec §4.5): fragment preprocessing,
//! candidate enumeration (exhaustive or LSH), pair verification, bounded
//! priority retention, finalisation, and grouping dispatch.

use std::collections::HashSet;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::apted::cost::AnyCostModel;
use crate::apted;
use crate::clone::{ClonePair, PairSource};
use crate::config::DetectionConfig;
use crate::feature;
use crate::fragment::CodeFragment;
use crate::grouping;
use crate::lsh::LshIndex;
use crate::minhash::{MinHashFamily, MinHashSignature, WeightedMinHash};

/// Per-run summary statistics (SPEC_FULL.md §B.1).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct DetectionStats {
    /// Number of fragments submitted to the run.
    pub total_fragments: usize,
    /// Number of clone pairs retained.
    pub total_pairs: usize,
    /// Number of clone groups emitted.
    pub total_groups: usize,
    /// Retained pair count per clone type, indexed `[Type1, Type2, Type3, Type4]`.
    pub pairs_by_type: [usize; 4],
    /// Arithmetic mean similarity over retained pairs.
    pub average_similarity: f64,
}

impl DetectionStats {
    fn compute(total_fragments: usize, pairs: &[ClonePair], groups: &[crate::clone::CloneGroup]) -> Self {
        let mut pairs_by_type = [0usize; 4];
        for pair in pairs {
            pairs_by_type[clone_type_index(pair.clone_type)] += 1;
        }
        let average_similarity = if pairs.is_empty() {
            0.0
        } else {
            pairs.iter().map(|p| p.similarity).sum::<f64>() / pairs.len() as f64
        };
        Self {
            total_fragments,
            total_pairs: pairs.len(),
            total_groups: groups.len(),
            pairs_by_type,
            average_similarity,
        }
    }
}

fn clone_type_index(clone_type: apted::CloneType) -> usize {
    match clone_type {
        apted::CloneType::Type1 => 0,
        apted::CloneType::Type2 => 1,
        apted::CloneType::Type3 => 2,
        apted::CloneType::Type4 => 3,
    }
}

/// The full result of a detection run (spec §6).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DetectionResult {
    /// Retained clone pairs, sorted by descending similarity.
    pub pairs: Vec<ClonePair>,
    /// Clone groups emitted by the configured grouping strategy.
    pub groups: Vec<crate::clone::CloneGroup>,
    /// Summary statistics (spec §6 "An optional statistics map").
    pub stats: DetectionStats,
}

/// Run clone detection over `fragments` via exhaustive pairwise enumeration
/// (spec §4.5, `DetectClones`).
pub fn detect_clones(
    fragments: &[CodeFragment],
    config: &DetectionConfig,
    cancel: &CancellationToken,
) -> DetectionResult {
    run(fragments, config, cancel, false)
}

/// Run clone detection over `fragments` via the LSH candidate path (spec
/// §4.5, `DetectClonesWithLSH`).
pub fn detect_clones_with_lsh(
    fragments: &[CodeFragment],
    config: &DetectionConfig,
    cancel: &CancellationToken,
) -> DetectionResult {
    run(fragments, config, cancel, true)
}

fn run(
    fragments: &[CodeFragment],
    config: &DetectionConfig,
    cancel: &CancellationToken,
    use_lsh: bool,
) -> DetectionResult {
    let span = tracing::info_span!("detect_clones", fragments = fragments.len(), use_lsh);
    let _guard = span.enter();

    // Suspension point (i): before tree preprocessing. Fragments arrive
    // already preprocessed (`CodeFragment::tree` is APTED-ready), so this is
    // purely a cancellation check.
    if cancel.is_cancelled() {
        return empty_result(fragments.len());
    }

    // Degenerate fragments (spec §7 "Degenerate fragment"): a zero-node tree
    // cannot ever be a verified clone, so excluding it up front saves every
    // downstream stage from special-casing it.
    let usable: Vec<&CodeFragment> = fragments.iter().filter(|f| f.tree.len() > 0).collect();

    // Suspension point (ii): before pair enumeration.
    if cancel.is_cancelled() {
        return empty_result(fragments.len());
    }

    let candidates = if use_lsh {
        enumerate_candidates_lsh(&usable, config, cancel)
    } else {
        enumerate_candidates_exhaustive(&usable, config, cancel)
    };

    let Some(candidates) = candidates else {
        tracing::warn!("cancellation observed during candidate enumeration");
        return empty_result(fragments.len());
    };

    let cost_model = AnyCostModel::from_config(config);
    let pairs = verify_and_rank(&usable, candidates, config, &cost_model, cancel);

    // Suspension point (vi): before grouping.
    if cancel.is_cancelled() {
        tracing::warn!("cancellation observed before grouping; returning pairs with no groups");
        let stats = DetectionStats::compute(fragments.len(), &pairs, &[]);
        return DetectionResult {
            pairs,
            groups: Vec::new(),
            stats,
        };
    }

    let groups = grouping::group_clones(&pairs, config);
    let stats = DetectionStats::compute(fragments.len(), &pairs, &groups);

    tracing::info!(
        pairs = stats.total_pairs,
        groups = stats.total_groups,
        average_similarity = stats.average_similarity,
        "detection run complete"
    );

    DetectionResult { pairs, groups, stats }
}

fn empty_result(total_fragments: usize) -> DetectionResult {
    DetectionResult {
        pairs: Vec::new(),
        groups: Vec::new(),
        stats: DetectionStats {
            total_fragments,
            ..DetectionStats::default()
        },
    }
}

/// An unordered index pair into the `usable` fragment slice, `a < b`.
type CandidatePair = (usize, usize);

/// Exhaustive enumeration (spec §4.5 step 2 "Exhaustive path"), batched to
/// bound peak memory on large fragment sets. Polls cancellation every
/// `cancellation_poll_pairs` comparisons and at every batch boundary.
fn enumerate_candidates_exhaustive(
    usable: &[&CodeFragment],
    config: &DetectionConfig,
    cancel: &CancellationToken,
) -> Option<Vec<CandidatePair>> {
    let n = usable.len();
    let batch_size = batch_size_for(n, config);

    let mut candidates = Vec::new();
    let mut seen_since_poll = 0usize;

    let mut i = 0;
    while i < n {
        // Suspension point (iv): start of every batch.
        if cancel.is_cancelled() {
            return None;
        }
        let batch_end = (i + batch_size).min(n);
        tracing::debug!(batch_start = i, batch_end, "exhaustive batch");

        for a in i..batch_end {
            for b in (a + 1)..n {
                candidates.push((a, b));
                seen_since_poll += 1;
                // Suspension point (iii): every k pair comparisons.
                if seen_since_poll >= config.cancellation_poll_pairs {
                    seen_since_poll = 0;
                    if cancel.is_cancelled() {
                        return None;
                    }
                }
            }
        }
        i = batch_end;
    }

    Some(candidates)
}

fn batch_size_for(n: usize, config: &DetectionConfig) -> usize {
    let b = &config.batching;
    if n <= b.batch_size_threshold {
        n.max(1)
    } else if n > b.large_project_size {
        b.batch_size_small
    } else {
        b.batch_size_large
    }
}

/// LSH candidate path (spec §4.5 step 2 "LSH path"): build an index over
/// per-fragment MinHash signatures, then union every fragment's candidate
/// set into a deduplicated unordered pair list, optionally pre-filtered by
/// estimated Jaccard similarity.
///
/// Per spec §7 "LSH initialisation failure": if feature extraction yields no
/// usable signatures at all, fall back to the exhaustive path.
fn enumerate_candidates_lsh(
    usable: &[&CodeFragment],
    config: &DetectionConfig,
    cancel: &CancellationToken,
) -> Option<Vec<CandidatePair>> {
    let signatures = build_signatures(usable, config);
    if signatures.iter().all(Option::is_none) {
        tracing::warn!("LSH signature construction failed for every fragment; falling back to exhaustive path");
        return enumerate_candidates_exhaustive(usable, config, cancel);
    }

    let mut index = LshIndex::new(config.lsh.bands, config.lsh.rows);
    for (local_idx, signature) in signatures.iter().enumerate() {
        if let Some(sig) = signature {
            index.add(local_idx, sig.clone());
        }
    }
    index.build();

    let threshold = config.lsh.effective_threshold();
    let mut pairs: HashSet<CandidatePair> = HashSet::new();
    let mut seen_since_poll = 0usize;

    for local_idx in 0..usable.len() {
        seen_since_poll += 1;
        // Suspension point (v): every k fragments during LSH candidate iteration.
        if seen_since_poll >= config.cancellation_poll_fragments {
            seen_since_poll = 0;
            if cancel.is_cancelled() {
                return None;
            }
        }

        let Some(sig) = &signatures[local_idx] else {
            continue;
        };
        for other in index.find_candidates(sig, Some(local_idx)) {
            let Some(other_sig) = &signatures[other] else {
                continue;
            };
            if sig.estimated_jaccard(other_sig) < threshold {
                continue;
            }
            let key = if local_idx < other {
                (local_idx, other)
            } else {
                (other, local_idx)
            };
            pairs.insert(key);
        }
    }

    Some(pairs.into_iter().collect())
}

fn build_signatures(usable: &[&CodeFragment], config: &DetectionConfig) -> Vec<Option<MinHashSignature>> {
    if config.use_weighted_minhash {
        let family = WeightedMinHash::new(config.lsh.min_hash_count, config.minhash_seed);
        usable
            .iter()
            .map(|fragment| {
                let weighted = feature::extract_weighted_features(&fragment.tree, config);
                if weighted.is_empty() {
                    None
                } else {
                    Some(family.compute_signature(&weighted))
                }
            })
            .collect()
    } else {
        let family = MinHashFamily::new(config.lsh.min_hash_count, config.minhash_seed);
        usable
            .iter()
            .map(|fragment| {
                let features = feature::extract_features(&fragment.tree, config);
                if features.is_empty() {
                    None
                } else {
                    Some(family.compute_signature(&features))
                }
            })
            .collect()
    }
}

/// Pair verification (spec §4.5 step 3), confidence (step 4), and bounded
/// priority retention + finalisation (steps 5–6), run in parallel over the
/// candidate list (spec §5 "embarrassingly parallel").
fn verify_and_rank(
    usable: &[&CodeFragment],
    candidates: Vec<CandidatePair>,
    config: &DetectionConfig,
    cost_model: &AnyCostModel,
    cancel: &CancellationToken,
) -> Vec<ClonePair> {
    if cancel.is_cancelled() {
        return Vec::new();
    }

    let mut retained: Vec<ClonePair> = candidates
        .par_iter()
        .filter_map(|&(a, b)| verify_pair(usable[a], usable[b], config, cost_model))
        .collect();

    // Bounded priority retention (spec §4.5 step 5): cap at `max_clone_pairs`,
    // keeping the highest-similarity pairs. A single sort-and-truncate after
    // the parallel verification pass is equivalent to incremental eviction
    // since nothing downstream depends on insertion order.
    retained.sort_by(ClonePair::ranking_cmp);
    retained.truncate(config.max_clone_pairs);
    retained
}

/// Verify one candidate pair against the size filter, APTED distance, and
/// clone-type classification (spec §4.5 step 3), computing confidence (step
/// 4) for any pair that is retained.
fn verify_pair(
    a: &CodeFragment,
    b: &CodeFragment,
    config: &DetectionConfig,
    cost_model: &AnyCostModel,
) -> Option<ClonePair> {
    if a.location == b.location {
        return None;
    }

    let size_a = a.tree.len();
    let size_b = b.tree.len();
    if !size_filter_passes(size_a, size_b, &a.location, &b.location) {
        return None;
    }

    let comparison = apted::compare(&a.tree, &b.tree, cost_model, &config.thresholds);
    let distance = comparison.distance;
    let similarity = comparison.similarity;
    let clone_type = comparison.clone_type?;
    if distance > config.max_edit_distance {
        return None;
    }
    if size_a.min(size_b) < config.min_nodes {
        return None;
    }

    let mean_size = (size_a + size_b) as f64 / 2.0;
    let complexity_ratio = match (a.complexity, b.complexity) {
        (Some(c1), Some(c2)) if c1 > 0.0 && c2 > 0.0 => c1.min(c2) / c1.max(c2),
        _ => 0.0,
    };
    let confidence = (similarity + (mean_size / 100.0).min(0.2) + complexity_ratio * 0.1).clamp(0.0, 1.0);

    Some(ClonePair {
        fragment_a_id: a.id,
        fragment_b_id: b.id,
        location_a: a.location.clone(),
        location_b: b.location.clone(),
        size_a,
        size_b,
        distance,
        similarity,
        clone_type,
        confidence,
        cost_model_name: cost_model.name(),
        source: PairSource::Exhaustive,
    })
}

/// Coarse size filter (spec §4.5 step 3): reject when absolute node-count
/// difference exceeds 50% of the mean size, or when line-count difference
/// exceeds 50% of either endpoint's line count.
fn size_filter_passes(
    size_a: usize,
    size_b: usize,
    loc_a: &crate::fragment::SourceLocation,
    loc_b: &crate::fragment::SourceLocation,
) -> bool {
    let mean_size = (size_a + size_b) as f64 / 2.0;
    if mean_size > 0.0 {
        let size_diff = (size_a as f64 - size_b as f64).abs();
        if size_diff > 0.5 * mean_size {
            return false;
        }
    }

    let lines_a = loc_a.span.line_count() as f64;
    let lines_b = loc_b.span.line_count() as f64;
    let line_diff = (lines_a - lines_b).abs();
    if lines_a > 0.0 && line_diff > 0.5 * lines_a {
        return false;
    }
    if lines_b > 0.0 && line_diff > 0.5 * lines_b {
        return false;
    }
    true
}
