//! MinHash signatures over AST feature bags (spec §4.3, "MinHash").
//!
//! Each of the `H` hash functions is a universal hash `(a_i * base + b_i) mod
//! p` over a fixed large prime `p`; the `(a_i, b_i)` family is generated from
//! a single seed with a splitmix64 stream so the whole family — and every
//! signature derived from it — is reproducible across runs and processes
//! (spec §9 "Randomness").

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::feature::{FeatureSet, WeightedFeatureSet};

/// Mersenne prime `2^61 - 1`, large enough that `a_i * base` does not wrap
/// before the modulo reduction for any `u64` `base` when using `u128`
/// intermediate arithmetic.
const MERSENNE_PRIME_61: u64 = (1u64 << 61) - 1;

/// A MinHash signature: `H` unsigned 64-bit minima (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinHashSignature(pub Vec<u64>);

impl MinHashSignature {
    /// Estimated Jaccard similarity: the fraction of positions that agree
    /// (spec §4.3). Signatures of differing length are never produced by the
    /// same [`MinHashFamily`] and are treated as maximally dissimilar.
    pub fn estimated_jaccard(&self, other: &Self) -> f64 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }
        let agree = self.0.iter().zip(other.0.iter()).filter(|(a, b)| a == b).count();
        agree as f64 / self.0.len() as f64
    }

    /// Length of the signature (`H`).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True iff the signature has no positions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A reproducible family of `H` universal hash functions (spec §4.3,
/// "reproducible from a fixed seed").
#[derive(Debug, Clone)]
pub struct MinHashFamily {
    params: Vec<(u64, u64)>,
}

impl MinHashFamily {
    /// Build a family of `count` hash functions from `seed`.
    pub fn new(count: usize, seed: u64) -> Self {
        let mut state = seed;
        let mut params = Vec::with_capacity(count);
        for _ in 0..count {
            let a = splitmix64(&mut state) % (MERSENNE_PRIME_61 - 1) + 1;
            let b = splitmix64(&mut state) % MERSENNE_PRIME_61;
            params.push((a, b));
        }
        Self { params }
    }

    /// Number of hash functions in the family (`H`).
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True iff the family is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Compute the unweighted MinHash signature over `features` (spec §4.3).
    /// An empty feature set yields an all-maximum signature.
    pub fn compute_signature(&self, features: &FeatureSet) -> MinHashSignature {
        let mut signature = vec![u64::MAX; self.params.len()];
        for feature in features {
            let base = base_hash(feature);
            for (i, &(a, b)) in self.params.iter().enumerate() {
                let h = universal_hash(a, b, base);
                if h < signature[i] {
                    signature[i] = h;
                }
            }
        }
        MinHashSignature(signature)
    }
}

/// Occurrence-weighted MinHash (SPEC_FULL.md §B.3): a feature occurring more
/// often in a fragment is more likely to win the minimum, biasing the
/// signature (and hence estimated similarity) toward heavily-repeated
/// structure rather than treating every distinct feature equally.
#[derive(Debug, Clone)]
pub struct WeightedMinHash {
    family: MinHashFamily,
}

impl WeightedMinHash {
    /// Build a weighted MinHash over the same kind of reproducible family as
    /// [`MinHashFamily`].
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            family: MinHashFamily::new(count, seed),
        }
    }

    /// Compute a weighted signature: each feature's hash is scaled down by
    /// its occurrence weight before taking the minimum, so higher-weight
    /// features are more likely to set the signature position.
    pub fn compute_signature(&self, features: &WeightedFeatureSet) -> MinHashSignature {
        let mut signature = vec![u64::MAX; self.family.params.len()];
        for (feature, &weight) in features {
            if weight <= 0.0 {
                continue;
            }
            let base = base_hash(feature);
            for (i, &(a, b)) in self.family.params.iter().enumerate() {
                let h = universal_hash(a, b, base);
                let scaled = ((h as f64) / weight) as u64;
                if scaled < signature[i] {
                    signature[i] = scaled;
                }
            }
        }
        MinHashSignature(signature)
    }
}

fn base_hash(feature: &str) -> u64 {
    let mut hasher = Xxh3::new();
    feature.hash(&mut hasher);
    hasher.finish()
}

fn universal_hash(a: u64, b: u64, base: u64) -> u64 {
    let product = (a as u128) * (base as u128) + (b as u128);
    (product % MERSENNE_PRIME_61 as u128) as u64
}

/// A small, dependency-free splitmix64 step, used only to deterministically
/// expand the single MinHash seed into `2*H` hash-family parameters.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
