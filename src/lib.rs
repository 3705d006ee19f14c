//! # dupligraph: tree-edit-distance clone detection core
//!
//! A standalone Rust implementation of a structural clone-detection core,
//! built around three tightly coupled subsystems:
//!
//! - **APTED** ([`apted`]): exact weighted tree-edit distance between
//!   ordered labeled trees, under a pluggable cost model.
//! - **LSH candidate filter** ([`feature`], [`minhash`], [`lsh`]): structural
//!   feature extraction, MinHash signatures, and banded bucketing that
//!   avoids the quadratic blow-up of exhaustive pairwise comparison.
//! - **Pair-to-group aggregator** ([`grouping`]): five pluggable
//!   cluster-shape strategies over the retained clone-pair graph.
//!
//! [`pipeline::detect_clones`] and [`pipeline::detect_clones_with_lsh`] are
//! the two entry points that wire these subsystems together end to end.
//!
//! ## Architecture
//!
//! ```text
//! ASTs ──► Fragment Extractor ──► Tree Builder ──► APTED Preprocessor
//!                                        │
//!                        ┌───────────────┴───────────────┐
//!                        ▼                               ▼
//!                 Feature Extractor                 (direct path)
//!                        │
//!                   MinHash Hasher
//!                        │
//!                    LSH Index ────► Candidate Pairs ──► APTED Verifier ──► Clone Pairs ──► Group Aggregator ──► Clone Groups
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use dupligraph::config::DetectionConfig;
//! use dupligraph::fragment::extract_fragments;
//! use dupligraph::pipeline::detect_clones;
//! use tokio_util::sync::CancellationToken;
//!
//! # use dupligraph::ast::{AstNode, AstNodeKind, SourceSpan};
//! # struct Leaf(AstNodeKind);
//! # impl AstNode for Leaf {
//! #     fn kind(&self) -> AstNodeKind { self.0 }
//! #     fn name(&self) -> Option<&str> { None }
//! #     fn value(&self) -> Option<&str> { None }
//! #     fn operator(&self) -> Option<&str> { None }
//! #     fn location(&self) -> SourceSpan { SourceSpan { start_line: 0, start_col: 0, end_line: 6, end_col: 0 } }
//! #     fn primary_children(&self) -> &[Self] { &[] }
//! #     fn body(&self) -> &[Self] { &[] }
//! #     fn orelse(&self) -> &[Self] { &[] }
//! #     fn finalbody(&self) -> &[Self] { &[] }
//! #     fn handlers(&self) -> &[Self] { &[] }
//! # }
//! let config = DetectionConfig::default();
//! let ast = Leaf(AstNodeKind::Function);
//! let mut next_id = 0;
//! let fragments = extract_fragments(&ast, "example.py", &config, &mut next_id);
//! let cancel = CancellationToken::new();
//! let result = detect_clones(&fragments, &config, &cancel);
//! assert!(result.pairs.is_empty()); // a single fragment has nothing to pair with
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::suspicious)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

#[cfg(all(feature = "mimalloc", not(feature = "jemalloc")))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// The external AST input trait and supporting node/span types (SPEC_FULL.md §C.1).
pub mod ast;
/// Tree-edit-distance engine: cost models and the APTED algorithm (spec §4.1).
pub mod apted;
/// Clone pair and clone group data model (spec §3).
pub mod clone;
/// Configuration value object and validation (spec §6, SPEC_FULL.md §A.3).
pub mod config;
/// Error taxonomy (spec §7, SPEC_FULL.md §A.1).
pub mod error;
/// Structural feature extraction for MinHash (spec §4.3).
pub mod feature;
/// Fragment extraction from a collaborator-owned AST (spec §4.2).
pub mod fragment;
/// Pair-to-group aggregation strategies (spec §4.6).
pub mod grouping;
/// Banded LSH candidate index over MinHash signatures (spec §4.4).
pub mod lsh;
/// MinHash signatures and hash families (spec §4.3).
pub mod minhash;
/// Clone-detection orchestrator: the two public entry points (spec §4.5).
pub mod pipeline;
/// Ordered labeled trees and APTED preprocessing (spec §3, §4.1 step 1).
pub mod tree;

pub use apted::{classify_clone_type, compare, CloneType, ComparisonResult};
pub use ast::{AstNode, AstNodeKind, SourceSpan};
pub use clone::{CloneGroup, ClonePair, PairSource};
pub use config::DetectionConfig;
pub use error::{DupligraphError, Result};
pub use fragment::{extract_fragments, CodeFragment, SourceLocation};
pub use pipeline::{detect_clones, detect_clones_with_lsh, DetectionResult, DetectionStats};

/// Library version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
