//! End-to-end integration tests driving the public API: fragment extraction,
//! exhaustive and LSH detection paths, and every grouping strategy, against
//! small synthetic ASTs built directly with the public `AstNode` trait.

use dupligraph::ast::{AstNode, AstNodeKind, SourceSpan};
use dupligraph::config::{DetectionConfig, GroupingMode};
use dupligraph::fragment::extract_fragments;
use dupligraph::pipeline::{detect_clones, detect_clones_with_lsh};
use tokio_util::sync::CancellationToken;

/// A minimal in-memory AST node for integration tests, built the same way a
/// tree-sitter-backed adapter would: a closed-vocabulary kind plus the four
/// ordered child-list groups.
#[derive(Debug, Clone)]
struct FixtureNode {
    kind: AstNodeKind,
    name: Option<String>,
    span: SourceSpan,
    body: Vec<FixtureNode>,
}

impl FixtureNode {
    fn new(kind: AstNodeKind, name: &str, lines: usize, body: Vec<FixtureNode>) -> Self {
        Self {
            kind,
            name: Some(name.to_string()),
            span: SourceSpan {
                start_line: 0,
                start_col: 0,
                end_line: lines,
                end_col: 0,
            },
            body,
        }
    }

    fn leaf(kind: AstNodeKind, name: &str) -> Self {
        Self {
            kind,
            name: Some(name.to_string()),
            span: SourceSpan {
                start_line: 0,
                start_col: 0,
                end_line: 0,
                end_col: 0,
            },
            body: Vec::new(),
        }
    }
}

impl AstNode for FixtureNode {
    fn kind(&self) -> AstNodeKind {
        self.kind
    }
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    fn value(&self) -> Option<&str> {
        None
    }
    fn operator(&self) -> Option<&str> {
        None
    }
    fn location(&self) -> SourceSpan {
        self.span
    }
    fn primary_children(&self) -> &[Self] {
        &[]
    }
    fn body(&self) -> &[Self] {
        &self.body
    }
    fn orelse(&self) -> &[Self] {
        &[]
    }
    fn finalbody(&self) -> &[Self] {
        &[]
    }
    fn handlers(&self) -> &[Self] {
        &[]
    }
}

/// A function with a short sequence of near-identical statements, used twice
/// under different names so the only difference between two fragments is the
/// function name and the leaf identifiers' values.
fn order_processing_function(fn_name: &str, var_prefix: &str) -> FixtureNode {
    FixtureNode::new(
        AstNodeKind::Function,
        fn_name,
        8,
        vec![
            FixtureNode::leaf(AstNodeKind::Assignment, &format!("{var_prefix}_total")),
            FixtureNode::leaf(AstNodeKind::Assignment, &format!("{var_prefix}_tax")),
            FixtureNode::new(
                AstNodeKind::If,
                "discount_check",
                3,
                vec![FixtureNode::leaf(AstNodeKind::Call, &format!("{var_prefix}_apply"))],
            ),
            FixtureNode::leaf(AstNodeKind::Call, &format!("{var_prefix}_log")),
        ],
    )
}

fn lax_config() -> DetectionConfig {
    DetectionConfig {
        min_lines: 1,
        min_nodes: 1,
        ..DetectionConfig::default()
    }
}

#[test]
fn extract_fragments_descends_into_if_body() {
    let module = order_processing_function("process_order", "order");
    let config = lax_config();
    let mut next_id = 0;
    let fragments = extract_fragments(&module, "orders.py", &config, &mut next_id);

    // Both the function itself and the nested `if` clear the size filters.
    assert!(fragments.iter().any(|f| f.root_kind == AstNodeKind::Function));
    assert!(fragments.iter().any(|f| f.root_kind == AstNodeKind::If));
}

#[test]
fn near_identical_functions_in_different_files_form_a_type1_clone_group() {
    let config = lax_config();
    let mut next_id = 0;

    let a = order_processing_function("process_order", "order");
    let b = order_processing_function("handle_order", "order");

    let mut fragments = extract_fragments(&a, "orders.py", &config, &mut next_id);
    fragments.extend(extract_fragments(&b, "billing.py", &config, &mut next_id));

    let cancel = CancellationToken::new();
    let result = detect_clones(&fragments, &config, &cancel);

    assert!(!result.pairs.is_empty(), "expected at least one clone pair");
    let top = &result.pairs[0];
    assert!(top.similarity >= 0.9, "similarity was {}", top.similarity);
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].fragment_ids.len(), 2);
}

#[test]
fn unrelated_fragments_produce_no_pairs_or_groups() {
    let config = lax_config();
    let mut next_id = 0;

    let a = order_processing_function("process_order", "order");
    let b = FixtureNode::new(
        AstNodeKind::Class,
        "UnrelatedWidget",
        6,
        vec![
            FixtureNode::leaf(AstNodeKind::Name, "alpha"),
            FixtureNode::leaf(AstNodeKind::Name, "beta"),
        ],
    );

    let mut fragments = extract_fragments(&a, "orders.py", &config, &mut next_id);
    fragments.extend(extract_fragments(&b, "widgets.py", &config, &mut next_id));

    let cancel = CancellationToken::new();
    let result = detect_clones(&fragments, &config, &cancel);

    assert!(result.pairs.is_empty());
    assert!(result.groups.is_empty());
}

#[test]
fn lsh_path_recovers_the_same_clone_as_exhaustive_search() {
    let mut config = lax_config();
    config.use_lsh = true;
    config.lsh.bands = 8;
    config.lsh.rows = 2;
    config.lsh.min_hash_count = 16;
    let mut next_id = 0;

    let a = order_processing_function("process_order", "order");
    let b = order_processing_function("handle_order", "order");
    let mut fragments = extract_fragments(&a, "orders.py", &config, &mut next_id);
    fragments.extend(extract_fragments(&b, "billing.py", &config, &mut next_id));

    let cancel = CancellationToken::new();
    let exhaustive = detect_clones(&fragments, &config, &cancel);
    let lsh = detect_clones_with_lsh(&fragments, &config, &cancel);

    assert_eq!(exhaustive.pairs.len(), lsh.pairs.len());
    assert_eq!(exhaustive.groups.len(), lsh.groups.len());
}

#[test]
fn every_grouping_strategy_runs_end_to_end_on_a_clique() {
    let config_base = lax_config();
    let mut next_id = 0;

    let fns = vec![
        order_processing_function("process_order", "order"),
        order_processing_function("handle_order", "order"),
        order_processing_function("run_order", "order"),
    ];
    let mut fragments = Vec::new();
    for (i, f) in fns.iter().enumerate() {
        fragments.extend(extract_fragments(f, &format!("f{i}.py"), &config_base, &mut next_id));
    }

    let cancel = CancellationToken::new();
    for mode in [
        GroupingMode::ConnectedComponents,
        GroupingMode::KCore,
        GroupingMode::CompleteLinkage,
        GroupingMode::StarMedoid,
        GroupingMode::Centroid,
    ] {
        let mut config = config_base.clone();
        config.grouping_mode = mode;
        let result = detect_clones(&fragments, &config, &cancel);
        assert!(
            !result.groups.is_empty(),
            "grouping mode {mode:?} produced no groups for a near-clique of function fragments"
        );
        for group in &result.groups {
            assert!(group.fragment_ids.len() >= 2);
        }
    }
}

#[test]
fn determinism_across_repeated_runs_with_the_same_config() {
    let config = lax_config();
    let mut next_id = 0;
    let a = order_processing_function("process_order", "order");
    let b = order_processing_function("handle_order", "order");
    let mut fragments = extract_fragments(&a, "orders.py", &config, &mut next_id);
    fragments.extend(extract_fragments(&b, "billing.py", &config, &mut next_id));

    let cancel = CancellationToken::new();
    let first = detect_clones(&fragments, &config, &cancel);
    let second = detect_clones(&fragments, &config, &cancel);

    assert_eq!(first.pairs.len(), second.pairs.len());
    for (p1, p2) in first.pairs.iter().zip(second.pairs.iter()) {
        assert_eq!(p1.fragment_a_id, p2.fragment_a_id);
        assert_eq!(p1.fragment_b_id, p2.fragment_b_id);
        assert!((p1.similarity - p2.similarity).abs() < 1e-12);
    }
}

#[test]
fn retained_pairs_respect_the_max_clone_pairs_cap() {
    let mut config = lax_config();
    config.max_clone_pairs = 3;
    let mut next_id = 0;

    let mut fragments = Vec::new();
    for i in 0..6 {
        let f = order_processing_function(&format!("order_variant_{i}"), "order");
        fragments.extend(extract_fragments(&f, &format!("f{i}.py"), &config, &mut next_id));
    }

    let cancel = CancellationToken::new();
    let result = detect_clones(&fragments, &config, &cancel);
    assert!(result.pairs.len() <= 3);
}

#[test]
fn cancelling_before_detection_yields_an_empty_result() {
    let config = lax_config();
    let mut next_id = 0;
    let a = order_processing_function("process_order", "order");
    let b = order_processing_function("handle_order", "order");
    let mut fragments = extract_fragments(&a, "orders.py", &config, &mut next_id);
    fragments.extend(extract_fragments(&b, "billing.py", &config, &mut next_id));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = detect_clones(&fragments, &config, &cancel);
    assert!(result.pairs.is_empty());
    assert!(result.groups.is_empty());
}

#[test]
fn invalid_configuration_is_rejected_at_construction_time() {
    let mut config = DetectionConfig::default();
    config.thresholds.tau1 = 0.5;
    config.thresholds.tau2 = 0.9;
    assert!(config.validate().is_err());
}
