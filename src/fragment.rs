//! Fragment extraction (spec §4.2): walking a collaborator-owned AST to find
//! candidate clone-detection units.

use crate::ast::{AstNode, AstNodeKind, SourceSpan};
use crate::config::DetectionConfig;
use crate::tree::LabeledTree;

/// A location a fragment came from, for reporting (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    /// File path as given by the collaborator; opaque to this crate.
    pub file: String,
    /// Span within the file.
    pub span: SourceSpan,
}

/// An extracted candidate unit: its preprocessed tree plus where it came from.
#[derive(Debug, Clone)]
pub struct CodeFragment {
    /// Stable id within a single detection run (index into the extracted list).
    pub id: usize,
    /// Where the fragment came from.
    pub location: SourceLocation,
    /// The kind of the fragment's root node.
    pub root_kind: AstNodeKind,
    /// The preprocessed, APTED-ready tree.
    pub tree: LabeledTree,
    /// Optional complexity hint (spec §3): used only to weight detection
    /// confidence (SPEC_FULL.md §B.2 `confidence`), never to filter or rank.
    /// A collaborator that measures cyclomatic or cognitive complexity can
    /// attach it via [`Self::with_complexity`]; left `None` otherwise.
    pub complexity: Option<f64>,
}

impl CodeFragment {
    /// Attach a complexity hint to this fragment.
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = Some(complexity);
        self
    }
}

/// Walk `root` (one file's AST) and extract every candidate subtree that
/// clears the size filters, in source order (spec §4.2).
///
/// `next_id` is the id to assign the first fragment found; the caller should
/// pass the running count across files so ids stay unique within a run.
pub fn extract_fragments<T: AstNode>(
    root: &T,
    file: &str,
    config: &DetectionConfig,
    next_id: &mut usize,
) -> Vec<CodeFragment> {
    let mut fragments = Vec::new();
    walk(root, file, config, next_id, &mut fragments);
    fragments
}

fn walk<T: AstNode>(
    node: &T,
    file: &str,
    config: &DetectionConfig,
    next_id: &mut usize,
    out: &mut Vec<CodeFragment>,
) {
    if node.kind().is_candidate_root() {
        if let Some(fragment) = try_extract(node, file, config, next_id) {
            out.push(fragment);
        }
    }

    for group in [
        node.primary_children(),
        node.body(),
        node.orelse(),
        node.finalbody(),
        node.handlers(),
    ] {
        for child in group {
            walk(child, file, config, next_id, out);
        }
    }
}

fn try_extract<T: AstNode>(
    node: &T,
    file: &str,
    config: &DetectionConfig,
    next_id: &mut usize,
) -> Option<CodeFragment> {
    let span = node.location();
    if span.line_count() < config.min_lines {
        return None;
    }

    let tree = LabeledTree::build_with_options(node, config.max_recursion_depth, config.skip_docstrings);

    if tree.len() < config.min_nodes {
        return None;
    }

    let id = *next_id;
    *next_id += 1;

    Some(CodeFragment {
        id,
        location: SourceLocation {
            file: file.to_string(),
            span,
        },
        root_kind: node.kind(),
        tree,
        complexity: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::TestNode;

    fn config() -> DetectionConfig {
        DetectionConfig {
            min_lines: 1,
            min_nodes: 2,
            ..DetectionConfig::default()
        }
    }

    #[test]
    fn extracts_function_as_candidate_root() {
        let ast = TestNode::named(AstNodeKind::Function, "f")
            .with_children(vec![TestNode::named(AstNodeKind::Name, "a")]);
        let mut next_id = 0;
        let fragments = extract_fragments(&ast, "a.py", &config(), &mut next_id);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].root_kind, AstNodeKind::Function);
        assert_eq!(fragments[0].id, 0);
    }

    #[test]
    fn rejects_fragments_below_min_nodes() {
        let ast = TestNode::named(AstNodeKind::Function, "f");
        let mut next_id = 0;
        let mut cfg = config();
        cfg.min_nodes = 5;
        let fragments = extract_fragments(&ast, "a.py", &cfg, &mut next_id);
        assert!(fragments.is_empty());
    }

    #[test]
    fn ids_are_unique_across_nested_candidate_roots() {
        let ast = TestNode::named(AstNodeKind::Function, "outer").with_children(vec![TestNode::named(
            AstNodeKind::If,
            "cond",
        )
        .with_children(vec![
            TestNode::named(AstNodeKind::Name, "x"),
            TestNode::named(AstNodeKind::Name, "y"),
        ])]);
        let mut next_id = 0;
        let fragments = extract_fragments(&ast, "a.py", &config(), &mut next_id);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].id, 0);
        assert_eq!(fragments[1].id, 1);
    }
}
