//! Pluggable cost models for APTED (spec §4.1 "Cost models").
//!
//! A cost model is consulted only through the three pure functions of
//! [`CostModel`]; the algorithm treats it as a value, never mutating it or
//! branching on its concrete type (spec §9 "Cost model polymorphism").

use crate::tree::{Label, LabeledTree, NodeId};

/// Relative importance tiers used by the language-aware model to weigh
/// delete/insert cost (spec §4.1, "Delete/insert weighted by node importance").
fn importance(label: &Label) -> f64 {
    use crate::ast::AstNodeKind::*;
    match label.kind {
        If | For | AsyncFor | While | Try | With | AsyncWith | Function | AsyncFunction | Class => 3.0,
        Call | Assignment | BinaryOperator | UnaryOperator | BooleanOperator | Attribute => 2.0,
        _ => 1.0,
    }
}

/// Broad category used by the language-aware model's "same category is
/// cheaper than cross-category" rule.
fn category(label: &Label) -> u8 {
    use crate::ast::AstNodeKind::*;
    match label.kind {
        Module | Function | AsyncFunction | Class => 0,
        For | AsyncFor | While | If | Try | With | AsyncWith => 1,
        Assignment | Expression | Call | Attribute => 2,
        Name | Constant => 3,
        BinaryOperator | UnaryOperator | BooleanOperator => 4,
        Other => 5,
    }
}

/// A pluggable cost policy for rename/delete/insert, consulted by
/// [`crate::apted::distance`]. Implementations must be pure functions of
/// their inputs and cheaply `Clone`-able so parallel workers can share one
/// per candidate pair (spec §5 "Cost models are value-typed and shareable").
pub trait CostModel: Clone + Send + Sync {
    /// Cost of renaming node `a`'s label to node `b`'s label.
    fn rename_cost(&self, a: &Label, b: &Label) -> f64;
    /// Cost of deleting a node with this label from the source tree.
    fn delete_cost(&self, label: &Label) -> f64;
    /// Cost of inserting a node with this label into the target tree.
    fn insert_cost(&self, label: &Label) -> f64;
    /// Human-readable name, surfaced on [`crate::pipeline::ClonePair`] for
    /// reporting (SPEC_FULL.md §B.2).
    fn name(&self) -> &'static str;
}

/// Unit cost: rename is 0 iff labels are equal, 1 otherwise; delete/insert
/// always cost 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCostModel;

impl CostModel for DefaultCostModel {
    fn rename_cost(&self, a: &Label, b: &Label) -> f64 {
        if a == b {
            0.0
        } else {
            1.0
        }
    }

    fn delete_cost(&self, _label: &Label) -> f64 {
        1.0
    }

    fn insert_cost(&self, _label: &Label) -> f64 {
        1.0
    }

    fn name(&self) -> &'static str {
        "default"
    }
}

/// Rename cost depends on label category; identifier-only and literal-only
/// differences are cheap (optionally free); delete/insert is weighted by
/// node importance (spec §4.1).
#[derive(Debug, Clone, Copy)]
pub struct LanguageAwareCostModel {
    /// When true, a pair of `Name` labels differing only in identifier costs 0.
    pub ignore_identifiers: bool,
    /// When true, a pair of `Constant` labels differing only in value costs 0.
    pub ignore_literals: bool,
}

impl Default for LanguageAwareCostModel {
    fn default() -> Self {
        Self {
            ignore_identifiers: false,
            ignore_literals: false,
        }
    }
}

impl CostModel for LanguageAwareCostModel {
    fn rename_cost(&self, a: &Label, b: &Label) -> f64 {
        if a == b {
            return 0.0;
        }
        if a.differs_only_by_name(b) {
            return if self.ignore_identifiers { 0.0 } else { 0.3 };
        }
        if a.differs_only_by_value(b) {
            return if self.ignore_literals { 0.0 } else { 0.3 };
        }
        if category(a) == category(b) {
            0.7
        } else {
            1.0
        }
    }

    fn delete_cost(&self, label: &Label) -> f64 {
        importance(label)
    }

    fn insert_cost(&self, label: &Label) -> f64 {
        importance(label)
    }

    fn name(&self) -> &'static str {
        "language-aware"
    }
}

/// Wraps another cost model and scales its delete/insert/rename costs by
/// three independent factors (spec §4.1).
#[derive(Debug, Clone)]
pub struct WeightedCostModel<M: CostModel> {
    inner: M,
    rename_factor: f64,
    delete_factor: f64,
    insert_factor: f64,
}

impl<M: CostModel> WeightedCostModel<M> {
    /// Wrap `inner`, scaling its rename/delete/insert costs by the given factors.
    pub fn new(inner: M, rename_factor: f64, delete_factor: f64, insert_factor: f64) -> Self {
        Self {
            inner,
            rename_factor,
            delete_factor,
            insert_factor,
        }
    }
}

impl<M: CostModel> CostModel for WeightedCostModel<M> {
    fn rename_cost(&self, a: &Label, b: &Label) -> f64 {
        self.inner.rename_cost(a, b) * self.rename_factor
    }

    fn delete_cost(&self, label: &Label) -> f64 {
        self.inner.delete_cost(label) * self.delete_factor
    }

    fn insert_cost(&self, label: &Label) -> f64 {
        self.inner.insert_cost(label) * self.insert_factor
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

/// Runtime-selected cost model (spec §9 "Cost model polymorphism"): the
/// orchestrator resolves [`crate::config::CostModelKind`] to one concrete
/// variant once per run rather than threading a type parameter through the
/// whole pipeline.
#[derive(Debug, Clone)]
pub enum AnyCostModel {
    Default(DefaultCostModel),
    LanguageAware(LanguageAwareCostModel),
    Weighted(WeightedCostModel<LanguageAwareCostModel>),
}

impl CostModel for AnyCostModel {
    fn rename_cost(&self, a: &Label, b: &Label) -> f64 {
        match self {
            Self::Default(m) => m.rename_cost(a, b),
            Self::LanguageAware(m) => m.rename_cost(a, b),
            Self::Weighted(m) => m.rename_cost(a, b),
        }
    }

    fn delete_cost(&self, label: &Label) -> f64 {
        match self {
            Self::Default(m) => m.delete_cost(label),
            Self::LanguageAware(m) => m.delete_cost(label),
            Self::Weighted(m) => m.delete_cost(label),
        }
    }

    fn insert_cost(&self, label: &Label) -> f64 {
        match self {
            Self::Default(m) => m.insert_cost(label),
            Self::LanguageAware(m) => m.insert_cost(label),
            Self::Weighted(m) => m.insert_cost(label),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Default(m) => m.name(),
            Self::LanguageAware(m) => m.name(),
            Self::Weighted(m) => m.name(),
        }
    }
}

impl AnyCostModel {
    /// Resolve a [`crate::config::DetectionConfig`]'s cost-model selection
    /// into a concrete value (spec §4.1 "Cost models").
    pub fn from_config(config: &crate::config::DetectionConfig) -> Self {
        use crate::config::CostModelKind;
        let language_aware = LanguageAwareCostModel {
            ignore_identifiers: config.ignore_identifiers,
            ignore_literals: config.ignore_literals,
        };
        match config.cost_model {
            CostModelKind::Default => Self::Default(DefaultCostModel),
            CostModelKind::LanguageAware => Self::LanguageAware(language_aware),
            CostModelKind::Weighted => Self::Weighted(WeightedCostModel::new(
                language_aware,
                config.weighted_rename_factor,
                config.weighted_delete_factor,
                config.weighted_insert_factor,
            )),
        }
    }
}

/// Total cost of deleting every node of `tree` (used to normalize similarity,
/// spec §4.1 step 3).
pub fn total_delete_cost<M: CostModel>(model: &M, tree: &LabeledTree) -> f64 {
    (0..tree.len())
        .map(|id: NodeId| model.delete_cost(&tree.node(id).label))
        .sum()
}

/// Total cost of inserting every node of `tree` (used to normalize similarity,
/// spec §4.1 step 3, and as the empty-tree distance, spec §8 property 4).
pub fn total_insert_cost<M: CostModel>(model: &M, tree: &LabeledTree) -> f64 {
    (0..tree.len())
        .map(|id: NodeId| model.insert_cost(&tree.node(id).label))
        .sum()
}
