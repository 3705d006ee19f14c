//! External AST input contract (spec §6).
//!
//! Source parsing is explicitly out of scope (spec §1). This module defines
//! the trait a collaborator implements over whatever AST representation it
//! already owns (a tree-sitter tree, a hand-rolled parser's node type, …) so
//! the fragment extractor (spec §4.2) can walk it uniformly.

use serde::{Deserialize, Serialize};

/// Closed vocabulary of node kinds the core must be able to distinguish
/// (spec §6). A collaborator's richer kind set maps down onto this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AstNodeKind {
    /// Module / compilation unit root.
    Module,
    /// Function definition.
    Function,
    /// Async function definition.
    AsyncFunction,
    /// Class definition.
    Class,
    /// For loop.
    For,
    /// Async for loop.
    AsyncFor,
    /// While loop.
    While,
    /// If statement.
    If,
    /// Try/except block.
    Try,
    /// With statement.
    With,
    /// Async with statement.
    AsyncWith,
    /// Assignment statement.
    Assignment,
    /// Expression statement.
    Expression,
    /// Function/method call.
    Call,
    /// Attribute access.
    Attribute,
    /// Identifier reference.
    Name,
    /// Literal constant.
    Constant,
    /// Binary operator expression.
    BinaryOperator,
    /// Unary operator expression.
    UnaryOperator,
    /// Boolean operator expression (`and`/`or`).
    BooleanOperator,
    /// Anything outside the closed vocabulary above; still walked and
    /// labeled, just not treated as a fragment-extraction candidate root.
    Other,
}

impl AstNodeKind {
    /// True for the statement kinds the fragment extractor treats as
    /// candidate subtree roots (spec §4.2).
    pub fn is_candidate_root(self) -> bool {
        matches!(
            self,
            AstNodeKind::Function
                | AstNodeKind::AsyncFunction
                | AstNodeKind::Class
                | AstNodeKind::For
                | AstNodeKind::AsyncFor
                | AstNodeKind::While
                | AstNodeKind::If
                | AstNodeKind::Try
                | AstNodeKind::With
                | AstNodeKind::AsyncWith
        )
    }

    /// True for a definition whose sole leading string-constant expression
    /// statement is eligible to be dropped under "skip docstrings" (spec §4.2).
    pub fn can_have_docstring(self) -> bool {
        matches!(
            self,
            AstNodeKind::Module | AstNodeKind::Function | AstNodeKind::AsyncFunction | AstNodeKind::Class
        )
    }
}

/// Half-open source span: `start` inclusive, `end` exclusive, 0-indexed lines
/// and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Starting line.
    pub start_line: usize,
    /// Starting column.
    pub start_col: usize,
    /// Ending line.
    pub end_line: usize,
    /// Ending column.
    pub end_col: usize,
}

impl SourceSpan {
    /// Number of source lines this span covers (inclusive of both endpoints'
    /// lines, matching how editors report a selection's line count).
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// A node in a collaborator-owned AST. Implementations expose the four
/// ordered child lists spec §6 requires; a collaborator that already unifies
/// them into one list may return empty slices for the unused fields as long
/// as overall child ordering is preserved in `primary_children`.
pub trait AstNode {
    /// The node's kind.
    fn kind(&self) -> AstNodeKind;
    /// An optional name (e.g. a function or class name).
    fn name(&self) -> Option<&str>;
    /// An optional literal value (for `Constant` nodes).
    fn value(&self) -> Option<&str>;
    /// An optional operator symbol (for operator nodes).
    fn operator(&self) -> Option<&str>;
    /// The node's source location.
    fn location(&self) -> SourceSpan;
    /// Primary (non-body) children, in source order.
    fn primary_children(&self) -> &[Self]
    where
        Self: Sized;
    /// The primary body (e.g. a function's statement list).
    fn body(&self) -> &[Self]
    where
        Self: Sized;
    /// The else-branch body, if any.
    fn orelse(&self) -> &[Self]
    where
        Self: Sized;
    /// The finally-branch body, if any.
    fn finalbody(&self) -> &[Self]
    where
        Self: Sized;
    /// Exception handlers, if any.
    fn handlers(&self) -> &[Self]
    where
        Self: Sized;
}
