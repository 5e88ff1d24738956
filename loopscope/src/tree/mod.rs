//! Arena-backed syntax tree for Python modules.
//!
//! The tree is lowered from the ruff AST into a flat arena of [`Node`]s
//! addressed by [`NodeId`]. Nodes never hold references to their parents;
//! passes that need upward navigation build a [`parents::ParentIndex`].
//!
//! Every node remembers where it came from (see [`Origin`]) so the printer in
//! [`codegen`] can reproduce untouched code byte for byte.

pub mod codegen;
pub mod dump;
mod lower;
pub mod ops;
pub mod parents;

use compact_str::CompactString;
use ruff_python_ast::Operator;
use ruff_text_size::{TextRange, TextSize};
use smallvec::{smallvec, SmallVec};

use crate::error::ParseError;

/// Index of a node inside a [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// 1-based line.
    pub line: usize,
    /// 0-based byte column.
    pub column: usize,
}

/// Where the text of a node comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Node and all descendants still match `range` in the original source.
    Source(TextRange),
    /// Original node whose descendants were changed by a rewrite.
    Edited(TextRange),
    /// Statement built by a rewrite in place of the statement at the range.
    Replacement(TextRange),
    /// Node built by a rewrite rule.
    Synthesized,
}

impl Origin {
    /// Original source range, if the node's text comes from one.
    #[must_use]
    pub fn range(self) -> Option<TextRange> {
        match self {
            Origin::Source(range) | Origin::Edited(range) => Some(range),
            Origin::Replacement(_) | Origin::Synthesized => None,
        }
    }

    /// Range whose surrounding comments and blank lines belong to the node.
    #[must_use]
    pub fn anchor(self) -> Option<TextRange> {
        match self {
            Origin::Source(range) | Origin::Edited(range) | Origin::Replacement(range) => {
                Some(range)
            }
            Origin::Synthesized => None,
        }
    }
}

/// A single tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// What the node is.
    pub kind: NodeKind,
    /// Where its text comes from.
    pub origin: Origin,
    /// Position in the original source, or of the node it replaced.
    pub location: Location,
}

/// Child list for nodes with few children.
pub type Children = SmallVec<[NodeId; 4]>;

/// Closed set of node kinds the engine distinguishes.
///
/// Statements and expressions the engine never inspects are folded into
/// [`NodeKind::Block`], [`NodeKind::Simple`] and [`NodeKind::Expr`], which
/// keep their children for traversal and print from source.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Module root.
    Module { body: Vec<NodeId> },
    /// `for` / `async for` loop.
    Loop(LoopNode),
    /// Compound statement other than `for`.
    Block(BlockNode),
    /// `a = b = value`.
    Assign { targets: Vec<NodeId>, value: NodeId },
    /// `target op= value`.
    AugAssign {
        target: NodeId,
        op: Operator,
        value: NodeId,
    },
    /// `import a.b as c, d`.
    Import { names: Vec<Alias> },
    /// `from .a import b as c`.
    ImportFrom {
        module: Option<CompactString>,
        names: Vec<Alias>,
        level: u32,
    },
    /// Expression statement.
    ExprStmt { value: NodeId },
    /// `return [value]`.
    Return { value: Option<NodeId> },
    /// `break`.
    Break,
    /// `continue`.
    Continue,
    /// `pass`.
    Pass,
    /// Any other simple statement.
    Simple { children: Children },
    /// `left op right`.
    BinOp {
        left: NodeId,
        op: Operator,
        right: NodeId,
    },
    /// `value[slice]`.
    Subscript { value: NodeId, slice: NodeId },
    /// Identifier reference.
    Name { id: CompactString },
    /// Literal value with its source spelling and its Python `repr`.
    Constant {
        value: Literal,
        text: CompactString,
        repr: CompactString,
    },
    /// `func(args, keywords)`.
    Call {
        func: NodeId,
        args: Children,
        keywords: Children,
    },
    /// `arg=value` or `**value` inside a call.
    Keyword {
        arg: Option<CompactString>,
        value: NodeId,
    },
    /// `value.attr`.
    Attribute { value: NodeId, attr: CompactString },
    /// `a, b` or `(a, b)`.
    Tuple { elts: Children, parenthesized: bool },
    /// Any other expression.
    Expr { label: &'static str, children: Children },
}

/// Payload of a `for` loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopNode {
    /// Binding target (`i`, `(i, j)`, `obj.attr` ...).
    pub target: NodeId,
    /// Iteration source.
    pub iter: NodeId,
    pub body: Vec<NodeId>,
    /// `else:` block run when the loop ends without `break`.
    pub orelse: Vec<NodeId>,
    pub is_async: bool,
}

/// Kind of compound statement held by a [`BlockNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    Class,
    If,
    While,
    With,
    Try,
    Match,
}

/// Compound statement other than a `for` loop.
///
/// The header (`def f(x):`, `if cond:` ...) is kept as a source range; the
/// expressions it contains are children so analysis can still see them.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub kind: BlockKind,
    /// Header text up to and including the colon.
    pub header: TextRange,
    /// Expressions appearing in the header.
    pub exprs: Children,
    pub body: Vec<NodeId>,
    /// `elif`/`else`/`except`/`finally`/`case` clauses in source order.
    pub clauses: Vec<Clause>,
}

/// Secondary clause of a compound statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub header: ClauseHeader,
    pub exprs: Children,
    pub body: Vec<NodeId>,
    /// `case` clauses sit one level deeper than their `match`.
    pub nested: bool,
}

/// Header of a [`Clause`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseHeader {
    /// Header text in the original source.
    Source(TextRange),
    /// Bare keyword clause with no node of its own (`else`, `finally`).
    Keyword(&'static str),
}

/// One name in an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: CompactString,
    pub asname: Option<CompactString>,
}

impl Alias {
    /// Name this alias binds in the importing namespace.
    ///
    /// `import a.b` binds `a`; `import a.b as c` binds `c`.
    #[must_use]
    pub fn bound_name(&self) -> &str {
        match &self.asname {
            Some(asname) => asname.as_str(),
            None => self.name.split('.').next().unwrap_or(&self.name),
        }
    }
}

/// Literal values, as far as the engine needs to know them.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal; `None` when it does not fit in a `u64`.
    Int(Option<u64>),
    Float,
    Complex,
    Str,
    Bytes,
    Bool(bool),
    None,
    Ellipsis,
}

impl Literal {
    /// Whether the literal is an `int`, `float` or `complex` number.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Literal::Int(_) | Literal::Float | Literal::Complex)
    }
}

/// A parsed module held in an arena.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
    source: String,
    /// Start of the first statement (end of the leading trivia).
    leading_end: usize,
    /// End of the last statement (start of the trailing trivia).
    trailing_start: usize,
}

impl SyntaxTree {
    /// Parses `source` into a tree.
    ///
    /// # Errors
    /// Returns [`ParseError`] with the position of the first grammar error.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let parsed = ruff_python_parser::parse_module(source)
            .map_err(|err| ParseError::from_ruff(&err, source))?;
        let module = parsed.into_syntax();
        Ok(lower::lower_module(&module, source))
    }

    /// Root `Module` node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Original source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of nodes in the arena, including detached ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty. Never true for a parsed tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// Appends a node built by a rewrite and returns its id.
    pub fn alloc(&mut self, kind: NodeKind, location: Location) -> NodeId {
        self.push(Node {
            kind,
            origin: Origin::Synthesized,
            location,
        })
    }

    /// Appends a synthesized statement whose surrounding trivia is anchored
    /// at `at`, an empty range between two original statements.
    pub fn alloc_at(&mut self, kind: NodeKind, at: TextSize, location: Location) -> NodeId {
        self.push(Node {
            kind,
            origin: Origin::Replacement(TextRange::empty(at)),
            location,
        })
    }

    /// Appends a statement that takes the place of `replaced`, keeping its
    /// location and the trivia around it.
    pub fn alloc_replacement(&mut self, kind: NodeKind, replaced: NodeId) -> NodeId {
        let old = self.node(replaced);
        let origin = old.origin.anchor().map_or(Origin::Synthesized, Origin::Replacement);
        let location = old.location;
        self.push(Node {
            kind,
            origin,
            location,
        })
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    /// Source text of an original node, `None` for synthesized ones.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).origin.range().map(|range| &self.source[range])
    }

    /// Name bound or referenced by a `Name` node.
    #[must_use]
    pub fn name_id(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Name { id } => Some(id),
            _ => None,
        }
    }

    /// Marks an original node as changed below it.
    pub fn mark_edited(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        if let Origin::Source(range) = node.origin {
            node.origin = Origin::Edited(range);
        }
    }

    /// Statement blocks owned by `id`, in source order.
    ///
    /// These are the places where a rewrite may splice statements.
    #[must_use]
    pub fn blocks(&self, id: NodeId) -> SmallVec<[&Vec<NodeId>; 2]> {
        match self.kind(id) {
            NodeKind::Module { body } => smallvec![body],
            NodeKind::Loop(l) => smallvec![&l.body, &l.orelse],
            NodeKind::Block(b) => {
                let mut out: SmallVec<[&Vec<NodeId>; 2]> = smallvec![&b.body];
                out.extend(b.clauses.iter().map(|c| &c.body));
                out
            }
            _ => SmallVec::new(),
        }
    }

    /// Mutable access to the `n`-th statement block of `id`.
    pub fn block_mut(&mut self, id: NodeId, n: usize) -> Option<&mut Vec<NodeId>> {
        match &mut self.node_mut(id).kind {
            NodeKind::Module { body } if n == 0 => Some(body),
            NodeKind::Loop(l) => match n {
                0 => Some(&mut l.body),
                1 => Some(&mut l.orelse),
                _ => None,
            },
            NodeKind::Block(b) => {
                if n == 0 {
                    Some(&mut b.body)
                } else {
                    b.clauses.get_mut(n - 1).map(|c| &mut c.body)
                }
            }
            _ => None,
        }
    }

    /// Direct children of `id` in source order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children {
        let mut out = Children::new();
        match self.kind(id) {
            NodeKind::Module { body } => out.extend(body.iter().copied()),
            NodeKind::Loop(l) => {
                out.push(l.target);
                out.push(l.iter);
                out.extend(l.body.iter().copied());
                out.extend(l.orelse.iter().copied());
            }
            NodeKind::Block(b) => {
                out.extend(b.exprs.iter().copied());
                out.extend(b.body.iter().copied());
                for clause in &b.clauses {
                    out.extend(clause.exprs.iter().copied());
                    out.extend(clause.body.iter().copied());
                }
            }
            NodeKind::Assign { targets, value } => {
                out.extend(targets.iter().copied());
                out.push(*value);
            }
            NodeKind::AugAssign { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::ExprStmt { value } => out.push(*value),
            NodeKind::Return { value } => out.extend(*value),
            NodeKind::Simple { children } | NodeKind::Expr { children, .. } => {
                out.extend(children.iter().copied());
            }
            NodeKind::BinOp { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Subscript { value, slice } => {
                out.push(*value);
                out.push(*slice);
            }
            NodeKind::Call {
                func,
                args,
                keywords,
            } => {
                out.push(*func);
                out.extend(args.iter().copied());
                out.extend(keywords.iter().copied());
            }
            NodeKind::Keyword { value, .. } | NodeKind::Attribute { value, .. } => out.push(*value),
            NodeKind::Tuple { elts, .. } => out.extend(elts.iter().copied()),
            NodeKind::Import { .. }
            | NodeKind::ImportFrom { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Pass
            | NodeKind::Name { .. }
            | NodeKind::Constant { .. } => {}
        }
        out
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` included.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// All nodes in allocation order.
    pub(crate) fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Leading trivia before the first statement.
    pub(crate) fn prefix(&self) -> &str {
        &self.source[..self.leading_end]
    }

    /// Trailing trivia after the last original statement.
    pub(crate) fn suffix(&self) -> &str {
        &self.source[self.trailing_start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_module() {
        let tree = SyntaxTree::parse("x = 1\n").unwrap();
        assert!(matches!(tree.kind(tree.root()), NodeKind::Module { body } if body.len() == 1));
    }

    #[test]
    fn test_loop_children_order() {
        let tree = SyntaxTree::parse("for i in range(3):\n    x = i\n").unwrap();
        let NodeKind::Module { body } = tree.kind(tree.root()) else {
            panic!("expected module");
        };
        let NodeKind::Loop(l) = tree.kind(body[0]) else {
            panic!("expected loop");
        };
        let children = tree.children(body[0]);
        assert_eq!(children[0], l.target);
        assert_eq!(children[1], l.iter);
        assert_eq!(children[2], l.body[0]);
        assert_eq!(tree.name_id(l.target), Some("i"));
    }

    #[test]
    fn test_alias_bound_name() {
        let dotted = Alias {
            name: "os.path".into(),
            asname: None,
        };
        assert_eq!(dotted.bound_name(), "os");
        let aliased = Alias {
            name: "numpy".into(),
            asname: Some("np".into()),
        };
        assert_eq!(aliased.bound_name(), "np");
    }
}
