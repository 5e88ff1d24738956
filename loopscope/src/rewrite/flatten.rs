//! Loop flattening.
//!
//! ```python
//! for i in range(n):          for i, j in itertools.product(range(n), range(m)):
//!     for j in range(m):  =>      body(i, j)
//!         body(i, j)
//! ```
//!
//! `product` evaluates both iteration sources once, up front. The rule only
//! fires when that cannot change behavior: the inner source must not read the
//! outer binding, the inner body must not rebind it or `break` out of the inner
//! loop, and neither loop may be `async` or carry an `else` clause.

use smallvec::smallvec;

use super::{RequiredImport, RewriteResult, Rule, Splice};
use crate::constants::{ITERTOOLS_MODULE, PRODUCT_ATTR};
use crate::tree::{
    BlockKind, BlockNode, Children, ClauseHeader, LoopNode, NodeId, NodeKind, SyntaxTree,
};

/// Collapses a loop whose whole body is one inner loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenRule;

impl Rule for FlattenRule {
    fn name(&self) -> &'static str {
        "flatten-nested-loop"
    }

    fn description(&self) -> &'static str {
        "Flattened nested loop with itertools.product"
    }

    fn requires(&self) -> &'static [RequiredImport] {
        &[RequiredImport::ITERTOOLS]
    }

    fn apply(&self, tree: &mut SyntaxTree, id: NodeId) -> RewriteResult {
        let Some((outer, inner)) = match_nested(tree, id) else {
            return RewriteResult::Unchanged(id);
        };

        let location = tree.node(id).location;
        let module = tree.alloc(
            NodeKind::Name {
                id: ITERTOOLS_MODULE.into(),
            },
            location,
        );
        let product = tree.alloc(
            NodeKind::Attribute {
                value: module,
                attr: PRODUCT_ATTR.into(),
            },
            location,
        );
        let iter = tree.alloc(
            NodeKind::Call {
                func: product,
                args: Children::from_slice(&[outer.iter, inner.iter]),
                keywords: Children::new(),
            },
            location,
        );
        let target = tree.alloc(
            NodeKind::Tuple {
                elts: Children::from_slice(&[outer.target, inner.target]),
                parenthesized: false,
            },
            location,
        );
        let flattened = tree.alloc_replacement(
            NodeKind::Loop(LoopNode {
                target,
                iter,
                body: inner.body,
                orelse: Vec::new(),
                is_async: false,
            }),
            id,
        );

        RewriteResult::Replaced {
            splice: Splice(smallvec![flattened]),
            imports: smallvec![RequiredImport::ITERTOOLS],
        }
    }
}

/// Returns copies of the outer and inner loop when `id` is a flattenable pair.
fn match_nested(tree: &SyntaxTree, id: NodeId) -> Option<(LoopNode, LoopNode)> {
    let NodeKind::Loop(outer) = tree.kind(id) else {
        return None;
    };
    let [inner_id] = outer.body.as_slice() else {
        return None;
    };
    let NodeKind::Loop(inner) = tree.kind(*inner_id) else {
        return None;
    };

    for l in [outer, inner] {
        if l.is_async || !l.orelse.is_empty() {
            return None;
        }
        if !matches!(tree.kind(l.iter), NodeKind::Call { .. }) {
            return None;
        }
    }
    let outer_var = tree.name_id(outer.target)?;
    tree.name_id(inner.target)?;

    if reads_name(tree, inner.iter, outer_var)
        || rebinds_name(tree, &inner.body, outer_var)
        || breaks_out(tree, &inner.body)
    {
        return None;
    }
    // product() evaluates the inner source once, so the body must not rebind
    // anything it reads.
    let inner_source_rebound = tree
        .descendants(inner.iter)
        .into_iter()
        .filter_map(|n| tree.name_id(n))
        .any(|name| rebinds_name(tree, &inner.body, name));
    if inner_source_rebound {
        return None;
    }
    Some((outer.clone(), inner.clone()))
}

fn reads_name(tree: &SyntaxTree, expr: NodeId, name: &str) -> bool {
    tree.descendants(expr)
        .into_iter()
        .any(|id| tree.name_id(id) == Some(name))
}

/// Whether any statement under `body` assigns to `name`.
fn rebinds_name(tree: &SyntaxTree, body: &[NodeId], name: &str) -> bool {
    body.iter()
        .flat_map(|&stmt| tree.descendants(stmt))
        .any(|id| match tree.kind(id) {
            NodeKind::Assign { targets, .. } => {
                targets.iter().any(|&t| binds_target(tree, t, name))
            }
            NodeKind::AugAssign { target, .. } => binds_target(tree, *target, name),
            NodeKind::Loop(l) => binds_target(tree, l.target, name),
            NodeKind::Import { names } | NodeKind::ImportFrom { names, .. } => {
                names.iter().any(|alias| alias.bound_name() == name)
            }
            NodeKind::Expr {
                label: "NamedExpr",
                children,
            } => children.first().is_some_and(|&t| tree.name_id(t) == Some(name)),
            // `with ... as`, `except ... as`, `case` captures and definitions.
            NodeKind::Block(b) => {
                !matches!(b.kind, BlockKind::If | BlockKind::While)
                    && block_mentions(tree, b, name)
            }
            // `del`, `global`, annotated assignments and the like.
            NodeKind::Simple { .. } => {
                mentions(tree.text(id).unwrap_or_default(), name)
            }
            _ => false,
        })
}

/// Whether an assignment target binds `name` directly or by unpacking.
fn binds_target(tree: &SyntaxTree, target: NodeId, name: &str) -> bool {
    match tree.kind(target) {
        NodeKind::Name { id } => id == name,
        NodeKind::Tuple { elts, .. } => elts.iter().any(|&e| binds_target(tree, e, name)),
        NodeKind::Expr {
            label: "List" | "Starred",
            children,
        } => children.iter().any(|&e| binds_target(tree, e, name)),
        _ => false,
    }
}

/// Whether the header of `b` or any of its clause headers spells `name`.
fn block_mentions(tree: &SyntaxTree, b: &BlockNode, name: &str) -> bool {
    let source = tree.source();
    mentions(&source[b.header], name)
        || b.clauses.iter().any(|clause| match clause.header {
            ClauseHeader::Source(range) => mentions(&source[range], name),
            ClauseHeader::Keyword(_) => false,
        })
}

fn mentions(text: &str, name: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| word == name)
}

/// Whether `body` contains a `break` that would leave the loop owning `body`.
fn breaks_out(tree: &SyntaxTree, body: &[NodeId]) -> bool {
    body.iter().any(|&stmt| match tree.kind(stmt) {
        NodeKind::Break => true,
        // A nested loop owns the breaks in its body, not in its `else`.
        NodeKind::Loop(l) => breaks_out(tree, &l.orelse),
        NodeKind::Block(b) => match b.kind {
            BlockKind::Function | BlockKind::Class => false,
            BlockKind::While => b.clauses.iter().any(|c| breaks_out(tree, &c.body)),
            _ => {
                breaks_out(tree, &b.body) || b.clauses.iter().any(|c| breaks_out(tree, &c.body))
            }
        },
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_stmt(tree: &SyntaxTree) -> NodeId {
        match tree.kind(tree.root()) {
            NodeKind::Module { body } => body[0],
            _ => panic!("expected module"),
        }
    }

    fn matches(source: &str) -> bool {
        let tree = SyntaxTree::parse(source).unwrap();
        match_nested(&tree, first_stmt(&tree)).is_some()
    }

    #[test]
    fn test_simple_pair_matches() {
        assert!(matches("for i in range(3):\n    for j in range(4):\n        print(i, j)\n"));
    }

    #[test]
    fn test_dependent_inner_source_declines() {
        assert!(!matches("for i in range(3):\n    for j in range(i):\n        print(i, j)\n"));
    }

    #[test]
    fn test_inner_break_declines() {
        assert!(!matches(
            "for i in range(3):\n    for j in range(4):\n        if j > i:\n            break\n"
        ));
    }

    #[test]
    fn test_break_in_deeper_loop_is_fine() {
        assert!(matches(
            "for i in range(3):\n    for j in range(4):\n        for k in range(5):\n            break\n"
        ));
    }

    #[test]
    fn test_rebinding_outer_declines() {
        assert!(!matches("for i in range(3):\n    for j in range(4):\n        i = j\n"));
    }

    #[test]
    fn test_rebinding_inner_source_declines() {
        assert!(!matches("for i in range(3):\n    for j in range(n):\n        n += 1\n"));
        assert!(!matches("for i in range(3):\n    for j in range(len(xs)):\n        xs = []\n"));
        assert!(matches("for i in range(3):\n    for j in range(n):\n        m = n + j\n"));
    }

    #[test]
    fn test_else_clause_declines() {
        assert!(!matches(
            "for i in range(3):\n    for j in range(4):\n        pass\n    else:\n        pass\n"
        ));
    }

    #[test]
    fn test_non_call_source_declines() {
        assert!(!matches("for i in xs:\n    for j in range(4):\n        pass\n"));
    }
}
