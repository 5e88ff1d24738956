//! Vectorization of element-wise update loops.
//!
//! ```python
//! for i in range(len(arr)):       arr = np.array(arr)
//!     arr[i] = arr[i] * 2     =>  arr = arr * 2
//! ```

use compact_str::CompactString;
use ruff_python_ast::Operator;
use smallvec::smallvec;

use super::{RequiredImport, RewriteResult, Rule, Splice};
use crate::constants::{ARRAY_ATTR, LEN_BUILTIN, NUMPY_ALIAS, RANGE_BUILTIN};
use crate::tree::{ops, Children, Literal, Location, NodeId, NodeKind, SyntaxTree};

/// Replaces `arr[i] = arr[i] <op> <const>` loops with one array operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorizeRule;

/// Parts of a matched loop.
struct ElementWise {
    array: CompactString,
    op: Operator,
    constant: NodeId,
}

impl Rule for VectorizeRule {
    fn name(&self) -> &'static str {
        "vectorize-loop"
    }

    fn description(&self) -> &'static str {
        "Replaced element-wise loop with a numpy array operation"
    }

    fn requires(&self) -> &'static [RequiredImport] {
        &[RequiredImport::NUMPY]
    }

    fn apply(&self, tree: &mut SyntaxTree, id: NodeId) -> RewriteResult {
        let Some(matched) = match_element_wise(tree, id) else {
            return RewriteResult::Unchanged(id);
        };
        let location = tree.node(id).location;
        let name = |tree: &mut SyntaxTree, id: &str| {
            tree.alloc(NodeKind::Name { id: id.into() }, location)
        };

        // arr = np.array(arr)
        let np = name(tree, NUMPY_ALIAS);
        let array_fn = tree.alloc(
            NodeKind::Attribute {
                value: np,
                attr: ARRAY_ATTR.into(),
            },
            location,
        );
        let arg = name(tree, &matched.array);
        let converted = tree.alloc(
            NodeKind::Call {
                func: array_fn,
                args: Children::from_slice(&[arg]),
                keywords: Children::new(),
            },
            location,
        );
        let convert = assign(tree, &matched.array, converted, id, location);

        // arr = arr <op> <const>
        let left = name(tree, &matched.array);
        let value = tree.alloc(
            NodeKind::BinOp {
                left,
                op: matched.op,
                right: matched.constant,
            },
            location,
        );
        let update = assign(tree, &matched.array, value, id, location);

        RewriteResult::Replaced {
            splice: Splice(smallvec![convert, update]),
            imports: smallvec![RequiredImport::NUMPY],
        }
    }
}

fn assign(
    tree: &mut SyntaxTree,
    target: &str,
    value: NodeId,
    replaced: NodeId,
    location: Location,
) -> NodeId {
    let target = tree.alloc(NodeKind::Name { id: target.into() }, location);
    tree.alloc_replacement(
        NodeKind::Assign {
            targets: vec![target],
            value,
        },
        replaced,
    )
}

fn match_element_wise(tree: &SyntaxTree, id: NodeId) -> Option<ElementWise> {
    let NodeKind::Loop(l) = tree.kind(id) else {
        return None;
    };
    if l.is_async || !l.orelse.is_empty() {
        return None;
    }
    let index = tree.name_id(l.target)?;
    let array = len_range_array(tree, l.iter)?;
    let [stmt] = l.body.as_slice() else {
        return None;
    };

    let (op, constant) = match tree.kind(*stmt) {
        NodeKind::Assign { targets, value } => {
            let [target] = targets.as_slice() else {
                return None;
            };
            let NodeKind::BinOp { left, op, right } = tree.kind(*value) else {
                return None;
            };
            if !is_element(tree, *target, array, index) || !is_element(tree, *left, array, index)
            {
                return None;
            }
            (*op, *right)
        }
        NodeKind::AugAssign { target, op, value } => {
            if !is_element(tree, *target, array, index) {
                return None;
            }
            (*op, *value)
        }
        _ => return None,
    };

    let numeric = matches!(tree.kind(constant), NodeKind::Constant { value, .. } if value.is_numeric());
    (ops::is_vectorizable(op) && numeric).then(|| ElementWise {
        array: array.into(),
        op,
        constant,
    })
}

/// Name of `arr` when `iter` is exactly `range(len(arr))`.
fn len_range_array(tree: &SyntaxTree, iter: NodeId) -> Option<&str> {
    let range_arg = single_arg_call(tree, iter, RANGE_BUILTIN)?;
    let len_arg = single_arg_call(tree, range_arg, LEN_BUILTIN)?;
    tree.name_id(len_arg)
}

/// The only argument of `func(arg)`, with no keywords.
fn single_arg_call(tree: &SyntaxTree, call: NodeId, func: &str) -> Option<NodeId> {
    match tree.kind(call) {
        NodeKind::Call {
            func: callee,
            args,
            keywords,
        } if keywords.is_empty() && args.len() == 1 && tree.name_id(*callee) == Some(func) => {
            Some(args[0])
        }
        _ => None,
    }
}

/// Whether `id` is `array[index]`.
fn is_element(tree: &SyntaxTree, id: NodeId, array: &str, index: &str) -> bool {
    matches!(
        tree.kind(id),
        NodeKind::Subscript { value, slice }
            if tree.name_id(*value) == Some(array) && tree.name_id(*slice) == Some(index)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(source: &str) -> Option<(String, Operator)> {
        let tree = SyntaxTree::parse(source).unwrap();
        let NodeKind::Module { body } = tree.kind(tree.root()) else {
            panic!("expected module");
        };
        match_element_wise(&tree, body[0]).map(|m| (m.array.to_string(), m.op))
    }

    #[test]
    fn test_assign_form() {
        assert_eq!(
            matched("for i in range(len(arr)):\n    arr[i] = arr[i] * 2\n"),
            Some(("arr".to_owned(), Operator::Mult))
        );
    }

    #[test]
    fn test_augmented_form() {
        assert_eq!(
            matched("for k in range(len(xs)):\n    xs[k] -= 1.5\n"),
            Some(("xs".to_owned(), Operator::Sub))
        );
    }

    #[test]
    fn test_variable_operand_declines() {
        assert_eq!(matched("for i in range(len(arr)):\n    arr[i] = arr[i] + c\n"), None);
    }

    #[test]
    fn test_augmented_binop_declines() {
        assert_eq!(matched("for i in range(len(arr)):\n    arr[i] *= 2 + 1\n"), None);
    }

    #[test]
    fn test_other_array_declines() {
        assert_eq!(matched("for i in range(len(a)):\n    b[i] = b[i] + 1\n"), None);
    }

    #[test]
    fn test_division_declines() {
        assert_eq!(matched("for i in range(len(a)):\n    a[i] = a[i] / 2\n"), None);
    }

    #[test]
    fn test_string_constant_declines() {
        assert_eq!(matched("for i in range(len(a)):\n    a[i] = a[i] + 'x'\n"), None);
    }
}
