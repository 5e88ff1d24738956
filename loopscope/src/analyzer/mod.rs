//! Pattern detector: a read-only pass that reports loop shapes worth
//! optimizing.
//!
//! The detector never mutates the tree. It builds one [`ParentIndex`], walks
//! every node in document pre-order and classifies loops and arithmetic.

mod findings;

pub use findings::{Finding, Findings, Severity};

use tracing::debug;

use crate::constants::{DEFAULT_HIGH_ITERATION_THRESHOLD, RANGE_BUILTIN};
use crate::error::ParseError;
use crate::tree::dump::dump;
use crate::tree::parents::ParentIndex;
use crate::tree::{ops, Literal, LoopNode, NodeId, NodeKind, SyntaxTree};

/// Parses `source` and runs the detector with the default threshold.
///
/// # Errors
/// Returns [`ParseError`] when `source` is not valid Python.
pub fn analyze(source: &str) -> Result<Findings, ParseError> {
    let tree = SyntaxTree::parse(source)?;
    Ok(Detector::default().detect(&tree))
}

/// Configurable pattern detector.
#[derive(Debug, Clone, Copy)]
pub struct Detector {
    threshold: u64,
}

impl Default for Detector {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_HIGH_ITERATION_THRESHOLD)
    }
}

/// Bound of a `range(...)` iteration source.
enum RangeBound {
    /// Integer literal; `None` when it does not fit in a `u64`.
    Literal(Option<u64>, NodeId),
    Variable(NodeId),
}

impl Detector {
    /// Detector reporting `range(n)` loops with `n > threshold`.
    #[must_use]
    pub fn with_threshold(threshold: u64) -> Self {
        Self { threshold }
    }

    /// Runs the detector over an already parsed tree.
    #[must_use]
    pub fn detect(&self, tree: &SyntaxTree) -> Findings {
        let index = ParentIndex::build(tree);
        let mut findings = Findings::default();

        for &id in index.preorder() {
            match tree.kind(id) {
                NodeKind::Loop(l) => self.visit_loop(tree, &index, id, l, &mut findings),
                NodeKind::BinOp { op, .. } if ops::is_repeatable(*op) => {
                    if let Some(owner) = index.enclosing_loop(tree, id) {
                        findings.push(Finding::RepeatedComputation {
                            line: tree.node(id).location.line,
                            loop_line: tree.node(owner).location.line,
                            expression: dump(tree, id),
                            source: tree.text(id).unwrap_or_default().to_owned(),
                        });
                    }
                }
                _ => {}
            }
        }

        debug!(count = findings.len(), "detector finished");
        findings
    }

    fn visit_loop(
        &self,
        tree: &SyntaxTree,
        index: &ParentIndex,
        id: NodeId,
        l: &LoopNode,
        findings: &mut Findings,
    ) {
        let line = tree.node(id).location.line;
        let depth = index.loop_depth(tree, id);
        if depth > 0 {
            findings.push(Finding::NestedLoop { line, depth });
        }

        match range_bound(tree, l.iter) {
            Some(RangeBound::Literal(value, arg)) if value.is_none_or(|v| v > self.threshold) => {
                let bound = value.map_or_else(
                    || tree.text(arg).unwrap_or_default().to_owned(),
                    |v| v.to_string(),
                );
                findings.push(Finding::HighIterationLoop { line, bound });
            }
            Some(RangeBound::Variable(arg)) => findings.push(Finding::VariableBound {
                line,
                expression: tree.text(arg).unwrap_or_default().to_owned(),
            }),
            _ => {}
        }
    }
}

/// Classifies `range(x)` with exactly one positional argument and no keywords.
fn range_bound(tree: &SyntaxTree, iter: NodeId) -> Option<RangeBound> {
    let NodeKind::Call {
        func,
        args,
        keywords,
    } = tree.kind(iter)
    else {
        return None;
    };
    if tree.name_id(*func) != Some(RANGE_BUILTIN) || args.len() != 1 || !keywords.is_empty() {
        return None;
    }
    let arg = args[0];
    match tree.kind(arg) {
        NodeKind::Constant {
            value: Literal::Int(value),
            ..
        } => Some(RangeBound::Literal(*value, arg)),
        NodeKind::Constant { .. } => None,
        _ => Some(RangeBound::Variable(arg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_int_bound_is_high() {
        let findings = analyze("for i in range(99999999999999999999999):\n    pass\n").unwrap();
        assert_eq!(findings.high_iterations().count(), 1);
    }

    #[test]
    fn test_range_with_step_is_ignored() {
        let findings = analyze("for i in range(0, 5000, 2):\n    pass\n").unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_custom_threshold() {
        let tree = SyntaxTree::parse("for i in range(50):\n    pass\n").unwrap();
        let findings = Detector::with_threshold(10).detect(&tree);
        assert_eq!(
            findings.all(),
            &[Finding::HighIterationLoop {
                line: 1,
                bound: "50".to_owned()
            }]
        );
    }
}
