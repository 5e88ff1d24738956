//! Rewrite engine: tree-to-tree transformations of `for` loops.
//!
//! Rules run per loop node in a fixed priority order and the first rule that
//! matches wins. The pass is top-down and single-shot: a replacement is never
//! revisited, so each original loop is rewritten at most once.

mod flatten;
mod imports;
mod vectorize;

pub use flatten::FlattenRule;
pub use imports::{ImportRegistry, RequiredImport};
pub use vectorize::VectorizeRule;

use rustc_hash::FxHashSet;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

use crate::tree::codegen::unparse;
use crate::tree::parents::ParentIndex;
use crate::tree::{NodeId, NodeKind, SyntaxTree};

/// Statements grafted into the containing block in place of a loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Splice(pub SmallVec<[NodeId; 2]>);

impl Splice {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of applying one rule to one loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    /// The pattern did not match; the node is left as it was.
    Unchanged(NodeId),
    /// The loop is replaced by `splice`, which needs `imports`.
    Replaced {
        splice: Splice,
        imports: SmallVec<[RequiredImport; 1]>,
    },
}

/// A loop rewrite.
///
/// Implementations inspect the loop at `id` and either decline with
/// [`RewriteResult::Unchanged`] or allocate replacement statements in `tree`.
/// A rule must decline whenever it cannot confirm every precondition.
pub trait Rule: Send + Sync {
    /// Stable identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// One-line description of what an applied rewrite did.
    fn description(&self) -> &'static str;

    /// Imports an applied rewrite may add; the rule is skipped when the
    /// module binds one of their names to something else.
    fn requires(&self) -> &'static [RequiredImport] {
        &[]
    }

    fn apply(&self, tree: &mut SyntaxTree, id: NodeId) -> RewriteResult;
}

/// Which rules the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteConfig {
    pub flatten: bool,
    pub vectorize: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            flatten: true,
            vectorize: true,
        }
    }
}

/// A rewrite that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRewrite {
    pub rule: &'static str,
    /// Line of the replaced loop.
    pub line: usize,
    pub description: &'static str,
}

/// Result of a rewrite pass.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub tree: SyntaxTree,
    pub applied: Vec<AppliedRewrite>,
    /// Imports inserted at the top of the module.
    pub injected_imports: Vec<RequiredImport>,
}

impl Rewritten {
    /// Whether any rule fired.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Prints the rewritten tree.
    #[must_use]
    pub fn source(&self) -> String {
        unparse(&self.tree)
    }
}

/// Ordered set of rewrite rules.
pub struct RewriteEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self::new(RewriteConfig::default())
    }
}

/// Scratch state of one pass.
struct Pass {
    index: ParentIndex,
    replaced: FxHashSet<NodeId>,
    imports: ImportRegistry,
    applied: Vec<AppliedRewrite>,
}

impl RewriteEngine {
    /// Engine running flattening, then vectorization, as enabled in `config`.
    #[must_use]
    pub fn new(config: RewriteConfig) -> Self {
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();
        if config.flatten {
            rules.push(Box::new(FlattenRule));
        }
        if config.vectorize {
            rules.push(Box::new(VectorizeRule));
        }
        Self { rules }
    }

    /// Engine with an explicit rule list, tried in order.
    #[must_use]
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Names of the active rules, in priority order.
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name())
    }

    /// Runs one pass over `tree`.
    #[must_use]
    pub fn rewrite(&self, mut tree: SyntaxTree) -> Rewritten {
        let mut pass = Pass {
            index: ParentIndex::build(&tree),
            replaced: FxHashSet::default(),
            imports: ImportRegistry::scan(&tree),
            applied: Vec::new(),
        };

        let root = tree.root();
        self.visit_container(&mut tree, root, &mut pass);

        let injected_imports = pass.imports.inject(&mut tree);
        for import in &injected_imports {
            debug!(%import, "injected import");
        }

        Rewritten {
            tree,
            applied: pass.applied,
            injected_imports,
        }
    }

    fn visit_container(&self, tree: &mut SyntaxTree, container: NodeId, pass: &mut Pass) {
        let block_count = tree.blocks(container).len();
        for n in 0..block_count {
            let mut i = 0;
            while let Some(stmt) = statement_at(tree, container, n, i) {
                if matches!(tree.kind(stmt), NodeKind::Loop(_)) && !pass.replaced.contains(&stmt) {
                    if let Some(splice) = self.apply_rules(tree, stmt, pass) {
                        let count = splice.len();
                        pass.replaced.extend(splice.0.iter().copied());
                        if let Some(block) = tree.block_mut(container, n) {
                            block.splice(i..=i, splice.0);
                        }
                        tree.mark_edited(container);
                        for ancestor in pass.index.ancestors(container) {
                            tree.mark_edited(ancestor);
                        }
                        i += count;
                        continue;
                    }
                }
                self.visit_container(tree, stmt, pass);
                i += 1;
            }
        }
    }

    fn apply_rules(&self, tree: &mut SyntaxTree, id: NodeId, pass: &mut Pass) -> Option<Splice> {
        let line = tree.node(id).location.line;
        for rule in &self.rules {
            if rule.requires().iter().any(|&import| pass.imports.conflicts(import)) {
                continue;
            }
            match rule.apply(tree, id) {
                RewriteResult::Unchanged(_) => {}
                RewriteResult::Replaced { splice, imports } => {
                    debug!(rule = rule.name(), line, "rewrite applied");
                    for import in imports {
                        pass.imports.require(import);
                    }
                    pass.applied.push(AppliedRewrite {
                        rule: rule.name(),
                        line,
                        description: rule.description(),
                    });
                    return Some(splice);
                }
            }
        }
        None
    }
}

/// The `i`-th statement of the `n`-th block of `container`.
fn statement_at(tree: &SyntaxTree, container: NodeId, n: usize, i: usize) -> Option<NodeId> {
    tree.blocks(container)
        .get(n)
        .and_then(|block| block.get(i))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeleteLoops;

    impl Rule for DeleteLoops {
        fn name(&self) -> &'static str {
            "delete"
        }

        fn description(&self) -> &'static str {
            "Removed loop"
        }

        fn apply(&self, _tree: &mut SyntaxTree, _id: NodeId) -> RewriteResult {
            RewriteResult::Replaced {
                splice: Splice::default(),
                imports: SmallVec::new(),
            }
        }
    }

    #[test]
    fn test_empty_splice_removes_statement() {
        let tree = SyntaxTree::parse("a = 1\nfor i in x:\n    pass\nb = 2\n").unwrap();
        let engine = RewriteEngine::with_rules(vec![Box::new(DeleteLoops)]);
        let out = engine.rewrite(tree);
        assert_eq!(out.source(), "a = 1\nb = 2\n");
        assert_eq!(out.applied.len(), 1);
    }

    #[test]
    fn test_disabled_rules_leave_tree_untouched() {
        let source = "for i in range(3):\n    for j in range(4):\n        print(i, j)\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let engine = RewriteEngine::new(RewriteConfig {
            flatten: false,
            vectorize: false,
        });
        assert_eq!(engine.rule_names().count(), 0);
        let out = engine.rewrite(tree.clone());
        assert_eq!(out.tree, tree);
        assert!(!out.changed());
    }
}
