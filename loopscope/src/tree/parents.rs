//! Parent side table.
//!
//! Built once per pass by a single pre-order traversal and discarded with the
//! pass. Nodes allocated after the index was built have no entry.

use super::{NodeId, NodeKind, SyntaxTree};

/// `child -> parent` mapping plus the pre-order it was built from.
#[derive(Debug, Clone)]
pub struct ParentIndex {
    parents: Vec<Option<NodeId>>,
    preorder: Vec<NodeId>,
}

impl ParentIndex {
    /// Indexes every node reachable from the tree root.
    #[must_use]
    pub fn build(tree: &SyntaxTree) -> Self {
        let mut parents = vec![None; tree.len()];
        let mut preorder = Vec::with_capacity(tree.len());
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            preorder.push(id);
            let children = tree.children(id);
            for &child in &children {
                parents[child.index()] = Some(id);
            }
            stack.extend(children.into_iter().rev());
        }
        Self { parents, preorder }
    }

    /// Parent of `id`; `None` for the root and for unindexed nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.index()).copied().flatten()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Reachable nodes in document pre-order.
    #[must_use]
    pub fn preorder(&self) -> &[NodeId] {
        &self.preorder
    }

    /// Nearest enclosing `for` loop of `id`, excluding `id` itself.
    #[must_use]
    pub fn enclosing_loop(&self, tree: &SyntaxTree, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&ancestor| matches!(tree.kind(ancestor), NodeKind::Loop(_)))
    }

    /// Number of `for` loops enclosing `id`, with no upper cap.
    #[must_use]
    pub fn loop_depth(&self, tree: &SyntaxTree, id: NodeId) -> usize {
        self.ancestors(id)
            .filter(|&ancestor| matches!(tree.kind(ancestor), NodeKind::Loop(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_counts_every_enclosing_loop() {
        let source = "\
for a in x:
    for b in y:
        for c in z:
            for d in w:
                pass
";
        let tree = SyntaxTree::parse(source).unwrap();
        let index = ParentIndex::build(&tree);
        let depths: Vec<usize> = index
            .preorder()
            .iter()
            .filter(|&&id| matches!(tree.kind(id), NodeKind::Loop(_)))
            .map(|&id| index.loop_depth(&tree, id))
            .collect();
        assert_eq!(depths, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_root_has_no_parent() {
        let tree = SyntaxTree::parse("x = 1\n").unwrap();
        let index = ParentIndex::build(&tree);
        assert_eq!(index.parent(tree.root()), None);
        assert_eq!(index.preorder()[0], tree.root());
        assert_eq!(index.preorder().len(), tree.len());
    }

    #[test]
    fn test_enclosing_loop_crosses_function_boundary() {
        let source = "for i in x:\n    def f():\n        return i + 1\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let index = ParentIndex::build(&tree);
        let binop = index
            .preorder()
            .iter()
            .copied()
            .find(|&id| matches!(tree.kind(id), NodeKind::BinOp { .. }))
            .unwrap();
        let found = index.enclosing_loop(&tree, binop).unwrap();
        assert_eq!(tree.node(found).location.line, 1);
    }
}
