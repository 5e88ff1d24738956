//! Tracking of module-level imports required by rewrites.

use compact_str::CompactString;
use ruff_text_size::TextSize;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::constants::{ITERTOOLS_MODULE, NUMPY_ALIAS, NUMPY_MODULE};
use crate::tree::{Alias, Literal, Location, NodeId, NodeKind, SyntaxTree};

/// An `import module [as alias]` statement a rewrite depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RequiredImport {
    pub module: &'static str,
    pub alias: Option<&'static str>,
}

impl RequiredImport {
    /// `import itertools`
    pub const ITERTOOLS: Self = Self {
        module: ITERTOOLS_MODULE,
        alias: None,
    };

    /// `import numpy as np`
    pub const NUMPY: Self = Self {
        module: NUMPY_MODULE,
        alias: Some(NUMPY_ALIAS),
    };

    /// Name the import binds in the module namespace.
    #[must_use]
    pub fn bound_name(&self) -> &'static str {
        self.alias.unwrap_or(self.module)
    }

    fn to_alias(self) -> Alias {
        Alias {
            name: self.module.into(),
            asname: self.alias.map(Into::into),
        }
    }
}

impl std::fmt::Display for RequiredImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.alias {
            Some(alias) => write!(f, "import {} as {alias}", self.module),
            None => write!(f, "import {}", self.module),
        }
    }
}

/// Imports already present at module level plus those requested by the
/// current pass, in first-request order.
#[derive(Debug, Default)]
pub struct ImportRegistry {
    present: FxHashSet<(CompactString, CompactString)>,
    /// Module-level names bound by anything other than a plain `import`.
    other_bindings: FxHashSet<CompactString>,
    pending: Vec<RequiredImport>,
}

impl ImportRegistry {
    /// Records every `import` statement directly in the module body, and the
    /// names other module-level statements bind.
    #[must_use]
    pub fn scan(tree: &SyntaxTree) -> Self {
        let mut registry = Self::default();
        let NodeKind::Module { body } = tree.kind(tree.root()) else {
            return registry;
        };
        for &stmt in body {
            match tree.kind(stmt) {
                NodeKind::Import { names } => {
                    for alias in names {
                        registry
                            .present
                            .insert((alias.bound_name().into(), alias.name.clone()));
                    }
                }
                NodeKind::ImportFrom { names, .. } => {
                    registry
                        .other_bindings
                        .extend(names.iter().map(|alias| alias.bound_name().into()));
                }
                NodeKind::Assign { targets, .. } => {
                    registry
                        .other_bindings
                        .extend(targets.iter().filter_map(|&t| tree.name_id(t)).map(Into::into));
                }
                NodeKind::AugAssign { target, .. } => {
                    registry.other_bindings.extend(tree.name_id(*target).map(Into::into));
                }
                _ => {}
            }
        }
        registry
    }

    /// Whether the module already binds the name `import` would bind to
    /// something else, so code using that name cannot be added.
    #[must_use]
    pub fn conflicts(&self, import: RequiredImport) -> bool {
        let bound = import.bound_name();
        self.other_bindings.contains(bound)
            || self
                .present
                .iter()
                .any(|(name, module)| name == bound && module != import.module)
    }

    /// Whether `import` already binds its name to its module.
    #[must_use]
    pub fn is_present(&self, import: RequiredImport) -> bool {
        self.present
            .iter()
            .any(|(bound, module)| bound == import.bound_name() && module == import.module)
    }

    /// Requests `import`; a no-op if it is present or already requested.
    pub fn require(&mut self, import: RequiredImport) {
        if !self.is_present(import) && !self.pending.contains(&import) {
            self.pending.push(import);
        }
    }

    /// Imports requested but not present, in request order.
    #[must_use]
    pub fn pending(&self) -> &[RequiredImport] {
        &self.pending
    }

    /// Inserts the pending imports after the module docstring and any
    /// `from __future__` imports. Returns what was inserted.
    pub fn inject(self, tree: &mut SyntaxTree) -> Vec<RequiredImport> {
        if self.pending.is_empty() {
            return self.pending;
        }
        let root = tree.root();
        let (position, anchor) = insertion_point(tree);
        let location = Location { line: 1, column: 0 };
        let nodes: Vec<NodeId> = self
            .pending
            .iter()
            .map(|import| {
                tree.alloc_at(
                    NodeKind::Import {
                        names: vec![import.to_alias()],
                    },
                    anchor,
                    location,
                )
            })
            .collect();
        if let Some(body) = tree.block_mut(root, 0) {
            for (offset, node) in nodes.into_iter().enumerate() {
                body.insert(position + offset, node);
            }
        }
        tree.mark_edited(root);
        self.pending
    }
}

/// Index in the module body where imports go, and the offset their trivia is
/// anchored at.
fn insertion_point(tree: &SyntaxTree) -> (usize, TextSize) {
    let NodeKind::Module { body } = tree.kind(tree.root()) else {
        return (0, TextSize::default());
    };
    let mut position = 0;
    if body.first().is_some_and(|&first| is_docstring(tree, first)) {
        position = 1;
    }
    while body
        .get(position)
        .is_some_and(|&stmt| is_future_import(tree, stmt))
    {
        position += 1;
    }

    let anchor = if position == 0 {
        TextSize::try_from(tree.prefix().len()).unwrap_or_default()
    } else {
        body.get(position - 1)
            .and_then(|&prev| tree.node(prev).origin.anchor())
            .map_or_else(TextSize::default, |range| range.end())
    };
    (position, anchor)
}

fn is_docstring(tree: &SyntaxTree, stmt: NodeId) -> bool {
    match tree.kind(stmt) {
        NodeKind::ExprStmt { value } => matches!(
            tree.kind(*value),
            NodeKind::Constant {
                value: Literal::Str,
                ..
            }
        ),
        _ => false,
    }
}

fn is_future_import(tree: &SyntaxTree, stmt: NodeId) -> bool {
    matches!(
        tree.kind(stmt),
        NodeKind::ImportFrom { module: Some(module), level: 0, .. } if module == "__future__"
    )
}
