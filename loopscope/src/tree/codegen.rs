//! Turns a (possibly rewritten) tree back into Python source.
//!
//! Untouched statements are copied from the original text, so comments and
//! formatting survive; only nodes a rewrite touched are printed structurally.

use ruff_text_size::{TextRange, TextSize};

use super::ops::{self, Precedence};
use super::{BlockNode, ClauseHeader, Literal, LoopNode, NodeId, NodeKind, Origin, SyntaxTree};
use crate::utils::{detect_indent_unit, line_indent, statement_indent};

/// Prints `tree` as source text.
///
/// An unmodified tree prints back to exactly its original source.
#[must_use]
pub fn unparse(tree: &SyntaxTree) -> String {
    let mut printer = Printer {
        tree,
        source: tree.source(),
        unit: indent_unit(tree),
        strings: multiline_strings(tree),
        out: String::with_capacity(tree.source().len() + 64),
    };
    printer.module();
    printer.out
}

/// Indentation one nesting level adds, read off an original loop or block body.
fn indent_unit(tree: &SyntaxTree) -> String {
    let source = tree.source();
    tree.nodes()
        .filter_map(|node| {
            let header = node.origin.range()?;
            let first = match &node.kind {
                NodeKind::Loop(l) => *l.body.first()?,
                NodeKind::Block(b) => *b.body.first()?,
                _ => return None,
            };
            let start = tree.node(first).origin.range()?.start();
            let body = statement_indent(source, start.to_usize())?;
            let delta = body.strip_prefix(line_indent(source, header.start().to_usize()))?;
            (!delta.is_empty()).then(|| delta.to_owned())
        })
        .next()
        .unwrap_or_else(|| detect_indent_unit(source))
}

/// Original ranges of string literals that span lines.
fn multiline_strings(tree: &SyntaxTree) -> Vec<TextRange> {
    tree.nodes()
        .filter(|node| match &node.kind {
            NodeKind::Constant { value, .. } => matches!(value, Literal::Str | Literal::Bytes),
            NodeKind::Expr { label, .. } => matches!(*label, "JoinedStr" | "TemplateStr"),
            _ => false,
        })
        .filter_map(|node| node.origin.range())
        .filter(|range| tree.source()[*range].contains('\n'))
        .collect()
}

struct Printer<'t> {
    tree: &'t SyntaxTree,
    source: &'t str,
    unit: String,
    strings: Vec<TextRange>,
    out: String,
}

impl Printer<'_> {
    fn module(&mut self) {
        let root = self.tree.root();
        let node = self.tree.node(root);
        if matches!(node.origin, Origin::Source(_)) {
            self.out.push_str(self.source);
            return;
        }
        let NodeKind::Module { body } = &node.kind else {
            return;
        };
        self.out.push_str(self.tree.prefix());
        self.suite(body, "", None, true);
        self.out.push_str(self.tree.suffix());
    }

    /// Prints a statement list. Returns the anchor end of the last statement.
    fn suite(
        &mut self,
        body: &[NodeId],
        indent: &str,
        mut prev: Option<TextSize>,
        mut inline_first: bool,
    ) -> Option<TextSize> {
        for &id in body {
            let anchor = self.tree.node(id).origin.anchor();
            if inline_first {
                inline_first = false;
            } else {
                self.separator(prev, anchor.map(TextRange::start), indent);
            }
            self.statement(id, indent);
            prev = anchor.map(TextRange::end);
        }
        prev
    }

    /// Line break before the next statement, keeping the original comments
    /// and blank lines when both neighbours are anchored in the source.
    fn separator(&mut self, prev: Option<TextSize>, next: Option<TextSize>, indent: &str) {
        if let (Some(prev), Some(next)) = (prev, next) {
            if prev <= next && self.gap(TextRange::new(prev, next), indent) {
                return;
            }
        }
        self.out.push('\n');
        self.out.push_str(indent);
    }

    fn gap(&mut self, range: TextRange, indent: &str) -> bool {
        let text = &self.source[range];
        let mut lines = text.split('\n');
        let same_line = lines.next().unwrap_or_default();
        let rest: Vec<&str> = lines.collect();
        let Some((last, middle)) = rest.split_last() else {
            return false;
        };
        let is_trivia = |line: &str| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#')
        };
        if !is_trivia(same_line) || !last.trim().is_empty() || !middle.iter().all(|l| is_trivia(l)) {
            return false;
        }

        self.out.push_str(same_line.trim_end());
        for line in middle {
            self.out.push('\n');
            let line = line.trim();
            if !line.is_empty() {
                self.out.push_str(indent);
                self.out.push_str(line);
            }
        }
        self.out.push('\n');
        self.out.push_str(indent);
        true
    }

    /// Copies original text, moving continuation lines to `indent`.
    ///
    /// Lines that start inside a string literal belong to its value and are
    /// copied unchanged.
    fn verbatim(&mut self, range: TextRange, indent: &str) {
        let text = &self.source[range];
        let original = line_indent(self.source, range.start().to_usize());
        if original == indent {
            self.out.push_str(text);
            return;
        }
        let mut offset = range.start();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.out.push('\n');
                match line.strip_prefix(original) {
                    Some(rest) if !line.trim().is_empty() && !self.in_string(offset) => {
                        self.out.push_str(indent);
                        self.out.push_str(rest);
                    }
                    _ => self.out.push_str(line),
                }
            } else {
                self.out.push_str(line);
            }
            offset += TextSize::of(line) + TextSize::from(1);
        }
    }

    fn in_string(&self, offset: TextSize) -> bool {
        self.strings
            .iter()
            .any(|string| string.start() < offset && offset < string.end())
    }

    /// Indentation of original text at `offset` inside a container whose
    /// header starts at `header` and is printed at `indent`.
    ///
    /// Keeps the source's own nesting step; falls back to one unit when the
    /// text does not start its line.
    fn nested_indent(&self, header: TextSize, offset: Option<TextSize>, indent: &str) -> String {
        let original = line_indent(self.source, header.to_usize());
        offset
            .and_then(|offset| statement_indent(self.source, offset.to_usize()))
            .and_then(|nested| nested.strip_prefix(original))
            .filter(|delta| !delta.is_empty())
            .map_or_else(
                || format!("{indent}{}", self.unit),
                |delta| format!("{indent}{delta}"),
            )
    }

    /// Body indentation for a container printed at `indent`.
    fn body_indent(&self, header: TextSize, body: &[NodeId], indent: &str) -> String {
        let first = body
            .first()
            .and_then(|&id| self.tree.node(id).origin.anchor())
            .map(TextRange::start);
        self.nested_indent(header, first, indent)
    }

    fn statement(&mut self, id: NodeId, indent: &str) {
        let node = self.tree.node(id);
        if let Origin::Source(range) = node.origin {
            self.verbatim(range, indent);
            return;
        }
        match &node.kind {
            NodeKind::Loop(l) => self.loop_stmt(id, l, indent),
            NodeKind::Block(b) => self.block(b, indent),
            NodeKind::Assign { targets, value } => {
                for &target in targets {
                    self.expr(target, Precedence::Tuple);
                    self.out.push_str(" = ");
                }
                self.expr(*value, Precedence::Tuple);
            }
            NodeKind::AugAssign { target, op, value } => {
                self.expr(*target, Precedence::Tuple);
                self.out.push(' ');
                self.out.push_str(ops::symbol(*op));
                self.out.push_str("= ");
                self.expr(*value, Precedence::Tuple);
            }
            NodeKind::Import { names } => {
                self.out.push_str("import ");
                self.aliases(names);
            }
            NodeKind::ImportFrom {
                module,
                names,
                level,
            } => {
                self.out.push_str("from ");
                for _ in 0..*level {
                    self.out.push('.');
                }
                self.out.push_str(module.as_deref().unwrap_or_default());
                self.out.push_str(" import ");
                self.aliases(names);
            }
            NodeKind::ExprStmt { value } => self.expr(*value, Precedence::Tuple),
            NodeKind::Return { value } => {
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.expr(*value, Precedence::Tuple);
                }
            }
            NodeKind::Break => self.out.push_str("break"),
            NodeKind::Continue => self.out.push_str("continue"),
            NodeKind::Pass => self.out.push_str("pass"),
            _ => self.fallback(id),
        }
    }

    fn aliases(&mut self, names: &[super::Alias]) {
        for (i, alias) in names.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&alias.name);
            if let Some(asname) = &alias.asname {
                self.out.push_str(" as ");
                self.out.push_str(asname);
            }
        }
    }

    fn loop_stmt(&mut self, id: NodeId, l: &LoopNode, indent: &str) {
        // A rebuilt loop carries a body from another nesting level.
        let (inner, orelse_indent) = match self.tree.node(id).origin {
            Origin::Edited(range) => (
                self.body_indent(range.start(), &l.body, indent),
                self.body_indent(range.start(), &l.orelse, indent),
            ),
            _ => {
                let inner = format!("{indent}{}", self.unit);
                (inner.clone(), inner)
            }
        };
        let header_end = match self.loop_header(id, l) {
            Some(header) => {
                self.verbatim(header, indent);
                Some(header.end())
            }
            None => {
                if l.is_async {
                    self.out.push_str("async ");
                }
                self.out.push_str("for ");
                self.expr(l.target, Precedence::Tuple);
                self.out.push_str(" in ");
                self.expr(l.iter, Precedence::Tuple);
                self.out.push(':');
                None
            }
        };
        self.suite(&l.body, &inner, header_end, false);
        if !l.orelse.is_empty() {
            self.out.push('\n');
            self.out.push_str(indent);
            self.out.push_str("else:");
            self.suite(&l.orelse, &orelse_indent, None, false);
        }
    }

    /// Original `for ... :` text of an edited loop, up to and including the colon.
    fn loop_header(&self, id: NodeId, l: &LoopNode) -> Option<TextRange> {
        let Origin::Edited(range) = self.tree.node(id).origin else {
            return None;
        };
        let iter = self.tree.node(l.iter).origin.range()?;
        let body_start = l
            .body
            .first()
            .and_then(|&first| self.tree.node(first).origin.anchor())
            .map_or(range.end(), TextRange::start);
        if body_start < iter.end() {
            return None;
        }
        let between = &self.source[TextRange::new(iter.end(), body_start)];
        let colon = between.find(':')?;
        let end = iter.end() + TextSize::try_from(colon + 1).ok()?;
        Some(TextRange::new(range.start(), end))
    }

    fn block(&mut self, b: &BlockNode, indent: &str) {
        let inner = self.body_indent(b.header.start(), &b.body, indent);
        self.verbatim(b.header, indent);
        let mut prev = self.suite(&b.body, &inner, Some(b.header.end()), false);
        if b.body.is_empty() {
            prev = Some(b.header.end());
        }
        for clause in &b.clauses {
            match clause.header {
                ClauseHeader::Source(header) => {
                    let clause_indent = if clause.nested {
                        self.nested_indent(b.header.start(), Some(header.start()), indent)
                    } else {
                        indent.to_owned()
                    };
                    let body_indent = self.body_indent(header.start(), &clause.body, &clause_indent);
                    self.separator(prev, Some(header.start()), &clause_indent);
                    self.verbatim(header, &clause_indent);
                    prev = self.suite(&clause.body, &body_indent, Some(header.end()), false);
                }
                ClauseHeader::Keyword(keyword) => {
                    let clause_indent = if clause.nested { inner.clone() } else { indent.to_owned() };
                    let body_indent = format!("{clause_indent}{}", self.unit);
                    self.out.push('\n');
                    self.out.push_str(&clause_indent);
                    self.out.push_str(keyword);
                    self.out.push(':');
                    prev = self.suite(&clause.body, &body_indent, None, false);
                }
            }
        }
    }

    fn fallback(&mut self, id: NodeId) {
        match self.tree.text(id) {
            Some(text) => self.out.push_str(text),
            None => tracing::debug!("no text for synthesized node {}", id.index()),
        }
    }

    fn precedence(&self, id: NodeId) -> Precedence {
        match self.tree.kind(id) {
            NodeKind::BinOp { op, .. } => ops::precedence(*op),
            NodeKind::Tuple {
                parenthesized: false,
                ..
            } => Precedence::Tuple,
            NodeKind::Expr { label, .. } => match *label {
                "UnaryOp" => Precedence::Factor,
                "Await" => Precedence::Power,
                "List" | "Dict" | "Set" | "ListComp" | "SetComp" | "DictComp" | "JoinedStr"
                | "TemplateStr" => Precedence::Atom,
                _ => Precedence::Test,
            },
            _ => Precedence::Atom,
        }
    }

    fn expr(&mut self, id: NodeId, min: Precedence) {
        let wrap = self.precedence(id) < min;
        if wrap {
            self.out.push('(');
        }
        self.expr_inner(id);
        if wrap {
            self.out.push(')');
        }
    }

    fn expr_inner(&mut self, id: NodeId) {
        let node = self.tree.node(id);
        if let Some(range) = node.origin.range() {
            self.out.push_str(&self.source[range]);
            return;
        }
        match &node.kind {
            NodeKind::Name { id } => self.out.push_str(id),
            NodeKind::Constant { text, .. } => self.out.push_str(text),
            NodeKind::Attribute { value, attr } => {
                self.expr(*value, Precedence::Atom);
                self.out.push('.');
                self.out.push_str(attr);
            }
            NodeKind::Call {
                func,
                args,
                keywords,
            } => {
                self.expr(*func, Precedence::Atom);
                self.out.push('(');
                for (i, &arg) in args.iter().chain(keywords.iter()).enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(arg, Precedence::Test);
                }
                self.out.push(')');
            }
            NodeKind::Keyword { arg, value } => {
                match arg {
                    Some(arg) => {
                        self.out.push_str(arg);
                        self.out.push('=');
                    }
                    None => self.out.push_str("**"),
                }
                self.expr(*value, Precedence::Test);
            }
            NodeKind::Subscript { value, slice } => {
                self.expr(*value, Precedence::Atom);
                self.out.push('[');
                self.expr(*slice, Precedence::Tuple);
                self.out.push(']');
            }
            NodeKind::Tuple { elts, .. } => {
                if elts.is_empty() {
                    self.out.push_str("()");
                    return;
                }
                for (i, &elt) in elts.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(elt, Precedence::Test);
                }
                if elts.len() == 1 {
                    self.out.push(',');
                }
            }
            NodeKind::BinOp { left, op, right } => {
                let own = ops::precedence(*op);
                let (left_min, right_min) = if own == Precedence::Power {
                    (own.tighter(), own)
                } else {
                    (own, own.tighter())
                };
                self.expr(*left, left_min);
                self.out.push(' ');
                self.out.push_str(ops::symbol(*op));
                self.out.push(' ');
                self.expr(*right, right_min);
            }
            _ => self.fallback(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Location;
    use ruff_python_ast::Operator;

    #[test]
    fn test_unmodified_tree_round_trips() {
        let source = "#!/usr/bin/env python\n\"\"\"Doc.\"\"\"\n\nx = [1,2 ,3]  # odd spacing\n\n\ndef f():\n    return x\n";
        let tree = SyntaxTree::parse(source).unwrap();
        assert_eq!(unparse(&tree), source);
    }

    #[test]
    fn test_synthesized_binop_parenthesizes() {
        let mut tree = SyntaxTree::parse("a = 1\n").unwrap();
        let at = Location::default();
        let a = tree.alloc(NodeKind::Name { id: "a".into() }, at);
        let b = tree.alloc(NodeKind::Name { id: "b".into() }, at);
        let c = tree.alloc(NodeKind::Name { id: "c".into() }, at);
        let sum = tree.alloc(
            NodeKind::BinOp {
                left: a,
                op: Operator::Add,
                right: b,
            },
            at,
        );
        let product = tree.alloc(
            NodeKind::BinOp {
                left: sum,
                op: Operator::Mult,
                right: c,
            },
            at,
        );
        let mut printer = Printer {
            tree: &tree,
            source: tree.source(),
            unit: "    ".to_owned(),
            strings: Vec::new(),
            out: String::new(),
        };
        printer.expr(product, Precedence::Tuple);
        assert_eq!(printer.out, "(a + b) * c");
    }

    #[test]
    fn test_indent_unit_skips_bracket_continuations() {
        let tree = SyntaxTree::parse("x = f(\n  1)\nif x:\n    y = 2\n").unwrap();
        assert_eq!(indent_unit(&tree), "    ");
    }

    #[test]
    fn test_multiline_strings_collected() {
        let tree = SyntaxTree::parse("a = '''x\ny'''\nb = 'z'\nc = f\"{a}\"\n").unwrap();
        assert_eq!(multiline_strings(&tree), vec![TextRange::new(4.into(), 13.into())]);
    }

    #[test]
    fn test_edited_module_keeps_comments_between_statements() {
        let source = "x = 1\n# keep me\n\ny = 2\n";
        let mut tree = SyntaxTree::parse(source).unwrap();
        let root = tree.root();
        tree.mark_edited(root);
        assert_eq!(unparse(&tree), source);
    }

    #[test]
    fn test_edited_function_reprints_header_and_body() {
        let source = "def f(a,\n      b):  # header\n    # body comment\n    return a\n";
        let mut tree = SyntaxTree::parse(source).unwrap();
        let root = tree.root();
        let NodeKind::Module { body } = tree.kind(root).clone() else {
            panic!("expected module");
        };
        tree.mark_edited(root);
        tree.mark_edited(body[0]);
        assert_eq!(unparse(&tree), source);
    }
}
