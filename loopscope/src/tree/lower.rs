//! Lowering from the ruff AST into the arena.
//!
//! Nodes are allocated post-order: children first, then their parent, so the
//! module root is always the last node in the arena.

use compact_str::CompactString;
use ruff_python_ast::visitor::{walk_expr, walk_stmt, Visitor};
use ruff_python_ast::{self as ast, ExceptHandler, Expr, ModModule, Number, Stmt};
use ruff_text_size::{Ranged, TextRange, TextSize};

use super::{
    dump, Alias, BlockKind, BlockNode, Children, Clause, ClauseHeader, Literal, Location, LoopNode,
    Node, NodeId, NodeKind, Origin, SyntaxTree,
};
use crate::utils::LineIndex;

pub(super) fn lower_module(module: &ModModule, source: &str) -> SyntaxTree {
    let mut lowerer = Lowerer {
        source,
        index: LineIndex::new(source),
        nodes: Vec::new(),
    };
    let body = lowerer.lower_body(&module.body);
    let whole = TextRange::up_to(TextSize::of(source));
    let root = lowerer.push(NodeKind::Module { body }, whole);

    SyntaxTree {
        nodes: lowerer.nodes,
        root,
        source: source.to_owned(),
        leading_end: module
            .body
            .first()
            .map_or(source.len(), |stmt| stmt.start().to_usize()),
        trailing_start: module
            .body
            .last()
            .map_or(source.len(), |stmt| stmt.end().to_usize()),
    }
}

struct Lowerer<'src> {
    source: &'src str,
    index: LineIndex,
    nodes: Vec<Node>,
}

/// Collects the top-level expressions of a statement or expression without
/// descending into nested statements or sub-expressions.
#[derive(Default)]
struct ExprCollector<'a> {
    exprs: Vec<&'a Expr>,
}

impl<'a> Visitor<'a> for ExprCollector<'a> {
    fn visit_stmt(&mut self, _stmt: &'a Stmt) {}

    fn visit_expr(&mut self, expr: &'a Expr) {
        self.exprs.push(expr);
    }
}

impl Lowerer<'_> {
    fn push(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
        let location = Location {
            line: self.index.line_index(range.start()),
            column: self.index.column_index(range.start()),
        };
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            kind,
            origin: Origin::Source(range),
            location,
        });
        id
    }

    fn lower_body(&mut self, body: &[Stmt]) -> Vec<NodeId> {
        body.iter().map(|stmt| self.lower_stmt(stmt)).collect()
    }

    fn lower_exprs<'e>(&mut self, exprs: impl IntoIterator<Item = &'e Expr>) -> Children {
        exprs.into_iter().map(|expr| self.lower_expr(expr)).collect()
    }

    fn stmt_exprs(&mut self, stmt: &Stmt) -> Children {
        let mut collector = ExprCollector::default();
        walk_stmt(&mut collector, stmt);
        self.lower_exprs(collector.exprs)
    }

    /// Header range from `start` up to `end`, without trailing whitespace or
    /// comment-only lines.
    fn header(&self, start: TextSize, end: TextSize) -> TextRange {
        let mut text = self.source[TextRange::new(start, end)].trim_end();
        while let Some(nl) = text.rfind('\n') {
            if !text[nl + 1..].trim_start().starts_with('#') {
                break;
            }
            text = text[..nl].trim_end();
        }
        TextRange::at(start, TextSize::of(text))
    }

    fn block(
        &mut self,
        stmt: &Stmt,
        kind: BlockKind,
        exprs: Children,
        body: &[Stmt],
        clauses: Vec<Clause>,
    ) -> NodeKind {
        let header_end = match stmt {
            Stmt::Match(node) => node.cases.first().map_or(stmt.end(), Ranged::start),
            _ => body.first().map_or(stmt.end(), Ranged::start),
        };
        NodeKind::Block(BlockNode {
            kind,
            header: self.header(stmt.start(), header_end),
            exprs,
            body: self.lower_body(body),
            clauses,
        })
    }

    fn clause(
        &mut self,
        start: Option<TextSize>,
        keyword: &'static str,
        exprs: Children,
        body: &[Stmt],
        nested: bool,
    ) -> Clause {
        let header = match start {
            Some(start) => {
                let end = body.first().map_or(start, Ranged::start);
                ClauseHeader::Source(self.header(start, end))
            }
            None => ClauseHeader::Keyword(keyword),
        };
        Clause {
            header,
            exprs,
            body: self.lower_body(body),
            nested,
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> NodeId {
        let kind = match stmt {
            Stmt::For(node) => {
                let target = self.lower_expr(&node.target);
                let iter = self.lower_expr(&node.iter);
                NodeKind::Loop(LoopNode {
                    target,
                    iter,
                    body: self.lower_body(&node.body),
                    orelse: self.lower_body(&node.orelse),
                    is_async: node.is_async,
                })
            }
            Stmt::Assign(node) => {
                let targets = node.targets.iter().map(|t| self.lower_expr(t)).collect();
                NodeKind::Assign {
                    targets,
                    value: self.lower_expr(&node.value),
                }
            }
            Stmt::AugAssign(node) => {
                let target = self.lower_expr(&node.target);
                NodeKind::AugAssign {
                    target,
                    op: node.op,
                    value: self.lower_expr(&node.value),
                }
            }
            Stmt::Import(node) => NodeKind::Import {
                names: node.names.iter().map(lower_alias).collect(),
            },
            Stmt::ImportFrom(node) => NodeKind::ImportFrom {
                module: node.module.as_ref().map(|m| m.as_str().into()),
                names: node.names.iter().map(lower_alias).collect(),
                level: node.level,
            },
            Stmt::Expr(node) => NodeKind::ExprStmt {
                value: self.lower_expr(&node.value),
            },
            Stmt::Return(node) => NodeKind::Return {
                value: node.value.as_deref().map(|v| self.lower_expr(v)),
            },
            Stmt::Break(_) => NodeKind::Break,
            Stmt::Continue(_) => NodeKind::Continue,
            Stmt::Pass(_) => NodeKind::Pass,
            Stmt::FunctionDef(node) => {
                let exprs = self.stmt_exprs(stmt);
                self.block(stmt, BlockKind::Function, exprs, &node.body, Vec::new())
            }
            Stmt::ClassDef(node) => {
                let exprs = self.stmt_exprs(stmt);
                self.block(stmt, BlockKind::Class, exprs, &node.body, Vec::new())
            }
            Stmt::With(node) => {
                let exprs = self.stmt_exprs(stmt);
                self.block(stmt, BlockKind::With, exprs, &node.body, Vec::new())
            }
            Stmt::If(node) => {
                let exprs = self.lower_exprs([&*node.test]);
                let clauses = node
                    .elif_else_clauses
                    .iter()
                    .map(|clause| {
                        let exprs = self.lower_exprs(clause.test.as_ref());
                        self.clause(Some(clause.start()), "else", exprs, &clause.body, false)
                    })
                    .collect();
                self.block(stmt, BlockKind::If, exprs, &node.body, clauses)
            }
            Stmt::While(node) => {
                let exprs = self.lower_exprs([&*node.test]);
                let mut clauses = Vec::new();
                if !node.orelse.is_empty() {
                    clauses.push(self.clause(None, "else", Children::new(), &node.orelse, false));
                }
                self.block(stmt, BlockKind::While, exprs, &node.body, clauses)
            }
            Stmt::Try(node) => self.lower_try(stmt, node),
            Stmt::Match(node) => {
                let exprs = self.lower_exprs([&*node.subject]);
                let clauses = node
                    .cases
                    .iter()
                    .map(|case| {
                        let exprs = self.lower_exprs(case.guard.as_deref());
                        self.clause(Some(case.start()), "case", exprs, &case.body, true)
                    })
                    .collect();
                self.block(stmt, BlockKind::Match, exprs, &[], clauses)
            }
            _ => NodeKind::Simple {
                children: self.stmt_exprs(stmt),
            },
        };
        self.push(kind, stmt.range())
    }

    fn lower_try(&mut self, stmt: &Stmt, node: &ast::StmtTry) -> NodeKind {
        let mut clauses = Vec::new();
        for handler in &node.handlers {
            let ExceptHandler::ExceptHandler(h) = handler;
            let exprs = self.lower_exprs(h.type_.as_deref());
            clauses.push(self.clause(Some(h.start()), "except", exprs, &h.body, false));
        }
        if !node.orelse.is_empty() {
            clauses.push(self.clause(None, "else", Children::new(), &node.orelse, false));
        }
        if !node.finalbody.is_empty() {
            clauses.push(self.clause(None, "finally", Children::new(), &node.finalbody, false));
        }
        self.block(stmt, BlockKind::Try, Children::new(), &node.body, clauses)
    }

    fn lower_expr(&mut self, expr: &Expr) -> NodeId {
        let kind = match expr {
            Expr::BinOp(node) => {
                let left = self.lower_expr(&node.left);
                NodeKind::BinOp {
                    left,
                    op: node.op,
                    right: self.lower_expr(&node.right),
                }
            }
            Expr::Subscript(node) => {
                let value = self.lower_expr(&node.value);
                NodeKind::Subscript {
                    value,
                    slice: self.lower_expr(&node.slice),
                }
            }
            Expr::Name(node) => NodeKind::Name {
                id: node.id.as_str().into(),
            },
            Expr::Call(node) => {
                let func = self.lower_expr(&node.func);
                let args = self.lower_exprs(node.arguments.args.iter());
                let keywords = node
                    .arguments
                    .keywords
                    .iter()
                    .map(|keyword| {
                        let value = self.lower_expr(&keyword.value);
                        self.push(
                            NodeKind::Keyword {
                                arg: keyword.arg.as_ref().map(|a| a.as_str().into()),
                                value,
                            },
                            keyword.range(),
                        )
                    })
                    .collect();
                NodeKind::Call {
                    func,
                    args,
                    keywords,
                }
            }
            Expr::Attribute(node) => NodeKind::Attribute {
                value: self.lower_expr(&node.value),
                attr: node.attr.as_str().into(),
            },
            Expr::Tuple(node) => NodeKind::Tuple {
                elts: self.lower_exprs(node.elts.iter()),
                parenthesized: node.parenthesized,
            },
            Expr::NumberLiteral(node) => match &node.value {
                Number::Int(int) => {
                    let digits = int.to_string();
                    self.constant(expr, Literal::Int(digits.parse().ok()), digits)
                }
                Number::Float(value) => self.constant(expr, Literal::Float, format!("{value:?}")),
                Number::Complex { imag, .. } => {
                    self.constant(expr, Literal::Complex, format!("{imag}j"))
                }
            },
            Expr::StringLiteral(node) => {
                self.constant(expr, Literal::Str, dump::str_repr(node.value.to_str()))
            }
            Expr::BytesLiteral(node) => {
                let bytes: Vec<u8> = node.value.bytes().collect();
                self.constant(expr, Literal::Bytes, dump::bytes_repr(&bytes))
            }
            Expr::BooleanLiteral(node) => {
                let repr = if node.value { "True" } else { "False" };
                self.constant(expr, Literal::Bool(node.value), repr)
            }
            Expr::NoneLiteral(_) => self.constant(expr, Literal::None, "None"),
            Expr::EllipsisLiteral(_) => self.constant(expr, Literal::Ellipsis, "Ellipsis"),
            _ => {
                let mut collector = ExprCollector::default();
                walk_expr(&mut collector, expr);
                NodeKind::Expr {
                    label: expr_label(expr),
                    children: self.lower_exprs(collector.exprs),
                }
            }
        };
        self.push(kind, expr.range())
    }

    fn constant(&self, expr: &Expr, value: Literal, repr: impl Into<CompactString>) -> NodeKind {
        NodeKind::Constant {
            value,
            text: self.source[expr.range()].into(),
            repr: repr.into(),
        }
    }
}

fn lower_alias(alias: &ast::Alias) -> Alias {
    Alias {
        name: alias.name.as_str().into(),
        asname: alias.asname.as_ref().map(|a| a.as_str().into()),
    }
}

/// Python `ast` class name of expressions kept opaque.
fn expr_label(expr: &Expr) -> &'static str {
    match expr {
        Expr::BoolOp(_) => "BoolOp",
        Expr::Named(_) => "NamedExpr",
        Expr::UnaryOp(_) => "UnaryOp",
        Expr::Lambda(_) => "Lambda",
        Expr::If(_) => "IfExp",
        Expr::Dict(_) => "Dict",
        Expr::Set(_) => "Set",
        Expr::ListComp(_) => "ListComp",
        Expr::SetComp(_) => "SetComp",
        Expr::DictComp(_) => "DictComp",
        Expr::Generator(_) => "GeneratorExp",
        Expr::Await(_) => "Await",
        Expr::Yield(_) => "Yield",
        Expr::YieldFrom(_) => "YieldFrom",
        Expr::Compare(_) => "Compare",
        Expr::FString(_) => "JoinedStr",
        Expr::TString(_) => "TemplateStr",
        Expr::Starred(_) => "Starred",
        Expr::List(_) => "List",
        Expr::Slice(_) => "Slice",
        _ => "Expr",
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;

    fn first_stmt(tree: &SyntaxTree) -> NodeId {
        match tree.kind(tree.root()) {
            NodeKind::Module { body } => body[0],
            _ => panic!("expected module"),
        }
    }

    #[test]
    fn test_root_allocated_last() {
        let tree = SyntaxTree::parse("a = 1\nb = a + 2\n").unwrap();
        assert_eq!(tree.root().index(), tree.len() - 1);
    }

    #[test]
    fn test_block_header_excludes_trailing_comments() {
        let source = "def f(x):\n    # leading comment\n    return x\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let NodeKind::Block(block) = tree.kind(first_stmt(&tree)) else {
            panic!("expected block");
        };
        assert_eq!(block.kind, BlockKind::Function);
        assert_eq!(&source[block.header], "def f(x):");
    }

    #[test]
    fn test_int_literal_value() {
        let tree = SyntaxTree::parse("x = 5000\n").unwrap();
        let NodeKind::Assign { value, .. } = tree.kind(first_stmt(&tree)) else {
            panic!("expected assign");
        };
        assert_eq!(
            tree.kind(*value),
            &NodeKind::Constant {
                value: Literal::Int(Some(5000)),
                text: "5000".into(),
                repr: "5000".into(),
            }
        );
    }

    #[test]
    fn test_locations_are_one_based_lines() {
        let tree = SyntaxTree::parse("x = 1\n\nfor i in y:\n    pass\n").unwrap();
        let NodeKind::Module { body } = tree.kind(tree.root()) else {
            panic!("expected module");
        };
        assert_eq!(tree.node(body[1]).location, Location { line: 3, column: 0 });
    }

    #[test]
    fn test_if_clauses() {
        let source = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let NodeKind::Block(block) = tree.kind(first_stmt(&tree)) else {
            panic!("expected block");
        };
        assert_eq!(block.clauses.len(), 2);
        let ClauseHeader::Source(elif) = block.clauses[0].header else {
            panic!("expected source header");
        };
        assert_eq!(&source[elif], "elif b:");
        assert_eq!(block.clauses[0].exprs.len(), 1);
    }
}
