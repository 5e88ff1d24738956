//! Structural dump of a subtree, in the shape of Python's `ast.dump`
//! without expression contexts.

use std::fmt::Write;

use super::{ops, Alias, BlockKind, NodeId, NodeKind, SyntaxTree};

/// Renders the subtree rooted at `id`, e.g.
/// `BinOp(left=Name(id='i'), op=Add(), right=Constant(value=1))`.
#[must_use]
pub fn dump(tree: &SyntaxTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

fn write_list(tree: &SyntaxTree, ids: &[NodeId], out: &mut String) {
    out.push('[');
    for (i, &id) in ids.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_node(tree, id, out);
    }
    out.push(']');
}

fn write_aliases(names: &[Alias], out: &mut String) {
    out.push_str("names=[");
    for (i, alias) in names.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "alias(name='{}'", alias.name);
        if let Some(asname) = &alias.asname {
            let _ = write!(out, ", asname='{asname}'");
        }
        out.push(')');
    }
    out.push(']');
}

/// Python `repr` of a `str` value.
pub(crate) fn str_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = u32::from(c);
                let _ = match code {
                    0..=0xff => write!(out, "\\x{code:02x}"),
                    0x100..=0xffff => write!(out, "\\u{code:04x}"),
                    _ => write!(out, "\\U{code:08x}"),
                };
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Python `repr` of a `bytes` value.
pub(crate) fn bytes_repr(value: &[u8]) -> String {
    let quote = if value.contains(&b'\'') && !value.contains(&b'"') { b'"' } else { b'\'' };
    let mut out = String::with_capacity(value.len() + 3);
    out.push('b');
    out.push(char::from(quote));
    for &byte in value {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b == quote => {
                out.push('\\');
                out.push(char::from(b));
            }
            0x20..=0x7e => out.push(char::from(byte)),
            _ => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push(char::from(quote));
    out
}

fn block_name(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Function => "FunctionDef",
        BlockKind::Class => "ClassDef",
        BlockKind::If => "If",
        BlockKind::While => "While",
        BlockKind::With => "With",
        BlockKind::Try => "Try",
        BlockKind::Match => "Match",
    }
}

fn write_node(tree: &SyntaxTree, id: NodeId, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Module { body } => {
            out.push_str("Module(body=");
            write_list(tree, body, out);
            out.push(')');
        }
        NodeKind::Loop(l) => {
            out.push_str(if l.is_async { "AsyncFor(target=" } else { "For(target=" });
            write_node(tree, l.target, out);
            out.push_str(", iter=");
            write_node(tree, l.iter, out);
            out.push_str(", body=");
            write_list(tree, &l.body, out);
            out.push_str(", orelse=");
            write_list(tree, &l.orelse, out);
            out.push(')');
        }
        NodeKind::Block(b) => {
            out.push_str(block_name(b.kind));
            out.push('(');
            write_list(tree, &tree.children(id), out);
            out.push(')');
        }
        NodeKind::Assign { targets, value } => {
            out.push_str("Assign(targets=");
            write_list(tree, targets, out);
            out.push_str(", value=");
            write_node(tree, *value, out);
            out.push(')');
        }
        NodeKind::AugAssign { target, op, value } => {
            out.push_str("AugAssign(target=");
            write_node(tree, *target, out);
            let _ = write!(out, ", op={}(), value=", ops::dump_name(*op));
            write_node(tree, *value, out);
            out.push(')');
        }
        NodeKind::Import { names } => {
            out.push_str("Import(");
            write_aliases(names, out);
            out.push(')');
        }
        NodeKind::ImportFrom {
            module,
            names,
            level,
        } => {
            out.push_str("ImportFrom(");
            if let Some(module) = module {
                let _ = write!(out, "module='{module}', ");
            }
            write_aliases(names, out);
            let _ = write!(out, ", level={level})");
        }
        NodeKind::ExprStmt { value } => {
            out.push_str("Expr(value=");
            write_node(tree, *value, out);
            out.push(')');
        }
        NodeKind::Return { value } => {
            out.push_str("Return(");
            if let Some(value) = value {
                out.push_str("value=");
                write_node(tree, *value, out);
            }
            out.push(')');
        }
        NodeKind::Break => out.push_str("Break()"),
        NodeKind::Continue => out.push_str("Continue()"),
        NodeKind::Pass => out.push_str("Pass()"),
        NodeKind::Simple { children } => {
            out.push_str("Stmt(");
            write_list(tree, children, out);
            out.push(')');
        }
        NodeKind::BinOp { left, op, right } => {
            out.push_str("BinOp(left=");
            write_node(tree, *left, out);
            let _ = write!(out, ", op={}(), right=", ops::dump_name(*op));
            write_node(tree, *right, out);
            out.push(')');
        }
        NodeKind::Subscript { value, slice } => {
            out.push_str("Subscript(value=");
            write_node(tree, *value, out);
            out.push_str(", slice=");
            write_node(tree, *slice, out);
            out.push(')');
        }
        NodeKind::Name { id } => {
            let _ = write!(out, "Name(id='{id}')");
        }
        NodeKind::Constant { repr, .. } => {
            let _ = write!(out, "Constant(value={repr})");
        }
        NodeKind::Call {
            func,
            args,
            keywords,
        } => {
            out.push_str("Call(func=");
            write_node(tree, *func, out);
            out.push_str(", args=");
            write_list(tree, args, out);
            out.push_str(", keywords=");
            write_list(tree, keywords, out);
            out.push(')');
        }
        NodeKind::Keyword { arg, value } => {
            out.push_str("keyword(");
            if let Some(arg) = arg {
                let _ = write!(out, "arg='{arg}', ");
            }
            out.push_str("value=");
            write_node(tree, *value, out);
            out.push(')');
        }
        NodeKind::Attribute { value, attr } => {
            out.push_str("Attribute(value=");
            write_node(tree, *value, out);
            let _ = write!(out, ", attr='{attr}')");
        }
        NodeKind::Tuple { elts, .. } => {
            out.push_str("Tuple(elts=");
            write_list(tree, elts, out);
            out.push(')');
        }
        NodeKind::Expr { label, children } => {
            out.push_str(label);
            out.push('(');
            for (i, &child) in children.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_node(tree, child, out);
            }
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parents::ParentIndex;

    fn dump_first_binop(source: &str) -> String {
        let tree = SyntaxTree::parse(source).unwrap();
        let index = ParentIndex::build(&tree);
        let id = index
            .preorder()
            .iter()
            .copied()
            .find(|&id| matches!(tree.kind(id), NodeKind::BinOp { .. }))
            .unwrap();
        dump(&tree, id)
    }

    #[test]
    fn test_dump_binop() {
        assert_eq!(
            dump_first_binop("y = i + 1\n"),
            "BinOp(left=Name(id='i'), op=Add(), right=Constant(value=1))"
        );
    }

    #[test]
    fn test_dump_normalizes_constants() {
        assert_eq!(
            dump_first_binop("y = 0x10 + 1_000\n"),
            "BinOp(left=Constant(value=16), op=Add(), right=Constant(value=1000))"
        );
        assert_eq!(
            dump_first_binop("y = \"it's\" + 'a' 'b'\n"),
            "BinOp(left=Constant(value=\"it's\"), op=Add(), right=Constant(value='ab'))"
        );
        assert_eq!(
            dump_first_binop("y = b\"\\x00\" * 1.0\n"),
            "BinOp(left=Constant(value=b'\\x00'), op=Mult(), right=Constant(value=1.0))"
        );
    }

    #[test]
    fn test_dump_import_from_names() {
        let tree = SyntaxTree::parse("from os import path as p, sep\n").unwrap();
        let NodeKind::Module { body } = tree.kind(tree.root()) else {
            panic!("expected module");
        };
        assert_eq!(
            dump(&tree, body[0]),
            "ImportFrom(module='os', names=[alias(name='path', asname='p'), alias(name='sep')], level=0)"
        );
    }

    #[test]
    fn test_str_repr_escapes() {
        assert_eq!(str_repr("a\nb"), "'a\\nb'");
        assert_eq!(str_repr("'\""), "'\\'\"'");
        assert_eq!(str_repr("back\\slash"), "'back\\\\slash'");
    }

    #[test]
    fn test_dump_nested_call() {
        assert_eq!(
            dump_first_binop("y = len(xs) * 2\n"),
            "BinOp(left=Call(func=Name(id='len'), args=[Name(id='xs')], keywords=[]), op=Mult(), right=Constant(value=2))"
        );
    }
}
