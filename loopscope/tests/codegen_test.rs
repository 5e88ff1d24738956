//! Integration tests for printing trees back to source.

#![allow(clippy::unwrap_used)]

use loopscope::tree::codegen::unparse;
use loopscope::{RewriteEngine, SyntaxTree};

const MIXED: &str = r#"#!/usr/bin/env python
"""A module with a bit of everything."""
from __future__ import annotations

import os  # trailing comment


@decorator(option=True)
class Worker(Base):
    """Docs."""

    def run(self, items: list[int]) -> int:
        total = 0
        for item in items:
            if item % 2:
                total += item
            elif item > 10:
                continue
            else:
                break
        else:
            total = -1
        return total

    async def fetch(self):
        async with session() as s:
            async for chunk in s:
                yield chunk


match command.split():
    case [action]:
        pass
    case [action, obj]:
        handle(action,
               obj)
    case _:
        pass

try:
    value = compute()
except (KeyError, ValueError) as exc:
    raise RuntimeError("bad") from exc
else:
    print(value)
finally:
    cleanup()
"#;

#[test]
fn test_unmodified_tree_prints_source() {
    let tree = SyntaxTree::parse(MIXED).unwrap();
    assert_eq!(unparse(&tree), MIXED);
}

#[test]
fn test_edited_root_keeps_trivia() {
    let mut tree = SyntaxTree::parse(MIXED).unwrap();
    let root = tree.root();
    tree.mark_edited(root);
    assert_eq!(unparse(&tree), MIXED);
}

#[test]
fn test_engine_without_matches_keeps_source() {
    let out = RewriteEngine::default().rewrite(SyntaxTree::parse(MIXED).unwrap());
    assert!(!out.changed());
    assert_eq!(out.source(), MIXED);
}

#[test]
fn test_rewrite_inside_try_reindents_body() {
    let source = "\
class Grid:
    def cells(self):
        try:
            for i in range(2):
                for j in range(2):
                    yield i, j
        except ValueError:
            pass
        finally:
            log()
";
    let out = RewriteEngine::default().rewrite(SyntaxTree::parse(source).unwrap());
    assert_eq!(
        out.source(),
        "\
import itertools
class Grid:
    def cells(self):
        try:
            for i, j in itertools.product(range(2), range(2)):
                yield i, j
        except ValueError:
            pass
        finally:
            log()
"
    );
}

#[test]
fn test_rewrite_inside_if_keeps_else_clause() {
    let source = "\
def scale(arr, flag):
    if flag:
        for i in range(len(arr)):
            arr[i] = arr[i] * 3
    else:
        arr = []
    return arr
";
    let out = RewriteEngine::default().rewrite(SyntaxTree::parse(source).unwrap());
    assert_eq!(
        out.source(),
        "\
import numpy as np
def scale(arr, flag):
    if flag:
        arr = np.array(arr)
        arr = arr * 3
    else:
        arr = []
    return arr
"
    );
}

#[test]
fn test_rewritten_output_parses() {
    let source = "\
for x in range(10):
    for y in range(20):
        grid[x][y] = x * y
values = [0.5, 1.5]
for i in range(len(values)):
    values[i] *= 2.0
";
    let out = RewriteEngine::default().rewrite(SyntaxTree::parse(source).unwrap());
    assert_eq!(out.applied.len(), 2);
    let printed = out.source();
    assert!(SyntaxTree::parse(&printed).is_ok(), "{printed}");
    assert!(printed.contains("values = values * 2.0"));
}

#[test]
fn test_moved_body_keeps_string_lines() {
    let source = r#"for i in range(2):
    for j in range(2):
        print("""first
    second
        third""", i, j)
"#;
    let out = RewriteEngine::default().rewrite(SyntaxTree::parse(source).unwrap());
    assert_eq!(
        out.source(),
        r#"import itertools
for i, j in itertools.product(range(2), range(2)):
    print("""first
    second
        third""", i, j)
"#
    );
}

#[test]
fn test_edited_blocks_keep_original_body_indentation() {
    let source = "\
x = foo(
  1)
def f(a):
    if a:
        for i in range(3):
            for j in range(3):
                g(i, j)
    return a
";
    let out = RewriteEngine::default().rewrite(SyntaxTree::parse(source).unwrap());
    assert_eq!(
        out.source(),
        "\
import itertools
x = foo(
  1)
def f(a):
    if a:
        for i, j in itertools.product(range(3), range(3)):
            g(i, j)
    return a
"
    );
}

#[test]
fn test_two_space_file_keeps_its_indentation() {
    let source = "\
def f(arr):
  if arr:
    for i in range(len(arr)):
      arr[i] += 1
  return arr
";
    let out = RewriteEngine::default().rewrite(SyntaxTree::parse(source).unwrap());
    assert_eq!(
        out.source(),
        "\
import numpy as np
def f(arr):
  if arr:
    arr = np.array(arr)
    arr = arr + 1
  return arr
"
    );
}
