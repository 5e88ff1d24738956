//! Operator spelling and precedence.

use ruff_python_ast::Operator;

/// Binding strength used by the printer to decide on parentheses.
///
/// Ordered from loosest to tightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Tuple,
    Test,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Arith,
    Term,
    Factor,
    Power,
    Atom,
}

impl Precedence {
    /// The next tighter level.
    #[must_use]
    pub fn tighter(self) -> Self {
        match self {
            Precedence::Tuple => Precedence::Test,
            Precedence::Test => Precedence::BitOr,
            Precedence::BitOr => Precedence::BitXor,
            Precedence::BitXor => Precedence::BitAnd,
            Precedence::BitAnd => Precedence::Shift,
            Precedence::Shift => Precedence::Arith,
            Precedence::Arith => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Power,
            Precedence::Power | Precedence::Atom => Precedence::Atom,
        }
    }
}

/// Source spelling of a binary operator.
#[must_use]
pub fn symbol(op: Operator) -> &'static str {
    match op {
        Operator::Add => "+",
        Operator::Sub => "-",
        Operator::Mult => "*",
        Operator::MatMult => "@",
        Operator::Div => "/",
        Operator::Mod => "%",
        Operator::Pow => "**",
        Operator::LShift => "<<",
        Operator::RShift => ">>",
        Operator::BitOr => "|",
        Operator::BitXor => "^",
        Operator::BitAnd => "&",
        Operator::FloorDiv => "//",
    }
}

/// Node name of a binary operator in structural dumps (`Add`, `Mult` ...).
#[must_use]
pub fn dump_name(op: Operator) -> &'static str {
    match op {
        Operator::Add => "Add",
        Operator::Sub => "Sub",
        Operator::Mult => "Mult",
        Operator::MatMult => "MatMult",
        Operator::Div => "Div",
        Operator::Mod => "Mod",
        Operator::Pow => "Pow",
        Operator::LShift => "LShift",
        Operator::RShift => "RShift",
        Operator::BitOr => "BitOr",
        Operator::BitXor => "BitXor",
        Operator::BitAnd => "BitAnd",
        Operator::FloorDiv => "FloorDiv",
    }
}

#[must_use]
pub fn precedence(op: Operator) -> Precedence {
    match op {
        Operator::BitOr => Precedence::BitOr,
        Operator::BitXor => Precedence::BitXor,
        Operator::BitAnd => Precedence::BitAnd,
        Operator::LShift | Operator::RShift => Precedence::Shift,
        Operator::Add | Operator::Sub => Precedence::Arith,
        Operator::Mult | Operator::MatMult | Operator::Div | Operator::Mod | Operator::FloorDiv => {
            Precedence::Term
        }
        Operator::Pow => Precedence::Power,
    }
}

/// Whether `op` is one of the operators flagged inside loops (`+`, `*`).
#[must_use]
pub fn is_repeatable(op: Operator) -> bool {
    matches!(op, Operator::Add | Operator::Mult)
}

/// Whether an element-wise array operation gives the same result as `op`
/// applied per element.
#[must_use]
pub fn is_vectorizable(op: Operator) -> bool {
    matches!(op, Operator::Add | Operator::Sub | Operator::Mult)
}
