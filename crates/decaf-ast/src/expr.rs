//! Expression nodes.

use std::fmt;

use decaf_core::{ExprId, Span};
use ordered_float::OrderedFloat;

use crate::{Ident, NodeRef, TypeExpr};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Syntactic parent, installed once at assembly time.
    pub parent: Option<NodeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    IntConst(i32),
    DoubleConst(OrderedFloat<f64>),
    BoolConst(bool),
    StringConst(String),
    Null,
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Assign {
        target: ExprId,
        value: ExprId,
    },
    /// `base.field`, or a bare identifier when `base` is `None`.
    FieldAccess {
        base: Option<ExprId>,
        field: Ident,
    },
    ArrayAccess {
        base: ExprId,
        index: ExprId,
    },
    /// `base.field(actuals)`, or a free or implicit-receiver call when
    /// `base` is `None`.
    Call {
        base: Option<ExprId>,
        field: Ident,
        actuals: Vec<ExprId>,
    },
    /// `new C`
    New(Ident),
    /// `NewArray(size, elem)`
    NewArray {
        size: ExprId,
        elem: TypeExpr,
    },
    This,
    ReadInteger,
    ReadLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Whether the operator yields a boolean from ordered operands.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation, `-x`.
    Neg,
    /// Logical not, `!x`.
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}

impl Expr {
    /// Whether this expression can appear on the left of `=`.
    pub fn is_lvalue(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::FieldAccess { .. } | ExprKind::ArrayAccess { .. }
        )
    }
}
