//! Statement nodes.

use decaf_core::{DeclId, ExprId, Span, StmtId};

use crate::NodeRef;

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
    /// Syntactic parent, installed once at assembly time.
    pub parent: Option<NodeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `{ decls stmts }`. Local declarations precede statements.
    Block {
        decls: Vec<DeclId>,
        stmts: Vec<StmtId>,
    },
    If {
        test: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        test: ExprId,
        body: StmtId,
    },
    For {
        init: Option<ExprId>,
        test: ExprId,
        step: Option<ExprId>,
        body: StmtId,
    },
    Return {
        value: Option<ExprId>,
    },
    Print {
        args: Vec<ExprId>,
    },
    Break,
    /// An expression evaluated for its effect.
    Expr(ExprId),
}

impl Stmt {
    /// Whether this statement is a `while` or `for` loop.
    pub fn is_loop(&self) -> bool {
        matches!(self.kind, StmtKind::While { .. } | StmtKind::For { .. })
    }
}
