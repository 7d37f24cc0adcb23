//! Tree assembly.
//!
//! [`AstBuilder`] is the surface an external parser drives: children are
//! built first, and each parent constructor installs its children's parent
//! links under the id the parent is about to take, then pushes the parent.
//! Links are written exactly once; [`AstBuilder::finish`] attaches
//! top-level declarations to the program root.

use decaf_core::{DeclId, ExprId, Span, StmtId};
use ordered_float::OrderedFloat;

use crate::{
    Ast, BinaryOp, ClassDecl, Decl, DeclKind, Expr, ExprKind, FnDecl, Ident, InterfaceDecl,
    NodeRef, Stmt, StmtKind, TypeExpr, UnaryOp, VarDecl,
};

/// Incremental builder for an [`Ast`].
#[derive(Debug, Default)]
pub struct AstBuilder {
    ast: Ast,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal the tree with `program` as its top-level declarations.
    pub fn finish(mut self, program: Vec<DeclId>) -> Ast {
        for &decl in &program {
            self.adopt(NodeRef::Decl(decl), NodeRef::Program);
        }
        self.ast.program = program;
        self.ast
    }

    // ==========================================================================
    // Parent Links
    // ==========================================================================

    fn adopt(&mut self, child: NodeRef, parent: NodeRef) {
        let slot = match child {
            NodeRef::Program => return,
            NodeRef::Decl(id) => &mut self.ast.decls[id.index()].parent,
            NodeRef::Stmt(id) => &mut self.ast.stmts[id.index()].parent,
            NodeRef::Expr(id) => &mut self.ast.exprs[id.index()].parent,
        };
        debug_assert!(slot.is_none(), "{:?} already has a parent", child);
        *slot = Some(parent);
    }

    fn adopt_decls(&mut self, children: &[DeclId], parent: NodeRef) {
        for &child in children {
            self.adopt(NodeRef::Decl(child), parent);
        }
    }

    fn adopt_exprs(&mut self, children: &[ExprId], parent: NodeRef) {
        for &child in children {
            self.adopt(NodeRef::Expr(child), parent);
        }
    }

    fn span_of(&self, expr: ExprId) -> Span {
        self.ast.exprs[expr.index()].span
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn next_decl(&self) -> DeclId {
        DeclId::new(self.ast.decls.len() as u32)
    }

    fn push_decl(&mut self, name: Ident, kind: DeclKind) -> DeclId {
        let id = self.next_decl();
        self.ast.decls.push(Decl {
            name,
            kind,
            parent: None,
        });
        id
    }

    /// Variable, field, or formal.
    pub fn var(&mut self, name: Ident, ty: TypeExpr) -> DeclId {
        self.push_decl(name, DeclKind::Var(VarDecl { ty }))
    }

    pub fn class(
        &mut self,
        name: Ident,
        extends: Option<Ident>,
        implements: Vec<Ident>,
        members: Vec<DeclId>,
    ) -> DeclId {
        self.adopt_decls(&members, NodeRef::Decl(self.next_decl()));
        self.push_decl(
            name,
            DeclKind::Class(ClassDecl {
                extends,
                implements,
                members,
            }),
        )
    }

    pub fn interface(&mut self, name: Ident, members: Vec<DeclId>) -> DeclId {
        self.adopt_decls(&members, NodeRef::Decl(self.next_decl()));
        self.push_decl(name, DeclKind::Interface(InterfaceDecl { members }))
    }

    /// Function or method. Prototypes pass `body: None`.
    pub fn function(
        &mut self,
        name: Ident,
        return_type: TypeExpr,
        formals: Vec<DeclId>,
        body: Option<StmtId>,
    ) -> DeclId {
        let parent = NodeRef::Decl(self.next_decl());
        self.adopt_decls(&formals, parent);
        if let Some(body) = body {
            self.adopt(NodeRef::Stmt(body), parent);
        }
        self.push_decl(
            name,
            DeclKind::Function(FnDecl {
                return_type,
                formals,
                body,
            }),
        )
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn next_stmt(&self) -> StmtId {
        StmtId::new(self.ast.stmts.len() as u32)
    }

    fn push_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = self.next_stmt();
        self.ast.stmts.push(Stmt {
            kind,
            span,
            parent: None,
        });
        id
    }

    pub fn block(&mut self, decls: Vec<DeclId>, stmts: Vec<StmtId>, span: Span) -> StmtId {
        let parent = NodeRef::Stmt(self.next_stmt());
        self.adopt_decls(&decls, parent);
        for &stmt in &stmts {
            self.adopt(NodeRef::Stmt(stmt), parent);
        }
        self.push_stmt(StmtKind::Block { decls, stmts }, span)
    }

    pub fn if_stmt(
        &mut self,
        test: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
        span: Span,
    ) -> StmtId {
        let id = self.push_stmt(
            StmtKind::If {
                test,
                then_branch,
                else_branch,
            },
            span,
        );
        self.adopt(NodeRef::Expr(test), NodeRef::Stmt(id));
        self.adopt(NodeRef::Stmt(then_branch), NodeRef::Stmt(id));
        if let Some(else_branch) = else_branch {
            self.adopt(NodeRef::Stmt(else_branch), NodeRef::Stmt(id));
        }
        id
    }

    pub fn while_stmt(&mut self, test: ExprId, body: StmtId, span: Span) -> StmtId {
        let id = self.push_stmt(StmtKind::While { test, body }, span);
        self.adopt(NodeRef::Expr(test), NodeRef::Stmt(id));
        self.adopt(NodeRef::Stmt(body), NodeRef::Stmt(id));
        id
    }

    pub fn for_stmt(
        &mut self,
        init: Option<ExprId>,
        test: ExprId,
        step: Option<ExprId>,
        body: StmtId,
        span: Span,
    ) -> StmtId {
        let id = self.push_stmt(
            StmtKind::For {
                init,
                test,
                step,
                body,
            },
            span,
        );
        let parent = NodeRef::Stmt(id);
        if let Some(init) = init {
            self.adopt(NodeRef::Expr(init), parent);
        }
        self.adopt(NodeRef::Expr(test), parent);
        if let Some(step) = step {
            self.adopt(NodeRef::Expr(step), parent);
        }
        self.adopt(NodeRef::Stmt(body), parent);
        id
    }

    pub fn return_stmt(&mut self, value: Option<ExprId>, span: Span) -> StmtId {
        let id = self.push_stmt(StmtKind::Return { value }, span);
        if let Some(value) = value {
            self.adopt(NodeRef::Expr(value), NodeRef::Stmt(id));
        }
        id
    }

    pub fn print_stmt(&mut self, args: Vec<ExprId>, span: Span) -> StmtId {
        self.adopt_exprs(&args, NodeRef::Stmt(self.next_stmt()));
        self.push_stmt(StmtKind::Print { args }, span)
    }

    pub fn break_stmt(&mut self, span: Span) -> StmtId {
        self.push_stmt(StmtKind::Break, span)
    }

    /// Expression statement spanning its expression.
    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        let span = self.span_of(expr);
        let id = self.push_stmt(StmtKind::Expr(expr), span);
        self.adopt(NodeRef::Expr(expr), NodeRef::Stmt(id));
        id
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn next_expr(&self) -> ExprId {
        ExprId::new(self.ast.exprs.len() as u32)
    }

    fn push_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = self.next_expr();
        self.ast.exprs.push(Expr {
            kind,
            span,
            parent: None,
        });
        id
    }

    pub fn int_const(&mut self, value: i32, span: Span) -> ExprId {
        self.push_expr(ExprKind::IntConst(value), span)
    }

    pub fn double_const(&mut self, value: f64, span: Span) -> ExprId {
        self.push_expr(ExprKind::DoubleConst(OrderedFloat(value)), span)
    }

    pub fn bool_const(&mut self, value: bool, span: Span) -> ExprId {
        self.push_expr(ExprKind::BoolConst(value), span)
    }

    pub fn string_const(&mut self, value: impl Into<String>, span: Span) -> ExprId {
        self.push_expr(ExprKind::StringConst(value.into()), span)
    }

    pub fn null(&mut self, span: Span) -> ExprId {
        self.push_expr(ExprKind::Null, span)
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        let span = self.span_of(left).join(self.span_of(right));
        let id = self.push_expr(ExprKind::Binary { op, left, right }, span);
        self.adopt_exprs(&[left, right], NodeRef::Expr(id));
        id
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId, span: Span) -> ExprId {
        let id = self.push_expr(ExprKind::Unary { op, operand }, span);
        self.adopt(NodeRef::Expr(operand), NodeRef::Expr(id));
        id
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        let span = self.span_of(target).join(self.span_of(value));
        let id = self.push_expr(ExprKind::Assign { target, value }, span);
        self.adopt_exprs(&[target, value], NodeRef::Expr(id));
        id
    }

    /// Bare identifier use, `x`.
    pub fn ident(&mut self, name: Ident) -> ExprId {
        self.field_access(None, name)
    }

    pub fn field_access(&mut self, base: Option<ExprId>, field: Ident) -> ExprId {
        let span = match base {
            Some(base) => self.span_of(base).join(field.span),
            None => field.span,
        };
        let id = self.push_expr(ExprKind::FieldAccess { base, field }, span);
        if let Some(base) = base {
            self.adopt(NodeRef::Expr(base), NodeRef::Expr(id));
        }
        id
    }

    pub fn array_access(&mut self, base: ExprId, index: ExprId) -> ExprId {
        let span = self.span_of(base).join(self.span_of(index));
        let id = self.push_expr(ExprKind::ArrayAccess { base, index }, span);
        self.adopt_exprs(&[base, index], NodeRef::Expr(id));
        id
    }

    pub fn call(
        &mut self,
        base: Option<ExprId>,
        field: Ident,
        actuals: Vec<ExprId>,
        span: Span,
    ) -> ExprId {
        let parent = NodeRef::Expr(self.next_expr());
        if let Some(base) = base {
            self.adopt(NodeRef::Expr(base), parent);
        }
        self.adopt_exprs(&actuals, parent);
        self.push_expr(
            ExprKind::Call {
                base,
                field,
                actuals,
            },
            span,
        )
    }

    /// `new C`
    pub fn new_object(&mut self, class: Ident, span: Span) -> ExprId {
        self.push_expr(ExprKind::New(class), span)
    }

    /// `NewArray(size, elem)`
    pub fn new_array(&mut self, size: ExprId, elem: TypeExpr, span: Span) -> ExprId {
        let id = self.push_expr(ExprKind::NewArray { size, elem }, span);
        self.adopt(NodeRef::Expr(size), NodeRef::Expr(id));
        id
    }

    pub fn this(&mut self, span: Span) -> ExprId {
        self.push_expr(ExprKind::This, span)
    }

    pub fn read_integer(&mut self, span: Span) -> ExprId {
        self.push_expr(ExprKind::ReadInteger, span)
    }

    pub fn read_line(&mut self, span: Span) -> ExprId {
        self.push_expr(ExprKind::ReadLine, span)
    }
}
