//! Symbol Pass (Pass 1) - Build scopes and enter declarations.
//!
//! One traversal of the tree that allocates a scope per class, interface,
//! function, and block-introducing statement, and enters every declaration
//! into the scope active when it is reached.
//!
//! ## Responsibilities
//!
//! - Allocate the scope tree mirroring AST nesting
//! - Enter variables, classes, interfaces, and functions into their owning scope
//! - Record each class with its fresh scope as an [`Inheritable`]
//!
//! Nothing is resolved here. Superclass and interface names are left for the
//! [`InheritanceResolver`](super::InheritanceResolver), so a class may extend
//! one declared later in the file.
//!
//! ## Example
//!
//! ```text
//! int g;                    global: { g, A, main }
//! class A { int x; }          scope(A): { x }
//! void main() {               scope(main): { }
//!   { int y; }                  scope(block): { }
//! }                               scope(block): { y }
//! ```

use decaf_ast::{Ast, DeclKind, NodeRef, StmtKind};
use decaf_core::{DeclId, ScopeId, StmtId};

use crate::scope::ScopeTable;

/// A class paired with the scope allocated for it, awaiting inheritance
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inheritable {
    pub class: DeclId,
    pub scope: ScopeId,
}

/// Output of the symbol pass.
#[derive(Debug)]
pub struct SymbolOutput {
    /// The populated scope tree.
    pub scopes: ScopeTable,
    /// Every class in traversal order.
    pub inheritables: Vec<Inheritable>,
}

/// Stack of active scopes threaded through the traversal.
#[derive(Debug)]
struct ScopeContext {
    active: Vec<ScopeId>,
}

impl ScopeContext {
    fn new(global: ScopeId) -> Self {
        Self {
            active: vec![global],
        }
    }

    fn current(&self) -> ScopeId {
        // The global scope is never exited.
        self.active[self.active.len() - 1]
    }

    fn enter(&mut self, scope: ScopeId) {
        self.active.push(scope);
    }

    fn exit(&mut self) {
        debug_assert!(self.active.len() > 1, "global scope exited");
        self.active.pop();
    }
}

/// Symbol Pass - builds the scope tree.
pub struct SymbolBuilder<'ast> {
    ast: &'ast Ast,
    scopes: ScopeTable,
    inheritables: Vec<Inheritable>,
    ctx: ScopeContext,
}

impl<'ast> SymbolBuilder<'ast> {
    /// Create a new symbol pass over `ast`.
    pub fn new(ast: &'ast Ast) -> Self {
        let scopes = ScopeTable::new();
        let ctx = ScopeContext::new(scopes.global());
        Self {
            ast,
            scopes,
            inheritables: Vec::new(),
            ctx,
        }
    }

    /// Run the symbol pass.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(level = "debug", skip_all, fields(decls = self.ast.decl_count()))]
    pub fn run(mut self) -> SymbolOutput {
        for &decl in self.ast.program() {
            self.visit_decl(decl);
        }

        tracing::debug!(
            scopes = self.scopes.len(),
            classes = self.inheritables.len(),
            "symbol pass complete"
        );

        SymbolOutput {
            scopes: self.scopes,
            inheritables: self.inheritables,
        }
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn visit_decl(&mut self, id: DeclId) {
        let ast = self.ast;
        let decl = ast.decl(id);
        let current = self.ctx.current();
        self.scopes.declare(current, decl.name(), id);
        tracing::trace!(name = decl.name(), kind = decl.kind_name(), "declared");

        match &decl.kind {
            DeclKind::Var(_) => {}
            DeclKind::Class(class) => {
                let scope = self.scopes.push_child(current, NodeRef::Decl(id));
                self.inheritables.push(Inheritable { class: id, scope });
                self.with_scope(scope, |this| {
                    for &member in &class.members {
                        this.visit_decl(member);
                    }
                });
            }
            DeclKind::Interface(iface) => {
                let scope = self.scopes.push_child(current, NodeRef::Decl(id));
                self.with_scope(scope, |this| {
                    for &member in &iface.members {
                        this.visit_decl(member);
                    }
                });
            }
            DeclKind::Function(func) => {
                let scope = self.scopes.push_child(current, NodeRef::Decl(id));
                self.with_scope(scope, |this| {
                    for &formal in &func.formals {
                        this.visit_decl(formal);
                    }
                    if let Some(body) = func.body {
                        this.visit_stmt(body);
                    }
                });
            }
        }
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn visit_stmt(&mut self, id: StmtId) {
        let ast = self.ast;
        match &ast.stmt(id).kind {
            StmtKind::Block { decls, stmts } => {
                self.nested(id, |this| {
                    for &decl in decls {
                        this.visit_decl(decl);
                    }
                    for &child in stmts {
                        this.visit_stmt(child);
                    }
                });
            }
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.nested(id, |this| {
                    this.visit_stmt(*then_branch);
                    if let Some(else_branch) = else_branch {
                        this.visit_stmt(*else_branch);
                    }
                });
            }
            StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
                self.nested(id, |this| this.visit_stmt(*body));
            }
            StmtKind::Return { .. }
            | StmtKind::Print { .. }
            | StmtKind::Break
            | StmtKind::Expr(_) => {}
        }
    }

    /// Allocate a scope for statement `id` and visit inside it.
    fn nested(&mut self, id: StmtId, f: impl FnOnce(&mut Self)) {
        let scope = self.scopes.push_child(self.ctx.current(), NodeRef::Stmt(id));
        self.with_scope(scope, f);
    }

    fn with_scope(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self)) {
        self.ctx.enter(scope);
        f(self);
        self.ctx.exit();
    }
}
