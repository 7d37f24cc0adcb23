//! Check Pass (Pass 3) - Static semantic checks.
//!
//! One scope-aware walk of the tree. Every violation is reported into the
//! shared [`Diagnostics`] and the walk continues, so independent errors in
//! one program all surface in one run.
//!
//! ## Checks
//!
//! - **Redeclaration**: among same-named declarations of one scope, each one
//!   after the lexically earliest (line, then column) is a `DeclConflict`.
//! - **Named types**: a referenced class or interface must resolve through
//!   the ancestor scopes.
//! - **`this`**: only valid beneath a class declaration.
//! - **Overrides**: a method sharing a name with a member of an implemented
//!   interface or of a superclass (transitively) must have an equivalent
//!   return type and formal list.

use decaf_ast::{Ast, DeclKind, ExprKind, Ident, NodeRef, StmtKind, TypeExpr};
use decaf_core::{DeclId, Diagnostics, ExprId, LookingFor, ScopeId, SemanticError, StmtId};
use rustc_hash::FxHashSet;

use crate::scope::{DeclKinds, ScopeTable};

/// Output of the check pass.
#[derive(Debug, Default)]
pub struct CheckOutput {
    /// Number of declarations visited.
    pub decls_checked: usize,
    /// Number of diagnostics this pass reported.
    pub errors_reported: usize,
}

/// Check Pass - semantic validation over a resolved scope graph.
pub struct SemanticChecker<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTable,
    diagnostics: &'a mut Diagnostics,
    decls_checked: usize,
}

impl<'a> SemanticChecker<'a> {
    pub fn new(ast: &'a Ast, scopes: &'a ScopeTable, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            ast,
            scopes,
            diagnostics,
            decls_checked: 0,
        }
    }

    /// Run the check pass.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(level = "debug", skip_all, fields(scopes = self.scopes.len()))]
    pub fn run(mut self) -> CheckOutput {
        let errors_before = self.diagnostics.error_count();
        let global = self.scopes.global();

        for &decl in self.ast.program() {
            self.check_decl(decl, global);
        }

        let output = CheckOutput {
            decls_checked: self.decls_checked,
            errors_reported: self.diagnostics.error_count() - errors_before,
        };
        tracing::debug!(
            decls = output.decls_checked,
            errors = output.errors_reported,
            "check pass complete"
        );
        output
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    /// Check `id`, which was entered into `scope`.
    fn check_decl(&mut self, id: DeclId, scope: ScopeId) {
        let ast = self.ast;
        let decl = ast.decl(id);
        self.decls_checked += 1;
        self.check_redeclaration(id, scope);

        match &decl.kind {
            DeclKind::Var(var) => self.check_type(&var.ty, scope),
            DeclKind::Class(class) => {
                let inner = self.inner_scope(NodeRef::Decl(id), scope);
                for &member in &class.members {
                    self.check_decl(member, inner);
                }
            }
            DeclKind::Interface(iface) => {
                let inner = self.inner_scope(NodeRef::Decl(id), scope);
                for &member in &iface.members {
                    self.check_decl(member, inner);
                }
            }
            DeclKind::Function(func) => {
                // The return type resolves where the function is declared.
                self.check_type(&func.return_type, scope);
                let inner = self.inner_scope(NodeRef::Decl(id), scope);
                for &formal in &func.formals {
                    self.check_decl(formal, inner);
                }
                self.check_override(id);
                if let Some(body) = func.body {
                    self.check_stmt(body, inner);
                }
            }
        }
    }

    fn check_redeclaration(&mut self, id: DeclId, scope: ScopeId) {
        let decl = self.ast.decl(id);
        let earliest = self
            .scopes
            .bindings(scope, decl.name())
            .iter()
            .copied()
            .min_by_key(|&d| (self.ast.decl(d).span(), d));

        if let Some(earliest) = earliest.filter(|&e| e != id) {
            self.diagnostics.report(SemanticError::DeclConflict {
                name: decl.name().to_string(),
                span: decl.span(),
                previous: self.ast.decl(earliest).span(),
            });
        }
    }

    /// Report the innermost named type in `ty` if it names no class or
    /// interface visible from `scope`.
    fn check_type(&mut self, ty: &TypeExpr, scope: ScopeId) {
        if let Some(name) = ty.innermost_named() {
            self.require(name, scope, DeclKinds::TYPE);
        }
    }

    fn require(&mut self, name: &Ident, scope: ScopeId, kinds: DeclKinds) {
        if self
            .scopes
            .find_decl(self.ast, scope, &name.name, kinds)
            .is_none()
        {
            self.diagnostics.report(SemanticError::IdentifierNotDeclared {
                name: name.name.clone(),
                expected: LookingFor::Class,
                span: name.span,
            });
        }
    }

    fn inner_scope(&self, node: NodeRef, fallback: ScopeId) -> ScopeId {
        self.scopes.scope_of(node).unwrap_or(fallback)
    }

    // ==========================================================================
    // Overrides
    // ==========================================================================

    /// Compare method `func` against same-named members of every interface
    /// and superclass reachable from its class. Reports at most once.
    fn check_override(&mut self, func: DeclId) {
        let Some(class) = self.ast.owning_class(func) else {
            return;
        };
        let Some(class_scope) = self.scopes.scope_of(NodeRef::Decl(class)) else {
            return;
        };
        let name = self.ast.decl(func).name();

        let mut visited = FxHashSet::default();
        visited.insert(class_scope);
        let mut pending = self.supertype_scopes(class_scope);
        let mut next = 0;

        while let Some(&scope) = pending.get(next) {
            next += 1;
            if !visited.insert(scope) {
                continue;
            }
            if let Some(inherited) = self.scopes.lookup_local(scope, name) {
                if !self.signatures_match(func, inherited) {
                    self.diagnostics.report(SemanticError::OverrideMismatch {
                        class: self.ast.decl(class).name().to_string(),
                        name: name.to_string(),
                        span: self.ast.decl(func).span(),
                    });
                    return;
                }
            }
            pending.extend(self.supertype_scopes(scope));
        }
    }

    /// Interface scopes of `scope`, then its superclass scope.
    fn supertype_scopes(&self, scope: ScopeId) -> Vec<ScopeId> {
        let scope = self.scopes.get(scope);
        scope
            .interfaces()
            .iter()
            .copied()
            .chain(scope.extends())
            .collect()
    }

    fn signatures_match(&self, func: DeclId, inherited: DeclId) -> bool {
        let (Some(ours), Some(theirs)) = (
            self.ast.decl(func).as_function(),
            self.ast.decl(inherited).as_function(),
        ) else {
            return false;
        };

        ours.return_type.is_equivalent_to(&theirs.return_type)
            && ours.formals.len() == theirs.formals.len()
            && ours
                .formals
                .iter()
                .zip(&theirs.formals)
                .all(|(&a, &b)| self.formal_type_matches(a, b))
    }

    fn formal_type_matches(&self, a: DeclId, b: DeclId) -> bool {
        match (self.ast.decl(a).as_var(), self.ast.decl(b).as_var()) {
            (Some(a), Some(b)) => a.ty.is_equivalent_to(&b.ty),
            _ => false,
        }
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn check_stmt(&mut self, id: StmtId, scope: ScopeId) {
        let ast = self.ast;
        let inner = self.inner_scope(NodeRef::Stmt(id), scope);

        match &ast.stmt(id).kind {
            StmtKind::Block { decls, stmts } => {
                for &decl in decls {
                    self.check_decl(decl, inner);
                }
                for &stmt in stmts {
                    self.check_stmt(stmt, inner);
                }
            }
            StmtKind::If {
                test,
                then_branch,
                else_branch,
            } => {
                self.check_expr(*test, inner);
                self.check_stmt(*then_branch, inner);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(*else_branch, inner);
                }
            }
            StmtKind::While { test, body } => {
                self.check_expr(*test, inner);
                self.check_stmt(*body, inner);
            }
            StmtKind::For {
                init,
                test,
                step,
                body,
            } => {
                for expr in init.iter().chain(Some(test)).chain(step.iter()) {
                    self.check_expr(*expr, inner);
                }
                self.check_stmt(*body, inner);
            }
            StmtKind::Return { value } => {
                if let Some(value) = value {
                    self.check_expr(*value, inner);
                }
            }
            StmtKind::Print { args } => {
                for &arg in args {
                    self.check_expr(arg, inner);
                }
            }
            StmtKind::Break => {}
            StmtKind::Expr(expr) => self.check_expr(*expr, inner),
        }
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn check_expr(&mut self, id: ExprId, scope: ScopeId) {
        let ast = self.ast;
        let expr = ast.expr(id);

        match &expr.kind {
            ExprKind::IntConst(_)
            | ExprKind::DoubleConst(_)
            | ExprKind::BoolConst(_)
            | ExprKind::StringConst(_)
            | ExprKind::Null
            | ExprKind::ReadInteger
            | ExprKind::ReadLine => {}
            ExprKind::This => {
                if ast.enclosing_class(NodeRef::Expr(id)).is_none() {
                    self.diagnostics
                        .report(SemanticError::ThisOutsideClassScope { span: expr.span });
                }
            }
            ExprKind::Binary { left, right, .. } => {
                self.check_expr(*left, scope);
                self.check_expr(*right, scope);
            }
            ExprKind::Unary { operand, .. } => self.check_expr(*operand, scope),
            ExprKind::Assign { target, value } => {
                self.check_expr(*target, scope);
                self.check_expr(*value, scope);
            }
            ExprKind::FieldAccess { base, .. } => {
                if let Some(base) = base {
                    self.check_expr(*base, scope);
                }
            }
            ExprKind::ArrayAccess { base, index } => {
                self.check_expr(*base, scope);
                self.check_expr(*index, scope);
            }
            ExprKind::Call { base, actuals, .. } => {
                if let Some(base) = base {
                    self.check_expr(*base, scope);
                }
                for &actual in actuals {
                    self.check_expr(actual, scope);
                }
            }
            ExprKind::New(class) => self.require(class, scope, DeclKinds::CLASS),
            ExprKind::NewArray { size, elem } => {
                self.check_expr(*size, scope);
                self.check_type(elem, scope);
            }
        }
    }
}
