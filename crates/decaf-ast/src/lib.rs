//! Abstract syntax tree for Decaf programs.
//!
//! The tree is stored in three arenas (declarations, statements,
//! expressions) addressed by the typed ids from `decaf_core`. Children are
//! owned downward through id lists; every node also carries a non-owning
//! `parent` link that [`AstBuilder`] installs when the parent is assembled.
//!
//! # Example
//!
//! ```
//! use decaf_ast::{AstBuilder, Ident, TypeExpr};
//! use decaf_core::Span;
//!
//! let mut b = AstBuilder::new();
//! let body = b.block(vec![], vec![], Span::default());
//! let name = Ident::new("main", Span::point(1, 5));
//! let main = b.function(name, TypeExpr::void(), vec![], Some(body));
//! let ast = b.finish(vec![main]);
//!
//! assert_eq!(ast.decl(main).name(), "main");
//! assert!(ast.decl(main).parent.is_some());
//! ```

mod builder;
mod decl;
mod expr;
mod stmt;
mod types;

pub use builder::AstBuilder;
pub use decl::{ClassDecl, Decl, DeclKind, FnDecl, InterfaceDecl, VarDecl};
pub use expr::{BinaryOp, Expr, ExprKind, UnaryOp};
pub use stmt::{Stmt, StmtKind};
pub use types::{PrimitiveType, TypeExpr};

use decaf_core::{DeclId, ExprId, Span, StmtId};

/// An identifier occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A reference to any node, used for parent links and side tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// The program root.
    Program,
    Decl(DeclId),
    Stmt(StmtId),
    Expr(ExprId),
}

/// A fully assembled program.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    decls: Vec<Decl>,
    stmts: Vec<Stmt>,
    exprs: Vec<Expr>,
    program: Vec<DeclId>,
}

impl Ast {
    /// Top-level declarations in source order.
    pub fn program(&self) -> &[DeclId] {
        &self.program
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Every declaration with its id, in allocation order.
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId::new(i as u32), d))
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    // ==========================================================================
    // Parent Walks
    // ==========================================================================

    /// Syntactic parent of `node`. The program root has none.
    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        match node {
            NodeRef::Program => None,
            NodeRef::Decl(id) => self.decl(id).parent,
            NodeRef::Stmt(id) => self.stmt(id).parent,
            NodeRef::Expr(id) => self.expr(id).parent,
        }
    }

    /// Strict ancestors of `node`, innermost first.
    pub fn ancestors(&self, node: NodeRef) -> Ancestors<'_> {
        Ancestors {
            ast: self,
            next: self.parent(node),
        }
    }

    /// Nearest class declaration enclosing `node`.
    pub fn enclosing_class(&self, node: NodeRef) -> Option<DeclId> {
        self.ancestors(node).find_map(|n| match n {
            NodeRef::Decl(id) if self.decl(id).as_class().is_some() => Some(id),
            _ => None,
        })
    }

    /// Nearest function declaration enclosing `node`.
    pub fn enclosing_function(&self, node: NodeRef) -> Option<DeclId> {
        self.ancestors(node).find_map(|n| match n {
            NodeRef::Decl(id) if self.decl(id).as_function().is_some() => Some(id),
            _ => None,
        })
    }

    /// Nearest `while` or `for` enclosing `node`, not crossing a function
    /// boundary.
    pub fn enclosing_loop(&self, node: NodeRef) -> Option<StmtId> {
        for n in self.ancestors(node) {
            match n {
                NodeRef::Stmt(id) if self.stmt(id).is_loop() => return Some(id),
                NodeRef::Decl(_) | NodeRef::Program => return None,
                _ => {}
            }
        }
        None
    }

    /// Class declaration directly owning `decl` as a member, if any.
    pub fn owning_class(&self, decl: DeclId) -> Option<DeclId> {
        match self.decl(decl).parent {
            Some(NodeRef::Decl(p)) if self.decl(p).as_class().is_some() => Some(p),
            _ => None,
        }
    }
}

/// Iterator returned by [`Ast::ancestors`].
pub struct Ancestors<'a> {
    ast: &'a Ast,
    next: Option<NodeRef>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let current = self.next?;
        self.next = self.ast.parent(current);
        Some(current)
    }
}
