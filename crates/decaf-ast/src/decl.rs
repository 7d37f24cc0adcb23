//! Declaration nodes.

use decaf_core::{DeclId, Span, StmtId};

use crate::{Ident, NodeRef, TypeExpr};

/// A named entity: variable, class, interface, or function.
///
/// A declaration's location is the location of its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    /// Declared name.
    pub name: Ident,
    /// Kind-specific payload.
    pub kind: DeclKind,
    /// Syntactic parent, installed once at assembly time.
    pub parent: Option<NodeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Var(VarDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Function(FnDecl),
}

/// Variable, field, or formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    /// Superclass reference, unresolved.
    pub extends: Option<Ident>,
    /// Implemented interface references, unresolved.
    pub implements: Vec<Ident>,
    /// Fields and methods in declaration order.
    pub members: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    /// Method prototypes.
    pub members: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub return_type: TypeExpr,
    /// Formal parameters; each is a `Var` declaration.
    pub formals: Vec<DeclId>,
    /// Body block. Interface prototypes have none.
    pub body: Option<StmtId>,
}

impl Decl {
    /// Location of the declaring identifier.
    #[inline]
    pub fn span(&self) -> Span {
        self.name.span
    }

    /// The declared name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name.name
    }

    pub fn as_var(&self) -> Option<&VarDecl> {
        match &self.kind {
            DeclKind::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDecl> {
        match &self.kind {
            DeclKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FnDecl> {
        match &self.kind {
            DeclKind::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Short kind name for logs and messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            DeclKind::Var(_) => "variable",
            DeclKind::Class(_) => "class",
            DeclKind::Interface(_) => "interface",
            DeclKind::Function(_) => "function",
        }
    }
}
