//! Inheritance Pass (Pass 2) - Resolve supertypes and link class scopes.
//!
//! For every [`Inheritable`] recorded by the symbol pass, in recording order:
//!
//! 1. Resolve `extends T` by searching the class scope and every ancestor
//!    for a class named `T`. On success the class scope's `extends` edge
//!    points at `T`'s scope and `T` joins the compatible-type set.
//! 2. Resolve each `implements I` the same way, restricted to interfaces.
//!    On success `I`'s scope is added to the class scope's interface list.
//! 3. Record the class's [`NamedType`] with its compatible-type set.
//!
//! Failures are reported as `IdentifierNotDeclared` and the missing entry is
//! simply left out. A class naming itself as superclass is reported as
//! `CyclicInheritance` and not linked.

use decaf_ast::{Ast, NodeRef};
use decaf_core::{DeclId, Diagnostics, LookingFor, SemanticError};
use rustc_hash::{FxHashMap, FxHashSet};

use super::Inheritable;
use crate::scope::{DeclKinds, ScopeTable};

/// A class type and the supertypes it may stand in for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub decl: DeclId,
    pub name: String,
    /// Direct superclass first (when resolved), then interfaces in
    /// `implements` order.
    pub compatible: Vec<DeclId>,
}

/// Named types built by the resolver, keyed by class declaration.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: FxHashMap<DeclId, NamedType>,
}

impl TypeTable {
    pub fn get(&self, decl: DeclId) -> Option<&NamedType> {
        self.types.get(&decl)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn insert(&mut self, ty: NamedType) {
        self.types.insert(ty.decl, ty);
    }

    /// Whether a value of type `sub` may be used where `sup` is expected.
    ///
    /// Reflexive, and transitive through the compatible-type sets.
    pub fn is_compatible(&self, sub: DeclId, sup: DeclId) -> bool {
        let mut visited = FxHashSet::default();
        let mut pending = vec![sub];
        while let Some(current) = pending.pop() {
            if current == sup {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(ty) = self.types.get(&current) {
                pending.extend(ty.compatible.iter().copied());
            }
        }
        false
    }
}

/// Output of the inheritance pass.
#[derive(Debug, Default)]
pub struct InheritanceOutput {
    /// One named type per class.
    pub types: TypeTable,
    /// Number of superclass links made.
    pub superclasses_linked: usize,
    /// Number of interface links made.
    pub interfaces_linked: usize,
}

/// Inheritance Pass - wires the scope graph for classes.
pub struct InheritanceResolver<'a> {
    ast: &'a Ast,
    scopes: &'a mut ScopeTable,
    inheritables: &'a [Inheritable],
    diagnostics: &'a mut Diagnostics,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(
        ast: &'a Ast,
        scopes: &'a mut ScopeTable,
        inheritables: &'a [Inheritable],
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            ast,
            scopes,
            inheritables,
            diagnostics,
        }
    }

    /// Run the inheritance pass.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(level = "debug", skip_all, fields(classes = self.inheritables.len()))]
    pub fn run(mut self) -> InheritanceOutput {
        let mut output = InheritanceOutput::default();
        let errors_before = self.diagnostics.error_count();

        for &record in self.inheritables {
            let ty = self.resolve(record, &mut output);
            output.types.insert(ty);
        }

        tracing::debug!(
            superclasses = output.superclasses_linked,
            interfaces = output.interfaces_linked,
            errors = self.diagnostics.error_count() - errors_before,
            "inheritance pass complete"
        );

        output
    }

    fn resolve(&mut self, record: Inheritable, output: &mut InheritanceOutput) -> NamedType {
        let ast = self.ast;
        let decl = ast.decl(record.class);
        let mut compatible = Vec::new();

        let Some(class) = decl.as_class() else {
            return NamedType {
                decl: record.class,
                name: decl.name().to_string(),
                compatible,
            };
        };

        if let Some(extends) = &class.extends {
            match self
                .scopes
                .find_decl(ast, record.scope, &extends.name, DeclKinds::CLASS)
            {
                Some(superclass) if superclass == record.class => {
                    self.diagnostics.report(SemanticError::CyclicInheritance {
                        name: decl.name().to_string(),
                        span: decl.span(),
                    });
                }
                Some(superclass) => {
                    if let Some(super_scope) = self.scopes.scope_of(NodeRef::Decl(superclass)) {
                        self.scopes.set_extends(record.scope, super_scope);
                        output.superclasses_linked += 1;
                    }
                    compatible.push(superclass);
                }
                None => {
                    self.diagnostics.report(SemanticError::IdentifierNotDeclared {
                        name: extends.name.clone(),
                        expected: LookingFor::Class,
                        span: extends.span,
                    });
                }
            }
        }

        for implemented in &class.implements {
            match self.scopes.find_decl(
                ast,
                record.scope,
                &implemented.name,
                DeclKinds::INTERFACE,
            ) {
                Some(iface) => {
                    if let Some(iface_scope) = self.scopes.scope_of(NodeRef::Decl(iface)) {
                        self.scopes.add_interface(record.scope, iface_scope);
                        output.interfaces_linked += 1;
                    }
                    compatible.push(iface);
                }
                None => {
                    self.diagnostics.report(SemanticError::IdentifierNotDeclared {
                        name: implemented.name.clone(),
                        expected: LookingFor::Interface,
                        span: implemented.span,
                    });
                }
            }
        }

        NamedType {
            decl: record.class,
            name: decl.name().to_string(),
            compatible,
        }
    }
}
