//! Lexical scope table.
//!
//! This module provides [`ScopeTable`], the tree of lexical scopes built by
//! the symbol builder. It handles:
//! - Name to declaration bindings per scope (duplicates kept, not rejected)
//! - Parent-chain lookup
//! - Superclass and interface edges on class scopes
//! - Kind-filtered ancestor search for type names
//!
//! Scopes are referenced by [`ScopeId`]; the table owns every scope and
//! scopes refer to each other only by id.

use bitflags::bitflags;
use decaf_ast::{Ast, Decl, DeclKind, NodeRef};
use decaf_core::{DeclId, ScopeId};
use rustc_hash::FxHashMap;

bitflags! {
    /// Declaration kinds accepted by [`ScopeTable::find_decl`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeclKinds: u8 {
        const VAR = 1 << 0;
        const CLASS = 1 << 1;
        const INTERFACE = 1 << 2;
        const FUNCTION = 1 << 3;
        /// Anything usable as a named type.
        const TYPE = Self::CLASS.bits() | Self::INTERFACE.bits();
    }
}

impl DeclKinds {
    /// The single kind flag of `decl`.
    pub fn of(decl: &Decl) -> Self {
        match decl.kind {
            DeclKind::Var(_) => DeclKinds::VAR,
            DeclKind::Class(_) => DeclKinds::CLASS,
            DeclKind::Interface(_) => DeclKinds::INTERFACE,
            DeclKind::Function(_) => DeclKinds::FUNCTION,
        }
    }
}

// ============================================================================
// Scope
// ============================================================================

/// One lexical region.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Bindings by name, in declaration order. More than one entry means the
    /// name was redeclared.
    symbols: FxHashMap<String, Vec<DeclId>>,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    /// Scopes of implemented interfaces (class scopes only).
    interfaces: Vec<ScopeId>,
    /// Scope of the superclass (class scopes only).
    extends: Option<ScopeId>,
    /// The node that introduced this scope.
    owner: NodeRef,
}

impl Scope {
    fn new(parent: Option<ScopeId>, owner: NodeRef) -> Self {
        Self {
            symbols: FxHashMap::default(),
            parent,
            children: Vec::new(),
            interfaces: Vec::new(),
            extends: None,
            owner,
        }
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub fn interfaces(&self) -> &[ScopeId] {
        &self.interfaces
    }

    pub fn extends(&self) -> Option<ScopeId> {
        self.extends
    }

    pub fn owner(&self) -> NodeRef {
        self.owner
    }

    /// Number of distinct names bound here.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

// ============================================================================
// ScopeTable
// ============================================================================

/// Every scope of one program, rooted at the global scope.
#[derive(Debug, Clone)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
    /// Scope introduced by each scope-owning node.
    node_scopes: FxHashMap<NodeRef, ScopeId>,
    /// Scope each declaration was entered into.
    owners: FxHashMap<DeclId, ScopeId>,
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        let mut node_scopes = FxHashMap::default();
        node_scopes.insert(NodeRef::Program, ScopeId::new(0));
        Self {
            scopes: vec![Scope::new(None, NodeRef::Program)],
            node_scopes,
            owners: FxHashMap::default(),
        }
    }

    /// The root scope.
    #[inline]
    pub fn global(&self) -> ScopeId {
        ScopeId::new(0)
    }

    pub fn get(&self, scope: ScopeId) -> &Scope {
        &self.scopes[scope.index()]
    }

    fn get_mut(&mut self, scope: ScopeId) -> &mut Scope {
        &mut self.scopes[scope.index()]
    }

    /// Number of scopes, including the global one.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    // ==========================================================================
    // Construction
    // ==========================================================================

    /// Allocate a child of `parent` introduced by `owner`.
    pub fn push_child(&mut self, parent: ScopeId, owner: NodeRef) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(Scope::new(Some(parent), owner));
        self.get_mut(parent).children.push(id);
        self.node_scopes.insert(owner, id);
        id
    }

    /// Enter a binding. Redeclarations are kept; lookups see the last one.
    pub fn declare(&mut self, scope: ScopeId, name: &str, decl: DeclId) {
        self.get_mut(scope)
            .symbols
            .entry(name.to_string())
            .or_default()
            .push(decl);
        self.owners.insert(decl, scope);
    }

    /// Link a class scope to its superclass scope.
    pub fn set_extends(&mut self, scope: ScopeId, superclass: ScopeId) {
        self.get_mut(scope).extends = Some(superclass);
    }

    /// Record an implemented interface on a class scope.
    pub fn add_interface(&mut self, scope: ScopeId, interface: ScopeId) {
        self.get_mut(scope).interfaces.push(interface);
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Binding for `name` in `scope` only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        self.get(scope)
            .symbols
            .get(name)
            .and_then(|decls| decls.last().copied())
    }

    /// Binding for `name` in `scope` or the nearest ancestor binding it.
    pub fn lookup_chain(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        self.chain(scope)
            .find_map(|s| self.lookup_local(s, name))
    }

    /// Every declaration entered under `name` in `scope`, in entry order.
    pub fn bindings(&self, scope: ScopeId, name: &str) -> &[DeclId] {
        self.get(scope)
            .symbols
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All `(name, declarations)` entries of `scope`.
    pub fn entries(&self, scope: ScopeId) -> impl Iterator<Item = (&str, &[DeclId])> {
        self.get(scope)
            .symbols
            .iter()
            .map(|(name, decls)| (name.as_str(), decls.as_slice()))
    }

    /// Search `scope` and every ancestor for a declaration of `name` whose
    /// kind is in `kinds`. Within one scope the latest matching binding wins.
    pub fn find_decl(
        &self,
        ast: &Ast,
        scope: ScopeId,
        name: &str,
        kinds: DeclKinds,
    ) -> Option<DeclId> {
        self.chain(scope).find_map(|s| {
            self.bindings(s, name)
                .iter()
                .rev()
                .copied()
                .find(|&d| kinds.contains(DeclKinds::of(ast.decl(d))))
        })
    }

    /// `scope` followed by its ancestors up to the global scope.
    pub fn chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |&s| self.get(s).parent)
    }

    /// Scope introduced by `node`, if it introduces one.
    pub fn scope_of(&self, node: NodeRef) -> Option<ScopeId> {
        self.node_scopes.get(&node).copied()
    }

    /// Scope `decl` was entered into.
    pub fn owner_of(&self, decl: DeclId) -> Option<ScopeId> {
        self.owners.get(&decl).copied()
    }

    /// Class or interface declaration that introduced `scope`.
    pub fn owning_decl(&self, scope: ScopeId) -> Option<DeclId> {
        match self.get(scope).owner {
            NodeRef::Decl(decl) => Some(decl),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decaf_ast::{AstBuilder, Ident, TypeExpr};
    use decaf_core::Span;

    fn ident(name: &str, line: u32) -> Ident {
        Ident::new(name, Span::point(line, 1))
    }

    #[test]
    fn lookup_walks_parents() {
        let mut b = AstBuilder::new();
        let x = b.var(ident("x", 1), TypeExpr::int());
        let y = b.var(ident("y", 2), TypeExpr::int());
        let body = b.block(vec![], vec![], Span::point(2, 1));
        let _ast = b.finish(vec![x]);

        let mut table = ScopeTable::new();
        let global = table.global();
        table.declare(global, "x", x);
        let inner = table.push_child(global, NodeRef::Stmt(body));
        table.declare(inner, "y", y);

        assert_eq!(table.lookup_chain(inner, "x"), Some(x));
        assert_eq!(table.lookup_local(inner, "x"), None);
        assert_eq!(table.lookup_local(inner, "y"), Some(y));
        assert_eq!(table.lookup_chain(global, "y"), None);
        assert_eq!(table.get(global).children(), &[inner]);
        assert_eq!(table.get(inner).parent(), Some(global));
        assert_eq!(table.scope_of(NodeRef::Stmt(body)), Some(inner));
        assert_eq!(table.owner_of(y), Some(inner));
    }

    #[test]
    fn redeclaration_keeps_both_last_wins() {
        let mut b = AstBuilder::new();
        let first = b.var(ident("a", 1), TypeExpr::int());
        let second = b.var(ident("a", 2), TypeExpr::bool());
        let _ast = b.finish(vec![first, second]);

        let mut table = ScopeTable::new();
        let global = table.global();
        table.declare(global, "a", first);
        table.declare(global, "a", second);

        assert_eq!(table.bindings(global, "a"), &[first, second]);
        assert_eq!(table.lookup_local(global, "a"), Some(second));
        assert_eq!(table.entries(global).count(), 1);
    }

    #[test]
    fn find_decl_filters_by_kind() {
        let mut b = AstBuilder::new();
        let class = b.class(ident("Shape", 1), None, vec![], vec![]);
        let shadow = b.var(ident("Shape", 5), TypeExpr::int());
        let body = b.block(vec![shadow], vec![], Span::point(4, 1));
        let ast = b.finish(vec![class]);

        let mut table = ScopeTable::new();
        let global = table.global();
        table.declare(global, "Shape", class);
        let inner = table.push_child(global, NodeRef::Stmt(body));
        table.declare(inner, "Shape", shadow);

        assert_eq!(table.find_decl(&ast, inner, "Shape", DeclKinds::CLASS), Some(class));
        assert_eq!(table.find_decl(&ast, inner, "Shape", DeclKinds::VAR), Some(shadow));
        assert_eq!(table.find_decl(&ast, inner, "Shape", DeclKinds::INTERFACE), None);
        assert!(DeclKinds::TYPE.contains(DeclKinds::of(ast.decl(class))));
    }
}
