//! Class Layout Pass - Field offsets and dispatch tables.
//!
//! Builds one [`ClassLayout`] per class, starting each from a copy of its
//! superclass layout so inherited members keep their offsets and slots.
//! Top-level functions go into the [`GlobalLayout`] pseudo-layout.
//!
//! ## Algorithm
//!
//! 1. For each class, build its superclass first (recursively, on demand)
//! 2. Clone the superclass layout, or start empty
//! 3. For each member in declaration order:
//!    - new field: next field offset
//!    - new method: next vtable slot, label `_<Class>.<method>`
//!    - inherited method: same slot, label replaced
//!
//! A class revisited while still in progress closes an `extends` cycle. It
//! is reported once as `CyclicInheritance`, and the class whose superclass
//! lookup hit it is laid out with no superclass.
//!
//! ## Example
//!
//! ```text
//! class A { int x; void f(); void g(); }
//! class B extends A { int y; void g(); void h(); }
//!
//! A: fields { x: 0 }        vtable [_A.f, _A.g]
//! B: fields { x: 0, y: 4 }  vtable [_A.f, _B.g, _B.h]
//! ```

use decaf_ast::{Ast, DeclKind, NodeRef, TypeExpr};
use decaf_core::{DeclId, Diagnostics, SemanticError};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::FrameConfig;
use crate::scope::ScopeTable;
use crate::type_tag::TypeTag;

// ============================================================================
// Layouts
// ============================================================================

/// Entry label of method `method` declared in class `class`.
pub fn method_label(class: &str, method: &str) -> String {
    format!("_{}.{}", class, method)
}

/// Records `name`'s declared type, plus a `<name>_elem` entry for arrays.
fn record_type(types: &mut FxHashMap<String, TypeTag>, name: &str, ty: &TypeExpr) {
    let tag = TypeTag::from_type(ty);
    if let Some(elem) = tag.element() {
        types.insert(format!("{}_elem", name), elem.clone());
    }
    types.insert(name.to_string(), tag);
}

/// Instance layout and dispatch table of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLayout {
    name: String,
    /// Byte offset of each field within the field area.
    fields: FxHashMap<String, i32>,
    field_count: u32,
    /// Vtable slot index of each method.
    methods: FxHashMap<String, u32>,
    /// Method labels indexed by slot.
    vtable: Vec<String>,
    /// Field types and method return types, with `<name>_elem` entries for
    /// array-typed members.
    types: FxHashMap<String, TypeTag>,
}

impl ClassLayout {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: FxHashMap::default(),
            field_count: 0,
            methods: FxHashMap::default(),
            vtable: Vec::new(),
            types: FxHashMap::default(),
        }
    }

    /// Copy of this layout for a subclass named `name`.
    fn derive(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset of `field` relative to the start of the field area.
    pub fn field_offset(&self, field: &str) -> Option<i32> {
        self.fields.get(field).copied()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Vtable slot index of `method`.
    pub fn method_slot(&self, method: &str) -> Option<u32> {
        self.methods.get(method).copied()
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Method labels in slot order.
    pub fn vtable(&self) -> &[String] {
        &self.vtable
    }

    /// Declared type of a field, or return type of a method.
    pub fn member_type(&self, member: &str) -> Option<&TypeTag> {
        self.types.get(member)
    }

    /// Element type of an array-typed member.
    pub fn element_type(&self, member: &str) -> Option<&TypeTag> {
        self.types.get(&format!("{}_elem", member))
    }

    pub fn field_count(&self) -> u32 {
        self.field_count
    }

    pub fn method_count(&self) -> u32 {
        self.vtable.len() as u32
    }

    /// Bytes to allocate for one instance, header included.
    pub fn instance_size(&self, config: &FrameConfig) -> i32 {
        config.header_size + config.slot_size * self.field_count as i32
    }

    fn add_field(&mut self, name: &str, ty: &TypeExpr, slot_size: i32) {
        if self.fields.contains_key(name) {
            return;
        }
        self.fields
            .insert(name.to_string(), slot_size * self.field_count as i32);
        record_type(&mut self.types, name, ty);
        self.field_count += 1;
    }

    /// Add or override `method`. Returns `true` for an override.
    fn add_method(&mut self, name: &str, return_type: &TypeExpr) -> bool {
        let label = method_label(&self.name, name);
        record_type(&mut self.types, name, return_type);
        match self.methods.get(name) {
            Some(&slot) => {
                self.vtable[slot as usize] = label;
                true
            }
            None => {
                self.methods.insert(name.to_string(), self.vtable.len() as u32);
                self.vtable.push(label);
                false
            }
        }
    }
}

/// A free function as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub label: String,
    pub arity: usize,
}

/// Pseudo-layout for top-level functions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalLayout {
    functions: FxHashMap<String, FunctionInfo>,
    /// Return types, with `<name>_elem` entries for array results.
    types: FxHashMap<String, TypeTag>,
}

impl GlobalLayout {
    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    pub fn return_type(&self, name: &str) -> Option<&TypeTag> {
        self.types.get(name)
    }

    pub fn element_type(&self, name: &str) -> Option<&TypeTag> {
        self.types.get(&format!("{}_elem", name))
    }

    /// Whether a zero-argument `main` exists.
    pub fn has_entry_point(&self) -> bool {
        self.function("main").is_some_and(|main| main.arity == 0)
    }

    fn add_function(&mut self, name: &str, arity: usize, return_type: &TypeExpr) {
        if self.functions.contains_key(name) {
            return;
        }
        self.functions.insert(
            name.to_string(),
            FunctionInfo {
                label: name.to_string(),
                arity,
            },
        );
        record_type(&mut self.types, name, return_type);
    }
}

/// Every class layout plus the global pseudo-layout.
#[derive(Debug, Clone, Default)]
pub struct LayoutTable {
    classes: FxHashMap<String, ClassLayout>,
    global: GlobalLayout,
}

impl LayoutTable {
    pub fn class(&self, name: &str) -> Option<&ClassLayout> {
        self.classes.get(name)
    }

    pub fn global(&self) -> &GlobalLayout {
        &self.global
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

// ============================================================================
// LayoutBuilder
// ============================================================================

/// Class Layout Pass - builds the [`LayoutTable`].
pub struct LayoutBuilder<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTable,
    config: FrameConfig,
    diagnostics: &'a mut Diagnostics,
    built: FxHashMap<DeclId, ClassLayout>,
    in_progress: FxHashSet<DeclId>,
    cyclic: FxHashSet<DeclId>,
}

impl<'a> LayoutBuilder<'a> {
    pub fn new(ast: &'a Ast, scopes: &'a ScopeTable, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            ast,
            scopes,
            config: FrameConfig::default(),
            diagnostics,
            built: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            cyclic: FxHashSet::default(),
        }
    }

    /// Use non-default slot widths.
    pub fn with_config(mut self, config: FrameConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the layout pass.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(mut self) -> LayoutTable {
        let ast = self.ast;
        let mut table = LayoutTable::default();

        for &id in ast.program() {
            let decl = ast.decl(id);
            match &decl.kind {
                DeclKind::Class(_) => self.build(id),
                DeclKind::Function(func) => {
                    table
                        .global
                        .add_function(decl.name(), func.formals.len(), &func.return_type)
                }
                DeclKind::Var(_) | DeclKind::Interface(_) => {}
            }
        }

        for &id in ast.program() {
            if let Some(layout) = self.built.remove(&id) {
                table
                    .classes
                    .entry(layout.name.clone())
                    .or_insert(layout);
            }
        }

        tracing::debug!(
            classes = table.classes.len(),
            functions = table.global.functions.len(),
            cycles = self.cyclic.len(),
            "layout pass complete"
        );

        table
    }

    fn build(&mut self, class: DeclId) {
        if self.built.contains_key(&class) || self.in_progress.contains(&class) {
            return;
        }
        let ast = self.ast;
        let decl = ast.decl(class);
        let Some(class_decl) = decl.as_class() else {
            return;
        };

        self.in_progress.insert(class);

        let mut layout = match self.superclass_of(class) {
            Some(superclass) if self.in_progress.contains(&superclass) => {
                self.report_cycle(superclass);
                ClassLayout::new(decl.name())
            }
            Some(superclass) => {
                self.build(superclass);
                match self.built.get(&superclass) {
                    Some(base) => base.derive(decl.name()),
                    None => ClassLayout::new(decl.name()),
                }
            }
            None => ClassLayout::new(decl.name()),
        };

        for &member in &class_decl.members {
            let member_decl = ast.decl(member);
            match &member_decl.kind {
                DeclKind::Var(var) => {
                    layout.add_field(member_decl.name(), &var.ty, self.config.slot_size)
                }
                DeclKind::Function(func) => {
                    if layout.add_method(member_decl.name(), &func.return_type) {
                        tracing::trace!(
                            class = decl.name(),
                            method = member_decl.name(),
                            "override"
                        );
                    }
                }
                DeclKind::Class(_) | DeclKind::Interface(_) => {}
            }
        }

        self.in_progress.remove(&class);
        self.built.insert(class, layout);
    }

    fn superclass_of(&self, class: DeclId) -> Option<DeclId> {
        let scope = self.scopes.scope_of(NodeRef::Decl(class))?;
        let super_scope = self.scopes.get(scope).extends()?;
        self.scopes.owning_decl(super_scope)
    }

    fn report_cycle(&mut self, class: DeclId) {
        if !self.cyclic.insert(class) {
            return;
        }
        let decl = self.ast.decl(class);
        self.diagnostics.report(SemanticError::CyclicInheritance {
            name: decl.name().to_string(),
            span: decl.span(),
        });
    }
}
