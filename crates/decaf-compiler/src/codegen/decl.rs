//! Program, class, function, and variable emission.

use decaf_ast::{DeclKind, StmtKind};
use decaf_core::{CodegenError, DeclId, StmtId};

use super::{Lowerer, Value};
use crate::layout::{ClassLayout, method_label};
use crate::type_tag::TypeTag;

impl<'a> Lowerer<'a, '_> {
    /// Globals first so every function sees them, then functions and
    /// classes in source order.
    pub(super) fn lower_program(&mut self) -> Result<(), CodegenError> {
        let ast = self.ast;

        for &id in ast.program() {
            let decl = ast.decl(id);
            if let DeclKind::Var(var) = &decl.kind {
                let loc = self.emitter.variable(decl.name());
                self.globals.insert(
                    decl.name().to_string(),
                    Value::new(loc, TypeTag::from_type(&var.ty)),
                );
            }
        }

        for &id in ast.program() {
            match &ast.decl(id).kind {
                DeclKind::Function(_) => self.lower_function(id, None)?,
                DeclKind::Class(_) => self.lower_class(id)?,
                DeclKind::Var(_) | DeclKind::Interface(_) => {}
            }
        }
        Ok(())
    }

    fn lower_class(&mut self, id: DeclId) -> Result<(), CodegenError> {
        let ast = self.ast;
        let decl = ast.decl(id);
        let layout = self.class_layout(decl.name())?;

        if let DeclKind::Class(class) = &decl.kind {
            for &member in &class.members {
                if ast.decl(member).as_function().is_some() {
                    self.lower_function(member, Some(layout))?;
                }
            }
        }

        self.emitter.vtable(layout.name(), layout.vtable());
        self.output.vtables += 1;
        Ok(())
    }

    fn lower_function(
        &mut self,
        id: DeclId,
        class: Option<&'a ClassLayout>,
    ) -> Result<(), CodegenError> {
        let ast = self.ast;
        let decl = ast.decl(id);
        let Some(func) = decl.as_function() else {
            return Ok(());
        };

        let label = match class {
            Some(layout) => method_label(layout.name(), decl.name()),
            None => decl.name().to_string(),
        };
        tracing::trace!(function = %label, "lowering function");

        self.emitter.begin_function(&label);
        self.frame.clear();
        self.class = class;

        let mut slot = 0;
        self.this = match class {
            Some(layout) => {
                let loc = self.emitter.param("this", slot);
                slot += 1;
                Some(Value::new(loc, TypeTag::Class(layout.name().to_string())))
            }
            None => None,
        };

        for &formal in &func.formals {
            let formal_decl = ast.decl(formal);
            if let Some(var) = formal_decl.as_var() {
                let loc = self.emitter.param(formal_decl.name(), slot);
                self.frame
                    .declare(formal_decl.name(), Value::new(loc, TypeTag::from_type(&var.ty)));
            }
            slot += 1;
        }

        let result = match func.body {
            Some(body) => self.lower_stmt(body),
            None => Ok(()),
        };

        self.emitter.end_function();
        self.class = None;
        self.this = None;
        self.output.functions += 1;
        result
    }

    /// Allocate storage for the local declarations of block `block`.
    pub(super) fn declare_locals(&mut self, block: StmtId) {
        let ast = self.ast;
        if let StmtKind::Block { decls, .. } = &ast.stmt(block).kind {
            for &id in decls {
                let decl = ast.decl(id);
                if let Some(var) = decl.as_var() {
                    let loc = self.emitter.variable(decl.name());
                    self.frame
                        .declare(decl.name(), Value::new(loc, TypeTag::from_type(&var.ty)));
                }
            }
        }
    }
}
