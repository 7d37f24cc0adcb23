//! Statement lowering.

use decaf_ast::{ExprKind, NodeRef, StmtKind};
use decaf_core::{CodegenError, ExprId, StmtId};

use super::Lowerer;
use crate::emit::BuiltIn;
use crate::type_tag::TypeTag;

impl Lowerer<'_, '_> {
    pub(super) fn lower_stmt(&mut self, id: StmtId) -> Result<(), CodegenError> {
        let ast = self.ast;
        match &ast.stmt(id).kind {
            StmtKind::Block { stmts, .. } => {
                self.frame.push_scope();
                self.declare_locals(id);
                let result = stmts.iter().try_for_each(|&stmt| self.lower_stmt(stmt));
                self.frame.pop_scope();
                result
            }

            StmtKind::If {
                test,
                then_branch,
                else_branch,
            } => {
                let test = self.lower_expr(*test)?;
                let else_label = self.emitter.new_label();
                self.emitter.if_zero(&test.loc, &else_label);
                self.lower_stmt(*then_branch)?;

                match else_branch {
                    Some(else_branch) => {
                        let end_label = self.emitter.new_label();
                        self.emitter.goto(&end_label);
                        self.emitter.label(&else_label);
                        self.lower_stmt(*else_branch)?;
                        self.emitter.label(&end_label);
                    }
                    None => self.emitter.label(&else_label),
                }
                Ok(())
            }

            StmtKind::While { test, body } => {
                let top = self.emitter.new_label();
                let exit = self.emitter.new_label();
                self.emitter.label(&top);
                let test = self.lower_expr(*test)?;
                self.emitter.if_zero(&test.loc, &exit);

                self.loops.enter_loop(id, exit.clone());
                let result = self.lower_stmt(*body);
                self.loops.exit_loop(id);
                result?;

                self.emitter.goto(&top);
                self.emitter.label(&exit);
                Ok(())
            }

            StmtKind::For {
                init,
                test,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.lower_effect(*init)?;
                }
                let top = self.emitter.new_label();
                let exit = self.emitter.new_label();
                self.emitter.label(&top);
                let test = self.lower_expr(*test)?;
                self.emitter.if_zero(&test.loc, &exit);

                self.loops.enter_loop(id, exit.clone());
                let result = self.lower_stmt(*body);
                self.loops.exit_loop(id);
                result?;

                if let Some(step) = step {
                    self.lower_effect(*step)?;
                }
                self.emitter.goto(&top);
                self.emitter.label(&exit);
                Ok(())
            }

            StmtKind::Return { value } => {
                let value = match value {
                    Some(value) => Some(self.lower_expr(*value)?),
                    None => None,
                };
                self.emitter.ret(value.as_ref().map(|v| &v.loc));
                Ok(())
            }

            StmtKind::Print { args } => {
                for &arg in args {
                    let value = self.lower_expr(arg)?;
                    let builtin = match value.tag {
                        TypeTag::Int => BuiltIn::PrintInt,
                        TypeTag::String => BuiltIn::PrintString,
                        TypeTag::Bool => BuiltIn::PrintBool,
                        ref other => {
                            return Err(CodegenError::UnsupportedPrintType {
                                tag: other.to_string(),
                            });
                        }
                    };
                    self.emitter.builtin(builtin, &[&value.loc]);
                }
                Ok(())
            }

            StmtKind::Break => {
                let target = ast
                    .enclosing_loop(NodeRef::Stmt(id))
                    .and_then(|stmt| self.loops.break_target(stmt))
                    .map(str::to_string)
                    .ok_or(CodegenError::BreakOutsideLoop)?;
                self.emitter.goto(&target);
                Ok(())
            }

            StmtKind::Expr(expr) => self.lower_effect(*expr),
        }
    }

    /// Lower an expression whose value is discarded. Calls may be void here.
    fn lower_effect(&mut self, expr: ExprId) -> Result<(), CodegenError> {
        let ast = self.ast;
        match &ast.expr(expr).kind {
            ExprKind::Call {
                base,
                field,
                actuals,
            } => self.lower_call(*base, field, actuals).map(drop),
            _ => self.lower_expr(expr).map(drop),
        }
    }
}
