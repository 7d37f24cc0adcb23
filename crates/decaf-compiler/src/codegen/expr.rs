//! Expression lowering.
//!
//! Every expression yields a [`Value`]. Assignment targets are first
//! resolved to a [`Place`], which can then be read or written.

use decaf_ast::{BinaryOp, ExprKind, Ident, UnaryOp};
use decaf_core::{CodegenError, ExprId};
use ordered_float::OrderedFloat;

use super::{ERR_ARRAY_BAD_SIZE, ERR_ARRAY_OUT_OF_BOUNDS, Lowerer, Value};
use crate::emit::{BuiltIn, Location, TacOp};
use crate::layout::ClassLayout;
use crate::type_tag::TypeTag;

/// Something that can be assigned to.
#[derive(Debug, Clone)]
enum Place {
    /// A local, formal, or global bound under `name`.
    Variable { name: String, value: Value },
    /// `*(addr + offset)`: a field or array element.
    Memory {
        addr: Location,
        offset: i32,
        tag: TypeTag,
    },
    /// A computed value with no storage of its own.
    Temp(Value),
}

impl<'a> Lowerer<'a, '_> {
    // ==========================================================================
    // Values
    // ==========================================================================

    pub(super) fn lower_expr(&mut self, id: ExprId) -> Result<Value, CodegenError> {
        let ast = self.ast;
        let value = match &ast.expr(id).kind {
            ExprKind::IntConst(v) => Value::new(self.emitter.load_int(*v), TypeTag::Int),
            ExprKind::DoubleConst(v) => Value::new(self.emitter.load_double(*v), TypeTag::Double),
            ExprKind::BoolConst(v) => Value::new(self.emitter.load_int(*v as i32), TypeTag::Bool),
            ExprKind::StringConst(s) => Value::new(self.emitter.load_string(s), TypeTag::String),
            ExprKind::Null => {
                let slot = self.slot_size();
                let width = self.emitter.load_int(slot);
                Value::new(self.builtin_value(BuiltIn::Alloc, &[&width])?, TypeTag::Null)
            }

            ExprKind::Binary { op, left, right } => {
                let left = self.lower_expr(*left)?;
                let right = self.lower_expr(*right)?;
                self.lower_binary(*op, &left, &right)?
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.lower_expr(*operand)?;
                self.lower_unary(*op, operand)
            }

            ExprKind::Assign { target, value } => {
                let place = self.lower_place(*target)?;
                let value = self.lower_expr(*value)?;
                self.write(place, &value);
                value
            }

            ExprKind::FieldAccess { .. } | ExprKind::ArrayAccess { .. } => {
                let place = self.lower_place(id)?;
                self.read(place)
            }

            ExprKind::Call {
                base,
                field,
                actuals,
            } => self
                .lower_call(*base, field, actuals)?
                .ok_or_else(|| CodegenError::VoidValue {
                    name: field.name.clone(),
                })?,

            ExprKind::New(class) => self.lower_new(class)?,
            ExprKind::NewArray { size, elem } => {
                let size = self.lower_expr(*size)?;
                self.lower_new_array(&size, TypeTag::from_type(elem))?
            }

            ExprKind::This => self.this.clone().ok_or_else(|| CodegenError::UnboundName {
                name: "this".to_string(),
            })?,
            ExprKind::ReadInteger => {
                Value::new(self.builtin_value(BuiltIn::ReadInteger, &[])?, TypeTag::Int)
            }
            ExprKind::ReadLine => {
                Value::new(self.builtin_value(BuiltIn::ReadLine, &[])?, TypeTag::String)
            }
        };
        Ok(value)
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> Result<Value, CodegenError> {
        if op.is_relational() {
            return Ok(self.lower_relational(op, left, right));
        }
        if op.is_equality() {
            return self.lower_equality(op, left, right);
        }

        let (l, r) = (&left.loc, &right.loc);
        let (loc, tag) = match op {
            BinaryOp::Add => (self.emitter.binary(TacOp::Add, l, r), left.tag.clone()),
            BinaryOp::Sub => (self.emitter.binary(TacOp::Sub, l, r), left.tag.clone()),
            BinaryOp::Mul => (self.emitter.binary(TacOp::Mul, l, r), left.tag.clone()),
            BinaryOp::Div => (self.emitter.binary(TacOp::Div, l, r), left.tag.clone()),
            BinaryOp::Mod => (self.emitter.binary(TacOp::Mod, l, r), left.tag.clone()),
            BinaryOp::And => (self.emitter.binary(TacOp::And, l, r), TypeTag::Bool),
            BinaryOp::Or => (self.emitter.binary(TacOp::Or, l, r), TypeTag::Bool),
            _ => unreachable!("comparison operator {} handled above", op),
        };
        Ok(Value::new(loc, tag))
    }

    /// `<`, `>`, `<=` and `>=` built from `Less`, `Equal` and `Or`.
    fn lower_relational(&mut self, op: BinaryOp, left: &Value, right: &Value) -> Value {
        let (l, r) = (&left.loc, &right.loc);
        let loc = match op {
            BinaryOp::Lt => self.emitter.binary(TacOp::Less, l, r),
            BinaryOp::Gt => self.emitter.binary(TacOp::Less, r, l),
            BinaryOp::Le => {
                let less = self.emitter.binary(TacOp::Less, l, r);
                let equal = self.emitter.binary(TacOp::Equal, l, r);
                self.emitter.binary(TacOp::Or, &less, &equal)
            }
            _ => {
                let greater = self.emitter.binary(TacOp::Less, r, l);
                let equal = self.emitter.binary(TacOp::Equal, l, r);
                self.emitter.binary(TacOp::Or, &greater, &equal)
            }
        };
        Value::new(loc, TypeTag::Bool)
    }

    /// `==` and `!=`. Strings compare through the runtime.
    fn lower_equality(
        &mut self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> Result<Value, CodegenError> {
        let (l, r) = (&left.loc, &right.loc);
        let negate = op == BinaryOp::Ne;

        let loc = if left.tag.is_string() {
            let equal = self.builtin_value(BuiltIn::StringEqual, &[l, r])?;
            if negate {
                let zero = self.emitter.load_int(0);
                self.emitter.binary(TacOp::Equal, &equal, &zero)
            } else {
                equal
            }
        } else if negate {
            let greater = self.emitter.binary(TacOp::Less, r, l);
            let less = self.emitter.binary(TacOp::Less, l, r);
            self.emitter.binary(TacOp::Or, &greater, &less)
        } else {
            self.emitter.binary(TacOp::Equal, l, r)
        };
        Ok(Value::new(loc, TypeTag::Bool))
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: Value) -> Value {
        match op {
            UnaryOp::Neg => {
                let zero = match operand.tag {
                    TypeTag::Double => self.emitter.load_double(OrderedFloat(0.0)),
                    _ => self.emitter.load_int(0),
                };
                let loc = self.emitter.binary(TacOp::Sub, &zero, &operand.loc);
                Value::new(loc, operand.tag)
            }
            UnaryOp::Not => {
                let one = self.emitter.load_int(1);
                let sum = self.emitter.binary(TacOp::Add, &operand.loc, &one);
                let two = self.emitter.load_int(2);
                Value::new(self.emitter.binary(TacOp::Mod, &sum, &two), TypeTag::Bool)
            }
        }
    }

    // ==========================================================================
    // Objects and arrays
    // ==========================================================================

    fn lower_new(&mut self, class: &Ident) -> Result<Value, CodegenError> {
        let layout = self.class_layout(&class.name)?;
        let bytes = layout.instance_size(self.emitter.config());
        let size = self.emitter.load_int(bytes);
        let object = self.builtin_value(BuiltIn::Alloc, &[&size])?;
        let vtable = self.emitter.load_label(layout.name());
        self.emitter.store(&object, &vtable, 0);
        Ok(Value::new(object, TypeTag::Class(class.name.clone())))
    }

    fn lower_new_array(&mut self, size: &Value, elem: TypeTag) -> Result<Value, CodegenError> {
        let zero = self.emitter.load_int(0);
        let negative = self.emitter.binary(TacOp::Less, &size.loc, &zero);
        let size_ok = self.emitter.new_label();
        self.emitter.if_zero(&negative, &size_ok);
        self.runtime_error(ERR_ARRAY_BAD_SIZE);
        self.emitter.label(&size_ok);

        let slot = self.slot_size();
        let one = self.emitter.load_int(1);
        let count = self.emitter.binary(TacOp::Add, &one, &size.loc);
        let width = self.emitter.load_int(slot);
        let bytes = self.emitter.binary(TacOp::Mul, &count, &width);
        let array = self.builtin_value(BuiltIn::Alloc, &[&bytes])?;
        self.emitter.store(&array, &size.loc, 0);
        Ok(Value::new(array, TypeTag::array_of(elem)))
    }

    // ==========================================================================
    // Places
    // ==========================================================================

    fn lower_place(&mut self, id: ExprId) -> Result<Place, CodegenError> {
        let ast = self.ast;
        match &ast.expr(id).kind {
            ExprKind::FieldAccess { base: None, field } => self.resolve_name(&field.name),
            ExprKind::FieldAccess {
                base: Some(base),
                field,
            } => {
                let object = self.lower_expr(*base)?;
                let layout = self.layout_of(&object)?;
                self.field_place(layout, object.loc, &field.name)
            }
            ExprKind::ArrayAccess { base, index } => {
                let array = self.lower_expr(*base)?;
                let index = self.lower_expr(*index)?;
                Ok(self.element_place(&array, &index))
            }
            _ => Ok(Place::Temp(self.lower_expr(id)?)),
        }
    }

    /// Frame bindings, then fields through `this`, then globals.
    fn resolve_name(&self, name: &str) -> Result<Place, CodegenError> {
        if let Some(value) = self.frame.lookup(name) {
            return Ok(Place::Variable {
                name: name.to_string(),
                value: value.clone(),
            });
        }
        if let (Some(layout), Some(this)) = (self.class, &self.this) {
            if layout.has_field(name) {
                return self.field_place(layout, this.loc.clone(), name);
            }
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(Place::Variable {
                name: name.to_string(),
                value: value.clone(),
            });
        }
        Err(CodegenError::UnboundName {
            name: name.to_string(),
        })
    }

    fn field_place(
        &self,
        layout: &ClassLayout,
        object: Location,
        field: &str,
    ) -> Result<Place, CodegenError> {
        let offset = layout
            .field_offset(field)
            .ok_or_else(|| CodegenError::UnknownMember {
                class: layout.name().to_string(),
                member: field.to_string(),
            })?;
        let tag = layout.member_type(field).cloned().unwrap_or(TypeTag::Error);
        Ok(Place::Memory {
            addr: object,
            offset: self.header_size() + offset,
            tag,
        })
    }

    /// Bounds-checked element address. Out-of-range subscripts print an
    /// error and halt before the address is formed.
    fn element_place(&mut self, array: &Value, index: &Value) -> Place {
        let length = self.emitter.load(&array.loc, 0);
        let past_end = self.emitter.binary(TacOp::Less, &length, &index.loc);
        let at_end = self.emitter.binary(TacOp::Equal, &length, &index.loc);
        let too_big = self.emitter.binary(TacOp::Or, &past_end, &at_end);
        let zero = self.emitter.load_int(0);
        let negative = self.emitter.binary(TacOp::Less, &index.loc, &zero);
        let out_of_range = self.emitter.binary(TacOp::Or, &too_big, &negative);

        let in_range = self.emitter.new_label();
        self.emitter.if_zero(&out_of_range, &in_range);
        self.runtime_error(ERR_ARRAY_OUT_OF_BOUNDS);
        self.emitter.label(&in_range);

        let slot = self.slot_size();
        let width = self.emitter.load_int(slot);
        let scaled = self.emitter.binary(TacOp::Mul, &index.loc, &width);
        let addr = self.emitter.binary(TacOp::Add, &array.loc, &scaled);
        Place::Memory {
            addr,
            offset: self.header_size(),
            tag: array.tag.element().cloned().unwrap_or(TypeTag::Error),
        }
    }

    fn read(&mut self, place: Place) -> Value {
        match place {
            Place::Variable { value, .. } | Place::Temp(value) => value,
            Place::Memory { addr, offset, tag } => {
                Value::new(self.emitter.load(&addr, offset), tag)
            }
        }
    }

    fn write(&mut self, place: Place, value: &Value) {
        match place {
            Place::Variable { name, value: dst } => {
                self.emitter.assign(&dst.loc, &value.loc);
                if value.tag.class_name().is_some() {
                    self.retag(&name, value.tag.clone());
                }
            }
            Place::Memory { addr, offset, .. } => self.emitter.store(&addr, &value.loc, offset),
            Place::Temp(dst) => self.emitter.assign(&dst.loc, &value.loc),
        }
    }

    /// Record the dynamic class of an object now held by `name`.
    fn retag(&mut self, name: &str, tag: TypeTag) {
        if self.frame.retag(name, tag.clone()) {
            return;
        }
        if let Some(global) = self.globals.get_mut(name) {
            global.tag = tag;
        }
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// Lower a call. Yields `None` for a void callee.
    pub(super) fn lower_call(
        &mut self,
        base: Option<ExprId>,
        field: &Ident,
        actuals: &[ExprId],
    ) -> Result<Option<Value>, CodegenError> {
        let name = field.name.as_str();

        let receiver = match base {
            Some(base) => {
                let receiver = self.lower_expr(base)?;
                if let TypeTag::Array(_) = receiver.tag {
                    if name == "length" && actuals.is_empty() {
                        let length = self.emitter.load(&receiver.loc, 0);
                        return Ok(Some(Value::new(length, TypeTag::Int)));
                    }
                }
                Some(receiver)
            }
            None => match (self.class, &self.this) {
                (Some(layout), Some(this)) if layout.has_method(name) => Some(this.clone()),
                _ => None,
            },
        };

        let mut args = Vec::with_capacity(actuals.len());
        for &actual in actuals {
            args.push(self.lower_expr(actual)?);
        }

        match receiver {
            Some(receiver) => self.lower_method_call(&receiver, name, &args),
            None => self.lower_function_call(name, &args),
        }
    }

    fn lower_method_call(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, CodegenError> {
        let layout = self.layout_of(receiver)?;
        let slot = layout
            .method_slot(name)
            .ok_or_else(|| CodegenError::UnknownMember {
                class: layout.name().to_string(),
                member: name.to_string(),
            })?;
        let return_type = layout.member_type(name).cloned().unwrap_or(TypeTag::Void);

        let width = self.slot_size();
        let vtable = self.emitter.load(&receiver.loc, 0);
        let method = self.emitter.load(&vtable, slot as i32 * width);

        for arg in args.iter().rev() {
            self.emitter.push_param(&arg.loc);
        }
        self.emitter.push_param(&receiver.loc);

        let result = self.emitter.acall(&method, !return_type.is_void());
        self.emitter.pop_params((args.len() as i32 + 1) * width);
        Ok(result.map(|loc| Value::new(loc, return_type)))
    }

    fn lower_function_call(
        &mut self,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, CodegenError> {
        let layouts = self.layouts;
        let global = layouts.global();
        let function = global
            .function(name)
            .ok_or_else(|| CodegenError::UnboundName {
                name: name.to_string(),
            })?;
        let return_type = global.return_type(name).cloned().unwrap_or(TypeTag::Void);

        for arg in args.iter().rev() {
            self.emitter.push_param(&arg.loc);
        }
        let width = self.slot_size();
        let result = self.emitter.lcall(&function.label, !return_type.is_void());
        self.emitter.pop_params(args.len() as i32 * width);
        Ok(result.map(|loc| Value::new(loc, return_type)))
    }

    // ==========================================================================
    // Built-ins
    // ==========================================================================

    fn builtin_value(
        &mut self,
        builtin: BuiltIn,
        args: &[&Location],
    ) -> Result<Location, CodegenError> {
        self.emitter
            .builtin(builtin, args)
            .ok_or_else(|| CodegenError::VoidValue {
                name: builtin.to_string(),
            })
    }
}
