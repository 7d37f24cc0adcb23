//! Three-address code generation.
//!
//! The [`CodeGenerator`] lowers a semantically valid program into an ordered
//! stream of [`Instruction`](crate::emit::Instruction) requests.
//!
//! ## Conventions
//!
//! - Globals live in the global segment, one slot each.
//! - Formals start at `fp + 4`; methods receive `this` there and shift
//!   their formals by one slot.
//! - Locals and temporaries grow down from `fp - 8`; the frame size on
//!   `EndFunc` is slots used times slot width.
//! - Objects start with a vtable pointer; fields follow at
//!   `header + slot × index`.
//! - Arrays start with their length; element `i` is at
//!   `header + slot × i`.
//!
//! ## Name lookup
//!
//! An unqualified identifier resolves to, in order: a local or formal of
//! the current function (innermost block first), a field of the enclosing
//! class through `this`, a global variable. Anything else is
//! [`CodegenError::UnboundName`].
//!
//! # Example
//!
//! ```ignore
//! let mut listing = TacListing::new();
//! let output = CodeGenerator::new(&ast, &layouts).generate(&mut listing)?;
//! println!("{}", listing);
//! ```

mod decl;
mod expr;
mod frame;
mod stmt;

pub use frame::FrameScope;

use decaf_ast::Ast;
use decaf_core::CodegenError;
use rustc_hash::FxHashMap;

use crate::config::FrameConfig;
use crate::emit::{BuiltIn, InstructionSink, Location, LoopLabels, TacEmitter};
use crate::layout::{ClassLayout, LayoutTable};
use crate::type_tag::TypeTag;

/// Runtime message printed before halting on a bad subscript.
pub const ERR_ARRAY_OUT_OF_BOUNDS: &str = "Decaf runtime error: Array subscript out of bounds\n";

/// Runtime message printed before halting on a negative array size.
pub const ERR_ARRAY_BAD_SIZE: &str = "Decaf runtime error: Array size is negative\n";

/// A computed value: where it lives and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub loc: Location,
    pub tag: TypeTag,
}

impl Value {
    pub fn new(loc: Location, tag: TypeTag) -> Self {
        Self { loc, tag }
    }
}

/// Summary of one generation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodegenOutput {
    /// Requests issued to the sink.
    pub instructions: usize,
    /// Functions and methods emitted.
    pub functions: usize,
    /// Vtables emitted.
    pub vtables: usize,
}

/// Lowers a program to three-address requests.
pub struct CodeGenerator<'a> {
    ast: &'a Ast,
    layouts: &'a LayoutTable,
    config: FrameConfig,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(ast: &'a Ast, layouts: &'a LayoutTable) -> Self {
        Self {
            ast,
            layouts,
            config: FrameConfig::default(),
        }
    }

    /// Use alternative frame conventions.
    pub fn with_config(mut self, config: FrameConfig) -> Self {
        self.config = config;
        self
    }

    /// Generate the whole program into `sink`.
    ///
    /// Fails with [`CodegenError::NoMainFound`] before issuing anything when
    /// there is no zero-argument `main`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(level = "debug", skip_all, fields(classes = self.layouts.class_count()))]
    pub fn generate(self, sink: &mut dyn InstructionSink) -> Result<CodegenOutput, CodegenError> {
        if !self.layouts.global().has_entry_point() {
            return Err(CodegenError::NoMainFound);
        }

        let mut lowerer = Lowerer {
            ast: self.ast,
            layouts: self.layouts,
            emitter: TacEmitter::new(sink, self.config),
            globals: FxHashMap::default(),
            frame: FrameScope::new(),
            class: None,
            this: None,
            loops: LoopLabels::new(),
            output: CodegenOutput::default(),
        };
        lowerer.lower_program()?;

        let mut output = lowerer.output;
        output.instructions = lowerer.emitter.instructions_emitted();
        tracing::debug!(
            instructions = output.instructions,
            functions = output.functions,
            vtables = output.vtables,
            "code generation complete"
        );
        Ok(output)
    }
}

/// Generation state threaded through the lowering of one program.
struct Lowerer<'a, 's> {
    ast: &'a Ast,
    layouts: &'a LayoutTable,
    emitter: TacEmitter<'s>,
    /// Global variables by name.
    globals: FxHashMap<String, Value>,
    /// Formals and locals of the current function.
    frame: FrameScope,
    /// Layout of the class whose method is being generated.
    class: Option<&'a ClassLayout>,
    /// Receiver of the method being generated.
    this: Option<Value>,
    loops: LoopLabels,
    output: CodegenOutput,
}

impl<'a> Lowerer<'a, '_> {
    fn class_layout(&self, name: &str) -> Result<&'a ClassLayout, CodegenError> {
        self.layouts
            .class(name)
            .ok_or_else(|| CodegenError::UnknownClass {
                name: name.to_string(),
            })
    }

    /// Layout for a value's object tag.
    ///
    /// The tag is the declared type, refined only when a class-typed value
    /// is assigned to a named variable, and that refinement ignores control
    /// flow. A receiver whose tag still names an interface has no layout, so
    /// calls through interface-typed formals and fields fail with
    /// [`CodegenError::UnknownClass`].
    fn layout_of(&self, value: &Value) -> Result<&'a ClassLayout, CodegenError> {
        match value.tag.class_name() {
            Some(name) => self.class_layout(name),
            None => Err(CodegenError::UnknownClass {
                name: value.tag.to_string(),
            }),
        }
    }

    fn slot_size(&self) -> i32 {
        self.emitter.config().slot_size
    }

    fn header_size(&self) -> i32 {
        self.emitter.config().header_size
    }

    /// Print `message` and halt.
    fn runtime_error(&mut self, message: &str) {
        let msg = self.emitter.load_string(message);
        self.emitter.builtin(BuiltIn::PrintString, &[&msg]);
        self.emitter.builtin(BuiltIn::Halt, &[]);
    }
}
