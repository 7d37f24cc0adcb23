//! Three-address instruction emitter.
//!
//! The [`TacEmitter`] provides a high-level API for issuing instruction
//! requests to an [`InstructionSink`], handling temporaries, labels, and
//! frame accounting.
//!
//! # Example
//!
//! ```
//! use decaf_compiler::emit::{TacEmitter, TacOp};
//! use decaf_compiler::{FrameConfig, Instruction};
//!
//! let mut out: Vec<Instruction> = Vec::new();
//! let mut emitter = TacEmitter::new(&mut out, FrameConfig::default());
//!
//! emitter.begin_function("main");
//! let a = emitter.load_int(40);
//! let b = emitter.load_int(2);
//! emitter.binary(TacOp::Add, &a, &b);
//! assert_eq!(emitter.end_function(), 12);
//!
//! assert_eq!(out[4].to_string(), "_tmp2 = _tmp0 + _tmp1");
//! ```

mod instruction;
mod jumps;

pub use instruction::{BuiltIn, Constant, Instruction, Location, Segment, TacOp};
pub use jumps::LoopLabels;

use std::fmt;

use ordered_float::OrderedFloat;

use crate::config::FrameConfig;

// ============================================================================
// Sinks
// ============================================================================

/// Receiver of instruction requests, in program order.
pub trait InstructionSink {
    fn emit(&mut self, instruction: Instruction);
}

impl InstructionSink for Vec<Instruction> {
    fn emit(&mut self, instruction: Instruction) {
        self.push(instruction);
    }
}

/// Records instructions and renders them as a TAC listing, labels flush
/// left and everything else indented.
#[derive(Debug, Default, Clone)]
pub struct TacListing {
    instructions: Vec<Instruction>,
}

impl TacListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Listing lines without indentation.
    pub fn lines(&self) -> Vec<String> {
        self.instructions.iter().map(|i| i.to_string()).collect()
    }
}

impl InstructionSink for TacListing {
    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }
}

impl fmt::Display for TacListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            if instruction.is_label() {
                writeln!(f, "{}", instruction)?;
            } else {
                writeln!(f, "\t{}", instruction)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// TacEmitter
// ============================================================================

/// Issues instruction requests and allocates their operands.
///
/// Temporaries and locals share the current frame: each takes the next
/// local slot, and [`end_function`](Self::end_function) reports the frame
/// size as slots used times slot width. Outside a function, storage comes
/// from the global segment.
pub struct TacEmitter<'s> {
    sink: &'s mut dyn InstructionSink,
    config: FrameConfig,
    next_label: u32,
    next_temp: u32,
    /// Local slots used by the current function.
    locals: u32,
    /// Global slots used so far.
    globals: u32,
    in_function: bool,
    emitted: usize,
}

impl<'s> TacEmitter<'s> {
    /// Create a new emitter writing into `sink`.
    pub fn new(sink: &'s mut dyn InstructionSink, config: FrameConfig) -> Self {
        Self {
            sink,
            config,
            next_label: 0,
            next_temp: 0,
            locals: 0,
            globals: 0,
            in_function: false,
            emitted: 0,
        }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Number of requests issued so far.
    pub fn instructions_emitted(&self) -> usize {
        self.emitted
    }

    /// Issue one request.
    pub fn emit(&mut self, instruction: Instruction) {
        self.emitted += 1;
        self.sink.emit(instruction);
    }

    // ==========================================================================
    // Storage
    // ==========================================================================

    /// A fresh label name, `_L<n>`.
    pub fn new_label(&mut self) -> String {
        let label = format!("_L{}", self.next_label);
        self.next_label += 1;
        label
    }

    /// A fresh temporary, `_tmp<n>`.
    pub fn temp(&mut self) -> Location {
        let name = format!("_tmp{}", self.next_temp);
        self.next_temp += 1;
        self.allocate(name)
    }

    /// Storage for a declared variable: a local inside a function, a global
    /// otherwise.
    pub fn variable(&mut self, name: &str) -> Location {
        self.allocate(name.to_string())
    }

    /// Location of the `index`th incoming parameter slot.
    pub fn param(&self, name: &str, index: u32) -> Location {
        Location::new(name, Segment::FpRelative, self.config.param_offset(index))
    }

    fn allocate(&mut self, name: String) -> Location {
        if self.in_function {
            let offset = self.config.local_offset(self.locals);
            self.locals += 1;
            Location::new(name, Segment::FpRelative, offset)
        } else {
            let offset = self.config.global_offset(self.globals);
            self.globals += 1;
            Location::new(name, Segment::GpRelative, offset)
        }
    }

    // ==========================================================================
    // Functions
    // ==========================================================================

    /// Emit the entry label and frame-open marker, and start a fresh frame.
    pub fn begin_function(&mut self, label: &str) {
        self.in_function = true;
        self.locals = 0;
        self.label(label);
        self.emit(Instruction::BeginFunc);
    }

    /// Emit the frame-close marker. Returns the frame size in bytes.
    pub fn end_function(&mut self) -> i32 {
        let frame_size = self.locals as i32 * self.config.slot_size;
        self.emit(Instruction::EndFunc { frame_size });
        self.in_function = false;
        self.locals = 0;
        frame_size
    }

    pub fn ret(&mut self, value: Option<&Location>) {
        self.emit(Instruction::Return(value.cloned()));
    }

    // ==========================================================================
    // Values
    // ==========================================================================

    pub fn load_int(&mut self, value: i32) -> Location {
        self.load_constant(Constant::Int(value))
    }

    pub fn load_double(&mut self, value: OrderedFloat<f64>) -> Location {
        self.load_constant(Constant::Double(value))
    }

    pub fn load_string(&mut self, value: &str) -> Location {
        self.load_constant(Constant::Str(value.to_string()))
    }

    fn load_constant(&mut self, value: Constant) -> Location {
        let dst = self.temp();
        self.emit(Instruction::LoadConstant {
            dst: dst.clone(),
            value,
        });
        dst
    }

    pub fn load_label(&mut self, label: &str) -> Location {
        let dst = self.temp();
        self.emit(Instruction::LoadLabel {
            dst: dst.clone(),
            label: label.to_string(),
        });
        dst
    }

    pub fn assign(&mut self, dst: &Location, src: &Location) {
        self.emit(Instruction::Assign {
            dst: dst.clone(),
            src: src.clone(),
        });
    }

    /// `*(addr + offset)` into a fresh temporary.
    pub fn load(&mut self, addr: &Location, offset: i32) -> Location {
        let dst = self.temp();
        self.emit(Instruction::Load {
            dst: dst.clone(),
            addr: addr.clone(),
            offset,
        });
        dst
    }

    pub fn store(&mut self, addr: &Location, src: &Location, offset: i32) {
        self.emit(Instruction::Store {
            addr: addr.clone(),
            src: src.clone(),
            offset,
        });
    }

    pub fn binary(&mut self, op: TacOp, left: &Location, right: &Location) -> Location {
        let dst = self.temp();
        self.emit(Instruction::BinaryOp {
            op,
            dst: dst.clone(),
            left: left.clone(),
            right: right.clone(),
        });
        dst
    }

    // ==========================================================================
    // Control Flow
    // ==========================================================================

    pub fn label(&mut self, label: &str) {
        self.emit(Instruction::Label(label.to_string()));
    }

    pub fn goto(&mut self, label: &str) {
        self.emit(Instruction::Goto(label.to_string()));
    }

    pub fn if_zero(&mut self, test: &Location, label: &str) {
        self.emit(Instruction::IfZ {
            test: test.clone(),
            label: label.to_string(),
        });
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    pub fn push_param(&mut self, param: &Location) {
        self.emit(Instruction::PushParam(param.clone()));
    }

    pub fn pop_params(&mut self, bytes: i32) {
        if bytes > 0 {
            self.emit(Instruction::PopParams(bytes));
        }
    }

    pub fn lcall(&mut self, label: &str, has_result: bool) -> Option<Location> {
        let dst = has_result.then(|| self.temp());
        self.emit(Instruction::LCall {
            label: label.to_string(),
            dst: dst.clone(),
        });
        dst
    }

    pub fn acall(&mut self, addr: &Location, has_result: bool) -> Option<Location> {
        let dst = has_result.then(|| self.temp());
        self.emit(Instruction::ACall {
            addr: addr.clone(),
            dst: dst.clone(),
        });
        dst
    }

    /// Call a runtime built-in. Returns its result location when it has one.
    pub fn builtin(&mut self, builtin: BuiltIn, args: &[&Location]) -> Option<Location> {
        debug_assert_eq!(args.len(), builtin.arity(), "{} arity", builtin);
        let dst = builtin.has_result().then(|| self.temp());
        self.emit(Instruction::BuiltInCall {
            builtin,
            args: args.iter().map(|&a| a.clone()).collect(),
            dst: dst.clone(),
        });
        dst
    }

    pub fn vtable(&mut self, class: &str, methods: &[String]) {
        self.emit(Instruction::VTable {
            class: class.to_string(),
            methods: methods.to_vec(),
        });
    }
}
