//! Shared helpers for the integration tests: a line-aware program builder
//! and a small interpreter for TAC listings.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Once;

use decaf::ast::{AstBuilder, BinaryOp, Ident, TypeExpr};
use decaf::compiler::FrameConfig;
use decaf::compiler::emit::{BuiltIn, Constant, Location, Segment, TacOp};
use decaf::core::{DeclId, ExprId, Span, StmtId};
use decaf::Instruction;

static TRACING_INIT: Once = Once::new();

/// Install a subscriber when `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer())
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

// ============================================================================
// Program building
// ============================================================================

/// An identifier at `line:col`.
pub fn ident(name: &str, line: u32, col: u32) -> Ident {
    Ident::new(name, Span::on_line(line, col, name.len() as u32))
}

/// An identifier with no meaningful location.
pub fn name(name: &str) -> Ident {
    Ident::new(name, Span::default())
}

pub fn at(line: u32) -> Span {
    Span::point(line, 1)
}

/// Thin wrapper over [`AstBuilder`] for the shapes the tests keep needing.
pub struct Program {
    pub b: AstBuilder,
}

impl Program {
    pub fn new() -> Self {
        init_tracing();
        Self {
            b: AstBuilder::new(),
        }
    }

    /// `ret name(formals) { decls stmts }`
    pub fn function(
        &mut self,
        name: Ident,
        ret: TypeExpr,
        formals: Vec<DeclId>,
        decls: Vec<DeclId>,
        stmts: Vec<StmtId>,
    ) -> DeclId {
        let body = self.b.block(decls, stmts, name.span);
        self.b.function(name, ret, formals, Some(body))
    }

    /// `ret name(formals);`
    pub fn prototype(&mut self, name: Ident, ret: TypeExpr, formals: Vec<DeclId>) -> DeclId {
        self.b.function(name, ret, formals, None)
    }

    pub fn var(&mut self, name: &str, ty: TypeExpr) -> DeclId {
        self.b.var(self::name(name), ty)
    }

    pub fn read(&mut self, var: &str) -> ExprId {
        self.b.ident(name(var))
    }

    pub fn int(&mut self, value: i32) -> ExprId {
        self.b.int_const(value, Span::default())
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        self.b.string_const(value, Span::default())
    }

    /// `var = value;`
    pub fn set(&mut self, var: &str, value: ExprId) -> StmtId {
        let target = self.read(var);
        let assign = self.b.assign(target, value);
        self.b.expr_stmt(assign)
    }

    /// `target = value;` for any lvalue.
    pub fn store(&mut self, target: ExprId, value: ExprId) -> StmtId {
        let assign = self.b.assign(target, value);
        self.b.expr_stmt(assign)
    }

    pub fn print(&mut self, args: Vec<ExprId>) -> StmtId {
        self.b.print_stmt(args, Span::default())
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.b.binary(op, left, right)
    }

    pub fn finish(self, program: Vec<DeclId>) -> decaf::ast::Ast {
        self.b.finish(program)
    }
}

// ============================================================================
// Interpreter
// ============================================================================

/// A runtime word. Labels (vtables and method addresses) are carried as
/// strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    Int(i32),
    Str(String),
}

impl Word {
    fn int(&self) -> i32 {
        match self {
            Word::Int(v) => *v,
            Word::Str(s) => panic!("expected an integer, found string {:?}", s),
        }
    }

    fn label(&self) -> &str {
        match self {
            Word::Str(s) => s,
            Word::Int(v) => panic!("expected a label, found integer {}", v),
        }
    }
}

/// What a run printed and whether it halted through `_Halt`.
#[derive(Debug, Default)]
pub struct Run {
    pub output: Vec<String>,
    pub halted: bool,
}

struct Frame {
    slots: HashMap<i32, Word>,
    return_to: usize,
    dst: Option<Location>,
}

struct Machine<'c> {
    globals: HashMap<i32, Word>,
    frames: Vec<Frame>,
    params: Vec<Word>,
    heap: HashMap<i32, Word>,
    next_addr: i32,
    vtables: HashMap<&'c str, &'c [String]>,
}

impl Machine<'_> {
    fn slots(&mut self, segment: Segment) -> &mut HashMap<i32, Word> {
        match segment {
            Segment::GpRelative => &mut self.globals,
            Segment::FpRelative => &mut self.frames.last_mut().expect("no active frame").slots,
        }
    }

    fn get(&mut self, loc: &Location) -> Word {
        self.slots(loc.segment)
            .get(&loc.offset)
            .cloned()
            .unwrap_or_else(|| panic!("read of unset location {}", loc))
    }

    fn set(&mut self, loc: &Location, word: Word) {
        self.slots(loc.segment).insert(loc.offset, word);
    }

    fn load(&mut self, addr: &Location, offset: i32) -> Word {
        match self.get(addr) {
            Word::Int(base) => self.heap.get(&(base + offset)).cloned().unwrap_or(Word::Int(0)),
            Word::Str(class) => {
                let methods = self.vtables[class.as_str()];
                Word::Str(methods[(offset / SLOT) as usize].clone())
            }
        }
    }

    /// Enter `label` with the pushed parameters, last pushed first.
    fn call(&mut self, label: &str, dst: &Option<Location>, return_to: usize) {
        let config = FrameConfig::default();
        let slots = self
            .params
            .iter()
            .rev()
            .enumerate()
            .map(|(i, word)| (config.param_offset(i as u32), word.clone()))
            .collect();
        self.frames.push(Frame {
            slots,
            return_to,
            dst: dst.clone(),
        });
        tracing::trace!(label, depth = self.frames.len(), "call");
    }
}

const SLOT: i32 = 4;

/// Execute a listing from `main`. Calls, vtable dispatch, globals, and heap
/// objects are supported; `_ReadInteger` consumes `inputs` in order.
pub fn run_main(code: &[Instruction], inputs: &[i32]) -> Run {
    let labels: HashMap<&str, usize> = code
        .iter()
        .enumerate()
        .filter_map(|(i, ins)| match ins {
            Instruction::Label(l) => Some((l.as_str(), i)),
            _ => None,
        })
        .collect();
    let vtables = code
        .iter()
        .filter_map(|ins| match ins {
            Instruction::VTable { class, methods } => Some((class.as_str(), methods.as_slice())),
            _ => None,
        })
        .collect();

    let mut m = Machine {
        globals: HashMap::new(),
        frames: vec![Frame {
            slots: HashMap::new(),
            return_to: 0,
            dst: None,
        }],
        params: Vec::new(),
        heap: HashMap::new(),
        next_addr: 1000,
        vtables,
    };
    let mut inputs = inputs.iter().copied();
    let mut run = Run::default();

    let mut pc = labels["main"];
    loop {
        let ins = &code[pc];
        pc += 1;
        match ins {
            Instruction::LoadConstant { dst, value } => {
                let word = match value {
                    Constant::Int(v) => Word::Int(*v),
                    Constant::Str(s) => Word::Str(s.clone()),
                    Constant::Double(_) => panic!("doubles are not interpreted"),
                };
                m.set(dst, word);
            }
            Instruction::LoadLabel { dst, label } => m.set(dst, Word::Str(label.clone())),
            Instruction::Assign { dst, src } => {
                let word = m.get(src);
                m.set(dst, word);
            }
            Instruction::Load { dst, addr, offset } => {
                let word = m.load(addr, *offset);
                m.set(dst, word);
            }
            Instruction::Store { addr, src, offset } => {
                let at = m.get(addr).int() + offset;
                let word = m.get(src);
                m.heap.insert(at, word);
            }
            Instruction::BinaryOp {
                op,
                dst,
                left,
                right,
            } => {
                let (l, r) = (m.get(left).int(), m.get(right).int());
                let v = match op {
                    TacOp::Add => l + r,
                    TacOp::Sub => l - r,
                    TacOp::Mul => l * r,
                    TacOp::Div => l / r,
                    TacOp::Mod => l % r,
                    TacOp::Less => (l < r) as i32,
                    TacOp::Equal => (l == r) as i32,
                    TacOp::And => (l != 0 && r != 0) as i32,
                    TacOp::Or => (l != 0 || r != 0) as i32,
                };
                m.set(dst, Word::Int(v));
            }
            Instruction::Label(_) | Instruction::BeginFunc => {}
            Instruction::Goto(label) => pc = labels[label.as_str()],
            Instruction::IfZ { test, label } => {
                if m.get(test).int() == 0 {
                    pc = labels[label.as_str()];
                }
            }
            Instruction::PushParam(param) => {
                let word = m.get(param);
                m.params.push(word);
            }
            Instruction::PopParams(bytes) => {
                let keep = m.params.len() - (bytes / SLOT) as usize;
                m.params.truncate(keep);
            }
            Instruction::LCall { label, dst } => {
                m.call(label, dst, pc);
                pc = labels[label.as_str()];
            }
            Instruction::ACall { addr, dst } => {
                let target = m.get(addr);
                m.call(target.label(), dst, pc);
                pc = labels[target.label()];
            }
            Instruction::EndFunc { .. } | Instruction::Return(_) => {
                let result = match ins {
                    Instruction::Return(Some(value)) => Some(m.get(value)),
                    _ => None,
                };
                let frame = m.frames.pop().expect("no active frame");
                if m.frames.is_empty() {
                    return run;
                }
                pc = frame.return_to;
                if let (Some(dst), Some(result)) = (&frame.dst, result) {
                    m.set(dst, result);
                }
            }
            Instruction::BuiltInCall { builtin, args, dst } => {
                let result = match builtin {
                    BuiltIn::Alloc => {
                        let bytes = m.get(&args[0]).int();
                        let addr = m.next_addr;
                        m.next_addr += bytes;
                        Some(Word::Int(addr))
                    }
                    BuiltIn::ReadInteger => {
                        Some(Word::Int(inputs.next().expect("ran out of input")))
                    }
                    BuiltIn::StringEqual => {
                        let equal = m.get(&args[0]) == m.get(&args[1]);
                        Some(Word::Int(equal as i32))
                    }
                    BuiltIn::PrintInt => {
                        let v = m.get(&args[0]).int();
                        run.output.push(v.to_string());
                        None
                    }
                    BuiltIn::PrintBool => {
                        let b = m.get(&args[0]).int() != 0;
                        run.output.push(b.to_string());
                        None
                    }
                    BuiltIn::PrintString => match m.get(&args[0]) {
                        Word::Str(s) => {
                            run.output.push(s);
                            None
                        }
                        other => panic!("printing {:?} as a string", other),
                    },
                    BuiltIn::Halt => {
                        run.halted = true;
                        return run;
                    }
                    BuiltIn::ReadLine => panic!("line input is not interpreted"),
                };
                if let (Some(dst), Some(result)) = (dst, result) {
                    m.set(dst, result);
                }
            }
            Instruction::VTable { .. } => panic!("ran into vtable data at {}", pc - 1),
        }
    }
}
