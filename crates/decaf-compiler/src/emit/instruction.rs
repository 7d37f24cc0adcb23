//! Three-address instruction vocabulary.
//!
//! Every request the code generator can issue to an instruction emitter.
//! `Display` renders the conventional TAC listing form, e.g.
//! `_tmp3 = _tmp1 + _tmp2` or `IfZ _tmp4 Goto _L0`.

use std::fmt;

use ordered_float::OrderedFloat;

/// Memory segment a location is addressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Relative to the frame pointer (parameters, locals, temporaries).
    FpRelative,
    /// Relative to the global pointer (global variables).
    GpRelative,
}

/// A named storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub name: String,
    pub segment: Segment,
    pub offset: i32,
}

impl Location {
    pub fn new(name: impl Into<String>, segment: Segment, offset: i32) -> Self {
        Self {
            name: name.into(),
            segment,
            offset,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Constant operand of a load-constant request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i32),
    Double(OrderedFloat<f64>),
    Str(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Double(v) => write!(f, "{}", v),
            Constant::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Operators the target executes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TacOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Equal,
    And,
    Or,
}

impl TacOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TacOp::Add => "+",
            TacOp::Sub => "-",
            TacOp::Mul => "*",
            TacOp::Div => "/",
            TacOp::Mod => "%",
            TacOp::Less => "<",
            TacOp::Equal => "==",
            TacOp::And => "&&",
            TacOp::Or => "||",
        }
    }
}

impl fmt::Display for TacOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime library entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltIn {
    Alloc,
    ReadLine,
    ReadInteger,
    StringEqual,
    PrintInt,
    PrintString,
    PrintBool,
    Halt,
}

impl BuiltIn {
    pub fn name(self) -> &'static str {
        match self {
            BuiltIn::Alloc => "_Alloc",
            BuiltIn::ReadLine => "_ReadLine",
            BuiltIn::ReadInteger => "_ReadInteger",
            BuiltIn::StringEqual => "_StringEqual",
            BuiltIn::PrintInt => "_PrintInt",
            BuiltIn::PrintString => "_PrintString",
            BuiltIn::PrintBool => "_PrintBool",
            BuiltIn::Halt => "_Halt",
        }
    }

    /// Number of arguments the built-in takes.
    pub fn arity(self) -> usize {
        match self {
            BuiltIn::ReadLine | BuiltIn::ReadInteger | BuiltIn::Halt => 0,
            BuiltIn::Alloc | BuiltIn::PrintInt | BuiltIn::PrintString | BuiltIn::PrintBool => 1,
            BuiltIn::StringEqual => 2,
        }
    }

    /// Whether the built-in produces a value.
    pub fn has_result(self) -> bool {
        matches!(
            self,
            BuiltIn::Alloc | BuiltIn::ReadLine | BuiltIn::ReadInteger | BuiltIn::StringEqual
        )
    }
}

impl fmt::Display for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One three-address request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    LoadConstant {
        dst: Location,
        value: Constant,
    },
    LoadLabel {
        dst: Location,
        label: String,
    },
    Assign {
        dst: Location,
        src: Location,
    },
    /// `dst = *(addr + offset)`
    Load {
        dst: Location,
        addr: Location,
        offset: i32,
    },
    /// `*(addr + offset) = src`
    Store {
        addr: Location,
        src: Location,
        offset: i32,
    },
    BinaryOp {
        op: TacOp,
        dst: Location,
        left: Location,
        right: Location,
    },
    Label(String),
    Goto(String),
    /// Jump to `label` when `test` is zero.
    IfZ {
        test: Location,
        label: String,
    },
    BeginFunc,
    EndFunc {
        /// Bytes of locals and temporaries.
        frame_size: i32,
    },
    Return(Option<Location>),
    PushParam(Location),
    /// Release `bytes` of pushed parameters.
    PopParams(i32),
    /// Direct call by label.
    LCall {
        label: String,
        dst: Option<Location>,
    },
    /// Indirect call through an address.
    ACall {
        addr: Location,
        dst: Option<Location>,
    },
    BuiltInCall {
        builtin: BuiltIn,
        args: Vec<Location>,
        dst: Option<Location>,
    },
    VTable {
        class: String,
        methods: Vec<String>,
    },
}

impl Instruction {
    /// Whether this is a label definition.
    pub fn is_label(&self) -> bool {
        matches!(self, Instruction::Label(_))
    }
}

fn write_address(f: &mut fmt::Formatter<'_>, addr: &Location, offset: i32) -> fmt::Result {
    match offset {
        0 => write!(f, "*({})", addr),
        o if o < 0 => write!(f, "*({} - {})", addr, -o),
        o => write!(f, "*({} + {})", addr, o),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadConstant { dst, value } => write!(f, "{} = {}", dst, value),
            Instruction::LoadLabel { dst, label } => write!(f, "{} = {}", dst, label),
            Instruction::Assign { dst, src } => write!(f, "{} = {}", dst, src),
            Instruction::Load { dst, addr, offset } => {
                write!(f, "{} = ", dst)?;
                write_address(f, addr, *offset)
            }
            Instruction::Store { addr, src, offset } => {
                write_address(f, addr, *offset)?;
                write!(f, " = {}", src)
            }
            Instruction::BinaryOp {
                op,
                dst,
                left,
                right,
            } => write!(f, "{} = {} {} {}", dst, left, op, right),
            Instruction::Label(label) => write!(f, "{}:", label),
            Instruction::Goto(label) => write!(f, "Goto {}", label),
            Instruction::IfZ { test, label } => write!(f, "IfZ {} Goto {}", test, label),
            Instruction::BeginFunc => f.write_str("BeginFunc"),
            Instruction::EndFunc { frame_size } => write!(f, "EndFunc {}", frame_size),
            Instruction::Return(Some(value)) => write!(f, "Return {}", value),
            Instruction::Return(None) => f.write_str("Return"),
            Instruction::PushParam(param) => write!(f, "PushParam {}", param),
            Instruction::PopParams(bytes) => write!(f, "PopParams {}", bytes),
            Instruction::LCall { label, dst } => match dst {
                Some(dst) => write!(f, "{} = LCall {}", dst, label),
                None => write!(f, "LCall {}", label),
            },
            Instruction::ACall { addr, dst } => match dst {
                Some(dst) => write!(f, "{} = ACall {}", dst, addr),
                None => write!(f, "ACall {}", addr),
            },
            Instruction::BuiltInCall { builtin, args, dst } => {
                if let Some(dst) = dst {
                    write!(f, "{} = ", dst)?;
                }
                write!(f, "{}(", builtin)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Instruction::VTable { class, methods } => {
                write!(f, "VTable {} = {}", class, methods.join(", "))
            }
        }
    }
}
