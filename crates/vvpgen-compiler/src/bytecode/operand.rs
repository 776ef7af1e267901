//! Instruction operands and symbolic labels.

use std::fmt;

use vvpgen_core::{
    Bits4, ClassId, ConstId, Domain, EnumId, EventId, IslandId, LogicId, LpmId, NexusId, ScopeId,
    SignalId,
};

/// A symbolic name in the emitted program.
///
/// Structural labels are derived from arena indices, so the same object
/// always renders to the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// Entry of a process thread: `T_<n>`.
    Thread(u32),
    /// Thread-local label: `T_<thread>.<local>`.
    Local { thread: u32, local: u32 },
    /// Run-unique label for fork branches and skip targets: `t_<n>`.
    Transient(u32),
    /// Entry of a task or function body: `TD_<scope>`.
    TaskDef(ScopeId),
    Scope(ScopeId),
    /// One word of a signal: `v<sig>_<word>`.
    Signal(SignalId, u32),
    /// An unpacked array as a whole: `v<sig>`.
    Array(SignalId),
    Event(EventId),
    /// A combined event created for a multi-event wait: `E_w<n>`.
    WaitEvent(u32),
    Logic(LogicId),
    Lpm(LpmId),
    /// A constant given a functor because it carries a delay.
    Const(ConstId),
    /// Strength resolver of a nexus: `RS_<nexus>`.
    Resolver(NexusId),
    Island(IslandId),
    /// Island port of a nexus: `p<nexus>`.
    Port(NexusId),
    /// Module-path delay record: `V_<n>`.
    Modpath(u32),
    Class(ClassId),
    Enum(EnumId),
    Param(u32),
    /// A helper node hanging off another label: `<base>/<suffix>`.
    Sub(Box<Label>, String),
}

impl Label {
    /// A helper label derived from this one.
    pub fn sub(&self, suffix: impl fmt::Display) -> Label {
        Label::Sub(Box::new(self.clone()), suffix.to_string())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Thread(n) => write!(f, "T_{n}"),
            Label::Local { thread, local } => write!(f, "T_{thread}.{local}"),
            Label::Transient(n) => write!(f, "t_{n}"),
            Label::TaskDef(scope) => write!(f, "TD_{}", scope.index()),
            Label::Scope(scope) => write!(f, "S_{}", scope.index()),
            Label::Signal(sig, word) => write!(f, "v{}_{word}", sig.index()),
            Label::Array(sig) => write!(f, "v{}", sig.index()),
            Label::Event(ev) => write!(f, "E_{}", ev.index()),
            Label::WaitEvent(n) => write!(f, "E_w{n}"),
            Label::Logic(id) => write!(f, "L_{}", id.index()),
            Label::Lpm(id) => write!(f, "LPM_{}", id.index()),
            Label::Const(id) => write!(f, "LC_{}", id.index()),
            Label::Resolver(nex) => write!(f, "RS_{}", nex.index()),
            Label::Island(id) => write!(f, "I{}", id.index()),
            Label::Port(nex) => write!(f, "p{}", nex.index()),
            Label::Modpath(n) => write!(f, "V_{n}"),
            Label::Class(id) => write!(f, "CL_{}", id.index()),
            Label::Enum(id) => write!(f, "enum{}", id.index()),
            Label::Param(n) => write!(f, "P_{n}"),
            Label::Sub(base, suffix) => write!(f, "{base}/{suffix}"),
        }
    }
}

/// One operand of an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Label(Label),
    Int(i64),
    /// A quoted string, escaped on output.
    Str(String),
    /// Inline numeric argument of a system call: `<w>'[s]b<bits>`.
    Bits { value: Bits4, signed: bool },
    /// Reference to an already-evaluated system-call argument on a value
    /// stack, counted from the top.
    StackRef {
        domain: Domain,
        depth: u32,
        width: u32,
        signed: bool,
    },
    /// Trailing counts of evaluated system-call arguments: `{v r s}`.
    Counts { vec4: u32, real: u32, str: u32 },
}

impl Operand {
    /// The integer value, if this is an integer operand.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Operand::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&Label> {
        match self {
            Operand::Label(l) => Some(l),
            _ => None,
        }
    }
}

impl From<Label> for Operand {
    fn from(label: Label) -> Self {
        Operand::Label(label)
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Int(v)
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Int(i64::from(v))
    }
}

impl From<usize> for Operand {
    fn from(v: usize) -> Self {
        Operand::Int(v as i64)
    }
}

impl From<u32> for Operand {
    fn from(v: u32) -> Self {
        Operand::Int(i64::from(v))
    }
}

impl From<u64> for Operand {
    fn from(v: u64) -> Self {
        Operand::Int(v as i64)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Str(s.to_string())
    }
}

/// Escape a string for a quoted operand. Quotes, backslashes and
/// non-printable bytes become three-digit octal escapes.
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte == b'"' || byte == b'\\' || !(0x20..0x7f).contains(&byte) {
            out.push_str(&format!("\\{:03o}", byte));
        } else {
            out.push(byte as char);
        }
    }
    out
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Label(l) => write!(f, "{l}"),
            Operand::Int(v) => write!(f, "{v}"),
            Operand::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Operand::Bits { value, signed } => {
                let s = if *signed { "s" } else { "" };
                write!(f, "{}'{s}b{}", value.width(), value.to_msb_string())
            }
            Operand::StackRef {
                domain,
                depth,
                width,
                signed,
            } => match domain {
                Domain::Vec4 => {
                    let s = if *signed { "s" } else { "u" };
                    write!(f, "S<{depth},vec4,{s}{width}>")
                }
                Domain::Real => write!(f, "W<{depth},r>"),
                Domain::Str => write!(f, "S<{depth},str>"),
                Domain::Obj => write!(f, "S<{depth},obj>"),
            },
            Operand::Counts { vec4, real, str } => write!(f, "{{{vec4} {real} {str}}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_spelling() {
        assert_eq!(Label::Thread(3).to_string(), "T_3");
        assert_eq!(Label::Local { thread: 3, local: 7 }.to_string(), "T_3.7");
        assert_eq!(Label::Transient(12).to_string(), "t_12");
        assert_eq!(Label::Signal(SignalId::new(4), 0).to_string(), "v4_0");
        assert_eq!(Label::Array(SignalId::new(4)).to_string(), "v4");
        assert_eq!(Label::Resolver(NexusId::new(9)).to_string(), "RS_9");
    }

    #[test]
    fn sub_labels_nest() {
        let base = Label::Logic(LogicId::new(2));
        assert_eq!(base.sub("d").to_string(), "L_2/d");
        assert_eq!(base.sub(0).sub(1).to_string(), "L_2/0/1");
    }

    #[test]
    fn string_operands_escape_quotes() {
        let op = Operand::Str("say \"hi\"\n".to_string());
        assert_eq!(op.to_string(), "\"say \\042hi\\042\\012\"");
    }

    #[test]
    fn inline_numbers() {
        let op = Operand::Bits {
            value: Bits4::from_u64(5, 4),
            signed: true,
        };
        assert_eq!(op.to_string(), "4'sb0101");
        let counts = Operand::Counts {
            vec4: 1,
            real: 0,
            str: 2,
        };
        assert_eq!(counts.to_string(), "{1 0 2}");
    }
}
