//! Kind enumerations shared by the design graph.
//!
//! These are the closed sets the code generator pattern-matches on: net
//! kinds, data types, strengths, gate and device kinds, process kinds and
//! the statement-level selectors.

use std::fmt;

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::ClassId;

// ============================================================================
// Strengths and nets
// ============================================================================

/// Drive strength of a driver on one of its two output values.
///
/// The discriminant is the digit used in strength-aware constants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum Drive {
    HiZ = 0,
    Small = 1,
    Medium = 2,
    Weak = 3,
    Large = 4,
    Pull = 5,
    #[default]
    Strong = 6,
    Supply = 7,
}

impl Drive {
    /// The single strength digit.
    #[inline]
    pub fn digit(self) -> u8 {
        self.into()
    }
}

/// Net kind of a signal. Selects the undriven value and the resolution
/// function applied to multiple drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetKind {
    /// A variable: holds its value, driven only procedurally.
    #[default]
    Reg,
    /// Plain wire/tri net.
    Tri,
    /// Pulls to 0 when undriven.
    Tri0,
    /// Pulls to 1 when undriven.
    Tri1,
    /// Wired-AND resolution.
    TriAnd,
    /// Wired-OR resolution.
    TriOr,
    /// Single-driver net; a second driver is an error.
    Uwire,
}

impl NetKind {
    /// Whether this is a net rather than a variable.
    #[inline]
    pub fn is_net(self) -> bool {
        !matches!(self, NetKind::Reg)
    }

    /// Name of the strength-resolution function for this kind.
    pub fn resolver_name(self) -> &'static str {
        match self {
            NetKind::Tri0 => "tri0",
            NetKind::Tri1 => "tri1",
            NetKind::TriAnd => "triand",
            NetKind::TriOr => "trior",
            NetKind::Uwire => "uwire",
            NetKind::Reg | NetKind::Tri => "tri",
        }
    }
}

/// Direction of a port signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortDir {
    #[default]
    None,
    Input,
    Output,
    Inout,
}

impl PortDir {
    /// Keyword used in port-info records.
    pub fn keyword(self) -> &'static str {
        match self {
            PortDir::None => "NODIR",
            PortDir::Input => "INPUT",
            PortDir::Output => "OUTPUT",
            PortDir::Inout => "INOUT",
        }
    }
}

// ============================================================================
// Data types
// ============================================================================

/// Declared data type of a signal or class property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 4-state packed vector.
    Logic,
    /// 2-state packed vector.
    Bool,
    Real,
    String,
    /// Handle to an instance of a class.
    Class(ClassId),
    /// Dynamic array of the element type.
    Darray(Box<DataType>),
    /// Queue of the element type with an optional maximum index.
    Queue(Box<DataType>, Option<u32>),
}

impl DataType {
    /// The evaluation domain a value of this type lives in.
    pub fn domain(&self) -> Domain {
        match self {
            DataType::Logic | DataType::Bool => Domain::Vec4,
            DataType::Real => Domain::Real,
            DataType::String => Domain::Str,
            DataType::Class(_) | DataType::Darray(_) | DataType::Queue(..) => Domain::Obj,
        }
    }

    /// Element type of a dynamic array or queue.
    pub fn element(&self) -> Option<&DataType> {
        match self {
            DataType::Darray(elem) | DataType::Queue(elem, _) => Some(elem),
            _ => None,
        }
    }

    /// The type an expression reading this variable carries.
    pub fn value_type(&self) -> ValueType {
        match self {
            DataType::Logic => ValueType::Logic,
            DataType::Bool => ValueType::Bool,
            DataType::Real => ValueType::Real,
            DataType::String => ValueType::String,
            DataType::Class(class) => ValueType::Class(*class),
            DataType::Darray(_) => ValueType::Darray,
            DataType::Queue(..) => ValueType::Queue,
        }
    }
}

/// Value type carried by an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    Logic,
    Bool,
    Real,
    String,
    Class(ClassId),
    Darray,
    Queue,
    /// A task call or other expression with no value.
    Void,
}

impl ValueType {
    /// The evaluation domain a value of this type lives in.
    pub fn domain(self) -> Domain {
        match self {
            ValueType::Logic | ValueType::Bool | ValueType::Void => Domain::Vec4,
            ValueType::Real => Domain::Real,
            ValueType::String => Domain::Str,
            ValueType::Class(_) | ValueType::Darray | ValueType::Queue => Domain::Obj,
        }
    }
}

/// One of the four value stacks of the target machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Vec4,
    Real,
    Str,
    Obj,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Vec4, Domain::Real, Domain::Str, Domain::Obj];

    /// Position of this domain's stack in per-domain arrays.
    #[inline]
    pub const fn slot(self) -> usize {
        match self {
            Domain::Vec4 => 0,
            Domain::Real => 1,
            Domain::Str => 2,
            Domain::Obj => 3,
        }
    }

    /// Instruction suffix naming the domain.
    pub fn suffix(self) -> &'static str {
        match self {
            Domain::Vec4 => "vec4",
            Domain::Real => "real",
            Domain::Str => "str",
            Domain::Obj => "obj",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

// ============================================================================
// Scopes and processes
// ============================================================================

/// Kind of a scope in the instance hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScopeKind {
    #[default]
    Module,
    Task,
    Function,
    Begin,
    Fork,
    Generate,
    Package,
    Class,
}

impl ScopeKind {
    /// Keyword used in the scope-open record.
    pub fn keyword(self) -> &'static str {
        match self {
            ScopeKind::Module => "module",
            ScopeKind::Task => "task",
            ScopeKind::Function => "function",
            ScopeKind::Begin => "begin",
            ScopeKind::Fork => "fork",
            ScopeKind::Generate => "generate",
            ScopeKind::Package => "package",
            ScopeKind::Class => "class",
        }
    }

    /// Whether the scope owns a callable body.
    #[inline]
    pub fn is_subroutine(self) -> bool {
        matches!(self, ScopeKind::Task | ScopeKind::Function)
    }
}

bitflags! {
    /// Attributes of a scope.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScopeFlags: u8 {
        /// Variables are allocated per call.
        const AUTOMATIC = 1 << 0;
        /// Instance of a library cell.
        const CELL = 1 << 1;
        /// A function with no return value.
        const VOID = 1 << 2;
    }
}

/// Kind of a behavioral process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessKind {
    Initial,
    Always,
    AlwaysComb,
    AlwaysFf,
    AlwaysLatch,
    Final,
}

impl ProcessKind {
    /// Whether the body loops back to its entry when it completes.
    #[inline]
    pub fn repeats(self) -> bool {
        matches!(
            self,
            ProcessKind::Always
                | ProcessKind::AlwaysComb
                | ProcessKind::AlwaysFf
                | ProcessKind::AlwaysLatch
        )
    }
}

// ============================================================================
// Structural primitives
// ============================================================================

/// Kind of a primitive logic gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicKind {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
    Buf,
    /// Transparent buffer used for net-to-net connections.
    BufT,
    Bufz,
    Bufif0,
    Bufif1,
    Not,
    Notif0,
    Notif1,
    Pulldown,
    Pullup,
    Nmos,
    Pmos,
    Rnmos,
    Rpmos,
    Cmos,
    Rcmos,
}

impl LogicKind {
    /// Whether the gate computes a reduction over any number of inputs.
    #[inline]
    pub fn is_reduction(self) -> bool {
        matches!(
            self,
            LogicKind::And
                | LogicKind::Nand
                | LogicKind::Or
                | LogicKind::Nor
                | LogicKind::Xor
                | LogicKind::Xnor
        )
    }

    /// Whether the output strength depends on input strength.
    #[inline]
    pub fn passes_strength(self) -> bool {
        matches!(
            self,
            LogicKind::Bufif0
                | LogicKind::Bufif1
                | LogicKind::Notif0
                | LogicKind::Notif1
                | LogicKind::Nmos
                | LogicKind::Pmos
                | LogicKind::Rnmos
                | LogicKind::Rpmos
                | LogicKind::Cmos
                | LogicKind::Rcmos
        )
    }
}

/// Kind of a parameterized structural device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LpmKind {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    Pow,
    CmpEq,
    CmpNe,
    CmpEeq,
    CmpNee,
    CmpGe,
    CmpGt,
    /// Concatenation; inputs are given LSB first with these widths.
    Concat { widths: Vec<u32> },
    /// `size` data inputs followed by one select input.
    Mux { size: u32 },
    /// Constant-offset part select of the single input.
    PartSelect { base: u32 },
    /// Part select with the offset given by a second input.
    PartSelectVar,
    /// Part select whose result drives a slice of a wider vector.
    PartSelectPv { base: u32, target_width: u32 },
    ReduceAnd,
    ReduceOr,
    ReduceXor,
    ReduceNand,
    ReduceNor,
    ReduceXnor,
    ShiftL,
    ShiftR,
    /// Replicate the input `count` times.
    Repeat { count: u32 },
    SignExt,
    Abs,
    CastReal,
    CastInt,
    /// Continuous system-function call.
    Sfunc { name: String },
    /// Continuous user-function call of the given function scope.
    Ufunc { func: crate::ScopeId },
    /// Edge-triggered flip-flop: data, clock, optional enable.
    Dff { negedge: bool, has_enable: bool },
    /// Level-sensitive latch: data, enable.
    Latch,
    /// Read port of an unpacked array: the address input.
    ArrayPort { array: crate::SignalId },
}

impl LpmKind {
    /// Number of inputs a device of this kind must have, when fixed.
    pub fn fixed_inputs(&self) -> Option<usize> {
        match self {
            LpmKind::Add
            | LpmKind::Sub
            | LpmKind::Mult
            | LpmKind::Div
            | LpmKind::Mod
            | LpmKind::Pow
            | LpmKind::CmpEq
            | LpmKind::CmpNe
            | LpmKind::CmpEeq
            | LpmKind::CmpNee
            | LpmKind::CmpGe
            | LpmKind::CmpGt
            | LpmKind::ShiftL
            | LpmKind::ShiftR
            | LpmKind::PartSelectVar => Some(2),
            LpmKind::PartSelect { .. }
            | LpmKind::PartSelectPv { .. }
            | LpmKind::ReduceAnd
            | LpmKind::ReduceOr
            | LpmKind::ReduceXor
            | LpmKind::ReduceNand
            | LpmKind::ReduceNor
            | LpmKind::ReduceXnor
            | LpmKind::Repeat { .. }
            | LpmKind::SignExt
            | LpmKind::Abs
            | LpmKind::CastReal
            | LpmKind::CastInt
            | LpmKind::ArrayPort { .. } => Some(1),
            LpmKind::Concat { widths } => Some(widths.len()),
            LpmKind::Mux { size } => Some(*size as usize + 1),
            LpmKind::Dff { has_enable, .. } => Some(if *has_enable { 3 } else { 2 }),
            LpmKind::Latch => Some(2),
            LpmKind::Sfunc { .. } | LpmKind::Ufunc { .. } => None,
        }
    }
}

/// Kind of a bidirectional switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchKind {
    Tran,
    Tranif0,
    Tranif1,
    Rtran,
    Rtranif0,
    Rtranif1,
    /// Part-select tran joining a vector to a slice of a wider vector.
    TranVp,
}

impl SwitchKind {
    /// Record keyword for the switch.
    pub fn keyword(self) -> &'static str {
        match self {
            SwitchKind::Tran => "tran",
            SwitchKind::Tranif0 => "tranif0",
            SwitchKind::Tranif1 => "tranif1",
            SwitchKind::Rtran => "rtran",
            SwitchKind::Rtranif0 => "rtranif0",
            SwitchKind::Rtranif1 => "rtranif1",
            SwitchKind::TranVp => "tranvp",
        }
    }

    /// Whether the switch has an enable terminal.
    #[inline]
    pub fn has_enable(self) -> bool {
        matches!(
            self,
            SwitchKind::Tranif0 | SwitchKind::Tranif1 | SwitchKind::Rtranif0 | SwitchKind::Rtranif1
        )
    }
}

// ============================================================================
// Behavioral selectors
// ============================================================================

/// Edge sensitivity of an event source or module path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Pos,
    Neg,
    Any,
}

impl Edge {
    /// Keyword used in event records.
    pub fn keyword(self) -> &'static str {
        match self {
            Edge::Pos => "posedge",
            Edge::Neg => "negedge",
            Edge::Any => "edge",
        }
    }
}

/// Comparison flavor of a case statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseKind {
    /// Exact 4-state match.
    #[default]
    Exact,
    /// `x` and `z` are don't-care.
    DontCareX,
    /// `z` is don't-care.
    DontCareZ,
    /// Case over real values.
    Real,
}

/// Case quality attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseQuality {
    #[default]
    None,
    Unique,
    Unique0,
    Priority,
}

impl CaseQuality {
    /// Keyword used in violation messages.
    pub fn keyword(self) -> &'static str {
        match self {
            CaseQuality::None => "",
            CaseQuality::Unique => "unique",
            CaseQuality::Unique0 => "unique0",
            CaseQuality::Priority => "priority",
        }
    }

    /// Whether a case with no matching arm and no default must report.
    #[inline]
    pub fn requires_match(self) -> bool {
        matches!(self, CaseQuality::Unique | CaseQuality::Priority)
    }
}

/// Join behavior of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockKind {
    #[default]
    Sequential,
    /// `fork ... join`: wait for every branch.
    Fork,
    /// `fork ... join_any`: wait for one branch, detach the rest.
    ForkJoinAny,
    /// `fork ... join_none`: detach every branch.
    ForkJoinNone,
}

impl BlockKind {
    #[inline]
    pub fn is_fork(self) -> bool {
        !matches!(self, BlockKind::Sequential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_digits_follow_strength_order() {
        assert_eq!(Drive::HiZ.digit(), 0);
        assert_eq!(Drive::Strong.digit(), 6);
        assert_eq!(Drive::try_from(7u8).unwrap(), Drive::Supply);
        assert!(Drive::try_from(8u8).is_err());
        assert!(Drive::Pull < Drive::Strong);
    }

    #[test]
    fn resolver_names() {
        assert_eq!(NetKind::Tri.resolver_name(), "tri");
        assert_eq!(NetKind::Tri1.resolver_name(), "tri1");
        assert_eq!(NetKind::TriOr.resolver_name(), "trior");
    }

    #[test]
    fn darray_lives_in_object_domain() {
        let ty = DataType::Darray(Box::new(DataType::Real));
        assert_eq!(ty.domain(), Domain::Obj);
        assert_eq!(ty.element(), Some(&DataType::Real));
        assert_eq!(ValueType::String.domain(), Domain::Str);
    }

    #[test]
    fn lpm_fixed_inputs() {
        assert_eq!(LpmKind::Mux { size: 4 }.fixed_inputs(), Some(5));
        assert_eq!(
            LpmKind::Dff {
                negedge: false,
                has_enable: true
            }
            .fixed_inputs(),
            Some(3)
        );
        assert_eq!(LpmKind::Sfunc { name: "$random".into() }.fixed_inputs(), None);
    }

    #[test]
    fn always_kinds_repeat() {
        assert!(ProcessKind::AlwaysComb.repeats());
        assert!(!ProcessKind::Initial.repeats());
        assert!(!ProcessKind::Final.repeats());
    }
}
