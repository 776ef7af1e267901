//! Operation codes of the target thread machine.
//!
//! The machine keeps four value stacks (vec4, real, string, object), a file
//! of integer index registers and a file of single-bit flags. Every opcode
//! knows its mnemonic and how it moves each stack so emitted code can be
//! checked for balance as it is written.

use vvpgen_core::Domain;

use super::Operand;

/// Net change an instruction makes to each value stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackEffect(pub [i32; 4]);

impl StackEffect {
    pub const NONE: StackEffect = StackEffect([0; 4]);

    /// A change on one stack only.
    pub const fn on(domain: Domain, delta: i32) -> Self {
        let mut d = [0; 4];
        d[domain.slot()] = delta;
        StackEffect(d)
    }

    /// Pop one stack and push another.
    pub const fn convert(from: Domain, to: Domain) -> Self {
        let mut d = [0; 4];
        d[from.slot()] = -1;
        d[to.slot()] = 1;
        StackEffect(d)
    }

    #[inline]
    pub fn get(&self, domain: Domain) -> i32 {
        self.0[domain.slot()]
    }
}

/// Operation codes.
///
/// Operands are written after the mnemonic, comma separated. Register
/// operands name an index register by number; flag operands name a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // =========================================================================
    // Vec4 immediates, loads and stores
    // =========================================================================
    /// Push an immediate. Operands: value, x-mask, width.
    PushiVec4,
    /// Shift the top left and append an immediate. Operands as `PushiVec4`.
    ConcatiVec4,
    /// Push a variable. Operand: signal word.
    LoadVec4,
    /// Push an array word. Operands: array, address register.
    LoadVec4a,
    /// Pop into a variable. Operands: signal word, offset register (0 for
    /// none), width.
    StoreVec4,
    /// Pop into an array word. Operands: array, address register, offset
    /// register.
    StoreVec4a,
    DupVec4,
    /// Operand: count.
    PopVec4,
    /// Concatenate the top `n` values, deepest most significant.
    ConcatVec4,
    /// Replicate the top `n` times.
    Replicate,
    PadU,
    PadS,
    /// Fixed-offset part select. Operands: width, offset.
    PartiU,
    PartiS,
    /// Part select at the offset in a register. Operands: width, register.
    PartU,
    PartS,
    /// Split the low `width` bits off the top into a new top.
    SplitVec4,

    // =========================================================================
    // Vec4 arithmetic and logic
    // =========================================================================
    Add,
    Sub,
    Mul,
    Div,
    DivS,
    Mod,
    ModS,
    Pow,
    PowS,
    /// Immediate forms. Operands: value low word, high word, width.
    Addi,
    Subi,
    Muli,
    Andi,
    Ori,
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    Inv,
    AndR,
    OrR,
    XorR,
    NandR,
    NorR,
    XnorR,
    /// Shift by the amount in a register. Operand: register.
    ShiftL,
    ShiftR,
    ShiftRS,
    /// Convert 4-state to 2-state in place.
    Cast2,
    /// Merge the top two values, x where they differ.
    Blend,

    // =========================================================================
    // Comparison and flags
    // =========================================================================
    /// Compare the top two; sets flags 4 (eq), 5 (lt), 6 (eeq).
    CmpU,
    CmpS,
    /// Equality only; sets flags 4 and 6.
    CmpE,
    CmpNe,
    /// Wildcard compares; set flag 4.
    CmpX,
    CmpZ,
    CmpWeq,
    CmpWne,
    /// Compare the top against an immediate.
    CmpiU,
    CmpiS,
    CmpiE,
    /// Push a flag as a 1-bit value. Operand: flag.
    FlagGetVec4,
    /// Pop a 1-bit value into a flag.
    FlagSetVec4,
    /// Operands: flag, value.
    FlagSetImm,
    /// Operands: destination, source.
    FlagMov,
    FlagOr,
    FlagAnd,
    FlagInv,

    // =========================================================================
    // Index registers
    // =========================================================================
    /// Pop a vec4 into a register; sets flag 4 if it had x/z bits.
    IxVec4,
    IxVec4S,
    /// Load an immediate. Operands: register, low word, high word.
    IxLoad,
    /// Add an immediate. Operands: register, low word, high word.
    IxAdd,

    // =========================================================================
    // Real
    // =========================================================================
    /// Operands: mantissa, exponent field.
    PushiReal,
    LoadReal,
    /// Operands: array, address register.
    LoadAr,
    StoreReal,
    StoreReala,
    AddWr,
    SubWr,
    MulWr,
    DivWr,
    ModWr,
    PowWr,
    /// Sets flags 4 (eq) and 5 (lt).
    CmpWr,
    BlendWr,
    CvtRv,
    CvtRvS,
    /// Operand: width.
    CvtVr,
    DupReal,
    PopReal,

    // =========================================================================
    // String
    // =========================================================================
    PushiStr,
    ConcatiStr,
    LoadStr,
    LoadStra,
    StoreStr,
    StoreStra,
    ConcatStr,
    /// Sets flags 4 (eq) and 5 (lt).
    CmpStr,
    /// Extract a slice of a string as a vec4. Operands: register, width.
    SubstrVec4,
    /// Overwrite one character. Operands: string variable, register.
    PutcStrVec4,
    /// Convert the top vec4 to a string.
    PushvStr,
    /// Operand: width.
    CastVec4Str,
    DupStr,
    PopStr,

    // =========================================================================
    // Objects, classes and dynamic arrays
    // =========================================================================
    /// Operand: class.
    NewCobj,
    /// Operands: size register, element type code.
    NewDarray,
    Null,
    LoadObj,
    LoadObja,
    StoreObj,
    StoreObja,
    /// Push a property of the top object. Operand: property index.
    PropV,
    PropR,
    PropStr,
    /// Operands: property index, word.
    PropObj,
    /// Pop into a property of the object below. Operands: property, width.
    StorePropV,
    StorePropR,
    StorePropStr,
    StorePropObj,
    /// Operands: count, skip.
    PopObj,
    DupObj,
    /// Shallow-copy the top object into the one below and pop it.
    Scopy,
    /// Set flag 4 if a variable holds null.
    TestNul,
    TestNulObj,
    /// Set an element of the darray on top. Operand: index register.
    SetDarObjVec4,
    SetDarObjReal,
    SetDarObjStr,
    /// Darray element access. Operands: variable, index register.
    LoadDarVec4,
    LoadDarR,
    LoadDarStr,
    StoreDarVec4,
    StoreDarR,
    StoreDarStr,
    /// Queue pushes. Operands: variable, max-size register, width.
    StoreQbVec4,
    StoreQfVec4,
    StoreQbR,
    StoreQfR,
    StoreQbStr,
    StoreQfStr,
    /// Queue pops. Operands: variable, width.
    QpopBVec4,
    QpopFVec4,
    QpopBR,
    QpopFR,
    QpopBStr,
    QpopFStr,

    // =========================================================================
    // Scheduled, procedural-continuous and forced assignment
    // =========================================================================
    /// Operands: variable, delay.
    AssignVec4,
    /// Operands: variable, delay register.
    AssignVec4D,
    /// Operand: variable; uses the event set by `%evctl`.
    AssignVec4E,
    /// Operands: variable, offset register, delay register.
    AssignVec4OffD,
    AssignVec4OffE,
    /// Operands: array, address register, offset register, delay register.
    AssignVec4AD,
    AssignVec4AE,
    AssignWr,
    AssignWrD,
    AssignWrE,
    /// Operands: array, address register, delay register.
    AssignArD,
    /// Operands: event, count register.
    Evctl,
    /// Operands: event, count.
    EvctlI,
    CassignVec4,
    /// Operands: variable, offset register.
    CassignVec4Off,
    CassignWr,
    /// Operands: variable, base, width.
    Deassign,
    ForceVec4,
    ForceVec4Off,
    ForceWr,
    /// Operands: net, base, width.
    ReleaseNet,
    /// Operands: variable, base, width.
    ReleaseReg,

    // =========================================================================
    // Control
    // =========================================================================
    Jmp,
    /// Conditional jumps. Operands: label, flag.
    Jmp0,
    Jmp1,
    Jmp0xz,
    Jmp1xz,
    End,
    /// Operands: label, scope.
    Fork,
    Join,
    /// Operand: count.
    JoinDetach,
    /// Operands: low word, high word.
    Delay,
    /// Operand: register.
    Delayx,
    /// Operand: event.
    Wait,
    WaitFork,
    /// Trigger a named event.
    Event,
    /// Operand: scope.
    Disable,
    DisableFork,
    /// Operand: scope.
    Alloc,
    Free,
    /// Operands: file, line, name, arguments..., counts.
    VpiCall,
    /// Operands: file, line, name, width, arguments..., counts.
    VpiFunc,
    VpiFuncR,
    VpiFuncS,
    /// Operands: file, line, description.
    FileLine,
}

impl Opcode {
    /// Mnemonic without the leading `%`.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::PushiVec4 => "pushi/vec4",
            Opcode::ConcatiVec4 => "concati/vec4",
            Opcode::LoadVec4 => "load/vec4",
            Opcode::LoadVec4a => "load/vec4a",
            Opcode::StoreVec4 => "store/vec4",
            Opcode::StoreVec4a => "store/vec4a",
            Opcode::DupVec4 => "dup/vec4",
            Opcode::PopVec4 => "pop/vec4",
            Opcode::ConcatVec4 => "concat/vec4",
            Opcode::Replicate => "replicate",
            Opcode::PadU => "pad/u",
            Opcode::PadS => "pad/s",
            Opcode::PartiU => "parti/u",
            Opcode::PartiS => "parti/s",
            Opcode::PartU => "part/u",
            Opcode::PartS => "part/s",
            Opcode::SplitVec4 => "split/vec4",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::DivS => "div/s",
            Opcode::Mod => "mod",
            Opcode::ModS => "mod/s",
            Opcode::Pow => "pow",
            Opcode::PowS => "pow/s",
            Opcode::Addi => "addi",
            Opcode::Subi => "subi",
            Opcode::Muli => "muli",
            Opcode::Andi => "andi",
            Opcode::Ori => "ori",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Nand => "nand",
            Opcode::Nor => "nor",
            Opcode::Xnor => "xnor",
            Opcode::Inv => "inv",
            Opcode::AndR => "and/r",
            Opcode::OrR => "or/r",
            Opcode::XorR => "xor/r",
            Opcode::NandR => "nand/r",
            Opcode::NorR => "nor/r",
            Opcode::XnorR => "xnor/r",
            Opcode::ShiftL => "shiftl",
            Opcode::ShiftR => "shiftr",
            Opcode::ShiftRS => "shiftr/s",
            Opcode::Cast2 => "cast2",
            Opcode::Blend => "blend",
            Opcode::CmpU => "cmp/u",
            Opcode::CmpS => "cmp/s",
            Opcode::CmpE => "cmp/e",
            Opcode::CmpNe => "cmp/ne",
            Opcode::CmpX => "cmp/x",
            Opcode::CmpZ => "cmp/z",
            Opcode::CmpWeq => "cmp/weq",
            Opcode::CmpWne => "cmp/wne",
            Opcode::CmpiU => "cmpi/u",
            Opcode::CmpiS => "cmpi/s",
            Opcode::CmpiE => "cmpi/e",
            Opcode::FlagGetVec4 => "flag_get/vec4",
            Opcode::FlagSetVec4 => "flag_set/vec4",
            Opcode::FlagSetImm => "flag_set/imm",
            Opcode::FlagMov => "flag_mov",
            Opcode::FlagOr => "flag_or",
            Opcode::FlagAnd => "flag_and",
            Opcode::FlagInv => "flag_inv",
            Opcode::IxVec4 => "ix/vec4",
            Opcode::IxVec4S => "ix/vec4/s",
            Opcode::IxLoad => "ix/load",
            Opcode::IxAdd => "ix/add",
            Opcode::PushiReal => "pushi/real",
            Opcode::LoadReal => "load/real",
            Opcode::LoadAr => "load/ar",
            Opcode::StoreReal => "store/real",
            Opcode::StoreReala => "store/reala",
            Opcode::AddWr => "add/wr",
            Opcode::SubWr => "sub/wr",
            Opcode::MulWr => "mul/wr",
            Opcode::DivWr => "div/wr",
            Opcode::ModWr => "mod/wr",
            Opcode::PowWr => "pow/wr",
            Opcode::CmpWr => "cmp/wr",
            Opcode::BlendWr => "blend/wr",
            Opcode::CvtRv => "cvt/rv",
            Opcode::CvtRvS => "cvt/rv/s",
            Opcode::CvtVr => "cvt/vr",
            Opcode::DupReal => "dup/real",
            Opcode::PopReal => "pop/real",
            Opcode::PushiStr => "pushi/str",
            Opcode::ConcatiStr => "concati/str",
            Opcode::LoadStr => "load/str",
            Opcode::LoadStra => "load/stra",
            Opcode::StoreStr => "store/str",
            Opcode::StoreStra => "store/stra",
            Opcode::ConcatStr => "concat/str",
            Opcode::CmpStr => "cmp/str",
            Opcode::SubstrVec4 => "substr/vec4",
            Opcode::PutcStrVec4 => "putc/str/vec4",
            Opcode::PushvStr => "pushv/str",
            Opcode::CastVec4Str => "cast/vec4/str",
            Opcode::DupStr => "dup/str",
            Opcode::PopStr => "pop/str",
            Opcode::NewCobj => "new/cobj",
            Opcode::NewDarray => "new/darray",
            Opcode::Null => "null",
            Opcode::LoadObj => "load/obj",
            Opcode::LoadObja => "load/obja",
            Opcode::StoreObj => "store/obj",
            Opcode::StoreObja => "store/obja",
            Opcode::PropV => "prop/v",
            Opcode::PropR => "prop/r",
            Opcode::PropStr => "prop/str",
            Opcode::PropObj => "prop/obj",
            Opcode::StorePropV => "store/prop/v",
            Opcode::StorePropR => "store/prop/r",
            Opcode::StorePropStr => "store/prop/str",
            Opcode::StorePropObj => "store/prop/obj",
            Opcode::PopObj => "pop/obj",
            Opcode::DupObj => "dup/obj",
            Opcode::Scopy => "scopy",
            Opcode::TestNul => "test_nul",
            Opcode::TestNulObj => "test_nul/obj",
            Opcode::SetDarObjVec4 => "set/dar/obj/vec4",
            Opcode::SetDarObjReal => "set/dar/obj/real",
            Opcode::SetDarObjStr => "set/dar/obj/str",
            Opcode::LoadDarVec4 => "load/dar/vec4",
            Opcode::LoadDarR => "load/dar/r",
            Opcode::LoadDarStr => "load/dar/str",
            Opcode::StoreDarVec4 => "store/dar/vec4",
            Opcode::StoreDarR => "store/dar/r",
            Opcode::StoreDarStr => "store/dar/str",
            Opcode::StoreQbVec4 => "store/qb/v",
            Opcode::StoreQfVec4 => "store/qf/v",
            Opcode::StoreQbR => "store/qb/r",
            Opcode::StoreQfR => "store/qf/r",
            Opcode::StoreQbStr => "store/qb/str",
            Opcode::StoreQfStr => "store/qf/str",
            Opcode::QpopBVec4 => "qpop/b/v",
            Opcode::QpopFVec4 => "qpop/f/v",
            Opcode::QpopBR => "qpop/b/r",
            Opcode::QpopFR => "qpop/f/r",
            Opcode::QpopBStr => "qpop/b/str",
            Opcode::QpopFStr => "qpop/f/str",
            Opcode::AssignVec4 => "assign/vec4",
            Opcode::AssignVec4D => "assign/vec4/d",
            Opcode::AssignVec4E => "assign/vec4/e",
            Opcode::AssignVec4OffD => "assign/vec4/off/d",
            Opcode::AssignVec4OffE => "assign/vec4/off/e",
            Opcode::AssignVec4AD => "assign/vec4/a/d",
            Opcode::AssignVec4AE => "assign/vec4/a/e",
            Opcode::AssignWr => "assign/wr",
            Opcode::AssignWrD => "assign/wr/d",
            Opcode::AssignWrE => "assign/wr/e",
            Opcode::AssignArD => "assign/ar/d",
            Opcode::Evctl => "evctl",
            Opcode::EvctlI => "evctl/i",
            Opcode::CassignVec4 => "cassign/vec4",
            Opcode::CassignVec4Off => "cassign/vec4/off",
            Opcode::CassignWr => "cassign/wr",
            Opcode::Deassign => "deassign",
            Opcode::ForceVec4 => "force/vec4",
            Opcode::ForceVec4Off => "force/vec4/off",
            Opcode::ForceWr => "force/wr",
            Opcode::ReleaseNet => "release/net",
            Opcode::ReleaseReg => "release/reg",
            Opcode::Jmp => "jmp",
            Opcode::Jmp0 => "jmp/0",
            Opcode::Jmp1 => "jmp/1",
            Opcode::Jmp0xz => "jmp/0xz",
            Opcode::Jmp1xz => "jmp/1xz",
            Opcode::End => "end",
            Opcode::Fork => "fork",
            Opcode::Join => "join",
            Opcode::JoinDetach => "join/detach",
            Opcode::Delay => "delay",
            Opcode::Delayx => "delayx",
            Opcode::Wait => "wait",
            Opcode::WaitFork => "wait/fork",
            Opcode::Event => "event",
            Opcode::Disable => "disable",
            Opcode::DisableFork => "disable/fork",
            Opcode::Alloc => "alloc",
            Opcode::Free => "free",
            Opcode::VpiCall => "vpi_call",
            Opcode::VpiFunc => "vpi_func",
            Opcode::VpiFuncR => "vpi_func/r",
            Opcode::VpiFuncS => "vpi_func/s",
            Opcode::FileLine => "file_line",
        }
    }

    /// Whether control never falls through to the next instruction.
    #[inline]
    pub fn is_terminator(&self) -> bool {
        matches!(self, Opcode::Jmp | Opcode::End)
    }

    /// Whether the instruction transfers control to a label operand.
    #[inline]
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Opcode::Jmp | Opcode::Jmp0 | Opcode::Jmp1 | Opcode::Jmp0xz | Opcode::Jmp1xz
        )
    }

    /// Whether the thread may be suspended here, invalidating any cached
    /// register contents.
    #[inline]
    pub fn suspends(&self) -> bool {
        matches!(
            self,
            Opcode::Delay
                | Opcode::Delayx
                | Opcode::Wait
                | Opcode::WaitFork
                | Opcode::Fork
                | Opcode::Join
                | Opcode::JoinDetach
        )
    }

    /// Stack movement of this opcode given its operands.
    pub fn effect(&self, args: &[Operand]) -> StackEffect {
        use Domain::{Obj, Real, Str, Vec4};

        let count = |i: usize| args.get(i).and_then(Operand::as_int).unwrap_or(0) as i32;

        match self {
            Opcode::PushiVec4
            | Opcode::LoadVec4
            | Opcode::LoadVec4a
            | Opcode::DupVec4
            | Opcode::SplitVec4
            | Opcode::FlagGetVec4
            | Opcode::PropV
            | Opcode::LoadDarVec4
            | Opcode::QpopBVec4
            | Opcode::QpopFVec4 => StackEffect::on(Vec4, 1),

            Opcode::StoreVec4
            | Opcode::StoreVec4a
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::DivS
            | Opcode::Mod
            | Opcode::ModS
            | Opcode::Pow
            | Opcode::PowS
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Nand
            | Opcode::Nor
            | Opcode::Xnor
            | Opcode::Blend
            | Opcode::CmpiU
            | Opcode::CmpiS
            | Opcode::CmpiE
            | Opcode::FlagSetVec4
            | Opcode::IxVec4
            | Opcode::IxVec4S
            | Opcode::PutcStrVec4
            | Opcode::StorePropV
            | Opcode::SetDarObjVec4
            | Opcode::StoreDarVec4
            | Opcode::StoreQbVec4
            | Opcode::StoreQfVec4
            | Opcode::AssignVec4
            | Opcode::AssignVec4D
            | Opcode::AssignVec4E
            | Opcode::AssignVec4OffD
            | Opcode::AssignVec4OffE
            | Opcode::AssignVec4AD
            | Opcode::AssignVec4AE
            | Opcode::CassignVec4
            | Opcode::CassignVec4Off
            | Opcode::ForceVec4
            | Opcode::ForceVec4Off => StackEffect::on(Vec4, -1),

            Opcode::CmpU
            | Opcode::CmpS
            | Opcode::CmpE
            | Opcode::CmpNe
            | Opcode::CmpX
            | Opcode::CmpZ
            | Opcode::CmpWeq
            | Opcode::CmpWne => StackEffect::on(Vec4, -2),

            Opcode::PopVec4 => StackEffect::on(Vec4, -count(0)),
            Opcode::ConcatVec4 => StackEffect::on(Vec4, 1 - count(0)),

            Opcode::PushiReal
            | Opcode::LoadReal
            | Opcode::LoadAr
            | Opcode::DupReal
            | Opcode::PropR
            | Opcode::LoadDarR
            | Opcode::QpopBR
            | Opcode::QpopFR => StackEffect::on(Real, 1),

            Opcode::StoreReal
            | Opcode::StoreReala
            | Opcode::AddWr
            | Opcode::SubWr
            | Opcode::MulWr
            | Opcode::DivWr
            | Opcode::ModWr
            | Opcode::PowWr
            | Opcode::BlendWr
            | Opcode::StorePropR
            | Opcode::SetDarObjReal
            | Opcode::StoreDarR
            | Opcode::StoreQbR
            | Opcode::StoreQfR
            | Opcode::AssignWr
            | Opcode::AssignWrD
            | Opcode::AssignWrE
            | Opcode::AssignArD
            | Opcode::CassignWr
            | Opcode::ForceWr => StackEffect::on(Real, -1),

            Opcode::CmpWr => StackEffect::on(Real, -2),
            Opcode::PopReal => StackEffect::on(Real, -count(0)),
            Opcode::CvtRv | Opcode::CvtRvS => StackEffect::convert(Vec4, Real),
            Opcode::CvtVr => StackEffect::convert(Real, Vec4),

            Opcode::PushiStr
            | Opcode::LoadStr
            | Opcode::LoadStra
            | Opcode::DupStr
            | Opcode::PropStr
            | Opcode::LoadDarStr
            | Opcode::QpopBStr
            | Opcode::QpopFStr => StackEffect::on(Str, 1),

            Opcode::StoreStr
            | Opcode::StoreStra
            | Opcode::ConcatStr
            | Opcode::StorePropStr
            | Opcode::SetDarObjStr
            | Opcode::StoreDarStr
            | Opcode::StoreQbStr
            | Opcode::StoreQfStr => StackEffect::on(Str, -1),

            Opcode::CmpStr => StackEffect::on(Str, -2),
            Opcode::PopStr => StackEffect::on(Str, -count(0)),
            Opcode::SubstrVec4 | Opcode::CastVec4Str => StackEffect::convert(Str, Vec4),
            Opcode::PushvStr => StackEffect::convert(Vec4, Str),

            Opcode::NewCobj
            | Opcode::NewDarray
            | Opcode::Null
            | Opcode::LoadObj
            | Opcode::LoadObja
            | Opcode::PropObj
            | Opcode::DupObj => StackEffect::on(Obj, 1),

            Opcode::StoreObj
            | Opcode::StoreObja
            | Opcode::StorePropObj
            | Opcode::Scopy
            | Opcode::TestNulObj => StackEffect::on(Obj, -1),

            Opcode::PopObj => StackEffect::on(Obj, -count(0)),

            Opcode::VpiCall | Opcode::VpiFunc | Opcode::VpiFuncR | Opcode::VpiFuncS => {
                let mut effect = match args.last() {
                    Some(Operand::Counts { vec4, real, str }) => {
                        StackEffect([-(*vec4 as i32), -(*real as i32), -(*str as i32), 0])
                    }
                    _ => StackEffect::NONE,
                };
                match self {
                    Opcode::VpiFunc => effect.0[Vec4.slot()] += 1,
                    Opcode::VpiFuncR => effect.0[Real.slot()] += 1,
                    Opcode::VpiFuncS => effect.0[Str.slot()] += 1,
                    _ => {}
                }
                effect
            }

            _ => StackEffect::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonics() {
        assert_eq!(Opcode::PushiVec4.mnemonic(), "pushi/vec4");
        assert_eq!(Opcode::Jmp0xz.mnemonic(), "jmp/0xz");
        assert_eq!(Opcode::ShiftRS.mnemonic(), "shiftr/s");
        assert_eq!(Opcode::VpiFuncR.mnemonic(), "vpi_func/r");
    }

    #[test]
    fn counted_effects() {
        let pop = Opcode::PopVec4.effect(&[Operand::Int(3)]);
        assert_eq!(pop.get(Domain::Vec4), -3);
        let cat = Opcode::ConcatVec4.effect(&[Operand::Int(4)]);
        assert_eq!(cat.get(Domain::Vec4), -3);
    }

    #[test]
    fn conversions_move_between_stacks() {
        let cvt = Opcode::CvtRv.effect(&[]);
        assert_eq!(cvt.get(Domain::Vec4), -1);
        assert_eq!(cvt.get(Domain::Real), 1);
        let sub = Opcode::SubstrVec4.effect(&[]);
        assert_eq!(sub.get(Domain::Str), -1);
        assert_eq!(sub.get(Domain::Vec4), 1);
    }

    #[test]
    fn system_calls_pop_their_arguments() {
        let args = [
            Operand::Int(1),
            Operand::Int(4),
            Operand::Str("$display".into()),
            Operand::Counts {
                vec4: 2,
                real: 1,
                str: 0,
            },
        ];
        let call = Opcode::VpiCall.effect(&args);
        assert_eq!(call.0, [-2, -1, 0, 0]);
        let func = Opcode::VpiFunc.effect(&args);
        assert_eq!(func.0, [-1, -1, 0, 0]);
    }

    #[test]
    fn control_classes() {
        assert!(Opcode::Jmp.is_terminator());
        assert!(!Opcode::Jmp1.is_terminator());
        assert!(Opcode::Jmp1.is_jump());
        assert!(Opcode::Wait.suspends());
        assert!(!Opcode::Add.suspends());
    }
}
