//! Hierarchy objects: scopes and what they own.

use crate::{
    Bits4, ClassId, DataType, DelayPath, EnumId, EventId, LogicId, LpmId, NetKind, NexusId,
    PortDir, ProcessKind, ScopeFlags, ScopeId, ScopeKind, SignalId, Span, Stmt,
    SwitchId,
};

/// A scope in the instance hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    /// Local name of the instance or block.
    pub name: String,
    /// Type (module definition) name.
    pub type_name: String,
    pub kind: ScopeKind,
    pub flags: ScopeFlags,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub signals: Vec<SignalId>,
    pub logic: Vec<LogicId>,
    pub lpms: Vec<LpmId>,
    pub switches: Vec<SwitchId>,
    pub events: Vec<EventId>,
    pub params: Vec<Param>,
    pub classes: Vec<ClassId>,
    pub enums: Vec<EnumId>,
    /// Ports in declaration order. For a function, port 0 is the return value.
    pub ports: Vec<SignalId>,
    /// Body of a task or function.
    pub body: Option<Stmt>,
    /// Time unit and precision as powers of ten (e.g. -9 for ns).
    pub time_unit: i32,
    pub time_precision: i32,
    pub span: Span,
    /// Where the scope's definition starts.
    pub def_span: Span,
}

impl Scope {
    /// A new scope with no contents.
    pub fn new(name: impl Into<String>, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        let name = name.into();
        Self {
            type_name: name.clone(),
            name,
            kind,
            flags: ScopeFlags::empty(),
            parent,
            children: Vec::new(),
            signals: Vec::new(),
            logic: Vec::new(),
            lpms: Vec::new(),
            switches: Vec::new(),
            events: Vec::new(),
            params: Vec::new(),
            classes: Vec::new(),
            enums: Vec::new(),
            ports: Vec::new(),
            body: None,
            time_unit: 0,
            time_precision: 0,
            span: Span::default(),
            def_span: Span::default(),
        }
    }

    #[inline]
    pub fn is_automatic(&self) -> bool {
        self.flags.contains(ScopeFlags::AUTOMATIC)
    }

    /// The return-value port of a function.
    pub fn return_port(&self) -> Option<SignalId> {
        if self.kind == ScopeKind::Function && !self.flags.contains(ScopeFlags::VOID) {
            self.ports.first().copied()
        } else {
            None
        }
    }
}

/// A net or variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    pub scope: ScopeId,
    pub net: NetKind,
    pub data: DataType,
    pub msb: i64,
    pub lsb: i64,
    pub signed: bool,
    /// Unpacked array address range `(first, last)`.
    pub array: Option<(i64, i64)>,
    pub port: PortDir,
    /// One nexus per word.
    pub nexus: Vec<NexusId>,
    /// Path delays into this output port.
    pub paths: Vec<DelayPath>,
    /// Compiler-generated temporary, hidden from the simulator's name space.
    pub local: bool,
    pub span: Span,
}

impl Signal {
    /// Packed width in bits.
    pub fn width(&self) -> u32 {
        ((self.msb - self.lsb).unsigned_abs() + 1) as u32
    }

    /// Number of words; 1 for a non-array.
    pub fn word_count(&self) -> u32 {
        match self.array {
            Some((first, last)) => ((last - first).unsigned_abs() + 1) as u32,
            None => 1,
        }
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }

    /// Canonical (zero-based) address of array index `index`.
    pub fn canonical_word(&self, index: i64) -> Option<u32> {
        let (first, last) = self.array?;
        let (lo, hi) = if first <= last { (first, last) } else { (last, first) };
        if index < lo || index > hi {
            return None;
        }
        Some(if first <= last { index - first } else { first - index } as u32)
    }
}

/// A parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bits { value: Bits4, signed: bool },
    Real(f64),
    Str(String),
}

/// A parameter or localparam.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: ParamValue,
    pub local: bool,
    pub span: Span,
}

/// A behavioral process.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub kind: ProcessKind,
    pub scope: ScopeId,
    pub body: Stmt,
    pub span: Span,
}

/// An event: named when it has no sources, edge-sensitive otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub name: String,
    pub scope: ScopeId,
    pub any: Vec<NexusId>,
    pub pos: Vec<NexusId>,
    pub neg: Vec<NexusId>,
    /// Sources sensitive to both edges but not to other value changes.
    pub edge: Vec<NexusId>,
    pub span: Span,
}

impl Event {
    /// Whether this is a named event triggered procedurally.
    pub fn is_named(&self) -> bool {
        self.any.is_empty() && self.pos.is_empty() && self.neg.is_empty() && self.edge.is_empty()
    }
}

/// A class type.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassType {
    pub name: String,
    pub properties: Vec<Property>,
}

/// A class property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ty: DataType,
    pub width: u32,
    pub signed: bool,
}

/// An enumeration type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub base_width: u32,
    pub signed: bool,
    pub names: Vec<(String, Bits4)>,
    pub span: Span,
}
