//! Structural objects: nexuses and the drivers attached to them.

use crate::{
    Bits4, ConstId, Drive, Edge, IslandId, LogicId, LogicKind, LpmId, LpmKind, NexusId, ScopeId,
    SignalId, Span, SwitchId, SwitchKind,
};

// ============================================================================
// Nexus
// ============================================================================

/// A set of pins connected together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nexus {
    /// Every pin on the nexus, drivers and readers alike, in link order.
    pub ptrs: Vec<NexusPtr>,
    /// Switch-level island this nexus belongs to.
    pub island: Option<IslandId>,
}

impl Nexus {
    /// Pointers that actually drive a value onto the nexus.
    pub fn drivers(&self) -> impl Iterator<Item = &NexusPtr> {
        self.ptrs.iter().filter(|p| p.is_driver())
    }

    /// The signals attached to the nexus.
    pub fn signals(&self) -> impl Iterator<Item = (SignalId, u32)> + '_ {
        self.ptrs.iter().filter_map(|p| match p.target {
            PinTarget::Signal { sig, word } => Some((sig, word)),
            _ => None,
        })
    }
}

/// One pin on a nexus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NexusPtr {
    pub target: PinTarget,
    pub drive0: Drive,
    pub drive1: Drive,
}

impl NexusPtr {
    /// A pin that reads the nexus without driving it.
    pub fn reader(target: PinTarget) -> Self {
        Self {
            target,
            drive0: Drive::HiZ,
            drive1: Drive::HiZ,
        }
    }

    /// A pin that drives the nexus with strong strength.
    pub fn strong(target: PinTarget) -> Self {
        Self {
            target,
            drive0: Drive::Strong,
            drive1: Drive::Strong,
        }
    }

    /// Whether the pin contributes a value.
    #[inline]
    pub fn is_driver(&self) -> bool {
        self.drive0 != Drive::HiZ || self.drive1 != Drive::HiZ
    }

    /// Whether both drive strengths are `Strong`.
    #[inline]
    pub fn is_strong(&self) -> bool {
        self.drive0 == Drive::Strong && self.drive1 == Drive::Strong
    }
}

/// The object a nexus pin belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinTarget {
    Signal { sig: SignalId, word: u32 },
    /// Pin `pin` of a gate. Pin 0 is the output.
    Logic { logic: LogicId, pin: u32 },
    /// The output of a device.
    LpmOut(LpmId),
    /// Input `pin` of a device.
    LpmIn { lpm: LpmId, pin: u32 },
    Const(ConstId),
    Switch { switch: SwitchId, pin: u32 },
}

// ============================================================================
// Delays
// ============================================================================

/// One delay value: a constant or a net carrying the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelayValue {
    Const(u64),
    Net(NexusId),
}

/// Rise, fall and decay delays of a structural object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelaySpec {
    pub rise: DelayValue,
    pub fall: DelayValue,
    pub decay: DelayValue,
}

impl DelaySpec {
    /// The same constant delay for all transitions.
    pub fn uniform(value: u64) -> Self {
        Self {
            rise: DelayValue::Const(value),
            fall: DelayValue::Const(value),
            decay: DelayValue::Const(value),
        }
    }

    /// The three constants, if every delay is constant.
    pub fn constants(&self) -> Option<(u64, u64, u64)> {
        match (self.rise, self.fall, self.decay) {
            (DelayValue::Const(r), DelayValue::Const(f), DelayValue::Const(d)) => Some((r, f, d)),
            _ => None,
        }
    }

    /// Whether every delay is the constant zero.
    pub fn is_zero(&self) -> bool {
        self.constants() == Some((0, 0, 0))
    }
}

/// A specify-block path delay into an output port.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayPath {
    /// Nexus of the input port the path starts at.
    pub source: NexusId,
    /// Optional condition enabling the path.
    pub condition: Option<NexusId>,
    /// Edge sensitivity of the source.
    pub edge: Option<Edge>,
    /// Delays for the twelve transitions `01 10 0z z1 1z z0 0x x1 1x x0 xz zx`.
    pub delays: [u64; 12],
}

// ============================================================================
// Drivers
// ============================================================================

/// A primitive gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Logic {
    pub name: String,
    pub scope: ScopeId,
    pub kind: LogicKind,
    pub width: u32,
    /// Pin 0 is the output, the rest are inputs in order.
    pub pins: Vec<NexusId>,
    pub delay: Option<DelaySpec>,
    pub drive0: Drive,
    pub drive1: Drive,
    pub span: Span,
}

impl Logic {
    /// The output nexus.
    pub fn output(&self) -> Option<NexusId> {
        self.pins.first().copied()
    }

    /// The input nexuses.
    pub fn inputs(&self) -> &[NexusId] {
        self.pins.get(1..).unwrap_or(&[])
    }
}

/// A parameterized device.
#[derive(Debug, Clone, PartialEq)]
pub struct Lpm {
    pub name: String,
    pub scope: ScopeId,
    pub kind: LpmKind,
    pub width: u32,
    pub signed: bool,
    /// The output nexus.
    pub q: NexusId,
    pub inputs: Vec<NexusId>,
    pub delay: Option<DelaySpec>,
    pub span: Span,
}

/// Value of a structural constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bits(Bits4),
    Real(f64),
}

/// A constant driver.
#[derive(Debug, Clone, PartialEq)]
pub struct NetConst {
    pub value: ConstValue,
    pub scope: ScopeId,
    pub delay: Option<DelaySpec>,
    pub nexus: NexusId,
}

impl NetConst {
    pub fn width(&self) -> u32 {
        match &self.value {
            ConstValue::Bits(bits) => bits.width(),
            ConstValue::Real(_) => 1,
        }
    }
}

/// A bidirectional switch between two nexuses.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub name: String,
    pub scope: ScopeId,
    pub kind: SwitchKind,
    pub island: IslandId,
    pub a: NexusId,
    pub b: NexusId,
    pub enable: Option<NexusId>,
    pub width: u32,
    /// Part offset and full width for `TranVp`.
    pub part: Option<(u32, u32)>,
    pub delay: Option<DelaySpec>,
    pub span: Span,
}

/// A switch-level island.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Island {
    pub switches: Vec<SwitchId>,
}
