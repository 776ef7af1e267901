//! The elaborated design graph and its builder.
//!
//! [`Design`] is the read-only query interface the code generator consumes.
//! It owns dense arenas of every object kind; ids index into them. A
//! [`DesignBuilder`] constructs a design and keeps the back references
//! (scope contents, nexus pins) consistent.

use crate::{
    Bits4, ClassId, ClassType, ConstId, ConstValue, DataType, DelaySpec, Drive, EnumId, EnumType,
    Event, EventId, FileId, Island, IslandId, Logic, LogicId, LogicKind, Lpm, LpmId, LpmKind,
    NetConst, NetKind, Nexus, NexusId, NexusPtr, Param, PinTarget, Process, ProcessId,
    ProcessKind, Scope, ScopeId, ScopeKind, Signal, SignalId, Span, Stmt, Switch, SwitchId,
    SwitchKind,
};

/// An elaborated design.
#[derive(Debug, Clone, Default)]
pub struct Design {
    files: Vec<String>,
    scopes: Vec<Scope>,
    roots: Vec<ScopeId>,
    signals: Vec<Signal>,
    nexuses: Vec<Nexus>,
    logic: Vec<Logic>,
    lpms: Vec<Lpm>,
    consts: Vec<NetConst>,
    switches: Vec<Switch>,
    islands: Vec<Island>,
    events: Vec<Event>,
    processes: Vec<Process>,
    classes: Vec<ClassType>,
    enums: Vec<EnumType>,
    time_precision: i32,
}

impl Design {
    /// Source file names, indexed by [`FileId`].
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Name of a source file, or `"<unknown>"`.
    pub fn file_name(&self, id: FileId) -> &str {
        self.files
            .get(id.as_usize())
            .map(String::as_str)
            .unwrap_or("<unknown>")
    }

    /// Top-level scopes in declaration order.
    pub fn roots(&self) -> &[ScopeId] {
        &self.roots
    }

    /// Simulation precision as a power of ten.
    pub fn time_precision(&self) -> i32 {
        self.time_precision
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.as_usize()]
    }

    pub fn signal(&self, id: SignalId) -> &Signal {
        &self.signals[id.as_usize()]
    }

    pub fn nexus(&self, id: NexusId) -> &Nexus {
        &self.nexuses[id.as_usize()]
    }

    pub fn logic(&self, id: LogicId) -> &Logic {
        &self.logic[id.as_usize()]
    }

    pub fn lpm(&self, id: LpmId) -> &Lpm {
        &self.lpms[id.as_usize()]
    }

    pub fn constant(&self, id: ConstId) -> &NetConst {
        &self.consts[id.as_usize()]
    }

    pub fn switch(&self, id: SwitchId) -> &Switch {
        &self.switches[id.as_usize()]
    }

    pub fn island(&self, id: IslandId) -> &Island {
        &self.islands[id.as_usize()]
    }

    pub fn event(&self, id: EventId) -> &Event {
        &self.events[id.as_usize()]
    }

    pub fn process(&self, id: ProcessId) -> &Process {
        &self.processes[id.as_usize()]
    }

    pub fn class(&self, id: ClassId) -> &ClassType {
        &self.classes[id.as_usize()]
    }

    pub fn enumeration(&self, id: EnumId) -> &EnumType {
        &self.enums[id.as_usize()]
    }

    /// Every process id, in creation order.
    pub fn processes(&self) -> impl Iterator<Item = ProcessId> + '_ {
        (0..self.processes.len() as u32).map(ProcessId::new)
    }

    /// Every island id.
    pub fn islands(&self) -> impl Iterator<Item = IslandId> + '_ {
        (0..self.islands.len() as u32).map(IslandId::new)
    }

    pub fn nexus_count(&self) -> usize {
        self.nexuses.len()
    }

    /// Dotted hierarchical name of a scope.
    pub fn scope_path(&self, id: ScopeId) -> String {
        let scope = self.scope(id);
        match scope.parent {
            Some(parent) => format!("{}.{}", self.scope_path(parent), scope.name),
            None => scope.name.clone(),
        }
    }
}

/// Builds a [`Design`], wiring every object into its scope and nexuses.
///
/// # Example
///
/// ```
/// use vvpgen_core::{DataType, DesignBuilder, NetKind, ScopeKind};
///
/// let mut b = DesignBuilder::new();
/// let top = b.add_scope("top", ScopeKind::Module, None);
/// let x = b.add_signal(top, "x", NetKind::Reg, DataType::Logic, 8);
/// let design = b.finish();
/// assert_eq!(design.signal(x).width(), 8);
/// ```
#[derive(Debug, Default)]
pub struct DesignBuilder {
    design: Design,
}

impl DesignBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish building.
    pub fn finish(self) -> Design {
        self.design
    }

    /// Read access to the design under construction.
    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn set_time_precision(&mut self, precision: i32) {
        self.design.time_precision = precision;
    }

    /// Register a source file name.
    pub fn add_file(&mut self, name: impl Into<String>) -> FileId {
        self.design.files.push(name.into());
        FileId::new(self.design.files.len() as u32 - 1)
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Add a scope under `parent`, or as a root.
    pub fn add_scope(
        &mut self,
        name: impl Into<String>,
        kind: ScopeKind,
        parent: Option<ScopeId>,
    ) -> ScopeId {
        let id = ScopeId::new(self.design.scopes.len() as u32);
        let mut scope = Scope::new(name, kind, parent);
        if let Some(parent) = parent {
            let p = &self.design.scopes[parent.as_usize()];
            scope.time_unit = p.time_unit;
            scope.time_precision = p.time_precision;
            self.design.scopes[parent.as_usize()].children.push(id);
        } else {
            self.design.roots.push(id);
        }
        self.design.scopes.push(scope);
        id
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.design.scopes[id.as_usize()]
    }

    /// Set the body of a task or function scope.
    pub fn set_body(&mut self, scope: ScopeId, body: Stmt) {
        self.scope_mut(scope).body = Some(body);
    }

    pub fn add_param(&mut self, scope: ScopeId, param: Param) {
        self.scope_mut(scope).params.push(param);
    }

    pub fn add_class(&mut self, scope: ScopeId, class: ClassType) -> ClassId {
        let id = ClassId::new(self.design.classes.len() as u32);
        self.design.classes.push(class);
        self.scope_mut(scope).classes.push(id);
        id
    }

    pub fn add_enum(&mut self, scope: ScopeId, ty: EnumType) -> EnumId {
        let id = EnumId::new(self.design.enums.len() as u32);
        self.design.enums.push(ty);
        self.scope_mut(scope).enums.push(id);
        id
    }

    pub fn add_process(&mut self, kind: ProcessKind, scope: ScopeId, body: Stmt) -> ProcessId {
        let id = ProcessId::new(self.design.processes.len() as u32);
        let span = body.span;
        self.design.processes.push(Process {
            kind,
            scope,
            body,
            span,
        });
        id
    }

    // ========================================================================
    // Nets
    // ========================================================================

    /// Create an empty nexus.
    pub fn add_nexus(&mut self) -> NexusId {
        self.design.nexuses.push(Nexus::default());
        NexusId::new(self.design.nexuses.len() as u32 - 1)
    }

    /// Attach a pin to a nexus.
    pub fn connect(&mut self, nexus: NexusId, ptr: NexusPtr) {
        self.design.nexuses[nexus.as_usize()].ptrs.push(ptr);
    }

    /// Add a `width`-bit signal with range `[width-1:0]` and its own nexus.
    ///
    /// Variables drive their nexus; nets only read it.
    pub fn add_signal(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        net: NetKind,
        data: DataType,
        width: u32,
    ) -> SignalId {
        self.add_signal_words(scope, name, net, data, width, None)
    }

    /// Add an unpacked array of `width`-bit words addressed `first..=last`.
    pub fn add_array(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        data: DataType,
        width: u32,
        first: i64,
        last: i64,
    ) -> SignalId {
        self.add_signal_words(scope, name, NetKind::Reg, data, width, Some((first, last)))
    }

    fn add_signal_words(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        net: NetKind,
        data: DataType,
        width: u32,
        array: Option<(i64, i64)>,
    ) -> SignalId {
        let id = SignalId::new(self.design.signals.len() as u32);
        let mut signal = Signal {
            name: name.into(),
            scope,
            net,
            data,
            msb: i64::from(width.max(1)) - 1,
            lsb: 0,
            signed: false,
            array,
            port: Default::default(),
            nexus: Vec::new(),
            paths: Vec::new(),
            local: false,
            span: Span::default(),
        };
        for word in 0..signal.word_count() {
            let nex = self.add_nexus();
            let target = PinTarget::Signal { sig: id, word };
            let ptr = if net.is_net() {
                NexusPtr::reader(target)
            } else {
                NexusPtr::strong(target)
            };
            self.connect(nex, ptr);
            signal.nexus.push(nex);
        }
        self.design.signals.push(signal);
        self.scope_mut(scope).signals.push(id);
        id
    }

    pub fn signal_mut(&mut self, id: SignalId) -> &mut Signal {
        &mut self.design.signals[id.as_usize()]
    }

    /// Join a net signal onto an existing nexus instead of its own.
    pub fn alias_signal(&mut self, id: SignalId, nexus: NexusId) {
        let net = self.design.signals[id.as_usize()].net;
        let target = PinTarget::Signal { sig: id, word: 0 };
        let ptr = if net.is_net() {
            NexusPtr::reader(target)
        } else {
            NexusPtr::strong(target)
        };
        if let Some(old) = self.design.signals[id.as_usize()].nexus.first().copied() {
            self.design.nexuses[old.as_usize()]
                .ptrs
                .retain(|p| p.target != target);
        }
        self.connect(nexus, ptr);
        self.design.signals[id.as_usize()].nexus = vec![nexus];
    }

    // ========================================================================
    // Drivers
    // ========================================================================

    /// Add a gate whose output drives `output` and whose inputs read `inputs`.
    pub fn add_logic(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        kind: LogicKind,
        width: u32,
        output: NexusId,
        inputs: &[NexusId],
    ) -> LogicId {
        self.add_logic_with(
            scope,
            name,
            kind,
            width,
            output,
            inputs,
            Drive::Strong,
            Drive::Strong,
            None,
        )
    }

    /// Add a gate with explicit output strengths and delay.
    #[allow(clippy::too_many_arguments)]
    pub fn add_logic_with(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        kind: LogicKind,
        width: u32,
        output: NexusId,
        inputs: &[NexusId],
        drive0: Drive,
        drive1: Drive,
        delay: Option<DelaySpec>,
    ) -> LogicId {
        let id = LogicId::new(self.design.logic.len() as u32);
        let mut pins = Vec::with_capacity(inputs.len() + 1);
        pins.push(output);
        pins.extend_from_slice(inputs);
        self.connect(
            output,
            NexusPtr {
                target: PinTarget::Logic { logic: id, pin: 0 },
                drive0,
                drive1,
            },
        );
        for (i, input) in inputs.iter().enumerate() {
            self.connect(
                *input,
                NexusPtr::reader(PinTarget::Logic {
                    logic: id,
                    pin: i as u32 + 1,
                }),
            );
        }
        self.design.logic.push(Logic {
            name: name.into(),
            scope,
            kind,
            width,
            pins,
            delay,
            drive0,
            drive1,
            span: Span::default(),
        });
        self.scope_mut(scope).logic.push(id);
        id
    }

    pub fn logic_mut(&mut self, id: LogicId) -> &mut Logic {
        &mut self.design.logic[id.as_usize()]
    }

    /// Add a device driving `q` from `inputs`.
    pub fn add_lpm(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        kind: LpmKind,
        width: u32,
        q: NexusId,
        inputs: &[NexusId],
    ) -> LpmId {
        let id = LpmId::new(self.design.lpms.len() as u32);
        self.connect(q, NexusPtr::strong(PinTarget::LpmOut(id)));
        for (i, input) in inputs.iter().enumerate() {
            self.connect(
                *input,
                NexusPtr::reader(PinTarget::LpmIn {
                    lpm: id,
                    pin: i as u32,
                }),
            );
        }
        self.design.lpms.push(Lpm {
            name: name.into(),
            scope,
            kind,
            width,
            signed: false,
            q,
            inputs: inputs.to_vec(),
            delay: None,
            span: Span::default(),
        });
        self.scope_mut(scope).lpms.push(id);
        id
    }

    pub fn lpm_mut(&mut self, id: LpmId) -> &mut Lpm {
        &mut self.design.lpms[id.as_usize()]
    }

    /// Add a strong constant driver of `bits` onto `nexus`.
    pub fn add_const(&mut self, scope: ScopeId, nexus: NexusId, bits: Bits4) -> ConstId {
        self.add_const_with(
            scope,
            nexus,
            ConstValue::Bits(bits),
            Drive::Strong,
            Drive::Strong,
            None,
        )
    }

    /// Add a constant driver with explicit strengths and delay.
    pub fn add_const_with(
        &mut self,
        scope: ScopeId,
        nexus: NexusId,
        value: ConstValue,
        drive0: Drive,
        drive1: Drive,
        delay: Option<DelaySpec>,
    ) -> ConstId {
        let id = ConstId::new(self.design.consts.len() as u32);
        self.connect(
            nexus,
            NexusPtr {
                target: PinTarget::Const(id),
                drive0,
                drive1,
            },
        );
        self.design.consts.push(NetConst {
            value,
            scope,
            delay,
            nexus,
        });
        id
    }

    /// Create an empty switch island.
    pub fn add_island(&mut self) -> IslandId {
        self.design.islands.push(Island::default());
        IslandId::new(self.design.islands.len() as u32 - 1)
    }

    /// Add a switch between `a` and `b` in `island`, marking both nexuses
    /// (and the enable, if any, as a reader) accordingly.
    #[allow(clippy::too_many_arguments)]
    pub fn add_switch(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        kind: SwitchKind,
        island: IslandId,
        a: NexusId,
        b: NexusId,
        enable: Option<NexusId>,
        width: u32,
    ) -> SwitchId {
        let id = SwitchId::new(self.design.switches.len() as u32);
        for (pin, nex) in [(0, a), (1, b)] {
            self.connect(nex, NexusPtr::reader(PinTarget::Switch { switch: id, pin }));
            self.design.nexuses[nex.as_usize()].island = Some(island);
        }
        if let Some(en) = enable {
            self.connect(en, NexusPtr::reader(PinTarget::Switch { switch: id, pin: 2 }));
        }
        self.design.switches.push(Switch {
            name: name.into(),
            scope,
            kind,
            island,
            a,
            b,
            enable,
            width,
            part: None,
            delay: None,
            span: Span::default(),
        });
        self.design.islands[island.as_usize()].switches.push(id);
        self.scope_mut(scope).switches.push(id);
        id
    }

    /// Add an event to a scope.
    pub fn add_event(&mut self, event: Event) -> EventId {
        let id = EventId::new(self.design.events.len() as u32);
        let scope = event.scope;
        self.design.events.push(event);
        self.scope_mut(scope).events.push(id);
        id
    }

    /// Add a named event with no sources.
    pub fn add_named_event(&mut self, scope: ScopeId, name: impl Into<String>) -> EventId {
        self.add_event(Event {
            name: name.into(),
            scope,
            ..Event::default()
        })
    }
}
