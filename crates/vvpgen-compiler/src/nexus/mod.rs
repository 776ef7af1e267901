//! Nexus driver resolution.
//!
//! Every reader of a nexus refers to it through one operand: a signal label,
//! a functor or device label, an inline constant, a resolver record or an
//! island port. [`GenContext::resolve`] computes that operand on the first
//! request and caches it for the rest of the run.
//!
//! Resolution proceeds as follows:
//!
//! 1. no drivers: a constant of the net's undriven value
//! 2. one driver on a plain net: the driver itself, with pass-through
//!    buffers elided where [`can_elide_bufz`] allows
//! 3. otherwise: a `.resolv` record (a 4-ary tree for more than four
//!    drivers) of the net's resolution kind
//!
//! Nexuses in a switch island are then wrapped in an island port, and the
//! drivers of output ports with path delays are routed through a queued
//! `.modpath` record.

mod drivers;

pub use drivers::{can_elide_bufz, signal_word};

use tracing::trace;
use vvpgen_core::{
    CodegenError, CodegenResult, ConstValue, DataType, Design, IslandId, Logic4, NetKind,
    NexusId, NexusPtr, PinTarget,
};

use crate::bytecode::{Label, Line};
use crate::codec::{PathSource, c4_repeat, modpath_line};
use crate::context::GenContext;

/// Net properties of a nexus that steer its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetInfo {
    pub kind: NetKind,
    pub width: u32,
    pub real: bool,
}

impl NetInfo {
    /// Derive the net kind, width and domain from the pins of a nexus.
    ///
    /// The first net signal decides the kind; a nexus carrying only
    /// variables or device pins resolves like a plain wire.
    pub fn of(design: &Design, nex: NexusId) -> Self {
        let nexus = design.nexus(nex);
        let mut kind = None;
        let mut width = None;
        let mut real = false;
        for (sig, _) in nexus.signals() {
            let signal = design.signal(sig);
            real |= signal.data == DataType::Real;
            width.get_or_insert(signal.width());
            if signal.net.is_net() && kind.is_none() {
                kind = Some(signal.net);
            }
        }
        if width.is_none() {
            if let Some(ptr) = nexus.drivers().next() {
                let (w, r) = driver_width(design, ptr);
                real |= r;
                width = Some(w);
            }
        }
        Self {
            kind: kind.unwrap_or(NetKind::Tri),
            width: width.unwrap_or(1).max(1),
            real,
        }
    }

    /// Whether one driver can be drawn without a resolver.
    fn passes_single_driver(&self) -> bool {
        self.real || matches!(self.kind, NetKind::Tri | NetKind::Reg | NetKind::Uwire)
    }
}

/// Width of the value a driver puts on a nexus, and whether it is real.
fn driver_width(design: &Design, ptr: &NexusPtr) -> (u32, bool) {
    match ptr.target {
        PinTarget::Signal { sig, .. } => {
            let s = design.signal(sig);
            (s.width(), s.data == DataType::Real)
        }
        PinTarget::Logic { logic, .. } => (design.logic(logic).width, false),
        PinTarget::LpmOut(lpm) | PinTarget::LpmIn { lpm, .. } => (design.lpm(lpm).width, false),
        PinTarget::Const(id) => {
            let c = design.constant(id);
            (c.width(), matches!(c.value, ConstValue::Real(_)))
        }
        PinTarget::Switch { switch, .. } => (design.switch(switch).width, false),
    }
}

/// Width of a nexus in bits.
pub fn nexus_width(design: &Design, nex: NexusId) -> u32 {
    NetInfo::of(design, nex).width
}

/// Constant a nexus with no drivers settles to.
fn undriven_literal(ctx: &mut GenContext<'_>, info: &NetInfo) -> String {
    if info.real {
        return ctx.real_literal(0.0);
    }
    let bit = match info.kind {
        NetKind::Tri0 => Logic4::Zero,
        NetKind::Tri1 => Logic4::One,
        _ => Logic4::Z,
    };
    c4_repeat(bit, info.width)
}

impl GenContext<'_> {
    /// The operand that reads the resolved value of `nex`.
    ///
    /// Computed at most once per nexus; later calls return the cached text
    /// without drawing anything.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(&mut self, nex: NexusId) -> CodegenResult<String> {
        if let Some(operand) = self.resolved.get(&nex) {
            return Ok(operand.clone());
        }
        if !self.resolving.insert(nex) {
            return Err(CodegenError::internal(format!(
                "resolution of {nex} depends on itself"
            )));
        }
        trace!(nexus = nex.index(), "resolving nexus");
        let result = self.resolve_uncached(nex);
        self.resolving.remove(&nex);
        let operand = result?;
        self.resolved.insert(nex, operand.clone());
        Ok(operand)
    }

    /// Whether `nex` has been resolved already.
    pub fn is_resolved(&self, nex: NexusId) -> bool {
        self.resolved.contains_key(&nex)
    }

    fn resolve_uncached(&mut self, nex: NexusId) -> CodegenResult<String> {
        let design = self.design;
        let nexus = design.nexus(nex);
        let info = NetInfo::of(design, nex);
        let drivers: Vec<NexusPtr> = nexus.drivers().copied().collect();

        let mut operand = match drivers.as_slice() {
            [] => undriven_literal(self, &info),
            [only] if info.passes_single_driver() => self.draw_driver(only)?,
            [first, ..] if info.real || info.kind == NetKind::Uwire => {
                let span = nexus
                    .signals()
                    .next()
                    .map(|(sig, _)| design.signal(sig).span)
                    .unwrap_or_default();
                let what = if info.real { "real net" } else { "uwire" };
                self.error(
                    span,
                    format!("{what} has {} drivers; only one is allowed", drivers.len()),
                );
                self.draw_driver(first)?
            }
            _ => self.draw_resolver(nex, &info, &drivers)?,
        };

        if let Some(island) = nexus.island {
            operand = self.draw_island_port(nex, island, &operand);
        }

        let delayed = nexus
            .signals()
            .find(|(sig, _)| !design.signal(*sig).paths.is_empty());
        if let Some((sig, _)) = delayed {
            let label = self.modpath_label();
            self.modpaths.push(crate::codec::PendingModpath {
                label: label.clone(),
                signal: sig,
                driver: operand,
            });
            operand = label.to_string();
        }
        Ok(operand)
    }

    /// Combine several drivers with `.resolv` records.
    fn draw_resolver(
        &mut self,
        nex: NexusId,
        info: &NetInfo,
        drivers: &[NexusPtr],
    ) -> CodegenResult<String> {
        let mut inputs = Vec::with_capacity(drivers.len());
        for ptr in drivers {
            inputs.push(self.draw_driver(ptr)?);
        }

        let root = Label::Resolver(nex);
        let pad = c4_repeat(Logic4::Z, info.width);
        let branch_kind = match info.kind {
            NetKind::Tri0 | NetKind::Tri1 => "tri",
            other => other.resolver_name(),
        };

        let mut level = 0u32;
        while inputs.len() > 4 {
            let mut next = Vec::with_capacity(inputs.len().div_ceil(4));
            for (index, group) in inputs.chunks(4).enumerate() {
                let label = root.sub(level).sub(index);
                let body = format!(".resolv {branch_kind}, {}", padded(group, &pad));
                self.decl(label.clone(), body);
                next.push(label.to_string());
            }
            inputs = next;
            level += 1;
        }
        let body = format!(".resolv {}, {}", info.kind.resolver_name(), padded(&inputs, &pad));
        self.decl(root.clone(), body);
        Ok(root.to_string())
    }

    /// Draw the island record once.
    pub(crate) fn ensure_island(&mut self, island: IslandId) {
        if self.islands.insert(island) {
            self.decl(Label::Island(island), ".island tran");
        }
    }

    fn draw_island_port(&mut self, nex: NexusId, island: IslandId, source: &str) -> String {
        self.ensure_island(island);
        let port = Label::Port(nex);
        self.decl(port.clone(), format!(".port {}, {source}", Label::Island(island)));
        port.to_string()
    }

    /// Write every queued module-path record.
    ///
    /// Path sources are resolved here, after all scopes, since a source
    /// may sit anywhere in the hierarchy.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn draw_modpaths(&mut self) -> CodegenResult<Vec<Line>> {
        let design = self.design;
        let pending = std::mem::take(&mut self.modpaths);
        let mut lines = Vec::with_capacity(pending.len());
        for path in pending {
            let signal = design.signal(path.signal);
            let mut sources = Vec::with_capacity(signal.paths.len());
            for dp in &signal.paths {
                let Some((port_sig, word)) = design.nexus(dp.source).signals().next() else {
                    self.warning(signal.span, "module path source has no port signal; skipped");
                    continue;
                };
                let driver = self.resolve(dp.source)?;
                let condition = match dp.condition {
                    Some(cond) => Some(self.resolve(cond)?),
                    None => None,
                };
                sources.push(PathSource {
                    driver,
                    edge: dp.edge,
                    delays: dp.delays,
                    condition,
                    port: Label::Signal(port_sig, word),
                });
            }
            lines.push(modpath_line(
                path.label,
                signal.width(),
                &path.driver,
                &Label::Signal(path.signal, 0),
                &sources,
            ));
        }
        Ok(lines)
    }
}

/// Up to four operands padded to exactly four.
pub(crate) fn padded(group: &[String], pad: &str) -> String {
    let mut items: Vec<&str> = group.iter().map(String::as_str).collect();
    while items.len() < 4 {
        items.push(pad);
    }
    items.join(", ")
}
