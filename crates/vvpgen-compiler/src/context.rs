//! GenContext - state shared by every stage of one generation run.
//!
//! The context owns the output being assembled (declaration records and
//! thread bodies), the run-wide caches (resolved nexus operands, drawn
//! islands, structural real constants, combined wait events) and the
//! diagnostics sink. Per-thread state such as registers and stack depths
//! lives in the [`CodeEmitter`](crate::emit::CodeEmitter) instead.

use ordered_float::OrderedFloat;
use rustc_hash::{FxHashMap, FxHashSet};
use vvpgen_core::{ConstId, Design, EventId, IslandId, NexusId, Span};

use crate::bytecode::{Label, Line};
use crate::codec::{PendingModpath, cr_literal};
use crate::diagnostics::Diagnostics;
use crate::options::CodegenOptions;

/// Generation state for one design.
pub struct GenContext<'d> {
    pub design: &'d Design,
    pub options: &'d CodegenOptions,
    pub diags: Diagnostics,

    decls: Vec<Line>,
    threads: Vec<Line>,

    /// Operand of every nexus resolved so far. Entries are never replaced.
    pub(crate) resolved: FxHashMap<NexusId, String>,
    /// Nexuses whose resolution is in progress.
    pub(crate) resolving: FxHashSet<NexusId>,
    pub(crate) islands: FxHashSet<IslandId>,
    pub(crate) delayed_consts: FxHashSet<ConstId>,
    pub(crate) modpaths: Vec<PendingModpath>,

    real_consts: FxHashMap<OrderedFloat<f64>, String>,
    wait_events: FxHashMap<Vec<EventId>, Label>,

    next_transient: u32,
    next_thread: u32,
    next_param: u32,
    next_modpath: u32,
}

impl<'d> GenContext<'d> {
    pub fn new(design: &'d Design, options: &'d CodegenOptions) -> Self {
        Self {
            design,
            options,
            diags: Diagnostics::new(),
            decls: Vec::new(),
            threads: Vec::new(),
            resolved: FxHashMap::default(),
            resolving: FxHashSet::default(),
            islands: FxHashSet::default(),
            delayed_consts: FxHashSet::default(),
            modpaths: Vec::new(),
            real_consts: FxHashMap::default(),
            wait_events: FxHashMap::default(),
            next_transient: 0,
            next_thread: 0,
            next_param: 0,
            next_modpath: 0,
        }
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Append a declaration record.
    pub fn decl(&mut self, label: Label, body: impl Into<String>) {
        self.decls.push(Line::decl(label, body));
    }

    /// Append any line to the declaration section.
    pub fn push_decl(&mut self, line: Line) {
        self.decls.push(line);
    }

    pub fn extend_decls(&mut self, lines: impl IntoIterator<Item = Line>) {
        self.decls.extend(lines);
    }

    /// Append a finished thread body.
    pub fn push_thread(&mut self, lines: Vec<Line>) {
        self.threads.extend(lines);
    }

    /// A descriptive comment, written only when draw debugging is on.
    pub fn debug_comment(&mut self, text: impl FnOnce() -> String) {
        if self.options.debug_draw {
            self.decls.push(Line::Comment(text()));
        }
    }

    pub fn decls(&self) -> &[Line] {
        &self.decls
    }

    pub fn threads(&self) -> &[Line] {
        &self.threads
    }

    /// Take the assembled sections, leaving them empty.
    pub(crate) fn take_sections(&mut self) -> (Vec<Line>, Vec<Line>) {
        (
            std::mem::take(&mut self.decls),
            std::mem::take(&mut self.threads),
        )
    }

    // =========================================================================
    // Label counters
    // =========================================================================

    /// A label unique across the whole run.
    pub fn transient_label(&mut self) -> Label {
        let label = Label::Transient(self.next_transient);
        self.next_transient += 1;
        label
    }

    /// Number for a new thread body.
    pub fn next_thread_number(&mut self) -> u32 {
        let n = self.next_thread;
        self.next_thread += 1;
        n
    }

    pub fn param_label(&mut self) -> Label {
        let label = Label::Param(self.next_param);
        self.next_param += 1;
        label
    }

    pub(crate) fn modpath_label(&mut self) -> Label {
        let label = Label::Modpath(self.next_modpath);
        self.next_modpath += 1;
        label
    }

    // =========================================================================
    // Shared records
    // =========================================================================

    /// `Cr<...>` literal of a real value.
    pub fn real_literal(&mut self, value: f64) -> String {
        self.real_consts
            .entry(OrderedFloat(value))
            .or_insert_with(|| cr_literal(value))
            .clone()
    }

    /// The single event a wait on several events blocks on.
    ///
    /// One event waits on itself. Several are combined into an
    /// `E_w<n> .event/or` record, drawn once per distinct list.
    pub fn wait_event(&mut self, events: &[EventId]) -> Option<Label> {
        match events {
            [] => None,
            [one] => Some(Label::Event(*one)),
            _ => {
                if let Some(label) = self.wait_events.get(events) {
                    return Some(label.clone());
                }
                let label = Label::WaitEvent(self.wait_events.len() as u32);
                let inputs = events
                    .iter()
                    .map(|e| Label::Event(*e).to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.decl(label.clone(), format!(".event/or {inputs}"));
                self.wait_events.insert(events.to_vec(), label.clone());
                Some(label)
            }
        }
    }

    /// Record a recoverable error.
    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diags.error(span, message);
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.diags.warning(span, message);
    }
}
