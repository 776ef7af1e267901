//! Per-thread instruction emitter.
//!
//! The [`CodeEmitter`] collects the lines of one thread and keeps a running
//! count of every value stack so unbalanced sequences are caught where they
//! are produced. Depth bookkeeping follows control flow:
//!
//! - after an unconditional `%jmp` or `%end` the position is unreachable
//! - a jump records the depth its target label will be entered with
//! - a label reached only by jumps takes the depth recorded for it
//!
//! # Example
//!
//! ```ignore
//! let mut em = CodeEmitter::new(0, Registers::default());
//! em.emit(Opcode::PushiVec4, ops![5, 0, 8]);
//! em.emit(Opcode::StoreVec4, ops![Label::Signal(x, 0), 0, 8]);
//! assert_eq!(em.depth(Domain::Vec4), 0);
//! ```

mod jumps;
mod registers;

pub use jumps::{BreakError, JumpManager};
pub use registers::{
    FLAG_COUNT, FixedFlag, Flag, Held, RESERVED_FLAGS, RESERVED_WORDS, Registers, WORD_COUNT,
    Word, WordTag,
};

use rustc_hash::FxHashMap;
use vvpgen_core::Domain;

use crate::bytecode::{Instruction, Label, Line, Opcode, Operand};

/// Build an operand list from heterogeneous values.
macro_rules! ops {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::bytecode::Operand::from($arg)),*]
    };
}
pub(crate) use ops;

/// Emits the instructions of one thread.
#[derive(Debug)]
pub struct CodeEmitter {
    thread: u32,
    lines: Vec<Line>,
    next_local: u32,

    /// Values on each stack at the current position.
    depth: [i32; 4],
    reachable: bool,
    /// Depth each jumped-to label is entered with.
    entry_depth: FxHashMap<Label, [i32; 4]>,
    /// Labels entered with a depth different from a jump to them.
    mismatches: u32,

    pub(crate) regs: Registers,
    pub(crate) jumps: JumpManager,
}

impl CodeEmitter {
    pub fn new(thread: u32, regs: Registers) -> Self {
        Self {
            thread,
            lines: Vec::new(),
            next_local: 0,
            depth: [0; 4],
            reachable: true,
            entry_depth: FxHashMap::default(),
            mismatches: 0,
            regs,
            jumps: JumpManager::new(),
        }
    }

    pub fn thread(&self) -> u32 {
        self.thread
    }

    // ==========================================================================
    // Instructions
    // ==========================================================================

    /// Append an instruction.
    pub fn emit(&mut self, op: Opcode, args: Vec<Operand>) {
        let ins = Instruction::new(op, args);
        let effect = ins.effect();
        for (d, delta) in self.depth.iter_mut().zip(effect.0) {
            *d += delta;
        }
        if let Some(target) = ins.target() {
            self.record_entry(target.clone());
        }
        if op.suspends() {
            self.regs.clear_cache();
        }
        if op.is_terminator() {
            self.reachable = false;
        }
        self.lines.push(Line::Instr(ins));
    }

    /// Unconditional jump.
    pub fn jump(&mut self, target: Label) {
        self.emit(Opcode::Jmp, vec![target.into()]);
    }

    /// Conditional jump on a flag.
    pub fn jump_if(&mut self, op: Opcode, target: Label, flag: Flag) {
        debug_assert!(op.is_jump() && op != Opcode::Jmp);
        self.emit(op, vec![target.into(), flag.into()]);
    }

    /// Any non-instruction line, such as a `.scope` switch.
    pub fn push_line(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Comment(text.into()));
    }

    // ==========================================================================
    // Labels
    // ==========================================================================

    /// A fresh label local to this thread.
    pub fn local_label(&mut self) -> Label {
        let label = Label::Local {
            thread: self.thread,
            local: self.next_local,
        };
        self.next_local += 1;
        label
    }

    /// Place a label at the current position.
    pub fn emit_label(&mut self, label: Label) {
        match self.entry_depth.get(&label) {
            Some(entry) if !self.reachable => self.depth = *entry,
            Some(entry) if *entry != self.depth => self.mismatches += 1,
            _ => {}
        }
        self.reachable = true;
        self.regs.clear_cache();
        self.lines.push(Line::Label(label));
    }

    /// Place a merge label that jumps legitimately enter at a different
    /// depth than the fall-through, such as the blend point of a ternary.
    /// The fall-through depth is kept.
    pub fn emit_merge_label(&mut self, label: Label) {
        if !self.reachable {
            if let Some(entry) = self.entry_depth.get(&label) {
                self.depth = *entry;
            }
        }
        self.reachable = true;
        self.regs.clear_cache();
        self.lines.push(Line::Label(label));
    }

    /// Start a fork branch: a label entered with empty stacks.
    pub fn begin_branch(&mut self, label: Label) {
        self.lines.push(Line::Label(label));
        self.depth = [0; 4];
        self.reachable = true;
        self.regs.clear_cache();
    }

    /// Put back the stack depths saved before a fork branch.
    pub fn restore_depth(&mut self, depth: [i32; 4]) {
        self.depth = depth;
    }

    fn record_entry(&mut self, target: Label) {
        let depth = self.depth;
        self.entry_depth.entry(target).or_insert(depth);
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    #[inline]
    pub fn depth(&self, domain: Domain) -> i32 {
        self.depth[domain.slot()]
    }

    #[inline]
    pub fn depths(&self) -> [i32; 4] {
        self.depth
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    /// Labels whose fall-through depth disagreed with a jump to them.
    pub fn depth_mismatches(&self) -> u32 {
        self.mismatches
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Finish and return the thread's lines.
    pub fn finish(self) -> Vec<Line> {
        self.lines
    }
}
