//! Assignment targets with their addresses evaluated.
//!
//! A [`Slot`] is an lvalue whose word index and part offset already sit in
//! index registers. A compound assignment resolves each target once, reads
//! the current value through the slot and writes the result back through
//! the same registers, so an index with side effects runs a single time.
//!
//! Stores through a register check flag 4 for an unknown address. When
//! other code runs between resolving and storing, the flag is copied into
//! an owned flag and put back just before the store.

use vvpgen_core::{Bits4, CodegenError, CodegenResult, DataType, Expr, LValue, Logic4, Span};

use super::StmtCompiler;
use crate::bytecode::{Label, Opcode};
use crate::emit::{FixedFlag, Flag, Held, Word, ops};
use crate::expr::{ExprCompiler, array_address, push_bits};

/// Where a target's bits live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Place {
    /// A whole variable, or a part of it at `off`.
    Var { off: Option<Word> },
    /// A word of an unpacked array, or a part of it at `off`.
    ArrayWord { addr: Word, off: Option<Word> },
    /// An element of a dynamic array or queue.
    Element { index: Word },
    /// A character of a string.
    Char { index: Word },
    /// A class property.
    Property { index: u32 },
    /// A constant word outside the array; writes are dropped.
    Outside,
}

/// State of flag 4 for the store through a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unknown {
    /// Left as the address computation set it; the store follows directly.
    Live,
    /// The address was constant; flag 4 is cleared before the store.
    Clear,
    /// Saved in an owned flag.
    Saved(Flag),
}

/// A resolved target.
#[derive(Debug, Clone, Copy)]
pub(super) struct Slot {
    pub(super) place: Place,
    unknown: Unknown,
}

impl Slot {
    /// Whether a store through the slot reads flag 4.
    fn checks_unknown(&self) -> bool {
        matches!(
            self.place,
            Place::Var { off: Some(_) }
                | Place::ArrayWord { .. }
                | Place::Element { .. }
                | Place::Char { .. }
        )
    }
}

impl<'a, 'd> StmtCompiler<'a, 'd> {
    /// Evaluate the word index and part offset of `lval` into registers
    /// tracked by `held`.
    ///
    /// With `keep` set the slot stays valid while other code runs before
    /// the store.
    pub(super) fn resolve(
        &mut self,
        lval: &LValue,
        keep: bool,
        held: &mut Held,
        span: Span,
    ) -> CodegenResult<Slot> {
        let signal = self.design().signal(lval.sig);

        let place = if let Some(index) = lval.property {
            Place::Property { index }
        } else {
            match (&lval.word, &signal.data) {
                (Some(index), DataType::Darray(_) | DataType::Queue(..)) => {
                    let index = held.word(self.expr().eval_index(index)?);
                    Place::Element { index }
                }
                (Some(index), _) => match array_address(&mut self.expr(), lval.sig, index)? {
                    Some(addr) => {
                        let addr = held.word(addr);
                        let off = self.resolve_offset(lval.part_off.as_ref(), held)?;
                        Place::ArrayWord { addr, off }
                    }
                    None => Place::Outside,
                },
                (None, DataType::String) => {
                    let Some(off) = &lval.part_off else {
                        return Err(CodegenError::invariant(
                            format!("vector stored into string {}", signal.name),
                            span,
                        ));
                    };
                    let index = held.word(self.expr().eval_index(off)?);
                    Place::Char { index }
                }
                (None, _) => {
                    let off = self.resolve_offset(lval.part_off.as_ref(), held)?;
                    Place::Var { off }
                }
            }
        };

        let mut slot = Slot {
            place,
            unknown: Unknown::Live,
        };
        if keep && slot.checks_unknown() {
            let constant = [lval.word.as_ref(), lval.part_off.as_ref()]
                .into_iter()
                .flatten()
                .all(|e| e.const_value().is_some());
            slot.unknown = if constant {
                Unknown::Clear
            } else {
                let saved = held.flag(self.em.regs.alloc_flag()?);
                self.em
                    .emit(Opcode::FlagMov, ops![saved, Flag::from(FixedFlag::Eq)]);
                Unknown::Saved(saved)
            };
        }
        Ok(slot)
    }

    fn resolve_offset(
        &mut self,
        off: Option<&Expr>,
        held: &mut Held,
    ) -> CodegenResult<Option<Word>> {
        match off {
            Some(off) => Ok(Some(held.word(self.part_offset(off)?))),
            None => Ok(None),
        }
    }

    /// A register holding a part offset, with flag 4 clear unless the
    /// offset was unknown.
    pub(super) fn part_offset(&mut self, off: &Expr) -> CodegenResult<Word> {
        let reg = self.expr().eval_index(off)?;
        if off.const_value().is_some() {
            let eq = Flag::from(FixedFlag::Eq);
            self.em.emit(Opcode::FlagSetImm, ops![eq, 0u32]);
        }
        Ok(reg)
    }

    /// Push the current value of a resolved vector target.
    pub(super) fn load_slot(&mut self, lval: &LValue, slot: &Slot) {
        let var = ExprCompiler::var(lval.sig);
        match slot.place {
            Place::Var { off: None } => {
                self.em.emit(Opcode::LoadVec4, ops![var]);
            }
            Place::Var { off: Some(off) } => {
                self.em.emit(Opcode::LoadVec4, ops![var]);
                self.em.emit(Opcode::PartU, ops![lval.width, off]);
            }
            Place::ArrayWord { addr, off } => {
                self.em
                    .emit(Opcode::LoadVec4a, ops![Label::Array(lval.sig), addr]);
                if let Some(off) = off {
                    self.em.emit(Opcode::PartU, ops![lval.width, off]);
                }
            }
            Place::Element { index } => {
                self.em.emit(Opcode::LoadDarVec4, ops![var, index]);
            }
            Place::Char { index } => {
                self.em.emit(Opcode::LoadStr, ops![var]);
                self.em.emit(Opcode::SubstrVec4, ops![index, lval.width]);
            }
            Place::Property { index } => {
                self.em.emit(Opcode::LoadObj, ops![var]);
                self.em.emit(Opcode::PropV, ops![index]);
                self.em.emit(Opcode::PopObj, ops![1u32, 0u32]);
                let (width, signed) = self.property_shape(lval).unwrap_or((lval.width, false));
                self.expr().resize(width, lval.width, signed);
            }
            Place::Outside => {
                push_bits(self.em, &Bits4::filled(Logic4::X, lval.width));
            }
        }
    }

    /// Pop the vector on top into a resolved target.
    pub(super) fn store_slot(&mut self, lval: &LValue, slot: &Slot) {
        self.em.regs.forget_signal(lval.sig);
        let var = ExprCompiler::var(lval.sig);

        self.restore_unknown(slot);

        match slot.place {
            Place::Var { off: None } => {
                self.em.emit(Opcode::StoreVec4, ops![var, 0u32, lval.width]);
            }
            Place::Var { off: Some(off) } => {
                self.em.emit(Opcode::StoreVec4, ops![var, off, lval.width]);
            }
            Place::ArrayWord { addr, off } => self.em.emit(
                Opcode::StoreVec4a,
                ops![Label::Array(lval.sig), addr, off.unwrap_or(Word::NONE)],
            ),
            Place::Element { index } => {
                self.em.emit(Opcode::StoreDarVec4, ops![var, index]);
            }
            Place::Char { index } => {
                self.em.emit(Opcode::PutcStrVec4, ops![var, index]);
            }
            Place::Property { index } => {
                self.em.emit(Opcode::LoadObj, ops![var]);
                self.em.emit(Opcode::StorePropV, ops![index, lval.width]);
                self.em.emit(Opcode::PopObj, ops![1u32, 0u32]);
            }
            // Writes outside the array are dropped.
            Place::Outside => self.em.emit(Opcode::PopVec4, ops![1u32]),
        }
    }

    /// Put flag 4 back the way the address computation left it.
    pub(super) fn restore_unknown(&mut self, slot: &Slot) {
        if !slot.checks_unknown() {
            return;
        }
        let eq = Flag::from(FixedFlag::Eq);
        match slot.unknown {
            Unknown::Live => {}
            Unknown::Clear => self.em.emit(Opcode::FlagSetImm, ops![eq, 0u32]),
            Unknown::Saved(saved) => self.em.emit(Opcode::FlagMov, ops![eq, saved]),
        }
    }

    /// Width and signedness of a property target.
    fn property_shape(&self, lval: &LValue) -> Option<(u32, bool)> {
        let design = self.design();
        let index = lval.property?;
        match &design.signal(lval.sig).data {
            DataType::Class(class) => design
                .class(*class)
                .properties
                .get(index as usize)
                .map(|p| (p.width, p.signed)),
            _ => None,
        }
    }
}
