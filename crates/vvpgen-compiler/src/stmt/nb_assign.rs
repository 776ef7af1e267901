//! Non-blocking assignment.
//!
//! The value is computed now and scheduled into the target after a delay
//! or on an event. The target address is computed before scheduling, so a
//! later change of an index does not move the write.

use vvpgen_core::{CodegenError, CodegenResult, DataType, Domain, EventControl, Expr, LValue, Span};

use super::StmtCompiler;
use crate::bytecode::{Label, Opcode};
use crate::emit::{Held, Word, ops};
use crate::expr::{ExprCompiler, array_address};

/// When the scheduled write happens.
#[derive(Clone, Copy)]
enum Schedule<'e> {
    /// After a delay in precision units; `None` is zero.
    Delay(Option<&'e Expr>),
    /// After `count` further occurrences of the event.
    Event(&'e Label, Option<&'e Expr>),
}

/// A [`Schedule`] with its operands evaluated, shared by every target of
/// one statement.
#[derive(Clone, Copy)]
enum Timing<'e> {
    /// After a delay small enough for an immediate operand.
    After(u32),
    /// After the delay held in a register.
    AfterWord(Word),
    /// On an event, after an immediate count of occurrences.
    On(&'e Label, u32),
    /// On an event, after the count held in a register.
    OnWord(&'e Label, Word),
}

impl<'a, 'd> StmtCompiler<'a, 'd> {
    /// Compile `lvals <= #delay rval` or `lvals <= repeat(n) @(ev) rval`.
    pub fn compile_assign_nb(
        &mut self,
        lvals: &[LValue],
        rval: &Expr,
        delay: Option<&Expr>,
        event: Option<&EventControl>,
        span: Span,
    ) -> CodegenResult<()> {
        if let Some(lval) = lvals.iter().find(|lv| !self.schedulable(lv)) {
            let name = &self.design().signal(lval.sig).name;
            self.ctx.warning(
                span,
                format!("non-blocking assignment to {name} is performed immediately"),
            );
            return self.compile_assign(lvals, rval, None, span);
        }

        let event_label = match event {
            Some(ctl) => match self.ctx.wait_event(&ctl.events) {
                Some(label) => Some(label),
                None => {
                    return Err(CodegenError::invariant(
                        "event control without events",
                        span,
                    ));
                }
            },
            None => None,
        };
        let schedule = match (&event_label, event) {
            (Some(label), Some(ctl)) => Schedule::Event(label, ctl.count.as_ref()),
            _ => Schedule::Delay(delay),
        };

        match lvals {
            [] => Err(CodegenError::invariant("assignment without a target", span)),
            [lval] if self.lval_domain(lval) == Domain::Real => {
                self.expr().eval_real(rval)?;
                self.schedule_real(lval, schedule, span)
            }
            [lval] => {
                self.expr().eval_vec4(rval, lval.width)?;
                self.holding(|this, held| {
                    let timing = this.timing(schedule, held)?;
                    this.schedule_vec4(lval, timing)
                })
            }
            _ => {
                self.check_vectors(lvals, span)?;
                let total = lvals.iter().map(|lv| lv.width).sum();
                self.expr().eval_vec4(rval, total)?;
                self.holding(|this, held| {
                    let timing = this.timing(schedule, held)?;
                    for (i, lval) in lvals.iter().enumerate().rev() {
                        if i > 0 {
                            this.em.emit(Opcode::SplitVec4, ops![lval.width]);
                        }
                        this.schedule_vec4(lval, timing)?;
                    }
                    Ok(())
                })
            }
        }
    }

    /// Whether the target can take a scheduled write. Strings, objects,
    /// class properties and dynamic array elements are written at once.
    fn schedulable(&self, lval: &LValue) -> bool {
        let signal = self.design().signal(lval.sig);
        if lval.property.is_some() {
            return false;
        }
        match &signal.data {
            DataType::Logic | DataType::Bool | DataType::Real => true,
            DataType::String | DataType::Class(_) | DataType::Darray(_) | DataType::Queue(..) => {
                false
            }
        }
    }

    /// Evaluate the delay or event count of `schedule` once. Constants stay
    /// immediate; anything else lands in a register tracked by `held`.
    fn timing<'e>(
        &mut self,
        schedule: Schedule<'e>,
        held: &mut Held,
    ) -> CodegenResult<Timing<'e>> {
        Ok(match schedule {
            Schedule::Delay(delay) => match Self::immediate_delay(delay) {
                Some(d) => Timing::After(d),
                None => Timing::AfterWord(held.word(self.delay_word(delay)?)),
            },
            Schedule::Event(label, None) => Timing::On(label, 0),
            Schedule::Event(label, Some(count)) => match count.const_value() {
                Some(n) => Timing::On(label, u32::try_from(n.max(0)).unwrap_or(u32::MAX)),
                None => Timing::OnWord(label, held.word(self.expr().eval_index(count)?)),
            },
        })
    }

    /// Arm the event control for the next `/e` instruction.
    fn event_control(&mut self, label: &Label, count: Option<&Expr>) -> CodegenResult<()> {
        match count {
            Some(count) if count.const_value().is_none() => {
                let reg = self.expr().eval_index(count)?;
                self.em.emit(Opcode::Evctl, ops![label.clone(), reg]);
                self.em.regs.free_word(reg);
            }
            Some(count) => {
                let n = count.const_value().unwrap_or(0).max(0);
                self.em.emit(Opcode::EvctlI, ops![label.clone(), n]);
            }
            None => self.em.emit(Opcode::EvctlI, ops![label.clone(), 0u32]),
        }
        Ok(())
    }

    /// A delay that fits an immediate operand.
    fn immediate_delay(delay: Option<&Expr>) -> Option<u32> {
        match delay {
            None => Some(0),
            Some(e) => e.const_value().and_then(|v| u32::try_from(v).ok()),
        }
    }

    /// An index register holding the delay.
    fn delay_word(&mut self, delay: Option<&Expr>) -> CodegenResult<Word> {
        match delay {
            Some(e) => self.expr().eval_index(e),
            None => self.expr().load_index(0),
        }
    }

    /// Schedule the vector on top into `lval`.
    ///
    /// ```text
    ///     %assign/vec4 v, 5                  ; whole, immediate delay
    ///     %ix/load 5, 5, 0
    ///     %assign/vec4/off/d v, 4, 5         ; part
    ///     %assign/vec4/a/d v, 4, 0, 5        ; array word
    ///     %evctl/i E_0, 0
    ///     %assign/vec4/e v                   ; on an event
    /// ```
    fn schedule_vec4(&mut self, lval: &LValue, timing: Timing<'_>) -> CodegenResult<()> {
        self.em.regs.forget_signal(lval.sig);
        let var = ExprCompiler::var(lval.sig);

        if let Timing::After(d) = timing
            && lval.is_simple()
        {
            self.em.emit(Opcode::AssignVec4, ops![var, d]);
            return Ok(());
        }

        self.holding(|this, held| {
            let delay = match timing {
                Timing::After(d) => Some(held.word(this.expr().load_index(i64::from(d))?)),
                Timing::AfterWord(reg) => Some(reg),
                Timing::On(..) | Timing::OnWord(..) => None,
            };

            let addr = match &lval.word {
                Some(index) => match array_address(&mut this.expr(), lval.sig, index)? {
                    Some(addr) => Some(held.word(addr)),
                    None => {
                        this.em.emit(Opcode::PopVec4, ops![1u32]);
                        return Ok(());
                    }
                },
                None => None,
            };
            let off = match &lval.part_off {
                Some(off) => Some(held.word(this.part_offset(off)?)),
                None => None,
            };
            match timing {
                Timing::On(label, n) => this.em.emit(Opcode::EvctlI, ops![label.clone(), n]),
                Timing::OnWord(label, reg) => {
                    this.em.emit(Opcode::Evctl, ops![label.clone(), reg])
                }
                Timing::After(_) | Timing::AfterWord(_) => {}
            }

            let array = Label::Array(lval.sig);
            let em = &mut *this.em;
            match (addr, off, delay) {
                (Some(addr), off, Some(d)) => em.emit(
                    Opcode::AssignVec4AD,
                    ops![array, addr, off.unwrap_or(Word::NONE), d],
                ),
                (Some(addr), off, None) => em.emit(
                    Opcode::AssignVec4AE,
                    ops![array, addr, off.unwrap_or(Word::NONE)],
                ),
                (None, Some(off), Some(d)) => {
                    em.emit(Opcode::AssignVec4OffD, ops![var.clone(), off, d])
                }
                (None, Some(off), None) => em.emit(Opcode::AssignVec4OffE, ops![var.clone(), off]),
                (None, None, Some(d)) => em.emit(Opcode::AssignVec4D, ops![var.clone(), d]),
                (None, None, None) => em.emit(Opcode::AssignVec4E, ops![var.clone()]),
            }
            Ok(())
        })
    }

    /// Schedule the real on top into `lval`.
    fn schedule_real(
        &mut self,
        lval: &LValue,
        schedule: Schedule<'_>,
        span: Span,
    ) -> CodegenResult<()> {
        let var = ExprCompiler::var(lval.sig);
        match (&lval.word, schedule) {
            (None, Schedule::Delay(delay)) => match Self::immediate_delay(delay) {
                Some(d) => self.em.emit(Opcode::AssignWr, ops![var, d]),
                None => {
                    let reg = self.delay_word(delay)?;
                    self.em.emit(Opcode::AssignWrD, ops![var, reg]);
                    self.em.regs.free_word(reg);
                }
            },
            (None, Schedule::Event(label, count)) => {
                self.event_control(label, count)?;
                self.em.emit(Opcode::AssignWrE, ops![var]);
            }
            (Some(index), Schedule::Delay(delay)) => {
                let reg = self.delay_word(delay)?;
                match array_address(&mut self.expr(), lval.sig, index)? {
                    Some(addr) => {
                        self.em
                            .emit(Opcode::AssignArD, ops![Label::Array(lval.sig), addr, reg]);
                        self.em.regs.free_word(addr);
                    }
                    None => self.em.emit(Opcode::PopReal, ops![1u32]),
                }
                self.em.regs.free_word(reg);
            }
            (Some(_), Schedule::Event(..)) => {
                self.em.emit(Opcode::PopReal, ops![1u32]);
                self.ctx.error(
                    span,
                    "event-controlled assignment to a real array word is not supported",
                );
            }
        }
        Ok(())
    }
}
