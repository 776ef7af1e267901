//! Delays, event waits, triggers and `disable`.

use vvpgen_core::{CodegenError, CodegenResult, DelayAmount, EventId, ScopeId, Span, Stmt};

use super::StmtCompiler;
use crate::bytecode::{Label, Opcode};
use crate::emit::ops;
use crate::expr::imm;

impl<'a, 'd> StmtCompiler<'a, 'd> {
    /// `#amount stmt`. Amounts are in simulation precision units.
    pub fn compile_delay(
        &mut self,
        amount: &DelayAmount,
        body: Option<&Stmt>,
    ) -> CodegenResult<()> {
        match amount {
            DelayAmount::Const(ticks) => {
                let (lo, hi) = imm(*ticks as i64);
                self.em.emit(Opcode::Delay, ops![lo, hi]);
            }
            DelayAmount::Expr(expr) => {
                let reg = self.expr().eval_index(expr)?;
                self.em.emit(Opcode::Delayx, ops![reg]);
                self.em.regs.free_word(reg);
            }
        }
        self.compile_opt(body)
    }

    /// `@(events) stmt`. Several events are waited on through one
    /// combined event.
    pub fn compile_wait(
        &mut self,
        events: &[EventId],
        body: Option<&Stmt>,
        span: Span,
    ) -> CodegenResult<()> {
        let Some(label) = self.ctx.wait_event(events) else {
            return Err(CodegenError::invariant("wait on an empty event list", span));
        };
        self.em.emit(Opcode::Wait, ops![label]);
        self.compile_opt(body)
    }

    pub fn compile_trigger(&mut self, event: EventId) -> CodegenResult<()> {
        self.em.emit(Opcode::Event, ops![Label::Event(event)]);
        Ok(())
    }

    pub fn compile_disable(&mut self, scope: ScopeId) -> CodegenResult<()> {
        self.em.emit(Opcode::Disable, ops![Label::Scope(scope)]);
        Ok(())
    }
}
