//! Procedural continuous assignment: `assign`/`deassign` and
//! `force`/`release`.

use vvpgen_core::{CodegenError, CodegenResult, Domain, Expr, LValue, Span};

use super::StmtCompiler;
use crate::bytecode::Opcode;
use crate::emit::ops;
use crate::expr::ExprCompiler;

/// The instruction set of one kind of continuous assignment.
struct ContinuousOps {
    whole: Opcode,
    part: Opcode,
    real: Opcode,
    what: &'static str,
}

const CASSIGN: ContinuousOps = ContinuousOps {
    whole: Opcode::CassignVec4,
    part: Opcode::CassignVec4Off,
    real: Opcode::CassignWr,
    what: "assign",
};

const FORCE: ContinuousOps = ContinuousOps {
    whole: Opcode::ForceVec4,
    part: Opcode::ForceVec4Off,
    real: Opcode::ForceWr,
    what: "force",
};

impl<'a, 'd> StmtCompiler<'a, 'd> {
    pub fn compile_cassign(
        &mut self,
        lvals: &[LValue],
        rval: &Expr,
        span: Span,
    ) -> CodegenResult<()> {
        self.continuous(lvals, rval, span, &CASSIGN)
    }

    pub fn compile_force(
        &mut self,
        lvals: &[LValue],
        rval: &Expr,
        span: Span,
    ) -> CodegenResult<()> {
        self.continuous(lvals, rval, span, &FORCE)
    }

    pub fn compile_deassign(&mut self, lvals: &[LValue], span: Span) -> CodegenResult<()> {
        for lval in lvals {
            let base = self.release_base(lval, span, "deassign")?;
            let var = ExprCompiler::var(lval.sig);
            self.em.emit(Opcode::Deassign, ops![var, base, lval.width]);
        }
        Ok(())
    }

    /// Release a forced target. Nets fall back to their drivers, variables
    /// keep the forced value.
    pub fn compile_release(&mut self, lvals: &[LValue], span: Span) -> CodegenResult<()> {
        for lval in lvals {
            let base = self.release_base(lval, span, "release")?;
            let var = ExprCompiler::var(lval.sig);
            let op = if self.design().signal(lval.sig).net.is_net() {
                Opcode::ReleaseNet
            } else {
                Opcode::ReleaseReg
            };
            self.em.emit(op, ops![var, base, lval.width]);
        }
        Ok(())
    }

    /// Evaluate the value once and attach it to every target, last
    /// target first.
    fn continuous(
        &mut self,
        lvals: &[LValue],
        rval: &Expr,
        span: Span,
        set: &ContinuousOps,
    ) -> CodegenResult<()> {
        for lval in lvals {
            if lval.word.is_some() || lval.property.is_some() {
                return Err(CodegenError::invariant(
                    format!(
                        "{} to {} needs a whole variable or a part of one",
                        set.what,
                        self.design().signal(lval.sig).name
                    ),
                    span,
                ));
            }
        }

        if let [lval] = lvals
            && self.lval_domain(lval) == Domain::Real
        {
            self.expr().eval_real(rval)?;
            self.em
                .emit(set.real, ops![ExprCompiler::var(lval.sig)]);
            return Ok(());
        }
        if lvals.iter().any(|lv| self.lval_domain(lv) != Domain::Vec4) {
            return Err(CodegenError::invariant(
                format!("{} needs vector targets", set.what),
                span,
            ));
        }

        let total = lvals.iter().map(|lv| lv.width).sum();
        self.expr().eval_vec4(rval, total)?;
        for (i, lval) in lvals.iter().enumerate().rev() {
            if i > 0 {
                self.em.emit(Opcode::SplitVec4, ops![lval.width]);
            }
            self.em.regs.forget_signal(lval.sig);
            let var = ExprCompiler::var(lval.sig);
            match &lval.part_off {
                Some(off) => {
                    let reg = self.part_offset(off)?;
                    self.em.emit(set.part, ops![var, reg]);
                    self.em.regs.free_word(reg);
                }
                None => self.em.emit(set.whole, ops![var]),
            }
        }
        Ok(())
    }

    /// First bit of a deassign or release target; the offset must be
    /// constant.
    fn release_base(&self, lval: &LValue, span: Span, what: &str) -> CodegenResult<u32> {
        match &lval.part_off {
            None => Ok(0),
            Some(off) => off
                .const_value()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| {
                    CodegenError::invariant(
                        format!("{what} of a part needs a constant offset"),
                        span,
                    )
                }),
        }
    }
}
