//! Blocking assignment.
//!
//! The right-hand side is evaluated in the domain of the target, then
//! stored immediately. Targets split on their shape:
//!
//! | target                     | store                          |
//! |----------------------------|--------------------------------|
//! | whole vector               | `%store/vec4 v, 0, w`          |
//! | vector part                | `%store/vec4 v, off, w`        |
//! | word of an unpacked array  | `%store/vec4a v, addr, off`    |
//! | element of a dynamic array | `%store/dar/vec4 v, idx`       |
//! | character of a string      | `%putc/str/vec4 v, idx`        |
//! | class property             | `%store/prop/v idx, w`         |
//!
//! Real, string and object targets use the matching `/real`, `/str` and
//! `/obj` forms.
//!
//! A compound assignment (`a[i] += b`) resolves each target once, reads its
//! current value through the resolved registers, applies the operator and
//! writes back through the same registers:
//!
//! ```text
//!     %ix/vec4/s 4              ; word index, evaluated once
//!     %flag_mov 8, 4
//!     %load/vec4a v0, 4
//!     %addi 1, 0, 8
//!     %flag_mov 4, 8
//!     %store/vec4a v0, 4, 0
//! ```

use vvpgen_core::{
    AssignOp, BinaryOp, CodegenError, CodegenResult, DataType, Domain, Expr, LValue, Span,
};

use super::StmtCompiler;
use super::lval::{Place, Slot};
use crate::bytecode::{Label, Opcode};
use crate::emit::ops;
use crate::expr::{ExprCompiler, apply_vec4, array_address, element_domain, push_real};

impl<'a, 'd> StmtCompiler<'a, 'd> {
    /// Compile `lvals = rval`, or `lvals op= rval` when `op` is given.
    ///
    /// Several targets form a concatenation, most significant first.
    pub fn compile_assign(
        &mut self,
        lvals: &[LValue],
        rval: &Expr,
        op: Option<AssignOp>,
        span: Span,
    ) -> CodegenResult<()> {
        if let Some(op) = op {
            return self.compile_compound(lvals, rval, op, span);
        }

        match lvals {
            [] => Err(CodegenError::invariant("assignment without a target", span)),
            [lval] => self.assign_one(lval, rval, span),
            _ => self.assign_concat(lvals, rval, span),
        }
    }

    fn assign_one(&mut self, lval: &LValue, rval: &Expr, span: Span) -> CodegenResult<()> {
        match self.lval_domain(lval) {
            Domain::Vec4 => {
                self.expr().eval_vec4(rval, lval.width)?;
                self.store_vec4(lval, span)
            }
            Domain::Real => {
                self.expr().eval_real(rval)?;
                self.store_real(lval, span)
            }
            Domain::Str => {
                self.expr().eval_str(rval)?;
                self.store_str(lval, span)
            }
            Domain::Obj => self.assign_obj(lval, rval, span),
        }
    }

    /// `{a, b, c} = rval`: the value is split from the least significant
    /// end, so the last target is stored first.
    fn assign_concat(&mut self, lvals: &[LValue], rval: &Expr, span: Span) -> CodegenResult<()> {
        self.check_vectors(lvals, span)?;
        let total = lvals.iter().map(|lv| lv.width).sum();
        self.expr().eval_vec4(rval, total)?;
        for (i, lval) in lvals.iter().enumerate().rev() {
            if i > 0 {
                self.em.emit(Opcode::SplitVec4, ops![lval.width]);
            }
            self.store_vec4(lval, span)?;
        }
        Ok(())
    }

    pub(super) fn check_vectors(&self, lvals: &[LValue], span: Span) -> CodegenResult<()> {
        if lvals.iter().any(|lv| self.lval_domain(lv) != Domain::Vec4) {
            return Err(CodegenError::invariant(
                "concatenated assignment targets must all be vectors",
                span,
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Compound assignment
    // =========================================================================

    /// `lvals op= rval`. The current value of a concatenation is built from
    /// every target, most significant first, and the result split back the
    /// way [`assign_concat`](Self::assign_concat) does.
    fn compile_compound(
        &mut self,
        lvals: &[LValue],
        rval: &Expr,
        op: AssignOp,
        span: Span,
    ) -> CodegenResult<()> {
        let signed = match lvals {
            [] => return Err(CodegenError::invariant("assignment without a target", span)),
            [lval] if self.lval_domain(lval) == Domain::Real => {
                return self.compound_real(lval, rval, op, span);
            }
            [lval] if self.lval_domain(lval) != Domain::Vec4 => {
                return Err(CodegenError::invariant(
                    format!(
                        "compound assignment to {}, which is not numeric",
                        self.design().signal(lval.sig).name
                    ),
                    span,
                ));
            }
            [lval] => lval.property.is_none() && self.design().signal(lval.sig).signed,
            _ => {
                self.check_vectors(lvals, span)?;
                false
            }
        };
        let total = lvals.iter().map(|lv| lv.width).sum();

        self.holding(|this, held| {
            let mut slots: Vec<Slot> = Vec::with_capacity(lvals.len());
            for (i, lval) in lvals.iter().enumerate() {
                let slot = this.resolve(lval, true, held, span)?;
                this.load_slot(lval, &slot);
                if i > 0 {
                    this.em.emit(Opcode::ConcatVec4, ops![2u32]);
                }
                slots.push(slot);
            }

            apply_vec4(&mut this.expr(), compound_op(op), rval, total, signed)?;

            for (i, (lval, slot)) in lvals.iter().zip(&slots).enumerate().rev() {
                if i > 0 {
                    this.em.emit(Opcode::SplitVec4, ops![lval.width]);
                }
                this.store_slot(lval, slot);
            }
            Ok(())
        })
    }

    /// `r op= rval` on a real target.
    fn compound_real(
        &mut self,
        lval: &LValue,
        rval: &Expr,
        op: AssignOp,
        span: Span,
    ) -> CodegenResult<()> {
        let opcode = match op {
            AssignOp::Add => Opcode::AddWr,
            AssignOp::Sub => Opcode::SubWr,
            AssignOp::Mul => Opcode::MulWr,
            AssignOp::Div => Opcode::DivWr,
            AssignOp::Mod => Opcode::ModWr,
            _ => {
                self.ctx
                    .error(span, format!("operator {op:?} on a real target"));
                return Ok(());
            }
        };
        if lval.part_off.is_some() {
            let name = &self.design().signal(lval.sig).name;
            return Err(CodegenError::invariant(
                format!("part select of real variable {name}"),
                span,
            ));
        }

        self.holding(|this, held| {
            let slot = this.resolve(lval, true, held, span)?;
            this.load_slot_real(lval, &slot);
            this.expr().eval_real(rval)?;
            this.em.emit(opcode, vec![]);
            this.store_slot_real(lval, &slot);
            Ok(())
        })
    }

    fn load_slot_real(&mut self, lval: &LValue, slot: &Slot) {
        let var = ExprCompiler::var(lval.sig);
        match slot.place {
            Place::Var { .. } | Place::Char { .. } => {
                self.em.emit(Opcode::LoadReal, ops![var]);
            }
            Place::ArrayWord { addr, .. } => {
                self.em.emit(Opcode::LoadAr, ops![Label::Array(lval.sig), addr]);
            }
            Place::Element { index } => self.em.emit(Opcode::LoadDarR, ops![var, index]),
            Place::Property { index } => {
                self.em.emit(Opcode::LoadObj, ops![var]);
                self.em.emit(Opcode::PropR, ops![index]);
                self.em.emit(Opcode::PopObj, ops![1u32, 0u32]);
            }
            Place::Outside => push_real(self.em, 0.0),
        }
    }

    fn store_slot_real(&mut self, lval: &LValue, slot: &Slot) {
        let var = ExprCompiler::var(lval.sig);
        self.restore_unknown(slot);
        match slot.place {
            Place::Var { .. } | Place::Char { .. } => {
                self.em.emit(Opcode::StoreReal, ops![var]);
            }
            Place::ArrayWord { addr, .. } => {
                self.em
                    .emit(Opcode::StoreReala, ops![Label::Array(lval.sig), addr]);
            }
            Place::Element { index } => self.em.emit(Opcode::StoreDarR, ops![var, index]),
            Place::Property { index } => {
                self.em.emit(Opcode::LoadObj, ops![var]);
                self.em.emit(Opcode::StorePropR, ops![index]);
                self.em.emit(Opcode::PopObj, ops![1u32, 0u32]);
            }
            Place::Outside => self.em.emit(Opcode::PopReal, ops![1u32]),
        }
    }

    // =========================================================================
    // Target classification
    // =========================================================================

    /// The domain a value stored into `lval` is evaluated in.
    pub(super) fn lval_domain(&self, lval: &LValue) -> Domain {
        let signal = self.design().signal(lval.sig);
        if let Some(index) = lval.property {
            return self
                .property_type(lval.sig, index)
                .map_or(Domain::Vec4, DataType::domain);
        }
        match (&signal.data, &lval.word, &lval.part_off) {
            (DataType::String, None, Some(_)) => Domain::Vec4,
            (data, Some(_), _) => element_domain(data),
            (data, None, _) => data.domain(),
        }
    }

    fn property_type(&self, sig: vvpgen_core::SignalId, index: u32) -> Option<&'d DataType> {
        let design = self.design();
        match &design.signal(sig).data {
            DataType::Class(class) => design
                .class(*class)
                .properties
                .get(index as usize)
                .map(|p| &p.ty),
            _ => None,
        }
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// Pop the vector on top into `lval`.
    ///
    /// For a string target the part offset is a character index.
    pub(super) fn store_vec4(&mut self, lval: &LValue, span: Span) -> CodegenResult<()> {
        self.holding(|this, held| {
            let slot = this.resolve(lval, false, held, span)?;
            this.store_slot(lval, &slot);
            Ok(())
        })
    }

    fn store_real(&mut self, lval: &LValue, span: Span) -> CodegenResult<()> {
        let var = ExprCompiler::var(lval.sig);
        let signal = self.design().signal(lval.sig);

        if let Some(index) = lval.property {
            self.em.emit(Opcode::LoadObj, ops![var]);
            self.em.emit(Opcode::StorePropR, ops![index]);
            self.em.emit(Opcode::PopObj, ops![1u32, 0u32]);
            return Ok(());
        }
        if lval.part_off.is_some() {
            return Err(CodegenError::invariant(
                format!("part select of real variable {}", signal.name),
                span,
            ));
        }

        match (&lval.word, &signal.data) {
            (Some(index), DataType::Darray(_) | DataType::Queue(..)) => {
                let reg = self.expr().eval_index(index)?;
                self.em.emit(Opcode::StoreDarR, ops![var, reg]);
                self.em.regs.free_word(reg);
            }
            (Some(index), _) => match array_address(&mut self.expr(), lval.sig, index)? {
                Some(addr) => {
                    self.em
                        .emit(Opcode::StoreReala, ops![Label::Array(lval.sig), addr]);
                    self.em.regs.free_word(addr);
                }
                None => self.em.emit(Opcode::PopReal, ops![1u32]),
            },
            (None, _) => self.em.emit(Opcode::StoreReal, ops![var]),
        }
        Ok(())
    }

    fn store_str(&mut self, lval: &LValue, span: Span) -> CodegenResult<()> {
        let var = ExprCompiler::var(lval.sig);
        let signal = self.design().signal(lval.sig);

        if let Some(index) = lval.property {
            self.em.emit(Opcode::LoadObj, ops![var]);
            self.em.emit(Opcode::StorePropStr, ops![index]);
            self.em.emit(Opcode::PopObj, ops![1u32, 0u32]);
            return Ok(());
        }
        if lval.part_off.is_some() {
            return Err(CodegenError::invariant(
                format!("string stored into a part of {}", signal.name),
                span,
            ));
        }

        match (&lval.word, &signal.data) {
            (Some(index), DataType::Darray(_) | DataType::Queue(..)) => {
                let reg = self.expr().eval_index(index)?;
                self.em.emit(Opcode::StoreDarStr, ops![var, reg]);
                self.em.regs.free_word(reg);
            }
            (Some(index), _) => match array_address(&mut self.expr(), lval.sig, index)? {
                Some(addr) => {
                    self.em
                        .emit(Opcode::StoreStra, ops![Label::Array(lval.sig), addr]);
                    self.em.regs.free_word(addr);
                }
                None => self.em.emit(Opcode::PopStr, ops![1u32]),
            },
            (None, _) => self.em.emit(Opcode::StoreStr, ops![var]),
        }
        Ok(())
    }

    /// Object assignment. A property target needs its object below the
    /// value, so it is loaded before the right-hand side.
    fn assign_obj(&mut self, lval: &LValue, rval: &Expr, span: Span) -> CodegenResult<()> {
        let var = ExprCompiler::var(lval.sig);
        let signal = self.design().signal(lval.sig);

        if let Some(index) = lval.property {
            self.em.emit(Opcode::LoadObj, ops![var]);
            self.expr().eval_obj(rval)?;
            let word = lval.word.as_ref().and_then(Expr::const_value).unwrap_or(0);
            self.em.emit(Opcode::StorePropObj, ops![index, word]);
            self.em.emit(Opcode::PopObj, ops![1u32, 0u32]);
            return Ok(());
        }

        match (&lval.word, &signal.data) {
            (None, _) => {
                self.expr().eval_obj(rval)?;
                self.em.emit(Opcode::StoreObj, ops![var]);
            }
            (Some(_), DataType::Darray(_) | DataType::Queue(..)) => {
                self.ctx.error(
                    span,
                    format!("object element of {} cannot be assigned", signal.name),
                );
            }
            (Some(index), _) => {
                self.expr().eval_obj(rval)?;
                match array_address(&mut self.expr(), lval.sig, index)? {
                    Some(addr) => {
                        self.em
                            .emit(Opcode::StoreObja, ops![Label::Array(lval.sig), addr]);
                        self.em.regs.free_word(addr);
                    }
                    None => self.em.emit(Opcode::PopObj, ops![1u32, 0u32]),
                }
            }
        }
        Ok(())
    }
}

fn compound_op(op: AssignOp) -> BinaryOp {
    match op {
        AssignOp::Add => BinaryOp::Add,
        AssignOp::Sub => BinaryOp::Sub,
        AssignOp::Mul => BinaryOp::Mul,
        AssignOp::Div => BinaryOp::Div,
        AssignOp::Mod => BinaryOp::Mod,
        AssignOp::And => BinaryOp::And,
        AssignOp::Or => BinaryOp::Or,
        AssignOp::Xor => BinaryOp::Xor,
        AssignOp::Shl => BinaryOp::Shl,
        AssignOp::Shr => BinaryOp::Shr,
        AssignOp::Ashr => BinaryOp::Ashr,
    }
}
