//! Expression lowering.
//!
//! The [`ExprCompiler`] turns typed expression trees into instructions for
//! one thread. There are four entry points, one per value domain:
//!
//! - [`eval_vec4`](ExprCompiler::eval_vec4) - 4-state vectors, at a
//!   requested width
//! - [`eval_real`](ExprCompiler::eval_real)
//! - [`eval_str`](ExprCompiler::eval_str)
//! - [`eval_obj`](ExprCompiler::eval_obj) - class handles, dynamic arrays
//!   and queues
//!
//! Each leaves exactly one value on its domain's stack and nothing else.
//! An expression of another domain is evaluated in its own domain and then
//! converted. [`eval_cond`](ExprCompiler::eval_cond) evaluates a truth value
//! into a flag instead.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = ExprCompiler::new(&mut ctx, &mut em, scope);
//! compiler.eval_vec4(&expr, 8)?;
//! assert_eq!(em.depth(Domain::Vec4), 1);
//! ```

mod binary;
mod calls;
mod concat;
mod condition;
mod literals;
mod objects;
mod real;
mod select;
mod signals;
mod string;
mod ternary;
mod unary;

pub(crate) use binary::apply_vec4;
pub(crate) use calls::{SysResult, compile_sys_call, queue_push};
pub(crate) use literals::{imm, push_bits};
pub(crate) use objects::darray_code;
pub(crate) use real::push_real;
pub(crate) use signals::array_address;

use vvpgen_core::{
    Bits4, CodegenResult, DataType, Design, Domain, Expr, ExprKind, Logic4, ScopeId, Span,
    ValueType,
};

use crate::bytecode::{Label, Opcode};
use crate::context::GenContext;
use crate::emit::{CodeEmitter, FixedFlag, Flag, Word, WordTag, ops};

/// Lowers expressions into one thread's instruction stream.
pub struct ExprCompiler<'a, 'd> {
    ctx: &'a mut GenContext<'d>,
    em: &'a mut CodeEmitter,
    /// Scope the code runs in.
    scope: ScopeId,
}

impl<'a, 'd> ExprCompiler<'a, 'd> {
    pub fn new(ctx: &'a mut GenContext<'d>, em: &'a mut CodeEmitter, scope: ScopeId) -> Self {
        Self { ctx, em, scope }
    }

    #[inline]
    pub(crate) fn ctx(&mut self) -> &mut GenContext<'d> {
        self.ctx
    }

    #[inline]
    pub(crate) fn em(&mut self) -> &mut CodeEmitter {
        self.em
    }

    #[inline]
    pub(crate) fn design(&self) -> &'d Design {
        self.ctx.design
    }

    pub(crate) fn scope(&self) -> ScopeId {
        self.scope
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Evaluate in the expression's own domain; returns that domain.
    pub fn eval(&mut self, expr: &Expr) -> CodegenResult<Domain> {
        let domain = expr.ty.domain();
        match domain {
            Domain::Vec4 => self.eval_vec4(expr, expr.width)?,
            Domain::Real => self.eval_real(expr)?,
            Domain::Str => self.eval_str(expr)?,
            Domain::Obj => self.eval_obj(expr)?,
        }
        Ok(domain)
    }

    /// Push the value as a `width`-bit vector.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn eval_vec4(&mut self, expr: &Expr, width: u32) -> CodegenResult<()> {
        match expr.ty.domain() {
            Domain::Vec4 => match &expr.kind {
                ExprKind::Number(bits) => {
                    push_bits(self.em, &bits.resized(width, expr.signed));
                }
                _ => {
                    self.vec4_natural(expr)?;
                    self.resize(expr.width, width, expr.signed);
                }
            },
            Domain::Real => {
                self.eval_real(expr)?;
                self.em.emit(Opcode::CvtVr, ops![width]);
            }
            Domain::Str => {
                self.eval_str(expr)?;
                self.em.emit(Opcode::CastVec4Str, ops![width]);
            }
            Domain::Obj => {
                self.unsupported(expr.span, "object value used as a vector", Domain::Vec4, width);
            }
        }
        Ok(())
    }

    /// Push the value as a real.
    pub fn eval_real(&mut self, expr: &Expr) -> CodegenResult<()> {
        match expr.ty.domain() {
            Domain::Real => real::compile_real(self, expr),
            Domain::Vec4 => {
                self.vec4_natural(expr)?;
                let op = if expr.signed {
                    Opcode::CvtRvS
                } else {
                    Opcode::CvtRv
                };
                self.em.emit(op, vec![]);
                Ok(())
            }
            Domain::Str | Domain::Obj => {
                self.unsupported(expr.span, "value cannot be used as a real", Domain::Real, 1);
                Ok(())
            }
        }
    }

    /// Push the value as a string.
    pub fn eval_str(&mut self, expr: &Expr) -> CodegenResult<()> {
        match expr.ty.domain() {
            Domain::Str => string::compile_string(self, expr),
            Domain::Vec4 => {
                self.vec4_natural(expr)?;
                self.em.emit(Opcode::PushvStr, vec![]);
                Ok(())
            }
            Domain::Real | Domain::Obj => {
                self.unsupported(expr.span, "value cannot be used as a string", Domain::Str, 1);
                Ok(())
            }
        }
    }

    /// Push an object handle.
    pub fn eval_obj(&mut self, expr: &Expr) -> CodegenResult<()> {
        if expr.ty.domain() != Domain::Obj && !matches!(expr.kind, ExprKind::Null) {
            self.unsupported(expr.span, "value cannot be used as an object", Domain::Obj, 1);
            return Ok(());
        }
        objects::compile_object(self, expr)
    }

    /// Evaluate a truth value into a flag.
    ///
    /// The flag may be one of the fixed flags; it is only valid until the
    /// next comparison. Pass it to [`free_flag`](Self::free_flag) when done.
    pub fn eval_cond(&mut self, expr: &Expr) -> CodegenResult<Flag> {
        condition::compile_condition(self, expr)
    }

    /// Vector value at the expression's own width.
    fn vec4_natural(&mut self, expr: &Expr) -> CodegenResult<()> {
        match &expr.kind {
            ExprKind::Number(bits) => {
                push_bits(self.em, bits);
                Ok(())
            }
            ExprKind::String(text) => {
                push_bits(self.em, &literals::string_bits(text));
                Ok(())
            }
            ExprKind::RealNum(value) => {
                real::push_real(self.em, *value);
                self.em.emit(Opcode::CvtVr, ops![expr.width]);
                Ok(())
            }
            ExprKind::Signal { sig, word } => {
                signals::load_vec4(self, *sig, word.as_deref(), expr)
            }
            ExprKind::Select { base, offset } => {
                select::compile_select(self, base, offset.as_deref(), expr)
            }
            ExprKind::Concat { parts, repeat } => {
                concat::compile_concat(self, parts, *repeat, expr)
            }
            ExprKind::Unary { op, operand } => unary::compile_unary(self, *op, operand, expr),
            ExprKind::Binary { op, lhs, rhs } => {
                binary::compile_binary(self, *op, lhs, rhs, expr)
            }
            ExprKind::Ternary {
                cond,
                then,
                otherwise,
            } => ternary::compile_ternary(self, cond, then, otherwise, expr, Domain::Vec4),
            ExprKind::UserCall { func, args } => {
                calls::compile_user_call(self, *func, args, expr, Domain::Vec4)
            }
            ExprKind::SysCall { name, args } => {
                calls::compile_sys_call(self, name, args, expr.span, SysResult::Vec4(expr.width))
            }
            ExprKind::Property { base, index, word } => {
                objects::load_property(self, *base, *index, word.as_deref(), expr, Domain::Vec4)
            }
            ExprKind::Cast(inner) => {
                self.eval_vec4(inner, expr.width)?;
                if expr.ty == ValueType::Bool {
                    self.em.emit(Opcode::Cast2, vec![]);
                }
                Ok(())
            }
            ExprKind::Scope(_) => {
                self.unsupported(
                    expr.span,
                    "scope handle used outside a system call",
                    Domain::Vec4,
                    expr.width,
                );
                Ok(())
            }
            ExprKind::New(_)
            | ExprKind::NewDarray { .. }
            | ExprKind::ArrayPattern(_)
            | ExprKind::Null
            | ExprKind::ShallowCopy(_) => {
                self.unsupported(expr.span, "object expression used as a vector", Domain::Vec4, expr.width);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    /// Pad or truncate the vector on top from `from` to `to` bits.
    pub(crate) fn resize(&mut self, from: u32, to: u32, signed: bool) {
        if from != to {
            let op = if signed { Opcode::PadS } else { Opcode::PadU };
            self.em.emit(op, ops![to]);
        }
    }

    /// Evaluate an integer expression into an index register.
    ///
    /// Constants are loaded with `%ix/load` and reuse a register already
    /// holding the value when the lookaside cache has one. Flag 4 is set
    /// when the value had x or z bits.
    pub(crate) fn eval_index(&mut self, expr: &Expr) -> CodegenResult<Word> {
        if let Some(value) = expr.const_value() {
            return self.load_index(value);
        }
        if let ExprKind::Signal { sig, word: None } = expr.kind
            && expr.ty.domain() == Domain::Vec4
            && let Some(word) = self.em.regs.alloc_cached(WordTag::Signal(sig))
        {
            return Ok(word);
        }
        self.eval_vec4(expr, expr.width.max(1))?;
        let word = self.em.regs.alloc_word()?;
        let op = if expr.signed {
            Opcode::IxVec4S
        } else {
            Opcode::IxVec4
        };
        self.em.emit(op, ops![word]);
        if let ExprKind::Signal { sig, word: None } = expr.kind {
            self.em.regs.set_tag(word, Some(WordTag::Signal(sig)));
        }
        Ok(word)
    }

    /// An index register holding a constant.
    pub(crate) fn load_index(&mut self, value: i64) -> CodegenResult<Word> {
        if let Some(word) = self.em.regs.alloc_cached(WordTag::Const(value)) {
            return Ok(word);
        }
        let word = self.em.regs.alloc_word()?;
        let (lo, hi) = imm(value);
        self.em.emit(Opcode::IxLoad, ops![word, lo, hi]);
        self.em.regs.set_tag(word, Some(WordTag::Const(value)));
        Ok(word)
    }

    pub(crate) fn free_word(&mut self, word: Word) {
        self.em.regs.free_word(word);
    }

    /// Copy a fixed flag into an allocated one so it survives later
    /// comparisons.
    pub(crate) fn own_flag(&mut self, flag: Flag) -> CodegenResult<Flag> {
        if !FixedFlag::is_reserved(flag) {
            return Ok(flag);
        }
        let owned = self.em.regs.alloc_flag()?;
        self.em.emit(Opcode::FlagMov, ops![owned, flag]);
        Ok(owned)
    }

    /// Return a flag from [`eval_cond`](Self::eval_cond).
    pub fn free_flag(&mut self, flag: Flag) {
        self.em.regs.free_flag(flag);
    }

    /// Push a well-formed stand-in value.
    pub(crate) fn placeholder(&mut self, domain: Domain, width: u32) {
        match domain {
            Domain::Vec4 => push_bits(self.em, &Bits4::filled(Logic4::X, width.max(1))),
            Domain::Real => real::push_real(self.em, 0.0),
            Domain::Str => self.em.emit(Opcode::PushiStr, ops![""]),
            Domain::Obj => self.em.emit(Opcode::Null, vec![]),
        }
    }

    /// Report a construct that cannot be lowered and push a stand-in.
    pub(crate) fn unsupported(&mut self, span: Span, message: &str, domain: Domain, width: u32) {
        self.ctx.error(span, message);
        self.placeholder(domain, width);
    }

    /// Location operands of a system call: file index and line.
    pub(crate) fn location(span: Span) -> (u32, u32) {
        (span.file.index(), span.line)
    }

    /// The label of a signal's first word.
    pub(crate) fn var(sig: vvpgen_core::SignalId) -> Label {
        Label::Signal(sig, 0)
    }
}

/// Domain of one element of a signal: the element type for dynamic arrays
/// and queues, the signal's own type otherwise.
pub(crate) fn element_domain(data: &DataType) -> Domain {
    data.element().map_or_else(|| data.domain(), DataType::domain)
}


#[cfg(test)]
mod tests {
    use super::test_support::{text, with_compiler};
    use super::*;
    use vvpgen_core::{BinaryOp, DesignBuilder, NetKind, ScopeKind, UnaryOp};

    fn design_with_regs() -> (Design, vvpgen_core::SignalId, vvpgen_core::SignalId) {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let a = b.add_signal(top, "a", NetKind::Reg, DataType::Logic, 8);
        let r = b.add_signal(top, "r", NetKind::Reg, DataType::Real, 1);
        (b.finish(), a, r)
    }

    #[test]
    fn every_domain_leaves_one_value() {
        let (design, a, r) = design_with_regs();
        let av = Expr::signal(a, ValueType::Logic, 8, false);
        let rv = Expr::signal(r, ValueType::Real, 1, true);
        let em = with_compiler(&design, |ctx, em, scope| {
            let mut c = ExprCompiler::new(ctx, em, scope);
            c.eval_vec4(&av, 16).unwrap();
            c.eval_real(&av).unwrap();
            c.eval_vec4(&rv, 8).unwrap();
            c.eval_str(&av).unwrap();
        });
        assert_eq!(em.depth(Domain::Vec4), 2);
        assert_eq!(em.depth(Domain::Real), 1);
        assert_eq!(em.depth(Domain::Str), 1);
        let t = text(&em);
        assert_eq!(t[0], "%load/vec4 v0_0;");
        assert_eq!(t[1], "%pad/u 16;");
        assert!(t.contains(&"%cvt/rv;".to_string()));
        assert!(t.contains(&"%cvt/vr 8;".to_string()));
        assert!(t.contains(&"%pushv/str;".to_string()));
    }

    #[test]
    fn nested_expressions_stay_balanced() {
        let (design, a, _) = design_with_regs();
        let av = || Expr::signal(a, ValueType::Logic, 8, false);
        let sum = Expr::binary(BinaryOp::Add, av(), Expr::uint(3, 8), 8);
        let inv = Expr::unary(UnaryOp::Invert, sum, 8);
        let cmp = Expr::binary(BinaryOp::Lt, inv, av(), 1);
        let prod = Expr::binary(BinaryOp::Mul, cmp, av(), 8);
        let em = with_compiler(&design, |ctx, em, scope| {
            let mut c = ExprCompiler::new(ctx, em, scope);
            c.eval_vec4(&prod, 8).unwrap();
        });
        assert_eq!(em.depth(Domain::Vec4), 1);
        assert_eq!(em.regs.outstanding(), (0, 0));
    }

    #[test]
    fn constant_index_reuses_register() {
        let (design, _, _) = design_with_regs();
        let em = with_compiler(&design, |ctx, em, scope| {
            let mut c = ExprCompiler::new(ctx, em, scope);
            let w = c.load_index(7).unwrap();
            c.free_word(w);
            let again = c.load_index(7).unwrap();
            assert_eq!(w, again);
            c.free_word(again);
        });
        let loads = text(&em).iter().filter(|l| l.starts_with("%ix/load")).count();
        assert_eq!(loads, 1);
    }

    #[test]
    fn fixed_flags_are_copied_when_owned() {
        let (design, _, _) = design_with_regs();
        let em = with_compiler(&design, |ctx, em, scope| {
            let mut c = ExprCompiler::new(ctx, em, scope);
            let f = c.own_flag(FixedFlag::Eq.into()).unwrap();
            assert!(!FixedFlag::is_reserved(f));
            c.free_flag(f);
        });
        assert_eq!(text(&em), vec!["%flag_mov 8, 4;"]);
        assert_eq!(em.regs.outstanding(), (0, 0));
    }

    #[test]
    fn object_in_vector_context_is_reported() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let cls = b.add_class(
            top,
            vvpgen_core::ClassType {
                name: "C".into(),
                properties: Vec::new(),
            },
        );
        let h = b.add_signal(top, "h", NetKind::Reg, DataType::Class(cls), 1);
        let design = b.finish();
        let hv = Expr::signal(h, ValueType::Class(cls), 1, false);
        let opts = crate::options::CodegenOptions::default();
        let mut ctx = GenContext::new(&design, &opts);
        let mut em = CodeEmitter::new(0, crate::emit::Registers::default());
        ExprCompiler::new(&mut ctx, &mut em, top)
            .eval_vec4(&hv, 4)
            .unwrap();
        assert_eq!(ctx.diags.error_count(), 1);
        assert_eq!(em.depth(Domain::Vec4), 1);
    }
}
