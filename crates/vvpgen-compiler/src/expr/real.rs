//! Real-valued expressions.

use vvpgen_core::{BinaryOp, CodegenResult, DataType, Domain, Expr, ExprKind, UnaryOp};

use super::signals::array_address;
use super::{ExprCompiler, SysResult, calls, objects, ternary};
use crate::bytecode::{Label, Opcode};
use crate::codec::real::immediate_parts;
use crate::emit::{CodeEmitter, ops};

/// Push a real constant. Values with more mantissa bits than one immediate
/// carries are built from two immediates and an add.
pub(crate) fn push_real(em: &mut CodeEmitter, value: f64) {
    let mut parts = immediate_parts(value).into_iter();
    let Some((mant, exp)) = parts.next() else {
        return;
    };
    em.emit(Opcode::PushiReal, ops![mant, exp]);
    for (mant, exp) in parts {
        em.emit(Opcode::PushiReal, ops![mant, exp]);
        em.emit(Opcode::AddWr, vec![]);
    }
}

pub(super) fn compile_real(compiler: &mut ExprCompiler<'_, '_>, expr: &Expr) -> CodegenResult<()> {
    match &expr.kind {
        ExprKind::RealNum(value) => push_real(compiler.em(), *value),
        ExprKind::Signal { sig, word } => {
            let signal = compiler.design().signal(*sig);
            match (word.as_deref(), &signal.data) {
                (Some(index), DataType::Darray(_) | DataType::Queue(..)) => {
                    let reg = compiler.eval_index(index)?;
                    compiler
                        .em()
                        .emit(Opcode::LoadDarR, ops![ExprCompiler::var(*sig), reg]);
                    compiler.free_word(reg);
                }
                (Some(index), _) => match array_address(compiler, *sig, index)? {
                    Some(reg) => {
                        compiler
                            .em()
                            .emit(Opcode::LoadAr, ops![Label::Array(*sig), reg]);
                        compiler.free_word(reg);
                    }
                    None => push_real(compiler.em(), 0.0),
                },
                (None, _) => {
                    compiler
                        .em()
                        .emit(Opcode::LoadReal, ops![ExprCompiler::var(*sig)]);
                }
            }
        }
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => {
            push_real(compiler.em(), 0.0);
            compiler.eval_real(operand)?;
            compiler.em().emit(Opcode::SubWr, vec![]);
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let opcode = match op {
                BinaryOp::Add => Opcode::AddWr,
                BinaryOp::Sub => Opcode::SubWr,
                BinaryOp::Mul => Opcode::MulWr,
                BinaryOp::Div => Opcode::DivWr,
                BinaryOp::Mod => Opcode::ModWr,
                BinaryOp::Pow => Opcode::PowWr,
                _ => {
                    compiler.unsupported(
                        expr.span,
                        &format!("operator {op:?} on real operands"),
                        Domain::Real,
                        1,
                    );
                    return Ok(());
                }
            };
            compiler.eval_real(lhs)?;
            compiler.eval_real(rhs)?;
            compiler.em().emit(opcode, vec![]);
        }
        ExprKind::Ternary {
            cond,
            then,
            otherwise,
        } => ternary::compile_ternary(compiler, cond, then, otherwise, expr, Domain::Real)?,
        ExprKind::UserCall { func, args } => {
            calls::compile_user_call(compiler, *func, args, expr, Domain::Real)?;
        }
        ExprKind::SysCall { name, args } => {
            calls::compile_sys_call(compiler, name, args, expr.span, SysResult::Real)?;
        }
        ExprKind::Property { base, index, word } => {
            objects::load_property(compiler, *base, *index, word.as_deref(), expr, Domain::Real)?;
        }
        ExprKind::Cast(inner) => compiler.eval_real(inner)?,
        _ => compiler.unsupported(
            expr.span,
            "expression cannot be evaluated as a real",
            Domain::Real,
            1,
        ),
    }
    Ok(())
}
