//! String-valued expressions.

use vvpgen_core::{CodegenResult, DataType, Domain, Expr, ExprKind};

use super::signals::array_address;
use super::{ExprCompiler, SysResult, calls, objects, ternary};
use crate::bytecode::{Label, Opcode};
use crate::emit::ops;

pub(super) fn compile_string(
    compiler: &mut ExprCompiler<'_, '_>,
    expr: &Expr,
) -> CodegenResult<()> {
    match &expr.kind {
        ExprKind::String(text) => compiler.em().emit(Opcode::PushiStr, ops![text.as_str()]),
        ExprKind::Signal { sig, word } => {
            let signal = compiler.design().signal(*sig);
            match (word.as_deref(), &signal.data) {
                (Some(index), DataType::Darray(_) | DataType::Queue(..)) => {
                    let reg = compiler.eval_index(index)?;
                    compiler
                        .em()
                        .emit(Opcode::LoadDarStr, ops![ExprCompiler::var(*sig), reg]);
                    compiler.free_word(reg);
                }
                (Some(index), _) => match array_address(compiler, *sig, index)? {
                    Some(reg) => {
                        compiler
                            .em()
                            .emit(Opcode::LoadStra, ops![Label::Array(*sig), reg]);
                        compiler.free_word(reg);
                    }
                    None => compiler.em().emit(Opcode::PushiStr, ops![""]),
                },
                (None, _) => {
                    compiler
                        .em()
                        .emit(Opcode::LoadStr, ops![ExprCompiler::var(*sig)]);
                }
            }
        }
        ExprKind::Concat { parts, repeat } => {
            if *repeat == 0 || parts.is_empty() {
                compiler.em().emit(Opcode::PushiStr, ops![""]);
                return Ok(());
            }
            for copy in 0..*repeat {
                for (i, part) in parts.iter().enumerate() {
                    let first = copy == 0 && i == 0;
                    append(compiler, part, first)?;
                }
            }
        }
        ExprKind::Ternary {
            cond,
            then,
            otherwise,
        } => ternary::compile_ternary(compiler, cond, then, otherwise, expr, Domain::Str)?,
        ExprKind::UserCall { func, args } => {
            calls::compile_user_call(compiler, *func, args, expr, Domain::Str)?;
        }
        ExprKind::SysCall { name, args } => {
            calls::compile_sys_call(compiler, name, args, expr.span, SysResult::Str)?;
        }
        ExprKind::Property { base, index, word } => {
            objects::load_property(compiler, *base, *index, word.as_deref(), expr, Domain::Str)?;
        }
        ExprKind::Cast(inner) => compiler.eval_str(inner)?,
        _ => compiler.unsupported(
            expr.span,
            "expression cannot be evaluated as a string",
            Domain::Str,
            1,
        ),
    }
    Ok(())
}

/// Push the first part of a string concatenation, or append a later one.
/// Literal parts are appended as immediates.
fn append(compiler: &mut ExprCompiler<'_, '_>, part: &Expr, first: bool) -> CodegenResult<()> {
    if !first && let ExprKind::String(text) = &part.kind {
        compiler
            .em()
            .emit(Opcode::ConcatiStr, ops![text.as_str()]);
        return Ok(());
    }
    compiler.eval_str(part)?;
    if !first {
        compiler.em().emit(Opcode::ConcatStr, vec![]);
    }
    Ok(())
}
