//! Signal references and array addressing.

use vvpgen_core::{CodegenError, CodegenResult, DataType, Domain, Expr, SignalId};

use super::{ExprCompiler, imm};
use crate::bytecode::{Label, Opcode};
use crate::emit::{Word, ops};

/// Compute the canonical address of an array word into a register.
///
/// Returns `None` for a constant index outside the declared range; the
/// caller then reads x or discards the write. A variable index outside the
/// range is left for the runtime to detect.
pub(crate) fn array_address(
    compiler: &mut ExprCompiler<'_, '_>,
    sig: SignalId,
    index: &Expr,
) -> CodegenResult<Option<Word>> {
    let signal = compiler.design().signal(sig);
    let Some((first, last)) = signal.array else {
        return Err(CodegenError::invariant(
            format!("word select of {sig}, which is not an array"),
            index.span,
        ));
    };

    if let Some(value) = index.const_value() {
        return match signal.canonical_word(value) {
            Some(word) => Ok(Some(compiler.load_index(i64::from(word))?)),
            None => Ok(None),
        };
    }

    compiler.eval_vec4(index, 64)?;
    if first <= last {
        if first != 0 {
            let (lo, hi) = imm(first);
            compiler.em().emit(Opcode::Subi, ops![lo, hi, 64u32]);
        }
    } else {
        let (lo, hi) = imm(first + 1);
        compiler.em().emit(Opcode::Inv, vec![]);
        compiler.em().emit(Opcode::Addi, ops![lo, hi, 64u32]);
    }
    let word = compiler.em().regs.alloc_word()?;
    compiler.em().emit(Opcode::IxVec4S, ops![word]);
    Ok(Some(word))
}

/// Push a vector signal, one word of a vector array, or one element of a
/// dynamic array or queue.
pub(super) fn load_vec4(
    compiler: &mut ExprCompiler<'_, '_>,
    sig: SignalId,
    word: Option<&Expr>,
    expr: &Expr,
) -> CodegenResult<()> {
    let signal = compiler.design().signal(sig);
    match (word, &signal.data) {
        (Some(index), DataType::Darray(_) | DataType::Queue(..)) => {
            let reg = compiler.eval_index(index)?;
            compiler
                .em()
                .emit(Opcode::LoadDarVec4, ops![ExprCompiler::var(sig), reg]);
            compiler.free_word(reg);
        }
        (Some(index), _) => match array_address(compiler, sig, index)? {
            Some(reg) => {
                compiler
                    .em()
                    .emit(Opcode::LoadVec4a, ops![Label::Array(sig), reg]);
                compiler.free_word(reg);
            }
            None => compiler.placeholder(Domain::Vec4, expr.width),
        },
        (None, _) if signal.is_array() => {
            compiler.unsupported(
                expr.span,
                "whole array used as a value",
                Domain::Vec4,
                expr.width,
            );
        }
        (None, _) => {
            compiler
                .em()
                .emit(Opcode::LoadVec4, ops![ExprCompiler::var(sig)]);
        }
    }
    Ok(())
}
