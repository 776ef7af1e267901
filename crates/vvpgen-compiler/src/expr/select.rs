//! Part selects.

use vvpgen_core::{CodegenResult, Domain, Expr};

use super::ExprCompiler;
use crate::bytecode::Opcode;
use crate::emit::ops;

/// `base[offset +: width]`, or a plain resize of `base` when there is no
/// offset. A select from a string extracts characters instead of bits.
pub(super) fn compile_select(
    compiler: &mut ExprCompiler<'_, '_>,
    base: &Expr,
    offset: Option<&Expr>,
    expr: &Expr,
) -> CodegenResult<()> {
    match base.ty.domain() {
        Domain::Str => {
            compiler.eval_str(base)?;
            let reg = match offset {
                Some(off) => compiler.eval_index(off)?,
                None => compiler.load_index(0)?,
            };
            compiler.em().emit(Opcode::SubstrVec4, ops![reg, expr.width]);
            compiler.free_word(reg);
            return Ok(());
        }
        Domain::Real | Domain::Obj => {
            compiler.unsupported(
                expr.span,
                "part select of a non-vector value",
                Domain::Vec4,
                expr.width,
            );
            return Ok(());
        }
        Domain::Vec4 => {}
    }

    compiler.eval_vec4(base, base.width)?;
    let Some(off) = offset else {
        compiler.resize(base.width, expr.width, base.signed);
        return Ok(());
    };

    if let Some(value) = off.const_value() {
        let op = if value < 0 {
            Opcode::PartiS
        } else {
            Opcode::PartiU
        };
        compiler.em().emit(op, ops![expr.width, value]);
        return Ok(());
    }

    let reg = compiler.eval_index(off)?;
    let op = if off.signed {
        Opcode::PartS
    } else {
        Opcode::PartU
    };
    compiler.em().emit(op, ops![expr.width, reg]);
    compiler.free_word(reg);
    Ok(())
}
