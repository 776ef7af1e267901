//! The conditional operator.
//!
//! A defined condition evaluates only the selected arm. For vectors and
//! reals an unknown condition evaluates both arms and blends them:
//!
//! ```text
//!     %jmp/0  T_else, f      ; false: only the else arm
//!     <then>
//!     %jmp/1  T_out, f       ; true: done
//! T_else:                    ; x: then value still on the stack
//!     <else>
//!     %jmp/0  T_out, f
//!     %blend                 ; x: merge the two arms
//! T_out:
//! ```
//!
//! Strings and objects have no blend and take the else arm for an unknown
//! condition.

use vvpgen_core::{CodegenResult, Domain, Expr};

use super::ExprCompiler;
use crate::bytecode::Opcode;

pub(super) fn compile_ternary(
    compiler: &mut ExprCompiler<'_, '_>,
    cond: &Expr,
    then: &Expr,
    otherwise: &Expr,
    expr: &Expr,
    domain: Domain,
) -> CodegenResult<()> {
    let first = compiler.eval_cond(cond)?;
    let flag = compiler.own_flag(first)?;
    let else_label = compiler.em().local_label();
    let out = compiler.em().local_label();

    let blend = match domain {
        Domain::Vec4 => Some(Opcode::Blend),
        Domain::Real => Some(Opcode::BlendWr),
        Domain::Str | Domain::Obj => None,
    };

    match blend {
        Some(blend) => {
            compiler.em().jump_if(Opcode::Jmp0, else_label.clone(), flag);
            eval_arm(compiler, then, expr, domain)?;
            compiler.em().jump_if(Opcode::Jmp1, out.clone(), flag);
            compiler.em().emit_merge_label(else_label);
            eval_arm(compiler, otherwise, expr, domain)?;
            compiler.em().jump_if(Opcode::Jmp0, out.clone(), flag);
            compiler.em().emit(blend, vec![]);
            compiler.em().emit_merge_label(out);
        }
        None => {
            compiler.em().jump_if(Opcode::Jmp0xz, else_label.clone(), flag);
            eval_arm(compiler, then, expr, domain)?;
            compiler.em().jump(out.clone());
            compiler.em().emit_label(else_label);
            eval_arm(compiler, otherwise, expr, domain)?;
            compiler.em().emit_label(out);
        }
    }
    compiler.free_flag(flag);
    Ok(())
}

fn eval_arm(
    compiler: &mut ExprCompiler<'_, '_>,
    arm: &Expr,
    expr: &Expr,
    domain: Domain,
) -> CodegenResult<()> {
    match domain {
        Domain::Vec4 => compiler.eval_vec4(arm, expr.width),
        Domain::Real => compiler.eval_real(arm),
        Domain::Str => compiler.eval_str(arm),
        Domain::Obj => compiler.eval_obj(arm),
    }
}
