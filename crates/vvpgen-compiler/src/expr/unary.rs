//! Unary operators on vectors.

use vvpgen_core::{CodegenResult, Domain, Expr, UnaryOp};

use super::ExprCompiler;
use crate::bytecode::Opcode;
use crate::emit::ops;

pub(super) fn compile_unary(
    compiler: &mut ExprCompiler<'_, '_>,
    op: UnaryOp,
    operand: &Expr,
    expr: &Expr,
) -> CodegenResult<()> {
    let reduction = match op {
        UnaryOp::Neg => {
            compiler.eval_vec4(operand, expr.width)?;
            compiler.em().emit(Opcode::Inv, vec![]);
            compiler.em().emit(Opcode::Addi, ops![1u32, 0u32, expr.width]);
            return Ok(());
        }
        UnaryOp::Invert => {
            compiler.eval_vec4(operand, expr.width)?;
            compiler.em().emit(Opcode::Inv, vec![]);
            return Ok(());
        }
        UnaryOp::Not => {
            logical_not(compiler, operand)?;
            compiler.resize(1, expr.width, false);
            return Ok(());
        }
        UnaryOp::ReduceAnd => Opcode::AndR,
        UnaryOp::ReduceOr => Opcode::OrR,
        UnaryOp::ReduceXor => Opcode::XorR,
        UnaryOp::ReduceNand => Opcode::NandR,
        UnaryOp::ReduceNor => Opcode::NorR,
        UnaryOp::ReduceXnor => Opcode::XnorR,
    };
    compiler.eval_vec4(operand, operand.width)?;
    compiler.em().emit(reduction, vec![]);
    compiler.resize(1, expr.width, false);
    Ok(())
}

/// `!operand` as one bit.
fn logical_not(compiler: &mut ExprCompiler<'_, '_>, operand: &Expr) -> CodegenResult<()> {
    if operand.ty.domain() == Domain::Vec4 {
        compiler.eval_vec4(operand, operand.width)?;
        if operand.width > 1 {
            compiler.em().emit(Opcode::OrR, vec![]);
        }
    } else {
        let flag = compiler.eval_cond(operand)?;
        compiler.em().emit(Opcode::FlagGetVec4, ops![flag]);
        compiler.free_flag(flag);
    }
    compiler.em().emit(Opcode::Inv, vec![]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::test_support::{text, with_compiler};
    use vvpgen_core::Design;

    fn run(e: &Expr, width: u32) -> Vec<String> {
        let design = Design::default();
        let em = with_compiler(&design, |ctx, em, scope| {
            ExprCompiler::new(ctx, em, scope).eval_vec4(e, width).unwrap();
        });
        assert_eq!(em.depth(Domain::Vec4), 1);
        text(&em)
    }

    #[test]
    fn negation_is_invert_plus_one() {
        let e = Expr::unary(UnaryOp::Neg, Expr::uint(3, 8), 8);
        assert_eq!(
            run(&e, 8),
            vec!["%pushi/vec4 3, 0, 8;", "%inv;", "%addi 1, 0, 8;"]
        );
    }

    #[test]
    fn logical_not_reduces_wide_operands() {
        let e = Expr::unary(UnaryOp::Not, Expr::uint(3, 8), 1);
        assert_eq!(
            run(&e, 1),
            vec!["%pushi/vec4 3, 0, 8;", "%or/r;", "%inv;"]
        );
    }

    #[test]
    fn reductions_pad_to_the_result_width() {
        let e = Expr::unary(UnaryOp::ReduceXor, Expr::uint(6, 4), 4);
        assert_eq!(
            run(&e, 4),
            vec!["%pushi/vec4 6, 0, 4;", "%xor/r;", "%pad/u 4;"]
        );
    }

    #[test]
    fn not_of_a_real_uses_a_condition() {
        let e = Expr::new(
            vvpgen_core::ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::real(0.0)),
            },
            vvpgen_core::ValueType::Logic,
            1,
            false,
        );
        let t = run(&e, 1);
        assert!(t.iter().any(|l| l.starts_with("%flag_get/vec4")));
        assert_eq!(t.last().map(String::as_str), Some("%inv;"));
    }
}
