//! Truth values into flags.
//!
//! `if`, loop guards and the ternary operator branch on a flag rather than
//! on a stack value. Comparisons already leave their result in a flag, and
//! `&&`/`||` skip the right operand once the left one decides the result.

use vvpgen_core::{BinaryOp, CodegenResult, Domain, Expr, ExprKind, Logic4, UnaryOp};

use super::ExprCompiler;
use super::binary::compare;
use super::real::push_real;
use crate::bytecode::Opcode;
use crate::emit::{FixedFlag, Flag, ops};

pub(super) fn compile_condition(
    compiler: &mut ExprCompiler<'_, '_>,
    expr: &Expr,
) -> CodegenResult<Flag> {
    match &expr.kind {
        ExprKind::Number(bits) => {
            let fixed = if bits.bits().contains(&Logic4::One) {
                FixedFlag::One
            } else if bits.is_all(Logic4::Zero) {
                FixedFlag::Zero
            } else {
                FixedFlag::X
            };
            return Ok(fixed.into());
        }
        ExprKind::Binary { op, lhs, rhs } if op.is_comparison() => {
            return compare(compiler, *op, lhs, rhs);
        }
        ExprKind::Binary { op, lhs, rhs } if op.is_logical() => {
            return short_circuit(compiler, *op, lhs, rhs);
        }
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => {
            let inner = compiler.eval_cond(operand)?;
            let flag = compiler.own_flag(inner)?;
            compiler.em().emit(Opcode::FlagInv, ops![flag]);
            return Ok(flag);
        }
        _ => {}
    }

    match expr.ty.domain() {
        Domain::Real => {
            compiler.eval_real(expr)?;
            push_real(compiler.em(), 0.0);
            compiler.em().emit(Opcode::CmpWr, vec![]);
            Ok(invert_eq(compiler))
        }
        Domain::Str => {
            compiler.eval_str(expr)?;
            compiler.em().emit(Opcode::PushiStr, ops![""]);
            compiler.em().emit(Opcode::CmpStr, vec![]);
            Ok(invert_eq(compiler))
        }
        Domain::Obj => {
            let null = Expr::new(ExprKind::Null, expr.ty, 1, false);
            compare(compiler, BinaryOp::Ne, expr, &null)
        }
        Domain::Vec4 => {
            compiler.eval_vec4(expr, expr.width)?;
            if expr.width > 1 {
                compiler.em().emit(Opcode::OrR, vec![]);
            }
            let flag = compiler.em().regs.alloc_flag()?;
            compiler.em().emit(Opcode::FlagSetVec4, ops![flag]);
            Ok(flag)
        }
    }
}

/// Turn the equality flag of a compare against zero into "not zero".
fn invert_eq(compiler: &mut ExprCompiler<'_, '_>) -> Flag {
    let flag = Flag::from(FixedFlag::Eq);
    compiler.em().emit(Opcode::FlagInv, ops![flag]);
    flag
}

/// `lhs && rhs` or `lhs || rhs`, skipping `rhs` once `lhs` decides.
fn short_circuit(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
) -> CodegenResult<Flag> {
    let first = compiler.eval_cond(lhs)?;
    let result = compiler.own_flag(first)?;
    let skip = compiler.em().local_label();
    let (jump, combine) = if op == BinaryOp::LogicalAnd {
        (Opcode::Jmp0, Opcode::FlagAnd)
    } else {
        (Opcode::Jmp1, Opcode::FlagOr)
    };
    compiler.em().jump_if(jump, skip.clone(), result);

    let second = compiler.eval_cond(rhs)?;
    compiler.em().emit(combine, ops![result, second]);
    compiler.free_flag(second);
    compiler.em().emit_label(skip);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::test_support::{text, with_compiler};
    use vvpgen_core::{Bits4, DataType, Design, DesignBuilder, NetKind, ScopeKind, SignalId, ValueType};

    fn regs() -> (Design, SignalId, SignalId) {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let a = b.add_signal(top, "a", NetKind::Reg, DataType::Logic, 4);
        let c = b.add_signal(top, "c", NetKind::Reg, DataType::Logic, 1);
        (b.finish(), a, c)
    }

    fn cond(design: &Design, e: &Expr) -> (Flag, Vec<String>) {
        let mut flag = Flag(0);
        let em = with_compiler(design, |ctx, em, scope| {
            let mut c = ExprCompiler::new(ctx, em, scope);
            flag = c.eval_cond(e).unwrap();
            c.free_flag(flag);
        });
        assert_eq!(em.depths(), [0; 4]);
        assert_eq!(em.regs.outstanding(), (0, 0));
        (flag, text(&em))
    }

    #[test]
    fn literals_map_to_fixed_flags() {
        let design = Design::default();
        assert_eq!(cond(&design, &Expr::uint(2, 4)).0, Flag::from(FixedFlag::One));
        assert_eq!(cond(&design, &Expr::uint(0, 4)).0, Flag::from(FixedFlag::Zero));
        let x = Expr::number(Bits4::parse_msb("0x").unwrap(), false);
        assert_eq!(cond(&design, &x).0, Flag::from(FixedFlag::X));
    }

    #[test]
    fn vectors_are_reduced_into_a_flag() {
        let (design, a, _) = regs();
        let (flag, t) = cond(&design, &Expr::signal(a, ValueType::Logic, 4, false));
        assert_eq!(flag, Flag(8));
        assert_eq!(t, vec!["%load/vec4 v0_0;", "%or/r;", "%flag_set/vec4 8;"]);
    }

    #[test]
    fn comparisons_leave_their_flag() {
        let (design, a, _) = regs();
        let e = Expr::binary(
            BinaryOp::Eq,
            Expr::signal(a, ValueType::Logic, 4, false),
            Expr::uint(3, 4),
            1,
        );
        let (flag, t) = cond(&design, &e);
        assert_eq!(flag, Flag::from(FixedFlag::Eq));
        assert_eq!(t, vec!["%load/vec4 v0_0;", "%cmpi/e 3, 0, 4;"]);
    }

    #[test]
    fn logical_and_skips_the_right_side() {
        let (design, a, c) = regs();
        let lhs = Expr::binary(
            BinaryOp::Eq,
            Expr::signal(a, ValueType::Logic, 4, false),
            Expr::uint(3, 4),
            1,
        );
        let rhs = Expr::signal(c, ValueType::Logic, 1, false);
        let e = Expr::binary(BinaryOp::LogicalAnd, lhs, rhs, 1);
        let (flag, t) = cond(&design, &e);
        assert_eq!(flag, Flag(8));
        assert_eq!(
            t,
            vec![
                "%load/vec4 v0_0;",
                "%cmpi/e 3, 0, 4;",
                "%flag_mov 8, 4;",
                "%jmp/0 T_0.0, 8;",
                "%load/vec4 v1_0;",
                "%flag_set/vec4 9;",
                "%flag_and 8, 9;",
                "T_0.0 ;",
            ]
        );
    }

    #[test]
    fn logical_not_inverts_an_owned_flag() {
        let (design, a, _) = regs();
        let inner = Expr::binary(
            BinaryOp::Lt,
            Expr::signal(a, ValueType::Logic, 4, false),
            Expr::uint(3, 4),
            1,
        );
        let e = Expr::unary(UnaryOp::Not, inner, 1);
        let (flag, t) = cond(&design, &e);
        assert_eq!(flag, Flag(8));
        assert_eq!(t[t.len() - 2..], ["%flag_mov 8, 5;", "%flag_inv 8;"]);
    }

    #[test]
    fn real_condition_compares_with_zero() {
        let design = Design::default();
        let (flag, t) = cond(&design, &Expr::real(1.5));
        assert_eq!(flag, Flag::from(FixedFlag::Eq));
        assert!(t.contains(&"%cmp/wr;".to_string()));
        assert_eq!(t.last().map(String::as_str), Some("%flag_inv 4;"));
    }
}
