//! Binary operators on vectors, and comparisons in every domain.

use vvpgen_core::{BinaryOp, CodegenError, CodegenResult, Domain, Expr, ExprKind};

use super::{ExprCompiler, imm};
use crate::bytecode::Opcode;
use crate::emit::{FixedFlag, Flag, ops};

/// Compile a binary node whose result is a vector.
pub(super) fn compile_binary(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    expr: &Expr,
) -> CodegenResult<()> {
    if op.is_comparison() {
        let flag = compare(compiler, op, lhs, rhs)?;
        compiler.em().emit(Opcode::FlagGetVec4, ops![flag]);
        compiler.free_flag(flag);
        compiler.resize(1, expr.width, false);
        return Ok(());
    }

    if op.is_logical() {
        truth_bit(compiler, lhs)?;
        truth_bit(compiler, rhs)?;
        let op = if op == BinaryOp::LogicalAnd {
            Opcode::And
        } else {
            Opcode::Or
        };
        compiler.em().emit(op, vec![]);
        compiler.resize(1, expr.width, false);
        return Ok(());
    }

    compiler.eval_vec4(lhs, expr.width)?;
    apply_vec4(compiler, op, rhs, expr.width, expr.signed)
}

/// Combine the vector on top of the stack with `rhs` under an arithmetic,
/// bitwise or shift operator, leaving a `width`-bit result.
pub(crate) fn apply_vec4(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    rhs: &Expr,
    width: u32,
    signed: bool,
) -> CodegenResult<()> {
    if op.is_shift() {
        let amount = compiler.eval_index(rhs)?;
        let shift = match op {
            BinaryOp::Shl | BinaryOp::Ashl => Opcode::ShiftL,
            BinaryOp::Ashr if signed => Opcode::ShiftRS,
            _ => Opcode::ShiftR,
        };
        compiler.em().emit(shift, ops![amount]);
        compiler.free_word(amount);
        return Ok(());
    }

    let immediate = match op {
        BinaryOp::Add => Some(Opcode::Addi),
        BinaryOp::Sub => Some(Opcode::Subi),
        BinaryOp::Mul => Some(Opcode::Muli),
        BinaryOp::And => Some(Opcode::Andi),
        BinaryOp::Or => Some(Opcode::Ori),
        _ => None,
    };
    if let (Some(opi), Some(value)) = (immediate, immediate_value(rhs, width)) {
        let (lo, hi) = imm(value as i64);
        compiler.em().emit(opi, ops![lo, hi, width]);
        return Ok(());
    }

    compiler.eval_vec4(rhs, width)?;
    let generic = match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div if signed => Opcode::DivS,
        BinaryOp::Div => Opcode::Div,
        BinaryOp::Mod if signed => Opcode::ModS,
        BinaryOp::Mod => Opcode::Mod,
        BinaryOp::Pow if signed => Opcode::PowS,
        BinaryOp::Pow => Opcode::Pow,
        BinaryOp::And => Opcode::And,
        BinaryOp::Or => Opcode::Or,
        BinaryOp::Xor => Opcode::Xor,
        BinaryOp::Xnor => Opcode::Xnor,
        BinaryOp::Nand => Opcode::Nand,
        BinaryOp::Nor => Opcode::Nor,
        _ => {
            return Err(CodegenError::internal(format!(
                "operator {op:?} reached generic vector lowering"
            )));
        }
    };
    compiler.em().emit(generic, vec![]);
    Ok(())
}

/// The value of a literal operand at `width` bits, if it is fully defined
/// and fits the 64-bit immediate.
fn immediate_value(operand: &Expr, width: u32) -> Option<u64> {
    if width > 64 && operand.signed {
        return None;
    }
    operand.as_number()?.resized(width, operand.signed).to_u64()
}

/// Push the 1-bit truth value of any expression.
pub(super) fn truth_bit(compiler: &mut ExprCompiler<'_, '_>, expr: &Expr) -> CodegenResult<()> {
    if expr.ty.domain() == Domain::Vec4 {
        compiler.eval_vec4(expr, expr.width)?;
        if expr.width > 1 {
            compiler.em().emit(Opcode::OrR, vec![]);
        }
    } else {
        let flag = compiler.eval_cond(expr)?;
        compiler.em().emit(Opcode::FlagGetVec4, ops![flag]);
        compiler.free_flag(flag);
    }
    Ok(())
}

// =============================================================================
// Comparisons
// =============================================================================

/// Compare two operands and return the flag holding the result.
///
/// The flag is usually one of the fixed comparison flags, valid only until
/// the next comparison. Operands are compared in the widest domain either
/// side needs: real, then string, then vector.
pub(crate) fn compare(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
) -> CodegenResult<Flag> {
    let domains = (lhs.ty.domain(), rhs.ty.domain());
    if matches!(domains, (Domain::Obj, _) | (_, Domain::Obj)) {
        return compare_handles(compiler, op, lhs, rhs);
    }

    // a > b is b < a.
    let (op, a, b) = match op {
        BinaryOp::Gt => (BinaryOp::Lt, rhs, lhs),
        BinaryOp::Ge => (BinaryOp::Le, rhs, lhs),
        _ => (op, lhs, rhs),
    };

    if matches!(domains, (Domain::Real, _) | (_, Domain::Real)) {
        compiler.eval_real(a)?;
        compiler.eval_real(b)?;
        compiler.em().emit(Opcode::CmpWr, vec![]);
        return Ok(ordered_result(compiler, op));
    }
    if matches!(domains, (Domain::Str, _) | (_, Domain::Str)) {
        compiler.eval_str(a)?;
        compiler.eval_str(b)?;
        compiler.em().emit(Opcode::CmpStr, vec![]);
        return Ok(ordered_result(compiler, op));
    }

    let width = a.width.max(b.width);
    let signed = a.signed && b.signed;
    push_operand(compiler, a, width, signed)?;

    let literal = match op {
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::CaseEq
        | BinaryOp::CaseNe
        | BinaryOp::Lt
        | BinaryOp::Le => b
            .as_number()
            .and_then(|bits| bits.resized(width, signed).to_u64())
            .filter(|_| width <= 64),
        _ => None,
    };

    if let Some(value) = literal {
        let (lo, hi) = imm(value as i64);
        let cmpi = match op {
            BinaryOp::Lt | BinaryOp::Le if signed => Opcode::CmpiS,
            BinaryOp::Lt | BinaryOp::Le => Opcode::CmpiU,
            _ => Opcode::CmpiE,
        };
        compiler.em().emit(cmpi, ops![lo, hi, width]);
        return Ok(match op {
            BinaryOp::Eq => FixedFlag::Eq.into(),
            BinaryOp::CaseEq => FixedFlag::Eeq.into(),
            BinaryOp::Ne => invert(compiler, FixedFlag::Eq),
            BinaryOp::CaseNe => invert(compiler, FixedFlag::Eeq),
            _ => ordered_result(compiler, op),
        });
    }

    push_operand(compiler, b, width, signed)?;
    let (cmp, flag) = match op {
        BinaryOp::Eq => (Opcode::CmpE, FixedFlag::Eq),
        BinaryOp::Ne => (Opcode::CmpNe, FixedFlag::Eq),
        BinaryOp::CaseEq => (Opcode::CmpE, FixedFlag::Eeq),
        BinaryOp::CaseNe => (Opcode::CmpNe, FixedFlag::Eeq),
        BinaryOp::WildEq => (Opcode::CmpWeq, FixedFlag::Eq),
        BinaryOp::WildNe => (Opcode::CmpWne, FixedFlag::Eq),
        _ => {
            let cmp = if signed { Opcode::CmpS } else { Opcode::CmpU };
            compiler.em().emit(cmp, vec![]);
            return Ok(ordered_result(compiler, op));
        }
    };
    compiler.em().emit(cmp, vec![]);
    Ok(flag.into())
}

/// Push a comparison operand at the common width.
fn push_operand(
    compiler: &mut ExprCompiler<'_, '_>,
    expr: &Expr,
    width: u32,
    signed: bool,
) -> CodegenResult<()> {
    compiler.eval_vec4(expr, expr.width)?;
    compiler.resize(expr.width, width, signed);
    Ok(())
}

/// Read the result of a compare that set the equality and less-than flags.
fn ordered_result(compiler: &mut ExprCompiler<'_, '_>, op: BinaryOp) -> Flag {
    match op {
        BinaryOp::Lt => FixedFlag::Lt.into(),
        BinaryOp::Le => {
            let (lt, eq) = (Flag::from(FixedFlag::Lt), Flag::from(FixedFlag::Eq));
            compiler.em().emit(Opcode::FlagOr, ops![lt, eq]);
            FixedFlag::Lt.into()
        }
        BinaryOp::Ne | BinaryOp::CaseNe | BinaryOp::WildNe => invert(compiler, FixedFlag::Eq),
        _ => FixedFlag::Eq.into(),
    }
}

fn invert(compiler: &mut ExprCompiler<'_, '_>, flag: FixedFlag) -> Flag {
    let flag = Flag::from(flag);
    compiler.em().emit(Opcode::FlagInv, ops![flag]);
    flag
}

/// Handle equality: only a comparison against `null` is supported.
fn compare_handles(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
) -> CodegenResult<Flag> {
    let negate = match op {
        BinaryOp::Eq | BinaryOp::CaseEq => false,
        BinaryOp::Ne | BinaryOp::CaseNe => true,
        _ => {
            compiler.ctx().error(lhs.span, "ordered comparison of object handles");
            return Ok(FixedFlag::X.into());
        }
    };
    let other = match (&lhs.kind, &rhs.kind) {
        (_, ExprKind::Null) => lhs,
        (ExprKind::Null, _) => rhs,
        _ => {
            compiler
                .ctx()
                .error(lhs.span, "comparison of two object handles is not supported");
            return Ok(FixedFlag::X.into());
        }
    };

    match &other.kind {
        ExprKind::Signal { sig, word: None } => {
            compiler
                .em()
                .emit(Opcode::TestNul, ops![ExprCompiler::var(*sig)]);
        }
        ExprKind::Null => {
            let (eq, one) = (Flag::from(FixedFlag::Eq), Flag::from(FixedFlag::One));
            compiler.em().emit(Opcode::FlagMov, ops![eq, one]);
        }
        _ => {
            compiler.eval_obj(other)?;
            compiler.em().emit(Opcode::TestNulObj, vec![]);
        }
    }
    Ok(if negate {
        invert(compiler, FixedFlag::Eq)
    } else {
        FixedFlag::Eq.into()
    })
}
