//! Concatenation and replication.

use vvpgen_core::{CodegenResult, Domain, Expr};

use super::ExprCompiler;
use crate::bytecode::Opcode;
use crate::emit::ops;

/// Widest `%concat/vec4` the machine accepts.
const MAX_ARITY: usize = 4;

/// `{repeat{parts...}}`.
pub(super) fn compile_concat(
    compiler: &mut ExprCompiler<'_, '_>,
    parts: &[Expr],
    repeat: u32,
    expr: &Expr,
) -> CodegenResult<()> {
    if parts.is_empty() || repeat == 0 {
        compiler.unsupported(
            expr.span,
            "concatenation with no parts",
            Domain::Vec4,
            expr.width,
        );
        return Ok(());
    }

    concat_tree(compiler, parts)?;
    if repeat > 1 {
        compiler.em().emit(Opcode::Replicate, ops![repeat]);
    }
    let width: u32 = parts.iter().map(|p| p.width).sum::<u32>() * repeat;
    compiler.resize(width, expr.width, false);
    Ok(())
}

/// Concatenate `parts` into one value with instructions of at most four
/// operands, grouping wider lists into a balanced tree.
fn concat_tree(compiler: &mut ExprCompiler<'_, '_>, parts: &[Expr]) -> CodegenResult<()> {
    if parts.len() <= MAX_ARITY {
        for part in parts {
            compiler.eval_vec4(part, part.width)?;
        }
        if parts.len() > 1 {
            compiler.em().emit(Opcode::ConcatVec4, ops![parts.len()]);
        }
        return Ok(());
    }

    let base = parts.len() / MAX_ARITY;
    let extra = parts.len() % MAX_ARITY;
    let mut start = 0;
    for group in 0..MAX_ARITY {
        let len = base + usize::from(group < extra);
        concat_tree(compiler, &parts[start..start + len])?;
        start += len;
    }
    compiler.em().emit(Opcode::ConcatVec4, ops![MAX_ARITY]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::test_support::{text, with_compiler};
    use vvpgen_core::{Design, ExprKind, ValueType};

    fn concat(parts: Vec<Expr>, repeat: u32) -> Expr {
        let width = parts.iter().map(|p| p.width).sum::<u32>() * repeat;
        Expr::new(
            ExprKind::Concat { parts, repeat },
            ValueType::Logic,
            width,
            false,
        )
    }

    fn run(e: &Expr) -> crate::emit::CodeEmitter {
        let design = Design::default();
        with_compiler(&design, |ctx, em, scope| {
            ExprCompiler::new(ctx, em, scope).eval_vec4(e, e.width).unwrap();
        })
    }

    #[test]
    fn small_concat_is_one_instruction() {
        let e = concat(vec![Expr::uint(1, 2), Expr::uint(2, 3)], 1);
        assert_eq!(
            text(&run(&e)),
            vec!["%pushi/vec4 1, 0, 2;", "%pushi/vec4 2, 0, 3;", "%concat/vec4 2;"]
        );
    }

    #[test]
    fn wide_concat_is_a_tree_of_four() {
        let parts: Vec<Expr> = (0..9).map(|i| Expr::uint(i, 1)).collect();
        let e = concat(parts, 1);
        let em = run(&e);
        let t = text(&em);
        let concats: Vec<&String> = t.iter().filter(|l| l.starts_with("%concat/vec4")).collect();
        // Groups of 3, 2, 2, 2 under one root.
        assert_eq!(
            concats,
            vec![
                "%concat/vec4 3;",
                "%concat/vec4 2;",
                "%concat/vec4 2;",
                "%concat/vec4 2;",
                "%concat/vec4 4;",
            ]
        );
        assert_eq!(em.depth(Domain::Vec4), 1);
    }

    #[test]
    fn replication_follows_the_parts() {
        let e = concat(vec![Expr::uint(1, 1), Expr::uint(0, 1)], 3);
        let t = text(&run(&e));
        assert_eq!(t.last().map(String::as_str), Some("%replicate 3;"));
    }

    #[test]
    fn zero_replication_is_reported() {
        let design = Design::default();
        let e = Expr::new(
            ExprKind::Concat {
                parts: vec![Expr::uint(1, 1)],
                repeat: 0,
            },
            ValueType::Logic,
            1,
            false,
        );
        let opts = crate::options::CodegenOptions::default();
        let mut ctx = crate::context::GenContext::new(&design, &opts);
        let mut em = crate::emit::CodeEmitter::new(0, crate::emit::Registers::default());
        ExprCompiler::new(&mut ctx, &mut em, vvpgen_core::ScopeId::new(0))
            .eval_vec4(&e, 1)
            .unwrap();
        assert_eq!(ctx.diags.error_count(), 1);
        assert_eq!(em.depth(Domain::Vec4), 1);
    }
}
