//! If/else.

use vvpgen_core::{CodegenResult, Expr, Stmt};

use super::StmtCompiler;
use crate::bytecode::Opcode;

impl<'a, 'd> StmtCompiler<'a, 'd> {
    /// Compile an if statement.
    ///
    /// An unknown condition takes the else arm.
    ///
    /// ```text
    ///     <condition into f>
    ///     %jmp/0xz T_else, f
    ///     <then>
    ///     %jmp T_out
    /// T_else ;
    ///     <else>
    /// T_out ;
    /// ```
    pub fn compile_if(
        &mut self,
        cond: &Expr,
        then: Option<&Stmt>,
        otherwise: Option<&Stmt>,
    ) -> CodegenResult<()> {
        let flag = self.expr().eval_cond(cond)?;
        let out = self.em.local_label();

        match (then, otherwise) {
            (None, None) => self.em.regs.free_flag(flag),
            (Some(then), None) => {
                self.em.jump_if(Opcode::Jmp0xz, out.clone(), flag);
                self.em.regs.free_flag(flag);
                self.compile(then)?;
            }
            (None, Some(otherwise)) => {
                self.em.jump_if(Opcode::Jmp1, out.clone(), flag);
                self.em.regs.free_flag(flag);
                self.compile(otherwise)?;
            }
            (Some(then), Some(otherwise)) => {
                let else_label = self.em.local_label();
                self.em.jump_if(Opcode::Jmp0xz, else_label.clone(), flag);
                self.em.regs.free_flag(flag);
                self.compile(then)?;
                if self.em.is_reachable() {
                    self.em.jump(out.clone());
                }
                self.em.emit_label(else_label);
                self.compile(otherwise)?;
            }
        }
        self.em.emit_label(out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::stmt::test_support::compile;
    use vvpgen_core::{
        BinaryOp, DataType, Design, DesignBuilder, Expr, LValue, NetKind, ScopeKind, SignalId,
        Stmt, StmtKind, ValueType,
    };

    fn design() -> (Design, SignalId, SignalId) {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let a = b.add_signal(top, "a", NetKind::Reg, DataType::Logic, 4);
        let y = b.add_signal(top, "y", NetKind::Reg, DataType::Logic, 1);
        (b.finish(), a, y)
    }

    fn set(y: SignalId, v: u64) -> Box<Stmt> {
        Box::new(Stmt::assign(LValue::whole(y, 1), Expr::uint(v, 1)))
    }

    #[test]
    fn if_else_layout() {
        let (design, a, y) = design();
        let cond = Expr::binary(
            BinaryOp::Eq,
            Expr::signal(a, ValueType::Logic, 4, false),
            Expr::uint(3, 4),
            1,
        );
        let stmt = Stmt::new(StmtKind::If {
            cond,
            then: Some(set(y, 1)),
            otherwise: Some(set(y, 0)),
        });
        assert_eq!(
            compile(&design, &stmt),
            vec![
                "%load/vec4 v0_0;",
                "%cmpi/e 3, 0, 4;",
                "%jmp/0xz T_0.1, 4;",
                "%pushi/vec4 1, 0, 1;",
                "%store/vec4 v1_0, 0, 1;",
                "%jmp T_0.0;",
                "T_0.1 ;",
                "%pushi/vec4 0, 0, 1;",
                "%store/vec4 v1_0, 0, 1;",
                "T_0.0 ;",
            ]
        );
    }

    #[test]
    fn allocated_flags_are_returned() {
        let (design, a, y) = design();
        let stmt = Stmt::new(StmtKind::If {
            cond: Expr::signal(a, ValueType::Logic, 4, false),
            then: Some(set(y, 1)),
            otherwise: None,
        });
        let text = compile(&design, &stmt);
        assert_eq!(text[2], "%flag_set/vec4 8;");
        assert_eq!(text[3], "%jmp/0xz T_0.0, 8;");
    }

    #[test]
    fn else_only_jumps_on_true() {
        let (design, a, y) = design();
        let stmt = Stmt::new(StmtKind::If {
            cond: Expr::signal(a, ValueType::Logic, 4, false),
            then: None,
            otherwise: Some(set(y, 0)),
        });
        let text = compile(&design, &stmt);
        assert_eq!(text[3], "%jmp/1 T_0.0, 8;");
    }
}
