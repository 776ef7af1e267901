//! Loop statements.
//!
//! Each loop registers its `continue` and `break` targets with the
//! emitter's jump manager for the duration of its body.

use vvpgen_core::{CodegenResult, Expr, Stmt};

use super::StmtCompiler;
use crate::bytecode::Opcode;
use crate::emit::{FixedFlag, Flag, ops};

impl<'a, 'd> StmtCompiler<'a, 'd> {
    /// ```text
    /// T_top ;
    ///     <condition into f>
    ///     %jmp/0xz T_out, f
    ///     <body>
    ///     %jmp T_top
    /// T_out ;
    /// ```
    pub fn compile_while(&mut self, cond: &Expr, body: &Stmt) -> CodegenResult<()> {
        let top = self.em.local_label();
        let out = self.em.local_label();
        self.em.emit_label(top.clone());
        self.exit_unless(cond, &out)?;
        self.loop_body(body, &top, &out)?;
        self.jump_back(&top);
        self.em.emit_label(out);
        Ok(())
    }

    /// ```text
    /// T_top ;
    ///     <body>
    /// T_cond ;
    ///     <condition into f>
    ///     %jmp/1 T_top, f
    /// T_out ;
    /// ```
    pub fn compile_do_while(&mut self, body: &Stmt, cond: &Expr) -> CodegenResult<()> {
        let top = self.em.local_label();
        let next = self.em.local_label();
        let out = self.em.local_label();
        self.em.emit_label(top.clone());
        self.loop_body(body, &next, &out)?;
        self.em.emit_label(next);
        let flag = self.expr().eval_cond(cond)?;
        self.em.jump_if(Opcode::Jmp1, top, flag);
        self.em.regs.free_flag(flag);
        self.em.emit_label(out);
        Ok(())
    }

    pub fn compile_forever(&mut self, body: &Stmt) -> CodegenResult<()> {
        let top = self.em.local_label();
        let out = self.em.local_label();
        self.em.emit_label(top.clone());
        self.loop_body(body, &top, &out)?;
        self.jump_back(&top);
        self.em.emit_label(out);
        Ok(())
    }

    /// The count stays on the vector stack and is decremented each pass.
    ///
    /// ```text
    ///     <count>
    /// T_top ;
    ///     %dup/vec4
    ///     %cmpi/s 0, 0, w
    ///     %flag_or 5, 4          ; count <= 0
    ///     %jmp/1xz T_out, 5
    ///     %subi 1, 0, w
    ///     <body>
    ///     %jmp T_top
    /// T_out ;
    ///     %pop/vec4 1
    /// ```
    pub fn compile_repeat(&mut self, count: &Expr, body: &Stmt) -> CodegenResult<()> {
        let width = count.width.max(32);
        let top = self.em.local_label();
        let out = self.em.local_label();
        self.expr().eval_vec4(count, width)?;

        self.em.emit_label(top.clone());
        self.em.emit(Opcode::DupVec4, vec![]);
        let cmp = if count.signed {
            Opcode::CmpiS
        } else {
            Opcode::CmpiU
        };
        self.em.emit(cmp, ops![0u32, 0u32, width]);
        let lt = Flag::from(FixedFlag::Lt);
        let eq = Flag::from(FixedFlag::Eq);
        self.em.emit(Opcode::FlagOr, ops![lt, eq]);
        self.em.jump_if(Opcode::Jmp1xz, out.clone(), lt);
        self.em.emit(Opcode::Subi, ops![1u32, 0u32, width]);

        self.loop_body(body, &top, &out)?;
        self.jump_back(&top);
        self.em.emit_label(out);
        self.em.emit(Opcode::PopVec4, ops![1u32]);
        Ok(())
    }

    /// ```text
    ///     <init>
    /// T_top ;
    ///     <condition into f>
    ///     %jmp/0xz T_out, f
    ///     <body>
    /// T_step ;
    ///     <step>
    ///     %jmp T_top
    /// T_out ;
    /// ```
    pub fn compile_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        step: Option<&Stmt>,
        body: &Stmt,
    ) -> CodegenResult<()> {
        self.compile_opt(init)?;
        let top = self.em.local_label();
        let next = self.em.local_label();
        let out = self.em.local_label();

        self.em.emit_label(top.clone());
        if let Some(cond) = cond {
            self.exit_unless(cond, &out)?;
        }
        self.loop_body(body, &next, &out)?;
        self.em.emit_label(next);
        self.compile_opt(step)?;
        self.jump_back(&top);
        self.em.emit_label(out);
        Ok(())
    }

    /// Leave the loop unless the condition is true.
    fn exit_unless(&mut self, cond: &Expr, out: &crate::bytecode::Label) -> CodegenResult<()> {
        let flag = self.expr().eval_cond(cond)?;
        self.em.jump_if(Opcode::Jmp0xz, out.clone(), flag);
        self.em.regs.free_flag(flag);
        Ok(())
    }

    fn loop_body(
        &mut self,
        body: &Stmt,
        next: &crate::bytecode::Label,
        out: &crate::bytecode::Label,
    ) -> CodegenResult<()> {
        self.em.jumps.enter_loop(next.clone(), out.clone());
        let result = self.compile(body);
        self.em.jumps.exit_loop();
        result
    }

    fn jump_back(&mut self, top: &crate::bytecode::Label) {
        if self.em.is_reachable() {
            self.em.jump(top.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::stmt::test_support::compile;
    use vvpgen_core::{
        AssignOp, BinaryOp, DataType, Design, DesignBuilder, Expr, LValue, NetKind, ScopeKind,
        SignalId, Stmt, StmtKind, ValueType,
    };

    fn design() -> (Design, SignalId) {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let i = b.add_signal(top, "i", NetKind::Reg, DataType::Logic, 8);
        (b.finish(), i)
    }

    fn incr(i: SignalId) -> Stmt {
        Stmt::new(StmtKind::Assign {
            lvals: vec![LValue::whole(i, 8)],
            rval: Expr::uint(1, 8),
            op: Some(AssignOp::Add),
        })
    }

    fn below(i: SignalId, n: u64) -> Expr {
        Expr::binary(
            BinaryOp::Lt,
            Expr::signal(i, ValueType::Logic, 8, false),
            Expr::uint(n, 8),
            1,
        )
    }

    #[test]
    fn while_loop_layout() {
        let (design, i) = design();
        let stmt = Stmt::new(StmtKind::While {
            cond: below(i, 4),
            body: Box::new(incr(i)),
        });
        let text = compile(&design, &stmt);
        assert_eq!(text[0], "T_0.0 ;");
        assert_eq!(text[3], "%jmp/0xz T_0.1, 5;");
        assert_eq!(text[text.len() - 2], "%jmp T_0.0;");
        assert_eq!(text[text.len() - 1], "T_0.1 ;");
    }

    #[test]
    fn break_and_continue_target_the_innermost_loop() {
        let (design, i) = design();
        let body = Stmt::block(vec![
            Stmt::new(StmtKind::If {
                cond: below(i, 2),
                then: Some(Box::new(Stmt::new(StmtKind::Continue))),
                otherwise: None,
            }),
            Stmt::new(StmtKind::Break),
        ]);
        let stmt = Stmt::new(StmtKind::For {
            init: None,
            cond: None,
            step: Some(Box::new(incr(i))),
            body: Box::new(body),
        });
        let text = compile(&design, &stmt);
        // top = T_0.0, step = T_0.1, out = T_0.2
        assert!(text.contains(&"%jmp T_0.1;".to_string()));
        assert!(text.contains(&"%jmp T_0.2;".to_string()));
        assert!(text.contains(&"T_0.1 ;".to_string()));
    }

    #[test]
    fn repeat_keeps_its_count_on_the_stack() {
        let (design, i) = design();
        let stmt = Stmt::new(StmtKind::Repeat {
            count: Expr::uint(3, 8),
            body: Box::new(incr(i)),
        });
        let text = compile(&design, &stmt);
        assert_eq!(
            text[..7],
            [
                "%pushi/vec4 3, 0, 32;",
                "T_0.0 ;",
                "%dup/vec4;",
                "%cmpi/u 0, 0, 32;",
                "%flag_or 5, 4;",
                "%jmp/1xz T_0.1, 5;",
                "%subi 1, 0, 32;",
            ]
        );
        assert_eq!(text.last().map(String::as_str), Some("%pop/vec4 1;"));
    }

    #[test]
    fn do_while_tests_at_the_bottom() {
        let (design, i) = design();
        let stmt = Stmt::new(StmtKind::DoWhile {
            body: Box::new(incr(i)),
            cond: below(i, 4),
        });
        let text = compile(&design, &stmt);
        assert_eq!(text[0], "T_0.0 ;");
        assert!(text.contains(&"%jmp/1 T_0.0, 5;".to_string()));
    }
}
