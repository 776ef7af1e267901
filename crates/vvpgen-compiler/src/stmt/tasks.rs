//! System and user task calls.

use vvpgen_core::{CodegenError, CodegenResult, Expr, ScopeId, ScopeKind, Span};

use super::StmtCompiler;
use crate::bytecode::{Label, Opcode};
use crate::emit::ops;
use crate::expr::{SysResult, compile_sys_call, queue_push};

impl<'a, 'd> StmtCompiler<'a, 'd> {
    /// A system task such as `$display`. Queue pushes are lowered inline.
    pub fn compile_sys_task(&mut self, name: &str, args: &[Expr], span: Span) -> CodegenResult<()> {
        match name {
            "$push_back" | "$push_front" => queue_push(&mut self.expr(), name, args, span),
            _ => compile_sys_call(&mut self.expr(), name, args, span, SysResult::Void),
        }
    }

    /// Call of a user task. Arguments are passed by assignments to the
    /// task's ports around the call.
    ///
    /// ```text
    ///     %alloc S_t              ; automatic tasks only
    ///     %fork TD_t, S_t
    ///     %join
    ///     %free S_t
    /// ```
    pub fn compile_user_task(&mut self, task: ScopeId, span: Span) -> CodegenResult<()> {
        let design = self.design();
        let scope = design.scope(task);
        if scope.kind != ScopeKind::Task {
            return Err(CodegenError::invariant(
                format!("{} is not a task", design.scope_path(task)),
                span,
            ));
        }
        let automatic = scope.is_automatic();
        if automatic {
            self.em.emit(Opcode::Alloc, ops![Label::Scope(task)]);
        }
        self.em
            .emit(Opcode::Fork, ops![Label::TaskDef(task), Label::Scope(task)]);
        self.em.emit(Opcode::Join, vec![]);
        if automatic {
            self.em.emit(Opcode::Free, ops![Label::Scope(task)]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::stmt::test_support::compile;
    use crate::stmt::StmtCompiler;
    use vvpgen_core::{
        CodegenError, DataType, DesignBuilder, Expr, NetKind, ScopeFlags, ScopeKind, Stmt,
        StmtKind, ValueType,
    };

    #[test]
    fn static_and_automatic_task_calls() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let t = b.add_scope("t", ScopeKind::Task, Some(top));
        let at = b.add_scope("at", ScopeKind::Task, Some(top));
        b.scope_mut(at).flags |= ScopeFlags::AUTOMATIC;
        let design = b.finish();

        assert_eq!(
            compile(&design, &Stmt::new(StmtKind::UserTask(t))),
            vec!["%fork TD_1, S_1;", "%join;"]
        );
        assert_eq!(
            compile(&design, &Stmt::new(StmtKind::UserTask(at))),
            vec!["%alloc S_2;", "%fork TD_2, S_2;", "%join;", "%free S_2;"]
        );
    }

    #[test]
    fn calling_a_module_is_fatal() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let design = b.finish();
        let opts = crate::options::CodegenOptions::default();
        let mut ctx = crate::context::GenContext::new(&design, &opts);
        let mut em = crate::emit::CodeEmitter::new(0, crate::emit::Registers::default());
        let err = StmtCompiler::new(&mut ctx, &mut em, top)
            .compile(&Stmt::new(StmtKind::UserTask(top)))
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvariantViolation { .. }));
    }

    #[test]
    fn display_and_queue_push() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let q = b.add_signal(
            top,
            "q",
            NetKind::Reg,
            DataType::Queue(Box::new(DataType::Logic), None),
            8,
        );
        let design = b.finish();

        let display = Stmt::new(StmtKind::SysTask {
            name: "$display".into(),
            args: vec![Expr::string("hello")],
        });
        assert_eq!(
            compile(&design, &display),
            vec!["%vpi_call 0 0 \"$display\", \"hello\" {0 0 0};"]
        );

        let push = Stmt::new(StmtKind::SysTask {
            name: "$push_back".into(),
            args: vec![
                Expr::signal(q, ValueType::Queue, 8, false),
                Expr::uint(5, 8),
            ],
        });
        let text = compile(&design, &push);
        assert_eq!(text.last().map(String::as_str), Some("%store/qb/v v0_0, 4, 8;"));
    }
}
