//! Thread compiler for processes and subroutine bodies.
//!
//! [`ThreadCompiler`] turns one behavioral process, or one task or function
//! body, into a labeled block of thread code:
//!
//! ```text
//!     .scope S_0;
//! T_0 ;
//!     <body>
//!     %jmp T_0;              ; %end for initial and final
//!     .thread T_0;
//!
//!     .scope S_3;
//! TD_3 ;
//!     <body>
//!     %end;
//! ```
//!
//! After the body the compiler checks that every value stack is empty and
//! that no index register or flag is still held; a leftover means a
//! lowering bug, not a bad design.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = ThreadCompiler::for_process(&mut ctx, pid);
//! compiler.compile_body()?;
//! let lines = compiler.finish()?;
//! ctx.push_thread(lines);
//! ```

use tracing::{debug, trace};
use vvpgen_core::{
    CodegenError, CodegenResult, ProcessId, ProcessKind, ScopeId, Stmt, StmtKind,
};

use crate::bytecode::{Label, Line, Opcode, ThreadFlag};
use crate::context::GenContext;
use crate::emit::{CodeEmitter, Registers};
use crate::stmt::StmtCompiler;

/// What a thread is compiled from.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Process(ProcessId),
    Subroutine(ScopeId),
}

/// Compiles a single thread body.
pub struct ThreadCompiler<'a, 'd> {
    ctx: &'a mut GenContext<'d>,
    em: CodeEmitter,
    origin: Origin,
    scope: ScopeId,
    entry: Label,
}

impl<'a, 'd> ThreadCompiler<'a, 'd> {
    /// Compiler for an `initial`, `always` or `final` process.
    pub fn for_process(ctx: &'a mut GenContext<'d>, id: ProcessId) -> Self {
        let scope = ctx.design.process(id).scope;
        let number = ctx.next_thread_number();
        Self::new(ctx, Origin::Process(id), scope, Label::Thread(number), number)
    }

    /// Compiler for the body of the task or function `scope`.
    pub fn for_subroutine(ctx: &'a mut GenContext<'d>, scope: ScopeId) -> Self {
        let number = ctx.next_thread_number();
        Self::new(ctx, Origin::Subroutine(scope), scope, Label::TaskDef(scope), number)
    }

    fn new(
        ctx: &'a mut GenContext<'d>,
        origin: Origin,
        scope: ScopeId,
        entry: Label,
        number: u32,
    ) -> Self {
        let em = CodeEmitter::new(number, Registers::new(ctx.options.lookaside));
        Self {
            ctx,
            em,
            origin,
            scope,
            entry,
        }
    }

    /// Compile the body, entry label first.
    pub fn compile_body(&mut self) -> CodegenResult<()> {
        let design = self.ctx.design;
        debug!(entry = %self.entry, scope = %design.scope_path(self.scope), "compiling thread");

        self.em.push_line(Line::Scope(Label::Scope(self.scope)));
        self.em.emit_label(self.entry.clone());

        match self.origin {
            Origin::Process(id) => {
                let process = design.process(id);
                if matches!(process.kind, ProcessKind::Always | ProcessKind::AlwaysFf)
                    && !has_timing(&process.body)
                {
                    self.ctx.warning(
                        process.span,
                        "always process has no timing control and will loop forever",
                    );
                }
                StmtCompiler::new(self.ctx, &mut self.em, self.scope).compile(&process.body)?;
                if process.kind.repeats() {
                    self.em.jump(self.entry.clone());
                } else {
                    self.em.emit(Opcode::End, vec![]);
                }
            }
            Origin::Subroutine(scope) => {
                let body = design.scope(scope).body.as_ref();
                StmtCompiler::new(self.ctx, &mut self.em, self.scope).compile_opt(body)?;
                self.em.emit(Opcode::End, vec![]);
            }
        }
        Ok(())
    }

    /// Check the thread left no values or registers behind.
    pub fn verify(&self) -> CodegenResult<()> {
        let depths = self.em.depths();
        if depths != [0; 4] {
            return Err(CodegenError::internal(format!(
                "thread {} ends with stack depths {depths:?}",
                self.entry
            )));
        }
        let (words, flags) = self.em.regs.outstanding();
        if words != 0 || flags != 0 {
            return Err(CodegenError::internal(format!(
                "thread {} leaks {words} index registers and {flags} flags",
                self.entry
            )));
        }
        let mismatches = self.em.depth_mismatches();
        if mismatches != 0 {
            return Err(CodegenError::internal(format!(
                "thread {} reaches {mismatches} labels with differing stack depths",
                self.entry
            )));
        }
        Ok(())
    }

    /// Verify, then return the thread's lines ending with its `.thread`
    /// declaration, if it has one.
    pub fn finish(mut self) -> CodegenResult<Vec<Line>> {
        self.verify()?;
        if let Origin::Process(id) = self.origin {
            let flag = match self.ctx.design.process(id).kind {
                ProcessKind::AlwaysComb | ProcessKind::AlwaysLatch => Some(ThreadFlag::Push),
                ProcessKind::Final => Some(ThreadFlag::Final),
                _ => None,
            };
            self.em.push_line(Line::Thread {
                entry: self.entry.clone(),
                flag,
            });
        }
        let lines = self.em.finish();
        trace!(lines = lines.len(), "thread finished");
        Ok(lines)
    }

    pub fn entry(&self) -> &Label {
        &self.entry
    }
}

/// Whether `stmt` can suspend the thread somewhere along some path.
///
/// Task calls count, since a task body may wait.
pub fn has_timing(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Delay { .. } | StmtKind::Wait { .. } | StmtKind::WaitFork => true,
        StmtKind::UserTask(_) => true,
        StmtKind::Block { stmts, .. } => stmts.iter().any(has_timing),
        StmtKind::If {
            then, otherwise, ..
        } => then.as_deref().is_some_and(has_timing) || otherwise.as_deref().is_some_and(has_timing),
        StmtKind::Case { items, .. } => items
            .iter()
            .any(|item| item.body.as_ref().is_some_and(has_timing)),
        StmtKind::While { body, .. }
        | StmtKind::DoWhile { body, .. }
        | StmtKind::Forever(body)
        | StmtKind::Repeat { body, .. } => has_timing(body),
        StmtKind::For { init, step, body, .. } => {
            has_timing(body)
                || init.as_deref().is_some_and(has_timing)
                || step.as_deref().is_some_and(has_timing)
        }
        _ => false,
    }
}
