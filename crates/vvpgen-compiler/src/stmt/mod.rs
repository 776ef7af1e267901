//! Statement lowering.
//!
//! The [`StmtCompiler`] turns process, task and function bodies into
//! thread code:
//! - blocks, including the fork/join forms
//! - `if`, `case` and the loop statements with `break`/`continue`
//! - blocking, non-blocking and procedural continuous assignment
//! - delays, event waits and triggers
//! - system and user task calls
//!
//! Every statement leaves the value stacks as it found them. Index
//! registers and flags taken while lowering a statement are returned before
//! the statement ends.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = StmtCompiler::new(&mut ctx, &mut em, scope);
//! compiler.compile(&process.body)?;
//! ```

mod assign;
mod block;
mod case;
mod force;
mod if_stmt;
mod loops;
mod lval;
mod nb_assign;
mod tasks;
mod timing;

use vvpgen_core::{CodegenError, CodegenResult, Design, Span, Stmt, StmtKind};

use crate::bytecode::Opcode;
use crate::context::GenContext;
use crate::emit::{CodeEmitter, Held, ops};
use crate::expr::ExprCompiler;

/// Lowers statements into one thread's instruction stream.
pub struct StmtCompiler<'a, 'd> {
    ctx: &'a mut GenContext<'d>,
    em: &'a mut CodeEmitter,
    /// Scope the code runs in.
    scope: vvpgen_core::ScopeId,
}

impl<'a, 'd> StmtCompiler<'a, 'd> {
    pub fn new(
        ctx: &'a mut GenContext<'d>,
        em: &'a mut CodeEmitter,
        scope: vvpgen_core::ScopeId,
    ) -> Self {
        Self { ctx, em, scope }
    }

    /// Compile one statement.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&mut self, stmt: &Stmt) -> CodegenResult<()> {
        self.file_line(stmt);

        match &stmt.kind {
            StmtKind::Block { kind, scope, stmts } => self.compile_block(*kind, *scope, stmts),
            StmtKind::Assign { lvals, rval, op } => {
                self.compile_assign(lvals, rval, *op, stmt.span)
            }
            StmtKind::AssignNb {
                lvals,
                rval,
                delay,
                event,
            } => self.compile_assign_nb(lvals, rval, delay.as_ref(), event.as_ref(), stmt.span),
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => self.compile_if(cond, then.as_deref(), otherwise.as_deref()),
            StmtKind::Case {
                kind,
                quality,
                selector,
                items,
            } => self.compile_case(*kind, *quality, selector, items, stmt.span),
            StmtKind::While { cond, body } => self.compile_while(cond, body),
            StmtKind::DoWhile { body, cond } => self.compile_do_while(body, cond),
            StmtKind::Forever(body) => self.compile_forever(body),
            StmtKind::Repeat { count, body } => self.compile_repeat(count, body),
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => self.compile_for(init.as_deref(), cond.as_ref(), step.as_deref(), body),
            StmtKind::Break => self.compile_break(stmt.span),
            StmtKind::Continue => self.compile_continue(stmt.span),
            StmtKind::Delay { amount, body } => self.compile_delay(amount, body.as_deref()),
            StmtKind::Wait { events, body } => {
                self.compile_wait(events, body.as_deref(), stmt.span)
            }
            StmtKind::WaitFork => {
                self.em.emit(Opcode::WaitFork, vec![]);
                Ok(())
            }
            StmtKind::Trigger(event) => self.compile_trigger(*event),
            StmtKind::Disable(scope) => self.compile_disable(*scope),
            StmtKind::DisableFork => {
                self.em.emit(Opcode::DisableFork, vec![]);
                Ok(())
            }
            StmtKind::SysTask { name, args } => self.compile_sys_task(name, args, stmt.span),
            StmtKind::UserTask(task) => self.compile_user_task(*task, stmt.span),
            StmtKind::ContAssign { lvals, rval } => self.compile_cassign(lvals, rval, stmt.span),
            StmtKind::Deassign(lvals) => self.compile_deassign(lvals, stmt.span),
            StmtKind::Force { lvals, rval } => self.compile_force(lvals, rval, stmt.span),
            StmtKind::Release(lvals) => self.compile_release(lvals, stmt.span),
            StmtKind::Noop => Ok(()),
        }
    }

    /// Compile an optional statement.
    pub(crate) fn compile_opt(&mut self, stmt: Option<&Stmt>) -> CodegenResult<()> {
        match stmt {
            Some(stmt) => self.compile(stmt),
            None => Ok(()),
        }
    }

    fn compile_break(&mut self, span: Span) -> CodegenResult<()> {
        let target = self
            .em
            .jumps
            .break_target()
            .map_err(|e| CodegenError::invariant(e.to_string(), span))?;
        self.em.jump(target);
        Ok(())
    }

    fn compile_continue(&mut self, span: Span) -> CodegenResult<()> {
        let target = self
            .em
            .jumps
            .continue_target()
            .map_err(|e| CodegenError::invariant(e.to_string(), span))?;
        self.em.jump(target);
        Ok(())
    }

    /// `%file_line` marker in front of a statement.
    fn file_line(&mut self, stmt: &Stmt) {
        if !self.ctx.options.fileline || !stmt.span.is_known() {
            return;
        }
        if matches!(stmt.kind, StmtKind::Block { .. } | StmtKind::Noop) {
            return;
        }
        let (file, line) = ExprCompiler::location(stmt.span);
        self.em
            .emit(Opcode::FileLine, ops![file, line, describe(&stmt.kind)]);
    }

    /// Run `f` with a fresh [`Held`] set; everything it tracks is returned
    /// once `f` finishes, on the error path as well.
    pub(crate) fn holding<T>(
        &mut self,
        f: impl FnOnce(&mut Self, &mut Held) -> CodegenResult<T>,
    ) -> CodegenResult<T> {
        let mut held = Held::default();
        let result = f(self, &mut held);
        self.em.regs.release(held);
        result
    }

    /// An expression compiler sharing this compiler's state.
    pub(crate) fn expr(&mut self) -> ExprCompiler<'_, 'd> {
        ExprCompiler::new(self.ctx, self.em, self.scope)
    }

    #[inline]
    fn design(&self) -> &'d Design {
        self.ctx.design
    }
}

/// Short description of a statement for line markers.
fn describe(kind: &StmtKind) -> &'static str {
    match kind {
        StmtKind::Block { .. } => "block",
        StmtKind::Assign { .. } => "Blocking assignment",
        StmtKind::AssignNb { .. } => "Non-blocking assignment",
        StmtKind::If { .. } => "If statement",
        StmtKind::Case { .. } => "Case statement",
        StmtKind::While { .. } => "While statement",
        StmtKind::DoWhile { .. } => "Do/while statement",
        StmtKind::Forever(_) => "Forever statement",
        StmtKind::Repeat { .. } => "Repeat statement",
        StmtKind::For { .. } => "For statement",
        StmtKind::Break => "Break statement",
        StmtKind::Continue => "Continue statement",
        StmtKind::Delay { .. } => "Delay statement",
        StmtKind::Wait { .. } => "Event wait",
        StmtKind::WaitFork => "Wait fork",
        StmtKind::Trigger(_) => "Event trigger",
        StmtKind::Disable(_) => "Disable statement",
        StmtKind::DisableFork => "Disable fork",
        StmtKind::SysTask { .. } => "System task call",
        StmtKind::UserTask(_) => "Task call",
        StmtKind::ContAssign { .. } => "Assign statement",
        StmtKind::Deassign(_) => "Deassign statement",
        StmtKind::Force { .. } => "Force statement",
        StmtKind::Release(_) => "Release statement",
        StmtKind::Noop => "Null statement",
    }
}
