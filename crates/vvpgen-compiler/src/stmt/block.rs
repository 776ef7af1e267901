//! Sequential blocks and fork/join.

use vvpgen_core::{BlockKind, CodegenResult, ScopeId, Stmt};

use super::StmtCompiler;
use crate::bytecode::{Label, Line, Opcode};
use crate::emit::ops;

impl<'a, 'd> StmtCompiler<'a, 'd> {
    /// Compile a block.
    ///
    /// A named block of an automatic scope gets its own frame around the
    /// body. Fork blocks spawn one child thread per statement:
    ///
    /// ```text
    ///     %fork t_1, S_fork
    ///     %fork t_2, S_fork
    ///     %join                   ; one per child, or %join/detach
    ///     %join
    ///     %jmp t_0
    /// t_1 ;
    ///     <first statement>
    ///     %end
    /// t_2 ;
    ///     <second statement>
    ///     %end
    /// t_0 ;
    /// ```
    pub fn compile_block(
        &mut self,
        kind: BlockKind,
        scope: Option<ScopeId>,
        stmts: &[Stmt],
    ) -> CodegenResult<()> {
        let automatic = scope.is_some_and(|s| self.design().scope(s).is_automatic());
        if automatic && let Some(s) = scope {
            self.em.emit(Opcode::Alloc, ops![Label::Scope(s)]);
        }

        if kind.is_fork() {
            self.compile_fork(kind, scope.unwrap_or(self.scope), stmts)?;
        } else {
            for stmt in stmts {
                self.compile(stmt)?;
            }
        }

        if automatic && let Some(s) = scope {
            self.em.emit(Opcode::Free, ops![Label::Scope(s)]);
        }
        Ok(())
    }

    fn compile_fork(
        &mut self,
        kind: BlockKind,
        fork_scope: ScopeId,
        stmts: &[Stmt],
    ) -> CodegenResult<()> {
        if stmts.is_empty() {
            return Ok(());
        }
        let skip = self.ctx.transient_label();
        let branches: Vec<Label> = stmts.iter().map(|_| self.ctx.transient_label()).collect();

        for branch in &branches {
            self.em
                .emit(Opcode::Fork, ops![branch.clone(), Label::Scope(fork_scope)]);
        }
        let count = stmts.len() as u32;
        match kind {
            BlockKind::Fork => {
                for _ in 0..count {
                    self.em.emit(Opcode::Join, vec![]);
                }
            }
            BlockKind::ForkJoinAny => {
                self.em.emit(Opcode::Join, vec![]);
                if count > 1 {
                    self.em.emit(Opcode::JoinDetach, ops![count - 1]);
                }
            }
            BlockKind::ForkJoinNone => self.em.emit(Opcode::JoinDetach, ops![count]),
            BlockKind::Sequential => {}
        }
        self.em.jump(skip.clone());

        // Children are separate threads: they start with empty stacks and
        // cannot break out of a loop of the parent.
        let saved_depth = self.em.depths();
        let saved_jumps = self.em.jumps.suspend();
        for (stmt, branch) in stmts.iter().zip(branches) {
            self.em.begin_branch(branch);
            if fork_scope != self.scope {
                self.em.push_line(Line::Scope(Label::Scope(fork_scope)));
            }
            StmtCompiler::new(self.ctx, self.em, fork_scope).compile(stmt)?;
            self.em.emit(Opcode::End, vec![]);
        }
        self.em.jumps.resume(saved_jumps);
        self.em.restore_depth(saved_depth);

        if fork_scope != self.scope {
            self.em.push_line(Line::Scope(Label::Scope(self.scope)));
        }
        self.em.emit_label(skip);
        Ok(())
    }
}
