//! Loop targets for `break` and `continue`.
//!
//! Tracks a stack of loop contexts so nested loops resolve to their own
//! labels. Fork branches run as separate threads and must not jump into
//! the enclosing thread, so a branch starts from an empty stack.

use thiserror::Error;

use crate::bytecode::Label;

/// Manages jump targets for loop control.
#[derive(Debug, Default)]
pub struct JumpManager {
    /// Innermost loop last.
    loops: Vec<LoopContext>,
}

#[derive(Debug, Clone)]
struct LoopContext {
    continue_label: Label,
    break_label: Label,
}

/// Loop control used where it has no target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BreakError {
    #[error("continue statement not inside a loop")]
    ContinueOutsideLoop,
    #[error("break statement not inside a loop")]
    BreakOutsideLoop,
}

impl JumpManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_loop(&mut self, continue_label: Label, break_label: Label) {
        self.loops.push(LoopContext {
            continue_label,
            break_label,
        });
    }

    pub fn exit_loop(&mut self) {
        self.loops.pop();
    }

    pub fn in_loop(&self) -> bool {
        !self.loops.is_empty()
    }

    pub fn loop_depth(&self) -> usize {
        self.loops.len()
    }

    pub fn break_target(&self) -> Result<Label, BreakError> {
        self.loops
            .last()
            .map(|ctx| ctx.break_label.clone())
            .ok_or(BreakError::BreakOutsideLoop)
    }

    pub fn continue_target(&self) -> Result<Label, BreakError> {
        self.loops
            .last()
            .map(|ctx| ctx.continue_label.clone())
            .ok_or(BreakError::ContinueOutsideLoop)
    }

    /// Detach the current loop stack, leaving it empty.
    pub fn suspend(&mut self) -> JumpManager {
        std::mem::take(self)
    }

    /// Reinstate a stack taken by [`suspend`](Self::suspend).
    pub fn resume(&mut self, saved: JumpManager) {
        *self = saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: u32) -> (Label, Label) {
        (
            Label::Local { thread: 0, local: n },
            Label::Local {
                thread: 0,
                local: n + 1,
            },
        )
    }

    #[test]
    fn new_manager_not_in_loop() {
        let manager = JumpManager::new();
        assert!(!manager.in_loop());
        assert_eq!(manager.break_target(), Err(BreakError::BreakOutsideLoop));
        assert_eq!(
            manager.continue_target(),
            Err(BreakError::ContinueOutsideLoop)
        );
    }

    #[test]
    fn nested_loops_resolve_innermost() {
        let mut manager = JumpManager::new();
        let (c0, b0) = labels(0);
        let (c1, b1) = labels(10);
        manager.enter_loop(c0.clone(), b0.clone());
        manager.enter_loop(c1.clone(), b1);
        assert_eq!(manager.loop_depth(), 2);
        assert_eq!(manager.continue_target(), Ok(c1));

        manager.exit_loop();
        assert_eq!(manager.continue_target(), Ok(c0));
        assert_eq!(manager.break_target(), Ok(b0));
    }

    #[test]
    fn suspended_stack_is_restored() {
        let mut manager = JumpManager::new();
        let (c, b) = labels(0);
        manager.enter_loop(c, b.clone());

        let saved = manager.suspend();
        assert!(!manager.in_loop());
        manager.resume(saved);
        assert_eq!(manager.break_target(), Ok(b));
    }
}
