//! VVP bytecode generator.
//!
//! Lowers an elaborated design graph into the textual program of a
//! stack-based simulation VM.
//!
//! ## Architecture
//!
//! - **Declarations**: every scope, signal, event, gate and device becomes a
//!   structural record; nexus operands are resolved on demand
//! - **Threads**: every process and every task or function body is lowered
//!   into a thread of stack-machine instructions
//!
//! ## Modules
//!
//! - [`bytecode`]: Opcodes, operands, labels and program lines
//! - [`codec`]: Constant, delay, module-path and real-number encodings
//! - [`context`]: State shared across one generation run
//! - [`diagnostics`]: Recoverable errors and warnings
//! - [`emit`]: Per-thread emitter with stack-depth tracking and registers
//! - [`expr`]: Expression and condition lowering
//! - [`generator`]: Whole-design driver and program assembly
//! - [`nexus`]: Nexus driver resolution
//! - [`options`]: Generator configuration
//! - [`scope`]: Declaration records of the scope hierarchy
//! - [`stmt`]: Statement lowering
//! - [`thread`]: Process and subroutine thread compilation

pub mod bytecode;
pub mod codec;
pub mod context;
pub mod diagnostics;
pub mod emit;
pub mod expr;
pub mod generator;
pub mod nexus;
pub mod options;
pub mod scope;
pub mod stmt;
pub mod thread;

pub use bytecode::{Instruction, Label, Line, Opcode, Operand, Program, ThreadFlag};
pub use context::GenContext;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use emit::{BreakError, CodeEmitter, Registers};
pub use expr::ExprCompiler;
pub use generator::{GenerationOutput, Generator};
pub use options::{CodegenOptions, DelaySelection, OptionsError};
pub use scope::ScopeEmitter;
pub use stmt::StmtCompiler;
pub use thread::ThreadCompiler;

// Re-export the fatal error type from core for convenience
pub use vvpgen_core::{CodegenError, CodegenResult};

use vvpgen_core::Design;

/// Generate the program for `design`.
///
/// Fatal errors abort with `Err`. Otherwise the returned output holds the
/// complete program and every diagnostic; check
/// [`GenerationOutput::succeeded`] for the run's status.
pub fn generate(design: &Design, options: &CodegenOptions) -> CodegenResult<GenerationOutput> {
    Generator::new(design, options).run()
}
