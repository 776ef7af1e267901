//! Bytecode model of the generated program.
//!
//! - [`Opcode`] - the instruction set, with per-stack effects
//! - [`Label`] / [`Operand`] - symbolic names and instruction arguments
//! - [`Instruction`], [`Line`], [`Program`] - the assembled text

mod opcode;
mod operand;
mod program;

pub use opcode::{Opcode, StackEffect};
pub use operand::{Label, Operand, escape_string};
pub use program::{Instruction, Line, Program, ThreadFlag};
