//! Text encodings shared by the structural and behavioral emitters.

pub mod constant;
pub mod delay;
pub mod modpath;
pub mod real;

pub use constant::{c4_literal, c4_repeat, c8_literal, const_literal};
pub use delay::{DelayTerm, delay_lines, undelayed};
pub use modpath::{PathSource, PendingModpath, modpath_line};
pub use real::cr_literal;
