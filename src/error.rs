//! Errors of the driver-facing entry points.

use std::path::PathBuf;

use thiserror::Error;
use vvpgen_compiler::OptionsError;
use vvpgen_core::CodegenError;

/// Errors that stop a run before or while the program is written.
#[derive(Debug, Error)]
pub enum VvpError {
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("no output file given")]
    NoOutput,

    #[error("unable to open {} for output: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type VvpResult<T> = Result<T, VvpError>;
