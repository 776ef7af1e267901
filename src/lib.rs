//! Back end that turns an elaborated hardware design into a VVP program.
//!
//! - [`graph`]: the design-graph model and [`DesignBuilder`](graph::DesignBuilder)
//! - [`compiler`]: the code generator
//!
//! # Example
//!
//! ```ignore
//! use vvpgen::prelude::*;
//!
//! let output = generate(&design, &CodegenOptions::default())?;
//! output.program.write_to(&mut std::io::stdout())?;
//! ```

mod error;

pub use vvpgen_compiler as compiler;
pub use vvpgen_core as graph;

pub use error::{VvpError, VvpResult};
pub use vvpgen_compiler::{CodegenOptions, GenerationOutput, Program, generate};

use std::fs::File;
use std::io::{BufWriter, Write};

use tracing::{info, warn};
use vvpgen_core::Design;

// Re-export main types
pub mod prelude {
    pub use crate::error::{VvpError, VvpResult};
    pub use crate::{generate, run_with_flags, write_program};
    pub use vvpgen_compiler::{
        CodegenOptions, DelaySelection, Diagnostic, Diagnostics, GenerationOutput, Program,
        Severity,
    };
    pub use vvpgen_core::{CodegenError, Design, DesignBuilder};
}

/// Generate `design` and write the program text to `out`.
///
/// The text is written even when the run recorded errors; the returned
/// output tells whether it succeeded.
pub fn write_program(
    design: &Design,
    options: &CodegenOptions,
    out: &mut impl Write,
) -> VvpResult<GenerationOutput> {
    let output = generate(design, options)?;
    output
        .program
        .write_to(out)
        .map_err(vvpgen_core::CodegenError::from)?;
    Ok(output)
}

/// Entry point for a compiler driver: build the options from its
/// `key=value` flags, generate, and write to the `-o` file.
///
/// Every diagnostic is rendered to the log.
pub fn run_with_flags<'a, I>(design: &Design, flags: I) -> VvpResult<GenerationOutput>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let options = CodegenOptions::from_flags(flags)?;
    let path = options.output.clone().ok_or(VvpError::NoOutput)?;
    let file = File::create(&path).map_err(|source| VvpError::Create {
        path: path.clone(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    let output = write_program(design, &options, &mut out)?;
    out.flush().map_err(vvpgen_core::CodegenError::from)?;

    for diag in output.diagnostics.iter() {
        warn!("{}", diag.render(design));
    }
    info!(
        path = %path.display(),
        errors = output.diagnostics.error_count(),
        "program written"
    );
    Ok(output)
}
