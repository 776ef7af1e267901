//! Generator configuration.
//!
//! Options come either from the builder methods on [`CodegenOptions`] or
//! from the `key=value` flag map a compiler driver passes to its back ends
//! ([`CodegenOptions::from_flags`]).

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

/// Which of min:typ:max delays the design was elaborated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelaySelection {
    Minimum,
    #[default]
    Typical,
    Maximum,
}

impl DelaySelection {
    pub fn keyword(self) -> &'static str {
        match self {
            DelaySelection::Minimum => "MINIMUM",
            DelaySelection::Typical => "TYPICAL",
            DelaySelection::Maximum => "MAXIMUM",
        }
    }
}

impl FromStr for DelaySelection {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MIN" | "MINIMUM" => Ok(DelaySelection::Minimum),
            "TYP" | "TYPICAL" => Ok(DelaySelection::Typical),
            "MAX" | "MAXIMUM" => Ok(DelaySelection::Maximum),
            _ => Err(OptionsError::InvalidValue {
                key: "delay_selection".into(),
                value: s.into(),
            }),
        }
    }
}

/// A flag value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("unable to extract file/line information from string: {0}")]
    BadFileLine(String),
    #[error("extra characters '{extra}' included at end of file/line string: {value}")]
    TrailingFileLine { extra: String, value: String },
    #[error("invalid value '{value}' for option '{key}'")]
    InvalidValue { key: String, value: String },
}

/// Options controlling generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CodegenOptions {
    /// Where the program is written by the file-writing entry points.
    pub output: Option<PathBuf>,
    /// Emit `%file_line` markers before procedural statements.
    pub fileline: bool,
    /// Emit comments describing what is being drawn.
    pub debug_draw: bool,
    /// Reuse index registers already holding a needed constant.
    pub lookaside: bool,
    /// Interpreter for the `#!` line.
    pub executable: Option<String>,
    pub executable_args: String,
    pub version: String,
    pub version_tag: Option<String>,
    pub delay_selection: DelaySelection,
    /// Extension modules the runtime must load.
    pub vpi_modules: Vec<String>,
    /// Overrides the design's simulation precision.
    pub time_precision: Option<i32>,
    /// Emit run-time checks for `unique`/`priority` case statements.
    pub warn_unique: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            output: None,
            fileline: false,
            debug_draw: false,
            lookaside: true,
            executable: None,
            executable_args: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            version_tag: None,
            delay_selection: DelaySelection::default(),
            vpi_modules: vec!["system".into(), "vhdl_sys".into(), "v2005_math".into()],
            time_precision: None,
            warn_unique: true,
        }
    }
}

impl CodegenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_fileline(mut self, on: bool) -> Self {
        self.fileline = on;
        self
    }

    pub fn with_debug_draw(mut self, on: bool) -> Self {
        self.debug_draw = on;
        self
    }

    pub fn with_lookaside(mut self, on: bool) -> Self {
        self.lookaside = on;
        self
    }

    pub fn with_executable(mut self, exe: impl Into<String>) -> Self {
        self.executable = Some(exe.into());
        self
    }

    pub fn with_delay_selection(mut self, sel: DelaySelection) -> Self {
        self.delay_selection = sel;
        self
    }

    pub fn with_vpi_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vpi_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_time_precision(mut self, precision: i32) -> Self {
        self.time_precision = Some(precision);
        self
    }

    pub fn with_warn_unique(mut self, on: bool) -> Self {
        self.warn_unique = on;
        self
    }

    /// Build options from driver flags.
    ///
    /// Recognized keys: `-o`, `fileline`, `debug_flags`, `VVP_EXECUTABLE`,
    /// `VVP_EXTRA_ARGS`, `VPI_MODULE_LIST` (or `vpi_module`, repeatable),
    /// `DLY_SEL` (or `delay_selection`), `time_precision` and `warn_unique`.
    /// Other keys belong to other stages and are ignored.
    pub fn from_flags<'a, I>(flags: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut opts = Self::default();
        for (key, value) in flags {
            match key {
                "-o" => opts.output = Some(PathBuf::from(value)),
                "fileline" => opts.fileline = parse_fileline(value)?,
                "debug_flags" => opts.apply_debug_flags(value),
                "VVP_EXECUTABLE" => opts.executable = Some(value.to_string()),
                "VVP_EXTRA_ARGS" => opts.executable_args = value.to_string(),
                "VPI_MODULE_LIST" => {
                    opts.vpi_modules = value
                        .split(',')
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "vpi_module" => {
                    if !opts.vpi_modules.iter().any(|m| m == value) {
                        opts.vpi_modules.push(value.to_string());
                    }
                }
                "DLY_SEL" | "delay_selection" => opts.delay_selection = value.parse()?,
                "time_precision" => {
                    let precision = value.trim().parse().map_err(|_| OptionsError::InvalidValue {
                        key: key.into(),
                        value: value.into(),
                    })?;
                    opts.time_precision = Some(precision);
                }
                "warn_unique" => opts.warn_unique = !matches!(value.trim(), "0" | "false" | "off"),
                _ => debug!(key, "ignoring unrecognized flag"),
            }
        }
        Ok(opts)
    }

    fn apply_debug_flags(&mut self, flags: &str) {
        for flag in flags.split(',').filter(|f| !f.is_empty()) {
            match flag {
                "draw" => self.debug_draw = true,
                "no_lookaside" => self.lookaside = false,
                other => debug!(flag = other, "ignoring unknown debug flag"),
            }
        }
    }
}

/// Parse the integer `fileline` flag. Empty means off.
fn parse_fileline(value: &str) -> Result<bool, OptionsError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(false);
    }
    let digits = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(value.len(), |(i, _)| i);
    if digits == 0 || value[..digits].parse::<i64>().is_err() {
        return Err(OptionsError::BadFileLine(value.into()));
    }
    if digits < value.len() {
        return Err(OptionsError::TrailingFileLine {
            extra: value[digits..].into(),
            value: value.into(),
        });
    }
    Ok(value[..digits].parse::<i64>().map_or(false, |v| v != 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = CodegenOptions::default();
        assert!(!opts.fileline);
        assert!(opts.lookaside);
        assert_eq!(opts.delay_selection, DelaySelection::Typical);
    }

    #[test]
    fn flags_map_onto_options() {
        let opts = CodegenOptions::from_flags([
            ("-o", "out.vvp"),
            ("fileline", "1"),
            ("debug_flags", "draw,no_lookaside"),
            ("VPI_MODULE_LIST", "system,v2009"),
            ("DLY_SEL", "MAX"),
            ("iwidth", "32"),
        ])
        .unwrap();
        assert_eq!(opts.output, Some(PathBuf::from("out.vvp")));
        assert!(opts.fileline);
        assert!(opts.debug_draw);
        assert!(!opts.lookaside);
        assert_eq!(opts.vpi_modules, vec!["system", "v2009"]);
        assert_eq!(opts.delay_selection, DelaySelection::Maximum);
    }

    #[test]
    fn fileline_values() {
        assert_eq!(parse_fileline(""), Ok(false));
        assert_eq!(parse_fileline("0"), Ok(false));
        assert_eq!(parse_fileline("2"), Ok(true));
        assert!(matches!(parse_fileline("on"), Err(OptionsError::BadFileLine(_))));
        assert!(matches!(
            parse_fileline("1x"),
            Err(OptionsError::TrailingFileLine { .. })
        ));
    }

    #[test]
    fn precision_and_modules() {
        let opts = CodegenOptions::from_flags([
            ("time_precision", "-12"),
            ("vpi_module", "v2009"),
            ("vpi_module", "system"),
            ("warn_unique", "0"),
        ])
        .unwrap();
        assert_eq!(opts.time_precision, Some(-12));
        assert_eq!(opts.vpi_modules, vec!["system", "vhdl_sys", "v2005_math", "v2009"]);
        assert!(!opts.warn_unique);
        assert!(matches!(
            CodegenOptions::from_flags([("time_precision", "ns")]),
            Err(OptionsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn builder_methods() {
        let opts = CodegenOptions::new()
            .with_fileline(true)
            .with_executable("/usr/bin/vvp")
            .with_vpi_modules(["system"]);
        assert!(opts.fileline);
        assert_eq!(opts.executable.as_deref(), Some("/usr/bin/vvp"));
        assert_eq!(opts.vpi_modules, vec!["system"]);
    }
}
