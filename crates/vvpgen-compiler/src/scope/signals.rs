//! Variable, net and array declarations.

use vvpgen_core::{CodegenError, CodegenResult, DataType, Signal, SignalId};

use super::ScopeEmitter;
use crate::bytecode::{Label, Line, escape_string};

/// Record suffix of a packed vector variable or net.
fn vector_flag(data: &DataType, signed: bool) -> Option<&'static str> {
    match (data, signed) {
        (DataType::Logic, false) => Some(""),
        (DataType::Logic, true) => Some("/s"),
        (DataType::Bool, false) => Some("/2u"),
        (DataType::Bool, true) => Some("/2s"),
        _ => None,
    }
}

impl ScopeEmitter<'_, '_> {
    pub(super) fn draw_signal(&mut self, id: SignalId) -> CodegenResult<()> {
        let signal = self.design().signal(id);
        if signal.nexus.len() != signal.word_count() as usize {
            return Err(CodegenError::invariant(
                format!(
                    "{} has {} words but {} nexuses",
                    signal.name,
                    signal.word_count(),
                    signal.nexus.len()
                ),
                signal.span,
            ));
        }

        match (signal.is_array(), signal.net.is_net()) {
            (true, false) => self.draw_var_array(id, signal),
            (true, true) => self.draw_net_array(id, signal)?,
            (false, false) => self.draw_var(id, signal),
            (false, true) => self.draw_net(id, signal)?,
        }
        if signal.local {
            self.ctx.push_decl(Line::Comment("Local signal".into()));
        }
        Ok(())
    }

    /// ```text
    /// v0_0 .var/s "count", 7 0;
    /// v1_0 .var/real "t", 0 0;
    /// v2_0 .var/queue "q", 8, 0;
    /// ```
    fn draw_var(&mut self, id: SignalId, signal: &Signal) {
        let name = escape_string(&signal.name);
        let body = match &signal.data {
            DataType::Real => format!(".var/real \"{name}\", 0 0"),
            DataType::String => format!(".var/str \"{name}\""),
            DataType::Class(_) => format!(".var/cobj \"{name}\""),
            DataType::Darray(_) => format!(".var/darray \"{name}\", {}", signal.width()),
            DataType::Queue(_, bound) => format!(
                ".var/queue \"{name}\", {}, {}",
                signal.width(),
                bound.unwrap_or(0)
            ),
            data => {
                let flag = vector_flag(data, signal.signed).unwrap_or("");
                format!(".var{flag} \"{name}\", {} {}", signal.msb, signal.lsb)
            }
        };
        self.ctx.decl(Label::Signal(id, 0), body);
    }

    /// ```text
    /// v3_0 .net "w", 3 0, RS_5;
    /// ```
    fn draw_net(&mut self, id: SignalId, signal: &Signal) -> CodegenResult<()> {
        let name = escape_string(&signal.name);
        let input = self.ctx.resolve(signal.nexus[0])?;
        let body = match &signal.data {
            DataType::Real => format!(".net/real \"{name}\", 0 0, {input}"),
            data => match vector_flag(data, signal.signed) {
                Some(flag) => format!(
                    ".net{flag} \"{name}\", {} {}, {input}",
                    signal.msb, signal.lsb
                ),
                None => {
                    self.ctx.error(
                        signal.span,
                        format!("net {} cannot carry values of this type", signal.name),
                    );
                    format!(".net \"{name}\", {} {}, {input}", signal.msb, signal.lsb)
                }
            },
        };
        self.ctx.decl(Label::Signal(id, 0), body);
        Ok(())
    }

    /// ```text
    /// v4 .array "mem", 0 255, 7 0;
    /// v5 .array/real "coeff", 0 3;
    /// ```
    fn draw_var_array(&mut self, id: SignalId, signal: &Signal) {
        let name = escape_string(&signal.name);
        let Some((first, last)) = signal.array else {
            return;
        };
        let body = match &signal.data {
            DataType::Real => format!(".array/real \"{name}\", {first} {last}"),
            DataType::String => format!(".array/str \"{name}\", {first} {last}"),
            DataType::Class(_) | DataType::Darray(_) | DataType::Queue(..) => {
                format!(".array/obj \"{name}\", {first} {last}")
            }
            data => {
                let flag = vector_flag(data, signal.signed).unwrap_or("");
                format!(
                    ".array{flag} \"{name}\", {first} {last}, {} {}",
                    signal.msb, signal.lsb
                )
            }
        };
        self.ctx.decl(Label::Array(id), body);
    }

    /// A net array is an array record followed by one net per word:
    ///
    /// ```text
    /// v6 .array/net "bus", 0 1, 3 0;
    /// v6_0 .net v6 0, 3 0, L_2;
    /// v6_1 .net v6 1, 3 0, C4<zzzz>;
    /// ```
    fn draw_net_array(&mut self, id: SignalId, signal: &Signal) -> CodegenResult<()> {
        let name = escape_string(&signal.name);
        let Some((first, last)) = signal.array else {
            return Ok(());
        };
        let array = Label::Array(id);
        self.ctx.decl(
            array.clone(),
            format!(
                ".array/net \"{name}\", {first} {last}, {} {}",
                signal.msb, signal.lsb
            ),
        );
        let flag = vector_flag(&signal.data, signal.signed).unwrap_or("");
        for (word, &nex) in signal.nexus.iter().enumerate() {
            let input = self.ctx.resolve(nex)?;
            self.ctx.decl(
                Label::Signal(id, word as u32),
                format!(
                    ".net{flag} {array} {word}, {} {}, {input}",
                    signal.msb, signal.lsb
                ),
            );
        }
        Ok(())
    }
}
