//! Bidirectional switches inside islands.

use vvpgen_core::{CodegenError, CodegenResult, SwitchId, SwitchKind};

use super::ScopeEmitter;
use crate::bytecode::{Label, Line};

impl ScopeEmitter<'_, '_> {
    /// Draw one switch as an unlabeled record joining two island ports.
    ///
    /// ```text
    /// I0 .island tran;
    /// p3 .port I0, v0_0;
    /// p4 .port I0, v1_0;
    ///     .tranif1 I0, p3 p4, v2_0;
    ///     .tranvp 8 4 2, I0, p5 p6;
    /// ```
    pub(super) fn draw_switch(&mut self, id: SwitchId) -> CodegenResult<()> {
        let design = self.design();
        let switch = design.switch(id);
        if switch.delay.is_some_and(|d| !d.is_zero()) {
            self.ctx
                .warning(switch.span, format!("delay on switch {} is ignored", switch.name));
        }

        self.ctx.ensure_island(switch.island);
        let island = Label::Island(switch.island);
        let a = self.ctx.resolve(switch.a)?;
        let b = self.ctx.resolve(switch.b)?;
        let kw = switch.kind.keyword();

        let body = if switch.kind == SwitchKind::TranVp {
            let Some((offset, full)) = switch.part else {
                return Err(CodegenError::invariant(
                    format!("part switch {} has no part", switch.name),
                    switch.span,
                ));
            };
            format!(".{kw} {full} {} {offset}, {island}, {a} {b}", switch.width)
        } else if switch.kind.has_enable() {
            let Some(enable) = switch.enable else {
                return Err(CodegenError::invariant(
                    format!("{kw} {} has no enable", switch.name),
                    switch.span,
                ));
            };
            let enable = self.ctx.resolve(enable)?;
            format!(".{kw} {island}, {a} {b}, {enable}")
        } else {
            format!(".{kw} {island}, {a} {b}")
        };
        self.ctx.push_decl(Line::record(body));
        Ok(())
    }
}
