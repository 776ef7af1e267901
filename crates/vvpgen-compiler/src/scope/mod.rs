//! Declaration records of the scope hierarchy.
//!
//! The [`ScopeEmitter`] walks the scope tree depth first and draws, for
//! each scope in turn:
//!
//! 1. the `.scope` record, `.timescale` and module `.port_info` lines
//! 2. parameters, classes and enumerations
//! 3. variables, nets and arrays
//! 4. events
//! 5. gates, devices and switches
//!
//! and then the scope's children. Operands of nets and device inputs come
//! from [`GenContext::resolve`], so resolver and island records land in the
//! declaration section the first time a nexus is read.
//!
//! # Example
//!
//! ```ignore
//! let mut ctx = GenContext::new(&design, &options);
//! ScopeEmitter::new(&mut ctx).emit_all()?;
//! ```

mod events;
mod logic;
mod lpm;
mod params;
mod signals;
mod switches;

use tracing::debug;
use vvpgen_core::{CodegenResult, Design, PortDir, ScopeId, ScopeKind};

use crate::bytecode::{Label, Line, escape_string};
use crate::context::GenContext;

/// Draws the declarations of every scope.
pub struct ScopeEmitter<'a, 'd> {
    ctx: &'a mut GenContext<'d>,
}

impl<'a, 'd> ScopeEmitter<'a, 'd> {
    pub fn new(ctx: &'a mut GenContext<'d>) -> Self {
        Self { ctx }
    }

    /// Draw every root scope and everything below it.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit_all(&mut self) -> CodegenResult<()> {
        let design = self.design();
        for &root in design.roots() {
            self.emit_scope(root)?;
        }
        Ok(())
    }

    /// Draw one scope and, recursively, its children.
    pub fn emit_scope(&mut self, id: ScopeId) -> CodegenResult<()> {
        let design = self.design();
        let scope = design.scope(id);
        debug!(scope = %design.scope_path(id), kind = scope.kind.keyword(), "drawing scope");

        self.open(id);
        for param in &scope.params {
            self.draw_param(param);
        }
        for &class in &scope.classes {
            self.draw_class(class);
        }
        for &ty in &scope.enums {
            self.draw_enum(ty);
        }
        for &sig in &scope.signals {
            self.draw_signal(sig)?;
        }
        for &event in &scope.events {
            self.draw_event(event)?;
        }
        for &logic in &scope.logic {
            self.draw_logic(logic)?;
        }
        for &lpm in &scope.lpms {
            self.draw_lpm(lpm)?;
        }
        for &switch in &scope.switches {
            self.draw_switch(switch)?;
        }

        for &child in &scope.children {
            self.emit_scope(child)?;
        }
        Ok(())
    }

    /// The `.scope` record and the lines that belong directly to it.
    ///
    /// ```text
    /// S_0 .scope module, "top" "top" 0 1;
    /// S_1 .scope module, "u1" "cell" 0 7, 0 20 0, S_0;
    ///     .timescale -9 -12;
    ///     .port_info 0 /INPUT 8 "a";
    /// ```
    fn open(&mut self, id: ScopeId) {
        let design = self.design();
        let scope = design.scope(id);
        let mut body = format!(
            ".scope {}, \"{}\" \"{}\" {} {}",
            scope.kind.keyword(),
            escape_string(&scope.name),
            escape_string(&scope.type_name),
            scope.span.file.index(),
            scope.span.line,
        );
        if let Some(parent) = scope.parent {
            let cell = u8::from(scope.flags.contains(vvpgen_core::ScopeFlags::CELL));
            body.push_str(&format!(
                ", {} {} {cell}, {}",
                scope.def_span.file.index(),
                scope.def_span.line,
                Label::Scope(parent)
            ));
        }
        self.ctx.decl(Label::Scope(id), body);
        self.ctx.push_decl(Line::record(format!(
            ".timescale {} {}",
            scope.time_unit, scope.time_precision
        )));

        if scope.kind == ScopeKind::Module {
            for (index, &port) in scope.ports.iter().enumerate() {
                let signal = design.signal(port);
                if signal.port == PortDir::None {
                    continue;
                }
                self.ctx.push_decl(Line::record(format!(
                    ".port_info {index} /{} {} \"{}\"",
                    signal.port.keyword(),
                    signal.width(),
                    escape_string(&signal.name)
                )));
            }
        }
    }

    #[inline]
    fn design(&self) -> &'d Design {
        self.ctx.design
    }
}
