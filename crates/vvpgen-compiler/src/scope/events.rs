//! Event records.

use vvpgen_core::{CodegenResult, Edge, EventId};

use super::ScopeEmitter;
use crate::bytecode::{Label, escape_string};

impl ScopeEmitter<'_, '_> {
    /// Draw one event.
    ///
    /// A named event is a bare `.event "name"`. An edge event takes at most
    /// four sources per record; when its sources need more than one record
    /// the pieces are combined with `.event/or`:
    ///
    /// ```text
    /// E_0/0 .event posedge, v0_0;
    /// E_0/1 .event negedge, v1_0;
    /// E_0 .event/or E_0/0, E_0/1;
    /// ```
    pub(super) fn draw_event(&mut self, id: EventId) -> CodegenResult<()> {
        let event = self.design().event(id);
        let label = Label::Event(id);
        if event.is_named() {
            self.ctx
                .decl(label, format!(".event \"{}\"", escape_string(&event.name)));
            return Ok(());
        }

        let lists = [
            ("anyedge", &event.any),
            (Edge::Pos.keyword(), &event.pos),
            (Edge::Neg.keyword(), &event.neg),
            (Edge::Any.keyword(), &event.edge),
        ];
        let mut records = Vec::new();
        for (kind, sources) in lists {
            let mut operands = Vec::with_capacity(sources.len());
            for &nex in sources.iter() {
                operands.push(self.ctx.resolve(nex)?);
            }
            for group in operands.chunks(4) {
                records.push(format!(".event {kind}, {}", group.join(", ")));
            }
        }

        if let [only] = records.as_slice() {
            self.ctx.decl(label, only.clone());
            return Ok(());
        }
        let mut parts = Vec::with_capacity(records.len());
        for (index, body) in records.into_iter().enumerate() {
            let part = label.sub(index);
            self.ctx.decl(part.clone(), body);
            parts.push(part.to_string());
        }
        self.ctx.decl(label, format!(".event/or {}", parts.join(", ")));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::scope::test_support::{draw, line};
    use vvpgen_core::{DataType, DesignBuilder, Event, NetKind, ScopeKind};

    #[test]
    fn named_and_single_list_events() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let clk = b.add_signal(top, "clk", NetKind::Reg, DataType::Logic, 1);
        let clk_nex = b.design().signal(clk).nexus[0];
        b.add_named_event(top, "done");
        b.add_event(Event {
            scope: top,
            pos: vec![clk_nex],
            ..Event::default()
        });
        let design = b.finish();

        let (text, _) = draw(&design);
        assert_eq!(line(&text, "E_0"), "E_0 .event \"done\";");
        assert_eq!(line(&text, "E_1"), "E_1 .event posedge, v0_0;");
    }

    #[test]
    fn several_lists_are_combined() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let mut nexuses = Vec::new();
        for i in 0..5 {
            let s = b.add_signal(top, format!("s{i}"), NetKind::Reg, DataType::Logic, 1);
            nexuses.push(b.design().signal(s).nexus[0]);
        }
        b.add_event(Event {
            scope: top,
            any: nexuses[..4].to_vec(),
            neg: vec![nexuses[4]],
            ..Event::default()
        });
        let design = b.finish();

        let (text, _) = draw(&design);
        assert_eq!(
            line(&text, "E_0/0"),
            "E_0/0 .event anyedge, v0_0, v1_0, v2_0, v3_0;"
        );
        assert_eq!(line(&text, "E_0/1"), "E_0/1 .event negedge, v4_0;");
        assert_eq!(line(&text, "E_0 "), "E_0 .event/or E_0/0, E_0/1;");
    }
}
