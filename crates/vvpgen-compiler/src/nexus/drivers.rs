//! Operands of individual drivers.

use vvpgen_core::{
    Bits4, CodegenError, CodegenResult, ConstId, ConstValue, DelaySpec, DelayValue, Design,
    LogicId, LogicKind, Logic4, Nexus, NexusPtr, PinTarget, PortDir, SignalId,
};

use crate::bytecode::Label;
use crate::codec::{DelayTerm, const_literal, delay_lines, undelayed};
use crate::context::GenContext;

/// Whether a pass-through buffer can be dropped so readers of its output
/// read its input directly.
///
/// The checks apply in this order; the first that matches keeps the
/// buffer:
///
/// 1. a non-zero delay
/// 2. the input and output are the same nexus
/// 3. the output carries a port signal, sits in a switch island, or has
///    another driver
/// 4. the input does not have exactly one driver, or that driver's
///    strengths differ from the buffer's
/// 5. both sides carry a net signal
pub fn can_elide_bufz(design: &Design, id: LogicId) -> bool {
    let logic = design.logic(id);
    if !matches!(logic.kind, LogicKind::Bufz | LogicKind::BufT) {
        return false;
    }
    if logic.delay.is_some_and(|d| !d.is_zero()) {
        return false;
    }
    let (Some(out), [input]) = (logic.output(), logic.inputs()) else {
        return false;
    };
    if out == *input {
        return false;
    }

    let out_nex = design.nexus(out);
    let has_port = out_nex
        .signals()
        .any(|(sig, _)| design.signal(sig).port != PortDir::None);
    if has_port || out_nex.island.is_some() || out_nex.drivers().count() != 1 {
        return false;
    }

    let in_nex = design.nexus(*input);
    let mut in_drivers = in_nex.drivers();
    match (in_drivers.next(), in_drivers.next()) {
        (Some(only), None) => {
            if only.drive0 != logic.drive0 || only.drive1 != logic.drive1 {
                return false;
            }
        }
        _ => return false,
    }

    let carries_net = |nex: &Nexus| {
        nex.signals()
            .any(|(sig, _)| design.signal(sig).net.is_net())
    };
    !(carries_net(out_nex) && carries_net(in_nex))
}

/// Operand naming one word of a signal.
pub fn signal_word(design: &Design, sig: SignalId, word: u32) -> String {
    if design.signal(sig).is_array() {
        format!("&A<{}, {word}>", Label::Array(sig))
    } else {
        Label::Signal(sig, word).to_string()
    }
}

impl GenContext<'_> {
    /// The operand one driver contributes to its nexus.
    pub(super) fn draw_driver(&mut self, ptr: &NexusPtr) -> CodegenResult<String> {
        let design = self.design;
        match ptr.target {
            PinTarget::Signal { sig, word } => Ok(signal_word(design, sig, word)),
            PinTarget::Logic { logic: id, pin: 0 } => {
                let logic = design.logic(id);
                match logic.kind {
                    LogicKind::Pullup | LogicKind::Pulldown => {
                        let bit = if logic.kind == LogicKind::Pullup {
                            Logic4::One
                        } else {
                            Logic4::Zero
                        };
                        let bits = Bits4::filled(bit, logic.width.max(1));
                        Ok(const_literal(&bits, ptr.drive0, ptr.drive1))
                    }
                    LogicKind::Bufz | LogicKind::BufT
                        if can_elide_bufz(design, id)
                            && logic
                                .inputs()
                                .first()
                                .is_some_and(|i| !self.resolving.contains(i)) =>
                    {
                        let input = logic.inputs()[0];
                        self.resolve(input)
                    }
                    _ => Ok(Label::Logic(id).to_string()),
                }
            }
            PinTarget::LpmOut(id) => Ok(Label::Lpm(id).to_string()),
            PinTarget::Const(id) => self.draw_const(id, ptr),
            PinTarget::Logic { logic, .. } => Err(CodegenError::invariant(
                format!("input pin of {logic} drives a nexus"),
                design.logic(logic).span,
            )),
            PinTarget::LpmIn { lpm, .. } => Err(CodegenError::invariant(
                format!("input pin of {lpm} drives a nexus"),
                design.lpm(lpm).span,
            )),
            PinTarget::Switch { switch, .. } => Err(CodegenError::invariant(
                format!("terminal of {switch} listed as a driver"),
                design.switch(switch).span,
            )),
        }
    }

    /// Inline literal of a constant driver, or the label of its delay node.
    fn draw_const(&mut self, id: ConstId, ptr: &NexusPtr) -> CodegenResult<String> {
        let design = self.design;
        let c = design.constant(id);
        let literal = match &c.value {
            ConstValue::Bits(bits) => const_literal(bits, ptr.drive0, ptr.drive1),
            ConstValue::Real(value) => self.real_literal(*value),
        };
        let Some(delay) = c.delay.filter(|d| !d.is_zero()) else {
            return Ok(literal);
        };

        let label = Label::Const(id);
        if self.delayed_consts.insert(id) {
            let width = c.width();
            let input = undelayed(&label);
            self.decl(
                input.clone(),
                format!(".functor BUFZ {width}, {literal}, C4<0>, C4<0>, C4<0>"),
            );
            let terms = self.delay_terms(&delay)?;
            let lines = delay_lines(&label, width, &input.to_string(), terms);
            self.extend_decls(lines);
        }
        Ok(label.to_string())
    }

    /// The three delay terms of a structural delay, with net delays
    /// resolved to their drivers.
    pub(crate) fn delay_terms(&mut self, delay: &DelaySpec) -> CodegenResult<[DelayTerm; 3]> {
        let mut term = |value: DelayValue| -> CodegenResult<DelayTerm> {
            Ok(match value {
                DelayValue::Const(v) => DelayTerm::Const(v),
                DelayValue::Net(nex) => DelayTerm::Net(self.resolve(nex)?),
            })
        };
        Ok([term(delay.rise)?, term(delay.fall)?, term(delay.decay)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CodegenOptions;
    use vvpgen_core::{DataType, DesignBuilder, Drive, NetKind, ScopeKind};

    struct Chain {
        design: Design,
        buf: LogicId,
        src: vvpgen_core::NexusId,
        dst: vvpgen_core::NexusId,
    }

    fn chain(src_kind: NetKind, dst_kind: NetKind) -> Chain {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let a = b.add_signal(top, "a", src_kind, DataType::Logic, 1);
        let y = b.add_signal(top, "y", dst_kind, DataType::Logic, 1);
        let src = b.design().signal(a).nexus[0];
        let dst = b.design().signal(y).nexus[0];
        if src_kind.is_net() {
            b.add_const(top, src, Bits4::from_u64(1, 1));
        }
        let buf = b.add_logic(top, "b", LogicKind::Bufz, 1, dst, &[src]);
        Chain {
            design: b.finish(),
            buf,
            src,
            dst,
        }
    }

    #[test]
    fn buffer_from_variable_to_net_is_elided() {
        let c = chain(NetKind::Reg, NetKind::Tri);
        assert!(can_elide_bufz(&c.design, c.buf));

        let opts = CodegenOptions::default();
        let mut ctx = GenContext::new(&c.design, &opts);
        assert_eq!(ctx.resolve(c.dst).unwrap(), "v0_0");
        assert!(ctx.is_resolved(c.src));
    }

    #[test]
    fn buffer_between_nets_is_kept() {
        let c = chain(NetKind::Tri, NetKind::Tri);
        assert!(!can_elide_bufz(&c.design, c.buf));
        let opts = CodegenOptions::default();
        let mut ctx = GenContext::new(&c.design, &opts);
        assert_eq!(ctx.resolve(c.dst).unwrap(), "L_0");
    }

    #[test]
    fn delayed_or_port_buffers_are_kept() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let a = b.add_signal(top, "a", NetKind::Reg, DataType::Logic, 1);
        let y = b.add_signal(top, "y", NetKind::Tri, DataType::Logic, 1);
        let z = b.add_signal(top, "z", NetKind::Tri, DataType::Logic, 1);
        let an = b.design().signal(a).nexus[0];
        let yn = b.design().signal(y).nexus[0];
        let zn = b.design().signal(z).nexus[0];
        let delayed = b.add_logic_with(
            top,
            "d",
            LogicKind::Bufz,
            1,
            yn,
            &[an],
            Drive::Strong,
            Drive::Strong,
            Some(DelaySpec::uniform(1)),
        );
        let ported = b.add_logic(top, "p", LogicKind::Bufz, 1, zn, &[an]);
        b.signal_mut(z).port = PortDir::Output;
        let design = b.finish();
        assert!(!can_elide_bufz(&design, delayed));
        assert!(!can_elide_bufz(&design, ported));
    }

    #[test]
    fn strength_mismatch_keeps_the_buffer() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let a = b.add_signal(top, "a", NetKind::Reg, DataType::Logic, 1);
        let y = b.add_signal(top, "y", NetKind::Tri, DataType::Logic, 1);
        let an = b.design().signal(a).nexus[0];
        let yn = b.design().signal(y).nexus[0];
        let weak = b.add_logic_with(
            top,
            "w",
            LogicKind::Bufz,
            1,
            yn,
            &[an],
            Drive::Weak,
            Drive::Weak,
            None,
        );
        let design = b.finish();
        assert!(!can_elide_bufz(&design, weak));
    }

    #[test]
    fn array_words_use_word_references() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let mem = b.add_array(top, "mem", DataType::Logic, 8, 0, 3);
        let design = b.finish();
        assert_eq!(signal_word(&design, mem, 2), "&A<v0, 2>");
    }

    #[test]
    fn delayed_constants_get_a_delay_node_once() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let w = b.add_signal(top, "w", NetKind::Tri, DataType::Logic, 1);
        let nex = b.design().signal(w).nexus[0];
        b.add_const_with(
            top,
            nex,
            ConstValue::Bits(Bits4::from_u64(1, 1)),
            Drive::Strong,
            Drive::Strong,
            Some(DelaySpec::uniform(5)),
        );
        let design = b.finish();
        let opts = CodegenOptions::default();
        let mut ctx = GenContext::new(&design, &opts);

        assert_eq!(ctx.resolve(nex).unwrap(), "LC_0");
        let text: Vec<String> = ctx.decls().iter().map(ToString::to_string).collect();
        assert_eq!(
            text,
            vec![
                "LC_0/d .functor BUFZ 1, C4<1>, C4<0>, C4<0>, C4<0>;".to_string(),
                "LC_0 .delay 1 (5,5,5) LC_0/d;".to_string(),
            ]
        );
    }
}
