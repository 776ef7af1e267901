//! Primitive gates as `.functor` records.

use vvpgen_core::{CodegenError, CodegenResult, Drive, Logic4, LogicId, LogicKind};

use super::ScopeEmitter;
use crate::bytecode::Label;
use crate::codec::{c4_repeat, delay_lines, undelayed};
use crate::nexus::{can_elide_bufz, padded};

/// Most inputs one functor takes.
pub const FUNCTOR_ARITY: usize = 4;

/// Functor name of a gate kind.
fn functor_name(kind: LogicKind) -> &'static str {
    match kind {
        LogicKind::And => "AND",
        LogicKind::Nand => "NAND",
        LogicKind::Or => "OR",
        LogicKind::Nor => "NOR",
        LogicKind::Xor => "XOR",
        LogicKind::Xnor => "XNOR",
        LogicKind::Buf => "BUF",
        LogicKind::BufT => "BUFT",
        LogicKind::Bufz => "BUFZ",
        LogicKind::Bufif0 => "BUFIF0",
        LogicKind::Bufif1 => "BUFIF1",
        LogicKind::Not => "NOT",
        LogicKind::Notif0 => "NOTIF0",
        LogicKind::Notif1 => "NOTIF1",
        LogicKind::Pulldown => "PULLDOWN",
        LogicKind::Pullup => "PULLUP",
        LogicKind::Nmos => "NMOS",
        LogicKind::Pmos => "PMOS",
        LogicKind::Rnmos => "RNMOS",
        LogicKind::Rpmos => "RPMOS",
        LogicKind::Cmos => "CMOS",
        LogicKind::Rcmos => "RCMOS",
    }
}

/// For a reduction gate: the non-inverting functor that combines a group
/// of inputs below the root, and the bit unused inputs are tied to.
fn fold_parts(kind: LogicKind) -> Option<(&'static str, Logic4)> {
    match kind {
        LogicKind::And | LogicKind::Nand => Some(("AND", Logic4::One)),
        LogicKind::Or | LogicKind::Nor => Some(("OR", Logic4::Zero)),
        LogicKind::Xor | LogicKind::Xnor => Some(("XOR", Logic4::Zero)),
        _ => None,
    }
}

/// ` [d0 d1]` when the gate does not drive at strong strength.
fn strength_suffix(drive0: Drive, drive1: Drive) -> String {
    if drive0 == Drive::Strong && drive1 == Drive::Strong {
        String::new()
    } else {
        format!(" [{} {}]", drive0.digit(), drive1.digit())
    }
}

impl ScopeEmitter<'_, '_> {
    /// Draw one gate.
    ///
    /// Pull gates are drawn inline as constants wherever they are read, and
    /// an elided buffer has no readers; neither gets a record. A reduction
    /// gate with more than four inputs becomes a tree:
    ///
    /// ```text
    /// L_0/0/0 .functor AND 1, v0_0, v1_0, v2_0, v3_0;
    /// L_0/0/1 .functor AND 1, v4_0, v5_0, C4<1>, C4<1>;
    /// L_0 .functor NAND 1, L_0/0/0, L_0/0/1, C4<1>, C4<1>;
    /// ```
    pub(super) fn draw_logic(&mut self, id: LogicId) -> CodegenResult<()> {
        let design = self.design();
        let logic = design.logic(id);
        let label = Label::Logic(id);

        if matches!(logic.kind, LogicKind::Pullup | LogicKind::Pulldown) {
            return Ok(());
        }
        let Some(out) = logic.output() else {
            return Err(CodegenError::invariant(
                format!("gate {} has no output pin", logic.name),
                logic.span,
            ));
        };
        if can_elide_bufz(design, id) && self.ctx.resolve(out)? != label.to_string() {
            self.ctx
                .debug_comment(|| format!("{} elided", logic.name));
            return Ok(());
        }

        let mut inputs = Vec::with_capacity(logic.inputs().len());
        for &nex in logic.inputs() {
            inputs.push(self.ctx.resolve(nex)?);
        }

        let delay = logic.delay.filter(|d| !d.is_zero());
        let node = if delay.is_some() {
            undelayed(&label)
        } else {
            label.clone()
        };
        let width = logic.width.max(1);
        let strength = strength_suffix(logic.drive0, logic.drive1);
        let name = functor_name(logic.kind);

        match fold_parts(logic.kind) {
            Some((branch, pad_bit)) => {
                let pad = c4_repeat(pad_bit, width);
                let mut level = 0u32;
                while inputs.len() > FUNCTOR_ARITY {
                    let mut next = Vec::with_capacity(inputs.len().div_ceil(FUNCTOR_ARITY));
                    for (index, group) in inputs.chunks(FUNCTOR_ARITY).enumerate() {
                        let leaf = node.sub(level).sub(index);
                        self.ctx.decl(
                            leaf.clone(),
                            format!(".functor {branch} {width}, {}", padded(group, &pad)),
                        );
                        next.push(leaf.to_string());
                    }
                    inputs = next;
                    level += 1;
                }
                self.ctx.decl(
                    node.clone(),
                    format!(".functor {name} {width}{strength}, {}", padded(&inputs, &pad)),
                );
            }
            None => {
                if inputs.len() > FUNCTOR_ARITY {
                    return Err(CodegenError::invariant(
                        format!("{name} gate {} has {} inputs", logic.name, inputs.len()),
                        logic.span,
                    ));
                }
                let pad = c4_repeat(Logic4::Zero, width);
                self.ctx.decl(
                    node.clone(),
                    format!(".functor {name} {width}{strength}, {}", padded(&inputs, &pad)),
                );
            }
        }

        if let Some(delay) = delay {
            let terms = self.ctx.delay_terms(&delay)?;
            let lines = delay_lines(&label, width, &node.to_string(), terms);
            self.ctx.extend_decls(lines);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::test_support::{draw, line};
    use vvpgen_core::{DataType, DelaySpec, DesignBuilder, NetKind, NexusId, ScopeKind};

    fn gate(kind: LogicKind, inputs: usize) -> vvpgen_core::Design {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let mut ins: Vec<NexusId> = Vec::new();
        for i in 0..inputs {
            let s = b.add_signal(top, format!("i{i}"), NetKind::Reg, DataType::Logic, 1);
            ins.push(b.design().signal(s).nexus[0]);
        }
        let y = b.add_signal(top, "y", NetKind::Tri, DataType::Logic, 1);
        let yn = b.design().signal(y).nexus[0];
        b.add_logic(top, "g", kind, 1, yn, &ins);
        b.finish()
    }

    #[test]
    fn small_gates_are_one_functor() {
        let (text, _) = draw(&gate(LogicKind::And, 2));
        assert_eq!(line(&text, "L_0"), "L_0 .functor AND 1, v0_0, v1_0, C4<1>, C4<1>;");
        let (text, _) = draw(&gate(LogicKind::Not, 1));
        assert_eq!(line(&text, "L_0"), "L_0 .functor NOT 1, v0_0, C4<0>, C4<0>, C4<0>;");
    }

    #[test]
    fn wide_reduction_folds_into_a_tree() {
        let (text, _) = draw(&gate(LogicKind::Nand, 6));
        assert_eq!(
            line(&text, "L_0/0/0"),
            "L_0/0/0 .functor AND 1, v0_0, v1_0, v2_0, v3_0;"
        );
        assert_eq!(
            line(&text, "L_0/0/1"),
            "L_0/0/1 .functor AND 1, v4_0, v5_0, C4<1>, C4<1>;"
        );
        assert_eq!(
            line(&text, "L_0 "),
            "L_0 .functor NAND 1, L_0/0/0, L_0/0/1, C4<1>, C4<1>;"
        );
    }

    #[test]
    fn leaf_count_is_a_quarter_of_the_inputs() {
        for n in [5usize, 8, 9, 16, 17] {
            let (text, _) = draw(&gate(LogicKind::Xor, n));
            let leaves = text.iter().filter(|l| l.starts_with("L_0/0/")).count();
            assert_eq!(leaves, n.div_ceil(4), "{n} inputs");
        }
    }

    #[test]
    fn wide_non_reduction_gate_is_fatal() {
        let design = gate(LogicKind::Bufif1, 5);
        let opts = crate::options::CodegenOptions::default();
        let mut ctx = crate::context::GenContext::new(&design, &opts);
        let err = ScopeEmitter::new(&mut ctx).emit_all().unwrap_err();
        assert!(matches!(err, CodegenError::InvariantViolation { .. }));
    }

    #[test]
    fn weak_delayed_gate() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let a = b.add_signal(top, "a", NetKind::Reg, DataType::Logic, 1);
        let y = b.add_signal(top, "y", NetKind::Tri, DataType::Logic, 1);
        let an = b.design().signal(a).nexus[0];
        let yn = b.design().signal(y).nexus[0];
        b.add_logic_with(
            top,
            "g",
            LogicKind::Buf,
            1,
            yn,
            &[an],
            Drive::Pull,
            Drive::Weak,
            Some(DelaySpec::uniform(3)),
        );
        let design = b.finish();

        let (text, _) = draw(&design);
        assert_eq!(
            line(&text, "L_0/d"),
            "L_0/d .functor BUF 1 [5 3], v0_0, C4<0>, C4<0>, C4<0>;"
        );
        assert_eq!(line(&text, "L_0 "), "L_0 .delay 1 (3,3,3) L_0/d;");
    }

    #[test]
    fn elided_buffers_have_no_record() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let a = b.add_signal(top, "a", NetKind::Reg, DataType::Logic, 1);
        let y = b.add_signal(top, "y", NetKind::Tri, DataType::Logic, 1);
        let an = b.design().signal(a).nexus[0];
        let yn = b.design().signal(y).nexus[0];
        b.add_logic(top, "b", LogicKind::Bufz, 1, yn, &[an]);
        let design = b.finish();

        let (text, _) = draw(&design);
        assert!(!text.iter().any(|l| l.starts_with("L_0")));
        assert_eq!(line(&text, "v1_0"), "v1_0 .net \"y\", 0 0, v0_0;");
    }
}
