//! Parameterized devices.
//!
//! Each device kind has a fixed record template. Wide concatenations and
//! multiplexers are split into trees of fixed-arity nodes named after the
//! device (`LPM_<n>/<level>/<index>`).

use vvpgen_core::{CodegenError, CodegenResult, DataType, Logic4, Lpm, LpmId, LpmKind};

use super::ScopeEmitter;
use crate::bytecode::Label;
use crate::codec::{c4_repeat, delay_lines, undelayed};
use crate::nexus::nexus_width;

/// `.s` for the signed variant of a device.
fn sign(signed: bool) -> &'static str {
    if signed { ".s" } else { "" }
}

impl ScopeEmitter<'_, '_> {
    pub(super) fn draw_lpm(&mut self, id: LpmId) -> CodegenResult<()> {
        let design = self.design();
        let lpm = design.lpm(id);
        if let Some(expected) = lpm.kind.fixed_inputs()
            && expected != lpm.inputs.len()
        {
            return Err(CodegenError::invariant(
                format!(
                    "device {} needs {expected} inputs but has {}",
                    lpm.name,
                    lpm.inputs.len()
                ),
                lpm.span,
            ));
        }

        let mut inputs = Vec::with_capacity(lpm.inputs.len());
        for &nex in &lpm.inputs {
            inputs.push(self.ctx.resolve(nex)?);
        }

        let label = Label::Lpm(id);
        let delay = lpm.delay.filter(|d| !d.is_zero());
        let node = if delay.is_some() {
            undelayed(&label)
        } else {
            label.clone()
        };
        self.draw_device(&node, lpm, &inputs)?;

        if let Some(delay) = delay {
            let terms = self.ctx.delay_terms(&delay)?;
            let lines = delay_lines(&label, lpm.width, &node.to_string(), terms);
            self.ctx.extend_decls(lines);
        }
        Ok(())
    }

    fn draw_device(&mut self, node: &Label, lpm: &Lpm, ins: &[String]) -> CodegenResult<()> {
        let w = lpm.width;
        let s = sign(lpm.signed);
        let body = match &lpm.kind {
            LpmKind::Add => format!(".arith/sum {w}, {}, {}", ins[0], ins[1]),
            LpmKind::Sub => format!(".arith/sub {w}, {}, {}", ins[0], ins[1]),
            LpmKind::Mult => format!(".arith/mult {w}, {}, {}", ins[0], ins[1]),
            LpmKind::Div => format!(".arith/div{s} {w}, {}, {}", ins[0], ins[1]),
            LpmKind::Mod => format!(".arith/mod{s} {w}, {}, {}", ins[0], ins[1]),
            LpmKind::Pow => format!(".arith/pow{s} {w}, {}, {}", ins[0], ins[1]),
            LpmKind::CmpEq
            | LpmKind::CmpNe
            | LpmKind::CmpEeq
            | LpmKind::CmpNee
            | LpmKind::CmpGe
            | LpmKind::CmpGt => {
                let op = match lpm.kind {
                    LpmKind::CmpEq => "eq",
                    LpmKind::CmpNe => "ne",
                    LpmKind::CmpEeq => "eeq",
                    LpmKind::CmpNee => "nee",
                    LpmKind::CmpGe => "ge",
                    _ => "gt",
                };
                let ordered = matches!(lpm.kind, LpmKind::CmpGe | LpmKind::CmpGt);
                let s = if ordered { s } else { "" };
                let design = self.design();
                let operand_width = lpm
                    .inputs
                    .iter()
                    .map(|&n| nexus_width(design, n))
                    .max()
                    .unwrap_or(1);
                format!(".cmp/{op}{s} {operand_width}, {}, {}", ins[0], ins[1])
            }
            LpmKind::Concat { widths } => return self.draw_concat(node, widths, ins),
            LpmKind::Mux { size } => return self.draw_mux(node, lpm, *size, ins),
            LpmKind::PartSelect { base } => format!(".part {}, {base}, {w}", ins[0]),
            LpmKind::PartSelectVar => format!(".part/v{s} {}, {}, {w}", ins[0], ins[1]),
            LpmKind::PartSelectPv { base, target_width } => {
                format!(".part/pv {}, {base}, {w}, {target_width}", ins[0])
            }
            LpmKind::ReduceAnd => format!(".reduce/and {}", ins[0]),
            LpmKind::ReduceOr => format!(".reduce/or {}", ins[0]),
            LpmKind::ReduceXor => format!(".reduce/xor {}", ins[0]),
            LpmKind::ReduceNand => format!(".reduce/nand {}", ins[0]),
            LpmKind::ReduceNor => format!(".reduce/nor {}", ins[0]),
            LpmKind::ReduceXnor => format!(".reduce/xnor {}", ins[0]),
            LpmKind::ShiftL => format!(".shift/l {w}, {}, {}", ins[0], ins[1]),
            LpmKind::ShiftR => format!(".shift/r{s} {w}, {}, {}", ins[0], ins[1]),
            LpmKind::Repeat { count } => format!(".repeat {w}, {count}, {}", ins[0]),
            LpmKind::SignExt => format!(".extend/s {w}, {}", ins[0]),
            LpmKind::Abs => format!(".abs {}", ins[0]),
            LpmKind::CastReal => format!(".cast/real{s} {}", ins[0]),
            LpmKind::CastInt => format!(".cast/int {w}, {}", ins[0]),
            LpmKind::Sfunc { name } => {
                let args = if ins.is_empty() {
                    String::new()
                } else {
                    format!(", {}", ins.join(", "))
                };
                format!(
                    ".sfunc {} {} \"{name}\", {w}{args}",
                    lpm.span.file.index(),
                    lpm.span.line
                )
            }
            LpmKind::Ufunc { func } => self.ufunc_body(lpm, *func, ins)?,
            LpmKind::Dff { negedge, has_enable } => {
                let edge = if *negedge { "n" } else { "p" };
                let enable = if *has_enable {
                    ins[2].clone()
                } else {
                    c4_repeat(Logic4::One, 1)
                };
                format!(".dff/{edge} {w} {}, {}, {enable}", ins[0], ins[1])
            }
            LpmKind::Latch => format!(".latch {w} {}, {}", ins[0], ins[1]),
            LpmKind::ArrayPort { array } => {
                format!(".array/port {}, {}", Label::Array(*array), ins[0])
            }
        };
        self.ctx.decl(node.clone(), body);
        Ok(())
    }

    /// `.ufunc/<domain> TD_f, <wid>, <args> (<ports>) <result> S_f`
    fn ufunc_body(
        &mut self,
        lpm: &Lpm,
        func: vvpgen_core::ScopeId,
        ins: &[String],
    ) -> CodegenResult<String> {
        let design = self.design();
        let scope = design.scope(func);
        let Some(ret) = scope.return_port() else {
            return Err(CodegenError::invariant(
                format!("{} called continuously has no result", design.scope_path(func)),
                lpm.span,
            ));
        };
        let params = &scope.ports[1..];
        if params.len() != ins.len() {
            return Err(CodegenError::invariant(
                format!(
                    "{} takes {} arguments but the device passes {}",
                    design.scope_path(func),
                    params.len(),
                    ins.len()
                ),
                lpm.span,
            ));
        }
        let domain = if design.signal(ret).data == DataType::Real {
            "real"
        } else {
            "vec4"
        };
        let ports: Vec<String> = params
            .iter()
            .map(|&p| Label::Signal(p, 0).to_string())
            .collect();
        Ok(format!(
            ".ufunc/{domain} {}, {}, {} ({}) {} {}",
            Label::TaskDef(func),
            lpm.width,
            ins.join(", "),
            ports.join(", "),
            Label::Signal(ret, 0),
            Label::Scope(func)
        ))
    }

    /// Concatenate the inputs, LSB first, four at a time.
    ///
    /// ```text
    /// LPM_0/0/0 .concat [4 4 4 4], a, b, c, d;
    /// LPM_0 .concat [16 4 0 0], LPM_0/0/0, e;
    /// ```
    fn draw_concat(&mut self, node: &Label, widths: &[u32], ins: &[String]) -> CodegenResult<()> {
        let mut parts: Vec<(String, u32)> =
            ins.iter().cloned().zip(widths.iter().copied()).collect();
        let mut level = 0u32;
        while parts.len() > 4 {
            let mut next = Vec::with_capacity(parts.len().div_ceil(4));
            for (index, group) in parts.chunks(4).enumerate() {
                let sub = node.sub(level).sub(index);
                self.ctx.decl(sub.clone(), concat_body(group));
                next.push((sub.to_string(), group.iter().map(|(_, w)| w).sum()));
            }
            parts = next;
            level += 1;
        }
        self.ctx.decl(node.clone(), concat_body(&parts));
        Ok(())
    }

    /// Select one of `size` inputs with a tree of two-way muxes, one level
    /// per select bit:
    ///
    /// ```text
    /// LPM_0/s0 .part v4_0, 0, 1;
    /// LPM_0/0/0 .functor MUXZ 8, v0_0, v1_0, LPM_0/s0, C4<>;
    /// LPM_0/0/1 .functor MUXZ 8, v2_0, v3_0, LPM_0/s0, C4<>;
    /// LPM_0/s1 .part v4_0, 1, 1;
    /// LPM_0 .functor MUXZ 8, LPM_0/0/0, LPM_0/0/1, LPM_0/s1, C4<>;
    /// ```
    fn draw_mux(&mut self, node: &Label, lpm: &Lpm, size: u32, ins: &[String]) -> CodegenResult<()> {
        let w = lpm.width;
        let Some((select, data)) = ins.split_last() else {
            return Err(CodegenError::invariant(
                format!("mux {} has no select input", lpm.name),
                lpm.span,
            ));
        };
        if size < 2 {
            return Err(CodegenError::invariant(
                format!("mux {} selects from {size} inputs", lpm.name),
                lpm.span,
            ));
        }
        if size == 2 {
            self.ctx.decl(
                node.clone(),
                format!(".functor MUXZ {w}, {}, {}, {select}, C4<>", data[0], data[1]),
            );
            return Ok(());
        }

        let undefined = c4_repeat(Logic4::X, w);
        let mut level_inputs: Vec<String> = data.to_vec();
        let mut bit = 0u32;
        while level_inputs.len() > 1 {
            let sel = node.sub(format!("s{bit}"));
            self.ctx.decl(sel.clone(), format!(".part {select}, {bit}, 1"));
            let pairs = level_inputs.len().div_ceil(2);
            let mut next = Vec::with_capacity(pairs);
            for index in 0..pairs {
                let lo = &level_inputs[2 * index];
                let hi = level_inputs.get(2 * index + 1).unwrap_or(&undefined);
                let target = if pairs == 1 {
                    node.clone()
                } else {
                    node.sub(bit).sub(index)
                };
                self.ctx.decl(
                    target.clone(),
                    format!(".functor MUXZ {w}, {lo}, {hi}, {sel}, C4<>"),
                );
                next.push(target.to_string());
            }
            level_inputs = next;
            bit += 1;
        }
        Ok(())
    }
}

fn concat_body(parts: &[(String, u32)]) -> String {
    let mut widths: Vec<String> = parts.iter().map(|(_, w)| w.to_string()).collect();
    widths.resize(4, "0".to_string());
    let operands: Vec<&str> = parts.iter().map(|(op, _)| op.as_str()).collect();
    format!(".concat [{}], {}", widths.join(" "), operands.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::test_support::{draw, line};
    use vvpgen_core::{Design, DesignBuilder, NetKind, NexusId, ScopeKind};

    fn device(kind: LpmKind, inputs: usize, in_width: u32, width: u32) -> Design {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let mut ins: Vec<NexusId> = Vec::new();
        for i in 0..inputs {
            let s = b.add_signal(top, format!("i{i}"), NetKind::Reg, DataType::Logic, in_width);
            ins.push(b.design().signal(s).nexus[0]);
        }
        let y = b.add_signal(top, "y", NetKind::Tri, DataType::Logic, width);
        let yn = b.design().signal(y).nexus[0];
        b.add_lpm(top, "dev", kind, width, yn, &ins);
        b.finish()
    }

    #[test]
    fn arithmetic_and_compare_records() {
        let (text, _) = draw(&device(LpmKind::Add, 2, 8, 8));
        assert_eq!(line(&text, "LPM_0"), "LPM_0 .arith/sum 8, v0_0, v1_0;");
        let (text, _) = draw(&device(LpmKind::CmpGe, 2, 16, 1));
        assert_eq!(line(&text, "LPM_0"), "LPM_0 .cmp/ge 16, v0_0, v1_0;");
        let (text, _) = draw(&device(LpmKind::PartSelect { base: 4 }, 1, 8, 4));
        assert_eq!(line(&text, "LPM_0"), "LPM_0 .part v0_0, 4, 4;");
    }

    #[test]
    fn wrong_pin_count_is_fatal() {
        let design = device(LpmKind::Sub, 3, 8, 8);
        let opts = crate::options::CodegenOptions::default();
        let mut ctx = crate::context::GenContext::new(&design, &opts);
        let err = ScopeEmitter::new(&mut ctx).emit_all().unwrap_err();
        assert!(err.to_string().contains("needs 2 inputs but has 3"));
    }

    #[test]
    fn wide_concat_is_a_tree() {
        let kind = LpmKind::Concat {
            widths: vec![2; 5],
        };
        let (text, _) = draw(&device(kind, 5, 2, 10));
        assert_eq!(
            line(&text, "LPM_0/0/0"),
            "LPM_0/0/0 .concat [2 2 2 2], v0_0, v1_0, v2_0, v3_0;"
        );
        assert_eq!(line(&text, "LPM_0/0/1"), "LPM_0/0/1 .concat [2 0 0 0], v4_0;");
        assert_eq!(
            line(&text, "LPM_0 "),
            "LPM_0 .concat [8 2 0 0], LPM_0/0/0, LPM_0/0/1;"
        );
    }

    #[test]
    fn four_way_mux() {
        let (text, _) = draw(&device(LpmKind::Mux { size: 4 }, 5, 8, 8));
        assert_eq!(line(&text, "LPM_0/s0"), "LPM_0/s0 .part v4_0, 0, 1;");
        assert_eq!(
            line(&text, "LPM_0/0/1"),
            "LPM_0/0/1 .functor MUXZ 8, v2_0, v3_0, LPM_0/s0, C4<>;"
        );
        assert_eq!(
            line(&text, "LPM_0 "),
            "LPM_0 .functor MUXZ 8, LPM_0/0/0, LPM_0/0/1, LPM_0/s1, C4<>;"
        );
    }

    #[test]
    fn three_way_mux_pads_with_x() {
        let (text, _) = draw(&device(LpmKind::Mux { size: 3 }, 4, 2, 2));
        assert_eq!(
            line(&text, "LPM_0/0/1"),
            "LPM_0/0/1 .functor MUXZ 2, v2_0, C4<xx>, LPM_0/s0, C4<>;"
        );
    }

    #[test]
    fn flip_flop_without_enable() {
        let kind = LpmKind::Dff {
            negedge: false,
            has_enable: false,
        };
        let (text, _) = draw(&device(kind, 2, 1, 1));
        assert_eq!(line(&text, "LPM_0"), "LPM_0 .dff/p 1 v0_0, v1_0, C4<1>;");
    }

    #[test]
    fn continuous_function_call() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let f = b.add_scope("f", ScopeKind::Function, Some(top));
        let ret = b.add_signal(f, "f", NetKind::Reg, DataType::Logic, 8);
        let arg = b.add_signal(f, "x", NetKind::Reg, DataType::Logic, 8);
        b.scope_mut(f).ports = vec![ret, arg];
        let a = b.add_signal(top, "a", NetKind::Reg, DataType::Logic, 8);
        let y = b.add_signal(top, "y", NetKind::Tri, DataType::Logic, 8);
        let an = b.design().signal(a).nexus[0];
        let yn = b.design().signal(y).nexus[0];
        b.add_lpm(top, "call", LpmKind::Ufunc { func: f }, 8, yn, &[an]);
        let design = b.finish();

        let (text, _) = draw(&design);
        assert_eq!(
            line(&text, "LPM_0"),
            "LPM_0 .ufunc/vec4 TD_1, 8, v2_0 (v1_0) v0_0 S_1;"
        );
    }
}
