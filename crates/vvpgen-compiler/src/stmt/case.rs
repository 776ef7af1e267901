//! Case statements.

use vvpgen_core::{
    CaseItem, CaseKind, CaseQuality, CodegenResult, Domain, Expr, ExprKind, Span,
};

use super::StmtCompiler;
use crate::bytecode::{Label, Opcode};
use crate::emit::{FixedFlag, Flag, ops};
use crate::expr::{SysResult, compile_sys_call, imm};

impl<'a, 'd> StmtCompiler<'a, 'd> {
    /// Compile a case statement.
    ///
    /// The selector stays on the stack while the guards are tried in
    /// order; every arm starts by popping it.
    ///
    /// ```text
    ///     <selector>
    ///     %dup/vec4
    ///     <guard 1>
    ///     %cmp/e                 ; cmp/x, cmp/z for casex, casez
    ///     %jmp/1 T_arm1, 6
    ///     ...
    ///     %pop/vec4 1            ; no match
    ///     <default arm>
    ///     %jmp T_out
    /// T_arm1 ;
    ///     %pop/vec4 1
    ///     <arm 1>
    ///     %jmp T_out
    /// T_out ;
    /// ```
    pub fn compile_case(
        &mut self,
        kind: CaseKind,
        quality: CaseQuality,
        selector: &Expr,
        items: &[CaseItem],
        span: Span,
    ) -> CodegenResult<()> {
        let domain = match kind {
            CaseKind::Real => Domain::Real,
            _ if selector.ty.domain() == Domain::Str => Domain::Str,
            _ => Domain::Vec4,
        };
        let width = items
            .iter()
            .flat_map(|item| item.guards.iter())
            .map(|g| g.width)
            .fold(selector.width, u32::max);

        let out = self.em.local_label();
        let mut arms: Vec<(Label, &CaseItem)> = Vec::new();

        match domain {
            Domain::Vec4 => self.expr().eval_vec4(selector, width)?,
            Domain::Real => self.expr().eval_real(selector)?,
            _ => self.expr().eval_str(selector)?,
        }

        for item in items.iter().filter(|item| !item.is_default()) {
            let arm = self.em.local_label();
            for guard in &item.guards {
                let flag = self.case_compare(kind, domain, guard, width)?;
                self.em.jump_if(Opcode::Jmp1, arm.clone(), flag);
            }
            arms.push((arm, item));
        }

        // Nothing matched.
        let default = items.iter().find(|item| item.is_default());
        if default.is_none() && quality.requires_match() && self.ctx.options.warn_unique {
            let message = format!("{} case: none of the items matched", quality.keyword());
            compile_sys_call(
                &mut self.expr(),
                "$warning",
                &[Expr::string(message)],
                span,
                SysResult::Void,
            )?;
        }
        self.pop_selector(domain);
        if let Some(item) = default {
            self.compile_opt(item.body.as_ref())?;
        }
        if self.em.is_reachable() {
            self.em.jump(out.clone());
        }

        for (arm, item) in arms {
            self.em.emit_label(arm);
            self.pop_selector(domain);
            self.compile_opt(item.body.as_ref())?;
            if self.em.is_reachable() {
                self.em.jump(out.clone());
            }
        }
        self.em.emit_label(out);
        Ok(())
    }

    /// Compare a copy of the selector with one guard; returns the flag
    /// holding the match.
    fn case_compare(
        &mut self,
        kind: CaseKind,
        domain: Domain,
        guard: &Expr,
        width: u32,
    ) -> CodegenResult<Flag> {
        match domain {
            Domain::Real => {
                self.em.emit(Opcode::DupReal, vec![]);
                self.expr().eval_real(guard)?;
                self.em.emit(Opcode::CmpWr, vec![]);
                return Ok(FixedFlag::Eq.into());
            }
            Domain::Str | Domain::Obj => {
                self.em.emit(Opcode::DupStr, vec![]);
                self.expr().eval_str(guard)?;
                self.em.emit(Opcode::CmpStr, vec![]);
                return Ok(FixedFlag::Eq.into());
            }
            Domain::Vec4 => {}
        }

        self.em.emit(Opcode::DupVec4, vec![]);
        match kind {
            CaseKind::DontCareX => {
                self.expr().eval_vec4(guard, width)?;
                self.em.emit(Opcode::CmpX, vec![]);
                Ok(FixedFlag::Eq.into())
            }
            CaseKind::DontCareZ => {
                self.expr().eval_vec4(guard, width)?;
                self.em.emit(Opcode::CmpZ, vec![]);
                Ok(FixedFlag::Eq.into())
            }
            _ => {
                let immediate = match &guard.kind {
                    ExprKind::Number(bits) if width <= 64 => {
                        bits.resized(width, guard.signed).to_u64()
                    }
                    _ => None,
                };
                match immediate {
                    Some(value) => {
                        let (lo, hi) = imm(value as i64);
                        self.em.emit(Opcode::CmpiE, ops![lo, hi, width]);
                    }
                    None => {
                        self.expr().eval_vec4(guard, width)?;
                        self.em.emit(Opcode::CmpE, vec![]);
                    }
                }
                Ok(FixedFlag::Eeq.into())
            }
        }
    }

    fn pop_selector(&mut self, domain: Domain) {
        let op = match domain {
            Domain::Vec4 => Opcode::PopVec4,
            Domain::Real => Opcode::PopReal,
            _ => Opcode::PopStr,
        };
        self.em.emit(op, ops![1u32]);
    }
}

#[cfg(test)]
mod tests {
    use crate::options::CodegenOptions;
    use crate::stmt::test_support::{compile, compile_with};
    use vvpgen_core::{
        CaseItem, CaseKind, CaseQuality, DataType, Design, DesignBuilder, Expr, LValue, NetKind,
        ScopeKind, SignalId, Stmt, StmtKind, ValueType,
    };

    fn design() -> (Design, SignalId, SignalId) {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let sel = b.add_signal(top, "sel", NetKind::Reg, DataType::Logic, 2);
        let y = b.add_signal(top, "y", NetKind::Reg, DataType::Logic, 4);
        (b.finish(), sel, y)
    }

    fn item(guards: Vec<u64>, y: SignalId, value: u64) -> CaseItem {
        CaseItem {
            guards: guards.into_iter().map(|g| Expr::uint(g, 2)).collect(),
            body: Some(Stmt::assign(LValue::whole(y, 4), Expr::uint(value, 4))),
        }
    }

    fn case(kind: CaseKind, quality: CaseQuality, sel: SignalId, items: Vec<CaseItem>) -> Stmt {
        Stmt::new(StmtKind::Case {
            kind,
            quality,
            selector: Expr::signal(sel, ValueType::Logic, 2, false),
            items,
        })
    }

    #[test]
    fn exact_case_with_default() {
        let (design, sel, y) = design();
        let items = vec![
            item(vec![0, 1], y, 5),
            CaseItem {
                guards: vec![],
                body: Some(Stmt::assign(LValue::whole(y, 4), Expr::uint(9, 4))),
            },
        ];
        let stmt = case(CaseKind::Exact, CaseQuality::None, sel, items);
        assert_eq!(
            compile(&design, &stmt),
            vec![
                "%load/vec4 v0_0;",
                "%dup/vec4;",
                "%cmpi/e 0, 0, 2;",
                "%jmp/1 T_0.1, 6;",
                "%dup/vec4;",
                "%cmpi/e 1, 0, 2;",
                "%jmp/1 T_0.1, 6;",
                "%pop/vec4 1;",
                "%pushi/vec4 9, 0, 4;",
                "%store/vec4 v1_0, 0, 4;",
                "%jmp T_0.0;",
                "T_0.1 ;",
                "%pop/vec4 1;",
                "%pushi/vec4 5, 0, 4;",
                "%store/vec4 v1_0, 0, 4;",
                "%jmp T_0.0;",
                "T_0.0 ;",
            ]
        );
    }

    #[test]
    fn casez_uses_wildcard_compare() {
        let (design, sel, y) = design();
        let stmt = case(CaseKind::DontCareZ, CaseQuality::None, sel, vec![item(vec![2], y, 1)]);
        let text = compile(&design, &stmt);
        assert_eq!(text[2..5], ["%pushi/vec4 2, 0, 2;", "%cmp/z;", "%jmp/1 T_0.1, 4;"]);
    }

    #[test]
    fn unique_case_warns_when_nothing_matches() {
        let (design, sel, y) = design();
        let stmt = case(CaseKind::Exact, CaseQuality::Unique, sel, vec![item(vec![3], y, 1)]);
        let text = compile(&design, &stmt);
        assert!(text.contains(
            &"%vpi_call 0 0 \"$warning\", \"unique case: none of the items matched\" {0 0 0};"
                .to_string()
        ));

        let quiet = CodegenOptions::default().with_warn_unique(false);
        let (em, _) = compile_with(&design, &quiet, &stmt);
        let text = crate::expr::test_support::text(&em);
        assert!(!text.iter().any(|l| l.contains("$warning")));
    }

    #[test]
    fn real_case_duplicates_on_the_real_stack() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let r = b.add_signal(top, "r", NetKind::Reg, DataType::Real, 1);
        let design = b.finish();
        let stmt = Stmt::new(StmtKind::Case {
            kind: CaseKind::Real,
            quality: CaseQuality::None,
            selector: Expr::signal(r, ValueType::Real, 1, true),
            items: vec![CaseItem {
                guards: vec![Expr::real(1.0)],
                body: None,
            }],
        });
        let text = compile(&design, &stmt);
        assert_eq!(text[1], "%dup/real;");
        assert!(text.contains(&"%cmp/wr;".to_string()));
        assert!(text.contains(&"%pop/real 1;".to_string()));
    }
}
