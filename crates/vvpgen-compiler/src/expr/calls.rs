//! User function calls and system calls.

use vvpgen_core::{
    CodegenError, CodegenResult, DataType, Domain, Expr, ExprKind, ScopeId, SignalId, Span,
};

use super::{ExprCompiler, element_domain};
use crate::bytecode::{Label, Opcode, Operand};
use crate::emit::ops;

/// What a system call leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysResult {
    /// A task: nothing.
    Void,
    /// A vector of the given width.
    Vec4(u32),
    Real,
    Str,
}

// =============================================================================
// User functions
// =============================================================================

/// Call a user function and push its return value.
///
/// Arguments are evaluated onto the stacks first, then the (automatic)
/// frame is allocated and the arguments are popped into the formal ports
/// last to first. The body runs as a child thread.
pub(super) fn compile_user_call(
    compiler: &mut ExprCompiler<'_, '_>,
    func: ScopeId,
    args: &[Expr],
    expr: &Expr,
    domain: Domain,
) -> CodegenResult<()> {
    let design = compiler.design();
    let scope = design.scope(func);
    let Some(ret) = scope.return_port() else {
        return Err(CodegenError::invariant(
            format!("{} has no return value", design.scope_path(func)),
            expr.span,
        ));
    };
    let params = &scope.ports[1..];
    if params.len() != args.len() {
        return Err(CodegenError::invariant(
            format!(
                "{} takes {} arguments but the call passes {}",
                design.scope_path(func),
                params.len(),
                args.len()
            ),
            expr.span,
        ));
    }
    let ret_domain = design.signal(ret).data.domain();
    if ret_domain != domain {
        return Err(CodegenError::invariant(
            format!("{} called as a {domain} value", design.scope_path(func)),
            expr.span,
        ));
    }

    for (arg, &port) in args.iter().zip(params) {
        push_for_port(compiler, arg, port)?;
    }
    if scope.is_automatic() {
        compiler.em().emit(Opcode::Alloc, ops![Label::Scope(func)]);
    }
    for &port in params.iter().rev() {
        store_port(compiler, port);
    }

    compiler
        .em()
        .emit(Opcode::Fork, ops![Label::TaskDef(func), Label::Scope(func)]);
    compiler.em().emit(Opcode::Join, vec![]);

    let ret_sig = design.signal(ret);
    let var = ExprCompiler::var(ret);
    match domain {
        Domain::Vec4 => {
            compiler.em().emit(Opcode::LoadVec4, ops![var]);
            compiler.resize(ret_sig.width(), expr.width, ret_sig.signed);
        }
        Domain::Real => compiler.em().emit(Opcode::LoadReal, ops![var]),
        Domain::Str => compiler.em().emit(Opcode::LoadStr, ops![var]),
        Domain::Obj => compiler.em().emit(Opcode::LoadObj, ops![var]),
    }
    if scope.is_automatic() {
        compiler.em().emit(Opcode::Free, ops![Label::Scope(func)]);
    }
    Ok(())
}

/// Push an argument in the domain and width of the port it is passed to.
fn push_for_port(
    compiler: &mut ExprCompiler<'_, '_>,
    arg: &Expr,
    port: SignalId,
) -> CodegenResult<()> {
    let signal = compiler.design().signal(port);
    match signal.data.domain() {
        Domain::Vec4 => compiler.eval_vec4(arg, signal.width()),
        Domain::Real => compiler.eval_real(arg),
        Domain::Str => compiler.eval_str(arg),
        Domain::Obj => compiler.eval_obj(arg),
    }
}

/// Pop the top value of the port's domain into the port.
fn store_port(compiler: &mut ExprCompiler<'_, '_>, port: SignalId) {
    let signal = compiler.design().signal(port);
    let var = ExprCompiler::var(port);
    compiler.em().regs.forget_signal(port);
    match signal.data.domain() {
        Domain::Vec4 => {
            compiler
                .em()
                .emit(Opcode::StoreVec4, ops![var, 0u32, signal.width()]);
        }
        Domain::Real => compiler.em().emit(Opcode::StoreReal, ops![var]),
        Domain::Str => compiler.em().emit(Opcode::StoreStr, ops![var]),
        Domain::Obj => compiler.em().emit(Opcode::StoreObj, ops![var]),
    }
}

// =============================================================================
// System calls
// =============================================================================

/// Call a system task or function.
///
/// Literals, whole signals, strings and scopes are passed inline. Every
/// other argument is evaluated onto its stack first and passed as a
/// reference to its stack position; the trailing counts tell the runtime
/// how many values to pop.
pub(crate) fn compile_sys_call(
    compiler: &mut ExprCompiler<'_, '_>,
    name: &str,
    args: &[Expr],
    span: Span,
    result: SysResult,
) -> CodegenResult<()> {
    if matches!(name, "$pop_back" | "$pop_front") && result != SysResult::Void {
        return queue_pop(compiler, name, args, span, result);
    }

    enum Arg {
        Inline(Operand),
        Pushed {
            domain: Domain,
            width: u32,
            signed: bool,
        },
    }

    let mut passed = Vec::with_capacity(args.len());
    for arg in args {
        let inline = match &arg.kind {
            ExprKind::Number(bits) => Some(Operand::Bits {
                value: bits.clone(),
                signed: arg.signed,
            }),
            ExprKind::String(text) => Some(Operand::Str(text.clone())),
            ExprKind::Scope(scope) => Some(Label::Scope(*scope).into()),
            ExprKind::Signal { sig, word: None } => {
                if compiler.design().signal(*sig).is_array() {
                    Some(Label::Array(*sig).into())
                } else {
                    Some(ExprCompiler::var(*sig).into())
                }
            }
            _ => None,
        };
        if let Some(operand) = inline {
            passed.push(Arg::Inline(operand));
            continue;
        }
        if arg.ty.domain() == Domain::Obj {
            compiler
                .ctx()
                .error(arg.span, format!("object argument to {name} is not supported"));
            passed.push(Arg::Inline(Operand::Str(String::new())));
            continue;
        }
        let domain = compiler.eval(arg)?;
        passed.push(Arg::Pushed {
            domain,
            width: arg.width,
            signed: arg.signed,
        });
    }

    // Stack references count from the top: the last argument evaluated in
    // a domain is at depth 0.
    let mut remaining = [0u32; 4];
    for arg in &passed {
        if let Arg::Pushed { domain, .. } = arg {
            remaining[domain.slot()] += 1;
        }
    }
    let counts = Operand::Counts {
        vec4: remaining[Domain::Vec4.slot()],
        real: remaining[Domain::Real.slot()],
        str: remaining[Domain::Str.slot()],
    };

    let (file, line) = ExprCompiler::location(span);
    let mut operands = ops![file, line, name];
    let op = match result {
        SysResult::Void => Opcode::VpiCall,
        SysResult::Vec4(width) => {
            operands.push(width.into());
            Opcode::VpiFunc
        }
        SysResult::Real => Opcode::VpiFuncR,
        SysResult::Str => Opcode::VpiFuncS,
    };
    for arg in passed {
        operands.push(match arg {
            Arg::Inline(operand) => operand,
            Arg::Pushed {
                domain,
                width,
                signed,
            } => {
                remaining[domain.slot()] -= 1;
                Operand::StackRef {
                    domain,
                    depth: remaining[domain.slot()],
                    width,
                    signed,
                }
            }
        });
    }
    operands.push(counts);
    compiler.em().emit(op, operands);
    Ok(())
}

/// The queue signal a queue method is applied to.
fn queue_target(
    compiler: &ExprCompiler<'_, '_>,
    name: &str,
    args: &[Expr],
    span: Span,
) -> CodegenResult<(SignalId, Option<u32>)> {
    if let Some(Expr {
        kind: ExprKind::Signal { sig, word: None },
        ..
    }) = args.first()
        && let DataType::Queue(_, max) = &compiler.design().signal(*sig).data
    {
        return Ok((*sig, *max));
    }
    Err(CodegenError::invariant(
        format!("{name} needs a queue as its first argument"),
        span,
    ))
}

/// `q.pop_back()` / `q.pop_front()`.
fn queue_pop(
    compiler: &mut ExprCompiler<'_, '_>,
    name: &str,
    args: &[Expr],
    span: Span,
    result: SysResult,
) -> CodegenResult<()> {
    let (queue, _) = queue_target(compiler, name, args, span)?;
    let back = name == "$pop_back";
    let var = ExprCompiler::var(queue);
    match result {
        SysResult::Vec4(width) => {
            let op = if back {
                Opcode::QpopBVec4
            } else {
                Opcode::QpopFVec4
            };
            compiler.em().emit(op, ops![var, width]);
        }
        SysResult::Real => {
            let op = if back { Opcode::QpopBR } else { Opcode::QpopFR };
            compiler.em().emit(op, ops![var]);
        }
        SysResult::Str => {
            let op = if back {
                Opcode::QpopBStr
            } else {
                Opcode::QpopFStr
            };
            compiler.em().emit(op, ops![var]);
        }
        SysResult::Void => {}
    }
    Ok(())
}

/// `q.push_back(v)` / `q.push_front(v)`.
pub(crate) fn queue_push(
    compiler: &mut ExprCompiler<'_, '_>,
    name: &str,
    args: &[Expr],
    span: Span,
) -> CodegenResult<()> {
    let (queue, max) = queue_target(compiler, name, args, span)?;
    let Some(value) = args.get(1) else {
        return Err(CodegenError::invariant(
            format!("{name} needs a value to push"),
            span,
        ));
    };
    let signal = compiler.design().signal(queue);
    let back = name == "$push_back";
    let domain = element_domain(&signal.data);
    let width = signal.width();

    match domain {
        Domain::Vec4 => compiler.eval_vec4(value, width)?,
        Domain::Real => compiler.eval_real(value)?,
        Domain::Str => compiler.eval_str(value)?,
        Domain::Obj => {
            compiler
                .ctx()
                .error(span, "queues of objects are not supported");
            return Ok(());
        }
    }
    let limit = compiler.load_index(max.map_or(0, i64::from))?;
    let var = ExprCompiler::var(queue);
    let (op, operands) = match (domain, back) {
        (Domain::Vec4, true) => (Opcode::StoreQbVec4, ops![var, limit, width]),
        (Domain::Vec4, false) => (Opcode::StoreQfVec4, ops![var, limit, width]),
        (Domain::Real, true) => (Opcode::StoreQbR, ops![var, limit]),
        (Domain::Real, false) => (Opcode::StoreQfR, ops![var, limit]),
        (_, true) => (Opcode::StoreQbStr, ops![var, limit]),
        (_, false) => (Opcode::StoreQfStr, ops![var, limit]),
    };
    compiler.em().emit(op, operands);
    compiler.free_word(limit);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::test_support::{text, with_compiler};
    use vvpgen_core::{
        BinaryOp, Design, DesignBuilder, NetKind, ScopeFlags, ScopeKind, ValueType,
    };

    fn function(automatic: bool) -> (Design, ScopeId, SignalId) {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let f = b.add_scope("f", ScopeKind::Function, Some(top));
        let ret = b.add_signal(f, "f", NetKind::Reg, DataType::Logic, 8);
        let x = b.add_signal(f, "x", NetKind::Reg, DataType::Logic, 8);
        b.scope_mut(f).ports = vec![ret, x];
        if automatic {
            b.scope_mut(f).flags |= ScopeFlags::AUTOMATIC;
        }
        let a = b.add_signal(top, "a", NetKind::Reg, DataType::Logic, 8);
        (b.finish(), f, a)
    }

    fn call(f: ScopeId, args: Vec<Expr>) -> Expr {
        Expr::new(
            ExprKind::UserCall { func: f, args },
            ValueType::Logic,
            8,
            false,
        )
    }

    #[test]
    fn static_function_call() {
        let (design, f, _) = function(false);
        let e = call(f, vec![Expr::uint(4, 8)]);
        let em = with_compiler(&design, |ctx, em, scope| {
            ExprCompiler::new(ctx, em, scope).eval_vec4(&e, 8).unwrap();
        });
        assert_eq!(
            text(&em),
            vec![
                "%pushi/vec4 4, 0, 8;",
                "%store/vec4 v1_0, 0, 8;",
                "%fork TD_1, S_1;",
                "%join;",
                "%load/vec4 v0_0;",
            ]
        );
        assert_eq!(em.depth(Domain::Vec4), 1);
    }

    #[test]
    fn automatic_function_gets_a_frame() {
        let (design, f, _) = function(true);
        let e = call(f, vec![Expr::uint(4, 8)]);
        let em = with_compiler(&design, |ctx, em, scope| {
            ExprCompiler::new(ctx, em, scope).eval_vec4(&e, 8).unwrap();
        });
        let t = text(&em);
        assert_eq!(t[1], "%alloc S_1;");
        assert_eq!(t.last().map(String::as_str), Some("%free S_1;"));
    }

    #[test]
    fn argument_count_mismatch_is_fatal() {
        let (design, f, _) = function(false);
        let e = call(f, vec![]);
        with_compiler(&design, |ctx, em, scope| {
            let err = ExprCompiler::new(ctx, em, scope)
                .eval_vec4(&e, 8)
                .unwrap_err();
            assert!(matches!(err, CodegenError::InvariantViolation { .. }));
        });
    }

    #[test]
    fn system_call_arguments() {
        let (design, _, a) = function(false);
        let sum = Expr::binary(
            BinaryOp::Add,
            Expr::signal(a, ValueType::Logic, 8, false),
            Expr::uint(1, 8),
            8,
        );
        let args = vec![
            Expr::string("%d %d %f"),
            Expr::signal(a, ValueType::Logic, 8, false),
            sum.clone(),
            sum,
            Expr::real(0.5),
        ];
        let em = with_compiler(&design, |ctx, em, scope| {
            compile_sys_call(
                &mut ExprCompiler::new(ctx, em, scope),
                "$display",
                &args,
                Span::default(),
                SysResult::Void,
            )
            .unwrap();
        });
        assert_eq!(em.depths(), [0; 4]);
        let t = text(&em);
        assert_eq!(
            t.last().map(String::as_str),
            Some(
                "%vpi_call 0 0 \"$display\", \"%d %d %f\", v2_0, S<1,vec4,u8>, \
                 S<0,vec4,u8>, W<0,r> {2 1 0};"
            )
        );
    }

    #[test]
    fn system_function_result() {
        let design = Design::default();
        let em = with_compiler(&design, |ctx, em, scope| {
            compile_sys_call(
                &mut ExprCompiler::new(ctx, em, scope),
                "$time",
                &[],
                Span::default(),
                SysResult::Vec4(64),
            )
            .unwrap();
        });
        assert_eq!(text(&em), vec!["%vpi_func 0 0 \"$time\", 64 {0 0 0};"]);
        assert_eq!(em.depth(Domain::Vec4), 1);
    }

    #[test]
    fn queue_methods() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        let q = b.add_signal(
            top,
            "q",
            NetKind::Reg,
            DataType::Queue(Box::new(DataType::Logic), Some(15)),
            8,
        );
        let design = b.finish();
        let qv = Expr::signal(q, ValueType::Queue, 1, false);
        let em = with_compiler(&design, |ctx, em, scope| {
            let mut c = ExprCompiler::new(ctx, em, scope);
            queue_push(&mut c, "$push_back", &[qv.clone(), Expr::uint(3, 8)], Span::default())
                .unwrap();
            compile_sys_call(&mut c, "$pop_front", &[qv.clone()], Span::default(), SysResult::Vec4(8))
                .unwrap();
        });
        assert_eq!(
            text(&em),
            vec![
                "%pushi/vec4 3, 0, 8;",
                "%ix/load 4, 15, 0;",
                "%store/qb/v v0_0, 4, 8;",
                "%qpop/f/v v0_0, 8;",
            ]
        );
        assert_eq!(em.regs.outstanding(), (0, 0));
    }
}
