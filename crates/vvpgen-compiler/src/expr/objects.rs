//! Class handles, dynamic arrays and queues.

use vvpgen_core::{
    CodegenError, CodegenResult, DataType, Domain, Expr, ExprKind, SignalId, ValueType,
};

use super::signals::array_address;
use super::{ExprCompiler, calls, ternary};
use crate::bytecode::{Label, Opcode};
use crate::emit::ops;

pub(super) fn compile_object(compiler: &mut ExprCompiler<'_, '_>, expr: &Expr) -> CodegenResult<()> {
    match &expr.kind {
        ExprKind::Null => compiler.em().emit(Opcode::Null, vec![]),
        ExprKind::Signal { sig, word: None } => {
            compiler
                .em()
                .emit(Opcode::LoadObj, ops![ExprCompiler::var(*sig)]);
        }
        ExprKind::Signal {
            sig,
            word: Some(index),
        } => {
            if !compiler.design().signal(*sig).is_array() {
                compiler.unsupported(expr.span, "element of an object container", Domain::Obj, 1);
                return Ok(());
            }
            match array_address(compiler, *sig, index)? {
                Some(reg) => {
                    compiler
                        .em()
                        .emit(Opcode::LoadObja, ops![Label::Array(*sig), reg]);
                    compiler.free_word(reg);
                }
                None => compiler.em().emit(Opcode::Null, vec![]),
            }
        }
        ExprKind::New(class) => {
            compiler.em().emit(Opcode::NewCobj, ops![Label::Class(*class)]);
        }
        ExprKind::NewDarray { elem, size, init } => {
            new_darray(compiler, elem, size, init.as_deref(), expr)?;
        }
        ExprKind::ShallowCopy(source) => {
            let ValueType::Class(class) = expr.ty else {
                compiler.unsupported(expr.span, "copy of a non-class object", Domain::Obj, 1);
                return Ok(());
            };
            compiler.em().emit(Opcode::NewCobj, ops![Label::Class(class)]);
            compiler.eval_obj(source)?;
            compiler.em().emit(Opcode::Scopy, vec![]);
        }
        ExprKind::Property { base, index, word } => {
            load_property(compiler, *base, *index, word.as_deref(), expr, Domain::Obj)?;
        }
        ExprKind::Ternary {
            cond,
            then,
            otherwise,
        } => ternary::compile_ternary(compiler, cond, then, otherwise, expr, Domain::Obj)?,
        ExprKind::UserCall { func, args } => {
            calls::compile_user_call(compiler, *func, args, expr, Domain::Obj)?;
        }
        ExprKind::Cast(inner) => compiler.eval_obj(inner)?,
        ExprKind::ArrayPattern(_) => compiler.unsupported(
            expr.span,
            "assignment pattern outside an array constructor",
            Domain::Obj,
            1,
        ),
        _ => compiler.unsupported(
            expr.span,
            "expression cannot be evaluated as an object",
            Domain::Obj,
            1,
        ),
    }
    Ok(())
}

/// Element type code of `%new/darray`.
pub(crate) fn darray_code(elem: &DataType, width: u32, signed: bool) -> String {
    let sign = if signed { "s" } else { "" };
    match elem {
        DataType::Logic => format!("{sign}v{width}"),
        DataType::Bool => format!("{sign}b{width}"),
        DataType::Real => "r".to_string(),
        DataType::String => "S".to_string(),
        _ => "o".to_string(),
    }
}

/// `new[size]`, then one `%set/dar/obj` per initialiser element.
fn new_darray(
    compiler: &mut ExprCompiler<'_, '_>,
    elem: &DataType,
    size: &Expr,
    init: Option<&Expr>,
    expr: &Expr,
) -> CodegenResult<()> {
    let reg = compiler.eval_index(size)?;
    let code = darray_code(elem, expr.width, expr.signed);
    compiler
        .em()
        .emit(Opcode::NewDarray, ops![reg, code.as_str()]);
    compiler.free_word(reg);

    let Some(init) = init else {
        return Ok(());
    };
    let ExprKind::ArrayPattern(items) = &init.kind else {
        compiler
            .ctx()
            .error(init.span, "dynamic array initialiser is not a pattern");
        return Ok(());
    };
    for (i, item) in items.iter().enumerate() {
        let op = match elem.domain() {
            Domain::Vec4 => {
                compiler.eval_vec4(item, expr.width)?;
                Opcode::SetDarObjVec4
            }
            Domain::Real => {
                compiler.eval_real(item)?;
                Opcode::SetDarObjReal
            }
            Domain::Str => {
                compiler.eval_str(item)?;
                Opcode::SetDarObjStr
            }
            Domain::Obj => {
                compiler
                    .ctx()
                    .error(item.span, "object elements in an array initialiser");
                continue;
            }
        };
        let at = compiler.load_index(i as i64)?;
        compiler.em().emit(op, ops![at]);
        compiler.free_word(at);
    }
    Ok(())
}

/// Push property `index` of the object held in `base`.
///
/// The object is loaded, the property pushed onto its own domain's stack
/// and the object popped again. An object-valued property is pushed onto
/// the object stack above its owner, so the owner is popped from beneath.
pub(super) fn load_property(
    compiler: &mut ExprCompiler<'_, '_>,
    base: SignalId,
    index: u32,
    word: Option<&Expr>,
    expr: &Expr,
    domain: Domain,
) -> CodegenResult<()> {
    let design = compiler.design();
    let prop = match &design.signal(base).data {
        DataType::Class(class) => design.class(*class).properties.get(index as usize),
        _ => None,
    };
    let Some(prop) = prop else {
        return Err(CodegenError::invariant(
            format!("{} has no property {index}", design.signal(base).name),
            expr.span,
        ));
    };

    compiler
        .em()
        .emit(Opcode::LoadObj, ops![ExprCompiler::var(base)]);
    match domain {
        Domain::Vec4 => {
            compiler.em().emit(Opcode::PropV, ops![index]);
            compiler.em().emit(Opcode::PopObj, ops![1u32, 0u32]);
            compiler.resize(prop.width, expr.width, prop.signed);
        }
        Domain::Real => {
            compiler.em().emit(Opcode::PropR, ops![index]);
            compiler.em().emit(Opcode::PopObj, ops![1u32, 0u32]);
        }
        Domain::Str => {
            compiler.em().emit(Opcode::PropStr, ops![index]);
            compiler.em().emit(Opcode::PopObj, ops![1u32, 0u32]);
        }
        Domain::Obj => {
            let word = word.and_then(Expr::const_value).unwrap_or(0);
            compiler.em().emit(Opcode::PropObj, ops![index, word]);
            compiler.em().emit(Opcode::PopObj, ops![1u32, 1u32]);
        }
    }
    Ok(())
}
