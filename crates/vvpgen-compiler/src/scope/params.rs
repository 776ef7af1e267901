//! Parameters, class definitions and enumerations.

use vvpgen_core::{ClassId, EnumId, Param, ParamValue};

use super::ScopeEmitter;
use crate::bytecode::{Label, Line, escape_string};
use crate::codec::{c4_literal, cr_literal};
use crate::expr::darray_code;

impl ScopeEmitter<'_, '_> {
    /// ```text
    /// P_0 .param/l "WIDTH" 0 0 3, +C4<00001000>;
    /// P_1 .param/real "SCALE" 1 0 4, Cr<m4000000000000000g3ffe>;
    /// P_2 .param/str "NAME" 0 0 5, "top";
    /// ```
    pub(super) fn draw_param(&mut self, param: &Param) {
        let label = self.ctx.param_label();
        let head = format!(
            "\"{}\" {} {} {}",
            escape_string(&param.name),
            u8::from(param.local),
            param.span.file.index(),
            param.span.line
        );
        let body = match &param.value {
            ParamValue::Bits { value, signed } => {
                let sign = if *signed { "+" } else { "" };
                format!(".param/l {head}, {sign}{}", c4_literal(value))
            }
            ParamValue::Real(value) => format!(".param/real {head}, {}", cr_literal(*value)),
            ParamValue::Str(text) => format!(".param/str {head}, \"{}\"", escape_string(text)),
        };
        self.ctx.decl(label, body);
    }

    /// A class definition spans several lines:
    ///
    /// ```text
    /// CL_0 .class "packet" [2]
    ///   0: "id", "v8"
    ///   1: "name", "S"
    ///  ;
    /// ```
    pub(super) fn draw_class(&mut self, id: ClassId) {
        let class = self.design().class(id);
        self.ctx.push_decl(Line::Directive(format!(
            "{} .class \"{}\" [{}]",
            Label::Class(id),
            escape_string(&class.name),
            class.properties.len()
        )));
        for (index, prop) in class.properties.iter().enumerate() {
            self.ctx.push_decl(Line::Directive(format!(
                "  {index}: \"{}\", \"{}\"",
                escape_string(&prop.name),
                darray_code(&prop.ty, prop.width, prop.signed)
            )));
        }
        self.ctx.push_decl(Line::Directive(" ;".into()));
    }

    /// ```text
    /// enum0 .enum4/u 2, "IDLE" 00, "BUSY" 01;
    /// ```
    pub(super) fn draw_enum(&mut self, id: EnumId) {
        let ty = self.design().enumeration(id);
        let sign = if ty.signed { "s" } else { "u" };
        let mut body = format!(".enum4/{sign} {}", ty.base_width);
        for (name, value) in &ty.names {
            body.push_str(&format!(
                ", \"{}\" {}",
                escape_string(name),
                value.resized(ty.base_width, ty.signed).to_msb_string()
            ));
        }
        self.ctx.decl(Label::Enum(id), body);
    }
}

#[cfg(test)]
mod tests {
    use crate::scope::test_support::{draw, line};
    use vvpgen_core::{
        Bits4, ClassType, DataType, DesignBuilder, EnumType, FileId, Param, ParamValue, Property,
        ScopeKind, Span,
    };

    fn param(name: &str, value: ParamValue) -> Param {
        Param {
            name: name.into(),
            value,
            local: false,
            span: Span::new(FileId::new(0), 3),
        }
    }

    #[test]
    fn parameter_records() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        b.add_param(
            top,
            param(
                "WIDTH",
                ParamValue::Bits {
                    value: Bits4::from_u64(8, 4),
                    signed: true,
                },
            ),
        );
        b.add_param(top, param("NAME", ParamValue::Str("top".into())));
        let design = b.finish();

        let (text, _) = draw(&design);
        assert_eq!(line(&text, "P_0"), "P_0 .param/l \"WIDTH\" 0 0 3, +C4<1000>;");
        assert_eq!(line(&text, "P_1"), "P_1 .param/str \"NAME\" 0 0 3, \"top\";");
    }

    #[test]
    fn class_definition_lines() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        b.add_class(
            top,
            ClassType {
                name: "packet".into(),
                properties: vec![
                    Property {
                        name: "id".into(),
                        ty: DataType::Logic,
                        width: 8,
                        signed: false,
                    },
                    Property {
                        name: "name".into(),
                        ty: DataType::String,
                        width: 0,
                        signed: false,
                    },
                ],
            },
        );
        let design = b.finish();

        let (text, _) = draw(&design);
        let at = text
            .iter()
            .position(|l| l == "CL_0 .class \"packet\" [2]")
            .unwrap();
        assert_eq!(text[at + 1], "  0: \"id\", \"v8\"");
        assert_eq!(text[at + 2], "  1: \"name\", \"S\"");
        assert_eq!(text[at + 3], " ;");
    }

    #[test]
    fn enumeration_record() {
        let mut b = DesignBuilder::new();
        let top = b.add_scope("top", ScopeKind::Module, None);
        b.add_enum(
            top,
            EnumType {
                base_width: 2,
                signed: false,
                names: vec![
                    ("IDLE".into(), Bits4::from_u64(0, 2)),
                    ("BUSY".into(), Bits4::from_u64(1, 2)),
                ],
                span: Span::default(),
            },
        );
        let design = b.finish();

        let (text, _) = draw(&design);
        assert_eq!(
            line(&text, "enum0"),
            "enum0 .enum4/u 2, \"IDLE\" 00, \"BUSY\" 01;"
        );
    }
}
