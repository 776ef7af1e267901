//! Structural delay records.

use std::fmt;

use crate::bytecode::{Label, Line};
use super::constant::c4_u64;

/// One of the rise, fall and decay delays, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum DelayTerm {
    Const(u64),
    /// Label of the net carrying a run-time delay value.
    Net(String),
}

/// The label a delayed node's undelayed value is drawn under.
pub fn undelayed(label: &Label) -> Label {
    label.sub("d")
}

/// Records that put `label` `.delay` in front of `input`.
///
/// Constant delays go inline. When any term is a net, constant terms
/// become 64-bit constant functors so all three are nets.
pub fn delay_lines(label: &Label, width: u32, input: &str, terms: [DelayTerm; 3]) -> Vec<Line> {
    if let [DelayTerm::Const(r), DelayTerm::Const(f), DelayTerm::Const(d)] = &terms {
        return vec![Line::decl(
            label.clone(),
            format!(".delay {width} ({r},{f},{d}) {input}"),
        )];
    }

    let mut lines = Vec::new();
    let mut names = Vec::with_capacity(3);
    for (term, suffix) in terms.iter().zip(["tr", "tf", "td"]) {
        match term {
            DelayTerm::Net(net) => names.push(net.clone()),
            DelayTerm::Const(value) => {
                let node = label.sub(suffix);
                lines.push(Line::decl(
                    node.clone(),
                    format!(
                        ".functor BUFT 1, {}, C4<0>, C4<0>, C4<0>",
                        c4_u64(*value)
                    ),
                ));
                names.push(node.to_string());
            }
        }
    }
    lines.push(Line::decl(
        label.clone(),
        format!(
            ".delay {width} {input}, {}, {}, {}",
            names[0], names[1], names[2]
        ),
    ));
    lines
}

impl fmt::Display for DelayTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayTerm::Const(v) => write!(f, "{v}"),
            DelayTerm::Net(n) => f.write_str(n),
        }
    }
}
