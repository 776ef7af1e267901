//! Module-path delay records.
//!
//! A signal with specify paths is driven through a `.modpath` node instead
//! of directly. The node needs the drivers of every path source, which may
//! not be drawn yet when the signal is, so records are queued and written
//! after the scope tree.

use vvpgen_core::{Edge, SignalId};

use crate::bytecode::{Label, Line};

/// A queued module-path record.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingModpath {
    pub label: Label,
    /// The signal the path drives.
    pub signal: SignalId,
    /// The resolved input that feeds the path.
    pub driver: String,
}

/// One resolved path source.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSource {
    pub driver: String,
    pub edge: Option<Edge>,
    /// Transition delays in 01, 10, 0z, z1, 1z, z0, 0x, x1, 1x, x0, xz, zx
    /// order.
    pub delays: [u64; 12],
    /// `Some("")` for a conditional path with no condition net.
    pub condition: Option<String>,
    /// The source port signal.
    pub port: Label,
}

/// The `.modpath` record of one path target.
pub fn modpath_line(
    label: Label,
    width: u32,
    driver: &str,
    target: &Label,
    sources: &[PathSource],
) -> Line {
    let mut body = format!(".modpath {width} {driver} {target}");
    for src in sources {
        let edge = match src.edge {
            Some(Edge::Pos) => " +",
            Some(Edge::Neg) => " -",
            _ => "",
        };
        let d = &src.delays;
        body.push_str(&format!(
            ",\n   {}{edge} ({},{},{}, {},{},{}, {},{},{}, {},{},{}",
            src.driver, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7], d[8], d[9], d[10], d[11]
        ));
        if let Some(cond) = &src.condition {
            body.push_str(&format!(" ? {cond}"));
        }
        body.push_str(&format!(") {}", src.port));
    }
    Line::decl(label, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_lists_each_source() {
        let target = Label::Signal(SignalId::new(2), 0);
        let src = PathSource {
            driver: "v1_0".into(),
            edge: Some(Edge::Pos),
            delays: [1; 12],
            condition: None,
            port: Label::Signal(SignalId::new(1), 0),
        };
        let line = modpath_line(Label::Modpath(0), 1, "L_5", &target, &[src]);
        let text = line.to_string();
        assert!(text.starts_with("V_0 .modpath 1 L_5 v2_0,\n   v1_0 + (1,1,1, "));
        assert!(text.ends_with(") v1_0;"));
    }

    #[test]
    fn conditional_sources_name_their_condition() {
        let src = PathSource {
            driver: "v1_0".into(),
            edge: None,
            delays: [0; 12],
            condition: Some("v3_0".into()),
            port: Label::Signal(SignalId::new(1), 0),
        };
        let line = modpath_line(
            Label::Modpath(1),
            1,
            "v9_0",
            &Label::Signal(SignalId::new(9), 0),
            &[src],
        );
        assert!(line.to_string().contains(" ? v3_0) v1_0"));
    }
}
