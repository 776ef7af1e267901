//! Instructions, program lines and the assembled program text.

use std::fmt;

use super::{Label, Opcode, Operand, StackEffect};

/// One instruction of a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: Opcode,
    pub args: Vec<Operand>,
}

impl Instruction {
    pub fn new(op: Opcode, args: Vec<Operand>) -> Self {
        Self { op, args }
    }

    #[inline]
    pub fn effect(&self) -> StackEffect {
        self.op.effect(&self.args)
    }

    /// The jump target, for jump instructions.
    pub fn target(&self) -> Option<&Label> {
        if self.op.is_jump() {
            self.args.first().and_then(Operand::as_label)
        } else {
            None
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.op.mnemonic())?;
        // System calls and line markers lead with `file line name`,
        // separated by spaces.
        let spaced = match self.op {
            Opcode::VpiCall
            | Opcode::VpiFunc
            | Opcode::VpiFuncR
            | Opcode::VpiFuncS
            | Opcode::FileLine => 3,
            _ => 0,
        };
        for (i, arg) in self.args.iter().enumerate() {
            if i < spaced || i == 0 || matches!(arg, Operand::Counts { .. }) {
                write!(f, " {arg}")?;
            } else {
                write!(f, ", {arg}")?;
            }
        }
        Ok(())
    }
}

/// Start-up mode of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadFlag {
    /// Run before ordinary threads at time zero.
    Push,
    /// Run when simulation finishes.
    Final,
}

impl ThreadFlag {
    pub fn keyword(self) -> &'static str {
        match self {
            ThreadFlag::Push => "$push",
            ThreadFlag::Final => "$final",
        }
    }
}

/// One line of the program text.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// A header or trailer directive, written verbatim.
    Directive(String),
    /// A structural record, optionally labeled: `<label> <body>;`.
    Decl { label: Option<Label>, body: String },
    /// A code label: `<label> ;`.
    Label(Label),
    Instr(Instruction),
    /// Switch the scope subsequent code belongs to.
    Scope(Label),
    /// Declare a thread entry point.
    Thread {
        entry: Label,
        flag: Option<ThreadFlag>,
    },
    Comment(String),
}

impl Line {
    pub fn decl(label: Label, body: impl Into<String>) -> Self {
        Line::Decl {
            label: Some(label),
            body: body.into(),
        }
    }

    /// An unlabeled record such as `.port_info` or `.timescale`.
    pub fn record(body: impl Into<String>) -> Self {
        Line::Decl {
            label: None,
            body: body.into(),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Directive(text) => write!(f, "{text}"),
            Line::Decl {
                label: Some(label),
                body,
            } => write!(f, "{label} {body};"),
            Line::Decl { label: None, body } => write!(f, "    {body};"),
            Line::Label(label) => write!(f, "{label} ;"),
            Line::Instr(ins) => write!(f, "    {ins};"),
            Line::Scope(scope) => write!(f, "    .scope {scope};"),
            Line::Thread { entry, flag } => match flag {
                Some(flag) => write!(f, "    .thread {entry}, {};", flag.keyword()),
                None => write!(f, "    .thread {entry};"),
            },
            Line::Comment(text) => write!(f, "; {text}"),
        }
    }
}

/// A complete generated program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    lines: Vec<Line>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = Line>) {
        self.lines.extend(lines);
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Every instruction, in program order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.lines.iter().filter_map(|line| match line {
            Line::Instr(ins) => Some(ins),
            _ => None,
        })
    }

    /// The body of the record declaring `label`, if any.
    pub fn decl(&self, label: &Label) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Decl {
                label: Some(l),
                body,
            } if l == label => Some(body.as_str()),
            _ => None,
        })
    }

    /// Write the program text.
    pub fn write_to(&self, out: &mut impl std::io::Write) -> std::io::Result<()> {
        for line in &self.lines {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vvpgen_core::{ScopeId, SignalId};

    #[test]
    fn instruction_text() {
        let ins = Instruction::new(
            Opcode::StoreVec4,
            vec![
                Label::Signal(SignalId::new(2), 0).into(),
                Operand::Int(0),
                Operand::Int(8),
            ],
        );
        assert_eq!(Line::Instr(ins).to_string(), "    %store/vec4 v2_0, 0, 8;");
    }

    #[test]
    fn system_call_counts_follow_without_comma() {
        let ins = Instruction::new(
            Opcode::VpiCall,
            vec![
                Operand::Int(0),
                Operand::Int(3),
                Operand::Str("$finish".into()),
                Operand::Counts {
                    vec4: 0,
                    real: 0,
                    str: 0,
                },
            ],
        );
        assert_eq!(ins.to_string(), "%vpi_call 0 3 \"$finish\" {0 0 0}");
    }

    #[test]
    fn declarations_and_threads() {
        let scope = Label::Scope(ScopeId::new(1));
        assert_eq!(
            Line::decl(scope.clone(), ".timescale 0 0").to_string(),
            "S_1 .timescale 0 0;"
        );
        assert_eq!(Line::Scope(scope).to_string(), "    .scope S_1;");
        let thread = Line::Thread {
            entry: Label::Thread(4),
            flag: Some(ThreadFlag::Push),
        };
        assert_eq!(thread.to_string(), "    .thread T_4, $push;");
    }

    #[test]
    fn program_lookup() {
        let mut program = Program::new();
        let label = Label::Signal(SignalId::new(0), 0);
        program.push(Line::decl(label.clone(), ".var \"x\", 7 0"));
        program.push(Line::Label(Label::Thread(0)));
        assert_eq!(program.decl(&label), Some(".var \"x\", 7 0"));
        assert_eq!(program.instructions().count(), 0);
        assert_eq!(program.len(), 2);
    }
}
