// tests/support/mod.rs
//! Test harness for the generated programs
//!
//! A small reference machine that runs the thread code of a [`Program`]
//! over 4-state vectors of up to 64 bits, plus helpers that evaluate the
//! `.functor` records of the declaration section.

#![allow(dead_code)]

use rustc_hash::FxHashMap;
use vvpgen::compiler::{Instruction, Label, Line, Opcode, Operand, Program};

/// A vector value: value plane, unknown plane (x or z) and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vec4 {
    pub val: u64,
    pub xz: u64,
    pub width: u32,
}

impl Vec4 {
    pub fn new(val: u64, width: u32) -> Self {
        Self {
            val: val & mask(width),
            xz: 0,
            width,
        }
    }

    pub fn unknown(width: u32) -> Self {
        Self {
            val: 0,
            xz: mask(width),
            width,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.xz == 0
    }

    fn bit(bit: Bit) -> Self {
        match bit {
            Bit::Zero => Self::new(0, 1),
            Bit::One => Self::new(1, 1),
            Bit::X => Self::unknown(1),
        }
    }

    fn resized(self, width: u32, signed: bool) -> Self {
        let fill = |plane: u64| -> u64 {
            let sign = self.width > 0 && (plane >> (self.width - 1)) & 1 == 1;
            if width > self.width && sign && signed {
                (plane | !mask(self.width)) & mask(width)
            } else {
                plane & mask(width)
            }
        };
        Self {
            val: fill(self.val),
            xz: fill(self.xz),
            width,
        }
    }

    fn signed_value(&self) -> i64 {
        let shift = 64 - self.width;
        ((self.val << shift) as i64) >> shift
    }
}

pub fn mask(width: u32) -> u64 {
    assert!(width <= 64, "the test machine models at most 64 bits");
    if width == 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// A flag bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bit {
    Zero,
    One,
    X,
}

impl Bit {
    fn from_bool(b: bool) -> Self {
        if b { Bit::One } else { Bit::Zero }
    }

    fn of(v: &Vec4) -> Self {
        if v.xz & 1 == 1 {
            Bit::X
        } else {
            Bit::from_bool(v.val & 1 == 1)
        }
    }
}

/// Runs thread code until `%end`.
pub struct Machine<'p> {
    lines: &'p [Line],
    labels: FxHashMap<Label, usize>,
    pub vars: FxHashMap<Label, Vec4>,
    stack: Vec<Vec4>,
    flags: Vec<Bit>,
    pub steps: usize,
}

impl<'p> Machine<'p> {
    pub fn new(program: &'p Program) -> Self {
        let lines = program.lines();
        let mut labels = FxHashMap::default();
        for (index, line) in lines.iter().enumerate() {
            if let Line::Label(label) = line {
                labels.insert(label.clone(), index);
            }
        }
        let mut flags = vec![Bit::X; 256];
        flags[0] = Bit::Zero;
        flags[1] = Bit::One;
        Self {
            lines,
            labels,
            vars: FxHashMap::default(),
            stack: Vec::new(),
            flags,
            steps: 0,
        }
    }

    /// Entry labels of every `.thread`, in program order.
    pub fn threads(&self) -> Vec<Label> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                Line::Thread { entry, .. } => Some(entry.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn set(&mut self, label: Label, value: Vec4) {
        self.vars.insert(label, value);
    }

    pub fn get(&self, label: &Label) -> Option<Vec4> {
        self.vars.get(label).copied()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Run the thread starting at `entry` until it ends.
    pub fn run(&mut self, entry: &Label) {
        let mut pc = *self
            .labels
            .get(entry)
            .unwrap_or_else(|| panic!("no label {entry}"));
        loop {
            self.steps += 1;
            assert!(self.steps < 100_000, "thread does not terminate");
            let Some(line) = self.lines.get(pc) else {
                panic!("ran off the end of the program");
            };
            pc += 1;
            let Line::Instr(ins) = line else {
                continue;
            };
            match self.step(ins) {
                Next::Fall => {}
                Next::Jump(label) => {
                    pc = *self
                        .labels
                        .get(&label)
                        .unwrap_or_else(|| panic!("jump to unknown label {label}"));
                }
                Next::End => return,
            }
        }
    }

    fn step(&mut self, ins: &Instruction) -> Next {
        let int = |i: usize| -> i64 {
            ins.args
                .get(i)
                .and_then(Operand::as_int)
                .unwrap_or_else(|| panic!("{ins}: operand {i} is not an integer"))
        };
        let imm = |lo: usize, hi: usize| -> u64 {
            (int(lo) as u64 & 0xffff_ffff) | ((int(hi) as u64) << 32)
        };
        let label = |i: usize| -> Label {
            ins.args
                .get(i)
                .and_then(Operand::as_label)
                .cloned()
                .unwrap_or_else(|| panic!("{ins}: operand {i} is not a label"))
        };

        match ins.op {
            Opcode::PushiVec4 => {
                let width = int(2) as u32;
                self.push(Vec4 {
                    val: int(0) as u64 & 0xffff_ffff & mask(width),
                    xz: int(1) as u64 & 0xffff_ffff & mask(width),
                    width,
                });
            }
            Opcode::ConcatiVec4 => {
                let chunk = int(2) as u32;
                let top = self.pop();
                let width = top.width + chunk;
                self.push(Vec4 {
                    val: ((top.val << chunk) | (int(0) as u64 & mask(chunk))) & mask(width),
                    xz: ((top.xz << chunk) | (int(1) as u64 & mask(chunk))) & mask(width),
                    width,
                });
            }
            Opcode::ConcatVec4 => {
                let count = int(0) as usize;
                let at = self.stack.len() - count;
                let parts: Vec<Vec4> = self.stack.drain(at..).collect();
                let mut joined = Vec4::new(0, 0);
                for part in parts {
                    let width = joined.width + part.width;
                    joined = Vec4 {
                        val: ((joined.val << part.width) | part.val) & mask(width),
                        xz: ((joined.xz << part.width) | part.xz) & mask(width),
                        width,
                    };
                }
                self.push(joined);
            }
            Opcode::SplitVec4 => {
                let low = int(0) as u32;
                let v = self.pop();
                assert!(low < v.width, "{ins}: split wider than the value");
                let high = v.width - low;
                self.push(Vec4 {
                    val: (v.val >> low) & mask(high),
                    xz: (v.xz >> low) & mask(high),
                    width: high,
                });
                self.push(Vec4 {
                    val: v.val & mask(low),
                    xz: v.xz & mask(low),
                    width: low,
                });
            }
            Opcode::LoadVec4 => {
                let var = label(0);
                let value = self
                    .get(&var)
                    .unwrap_or_else(|| panic!("load of unset variable {var}"));
                self.push(value);
            }
            Opcode::StoreVec4 => {
                let var = label(0);
                assert_eq!(int(1), 0, "{ins}: offset registers are not modeled");
                let width = int(2) as u32;
                let value = self.pop();
                assert_eq!(value.width, width, "{ins}: stored value has the wrong width");
                self.vars.insert(var, value);
            }
            Opcode::DupVec4 => {
                let top = *self.stack.last().expect("dup of an empty stack");
                self.push(top);
            }
            Opcode::PopVec4 => {
                for _ in 0..int(0) {
                    self.pop();
                }
            }
            Opcode::PadU | Opcode::PadS => {
                let v = self.pop();
                self.push(v.resized(int(0) as u32, ins.op == Opcode::PadS));
            }
            Opcode::Addi | Opcode::Subi | Opcode::Muli | Opcode::Andi | Opcode::Ori => {
                let a = self.pop();
                assert_eq!(a.width, int(2) as u32, "{ins}: width mismatch");
                let b = Vec4::new(imm(0, 1), a.width);
                let generic = match ins.op {
                    Opcode::Addi => Opcode::Add,
                    Opcode::Subi => Opcode::Sub,
                    Opcode::Muli => Opcode::Mul,
                    Opcode::Andi => Opcode::And,
                    _ => Opcode::Or,
                };
                self.push(arith(generic, a, b));
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::And | Opcode::Or | Opcode::Xor => {
                let b = self.pop();
                let a = self.pop();
                assert_eq!(a.width, b.width, "{ins}: operand widths differ");
                self.push(arith(ins.op, a, b));
            }
            Opcode::Inv => {
                let a = self.pop();
                self.push(Vec4 {
                    val: !a.val & mask(a.width) & !a.xz,
                    xz: a.xz,
                    width: a.width,
                });
            }
            Opcode::OrR => {
                let a = self.pop();
                let bit = if a.val & !a.xz != 0 {
                    Bit::One
                } else if a.xz != 0 {
                    Bit::X
                } else {
                    Bit::Zero
                };
                self.push(Vec4::bit(bit));
            }
            Opcode::CmpiE | Opcode::CmpiU | Opcode::CmpiS => {
                let a = self.pop();
                assert_eq!(a.width, int(2) as u32, "{ins}: width mismatch");
                let b = Vec4::new(imm(0, 1), a.width);
                self.compare(ins.op, a, b);
            }
            Opcode::CmpE | Opcode::CmpNe | Opcode::CmpU | Opcode::CmpS => {
                let b = self.pop();
                let a = self.pop();
                assert_eq!(a.width, b.width, "{ins}: operand widths differ");
                self.compare(ins.op, a, b);
            }
            Opcode::FlagGetVec4 => {
                let bit = self.flags[int(0) as usize];
                self.push(Vec4::bit(bit));
            }
            Opcode::FlagSetVec4 => {
                let v = self.pop();
                self.flags[int(0) as usize] = Bit::of(&v);
            }
            Opcode::FlagSetImm => {
                self.flags[int(0) as usize] = Bit::from_bool(int(1) != 0);
            }
            Opcode::FlagMov => {
                self.flags[int(0) as usize] = self.flags[int(1) as usize];
            }
            Opcode::FlagOr | Opcode::FlagAnd => {
                let (a, b) = (self.flags[int(0) as usize], self.flags[int(1) as usize]);
                let or = ins.op == Opcode::FlagOr;
                self.flags[int(0) as usize] = match (a, b) {
                    (Bit::One, _) | (_, Bit::One) if or => Bit::One,
                    (Bit::Zero, Bit::Zero) if or => Bit::Zero,
                    (Bit::Zero, _) | (_, Bit::Zero) if !or => Bit::Zero,
                    (Bit::One, Bit::One) => Bit::One,
                    _ => Bit::X,
                };
            }
            Opcode::FlagInv => {
                let f = int(0) as usize;
                self.flags[f] = match self.flags[f] {
                    Bit::Zero => Bit::One,
                    Bit::One => Bit::Zero,
                    Bit::X => Bit::X,
                };
            }
            Opcode::Jmp => return Next::Jump(label(0)),
            Opcode::Jmp0 | Opcode::Jmp1 | Opcode::Jmp0xz | Opcode::Jmp1xz => {
                let flag = self.flags[int(1) as usize];
                let taken = match ins.op {
                    Opcode::Jmp0 => flag == Bit::Zero,
                    Opcode::Jmp1 => flag == Bit::One,
                    Opcode::Jmp0xz => flag != Bit::One,
                    _ => flag != Bit::Zero,
                };
                if taken {
                    return Next::Jump(label(0));
                }
            }
            Opcode::Delay => {}
            Opcode::End => return Next::End,
            other => panic!("opcode {} is not modeled", other.mnemonic()),
        }
        Next::Fall
    }

    fn compare(&mut self, op: Opcode, a: Vec4, b: Vec4) {
        let exact = a.val == b.val && a.xz == b.xz;
        let defined = a.is_defined() && b.is_defined();
        let (eq, lt) = if defined {
            let lt = match op {
                Opcode::CmpiS | Opcode::CmpS => a.signed_value() < b.signed_value(),
                _ => a.val < b.val,
            };
            (Bit::from_bool(a.val == b.val), Bit::from_bool(lt))
        } else {
            (Bit::X, Bit::X)
        };
        let (eq, eeq) = if op == Opcode::CmpNe {
            let inv = match eq {
                Bit::Zero => Bit::One,
                Bit::One => Bit::Zero,
                Bit::X => Bit::X,
            };
            (inv, Bit::from_bool(!exact))
        } else {
            (eq, Bit::from_bool(exact))
        };
        self.flags[4] = eq;
        self.flags[6] = eeq;
        if matches!(op, Opcode::CmpiU | Opcode::CmpiS | Opcode::CmpU | Opcode::CmpS) {
            self.flags[5] = lt;
        }
    }

    fn push(&mut self, v: Vec4) {
        self.stack.push(v);
    }

    fn pop(&mut self) -> Vec4 {
        self.stack.pop().expect("pop of an empty stack")
    }
}

enum Next {
    Fall,
    Jump(Label),
    End,
}

fn arith(op: Opcode, a: Vec4, b: Vec4) -> Vec4 {
    let width = a.width;
    if !a.is_defined() || !b.is_defined() {
        return Vec4::unknown(width);
    }
    let val = match op {
        Opcode::Add => a.val.wrapping_add(b.val),
        Opcode::Sub => a.val.wrapping_sub(b.val),
        Opcode::Mul => a.val.wrapping_mul(b.val),
        Opcode::And => a.val & b.val,
        Opcode::Or => a.val | b.val,
        Opcode::Xor => a.val ^ b.val,
        other => panic!("{} is not arithmetic", other.mnemonic()),
    };
    Vec4::new(val, width)
}

// =============================================================================
// Functor records
// =============================================================================

/// Every `.functor` record of the program, keyed by label text.
pub fn functors(program: &Program) -> FxHashMap<String, (String, Vec<String>)> {
    let mut map = FxHashMap::default();
    for line in program.lines() {
        if let Line::Decl {
            label: Some(label),
            body,
        } = line
        {
            let Some(rest) = body.strip_prefix(".functor ") else {
                continue;
            };
            let mut parts = rest.split(", ");
            let head = parts.next().unwrap_or_default();
            let kind = head.split(' ').next().unwrap_or_default().to_string();
            let inputs = parts.map(str::to_string).collect();
            map.insert(label.to_string(), (kind, inputs));
        }
    }
    map
}

/// Evaluate a 1-bit functor network at `node` with the given input bits.
pub fn eval_functor(
    functors: &FxHashMap<String, (String, Vec<String>)>,
    node: &str,
    inputs: &FxHashMap<String, bool>,
) -> bool {
    if let Some(&value) = inputs.get(node) {
        return value;
    }
    match node {
        "C4<0>" => return false,
        "C4<1>" => return true,
        _ => {}
    }
    let (kind, ins) = functors
        .get(node)
        .unwrap_or_else(|| panic!("no functor or input named {node}"));
    let bits: Vec<bool> = ins
        .iter()
        .map(|i| eval_functor(functors, i, inputs))
        .collect();
    match kind.as_str() {
        "AND" => bits.iter().all(|&b| b),
        "NAND" => !bits.iter().all(|&b| b),
        "OR" => bits.iter().any(|&b| b),
        "NOR" => !bits.iter().any(|&b| b),
        "XOR" => bits.iter().filter(|&&b| b).count() % 2 == 1,
        "XNOR" => bits.iter().filter(|&&b| b).count() % 2 == 0,
        other => panic!("functor kind {other} is not modeled"),
    }
}

/// Deterministic pseudo-random numbers for generated test cases.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}
