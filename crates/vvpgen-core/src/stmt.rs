//! Statement trees for process, task and function bodies.

use crate::{
    BlockKind, CaseKind, CaseQuality, EventId, Expr, ScopeId, SignalId, Span,
};

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// The closed set of statement shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `begin ... end` or one of the fork/join forms. A named block carries
    /// its scope.
    Block {
        kind: BlockKind,
        scope: Option<ScopeId>,
        stmts: Vec<Stmt>,
    },
    /// Blocking assignment. Multiple l-values form a concatenation target,
    /// MSB first. `op` makes it a compound assignment.
    Assign {
        lvals: Vec<LValue>,
        rval: Expr,
        op: Option<AssignOp>,
    },
    /// Non-blocking assignment with optional intra-assignment timing.
    AssignNb {
        lvals: Vec<LValue>,
        rval: Expr,
        delay: Option<Expr>,
        event: Option<EventControl>,
    },
    If {
        cond: Expr,
        then: Option<Box<Stmt>>,
        otherwise: Option<Box<Stmt>>,
    },
    Case {
        kind: CaseKind,
        quality: CaseQuality,
        selector: Expr,
        items: Vec<CaseItem>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    Forever(Box<Stmt>),
    Repeat {
        count: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Box<Stmt>>,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    /// `#delay stmt`.
    Delay {
        amount: DelayAmount,
        body: Option<Box<Stmt>>,
    },
    /// `@(events) stmt`.
    Wait {
        events: Vec<EventId>,
        body: Option<Box<Stmt>>,
    },
    /// `wait fork`.
    WaitFork,
    /// `-> event`.
    Trigger(EventId),
    /// `disable scope`.
    Disable(ScopeId),
    /// `disable fork`.
    DisableFork,
    /// System task call such as `$display`.
    SysTask { name: String, args: Vec<Expr> },
    /// User task call. Argument copies are explicit assignments around it.
    UserTask(ScopeId),
    /// Procedural `assign`.
    ContAssign { lvals: Vec<LValue>, rval: Expr },
    /// Procedural `deassign`.
    Deassign(Vec<LValue>),
    Force { lvals: Vec<LValue>, rval: Expr },
    Release(Vec<LValue>),
    Noop,
}

/// A case arm. An empty guard list marks the default arm.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseItem {
    pub guards: Vec<Expr>,
    pub body: Option<Stmt>,
}

impl CaseItem {
    #[inline]
    pub fn is_default(&self) -> bool {
        self.guards.is_empty()
    }
}

/// Amount of a procedural delay.
#[derive(Debug, Clone, PartialEq)]
pub enum DelayAmount {
    /// Delay in simulation precision units.
    Const(u64),
    Expr(Expr),
}

/// Event control of a non-blocking assignment: `repeat(count) @(events)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventControl {
    pub events: Vec<EventId>,
    pub count: Option<Expr>,
}

/// Operator of a compound assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ashr,
}

/// Target of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct LValue {
    pub sig: SignalId,
    /// Word of an unpacked array or element of a dynamic array/queue.
    pub word: Option<Expr>,
    /// Canonical bit offset of a part select.
    pub part_off: Option<Expr>,
    /// Width of the target slice in bits.
    pub width: u32,
    /// Class property of an object handle.
    pub property: Option<u32>,
}

impl LValue {
    /// A whole-signal target.
    pub fn whole(sig: SignalId, width: u32) -> Self {
        Self {
            sig,
            word: None,
            part_off: None,
            width,
            property: None,
        }
    }

    /// Whether the target is the whole variable, needing no offset.
    #[inline]
    pub fn is_simple(&self) -> bool {
        self.word.is_none() && self.part_off.is_none() && self.property.is_none()
    }
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// An unnamed sequential block.
    pub fn block(stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block {
            kind: BlockKind::Sequential,
            scope: None,
            stmts,
        })
    }

    /// A blocking assignment to one target.
    pub fn assign(lval: LValue, rval: Expr) -> Self {
        Self::new(StmtKind::Assign {
            lvals: vec![lval],
            rval,
            op: None,
        })
    }
}
