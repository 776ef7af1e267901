//! Typed expression trees.
//!
//! Expressions are produced by elaboration and never mutated afterwards.
//! Every node records its value type, width and signedness so lowering can
//! pick the right domain and padding without re-deriving types.

use crate::{Bits4, ClassId, DataType, ScopeId, SignalId, Span, ValueType};

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: ValueType,
    /// Width in bits for vector values, 1 for everything else.
    pub width: u32,
    pub signed: bool,
    pub span: Span,
}

/// The closed set of expression shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A 4-state literal. Its width matches the node width.
    Number(Bits4),
    /// A real literal.
    RealNum(f64),
    /// A string literal.
    String(String),
    /// A reference to a signal, optionally one word of an array or an
    /// element of a dynamic array/queue.
    Signal {
        sig: SignalId,
        word: Option<Box<Expr>>,
    },
    /// Part select `base[offset +: width]`. With no offset this is a pad or
    /// truncate of `base` to the node width.
    Select {
        base: Box<Expr>,
        offset: Option<Box<Expr>>,
    },
    /// `{repeat{parts...}}`, parts MSB first.
    Concat { parts: Vec<Expr>, repeat: u32 },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Call of a user function defined by `func`.
    UserCall { func: ScopeId, args: Vec<Expr> },
    /// Call of a system function such as `$time`.
    SysCall { name: String, args: Vec<Expr> },
    /// Property `index` of the class object `base`, optionally indexed.
    Property {
        base: SignalId,
        index: u32,
        word: Option<Box<Expr>>,
    },
    /// `new` of a class object.
    New(ClassId),
    /// `new[size]` of a dynamic array of `elem`, optionally initialised
    /// from an array pattern. For vector elements the node width is the
    /// element width.
    NewDarray {
        elem: DataType,
        size: Box<Expr>,
        init: Option<Box<Expr>>,
    },
    /// `'{a, b, c}` assignment pattern.
    ArrayPattern(Vec<Expr>),
    /// The null object handle.
    Null,
    /// `new obj` shallow copy.
    ShallowCopy(Box<Expr>),
    /// Conversion of the operand to this node's type.
    Cast(Box<Expr>),
    /// A scope handle, valid only as a system-call argument.
    Scope(ScopeId),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation `-`.
    Neg,
    /// Bitwise invert `~`.
    Invert,
    /// Logical not `!`.
    Not,
    ReduceAnd,
    ReduceOr,
    ReduceXor,
    ReduceNand,
    ReduceNor,
    ReduceXnor,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    And,
    Or,
    Xor,
    Xnor,
    Nand,
    Nor,
    LogicalAnd,
    LogicalOr,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `===`
    CaseEq,
    /// `!==`
    CaseNe,
    /// `==?`
    WildEq,
    /// `!=?`
    WildNe,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    /// `<<<`
    Ashl,
    /// `>>>`
    Ashr,
}

impl BinaryOp {
    /// Whether the result is a single-bit comparison outcome.
    #[inline]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::CaseEq
                | BinaryOp::CaseNe
                | BinaryOp::WildEq
                | BinaryOp::WildNe
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
        )
    }

    #[inline]
    pub fn is_shift(self) -> bool {
        matches!(
            self,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::Ashl | BinaryOp::Ashr
        )
    }

    #[inline]
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }
}

impl Expr {
    /// Build a node with an explicit type.
    pub fn new(kind: ExprKind, ty: ValueType, width: u32, signed: bool) -> Self {
        Self {
            kind,
            ty,
            width,
            signed,
            span: Span::default(),
        }
    }

    /// A 4-state literal of the value's own width.
    pub fn number(value: Bits4, signed: bool) -> Self {
        let width = value.width();
        Self::new(ExprKind::Number(value), ValueType::Logic, width, signed)
    }

    /// An unsigned defined literal.
    pub fn uint(value: u64, width: u32) -> Self {
        Self::number(Bits4::from_u64(value, width), false)
    }

    pub fn real(value: f64) -> Self {
        Self::new(ExprKind::RealNum(value), ValueType::Real, 1, true)
    }

    pub fn string(text: impl Into<String>) -> Self {
        let text = text.into();
        let width = 8 * text.len() as u32;
        Self::new(ExprKind::String(text), ValueType::String, width.max(8), false)
    }

    /// A whole-signal reference of the given type and width.
    pub fn signal(sig: SignalId, ty: ValueType, width: u32, signed: bool) -> Self {
        Self::new(ExprKind::Signal { sig, word: None }, ty, width, signed)
    }

    /// A binary node; the result type follows the left operand.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, width: u32) -> Self {
        let ty = lhs.ty;
        let signed = lhs.signed && rhs.signed && !op.is_comparison();
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            width,
            signed,
        )
    }

    pub fn unary(op: UnaryOp, operand: Expr, width: u32) -> Self {
        let ty = operand.ty;
        let signed = operand.signed;
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            width,
            signed,
        )
    }

    /// Attach a source location.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The literal bits, if this node is a 4-state literal.
    pub fn as_number(&self) -> Option<&Bits4> {
        match &self.kind {
            ExprKind::Number(bits) => Some(bits),
            _ => None,
        }
    }

    /// The literal value as an integer, if it is a defined literal.
    pub fn const_value(&self) -> Option<i64> {
        self.as_number().and_then(|bits| bits.to_i64(self.signed))
    }
}
