//! Design-graph model for the bytecode generator.
//!
//! This crate defines the read-only view of an elaborated hardware design
//! that code generation consumes:
//!
//! - [`Design`] - arena of scopes, signals, nexuses, gates, devices,
//!   events and processes, with a query API
//! - [`DesignBuilder`] - constructs a consistent [`Design`]
//! - [`Expr`] / [`Stmt`] - immutable typed expression and statement trees
//! - [`Bits4`] - 4-state literal values
//! - [`CodegenError`] - the fatal error tier

mod bits;
mod design;
mod error;
mod expr;
mod ids;
mod net;
mod scope;
mod span;
mod stmt;
mod types;

pub use bits::{Bits4, Logic4};
pub use design::{Design, DesignBuilder};
pub use error::{CodegenError, CodegenResult};
pub use expr::{BinaryOp, Expr, ExprKind, UnaryOp};
pub use ids::{
    ClassId, ConstId, EnumId, EventId, FileId, IslandId, LogicId, LpmId, NexusId, ProcessId,
    ScopeId, SignalId, SwitchId,
};
pub use net::{
    ConstValue, DelayPath, DelaySpec, DelayValue, Island, Logic, Lpm, NetConst, Nexus, NexusPtr,
    PinTarget, Switch,
};
pub use scope::{ClassType, EnumType, Event, Param, ParamValue, Process, Property, Scope, Signal};
pub use span::Span;
pub use stmt::{AssignOp, CaseItem, DelayAmount, EventControl, LValue, Stmt, StmtKind};
pub use types::{
    BlockKind, CaseKind, CaseQuality, DataType, Domain, Drive, Edge, LogicKind, LpmKind, NetKind,
    PortDir, ProcessKind, ScopeFlags, ScopeKind, SwitchKind, ValueType,
};
