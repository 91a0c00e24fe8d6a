use crate::analyzer::Ty;
use crate::source::Location;

use super::{DeclId, ExprId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    BitNot,
    LogicalNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    LogicalAnd,
    LogicalOr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }
}

/// Implicit conversions inserted by the analyzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// Load the object a reference designates.
    Value,
    /// Compare against zero.
    Bool,
    /// `int` to `char`.
    Char,
    /// `bool` or `char` to `int`.
    Int,
    /// `float` to `int`.
    Trunc,
    /// `int` to `float`.
    Ext,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Bool(bool),
    Int(i32),
    Float(f64),
    Char(u8),
    Id(DeclId),
    Unary(UnaryOp, ExprId),
    Binary(BinaryOp, ExprId, ExprId),
    Call(ExprId, Vec<ExprId>),
    Index(ExprId, Vec<ExprId>),
    Cast(ExprId),
    Assign(ExprId, ExprId),
    Cond(ExprId, ExprId, ExprId),
    Conv(Conversion, ExprId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Ty,
    pub loc: Location,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Ty, loc: Location) -> Self {
        Self { kind, ty, loc }
    }

    pub fn is_reference(&self) -> bool {
        self.ty.is_reference()
    }
}
