use la_arena::{Arena, Idx};

use crate::analyzer::Ty;
use crate::error::{CompileError, Result};
use crate::source::Location;
use crate::symbol::Symbol;

use super::Expr;

pub type ExprId = Idx<Expr>;
pub type StmtId = Idx<Stmt>;
pub type DeclId = Idx<Decl>;

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Block(Vec<StmtId>),
    When(ExprId, StmtId),
    If(ExprId, StmtId, StmtId),
    While(ExprId, StmtId),
    Break(Location),
    Continue(Location),
    Return(ExprId),
    Decl(DeclId),
    Expr(ExprId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeclKind {
    Var { ty: Ty, init: Option<ExprId> },
    Const { ty: Ty, init: Option<ExprId> },
    Value { ty: Ty, init: Option<ExprId> },
    Param { ty: Ty },
    Function {
        ty: Ty,
        params: Vec<DeclId>,
        body: Option<StmtId>,
    },
    Program { decls: Vec<DeclId> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Decl {
    pub name: Symbol,
    pub loc: Location,
    pub kind: DeclKind,
}

impl Decl {
    pub fn ty(&self) -> Option<&Ty> {
        match &self.kind {
            DeclKind::Var { ty, .. }
            | DeclKind::Const { ty, .. }
            | DeclKind::Value { ty, .. }
            | DeclKind::Param { ty }
            | DeclKind::Function { ty, .. } => Some(ty),
            DeclKind::Program { .. } => None,
        }
    }

    /// Variables and parameters name storage; uses of them are references.
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, DeclKind::Var { .. } | DeclKind::Param { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, DeclKind::Function { .. })
    }

    pub fn init(&self) -> Result<ExprId> {
        match &self.kind {
            DeclKind::Var { init, .. } | DeclKind::Const { init, .. } | DeclKind::Value { init, .. } => {
                init.ok_or_else(|| CompileError::internal("object declared but never defined"))
            }
            _ => Err(CompileError::internal("declaration has no initializer")),
        }
    }

    pub fn body(&self) -> Result<StmtId> {
        match &self.kind {
            DeclKind::Function { body, .. } => {
                body.ok_or_else(|| CompileError::internal("function declared but never defined"))
            }
            _ => Err(CompileError::internal("declaration is not a function")),
        }
    }

    pub fn params(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Function { params, .. } => params,
            _ => &[],
        }
    }
}

/// Arena storage for every node of one compilation.
#[derive(Debug, Default)]
pub struct Ast {
    pub exprs: Arena<Expr>,
    pub stmts: Arena<Stmt>,
    pub decls: Arena<Decl>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        self.exprs.alloc(expr)
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.alloc(stmt)
    }

    pub fn alloc_decl(&mut self, decl: Decl) -> DeclId {
        self.decls.alloc(decl)
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id]
    }
}

/// The analyzed program: the node arena plus the root program declaration.
#[derive(Debug)]
pub struct TranslationUnit {
    pub ast: Ast,
    pub program: DeclId,
}

impl TranslationUnit {
    pub fn decls(&self) -> &[DeclId] {
        match &self.ast.decl(self.program).kind {
            DeclKind::Program { decls } => decls,
            _ => &[],
        }
    }
}
