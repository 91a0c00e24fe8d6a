use crate::error::{CompileError, Result, SemanticError};
use crate::lexer::{ArithmeticOp, BitwiseOp, LogicalOp, RelationalOp, Token, TokenKind, TypeSpec};
use crate::parser::{
    Ast, BinaryOp, Conversion, Decl, DeclId, DeclKind, Expr, ExprId, ExprKind, Stmt, StmtId,
    TranslationUnit, UnaryOp,
};
use crate::source::Location;
use crate::symbol::{Interner, Symbol};

use super::{ScopeChain, ScopeKind, Ty};

/// Per-compilation analysis state.
#[derive(Debug, Default)]
pub struct Context {
    pub scopes: ScopeChain,
    pub function: Option<DeclId>,
}

/// Semantic actions invoked by the parser, one per production.
///
/// Each action checks its operands, inserts the implicit conversions they
/// need, and allocates the resulting node in the AST arena.
pub struct Semantics<'a> {
    ast: Ast,
    ctx: Context,
    interner: &'a Interner,
}

fn semantic<T>(loc: &Location, error: SemanticError) -> Result<T> {
    Err(CompileError::semantic(loc.clone(), error))
}

impl<'a> Semantics<'a> {
    pub fn new(interner: &'a Interner) -> Self {
        Self {
            ast: Ast::new(),
            ctx: Context::default(),
            interner,
        }
    }

    pub fn finish(self, program: DeclId) -> TranslationUnit {
        TranslationUnit {
            ast: self.ast,
            program,
        }
    }

    fn expr(&self, id: ExprId) -> &Expr {
        self.ast.expr(id)
    }

    fn ty_of(&self, id: ExprId) -> &Ty {
        &self.ast.expr(id).ty
    }

    fn loc_of(&self, id: ExprId) -> Location {
        self.ast.expr(id).loc.clone()
    }

    fn new_expr(&mut self, kind: ExprKind, ty: Ty, loc: Location) -> ExprId {
        self.ast.alloc_expr(Expr::new(kind, ty, loc))
    }

    fn name_of(&self, tok: &Token) -> Result<Symbol> {
        tok.ident()
            .ok_or_else(|| CompileError::internal(format!("expected an identifier, got {}", tok.kind)))
    }

    fn spelling(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_string()
    }

    // Types

    pub fn on_basic_type(&self, spec: TypeSpec) -> Ty {
        Ty::from_type_spec(spec)
    }

    pub fn on_pointer_type(&self, elem: Ty) -> Ty {
        Ty::pointer_to(elem)
    }

    pub fn on_function_type(&self, params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::function(ret, params)
    }

    // Expressions

    pub fn on_assignment_expression(&mut self, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        let e1 = self.require_reference(e1)?;
        let e2 = self.require_value(e2)?;

        let target = self.ty_of(e1).object_type().clone();
        self.require_same(&target, e2)?;

        let ty = self.ty_of(e1).clone();
        let loc = self.loc_of(e1);
        Ok(self.new_expr(ExprKind::Assign(e1, e2), ty, loc))
    }

    pub fn on_conditional_expression(
        &mut self,
        e1: ExprId,
        e2: ExprId,
        e3: ExprId,
    ) -> Result<ExprId> {
        let e1 = self.require_boolean(e1)?;

        let loc = self.loc_of(e1);
        let c = self.common_type(self.ty_of(e2), self.ty_of(e3), &loc)?;
        let e2 = self.convert_to_type(e2, &c)?;
        let e3 = self.convert_to_type(e3, &c)?;

        Ok(self.new_expr(ExprKind::Cond(e1, e2, e3), c, loc))
    }

    pub fn on_logical_or_expression(&mut self, op: &Token, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        self.logical(op, BinaryOp::LogicalOr, e1, e2)
    }

    pub fn on_logical_and_expression(&mut self, op: &Token, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        self.logical(op, BinaryOp::LogicalAnd, e1, e2)
    }

    pub fn on_bitwise_or_expression(&mut self, op: &Token, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        self.bitwise(op, BinaryOp::Or, e1, e2)
    }

    pub fn on_bitwise_xor_expression(&mut self, op: &Token, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        self.bitwise(op, BinaryOp::Xor, e1, e2)
    }

    pub fn on_bitwise_and_expression(&mut self, op: &Token, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        self.bitwise(op, BinaryOp::And, e1, e2)
    }

    pub fn on_equality_expression(&mut self, op: &Token, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        let bo = relational_op(op)?;
        let e1 = self.require_scalar(e1)?;
        let e2 = self.require_scalar(e2)?;
        let t1 = self.ty_of(e1).clone();
        self.require_same(&t1, e2)?;
        Ok(self.new_expr(ExprKind::Binary(bo, e1, e2), Ty::Bool, op.loc.clone()))
    }

    pub fn on_relational_expression(&mut self, op: &Token, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        let bo = relational_op(op)?;
        let e1 = self.require_numeric(e1)?;
        let e2 = self.require_numeric(e2)?;
        let t1 = self.ty_of(e1).clone();
        self.require_same(&t1, e2)?;
        Ok(self.new_expr(ExprKind::Binary(bo, e1, e2), Ty::Bool, op.loc.clone()))
    }

    pub fn on_shift_expression(&mut self, op: &Token, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        let bo = match op.kind {
            TokenKind::Bitwise(BitwiseOp::Shl) => BinaryOp::Shl,
            TokenKind::Bitwise(BitwiseOp::Shr) => BinaryOp::Shr,
            _ => return Err(unexpected_token(op)),
        };
        self.bitwise(op, bo, e1, e2)
    }

    pub fn on_additive_expression(&mut self, op: &Token, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        let bo = match op.kind {
            TokenKind::Arithmetic(ArithmeticOp::Add) => BinaryOp::Add,
            TokenKind::Arithmetic(ArithmeticOp::Sub) => BinaryOp::Sub,
            _ => return Err(unexpected_token(op)),
        };
        self.arithmetic(op, bo, e1, e2)
    }

    pub fn on_multiplicative_expression(
        &mut self,
        op: &Token,
        e1: ExprId,
        e2: ExprId,
    ) -> Result<ExprId> {
        let bo = match op.kind {
            TokenKind::Arithmetic(ArithmeticOp::Mul) => BinaryOp::Mul,
            TokenKind::Arithmetic(ArithmeticOp::Div) => BinaryOp::Div,
            TokenKind::Arithmetic(ArithmeticOp::Mod) => BinaryOp::Rem,
            _ => return Err(unexpected_token(op)),
        };
        self.arithmetic(op, bo, e1, e2)
    }

    pub fn on_cast_expression(&mut self, e: ExprId, ty: Ty) -> Result<ExprId> {
        let loc = self.loc_of(e);
        let e = self.convert_to_type(e, &ty)?;
        Ok(self.new_expr(ExprKind::Cast(e), ty, loc))
    }

    pub fn on_unary_expression(&mut self, op: &Token, e: ExprId) -> Result<ExprId> {
        match op.kind {
            TokenKind::Arithmetic(ArithmeticOp::Add) => self.require_arithmetic(e),
            TokenKind::Arithmetic(ArithmeticOp::Sub) => {
                let e = self.require_arithmetic(e)?;
                let ty = self.ty_of(e).clone();
                let zero = match ty {
                    Ty::Float => ExprKind::Float(0.0),
                    _ => ExprKind::Int(0),
                };
                let zero = self.new_expr(zero, ty.clone(), op.loc.clone());
                Ok(self.new_expr(ExprKind::Binary(BinaryOp::Sub, zero, e), ty, op.loc.clone()))
            }
            TokenKind::Bitwise(BitwiseOp::Not) => {
                let e = self.require_integer(e)?;
                Ok(self.new_expr(ExprKind::Unary(UnaryOp::BitNot, e), Ty::Int, op.loc.clone()))
            }
            TokenKind::Logical(LogicalOp::Not) => {
                let e = self.require_boolean(e)?;
                Ok(self.new_expr(
                    ExprKind::Unary(UnaryOp::LogicalNot, e),
                    Ty::Bool,
                    op.loc.clone(),
                ))
            }
            TokenKind::Arithmetic(ArithmeticOp::Mul) | TokenKind::Bitwise(BitwiseOp::And) => {
                semantic(&op.loc, SemanticError::Unsupported("pointer operations"))
            }
            _ => Err(unexpected_token(op)),
        }
    }

    pub fn on_call_expression(&mut self, e: ExprId, args: Vec<ExprId>) -> Result<ExprId> {
        let e = self.require_function(e)?;
        let loc = self.loc_of(e);
        let fn_ty = self.ty_of(e).clone();
        let Ty::Func(ret, params) = fn_ty else {
            return Err(CompileError::internal("callee lost its function type"));
        };

        if args.len() > params.len() {
            return semantic(
                &loc,
                SemanticError::TooManyArguments {
                    expected: params.len(),
                    found: args.len(),
                },
            );
        }
        if args.len() < params.len() {
            return semantic(
                &loc,
                SemanticError::TooFewArguments {
                    expected: params.len(),
                    found: args.len(),
                },
            );
        }

        let mut converted = Vec::with_capacity(args.len());
        for (i, (arg, param)) in args.into_iter().zip(params.iter()).enumerate() {
            let arg = self.require_value(arg)?;
            if self.ty_of(arg) != param {
                return semantic(
                    &self.loc_of(arg),
                    SemanticError::ArgumentMismatch {
                        position: i + 1,
                        expected: param.clone(),
                        found: self.ty_of(arg).clone(),
                    },
                );
            }
            converted.push(arg);
        }

        Ok(self.new_expr(ExprKind::Call(e, converted), *ret, loc))
    }

    pub fn on_index_expression(&mut self, e: ExprId, _args: Vec<ExprId>) -> Result<ExprId> {
        semantic(
            &self.expr(e).loc,
            SemanticError::Unsupported("index expressions"),
        )
    }

    pub fn on_integer_literal(&mut self, tok: &Token) -> Result<ExprId> {
        let TokenKind::Int { value, .. } = tok.kind else {
            return Err(unexpected_token(tok));
        };
        let Ok(value) = i32::try_from(value) else {
            return semantic(&tok.loc, SemanticError::IntegerOutOfRange(value));
        };
        Ok(self.new_expr(ExprKind::Int(value), Ty::Int, tok.loc.clone()))
    }

    /// `-` applied directly to an integer literal. The range check sees the
    /// negated value, so `-2147483648` is accepted.
    pub fn on_negated_integer_literal(&mut self, op: &Token, tok: &Token) -> Result<ExprId> {
        let TokenKind::Int { value, .. } = tok.kind else {
            return Err(unexpected_token(tok));
        };
        let Ok(value) = i32::try_from(-value) else {
            return semantic(&tok.loc, SemanticError::IntegerOutOfRange(-value));
        };
        Ok(self.new_expr(ExprKind::Int(value), Ty::Int, op.loc.clone()))
    }

    pub fn on_boolean_literal(&mut self, tok: &Token) -> Result<ExprId> {
        let TokenKind::Bool(value) = tok.kind else {
            return Err(unexpected_token(tok));
        };
        Ok(self.new_expr(ExprKind::Bool(value), Ty::Bool, tok.loc.clone()))
    }

    pub fn on_float_literal(&mut self, tok: &Token) -> Result<ExprId> {
        let TokenKind::Float(value) = tok.kind else {
            return Err(unexpected_token(tok));
        };
        Ok(self.new_expr(ExprKind::Float(value), Ty::Float, tok.loc.clone()))
    }

    pub fn on_char_literal(&mut self, tok: &Token) -> Result<ExprId> {
        let TokenKind::Char(c) = tok.kind else {
            return Err(unexpected_token(tok));
        };
        if !c.is_ascii() {
            return semantic(&tok.loc, SemanticError::CharOutOfRange(c));
        }
        Ok(self.new_expr(ExprKind::Char(c as u8), Ty::Char, tok.loc.clone()))
    }

    pub fn on_string_literal(&mut self, tok: &Token) -> Result<ExprId> {
        semantic(&tok.loc, SemanticError::Unsupported("string literals"))
    }

    pub fn on_id_expression(&mut self, tok: &Token) -> Result<ExprId> {
        let name = self.name_of(tok)?;
        let Some(id) = self.lookup(name) else {
            return semantic(
                &tok.loc,
                SemanticError::Undeclared {
                    name: self.spelling(name),
                },
            );
        };

        let decl = self.ast.decl(id);
        if matches!(
            decl.kind,
            DeclKind::Const { init: None, .. } | DeclKind::Value { init: None, .. }
        ) {
            return semantic(
                &tok.loc,
                SemanticError::SelfInitializer {
                    name: self.spelling(name),
                },
            );
        }
        let Some(ty) = decl.ty() else {
            return Err(CompileError::internal("name resolved to the program"));
        };
        let ty = if decl.is_variable() {
            Ty::reference_to(ty.clone())
        } else {
            ty.clone()
        };
        Ok(self.new_expr(ExprKind::Id(id), ty, tok.loc.clone()))
    }

    fn logical(&mut self, op: &Token, bo: BinaryOp, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        let e1 = self.require_boolean(e1)?;
        let e2 = self.require_boolean(e2)?;
        Ok(self.new_expr(ExprKind::Binary(bo, e1, e2), Ty::Bool, op.loc.clone()))
    }

    fn bitwise(&mut self, op: &Token, bo: BinaryOp, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        let e1 = self.require_integer(e1)?;
        let e2 = self.require_integer(e2)?;
        Ok(self.new_expr(ExprKind::Binary(bo, e1, e2), Ty::Int, op.loc.clone()))
    }

    fn arithmetic(&mut self, op: &Token, bo: BinaryOp, e1: ExprId, e2: ExprId) -> Result<ExprId> {
        let e1 = self.require_arithmetic(e1)?;
        let e2 = self.require_arithmetic(e2)?;
        let ty = self.ty_of(e1).clone();
        self.require_same(&ty, e2)?;
        Ok(self.new_expr(ExprKind::Binary(bo, e1, e2), ty, op.loc.clone()))
    }

    // Statements

    pub fn on_block_statement(&mut self, stmts: Vec<StmtId>) -> StmtId {
        self.ast.alloc_stmt(Stmt::Block(stmts))
    }

    /// Called right after entering a block scope. The outermost block of a
    /// function body sees the function's parameters.
    pub fn start_block(&mut self) -> Result<()> {
        if self.ctx.scopes.parent_kind() != Some(ScopeKind::Global) {
            return Ok(());
        }
        let Some(function) = self.ctx.function else {
            return Ok(());
        };
        let params = self.ast.decl(function).params().to_vec();
        for param in params {
            self.declare(param)?;
        }
        Ok(())
    }

    pub fn on_if_statement(&mut self, e: ExprId, s1: StmtId, s2: StmtId) -> Result<StmtId> {
        let e = self.require_boolean(e)?;
        Ok(self.ast.alloc_stmt(Stmt::If(e, s1, s2)))
    }

    pub fn on_when_statement(&mut self, e: ExprId, s: StmtId) -> Result<StmtId> {
        let e = self.require_boolean(e)?;
        Ok(self.ast.alloc_stmt(Stmt::When(e, s)))
    }

    pub fn on_while_statement(&mut self, e: ExprId, s: StmtId) -> Result<StmtId> {
        let e = self.require_boolean(e)?;
        Ok(self.ast.alloc_stmt(Stmt::While(e, s)))
    }

    pub fn on_break_statement(&mut self, tok: &Token) -> StmtId {
        self.ast.alloc_stmt(Stmt::Break(tok.loc.clone()))
    }

    pub fn on_continue_statement(&mut self, tok: &Token) -> StmtId {
        self.ast.alloc_stmt(Stmt::Continue(tok.loc.clone()))
    }

    pub fn on_return_statement(&mut self, e: ExprId) -> Result<StmtId> {
        let e = self.require_value(e)?;
        let Some(function) = self.ctx.function else {
            return Err(CompileError::internal("return outside of a function"));
        };
        let ret = self
            .ast
            .decl(function)
            .ty()
            .and_then(Ty::return_type)
            .cloned()
            .ok_or_else(|| CompileError::internal("current function has no return type"))?;
        self.require_same(&ret, e)?;
        Ok(self.ast.alloc_stmt(Stmt::Return(e)))
    }

    pub fn on_declaration_statement(&mut self, d: DeclId) -> StmtId {
        self.ast.alloc_stmt(Stmt::Decl(d))
    }

    pub fn on_expression_statement(&mut self, e: ExprId) -> StmtId {
        self.ast.alloc_stmt(Stmt::Expr(e))
    }

    // Declarations

    pub fn on_variable_declaration(&mut self, name: &Token, ty: Ty) -> Result<DeclId> {
        self.declare_object(name, DeclKind::Var { ty, init: None })
    }

    pub fn on_variable_definition(&mut self, d: DeclId, e: ExprId) -> Result<DeclId> {
        self.define_object(d, e)
    }

    pub fn on_constant_declaration(&mut self, name: &Token, ty: Ty) -> Result<DeclId> {
        self.declare_object(name, DeclKind::Const { ty, init: None })
    }

    pub fn on_constant_definition(&mut self, d: DeclId, e: ExprId) -> Result<DeclId> {
        self.define_object(d, e)
    }

    pub fn on_value_declaration(&mut self, name: &Token, ty: Ty) -> Result<DeclId> {
        self.declare_object(name, DeclKind::Value { ty, init: None })
    }

    pub fn on_value_definition(&mut self, d: DeclId, e: ExprId) -> Result<DeclId> {
        self.define_object(d, e)
    }

    pub fn on_parameter_declaration(&mut self, name: &Token, ty: Ty) -> Result<DeclId> {
        self.declare_object(name, DeclKind::Param { ty })
    }

    pub fn on_function_declaration(
        &mut self,
        name: &Token,
        params: Vec<DeclId>,
        ret: Ty,
    ) -> Result<DeclId> {
        let sym = self.name_of(name)?;
        if self.ctx.function.is_some() {
            return semantic(
                &name.loc,
                SemanticError::NestedFunction {
                    name: self.spelling(sym),
                },
            );
        }

        let param_tys = params
            .iter()
            .filter_map(|&p| self.ast.decl(p).ty().cloned())
            .collect();
        let ty = Ty::function(ret, param_tys);
        let id = self.ast.alloc_decl(Decl {
            name: sym,
            loc: name.loc.clone(),
            kind: DeclKind::Function {
                ty,
                params,
                body: None,
            },
        });
        self.declare(id)?;

        self.ctx.function = Some(id);
        Ok(id)
    }

    pub fn on_function_definition(&mut self, d: DeclId, body: StmtId) -> Result<DeclId> {
        if self.ctx.function != Some(d) {
            return Err(CompileError::internal("defining a function that is not current"));
        }
        let DeclKind::Function { body: slot, .. } = &mut self.ast.decl_mut(d).kind else {
            return Err(CompileError::internal("declaration is not a function"));
        };
        if slot.is_some() {
            return Err(CompileError::internal("function defined twice"));
        }
        *slot = Some(body);

        self.ctx.function = None;
        Ok(d)
    }

    pub fn on_program(&mut self, name: Symbol, decls: Vec<DeclId>) -> DeclId {
        self.ast.alloc_decl(Decl {
            name,
            loc: Location::null(),
            kind: DeclKind::Program { decls },
        })
    }

    fn declare_object(&mut self, name: &Token, kind: DeclKind) -> Result<DeclId> {
        let sym = self.name_of(name)?;
        let id = self.ast.alloc_decl(Decl {
            name: sym,
            loc: name.loc.clone(),
            kind,
        });
        self.declare(id)?;
        Ok(id)
    }

    fn define_object(&mut self, d: DeclId, e: ExprId) -> Result<DeclId> {
        let e = self.require_value(e)?;
        let declared = self
            .ast
            .decl(d)
            .ty()
            .cloned()
            .ok_or_else(|| CompileError::internal("object has no type"))?;
        self.require_same(&declared, e)?;

        let decl = self.ast.decl(d);
        let global_constant = matches!(decl.kind, DeclKind::Const { .. } | DeclKind::Value { .. })
            && self.ctx.scopes.current_kind() == Some(ScopeKind::Global);
        if global_constant && !self.is_constant(e) {
            return semantic(
                &self.expr(e).loc,
                SemanticError::NonConstantInitializer {
                    name: self.spelling(decl.name),
                },
            );
        }

        match &mut self.ast.decl_mut(d).kind {
            DeclKind::Var { init, .. } | DeclKind::Const { init, .. } | DeclKind::Value { init, .. } => {
                if init.is_some() {
                    return Err(CompileError::internal("object defined twice"));
                }
                *init = Some(e);
            }
            _ => return Err(CompileError::internal("declaration is not an object")),
        }
        Ok(d)
    }

    /// True when `e` reads no storage and calls nothing, so it can be
    /// lowered again at every use of a global constant.
    fn is_constant(&self, e: ExprId) -> bool {
        match &self.expr(e).kind {
            ExprKind::Bool(_) | ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Char(_) => true,
            ExprKind::Id(d) => matches!(
                self.ast.decl(*d).kind,
                DeclKind::Const { .. } | DeclKind::Value { .. } | DeclKind::Function { .. }
            ),
            ExprKind::Conv(Conversion::Value, _) => false,
            ExprKind::Unary(_, e) | ExprKind::Cast(e) | ExprKind::Conv(_, e) => self.is_constant(*e),
            ExprKind::Binary(_, l, r) => self.is_constant(*l) && self.is_constant(*r),
            ExprKind::Cond(c, t, f) => {
                self.is_constant(*c) && self.is_constant(*t) && self.is_constant(*f)
            }
            ExprKind::Call(..) | ExprKind::Index(..) | ExprKind::Assign(..) => false,
        }
    }

    // Scopes

    pub fn enter_global_scope(&mut self) -> Result<()> {
        if self.ctx.scopes.depth() != 0 {
            return Err(CompileError::internal("global scope entered twice"));
        }
        self.ctx.scopes.push(ScopeKind::Global);
        Ok(())
    }

    pub fn enter_parameter_scope(&mut self) {
        self.ctx.scopes.push(ScopeKind::Parameter);
    }

    pub fn enter_block_scope(&mut self) {
        self.ctx.scopes.push(ScopeKind::Block);
    }

    pub fn leave_scope(&mut self) -> Result<()> {
        self.ctx
            .scopes
            .pop()
            .map(|_| ())
            .ok_or_else(|| CompileError::internal("left a scope that was never entered"))
    }

    pub fn declare(&mut self, id: DeclId) -> Result<()> {
        let decl = self.ast.decl(id);
        let (name, loc) = (decl.name, decl.loc.clone());
        if self.ctx.scopes.declare(name, id).is_err() {
            return semantic(
                &loc,
                SemanticError::Redeclaration {
                    name: self.spelling(name),
                },
            );
        }
        Ok(())
    }

    pub fn lookup(&self, name: Symbol) -> Option<DeclId> {
        self.ctx.scopes.lookup(name)
    }

    // Checks

    pub fn require_reference(&mut self, e: ExprId) -> Result<ExprId> {
        if !self.expr(e).is_reference() {
            return semantic(
                &self.expr(e).loc,
                SemanticError::NotAReference {
                    found: self.ty_of(e).clone(),
                },
            );
        }
        Ok(e)
    }

    pub fn require_value(&mut self, e: ExprId) -> Result<ExprId> {
        Ok(self.convert_to_value(e))
    }

    pub fn require_arithmetic(&mut self, e: ExprId) -> Result<ExprId> {
        self.require_category(e, "arithmetic", Ty::is_arithmetic)
    }

    pub fn require_numeric(&mut self, e: ExprId) -> Result<ExprId> {
        self.require_category(e, "numeric", Ty::is_numeric)
    }

    pub fn require_scalar(&mut self, e: ExprId) -> Result<ExprId> {
        self.require_category(e, "scalar", Ty::is_scalar)
    }

    pub fn require_integer(&mut self, e: ExprId) -> Result<ExprId> {
        self.require_category(e, "integer", Ty::is_integral)
    }

    pub fn require_boolean(&mut self, e: ExprId) -> Result<ExprId> {
        self.require_category(e, "boolean", Ty::is_bool)
    }

    pub fn require_function(&mut self, e: ExprId) -> Result<ExprId> {
        self.require_category(e, "function", Ty::is_function)
    }

    fn require_category(
        &mut self,
        e: ExprId,
        expected: &'static str,
        pred: fn(&Ty) -> bool,
    ) -> Result<ExprId> {
        let e = self.require_value(e)?;
        if !pred(self.ty_of(e)) {
            return semantic(
                &self.expr(e).loc,
                SemanticError::ExpectedCategory {
                    expected,
                    found: self.ty_of(e).clone(),
                },
            );
        }
        Ok(e)
    }

    /// Fails unless `e` has exactly type `expected`.
    pub fn require_same(&self, expected: &Ty, e: ExprId) -> Result<()> {
        let found = self.ty_of(e);
        if expected != found {
            return semantic(
                &self.expr(e).loc,
                SemanticError::TypeMismatch {
                    expected: expected.clone(),
                    found: found.clone(),
                },
            );
        }
        Ok(())
    }

    pub fn common_type(&self, t1: &Ty, t2: &Ty, loc: &Location) -> Result<Ty> {
        if t1 == t2 {
            return Ok(t1.clone());
        }
        if t1.is_reference_to(t2) {
            return Ok(t2.clone());
        }
        if t2.is_reference_to(t1) {
            return Ok(t1.clone());
        }
        semantic(
            loc,
            SemanticError::NoCommonType {
                left: t1.clone(),
                right: t2.clone(),
            },
        )
    }

    // Conversions

    pub fn convert_to_value(&mut self, e: ExprId) -> ExprId {
        let expr = self.expr(e);
        let Ty::Ref(inner) = &expr.ty else {
            return e;
        };
        let (ty, loc) = ((**inner).clone(), expr.loc.clone());
        self.new_expr(ExprKind::Conv(Conversion::Value, e), ty, loc)
    }

    pub fn convert_to_bool(&mut self, e: ExprId) -> Result<ExprId> {
        let e = self.convert_to_value(e);
        match self.ty_of(e) {
            Ty::Bool => Ok(e),
            Ty::Char | Ty::Int | Ty::Float => Ok(self.conversion(Conversion::Bool, e, Ty::Bool)),
            _ => self.invalid_conversion(e, Ty::Bool),
        }
    }

    pub fn convert_to_char(&mut self, e: ExprId) -> Result<ExprId> {
        let e = self.convert_to_value(e);
        match self.ty_of(e) {
            Ty::Char => Ok(e),
            Ty::Int => Ok(self.conversion(Conversion::Char, e, Ty::Char)),
            _ => self.invalid_conversion(e, Ty::Char),
        }
    }

    pub fn convert_to_int(&mut self, e: ExprId) -> Result<ExprId> {
        let e = self.convert_to_value(e);
        match self.ty_of(e) {
            Ty::Int => Ok(e),
            Ty::Bool | Ty::Char => Ok(self.conversion(Conversion::Int, e, Ty::Int)),
            Ty::Float => Ok(self.conversion(Conversion::Trunc, e, Ty::Int)),
            _ => self.invalid_conversion(e, Ty::Int),
        }
    }

    pub fn convert_to_float(&mut self, e: ExprId) -> Result<ExprId> {
        let e = self.convert_to_value(e);
        match self.ty_of(e) {
            Ty::Float => Ok(e),
            Ty::Int => Ok(self.conversion(Conversion::Ext, e, Ty::Float)),
            _ => self.invalid_conversion(e, Ty::Float),
        }
    }

    pub fn convert_to_type(&mut self, e: ExprId, ty: &Ty) -> Result<ExprId> {
        let e = if ty.is_object() {
            self.convert_to_value(e)
        } else {
            e
        };
        if self.ty_of(e) == ty {
            return Ok(e);
        }

        match ty {
            Ty::Bool => self.convert_to_bool(e),
            Ty::Char => self.convert_to_char(e),
            Ty::Int => self.convert_to_int(e),
            Ty::Float => self.convert_to_float(e),
            _ => self.invalid_conversion(e, ty.clone()),
        }
    }

    fn conversion(&mut self, conv: Conversion, e: ExprId, ty: Ty) -> ExprId {
        let loc = self.loc_of(e);
        self.new_expr(ExprKind::Conv(conv, e), ty, loc)
    }

    fn invalid_conversion<T>(&self, e: ExprId, to: Ty) -> Result<T> {
        semantic(
            &self.expr(e).loc,
            SemanticError::InvalidConversion {
                from: self.ty_of(e).clone(),
                to,
            },
        )
    }
}

fn relational_op(op: &Token) -> Result<BinaryOp> {
    let TokenKind::Relational(rel) = op.kind else {
        return Err(unexpected_token(op));
    };
    Ok(match rel {
        RelationalOp::Eq => BinaryOp::Eq,
        RelationalOp::Ne => BinaryOp::Ne,
        RelationalOp::Lt => BinaryOp::Lt,
        RelationalOp::Gt => BinaryOp::Gt,
        RelationalOp::Le => BinaryOp::Le,
        RelationalOp::Ge => BinaryOp::Ge,
    })
}

fn unexpected_token(tok: &Token) -> CompileError {
    CompileError::internal(format!("{} reached the wrong semantic action", tok.kind))
}
