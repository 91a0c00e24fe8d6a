use std::collections::HashMap;

use crate::analyzer::Ty;
use crate::error::{CompileError, Result, SemanticError};
use crate::ir::{
    BasicBlock, BinOp, BlockId, CastOp, CmpPred, Constant, Function, Instr, InstrKind, IrType,
    Param, TempId, Terminator, Value,
};
use crate::parser::{
    Ast, BinaryOp, Conversion, DeclId, DeclKind, ExprId, ExprKind, Stmt, StmtId, UnaryOp,
};
use crate::source::Location;
use crate::symbol::Interner;

use super::lower_ty;

struct Block {
    label: String,
    instrs: Vec<Instr>,
    terminator: Option<Terminator>,
}

#[derive(Clone, Copy)]
struct LoopTargets {
    continue_block: BlockId,
    break_block: BlockId,
}

/// Lowers one function body into basic blocks.
pub struct FunctionCodegen<'a> {
    ast: &'a Ast,
    interner: &'a Interner,
    globals: &'a HashMap<DeclId, Value>,
    locals: HashMap<DeclId, Value>,
    allocas: Vec<Instr>,
    blocks: Vec<Block>,
    current: Option<BlockId>,
    loops: Vec<LoopTargets>,
    labels: HashMap<&'static str, usize>,
    temp_index: TempId,
    ret: IrType,
}

impl<'a> FunctionCodegen<'a> {
    pub fn new(
        ast: &'a Ast,
        interner: &'a Interner,
        globals: &'a HashMap<DeclId, Value>,
    ) -> Self {
        Self {
            ast,
            interner,
            globals,
            locals: HashMap::new(),
            allocas: vec![],
            blocks: vec![],
            current: None,
            loops: vec![],
            labels: HashMap::new(),
            temp_index: 0,
            ret: IrType::I32,
        }
    }

    pub fn generate(mut self, id: DeclId) -> Result<Function> {
        let decl = self.ast.decl(id);
        let name = self.interner.resolve(decl.name).to_string();
        let Some(Ty::Func(ret, _)) = decl.ty() else {
            return Err(CompileError::internal(format!("`{}` is not a function", name)));
        };
        self.ret = lower_ty(ret);

        let entry = self.new_block("entry");
        self.current = Some(entry);

        let mut params = vec![];
        for (i, &p) in decl.params().iter().enumerate() {
            let param = self.ast.decl(p);
            let ty = param
                .ty()
                .map(lower_ty)
                .ok_or_else(|| CompileError::internal("parameter without a type"))?;
            let slot = self.alloca(ty);
            self.push_void(InstrKind::Store {
                ty,
                value: Value::Arg(i as u32),
                ptr: slot.clone(),
            });
            self.locals.insert(p, slot);
            params.push(Param {
                name: self.interner.resolve(param.name).to_string(),
                ty,
            });
        }

        self.gen_stmt(decl.body()?)?;

        let ret = self.ret;
        let mut blocks: Vec<BasicBlock> = self
            .blocks
            .into_iter()
            .map(|b| BasicBlock {
                label: b.label,
                instrs: b.instrs,
                terminator: b.terminator.unwrap_or(Terminator::Ret {
                    ty: ret,
                    value: Value::Const(Constant::zero(ret)),
                }),
            })
            .collect();
        if let Some(entry) = blocks.first_mut() {
            let body = std::mem::take(&mut entry.instrs);
            entry.instrs = self.allocas;
            entry.instrs.extend(body);
        }

        Ok(Function {
            name,
            params,
            ret,
            blocks,
        })
    }

    fn new_block(&mut self, base: &'static str) -> BlockId {
        let n = self.labels.entry(base).or_insert(0);
        let label = if *n == 0 {
            base.to_string()
        } else {
            format!("{}{}", base, n)
        };
        *n += 1;

        self.blocks.push(Block {
            label,
            instrs: vec![],
            terminator: None,
        });
        self.blocks.len() - 1
    }

    /// The block instructions are appended to. After a terminator this is a
    /// fresh block with no predecessors.
    fn current_block(&mut self) -> BlockId {
        match self.current {
            Some(b) => b,
            None => {
                let b = self.new_block("unreachable");
                self.current = Some(b);
                b
            }
        }
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    fn terminate(&mut self, terminator: Terminator) {
        let b = self.current_block();
        self.blocks[b].terminator = Some(terminator);
        self.current = None;
    }

    /// Falls through to `target` unless the current block already ended.
    fn branch(&mut self, target: BlockId) {
        if self.current.is_some() {
            self.terminate(Terminator::Br(target));
        }
    }

    fn new_temp(&mut self) -> TempId {
        let t = self.temp_index;
        self.temp_index += 1;
        t
    }

    fn push(&mut self, kind: InstrKind) -> Value {
        let t = self.new_temp();
        let b = self.current_block();
        self.blocks[b].instrs.push(Instr {
            result: Some(t),
            kind,
        });
        Value::Temp(t)
    }

    fn push_void(&mut self, kind: InstrKind) {
        let b = self.current_block();
        self.blocks[b].instrs.push(Instr { result: None, kind });
    }

    fn alloca(&mut self, ty: IrType) -> Value {
        let t = self.new_temp();
        self.allocas.push(Instr {
            result: Some(t),
            kind: InstrKind::Alloca { ty },
        });
        Value::Temp(t)
    }

    fn gen_stmt(&mut self, id: StmtId) -> Result<()> {
        match self.ast.stmt(id) {
            Stmt::Block(stmts) => {
                for &s in stmts {
                    self.gen_stmt(s)?;
                }
            }
            Stmt::When(e, s) => self.gen_when(*e, *s)?,
            Stmt::If(e, s1, s2) => self.gen_if(*e, *s1, *s2)?,
            Stmt::While(e, s) => self.gen_while(*e, *s)?,
            Stmt::Break(loc) => {
                let Some(targets) = self.loops.last().copied() else {
                    return Err(outside_loop(loc, SemanticError::BreakOutsideLoop));
                };
                self.terminate(Terminator::Br(targets.break_block));
            }
            Stmt::Continue(loc) => {
                let Some(targets) = self.loops.last().copied() else {
                    return Err(outside_loop(loc, SemanticError::ContinueOutsideLoop));
                };
                self.terminate(Terminator::Br(targets.continue_block));
            }
            Stmt::Return(e) => {
                let value = self.gen_expr(*e)?;
                let ty = self.ret;
                self.terminate(Terminator::Ret { ty, value });
            }
            Stmt::Decl(d) => self.gen_local(*d)?,
            Stmt::Expr(e) => {
                self.gen_expr(*e)?;
            }
        }
        Ok(())
    }

    fn gen_local(&mut self, d: DeclId) -> Result<()> {
        let decl = self.ast.decl(d);
        match &decl.kind {
            DeclKind::Var { ty, .. } => {
                let ty = lower_ty(ty);
                let slot = self.alloca(ty);
                self.locals.insert(d, slot.clone());
                let value = self.gen_expr(decl.init()?)?;
                self.push_void(InstrKind::Store {
                    ty,
                    value,
                    ptr: slot,
                });
            }
            DeclKind::Const { .. } | DeclKind::Value { .. } => {
                let value = self.gen_expr(decl.init()?)?;
                self.locals.insert(d, value);
            }
            _ => return Err(CompileError::internal("only objects can be declared locally")),
        }
        Ok(())
    }

    fn gen_when(&mut self, e: ExprId, s: StmtId) -> Result<()> {
        let cond = self.gen_expr(e)?;
        let then_block = self.new_block("when.then");
        let end_block = self.new_block("when.end");
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block: end_block,
        });

        self.switch_to(then_block);
        self.gen_stmt(s)?;
        self.branch(end_block);

        self.switch_to(end_block);
        Ok(())
    }

    fn gen_if(&mut self, e: ExprId, s1: StmtId, s2: StmtId) -> Result<()> {
        let cond = self.gen_expr(e)?;
        let then_block = self.new_block("if.then");
        let else_block = self.new_block("if.else");
        let end_block = self.new_block("if.end");
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });

        self.switch_to(then_block);
        self.gen_stmt(s1)?;
        self.branch(end_block);

        self.switch_to(else_block);
        self.gen_stmt(s2)?;
        self.branch(end_block);

        self.switch_to(end_block);
        Ok(())
    }

    fn gen_while(&mut self, e: ExprId, s: StmtId) -> Result<()> {
        let cond_block = self.new_block("while.cond");
        let body_block = self.new_block("while.body");
        let end_block = self.new_block("while.end");
        self.terminate(Terminator::Br(cond_block));

        self.switch_to(cond_block);
        let cond = self.gen_expr(e)?;
        self.terminate(Terminator::CondBr {
            cond,
            then_block: body_block,
            else_block: end_block,
        });

        self.switch_to(body_block);
        self.loops.push(LoopTargets {
            continue_block: cond_block,
            break_block: end_block,
        });
        let body = self.gen_stmt(s);
        self.loops.pop();
        body?;
        self.branch(cond_block);

        self.switch_to(end_block);
        Ok(())
    }

    fn gen_expr(&mut self, id: ExprId) -> Result<Value> {
        let expr = self.ast.expr(id);
        match &expr.kind {
            ExprKind::Bool(b) => Ok(Value::Const(Constant::Bool(*b))),
            ExprKind::Int(i) => Ok(Value::Const(Constant::Int(*i))),
            ExprKind::Float(x) => Ok(Value::Const(Constant::Float(*x))),
            ExprKind::Char(c) => Ok(Value::Const(Constant::Char(*c))),
            ExprKind::Id(d) => self.gen_id(*d),
            ExprKind::Unary(op, e) => {
                let v = self.gen_expr(*e)?;
                let (ty, ones) = match op {
                    UnaryOp::BitNot => (IrType::I32, Constant::Int(-1)),
                    UnaryOp::LogicalNot => (IrType::I1, Constant::Bool(true)),
                };
                Ok(self.push(InstrKind::Binary {
                    op: BinOp::Xor,
                    ty,
                    lhs: v,
                    rhs: Value::Const(ones),
                }))
            }
            ExprKind::Binary(op, l, r) if op.is_logical() => self.gen_logical(*op, *l, *r),
            ExprKind::Binary(op, l, r) => self.gen_binary(*op, *l, *r),
            ExprKind::Call(callee, args) => {
                let callee = self.gen_expr(*callee)?;
                let mut lowered = Vec::with_capacity(args.len());
                for &a in args {
                    let ty = lower_ty(&self.ast.expr(a).ty);
                    lowered.push((ty, self.gen_expr(a)?));
                }
                Ok(self.push(InstrKind::Call {
                    ret: lower_ty(&expr.ty),
                    callee,
                    args: lowered,
                }))
            }
            ExprKind::Index(_, _) => Err(CompileError::internal("index expression reached lowering")),
            ExprKind::Cast(e) => self.gen_expr(*e),
            ExprKind::Assign(l, r) => {
                let ptr = self.gen_expr(*l)?;
                let value = self.gen_expr(*r)?;
                let ty = lower_ty(&self.ast.expr(*r).ty);
                self.push_void(InstrKind::Store {
                    ty,
                    value,
                    ptr: ptr.clone(),
                });
                Ok(ptr)
            }
            ExprKind::Cond(c, t, f) => self.gen_cond(lower_ty(&expr.ty), *c, *t, *f),
            ExprKind::Conv(conv, e) => self.gen_conv(*conv, *e, lower_ty(&expr.ty)),
        }
    }

    /// Locals first, then module symbols, then global constants, which have
    /// no storage and are re-evaluated where they are used.
    fn gen_id(&mut self, d: DeclId) -> Result<Value> {
        if let Some(v) = self.locals.get(&d) {
            return Ok(v.clone());
        }
        if let Some(v) = self.globals.get(&d) {
            return Ok(v.clone());
        }
        let decl = self.ast.decl(d);
        match decl.kind {
            DeclKind::Const { .. } | DeclKind::Value { .. } => self.gen_expr(decl.init()?),
            _ => Err(CompileError::internal(format!(
                "no storage for `{}`",
                self.interner.resolve(decl.name)
            ))),
        }
    }

    fn gen_conv(&mut self, conv: Conversion, e: ExprId, to: IrType) -> Result<Value> {
        let from = lower_ty(&self.ast.expr(e).ty);
        let v = self.gen_expr(e)?;
        let cast = |op, value| InstrKind::Cast {
            op,
            from,
            to,
            value,
        };
        Ok(match conv {
            Conversion::Value => self.push(InstrKind::Load { ty: to, ptr: v }),
            Conversion::Bool => {
                let pred = if from.is_float() { CmpPred::ONe } else { CmpPred::Ne };
                self.push(InstrKind::Cmp {
                    pred,
                    ty: from,
                    lhs: v,
                    rhs: Value::Const(Constant::zero(from)),
                })
            }
            Conversion::Char => self.push(cast(CastOp::Trunc, v)),
            Conversion::Int if from == IrType::I1 => self.push(cast(CastOp::ZExt, v)),
            Conversion::Int => self.push(cast(CastOp::SExt, v)),
            Conversion::Trunc => self.push(cast(CastOp::FpToSi, v)),
            Conversion::Ext => self.push(cast(CastOp::SiToFp, v)),
        })
    }

    fn gen_binary(&mut self, op: BinaryOp, l: ExprId, r: ExprId) -> Result<Value> {
        let ty = lower_ty(&self.ast.expr(l).ty);
        let lhs = self.gen_expr(l)?;
        let rhs = self.gen_expr(r)?;

        if op.is_comparison() {
            let pred = compare_pred(op, ty.is_float())?;
            return Ok(self.push(InstrKind::Cmp { pred, ty, lhs, rhs }));
        }

        let op = arithmetic_op(op, ty.is_float())?;
        Ok(self.push(InstrKind::Binary { op, ty, lhs, rhs }))
    }

    /// `a && b` and `a || b` evaluate `b` only when `a` does not decide the
    /// result.
    fn gen_logical(&mut self, op: BinaryOp, l: ExprId, r: ExprId) -> Result<Value> {
        let lhs = self.gen_expr(l)?;
        let lhs_block = self.current_block();

        let (rhs_block, end_block, short) = if op == BinaryOp::LogicalAnd {
            (self.new_block("and.rhs"), self.new_block("and.end"), false)
        } else {
            (self.new_block("or.rhs"), self.new_block("or.end"), true)
        };
        let (then_block, else_block) = if short {
            (end_block, rhs_block)
        } else {
            (rhs_block, end_block)
        };
        self.terminate(Terminator::CondBr {
            cond: lhs,
            then_block,
            else_block,
        });

        self.switch_to(rhs_block);
        let rhs = self.gen_expr(r)?;
        let rhs_end = self.current_block();
        self.branch(end_block);

        self.switch_to(end_block);
        Ok(self.push(InstrKind::Phi {
            ty: IrType::I1,
            incoming: vec![
                (Value::Const(Constant::Bool(short)), lhs_block),
                (rhs, rhs_end),
            ],
        }))
    }

    fn gen_cond(&mut self, ty: IrType, c: ExprId, t: ExprId, f: ExprId) -> Result<Value> {
        let cond = self.gen_expr(c)?;
        let true_block = self.new_block("cond.true");
        let false_block = self.new_block("cond.false");
        let end_block = self.new_block("cond.end");
        self.terminate(Terminator::CondBr {
            cond,
            then_block: true_block,
            else_block: false_block,
        });

        self.switch_to(true_block);
        let tv = self.gen_expr(t)?;
        let true_end = self.current_block();
        self.branch(end_block);

        self.switch_to(false_block);
        let fv = self.gen_expr(f)?;
        let false_end = self.current_block();
        self.branch(end_block);

        self.switch_to(end_block);
        Ok(self.push(InstrKind::Phi {
            ty,
            incoming: vec![(tv, true_end), (fv, false_end)],
        }))
    }
}

fn outside_loop(loc: &Location, error: SemanticError) -> CompileError {
    CompileError::semantic(loc.clone(), error)
}

fn compare_pred(op: BinaryOp, float: bool) -> Result<CmpPred> {
    Ok(match (op, float) {
        (BinaryOp::Eq, false) => CmpPred::Eq,
        (BinaryOp::Ne, false) => CmpPred::Ne,
        (BinaryOp::Lt, false) => CmpPred::Slt,
        (BinaryOp::Gt, false) => CmpPred::Sgt,
        (BinaryOp::Le, false) => CmpPred::Sle,
        (BinaryOp::Ge, false) => CmpPred::Sge,
        (BinaryOp::Eq, true) => CmpPred::OEq,
        (BinaryOp::Ne, true) => CmpPred::ONe,
        (BinaryOp::Lt, true) => CmpPred::OLt,
        (BinaryOp::Gt, true) => CmpPred::OGt,
        (BinaryOp::Le, true) => CmpPred::OLe,
        (BinaryOp::Ge, true) => CmpPred::OGe,
        _ => return Err(CompileError::internal(format!("{:?} is not a comparison", op))),
    })
}

fn arithmetic_op(op: BinaryOp, float: bool) -> Result<BinOp> {
    Ok(match (op, float) {
        (BinaryOp::Add, false) => BinOp::Add,
        (BinaryOp::Sub, false) => BinOp::Sub,
        (BinaryOp::Mul, false) => BinOp::Mul,
        (BinaryOp::Div, false) => BinOp::SDiv,
        (BinaryOp::Rem, false) => BinOp::SRem,
        (BinaryOp::Add, true) => BinOp::FAdd,
        (BinaryOp::Sub, true) => BinOp::FSub,
        (BinaryOp::Mul, true) => BinOp::FMul,
        (BinaryOp::Div, true) => BinOp::FDiv,
        (BinaryOp::Rem, true) => BinOp::FRem,
        (BinaryOp::And, false) => BinOp::And,
        (BinaryOp::Or, false) => BinOp::Or,
        (BinaryOp::Xor, false) => BinOp::Xor,
        (BinaryOp::Shl, false) => BinOp::Shl,
        (BinaryOp::Shr, false) => BinOp::AShr,
        _ => return Err(CompileError::internal(format!("{:?} has no lowering here", op))),
    })
}
