use std::collections::HashMap;

use crate::analyzer::Ty;
use crate::error::{CompileError, Result};
use crate::ir::{Constant, Global, IrType, Module, Value};
use crate::parser::{DeclId, DeclKind, TranslationUnit};
use crate::symbol::Interner;

use super::FunctionCodegen;

/// Lowers an analyzed translation unit into an IR module.
pub struct Codegen<'a> {
    unit: &'a TranslationUnit,
    interner: &'a Interner,
    globals: HashMap<DeclId, Value>,
}

impl<'a> Codegen<'a> {
    pub fn new(unit: &'a TranslationUnit, interner: &'a Interner) -> Self {
        Self {
            unit,
            interner,
            globals: HashMap::new(),
        }
    }

    pub fn generate(mut self) -> Result<Module> {
        let unit = self.unit;
        let ast = &unit.ast;
        let program = ast.decl(unit.program);
        let mut module = Module::new(self.interner.resolve(program.name));

        let mut functions = vec![];
        for &d in unit.decls() {
            let decl = ast.decl(d);
            let name = self.interner.resolve(decl.name).to_string();
            match &decl.kind {
                DeclKind::Var { ty, .. } => {
                    let ty = lower_ty(ty);
                    module.globals.push(Global {
                        name: name.clone(),
                        ty,
                        init: Constant::zero(ty),
                    });
                    self.globals.insert(d, Value::Global(name));
                }
                DeclKind::Function { .. } => {
                    self.globals.insert(d, Value::Function(name));
                    functions.push(d);
                }
                // Inlined at every use.
                DeclKind::Const { .. } | DeclKind::Value { .. } => {}
                DeclKind::Param { .. } | DeclKind::Program { .. } => {
                    return Err(CompileError::internal(format!(
                        "unexpected top-level declaration `{}`",
                        name
                    )));
                }
            }
        }

        for d in functions {
            let function = FunctionCodegen::new(ast, self.interner, &self.globals).generate(d)?;
            module.functions.push(function);
        }

        Ok(module)
    }
}

/// Storage type of a value of type `ty`. References and functions are
/// addresses.
pub fn lower_ty(ty: &Ty) -> IrType {
    match ty {
        Ty::Bool => IrType::I1,
        Ty::Char => IrType::I8,
        Ty::Int => IrType::I32,
        Ty::Float => IrType::F32,
        Ty::Ptr(_) | Ty::Ref(_) | Ty::Func(_, _) => IrType::Ptr,
    }
}
