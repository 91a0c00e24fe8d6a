use std::fmt;

use super::{
    BinOp, CastOp, CmpPred, Constant, Function, Global, Instr, InstrKind, IrConsumer, IrType,
    Module, Terminator, Value,
};

/// Renders a module as LLVM-flavoured text.
#[derive(Debug, Default)]
pub struct Printer {
    out: String,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl IrConsumer for Printer {
    fn declare_global(&mut self, global: &Global) {
        self.out.push_str(&global.to_string());
        self.out.push('\n');
    }

    fn define_function(&mut self, function: &Function) {
        self.out.push('\n');
        self.out.push_str(&function.to_string());
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        let mut printer = Printer::new();
        self.emit(&mut printer);
        f.write_str(&printer.finish())
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IrType::I1 => "i1",
            IrType::I8 => "i8",
            IrType::I32 => "i32",
            IrType::F32 => "float",
            IrType::Ptr => "ptr",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Char(c) => write!(f, "{}", c),
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Float(x) => write!(f, "{:?}", x),
            Constant::Null => write!(f, "null"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Const(c) => write!(f, "{}", c),
            Value::Temp(t) => write!(f, "%t{}", t),
            Value::Arg(i) => write!(f, "%arg{}", i),
            Value::Global(name) | Value::Function(name) => write!(f, "@{}", name),
        }
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} = global {} {}", self.name, self.ty, self.init)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {} @{}(", self.ret, self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} %arg{}", p.ty, i)?;
        }
        writeln!(f, ") {{")?;

        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block.label)?;
            for instr in &block.instrs {
                write!(f, "  ")?;
                write_instr(f, self, instr)?;
                writeln!(f)?;
            }
            write!(f, "  ")?;
            write_terminator(f, self, &block.terminator)?;
            writeln!(f)?;
        }
        writeln!(f, "}}")
    }
}

fn bin_op_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::SDiv => "sdiv",
        BinOp::SRem => "srem",
        BinOp::And => "and",
        BinOp::Or => "or",
        BinOp::Xor => "xor",
        BinOp::Shl => "shl",
        BinOp::AShr => "ashr",
        BinOp::FAdd => "fadd",
        BinOp::FSub => "fsub",
        BinOp::FMul => "fmul",
        BinOp::FDiv => "fdiv",
        BinOp::FRem => "frem",
    }
}

fn pred_name(pred: CmpPred) -> &'static str {
    match pred {
        CmpPred::Eq => "eq",
        CmpPred::Ne => "ne",
        CmpPred::Slt => "slt",
        CmpPred::Sgt => "sgt",
        CmpPred::Sle => "sle",
        CmpPred::Sge => "sge",
        CmpPred::OEq => "oeq",
        CmpPred::ONe => "one",
        CmpPred::OLt => "olt",
        CmpPred::OGt => "ogt",
        CmpPred::OLe => "ole",
        CmpPred::OGe => "oge",
    }
}

fn cast_name(op: CastOp) -> &'static str {
    match op {
        CastOp::Trunc => "trunc",
        CastOp::ZExt => "zext",
        CastOp::SExt => "sext",
        CastOp::FpToSi => "fptosi",
        CastOp::SiToFp => "sitofp",
    }
}

fn write_instr(f: &mut fmt::Formatter<'_>, func: &Function, instr: &Instr) -> fmt::Result {
    if let Some(t) = instr.result {
        write!(f, "%t{} = ", t)?;
    }
    match &instr.kind {
        InstrKind::Alloca { ty } => write!(f, "alloca {}", ty),
        InstrKind::Load { ty, ptr } => write!(f, "load {}, ptr {}", ty, ptr),
        InstrKind::Store { ty, value, ptr } => write!(f, "store {} {}, ptr {}", ty, value, ptr),
        InstrKind::Binary { op, ty, lhs, rhs } => {
            write!(f, "{} {} {}, {}", bin_op_name(*op), ty, lhs, rhs)
        }
        InstrKind::Cmp { pred, ty, lhs, rhs } => {
            let kind = if pred.is_float() { "fcmp" } else { "icmp" };
            write!(f, "{} {} {} {}, {}", kind, pred_name(*pred), ty, lhs, rhs)
        }
        InstrKind::Cast {
            op,
            from,
            to,
            value,
        } => write!(f, "{} {} {} to {}", cast_name(*op), from, value, to),
        InstrKind::Call { ret, callee, args } => {
            write!(f, "call {} {}(", ret, callee)?;
            for (i, (ty, arg)) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {}", ty, arg)?;
            }
            write!(f, ")")
        }
        InstrKind::Phi { ty, incoming } => {
            write!(f, "phi {} ", ty)?;
            for (i, (value, block)) in incoming.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "[ {}, %{} ]", value, func.label(*block))?;
            }
            Ok(())
        }
    }
}

fn write_terminator(f: &mut fmt::Formatter<'_>, func: &Function, term: &Terminator) -> fmt::Result {
    match term {
        Terminator::Br(target) => write!(f, "br label %{}", func.label(*target)),
        Terminator::CondBr {
            cond,
            then_block,
            else_block,
        } => write!(
            f,
            "br i1 {}, label %{}, label %{}",
            cond,
            func.label(*then_block),
            func.label(*else_block)
        ),
        Terminator::Ret { ty, value } => write!(f, "ret {} {}", ty, value),
    }
}
