//! Block-structured intermediate representation.
//!
//! A [`Module`] holds globals and functions. Each function is a list of basic
//! blocks; every block ends in exactly one [`Terminator`]. Values are typed
//! constants, numbered temporaries, incoming arguments, or module symbols.
//! Memory is opaque `ptr` addressed, in the style of LLVM IR.

mod printer;

pub use printer::Printer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    I1,
    I8,
    I32,
    F32,
    Ptr,
}

impl IrType {
    pub fn is_float(self) -> bool {
        self == IrType::F32
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constant {
    Bool(bool),
    Char(u8),
    Int(i32),
    Float(f64),
    Null,
}

impl Constant {
    pub fn zero(ty: IrType) -> Self {
        match ty {
            IrType::I1 => Constant::Bool(false),
            IrType::I8 => Constant::Char(0),
            IrType::I32 => Constant::Int(0),
            IrType::F32 => Constant::Float(0.0),
            IrType::Ptr => Constant::Null,
        }
    }

    pub fn ty(&self) -> IrType {
        match self {
            Constant::Bool(_) => IrType::I1,
            Constant::Char(_) => IrType::I8,
            Constant::Int(_) => IrType::I32,
            Constant::Float(_) => IrType::F32,
            Constant::Null => IrType::Ptr,
        }
    }
}

pub type TempId = u32;
pub type BlockId = usize;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Const(Constant),
    Temp(TempId),
    /// The n-th incoming argument of the current function.
    Arg(u32),
    Global(String),
    Function(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
    And,
    Or,
    Xor,
    Shl,
    AShr,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpPred {
    Eq,
    Ne,
    Slt,
    Sgt,
    Sle,
    Sge,
    OEq,
    ONe,
    OLt,
    OGt,
    OLe,
    OGe,
}

impl CmpPred {
    pub fn is_float(self) -> bool {
        matches!(
            self,
            CmpPred::OEq | CmpPred::ONe | CmpPred::OLt | CmpPred::OGt | CmpPred::OLe | CmpPred::OGe
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastOp {
    Trunc,
    ZExt,
    SExt,
    FpToSi,
    SiToFp,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InstrKind {
    Alloca {
        ty: IrType,
    },
    Load {
        ty: IrType,
        ptr: Value,
    },
    Store {
        ty: IrType,
        value: Value,
        ptr: Value,
    },
    Binary {
        op: BinOp,
        ty: IrType,
        lhs: Value,
        rhs: Value,
    },
    Cmp {
        pred: CmpPred,
        ty: IrType,
        lhs: Value,
        rhs: Value,
    },
    Cast {
        op: CastOp,
        from: IrType,
        to: IrType,
        value: Value,
    },
    Call {
        ret: IrType,
        callee: Value,
        args: Vec<(IrType, Value)>,
    },
    Phi {
        ty: IrType,
        incoming: Vec<(Value, BlockId)>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instr {
    pub result: Option<TempId>,
    pub kind: InstrKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret {
        ty: IrType,
        value: Value,
    },
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br(target) => vec![*target],
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Ret { .. } => vec![],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BasicBlock {
    pub label: String,
    pub instrs: Vec<Instr>,
    pub terminator: Terminator,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: IrType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: IrType,
    /// The first block is the entry block.
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn entry(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }

    pub fn label(&self, id: BlockId) -> &str {
        self.blocks.get(id).map_or("<invalid>", |b| b.label.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Global {
    pub name: String,
    pub ty: IrType,
    pub init: Constant,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module {
    pub name: String,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

/// Receives a lowered module piece by piece, globals first.
pub trait IrConsumer {
    fn declare_global(&mut self, global: &Global);
    fn define_function(&mut self, function: &Function);
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            globals: vec![],
            functions: vec![],
        }
    }

    pub fn emit<C: IrConsumer + ?Sized>(&self, consumer: &mut C) {
        for g in &self.globals {
            consumer.declare_global(g);
        }
        for f in &self.functions {
            consumer.define_function(f);
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }
}
