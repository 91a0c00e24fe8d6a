use mcc::error::SemanticError;
use mcc::ir::*;
use mcc::SourceFile;

fn compile(input: &str) -> Module {
    mcc::compile(&SourceFile::new("test.mc", input)).unwrap()
}

fn labels(f: &Function) -> Vec<&str> {
    f.blocks.iter().map(|b| b.label.as_str()).collect()
}

fn block_index(f: &Function, label: &str) -> BlockId {
    f.blocks.iter().position(|b| b.label == label).unwrap()
}

fn instrs<'a>(f: &'a Function, label: &str) -> Vec<&'a InstrKind> {
    f.block(label).unwrap().instrs.iter().map(|i| &i.kind).collect()
}

#[test]
fn globals_and_module_name() {
    let module = compile(
        "var g: int = 5;
         var flag: bool = true;
         let k: int = 7;
         def main() -> int { return k; }",
    );
    assert_eq!(module.name, "test.mc");
    assert_eq!(
        module.globals,
        vec![
            Global {
                name: "g".to_string(),
                ty: IrType::I32,
                init: Constant::Int(0)
            },
            Global {
                name: "flag".to_string(),
                ty: IrType::I1,
                init: Constant::Bool(false)
            },
        ]
    );
    let main = module.function("main").unwrap();
    assert_eq!(labels(main), ["entry"]);
    assert_eq!(
        main.entry().unwrap().terminator,
        Terminator::Ret {
            ty: IrType::I32,
            value: Value::Const(Constant::Int(7))
        }
    );
}

#[test]
fn parameters_get_stack_slots() {
    let module = compile("def add(a: int, b: int) -> int { return a + b; }");
    let add = module.function("add").unwrap();
    assert_eq!(
        add.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        ["a", "b"]
    );
    assert_eq!(
        instrs(add, "entry"),
        [
            &InstrKind::Alloca { ty: IrType::I32 },
            &InstrKind::Alloca { ty: IrType::I32 },
            &InstrKind::Store {
                ty: IrType::I32,
                value: Value::Arg(0),
                ptr: Value::Temp(0)
            },
            &InstrKind::Store {
                ty: IrType::I32,
                value: Value::Arg(1),
                ptr: Value::Temp(1)
            },
            &InstrKind::Load {
                ty: IrType::I32,
                ptr: Value::Temp(0)
            },
            &InstrKind::Load {
                ty: IrType::I32,
                ptr: Value::Temp(1)
            },
            &InstrKind::Binary {
                op: BinOp::Add,
                ty: IrType::I32,
                lhs: Value::Temp(2),
                rhs: Value::Temp(3)
            },
        ]
    );
    assert_eq!(
        add.entry().unwrap().terminator,
        Terminator::Ret {
            ty: IrType::I32,
            value: Value::Temp(4)
        }
    );
}

#[test]
fn assignment_stores_to_globals() {
    let module = compile("var g: int = 0; def main() -> int { g = g + 1; return g; }");
    let main = module.function("main").unwrap();
    let stored = instrs(main, "entry").into_iter().any(|i| {
        matches!(
            i,
            InstrKind::Store {
                ty: IrType::I32,
                ptr: Value::Global(name),
                ..
            } if name == "g"
        )
    });
    assert!(stored);
}

#[test]
fn while_with_break_and_continue() {
    let module = compile(
        "def f(n: int) -> int {
            var i: int = 0;
            while (i < n) {
                i = i + 1;
                when (i == 3) continue;
                when (i == 5) break;
            }
            return i;
        }",
    );
    let f = module.function("f").unwrap();
    assert_eq!(
        labels(f),
        [
            "entry",
            "while.cond",
            "while.body",
            "while.end",
            "when.then",
            "when.end",
            "when.then1",
            "when.end1",
        ]
    );

    let cond = block_index(f, "while.cond");
    let body = block_index(f, "while.body");
    let end = block_index(f, "while.end");
    assert_eq!(f.block("entry").unwrap().terminator, Terminator::Br(cond));
    assert_eq!(
        f.block("while.cond").unwrap().terminator.successors(),
        [body, end]
    );
    assert_eq!(f.block("when.then").unwrap().terminator, Terminator::Br(cond));
    assert_eq!(f.block("when.then1").unwrap().terminator, Terminator::Br(end));
    assert_eq!(f.block("when.end1").unwrap().terminator, Terminator::Br(cond));
    assert!(matches!(
        f.block("while.end").unwrap().terminator,
        Terminator::Ret { .. }
    ));
}

#[test]
fn if_else_blocks() {
    let module = compile(
        "def sign(x: int) -> int { if (x < 0) return -1; else { when (x == 0) return 0; } return 1; }",
    );
    let f = module.function("sign").unwrap();
    let then_block = block_index(f, "if.then");
    let else_block = block_index(f, "if.else");
    assert_eq!(
        f.entry().unwrap().terminator.successors(),
        [then_block, else_block]
    );
    assert!(matches!(
        f.block("if.then").unwrap().terminator,
        Terminator::Ret { .. }
    ));
    assert_eq!(
        f.block("when.end").unwrap().terminator,
        Terminator::Br(block_index(f, "if.end"))
    );
}

#[test]
fn logical_and_short_circuits() {
    let module = compile("def f(a: bool, b: bool) -> bool { return a && b; }");
    let f = module.function("f").unwrap();
    assert_eq!(labels(f), ["entry", "and.rhs", "and.end"]);

    let Terminator::CondBr {
        then_block,
        else_block,
        ..
    } = f.entry().unwrap().terminator
    else {
        panic!();
    };
    assert_eq!((then_block, else_block), (1, 2));

    let end = instrs(f, "and.end");
    let InstrKind::Phi { ty, incoming } = end[0] else {
        panic!();
    };
    assert_eq!(*ty, IrType::I1);
    assert_eq!(incoming[0], (Value::Const(Constant::Bool(false)), 0));
    assert_eq!(incoming[1].1, 1);
}

#[test]
fn logical_or_short_circuits() {
    let module = compile("def f(a: bool, b: bool) -> bool { return a || b; }");
    let f = module.function("f").unwrap();
    assert_eq!(labels(f), ["entry", "or.rhs", "or.end"]);

    let Terminator::CondBr {
        then_block,
        else_block,
        ..
    } = f.entry().unwrap().terminator
    else {
        panic!();
    };
    assert_eq!((then_block, else_block), (2, 1));

    let end = instrs(f, "or.end");
    let InstrKind::Phi { incoming, .. } = end[0] else {
        panic!();
    };
    assert_eq!(incoming[0], (Value::Const(Constant::Bool(true)), 0));
}

#[test]
fn conditional_reference_is_a_pointer_phi() {
    let module = compile(
        "def f(b: bool) -> int { var x: int = 1; var y: int = 2; (b ? x : y) = 3; return x; }",
    );
    let f = module.function("f").unwrap();
    let end = instrs(f, "cond.end");
    let InstrKind::Phi { ty, .. } = end[0] else {
        panic!();
    };
    assert_eq!(*ty, IrType::Ptr);
    let InstrKind::Store { value, .. } = end[1] else {
        panic!();
    };
    assert_eq!(*value, Value::Const(Constant::Int(3)));
}

#[test]
fn conversions_lower_to_casts() {
    let module = compile(
        "def a(c: char) -> int { return c as int; }
         def b(x: bool) -> int { return x as int; }
         def c(x: float) -> int { return x as int; }
         def d(x: int) -> float { return x as float; }
         def e(x: int) -> char { return x as char; }",
    );
    let expected = [
        ("a", CastOp::SExt, IrType::I8, IrType::I32),
        ("b", CastOp::ZExt, IrType::I1, IrType::I32),
        ("c", CastOp::FpToSi, IrType::F32, IrType::I32),
        ("d", CastOp::SiToFp, IrType::I32, IrType::F32),
        ("e", CastOp::Trunc, IrType::I32, IrType::I8),
    ];
    for (name, op, from, to) in expected {
        let f = module.function(name).unwrap();
        let found = instrs(f, "entry").into_iter().any(|i| {
            matches!(
                i,
                InstrKind::Cast { op: o, from: fr, to: t, .. } if *o == op && *fr == from && *t == to
            )
        });
        assert!(found, "{} has no {:?}", name, op);
    }
}

#[test]
fn conversion_to_bool_compares_with_zero() {
    let module = compile(
        "def a(x: int) -> bool { return x as bool; }
         def b(x: float) -> bool { return x as bool; }",
    );
    let a = instrs(module.function("a").unwrap(), "entry");
    let InstrKind::Cmp { pred, rhs, .. } = a[3] else {
        panic!();
    };
    assert_eq!((*pred, rhs), (CmpPred::Ne, &Value::Const(Constant::Int(0))));

    let b = instrs(module.function("b").unwrap(), "entry");
    let InstrKind::Cmp { pred, .. } = b[3] else {
        panic!();
    };
    assert_eq!(*pred, CmpPred::ONe);
}

#[test]
fn float_arithmetic_and_comparison() {
    let module = compile("def f(x: float) -> bool { return -x * 2.0 < x; }");
    let f = module.function("f").unwrap();
    let kinds = instrs(f, "entry");
    assert!(kinds
        .iter()
        .any(|i| matches!(i, InstrKind::Binary { op: BinOp::FSub, .. })));
    assert!(kinds
        .iter()
        .any(|i| matches!(i, InstrKind::Binary { op: BinOp::FMul, .. })));
    assert!(kinds
        .iter()
        .any(|i| matches!(i, InstrKind::Cmp { pred: CmpPred::OLt, .. })));
    let text = f.to_string();
    assert!(text.contains("fcmp olt float "));
    assert!(!text.contains("icmp"));
}

#[test]
fn recursive_call() {
    let module = compile(
        "def fact(n: int) -> int { if (n <= 1) return 1; else return n * fact(n - 1); }",
    );
    let f = module.function("fact").unwrap();
    let call = instrs(f, "if.else").into_iter().find_map(|i| match i {
        InstrKind::Call { callee, args, .. } => Some((callee, args)),
        _ => None,
    });
    let Some((callee, args)) = call else {
        panic!();
    };
    assert_eq!(callee, &Value::Function("fact".to_string()));
    assert_eq!(args.len(), 1);
    assert_eq!(args[0].0, IrType::I32);
}

#[test]
fn function_values_are_pointers() {
    let module = compile(
        "def apply(f: (int) -> int, x: int) -> int { return f(x); }
         def inc(x: int) -> int { return x + 1; }
         def main() -> int { return apply(inc, 41); }",
    );
    let apply = module.function("apply").unwrap();
    assert_eq!(apply.params[0].ty, IrType::Ptr);

    let main = module.function("main").unwrap();
    let entry = instrs(main, "entry");
    let InstrKind::Call { args, .. } = entry[0] else {
        panic!();
    };
    assert_eq!(
        args,
        &vec![
            (IrType::Ptr, Value::Function("inc".to_string())),
            (IrType::I32, Value::Const(Constant::Int(41))),
        ]
    );
}

#[test]
fn missing_return_yields_zero() {
    let module = compile("def f() -> float { var x: float = 1.5; }");
    let f = module.function("f").unwrap();
    assert_eq!(
        f.entry().unwrap().terminator,
        Terminator::Ret {
            ty: IrType::F32,
            value: Value::Const(Constant::Float(0.0))
        }
    );
}

#[test]
fn break_outside_loop() {
    let err = mcc::compile(&SourceFile::new("test.mc", "def main() -> int { break; return 0; }"))
        .unwrap_err();
    assert_eq!(err.category(), "semantic");
    assert_eq!(err.as_semantic(), Some(&SemanticError::BreakOutsideLoop));
    assert_eq!(err.location().map(|l| l.column), Some(21));

    let err = mcc::compile(&SourceFile::new(
        "test.mc",
        "def main() -> int { when (true) continue; return 0; }",
    ))
    .unwrap_err();
    assert_eq!(err.as_semantic(), Some(&SemanticError::ContinueOutsideLoop));
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl IrConsumer for Recorder {
    fn declare_global(&mut self, global: &Global) {
        self.events.push(format!("global {}", global.name));
    }

    fn define_function(&mut self, function: &Function) {
        self.events.push(format!("function {}", function.name));
    }
}

#[test]
fn consumer_sees_globals_first() {
    let module = compile(
        "def f() -> int { return 1; }
         var a: int = 0;
         def main() -> int { return f(); }
         var b: char = 'x';",
    );
    let mut recorder = Recorder::default();
    module.emit(&mut recorder);
    assert_eq!(
        recorder.events,
        ["global a", "global b", "function f", "function main"]
    );
}

#[test]
fn printed_module() {
    let module = compile("var g: int = 1; def main() -> int { return 0; }");
    assert_eq!(
        module.to_string(),
        "; ModuleID = 'test.mc'
@g = global i32 0

define i32 @main() {
entry:
  ret i32 0
}
"
    );
}

#[test]
fn printed_branches_and_phis() {
    let module = compile("def f(a: bool, b: bool) -> bool { return a && b; }");
    let text = module.function("f").unwrap().to_string();
    assert!(text.starts_with("define i1 @f(i1 %arg0, i1 %arg1) {"));
    assert!(text.contains("br i1 %t2, label %and.rhs, label %and.end"));
    assert!(text.contains("phi i1 [ false, %entry ], [ %t3, %and.rhs ]"));
    assert!(text.contains("ret i1 %t4"));
}

#[test]
fn global_read_in_main() {
    let module = compile("var x: int = 1; def main() -> int { return x + 2; }");
    let main = module.function("main").unwrap();
    assert_eq!(labels(main), ["entry"]);
    assert_eq!(
        instrs(main, "entry"),
        [
            &InstrKind::Load {
                ty: IrType::I32,
                ptr: Value::Global("x".to_string())
            },
            &InstrKind::Binary {
                op: BinOp::Add,
                ty: IrType::I32,
                lhs: Value::Temp(0),
                rhs: Value::Const(Constant::Int(2))
            },
        ]
    );
    assert_eq!(
        main.entry().unwrap().terminator,
        Terminator::Ret {
            ty: IrType::I32,
            value: Value::Temp(1)
        }
    );
}

#[test]
fn local_constant_is_evaluated_once() {
    let module = compile(
        "var n: int = 0;
         def bump() -> int { n = n + 1; return n; }
         def main() -> int { let v: int = bump(); return v + v; }",
    );
    let main = module.function("main").unwrap();
    let calls = instrs(main, "entry")
        .into_iter()
        .filter(|i| matches!(i, InstrKind::Call { .. }))
        .count();
    assert_eq!(calls, 1);
}
