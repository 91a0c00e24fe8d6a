use mcc::analyzer::Ty;
use mcc::error::SemanticError;
use mcc::parser::*;
use mcc::{CompileError, Interner, SourceFile};

fn analyze(input: &str) -> (TranslationUnit, Interner) {
    let interner = Interner::new();
    let unit = mcc::parse(&SourceFile::new("test.mc", input), &interner).unwrap();
    (unit, interner)
}

fn parse_error(input: &str) -> CompileError {
    let interner = Interner::new();
    mcc::parse(&SourceFile::new("test.mc", input), &interner).unwrap_err()
}

fn semantic_error(input: &str) -> SemanticError {
    let err = parse_error(input);
    let Some(error) = err.as_semantic() else {
        panic!("expected a semantic error, got {}", err);
    };
    error.clone()
}

fn function_body<'a>(unit: &'a TranslationUnit, interner: &Interner, name: &str) -> &'a [StmtId] {
    let sym = interner.get(name).unwrap();
    let decl = unit
        .decls()
        .iter()
        .map(|&d| unit.ast.decl(d))
        .find(|d| d.name == sym)
        .unwrap();
    let DeclKind::Function {
        body: Some(body), ..
    } = &decl.kind
    else {
        panic!();
    };
    let Stmt::Block(stmts) = unit.ast.stmt(*body) else {
        panic!();
    };
    stmts
}

fn returned<'a>(unit: &'a TranslationUnit, stmts: &[StmtId]) -> &'a Expr {
    let Some(&last) = stmts.last() else {
        panic!();
    };
    let Stmt::Return(e) = unit.ast.stmt(last) else {
        panic!();
    };
    unit.ast.expr(*e)
}

fn return_of<'a>(unit: &'a TranslationUnit, interner: &Interner, name: &str) -> &'a Expr {
    returned(unit, function_body(unit, interner, name))
}

#[test]
fn multiplication_binds_tighter() {
    let (unit, interner) = analyze("def f() -> int { return 1 + 2 * 3; }");
    let e = return_of(&unit, &interner, "f");
    let ExprKind::Binary(BinaryOp::Add, l, r) = e.kind else {
        panic!();
    };
    assert_eq!(unit.ast.expr(l).kind, ExprKind::Int(1));
    let ExprKind::Binary(BinaryOp::Mul, _, _) = unit.ast.expr(r).kind else {
        panic!();
    };
    assert_eq!(e.ty, Ty::Int);
}

#[test]
fn subtraction_is_left_associative() {
    let (unit, interner) = analyze("def f() -> int { return 10 - 4 - 3; }");
    let e = return_of(&unit, &interner, "f");
    let ExprKind::Binary(BinaryOp::Sub, l, r) = e.kind else {
        panic!();
    };
    assert_eq!(unit.ast.expr(r).kind, ExprKind::Int(3));
    let ExprKind::Binary(BinaryOp::Sub, _, _) = unit.ast.expr(l).kind else {
        panic!();
    };
}

#[test]
fn comparisons_below_shifts() {
    let (unit, interner) = analyze("def f(x: int) -> bool { return x << 1 < 8 && !false; }");
    let e = return_of(&unit, &interner, "f");
    let ExprKind::Binary(BinaryOp::LogicalAnd, l, r) = e.kind else {
        panic!();
    };
    let ExprKind::Binary(BinaryOp::Lt, shift, _) = unit.ast.expr(l).kind else {
        panic!();
    };
    let ExprKind::Binary(BinaryOp::Shl, _, _) = unit.ast.expr(shift).kind else {
        panic!();
    };
    let ExprKind::Unary(UnaryOp::LogicalNot, _) = unit.ast.expr(r).kind else {
        panic!();
    };
    assert_eq!(e.ty, Ty::Bool);
}

#[test]
fn assignment_is_right_associative() {
    let (unit, interner) = analyze(
        "def f() -> int { var a: int = 0; var b: int = 0; a = b = 1; return a; }",
    );
    let stmts = function_body(&unit, &interner, "f");
    let Stmt::Expr(e) = unit.ast.stmt(stmts[2]) else {
        panic!();
    };
    let outer = unit.ast.expr(*e);
    assert_eq!(outer.ty, Ty::reference_to(Ty::Int));
    let ExprKind::Assign(_, rhs) = outer.kind else {
        panic!();
    };
    let ExprKind::Conv(Conversion::Value, inner) = unit.ast.expr(rhs).kind else {
        panic!();
    };
    let ExprKind::Assign(_, _) = unit.ast.expr(inner).kind else {
        panic!();
    };
}

#[test]
fn variables_load_where_values_are_needed() {
    let (unit, interner) = analyze("var g: int = 1; def f() -> int { return g; }");
    let e = return_of(&unit, &interner, "f");
    let ExprKind::Conv(Conversion::Value, id) = e.kind else {
        panic!();
    };
    assert_eq!(e.ty, Ty::Int);
    assert_eq!(unit.ast.expr(id).ty, Ty::reference_to(Ty::Int));
}

#[test]
fn constants_are_not_references() {
    let (unit, interner) = analyze("let k: int = 1; def f() -> int { return k; }");
    let e = return_of(&unit, &interner, "f");
    let ExprKind::Id(d) = e.kind else {
        panic!();
    };
    assert_eq!(e.ty, Ty::Int);
    assert!(matches!(unit.ast.decl(d).kind, DeclKind::Const { .. }));
}

#[test]
fn def_declares_a_value_or_a_function() {
    let (unit, _) = analyze("def n: int = 3; def f() -> int { return n; }");
    let decls = unit.decls();
    assert_eq!(decls.len(), 2);
    assert!(matches!(unit.ast.decl(decls[0]).kind, DeclKind::Value { .. }));
    assert!(unit.ast.decl(decls[1]).is_function());
    assert_eq!(
        unit.ast.decl(decls[1]).ty(),
        Some(&Ty::function(Ty::Int, vec![]))
    );
}

#[test]
fn cast_conversions() {
    let (unit, interner) = analyze(
        "def a(x: float) -> int { return x as int; }
         def b(x: bool) -> int { return x as int; }
         def c(x: int) -> float { return x as float; }
         def d(x: int) -> char { return x as char; }
         def e(x: char) -> bool { return x as bool; }",
    );
    let expected = [
        ("a", Conversion::Trunc),
        ("b", Conversion::Int),
        ("c", Conversion::Ext),
        ("d", Conversion::Char),
        ("e", Conversion::Bool),
    ];
    for (name, conv) in expected {
        let e = return_of(&unit, &interner, name);
        let ExprKind::Cast(inner) = e.kind else {
            panic!("{} is not a cast", name);
        };
        let ExprKind::Conv(found, _) = unit.ast.expr(inner).kind else {
            panic!("{} has no conversion", name);
        };
        assert_eq!(found, conv, "{}", name);
    }
}

#[test]
fn identity_cast_only_loads() {
    let (unit, interner) = analyze("def f(x: int) -> int { return x as int; }");
    let e = return_of(&unit, &interner, "f");
    let ExprKind::Cast(inner) = e.kind else {
        panic!();
    };
    let ExprKind::Conv(Conversion::Value, _) = unit.ast.expr(inner).kind else {
        panic!();
    };
}

#[test]
fn pointer_to_bool_cast_is_rejected() {
    assert_eq!(
        semantic_error("def f(p: *int) -> bool { return p as bool; }"),
        SemanticError::InvalidConversion {
            from: Ty::pointer_to(Ty::Int),
            to: Ty::Bool
        }
    );
}

#[test]
fn conditional_unifies_reference_and_value() {
    let (unit, interner) = analyze("def f(b: bool, x: int) -> int { return b ? x : 1; }");
    let e = return_of(&unit, &interner, "f");
    let ExprKind::Cond(_, t, _) = e.kind else {
        panic!();
    };
    assert_eq!(e.ty, Ty::Int);
    let ExprKind::Conv(Conversion::Value, _) = unit.ast.expr(t).kind else {
        panic!();
    };
}

#[test]
fn conditional_of_references_is_assignable() {
    let (unit, interner) = analyze(
        "def f(b: bool) -> int { var x: int = 1; var y: int = 2; (b ? x : y) = 3; return x; }",
    );
    let stmts = function_body(&unit, &interner, "f");
    let Stmt::Expr(e) = unit.ast.stmt(stmts[2]) else {
        panic!();
    };
    let ExprKind::Assign(lhs, _) = unit.ast.expr(*e).kind else {
        panic!();
    };
    let lhs = unit.ast.expr(lhs);
    assert!(matches!(lhs.kind, ExprKind::Cond(..)));
    assert_eq!(lhs.ty, Ty::reference_to(Ty::Int));
}

#[test]
fn conditional_without_common_type() {
    assert_eq!(
        semantic_error("def f(b: bool) -> int { return b ? 1 : true; }"),
        SemanticError::NoCommonType {
            left: Ty::Int,
            right: Ty::Bool
        }
    );
}

#[test]
fn conditional_guard_must_be_boolean() {
    assert_eq!(
        semantic_error("def f() -> int { return 1 ? 2 : 3; }"),
        SemanticError::ExpectedCategory {
            expected: "boolean",
            found: Ty::Int
        }
    );
}

#[test]
fn assignment_needs_a_reference() {
    assert_eq!(
        semantic_error("def f() -> int { 1 = 2; return 0; }"),
        SemanticError::NotAReference { found: Ty::Int }
    );
    assert_eq!(
        semantic_error("let k: int = 1; def f() -> int { k = 2; return k; }"),
        SemanticError::NotAReference { found: Ty::Int }
    );
    assert_eq!(
        semantic_error("var x: int = 0; def f() -> int { x = true; return x; }"),
        SemanticError::TypeMismatch {
            expected: Ty::Int,
            found: Ty::Bool
        }
    );
}

#[test]
fn function_body_shadows_globals() {
    let (unit, interner) = analyze("var x: int = 1; def f() -> bool { var x: bool = true; return x; }");
    let e = return_of(&unit, &interner, "f");
    assert_eq!(e.ty, Ty::Bool);
    let ExprKind::Conv(Conversion::Value, id) = e.kind else {
        panic!();
    };
    let ExprKind::Id(d) = unit.ast.expr(id).kind else {
        panic!();
    };
    assert_ne!(Some(&d), unit.decls().first());
}

#[test]
fn nested_blocks_shadow_outer_blocks() {
    let (unit, interner) =
        analyze("def f() -> int { var x: int = 1; { var x: float = 2.0; } return x; }");
    assert_eq!(return_of(&unit, &interner, "f").ty, Ty::Int);
}

#[test]
fn parameters_share_the_body_scope() {
    assert_eq!(
        semantic_error("def f(x: int) -> int { var x: int = 1; return x; }"),
        SemanticError::Redeclaration {
            name: "x".to_string()
        }
    );
}

#[test]
fn redeclaration_in_the_same_scope() {
    let err = parse_error("var x: int = 1;\nvar x: int = 2;");
    assert_eq!(
        err.to_string(),
        "test.mc:2:5: semantic error: redeclaration of `x`"
    );
    assert_eq!(
        semantic_error("def f(a: int, a: int) -> int { return a; }"),
        SemanticError::Redeclaration {
            name: "a".to_string()
        }
    );
}

#[test]
fn undeclared_names() {
    assert_eq!(
        semantic_error("def f() -> int { return y; }"),
        SemanticError::Undeclared {
            name: "y".to_string()
        }
    );
}

#[test]
fn constant_in_its_own_initializer() {
    assert_eq!(
        semantic_error("let k: int = k + 1;"),
        SemanticError::SelfInitializer {
            name: "k".to_string()
        }
    );
}

#[test]
fn calls_check_arity_and_types() {
    let g = "def g(a: int, b: float) -> int { return a; }\n";
    assert_eq!(
        semantic_error(&format!("{}def f() -> int {{ return g(1); }}", g)),
        SemanticError::TooFewArguments {
            expected: 2,
            found: 1
        }
    );
    assert_eq!(
        semantic_error(&format!("{}def f() -> int {{ return g(1, 2.0, 3); }}", g)),
        SemanticError::TooManyArguments {
            expected: 2,
            found: 3
        }
    );
    assert_eq!(
        semantic_error(&format!("{}def f() -> int {{ return g(1, 2); }}", g)),
        SemanticError::ArgumentMismatch {
            position: 2,
            expected: Ty::Float,
            found: Ty::Int
        }
    );
}

#[test]
fn call_loads_variable_arguments() {
    let (unit, interner) = analyze(
        "def g(a: int) -> int { return a; }
         def f(x: int) -> int { return g(x); }",
    );
    let e = return_of(&unit, &interner, "f");
    let ExprKind::Call(_, ref args) = e.kind else {
        panic!();
    };
    let ExprKind::Conv(Conversion::Value, _) = unit.ast.expr(args[0]).kind else {
        panic!();
    };
}

#[test]
fn calling_a_non_function() {
    assert_eq!(
        semantic_error("var x: int = 0; def f() -> int { return x(1); }"),
        SemanticError::ExpectedCategory {
            expected: "function",
            found: Ty::Int
        }
    );
}

#[test]
fn recursion_sees_the_function_itself() {
    let (unit, interner) = analyze(
        "def fact(n: int) -> int { if (n <= 1) return 1; else return n * fact(n - 1); }",
    );
    let stmts = function_body(&unit, &interner, "fact");
    let Stmt::If(_, _, _) = unit.ast.stmt(stmts[0]) else {
        panic!();
    };
}

#[test]
fn function_typed_parameters() {
    let (unit, interner) = analyze(
        "def apply(f: (int) -> int, x: int) -> int { return f(x); }
         def inc(x: int) -> int { return x + 1; }
         def main() -> int { return apply(inc, 41); }",
    );
    let e = return_of(&unit, &interner, "main");
    assert!(matches!(e.kind, ExprKind::Call(..)));
    assert_eq!(e.ty, Ty::Int);
}

#[test]
fn statement_and_return_types() {
    assert_eq!(
        semantic_error("def f() -> int { when (1) return 0; return 1; }"),
        SemanticError::ExpectedCategory {
            expected: "boolean",
            found: Ty::Int
        }
    );
    assert_eq!(
        semantic_error("def f() -> int { return true; }"),
        SemanticError::TypeMismatch {
            expected: Ty::Int,
            found: Ty::Bool
        }
    );
    assert_eq!(
        semantic_error("var x: float = 1;"),
        SemanticError::TypeMismatch {
            expected: Ty::Float,
            found: Ty::Int
        }
    );
}

#[test]
fn operator_operand_categories() {
    assert_eq!(
        semantic_error("def f() -> float { return 1.0 << 2; }"),
        SemanticError::ExpectedCategory {
            expected: "integer",
            found: Ty::Float
        }
    );
    assert_eq!(
        semantic_error("def f() -> int { return 1 + 2.0; }"),
        SemanticError::TypeMismatch {
            expected: Ty::Int,
            found: Ty::Float
        }
    );
    assert_eq!(
        semantic_error("def f() -> bool { return true < false; }"),
        SemanticError::ExpectedCategory {
            expected: "numeric",
            found: Ty::Bool
        }
    );
}

#[test]
fn unary_minus_subtracts_from_zero() {
    let (unit, interner) = analyze("def f(x: float) -> float { return -x; }");
    let e = return_of(&unit, &interner, "f");
    let ExprKind::Binary(BinaryOp::Sub, zero, _) = e.kind else {
        panic!();
    };
    assert_eq!(unit.ast.expr(zero).kind, ExprKind::Float(0.0));
    assert_eq!(e.ty, Ty::Float);
}

#[test]
fn literal_ranges() {
    assert_eq!(
        semantic_error("def f() -> int { return 3000000000; }"),
        SemanticError::IntegerOutOfRange(3000000000)
    );
    assert_eq!(
        semantic_error("def f() -> char { return 'é'; }"),
        SemanticError::CharOutOfRange('é')
    );
}

#[test]
fn unsupported_expressions() {
    assert_eq!(
        semantic_error("def f() -> int { return \"s\"; }"),
        SemanticError::Unsupported("string literals")
    );
    assert_eq!(
        semantic_error("var x: int = 0; def f() -> int { return &x; }"),
        SemanticError::Unsupported("pointer operations")
    );
    assert_eq!(
        semantic_error("var x: int = 0; def f() -> int { return x[0]; }"),
        SemanticError::Unsupported("index expressions")
    );
}

#[test]
fn syntax_errors() {
    let CompileError::Syntax {
        expected, found, ..
    } = parse_error("def x int")
    else {
        panic!();
    };
    assert_eq!((expected.as_str(), found.as_str()), ("`:` or `(`", "`int`"));

    let CompileError::Syntax {
        expected, found, ..
    } = parse_error("def f() -> int { if (true) return 1; }")
    else {
        panic!();
    };
    assert_eq!((expected.as_str(), found.as_str()), ("`else`", "`}`"));

    let CompileError::Syntax { expected, .. } =
        parse_error("def f() -> int { def g() -> int { return 1; } return 0; }")
    else {
        panic!();
    };
    assert_eq!(expected, "`:`");
}

#[test]
fn type_display() {
    let f = Ty::function(Ty::Int, vec![Ty::Int, Ty::pointer_to(Ty::Char)]);
    assert_eq!(f.to_string(), "(int, *char) -> int");
    assert_eq!(Ty::reference_to(Ty::Float).to_string(), "&float");
    assert_eq!(
        Ty::reference_to(Ty::reference_to(Ty::Int)),
        Ty::reference_to(Ty::Int)
    );
    assert!(!Ty::reference_to(Ty::Int).is_object());
    assert!(Ty::pointer_to(Ty::Int).is_scalar());
}

#[test]
fn redeclaration_inside_a_block() {
    assert_eq!(
        semantic_error("def main() -> int { let x: int = 0; let x: int = 0; return x; }"),
        SemanticError::Redeclaration {
            name: "x".to_string()
        }
    );
}

#[test]
fn global_constants_must_be_constant() {
    assert_eq!(
        semantic_error("var g: int = 0; let c: int = g; def main() -> int { g = 5; return c; }"),
        SemanticError::NonConstantInitializer {
            name: "c".to_string()
        }
    );
    assert_eq!(
        semantic_error(
            "def bump() -> int { return 1; }
             def v: int = bump();
             def main() -> int { return v + v; }"
        ),
        SemanticError::NonConstantInitializer {
            name: "v".to_string()
        }
    );
}

#[test]
fn constant_expressions_and_local_constants() {
    let (unit, interner) = analyze(
        "let a: int = 2;
         def b: float = (a * 3 + 1) as float;
         var g: int = 0;
         def main() -> int { let c: int = g; return c; }",
    );
    assert_eq!(unit.decls().len(), 4);
    let ExprKind::Id(_) = return_of(&unit, &interner, "main").kind else {
        panic!();
    };
}

#[test]
fn comparisons_need_matching_types() {
    assert_eq!(
        semantic_error("def f() -> bool { return 1 == 1.0; }"),
        SemanticError::TypeMismatch {
            expected: Ty::Int,
            found: Ty::Float
        }
    );
}

#[test]
fn negated_literals_fold() {
    let (unit, interner) = analyze("def f() -> int { return -2147483648; }");
    let e = return_of(&unit, &interner, "f");
    assert_eq!(e.kind, ExprKind::Int(i32::MIN));
    assert_eq!(
        semantic_error("def f() -> int { return -2147483649; }"),
        SemanticError::IntegerOutOfRange(-2147483649)
    );
    let (unit, interner) = analyze("def f() -> int { return - 5 - 3; }");
    let ExprKind::Binary(BinaryOp::Sub, l, _) = return_of(&unit, &interner, "f").kind else {
        panic!();
    };
    assert_eq!(unit.ast.expr(l).kind, ExprKind::Int(-5));
}
