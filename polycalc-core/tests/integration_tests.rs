// Integration tests for whole programs
// These tests drive the public API only: build the standard engine, compile
// source text in each notation and run it on a calculator

use std::sync::Arc;

use polycalc_core::{
    standard_engine, Calculator, CompileError, Engine, Error, Notation, RuntimeError, State, TypeTag,
};
use pretty_assertions::assert_eq;

fn engine() -> Arc<Engine> {
    Arc::new(standard_engine().expect("standard engine"))
}

fn eval(source: &str, notation: Notation) -> Result<String, Error> {
    let mut calc = Calculator::new(engine());
    calc.evaluate(source, notation).map(|value| value.to_string())
}

fn infix(source: &str) -> String {
    eval(source, Notation::Infix).unwrap_or_else(|err| panic!("'{}' failed: {}", source, err))
}

#[test]
fn test_same_result_in_every_notation() {
    // RUST CONCEPT: One program, three spellings
    // All front-ends produce the same linear steps, so results must agree
    let cases = [
        ("1 + 2 * 3", "+ 1 * 2 3", "1 2 3 * +"),
        ("(1 + 2) * 3", "* (+ 1 2) 3", "1 2 + 3 *"),
        ("max(1, 5, 3) - 2", "- max(1 5 3) 2", "1 5 3 max@3 2 -"),
        ("1 : 2 : null", "(: 1 2 null)", "1 2 null : :"),
        ("2 ** 3 ** 2", "** ** 2 3 2", "2 3 ** 2 **"),
    ];
    for (infix_src, prefix_src, postfix_src) in cases {
        let expected = eval(infix_src, Notation::Infix).unwrap();
        assert_eq!(eval(prefix_src, Notation::Prefix).unwrap(), expected, "{}", prefix_src);
        assert_eq!(eval(postfix_src, Notation::Postfix).unwrap(), expected, "{}", postfix_src);
    }
}

#[test]
fn test_compiled_forms_agree() {
    let engine = engine();
    let from_infix = engine.compile("2 ** 3 + sqrt(16)", Notation::Infix).unwrap();
    let from_prefix = engine.compile("+ ** 2 3 sqrt(16)", Notation::Prefix).unwrap();
    assert_eq!(from_infix.to_string(), "2 3 ** 16 sqrt +");
    assert_eq!(from_prefix.to_string(), from_infix.to_string());

    let chained = engine.compile("2 ** 3 ** 2", Notation::Infix).unwrap();
    assert_eq!(chained.to_string(), "2 3 ** 2 **");
}

#[test]
fn test_booleans_in_arithmetic() {
    assert_eq!(infix("true + true"), "2");
    assert_eq!(infix("false * true"), "0");
    assert_eq!(infix("true / 2"), "0.5");
}

#[test]
fn test_string_operators() {
    assert_eq!(infix("\"ab\" * 3"), "\"ababab\"");
    assert_eq!(infix("\"ab\" + \"cd\""), "\"abcd\"");
    match eval("\"ab\" * 1.5", Notation::Infix) {
        Err(Error::Runtime(RuntimeError::Dispatch { operator, left, right })) => {
            assert_eq!(operator, "*");
            assert_eq!((left, right), (TypeTag::Str, TypeTag::Float));
        }
        other => panic!("expected dispatch error, got {:?}", other),
    }
}

#[test]
fn test_coercion_matches_explicit_conversion() {
    assert_eq!(infix("1 + 2.5"), infix("float(1) + 2.5"));
    assert_eq!(infix("1 + 2.5"), "3.5");
    assert_eq!(infix("true + 1.5"), "2.5");
    assert_eq!(infix("2 * I"), infix("complex(2, 0) * I"));
}

#[test]
fn test_symbols_and_quotes() {
    assert_eq!(infix("'foo"), "'foo");
    assert_eq!(eval("'+", Notation::Postfix).unwrap(), "'+");
    assert_eq!(infix("issymbol('foo)"), "true");
    assert_eq!(infix("quote(1 foo \"s\")"), "[1 'foo \"s\"]");
}

#[test]
fn test_lists() {
    assert_eq!(infix("len(1 : 2 : null)"), "2");
    assert_eq!(infix("car(1 : 2 : null)"), "1");
    assert_eq!(infix("cdr(cdr(1 : 2 : null))"), "null");
    assert_eq!(infix("list(1, 2, 3) == 1 : 2 : 3 : null"), "true");
}

#[test]
fn test_comparisons() {
    assert_eq!(infix("1 < 2 && 2 < 3"), "true");
    assert_eq!(infix("\"a\" <=> \"b\""), "-1");
    assert_eq!(infix("3 <=> 3"), "0");
    assert_eq!(infix("1 == 1.0"), "false");
    assert_eq!(infix("1 <= 1.0"), "true");
}

#[test]
fn test_records() {
    assert_eq!(infix("record(\"x\", 3, \"y\", 4).x * 2"), "6");
    assert_eq!(infix("isobject(record())"), "true");
}

#[test]
fn test_mode_switching() {
    assert_eq!(eval("1 infix(2 * 3) +", Notation::Postfix).unwrap(), "7");
    assert_eq!(infix("1 + prefix(* 2 3)"), "7");
    assert_eq!(eval("2 prefix(+ 3 4) *", Notation::Postfix).unwrap(), "14");
    assert_eq!(eval("(* 2 infix(3 + 4))", Notation::Prefix).unwrap(), "14");
}

#[test]
fn test_executable_is_reusable() {
    let mut calc = Calculator::new(engine());
    let program = calc.compile("2 ** 10", Notation::Infix).unwrap();
    let first = calc.execute_and_pop(&program).unwrap();
    let second = calc.execute_and_pop(&program).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), "1024");
    assert_eq!(calc.stack_size(), 0);
}

#[test]
fn test_execute_leaves_values_on_stack() {
    let mut calc = Calculator::new(engine());
    let program = calc.compile("1 2 3", Notation::Postfix).unwrap();
    calc.execute(&program).unwrap();
    assert_eq!(calc.stack_size(), 3);
    assert_eq!(calc.peek_stack().map(|v| v.to_string()), Some("3".to_string()));
}

#[test]
fn test_compile_errors() {
    assert!(matches!(eval("0xGG", Notation::Infix), Err(Error::Compile(CompileError::InvalidLiteral { .. }))));
    assert!(matches!(eval("(", Notation::Infix), Err(Error::Compile(_))));
    assert!(matches!(eval("1 @ 2", Notation::Infix), Err(Error::Compile(CompileError::Tokenize { .. }))));
    assert!(matches!(eval("nosuch(1)", Notation::Infix), Err(Error::Compile(CompileError::UnknownSymbol(_)))));
    assert!(matches!(eval("2PI", Notation::Infix), Err(Error::Compile(CompileError::InvalidLiteral { .. }))));
    assert_eq!(infix("2 PI"), infix("2 * PI"));
}

#[test]
fn test_stack_validation() {
    let mut calc = Calculator::new(engine());
    let program = calc.compile("1 2 list@2,2", Notation::Postfix).unwrap();
    let err = calc.execute(&program).unwrap_err();
    assert!(matches!(err.root_cause(), RuntimeError::StackValidation(_)));
    // Nothing was consumed by the rejected call
    assert_eq!(calc.stack_size(), 2);
}

#[test]
fn test_fault_and_reset() {
    let mut calc = Calculator::new(engine());
    let bad = calc.compile("1 \"a\" -", Notation::Postfix).unwrap();
    assert!(calc.execute(&bad).is_err());
    assert_eq!(calc.state(), State::Faulted);
    assert_eq!(calc.stack_size(), 2);

    let good = calc.compile("1 + 1", Notation::Infix).unwrap();
    assert!(matches!(calc.execute(&good), Err(RuntimeError::Faulted)));

    calc.reset();
    assert_eq!(calc.state(), State::Idle);
    assert_eq!(calc.execute_and_pop(&good).unwrap().to_string(), "2");
}

#[test]
fn test_engine_shared_between_calculators() {
    let engine = engine();
    let program = engine.compile("sum(1, 2, 3)", Notation::Infix).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let program = program.clone();
            std::thread::spawn(move || {
                let mut calc = Calculator::new(engine);
                calc.execute_and_pop(&program).map(|v| v.to_string()).ok()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some("6".to_string()));
    }
}

#[test]
fn test_docs_available() {
    let engine = engine();
    let doc = engine.environment().doc("sqrt").unwrap_or_default();
    assert!(doc.contains("Square root"));
    assert!(engine.environment().names().any(|name| name == "PI"));
}
