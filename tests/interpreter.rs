use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};

use thistle::{
    diagnostics::{Diagnostic, DiagnosticKind, ThistleError},
    parser,
    runtime::Interpreter,
    value::{Value, ValueKind},
};

/// Collects everything the interpreter prints, so tests can assert on the
/// output channel as well as the result value.
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl SharedSink {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output should be UTF-8")
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run(source: &str) -> (Result<Value, ThistleError>, String) {
    let sink = SharedSink::default();
    let mut interpreter = Interpreter::with_output(Box::new(sink.clone()));
    let result = interpreter.eval_source(source);
    (result, sink.contents())
}

fn eval(source: &str) -> Value {
    let (result, _) = run(source);
    result.expect("evaluation should succeed")
}

fn eval_output(source: &str) -> String {
    let (result, output) = run(source);
    result.expect("evaluation should succeed");
    output
}

fn eval_error(source: &str) -> Diagnostic {
    let (result, _) = run(source);
    match result {
        Ok(value) => panic!("expected error, received value {value}"),
        Err(ThistleError::Diagnostic(diag)) => diag,
        Err(other) => panic!("expected diagnostic, received {other}"),
    }
}

fn expect_int(value: &Value) -> i64 {
    match value.0.as_ref() {
        ValueKind::Int(n) => *n,
        _ => panic!("expected Int, found {}", value.type_name()),
    }
}

fn expect_bool(value: &Value) -> bool {
    match value.0.as_ref() {
        ValueKind::Bool(b) => *b,
        _ => panic!("expected Bool, found {}", value.type_name()),
    }
}

#[test]
fn evaluates_integer_arithmetic() {
    assert_eq!(expect_int(&eval("(+ 1 2 3)")), 6);
    assert_eq!(expect_int(&eval("(- 10 4)")), 6);
    assert_eq!(expect_int(&eval("(* 2 3 4)")), 24);
}

#[test]
fn division_and_modulo_floor_toward_negative_infinity() {
    assert_eq!(expect_int(&eval("(/ -7 2)")), -4);
    assert_eq!(expect_int(&eval("(/ 7 2)")), 3);
    assert_eq!(expect_int(&eval("(mod -7 3)")), 2);
    assert_eq!(expect_int(&eval("(mod 7 -3)")), -2);
}

#[test]
fn define_is_visible_across_forms() {
    let value = eval("(define x 5) (+ x 1)");
    assert_eq!(expect_int(&value), 6);
}

#[test]
fn immediate_lambda_application() {
    let value = eval("((fun (x) (+ x 1)) 5)");
    assert_eq!(expect_int(&value), 6);
}

#[test]
fn closure_sees_later_definitions_in_captured_frame() {
    let value = eval(
        r#"
        (define f (fun () x))
        (define x 42)
        (f)
        "#,
    );
    assert_eq!(expect_int(&value), 42);
}

#[test]
fn closures_resolve_lexically_not_dynamically() {
    let value = eval(
        r#"
        (define x 1)
        (define f (fun () x))
        (define g (fun (x) (f)))
        (g 99)
        "#,
    );
    assert_eq!(expect_int(&value), 1);
}

#[test]
fn define_in_function_body_stays_local() {
    let call_result = eval(
        r#"
        (define x 1)
        (define f (fun () (define x 99) x))
        (f)
        "#,
    );
    assert_eq!(expect_int(&call_result), 99);

    let global_after_call = eval(
        r#"
        (define x 1)
        (define f (fun () (define x 99) x))
        (f)
        x
        "#,
    );
    assert_eq!(expect_int(&global_after_call), 1);
}

#[test]
fn recursive_function_evaluates() {
    let value = eval(
        r#"
        (define fib
          (fun (n)
            (if (< n 2)
                n
                (+ (fib (- n 1)) (fib (- n 2))))))
        (fib 10)
        "#,
    );
    assert_eq!(expect_int(&value), 55);
}

#[test]
fn untaken_branch_is_never_evaluated() {
    let (result, output) = run("(if #t 1 (print-num 999))");
    assert_eq!(expect_int(&result.expect("if should succeed")), 1);
    assert!(output.is_empty(), "untaken branch printed: {output}");

    let (result, output) = run("(if #f (print-num 999) 2)");
    assert_eq!(expect_int(&result.expect("if should succeed")), 2);
    assert!(output.is_empty(), "untaken branch printed: {output}");
}

#[test]
fn if_requires_boolean_condition() {
    let diag = eval_error("(if 1 2 3)");
    assert_eq!(diag.kind, DiagnosticKind::Type);
    assert!(
        diag.message.contains("if test-exp didn't return bool"),
        "{}",
        diag.message
    );
}

#[test]
fn boolean_operators_reject_integers() {
    let diag = eval_error("(and #t 1)");
    assert_eq!(diag.kind, DiagnosticKind::Type);
    assert!(diag.message.contains("Bool"), "{}", diag.message);
}

#[test]
fn arithmetic_operators_reject_booleans() {
    let diag = eval_error("(+ 1 #t)");
    assert_eq!(diag.kind, DiagnosticKind::Type);
    assert!(diag.message.contains("Int"), "{}", diag.message);
}

#[test]
fn operator_arguments_are_evaluated_before_the_call() {
    // `and` is not short-circuiting: the second argument is evaluated (and
    // prints) before the operator ever sees it, and the print is not rolled
    // back when the call then fails on the Unit operand.
    let (result, output) = run("(and #f (print-num 1))");
    assert!(result.is_err(), "Unit operand should be rejected");
    assert_eq!(output, "1\n");
}

#[test]
fn equality_compares_all_operands_to_the_first() {
    assert!(expect_bool(&eval("(= 3 3 3)")));
    assert!(!expect_bool(&eval("(= 3 3 4)")));
    assert!(expect_bool(&eval("(= 1 1)")));
}

#[test]
fn strict_comparisons() {
    assert!(expect_bool(&eval("(> 3 2)")));
    assert!(!expect_bool(&eval("(< 3 2)")));
    assert!(!expect_bool(&eval("(> 2 2)")));
}

#[test]
fn booleans_resolve_via_environment() {
    assert!(expect_bool(&eval("#t")));
    assert!(!expect_bool(&eval("#f")));
    assert!(!expect_bool(&eval("(not #t)")));
}

#[test]
fn prints_follow_evaluation_order() {
    let output = eval_output("(print-num 1) (print-bool #f) (print-num 2)");
    assert_eq!(output, "1\n#f\n2\n");
}

#[test]
fn closure_body_runs_in_order_and_returns_last_value() {
    let (result, output) = run("((fun () (print-num 1) 5))");
    assert_eq!(expect_int(&result.expect("call should succeed")), 5);
    assert_eq!(output, "1\n");
}

#[test]
fn primitive_arity_violations() {
    for source in ["(+ 1)", "(- 1)", "(not #t #f)", "(print-num 1 2)"] {
        let diag = eval_error(source);
        assert_eq!(diag.kind, DiagnosticKind::Arity, "{source}");
    }
}

#[test]
fn closure_arity_mismatch_is_rejected() {
    let diag = eval_error("((fun (x y) x) 1)");
    assert_eq!(diag.kind, DiagnosticKind::Arity);

    let diag = eval_error("((fun (x) x) 1 2)");
    assert_eq!(diag.kind, DiagnosticKind::Arity);
}

#[test]
fn unbound_symbol_reports_name_error() {
    let diag = eval_error("y");
    assert_eq!(diag.kind, DiagnosticKind::Name);
    assert!(diag.message.contains("y"), "{}", diag.message);
}

#[test]
fn unterminated_list_reports_parse_error() {
    let diag = eval_error("(+ 1 2");
    assert_eq!(diag.kind, DiagnosticKind::Parse);
    assert!(
        diag.message.contains("unexpected end of input"),
        "{}",
        diag.message
    );
}

#[test]
fn division_by_zero_is_an_error() {
    assert_eq!(eval_error("(/ 1 0)").kind, DiagnosticKind::Type);
    assert_eq!(eval_error("(mod 1 0)").kind, DiagnosticKind::Type);
}

#[test]
fn non_callable_values_are_rejected() {
    let diag = eval_error("(1 2)");
    assert_eq!(diag.kind, DiagnosticKind::Type);
    assert!(diag.message.contains("not callable"), "{}", diag.message);

    let diag = eval_error("(())");
    assert_eq!(diag.kind, DiagnosticKind::Type);
}

#[test]
fn empty_buffer_evaluates_to_unit() {
    let value = eval("");
    assert!(matches!(value.0.as_ref(), ValueKind::Unit));
}

#[test]
fn parse_then_reserialize_round_trips() {
    let source = "(define square (fun (x) (* x x))) (print-num (square -12)) #t";
    let forms = parser::parse_program(source).expect("parse should succeed");
    let rendered = forms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    let reparsed = parser::parse_program(&rendered).expect("reparse should succeed");
    let rerendered = reparsed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(rendered, rerendered);
}

#[test]
fn demo_scripts_produce_expected_output() {
    for (script, expected) in [
        ("demos/factorial.lsp", "3628800\n"),
        ("demos/closures.lsp", "7\n15\n"),
        ("demos/booleans.lsp", "#f\n#t\n#t\n-4\n2\n"),
    ] {
        let source = std::fs::read_to_string(script)
            .unwrap_or_else(|err| panic!("failed to read {script}: {err}"));
        assert_eq!(eval_output(&source), expected, "{script}");
    }
}
