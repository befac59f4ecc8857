use lotus::{
    diagnostics::{DiagnosticKind, LotusError},
    printer, reader,
    runtime::Interpreter,
    value::{Value, ValueKind},
};
use std::fs;
use tempfile::tempdir;

fn rep(source: &str) -> String {
    let mut interpreter = Interpreter::new();
    interpreter
        .rep(source)
        .expect("evaluation should succeed")
}

fn eval(source: &str) -> Value {
    let mut interpreter = Interpreter::new();
    interpreter
        .eval_source(source)
        .expect("evaluation should succeed")
}

fn eval_error(source: &str) -> LotusError {
    let mut interpreter = Interpreter::new();
    match interpreter.eval_source(source) {
        Ok(value) => panic!("expected error, received value {value:?}"),
        Err(err) => err,
    }
}

fn expect_number(value: &Value) -> f64 {
    match &*value.0 {
        ValueKind::Number(n) => *n,
        _ => panic!("expected Number, found {}", value.type_name()),
    }
}

fn expect_kind(err: LotusError, kind: DiagnosticKind) {
    assert_eq!(err.kind(), Some(kind), "unexpected error: {err}");
}

#[test]
fn evaluates_nested_arithmetic() {
    let value = eval("(+ 1 (* 2 3))");
    assert_eq!(expect_number(&value), 7.0);
}

#[test]
fn division_floors_its_result() {
    assert_eq!(expect_number(&eval("(/ 7 2)")), 3.0);
    assert_eq!(expect_number(&eval("(/ -7 2)")), -4.0);
    assert_eq!(expect_number(&eval("(* 0.5 3)")), 1.5);
}

#[test]
fn def_binds_in_the_global_environment() {
    let mut interpreter = Interpreter::new();
    assert_eq!(interpreter.rep("(def! x 5)").unwrap(), "5");
    assert_eq!(interpreter.rep("x").unwrap(), "5");
}

#[test]
fn let_bindings_shadow_and_unwind() {
    assert_eq!(rep("(let* (x 1) (let* (x 2) x))"), "2");

    let mut interpreter = Interpreter::new();
    interpreter.rep("(def! x 5)").unwrap();
    assert_eq!(interpreter.rep("(let* (x 2) x)").unwrap(), "2");
    assert_eq!(interpreter.rep("x").unwrap(), "5");
}

#[test]
fn let_bindings_see_earlier_bindings() {
    assert_eq!(rep("(let* (a 2 b (* a 3)) (+ a b))"), "8");
}

#[test]
fn let_accepts_vector_bindings() {
    assert_eq!(rep("(let* [x 4] x)"), "4");
}

#[test]
fn do_sequences_and_defaults_to_nil() {
    assert_eq!(rep("(do 1 2 3)"), "3");
    assert_eq!(rep("(do)"), "nil");
    assert_eq!(rep("(do (def! y 1) (+ y 1))"), "2");
}

#[test]
fn if_treats_only_nil_and_false_as_falsey() {
    assert_eq!(rep("(if 0 \"yes\" \"no\")"), "\"yes\"");
    assert_eq!(rep("(if \"\" 1 2)"), "1");
    assert_eq!(rep("(if nil 1 2)"), "2");
    assert_eq!(rep("(if false 1 2)"), "2");
    assert_eq!(rep("(if false 1)"), "nil");
}

#[test]
fn closures_capture_their_environment() {
    assert_eq!(rep("(((fn* (a) (fn* (b) (+ a b))) 5) 7)"), "12");
}

#[test]
fn variadic_parameters_collect_remaining_arguments() {
    assert_eq!(rep("((fn* (a & more) more) 1 2 3)"), "(2 3)");
    assert_eq!(rep("((fn* (a & more) more) 1)"), "()");
    assert_eq!(rep("((fn* (& more) (count more)) 1 2 3)"), "3");
}

#[test]
fn tail_recursion_does_not_grow_the_stack() {
    let mut interpreter = Interpreter::new();
    interpreter
        .rep("(def! countdown (fn* (n) (if (> n 0) (countdown (- n 1)) \"done\")))")
        .unwrap();
    assert_eq!(interpreter.rep("(countdown 10000)").unwrap(), "\"done\"");
}

#[test]
fn mutual_tail_recursion_does_not_grow_the_stack() {
    let mut interpreter = Interpreter::new();
    interpreter
        .rep("(def! even? (fn* (n) (if (= n 0) true (odd? (- n 1)))))")
        .unwrap();
    interpreter
        .rep("(def! odd? (fn* (n) (if (= n 0) false (even? (- n 1)))))")
        .unwrap();
    assert_eq!(interpreter.rep("(even? 10000)").unwrap(), "true");
}

#[test]
fn atoms_share_one_mutable_cell() {
    let mut interpreter = Interpreter::new();
    interpreter.rep("(def! a (atom 1))").unwrap();
    assert_eq!(interpreter.rep("(reset! a 2)").unwrap(), "2");
    assert_eq!(interpreter.rep("(deref a)").unwrap(), "2");
    assert_eq!(interpreter.rep("(swap! a (fn* (x) (* x 2)))").unwrap(), "4");
    assert_eq!(interpreter.rep("@a").unwrap(), "4");
    // Sharing is by identity, not by name.
    interpreter.rep("(def! b a)").unwrap();
    interpreter.rep("(reset! b 9)").unwrap();
    assert_eq!(interpreter.rep("@a").unwrap(), "9");
}

#[test]
fn swap_forwards_extra_arguments() {
    let mut interpreter = Interpreter::new();
    interpreter.rep("(def! a (atom 10))").unwrap();
    assert_eq!(
        interpreter.rep("(swap! a (fn* (x y z) (+ x (+ y z))) 3 4)").unwrap(),
        "17"
    );
}

#[test]
fn equality_is_deep_and_sequence_kind_blind() {
    assert_eq!(rep("(= (list 1 2 3) [1 2 3])"), "true");
    assert_eq!(rep("(= (list 1 2) (list 1 2 3))"), "false");
    assert_eq!(rep("(= \"1\" 1)"), "false");
    assert_eq!(rep("(= {\"k\" [1 2]} {\"k\" (list 1 2)})"), "true");
}

#[test]
fn atoms_compare_by_identity() {
    let mut interpreter = Interpreter::new();
    interpreter.rep("(def! a (atom 1))").unwrap();
    assert_eq!(interpreter.rep("(= a a)").unwrap(), "true");
    assert_eq!(interpreter.rep("(= a (atom 1))").unwrap(), "false");
}

#[test]
fn quote_suppresses_evaluation() {
    assert_eq!(rep("(quote (+ 1 2))"), "(+ 1 2)");
    assert_eq!(rep("'(1 2 3)"), "(1 2 3)");
    assert_eq!(rep("'sym"), "sym");
}

#[test]
fn quasiquote_splices_and_unquotes() {
    assert_eq!(rep("`(1 2 3)"), "(1 2 3)");
    assert_eq!(rep("`(1 ~(+ 1 1) 3)"), "(1 2 3)");
    assert_eq!(rep("`(1 ~@(list 2 3) 4)"), "(1 2 3 4)");
    assert_eq!(rep("`[1 ~(+ 1 1)]"), "[1 2]");
}

#[test]
fn vectors_and_hashmaps_evaluate_their_contents() {
    assert_eq!(rep("[1 (+ 1 1) 3]"), "[1 2 3]");
    assert_eq!(rep("{\"k\" (+ 1 2)}"), "{\"k\" 3}");
}

#[test]
fn sequence_introspection_builtins() {
    assert_eq!(rep("(list? (list 1 2))"), "true");
    assert_eq!(rep("(list? [1 2])"), "false");
    assert_eq!(rep("(empty? ())"), "true");
    assert_eq!(rep("(empty? [1])"), "false");
    assert_eq!(rep("(count (list 1 2 3))"), "3");
    assert_eq!(rep("(count [1 2])"), "2");
    assert_eq!(rep("(count nil)"), "0");
}

#[test]
fn printing_builtins_differ_in_escaping() {
    assert_eq!(rep("(pr-str \"a\\nb\")"), "\"\\\"a\\\\nb\\\"\"");
    assert_eq!(rep("(str \"a\" 1 (list 2))"), "\"a1(2)\"");
    assert_eq!(rep("(str)"), "\"\"");
}

#[test]
fn prelude_defines_not() {
    assert_eq!(rep("(not nil)"), "true");
    assert_eq!(rep("(not 1)"), "false");
}

#[test]
fn read_string_and_eval_round_trip() {
    assert_eq!(rep("(eval (read-string \"(+ 1 2)\"))"), "3");
}

#[test]
fn printed_literals_read_back_equal() {
    let sources = [
        "nil",
        "true",
        "42",
        "-3.5",
        "\"line\\nbreak \\\\ \\\"quoted\\\"\"",
        "a-symbol",
        "(1 \"two\" [3 4] {\"k\" 5} true nil)",
    ];
    for source in sources {
        let value = reader::read_str(source).expect("source should read");
        let printed = printer::pr_str(&value, true);
        let reread = reader::read_str(&printed).expect("printed form should read");
        assert!(
            value.deep_eq(&reread),
            "round trip changed `{source}`: printed as `{printed}`"
        );
    }
}

#[test]
fn symbols_spelling_numbers_read_as_numbers() {
    assert_eq!(rep("(+ +1 2)"), "3");
    assert_eq!(rep("-7"), "-7");
}

#[test]
fn comments_and_commas_are_ignored() {
    assert_eq!(rep("(+ 1, 2) ; trailing comment"), "3");
}

#[test]
fn unknown_symbol_is_reported_and_survivable() {
    let mut interpreter = Interpreter::new();
    let err = interpreter.eval_source("(foo)").unwrap_err();
    expect_kind(err, DiagnosticKind::UnknownSymbol);
    // The failed form must not poison the global environment.
    assert_eq!(interpreter.rep("(+ 1 2)").unwrap(), "3");
}

#[test]
fn calling_a_non_function_fails() {
    expect_kind(eval_error("(1 2 3)"), DiagnosticKind::NotCallable);
    expect_kind(eval_error("(\"abc\")"), DiagnosticKind::NotCallable);
    expect_kind(eval_error("([1 2] 0)"), DiagnosticKind::NotCallable);
}

#[test]
fn malformed_let_bindings_fail() {
    expect_kind(eval_error("(let* (x) x)"), DiagnosticKind::MalformedBindings);
    expect_kind(eval_error("(let* 1 x)"), DiagnosticKind::MalformedBindings);
}

#[test]
fn builtin_argument_errors() {
    expect_kind(eval_error("(+ 1 \"a\")"), DiagnosticKind::WrongArgumentType);
    expect_kind(eval_error("(+ 1)"), DiagnosticKind::WrongArgumentCount);
    expect_kind(eval_error("(deref 1)"), DiagnosticKind::WrongArgumentType);
    expect_kind(
        eval_error("((fn* (a b) a) 1)"),
        DiagnosticKind::WrongArgumentCount,
    );
}

#[test]
fn reader_errors() {
    expect_kind(eval_error("(1 2"), DiagnosticKind::UnbalancedDelimiter);
    expect_kind(eval_error(")"), DiagnosticKind::UnbalancedDelimiter);
    expect_kind(eval_error("\"abc"), DiagnosticKind::UnterminatedString);
    expect_kind(eval_error("{\"k\"}"), DiagnosticKind::MalformedHashMap);
    expect_kind(eval_error("\u{1}"), DiagnosticKind::LexError);
}

#[test]
fn argv_is_visible_to_programs() {
    let mut interpreter = Interpreter::with_args(vec!["a".into(), "b".into()]);
    assert_eq!(interpreter.rep("*ARGV*").unwrap(), "(\"a\" \"b\")");
    let mut bare = Interpreter::new();
    assert_eq!(bare.rep("*ARGV*").unwrap(), "()");
}

#[test]
fn load_file_evaluates_a_script_as_one_do_form() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("script.lisp");
    fs::write(&path, "(def! answer 42)\n(+ answer 0)\n").expect("write script");

    let mut interpreter = Interpreter::new();
    let literal = format!("\"{}\"", path.display().to_string().replace('\\', "\\\\"));
    assert_eq!(interpreter.rep(&format!("(load-file {literal})")).unwrap(), "nil");
    assert_eq!(interpreter.rep("answer").unwrap(), "42");
}

#[test]
fn slurp_reads_whole_files() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("data.txt");
    fs::write(&path, "hello").expect("write data");

    let mut interpreter = Interpreter::new();
    let literal = format!("\"{}\"", path.display().to_string().replace('\\', "\\\\"));
    assert_eq!(
        interpreter.rep(&format!("(slurp {literal})")).unwrap(),
        "\"hello\""
    );
}

#[test]
fn with_meta_reader_macro_is_accepted() {
    assert_eq!(rep("^{\"doc\" 1} (fn* (a) a)"), "#<function>");
    assert_eq!(rep("(meta [1 2])"), "nil");
}
