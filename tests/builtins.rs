mod common;

use common::{eval_print, lines, run_ember, run_ember_err, run_with_input};
use ember::ErrorKind;

#[test]
fn test_print_formats() {
    let source = r#"
print()
print(1, 2.5, "three", true, nil)
print([1, "a", [nil, false]])
print(-0)
"#;
    assert_eq!(
        run_ember(source),
        lines(&["", "1 2.5 three true nil", "[1, a, [nil, false]]", "0"])
    );
}

#[test]
fn test_len() {
    assert_eq!(eval_print("len(\"hello\")"), "5");
    assert_eq!(eval_print("len(\"\")"), "0");
    assert_eq!(eval_print("len([1, 2, 3])"), "3");

    let error = run_ember_err("len(nil)");
    assert_eq!(error.kind, ErrorKind::Runtime);
    assert_eq!(error.message, "len() expects a string or list, got nil");
}

#[test]
fn test_append_and_aliasing() {
    let source = r#"
let a = [1, 2]
let b = a
append(b, 3)
print(a)
print(len(a))
fn grow(list) do
    append(list, "x")
end
grow(a)
print(b)
let nested = [a]
append(nested[0], 4)
print(a)
"#;
    assert_eq!(
        run_ember(source),
        lines(&["[1, 2, 3]", "3", "[1, 2, 3, x]", "[1, 2, 3, x, 4]"])
    );
}

#[test]
fn test_append_requires_list() {
    let error = run_ember_err("append(\"abc\", 1)");
    assert_eq!(error.message, "append() expects a list as first argument, got string");
}

#[test]
fn test_type() {
    assert_eq!(
        run_ember("print(type(1), type(\"s\"), type(true), type(nil), type([]), type(len))"),
        lines(&["number string bool nil list function"])
    );
}

#[test]
fn test_str() {
    assert_eq!(eval_print("str(42) + \"!\""), "42!");
    assert_eq!(eval_print("str(3.5)"), "3.5");
    assert_eq!(eval_print("str([1, 2])"), "[1, 2]");
    assert_eq!(eval_print("type(str(nil))"), "string");
}

#[test]
fn test_num() {
    assert_eq!(eval_print("num(\"42\") + 1"), "43");
    assert_eq!(eval_print("num(\" 2.5 \")"), "2.5");
    assert_eq!(eval_print("num(true)"), "1");
    assert_eq!(eval_print("num(7)"), "7");

    let error = run_ember_err("num(\"twelve\")");
    assert_eq!(error.kind, ErrorKind::Runtime);
    assert_eq!(error.message, "num() cannot convert 'twelve' to a number");
}

#[test]
fn test_num_accepts_non_finite_spellings() {
    assert_eq!(eval_print("num(\"inf\")"), "inf");
    assert_eq!(eval_print("num(\"-Infinity\")"), "-inf");
    assert_eq!(eval_print("num(\"NaN\")"), "nan");
    assert_eq!(eval_print("num(\"nan\") == num(\"nan\")"), "false");
    assert_eq!(eval_print("type(num(\"inf\"))"), "number");
}

#[test]
fn test_input() {
    let source = "let name = input(\"Name? \")\nprint(\"Hello, \" + name)\nprint(input())";
    let outcome = run_with_input(source, &["Ada"]);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.output, lines(&["Hello, Ada", "nil"]));
}

#[test]
fn test_builtins_can_be_shadowed() {
    let source = "let len = 3\nprint(len)";
    assert_eq!(run_ember(source), lines(&["3"]));
}

#[test]
fn test_list_indexing() {
    let source = r#"
let items = [10, 20, 30]
print(items[0], items[2], items[1.9])
let items[1] = "twenty"
print(items)
let grid = [[1, 2], [3, 4]]
print(grid[1][0])
"#;
    assert_eq!(run_ember(source), lines(&["10 30 20", "[10, twenty, 30]", "3"]));
}

#[test]
fn test_string_indexing() {
    assert_eq!(eval_print("\"hello\"[1]"), "e");
    assert_eq!(eval_print("\"héllo\"[1]"), "é");
}

#[test]
fn test_self_containing_list_prints() {
    let source = "let a = [1]\nappend(a, a)\nprint(a)\nprint(len(a))";
    assert_eq!(run_ember(source), lines(&["[1, [...]]", "2"]));
}
