//! Scope, mutability, context and deploy-validation diagnostics.

use tova_analyzer::{analyze, Analysis, Options};

fn analyze_src(source: &str) -> Analysis {
    let parse = tova_parser::parse(source).expect("parse failure");
    analyze(&parse.program, Options::default())
}

fn analyze_strict(source: &str) -> Analysis {
    let parse = tova_parser::parse(source).expect("parse failure");
    analyze(&parse.program, Options { strict: true })
}

fn messages(analysis: &Analysis) -> Vec<String> {
    analysis
        .diagnostics
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

// ── Mutability ─────────────────────────────────────────────────────────

#[test]
fn reassigning_immutable_is_a_hard_error() {
    let a = analyze_src("x = 1\nx = 2");
    assert!(a.has_errors());
    assert!(messages(&a)
        .iter()
        .any(|m| m == "Cannot reassign immutable variable 'x'"));
}

#[test]
fn var_reassignment_is_fine() {
    let a = analyze_src("var x = 1\nx = 2");
    assert!(!a.has_errors(), "{:?}", messages(&a));
}

#[test]
fn compound_assign_to_immutable_is_an_error() {
    let a = analyze_src("x = 1\nx += 1");
    assert!(a.has_errors());
    assert!(messages(&a)
        .iter()
        .any(|m| m == "Cannot reassign immutable variable 'x'"));
}

#[test]
fn compound_assign_to_var_is_fine() {
    let a = analyze_src("var x = 1\nx += 1");
    assert!(!a.has_errors(), "{:?}", messages(&a));
}

// ── Duplicates ─────────────────────────────────────────────────────────

#[test]
fn duplicate_var_declaration() {
    let a = analyze_src("var x = 1\nvar x = 2");
    assert!(a.has_errors());
    assert!(messages(&a).iter().any(|m| m == "Duplicate declaration of 'x'"));
}

#[test]
fn duplicate_fn_declaration() {
    let a = analyze_src("fn f() { 1 }\nfn f() { 2 }");
    assert!(a.has_errors());
    assert!(messages(&a).iter().any(|m| m == "Duplicate declaration of 'f'"));
}

#[test]
fn duplicate_parameter_names() {
    let a = analyze_src("fn f(a, a) { a }");
    assert!(a.has_errors());
    assert!(messages(&a).iter().any(|m| m == "Duplicate declaration of 'a'"));
}

#[test]
fn duplicate_destructuring_targets() {
    let a = analyze_src("let { a, b: a } = o");
    assert!(a.has_errors());
}

#[test]
fn shadowing_in_inner_scope_is_allowed() {
    let a = analyze_src("var x = 1\nfn f() { var x = 2\nx }");
    assert!(!a.has_errors(), "{:?}", messages(&a));
}

// ── Resolution ─────────────────────────────────────────────────────────

#[test]
fn unresolved_identifier_warns() {
    let a = analyze_src("x = missing_thing");
    assert!(!a.has_errors());
    assert!(messages(&a)
        .iter()
        .any(|m| m == "Unresolved identifier 'missing_thing'"));
}

#[test]
fn whitelisted_globals_do_not_warn() {
    let a = analyze_src("x = console\ny = fetch");
    assert!(a.diagnostics.is_empty(), "{:?}", messages(&a));
}

#[test]
fn builtins_resolve() {
    let a = analyze_src("n = len([1, 2])\nt = type_of(n)\nr = random()");
    assert!(a.diagnostics.is_empty(), "{:?}", messages(&a));
}

#[test]
fn forward_function_references_resolve() {
    let a = analyze_src("fn a() { b() }\nfn b() { 1 }");
    assert!(a.diagnostics.is_empty(), "{:?}", messages(&a));
}

#[test]
fn variant_constructors_are_hoisted() {
    let a = analyze_src("type Shape {\n  Circle(Float)\n  Point\n}\ns = Circle(1.5)\np = Point");
    assert!(a.diagnostics.is_empty(), "{:?}", messages(&a));
}

// ── Context rules ──────────────────────────────────────────────────────

#[test]
fn state_outside_client_is_an_error() {
    let a = analyze_src("state count = 0");
    assert!(a.has_errors());
    assert!(messages(&a)
        .iter()
        .any(|m| m == "'state' is only valid inside a client block"));
}

#[test]
fn state_inside_component_is_fine() {
    let a = analyze_src("client {\n  component App {\n    state count = 0\n    count\n  }\n}");
    assert!(!a.has_errors(), "{:?}", messages(&a));
}

#[test]
fn route_outside_server_is_an_error() {
    let a = analyze_src("route get \"/x\" {\n  respond(1)\n}");
    assert!(a.has_errors());
    assert!(messages(&a)
        .iter()
        .any(|m| m == "'route' is only valid inside a server block"));
}

#[test]
fn route_inside_server_is_fine() {
    let a = analyze_src("server {\n  route get \"/x\" {\n    respond(1)\n  }\n}");
    assert!(!a.has_errors(), "{:?}", messages(&a));
}

#[test]
fn env_outside_server_is_an_error() {
    let a = analyze_src("env PORT: Int = 3000");
    assert!(a.has_errors());
}

// ── Argument counts ────────────────────────────────────────────────────

#[test]
fn too_few_arguments_warns() {
    let a = analyze_src("fn add(a, b) { a + b }\nadd(1)");
    assert!(!a.has_errors());
    assert!(messages(&a).iter().any(|m| m == "too few arguments to 'add'"));
}

#[test]
fn too_many_arguments_warns() {
    let a = analyze_src("fn add(a, b) { a + b }\nadd(1, 2, 3)");
    assert!(messages(&a).iter().any(|m| m == "too many arguments to 'add'"));
}

#[test]
fn arg_count_errors_in_strict_mode() {
    let a = analyze_strict("fn add(a, b) { a + b }\nadd(1)");
    assert!(a.has_errors());
}

// ── Deploy validation ──────────────────────────────────────────────────

#[test]
fn deploy_missing_server_is_an_error() {
    let a = analyze_src("deploy \"prod\" {\n  domain: \"x.com\"\n}");
    assert!(a.has_errors());
    let all = messages(&a).join("\n");
    assert!(all.contains("server"), "error must name the missing key: {all}");
}

#[test]
fn deploy_with_required_keys_is_clean() {
    let a = analyze_src("deploy \"prod\" {\n  server: \"api\"\n  domain: \"x.com\"\n}");
    assert!(!a.has_errors(), "{:?}", messages(&a));
}

// ── Return paths ───────────────────────────────────────────────────────

#[test]
fn missing_return_path_warns() {
    let a = analyze_src("fn f(x) -> Int {\n  if x {\n    return 1\n  }\n}");
    assert!(messages(&a)
        .iter()
        .any(|m| m == "not all code paths return a value"));
}

#[test]
fn undeclared_return_type_is_exempt() {
    let a = analyze_src("fn f(x) {\n  if x {\n    return 1\n  }\n}");
    assert!(!messages(&a)
        .iter()
        .any(|m| m == "not all code paths return a value"));
}

// ── Exhaustiveness (end to end through analyze) ────────────────────────

#[test]
fn non_exhaustive_option_match_warns() {
    let a = analyze_src("fn h(o: Option) {\n  match o {\n    Some(v) => v\n  }\n}");
    assert!(!a.has_errors(), "{:?}", messages(&a));
    assert!(messages(&a)
        .iter()
        .any(|m| m == "Non-exhaustive match: missing 'None'"));
}

#[test]
fn exhaustive_user_adt_match_is_clean() {
    let src = "type Shape {\n  Circle(Float)\n  Point\n}\nfn f(s: Shape) {\n  match s {\n    Circle(r) => r\n    Point => 0\n  }\n}";
    let a = analyze_src(src);
    assert!(
        !messages(&a).iter().any(|m| m.contains("Non-exhaustive")),
        "{:?}",
        messages(&a)
    );
}

#[test]
fn missing_user_variant_is_named() {
    let src = "type Shape {\n  Circle(Float)\n  Square(Float)\n  Point\n}\nfn f(s: Shape) {\n  match s {\n    Circle(r) => r\n  }\n}";
    let a = analyze_src(src);
    let msgs = messages(&a);
    assert!(msgs.iter().any(|m| m == "Non-exhaustive match: missing 'Square'"));
    assert!(msgs.iter().any(|m| m == "Non-exhaustive match: missing 'Point'"));
    assert!(!msgs.iter().any(|m| m == "Non-exhaustive match: missing 'Circle'"));
}
