//! Integration tests for the Tova parser.

use tova_parser::ast::*;
use tova_parser::{parse, parse_tolerant};

fn parse_ok(source: &str) -> Program {
    parse(source).expect("parse failure").program
}

/// The single expression of a one-statement program.
fn expr_of(source: &str) -> Expr {
    let program = parse_ok(source);
    assert_eq!(program.stmts.len(), 1, "expected one statement");
    match program.stmts.into_iter().next().unwrap().kind {
        StmtKind::Expr(e) => e,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

// ── Precedence ──────────────────────────────────────────────────────────

#[test]
fn multiplication_binds_tighter_than_addition() {
    let e = expr_of("1 + 2 * 3");
    let ExprKind::Binary { op: BinOp::Add, rhs, .. } = e.kind else {
        panic!("expected top-level +, got {:?}", e.kind);
    };
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
}

#[test]
fn power_is_right_associative() {
    let e = expr_of("2 ** 3 ** 2");
    let ExprKind::Binary { op: BinOp::Pow, lhs, rhs } = e.kind else {
        panic!("expected **");
    };
    assert!(matches!(lhs.kind, ExprKind::Int(2)));
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinOp::Pow, .. }));
}

#[test]
fn unary_minus_binds_tighter_than_power() {
    let e = expr_of("-2 ** 3");
    let ExprKind::Binary { op: BinOp::Pow, lhs, .. } = e.kind else {
        panic!("expected ** at top");
    };
    assert!(matches!(lhs.kind, ExprKind::Unary { op: UnOp::Neg, .. }));
}

#[test]
fn coalesce_is_looser_than_or() {
    let e = expr_of("a or b ?? c");
    let ExprKind::Binary { op: BinOp::NullCoalesce, lhs, .. } = e.kind else {
        panic!("expected ?? at top, got {:?}", e.kind);
    };
    assert!(matches!(lhs.kind, ExprKind::Logical { op: LogicalOp::Or, .. }));
}

#[test]
fn pipe_is_lowest() {
    let e = expr_of("x + 1 |> f");
    let ExprKind::Pipe { lhs, rhs } = e.kind else {
        panic!("expected pipe at top");
    };
    assert!(matches!(lhs.kind, ExprKind::Binary { op: BinOp::Add, .. }));
    assert!(matches!(rhs.kind, ExprKind::Ident(ref n) if n == "f"));
}

#[test]
fn chained_comparison_three_operands() {
    let e = expr_of("a < b < c");
    let ExprKind::ChainedCmp { operands, ops } = e.kind else {
        panic!("expected chained comparison, got {:?}", e.kind);
    };
    assert_eq!(operands.len(), 3);
    assert_eq!(ops, vec![CmpOp::Lt, CmpOp::Lt]);
}

#[test]
fn two_operand_comparison_stays_simple() {
    let e = expr_of("a < b");
    assert!(matches!(e.kind, ExprKind::Cmp { op: CmpOp::Lt, .. }));
}

#[test]
fn membership_operators() {
    assert!(matches!(
        expr_of("x in xs").kind,
        ExprKind::Membership { negated: false, .. }
    ));
    assert!(matches!(
        expr_of("x not in xs").kind,
        ExprKind::Membership { negated: true, .. }
    ));
}

#[test]
fn ranges() {
    assert!(matches!(
        expr_of("1..10").kind,
        ExprKind::Range { inclusive: false, .. }
    ));
    assert!(matches!(
        expr_of("1..=10").kind,
        ExprKind::Range { inclusive: true, .. }
    ));
}

// ── Parse determinism (round-trip idempotence) ─────────────────────────

#[test]
fn reparsing_the_same_source_is_structurally_equal() {
    let src = "x = f(1, 2) |> g\nfn h(a, b) -> Int { a + b }";
    let one = parse_ok(src);
    let two = parse_ok(src);
    assert_eq!(one, two);
}

// ── Lambdas ────────────────────────────────────────────────────────────

#[test]
fn arrow_lambda_with_params() {
    let e = expr_of("(a, b) => a + b");
    let ExprKind::Lambda { params, body } = e.kind else {
        panic!("expected lambda, got {:?}", e.kind);
    };
    assert_eq!(params.len(), 2);
    assert!(matches!(body, LambdaBody::Expr(_)));
}

#[test]
fn grouped_expression_is_not_a_lambda() {
    let e = expr_of("(a)");
    assert!(matches!(e.kind, ExprKind::Ident(ref n) if n == "a"));
}

#[test]
fn grouped_addition_backtracks() {
    // `(a, b)` without `=>` is a tuple; `(a + b)` is grouping.
    let e = expr_of("(a + b) * 2");
    assert!(matches!(e.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    let t = expr_of("(a, b)");
    assert!(matches!(t.kind, ExprKind::Tuple(ref elems) if elems.len() == 2));
}

#[test]
fn fn_lambda_expression_body() {
    let e = expr_of("fn(x) x * 2");
    assert!(matches!(e.kind, ExprKind::Lambda { .. }));
}

#[test]
fn lambda_block_body() {
    let e = expr_of("(x) => { y = x + 1\n y }");
    let ExprKind::Lambda { body, .. } = e.kind else {
        panic!("expected lambda");
    };
    assert!(matches!(body, LambdaBody::Block(_)));
}

// ── Postfix forms ──────────────────────────────────────────────────────

#[test]
fn member_chains_and_optional_chaining() {
    let e = expr_of("a.b?.c");
    let ExprKind::Member { optional: true, object, name } = e.kind else {
        panic!("expected optional member");
    };
    assert_eq!(name, "c");
    assert!(matches!(object.kind, ExprKind::Member { optional: false, .. }));
}

#[test]
fn slice_with_negative_step() {
    let e = expr_of("list[::-1]");
    let ExprKind::Slice { start, end, step, .. } = e.kind else {
        panic!("expected slice, got {:?}", e.kind);
    };
    assert!(start.is_none());
    assert!(end.is_none());
    let step = step.expect("step present");
    assert!(matches!(step.kind, ExprKind::Unary { op: UnOp::Neg, .. }));
}

#[test]
fn slice_start_end() {
    let e = expr_of("xs[1:4]");
    let ExprKind::Slice { start, end, step, .. } = e.kind else {
        panic!("expected slice");
    };
    assert!(start.is_some());
    assert!(end.is_some());
    assert!(step.is_none());
}

#[test]
fn named_call_arguments() {
    let e = expr_of("fetch(url, timeout: 30)");
    let ExprKind::Call { args, .. } = e.kind else {
        panic!("expected call");
    };
    assert_eq!(args[0].name, None);
    assert_eq!(args[1].name.as_deref(), Some("timeout"));
}

#[test]
fn propagate_postfix() {
    let e = expr_of("read_file(path)?");
    assert!(matches!(e.kind, ExprKind::Propagate(_)));
}

// ── Literals and comprehensions ────────────────────────────────────────

#[test]
fn object_shorthand_and_spread() {
    let e = expr_of("{a, b: 2, ...rest}");
    let ExprKind::Object(entries) = e.kind else {
        panic!("expected object");
    };
    assert!(matches!(entries[0], ObjectEntry::Shorthand(ref n) if n == "a"));
    assert!(matches!(entries[1], ObjectEntry::Pair { ref key, .. } if key == "b"));
    assert!(matches!(entries[2], ObjectEntry::Spread(_)));
}

#[test]
fn list_comprehension_with_filter() {
    let e = expr_of("[n * 2 for n in items if n > 0]");
    let ExprKind::ListComp { vars, filter, .. } = e.kind else {
        panic!("expected comprehension, got {:?}", e.kind);
    };
    assert_eq!(vars, vec!["n".to_string()]);
    assert!(filter.is_some());
}

#[test]
fn dict_comprehension() {
    let e = expr_of("{k: v for k, v in pairs}");
    let ExprKind::DictComp { vars, .. } = e.kind else {
        panic!("expected dict comprehension, got {:?}", e.kind);
    };
    assert_eq!(vars, vec!["k".to_string(), "v".to_string()]);
}

// ── Statements ─────────────────────────────────────────────────────────

#[test]
fn var_and_reassignment() {
    let program = parse_ok("var x = 1\nx = 2");
    assert!(matches!(
        program.stmts[0].kind,
        StmtKind::Assign { mutable: true, .. }
    ));
    assert!(matches!(
        program.stmts[1].kind,
        StmtKind::Assign { mutable: false, .. }
    ));
}

#[test]
fn parallel_assignment() {
    let program = parse_ok("a, b = 1, 2");
    let StmtKind::TupleAssign { ref names, ref values } = program.stmts[0].kind else {
        panic!("expected tuple assign");
    };
    assert_eq!(names, &["a".to_string(), "b".to_string()]);
    assert_eq!(values.len(), 2);
}

#[test]
fn compound_assignment() {
    let program = parse_ok("x += 1");
    assert!(matches!(
        program.stmts[0].kind,
        StmtKind::CompoundAssign { op: BinOp::Add, .. }
    ));
}

#[test]
fn let_destructuring() {
    let program = parse_ok("let { x: y = 10, z } = o\nlet [a, _, c] = arr");
    let StmtKind::LetDestructure { pattern: Destructure::Object(ref fields), .. } =
        program.stmts[0].kind
    else {
        panic!("expected object destructure");
    };
    assert_eq!(fields[0].key, "x");
    assert_eq!(fields[0].alias.as_deref(), Some("y"));
    assert!(fields[0].default.is_some());
    assert_eq!(fields[1].key, "z");

    let StmtKind::LetDestructure { pattern: Destructure::Array(ref elems), .. } =
        program.stmts[1].kind
    else {
        panic!("expected array destructure");
    };
    assert_eq!(elems.len(), 3);
    assert!(matches!(elems[1], ArrayDestructureElem::Wildcard));
}

#[test]
fn function_declaration_with_types() {
    let program = parse_ok("fn add(a: Int, b: Int) -> Int { a + b }");
    let StmtKind::FnDecl(ref decl) = program.stmts[0].kind else {
        panic!("expected fn decl");
    };
    assert_eq!(decl.name, "add");
    assert_eq!(decl.params.len(), 2);
    assert!(decl.return_type.is_some());
}

#[test]
fn sum_type_declaration() {
    let program = parse_ok("type Shape {\n  Circle(Float)\n  Point\n}");
    let StmtKind::TypeDecl(ref decl) = program.stmts[0].kind else {
        panic!("expected type decl");
    };
    let TypeBody::Sum(ref variants) = decl.body else {
        panic!("expected sum type");
    };
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].name, "Circle");
    assert_eq!(variants[0].fields.len(), 1);
    assert!(variants[1].fields.is_empty());
}

#[test]
fn record_type_declaration() {
    let program = parse_ok("type User {\n  name: String\n  age: Int\n}");
    let StmtKind::TypeDecl(ref decl) = program.stmts[0].kind else {
        panic!("expected type decl");
    };
    assert!(matches!(decl.body, TypeBody::Record(ref fields) if fields.len() == 2));
}

#[test]
fn generic_type_declaration() {
    let program = parse_ok("type Option<T> {\n  Some(T)\n  None\n}");
    let StmtKind::TypeDecl(ref decl) = program.stmts[0].kind else {
        panic!("expected type decl");
    };
    assert_eq!(decl.type_params, vec!["T".to_string()]);
}

#[test]
fn for_else() {
    let program = parse_ok("for x in xs { f(x) } else { g() }");
    assert!(matches!(
        program.stmts[0].kind,
        StmtKind::For { else_branch: Some(_), .. }
    ));
}

#[test]
fn if_elif_else_chain() {
    let program = parse_ok("if a { 1 } elif b { 2 } else { 3 }");
    let StmtKind::If { ref elifs, ref else_branch, .. } = program.stmts[0].kind else {
        panic!("expected if");
    };
    assert_eq!(elifs.len(), 1);
    assert!(else_branch.is_some());
}

#[test]
fn statement_after_if_without_else() {
    let program = parse_ok("if a { 1 }\nx = 2");
    assert_eq!(program.stmts.len(), 2);
}

// ── Match ──────────────────────────────────────────────────────────────

#[test]
fn match_with_variant_patterns_and_guard() {
    let src = "match o {\n  Some(v) if v > 0 => v\n  Some(v) => 0\n  None => -1\n}";
    let e = expr_of(src);
    let ExprKind::Match { arms, .. } = e.kind else {
        panic!("expected match");
    };
    assert_eq!(arms.len(), 3);
    assert!(arms[0].guard.is_some());
    assert!(matches!(
        arms[2].pattern.kind,
        PatternKind::Variant { ref name, .. } if name == "None"
    ));
}

#[test]
fn match_array_and_or_patterns() {
    let src = "match xs {\n  [a, b] => a\n  1 | 2 => 0\n  _ => -1\n}";
    let e = expr_of(src);
    let ExprKind::Match { arms, .. } = e.kind else {
        panic!("expected match");
    };
    assert!(matches!(arms[0].pattern.kind, PatternKind::Array(ref elems) if elems.len() == 2));
    assert!(matches!(arms[1].pattern.kind, PatternKind::Or(ref alts) if alts.len() == 2));
    assert!(arms[2].pattern.is_catch_all());
}

// ── Blocks and forms ───────────────────────────────────────────────────

#[test]
fn named_multi_blocks() {
    let program = parse_ok("server \"api\" {\n}\nclient \"dash\" {\n}\nshared {\n}");
    assert!(matches!(
        program.stmts[0].kind,
        StmtKind::Server { name: Some(ref n), .. } if n == "api"
    ));
    assert!(matches!(
        program.stmts[1].kind,
        StmtKind::Client { name: Some(ref n), .. } if n == "dash"
    ));
    assert!(matches!(program.stmts[2].kind, StmtKind::Shared { name: None, .. }));
}

#[test]
fn client_forms() {
    let src = "client {\n  state count = 0\n  computed double = count * 2\n  effect {\n    log(count)\n  }\n  component App {\n    <div>{count}</div>\n  }\n  store Cart {\n    var items = []\n  }\n}";
    let program = parse_ok(src);
    let StmtKind::Client { ref body, .. } = program.stmts[0].kind else {
        panic!("expected client block");
    };
    assert!(matches!(body.stmts[0].kind, StmtKind::State { ref name, .. } if name == "count"));
    assert!(matches!(body.stmts[1].kind, StmtKind::Computed { .. }));
    assert!(matches!(body.stmts[2].kind, StmtKind::Effect { .. }));
    assert!(matches!(body.stmts[3].kind, StmtKind::Component { ref name, .. } if name == "App"));
    assert!(matches!(body.stmts[4].kind, StmtKind::Store { ref name, .. } if name == "Cart"));
}

#[test]
fn server_forms() {
    let src = r#"server {
  env PORT: Int = 3000
  route get "/users" {
    respond(users)
  }
  middleware {
    next(req)
  }
  ws "/chat" {
    on_open(sock) {
      join(sock, "lobby")
    }
    on_message(sock, data) {
      broadcast(data)
    }
  }
  schedule cleanup "5m" {
    purge()
  }
  background send_email(to) {
    deliver(to)
  }
  health "/healthz"
  static "/public" "./public"
}"#;
    let program = parse_ok(src);
    let StmtKind::Server { ref body, .. } = program.stmts[0].kind else {
        panic!("expected server block");
    };
    let kinds: Vec<&StmtKind> = body.stmts.iter().map(|s| &s.kind).collect();
    assert!(matches!(kinds[0], StmtKind::EnvDecl { .. }));
    assert!(matches!(kinds[1], StmtKind::Route { ref method, ref path, .. } if method == "get" && path == "/users"));
    assert!(matches!(kinds[2], StmtKind::Middleware { .. }));
    assert!(matches!(kinds[3], StmtKind::Ws { ref handlers, .. } if handlers.len() == 2));
    assert!(matches!(kinds[4], StmtKind::Schedule { ref spec, .. } if spec == "5m"));
    assert!(matches!(kinds[5], StmtKind::Background { .. }));
    assert!(matches!(kinds[6], StmtKind::Health { path: Some(_) }));
    assert!(matches!(kinds[7], StmtKind::StaticDir { .. }));
}

#[test]
fn deploy_block_entries() {
    let src = "deploy \"prod\" {\n  server: \"api\"\n  domain: \"x.com\"\n  instances: 3\n  env {\n    LOG_LEVEL: \"info\"\n  }\n  db {\n    postgres {\n      size: \"small\"\n    }\n    redis {\n    }\n  }\n}";
    let program = parse_ok(src);
    let StmtKind::DeployProfile { ref name, ref entries } = program.stmts[0].kind else {
        panic!("expected deploy profile");
    };
    assert_eq!(name, "prod");
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].key, "server");
    assert!(matches!(entries[3].value, ConfigValue::Block(_)));
}

#[test]
fn form_block() {
    let src = r#"form Signup {
  field email: String {
    required: true
  }
  field password
  group address {
    field city
    field zip
  }
  array phones {
    field number
  }
  steps {
    account { email, password }
    contact { address }
  }
  on submit {
    save()
  }
}"#;
    let program = parse_ok(src);
    let StmtKind::Form(ref form) = program.stmts[0].kind else {
        panic!("expected form");
    };
    assert_eq!(form.name, "Signup");
    assert_eq!(form.members.len(), 6);
    assert!(matches!(form.members[0], FormMember::Field { ref name, .. } if name == "email"));
    assert!(matches!(form.members[2], FormMember::Group { .. }));
    assert!(matches!(form.members[3], FormMember::Array { .. }));
    assert!(matches!(form.members[4], FormMember::Steps(ref steps) if steps.len() == 2));
    assert!(matches!(form.members[5], FormMember::OnSubmit(_)));
}

// ── JSX ────────────────────────────────────────────────────────────────

#[test]
fn jsx_element_tree() {
    let e = expr_of("<div class=\"box\"><p>hi</p>{count}</div>");
    let ExprKind::Jsx(node) = e.kind else {
        panic!("expected JSX, got {:?}", e.kind);
    };
    let JsxNodeKind::Element { ref tag, ref attrs, ref children } = node.kind else {
        panic!("expected element");
    };
    assert_eq!(tag, "div");
    assert_eq!(attrs[0].name, "class");
    assert_eq!(children.len(), 2);
    assert!(matches!(children[0], JsxChild::Element(_)));
    assert!(matches!(children[1], JsxChild::Expr(_)));
}

#[test]
fn jsx_control_children() {
    let src = "<ul>for item in items key={item} { <li>{item}</li> }\nif empty { <p>none</p> }</ul>";
    let e = expr_of(src);
    let ExprKind::Jsx(node) = e.kind else {
        panic!("expected JSX");
    };
    let JsxNodeKind::Element { ref children, .. } = node.kind else {
        panic!("expected element");
    };
    assert!(matches!(children[0], JsxChild::For { ref key, .. } if key.is_some()));
    assert!(matches!(children[1], JsxChild::If { .. }));
}

#[test]
fn jsx_mismatched_closing_tag_is_an_error() {
    assert!(parse("<div>hi</span>").is_err());
}

// ── Docstrings ─────────────────────────────────────────────────────────

#[test]
fn docstrings_collected_in_order() {
    let src = "/// first\nfn a() { 1 }\n/// second\nfn b() { 2 }";
    let result = parse(src).expect("parse failure");
    let texts: Vec<&str> = result.docstrings.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
}

// ── Tolerant mode ──────────────────────────────────────────────────────

#[test]
fn tolerant_mode_recovers_at_statement_boundaries() {
    let src = "x = 1\ny = = 2\nz = 3";
    let result = parse_tolerant(src).expect("lexing should succeed");
    assert!(!result.ok());
    assert!(!result.errors.is_empty());
    // The statements before and after the bad one survive.
    let assigns = result
        .program
        .stmts
        .iter()
        .filter(|s| matches!(s.kind, StmtKind::Assign { .. }))
        .count();
    assert!(assigns >= 2, "expected x and z assignments to survive");
    assert!(result
        .program
        .stmts
        .iter()
        .any(|s| matches!(s.kind, StmtKind::Error)));
}

#[test]
fn strict_mode_fails_fast() {
    assert!(parse("y = = 2").is_err());
}
