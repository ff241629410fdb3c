//! End-to-end codegen tests: source in, emitted JavaScript out.

use tova_analyzer::{analyze, Options};
use tova_codegen::{generate, GenOptions, Outputs};

fn outputs_of(source: &str) -> Outputs {
    let parse = tova_parser::parse(source).expect("parse failure");
    let analysis = analyze(&parse.program, Options::default());
    generate(&parse.program, &analysis, &GenOptions::default())
}

fn shared_of(source: &str) -> String {
    outputs_of(source).shared
}

fn server_of(source: &str) -> String {
    let outputs = outputs_of(source);
    assert_eq!(outputs.servers.len(), 1, "expected one server bundle");
    outputs.servers.into_iter().next().unwrap().code
}

fn client_of(source: &str) -> String {
    let outputs = outputs_of(source);
    assert_eq!(outputs.clients.len(), 1, "expected one client bundle");
    outputs.clients.into_iter().next().unwrap().code
}

// ── Base emitter ───────────────────────────────────────────────────────

#[test]
fn const_assignment_parenthesizes_binaries() {
    let js = shared_of("x = 1 + 2");
    assert!(js.contains("const x = (1 + 2);"), "{js}");
}

#[test]
fn var_then_reassign() {
    let js = shared_of("var x = 1\nx = 2");
    assert!(js.contains("let x = 1;"), "{js}");
    assert!(js.contains("\nx = 2;"), "{js}");
    assert!(!js.contains("let x = 2"), "{js}");
}

#[test]
fn chained_comparison_with_literal_middle() {
    // Scenario: x = 1 < 2 < 3. No temporary for the literal 2.
    let js = shared_of("x = 1 < 2 < 3");
    assert!(js.contains("(1 < 2)"), "{js}");
    assert!(js.contains("(2 < 3)"), "{js}");
    assert!(js.contains("&&"), "{js}");
    assert!(!js.contains("__cmp"), "{js}");
}

#[test]
fn chained_comparison_binds_nontrivial_middle_once() {
    let js = shared_of("fn check(a, c) {\n  a < f(a) < c\n}\nfn f(x) { x }");
    assert!(js.contains("(__cmp_1 = f(a))"), "{js}");
    assert!(js.contains("(__cmp_1 < c)"), "{js}");
    assert!(js.contains("let __cmp_1;"), "{js}");
}

#[test]
fn tuple_assignment() {
    let js = shared_of("a, b = 1, 2");
    assert!(js.contains("const [a, b] = [1, 2];"), "{js}");
}

#[test]
fn object_destructure_with_default() {
    let js = shared_of("o = {}\nlet { x: y = 10 } = o");
    assert!(js.contains("const { x: y = 10 } = o;"), "{js}");
}

#[test]
fn array_destructure_skips_wildcard() {
    let js = shared_of("arr = [1, 2, 3]\nlet [a, _, c] = arr");
    assert!(js.contains("const [a, , c] = arr;"), "{js}");
}

#[test]
fn membership_uses_contains_helper() {
    let js = shared_of("xs = [1]\nfound = 1 in xs\nmissing = 2 not in xs");
    assert!(js.contains("__contains(xs, 1)"), "{js}");
    assert!(js.contains("(!__contains(xs, 2))"), "{js}");
    assert!(js.contains("function __contains"), "helper must be included: {js}");
}

#[test]
fn helper_registry_includes_only_referenced_helpers() {
    let js = shared_of("x = 1 + 2");
    assert!(!js.contains("function __contains"), "{js}");
    assert!(!js.contains("function __propagate"), "{js}");
    assert!(!js.contains("function __slice"), "{js}");
    // The string shim is always present.
    assert!(js.contains("const __str"), "{js}");
}

#[test]
fn exclusive_and_inclusive_ranges() {
    let js = shared_of("a = 1..5\nb = 1..=5");
    assert!(js.contains("Array.from({ length: (5) - (1) }"), "{js}");
    assert!(js.contains("Array.from({ length: (5) - (1) + 1 }"), "{js}");
}

#[test]
fn nan_safe_coalescing_inline_for_simple_operands() {
    let js = shared_of("a = 1\nb = 2\nc = a ?? b");
    assert!(js.contains("((a != null && a === a) ? a : b)"), "{js}");
    assert!(!js.contains("__v ="), "{js}");
}

#[test]
fn nan_safe_coalescing_binds_complex_operands() {
    let js = shared_of("fn f() { 1 }\nc = f() ?? 2");
    assert!(js.contains("(__v = f())"), "{js}");
    assert!(js.contains("__v === __v"), "{js}");
    assert!(js.contains("let __v;"), "{js}");
}

#[test]
fn string_repetition_uses_repeat() {
    let js = shared_of("s = \"ab\" * 3");
    assert!(js.contains("\"ab\".repeat(3)"), "{js}");
}

#[test]
fn dot_new_becomes_constructor_call() {
    let js = shared_of("type User {\n  name: String\n}\nu = User.new(\"ada\")");
    assert!(js.contains("new User(\"ada\")"), "{js}");
    assert!(js.contains("class User"), "{js}");
}

#[test]
fn pipe_rewrites() {
    let js = shared_of("fn f(x) { x }\nfn g(a, b) { a }\ny = 1 |> f\nz = 1 |> g(_, 2)\nw = 1 |> g(2)");
    assert!(js.contains("const y = f(1);"), "{js}");
    assert!(js.contains("const z = g(1, 2);"), "{js}");
    assert!(js.contains("const w = g(1, 2);"), "{js}");
}

#[test]
fn list_comprehension_map() {
    let js = shared_of("items = [1, 2]\nx = [n * 2 for n in items]");
    assert!(js.contains("items.map((n) => ((n * 2)))"), "{js}");
}

#[test]
fn list_comprehension_filter_only() {
    // Scenario: filter-only optimization, no .map call.
    let js = shared_of("items = [1, 2]\nx = [n for n in items if n > 0]");
    assert!(js.contains("items.filter((n) => ((n > 0)))"), "{js}");
    assert!(!js.contains(".map("), "{js}");
    assert!(!js.contains(".reduce("), "{js}");
}

#[test]
fn list_comprehension_filter_and_map_fuse_into_reduce() {
    let js = shared_of("items = [1, 2]\nx = [n * 2 for n in items if n > 0]");
    assert!(js.contains(".reduce((__acc, n) =>"), "{js}");
    assert!(js.contains("__acc.push((n * 2))"), "{js}");
}

#[test]
fn dict_comprehension() {
    let js = shared_of("pairs = []\nx = {k: v for k, v in pairs}");
    assert!(js.contains("Object.fromEntries(pairs.map((k, v) => [k, v]))"), "{js}");
}

#[test]
fn slice_without_step_uses_slice() {
    let js = shared_of("xs = [1, 2, 3]\na = xs[1:2]\nb = xs[:2]\nc = xs[1:]");
    assert!(js.contains("xs.slice(1, 2)"), "{js}");
    assert!(js.contains("xs.slice(0, 2)"), "{js}");
    assert!(js.contains("xs.slice(1)"), "{js}");
}

#[test]
fn slice_with_negative_step_uses_helper() {
    let js = shared_of("xs = [1, 2, 3]\nr = xs[::-1]");
    assert!(js.contains("__slice(xs, null, null, (-1))"), "{js}");
    assert!(js.contains("function __slice"), "{js}");
}

#[test]
fn for_else_uses_entered_flag() {
    let js = shared_of("fn f(xs) {\n  for x in xs {\n    print(x)\n  } else {\n    print(\"empty\")\n  }\n}");
    assert!(js.contains("let __entered_1 = false;"), "{js}");
    assert!(js.contains("__entered_1 = true;"), "{js}");
    assert!(js.contains("if (!__entered_1) {"), "{js}");
}

#[test]
fn implicit_return_of_final_expression() {
    let js = shared_of("fn add(a, b) {\n  a + b\n}");
    assert!(js.contains("return (a + b);"), "{js}");
}

#[test]
fn propagate_wraps_enclosing_function() {
    let js = shared_of("fn load(path) {\n  data = read(path)?\n  data\n}\nfn read(p) { Ok(p) }");
    assert!(js.contains("__propagate("), "{js}");
    assert!(js.contains("if (__e.__tova_propagate) return __e.value;"), "{js}");
    assert!(js.contains("function __propagate"), "{js}");
}

#[test]
fn propagate_in_lambda_does_not_wrap_outer_function() {
    let js = shared_of("fn outer(xs) {\n  xs.map(fn(x) x?)\n}");
    // The outer function body has no direct propagate, so no try wrapper
    // directly after its opening brace.
    let fn_idx = js.find("function outer").expect("outer emitted");
    let after = &js[fn_idx..];
    assert!(!after.starts_with("function outer(xs) {\n  try {"), "{js}");
}

#[test]
fn match_compiles_to_tag_checks() {
    let src = "type Shape {\n  Circle(Float)\n  Point\n}\nfn area(s) {\n  match s {\n    Circle(r) => r * r\n    Point => 0\n    _ => -1\n  }\n}";
    let js = shared_of(src);
    assert!(js.contains("const __match = s;"), "{js}");
    assert!(js.contains("__match.__tag === \"Circle\""), "{js}");
    assert!(js.contains("const r = __match.f0;"), "{js}");
    assert!(js.contains("__match.__tag === \"Point\""), "{js}");
}

#[test]
fn match_on_literals_becomes_ternary_chain() {
    let js = shared_of("fn word(n) {\n  match n {\n    1 => \"one\"\n    2 => \"two\"\n    _ => \"many\"\n  }\n}");
    assert!(js.contains("(n === 1) ? \"one\""), "{js}");
    assert!(js.contains("(n === 2) ? \"two\""), "{js}");
    assert!(!js.contains("__match"), "{js}");
}

#[test]
fn match_array_pattern() {
    let js = shared_of("fn first(xs) {\n  match xs {\n    [a, b] => a\n    other => other\n  }\n}");
    assert!(js.contains("Array.isArray(__match) && __match.length === 2"), "{js}");
    assert!(js.contains("const a = __match[0];"), "{js}");
}

#[test]
fn match_guard_falls_through() {
    let js = shared_of("fn f(o) {\n  match o {\n    Some(v) if v > 0 => v\n    Some(v) => 0\n    None => -1\n  }\n}");
    assert!(js.contains("__match.__tag === \"Some\""), "{js}");
    assert!(js.contains("if ((v > 0)) {"), "{js}");
    assert!(js.contains("__match.__tag === \"None\""), "{js}");
}

#[test]
fn if_expression_with_simple_branches_is_a_ternary() {
    let js = shared_of("c = true\nx = if c { 1 } else { 2 }");
    assert!(js.contains("const x = ((c) ? 1 : 2);"), "{js}");
}

#[test]
fn if_expression_with_blocks_uses_result_temp() {
    let js = shared_of("c = true\nx = if c { y = 1\n y + 1 } else { 2 }");
    assert!(js.contains("let __r_1;"), "{js}");
    assert!(js.contains("__r_1 = (y + 1);"), "{js}");
    assert!(js.contains("const x = __r_1;"), "{js}");
}

#[test]
fn sum_type_constructors_carry_discriminators() {
    let js = shared_of("type Shape {\n  Circle(Float)\n  Point\n}");
    assert!(js.contains("const Circle = (f0) => ({ __tag: \"Circle\", f0 });"), "{js}");
    assert!(js.contains("const Point = { __tag: \"Point\" };"), "{js}");
}

#[test]
fn shared_exports_declarations() {
    let js = shared_of("fn add(a, b) { a + b }\ntype User {\n  name: String\n}");
    assert!(js.contains("export { add, User };"), "{js}");
}

// ── Server emitter ─────────────────────────────────────────────────────

#[test]
fn rpc_route_for_server_function() {
    // Scenario: server { fn add(a, b) { a + b } }
    let js = server_of("server {\n  fn add(a, b) {\n    a + b\n  }\n}");
    assert!(js.contains("__addRoute(\"POST\", \"/rpc/add\""), "{js}");
    assert!(js.contains("body.__args ? body.__args : [body.a, body.b]"), "{js}");
    assert!(js.contains("Response.json({ result })"), "{js}");
}

#[test]
fn declared_route_registers_handler() {
    let js = server_of("server {\n  route get \"/users/:id\" {\n    respond(req.params)\n  }\n}");
    assert!(js.contains("__addRoute(\"GET\", \"/users/:id\""), "{js}");
}

#[test]
fn routes_sorted_by_specificity() {
    let js = server_of("server {\n  route get \"/users/:id\" {\n    respond(1)\n  }\n  route get \"/users/active\" {\n    respond(2)\n  }\n}");
    assert!(js.contains("__routes.sort((a, b) => __routeSpecificity(b.path) - __routeSpecificity(a.path));"), "{js}");
    assert!(js.contains("function __routeSpecificity"), "{js}");
}

#[test]
fn typed_env_declaration() {
    let js = server_of("server {\n  env PORT: Int = 3000\n}");
    assert!(js.contains("const PORT = __typedEnv(\"PORT\", \"Int\", 3000);"), "{js}");
}

#[test]
fn health_openapi_and_docs_routes() {
    let js = server_of("server {\n}");
    assert!(js.contains("__addRoute(\"GET\", \"/health\""), "{js}");
    assert!(js.contains("uptime"), "{js}");
    assert!(js.contains("\"/openapi.json\""), "{js}");
    assert!(js.contains("openapi: \"3.0.3\""), "{js}");
    assert!(js.contains("\"/docs\""), "{js}");
    assert!(js.contains("swagger-ui"), "{js}");
}

#[test]
fn middleware_composes_with_reduce_right() {
    let js = server_of("server {\n  middleware {\n    next()\n  }\n}");
    assert!(js.contains("__middleware.push(async (req, next) => {"), "{js}");
    assert!(js.contains("reduceRight"), "{js}");
}

#[test]
fn websocket_handlers_and_rooms() {
    let js = server_of("server {\n  ws \"/chat\" {\n    on_open(sock) {\n      join_room(sock, \"lobby\")\n    }\n    on_message(sock, data) {\n      broadcast(data)\n    }\n    on_close(sock, code, reason) {\n      print(code)\n    }\n  }\n}");
    assert!(js.contains("__wsPaths[\"/chat\"]"), "{js}");
    assert!(js.contains("open: async (sock) =>"), "{js}");
    assert!(js.contains("message: async (sock, data) =>"), "{js}");
    assert!(js.contains("close: async (sock, code, reason) =>"), "{js}");
    assert!(js.contains("server.upgrade(req"), "{js}");
    assert!(js.contains("function join_room"), "{js}");
}

#[test]
fn sse_handler_emits_event_stream() {
    let js = server_of("server {\n  sse \"/events\" {\n    send(\"tick\")\n  }\n}");
    assert!(js.contains("__sseHandlers[\"/events\"]"), "{js}");
    assert!(js.contains("text/event-stream"), "{js}");
    assert!(js.contains("data: ${payload}\\n\\n") || js.contains("data: ${payload}\n\n"), "{js}");
}

#[test]
fn schedule_and_background_jobs() {
    let js = server_of("server {\n  schedule cleanup \"5m\" {\n    print(\"tick\")\n  }\n  background send_email(to) {\n    print(to)\n  }\n}");
    assert!(js.contains("__startSchedule(\"cleanup\", \"5m\""), "{js}");
    assert!(js.contains("__backgroundJobs[\"send_email\"]"), "{js}");
    assert!(js.contains("function send_email(...__args)"), "{js}");
    assert!(js.contains("__cronMatches"), "{js}");
}

#[test]
fn graceful_shutdown_drains_requests() {
    let js = server_of("server {\n}");
    assert!(js.contains("process.on(\"SIGINT\", __shutdown);"), "{js}");
    assert!(js.contains("process.on(\"SIGTERM\", __shutdown);"), "{js}");
    assert!(js.contains("__activeRequests"), "{js}");
}

#[test]
fn static_dir_with_etag() {
    let js = server_of("server {\n  static \"/public\" \"./public\"\n}");
    assert!(js.contains("__staticDirs.push({ route: \"/public\", dir: \"./public\" });"), "{js}");
    assert!(js.contains("ETag"), "{js}");
    assert!(js.contains("If-None-Match"), "{js}");
}

#[test]
fn auth_session_rate_limit_compression_configs() {
    let src = "server {\n  auth jwt {\n    secret: \"s\"\n  }\n  session {\n    store: \"memory\"\n  }\n  rate_limit {\n    max: 10\n    window_ms: 1000\n  }\n  compression {\n    min_size: 512\n  }\n  cors {\n    origin: \"*\"\n  }\n  upload {\n    max_size: 1024\n  }\n}";
    let js = server_of(src);
    assert!(js.contains("scheme: \"jwt\""), "{js}");
    assert!(js.contains("const __sessionConfig = { store: \"memory\" };"), "{js}");
    assert!(js.contains("const __rateLimitConfig = { max: 10, window_ms: 1000 };"), "{js}");
    assert!(js.contains("const __compressionConfig = { min_size: 512 };"), "{js}");
    assert!(js.contains("Accept-Encoding"), "{js}");
    assert!(js.contains("gzip"), "{js}");
    assert!(js.contains("Access-Control-Allow-Origin"), "{js}");
    assert!(js.contains("multipart/form-data"), "{js}");
}

#[test]
fn model_emits_table_and_crud() {
    let src = "type User {\n  name: String\n  age: Int\n}\nserver {\n  model User\n}";
    let js = server_of(src);
    assert!(js.contains("CREATE TABLE IF NOT EXISTS users"), "{js}");
    assert!(js.contains("name TEXT"), "{js}");
    assert!(js.contains("age INTEGER"), "{js}");
    assert!(js.contains("const UserModel = {"), "{js}");
    assert!(js.contains("INSERT INTO users"), "{js}");
}

#[test]
fn multi_server_bundles_get_ports_and_peers() {
    let src = "server \"api\" {\n  fn ping() {\n    1\n  }\n}\nserver \"jobs\" {\n  fn work() {\n    2\n  }\n}";
    let outputs = outputs_of(src);
    assert_eq!(outputs.servers.len(), 2);
    let api = &outputs.servers[0];
    assert_eq!(api.name.as_deref(), Some("api"));
    assert!(api.code.contains("process.env.PORT_API"), "{}", api.code);
    assert!(api.code.contains("const __LOG_PREFIX = \"[api] \";"), "{}", api.code);
    assert!(api.code.contains("__callPeer"), "{}", api.code);
    assert!(api.code.contains("\"jobs\": `http://localhost:${process.env.PORT_JOBS"), "{}", api.code);
}

#[test]
fn request_context_uses_async_local_storage() {
    let js = server_of("server {\n}");
    assert!(js.contains("import { AsyncLocalStorage } from \"node:async_hooks\";"), "{js}");
    assert!(js.contains("new AsyncLocalStorage()"), "{js}");
    assert!(js.contains("crypto.randomUUID()"), "{js}");
}

#[test]
fn handle_request_exported_only_with_tests() {
    let with_tests = "server {\n  fn ping() {\n    1\n  }\n}\ntest \"t\" {\n  fn test_ping() {\n    expect(1)\n  }\n}";
    let outputs = outputs_of(with_tests);
    assert!(outputs.servers[0].code.contains("export { __handleRequest };"));
    assert!(outputs.tests.is_some());

    let without = outputs_of("server {\n  fn ping() {\n    1\n  }\n}");
    assert!(!without.servers[0].code.contains("export { __handleRequest };"));
    assert!(without.tests.is_none());
}

// ── Client emitter ─────────────────────────────────────────────────────

#[test]
fn component_with_state_and_reactive_jsx() {
    // Scenario: client { component App { state count = 0 ... } }
    let src = "client {\n  component App {\n    state count = 0\n    <div>\"c: {count}\"</div>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("function App(__props)"), "{js}");
    assert!(js.contains("const [count, setCount] = createSignal(0);"), "{js}");
    assert!(js.contains("tova_el(\"div\""), "{js}");
    assert!(js.contains("() => `c: ${count()}`"), "{js}");
}

#[test]
fn state_writes_become_setter_calls() {
    let src = "client {\n  component App {\n    state count = 0\n    fn inc() {\n      count = count + 1\n    }\n    <button on:click={inc}>\"+\"</button>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("setCount((count() + 1));"), "{js}");
    assert!(js.contains("onClick: inc"), "{js}");
}

#[test]
fn computed_and_effect() {
    let src = "client {\n  state count = 0\n  computed double = count * 2\n  effect {\n    print(count)\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("const double = createComputed(() => ((count() * 2)));"), "{js}");
    assert!(js.contains("createEffect(() => {"), "{js}");
    assert!(js.contains("console.log(count())"), "{js}");
}

#[test]
fn props_become_accessors() {
    let src = "client {\n  component Card(title) {\n    <h1>{title}</h1>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("const title = () => __props.title;"), "{js}");
    assert!(js.contains("() => title()"), "{js}");
}

#[test]
fn static_children_stay_static() {
    let src = "client {\n  component App {\n    <p>{1 + 2}</p>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("tova_el(\"p\""), "{js}");
    assert!(!js.contains("() => (1 + 2)"), "{js}");
}

#[test]
fn bind_value_on_input() {
    let src = "client {\n  component App {\n    state name = \"\"\n    <input bind:value={name}/>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("value: () => name()"), "{js}");
    assert!(js.contains("onInput: (__e) => setName(__e.target.value)"), "{js}");
}

#[test]
fn bind_group_radio_and_checkbox() {
    let src = "client {\n  component App {\n    state pick = \"\"\n    state tags = []\n    <input type=\"radio\" value=\"a\" bind:group={pick}/>\n    <input type=\"checkbox\" value=\"x\" bind:group={tags}/>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("checked: () => pick() === \"a\""), "{js}");
    assert!(js.contains("tags().includes(\"x\")"), "{js}");
    assert!(js.contains("tags().filter((__x) => __x !== \"x\")"), "{js}");
}

#[test]
fn class_directives_merge_with_base_class() {
    let src = "client {\n  component App {\n    state on = true\n    <div class=\"box\" class:active={on} class:big={on}>\"x\"</div>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains(".filter(Boolean).join(\" \")"), "{js}");
    assert!(js.contains("((on()) ? \"active\" : \"\")"), "{js}");
    assert!(js.contains("((on()) ? \"big\" : \"\")"), "{js}");
    assert!(js.contains("\"box\""), "{js}");
}

#[test]
fn scoped_css_hash_is_deterministic_8_hex() {
    let hash1 = tova_codegen::emit::client::scope_hash("App", ".btn { color: red }");
    let hash2 = tova_codegen::emit::client::scope_hash("App", ".btn { color: red }");
    assert_eq!(hash1, hash2);
    assert_eq!(hash1.len(), 8);
    assert!(hash1.chars().all(|c| c.is_ascii_hexdigit()));
    let other = tova_codegen::emit::client::scope_hash("Card", ".btn { color: red }");
    assert_ne!(hash1, other, "different components must scope differently");
}

#[test]
fn component_style_injects_scoped_css() {
    let src = "client {\n  component App {\n    style { .btn { color: red } }\n    <button class=\"btn\">\"go\"</button>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("tova_inject_css("), "{js}");
    let hash = tova_codegen::emit::client::scope_hash("App", " .btn { color: red } ");
    assert!(js.contains(&format!("tova-{hash}")), "{js}");
}

#[test]
fn jsx_for_uses_keyed_helper() {
    let src = "client {\n  component App {\n    state items = []\n    <ul>for item in items key={item} { <li>{item}</li> }</ul>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("tova_keyed(() => (items())"), "{js}");
    assert!(js.contains("(item) => (item)"), "{js}");
}

#[test]
fn jsx_if_children_are_reactive() {
    let src = "client {\n  component App {\n    state ok = true\n    <div>if ok { <p>\"yes\"</p> } else { <p>\"no\"</p> }</div>\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("() => ((ok())"), "{js}");
}

#[test]
fn store_exposes_getters_setters_and_methods() {
    let src = "client {\n  store Cart {\n    var items = []\n    fn add(item) {\n      items = [...items, item]\n    }\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("const Cart = (() => {"), "{js}");
    assert!(js.contains("const [items, setItems] = createSignal([]);"), "{js}");
    assert!(js.contains("get items() { return items(); }"), "{js}");
    assert!(js.contains("set items(__v) { setItems(__v); }"), "{js}");
    assert!(js.contains("function add(item)"), "{js}");
}

#[test]
fn client_bundle_imports_runtime() {
    let js = client_of("client {\n  state n = 0\n}");
    assert!(js.contains("from \"@tova/runtime\";"), "{js}");
    assert!(js.contains("createSignal"), "{js}");
    assert!(js.contains("tova_el"), "{js}");
    assert!(js.contains("lazy"), "{js}");
    assert!(js.contains("Portal"), "{js}");
}

#[test]
fn app_component_mounts() {
    let js = client_of("client {\n  component App {\n    <div>\"hi\"</div>\n  }\n}");
    assert!(js.contains("mount(App, document.getElementById(\"app\"));"), "{js}");
}

// ── Form emitter ───────────────────────────────────────────────────────

#[test]
fn form_controller_surface() {
    let src = "client {\n  form Signup {\n    field email {\n      required: true\n    }\n    field password\n    group address {\n      field city\n    }\n    array phones {\n      field number\n    }\n    steps {\n      account { email, password }\n      contact { address }\n    }\n    on submit {\n      print(values)\n    }\n  }\n}";
    let js = client_of(src);
    assert!(js.contains("const Signup = (() => {"), "{js}");
    assert!(js.contains("__makeField(\"email\", { required: true })"), "{js}");
    assert!(js.contains("__makeGroup({ city: __makeField(\"city\", {  }) })"), "{js}");
    assert!(js.contains("__makeArray(() => ({ number: __makeField(\"number\", {  }) }))"), "{js}");
    assert!(js.contains("currentStep"), "{js}");
    assert!(js.contains("canNext"), "{js}");
    assert!(js.contains("progress"), "{js}");
    assert!(js.contains("__setSubmitCount(__submitCount() + 1);"), "{js}");
    assert!(js.contains("} catch (__err) {"), "{js}");
    assert!(js.contains("} finally {"), "{js}");
    assert!(js.contains("__setSubmitting(false);"), "{js}");
    assert!(js.contains("get values()"), "{js}");
    assert!(js.contains("__item.__id = __nextId;"), "{js}");
    assert!(js.contains("move(__from, __to)"), "{js}");
}

// ── Fresh names are per-compilation ────────────────────────────────────

#[test]
fn fresh_name_counters_reset_between_compilations() {
    let src = "fn f(a, c) {\n  a < g(a) < c\n}\nfn g(x) { x }";
    let one = shared_of(src);
    let two = shared_of(src);
    assert_eq!(one, two, "independent compilations must not share counters");
    assert!(one.contains("__cmp_1"));
    assert!(!one.contains("__cmp_2"));
}
