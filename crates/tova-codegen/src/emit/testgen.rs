//! Test harness emission.
//!
//! `test "X" { fn test_a() { ... } }` compiles to a Bun-style
//! `describe`/`test` file. The server bundle exports `__handleRequest`
//! when tests exist, so suites can drive routes without a live socket.

use tova_parser::ast::*;

use super::Emitter;

pub fn emit_tests(e: &mut Emitter, suites: &[(String, &Block)], base_name: &str) {
    e.line("import { describe, test, expect } from \"bun:test\";");
    e.line(&format!(
        "import {{ __handleRequest }} from \"./{base_name}.server.js\";"
    ));
    e.blank();
    e.line("async function __request(method, path, body) {");
    e.indented(|em| {
        em.line("const init = { method, headers: { \"Content-Type\": \"application/json\" } };");
        em.line("if (body !== undefined) init.body = JSON.stringify(body);");
        em.line("return __handleRequest(new Request(`http://localhost${path}`, init));");
    });
    e.line("}");
    e.blank();

    for (name, body) in suites {
        e.line(&format!("describe({}, () => {{", super::js_string(name)));
        e.indented(|em| {
            for stmt in &body.stmts {
                match &stmt.kind {
                    StmtKind::FnDecl(decl) if decl.name.starts_with("test_") => {
                        em.line(&format!(
                            "test({}, async () => {{",
                            super::js_string(&decl.name)
                        ));
                        em.emit_fn_body(&decl.body);
                        em.line("});");
                    }
                    _ => em.stmt(stmt),
                }
            }
        });
        e.line("});");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tova_analyzer::registry::TypeRegistry;

    #[test]
    fn suites_become_describe_blocks() {
        let src = "test \"math\" {\n  fn test_add() {\n    expect(1 + 1)\n  }\n}";
        let parse = tova_parser::parse(src).expect("parse failure");
        let suites: Vec<(String, &Block)> = parse
            .program
            .stmts
            .iter()
            .filter_map(|s| match &s.kind {
                StmtKind::TestBlock { name, body } => Some((name.clone(), body)),
                _ => None,
            })
            .collect();
        let registry = TypeRegistry::new();
        let mut e = Emitter::new(&registry);
        emit_tests(&mut e, &suites, "app");
        let out = e.take();
        assert!(out.contains("import { describe, test, expect } from \"bun:test\";"));
        assert!(out.contains("import { __handleRequest } from \"./app.server.js\";"));
        assert!(out.contains("describe(\"math\", () => {"));
        assert!(out.contains("test(\"test_add\", async () => {"));
    }
}
