//! Tova code generation: analyzed AST in, named JavaScript outputs out.
//!
//! Outputs are grouped by target: one shared module, one bundle per
//! server block (self-contained, Bun-compatible), one bundle per client
//! block (linking the reactive runtime), a structured deploy record
//! (JSON, not JS), and an optional Bun test harness. Every bundle embeds
//! the helper prelude for exactly the helpers it references, plus the
//! fixed string-methods shim.
//!
//! Codegen assumes an error-free analysis; it is also safe to call on a
//! tolerant-parsed partial AST (error placeholder nodes emit `undefined`).

pub mod emit;

use tova_analyzer::Analysis;
use tova_parser::ast::*;

use emit::helpers::{helper_source, HELPER_ORDER, STRING_SHIM};
use emit::server::ServerMeta;
use emit::Emitter;

/// Generation options.
#[derive(Debug, Clone)]
pub struct GenOptions {
    /// Base file name the outputs are written under (`<base>.server.js`).
    pub base_name: String,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            base_name: "app".into(),
        }
    }
}

/// One emitted JavaScript file.
pub struct Bundle {
    /// Block name for named multi-blocks; `None` for the default bundle.
    pub name: Option<String>,
    pub code: String,
}

/// Everything codegen produces for one program.
pub struct Outputs {
    pub shared: String,
    pub servers: Vec<Bundle>,
    pub clients: Vec<Bundle>,
    /// Deploy profiles keyed by name; `tova.deploy.json`.
    pub deploys: serde_json::Value,
    /// Bun test harness; present when the program has test blocks.
    pub tests: Option<String>,
}

/// Generate all outputs for an analyzed program.
pub fn generate(program: &Program, analysis: &Analysis, opts: &GenOptions) -> Outputs {
    // ── Partition top-level statements by target ───────────────────────
    let mut shared_stmts: Vec<&Stmt> = Vec::new();
    let mut servers: Vec<(Option<String>, &Block)> = Vec::new();
    let mut clients: Vec<(Option<String>, &Block)> = Vec::new();
    let mut deploys: Vec<(String, Vec<ConfigEntry>)> = Vec::new();
    let mut tests: Vec<(String, &Block)> = Vec::new();

    for stmt in &program.stmts {
        match &stmt.kind {
            StmtKind::Server { name, body } => servers.push((name.clone(), body)),
            StmtKind::Client { name, body } => clients.push((name.clone(), body)),
            StmtKind::Shared { body, .. } => {
                shared_stmts.extend(body.stmts.iter());
            }
            StmtKind::DeployProfile { name, entries } => {
                deploys.push((name.clone(), entries.clone()));
            }
            StmtKind::TestBlock { name, body } => tests.push((name.clone(), body)),
            StmtKind::Error => {}
            _ => shared_stmts.push(stmt),
        }
    }

    let has_tests = !tests.is_empty();
    let server_names: Vec<String> = servers.iter().filter_map(|(n, _)| n.clone()).collect();

    // ── Shared module ──────────────────────────────────────────────────
    let shared = {
        let mut e = Emitter::new(&analysis.registry);
        emit::shared::emit_shared(&mut e, &shared_stmts);
        let body = e.take();
        let exports = emit::shared::exported_names(&shared_stmts);
        let mut code = assemble(&e, &[&body]);
        if !exports.is_empty() {
            code.push_str(&format!("\nexport {{ {} }};\n", exports.join(", ")));
        }
        code
    };

    // ── Server bundles ─────────────────────────────────────────────────
    let server_bundles: Vec<Bundle> = servers
        .iter()
        .map(|(name, body)| {
            let peer_names: Vec<String> = server_names
                .iter()
                .filter(|n| Some((*n).clone()) != *name)
                .cloned()
                .collect();
            let meta = ServerMeta {
                name: name.clone(),
                has_tests,
                peer_names,
            };
            let mut e = Emitter::new(&analysis.registry);
            emit::shared::emit_shared(&mut e, &shared_stmts);
            let shared_part = e.take();
            emit::server::emit_server(&mut e, &body.stmts, &meta);
            let server_part = e.take();
            let header = "import { AsyncLocalStorage } from \"node:async_hooks\";\n";
            let code = format!(
                "{header}\n{}",
                assemble(&e, &[&shared_part, &server_part])
            );
            Bundle {
                name: name.clone(),
                code,
            }
        })
        .collect();

    // ── Client bundles ─────────────────────────────────────────────────
    let client_bundles: Vec<Bundle> = clients
        .iter()
        .map(|(name, body)| {
            let mut e = Emitter::new(&analysis.registry);
            emit::shared::emit_shared(&mut e, &shared_stmts);
            let shared_part = e.take();
            emit::client::emit_client(&mut e, &body.stmts);
            let client_part = e.take();
            let code = format!(
                "{}\n\n{}",
                emit::client::RUNTIME_IMPORT,
                assemble(&e, &[&shared_part, &client_part])
            );
            Bundle {
                name: name.clone(),
                code,
            }
        })
        .collect();

    // ── Tests ──────────────────────────────────────────────────────────
    let tests_out = if has_tests {
        let mut e = Emitter::new(&analysis.registry);
        emit::testgen::emit_tests(&mut e, &tests, &opts.base_name);
        let body = e.take();
        Some(assemble(&e, &[&body]))
    } else {
        None
    };

    Outputs {
        shared,
        servers: server_bundles,
        clients: client_bundles,
        deploys: emit::deploy::deploy_record(&deploys),
        tests: tests_out,
    }
}

/// Assemble a bundle: referenced helpers, the string shim, hoisted
/// temporaries, then the code sections.
fn assemble(e: &Emitter, sections: &[&str]) -> String {
    let mut out = String::new();
    for name in HELPER_ORDER {
        if e.used_helpers.contains(name) {
            out.push_str(helper_source(name).expect("ordered helpers have source"));
            out.push('\n');
        }
    }
    out.push_str(STRING_SHIM);
    out.push('\n');
    if !e.temps.is_empty() {
        let names: Vec<&str> = e.temps.iter().map(|s| s.as_str()).collect();
        out.push_str(&format!("let {};\n", names.join(", ")));
    }
    for section in sections {
        if !section.is_empty() {
            out.push('\n');
            out.push_str(section);
        }
    }
    out
}
