//! Server bundle emission.
//!
//! Each server block compiles to a self-contained Bun-compatible file:
//! route registry sorted by specificity, RPC endpoints for every
//! declared function, middleware composed with `reduceRight`, typed env
//! validation, session/auth/rate-limit/compression/upload/cors layers,
//! SSE and WebSocket plumbing with rooms, background jobs and schedules,
//! model/ORM emission from shared record types, structured request
//! logging over `AsyncLocalStorage`, OpenAPI + Swagger UI + health
//! routes, and graceful shutdown that drains in-flight requests.
//!
//! Named servers listen on `PORT_<NAME>` and log with a `[name]` prefix;
//! peers additionally get a circuit-breaker + retry client.

use tova_parser::ast::*;

use super::{js_string, Emitter};
use tova_analyzer::ty::Type;

/// Per-bundle facts the emitter needs beyond the block body.
pub struct ServerMeta {
    pub name: Option<String>,
    /// Export `__handleRequest` so the test harness can drive the server.
    pub has_tests: bool,
    /// Names of sibling server blocks (peer calls get breaker + retry).
    pub peer_names: Vec<String>,
}

/// Fixed plumbing shared by every server bundle.
const SERVER_SCAFFOLD: &str = r#"const __routes = [];
function __addRoute(method, path, handler) {
  __routes.push({ method, path, handler });
}
const __middleware = [];
const __sseHandlers = {};
const __wsPaths = {};
const __staticDirs = [];
const __onStart = [];
const __onStop = [];
const __onErrorHooks = [];
const __backgroundJobs = {};
const __jobQueue = [];
const __started = Date.now();
let __activeRequests = 0;
let __draining = false;
let __server = null;

function __typedEnv(name, type, fallback) {
  const raw = process.env[name];
  if (raw === undefined) {
    if (fallback === undefined) {
      console.error(`[env] missing required ${name}`);
      process.exit(1);
    }
    return fallback;
  }
  if (type === "Int") {
    const n = parseInt(raw, 10);
    if (Number.isNaN(n)) {
      console.error(`[env] ${name} must be an Int, got ${raw}`);
      process.exit(1);
    }
    return n;
  }
  if (type === "Float") {
    const n = Number(raw);
    if (Number.isNaN(n)) {
      console.error(`[env] ${name} must be a Float, got ${raw}`);
      process.exit(1);
    }
    return n;
  }
  if (type === "Bool") return raw === "true" || raw === "1";
  return raw;
}

const __requestContext = new AsyncLocalStorage();
function __log(...args) {
  const ctx = __requestContext.getStore();
  const entry = {
    ts: new Date().toISOString(),
    requestId: ctx ? ctx.requestId : null,
    msg: args.map((a) => (typeof a === "string" ? a : JSON.stringify(a))).join(" "),
  };
  console.log(__LOG_PREFIX + JSON.stringify(entry));
}

const __locks = new Map();
async function withLock(name, fn) {
  const prev = __locks.get(name) || Promise.resolve();
  let release;
  const gate = new Promise((res) => { release = res; });
  __locks.set(name, prev.then(() => gate));
  await prev;
  try {
    return await fn();
  } finally {
    release();
  }
}

function respond(data, init) {
  if (data instanceof Response) return data;
  return Response.json(data, init);
}
function redirect(location, status) {
  return new Response(null, { status: status || 302, headers: { Location: location } });
}
function html(s) {
  return new Response(s, { headers: { "Content-Type": "text/html; charset=utf-8" } });
}
function text(s) {
  return new Response(s, { headers: { "Content-Type": "text/plain; charset=utf-8" } });
}
function with_headers(data, headers) {
  const res = respond(data);
  for (const k of Object.keys(headers)) res.headers.set(k, headers[k]);
  return res;
}
function set_cookie(data, name, value) {
  const res = respond(data);
  res.headers.append("Set-Cookie", `${name}=${value}; Path=/; HttpOnly`);
  return res;
}
function stream(fn) {
  const body = new ReadableStream({
    start(controller) {
      const push = (chunk) => controller.enqueue(typeof chunk === "string" ? chunk : JSON.stringify(chunk));
      Promise.resolve(fn(push)).then(() => controller.close(), (e) => controller.error(e));
    },
  });
  return new Response(body);
}

function __toXml(data, tag) {
  tag = tag || "item";
  if (data == null) return `<${tag}/>`;
  if (Array.isArray(data)) return `<items>${data.map((d) => __toXml(d, tag)).join("")}</items>`;
  if (typeof data === "object") {
    const inner = Object.keys(data).map((k) => __toXml(data[k], k)).join("");
    return `<${tag}>${inner}</${tag}>`;
  }
  return `<${tag}>${String(data)}</${tag}>`;
}
function __negotiate(req, data) {
  const accept = req.headers.get("Accept") || "";
  if (accept.includes("application/xml")) {
    return new Response(__toXml(data), { headers: { "Content-Type": "application/xml" } });
  }
  if (accept.includes("text/html")) {
    return html(`<pre>${JSON.stringify(data, null, 2)}</pre>`);
  }
  if (accept.includes("text/plain")) {
    return text(typeof data === "string" ? data : JSON.stringify(data));
  }
  return Response.json(data);
}
function __finalize(req, result) {
  return result instanceof Response ? result : __negotiate(req, result);
}

function __routeSpecificity(path) {
  const segs = path.split("/").filter(Boolean);
  let score = 0;
  for (const s of segs) score += s.startsWith(":") ? 1 : 2;
  return score * 100 + segs.length;
}
function __matchPath(pattern, pathname) {
  const ps = pattern.split("/").filter(Boolean);
  const xs = pathname.split("/").filter(Boolean);
  if (ps.length !== xs.length) return null;
  const params = {};
  for (let i = 0; i < ps.length; i++) {
    if (ps[i].startsWith(":")) params[ps[i].slice(1)] = decodeURIComponent(xs[i]);
    else if (ps[i] !== xs[i]) return null;
  }
  return params;
}
function __matchRoute(method, pathname) {
  for (const r of __routes) {
    if (r.method !== method) continue;
    const params = __matchPath(r.path, pathname);
    if (params) return { route: r, params };
  }
  return null;
}

async function __serveStatic(req, prefix, dir, pathname) {
  const rel = pathname.slice(prefix.length).replace(/^\/+/, "");
  if (rel.includes("..")) return null;
  const file = Bun.file(`${dir}/${rel}`);
  if (!(await file.exists())) return null;
  const etag = `W/"${file.size}-${file.lastModified}"`;
  if (req.headers.get("If-None-Match") === etag) {
    return new Response(null, { status: 304, headers: { ETag: etag } });
  }
  return new Response(file, { headers: { ETag: etag } });
}

const __rateBuckets = new Map();
function __rateLimited(ip) {
  if (!__rateLimitConfig) return false;
  const now = Date.now();
  const windowMs = __rateLimitConfig.window_ms ?? 60000;
  const max = __rateLimitConfig.max ?? 100;
  const hits = (__rateBuckets.get(ip) || []).filter((t) => now - t < windowMs);
  if (hits.length >= max) {
    __rateBuckets.set(ip, hits);
    return true;
  }
  hits.push(now);
  __rateBuckets.set(ip, hits);
  return false;
}

async function __maybeCompress(req, res) {
  if (!__compressionConfig || !res || !res.body || res.status === 304) return res;
  const accept = req.headers.get("Accept-Encoding") || "";
  const encoding = accept.includes("gzip") ? "gzip" : accept.includes("deflate") ? "deflate" : null;
  if (!encoding) return res;
  const buf = new Uint8Array(await res.arrayBuffer());
  const minSize = __compressionConfig.min_size ?? 1024;
  if (buf.length < minSize) {
    return new Response(buf, { status: res.status, headers: res.headers });
  }
  const packed = encoding === "gzip" ? Bun.gzipSync(buf) : Bun.deflateSync(buf);
  const headers = new Headers(res.headers);
  headers.set("Content-Encoding", encoding);
  headers.delete("Content-Length");
  return new Response(packed, { status: res.status, headers });
}

async function __validateUpload(req) {
  if (!__uploadConfig) return null;
  const type = req.headers.get("Content-Type") || "";
  if (!type.includes("multipart/form-data")) return null;
  const len = parseInt(req.headers.get("Content-Length") || "0", 10);
  const maxSize = __uploadConfig.max_size ?? 10485760;
  if (len > maxSize) {
    return Response.json({ error: { message: "upload too large" } }, { status: 413 });
  }
  return null;
}

function __applyCors(req, res) {
  if (!__corsConfig || !res) return res;
  const headers = new Headers(res.headers);
  headers.set("Access-Control-Allow-Origin", __corsConfig.origin ?? "*");
  headers.set("Access-Control-Allow-Methods", __corsConfig.methods ?? "GET,POST,PUT,DELETE,PATCH,OPTIONS");
  headers.set("Access-Control-Allow-Headers", __corsConfig.headers ?? "Content-Type,Authorization");
  return new Response(res.body, { status: res.status, headers });
}
function __corsPreflight(req) {
  return __applyCors(req, new Response(null, { status: 204 }));
}

function __verifyJwt(token, secret) {
  const parts = token.split(".");
  if (parts.length !== 3) return null;
  const hasher = new Bun.CryptoHasher("sha256", secret);
  hasher.update(parts[0] + "." + parts[1]);
  if (hasher.digest("base64url") !== parts[2]) return null;
  const payload = JSON.parse(atob(parts[1].replace(/-/g, "+").replace(/_/g, "/")));
  if (payload.exp && payload.exp * 1000 < Date.now()) return null;
  return payload;
}
const __publicPaths = ["/health", "/openapi.json", "/docs"];
function __checkAuth(req, pathname) {
  if (!__authConfig || __publicPaths.includes(pathname)) return null;
  if (__authConfig.scheme === "jwt") {
    const header = req.headers.get("Authorization") || "";
    if (!header.startsWith("Bearer ")) {
      return Response.json({ error: { message: "unauthorized" } }, { status: 401 });
    }
    const payload = __verifyJwt(header.slice(7), __authConfig.secret ?? process.env.TOVA_JWT_SECRET ?? "");
    if (!payload) {
      return Response.json({ error: { message: "unauthorized" } }, { status: 401 });
    }
    req.user = payload;
    return null;
  }
  if (__authConfig.scheme === "api_key") {
    const key = req.headers.get(__authConfig.header ?? "X-Api-Key");
    const expected = __authConfig.key ?? process.env.TOVA_API_KEY;
    if (!key || (expected !== undefined && key !== expected)) {
      return Response.json({ error: { message: "unauthorized" } }, { status: 401 });
    }
  }
  return null;
}

const __sessions = new Map();
function __getSession(req) {
  if (!__sessionConfig) return null;
  const cookie = req.headers.get("Cookie") || "";
  const m = /tova_session=([A-Za-z0-9-]+)/.exec(cookie);
  let id = m ? m[1] : null;
  if (!id || !__sessions.has(id)) {
    id = crypto.randomUUID();
    __sessions.set(id, {});
  }
  req.__sessionId = id;
  return __sessions.get(id);
}

async function __runMiddleware(req, final) {
  const chain = __middleware.reduceRight((next, mw) => () => Promise.resolve(mw(req, next)), final);
  return chain();
}

function __handleSse(req, handler) {
  const body = new ReadableStream({
    start(controller) {
      const send = (data) => {
        const payload = typeof data === "string" ? data : JSON.stringify(data);
        controller.enqueue(`data: ${payload}\n\n`);
      };
      Promise.resolve(handler(req, send)).catch(() => {
        try { controller.close(); } catch {}
      });
    },
  });
  return new Response(body, {
    headers: { "Content-Type": "text/event-stream", "Cache-Control": "no-cache" },
  });
}

const __wsRooms = new Map();
function join_room(ws, room) {
  ws.subscribe(room);
  if (!__wsRooms.has(room)) __wsRooms.set(room, new Set());
  __wsRooms.get(room).add(ws);
}
function leave_room(ws, room) {
  ws.unsubscribe(room);
  const members = __wsRooms.get(room);
  if (members) members.delete(ws);
}
function broadcast(data, room) {
  const payload = typeof data === "string" ? data : JSON.stringify(data);
  if (!__server) return;
  if (room) {
    __server.publish(room, payload);
  } else {
    for (const r of __wsRooms.keys()) __server.publish(r, payload);
  }
}
function send(ws, data) {
  ws.send(typeof data === "string" ? data : JSON.stringify(data));
}

function __intervalMs(spec) {
  const m = /^(\d+)(ms|s|m|h|d)$/.exec(spec.trim());
  if (!m) return null;
  const mult = { ms: 1, s: 1000, m: 60000, h: 3600000, d: 86400000 }[m[2]];
  return parseInt(m[1], 10) * mult;
}
function __cronMatches(spec, d) {
  const fields = spec.trim().split(/\s+/);
  if (fields.length !== 5) return false;
  const vals = [d.getMinutes(), d.getHours(), d.getDate(), d.getMonth() + 1, d.getDay()];
  return fields.every((f, i) =>
    f === "*" || f.split(",").some((p) => parseInt(p, 10) === vals[i])
  );
}
const __scheduleTimers = [];
function __startSchedule(name, spec, fn) {
  const ms = __intervalMs(spec);
  if (ms != null) {
    __scheduleTimers.push(setInterval(() => {
      Promise.resolve(fn()).catch((e) => __reportError(e, null));
    }, ms));
    return;
  }
  let lastMinute = -1;
  __scheduleTimers.push(setInterval(() => {
    const now = new Date();
    if (now.getMinutes() === lastMinute) return;
    lastMinute = now.getMinutes();
    if (__cronMatches(spec, now)) {
      Promise.resolve(fn()).catch((e) => __reportError(e, null));
    }
  }, 20000));
}

function enqueue(name, ...args) {
  __jobQueue.push({ name, args });
}
const __jobTimer = setInterval(async () => {
  const job = __jobQueue.shift();
  if (!job) return;
  const run = __backgroundJobs[job.name];
  if (!run) return;
  try {
    await run(...job.args);
  } catch (e) {
    __reportError(e, null);
  }
}, 50);

function __reportError(err, req) {
  for (const hook of __onErrorHooks) {
    try { hook(err, req); } catch {}
  }
  __log("error:", String((err && err.message) || err));
}

async function __handleRequest(req) {
  const url = new URL(req.url);
  const requestId = crypto.randomUUID();
  return __requestContext.run({ requestId }, async () => {
    __activeRequests += 1;
    const startedAt = Date.now();
    try {
      if (__draining) {
        return Response.json({ error: { message: "shutting down" } }, { status: 503 });
      }
      if (__corsConfig && req.method === "OPTIONS") return __corsPreflight(req);
      const ip = req.headers.get("X-Forwarded-For") || "local";
      if (__rateLimited(ip)) {
        return Response.json({ error: { message: "rate limited" } }, { status: 429 });
      }
      const authFail = __checkAuth(req, url.pathname);
      if (authFail) return __applyCors(req, authFail);
      const uploadFail = await __validateUpload(req);
      if (uploadFail) return __applyCors(req, uploadFail);
      req.session = __getSession(req);
      for (const s of __staticDirs) {
        if (url.pathname.startsWith(s.route)) {
          const res = await __serveStatic(req, s.route, s.dir, url.pathname);
          if (res) return __applyCors(req, await __maybeCompress(req, res));
        }
      }
      if (__sseHandlers[url.pathname]) {
        return __applyCors(req, __handleSse(req, __sseHandlers[url.pathname]));
      }
      const matched = __matchRoute(req.method, url.pathname);
      if (!matched) {
        return __applyCors(req, Response.json({ error: { message: "not found" } }, { status: 404 }));
      }
      req.params = matched.params;
      req.query = Object.fromEntries(url.searchParams);
      const result = await __runMiddleware(req, async () => matched.route.handler(req));
      const res = __finalize(req, result);
      return __applyCors(req, await __maybeCompress(req, res));
    } catch (err) {
      __reportError(err, req);
      return __applyCors(req, Response.json(
        { error: { message: String((err && err.message) || err) } },
        { status: 500 }
      ));
    } finally {
      __activeRequests -= 1;
      __log(`${req.method} ${url.pathname} ${Date.now() - startedAt}ms`);
    }
  });
}

function __openapi() {
  const paths = {};
  for (const r of __routes) {
    const p = r.path.replace(/:([A-Za-z_][A-Za-z0-9_]*)/g, "{$1}");
    paths[p] = paths[p] || {};
    paths[p][r.method.toLowerCase()] = {
      responses: { "200": { description: "OK" } },
    };
  }
  return {
    openapi: "3.0.3",
    info: { title: __SERVER_NAME || "tova", version: "0.1.0" },
    paths,
  };
}

async function __shutdown() {
  if (__draining) return;
  __draining = true;
  __log("draining connections");
  const deadline = Date.now() + 10000;
  while (__activeRequests > 0 && Date.now() < deadline) {
    await new Promise((res) => setTimeout(res, 50));
  }
  for (const hook of __onStop) {
    try { await hook(); } catch (e) { __reportError(e, null); }
  }
  clearInterval(__jobTimer);
  for (const t of __scheduleTimers) clearInterval(t);
  if (__server) __server.stop();
  __log("stopped");
  process.exit(0);
}
process.on("SIGINT", __shutdown);
process.on("SIGTERM", __shutdown);"#;

/// Circuit breaker + exponential backoff retry, included for multi-server
/// peers so they can call each other safely.
const PEER_SCAFFOLD: &str = r#"const __breakers = new Map();
function __breaker(name) {
  if (!__breakers.has(name)) {
    __breakers.set(name, { failures: 0, openUntil: 0 });
  }
  return __breakers.get(name);
}
async function __retry(fn, attempts, baseMs) {
  attempts = attempts ?? 3;
  baseMs = baseMs ?? 100;
  let lastErr;
  for (let i = 0; i < attempts; i++) {
    try {
      return await fn();
    } catch (e) {
      lastErr = e;
      await new Promise((res) => setTimeout(res, baseMs * 2 ** i));
    }
  }
  throw lastErr;
}
async function __callPeer(name, path, body) {
  const b = __breaker(name);
  if (Date.now() < b.openUntil) {
    throw new Error(`circuit open for ${name}`);
  }
  try {
    const res = await __retry(() => fetch(`${__peers[name]}${path}`, {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify(body ?? {}),
    }));
    b.failures = 0;
    return res.json();
  } catch (e) {
    b.failures += 1;
    if (b.failures >= 5) {
      b.openUntil = Date.now() + 30000;
      b.failures = 0;
    }
    throw e;
  }
}"#;

pub fn emit_server(e: &mut Emitter, stmts: &[Stmt], meta: &ServerMeta) {
    let display_name = meta.name.clone();

    // ── Header constants ───────────────────────────────────────────────
    match &display_name {
        Some(name) => {
            e.line(&format!("const __SERVER_NAME = {};", js_string(name)));
            e.line(&format!(
                "const __LOG_PREFIX = {};",
                js_string(&format!("[{name}] "))
            ));
        }
        None => {
            e.line("const __SERVER_NAME = null;");
            e.line("const __LOG_PREFIX = \"\";");
        }
    }

    // ── Config objects collected from the block ────────────────────────
    let mut auth_entry: Option<(String, Vec<ConfigEntry>)> = None;
    let mut session_cfg: Option<Vec<ConfigEntry>> = None;
    let mut rate_cfg: Option<Vec<ConfigEntry>> = None;
    let mut compression_cfg: Option<Vec<ConfigEntry>> = None;
    let mut upload_cfg: Option<Vec<ConfigEntry>> = None;
    let mut cors_cfg: Option<Vec<ConfigEntry>> = None;
    let mut db_cfg: Option<Vec<ConfigEntry>> = None;
    let mut health_path: Option<String> = None;
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Auth { scheme, entries } => {
                auth_entry = Some((scheme.clone(), entries.clone()))
            }
            StmtKind::Session { entries } => session_cfg = Some(entries.clone()),
            StmtKind::RateLimit { entries } => rate_cfg = Some(entries.clone()),
            StmtKind::Compression { entries } => compression_cfg = Some(entries.clone()),
            StmtKind::Upload { entries } => upload_cfg = Some(entries.clone()),
            StmtKind::Cors { entries } => cors_cfg = Some(entries.clone()),
            StmtKind::Db { entries } => db_cfg = Some(entries.clone()),
            StmtKind::Health { path } => health_path = path.clone().or(Some("/health".into())),
            _ => {}
        }
    }

    emit_config(e, "__authConfig", auth_entry.as_ref().map(|(scheme, entries)| {
        let mut body = config_object_js(e_cfg(), entries);
        body.insert_str(2, &format!("scheme: {}, ", js_string(scheme)));
        body
    }));
    emit_config(e, "__sessionConfig", session_cfg.map(|c| config_object_js(e_cfg(), &c)));
    emit_config(e, "__rateLimitConfig", rate_cfg.map(|c| config_object_js(e_cfg(), &c)));
    emit_config(
        e,
        "__compressionConfig",
        compression_cfg.map(|c| config_object_js(e_cfg(), &c)),
    );
    emit_config(e, "__uploadConfig", upload_cfg.map(|c| config_object_js(e_cfg(), &c)));
    emit_config(e, "__corsConfig", cors_cfg.map(|c| config_object_js(e_cfg(), &c)));
    emit_config(e, "__dbConfig", db_cfg.map(|c| config_object_js(e_cfg(), &c)));
    e.blank();

    // ── Fixed plumbing ─────────────────────────────────────────────────
    for line in SERVER_SCAFFOLD.lines() {
        e.line(line);
    }
    e.blank();

    if !meta.peer_names.is_empty() {
        let peers: Vec<String> = meta
            .peer_names
            .iter()
            .map(|p| {
                let env = format!("PORT_{}", p.to_uppercase());
                format!(
                    "{}: `http://localhost:${{process.env.{env} || \"3000\"}}`",
                    js_string(p)
                )
            })
            .collect();
        e.line(&format!("const __peers = {{ {} }};", peers.join(", ")));
        for line in PEER_SCAFFOLD.lines() {
            e.line(line);
        }
        e.blank();
    }

    // ── Typed env declarations ─────────────────────────────────────────
    for stmt in stmts {
        if let StmtKind::EnvDecl { name, ty, default } = &stmt.kind {
            let ty_name = ty
                .as_ref()
                .map(type_expr_name)
                .unwrap_or_else(|| "String".into());
            let fallback = default
                .as_ref()
                .map(|d| e.expr(d))
                .unwrap_or_else(|| "undefined".into());
            e.declare(name);
            e.line(&format!(
                "const {name} = __typedEnv({}, {}, {fallback});",
                js_string(name),
                js_string(&ty_name)
            ));
        }
    }
    e.blank();

    // ── User code: functions, types, plain statements ──────────────────
    let mut rpc_fns: Vec<&FnDecl> = Vec::new();
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::FnDecl(decl) => {
                e.emit_fn_decl(decl);
                rpc_fns.push(decl);
            }
            StmtKind::TypeDecl(_)
            | StmtKind::Assign { .. }
            | StmtKind::TupleAssign { .. }
            | StmtKind::CompoundAssign { .. }
            | StmtKind::LetDestructure { .. }
            | StmtKind::Impl { .. }
            | StmtKind::If { .. }
            | StmtKind::For { .. }
            | StmtKind::While { .. }
            | StmtKind::Expr(_) => e.stmt(stmt),
            _ => {}
        }
    }
    e.blank();

    // ── Models ─────────────────────────────────────────────────────────
    let has_models = stmts
        .iter()
        .any(|s| matches!(s.kind, StmtKind::Model { .. }));
    if has_models {
        e.line("const { Database } = await import(\"bun:sqlite\");");
        e.line("const __db = new Database((__dbConfig && __dbConfig.path) || process.env.TOVA_DB || \":memory:\");");
        for stmt in stmts {
            if let StmtKind::Model { name, entries } = &stmt.kind {
                emit_model(e, name, entries);
            }
        }
        e.blank();
    }

    // ── RPC endpoints for declared functions ───────────────────────────
    for decl in &rpc_fns {
        emit_rpc_route(e, decl);
    }
    e.blank();

    // ── Declared routes, middleware, handlers, hooks ───────────────────
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Route { method, path, body } => {
                e.line(&format!(
                    "__addRoute({}, {}, async (req) => {{",
                    js_string(&method.to_uppercase()),
                    js_string(path)
                ));
                e.emit_fn_body(body);
                e.line("});");
            }
            StmtKind::Middleware { body, .. } => {
                e.line("__middleware.push(async (req, next) => {");
                e.enter_js_scope();
                e.declare("req");
                e.declare("next");
                e.emit_fn_body(body);
                e.exit_js_scope();
                e.line("});");
            }
            StmtKind::Sse { path, body } => {
                e.line(&format!(
                    "__sseHandlers[{}] = async (req, send) => {{",
                    js_string(path)
                ));
                e.enter_js_scope();
                e.declare("send");
                e.emit_fn_body(body);
                e.exit_js_scope();
                e.line("};");
            }
            StmtKind::Ws { path, handlers } => {
                let mut parts = Vec::new();
                for handler in handlers {
                    let key = match handler.kind {
                        WsHandlerKind::Open => "open",
                        WsHandlerKind::Message => "message",
                        WsHandlerKind::Close => "close",
                    };
                    let params = handler.params.join(", ");
                    let body = e.capture_fn_body(&handler.body);
                    parts.push(format!("{key}: async ({params}) => {{\n{body}}}"));
                }
                e.line(&format!(
                    "__wsPaths[{}] = {{ {} }};",
                    js_string(path),
                    parts.join(", ")
                ));
            }
            StmtKind::Schedule { name, spec, body } => {
                e.line(&format!(
                    "__startSchedule({}, {}, async () => {{",
                    js_string(name),
                    js_string(spec)
                ));
                e.emit_fn_body(body);
                e.line("});");
            }
            StmtKind::Background { name, params, body } => {
                let params_js = e.params_list(params);
                e.line(&format!(
                    "__backgroundJobs[{}] = async ({params_js}) => {{",
                    js_string(name)
                ));
                e.enter_js_scope();
                for p in params {
                    e.declare(&p.name);
                }
                e.emit_fn_body(body);
                e.exit_js_scope();
                e.line("};");
                e.line(&format!(
                    "function {name}(...__args) {{ __jobQueue.push({{ name: {}, args: __args }}); }}",
                    js_string(name)
                ));
            }
            StmtKind::OnStart(body) => {
                e.line("__onStart.push(async () => {");
                e.emit_fn_body(body);
                e.line("});");
            }
            StmtKind::OnStop(body) => {
                e.line("__onStop.push(async () => {");
                e.emit_fn_body(body);
                e.line("});");
            }
            StmtKind::OnError { param, body } => {
                e.line(&format!("__onErrorHooks.push(({param}, req) => {{"));
                e.enter_js_scope();
                e.declare(param);
                e.declare("req");
                e.emit_fn_body(body);
                e.exit_js_scope();
                e.line("});");
            }
            StmtKind::StaticDir { route, dir } => {
                e.line(&format!(
                    "__staticDirs.push({{ route: {}, dir: {} }});",
                    js_string(route),
                    js_string(dir)
                ));
            }
            _ => {}
        }
    }
    e.blank();

    // ── Built-in routes ────────────────────────────────────────────────
    let health = health_path.unwrap_or_else(|| "/health".into());
    e.line(&format!(
        "__addRoute(\"GET\", {}, async () => Response.json({{ status: \"ok\", uptime: (Date.now() - __started) / 1000 }}));",
        js_string(&health)
    ));
    e.line("__addRoute(\"GET\", \"/openapi.json\", async () => Response.json(__openapi()));");
    e.line("__addRoute(\"GET\", \"/docs\", async () => html(__SWAGGER_HTML));");
    e.line("const __SWAGGER_HTML = `<!doctype html>");
    e.line("<html>");
    e.line("<head><title>API docs</title>");
    e.line("<link rel=\"stylesheet\" href=\"https://unpkg.com/swagger-ui-dist@5/swagger-ui.css\"/></head>");
    e.line("<body><div id=\"swagger-ui\"></div>");
    e.line("<script src=\"https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js\"></script>");
    e.line("<script>SwaggerUIBundle({ url: \"/openapi.json\", dom_id: \"#swagger-ui\" });</script>");
    e.line("</body></html>`;");
    e.blank();

    // Static routes win over parametric ones.
    e.line("__routes.sort((a, b) => __routeSpecificity(b.path) - __routeSpecificity(a.path));");
    e.blank();

    // ── Startup ────────────────────────────────────────────────────────
    let port_env = match &display_name {
        Some(name) => format!("PORT_{}", name.to_uppercase()),
        None => "PORT".into(),
    };
    e.line(&format!(
        "const __port = typeof PORT !== \"undefined\" ? PORT : parseInt(process.env.{port_env} || \"3000\", 10);"
    ));
    e.line("async function __main() {");
    e.indented(|e| {
        e.line("for (const hook of __onStart) await hook();");
        e.line("__server = Bun.serve({");
        e.indented(|e| {
            e.line("port: __port,");
            e.line("fetch(req, server) {");
            e.indented(|e| {
                e.line("const url = new URL(req.url);");
                e.line("if (__wsPaths[url.pathname] && server.upgrade(req, { data: { path: url.pathname } })) return;");
                e.line("return __handleRequest(req);");
            });
            e.line("},");
            e.line("websocket: {");
            e.indented(|e| {
                e.line("open(ws) { const h = __wsPaths[ws.data.path]; if (h && h.open) h.open(ws); },");
                e.line("message(ws, data) { const h = __wsPaths[ws.data.path]; if (h && h.message) h.message(ws, data); },");
                e.line("close(ws, code, reason) { const h = __wsPaths[ws.data.path]; if (h && h.close) h.close(ws, code, reason); },");
            });
            e.line("},");
        });
        e.line("});");
        e.line("__log(`listening on ${__port}`);");
    });
    e.line("}");
    e.line("if (import.meta.main) {");
    e.indented(|e| e.line("__main();"));
    e.line("}");
    if meta.has_tests {
        e.line("export { __handleRequest };");
    }
}

/// Small scratch emitter for rendering config literals. Config values are
/// literal-shaped, so no registry access is needed.
fn e_cfg() -> ConfigRenderer {
    ConfigRenderer
}

struct ConfigRenderer;

impl ConfigRenderer {
    fn expr(&self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Int(v) => v.to_string(),
            ExprKind::Float(v) => v.to_string(),
            ExprKind::Str(s) => js_string(s),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Nil => "null".into(),
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Array(elems) => {
                let parts: Vec<String> = elems.iter().map(|e| self.expr(e)).collect();
                format!("[{}]", parts.join(", "))
            }
            ExprKind::Member { object, name, .. } => {
                format!("{}.{name}", self.expr(object))
            }
            _ => "null".into(),
        }
    }
}

fn config_object_js(renderer: ConfigRenderer, entries: &[ConfigEntry]) -> String {
    let parts: Vec<String> = entries
        .iter()
        .map(|entry| match &entry.value {
            ConfigValue::Expr(expr) => format!("{}: {}", entry.key, renderer.expr(expr)),
            ConfigValue::Block(nested) => {
                format!("{}: {}", entry.key, config_object_js(ConfigRenderer, nested))
            }
        })
        .collect();
    format!("{{ {} }}", parts.join(", "))
}

fn emit_config(e: &mut Emitter, name: &str, value: Option<String>) {
    match value {
        Some(v) => e.line(&format!("const {name} = {v};")),
        None => e.line(&format!("const {name} = null;")),
    }
}

fn type_expr_name(te: &TypeExpr) -> String {
    match &te.kind {
        TypeExprKind::Name(name) => name.clone(),
        TypeExprKind::Generic { base, .. } => base.clone(),
        _ => "String".into(),
    }
}

/// `POST /rpc/<name>` accepting `{ __args: [...] }` or named parameters.
fn emit_rpc_route(e: &mut Emitter, decl: &FnDecl) {
    let path = format!("/rpc/{}", decl.name);
    e.line(&format!(
        "__addRoute(\"POST\", {}, async (req) => {{",
        js_string(&path)
    ));
    e.indented(|e| {
        e.line("const body = await req.json().catch(() => ({}));");
        let named: Vec<String> = decl
            .params
            .iter()
            .map(|p| format!("body.{}", p.name))
            .collect();
        e.line(&format!(
            "const __args = body.__args ? body.__args : [{}];",
            named.join(", ")
        ));
        e.line("try {");
        e.indented(|e| {
            e.line(&format!(
                "const result = await Promise.resolve({}(...__args));",
                decl.name
            ));
            e.line("return Response.json({ result });");
        });
        e.line("} catch (err) {");
        e.indented(|e| {
            e.line("return Response.json({ error: { message: String((err && err.message) || err) } }, { status: 500 });");
        });
        e.line("}");
    });
    e.line("});");
}

/// Table schema and CRUD object for `model T`, derived from the shared
/// record type `T`.
fn emit_model(e: &mut Emitter, name: &str, entries: &[ConfigEntry]) {
    let table = entries
        .iter()
        .find_map(|entry| match (&entry.key[..], &entry.value) {
            ("table", ConfigValue::Expr(Expr { kind: ExprKind::Str(s), .. })) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(|| format!("{}s", name.to_lowercase()));

    let fields: Vec<(String, String)> = e
        .registry
        .fields_of(name)
        .map(|fields| {
            fields
                .iter()
                .map(|(fname, ty)| (fname.clone(), sql_type(ty).to_string()))
                .collect()
        })
        .unwrap_or_default();

    let columns: Vec<String> = fields
        .iter()
        .map(|(fname, sql)| format!("{fname} {sql}"))
        .collect();
    let column_list = if columns.is_empty() {
        String::from("data TEXT")
    } else {
        columns.join(", ")
    };
    e.line(&format!(
        "__db.run(`CREATE TABLE IF NOT EXISTS {table} (id INTEGER PRIMARY KEY AUTOINCREMENT, {column_list})`);"
    ));

    let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
    let cols = names.join(", ");
    let placeholders = names.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    let data_refs = names
        .iter()
        .map(|n| format!("data.{n}"))
        .collect::<Vec<_>>()
        .join(", ");
    let set_list = names
        .iter()
        .map(|n| format!("{n} = ?"))
        .collect::<Vec<_>>()
        .join(", ");

    e.line(&format!("const {name}Model = {{"));
    e.indented(|e| {
        e.line(&format!("table: {},", js_string(&table)));
        e.line(&format!(
            "create(data) {{ return __db.query(`INSERT INTO {table} ({cols}) VALUES ({placeholders}) RETURNING *`).get({data_refs}); }},"
        ));
        e.line(&format!(
            "find(id) {{ return __db.query(`SELECT * FROM {table} WHERE id = ?`).get(id); }},"
        ));
        e.line(&format!(
            "all() {{ return __db.query(`SELECT * FROM {table}`).all(); }},"
        ));
        e.line(&format!(
            "where(column, value) {{ return __db.query(`SELECT * FROM {table} WHERE ${{column}} = ?`).all(value); }},"
        ));
        e.line(&format!(
            "update(id, data) {{ return __db.query(`UPDATE {table} SET {set_list} WHERE id = ? RETURNING *`).get({data_refs}, id); }},"
        ));
        e.line(&format!(
            "delete(id) {{ return __db.query(`DELETE FROM {table} WHERE id = ?`).run(id); }},"
        ));
    });
    e.line("};");
    e.declare(&format!("{name}Model"));
}

fn sql_type(ty: &Type) -> &'static str {
    match ty {
        Type::Primitive(name) if name == "Int" => "INTEGER",
        Type::Primitive(name) if name == "Float" => "REAL",
        Type::Primitive(name) if name == "Bool" => "INTEGER",
        _ => "TEXT",
    }
}
