//! Runtime helper registry.
//!
//! The base emitter flags each helper it references; an output bundle
//! includes exactly the flagged helpers plus the fixed string-methods
//! shim. Helper names are stable keys shared between the emitter and the
//! tests.

/// Source text for a named helper. Order of emission follows
/// [`HELPER_ORDER`] so bundles are deterministic.
pub fn helper_source(name: &str) -> Option<&'static str> {
    let src = match name {
        "variants" => {
            r#"const Ok = (value) => ({ __tag: "Ok", value });
const Err = (value) => ({ __tag: "Err", value });
const Some = (value) => ({ __tag: "Some", value });
const None = { __tag: "None" };"#
        }
        "contains" => {
            r#"function __contains(coll, item) {
  if (coll == null) return false;
  if (Array.isArray(coll) || typeof coll === "string") return coll.includes(item);
  return Object.prototype.hasOwnProperty.call(coll, item);
}"#
        }
        "propagate" => {
            r#"function __propagate(v) {
  if (v && (v.__tag === "Err" || v.__tag === "None")) {
    const __e = new Error("propagated");
    __e.__tova_propagate = true;
    __e.value = v;
    throw __e;
  }
  if (v && (v.__tag === "Ok" || v.__tag === "Some")) return v.value;
  return v;
}"#
        }
        "coalesce" => "let __v;",
        "slice" => {
            r#"function __slice(seq, start, end, step) {
  const isStr = typeof seq === "string";
  const arr = isStr ? seq.split("") : seq;
  const n = arr.length;
  step = step == null ? 1 : step;
  let lo, hi;
  if (step > 0) {
    lo = start == null ? 0 : start < 0 ? Math.max(n + start, 0) : Math.min(start, n);
    hi = end == null ? n : end < 0 ? Math.max(n + end, 0) : Math.min(end, n);
  } else {
    lo = start == null ? n - 1 : start < 0 ? n + start : Math.min(start, n - 1);
    hi = end == null ? -1 : end < 0 ? n + end : end;
  }
  const out = [];
  if (step > 0) {
    for (let i = lo; i < hi; i += step) out.push(arr[i]);
  } else {
    for (let i = lo; i > hi; i += step) out.push(arr[i]);
  }
  return isStr ? out.join("") : out;
}"#
        }
        "range" => {
            r#"function __range(start, end, step) {
  step = step == null ? 1 : step;
  const out = [];
  if (step > 0) {
    for (let i = start; i < end; i += step) out.push(i);
  } else {
    for (let i = start; i > end; i += step) out.push(i);
  }
  return out;
}"#
        }
        "sleep" => {
            "function __sleep(ms) {\n  return new Promise((__res) => setTimeout(__res, ms));\n}"
        }
        _ => return None,
    };
    Some(src)
}

/// Emission order for helpers. `variants` first so `Ok`/`Err` are in
/// scope for everything else.
pub const HELPER_ORDER: [&str; 7] = [
    "variants",
    "contains",
    "propagate",
    "coalesce",
    "slice",
    "range",
    "sleep",
];

/// The fixed string-methods shim, always included in every bundle.
pub const STRING_SHIM: &str = r#"const __str = {
  capitalize: (s) => (s.length === 0 ? s : s[0].toUpperCase() + s.slice(1)),
  title: (s) => s.replace(/\b\w/g, (c) => c.toUpperCase()),
  snake_case: (s) => s.replace(/([a-z0-9])([A-Z])/g, "$1_$2").replace(/[\s-]+/g, "_").toLowerCase(),
  camel_case: (s) => s.replace(/[_\s-]+(\w)/g, (_, c) => c.toUpperCase()),
  pad_left: (s, n, c) => String(s).padStart(n, c ?? " "),
  pad_right: (s, n, c) => String(s).padEnd(n, c ?? " "),
};"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ordered_helper_has_source() {
        for name in HELPER_ORDER {
            assert!(helper_source(name).is_some(), "missing helper {name}");
        }
    }

    #[test]
    fn unknown_helper_is_none() {
        assert!(helper_source("nope").is_none());
    }

    #[test]
    fn variant_constructors_emit_discriminators() {
        let src = helper_source("variants").unwrap();
        for tag in ["\"Ok\"", "\"Err\"", "\"Some\"", "\"None\""] {
            assert!(src.contains(tag));
        }
    }
}
