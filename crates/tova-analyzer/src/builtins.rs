//! Built-in function signatures and the host-global whitelist.
//!
//! Builtins are checked by signature (arg-count bounds plus return type)
//! without being materialized as scope symbols. The whitelist suppresses
//! unresolved-identifier warnings for JS/DOM globals that emitted code
//! legitimately references.

use crate::ty::Type;

/// (min_args, max_args, return type). `usize::MAX` means variadic.
pub fn builtin_signature(name: &str) -> Option<(usize, usize, Type)> {
    let many = usize::MAX;
    let sig = match name {
        "len" => (1, 1, Type::int()),
        "type_of" => (1, 1, Type::string()),
        "random" => (0, 0, Type::float()),
        "print" => (0, many, Type::Nil),
        "log" => (0, many, Type::Nil),
        "push" => (2, many, Type::Nil),
        "pop" => (1, 1, Type::Unknown),
        "keys" => (1, 1, Type::Array(Box::new(Type::string()))),
        "values" => (1, 1, Type::Array(Box::new(Type::Unknown))),
        "str" => (1, 1, Type::string()),
        "int" => (1, 1, Type::int()),
        "float" => (1, 1, Type::float()),
        "abs" => (1, 1, Type::float()),
        "min" => (1, many, Type::Unknown),
        "max" => (1, many, Type::Unknown),
        "round" => (1, 1, Type::int()),
        "floor" => (1, 1, Type::int()),
        "ceil" => (1, 1, Type::int()),
        "sqrt" => (1, 1, Type::float()),
        "range" => (1, 3, Type::Array(Box::new(Type::int()))),
        "join" => (1, 2, Type::string()),
        "split" => (2, 2, Type::Array(Box::new(Type::string()))),
        "trim" => (1, 1, Type::string()),
        "upper" => (1, 1, Type::string()),
        "lower" => (1, 1, Type::string()),
        "contains" => (2, 2, Type::bool()),
        "sort" => (1, 2, Type::Array(Box::new(Type::Unknown))),
        "reverse" => (1, 1, Type::Unknown),
        "sleep" => (1, 1, Type::Nil),
        "now" => (0, 0, Type::int()),
        "json_stringify" => (1, 1, Type::string()),
        "json_parse" => (1, 1, Type::Unknown),
        // Server response helpers (contracts of the emitted runtime).
        "respond" => (1, 2, Type::Unknown),
        "redirect" => (1, 2, Type::Unknown),
        "set_cookie" => (2, 3, Type::Unknown),
        "html" => (1, 1, Type::Unknown),
        "text" => (1, 1, Type::Unknown),
        "with_headers" => (2, 2, Type::Unknown),
        "stream" => (1, 1, Type::Unknown),
        "send" => (1, 2, Type::Nil),
        "broadcast" => (1, 2, Type::Nil),
        "join_room" => (2, 2, Type::Nil),
        "leave_room" => (2, 2, Type::Nil),
        "enqueue" => (1, many, Type::Nil),
        "with_lock" => (2, 2, Type::Unknown),
        _ => return None,
    };
    Some(sig)
}

/// JS/DOM globals that emitted code references; unresolved-identifier
/// warnings are suppressed for these.
pub fn is_whitelisted_global(name: &str) -> bool {
    matches!(
        name,
        "console"
            | "fetch"
            | "JSON"
            | "Math"
            | "Date"
            | "document"
            | "window"
            | "navigator"
            | "location"
            | "localStorage"
            | "sessionStorage"
            | "setTimeout"
            | "setInterval"
            | "clearTimeout"
            | "clearInterval"
            | "requestAnimationFrame"
            | "Response"
            | "Request"
            | "Headers"
            | "URL"
            | "URLSearchParams"
            | "FormData"
            | "WebSocket"
            | "Promise"
            | "Object"
            | "Array"
            | "String"
            | "Number"
            | "Boolean"
            | "Error"
            | "RegExp"
            | "Map"
            | "Set"
            | "Symbol"
            | "parseInt"
            | "parseFloat"
            | "isNaN"
            | "alert"
            | "crypto"
            | "process"
            | "Bun"
            | "req"
            | "ws"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_builtins_present() {
        assert_eq!(builtin_signature("len").map(|(_, _, t)| t), Some(Type::int()));
        assert_eq!(
            builtin_signature("type_of").map(|(_, _, t)| t),
            Some(Type::string())
        );
        assert_eq!(
            builtin_signature("random").map(|(_, _, t)| t),
            Some(Type::float())
        );
        assert!(builtin_signature("definitely_not_a_builtin").is_none());
    }

    #[test]
    fn whitelist_covers_dom_globals() {
        assert!(is_whitelisted_global("console"));
        assert!(is_whitelisted_global("document"));
        assert!(!is_whitelisted_global("user_variable"));
    }
}
