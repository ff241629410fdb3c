//! Deploy profile emission.
//!
//! Deploy blocks are not compiled to JavaScript: each profile becomes a
//! structured record keyed by name, written to `tova.deploy.json`.
//! Validation (required `server` and `domain` keys) happens in the
//! analyzer before codegen runs.

use serde_json::{Map, Value};
use tova_parser::ast::*;

/// Build the deploy record for every profile in the program.
pub fn deploy_record(profiles: &[(String, Vec<ConfigEntry>)]) -> Value {
    let mut out = Map::new();
    for (name, entries) in profiles {
        out.insert(name.clone(), entries_json(entries));
    }
    Value::Object(out)
}

fn entries_json(entries: &[ConfigEntry]) -> Value {
    let mut out = Map::new();
    for entry in entries {
        let value = match &entry.value {
            ConfigValue::Expr(expr) => expr_json(expr),
            ConfigValue::Block(nested) => entries_json(nested),
        };
        out.insert(entry.key.clone(), value);
    }
    Value::Object(out)
}

/// Literal config expressions map onto JSON directly; anything else is
/// recorded as its identifier/rendered text.
fn expr_json(expr: &Expr) -> Value {
    match &expr.kind {
        ExprKind::Int(v) => Value::from(*v),
        ExprKind::Float(v) => Value::from(*v),
        ExprKind::Str(s) => Value::from(s.clone()),
        ExprKind::Bool(b) => Value::from(*b),
        ExprKind::Nil => Value::Null,
        ExprKind::Ident(name) => Value::from(name.clone()),
        ExprKind::Array(elems) => Value::Array(elems.iter().map(expr_json).collect()),
        ExprKind::Object(entries) => {
            let mut out = Map::new();
            for entry in entries {
                match entry {
                    ObjectEntry::Pair { key, value } => {
                        out.insert(key.clone(), expr_json(value));
                    }
                    ObjectEntry::Shorthand(name) => {
                        out.insert(name.clone(), Value::from(name.clone()));
                    }
                    ObjectEntry::Spread(_) => {}
                }
            }
            Value::Object(out)
        }
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles_of(source: &str) -> Vec<(String, Vec<ConfigEntry>)> {
        let parse = tova_parser::parse(source).expect("parse failure");
        parse
            .program
            .stmts
            .into_iter()
            .filter_map(|s| match s.kind {
                StmtKind::DeployProfile { name, entries } => Some((name, entries)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn profile_becomes_structured_record() {
        let src = "deploy \"prod\" {\n  server: \"api\"\n  domain: \"x.com\"\n  instances: 3\n  db {\n    postgres {\n      size: \"small\"\n    }\n    redis {\n    }\n  }\n}";
        let record = deploy_record(&profiles_of(src));
        assert_eq!(record["prod"]["server"], "api");
        assert_eq!(record["prod"]["domain"], "x.com");
        assert_eq!(record["prod"]["instances"], 3);
        assert_eq!(record["prod"]["db"]["postgres"]["size"], "small");
        assert!(record["prod"]["db"]["redis"].is_object());
    }

    #[test]
    fn multiple_profiles_keyed_by_name() {
        let src = "deploy \"prod\" {\n  server: \"a\"\n  domain: \"x.com\"\n}\ndeploy \"staging\" {\n  server: \"a\"\n  domain: \"stage.x.com\"\n}";
        let record = deploy_record(&profiles_of(src));
        assert!(record.get("prod").is_some());
        assert_eq!(record["staging"]["domain"], "stage.x.com");
    }
}
