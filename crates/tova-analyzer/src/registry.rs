//! Type registry: the analyzer side table of declared types, impl
//! methods and trait signatures, keyed by name.
//!
//! Exhaustiveness checking, IDE completion and the codegen's model/ORM
//! emission all read from this table. Keeping it name-indexed (rather
//! than wiring back-pointers into the AST) keeps the AST cycle-free.

use rustc_hash::FxHashMap;

use crate::ty::Type;

/// A method signature recorded for an impl or trait.
#[derive(Debug, Clone)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<String>,
    pub return_type: Option<Type>,
}

/// Declared types, impl methods and trait methods.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    /// `type` declarations: name -> resolved Record/Adt type.
    pub types: FxHashMap<String, Type>,
    /// `impl` blocks: type name -> methods.
    pub impls: FxHashMap<String, Vec<MethodSig>>,
    /// `trait` declarations: trait name -> required methods.
    pub traits: FxHashMap<String, Vec<MethodSig>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variant names of a declared or built-in sum type, if `name`
    /// refers to one. `Option` and `Result` are built in.
    pub fn variants_of(&self, name: &str) -> Option<Vec<String>> {
        match name {
            "Option" => return Some(vec!["Some".into(), "None".into()]),
            "Result" => return Some(vec!["Ok".into(), "Err".into()]),
            _ => {}
        }
        match self.types.get(name) {
            Some(Type::Adt { variants, .. }) => {
                Some(variants.iter().map(|(v, _)| v.clone()).collect())
            }
            _ => None,
        }
    }

    /// The sum type (if any) that declares `variant`.
    pub fn adt_of_variant(&self, variant: &str) -> Option<&str> {
        match variant {
            "Some" | "None" => return Some("Option"),
            "Ok" | "Err" => return Some("Result"),
            _ => {}
        }
        for (name, ty) in &self.types {
            if let Type::Adt { variants, .. } = ty {
                if variants.iter().any(|(v, _)| v == variant) {
                    return Some(name);
                }
            }
        }
        None
    }

    /// Record fields of a declared product type, for model/ORM emission.
    pub fn fields_of(&self, name: &str) -> Option<&[(String, Type)]> {
        match self.types.get(name) {
            Some(Type::Record { fields, .. }) => Some(fields),
            _ => None,
        }
    }

    pub fn methods_of(&self, type_name: &str) -> &[MethodSig] {
        self.impls
            .get(type_name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sum_types() {
        let reg = TypeRegistry::new();
        assert_eq!(
            reg.variants_of("Option"),
            Some(vec!["Some".to_string(), "None".to_string()])
        );
        assert_eq!(reg.adt_of_variant("Err"), Some("Result"));
        assert_eq!(reg.variants_of("Int"), None);
    }

    #[test]
    fn declared_adt_lookup() {
        let mut reg = TypeRegistry::new();
        reg.types.insert(
            "Shape".into(),
            Type::Adt {
                name: "Shape".into(),
                type_params: vec![],
                variants: vec![
                    ("Circle".into(), vec![("radius".into(), Type::float())]),
                    ("Point".into(), vec![]),
                ],
            },
        );
        assert_eq!(
            reg.variants_of("Shape"),
            Some(vec!["Circle".to_string(), "Point".to_string()])
        );
        assert_eq!(reg.adt_of_variant("Circle"), Some("Shape"));
    }
}
