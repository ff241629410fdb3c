//! Form block emission.
//!
//! A `form` block compiles to an IIFE that builds a controller: per-field
//! `{ value(), error(), touched(), set(v), blur(), validate(), reset() }`
//! accessors, groups with `isValid`/`isDirty`, arrays with a monotonic
//! item `__id`, optional wizard steps, whole-form `values`/`isValid`/
//! `isDirty`, and a `submit()` that blurs everything, gates on validity
//! and runs the user block inside try/catch/finally while tracking
//! `submitting`, `submitError` and `submitCount`.

use tova_parser::ast::*;

use super::{js_string, Emitter};

/// Field/group/array factories embedded at the top of each form IIFE.
const FORM_PRELUDE: &str = r#"const __initial_of = (__rules) => (__rules.initial === undefined ? "" : __rules.initial);
const __makeField = (__name, __rules) => {
  const __init = __initial_of(__rules);
  const [__value, __setValue] = createSignal(__init);
  const [__error, __setError] = createSignal(null);
  const [__touched, __setTouched] = createSignal(false);
  const __validate = () => {
    const __v = __value();
    let __err = null;
    if (__rules.required && (__v === "" || __v == null)) __err = __name + " is required";
    else if (__rules.min_length != null && String(__v).length < __rules.min_length) __err = __name + " is too short";
    else if (__rules.max_length != null && String(__v).length > __rules.max_length) __err = __name + " is too long";
    else if (__rules.pattern != null && !new RegExp(__rules.pattern).test(String(__v))) __err = __name + " is invalid";
    __setError(__err);
    return __err === null;
  };
  return {
    value: __value,
    error: __error,
    touched: __touched,
    set: (__v) => { __setValue(__v); if (__touched()) __validate(); },
    blur: () => { __setTouched(true); __validate(); },
    validate: __validate,
    reset: () => { __setValue(__init); __setError(null); __setTouched(false); },
    isDirty: () => __value() !== __init,
    __field: true,
  };
};
const __makeGroup = (__members) => ({
  ...__members,
  __members,
  isValid: () => Object.values(__members).every((__m) => __m.__field ? __m.validate() : __m.isValid()),
  isDirty: () => Object.values(__members).some((__m) => __m.isDirty()),
});
const __makeArray = (__makeItem) => {
  const [__items, __setItems] = createSignal([]);
  let __nextId = 1;
  return {
    get items() { return __items(); },
    get length() { return __items().length; },
    add(__defaults) {
      const __item = __makeItem();
      __item.__id = __nextId;
      __nextId = __nextId + 1;
      if (__defaults) {
        for (const __k of Object.keys(__defaults)) {
          if (__item[__k] && __item[__k].set) __item[__k].set(__defaults[__k]);
        }
      }
      __setItems([...__items(), __item]);
      return __item;
    },
    remove(__item) { __setItems(__items().filter((__x) => __x !== __item)); },
    move(__from, __to) {
      const __arr = [...__items()];
      const [__moved] = __arr.splice(__from, 1);
      __arr.splice(__to, 0, __moved);
      __setItems(__arr);
    },
    isValid: () => __items().every((__item) => Object.values(__item).every((__m) => __m && __m.__field ? __m.validate() : true)),
    isDirty: () => __items().length > 0,
    __array: true,
  };
};
const __eachField = (__node, __fn) => {
  if (!__node || typeof __node !== "object") return;
  if (__node.__field) { __fn(__node); return; }
  if (__node.__array) { __node.items.forEach((__item) => Object.values(__item).forEach((__m) => __eachField(__m, __fn))); return; }
  if (__node.__members) { Object.values(__node.__members).forEach((__m) => __eachField(__m, __fn)); }
};"#;

pub fn emit_form(e: &mut Emitter, form: &FormDecl) {
    e.line(&format!("const {} = (() => {{", form.name));
    e.indented(|em| {
        for line in FORM_PRELUDE.lines() {
            em.line(line);
        }
        em.blank();

        // Top-level members, in declaration order.
        let mut top_names: Vec<String> = Vec::new();
        let mut steps: Option<&Vec<FormStep>> = None;
        let mut on_submit: Option<&Block> = None;
        for member in &form.members {
            match member {
                FormMember::Field { name, ty: _, rules } => {
                    let rules_js = rules_object(em, rules);
                    em.line(&format!(
                        "const {name} = __makeField({}, {rules_js});",
                        js_string(name)
                    ));
                    top_names.push(name.clone());
                }
                FormMember::Group { name, members } => {
                    let inner = group_members_js(em, members);
                    em.line(&format!("const {name} = __makeGroup({inner});"));
                    top_names.push(name.clone());
                }
                FormMember::Array { name, members } => {
                    let inner = group_members_js(em, members);
                    em.line(&format!("const {name} = __makeArray(() => ({inner}));"));
                    top_names.push(name.clone());
                }
                FormMember::Steps(s) => steps = Some(s),
                FormMember::OnSubmit(body) => on_submit = Some(body),
            }
        }
        em.blank();

        em.line("const [__submitting, __setSubmitting] = createSignal(false);");
        em.line("const [__submitError, __setSubmitError] = createSignal(null);");
        em.line("const [__submitCount, __setSubmitCount] = createSignal(0);");

        if let Some(steps) = steps {
            em.line("const [__step, __setStep] = createSignal(0);");
            let entries: Vec<String> = steps
                .iter()
                .map(|s| {
                    let members: Vec<String> =
                        s.fields.iter().map(|f| js_string(f)).collect();
                    format!(
                        "{{ name: {}, members: [{}] }}",
                        js_string(&s.name),
                        members.join(", ")
                    )
                })
                .collect();
            em.line(&format!("const __steps = [{}];", entries.join(", ")));
        }

        let member_list = top_names.join(", ");
        em.line(&format!("const __top = [{member_list}];"));
        em.blank();

        // The values getter mirrors the form's structure.
        em.line("const __controller = {");
        em.indented(|em| {
            for name in &top_names {
                em.line(&format!("{name},"));
            }
            em.line("get values() {");
            em.indented(|em| {
                em.line("return {");
                em.indented(|em| {
                    for member in &form.members {
                        if let Some(line) = value_entry_js(member) {
                            em.line(&line);
                        }
                    }
                });
                em.line("};");
            });
            em.line("},");
            em.line("isValid: () => __top.every((__m) => __m.__field ? __m.validate() : __m.isValid()),");
            em.line("isDirty: () => __top.some((__m) => __m.isDirty()),");
            em.line("submitting: __submitting,");
            em.line("submitError: __submitError,");
            em.line("submitCount: __submitCount,");
            if steps.is_some() {
                em.line("currentStep: () => __step(),");
                em.line("canPrev: () => __step() > 0,");
                em.line("canNext: () => {");
                em.indented(|em| {
                    em.line("if (__step() >= __steps.length - 1) return false;");
                    em.line("const __byName = { ");
                    em.indented(|em| {
                        for name in &top_names {
                            em.line(&format!("{}: {name},", js_string(name)));
                        }
                    });
                    em.line("};");
                    em.line("return __steps[__step()].members.every((__n) => {");
                    em.indented(|em| {
                        em.line("const __m = __byName[__n];");
                        em.line("return __m ? (__m.__field ? __m.validate() : __m.isValid()) : true;");
                    });
                    em.line("});");
                });
                em.line("},");
                em.line("progress: () => (__step() + 1) / __steps.length,");
                em.line("next() { if (this.canNext()) __setStep(__step() + 1); },");
                em.line("prev() { if (this.canPrev()) __setStep(__step() - 1); },");
            }
        });
        em.line("};");
        em.blank();

        // submit(): blur everything, gate on validity, run the user block.
        em.line("__controller.submit = async () => {");
        em.indented(|em| {
            em.line("__top.forEach((__m) => __eachField(__m, (__f) => __f.blur()));");
            em.line("if (!__controller.isValid()) return false;");
            em.line("__setSubmitting(true);");
            em.line("__setSubmitError(null);");
            em.line("__setSubmitCount(__submitCount() + 1);");
            em.line("try {");
            em.enter_js_scope();
            em.indented(|em| {
                em.line("const values = __controller.values;");
                em.declare("values");
                if let Some(body) = on_submit {
                    for stmt in &body.stmts {
                        em.stmt(stmt);
                    }
                }
            });
            em.exit_js_scope();
            em.line("} catch (__err) {");
            em.indented(|em| em.line("__setSubmitError(__err);"));
            em.line("} finally {");
            em.indented(|em| em.line("__setSubmitting(false);"));
            em.line("}");
            em.line("return true;");
        });
        em.line("};");
        em.line("return __controller;");
    });
    e.line("})();");
    e.declare(&form.name);
}

/// `{ required: true, min_length: 8 }` from a field's rule entries.
fn rules_object(e: &mut Emitter, rules: &[ConfigEntry]) -> String {
    let parts: Vec<String> = rules
        .iter()
        .filter_map(|rule| match &rule.value {
            ConfigValue::Expr(expr) => {
                let v = e.expr(expr);
                Some(format!("{}: {v}", rule.key))
            }
            ConfigValue::Block(_) => None,
        })
        .collect();
    format!("{{ {} }}", parts.join(", "))
}

/// Nested member map for groups and array item factories.
fn group_members_js(e: &mut Emitter, members: &[FormMember]) -> String {
    let parts: Vec<String> = members
        .iter()
        .filter_map(|member| match member {
            FormMember::Field { name, ty: _, rules } => {
                let rules_js = rules_object(e, rules);
                Some(format!(
                    "{name}: __makeField({}, {rules_js})",
                    js_string(name)
                ))
            }
            FormMember::Group { name, members } => {
                let inner = group_members_js(e, members);
                Some(format!("{name}: __makeGroup({inner})"))
            }
            FormMember::Array { name, members } => {
                let inner = group_members_js(e, members);
                Some(format!("{name}: __makeArray(() => ({inner}))"))
            }
            _ => None,
        })
        .collect();
    format!("{{ {} }}", parts.join(", "))
}

/// One line of the `values` getter for a top-level member.
fn value_entry_js(member: &FormMember) -> Option<String> {
    match member {
        FormMember::Field { name, .. } => Some(format!("{name}: {name}.value(),")),
        FormMember::Group { name, members } => {
            let inner: Vec<String> = members
                .iter()
                .filter_map(|m| match m {
                    FormMember::Field { name: f, .. } => {
                        Some(format!("{f}: {name}.{f}.value()"))
                    }
                    _ => None,
                })
                .collect();
            Some(format!("{name}: {{ {} }},", inner.join(", ")))
        }
        FormMember::Array { name, members } => {
            let inner: Vec<String> = members
                .iter()
                .filter_map(|m| match m {
                    FormMember::Field { name: f, .. } => {
                        Some(format!("{f}: __item.{f}.value()"))
                    }
                    _ => None,
                })
                .collect();
            Some(format!(
                "{name}: {name}.items.map((__item) => ({{ {} }})),",
                inner.join(", ")
            ))
        }
        _ => None,
    }
}
