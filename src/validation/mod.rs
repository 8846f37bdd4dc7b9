//! Declarative form validation: rules keyed by field name, form state with
//! touched tracking and submit gating.

mod form;
mod rules;

pub use form::{Form, SubmitOutcome};
pub use rules::{
    Constraint, CustomRule, FieldRules, Limit, NumberRules, Pattern, TextRules,
    DEFAULT_REQUIRED_MESSAGE,
};

use crate::config::{FieldDescriptor, FieldKind};
use crate::record::FieldValue;
use indexmap::IndexMap;

/// Rules for every validated field, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Validator {
    rules: IndexMap<String, FieldRules>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.rules.insert(name.into(), rules);
        self
    }

    /// Rules implied by field descriptors: `required` plus the kind's own
    /// limits. Fields with nothing to check get no entry.
    pub fn from_descriptors(fields: &[FieldDescriptor]) -> Self {
        let mut rules = IndexMap::new();
        for field in fields {
            let mut r = FieldRules::new();
            if field.required {
                r = r.required(DEFAULT_REQUIRED_MESSAGE);
            }
            match &field.kind {
                FieldKind::Text { rules: t } if !t.is_empty() => r = r.text(t.clone()),
                FieldKind::Number { rules: n } if !n.is_empty() => r = r.number(n.clone()),
                FieldKind::Date => {
                    r = r.custom(|v| {
                        let s = v.as_str()?;
                        chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                            .err()
                            .map(|_| "Fecha inválida (AAAA-MM-DD)".to_string())
                    })
                }
                _ => {}
            }
            if r.required.is_some() || r.constraint != Constraint::None || r.custom.is_some() {
                rules.insert(field.name.clone(), r);
            }
        }
        Validator { rules }
    }

    /// Overlay caller rules on top of these, field by field.
    pub fn merge(mut self, other: Validator) -> Self {
        for (name, over) in other.rules {
            match self.rules.get_mut(&name) {
                Some(base) => {
                    let b = std::mem::take(base);
                    *base = b.merge(over);
                }
                None => {
                    self.rules.insert(name, over);
                }
            }
        }
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.rules.keys()
    }

    pub fn get(&self, name: &str) -> Option<&FieldRules> {
        self.rules.get(name)
    }

    /// Error message for `value` under `name`'s rules; empty when valid or
    /// when the field has no rules.
    pub fn validate_field(&self, name: &str, value: &FieldValue) -> String {
        self.rules
            .get(name)
            .and_then(|r| r.check(value))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldDescriptor;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text("nombre", "Nombre").required(),
            FieldDescriptor::text("descripcion", "Descripción"),
            FieldDescriptor::date("fecha_inicio", "Fecha de inicio"),
            FieldDescriptor::boolean("activo", "Activo"),
        ]
    }

    #[test]
    fn descriptors_imply_required_and_date_rules() {
        let v = Validator::from_descriptors(&fields());
        let names: Vec<_> = v.names().map(String::as_str).collect();
        assert_eq!(names, vec!["nombre", "fecha_inicio"]);
        assert_eq!(v.validate_field("nombre", &FieldValue::Null), DEFAULT_REQUIRED_MESSAGE);
        assert_eq!(v.validate_field("fecha_inicio", &"2024-02-30".into()), "Fecha inválida (AAAA-MM-DD)");
        assert_eq!(v.validate_field("fecha_inicio", &"2024-02-29".into()), "");
        assert_eq!(v.validate_field("fecha_inicio", &"".into()), "");
        assert_eq!(v.validate_field("descripcion", &"".into()), "");
    }

    #[test]
    fn merge_overlays_caller_rules_in_place() {
        let extra = Validator::new()
            .rule(
                "nombre",
                FieldRules::new().text(TextRules::default().max_length(5, "Máximo 5")),
            )
            .rule("codigo", FieldRules::new().required("Código obligatorio"));
        let v = Validator::from_descriptors(&fields()).merge(extra);
        let names: Vec<_> = v.names().map(String::as_str).collect();
        assert_eq!(names, vec!["nombre", "fecha_inicio", "codigo"]);
        assert_eq!(v.validate_field("nombre", &"".into()), DEFAULT_REQUIRED_MESSAGE);
        assert_eq!(v.validate_field("nombre", &"Demasiado".into()), "Máximo 5");
        assert_eq!(v.validate_field("codigo", &FieldValue::Null), "Código obligatorio");
    }

    #[test]
    fn caller_custom_rule_keeps_the_date_check() {
        let extra = Validator::new().rule(
            "fecha_inicio",
            FieldRules::new().custom(|v| (v.as_str() < Some("2000-01-01")).then(|| "Demasiado antigua".to_string())),
        );
        let v = Validator::from_descriptors(&fields()).merge(extra);
        assert_eq!(v.validate_field("fecha_inicio", &"2024-13-01".into()), "Fecha inválida (AAAA-MM-DD)");
        assert_eq!(v.validate_field("fecha_inicio", &"1999-05-01".into()), "Demasiado antigua");
        assert_eq!(v.validate_field("fecha_inicio", &"2024-05-01".into()), "");
    }

    #[test]
    fn unknown_fields_are_always_valid() {
        assert_eq!(Validator::new().validate_field("x", &FieldValue::Null), "");
    }
}
