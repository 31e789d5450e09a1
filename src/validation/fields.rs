use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::rule::FieldRule;

/// Named field rules shared across endpoint schemas.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: HashMap<&'static str, FieldRule>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(mut self, name: &'static str, rule: FieldRule) -> Self {
        self.fields.insert(name, rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields.get(name)
    }
}

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern compiles")
});

static GENERAL: Lazy<FieldRegistry> = Lazy::new(|| {
    FieldRegistry::new()
        .define("email", FieldRule::string().email().min_length(6).max_length(50).required())
        .define("password", FieldRule::string().min_length(8).required())
        .define("id", FieldRule::string().named_pattern(UUID.clone(), "uuid").required())
});

/// Registry of the general-purpose fields built at first use.
pub fn general() -> &'static FieldRegistry {
    &GENERAL
}

/// Owned copy of a general field, for composing into an endpoint schema.
///
/// Panics on an unknown name; schemas are assembled at startup from literal names.
pub fn general_field(name: &str) -> FieldRule {
    match general().get(name) {
        Some(rule) => rule.clone(),
        None => panic!("no general field named {name:?}"),
    }
}
