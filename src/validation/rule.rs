use regex::Regex;
use serde_json::{Map, Value};

use super::report::{PathSegment, Section, Violation};

/// Value shape a field must have before any other check runs.
#[derive(Debug, Clone)]
pub enum Kind {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<FieldRule>),
}

/// A single constraint evaluated once the kind matches.
#[derive(Debug, Clone)]
pub enum Check {
    /// Characters for strings, items for arrays.
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    Email,
    Pattern { regex: Regex, name: Option<&'static str> },
    OneOf(Vec<String>),
}

/// Declarative rule for one field. Immutable once built; evaluation never mutates input.
#[derive(Debug, Clone)]
pub struct FieldRule {
    kind: Kind,
    required: bool,
    checks: Vec<Check>,
}

static EMAIL: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

impl FieldRule {
    fn of(kind: Kind) -> Self {
        Self {
            kind,
            required: false,
            checks: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(Kind::String)
    }

    pub fn number() -> Self {
        Self::of(Kind::Number)
    }

    pub fn integer() -> Self {
        Self::of(Kind::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    pub fn array(items: FieldRule) -> Self {
        Self::of(Kind::Array(Box::new(items)))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.checks.push(Check::MinLength(n));
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.checks.push(Check::MaxLength(n));
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.checks.push(Check::Min(n));
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.checks.push(Check::Max(n));
        self
    }

    pub fn email(mut self) -> Self {
        self.checks.push(Check::Email);
        self
    }

    pub fn pattern(mut self, regex: Regex) -> Self {
        self.checks.push(Check::Pattern { regex, name: None });
        self
    }

    pub fn named_pattern(mut self, regex: Regex, name: &'static str) -> Self {
        self.checks.push(Check::Pattern { regex, name: Some(name) });
        self
    }

    pub fn one_of<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checks.push(Check::OneOf(allowed.into_iter().map(Into::into).collect()));
        self
    }

    /// Evaluate `value` (None when the key is absent), appending every violation to `out`.
    pub fn evaluate(&self, value: Option<&Value>, section: Section, path: &[PathSegment], out: &mut Vec<Violation>) {
        let label = label(path);
        let violation = |rule: &'static str, message: String| Violation {
            section,
            path: path.to_vec(),
            message,
            rule,
        };

        let value = match value {
            Some(v) => v,
            None => {
                if self.required {
                    out.push(violation("any.required", format!("\"{}\" is required", label)));
                }
                return;
            }
        };

        match &self.kind {
            Kind::String => {
                let Some(s) = value.as_str() else {
                    out.push(violation("string.base", format!("\"{}\" must be a string", label)));
                    return;
                };
                if s.is_empty() {
                    out.push(violation("string.empty", format!("\"{}\" is not allowed to be empty", label)));
                    return;
                }
                let len = s.chars().count();
                for check in &self.checks {
                    match check {
                        Check::MinLength(n) if len < *n => out.push(violation(
                            "string.min",
                            format!("\"{}\" length must be at least {} characters long", label, n),
                        )),
                        Check::MaxLength(n) if len > *n => out.push(violation(
                            "string.max",
                            format!("\"{}\" length must be less than or equal to {} characters long", label, n),
                        )),
                        Check::Email if !EMAIL.is_match(s) => {
                            out.push(violation("string.email", format!("\"{}\" must be a valid email", label)))
                        }
                        Check::Pattern { regex, name } if !regex.is_match(s) => match name {
                            Some(name) => out.push(violation(
                                "string.pattern.name",
                                format!("\"{}\" with value \"{}\" fails to match the {} pattern", label, s, name),
                            )),
                            None => out.push(violation(
                                "string.pattern.base",
                                format!(
                                    "\"{}\" with value \"{}\" fails to match the required pattern: /{}/",
                                    label,
                                    s,
                                    regex.as_str()
                                ),
                            )),
                        },
                        Check::OneOf(allowed) if !allowed.iter().any(|a| a == s) => {
                            out.push(violation("any.only", one_of_message(&label, allowed)))
                        }
                        _ => {}
                    }
                }
            }
            Kind::Number | Kind::Integer => {
                let Some(n) = as_number(value, section) else {
                    out.push(violation("number.base", format!("\"{}\" must be a number", label)));
                    return;
                };
                if matches!(self.kind, Kind::Integer) && n.fract() != 0.0 {
                    out.push(violation("number.integer", format!("\"{}\" must be an integer", label)));
                }
                for check in &self.checks {
                    match check {
                        Check::Min(min) if n < *min => out.push(violation(
                            "number.min",
                            format!("\"{}\" must be greater than or equal to {}", label, min),
                        )),
                        Check::Max(max) if n > *max => out.push(violation(
                            "number.max",
                            format!("\"{}\" must be less than or equal to {}", label, max),
                        )),
                        Check::OneOf(allowed) if !allowed.iter().any(|a| a.parse::<f64>().ok() == Some(n)) => {
                            out.push(violation("any.only", one_of_message(&label, allowed)))
                        }
                        _ => {}
                    }
                }
            }
            Kind::Boolean => {
                if as_bool(value, section).is_none() {
                    out.push(violation("boolean.base", format!("\"{}\" must be a boolean", label)));
                }
            }
            Kind::Array(items) => {
                let Some(elements) = value.as_array() else {
                    out.push(violation("array.base", format!("\"{}\" must be an array", label)));
                    return;
                };
                for check in &self.checks {
                    match check {
                        Check::MinLength(n) if elements.len() < *n => out.push(violation(
                            "array.min",
                            format!("\"{}\" must contain at least {} items", label, n),
                        )),
                        Check::MaxLength(n) if elements.len() > *n => out.push(violation(
                            "array.max",
                            format!("\"{}\" must contain less than or equal to {} items", label, n),
                        )),
                        _ => {}
                    }
                }
                for (index, element) in elements.iter().enumerate() {
                    let mut item_path = path.to_vec();
                    item_path.push(PathSegment::Index(index));
                    items.evaluate(Some(element), section, &item_path, out);
                }
            }
        }
    }
}

/// Ordered set of named field rules for one request section.
#[derive(Debug, Clone, Default)]
pub struct ObjectRule {
    fields: Vec<(String, FieldRule)>,
    allow_unknown: bool,
}

impl ObjectRule {
    /// An object rule with no keys. Unknown keys are rejected unless `allow_unknown` is called.
    pub fn keys() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) the rule for `name`.
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = rule,
            None => self.fields.push((name, rule)),
        }
        self
    }

    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Every violation for `value` in field declaration order, unknown keys last.
    pub fn evaluate(&self, value: &Value, section: Section) -> Vec<Violation> {
        let mut out = Vec::new();

        let Some(object) = value.as_object() else {
            out.push(Violation {
                section,
                path: Vec::new(),
                message: "\"value\" must be of type object".to_string(),
                rule: "object.base",
            });
            return out;
        };

        for (name, rule) in &self.fields {
            rule.evaluate(object.get(name), section, &[PathSegment::Key(name.clone())], &mut out);
        }

        if !self.allow_unknown {
            self.collect_unknown(object, section, &mut out);
        }

        out
    }

    fn collect_unknown(&self, object: &Map<String, Value>, section: Section, out: &mut Vec<Violation>) {
        for key in object.keys() {
            if !self.fields.iter().any(|(name, _)| name == key) {
                out.push(Violation {
                    section,
                    path: vec![PathSegment::Key(key.clone())],
                    message: format!("\"{}\" is not allowed", key),
                    rule: "object.unknown",
                });
            }
        }
    }
}

fn label(path: &[PathSegment]) -> String {
    let mut label = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !label.is_empty() {
                    label.push('.');
                }
                label.push_str(key);
            }
            PathSegment::Index(index) => label.push_str(&format!("[{}]", index)),
        }
    }
    if label.is_empty() {
        label.push_str("value");
    }
    label
}

fn one_of_message(label: &str, allowed: &[String]) -> String {
    format!("\"{}\" must be one of [{}]", label, allowed.join(", "))
}

// Params and query only carry strings, so numbers and booleans are parsed from
// text there. Bodies must use real JSON types.
fn as_number(value: &Value, section: Section) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if section != Section::Body => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn as_bool(value: &Value, section: Section) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if section != Section::Body && s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if section != Section::Body && s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
