use serde_json::{json, Value};

use super::report::{Section, ValidationReport};
use super::rule::ObjectRule;

/// Per-endpoint rules grouped by request section. Undeclared sections are never checked.
#[derive(Debug, Clone, Default)]
pub struct RequestSchema {
    body: Option<ObjectRule>,
    params: Option<ObjectRule>,
    query: Option<ObjectRule>,
}

/// The three request sections as JSON, ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestData {
    pub body: Value,
    pub params: Value,
    pub query: Value,
}

impl Default for RequestData {
    fn default() -> Self {
        Self {
            body: json!({}),
            params: json!({}),
            query: json!({}),
        }
    }
}

impl RequestData {
    pub fn section(&self, section: Section) -> &Value {
        match section {
            Section::Body => &self.body,
            Section::Params => &self.params,
            Section::Query => &self.query,
        }
    }
}

impl RequestSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, rule: ObjectRule) -> Self {
        self.body = Some(rule);
        self
    }

    pub fn params(mut self, rule: ObjectRule) -> Self {
        self.params = Some(rule);
        self
    }

    pub fn query(mut self, rule: ObjectRule) -> Self {
        self.query = Some(rule);
        self
    }

    pub fn section(&self, section: Section) -> Option<&ObjectRule> {
        match section {
            Section::Body => self.body.as_ref(),
            Section::Params => self.params.as_ref(),
            Section::Query => self.query.as_ref(),
        }
    }

    pub fn declares(&self, section: Section) -> bool {
        self.section(section).is_some()
    }

    /// Evaluate every declared section; violations keep section-then-field order.
    pub fn validate(&self, data: &RequestData) -> ValidationReport {
        let mut report = ValidationReport::new();
        for section in Section::ALL {
            if let Some(rule) = self.section(section) {
                report.extend(rule.evaluate(data.section(section), section));
            }
        }
        report
    }
}
