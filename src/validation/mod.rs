//! Declarative request validation.
//!
//! Field rules are composed into per-section object rules, grouped into a
//! [`RequestSchema`] per endpoint, and evaluated without short-circuiting:
//! every violation across body, params and query ends up in one ordered
//! [`ValidationReport`].

pub mod fields;
pub mod report;
pub mod rule;
pub mod schema;

pub use fields::{general, general_field, FieldRegistry};
pub use report::{PathSegment, Section, ValidationReport, Violation};
pub use rule::{Check, FieldRule, Kind, ObjectRule};
pub use schema::{RequestData, RequestSchema};
