pub mod auth;
pub mod validate;

pub use auth::{auth_gate, authenticate, Principal};
pub use validate::{validation_gate, ValidationGate};
