//! # Paperclip Source Tree Model
//!
//! Immutable definitions of the declarative component document: modules,
//! components, elements, text, variants and overrides. Produced by an external
//! parser (usually as JSON) and consumed by `paperclip-evaluator`.

pub mod ast;

pub use ast::*;
