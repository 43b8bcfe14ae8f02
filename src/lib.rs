// Pedantic lint configuration for the crate.
// Most of these are reasonable but too strict for this codebase:
// - cast_possible_truncation: Byte offsets of source files fit u32/usize
// - missing_errors_doc: Error handling is self-evident from Result types
// - missing_panics_doc: Panics are rare and documented inline
// - too_many_lines: Orchestrator pipelines need cohesive logic
// - similar_names: Variable naming is contextually clear
// - option_if_let_else: if-let is often clearer
// - needless_pass_by_value: Sometimes clearer semantically
// - single_match_else: match is clearer than if-let for pattern matching
// - module_name_repetitions: Public types read better fully qualified
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::option_if_let_else,
    clippy::needless_pass_by_value,
    clippy::single_match_else,
    clippy::module_name_repetitions
)]

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod edit;
pub mod engine;
pub mod error;
pub mod freetext;
pub mod model;
pub mod ops;
pub mod parse;
pub mod project;
pub mod refs;
pub mod resolve;
