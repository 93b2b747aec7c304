//! Template parsing, placeholder resolution and expansion.

pub mod commands;
pub mod date;
pub mod engine;
pub mod parser;
pub mod resolver;

pub use commands::Command;
pub use engine::TemplateEngine;
pub use parser::{split_segments, Occurrence, Segment, Syntax};
