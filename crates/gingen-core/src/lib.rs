//! Core library for gingen.
//!
//! gingen consumes `.gin` template files describing HTTP APIs (data types,
//! services, route groups, methods, middleware) and emits Go source files
//! wiring those APIs into a Kratos application served by Gin. The pipeline
//! is a single-threaded batch: parse the template into an immutable model,
//! resolve output paths from the model and the working directory, then drive
//! the emission templates.

pub mod error;
pub mod formatter;
pub mod generator;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod scaffold;
pub mod util;

pub use crate::{
    error::{Error, Result},
    generator::CodeGenerator,
    model::GinTemplate,
    parser::parse_gin_template,
    resolver::{resolve, ResolvedPaths},
};
