//! Prompt System - Stage templates, overrides and rendering
//!
//! This module provides the built-in stage templates, loading of template
//! overrides from a directory, and rendering with Handlebars.

mod loader;
mod render;
mod templates;

pub use templates::{PromptKind, PromptSet};
