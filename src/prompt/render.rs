//! Prompt Renderer - Render templates with context variables using Handlebars
//!
//! Substitutes pipeline state fields into the stage templates. Output is never
//! HTML-escaped since it goes to a model, not a browser.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{Result, SdrError};

/// Renders prompt templates using Handlebars templating
pub(crate) struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl PromptRenderer {
    /// Create a new PromptRenderer with default settings
    pub(crate) fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Register a named template for later use
    pub(crate) fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| SdrError::Template(format!("Failed to register template '{}': {}", name, e)))
    }

    /// Render a previously registered template
    pub(crate) fn render_named<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(name, context)
            .map_err(|e| SdrError::Template(format!("Failed to render template '{}': {}", name, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, context: &serde_json::Value) -> String {
        let mut renderer = PromptRenderer::new();
        renderer.register_template("t", template).unwrap();
        renderer.render_named("t", context).unwrap()
    }

    #[test]
    fn test_render_simple() {
        assert_eq!(render("Hello, {{name}}!", &json!({ "name": "World" })), "Hello, World!");
    }

    #[test]
    fn test_render_missing_variable_empty_string() {
        assert_eq!(render("Hello, {{name}}!", &json!({})), "Hello, !");
    }

    #[test]
    fn test_render_no_escape_html() {
        let result = render(
            "Layer: {{code}}",
            &json!({ "code": "<script>window.digitalData = {};</script>" }),
        );
        assert_eq!(result, "Layer: <script>window.digitalData = {};</script>");
    }

    #[test]
    fn test_value_with_braces_is_not_reinterpreted() {
        let result = render("DOC:\n{{doc}}", &json!({ "doc": "{{not_a_variable}} {\"a\": 1}" }));
        assert_eq!(result, "DOC:\n{{not_a_variable}} {\"a\": 1}");
    }

    #[test]
    fn test_render_named_with_struct_context() {
        #[derive(Serialize)]
        struct Context {
            analysis: String,
            discovery_content: String,
        }

        let mut renderer = PromptRenderer::new();
        renderer
            .register_template("reasoning", "{{analysis}} / {{discovery_content}}")
            .unwrap();
        let context = Context {
            analysis: "KPIs: conversion".to_string(),
            discovery_content: "ShopKorea".to_string(),
        };

        let result = renderer.render_named("reasoning", &context).unwrap();
        assert_eq!(result, "KPIs: conversion / ShopKorea");
    }

    #[test]
    fn test_register_invalid_template() {
        let mut renderer = PromptRenderer::new();
        let result = renderer.register_template("broken", "{{#if x}}never closed");
        assert!(matches!(result, Err(SdrError::Template(_))));
    }

    #[test]
    fn test_render_named_not_found() {
        let renderer = PromptRenderer::new();
        let result = renderer.render_named("nonexistent", &json!({}));
        assert!(matches!(result, Err(SdrError::Template(_))));
    }

    #[test]
    fn test_render_preserves_whitespace() {
        assert_eq!(
            render("Line 1\n\nLine 3\n\n\nLine 6", &json!({})),
            "Line 1\n\nLine 3\n\n\nLine 6"
        );
    }
}
