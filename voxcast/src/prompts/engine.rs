//! Template rendering engine using minijinja (Jinja2-compatible).
//!
//! Placeholders use the `{{ name }}` syntax. Undefined variables are a hard
//! error, so a template that names a parameter the caller never supplied fails
//! at render time instead of leaking an empty string into the prompt.

use std::collections::BTreeMap;

use minijinja::{Environment, ErrorKind, UndefinedBehavior, Value};

/// Named parameters for a template render.
///
/// # Example
///
/// ```rust,ignore
/// let ctx = TemplateContext::new()
///     .with_var("user_query", "AI in todays world")
///     .with_var("num_speakers", 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: BTreeMap<String, Value>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable to the context.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Number of variables set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variables are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn to_value(&self) -> Value {
        Value::from_serialize(&self.vars)
    }
}

/// Jinja2-compatible template rendering engine.
#[derive(Debug, Clone)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    /// Create a new template engine with strict undefined handling.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(false);
        env.set_lstrip_blocks(false);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns an error if the template syntax is invalid or a placeholder has
    /// no value in `context`.
    pub fn render(&self, template: &str, context: &TemplateContext) -> Result<String, RenderError> {
        self.env
            .render_str(template, context.to_value())
            .map_err(|e| match e.kind() {
                ErrorKind::SyntaxError | ErrorKind::BadEscape => RenderError::Template(e.to_string()),
                _ => RenderError::Render(e.to_string()),
            })
    }
}

/// Error type for template rendering operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    /// Template parsing/compilation error.
    #[error("Template error: {0}")]
    Template(String),
    /// Runtime rendering error, including missing parameters.
    #[error("Render error: {0}")]
    Render(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_render() {
        let engine = PromptEngine::new();
        let ctx = TemplateContext::new().with_var("user_query", "why is the sky blue");

        let result = engine
            .render("Answer this user query : {{ user_query }}", &ctx)
            .expect("render should succeed");
        assert_eq!(result, "Answer this user query : why is the sky blue");
    }

    #[test]
    fn test_numbers_render_plainly() {
        let engine = PromptEngine::new();
        let ctx = TemplateContext::new()
            .with_var("male_count", 1)
            .with_var("female_count", 2);

        let result = engine
            .render("{{ male_count }} male and {{ female_count }} female", &ctx)
            .expect("render should succeed");
        assert_eq!(result, "1 male and 2 female");
    }

    #[test]
    fn test_missing_placeholder_fails() {
        let engine = PromptEngine::new();
        let ctx = TemplateContext::new().with_var("user_query", "x");

        let err = engine
            .render("{{ user_query }} with {{ num_speakers }}", &ctx)
            .expect_err("undefined variable must fail");
        assert!(matches!(err, RenderError::Render(_)));
    }

    #[test]
    fn test_single_braces_are_literal() {
        let engine = PromptEngine::new();
        let ctx = TemplateContext::new().with_var("id", "S1");

        let result = engine
            .render(r#"{"id": "{{ id }}"}"#, &ctx)
            .expect("render should succeed");
        assert_eq!(result, r#"{"id": "S1"}"#);
    }

    #[test]
    fn test_syntax_error() {
        let engine = PromptEngine::new();
        let err = engine
            .render("{% if %}", &TemplateContext::new())
            .expect_err("bad syntax must fail");
        assert!(matches!(err, RenderError::Template(_)));
    }
}
