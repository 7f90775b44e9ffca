//! HTML template rendering.
//!
//! [`HtmlRenderer`] wraps a [`tera::Tera`] instance. Templates are loaded
//! while the engine is being configured and the renderer is then shared
//! read-only with every request context.

use serde::Serialize;
use tera::Tera;

use crate::error::{DraftError, DraftResult};

/// Template set used by [`Context::html`](crate::Context::html).
#[derive(Debug, Default)]
pub struct HtmlRenderer {
    tera: Tera,
}

impl HtmlRenderer {
    /// Creates a renderer with no templates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every template matching a glob such as `templates/**/*.html`.
    ///
    /// Filters registered earlier stay registered; templates with the same
    /// name are replaced.
    pub fn load_glob(&mut self, pattern: &str) -> DraftResult<()> {
        let loaded = Tera::new(pattern)?;
        self.tera.extend(&loaded)?;
        tracing::debug!(
            pattern,
            templates = self.tera.get_template_names().count(),
            "Loaded HTML templates"
        );
        Ok(())
    }

    /// Adds a single template from a string.
    pub fn add_raw_template(&mut self, name: &str, content: &str) -> DraftResult<()> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }

    /// Registers a filter callable from templates as `{{ value | name }}`.
    pub fn register_filter<F>(&mut self, name: &str, filter: F)
    where
        F: tera::Filter + 'static,
    {
        self.tera.register_filter(name, filter);
    }

    /// Returns true if a template with this name is loaded.
    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Returns the number of loaded templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tera.get_template_names().count()
    }

    /// Returns true if no templates are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders a template with data that serializes to a JSON object.
    pub fn render<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> DraftResult<String> {
        if self.is_empty() {
            return Err(DraftError::TemplatesNotLoaded);
        }
        let context = tera::Context::from_serialize(data)?;
        Ok(self.tera.render(name, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_render_raw_template() {
        let mut renderer = HtmlRenderer::new();
        renderer
            .add_raw_template("hello.html", "<p>Hello {{ name }}</p>")
            .unwrap();

        let html = renderer.render("hello.html", &json!({"name": "draft"})).unwrap();
        assert_eq!(html, "<p>Hello draft</p>");
        assert!(renderer.has_template("hello.html"));
        assert_eq!(renderer.len(), 1);
    }

    #[test]
    fn test_render_without_templates() {
        let renderer = HtmlRenderer::new();
        let err = renderer.render("missing.html", &json!({})).unwrap_err();
        assert!(matches!(err, DraftError::TemplatesNotLoaded));
    }

    #[test]
    fn test_render_unknown_template() {
        let mut renderer = HtmlRenderer::new();
        renderer.add_raw_template("a.html", "a").unwrap();
        let err = renderer.render("b.html", &json!({})).unwrap_err();
        assert!(matches!(err, DraftError::Template(_)));
    }

    #[test]
    fn test_custom_filter() {
        let mut renderer = HtmlRenderer::new();
        renderer.register_filter(
            "shout",
            |value: &tera::Value, _: &HashMap<String, tera::Value>| {
                let text = tera::try_get_value!("shout", "value", String, value);
                Ok(tera::Value::String(text.to_uppercase()))
            },
        );
        renderer
            .add_raw_template("shout.html", "{{ word | shout }}")
            .unwrap();

        let html = renderer.render("shout.html", &json!({"word": "hi"})).unwrap();
        assert_eq!(html, "HI");
    }

    #[test]
    fn test_load_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>{{ title }}</h1>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut renderer = HtmlRenderer::new();
        let pattern = format!("{}/*.html", dir.path().display());
        renderer.load_glob(&pattern).unwrap();

        assert!(renderer.has_template("index.html"));
        assert!(!renderer.has_template("notes.txt"));
        let html = renderer.render("index.html", &json!({"title": "Home"})).unwrap();
        assert_eq!(html, "<h1>Home</h1>");
    }
}
