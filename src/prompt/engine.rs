use crate::error::PromptError;
use tera::Tera;

/// Tera-backed template engine with the stage templates pre-registered.
pub struct PromptEngine {
    tera: Tera,
}

impl PromptEngine {
    /// Create an engine with every built-in stage template registered.
    pub fn with_defaults() -> Result<Self, PromptError> {
        let mut tera = Tera::default();
        for (name, content) in super::builder::DEFAULT_TEMPLATES {
            tera.add_raw_template(name, content)
                .map_err(|e| PromptError::Render(e.to_string()))?;
        }
        Ok(Self { tera })
    }

    /// Override or add a template at runtime (e.g. host-authored prompt text).
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<(), PromptError> {
        self.tera
            .add_raw_template(name, content)
            .map_err(|e| PromptError::Render(e.to_string()))?;
        Ok(())
    }

    /// Render a named template with the given context.
    pub fn render(&self, template_name: &str, context: &tera::Context) -> Result<String, PromptError> {
        self.tera
            .render(template_name, context)
            .map_err(|e| PromptError::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::Context;

    #[test]
    fn defaults_register_stage_templates() {
        let engine = PromptEngine::with_defaults().unwrap();
        // Unknown templates still fail.
        assert!(engine.render("nonexistent", &Context::new()).is_err());
    }

    #[test]
    fn add_template_overrides_existing() {
        let mut engine = PromptEngine::with_defaults().unwrap();
        engine.add_template("t", "version 1").unwrap();
        engine.add_template("t", "version 2").unwrap();
        assert_eq!(engine.render("t", &Context::new()).unwrap(), "version 2");
    }

    #[test]
    fn missing_variable_is_a_render_error() {
        let mut engine = PromptEngine::with_defaults().unwrap();
        engine.add_template("greet", "Hello, {{ name }}!").unwrap();
        assert!(engine.render("greet", &Context::new()).is_err());
    }
}
