// dqd-core/src/infrastructure/compiler/jinja.rs

// Turns a check's SQL template (`{{ cdm_schema }}.{{ cdmTableName }}` ...)
// into a query the backend can run. Templates are looked up by their
// `sqlFile` name in the templates directory.

use minijinja::Environment;
use std::path::Path;
use tracing::debug;

use crate::application::ports::TemplateEngine;
use crate::error::DqdError;
use crate::infrastructure::error::InfrastructureError;

pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    /// Loads templates lazily from `dir`; each file is parsed once and cached.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir.as_ref()));
        Self { env }
    }

    /// In-memory templates, keyed by `sqlFile` name.
    pub fn from_templates<I, N, S>(templates: I) -> Result<Self, InfrastructureError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut env = Environment::new();
        for (name, source) in templates {
            env.add_template_owned(name.into(), source.into())?;
        }
        Ok(Self { env })
    }
}

impl TemplateEngine for JinjaRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, DqdError> {
        debug!(template, "Rendering check query");
        let tmpl = self
            .env
            .get_template(template)
            .map_err(InfrastructureError::TemplateError)?;
        tmpl.render(context)
            .map_err(|e| InfrastructureError::TemplateError(e).into())
    }
}
