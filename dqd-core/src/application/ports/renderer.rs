use crate::error::DqdError;

pub trait TemplateEngine: Send + Sync {
    /// Renders the named template file with `context`.
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, DqdError>;
}
