use handlebars::Handlebars;
use serde::Serialize;

use super::MailError;

pub const INVITATION: &str = "invitation";

const TEMPLATES: &[(&str, &str, &str)] = &[(
    INVITATION,
    include_str!("../../templates/invitation.html.hbs"),
    include_str!("../../templates/invitation.txt.hbs"),
)];

/// Registry of the HTML and plain-text bodies for every mail the service sends.
pub struct MailTemplates {
    registry: Handlebars<'static>,
}

impl MailTemplates {
    pub fn new() -> Result<Self, MailError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        for (name, html, text) in TEMPLATES {
            registry
                .register_template_string(&format!("{name}.html"), *html)
                .map_err(|e| MailError::Template(e.to_string()))?;
            registry
                .register_template_string(&format!("{name}.txt"), *text)
                .map_err(|e| MailError::Template(e.to_string()))?;
        }
        Ok(Self { registry })
    }

    pub fn has(&self, name: &str) -> bool {
        self.registry.has_template(&format!("{name}.html"))
    }

    /// Returns `(html, text)`.
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<(String, String), MailError> {
        if !self.has(name) {
            return Err(MailError::Template(format!("unknown template '{name}'")));
        }
        let html = self
            .registry
            .render(&format!("{name}.html"), context)
            .map_err(|e| MailError::Template(e.to_string()))?;
        let text = self
            .registry
            .render(&format!("{name}.txt"), context)
            .map_err(|e| MailError::Template(e.to_string()))?;
        Ok((html, text))
    }
}
