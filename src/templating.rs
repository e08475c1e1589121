//! Minijinja rendering for the change email.
//!
//! The builtin `change_email.html` is compiled into the binary. When a
//! template directory is configured, templates are loaded from there
//! instead, so operators can restyle the email without rebuilding.

use crate::config::TemplateConfig;
use crate::core::Watcher;
use minijinja::{path_loader, Environment};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Name of the builtin change email template.
pub const CHANGE_EMAIL_TEMPLATE: &str = "change_email.html";

const CHANGE_EMAIL_SOURCE: &str = include_str!("../templates/change_email.html");

/// Context handed to the change email template.
#[derive(Debug, Serialize)]
pub struct ReportContext<'a> {
    pub account: &'a str,
    pub generated_at: String,
    pub watchers: Vec<&'a Watcher>,
}

/// Renders named templates.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// A renderer serving the builtin templates.
    pub fn builtin() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(CHANGE_EMAIL_TEMPLATE, CHANGE_EMAIL_SOURCE)?;
        Ok(Self { env })
    }

    /// A renderer loading templates from `dir` on first use.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        debug!("Loading templates from {:?}", dir.as_ref());
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        Self { env }
    }

    pub fn from_config(config: &TemplateConfig) -> Result<Self, minijinja::Error> {
        match &config.dir {
            Some(dir) => Ok(Self::from_dir(dir)),
            None => Self::builtin(),
        }
    }

    /// Renders the template `name` with `ctx`.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        let template = self.env.get_template(name)?;
        template.render(ctx)
    }
}
