//! Report template rendering
//!
//! Session reports come from user-editable Jinja templates, rendered with
//! `minijinja` against a `serde_json::Value` context. Undefined values and
//! attributes of undefined values render as empty strings, so a template
//! written for a newer entry format still renders against older records.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde_json::Value;

use crate::error::{Error, Result};

/// Output escaping applied to `{{ }}` expressions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escape {
    None,
    Html,
}

/// Name the template is registered under, shown in error messages
const TEMPLATE_NAME: &str = "report";

/// A syntax-checked report template
#[derive(Clone, Debug)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let mut env = environment(Escape::None);
        env.add_template(TEMPLATE_NAME, source).map_err(template_error)?;
        Ok(Self {
            source: source.to_string(),
        })
    }

    pub fn render(&self, context: &Value, escape: Escape) -> Result<String> {
        render_str(&self.source, context, escape)
    }
}

/// Parse and render in one step
pub fn render_str(source: &str, context: &Value, escape: Escape) -> Result<String> {
    let mut env = environment(escape);
    env.add_template(TEMPLATE_NAME, source).map_err(template_error)?;
    env.get_template(TEMPLATE_NAME)
        .and_then(|template| template.render(context))
        .map_err(template_error)
}

fn environment<'source>(escape: Escape) -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env.set_auto_escape_callback(move |_| match escape {
        Escape::None => AutoEscape::None,
        Escape::Html => AutoEscape::Html,
    });
    env
}

fn template_error(err: minijinja::Error) -> Error {
    Error::Template(err.to_string())
}
