// src/render.rs
//! Template rendering: substitute `:name` placeholders with SQL literals.
//!
//! This is the single point where parameter values enter SQL text. The
//! template is scanned once; substituted values are never rescanned, so a
//! value that happens to contain a placeholder token stays inert text.
//! `::` is left alone to keep cast syntax working.
//!
//! Rendering is strict both ways: a placeholder without a parameter and a
//! parameter without a placeholder are both errors, keeping the template
//! and its map in one-to-one correspondence.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::compiler::params::{ParamMap, ParamValue};
use crate::compiler::CompiledQuery;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    // Cast operator first so `::` never reads as a placeholder start.
    Regex::new(r"(?:::)|(?::[A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("template references unknown parameter `{name}`")]
    UnknownPlaceholder { name: String },
    #[error("parameter `{name}` is never referenced by the template")]
    UnusedParameter { name: String },
}

/// Render a compiled query into executable SQL.
pub fn render(query: &CompiledQuery) -> Result<String, RenderError> {
    render_template(&query.sql_template, &query.parameters)
}

/// Substitute every placeholder in `template` from `params`.
pub fn render_template(template: &str, params: &ParamMap) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut last = 0;
    let mut used: HashSet<&str> = HashSet::new();

    for token in PLACEHOLDER_RE.find_iter(template) {
        out.push_str(&template[last..token.start()]);
        let text = token.as_str();
        if text == "::" {
            out.push_str("::");
        } else {
            let name = &text[1..];
            let value = params
                .get(name)
                .ok_or_else(|| RenderError::UnknownPlaceholder {
                    name: name.to_string(),
                })?;
            out.push_str(&literal(value));
            used.insert(name);
        }
        last = token.end();
    }
    out.push_str(&template[last..]);

    if let Some(name) = params.names().find(|n| !used.contains(n)) {
        return Err(RenderError::UnusedParameter {
            name: name.to_string(),
        });
    }
    Ok(out)
}

/// SQL literal for one value. Strings use standard quote doubling.
fn literal(value: &ParamValue) -> String {
    match value {
        ParamValue::Str(s) => format!("'{}'", s.replace('\'', "''")),
        ParamValue::Int(i) => i.to_string(),
        ParamValue::Float(x) => {
            let mut buf = ryu::Buffer::new();
            buf.format(*x).to_string()
        }
        ParamValue::Bool(true) => "TRUE".to_string(),
        ParamValue::Bool(false) => "FALSE".to_string(),
        ParamValue::Null => "NULL".to_string(),
    }
}
