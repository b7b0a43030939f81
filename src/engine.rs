//! Wires the five `stencil-*` crates together into the single entry point a
//! caller actually uses: load a template by name from a filesystem root or
//! an in-memory map, render it against a keyword-argument environment.

use crate::{datetime, escape};
use stencil_expr::{EvalError, Value};
use stencil_loader::{Loader, LoaderError};
use stencil_resource::{FilesystemResourceProvider, InMemoryResourceProvider, ResourceProvider};
use stencil_template_core::RenderError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by [`Engine::render`]: either the named template could
/// not be located/compiled, or rendering it failed.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// The top-level handle a caller constructs once and renders many templates
/// through. Cheap to clone (an `Arc<Loader>` internally) and safe to share
/// across threads — rendering is read-only with respect to the cache.
#[derive(Clone)]
pub struct Engine {
    loader: Arc<Loader>,
}

impl Engine {
    /// Builds an engine backed by an arbitrary [`ResourceProvider`].
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self { loader: Arc::new(Loader::new(provider)) }
    }

    /// Builds an engine that resolves template names against files under `root`.
    pub fn filesystem(root: impl AsRef<Path>) -> Self {
        Self::new(Arc::new(FilesystemResourceProvider::new(root)))
    }

    /// Builds an engine backed by an in-memory name→source map, returning a
    /// handle to the provider so the caller can `add` templates to it.
    pub fn in_memory() -> (Self, Arc<InMemoryResourceProvider>) {
        let provider = Arc::new(InMemoryResourceProvider::new());
        (Self::new(provider.clone()), provider)
    }

    /// Forgets every cached compiled template.
    pub fn reset(&self) {
        self.loader.reset();
    }

    pub fn cache_size(&self) -> usize {
        self.loader.cache_size()
    }

    /// Loads (compiling and caching on first use) and renders the template
    /// named `name`, overlaying `kwargs` on top of the engine-default
    /// evaluation environment.
    pub fn render(&self, name: &str, kwargs: HashMap<String, Value>) -> Result<Vec<u8>, EngineError> {
        let template = self.loader.load(name)?;
        let env = self.base_environment(name);
        Ok(template.generate(env, kwargs)?)
    }

    /// Builds the engine-default environment installed ahead of a Loader
    /// namespace and caller kwargs, per the Evaluator/Host Bridge contract:
    /// expression-sublanguage builtins, the autoescape function table, the
    /// `datetime` handle, `_tt_utf8`/`_tt_string_types`, and the
    /// `__name__`/`__loader__` diagnostic hooks.
    fn base_environment(&self, name: &str) -> stencil_expr::Environment {
        let mut env = stencil_expr::base_environment();

        env.set_base("xhtml_escape", Value::native(|args| string_fn(args, escape::xhtml_escape)));
        env.set_base("escape", Value::native(|args| string_fn(args, escape::xhtml_escape)));
        env.set_base("url_escape", Value::native(|args| string_fn(args, escape::url_escape)));
        env.set_base("squeeze", Value::native(|args| string_fn(args, escape::squeeze)));
        env.set_base("linkify", Value::native(|args| string_fn(args, escape::linkify)));
        env.set_base(
            "json_encode",
            Value::native(|args| {
                let v = args.first().ok_or_else(|| EvalError::TypeError("json_encode() expects 1 argument".to_string()))?;
                Ok(Value::Str(escape::json_encode(&v.to_json())))
            }),
        );

        env.set_base("datetime", datetime::datetime_handle());

        env.set_base(
            "_tt_utf8",
            Value::native(|args| {
                let v = args.first().ok_or_else(|| EvalError::TypeError("_tt_utf8() expects 1 argument".to_string()))?;
                match v {
                    Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
                    other => Ok(Value::Bytes(other.stringify().into_bytes())),
                }
            }),
        );
        env.set_base(
            "_tt_string_types",
            Value::native(|args| {
                let v = args.first().ok_or_else(|| EvalError::TypeError("_tt_string_types() expects 1 argument".to_string()))?;
                Ok(Value::Bool(matches!(v, Value::Str(_) | Value::Bytes(_))))
            }),
        );

        env.set_base("__name__", Value::Str(name.to_string()));

        let loader_for_source = self.loader.clone();
        let mut loader_ns = HashMap::new();
        loader_ns.insert(
            "get_source".to_string(),
            Value::native(move |args| {
                let name = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| EvalError::TypeError("get_source() expects a template name".to_string()))?;
                Ok(loader_for_source
                    .get_source(name)
                    .map(Value::Str)
                    .unwrap_or(Value::Null))
            }),
        );
        env.set_base("__loader__", Value::Map(loader_ns));

        env
    }
}

fn string_fn(args: &[Value], f: impl Fn(&str) -> String) -> Result<Value, EvalError> {
    let v = args
        .first()
        .ok_or_else(|| EvalError::TypeError("expected 1 string argument".to_string()))?;
    Ok(Value::Str(f(&v.stringify())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_hello_world_scenario() {
        let (engine, provider) = Engine::in_memory();
        provider.add("hello.txt", "hello {{ name }}".as_bytes().to_vec());
        let out = engine
            .render("hello.txt", HashMap::from([("name".to_string(), Value::from("world"))]))
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "hello world");
    }

    #[test]
    fn autoescape_escapes_expression_output() {
        let (engine, provider) = Engine::in_memory();
        provider.add("x.html", "{{ x }}".as_bytes().to_vec());
        let out = engine
            .render("x.html", HashMap::from([("x".to_string(), Value::from("<b>"))]))
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "&lt;b&gt;");
    }
}
