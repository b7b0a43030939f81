use crate::error::LoaderError;
use crate::path::resolve_name;
use log::debug;
use stencil_resource::{ResourceError, ResourceProvider};
use stencil_template_core::{CompileOptions, Template, TemplateSource};
use stencil_types::{Autoescape, WhitespaceMode};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Caching, reentrancy-safe resolver of named templates backed by a
/// [`ResourceProvider`]. Equivalent to a `Loader` in the original engine:
/// owns the engine-wide autoescape/whitespace defaults, caches every
/// template it has ever compiled by its resolved name, and resolves
/// `extends`/`include` references by compiling (and caching) the referenced
/// template on demand.
pub struct Loader {
    provider: Arc<dyn ResourceProvider>,
    default_autoescape: Autoescape,
    default_whitespace: Option<WhitespaceMode>,
    cache: RwLock<HashMap<String, Arc<Template>>>,
    loading: RwLock<HashSet<String>>,
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("cache_size", &self.cache.read().map(|c| c.len()).unwrap_or(0))
            .finish()
    }
}

impl Loader {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self {
            provider,
            default_autoescape: Autoescape::engine_default(),
            default_whitespace: None,
            cache: RwLock::new(HashMap::new()),
            loading: RwLock::new(HashSet::new()),
        }
    }

    pub fn with_default_autoescape(mut self, autoescape: Autoescape) -> Self {
        self.default_autoescape = autoescape;
        self
    }

    pub fn with_default_whitespace(mut self, whitespace: WhitespaceMode) -> Self {
        self.default_whitespace = Some(whitespace);
        self
    }

    /// Compiles and caches the template named `name`, or returns the
    /// already-cached instance. `name` is treated as root-relative.
    pub fn load(&self, name: &str) -> Result<Arc<Template>, LoaderError> {
        self.load_resolved(name, None)
    }

    /// Forgets every cached template, forcing the next `load` of any name to
    /// recompile from the resource provider.
    pub fn reset(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    pub fn cache_size(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Returns the pretty-printed IR of a previously-compiled template,
    /// mirroring `__loader__.get_source(name)` in the original engine
    /// (which returned the generated Python source for `name`).
    pub fn get_source(&self, name: &str) -> Option<String> {
        self.cache.read().ok()?.get(name).map(|t| t.ir().pretty(0))
    }

    fn load_resolved(&self, name: &str, parent: Option<&str>) -> Result<Arc<Template>, LoaderError> {
        let resolved = resolve_name(name, parent);

        if let Ok(cache) = self.cache.read() {
            if let Some(template) = cache.get(&resolved) {
                return Ok(template.clone());
            }
        }

        {
            let mut loading = self
                .loading
                .write()
                .expect("loader reentrancy lock poisoned");
            if !loading.insert(resolved.clone()) {
                return Err(LoaderError::CircularReference(resolved));
            }
        }

        let result = self.compile(&resolved);

        {
            let mut loading = self
                .loading
                .write()
                .expect("loader reentrancy lock poisoned");
            loading.remove(&resolved);
        }

        let template = Arc::new(result?);

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(resolved.clone(), template.clone());
        }
        debug!("compiled template {resolved}");
        Ok(template)
    }

    fn compile(&self, resolved_name: &str) -> Result<Template, LoaderError> {
        let bytes = self.provider.load(resolved_name).map_err(|e| match e {
            ResourceError::NotFound(_) => LoaderError::NotFound(resolved_name.to_string()),
            other => LoaderError::Resource { name: resolved_name.to_string(), source: other },
        })?;
        let source = std::str::from_utf8(&bytes)
            .map_err(|_| LoaderError::InvalidUtf8(resolved_name.to_string()))?;

        let options = CompileOptions {
            autoescape: None,
            whitespace: self.default_whitespace,
            compress_whitespace: None,
        };
        let template = Template::compile(
            resolved_name,
            source,
            options,
            self.default_autoescape.clone(),
            self,
        )?;
        Ok(template)
    }
}

impl TemplateSource for Loader {
    fn load(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<Arc<Template>, stencil_template_core::TemplateCoreError> {
        self.load_resolved(name, parent)
            .map_err(|e| stencil_template_core::TemplateCoreError::Source(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_resource::InMemoryResourceProvider;

    fn loader_with(files: &[(&str, &str)]) -> Loader {
        let mem = InMemoryResourceProvider::new();
        for (name, text) in files {
            mem.add(name, text.as_bytes().to_vec());
        }
        Loader::new(Arc::new(mem))
    }

    #[test]
    fn compiles_and_caches_a_template() {
        let loader = loader_with(&[("a.txt", "hello {{ name }}")]);
        let t1 = loader.load("a.txt").unwrap();
        let t2 = loader.load("a.txt").unwrap();
        assert!(Arc::ptr_eq(&t1, &t2));
        assert_eq!(loader.cache_size(), 1);
    }

    #[test]
    fn missing_template_is_not_found() {
        let loader = loader_with(&[]);
        let err = loader.load("missing.txt").unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[test]
    fn extends_resolves_and_merges_named_blocks() {
        let loader = loader_with(&[
            ("base.html", "before{% block body %}base-body{% end %}after"),
            ("child.html", "{% extends \"base.html\" %}{% block body %}child-body{% end %}"),
        ]);
        let child = loader.load("child.html").unwrap();
        let rendered = child.generate(stencil_expr::base_environment(), Default::default()).unwrap();
        let text = String::from_utf8(rendered).unwrap();
        assert_eq!(text, "beforechild-bodyafter");
    }

    #[test]
    fn direct_self_extends_is_a_circular_reference() {
        let loader = loader_with(&[("loop.html", "{% extends \"loop.html\" %}")]);
        let err = loader.load("loop.html").unwrap_err();
        assert!(matches!(err, LoaderError::CircularReference(_)));
    }

    #[test]
    fn reset_forces_recompilation() {
        let loader = loader_with(&[("a.txt", "v1")]);
        let t1 = loader.load("a.txt").unwrap();
        loader.reset();
        let t2 = loader.load("a.txt").unwrap();
        assert!(!Arc::ptr_eq(&t1, &t2));
    }
}
