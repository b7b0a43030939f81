use crate::ast::{ChunkList, File, Node, NamedBlock};
use crate::error::{ParseError, TemplateCoreError};
use crate::instr::Instr;
use crate::lower::{collect_named_blocks, Lowerer};
use crate::parser::Parser;
use crate::render;
use stencil_expr::{EvalError, Value};
use stencil_expr::Environment;
use stencil_types::{Autoescape, WhitespaceMode};
use std::collections::HashMap;
use std::sync::Arc;

pub type NamedBlockMap = HashMap<String, NamedBlock>;

/// The contract a `Loader` exposes back to the compiler so `extends`/`include`
/// can resolve and compile other templates by name. Kept as a trait here
/// (rather than a direct dependency on `stencil-loader`) so this crate never
/// has to know about cache/reentrancy concerns — only about "give me the
/// compiled template named X, as seen from Y".
pub trait TemplateSource: Send + Sync {
    fn load(&self, name: &str, parent: Option<&str>) -> Result<Arc<Template>, TemplateCoreError>;
}

/// A compiled template: immutable after construction, safe to share via `Arc`
/// and render concurrently any number of times.
pub struct Template {
    name: String,
    file: File,
    root_body: ChunkList,
    named_blocks: NamedBlockMap,
    ir: Instr,
}

/// Options accepted when compiling a template, mirroring the constructor
/// knobs a `Loader` may supply as defaults and a caller may override.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub autoescape: Option<Autoescape>,
    pub whitespace: Option<WhitespaceMode>,
    /// Deprecated alternative to `whitespace`; `true` maps to `Single`,
    /// `false` to `All`. Passing both this and `whitespace` is a construction
    /// error.
    pub compress_whitespace: Option<bool>,
}

impl Template {
    pub fn compile(
        name: impl Into<String>,
        source_text: &str,
        options: CompileOptions,
        loader_default_autoescape: Autoescape,
        source: &dyn TemplateSource,
    ) -> Result<Template, TemplateCoreError> {
        let name = name.into();

        if options.whitespace.is_some() && options.compress_whitespace.is_some() {
            return Err(ParseError::new(
                &name,
                0,
                "cannot pass both 'whitespace' and the deprecated 'compress_whitespace'",
            )
            .into());
        }

        let initial_whitespace = options
            .whitespace
            .or_else(|| options.compress_whitespace.map(WhitespaceMode::from_compress_flag))
            .unwrap_or_else(|| WhitespaceMode::default_for_name(&name));

        let initial_autoescape = options.autoescape.unwrap_or(loader_default_autoescape);

        let file = Parser::new(name.clone(), source_text, initial_autoescape, initial_whitespace)
            .parse_file()?;

        let mut root_extends = file.body.iter().filter_map(|n| match n {
            Node::Extends(e) => Some(e.clone()),
            _ => None,
        });
        let extends = root_extends.next();
        if let Some(second) = root_extends.next() {
            return Err(ParseError::new(
                &name,
                second.line,
                "a template may have at most one 'extends' directive",
            )
            .into());
        }

        let (root_body, mut named_blocks) = match &extends {
            Some(ext) => {
                let parent = source
                    .load(&ext.name, Some(&name))
                    .map_err(|e| TemplateCoreError::Source(e.to_string()))?;
                (parent.root_body.clone(), parent.named_blocks.clone())
            }
            None => (file.body.clone(), NamedBlockMap::new()),
        };
        collect_named_blocks(&file.body, &mut named_blocks);

        let lowerer = Lowerer { template_name: name.clone(), named_blocks: &named_blocks, source };
        let ir = match lowerer.lower_root(&root_body) {
            Ok(ir) => ir,
            Err(e) => {
                log::error!("failed to compile template '{name}': {e}");
                return Err(e.into());
            }
        };

        Ok(Template { name, file, root_body, named_blocks, ir })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ast(&self) -> &File {
        &self.file
    }

    pub fn ir(&self) -> &Instr {
        &self.ir
    }

    /// The instructions of this template's own root, used by the code
    /// generator to splice an `{% include %}` target's body in place.
    pub fn body_instrs(&self) -> &[Instr] {
        match &self.ir {
            Instr::Root(body) => body,
            other => std::slice::from_ref(other),
        }
    }

    /// Renders this template against `env`, which must already have the
    /// engine defaults and Loader namespace layered in. Caller kwargs are
    /// overlaid last, rejecting any `_tt_`-prefixed name.
    pub fn generate(
        &self,
        mut env: Environment,
        kwargs: HashMap<String, Value>,
    ) -> Result<Vec<u8>, crate::error::RenderError> {
        for (k, v) in kwargs {
            env.bind_caller_kwarg(&k, v).map_err(|e| match e {
                EvalError::ReservedIdentifier(name) => crate::error::RenderError::ReservedArgument(name),
                other => crate::error::RenderError::Eval {
                    location: stencil_types::SourceLocation::new(self.name.clone(), 0),
                    source: other,
                },
            })?;
        }
        render::render(&self.ir, &mut env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoSource;
    impl TemplateSource for NoSource {
        fn load(&self, name: &str, _parent: Option<&str>) -> Result<Arc<Template>, TemplateCoreError> {
            Err(TemplateCoreError::Source(format!("no such template: {name}")))
        }
    }

    #[test]
    fn multiple_root_extends_markers_are_a_parse_error() {
        let err = Template::compile(
            "t.txt",
            "{% extends \"a\" %}{% extends \"b\" %}",
            CompileOptions::default(),
            Autoescape::engine_default(),
            &NoSource,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateCoreError::Parse(_)));
    }
}
