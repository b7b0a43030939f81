//! The code generator: lowers an AST `ChunkList` into an `Instr` tree.
use crate::ast::*;
use crate::error::CompileError;
use crate::instr::{Instr, Stmt};
use crate::template::{NamedBlockMap, TemplateSource};
use stencil_expr::parser::{parse_assignment, parse_expr, parse_for_header};
use stencil_types::SourceLocation;

pub struct Lowerer<'a> {
    pub template_name: String,
    pub named_blocks: &'a NamedBlockMap,
    pub source: &'a dyn TemplateSource,
}

impl<'a> Lowerer<'a> {
    pub fn lower_root(&self, body: &ChunkList) -> Result<Instr, CompileError> {
        Ok(Instr::Root(self.lower_chunks(body)?))
    }

    fn compile_err(&self, line: u32, message: impl Into<String>) -> CompileError {
        CompileError::new(self.template_name.clone(), line, message, String::new())
    }

    pub fn lower_chunks(&self, chunks: &ChunkList) -> Result<Vec<Instr>, CompileError> {
        let mut out = Vec::with_capacity(chunks.len());
        for node in chunks {
            self.lower_node(node, &mut out)?;
        }
        Ok(out)
    }

    fn lower_node(&self, node: &Node, out: &mut Vec<Instr>) -> Result<(), CompileError> {
        match node {
            Node::Text(t) => {
                if !t.text.is_empty() {
                    out.push(Instr::Append(t.text.clone().into_bytes()));
                }
            }
            Node::Expression(e) => out.push(self.lower_expression(e)?),
            Node::Module(e) => {
                // `{% module EXPR %}` is sugar for a raw expression rooted at
                // the reserved `_tt_modules` namespace.
                let qualified = format!("_tt_modules.{}", e.source);
                let expr = parse_expr(&qualified)
                    .map_err(|err| self.compile_err(e.line, err.message))?;
                out.push(Instr::EmitExpr {
                    expr,
                    raw: true,
                    autoescape: e.autoescape.clone(),
                    location: SourceLocation::new(self.template_name.clone(), e.line),
                });
            }
            Node::Statement(s) => out.push(self.lower_statement(s)?),
            Node::Control(c) => out.push(self.lower_control(c)?),
            Node::Apply(a) => {
                let callable = parse_expr(&a.callable)
                    .map_err(|err| self.compile_err(a.line, err.message))?;
                out.push(Instr::Apply {
                    callable,
                    body: self.lower_chunks(&a.body)?,
                    location: SourceLocation::new(self.template_name.clone(), a.line),
                });
            }
            Node::NamedBlock(b) => {
                // Resolved flatly: whichever template in the inheritance
                // chain defined this name *last* wins (see `collect_named_blocks`).
                let resolved = self.named_blocks.get(&b.name).unwrap_or(b);
                out.extend(self.lower_chunks(&resolved.body)?);
            }
            Node::Include(inc) => {
                let target = self
                    .source
                    .load(&inc.name, Some(&inc.defining_template))
                    .map_err(|e| self.compile_err(inc.line, e.to_string()))?;
                out.extend(target.body_instrs().to_vec());
            }
            Node::Extends(_) => {
                // Only meaningful at the root of a file; the compile
                // pipeline consumes it before lowering ever sees the body.
            }
        }
        Ok(())
    }

    fn lower_expression(&self, e: &ExpressionNode) -> Result<Instr, CompileError> {
        let expr = parse_expr(&e.source).map_err(|err| self.compile_err(e.line, err.message))?;
        Ok(Instr::EmitExpr {
            expr,
            raw: e.raw,
            autoescape: e.autoescape.clone(),
            location: SourceLocation::new(self.template_name.clone(), e.line),
        })
    }

    fn lower_statement(&self, s: &StatementNode) -> Result<Instr, CompileError> {
        let stmt = match s.kind {
            StatementKind::Break => Stmt::Break,
            StatementKind::Continue => Stmt::Continue,
            StatementKind::ImportLike => Stmt::Noop,
            StatementKind::Set => {
                let (name, expr) = parse_assignment(s.source.trim())
                    .map_err(|err| self.compile_err(s.line, err.message))?;
                Stmt::Set(name, expr)
            }
        };
        Ok(Instr::Exec {
            stmt,
            location: SourceLocation::new(self.template_name.clone(), s.line),
        })
    }

    fn lower_control(&self, c: &ControlBlock) -> Result<Instr, CompileError> {
        let location = SourceLocation::new(self.template_name.clone(), c.line);
        match c.kind {
            ControlKind::If => {
                let mut branches = Vec::with_capacity(1 + c.elifs.len());
                let cond =
                    parse_expr(&c.header).map_err(|err| self.compile_err(c.line, err.message))?;
                branches.push((cond, self.lower_chunks(&c.body)?));
                for (cond_text, body) in &c.elifs {
                    let cond = parse_expr(cond_text)
                        .map_err(|err| self.compile_err(c.line, err.message))?;
                    branches.push((cond, self.lower_chunks(body)?));
                }
                let else_body = match &c.else_body {
                    Some(b) => self.lower_chunks(b)?,
                    None => Vec::new(),
                };
                Ok(Instr::If { branches, else_body, location })
            }
            ControlKind::For => {
                let (target, iterable) = parse_for_header(&c.header)
                    .map_err(|err| self.compile_err(c.line, err.message))?;
                let body = self.lower_chunks(&c.body)?;
                let else_body = match &c.else_body {
                    Some(b) => self.lower_chunks(b)?,
                    None => Vec::new(),
                };
                Ok(Instr::For { target, iterable, body, else_body, location })
            }
            ControlKind::While => {
                let cond =
                    parse_expr(&c.header).map_err(|err| self.compile_err(c.line, err.message))?;
                let body = self.lower_chunks(&c.body)?;
                let else_body = match &c.else_body {
                    Some(b) => self.lower_chunks(b)?,
                    None => Vec::new(),
                };
                Ok(Instr::While { cond, body, else_body, location })
            }
            ControlKind::Try => {
                let body = self.lower_chunks(&c.body)?;
                let except = match &c.except {
                    Some((_, b)) => Some(self.lower_chunks(b)?),
                    None => None,
                };
                let finally_body = match &c.finally_body {
                    Some(b) => self.lower_chunks(b)?,
                    None => Vec::new(),
                };
                Ok(Instr::Try { body, except, finally_body, location })
            }
        }
    }
}

/// Recursively collects every `NamedBlock` in `chunks` (blocks may nest
/// inside `if`/`for`/`apply`/other blocks), overwriting earlier entries
/// with later ones so the caller can fold a whole ancestor chain in order
/// and have the most specific (last-processed) override win.
pub fn collect_named_blocks(chunks: &ChunkList, out: &mut NamedBlockMap) {
    for node in chunks {
        match node {
            Node::NamedBlock(b) => {
                collect_named_blocks(&b.body, out);
                out.insert(b.name.clone(), b.clone());
            }
            Node::Control(c) => {
                collect_named_blocks(&c.body, out);
                for (_, body) in &c.elifs {
                    collect_named_blocks(body, out);
                }
                if let Some(b) = &c.else_body {
                    collect_named_blocks(b, out);
                }
                if let Some((_, b)) = &c.except {
                    collect_named_blocks(b, out);
                }
                if let Some(b) = &c.finally_body {
                    collect_named_blocks(b, out);
                }
            }
            Node::Apply(a) => collect_named_blocks(&a.body, out),
            Node::Text(_) | Node::Expression(_) | Node::Module(_) | Node::Statement(_)
            | Node::Extends(_) | Node::Include(_) => {}
        }
    }
}
