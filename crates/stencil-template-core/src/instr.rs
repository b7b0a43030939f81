use stencil_expr::{Expr, ForTarget};
use stencil_types::{Autoescape, SourceLocation};

/// A statement lowered from a `{% set %}`, `{% import %}`/`{% from %}`,
/// `{% break %}`, or `{% continue %}` tag.
#[derive(Debug, Clone)]
pub enum Stmt {
    Set(String, Expr),
    Break,
    Continue,
    /// `import`/`from` tags are recorded for diagnostics but have no
    /// runtime effect: this engine has no module system to resolve them
    /// against.
    Noop,
}

/// The intermediate representation executed by the evaluator. Lowering an
/// AST to `Instr` happens once per compiled `Template`; rendering re-walks
/// the same `Instr` tree against a fresh `Environment` every time.
#[derive(Debug, Clone)]
pub enum Instr {
    /// The root of a template's IR: opens a fresh output accumulator, runs
    /// the body, and yields the joined bytes.
    Root(Vec<Instr>),

    Append(Vec<u8>),

    EmitExpr {
        expr: Expr,
        raw: bool,
        autoescape: Autoescape,
        location: SourceLocation,
    },

    Exec { stmt: Stmt, location: SourceLocation },

    If {
        /// `(condition, body)` pairs; the first whose condition is truthy
        /// runs. Covers `if`/`elif` together.
        branches: Vec<(Expr, Vec<Instr>)>,
        else_body: Vec<Instr>,
        location: SourceLocation,
    },

    For {
        target: ForTarget,
        iterable: Expr,
        body: Vec<Instr>,
        /// Runs when the loop completes without a `break`, Python-`for`-`else`-style.
        else_body: Vec<Instr>,
        location: SourceLocation,
    },

    While {
        cond: Expr,
        body: Vec<Instr>,
        else_body: Vec<Instr>,
        location: SourceLocation,
    },

    Try {
        body: Vec<Instr>,
        except: Option<Vec<Instr>>,
        finally_body: Vec<Instr>,
        location: SourceLocation,
    },

    /// Pushes a new environment scope, runs `body` into its own output
    /// buffer, and calls `callable` with that buffer as its sole argument;
    /// the call's return value becomes this instruction's output.
    Apply {
        callable: Expr,
        body: Vec<Instr>,
        location: SourceLocation,
    },
}

impl Instr {
    /// A short human-readable dump used for `CompileError` diagnostics,
    /// analogous to the generated-source dump of a host-source-based engine.
    pub fn pretty(&self, indent: usize) -> String {
        let pad = "  ".repeat(indent);
        match self {
            Instr::Root(body) => format!(
                "{pad}Root:\n{}",
                body.iter().map(|i| i.pretty(indent + 1)).collect::<Vec<_>>().join("\n")
            ),
            Instr::Append(bytes) => format!("{pad}Append({} bytes)", bytes.len()),
            Instr::EmitExpr { expr, raw, location, .. } => {
                format!("{pad}EmitExpr[{location}]({expr:?}, raw={raw})")
            }
            Instr::Exec { stmt, location } => format!("{pad}Exec[{location}]({stmt:?})"),
            Instr::If { branches, else_body, location } => {
                let mut s = format!("{pad}If[{location}]:");
                for (cond, body) in branches {
                    s.push_str(&format!(
                        "\n{pad}  when {cond:?}:\n{}",
                        body.iter().map(|i| i.pretty(indent + 2)).collect::<Vec<_>>().join("\n")
                    ));
                }
                if !else_body.is_empty() {
                    s.push_str(&format!(
                        "\n{pad}  else:\n{}",
                        else_body.iter().map(|i| i.pretty(indent + 2)).collect::<Vec<_>>().join("\n")
                    ));
                }
                s
            }
            Instr::For { target, iterable, location, .. } => {
                format!("{pad}For[{location}]({target:?} in {iterable:?})")
            }
            Instr::While { cond, location, .. } => format!("{pad}While[{location}]({cond:?})"),
            Instr::Try { location, .. } => format!("{pad}Try[{location}]"),
            Instr::Apply { callable, location, .. } => format!("{pad}Apply[{location}]({callable:?})"),
        }
    }
}
