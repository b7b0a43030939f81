use stencil_types::{Autoescape, WhitespaceMode};

/// A literal run of output text.
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub text: String,
    pub whitespace_mode: WhitespaceMode,
    pub line: u32,
}

/// `{{ EXPR }}` (raw = false) or `{% raw EXPR %}` (raw = true).
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub source: String,
    pub raw: bool,
    pub line: u32,
    /// The autoescape setting in effect at the point this node was parsed;
    /// captured here (rather than read from a single template-wide field at
    /// codegen time) so a mid-file `{% autoescape %}` directive only
    /// affects nodes parsed after it.
    pub autoescape: Autoescape,
}

/// Which tag produced a `StatementNode`, so the lowering pass can dispatch
/// on provenance instead of sniffing the statement's source text (which
/// collides with identifiers that happen to start with `import`/`from`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Set,
    ImportLike,
    Break,
    Continue,
}

/// A bare statement: `set`, `import`, `from ... import`, `break`, `continue`.
#[derive(Debug, Clone)]
pub struct StatementNode {
    pub kind: StatementKind,
    pub source: String,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    If,
    For,
    While,
    Try,
}

/// `if`/`for`/`while`/`try`, with their intermediate clauses already folded
/// in by the parser (an `IntermediateControl` directive is never retained
/// as a standalone node — it only ever modifies the `ControlBlock` it
/// belongs to while parsing is in progress).
#[derive(Debug, Clone)]
pub struct ControlBlock {
    pub kind: ControlKind,
    /// Text following the operator keyword, e.g. `n > 0` for `{% if n > 0 %}`.
    pub header: String,
    pub body: ChunkList,
    /// `(condition, body)` pairs for `elif` clauses (`If` only).
    pub elifs: Vec<(String, ChunkList)>,
    /// `else` clause shared by `if`/`for`/`while`/`try`.
    pub else_body: Option<ChunkList>,
    /// `(exception text, body)` for `except` clauses (`Try` only).
    pub except: Option<(String, ChunkList)>,
    /// `finally` clause (`Try` only).
    pub finally_body: Option<ChunkList>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct NamedBlock {
    pub name: String,
    pub body: ChunkList,
    pub owning_template: String,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct ExtendsMarker {
    pub name: String,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct IncludeMarker {
    pub name: String,
    pub defining_template: String,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct ApplyBlock {
    pub callable: String,
    pub body: ChunkList,
    pub line: u32,
}

/// The closed set of AST node variants produced by the parser.
#[derive(Debug, Clone)]
pub enum Node {
    Text(TextChunk),
    Expression(ExpressionNode),
    Module(ExpressionNode),
    Statement(StatementNode),
    Control(ControlBlock),
    NamedBlock(NamedBlock),
    Extends(ExtendsMarker),
    Include(IncludeMarker),
    Apply(ApplyBlock),
}

pub type ChunkList = Vec<Node>;

/// The root of a compiled template's AST; exactly one per template.
#[derive(Debug, Clone)]
pub struct File {
    pub name: String,
    pub body: ChunkList,
}
