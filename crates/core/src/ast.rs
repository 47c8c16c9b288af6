//! Program model consumed by the rewrite strategies.
//!
//! The model keeps only what the strategies need from a module's top-level statements: node
//! kinds, byte spans into the original source, and the names/literals of import and export
//! clauses. It is produced once per source (see [`crate::parse`]) and never mutated; every span
//! refers to the original, unedited text.

/// A half-open byte range `[start, end)` in the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Returns the source text covered by this span, if it is in bounds.
    pub fn text(self, source: &str) -> Option<&str> {
        source.get(self.start..self.end)
    }
}

/// Ordered top-level statements of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub body: Vec<Statement>,
}

impl Program {
    pub fn imports(&self) -> impl Iterator<Item = &ImportDeclaration> {
        self.body.iter().filter_map(|stmt| match stmt {
            Statement::Import(decl) => Some(decl),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Import(ImportDeclaration),
    Export(ExportDeclaration),
    Other(Span),
}

/// A quoted string literal. `span` includes both quote characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub span: Span,
    pub value: String,
}

impl StringLiteral {
    /// Span of the characters strictly between the quotes.
    pub fn inner_span(&self) -> Span {
        Span::new(
            self.span.start + 1,
            self.span.end.saturating_sub(1).max(self.span.start + 1),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub span: Span,
    pub name: String,
}

/// `import <clause> from "<source>"` or `import "<source>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    pub span: Span,
    /// `None` for side-effect imports.
    pub clause: Option<ImportClause>,
    pub source: StringLiteral,
    /// `with { ... }` / `assert { ... }` attributes follow the source literal.
    pub has_attributes: bool,
}

/// Everything between `import` and `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportClause {
    pub span: Span,
    pub default: Option<Identifier>,
    /// The local name bound by `* as name`.
    pub namespace: Option<Identifier>,
    pub named: Option<NamedImports>,
}

/// `{ a, b as c }`. `span` includes the braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImports {
    pub span: Span,
    pub specifiers: Vec<ImportSpecifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub span: Span,
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDeclaration {
    /// `export const ...`, `export function ...`, `export class ...`.
    Declaration {
        span: Span,
        /// The `export` keyword token.
        keyword: Span,
        declaration: Declaration,
    },
    /// `export { a, b as c }`, optionally re-exported `from "..."`.
    Named {
        span: Span,
        specifiers: Vec<ExportSpecifier>,
        source: Option<StringLiteral>,
    },
    /// `export * from "..."` / `export * as ns from "..."`.
    All {
        span: Span,
        exported: Option<String>,
        source: StringLiteral,
    },
    /// `export default ...`.
    Default { span: Span },
}

impl ExportDeclaration {
    pub fn span(&self) -> Span {
        match self {
            ExportDeclaration::Declaration { span, .. }
            | ExportDeclaration::Named { span, .. }
            | ExportDeclaration::All { span, .. }
            | ExportDeclaration::Default { span } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpecifier {
    pub span: Span,
    pub name: String,
    pub alias: Option<String>,
}

impl ExportSpecifier {
    /// The name other modules see.
    pub fn exported_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Function { name: String },
    Class { name: String },
    Variable { declarators: Vec<VariableDeclarator> },
    Unsupported { kind: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclarator {
    pub span: Span,
    pub binding: Binding,
}

/// Binding target on the left of a variable declarator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Identifier(String),
    Object(Vec<PatternProperty>),
    Unsupported { kind: String },
}

/// One entry of an object destructuring pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternProperty {
    /// `name`, `name = 1`, `name: target` all contribute their key.
    Key(String),
    /// `...rest`.
    Rest(String),
    /// `[expr]: target`.
    Computed,
    /// `key: { ... }` or `key: [ ... ]`; the names are bound one level down.
    Nested,
}
