//! ECMAScript `import`/`export` rewriting without a parse-and-print round trip.
//!
//! This crate rewrites module declarations in JavaScript source text while preserving every byte
//! outside the rewritten spans (formatting, whitespace, comments). It parses once, lowers the
//! tree into a small read-only [`ast::Program`], and then applies span edits left-to-right while
//! threading a running length delta so offsets from the original parse stay valid.
//!
//! Entry points:
//!
//! - [`rewriter::Rewriter`] holds the source and its program and exposes every strategy
//!   (import-map substitution, dynamic-import / `require` conversion, import/export stripping,
//!   import-presence query).
//! - [`import_map::ImportMap`] is the substitution configuration.
//!
//! Internals:
//!
//! - [`alloc`] contains the tree-sitter allocator override for WASM targets.
//! - [`ast`] is the program model the strategies read.
//! - [`classify`] derives declaration shapes, specifier spans and exported names.
//! - [`edit`] holds the edit model, the left-to-right edit pass and sourcemap creation.
//! - [`parse`] runs tree-sitter and lowers its CST into [`ast::Program`].
//! - [`strategy`] synthesizes replacement text for each rewrite mode.
//! - [`utf16`] provides UTF-16 column indexing support for sourcemaps.

pub mod alloc;
pub mod ast;
pub mod classify;
pub mod edit;
pub mod import_map;
pub mod parse;
pub mod rewriter;
pub mod strategy;
pub mod utf16;

pub use edit::{Edit, create_sourcemap};
pub use import_map::ImportMap;
pub use rewriter::Rewriter;
pub use strategy::{Loader, Rewritten, Strategy, StripOutput};

/// Errors that can occur while rewriting.
#[derive(thiserror::Error, Debug)]
pub enum RewriteError {
    #[error("missing input: source text is empty")]
    MissingInput,

    #[error("tree-sitter failed to parse input")]
    ParseFailed,

    #[error("syntax error at byte {offset}")]
    Syntax { offset: usize },

    #[error("malformed declaration: {0}")]
    MalformedDeclaration(String),

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("overlapping edits: [{a_start},{a_end}) overlaps [{b_start},{b_end})")]
    OverlappingEdits {
        a_start: usize,
        a_end: usize,
        b_start: usize,
        b_end: usize,
    },

    #[error("invalid sourcemap: {0}")]
    SourceMap(#[from] sourcemap::Error),
}
