//! The public rewriting façade.
//!
//! A [`Rewriter`] owns one module's source and the program parsed from it. Every strategy reads
//! the same program and starts from the original source, so strategies can be run in any order
//! and any number of times.
//!
//! ```
//! use import_transformer::{ImportMap, Rewriter};
//!
//! let rewriter = Rewriter::new(r#"import { html } from "lit";"#)?;
//! let map = ImportMap::new([("lit", "https://cdn.example/lit.js")]);
//! assert_eq!(
//!     rewriter.transform_with_import_map(Some(&map))?.code,
//!     r#"import { html } from "https://cdn.example/lit.js";"#
//! );
//! # Ok::<(), import_transformer::RewriteError>(())
//! ```

use tree_sitter::Tree;

use crate::{
    RewriteError,
    ast::Program,
    edit::create_sourcemap,
    import_map::ImportMap,
    parse::parse_program,
    strategy::{self, Loader, Rewritten, Strategy, StripOutput},
};

#[derive(Debug, Clone)]
pub struct Rewriter {
    source: String,
    program: Program,
}

impl Rewriter {
    /// Parse `source` as a JavaScript module.
    pub fn new(source: impl Into<String>) -> Result<Self, RewriteError> {
        let source = source.into();
        if source.is_empty() {
            return Err(RewriteError::MissingInput);
        }
        let program = parse_program(&source)?;
        tracing::debug!(
            bytes = source.len(),
            statements = program.body.len(),
            "parsed module"
        );
        Ok(Self { source, program })
    }

    /// Use a tree the caller already parsed from `source` with the JavaScript grammar.
    pub fn with_tree(source: impl Into<String>, tree: &Tree) -> Result<Self, RewriteError> {
        let source = source.into();
        if source.is_empty() {
            return Err(RewriteError::MissingInput);
        }
        let program = Program::from_tree(&source, tree)?;
        Ok(Self { source, program })
    }

    /// Use an already lowered program. Its spans must refer to `source`.
    pub fn with_program(source: impl Into<String>, program: Program) -> Result<Self, RewriteError> {
        let source = source.into();
        if source.is_empty() {
            return Err(RewriteError::MissingInput);
        }
        Ok(Self { source, program })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Replace every import source found in `import_map`.
    pub fn transform_with_import_map(
        &self,
        import_map: Option<&ImportMap>,
    ) -> Result<Rewritten, RewriteError> {
        strategy::substitute(&self.source, &self.program, import_map)
    }

    /// Alias of [`Rewriter::transform_with_import_map`].
    pub fn transform(&self, import_map: Option<&ImportMap>) -> Result<Rewritten, RewriteError> {
        self.transform_with_import_map(import_map)
    }

    /// `import x from "m"` -> `const x = await import("m")`.
    pub fn transform_to_dynamic_import(&self) -> Result<Rewritten, RewriteError> {
        strategy::convert_to_loader(&self.source, &self.program, Loader::DynamicImport)
    }

    /// `import x from "m"` -> `const x = require("m")`.
    pub fn transform_to_require(&self) -> Result<Rewritten, RewriteError> {
        strategy::convert_to_loader(&self.source, &self.program, Loader::Require)
    }

    /// Comment out every import and export, collecting what was removed.
    pub fn strip_imports_and_exports(&self) -> Result<StripOutput, RewriteError> {
        strategy::strip(&self.source, &self.program)
    }

    pub fn has_imports(&self) -> bool {
        strategy::has_imports(&self.program)
    }

    pub fn rewrite(&self, strategy: Strategy<'_>) -> Result<Rewritten, RewriteError> {
        strategy::rewrite(&self.source, &self.program, strategy)
    }

    /// Sourcemap JSON mapping `rewritten.code` back to this source.
    pub fn create_sourcemap(
        &self,
        rewritten: &Rewritten,
        source_filename: &str,
    ) -> Result<String, RewriteError> {
        create_sourcemap(
            &self.source,
            &rewritten.code,
            source_filename,
            &rewritten.edits,
        )
    }
}
